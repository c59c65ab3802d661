use actix_web::{get, web, HttpResponse};

use crate::app_state::AppState;

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[get("/health/ready")]
async fn health_check_ready(state: web::Data<AppState>) -> HttpResponse {
    let store = match &state.db {
        Some(db) => match db.health_check().await {
            Ok(()) => "ok",
            Err(err) => {
                log::warn!("Readiness check failed: {}", err);
                "error"
            }
        },
        None => "memory",
    };

    let response = serde_json::json!({
        "status": if store == "error" { "not_ready" } else { "ready" },
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": { "store": store }
    });

    if store == "error" {
        HttpResponse::ServiceUnavailable().json(response)
    } else {
        HttpResponse::Ok().json(response)
    }
}
