use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
};

#[get("/stats")]
async fn get_stats(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let stats = state.admin_service.stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/users/{user_id}")]
async fn get_user_activity(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let activity = state.admin_service.user_activity(&user_id).await?;
    Ok(HttpResponse::Ok().json(activity))
}
