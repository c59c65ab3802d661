use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{EvaluateRequest, SaveProgressRequest, StartSessionRequest},
        response::MessageResponse,
    },
};

#[post("/quizzes/{id}/sessions")]
async fn start_session(
    state: web::Data<AppState>,
    id: web::Path<String>,
    options: Option<web::Json<StartSessionRequest>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let options = options.map(|o| o.into_inner()).unwrap_or_default();
    let session = state
        .progress_service
        .start_session(&auth.0.sub, &id, options)
        .await?;
    Ok(HttpResponse::Created().json(session))
}

#[get("/quizzes/{id}/resume")]
async fn resume_session(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let resume = state.progress_service.resume(&auth.0.sub, &id).await?;
    Ok(HttpResponse::Ok().json(resume))
}

#[get("/quizzes/{id}/progress")]
async fn get_progress(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let progress = state.progress_service.get_progress(&auth.0.sub, &id).await?;
    Ok(HttpResponse::Ok().json(progress))
}

#[put("/quizzes/{id}/progress")]
async fn save_progress(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<SaveProgressRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let progress = state
        .progress_service
        .save_progress(&auth.0.sub, &id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}

#[delete("/quizzes/{id}/progress")]
async fn reset_progress(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.progress_service.reset_progress(&auth.0.sub, &id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Progress cleared")))
}

#[post("/quizzes/{id}/known/{number}")]
async fn toggle_known(
    state: web::Data<AppState>,
    path: web::Path<(String, u32)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (id, number) = path.into_inner();
    let toggled = state
        .progress_service
        .toggle_known(&auth.0.sub, &id, number)
        .await?;
    Ok(HttpResponse::Ok().json(toggled))
}

#[post("/quizzes/{id}/finish")]
async fn finish_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<EvaluateRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let result = state
        .progress_service
        .finish(&auth.0.sub, &id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/quizzes/{id}/retry-wrong")]
async fn retry_wrong(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<EvaluateRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let session = state
        .progress_service
        .retry_wrong(&auth.0.sub, &id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(session))
}
