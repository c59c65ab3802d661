use actix_web::{delete, get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::ImportQuizRequest,
        response::{MessageResponse, QuizDetailDto},
    },
};

#[post("/quizzes")]
async fn import_quiz(
    state: web::Data<AppState>,
    request: web::Json<ImportQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .quiz_service
        .import_quiz(&auth.0.sub, &auth.0.email, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(response))
}

#[get("/quizzes")]
async fn list_quizzes(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quizzes = state.quiz_service.list_quizzes(&auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(quizzes))
}

#[get("/quizzes/{id}")]
async fn get_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.get_quiz(&auth.0.sub, &id).await?;
    Ok(HttpResponse::Ok().json(QuizDetailDto::from(quiz)))
}

#[delete("/quizzes/{id}")]
async fn delete_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.quiz_service.delete_quiz(&auth.0.sub, &id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("Quiz '{}' deleted", id))))
}
