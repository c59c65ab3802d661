pub mod admin_handler;
pub mod health_handler;
pub mod progress_handler;
pub mod quiz_handler;

use actix_web::web;

use crate::auth::AuthMiddleware;

pub use admin_handler::{get_stats, get_user_activity};
pub use health_handler::{health_check, health_check_ready};
pub use progress_handler::{
    finish_quiz, get_progress, reset_progress, resume_session, retry_wrong, save_progress,
    start_session, toggle_known,
};
pub use quiz_handler::{delete_quiz, get_quiz, import_quiz, list_quizzes};

/// Registers every route. `/api` and `/admin` sit behind bearer authentication.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(health_check_ready)
        .service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .service(import_quiz)
                .service(list_quizzes)
                .service(get_quiz)
                .service(delete_quiz)
                .service(start_session)
                .service(resume_session)
                .service(get_progress)
                .service(save_progress)
                .service(reset_progress)
                .service(toggle_known)
                .service(finish_quiz)
                .service(retry_wrong),
        )
        .service(
            web::scope("/admin")
                .wrap(AuthMiddleware)
                .service(get_stats)
                .service(get_user_activity),
        );
}
