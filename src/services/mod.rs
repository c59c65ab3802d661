pub mod admin_service;
pub mod progress_service;
pub mod quiz_service;
pub mod randomizer;
pub mod scoring_service;

pub use admin_service::AdminService;
pub use progress_service::ProgressService;
pub use quiz_service::QuizService;
pub use scoring_service::ScoringService;
