use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use tokio::task::JoinHandle;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::QuizDocument,
        dto::{
            request::ImportQuizRequest,
            response::{ImportQuizResponse, QuizSummaryDto},
        },
    },
    parser::{parse_pages, PageNormalizer},
    repositories::{blob_store::source_document_key, BlobStore, QuizRepository, StoredQuiz},
};

const SOURCE_CONTENT_TYPE: &str = "application/pdf";

pub struct QuizService {
    repository: Arc<dyn QuizRepository>,
    archive: Arc<dyn BlobStore>,
    normalizer: PageNormalizer,
}

impl QuizService {
    pub fn new(
        repository: Arc<dyn QuizRepository>,
        archive: Arc<dyn BlobStore>,
        normalizer: PageNormalizer,
    ) -> Self {
        Self {
            repository,
            archive,
            normalizer,
        }
    }

    /// Parses the uploaded pages and stores the result under `owner`.
    ///
    /// The source document, when supplied, is archived in the background;
    /// the import does not wait for it and never fails because of it.
    pub async fn import_quiz(
        &self,
        owner: &str,
        uploader_email: &str,
        request: ImportQuizRequest,
    ) -> AppResult<ImportQuizResponse> {
        request.validate()?;

        let (questions, report) = parse_pages(&self.normalizer, &request.pages);
        if questions.is_empty() {
            return Err(AppError::ValidationError(
                "No questions found in the uploaded document".to_string(),
            ));
        }

        let document = QuizDocument::new(&request.display_name(), questions);
        let meta = self.repository.save(owner, &document).await?;

        if let Some(encoded) = request.source_base64.as_deref() {
            let file_name = request.file_name.as_deref().unwrap_or(&request.name);
            self.archive_source(uploader_email, file_name, encoded);
        }

        Ok(ImportQuizResponse {
            summary: meta.into(),
            parsed_blocks: report.parsed(),
            dropped_blocks: report.dropped,
        })
    }

    /// Spawns the archival upload and hands back its handle. Failures are
    /// logged inside the task.
    pub fn archive_source(
        &self,
        uploader_email: &str,
        file_name: &str,
        encoded: &str,
    ) -> Option<JoinHandle<()>> {
        let bytes = match STANDARD.decode(encoded.trim()) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("Skipping archive of '{}': invalid base64 ({})", file_name, err);
                return None;
            }
        };

        let key = source_document_key(uploader_email, file_name);
        let archive = Arc::clone(&self.archive);

        Some(tokio::spawn(async move {
            match archive.put(&key, bytes, SOURCE_CONTENT_TYPE).await {
                Ok(stored) => log::info!("Archived source document at {}", stored),
                Err(err) => log::warn!("Failed to archive source document {}: {}", key, err),
            }
        }))
    }

    pub async fn get_quiz(&self, owner: &str, quiz_id: &str) -> AppResult<StoredQuiz> {
        self.repository
            .find_by_id(owner, quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", quiz_id)))
    }

    pub async fn list_quizzes(&self, owner: &str) -> AppResult<Vec<QuizSummaryDto>> {
        let metas = self.repository.list_by_owner(owner).await?;
        Ok(metas.into_iter().map(QuizSummaryDto::from).collect())
    }

    pub async fn delete_quiz(&self, owner: &str, quiz_id: &str) -> AppResult<()> {
        if !self.repository.delete(owner, quiz_id).await? {
            return Err(AppError::NotFound(format!(
                "Quiz with id '{}' not found",
                quiz_id
            )));
        }
        Ok(())
    }
}
