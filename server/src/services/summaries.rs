//! Summaries service
//!
//! Generates note summaries through the injected `Summarizer` and keeps one
//! stored summary per note. Summarization is best-effort: client failures
//! come back as an inline message, never as an error.

use crate::clients::Summarizer;
use crate::config::{MAX_SUMMARY_TITLE_LENGTH, UNTITLED_SUMMARY_TITLE};
use crate::database::{Note, Repository, Summary};
use crate::error::{AppError, Result};
use crate::text::{strip_html, truncate_chars};
use std::sync::Arc;

/// Shown when a note is missing or has nothing to summarize
pub const NOTHING_TO_SUMMARIZE: &str = "This note is empty or not found, nothing to summarize.";

/// Result of a summarization request
#[derive(Debug)]
pub enum SummarizeOutcome {
    /// Note missing, not owned, or blank; the client was not called
    NothingToSummarize,
    /// Summary generated and stored
    Summarized { note: Note, summary: Summary },
    /// Client (or storing the result) failed; `message` is for display
    Failed { note: Note, message: String },
}

impl SummarizeOutcome {
    /// Text to show the user
    pub fn display_text(&self) -> &str {
        match self {
            SummarizeOutcome::NothingToSummarize => NOTHING_TO_SUMMARIZE,
            SummarizeOutcome::Summarized { summary, .. } => &summary.summary,
            SummarizeOutcome::Failed { message, .. } => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SummarizeOutcome::Failed { .. })
    }

    /// The note that was summarized, when there was one
    pub fn note(&self) -> Option<&Note> {
        match self {
            SummarizeOutcome::NothingToSummarize => None,
            SummarizeOutcome::Summarized { note, .. } | SummarizeOutcome::Failed { note, .. } => {
                Some(note)
            }
        }
    }
}

fn summary_title(note_title: &str) -> String {
    let title = note_title.trim();
    if title.is_empty() {
        UNTITLED_SUMMARY_TITLE.to_string()
    } else {
        truncate_chars(title, MAX_SUMMARY_TITLE_LENGTH)
    }
}

/// Service for generating and listing summaries
#[derive(Clone)]
pub struct SummariesService {
    repo: Repository,
    summarizer: Arc<dyn Summarizer>,
}

impl SummariesService {
    pub fn new(repo: Repository, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { repo, summarizer }
    }

    /// Summarize a note and store the result, replacing any earlier summary
    pub async fn summarize(&self, user_id: i64, note_id: i64) -> Result<SummarizeOutcome> {
        let note = match self.repo.get_note(user_id, note_id).await {
            Ok(found) => found.note,
            Err(AppError::NotFound(_)) => return Ok(SummarizeOutcome::NothingToSummarize),
            Err(e) => return Err(e),
        };

        if note.content.trim().is_empty() {
            tracing::debug!("Note {} has no content to summarize", note_id);
            return Ok(SummarizeOutcome::NothingToSummarize);
        }

        // Markup-only content still goes out, as raw markup
        let plain = strip_html(&note.content);
        let input = if plain.is_empty() { note.content.trim() } else { plain.as_str() };

        tracing::info!("Summarizing note {}", note_id);

        let text = match self.summarizer.summarize(input).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Summarization failed for note {}: {}", note_id, e);
                return Ok(SummarizeOutcome::Failed {
                    note,
                    message: format!("Error generating summary: {}", e),
                });
            }
        };

        let title = summary_title(&note.title);
        match self.repo.upsert_summary(user_id, note.id, &title, &text).await {
            Ok(summary) => {
                tracing::info!("Summary {} stored for note {}", summary.id, note_id);
                Ok(SummarizeOutcome::Summarized { note, summary })
            }
            Err(e) => {
                tracing::error!("Failed to store summary for note {}: {}", note_id, e);
                Ok(SummarizeOutcome::Failed {
                    note,
                    message: format!("Error generating summary: {}", e),
                })
            }
        }
    }

    /// Summaries of the user's notes
    pub async fn list_summaries(&self, user_id: i64) -> Result<Vec<Summary>> {
        self.repo.list_summaries(user_id).await
    }

    /// One summary, only when its note belongs to the user
    pub async fn get_summary(&self, user_id: i64, id: i64) -> Result<Summary> {
        self.repo.get_summary(user_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{test_pool, CreateNoteRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes a canned summary, or fails when `fail` is set
    struct StubSummarizer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubSummarizer {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, text: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(AppError::Summarization("quota exceeded".to_string()));
            }
            Ok(format!("summary #{} of: {}", n, text))
        }
    }

    async fn setup(stub: Arc<StubSummarizer>) -> (SummariesService, Repository, i64) {
        let repo = Repository::new(test_pool().await);
        let user = repo.create_user("alice", "hash").await.unwrap();
        (SummariesService::new(repo.clone(), stub), repo, user.id)
    }

    async fn add_note(repo: &Repository, user_id: i64, title: &str, content: &str) -> Note {
        repo.create_note(
            user_id,
            CreateNoteRequest {
                title: title.to_string(),
                content: content.to_string(),
                tags: vec![],
                pinned: false,
            },
        )
        .await
        .unwrap()
        .note
    }

    #[tokio::test]
    async fn test_blank_note_skips_client() {
        let stub = StubSummarizer::new(false);
        let (service, repo, user_id) = setup(stub.clone()).await;
        let note = add_note(&repo, user_id, "Empty", "   ").await;

        let outcome = service.summarize(user_id, note.id).await.unwrap();

        assert!(matches!(outcome, SummarizeOutcome::NothingToSummarize));
        assert_eq!(outcome.display_text(), NOTHING_TO_SUMMARIZE);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
        assert!(service.list_summaries(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_markup_only_note_reaches_client() {
        let stub = StubSummarizer::new(false);
        let (service, repo, user_id) = setup(stub.clone()).await;
        let note = add_note(&repo, user_id, "Picture", "<img src=\"cat.png\">").await;

        let outcome = service.summarize(user_id, note.id).await.unwrap();

        assert!(matches!(outcome, SummarizeOutcome::Summarized { .. }));
        assert_eq!(outcome.display_text(), "summary #1 of: <img src=\"cat.png\">");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_note_is_warning() {
        let stub = StubSummarizer::new(false);
        let (service, _repo, user_id) = setup(stub.clone()).await;

        let outcome = service.summarize(user_id, 77).await.unwrap();

        assert!(matches!(outcome, SummarizeOutcome::NothingToSummarize));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summary_is_upserted() {
        let stub = StubSummarizer::new(false);
        let (service, repo, user_id) = setup(stub.clone()).await;
        let note = add_note(&repo, user_id, "Trip", "<p>Pack <b>bags</b></p>").await;

        let first = service.summarize(user_id, note.id).await.unwrap();
        assert_eq!(first.display_text(), "summary #1 of: Pack bags");

        let second = service.summarize(user_id, note.id).await.unwrap();
        assert_eq!(second.display_text(), "summary #2 of: Pack bags");

        let summaries = service.list_summaries(user_id).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "Trip");
        assert_eq!(summaries[0].summary, "summary #2 of: Pack bags");
        assert_eq!(summaries[0].note_id, Some(note.id));
    }

    #[tokio::test]
    async fn test_client_failure_is_inline() {
        let stub = StubSummarizer::new(true);
        let (service, repo, user_id) = setup(stub.clone()).await;
        let note = add_note(&repo, user_id, "Trip", "content").await;

        let outcome = service.summarize(user_id, note.id).await.unwrap();

        assert!(outcome.is_error());
        assert!(outcome.display_text().starts_with("Error generating summary:"));
        assert!(service.list_summaries(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_untitled_fallback() {
        assert_eq!(summary_title("   "), UNTITLED_SUMMARY_TITLE);
        assert_eq!(summary_title(&"t".repeat(200)).len(), MAX_SUMMARY_TITLE_LENGTH);
    }

    #[tokio::test]
    async fn test_summaries_are_owner_scoped() {
        let stub = StubSummarizer::new(false);
        let (service, repo, alice) = setup(stub).await;
        let bob = repo.create_user("bob", "hash").await.unwrap().id;
        let note = add_note(&repo, alice, "Mine", "private words").await;

        let outcome = service.summarize(alice, note.id).await.unwrap();
        let summary_id = match outcome {
            SummarizeOutcome::Summarized { summary, .. } => summary.id,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert!(service.get_summary(alice, summary_id).await.is_ok());
        assert!(matches!(
            service.get_summary(bob, summary_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.list_summaries(bob).await.unwrap().is_empty());

        // bob cannot summarize alice's note either
        let outcome = service.summarize(bob, note.id).await.unwrap();
        assert!(matches!(outcome, SummarizeOutcome::NothingToSummarize));
    }

    #[tokio::test]
    async fn test_deleted_note_drops_summary() {
        let stub = StubSummarizer::new(false);
        let (service, repo, user_id) = setup(stub).await;
        let note = add_note(&repo, user_id, "Gone soon", "words").await;

        service.summarize(user_id, note.id).await.unwrap();
        repo.delete_note(user_id, note.id).await.unwrap();

        let summaries = service.list_summaries(user_id).await.unwrap();
        assert!(summaries.iter().all(|s| s.note_id != Some(note.id)));
        assert_eq!(repo.count_summaries_for_note(note.id).await.unwrap(), 0);
    }
}
