//! Drafts service
//!
//! Autosave storage for the note a user is currently typing.
//! Each user has at most one draft; it is consumed when a note is created.

use crate::database::Repository;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Draft text as exchanged with the editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Service for managing autosave drafts
#[derive(Clone)]
pub struct DraftsService {
    repo: Repository,
}

impl DraftsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Current draft, or empty strings when there is none
    pub async fn get_draft(&self, user_id: i64) -> Result<DraftContent> {
        let draft = self.repo.get_draft(user_id).await?;

        Ok(draft
            .map(|d| DraftContent {
                title: d.title.unwrap_or_default(),
                content: d.content.unwrap_or_default(),
            })
            .unwrap_or_default())
    }

    /// Create or overwrite the user's draft with exactly the given text
    pub async fn save_draft(&self, user_id: i64, draft: &DraftContent) -> Result<()> {
        self.repo
            .save_draft(user_id, &draft.title, &draft.content)
            .await?;
        Ok(())
    }
}
