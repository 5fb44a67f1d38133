//! Notes service
//!
//! High-level business logic for note lifecycle, tag resolution, search
//! and pinning. Every operation takes the owning user id explicitly.

use crate::config::{MAX_TAG_LENGTH, MAX_TITLE_LENGTH, UNTITLED_NOTE_TITLE};
use crate::database::{CreateNoteRequest, NoteWithTags, Repository, UpdateNoteRequest};
use crate::error::{AppError, Result};

/// Split a comma-separated tag string into trimmed, non-empty names.
///
/// Repeated names are kept; they resolve to a single tag row later.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_tags(names: Vec<String>) -> Result<Vec<String>> {
    let names: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    if let Some(long) = names.iter().find(|n| n.chars().count() > MAX_TAG_LENGTH) {
        return Err(AppError::Validation(format!(
            "Tag '{}' is longer than {} characters",
            long, MAX_TAG_LENGTH
        )));
    }

    Ok(names)
}

fn check_title_length(title: &str) -> Result<()> {
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "Title is longer than {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

/// Trimmed value, or `None` when nothing but whitespace was supplied
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Service for managing notes
#[derive(Clone)]
pub struct NotesService {
    repo: Repository,
}

impl NotesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new note.
    ///
    /// Returns `Ok(None)` without touching the database when both title and
    /// content are blank. A successful create consumes the owner's draft.
    pub async fn create_note(
        &self,
        user_id: i64,
        title: &str,
        content: &str,
        tags: Vec<String>,
        pinned: bool,
    ) -> Result<Option<NoteWithTags>> {
        let title = title.trim();
        let content = content.trim();

        if title.is_empty() && content.is_empty() {
            tracing::debug!("Ignoring empty note submission from user {}", user_id);
            return Ok(None);
        }

        check_title_length(title)?;
        let tags = normalize_tags(tags)?;

        match self.repo.get_user(user_id).await {
            Ok(_) => {}
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Validation("Note owner does not exist".to_string()));
            }
            Err(e) => return Err(e),
        }

        let req = CreateNoteRequest {
            title: if title.is_empty() {
                UNTITLED_NOTE_TITLE.to_string()
            } else {
                title.to_string()
            },
            content: content.to_string(),
            tags,
            pinned,
        };

        let note = self.repo.create_note(user_id, req).await?;

        tracing::info!("Note created: {} for user {}", note.note.id, user_id);

        Ok(Some(note))
    }

    /// Get a note owned by the user
    pub async fn get_note(&self, user_id: i64, id: i64) -> Result<NoteWithTags> {
        self.repo.get_note(user_id, id).await
    }

    /// Update a note.
    ///
    /// Blank title or content leaves the stored value unchanged. A provided
    /// tag list replaces all tags, so an empty list clears them.
    pub async fn update_note(
        &self,
        user_id: i64,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
        tags: Option<Vec<String>>,
        pinned: Option<bool>,
    ) -> Result<NoteWithTags> {
        tracing::debug!("Updating note: {}", id);

        let title = non_empty(title);
        if let Some(title) = &title {
            check_title_length(title)?;
        }

        let tags = tags.map(normalize_tags).transpose()?;

        let req = UpdateNoteRequest {
            id,
            title,
            content: non_empty(content),
            tags,
            pinned,
        };

        let note = self.repo.update_note(user_id, req).await?;

        tracing::debug!("Note updated successfully: {}", note.note.id);

        Ok(note)
    }

    /// Delete a note, its tag associations and its summary
    pub async fn delete_note(&self, user_id: i64, id: i64) -> Result<()> {
        tracing::info!("Deleting note: {}", id);

        self.repo.delete_note(user_id, id).await?;

        tracing::info!("Note deleted successfully: {}", id);

        Ok(())
    }

    /// List a user's notes, pinned first then newest.
    ///
    /// `query` matches title or content case-insensitively; `tag` must match
    /// a tag name exactly. Blank filters are ignored.
    pub async fn list_notes(
        &self,
        user_id: i64,
        query: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Vec<NoteWithTags>> {
        let tag = non_empty(tag);
        let notes = self.repo.list_notes(user_id, tag.as_deref()).await?;

        let Some(query) = non_empty(query) else {
            return Ok(notes);
        };

        let query_lower = query.to_lowercase();

        Ok(notes
            .into_iter()
            .filter(|n| {
                n.note.title.to_lowercase().contains(&query_lower)
                    || n.note.content.to_lowercase().contains(&query_lower)
            })
            .collect())
    }

    /// Flip the pinned flag, returns the new state
    pub async fn toggle_pin(&self, user_id: i64, id: i64) -> Result<bool> {
        let pinned = self.repo.toggle_pin(user_id, id).await?;
        tracing::info!("Note {} pinned: {}", id, pinned);
        Ok(pinned)
    }

    /// Tags in use by the user's notes, with counts
    pub async fn list_tags(&self, user_id: i64) -> Result<Vec<(String, i64)>> {
        self.repo.list_tags(user_id).await
    }
}
