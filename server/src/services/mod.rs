//! Services module
//!
//! Business logic services that coordinate between the web layer and the repository.

pub mod auth;
pub mod drafts;
pub mod export;
pub mod notes;
pub mod summaries;

pub use auth::{AuthService, LoginSession};
pub use drafts::{DraftContent, DraftsService};
pub use export::{ExportFile, ExportFormat, ExportService};
pub use notes::{parse_tags, NotesService};
pub use summaries::{SummarizeOutcome, SummariesService};
