//! Clients for external capabilities
//!
//! The summarization service and the HTML-to-PDF converter sit behind
//! traits so services receive them at construction and tests can stub them.

pub mod pdf;
pub mod summarizer;

pub use pdf::{CommandPdfRenderer, PdfRenderer};
pub use summarizer::{GeminiSummarizer, Summarizer};
