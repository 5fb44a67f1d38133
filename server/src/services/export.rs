//! Export service
//!
//! Renders all of a user's notes as a plain-text file or a PDF document.
//! Notes are exported in list order (pinned first, then newest).

use crate::clients::PdfRenderer;
use crate::database::{NoteWithTags, Repository};
use crate::error::{AppError, Result};
use crate::text::{escape_html, strip_html};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "txt" => Ok(ExportFormat::Text),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(AppError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A rendered download
#[derive(Debug)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Format a note timestamp for the text export
pub fn format_updated(updated_at: Option<DateTime<Utc>>) -> String {
    updated_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Plain-text rendering: a header block per note followed by its stripped content
pub fn render_text(notes: &[NoteWithTags]) -> String {
    let mut out = String::new();

    for n in notes {
        let tags = if n.tags.is_empty() {
            "None".to_string()
        } else {
            n.tags.join(", ")
        };

        let _ = writeln!(out, "Title: {}", n.note.title);
        let _ = writeln!(out, "Tags: {}", tags);
        let _ = writeln!(out, "Pinned: {}", if n.note.pinned { "Yes" } else { "No" });
        let _ = writeln!(out, "Updated: {}", format_updated(Some(n.note.updated_at)));
        out.push_str(&"-".repeat(40));
        out.push('\n');
        out.push_str(&strip_html(&n.note.content));
        out.push_str("\n\n");
    }

    out
}

/// Minimal HTML document fed to the PDF converter.
///
/// Note titles and content go in as stored, markup included, so editor
/// formatting survives. Only the username heading is escaped.
pub fn render_html(username: &str, notes: &[NoteWithTags]) -> String {
    let mut body = String::new();
    for n in notes {
        let _ = write!(
            body,
            "<div class='note'><h2>{}</h2><p>{}</p></div>",
            n.note.title, n.note.content
        );
    }

    format!(
        r#"<html>
<head>
<meta charset="utf-8">
<style>
    body {{ font-family: sans-serif; }}
    h2 {{ margin-bottom: 0; }}
    p {{ margin-top: 0; }}
    .note {{ margin-bottom: 20px; }}
</style>
</head>
<body>
<h1>{}'s Notes</h1>
{}
</body>
</html>
"#,
        escape_html(username),
        body
    )
}

/// Service for exporting notes
#[derive(Clone)]
pub struct ExportService {
    repo: Repository,
    pdf: Arc<dyn PdfRenderer>,
}

impl ExportService {
    pub fn new(repo: Repository, pdf: Arc<dyn PdfRenderer>) -> Self {
        Self { repo, pdf }
    }

    /// Plain-text export bytes
    pub async fn export_text(&self, user_id: i64) -> Result<Vec<u8>> {
        let notes = self.repo.list_notes(user_id, None).await?;
        Ok(render_text(&notes).into_bytes())
    }

    /// PDF export bytes
    pub async fn export_pdf(&self, user_id: i64) -> Result<Vec<u8>> {
        let user = self.repo.get_user(user_id).await?;
        let notes = self.repo.list_notes(user_id, None).await?;
        let html = render_html(&user.username, &notes);

        self.pdf.render(&html).await
    }

    /// Export in the requested format with a download filename
    pub async fn export(&self, user_id: i64, format: ExportFormat) -> Result<ExportFile> {
        let user = self.repo.get_user(user_id).await?;

        tracing::info!("Exporting notes for user {} as {}", user_id, format.extension());

        let bytes = match format {
            ExportFormat::Text => self.export_text(user_id).await?,
            ExportFormat::Pdf => self.export_pdf(user_id).await?,
        };

        Ok(ExportFile {
            filename: format!("{}_notes.{}", user.username, format.extension()),
            content_type: format.content_type(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{test_pool, CreateNoteRequest, Note};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Captures the HTML it is given and returns a fake PDF
    #[derive(Default)]
    struct CapturingRenderer {
        html: Mutex<Option<String>>,
    }

    #[async_trait]
    impl PdfRenderer for CapturingRenderer {
        async fn render(&self, html: &str) -> Result<Vec<u8>> {
            *self.html.lock().unwrap() = Some(html.to_string());
            Ok(b"%PDF-1.4 fake".to_vec())
        }
    }

    fn sample(title: &str, content: &str, tags: &[&str], pinned: bool) -> NoteWithTags {
        NoteWithTags {
            note: Note {
                id: 1,
                user_id: 1,
                title: title.to_string(),
                content: content.to_string(),
                pinned,
                created_at: Utc::now(),
                updated_at: "2024-03-05T14:07:09Z".parse().unwrap(),
            },
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!(matches!(
            "docx".parse::<ExportFormat>(),
            Err(AppError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_render_text_block() {
        let text = render_text(&[sample("Groceries", "<b>hi</b>", &["a", "b"], true)]);

        assert!(text.contains("Title: Groceries\n"));
        assert!(text.contains("Tags: a, b\n"));
        assert!(text.contains("Pinned: Yes\n"));
        assert!(text.contains("Updated: 2024-03-05 14:07\n"));
        assert!(text.contains(&format!("{}\nhi\n\n", "-".repeat(40))));
        assert!(!text.contains("<b>"));
    }

    #[test]
    fn test_render_text_without_tags() {
        let text = render_text(&[sample("Plain", "words", &[], false)]);

        assert!(text.contains("Tags: None\n"));
        assert!(text.contains("Pinned: No\n"));
    }

    #[test]
    fn test_unknown_timestamp() {
        assert_eq!(format_updated(None), "Unknown");
    }

    #[test]
    fn test_render_html_keeps_content_markup() {
        let html = render_html("al<ice", &[sample("T & T", "<b>bold</b>", &[], false)]);

        assert!(html.contains("<h1>al&lt;ice's Notes</h1>"));
        assert!(html.contains("<h2>T & T</h2><p><b>bold</b></p>"));
    }

    #[test]
    fn test_render_html_keeps_title_markup() {
        let html = render_html("<alice>", &[sample("<b>x</b>", "<i>y</i>", &[], false)]);

        assert!(html.contains("<h2><b>x</b></h2><p><i>y</i></p>"));
        assert!(!html.contains("&lt;b&gt;"));
        assert!(html.contains("<h1>&lt;alice&gt;'s Notes</h1>"));
    }

    #[tokio::test]
    async fn test_export_files() {
        let repo = Repository::new(test_pool().await);
        let user = repo.create_user("alice", "hash").await.unwrap();
        repo.create_note(
            user.id,
            CreateNoteRequest {
                title: "First".to_string(),
                content: "<i>one</i>".to_string(),
                tags: vec!["x".to_string()],
                pinned: false,
            },
        )
        .await
        .unwrap();

        let renderer = Arc::new(CapturingRenderer::default());
        let service = ExportService::new(repo, renderer.clone());

        let txt = service.export(user.id, ExportFormat::Text).await.unwrap();
        assert_eq!(txt.filename, "alice_notes.txt");
        let body = String::from_utf8(txt.bytes).unwrap();
        assert!(body.contains("Title: First"));
        assert!(body.contains("\none\n"));

        let pdf = service.export(user.id, ExportFormat::Pdf).await.unwrap();
        assert_eq!(pdf.filename, "alice_notes.pdf");
        assert_eq!(pdf.content_type, "application/pdf");
        assert!(pdf.bytes.starts_with(b"%PDF"));

        let html = renderer.html.lock().unwrap().clone().unwrap();
        assert!(html.contains("<i>one</i>"));
    }
}
