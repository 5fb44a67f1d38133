//! HTML-to-PDF conversion
//!
//! The default renderer pipes the document through an external converter
//! (wkhtmltopdf or any program with the same `- -` stdin/stdout contract).

use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// External HTML-to-PDF capability
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Convert a complete HTML document to PDF bytes
    async fn render(&self, html: &str) -> Result<Vec<u8>>;
}

/// Renderer that shells out to a converter program
pub struct CommandPdfRenderer {
    program: String,
    timeout: Duration,
}

impl CommandPdfRenderer {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.pdf_command.clone(),
            Duration::from_secs(config.pdf_timeout_secs),
        )
    }
}

#[async_trait]
impl PdfRenderer for CommandPdfRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>> {
        tracing::debug!("Rendering PDF with {}", self.program);

        let mut child = Command::new(&self.program)
            .args(["--quiet", "--encoding", "utf-8", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Export(format!("Failed to start {}: {}", self.program, e)))?;

        // stdin is fed from its own task while stdout drains below
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Export("Converter stdin unavailable".to_string()))?;
        let input = html.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AppError::Export(format!(
                    "PDF rendering timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed writing HTML to converter: {}", e),
            Err(e) => tracing::warn!("Converter writer task failed: {}", e),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Export(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        if !output.stdout.starts_with(b"%PDF") {
            return Err(AppError::Export(
                "Converter did not produce a PDF document".to_string(),
            ));
        }

        tracing::debug!("Rendered PDF ({} bytes)", output.stdout.len());
        Ok(output.stdout)
    }
}
