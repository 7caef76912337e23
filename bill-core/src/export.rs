use std::path::{Path, PathBuf};

use mime::Mime;

use crate::error::ExportError;
use crate::invoice::Invoice;

pub trait DocumentRenderer {
    fn render(&self, invoice: &Invoice) -> Result<Vec<u8>, ExportError>;
}

/// Where rendered files land on local storage.
pub trait FileSink {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError>;
}

/// The platform's share/print surface.
pub trait ShareTarget {
    fn share(&self, path: &Path, mime: &Mime) -> Result<(), ExportError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub mime: Mime,
    pub size: usize,
}

/// Writes into a fixed directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ExportError::Write(e.to_string()))?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes).map_err(|e| ExportError::Write(format!("{}: {e}", path.display())))?;
        Ok(path)
    }
}

pub fn sanitize_filename(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' || ch == ' ';
        out.push(if ok { ch } else { '_' });
    }
    let trimmed = out.trim().to_string();
    if trimmed.is_empty() {
        "invoice".to_string()
    } else {
        trimmed
    }
}

/// `INV-0042-Ali.pdf`
pub fn pdf_file_name(invoice: &Invoice) -> String {
    sanitize_filename(&format!("{}-{}.pdf", invoice.invoice_number, invoice.customer_name))
}

/// Render, write, share. Each stage runs only after the previous one succeeded.
pub struct ExportPipeline<R, S, T> {
    renderer: R,
    sink: S,
    share: T,
}

impl<R, S, T> ExportPipeline<R, S, T>
where
    R: DocumentRenderer,
    S: FileSink,
    T: ShareTarget,
{
    pub fn new(renderer: R, sink: S, share: T) -> Self {
        Self { renderer, sink, share }
    }

    pub fn export(&self, invoice: &Invoice) -> Result<ExportedFile, ExportError> {
        let bytes = self.renderer.render(invoice)?;
        let path = self.sink.write(&pdf_file_name(invoice), &bytes)?;
        self.share.share(&path, &mime::APPLICATION_PDF)?;

        log::info!(
            "[export] {} shared as {} ({} bytes)",
            invoice.invoice_number,
            path.display(),
            bytes.len()
        );
        Ok(ExportedFile {
            path,
            mime: mime::APPLICATION_PDF,
            size: bytes.len(),
        })
    }
}
