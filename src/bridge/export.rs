//! `saveFileFromBase64` handling
//!
//! Decodes the payload, picks the export route from the MIME type and hands
//! the bytes to the host's [`FileExporter`]. Failures become error notices.

use super::message::SaveFileRequest;
use crate::notify::{Notice, Notifier};
use crate::{BridgeError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Host-side file export (save dialogs, document rendering)
pub trait FileExporter: Send + Sync {
    /// Save bytes verbatim
    fn save_file(&self, file_name: &str, data: &[u8], mime_type: &str) -> Result<PathBuf>;

    /// Convert an HTML page into a document and save it
    fn export_html_document(&self, file_name: &str, html: &str) -> Result<PathBuf>;
}

/// Exporter that writes into a fixed directory
///
/// It has no document renderer, so HTML exports are stored as `.html`.
pub struct DirectoryExporter {
    dir: PathBuf,
}

impl DirectoryExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write(&self, file_name: &str, data: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        fs::write(&path, data)?;
        Ok(path)
    }
}

impl FileExporter for DirectoryExporter {
    fn save_file(&self, file_name: &str, data: &[u8], _mime_type: &str) -> Result<PathBuf> {
        self.write(file_name, data)
    }

    fn export_html_document(&self, file_name: &str, html: &str) -> Result<PathBuf> {
        let name = Path::new(file_name).with_extension("html");
        self.write(&name.to_string_lossy(), html.as_bytes())
    }
}

/// Turns save requests from the page into exporter calls
pub struct FileExportHandler {
    exporter: Arc<dyn FileExporter>,
    notifier: Arc<dyn Notifier>,
}

impl FileExportHandler {
    pub fn new(exporter: Arc<dyn FileExporter>, notifier: Arc<dyn Notifier>) -> Self {
        Self { exporter, notifier }
    }

    /// Export the file and tell the user how it went
    pub fn handle(&self, request: &SaveFileRequest) -> Result<PathBuf> {
        match self.export(request) {
            Ok(path) => {
                info!("Saved {} to {:?}", request.file_name, path);
                self.notifier
                    .notify(Notice::info(format!("Saved {}", request.file_name)));
                Ok(path)
            }
            Err(e) => {
                error!("Failed to save {}: {}", request.file_name, e);
                self.notifier.notify(Notice::error(format!(
                    "Could not save {}: {}",
                    request.file_name, e
                )));
                Err(e)
            }
        }
    }

    fn export(&self, request: &SaveFileRequest) -> Result<PathBuf> {
        let file_name = sanitize_file_name(&request.file_name)?;
        let data = decode_payload(&request.base64_data)?;

        if is_html(&request.mime_type) {
            let html = String::from_utf8(data)
                .map_err(|e| BridgeError::Export(format!("HTML is not UTF-8: {}", e)))?;
            self.exporter.export_html_document(&file_name, &html)
        } else {
            self.exporter.save_file(&file_name, &data, &request.mime_type)
        }
    }
}

/// Decode base64, tolerating a `data:<mime>;base64,` prefix
fn decode_payload(data: &str) -> Result<Vec<u8>> {
    let data = data.trim();
    let encoded = match data.find(";base64,") {
        Some(idx) if data.starts_with("data:") => &data[idx + ";base64,".len()..],
        _ => data,
    };
    Ok(STANDARD.decode(encoded)?)
}

/// Keep only the final path component so exports cannot escape the target
fn sanitize_file_name(name: &str) -> Result<String> {
    Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| BridgeError::Export(format!("invalid file name: {:?}", name)))
}

fn is_html(mime_type: &str) -> bool {
    mime_type
        .split(';')
        .next()
        .map(|m| m.trim().eq_ignore_ascii_case("text/html"))
        .unwrap_or(false)
}
