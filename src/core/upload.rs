use crate::domain::model::DocumentUpload;
use crate::utils::error::{DeskError, Result};
use std::path::Path;

pub const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

/// Best-effort MIME type from the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => DEFAULT_FILE_TYPE,
    }
}

pub fn prepare_upload(
    company_name: &str,
    file_name: &str,
    file_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<DocumentUpload> {
    if company_name.trim().is_empty() {
        return Err(DeskError::validation("Please select a company"));
    }
    if file_name.trim().is_empty() {
        return Err(DeskError::validation("Please upload a document"));
    }

    let file_type = file_type
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_FILE_TYPE);

    Ok(DocumentUpload {
        file_name: file_name.to_string(),
        file_type: file_type.to_string(),
        company_name: company_name.trim().to_string(),
        bytes,
    })
}
