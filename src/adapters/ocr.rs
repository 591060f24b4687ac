use crate::core::ConfigProvider;
use crate::utils::error::{DeskError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

pub const OCR_PATH: &str = "ocr/GOT";
/// 影像在 multipart 表單中的欄位名稱
pub const ATTACHMENT_FIELD: &str = "attachment_0";

#[derive(Debug, Deserialize)]
struct OcrResponse {
    text: Option<String>,
    error: Option<String>,
}

/// Client for the document OCR microservice.
#[derive(Debug, Clone)]
pub struct OcrClient {
    client: Client,
    base_url: String,
}

impl OcrClient {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.ocr_base_url().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, OCR_PATH)
    }

    pub async fn extract_text(&self, file_name: &str, image: Vec<u8>, mime: &str) -> Result<String> {
        tracing::info!("🔎 Sending {} ({} bytes) to OCR service", file_name, image.len());

        let part = Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part(ATTACHMENT_FIELD, part);

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<OcrResponse> = serde_json::from_str(&body).ok();

        match parsed {
            Some(OcrResponse {
                text: Some(text), ..
            }) if status.is_success() => Ok(text),
            Some(OcrResponse {
                error: Some(message),
                ..
            }) => Err(DeskError::OcrError {
                status: status.as_u16(),
                message,
            }),
            _ => Err(DeskError::OcrError {
                status: status.as_u16(),
                message: if body.trim().is_empty() {
                    "Empty response from OCR service".to_string()
                } else {
                    body
                },
            }),
        }
    }
}
