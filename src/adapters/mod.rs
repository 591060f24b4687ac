// Adapters layer: concrete implementations for external systems (workflow webhooks, OCR service, local files).

pub mod http;
pub mod ocr;
pub mod storage;
