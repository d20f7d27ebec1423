//! エラー型

use thiserror::Error;

/// エラー種別（通知やログの振り分け用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Format,
    Decode,
    State,
    Encode,
    Persistence,
    NotFound,
    Clipboard,
    Download,
}

/// 変換操作のエラー
///
/// メッセージはそのまま通知バナーに表示される。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("No input provided. Please paste a Base64 string")]
    EmptyInput,

    #[error("Please select an image file (got {0})")]
    NotAnImage(String),

    #[error("Invalid Base64 format")]
    InvalidBase64,

    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    #[error("No file uploaded. Please upload an image first")]
    NoUpload,

    #[error("Nothing to download or copy yet")]
    NoResult,

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Failed to save history: {0}")]
    Persistence(String),

    #[error("History entry {0} not found")]
    HistoryNotFound(i64),

    #[error("Failed to copy: {0}")]
    Clipboard(String),

    #[error("Failed to download: {0}")]
    Download(String),
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::EmptyInput | ConvertError::NotAnImage(_) => ErrorKind::Validation,
            ConvertError::InvalidBase64 => ErrorKind::Format,
            ConvertError::ImageLoad(_) => ErrorKind::Decode,
            ConvertError::NoUpload | ConvertError::NoResult => ErrorKind::State,
            ConvertError::Encode(_) => ErrorKind::Encode,
            ConvertError::Persistence(_) => ErrorKind::Persistence,
            ConvertError::HistoryNotFound(_) => ErrorKind::NotFound,
            ConvertError::Clipboard(_) => ErrorKind::Clipboard,
            ConvertError::Download(_) => ErrorKind::Download,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
