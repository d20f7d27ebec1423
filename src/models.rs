//! データ構造体モジュール

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

// ============================================
// 画像フォーマット
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// エンコード先として選択できるフォーマット
    pub const ENCODE_TARGETS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Webp];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }

    /// 表示用ラベル（PNG, JPEG...）
    pub fn label(&self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Gif => "GIF",
            ImageFormat::Webp => "WEBP",
        }
    }

    pub fn mime(&self) -> String {
        format!("image/{}", self.as_str())
    }

    /// `image/<subtype>` のサブタイプから判定（大文字小文字を区別しない）
    pub fn from_subtype(subtype: &str) -> Option<ImageFormat> {
        match subtype.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    /// 品質指定が効くかどうか
    pub fn is_lossy(&self) -> bool {
        matches!(self, ImageFormat::Jpeg | ImageFormat::Webp)
    }

    pub fn is_encode_target(&self) -> bool {
        Self::ENCODE_TARGETS.contains(self)
    }
}

// ============================================
// モード
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Decode,
    Encode,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Decode => "Base64 → Image",
            Mode::Encode => "Image → Base64",
        }
    }
}

// ============================================
// 変換結果
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// 現在表示中の変換結果
///
/// data URLは保持せず、常に `format` と `base64` から組み立てる。
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    base64: String,
    format: ImageFormat,
    dimensions: Dimensions,
}

impl ImageResult {
    pub fn new(base64: impl Into<String>, format: ImageFormat, dimensions: Dimensions) -> Self {
        Self {
            base64: base64.into(),
            format,
            dimensions,
        }
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn data_url(&self) -> String {
        build_data_url(self.format, &self.base64)
    }

    pub fn info(&self) -> ImageInfo {
        ImageInfo::new(self.dimensions, self.format, self.base64.len())
    }
}

/// `data:image/<format>;base64,<payload>` を組み立てる
pub fn build_data_url(format: ImageFormat, base64: &str) -> String {
    format!("data:{};base64,{}", format.mime(), base64)
}

// ============================================
// アップロードファイル
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub mime: String,
    pub data_url: String,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data_url: impl Into<String>) -> Result<Self, ConvertError> {
        let mime = mime.into();
        if !is_image_mime(&mime) {
            return Err(ConvertError::NotAnImage(mime));
        }
        Ok(Self {
            name: name.into(),
            mime,
            data_url: data_url.into(),
        })
    }
}

pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

// ============================================
// 履歴
// ============================================

/// 永続化される履歴エントリ
///
/// JSONのフィールド名は `dataUrl` などのcamelCase。`timestamp` が無い
/// データは旧形式として扱うため、ここではdefaultを付けない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub data_url: String,
    pub format: ImageFormat,
    pub size: usize,
    pub width: u32,
    pub height: u32,
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn info(&self) -> ImageInfo {
        ImageInfo::new(Dimensions::new(self.width, self.height), self.format, self.size)
    }
}

// ============================================
// 表示用メタデータ
// ============================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageInfo {
    pub dimensions: Dimensions,
    pub format: ImageFormat,
    /// デコード後のおおよそのバイト数
    pub byte_size: u64,
}

impl ImageInfo {
    pub fn new(dimensions: Dimensions, format: ImageFormat, base64_len: usize) -> Self {
        Self {
            dimensions,
            format,
            byte_size: crate::utils::decoded_byte_size(base64_len),
        }
    }

    pub fn dimensions_label(&self) -> String {
        format!("{} × {}px", self.dimensions.width, self.dimensions.height)
    }

    pub fn size_label(&self) -> String {
        crate::utils::format_size(self.byte_size)
    }

    /// 履歴・ビューワ用の1行サマリ
    pub fn summary(&self) -> String {
        format!("{} • {} • {}", self.dimensions_label(), self.format.label(), self.size_label())
    }
}

// ============================================
// 通知
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: u64,
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn icon(&self) -> &'static str {
        match self.kind {
            AlertKind::Success => "✅",
            AlertKind::Error => "⚠️",
        }
    }

    pub fn class(&self) -> &'static str {
        match self.kind {
            AlertKind::Success => "alert success",
            AlertKind::Error => "alert error",
        }
    }
}
