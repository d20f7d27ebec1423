//! ユーティリティモジュール

pub mod cache;
pub mod log_trace;
pub mod settings;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Local};

use crate::models::ImageFormat;

// 共通ヘルパー

/// パディング有無・末尾ビットを問わない寛容なデコーダ（atob相当）
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Base64デコード（寛容モード）
pub fn decode_base64_lenient(data: &str) -> Option<Vec<u8>> {
    LENIENT.decode(data).ok()
}

/// Base64文字数からデコード後のおおよそのバイト数を求める
pub fn decoded_byte_size(base64_len: usize) -> u64 {
    (base64_len as u64 * 3) / 4
}

/// バイト数を人間向けの表記に変換
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

// ============================================
// ダウンロードファイル名
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    /// 変換直後の結果
    Converted,
    /// 履歴からの再ダウンロード
    History,
}

impl DownloadKind {
    fn suffix(&self) -> &'static str {
        match self {
            DownloadKind::Converted => "Converted",
            DownloadKind::History => "History",
        }
    }
}

/// `YYYY-MM-DD-HH-mm-ss-<Suffix>.<format>` 形式のファイル名
pub fn download_filename(at: DateTime<Local>, kind: DownloadKind, format: ImageFormat) -> String {
    format!("{}-{}.{}", at.format("%Y-%m-%d-%H-%M-%S"), kind.suffix(), format.as_str())
}

/// エポックミリ秒をローカル時刻に変換（範囲外なら現在時刻）
pub fn local_time_from_millis(millis: i64) -> DateTime<Local> {
    DateTime::<chrono::Utc>::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local))
        .unwrap_or_else(Local::now)
}

/// 品質スライダー値(0〜100)を0.0〜1.0に変換
pub fn quality_from_percent(percent: u8) -> f64 {
    f64::from(percent.min(100)) / 100.0
}
