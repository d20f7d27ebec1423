//! Base64入力の正規化・検証・フォーマット判定

use crate::error::{ConvertError, Result};
use crate::models::ImageFormat;
use crate::utils::decode_base64_lenient;

/// フォーマット判定に使う先頭文字数（最長のマジックバイトを含む長さ）
const SNIFF_CHARS: usize = 20;

/// 「例を読み込む」で入力する5×5のPNG
pub const SAMPLE_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAUAAAAFCAYAAACNbyblAAAAHElEQVQI12P4//8/w38GIAXDIBKE0DHxgljNBAAO9TXL0Y4OHwAAAABJRU5ErkJggg==";

const DATA_URL_HEAD: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";

/// `data:image/<type>;base64,<payload>` を (type, payload) に分解する
///
/// `<type>` は英字1文字以上、payloadは空でないこと。大文字小文字は区別しない。
pub fn split_data_url(input: &str) -> Option<(&str, &str)> {
    let head = input.get(..DATA_URL_HEAD.len())?;
    if !head.eq_ignore_ascii_case(DATA_URL_HEAD) {
        return None;
    }
    let rest = &input[DATA_URL_HEAD.len()..];
    let type_len = rest.bytes().take_while(|b| b.is_ascii_alphabetic()).count();
    if type_len == 0 {
        return None;
    }
    let (subtype, rest) = rest.split_at(type_len);
    let marker = rest.get(..BASE64_MARKER.len())?;
    if !marker.eq_ignore_ascii_case(BASE64_MARKER) {
        return None;
    }
    let payload = &rest[BASE64_MARKER.len()..];
    if payload.is_empty() {
        return None;
    }
    Some((subtype, payload))
}

/// 入力テキストから検証済みのBase64ペイロードを取り出す
pub fn sanitize(raw: &str) -> Result<String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(ConvertError::EmptyInput);
    }

    let payload = split_data_url(input).map(|(_, payload)| payload).unwrap_or(input);
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    if !is_base64_grammar(&payload) {
        return Err(ConvertError::InvalidBase64);
    }
    Ok(payload)
}

/// `[A-Za-z0-9+/]*` の後に末尾のみ0〜2個の `=`
pub fn is_base64_grammar(payload: &str) -> bool {
    let body = payload.trim_end_matches('=');
    let padding = payload.len() - body.len();
    padding <= 2
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

/// 先頭のマジックバイトから画像フォーマットを推定する
///
/// 判定できない場合やデコードに失敗した場合はPNGとして扱う。
pub fn sniff_format(payload: &str) -> ImageFormat {
    let prefix = payload.get(..SNIFF_CHARS).unwrap_or(payload);
    let Some(bytes) = decode_base64_lenient(prefix) else {
        return ImageFormat::Png;
    };

    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        ImageFormat::Png
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        ImageFormat::Jpeg
    } else if bytes.starts_with(b"GIF") {
        ImageFormat::Gif
    } else if bytes.windows(4).any(|w| w == b"WEBP") {
        ImageFormat::Webp
    } else {
        ImageFormat::Png
    }
}
