//! 変換設定（キーバリューストアに保存されたJSONから読み込む）

use serde::{Deserialize, Serialize};

use crate::converter::history::DEFAULT_HISTORY_CAPACITY;
use crate::models::ImageFormat;
use crate::platform::KeyValueStore;
use crate::utils::log_trace::log_warn;

const SETTINGS_KEY: &str = "base64_converter_settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// 履歴の最大件数
    pub history_capacity: usize,
    /// 履歴の保存キー
    pub storage_key: String,
    /// 画像読み込みのタイムアウト（ミリ秒）
    pub load_timeout_ms: u32,
    /// 通知バナーを消すまでの時間（ミリ秒）
    pub alert_dismiss_ms: u32,
    pub default_format: ImageFormat,
    /// 品質スライダーの初期値（0〜100）
    pub default_quality: u8,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            storage_key: "base64_history".to_string(),
            load_timeout_ms: 10_000,
            alert_dismiss_ms: 3_000,
            default_format: ImageFormat::Png,
            default_quality: 92,
        }
    }
}

impl ConverterConfig {
    /// 範囲外の値を補正する
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.history_capacity = self.history_capacity.max(1);
        self.load_timeout_ms = self.load_timeout_ms.max(1);
        self.default_quality = self.default_quality.min(100);
        if self.storage_key.trim().is_empty() {
            self.storage_key = defaults.storage_key;
        }
        if !self.default_format.is_encode_target() {
            self.default_format = defaults.default_format;
        }
        self
    }
}

/// 設定を読み込む（無い・壊れている場合はデフォルト）
pub fn load_settings(store: &impl KeyValueStore) -> ConverterConfig {
    let json = match store.get(SETTINGS_KEY) {
        Ok(Some(json)) => json,
        _ => return ConverterConfig::default(),
    };
    match serde_json::from_str::<ConverterConfig>(&json) {
        Ok(config) => config.sanitized(),
        Err(e) => {
            log_warn("settings", &format!("設定の解析失敗、デフォルトを使用: {}", e));
            ConverterConfig::default()
        }
    }
}
