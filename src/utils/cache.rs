//! 履歴のキーバリューストア保存

use crate::converter::history::History;
use crate::error::ConvertError;
use crate::models::HistoryEntry;
use crate::platform::KeyValueStore;
use crate::utils::log_trace::log_warn;

/// 保存済みJSONを解釈する
///
/// - JSONとして読めなければ空
/// - `timestamp` が無い・空のエントリが1件でもあれば旧形式として全件破棄（`None`）
/// - 1件でも解釈できないエントリがあれば空（一部だけ残すことはしない）
pub fn parse_history(json: &str) -> Option<Vec<HistoryEntry>> {
    let raw: Vec<serde_json::Value> = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(_) => return Some(Vec::new()),
    };
    if raw.iter().any(is_legacy_entry) {
        return None;
    }
    match serde_json::from_value::<Vec<HistoryEntry>>(serde_json::Value::Array(raw)) {
        Ok(entries) => Some(entries),
        Err(e) => {
            log_warn("history", &format!("履歴の解析失敗、空の履歴を使用: {}", e));
            Some(Vec::new())
        }
    }
}

fn is_legacy_entry(item: &serde_json::Value) -> bool {
    match item.get("timestamp") {
        None => true,
        Some(t) => t.is_null() || t.as_str() == Some(""),
    }
}

/// ストアから履歴を読み込む
pub fn load_history(store: &impl KeyValueStore, key: &str, capacity: usize) -> History {
    let json = match store.get(key) {
        Ok(Some(json)) => json,
        Ok(None) => return History::new(capacity),
        Err(e) => {
            log_warn("history", &format!("履歴の読み込み失敗: {}", e));
            return History::new(capacity);
        }
    };

    match parse_history(&json) {
        Some(entries) => History::from_entries(entries, capacity),
        None => {
            log_warn("history", "旧形式の履歴を検出したため削除します");
            if let Err(e) = store.remove(key) {
                log_warn("history", &format!("旧形式の履歴の削除失敗: {}", e));
            }
            History::new(capacity)
        }
    }
}

/// 履歴を保存
pub fn save_history(store: &impl KeyValueStore, key: &str, history: &History) -> Result<(), ConvertError> {
    let json = serde_json::to_string(history.entries()).map_err(|e| ConvertError::Persistence(e.to_string()))?;
    store.set(key, &json).map_err(ConvertError::Persistence)
}

/// 保存済み履歴を削除
pub fn clear_history(store: &impl KeyValueStore, key: &str) -> Result<(), ConvertError> {
    store.remove(key).map_err(ConvertError::Persistence)
}
