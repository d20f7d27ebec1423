//! ホスト環境の機能（画像デコード、Canvas再エンコード、クリップボード、ストレージ）
//!
//! 変換ロジックはこれらのトレイト越しにのみブラウザへ触れる。

pub mod browser;
pub mod memory;
#[cfg(test)]
pub mod testing;

use std::future::Future;

use crate::models::{Dimensions, ImageFormat};

pub use browser::{BrowserHost, BrowserStore};
pub use memory::MemoryStore;

/// Canvas再エンコードの結果
#[derive(Debug, Clone, PartialEq)]
pub struct Rasterized {
    pub data_url: String,
    pub dimensions: Dimensions,
}

/// 画像処理・出力系のホスト機能
#[allow(async_fn_in_trait)]
pub trait ImageHost {
    /// data URLを画像として読み込み、ピクセル寸法を返す
    async fn load_image(&self, data_url: &str) -> Result<Dimensions, String>;

    /// 画像を等倍のCanvasに描画し、指定フォーマットで再エンコードする
    async fn rasterize(&self, data_url: &str, format: ImageFormat, quality: f64) -> Result<Rasterized, String>;

    async fn write_clipboard(&self, text: &str) -> Result<(), String>;

    /// data URLをファイルとして保存させる
    fn save_file(&self, data_url: &str, filename: &str) -> Result<(), String>;

    /// 指定ミリ秒後に完了するタイマー
    fn sleep(&self, millis: u32) -> impl Future<Output = ()>;
}

/// キーバリューストア（localStorage相当）
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, String>;
    fn set(&self, key: &str, value: &str) -> Result<(), String>;
    fn remove(&self, key: &str) -> Result<(), String>;
}
