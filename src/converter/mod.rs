//! 変換・履歴マネージャ
//!
//! 状態遷移は `ConverterState` の純粋な関数で行い、ホスト機能の待ち合わせが
//! すべて終わった後にまとめて反映する。描画はUI側が操作後に行う。

pub mod history;
pub mod pipeline;

use std::cell::RefCell;
use std::future::Future;

use futures::future::{select, Either};

use crate::error::{ConvertError, Result};
use crate::models::{HistoryEntry, ImageFormat, ImageInfo, ImageResult, Mode, UploadedFile};
use crate::platform::{ImageHost, KeyValueStore};
use crate::utils::log_trace::{log_error, log_info, log_info_with_data, log_warn};
use crate::utils::settings::ConverterConfig;
use crate::utils::{cache, download_filename, local_time_from_millis, DownloadKind};
use history::History;

// ============================================
// 状態
// ============================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverterState {
    pub mode: Mode,
    pub result: Option<ImageResult>,
    pub upload: Option<UploadedFile>,
    pub history: History,
}

impl ConverterState {
    pub fn new(history: History) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    /// タブ切り替え（結果は消すが履歴とアップロードは残す）
    pub fn switch_mode(self, mode: Mode) -> Self {
        Self {
            mode,
            result: None,
            ..self
        }
    }

    pub fn clear_result(self) -> Self {
        Self { result: None, ..self }
    }

    pub fn with_upload(self, upload: UploadedFile) -> Self {
        Self {
            upload: Some(upload),
            ..self
        }
    }

    pub fn clear_upload(self) -> Self {
        Self {
            upload: None,
            result: None,
            ..self
        }
    }

    /// 変換成功：結果を差し替えて履歴の先頭に追加
    pub fn record(mut self, result: ImageResult, entry: HistoryEntry) -> Self {
        self.history.push(entry);
        Self {
            result: Some(result),
            ..self
        }
    }

    pub fn clear_history(mut self) -> Self {
        self.history.clear();
        self
    }
}

/// 作業とタイマーを競わせ、タイマーが先なら `None`
///
/// 負けた側はその場で破棄されるので、両方が同じ操作を完了させることはない。
pub async fn within<T>(work: impl Future<Output = T>, deadline: impl Future<Output = ()>) -> Option<T> {
    futures::pin_mut!(work);
    futures::pin_mut!(deadline);
    match select(work, deadline).await {
        Either::Left((value, _)) => Some(value),
        Either::Right(((), _)) => None,
    }
}

// ============================================
// マネージャ
// ============================================

pub struct ConversionManager<H, S> {
    host: H,
    store: S,
    config: ConverterConfig,
    state: RefCell<ConverterState>,
}

impl<H: ImageHost, S: KeyValueStore> ConversionManager<H, S> {
    pub fn new(host: H, store: S, config: ConverterConfig) -> Self {
        let history = cache::load_history(&store, &config.storage_key, config.history_capacity);
        log_info("history", &format!("履歴を読み込みました: {}件", history.len()));
        Self {
            host,
            store,
            config,
            state: RefCell::new(ConverterState::new(history)),
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    fn transition(&self, f: impl FnOnce(ConverterState) -> ConverterState) {
        let current = self.state.take();
        self.state.replace(f(current));
    }

    // ---- 読み出し ----

    pub fn mode(&self) -> Mode {
        self.state.borrow().mode
    }

    pub fn result(&self) -> Option<ImageResult> {
        self.state.borrow().result.clone()
    }

    pub fn result_info(&self) -> Option<ImageInfo> {
        self.state.borrow().result.as_ref().map(|r| r.info())
    }

    pub fn upload(&self) -> Option<UploadedFile> {
        self.state.borrow().upload.clone()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.state.borrow().history.entries().to_vec()
    }

    // ---- モード・クリア ----

    pub fn switch_mode(&self, mode: Mode) {
        self.transition(|s| s.switch_mode(mode));
    }

    pub fn clear_result(&self) {
        self.transition(ConverterState::clear_result);
    }

    pub fn set_upload(&self, file: UploadedFile) {
        log_info("encode", &format!("アップロード: {} ({})", file.name, file.mime));
        self.transition(|s| s.with_upload(file));
    }

    pub fn clear_upload(&self) {
        self.transition(ConverterState::clear_upload);
    }

    // ---- デコード ----

    /// Base64テキスト → 画像
    pub async fn decode(&self, raw: &str) -> Result<ImageResult> {
        let payload = pipeline::sanitize(raw)?;
        let format = pipeline::sniff_format(&payload);
        let data_url = crate::models::build_data_url(format, &payload);

        let dimensions = match within(self.host.load_image(&data_url), self.host.sleep(self.config.load_timeout_ms)).await {
            Some(Ok(dimensions)) => dimensions,
            Some(Err(e)) => {
                log_error("decode", &format!("画像読み込み失敗: {}", e));
                return Err(ConvertError::ImageLoad(e));
            }
            None => {
                log_error("decode", "画像読み込みタイムアウト");
                return Err(ConvertError::ImageLoad(format!("timed out after {} ms", self.config.load_timeout_ms)));
            }
        };

        let result = ImageResult::new(payload, format, dimensions);
        self.commit(result.clone(), "decode");
        Ok(result)
    }

    // ---- エンコード ----

    /// アップロード画像 → 指定フォーマットのBase64
    pub async fn encode(&self, target: ImageFormat, quality: f64) -> Result<ImageResult> {
        let upload = self.upload().ok_or(ConvertError::NoUpload)?;
        if !target.is_encode_target() {
            return Err(ConvertError::Encode(format!("{} is not a supported output format", target.label())));
        }
        let quality = if quality.is_nan() { 1.0 } else { quality.clamp(0.0, 1.0) };

        let rasterized = match within(
            self.host.rasterize(&upload.data_url, target, quality),
            self.host.sleep(self.config.load_timeout_ms),
        )
        .await
        {
            Some(Ok(rasterized)) => rasterized,
            Some(Err(e)) => {
                log_error("encode", &format!("再エンコード失敗: {}", e));
                return Err(ConvertError::Encode(e));
            }
            None => {
                log_error("encode", "画像読み込みタイムアウト");
                return Err(ConvertError::Encode(format!("timed out after {} ms", self.config.load_timeout_ms)));
            }
        };

        // Canvasが非対応フォーマットをPNGで返すことがあるので、実際のMIMEを採用する
        let (subtype, payload) = pipeline::split_data_url(&rasterized.data_url)
            .ok_or_else(|| ConvertError::Encode("the canvas produced no image data".to_string()))?;
        let format = ImageFormat::from_subtype(subtype)
            .ok_or_else(|| ConvertError::Encode(format!("unexpected output type image/{}", subtype)))?;
        if format != target {
            log_warn("encode", &format!("{}は非対応のため{}で出力しました", target.label(), format.label()));
        }

        let result = ImageResult::new(payload, format, rasterized.dimensions);
        self.commit(result.clone(), "encode");
        Ok(result)
    }

    /// 成功時の反映：結果差し替え・履歴追加・保存を1ステップで行う
    fn commit(&self, result: ImageResult, category: &str) {
        let now = chrono::Local::now();
        let entry = {
            let state = self.state.borrow();
            HistoryEntry {
                id: state.history.next_id(now.timestamp_millis()),
                data_url: result.data_url(),
                format: result.format(),
                size: result.base64().len(),
                width: result.dimensions().width,
                height: result.dimensions().height,
                timestamp: now.format("%H:%M:%S").to_string(),
            }
        };
        log_info_with_data(
            category,
            "変換成功",
            serde_json::json!({
                "format": result.format().as_str(),
                "width": entry.width,
                "height": entry.height,
                "base64_len": entry.size,
            }),
        );

        self.transition(|s| s.record(result, entry));

        let state = self.state.borrow();
        if let Err(e) = cache::save_history(&self.store, &self.config.storage_key, &state.history) {
            // 保存失敗はログのみ（メモリ上の履歴はそのまま）
            log_warn("history", &format!("履歴の保存に失敗しました（ファイルが大きすぎる可能性）: {}", e));
        }
    }

    // ---- 履歴 ----

    pub fn clear_history(&self) {
        self.transition(ConverterState::clear_history);
        if let Err(e) = cache::clear_history(&self.store, &self.config.storage_key) {
            log_warn("history", &format!("保存済み履歴の削除失敗: {}", e));
        }
        log_info("history", "履歴をクリアしました");
    }

    pub fn entry(&self, id: i64) -> Result<HistoryEntry> {
        self.state
            .borrow()
            .history
            .find(id)
            .cloned()
            .ok_or(ConvertError::HistoryNotFound(id))
    }

    // ---- 出力 ----

    /// 現在の結果をダウンロードし、ファイル名を返す
    pub fn download_current(&self) -> Result<String> {
        let result = self.result().ok_or(ConvertError::NoResult)?;
        let filename = download_filename(chrono::Local::now(), DownloadKind::Converted, result.format());
        self.host
            .save_file(&result.data_url(), &filename)
            .map_err(ConvertError::Download)?;
        log_info("download", &filename);
        Ok(filename)
    }

    /// 履歴エントリをダウンロード（ファイル名は作成時刻から）
    pub fn download_entry(&self, id: i64) -> Result<String> {
        let entry = self.entry(id)?;
        let filename = download_filename(local_time_from_millis(entry.id), DownloadKind::History, entry.format);
        self.host
            .save_file(&entry.data_url, &filename)
            .map_err(ConvertError::Download)?;
        log_info("download", &filename);
        Ok(filename)
    }

    /// 現在のBase64をクリップボードへ
    pub async fn copy_base64(&self) -> Result<()> {
        let result = self.result().ok_or(ConvertError::NoResult)?;
        self.host.write_clipboard(result.base64()).await.map_err(|e| {
            log_error("clipboard", &e);
            ConvertError::Clipboard(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::Dimensions;
    use crate::platform::testing::{pixels, sample_base64, sample_upload, FakeHost};
    use crate::platform::MemoryStore;
    use crate::utils::log_trace::get_logs;
    use futures::executor::block_on;
    use std::rc::Rc;

    type TestManager = ConversionManager<FakeHost, Rc<MemoryStore>>;

    fn manager_with(store: Rc<MemoryStore>) -> TestManager {
        ConversionManager::new(FakeHost::new(), store, ConverterConfig::default())
    }

    fn manager() -> TestManager {
        manager_with(Rc::new(MemoryStore::new()))
    }

    #[test]
    fn test_decode_detects_each_format() {
        let m = manager();
        for format in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif, ImageFormat::Webp] {
            let payload = sample_base64(format, 4, 3);
            let result = block_on(m.decode(&payload)).unwrap();
            assert_eq!(result.format(), format);
            assert_eq!(result.base64(), payload);
            assert_eq!(result.dimensions(), Dimensions::new(4, 3));
        }
    }

    #[test]
    fn test_decode_accepts_data_url_with_whitespace() {
        let m = manager();
        let payload = sample_base64(ImageFormat::Png, 2, 2);
        let (a, b) = payload.split_at(10);
        let input = format!("data:image/PNG;base64,{}\n{}\n", a, b);
        let result = block_on(m.decode(&input)).unwrap();
        assert_eq!(result.base64(), payload);
        assert_eq!(m.result(), Some(result));
    }

    #[test]
    fn test_decode_empty_input() {
        let m = manager();
        assert_eq!(block_on(m.decode("")).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(block_on(m.decode("   ")).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_invalid_base64_keeps_previous_result() {
        let m = manager();
        let first = block_on(m.decode(&sample_base64(ImageFormat::Gif, 1, 1))).unwrap();

        let err = block_on(m.decode("iVBOR!w0K")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let err = block_on(m.decode("iVBO=Rw0K")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        assert_eq!(m.result(), Some(first));
        assert_eq!(m.history().len(), 1);
    }

    #[test]
    fn test_unrecognized_payload_fails_to_load() {
        let m = manager();
        // "Hello world!" はPNGとして扱われ、画像読み込みで失敗する
        let err = block_on(m.decode("SGVsbG8gd29ybGQh")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(m.result().is_none());
        assert!(m.history().is_empty());
    }

    #[test]
    fn test_decode_timeout() {
        let m = manager();
        m.host().stall.set(true);
        let err = block_on(m.decode(&sample_base64(ImageFormat::Png, 1, 1))).unwrap_err();
        assert!(matches!(err, ConvertError::ImageLoad(ref msg) if msg.contains("timed out")));
        assert!(m.result().is_none());
    }

    #[test]
    fn test_encode_requires_upload() {
        let m = manager();
        let err = block_on(m.encode(ImageFormat::Png, 0.9)).unwrap_err();
        assert_eq!(err, ConvertError::NoUpload);
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn test_encode_then_decode_round_trip_lossless() {
        let m = manager();
        let upload = sample_upload(ImageFormat::Jpeg, 6, 4);
        let (_, source) = pipeline::split_data_url(&upload.data_url).unwrap();
        let source_pixels = pixels(source);
        m.set_upload(upload);

        for target in [ImageFormat::Png, ImageFormat::Webp] {
            let encoded = block_on(m.encode(target, 0.5)).unwrap();
            assert_eq!(encoded.format(), target);

            let decoded = block_on(m.decode(encoded.base64())).unwrap();
            assert_eq!(decoded.format(), target);
            assert_eq!(pixels(decoded.base64()), source_pixels);
        }
    }

    #[test]
    fn test_encode_to_jpeg_preserves_dimensions() {
        let m = manager();
        m.set_upload(sample_upload(ImageFormat::Png, 7, 5));

        let encoded = block_on(m.encode(ImageFormat::Jpeg, 0.3)).unwrap();
        assert_eq!(encoded.format(), ImageFormat::Jpeg);
        assert!(encoded.data_url().starts_with("data:image/jpeg;base64,/9j/"));

        let decoded = block_on(m.decode(encoded.base64())).unwrap();
        assert_eq!(decoded.format(), ImageFormat::Jpeg);
        assert_eq!(decoded.dimensions(), Dimensions::new(7, 5));
    }

    #[test]
    fn test_encode_accepts_any_quality() {
        let m = manager();
        m.set_upload(sample_upload(ImageFormat::Png, 2, 2));
        assert!(block_on(m.encode(ImageFormat::Jpeg, -3.0)).is_ok());
        assert!(block_on(m.encode(ImageFormat::Jpeg, f64::NAN)).is_ok());
        assert!(block_on(m.encode(ImageFormat::Png, 42.0)).is_ok());
    }

    #[test]
    fn test_encode_rejects_gif_target_and_bad_upload() {
        let m = manager();
        m.set_upload(sample_upload(ImageFormat::Png, 2, 2));
        let err = block_on(m.encode(ImageFormat::Gif, 1.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);

        let broken = UploadedFile::new("broken.png", "image/png", "data:image/png;base64,AAAA").unwrap();
        m.set_upload(broken);
        let before = m.result();
        let err = block_on(m.encode(ImageFormat::Png, 1.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
        assert_eq!(m.result(), before);
    }

    #[test]
    fn test_encode_records_format_the_host_produced() {
        let m = manager();
        m.host().unsupported.set(Some(ImageFormat::Webp));
        m.set_upload(sample_upload(ImageFormat::Jpeg, 3, 2));

        let encoded = block_on(m.encode(ImageFormat::Webp, 0.8)).unwrap();
        assert_eq!(encoded.format(), ImageFormat::Png);
        assert!(encoded.data_url().starts_with("data:image/png;base64,iVBOR"));
        assert_eq!(encoded.dimensions(), Dimensions::new(3, 2));

        let entry = &m.history()[0];
        assert_eq!(entry.format, ImageFormat::Png);
        assert_eq!(entry.data_url, encoded.data_url());
        assert!(get_logs().iter().any(|l| l.level == "warn" && l.category == "encode"));
    }

    #[test]
    fn test_history_keeps_last_two_newest_first() {
        let store = Rc::new(MemoryStore::new());
        let m = manager_with(store.clone());
        let a = block_on(m.decode(&sample_base64(ImageFormat::Png, 1, 1))).unwrap();
        let b = block_on(m.decode(&sample_base64(ImageFormat::Gif, 2, 2))).unwrap();
        let c = block_on(m.decode(&sample_base64(ImageFormat::Jpeg, 3, 3))).unwrap();

        let history = m.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].data_url, c.data_url());
        assert_eq!(history[1].data_url, b.data_url());
        assert!(history.iter().all(|e| e.data_url != a.data_url()));
        assert!(history[0].id > history[1].id);
        assert_eq!((history[0].width, history[0].height), (3, 3));

        // 永続化された内容も同じ
        let reloaded = manager_with(store);
        assert_eq!(reloaded.history(), history);
    }

    #[test]
    fn test_clear_history_then_reload_is_empty() {
        let store = Rc::new(MemoryStore::new());
        let m = manager_with(store.clone());
        block_on(m.decode(&sample_base64(ImageFormat::Png, 1, 1))).unwrap();
        m.clear_history();
        assert!(m.history().is_empty());

        let reloaded = manager_with(store);
        assert!(reloaded.history().is_empty());
    }

    #[test]
    fn test_legacy_history_is_discarded_on_load() {
        let store = Rc::new(MemoryStore::new());
        store
            .set(
                "base64_history",
                r#"[{"id": 5, "dataUrl": "data:image/png;base64,AAAA", "format": "png", "size": 4, "width": 1, "height": 1}]"#,
            )
            .unwrap();
        let m = manager_with(store);
        assert!(m.history().is_empty());
    }

    #[test]
    fn test_persistence_failure_is_not_an_error() {
        let store = Rc::new(MemoryStore::new());
        let m = manager_with(store.clone());
        store.set_reject_writes(true);

        let result = block_on(m.decode(&sample_base64(ImageFormat::Png, 1, 1)));
        assert!(result.is_ok());
        assert_eq!(m.history().len(), 1);
        assert!(get_logs().iter().any(|l| l.level == "warn" && l.category == "history"));

        store.set_reject_writes(false);
        assert!(manager_with(store).history().is_empty());
    }

    #[test]
    fn test_switch_mode_clears_result_only() {
        let m = manager();
        m.set_upload(sample_upload(ImageFormat::Png, 2, 2));
        block_on(m.encode(ImageFormat::Png, 1.0)).unwrap();

        m.switch_mode(Mode::Decode);
        assert_eq!(m.mode(), Mode::Decode);
        assert!(m.result().is_none());
        assert!(m.upload().is_some());
        assert_eq!(m.history().len(), 1);

        m.clear_upload();
        assert!(m.upload().is_none());
    }

    #[test]
    fn test_history_lookup_and_download() {
        let m = manager();
        block_on(m.decode(&sample_base64(ImageFormat::Webp, 1, 1))).unwrap();
        let id = m.history()[0].id;

        assert_eq!(m.entry(id).unwrap().format, ImageFormat::Webp);
        assert_eq!(m.entry(id + 1).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(m.download_entry(-1).unwrap_err(), ConvertError::HistoryNotFound(-1));

        let filename = m.download_entry(id).unwrap();
        assert!(filename.ends_with("-History.webp"));
        let expected = download_filename(local_time_from_millis(id), DownloadKind::History, ImageFormat::Webp);
        assert_eq!(filename, expected);
    }

    #[test]
    fn test_download_current_and_copy() {
        let m = manager();
        assert_eq!(m.download_current().unwrap_err(), ConvertError::NoResult);
        assert_eq!(block_on(m.copy_base64()).unwrap_err(), ConvertError::NoResult);

        let result = block_on(m.decode(&sample_base64(ImageFormat::Jpeg, 2, 2))).unwrap();
        let filename = m.download_current().unwrap();
        assert!(filename.ends_with("-Converted.jpeg"));
        assert_eq!(m.host().saved.borrow()[0], (result.data_url(), filename));

        block_on(m.copy_base64()).unwrap();
        assert_eq!(m.host().clipboard.borrow().as_slice(), [result.base64().to_string()]);

        m.host().fail_clipboard.set(true);
        assert_eq!(block_on(m.copy_base64()).unwrap_err().kind(), ErrorKind::Clipboard);
    }

    #[test]
    fn test_configured_capacity() {
        let config = ConverterConfig {
            history_capacity: 3,
            ..ConverterConfig::default()
        };
        let m = ConversionManager::new(FakeHost::new(), MemoryStore::new(), config);
        for size in 1..=4 {
            block_on(m.decode(&sample_base64(ImageFormat::Png, size, size))).unwrap();
        }
        let widths: Vec<u32> = m.history().iter().map(|e| e.width).collect();
        assert_eq!(widths, vec![4, 3, 2]);
    }

    #[test]
    fn test_state_transitions_are_pure() {
        let result = ImageResult::new("AAAA", ImageFormat::Png, Dimensions::new(1, 1));
        let entry = HistoryEntry {
            id: 1,
            data_url: result.data_url(),
            format: ImageFormat::Png,
            size: 4,
            width: 1,
            height: 1,
            timestamp: "00:00:01".to_string(),
        };
        let state = ConverterState::default()
            .switch_mode(Mode::Encode)
            .record(result.clone(), entry);
        assert_eq!(state.mode, Mode::Encode);
        assert_eq!(state.result.as_ref(), Some(&result));
        assert_eq!(state.history.len(), 1);

        let cleared = state.clear_result().clear_history();
        assert!(cleared.result.is_none());
        assert!(cleared.history.is_empty());
    }
}
