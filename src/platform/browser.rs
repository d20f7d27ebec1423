//! ブラウザ実装（web_sys経由）

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, File, FileReader, HtmlCanvasElement, HtmlImageElement};

use super::{ImageHost, KeyValueStore, MemoryStore, Rasterized};
use crate::models::{Dimensions, ImageFormat};

fn js_err(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

// ============================================
// 画像読み込み
// ============================================

type EventCallback = Closure<dyn FnMut(web_sys::Event)>;

/// 読み込み中の画像
///
/// 破棄時にコールバックを外すので、タイムアウトで捨てられた後に
/// onload/onerror が発火しても何も起きない。
struct PendingImage {
    img: HtmlImageElement,
    _onload: EventCallback,
    _onerror: EventCallback,
}

impl Drop for PendingImage {
    fn drop(&mut self) {
        self.img.set_onload(None);
        self.img.set_onerror(None);
    }
}

/// data URLから画像を読み込む（onload / onerror の先着1回だけを採用）
async fn load_element(data_url: &str) -> Result<HtmlImageElement, String> {
    let img = HtmlImageElement::new().map_err(js_err)?;
    let (tx, rx) = oneshot::channel::<Result<(), String>>();
    let slot = Rc::new(RefCell::new(Some(tx)));

    let load_slot = slot.clone();
    let onload = Closure::wrap(Box::new(move |_: web_sys::Event| {
        if let Some(tx) = load_slot.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    }) as Box<dyn FnMut(_)>);

    let error_slot = slot;
    let onerror = Closure::wrap(Box::new(move |_: web_sys::Event| {
        if let Some(tx) = error_slot.borrow_mut().take() {
            let _ = tx.send(Err("the browser could not decode the image".to_string()));
        }
    }) as Box<dyn FnMut(_)>);

    img.set_onload(Some(onload.as_ref().unchecked_ref()));
    img.set_onerror(Some(onerror.as_ref().unchecked_ref()));

    let pending = PendingImage {
        img,
        _onload: onload,
        _onerror: onerror,
    };
    pending.img.set_src(data_url);

    match rx.await {
        Ok(Ok(())) => Ok(pending.img.clone()),
        Ok(Err(e)) => Err(e),
        Err(_) => Err("image load was abandoned".to_string()),
    }
}

fn natural_dimensions(img: &HtmlImageElement) -> Dimensions {
    Dimensions::new(img.natural_width(), img.natural_height())
}

// ============================================
// ホスト実装
// ============================================

#[derive(Clone, Copy, Default)]
pub struct BrowserHost;

impl ImageHost for BrowserHost {
    async fn load_image(&self, data_url: &str) -> Result<Dimensions, String> {
        let img = load_element(data_url).await?;
        Ok(natural_dimensions(&img))
    }

    async fn rasterize(&self, data_url: &str, format: ImageFormat, quality: f64) -> Result<Rasterized, String> {
        let img = load_element(data_url).await?;
        let dimensions = natural_dimensions(&img);

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("documentがありません")?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(js_err)?
            .dyn_into()
            .map_err(|_| "canvas要素への変換失敗".to_string())?;
        canvas.set_width(dimensions.width);
        canvas.set_height(dimensions.height);

        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or("2Dコンテキストを取得できません")?;
        ctx.draw_image_with_html_image_element(&img, 0.0, 0.0).map_err(js_err)?;

        let data_url = canvas
            .to_data_url_with_type_and_encoder_options(&format.mime(), &JsValue::from_f64(quality))
            .map_err(js_err)?;
        Ok(Rasterized { data_url, dimensions })
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), String> {
        let window = web_sys::window().ok_or("windowが利用できません")?;
        let promise = window.navigator().clipboard().write_text(text);
        JsFuture::from(promise).await.map(|_| ()).map_err(js_err)
    }

    fn save_file(&self, data_url: &str, filename: &str) -> Result<(), String> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("documentがありません")?;
        let a = document.create_element("a").map_err(js_err)?;
        a.set_attribute("href", data_url).map_err(js_err)?;
        a.set_attribute("download", filename).map_err(js_err)?;
        let element = a
            .dyn_ref::<web_sys::HtmlElement>()
            .ok_or("リンク要素への変換失敗")?;
        element.click();
        Ok(())
    }

    fn sleep(&self, millis: u32) -> impl Future<Output = ()> {
        gloo::timers::future::TimeoutFuture::new(millis)
    }
}

// ============================================
// ファイル読み込み
// ============================================

/// FileをBase64のdata URLとして読み込む
pub async fn read_file_as_data_url(file: &File) -> Result<String, String> {
    let reader = FileReader::new().map_err(js_err)?;
    let (tx, rx) = oneshot::channel::<Result<String, String>>();
    let slot = Rc::new(RefCell::new(Some(tx)));

    let reader_clone = reader.clone();
    let load_slot = slot.clone();
    let onload = Closure::wrap(Box::new(move |_: web_sys::Event| {
        let result = reader_clone
            .result()
            .ok()
            .and_then(|v| v.as_string())
            .ok_or_else(|| "読み込み結果が文字列ではありません".to_string());
        if let Some(tx) = load_slot.borrow_mut().take() {
            let _ = tx.send(result);
        }
    }) as Box<dyn FnMut(_)>);

    let error_slot = slot;
    let onerror = Closure::wrap(Box::new(move |_: web_sys::Event| {
        if let Some(tx) = error_slot.borrow_mut().take() {
            let _ = tx.send(Err("ファイルを読み込めません".to_string()));
        }
    }) as Box<dyn FnMut(_)>);

    reader.set_onload(Some(onload.as_ref().unchecked_ref()));
    reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    reader.read_as_data_url(file).map_err(js_err)?;

    let result = rx.await.unwrap_or_else(|_| Err("読み込みが中断されました".to_string()));
    reader.set_onload(None);
    reader.set_onerror(None);
    result
}

// ============================================
// ストレージ
// ============================================

/// localStorage（使えなければメモリ）
pub enum BrowserStore {
    Local(web_sys::Storage),
    Memory(MemoryStore),
}

impl BrowserStore {
    pub fn open() -> Self {
        match web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            Some(storage) => BrowserStore::Local(storage),
            None => BrowserStore::Memory(MemoryStore::new()),
        }
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        match self {
            BrowserStore::Local(storage) => storage.get_item(key).map_err(js_err),
            BrowserStore::Memory(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        match self {
            BrowserStore::Local(storage) => storage.set_item(key, value).map_err(js_err),
            BrowserStore::Memory(store) => store.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        match self {
            BrowserStore::Local(storage) => storage.remove_item(key).map_err(js_err),
            BrowserStore::Memory(store) => store.remove(key),
        }
    }
}
