//! テスト用ホスト（imageクレートで実際にデコード・エンコードする）

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};

use super::{ImageHost, Rasterized};
use crate::converter::pipeline::split_data_url;
use crate::models::{build_data_url, Dimensions, ImageFormat};
use crate::utils::decode_base64_lenient;

#[derive(Default)]
pub struct FakeHost {
    /// trueなら画像読み込みが終わらず、タイマーが即座に発火する
    pub stall: Cell<bool>,
    pub fail_clipboard: Cell<bool>,
    /// 出力できないフォーマット（Canvasと同じくPNGで返す）
    pub unsupported: Cell<Option<ImageFormat>>,
    pub clipboard: RefCell<Vec<String>>,
    pub saved: RefCell<Vec<(String, String)>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn decode(data_url: &str) -> Result<DynamicImage, String> {
        let (_, payload) = split_data_url(data_url).ok_or("not an image data URL")?;
        let bytes = decode_base64_lenient(payload).ok_or("payload is not Base64")?;
        image::load_from_memory(&bytes).map_err(|e| e.to_string())
    }
}

impl ImageHost for FakeHost {
    async fn load_image(&self, data_url: &str) -> Result<Dimensions, String> {
        if self.stall.get() {
            futures::future::pending::<()>().await;
        }
        let img = Self::decode(data_url)?;
        Ok(Dimensions::new(img.width(), img.height()))
    }

    async fn rasterize(&self, data_url: &str, format: ImageFormat, quality: f64) -> Result<Rasterized, String> {
        if self.stall.get() {
            futures::future::pending::<()>().await;
        }
        let img = Self::decode(data_url)?;
        let dimensions = Dimensions::new(img.width(), img.height());
        // Canvasと同じく、非対応フォーマットはPNGにフォールバック
        let actual = if format.is_encode_target() && self.unsupported.get() != Some(format) {
            format
        } else {
            ImageFormat::Png
        };
        let bytes = encode(&img, actual, quality)?;
        Ok(Rasterized {
            data_url: build_data_url(actual, &base64_std(&bytes)),
            dimensions,
        })
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), String> {
        if self.fail_clipboard.get() {
            return Err("NotAllowedError: document is not focused".to_string());
        }
        self.clipboard.borrow_mut().push(text.to_string());
        Ok(())
    }

    fn save_file(&self, data_url: &str, filename: &str) -> Result<(), String> {
        self.saved.borrow_mut().push((data_url.to_string(), filename.to_string()));
        Ok(())
    }

    fn sleep(&self, _millis: u32) -> impl Future<Output = ()> {
        let fire = self.stall.get();
        async move {
            if !fire {
                futures::future::pending::<()>().await;
            }
        }
    }
}

fn base64_std(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: f64) -> Result<Vec<u8>, String> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpeg => {
            let q = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
            let encoder = JpegEncoder::new_with_quality(&mut buf, q);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|e| e.to_string())?;
        }
        ImageFormat::Png => img.write_to(&mut buf, image::ImageFormat::Png).map_err(|e| e.to_string())?,
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut buf, image::ImageFormat::Gif)
            .map_err(|e| e.to_string())?,
        ImageFormat::Webp => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut buf, image::ImageFormat::WebP)
            .map_err(|e| e.to_string())?,
    }
    Ok(buf.into_inner())
}

/// テスト用の単色画像をBase64で返す
pub fn sample_base64(format: ImageFormat, width: u32, height: u32) -> String {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])));
    let bytes = encode(&img, format, 0.9).expect("sample image encodes");
    base64_std(&bytes)
}

/// テスト用画像のアップロード
pub fn sample_upload(format: ImageFormat, width: u32, height: u32) -> crate::models::UploadedFile {
    let data_url = build_data_url(format, &sample_base64(format, width, height));
    crate::models::UploadedFile::new(format!("sample.{}", format.as_str()), format.mime(), data_url)
        .expect("image MIME is accepted")
}

/// 画素データ（RGB8）を取り出す
pub fn pixels(base64: &str) -> Vec<u8> {
    let bytes = decode_base64_lenient(base64).expect("valid Base64");
    image::load_from_memory(&bytes).expect("decodable image").to_rgb8().into_raw()
}
