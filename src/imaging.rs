//! 画像の縮小・圧縮
//!
//! 送信用: 長辺 1024px 以下に縮小 → JPEG(品質70) → Base64
//! 保存用: 長辺 256px のサムネイル JPEG

use crate::error::{Result, ScanAiError};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use log::debug;

pub const MAX_UPLOAD_DIMENSION: u32 = 1024;
pub const THUMBNAIL_DIMENSION: u32 = 256;
pub const JPEG_QUALITY: u8 = 70;

/// 画像を読み込む（送信用・サムネイル用で1回だけ）
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| ScanAiError::ImageConversion(format!("画像を読み込めません: {}", e)))
}

/// 送信用にエンコード（元の画像は変更しない）
pub fn encode_for_upload(image: &DynamicImage) -> Result<String> {
    let jpeg = encode_jpeg(&downscale(image, MAX_UPLOAD_DIMENSION))?;
    debug!(
        "送信画像: {}x{} -> {} bytes (JPEG)",
        image.width(),
        image.height(),
        jpeg.len()
    );
    Ok(base64::engine::general_purpose::STANDARD.encode(jpeg))
}

/// 履歴保存用サムネイル
pub fn make_thumbnail(image: &DynamicImage) -> Result<Vec<u8>> {
    encode_jpeg(&downscale(image, THUMBNAIL_DIMENSION))
}

/// 長辺が `max` を超える場合のみ縦横比を保って縮小したサイズ
pub fn target_size(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let ratio = f64::min(max as f64 / width as f64, max as f64 / height as f64);
    let scaled = |side: u32| ((side as f64 * ratio).round() as u32).clamp(1, max);
    (scaled(width), scaled(height))
}

fn downscale(image: &DynamicImage, max: u32) -> DynamicImage {
    let (width, height) = target_size(image.width(), image.height(), max);
    if (width, height) == (image.width(), image.height()) {
        image.clone()
    } else {
        image.resize_exact(width, height, FilterType::Triangle)
    }
}

fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
    // JPEGはアルファ非対応のためRGBに変換
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| ScanAiError::ImageConversion(format!("JPEG圧縮エラー: {}", e)))?;
    Ok(buffer)
}
