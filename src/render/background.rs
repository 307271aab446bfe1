use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::capability::BlurCapability;
use super::paint::{self, LinearGradient};
use crate::relay::{self, Transport, TransportError};

pub const DEFAULT_IMAGE_RELAYS: [&str; 1] = ["https://corsproxy.io/?"];

const FALLBACK_STOPS: [(f32, [u8; 3]); 2] = [(0.0, [0x66, 0x7e, 0xea]), (1.0, [0x76, 0x4b, 0xa2])];
const BLUR_SIGMA: f32 = 22.0;
const BLUR_DOWNSAMPLE: u32 = 4;
const BLUR_MARGIN: f32 = BLUR_SIGMA * 3.0;
const OVERSCAN: f32 = 1.1;
const HIGH_RES: &str = "1200";

static WIDTH_PARAM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"width=\d+").expect("width regex"));
static HEIGHT_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"height=\d+").expect("height regex"));

/// Asks the image CDN for a 1200px rendition when the URL carries a size.
pub fn high_res_variant(url: &str) -> String {
    let url = WIDTH_PARAM_RE.replace(url, format!("width={HIGH_RES}").as_str());
    HEIGHT_PARAM_RE
        .replace(&url, format!("height={HIGH_RES}").as_str())
        .into_owned()
}

/// Where and how large the source image lands on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Cover fit that keeps the top edge anchored, then grown by the overscan
/// factor around the fitted rectangle's center.
pub fn cover_placement(image: (u32, u32), canvas: (u32, u32)) -> Placement {
    let (iw, ih) = (image.0.max(1) as f32, image.1.max(1) as f32);
    let (cw, ch) = (canvas.0 as f32, canvas.1 as f32);
    let image_ratio = iw / ih;
    let canvas_ratio = cw / ch;

    let (width, height, x, y) = if image_ratio > canvas_ratio {
        let width = ch * image_ratio;
        (width, ch, (cw - width) / 2.0, 0.0)
    } else {
        (cw, cw / image_ratio, 0.0, 0.0)
    };

    let (scaled_w, scaled_h) = (width * OVERSCAN, height * OVERSCAN);
    Placement {
        x: x - (scaled_w - width) / 2.0,
        y: y - (scaled_h - height) / 2.0,
        width: scaled_w,
        height: scaled_h,
    }
}

pub fn fallback_fill(width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);
    LinearGradient::diagonal(width, height, &FALLBACK_STOPS).paint(&mut canvas);
    canvas
}

pub struct BackgroundRenderer<'a, T: Transport> {
    transport: &'a T,
    relays: &'a [String],
    capability: BlurCapability,
}

impl<'a, T: Transport> BackgroundRenderer<'a, T> {
    pub fn new(transport: &'a T, relays: &'a [String], capability: BlurCapability) -> Self {
        Self {
            transport,
            relays,
            capability,
        }
    }

    /// Always returns a fully painted `width` x `height` canvas.
    pub async fn render(&self, width: u32, height: u32, image_url: &str) -> RgbaImage {
        match self.load(image_url).await {
            Ok(source) => self.draw(&source, width, height),
            Err(err) => {
                warn!(error = %err, "could not load cover image, using fallback gradient");
                fallback_fill(width, height)
            }
        }
    }

    async fn load(&self, image_url: &str) -> Result<DynamicImage, TransportError> {
        let source = high_res_variant(image_url);
        relay::first_success(self.relays, |template| {
            let url = relay::relay_url(template, &source);
            async move {
                let bytes = self.transport.get_bytes(&url).await?;
                image::load_from_memory(&bytes)
                    .map_err(|err| TransportError::InvalidBody(err.to_string()))
            }
        })
        .await
        .map_err(|exhausted| TransportError::InvalidBody(exhausted.describe_last()))
    }

    fn draw(&self, source: &DynamicImage, width: u32, height: u32) -> RgbaImage {
        let placement = cover_placement((source.width(), source.height()), (width, height));
        debug!(?placement, capability = ?self.capability, "drawing cover image");

        let blurred = self.capability == BlurCapability::SupportsBlur;
        let margin = if blurred { BLUR_MARGIN } else { 0.0 };

        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        if let Some(visible) = visible_layer(source, placement, (width, height), margin) {
            let layer = if blurred {
                blur(&visible.image, BLUR_SIGMA)
            } else {
                visible.image
            };
            imageops::overlay(&mut canvas, &layer, visible.x, visible.y);
        }

        if self.capability == BlurCapability::NoBlurFallback {
            paint::fill_alpha(&mut canvas, paint::rgba(0, 0, 0, 0.3));
        }
        canvas
    }
}

/// The slice of a placed cover that lands on the canvas, at canvas scale.
#[derive(Debug)]
struct VisibleLayer {
    image: RgbaImage,
    x: i64,
    y: i64,
}

/// Crops the source to what shows through the canvas grown by `margin` on
/// each side, and scales only that crop. The result never exceeds the
/// grown canvas, however extreme the cover's aspect ratio.
fn visible_layer(
    source: &DynamicImage,
    placement: Placement,
    canvas: (u32, u32),
    margin: f32,
) -> Option<VisibleLayer> {
    let (iw, ih) = (source.width() as f32, source.height() as f32);
    if iw < 1.0 || ih < 1.0 {
        return None;
    }
    // canvas pixels per source pixel
    let scale_x = placement.width / iw;
    let scale_y = placement.height / ih;

    let left = (-margin).max(placement.x);
    let top = (-margin).max(placement.y);
    let right = (canvas.0 as f32 + margin).min(placement.x + placement.width);
    let bottom = (canvas.1 as f32 + margin).min(placement.y + placement.height);
    if right <= left || bottom <= top {
        return None;
    }

    let sx0 = ((left - placement.x) / scale_x).floor().clamp(0.0, iw - 1.0);
    let sy0 = ((top - placement.y) / scale_y).floor().clamp(0.0, ih - 1.0);
    let sx1 = ((right - placement.x) / scale_x).ceil().clamp(sx0 + 1.0, iw);
    let sy1 = ((bottom - placement.y) / scale_y).ceil().clamp(sy0 + 1.0, ih);
    let crop = source
        .crop_imm(sx0 as u32, sy0 as u32, (sx1 - sx0) as u32, (sy1 - sy0) as u32)
        .to_rgba8();

    let crop_x = placement.x + sx0 * scale_x;
    let crop_y = placement.y + sy0 * scale_y;
    let crop_w = ((sx1 - sx0) * scale_x).round().max(1.0) as u32;
    let crop_h = ((sy1 - sy0) * scale_y).round().max(1.0) as u32;
    let scaled = imageops::resize(&crop, crop_w, crop_h, FilterType::Triangle);

    // whole source pixels overhang the window; trim them back off
    let trim_x = (left - crop_x).round().clamp(0.0, (crop_w - 1) as f32) as u32;
    let trim_y = (top - crop_y).round().clamp(0.0, (crop_h - 1) as f32) as u32;
    let trim_w = ((right - left).round() as u32).clamp(1, crop_w - trim_x);
    let trim_h = ((bottom - top).round() as u32).clamp(1, crop_h - trim_y);

    Some(VisibleLayer {
        image: imageops::crop_imm(&scaled, trim_x, trim_y, trim_w, trim_h).to_image(),
        x: (crop_x + trim_x as f32).round() as i64,
        y: (crop_y + trim_y as f32).round() as i64,
    })
}

/// Gaussian blur computed on a downsampled copy; at this radius the result
/// is indistinguishable and far cheaper.
fn blur(layer: &RgbaImage, sigma: f32) -> RgbaImage {
    let (w, h) = layer.dimensions();
    let small_w = (w / BLUR_DOWNSAMPLE).max(1);
    let small_h = (h / BLUR_DOWNSAMPLE).max(1);
    let small = imageops::resize(layer, small_w, small_h, FilterType::Triangle);
    let blurred = imageops::blur(&small, sigma / BLUR_DOWNSAMPLE as f32);
    imageops::resize(&blurred, w, h, FilterType::Triangle)
}
