pub mod background;
pub mod capability;
pub mod paint;
pub mod text;

use std::io::Cursor;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::debug;

use crate::error::ShareError;
use crate::models::{BackgroundMode, EventRecord, Format, RenderSpec, Template};
use crate::relay::Transport;
use background::BackgroundRenderer;
use capability::BlurCapability;
use paint::LinearGradient;
use text::TextStyle;

pub const BRAND_LABEL: &str = "lu.ma";

const PADDING: u32 = 60;
const BLOCK_GAP: u32 = 32;
const GRADIENT_ANGLE: f32 = 135.0;
const IMAGE_OVERLAY_ALPHA: f32 = 0.4;
const BRAND_FONT_PX: u32 = 28;
const BRAND_PAD: (u32, u32) = (32, 16);
const BRAND_INSET: (u32, u32) = (60, 50);
const BRAND_RADIUS: i64 = 16;

/// Nominal font sizes in px: (date/time, title).
fn font_sizes(format: Format) -> (u32, u32) {
    match format {
        Format::Story => (42, 86),
        Format::Post => (36, 72),
    }
}

#[derive(Clone, Debug)]
pub enum CardBackground {
    Gradient(LinearGradient),
    Image(RgbaImage),
}

/// Off-screen card, fully laid out and ready to rasterize.
#[derive(Clone, Debug)]
pub struct Card {
    pub spec: RenderSpec,
    pub width: u32,
    pub height: u32,
    pub background: CardBackground,
    pub date: String,
    pub title: String,
    pub time: String,
}

pub struct Compositor<'a, T: Transport> {
    background: BackgroundRenderer<'a, T>,
    settle_delay: Duration,
}

impl<'a, T: Transport> Compositor<'a, T> {
    pub fn new(
        transport: &'a T,
        image_relays: &'a [String],
        capability: BlurCapability,
        settle_delay: Duration,
    ) -> Self {
        Self {
            background: BackgroundRenderer::new(transport, image_relays, capability),
            settle_delay,
        }
    }

    pub async fn compose(&self, format: Format, record: &EventRecord, template: Template) -> Card {
        let spec = RenderSpec::new(format, template, record);
        let (width, height) = format.dimensions();

        let background = match (spec.background_mode, record.image_url.as_deref()) {
            (BackgroundMode::Image, Some(url)) => {
                CardBackground::Image(self.background.render(width, height, url).await)
            }
            _ => CardBackground::Gradient(LinearGradient::css(
                GRADIENT_ANGLE,
                width,
                height,
                template.gradient_stops(),
            )),
        };

        Card {
            spec,
            width,
            height,
            background,
            date: record.formatted_date.clone(),
            title: record.title.clone(),
            time: record.formatted_time.clone(),
        }
    }

    /// Compose, let the card settle, rasterize and encode to PNG.
    pub async fn render_png(
        &self,
        format: Format,
        record: &EventRecord,
        template: Template,
    ) -> Result<Vec<u8>, ShareError> {
        let card = self.compose(format, record, template).await;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        let image = rasterize(&card);
        debug!(%format, width = image.width(), height = image.height(), "rasterized card");
        encode_png(image)
    }
}

pub fn rasterize(card: &Card) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(card.width, card.height, Rgba([0, 0, 0, 255]));

    match &card.background {
        CardBackground::Gradient(gradient) => gradient.paint(&mut canvas),
        CardBackground::Image(layer) => {
            image::imageops::overlay(&mut canvas, layer, 0, 0);
        }
    }
    if card.spec.overlay_visible {
        paint::fill_alpha(&mut canvas, paint::rgba(0, 0, 0, IMAGE_OVERLAY_ALPHA));
    }

    draw_text_block(&mut canvas, card);
    draw_brand_label(&mut canvas);
    canvas
}

pub fn encode_png(image: RgbaImage) -> Result<Vec<u8>, ShareError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

struct Block {
    lines: Vec<String>,
    style: TextStyle,
    line_height: u32,
}

impl Block {
    fn height(&self) -> u32 {
        self.lines.len() as u32 * self.line_height
    }
}

fn text_blocks(card: &Card) -> [Block; 3] {
    let (small_px, title_px) = font_sizes(card.spec.format);
    let max_width = card.width - 2 * PADDING;

    let small_scale = text::scale_for(small_px);
    let date_style = TextStyle {
        scale: small_scale,
        letter_spacing: (text::GLYPH * small_scale) / 10,
        color: paint::rgba(255, 255, 255, 0.9),
    };
    let title_style = TextStyle {
        scale: text::scale_for(title_px),
        letter_spacing: 0,
        color: Rgba([255, 255, 255, 255]),
    };
    let time_style = TextStyle {
        scale: small_scale,
        letter_spacing: 0,
        color: paint::rgba(255, 255, 255, 0.8),
    };

    let date = card.date.to_uppercase();
    [
        Block {
            lines: text::wrap(&date, &date_style, max_width),
            line_height: date_style.height(),
            style: date_style,
        },
        Block {
            lines: text::wrap(&card.title, &title_style, max_width),
            line_height: (title_style.height() as f32 * 1.2).round() as u32,
            style: title_style,
        },
        Block {
            lines: text::wrap(&card.time, &time_style, max_width),
            line_height: time_style.height(),
            style: time_style,
        },
    ]
}

fn draw_text_block(canvas: &mut RgbaImage, card: &Card) {
    let blocks = text_blocks(card);
    let total: u32 = blocks.iter().map(Block::height).sum::<u32>() + 2 * BLOCK_GAP;
    let mut y = (i64::from(card.height) - i64::from(total)) / 2;

    for (idx, block) in blocks.iter().enumerate() {
        for line in &block.lines {
            let width = i64::from(block.style.measure(line));
            let x = (i64::from(card.width) - width) / 2;
            // glyphs sit centered within a taller title line box
            let lead = i64::from(block.line_height - block.style.height()) / 2;
            text::draw_line(canvas, x, y + lead, line, &block.style);
            y += i64::from(block.line_height);
        }
        if idx < blocks.len() - 1 {
            y += i64::from(BLOCK_GAP);
        }
    }
}

fn draw_brand_label(canvas: &mut RgbaImage) {
    let style = TextStyle {
        scale: text::scale_for(BRAND_FONT_PX),
        letter_spacing: 0,
        color: Rgba([255, 255, 255, 255]),
    };
    let box_w = i64::from(style.measure(BRAND_LABEL) + 2 * BRAND_PAD.0);
    let box_h = i64::from(style.height() + 2 * BRAND_PAD.1);
    let x1 = i64::from(canvas.width()) - i64::from(BRAND_INSET.0);
    let y1 = i64::from(canvas.height()) - i64::from(BRAND_INSET.1);
    let (x0, y0) = (x1 - box_w, y1 - box_h);

    paint::fill_rounded_rect(
        canvas,
        (x0, y0),
        (x1, y1),
        BRAND_RADIUS,
        paint::rgba(255, 255, 255, 0.2),
    );
    text::draw_line(
        canvas,
        x0 + i64::from(BRAND_PAD.0),
        y0 + i64::from(BRAND_PAD.1),
        BRAND_LABEL,
        &style,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::stub::StubTransport;

    fn record(image: Option<&str>) -> EventRecord {
        EventRecord {
            event_id: "abc123".into(),
            title: "Rust Meetup: Async in Practice and Other Long Titles".into(),
            raw_start: Some("2025-03-15T19:00:00Z".into()),
            raw_end: None,
            formatted_date: "Saturday, March 15, 2025".into(),
            formatted_time: "07:00 PM".into(),
            image_url: image.map(str::to_string),
            location: None,
        }
    }

    fn compositor<'a>(transport: &'a StubTransport, relays: &'a [String]) -> Compositor<'a, StubTransport> {
        Compositor::new(transport, relays, BlurCapability::SupportsBlur, Duration::ZERO)
    }

    #[tokio::test]
    async fn story_is_always_1080_by_1920() {
        let transport = StubTransport::default();
        let relays = vec!["https://relay.test/?".to_string()];
        let compositor = compositor(&transport, &relays);

        for key in Template::KEYS.iter().chain(["nope"].iter()) {
            let card = compositor
                .compose(
                    Format::Story,
                    &record(Some("https://img.test/a.png")),
                    Template::resolve(key),
                )
                .await;
            assert_eq!(rasterize(&card).dimensions(), (1080, 1920), "{key}");
        }

        let card = compositor
            .compose(Format::Story, &record(None), Template::Image)
            .await;
        assert_eq!(rasterize(&card).dimensions(), (1080, 1920));
    }

    #[tokio::test]
    async fn post_png_decodes_to_1080_by_1350() {
        let transport = StubTransport::default();
        let relays: Vec<String> = Vec::new();
        let png = compositor(&transport, &relays)
            .render_png(Format::Post, &record(None), Template::Mint)
            .await
            .expect("encodes");

        let decoded = image::load_from_memory(&png).expect("valid png");
        assert_eq!((decoded.width(), decoded.height()), (1080, 1350));
    }

    #[tokio::test]
    async fn image_mode_without_reachable_image_still_paints() {
        let transport = StubTransport::default();
        let relays = vec!["https://relay.test/?".to_string()];
        let card = compositor(&transport, &relays)
            .compose(Format::Post, &record(Some("https://img.test/gone.png")), Template::Image)
            .await;

        assert_eq!(card.spec.background_mode, BackgroundMode::Image);
        assert!(card.spec.overlay_visible);
        assert!(matches!(card.background, CardBackground::Image(_)));

        let raster = rasterize(&card);
        // fallback gradient under the 40% overlay is never plain black
        let corner = raster.get_pixel(5, 5);
        assert!(corner[2] > 100, "{corner:?}");
    }

    #[tokio::test]
    async fn gradient_mode_has_no_overlay() {
        let transport = StubTransport::default();
        let relays: Vec<String> = Vec::new();
        let card = compositor(&transport, &relays)
            .compose(Format::Story, &record(None), Template::Fire)
            .await;
        assert_eq!(card.spec.background_mode, BackgroundMode::Gradient);

        let raster = rasterize(&card);
        // top-left corner is the first fire stop, untouched by any overlay
        let corner = raster.get_pixel(0, 0);
        assert_eq!((corner[0], corner[1], corner[2]), (0xf1, 0x27, 0x11));
    }

    #[test]
    fn story_text_is_larger_than_post_text() {
        let card = |format| Card {
            spec: RenderSpec {
                format,
                background_mode: BackgroundMode::Gradient,
                overlay_visible: false,
            },
            width: 1080,
            height: format_height(format),
            background: CardBackground::Gradient(LinearGradient::diagonal(1, 1, &[])),
            date: "Saturday".into(),
            title: "Title".into(),
            time: "19:00".into(),
        };
        let story = text_blocks(&card(Format::Story));
        let post = text_blocks(&card(Format::Post));
        for (s, p) in story.iter().zip(post.iter()) {
            assert!(s.style.scale > p.style.scale);
        }
        assert_eq!(story[0].lines, vec!["SATURDAY"]);
    }

    #[test]
    fn long_titles_wrap_inside_the_padding() {
        let card = Card {
            spec: RenderSpec {
                format: Format::Story,
                background_mode: BackgroundMode::Gradient,
                overlay_visible: false,
            },
            width: 1080,
            height: 1920,
            background: CardBackground::Gradient(LinearGradient::diagonal(1, 1, &[])),
            date: String::new(),
            title: record(None).title,
            time: String::new(),
        };
        let blocks = text_blocks(&card);
        assert!(blocks[1].lines.len() > 1);
        for line in &blocks[1].lines {
            assert!(blocks[1].style.measure(line) <= 1080 - 2 * PADDING);
        }
        assert!(blocks[0].lines.is_empty());
    }

    fn format_height(format: Format) -> u32 {
        format.dimensions().1
    }
}
