// src/services/composer.rs

//! Notification card composer.
//!
//! A card is built in a fixed order of stages:
//!
//! ```text
//! Init → BackgroundFilled → MapPlaced → FlagPlaced → WatermarkDrawn → TextDrawn → Encoded → Saved → Complete
//! ```
//!
//! The last two stages belong to the pipeline, which persists the encoded card.
//!
//! Every coordinate below is a layout constant of the 1200×675 card. Text
//! positions are baselines, as on an HTML canvas.

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::error::{AppError, Result};
use crate::utils::format_number;

pub const CANVAS_WIDTH: u32 = 1200;
pub const CANVAS_HEIGHT: u32 = 675;

pub const BACKGROUND: Rgba<u8> = Rgba([0x11, 0x11, 0x11, 0xff]);
const WHITE: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
const BLACK: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xff]);
const LOCATION_GREY: Rgba<u8> = Rgba([0xdd, 0xdd, 0xdd, 0xff]);
const LABEL_GREY: Rgba<u8> = Rgba([0xc4, 0xc4, 0xc4, 0xff]);

pub const MAP_ORIGIN: (i64, i64) = (0, 175);
pub const FLAG_ORIGIN: (i64, i64) = (30, 88);

/// Depth values at or above this are at least two digits wide.
pub const DEPTH_WIDE_THRESHOLD: f64 = 10.0;
pub const DEPTH_X_WIDE: i32 = 800;
pub const DEPTH_X_NARROW: i32 = 815;

/// 66pt at 96 DPI.
const VALUE_SIZE_PX: f32 = 88.0;

/// Stage reached while composing a card, ordered by progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    BackgroundFilled,
    MapPlaced,
    FlagPlaced,
    WatermarkDrawn,
    TextDrawn,
    Encoded,
    Saved,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::BackgroundFilled => "background filled",
            Stage::MapPlaced => "map placed",
            Stage::FlagPlaced => "flag placed",
            Stage::WatermarkDrawn => "watermark drawn",
            Stage::TextDrawn => "text drawn",
            Stage::Encoded => "encoded",
            Stage::Saved => "saved",
            Stage::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Font weights available to the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
    Black,
}

/// One line of text on the card.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    pub text: String,
    pub x: i32,
    pub baseline: i32,
    /// Em size in pixels
    pub size_px: f32,
    pub face: FontFace,
    pub color: Rgba<u8>,
}

impl TextSpec {
    fn new(text: impl Into<String>, x: i32, baseline: i32, size_px: f32, face: FontFace, color: Rgba<u8>) -> Self {
        Self {
            text: text.into(),
            x,
            baseline,
            size_px,
            face,
            color,
        }
    }
}

/// Solid rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillSpec {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub color: Rgba<u8>,
}

/// Rasterizes text onto the canvas.
pub trait TextRenderer: Send + Sync {
    fn draw_text(&self, canvas: &mut RgbaImage, text: &TextSpec) -> Result<()>;
}

/// Values shown on a card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardContent {
    /// Country shown in the heading
    pub country: String,
    pub location: String,
    pub depth: f64,
    pub magnitude: f64,
    pub attribution: String,
}

/// Every element of a card, in drawing order.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub map_origin: (i64, i64),
    pub flag_origin: (i64, i64),
    pub attribution_bar: FillSpec,
    pub attribution: TextSpec,
    pub texts: Vec<TextSpec>,
}

impl CardLayout {
    pub fn for_content(content: &CardContent) -> Self {
        let depth = format!("{}km", format_number(content.depth));
        let magnitude = format_number(content.magnitude);

        Self {
            map_origin: MAP_ORIGIN,
            flag_origin: FLAG_ORIGIN,
            attribution_bar: FillSpec {
                x: 809,
                y: 645,
                width: 391,
                height: 30,
                color: BLACK,
            },
            attribution: TextSpec::new(&content.attribution, 904, 667, 21.0, FontFace::Bold, WHITE),
            texts: vec![
                TextSpec::new(
                    format!("Sismo en {}", content.country),
                    30,
                    70,
                    50.0,
                    FontFace::Black,
                    WHITE,
                ),
                TextSpec::new(&content.location, 110, 132, 35.0, FontFace::Bold, LOCATION_GREY),
                TextSpec::new("Profundidad", 795, 54, 30.0, FontFace::Black, LABEL_GREY),
                TextSpec::new("Magnitud", 1027, 54, 30.0, FontFace::Black, LABEL_GREY),
                TextSpec::new(
                    depth,
                    depth_text_x(content.depth),
                    132,
                    VALUE_SIZE_PX,
                    FontFace::Black,
                    WHITE,
                ),
                TextSpec::new(magnitude, 1040, 132, VALUE_SIZE_PX, FontFace::Black, WHITE),
            ],
        }
    }
}

/// X position of the depth value, shifted left for two-digit depths so the
/// `km` suffix ends near the same spot.
pub fn depth_text_x(depth: f64) -> i32 {
    if depth >= DEPTH_WIDE_THRESHOLD {
        DEPTH_X_WIDE
    } else {
        DEPTH_X_NARROW
    }
}

/// Builds card rasters from content and provider images.
#[derive(Clone)]
pub struct CardComposer {
    text: Arc<dyn TextRenderer>,
}

impl CardComposer {
    pub fn new(text: Arc<dyn TextRenderer>) -> Self {
        Self { text }
    }

    /// Compose a card and encode it as PNG.
    pub fn render_png(&self, content: &CardContent, map: &[u8], flag: &[u8]) -> Result<Vec<u8>> {
        let canvas = self.compose(content, map, flag)?;
        let bytes = encode_png(&canvas).map_err(|e| at_stage(Stage::TextDrawn, e))?;
        log::debug!("Card stage: {} ({} bytes)", Stage::Encoded, bytes.len());
        Ok(bytes)
    }

    /// Compose a card raster.
    pub fn compose(&self, content: &CardContent, map: &[u8], flag: &[u8]) -> Result<RgbaImage> {
        let layout = CardLayout::for_content(content);
        let mut stage = Stage::Init;

        let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, BACKGROUND);
        stage = advance(stage, Stage::BackgroundFilled);

        let map = decode("map tile", map).map_err(|e| at_stage(stage, e))?;
        image::imageops::overlay(&mut canvas, &map, layout.map_origin.0, layout.map_origin.1);
        stage = advance(stage, Stage::MapPlaced);

        let flag = decode("flag", flag).map_err(|e| at_stage(stage, e))?;
        image::imageops::overlay(&mut canvas, &flag, layout.flag_origin.0, layout.flag_origin.1);
        stage = advance(stage, Stage::FlagPlaced);

        fill(&mut canvas, &layout.attribution_bar);
        self.text
            .draw_text(&mut canvas, &layout.attribution)
            .map_err(|e| at_stage(stage, e))?;
        stage = advance(stage, Stage::WatermarkDrawn);

        for text in &layout.texts {
            self.text
                .draw_text(&mut canvas, text)
                .map_err(|e| at_stage(stage, e))?;
        }
        advance(stage, Stage::TextDrawn);

        Ok(canvas)
    }
}

/// Encode a raster as PNG bytes.
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    canvas.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

fn decode(what: &str, bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| AppError::render(format!("cannot decode {what}: {e}")))
}

fn fill(canvas: &mut RgbaImage, spec: &FillSpec) {
    let rect = Rect::at(spec.x, spec.y).of_size(spec.width, spec.height);
    draw_filled_rect_mut(canvas, rect, spec.color);
}

pub(crate) fn advance(from: Stage, to: Stage) -> Stage {
    debug_assert!(from < to, "stage {from} cannot move to {to}");
    log::trace!("Card stage: {from} -> {to}");
    to
}

fn at_stage(stage: Stage, error: AppError) -> AppError {
    AppError::render(format!("after stage '{stage}': {error}"))
}
