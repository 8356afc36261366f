// src/services/fonts.rs

//! TTF font faces for card text.

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::RgbaImage;
use imageproc::drawing::draw_text_mut;

use crate::error::{AppError, Result};
use crate::models::FontPaths;
use crate::services::composer::{FontFace, TextRenderer, TextSpec};

/// The three faces a card uses.
#[derive(Clone)]
pub struct FontBook {
    regular: FontArc,
    bold: FontArc,
    black: FontArc,
}

impl FontBook {
    /// Load all faces from disk.
    pub fn load(paths: &FontPaths) -> Result<Self> {
        Ok(Self {
            regular: load_face(&paths.regular)?,
            bold: load_face(&paths.bold)?,
            black: load_face(&paths.black)?,
        })
    }

    /// Build a font book from in-memory TTF/OTF data.
    pub fn from_bytes(regular: Vec<u8>, bold: Vec<u8>, black: Vec<u8>) -> Result<Self> {
        Ok(Self {
            regular: parse_face("regular", regular)?,
            bold: parse_face("bold", bold)?,
            black: parse_face("black", black)?,
        })
    }

    fn face(&self, face: FontFace) -> &FontArc {
        match face {
            FontFace::Regular => &self.regular,
            FontFace::Bold => &self.bold,
            FontFace::Black => &self.black,
        }
    }
}

impl TextRenderer for FontBook {
    fn draw_text(&self, canvas: &mut RgbaImage, text: &TextSpec) -> Result<()> {
        let font = self.face(text.face);
        let scale = em_scale(font, text.size_px);
        // draw_text_mut positions the top of the line box, not the baseline.
        let ascent = font.as_scaled(scale).ascent();
        let top = text.baseline - ascent.round() as i32;
        draw_text_mut(canvas, text.color, text.x, top, scale, font, &text.text);
        Ok(())
    }
}

/// Scale giving `size_px` pixels per em, like a CSS font size.
pub fn em_scale(font: &impl Font, size_px: f32) -> PxScale {
    font.pt_to_px_scale(size_px * 72.0 / 96.0)
        .unwrap_or_else(|| PxScale::from(size_px))
}

fn load_face(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::font(format!("cannot read {}: {e}", path.display())))?;
    parse_face(&path.display().to_string(), bytes)
}

fn parse_face(name: &str, bytes: Vec<u8>) -> Result<FontArc> {
    FontArc::try_from_vec(bytes).map_err(|e| AppError::font(format!("{name}: {e}")))
}
