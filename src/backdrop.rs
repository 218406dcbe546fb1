//! Background photos: decoding into a cell grid and the cross-fade timeline
//!
//! A downloaded photo is cropped to the grid's aspect ratio, scaled down to
//! `GRID_COLS x GRID_ROWS` cells and darkened, so the rest of the app only
//! ever deals with a small RGB grid. A newly added layer stays invisible for
//! `FADE_DELAY_MS`, then fades in over `FADE_DURATION_MS`; older layers are
//! dropped `OLD_LAYER_LINGER_MS` after a newer one arrives.

use image::imageops::FilterType;
use image::GenericImageView;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::BackdropLayer;

pub const GRID_COLS: u32 = 160;
pub const GRID_ROWS: u32 = 50;

pub const FADE_DELAY_MS: u64 = 900;
pub const FADE_DURATION_MS: u64 = 1500;
pub const OLD_LAYER_LINGER_MS: u64 = 1500;

/// Black overlay alpha that keeps text readable over the photo.
pub const TINT_ALPHA: f32 = 0.4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `self` painted over `below` with the given opacity.
    pub fn over(self, below: Rgb, alpha: f32) -> Rgb {
        let alpha = alpha.clamp(0.0, 1.0);
        let mix = |top: u8, bottom: u8| {
            (top as f32 * alpha + bottom as f32 * (1.0 - alpha)).round() as u8
        };
        Rgb {
            r: mix(self.r, below.r),
            g: mix(self.g, below.g),
            b: mix(self.b, below.b),
        }
    }
}

/// A photo reduced to one color per terminal cell
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BackdropImage {
    pub width: u32,
    pub height: u32,
    /// Row-major
    pub pixels: Vec<Rgb>,
}

impl BackdropImage {
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        if self.width == 0 || self.height == 0 {
            return Rgb::BLACK;
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.pixels
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(Rgb::BLACK)
    }

    /// Nearest-neighbour sample for cell `(col, row)` of a `cols x rows` area.
    pub fn sample(&self, col: u16, row: u16, cols: u16, rows: u16) -> Rgb {
        if cols == 0 || rows == 0 {
            return Rgb::BLACK;
        }
        let x = col as u32 * self.width / cols as u32;
        let y = row as u32 * self.height / rows as u32;
        self.pixel(x, y)
    }
}

/// Decode an encoded photo (JPEG, PNG, ...) into a tinted cell grid.
pub fn decode_backdrop(bytes: &[u8]) -> Result<BackdropImage, image::ImageError> {
    let image = image::load_from_memory(bytes)?;
    let (width, height) = image.dimensions();

    // Cells are roughly twice as tall as wide, so the grid covers a
    // GRID_COLS : GRID_ROWS * 2 pixel area.
    let target_aspect = GRID_COLS as f32 / (GRID_ROWS * 2) as f32;
    let (crop_w, crop_h) = if width as f32 / height.max(1) as f32 > target_aspect {
        ((height as f32 * target_aspect).round() as u32, height)
    } else {
        (width, (width as f32 / target_aspect).round() as u32)
    };
    let crop_w = crop_w.clamp(1, width.max(1));
    let crop_h = crop_h.clamp(1, height.max(1));
    let x = (width - crop_w) / 2;
    let y = (height - crop_h) / 2;

    let scaled = image
        .crop_imm(x, y, crop_w, crop_h)
        .resize_exact(GRID_COLS, GRID_ROWS, FilterType::Triangle)
        .to_rgb8();

    let pixels = scaled
        .pixels()
        .map(|p| Rgb::BLACK.over(Rgb::new(p[0], p[1], p[2]), TINT_ALPHA))
        .collect();

    Ok(BackdropImage {
        width: GRID_COLS,
        height: GRID_ROWS,
        pixels,
    })
}

/// Opacity of a layer `age_ms` after it was added.
pub fn fade_in_opacity(age_ms: u64) -> f32 {
    if age_ms <= FADE_DELAY_MS {
        return 0.0;
    }
    let t = ((age_ms - FADE_DELAY_MS) as f32 / FADE_DURATION_MS as f32).min(1.0);
    // ease-in-out
    t * t * (3.0 - 2.0 * t)
}

/// Total time until a new layer is fully opaque.
pub const fn fade_complete_ms() -> u64 {
    FADE_DELAY_MS + FADE_DURATION_MS
}

/// Add a freshly downloaded photo on top, scheduling older layers for removal.
pub fn push_layer(layers: &mut Vec<BackdropLayer>, image: BackdropImage) {
    for layer in layers.iter_mut() {
        if layer.expires_in_ms.is_none() {
            layer.expires_in_ms = Some(OLD_LAYER_LINGER_MS);
        }
    }
    layers.push(BackdropLayer::new(image));
}

/// Advance every layer by `elapsed_ms`, dropping expired ones.
///
/// Returns whether anything changed.
pub fn advance_layers(layers: &mut Vec<BackdropLayer>, elapsed_ms: u64) -> bool {
    let mut changed = false;
    for layer in layers.iter_mut() {
        if layer.age_ms < fade_complete_ms() {
            changed = true;
        }
        layer.age_ms = layer.age_ms.saturating_add(elapsed_ms);
        if let Some(remaining) = layer.expires_in_ms.as_mut() {
            *remaining = remaining.saturating_sub(elapsed_ms);
        }
    }
    let before = layers.len();
    layers.retain(|layer| layer.expires_in_ms != Some(0));
    changed || layers.len() != before
}

/// Color of one cell with every layer blended oldest to newest.
///
/// `None` while no layer is visible there yet.
pub fn composite(layers: &[BackdropLayer], col: u16, row: u16, cols: u16, rows: u16) -> Option<Rgb> {
    let mut color = Rgb::BLACK;
    let mut coverage = 0.0_f32;
    for layer in layers {
        let alpha = layer.opacity();
        if alpha <= 0.0 {
            continue;
        }
        color = layer.image.sample(col, row, cols, rows).over(color, alpha);
        coverage = coverage * (1.0 - alpha) + alpha;
    }
    (coverage > 0.0).then_some(color)
}
