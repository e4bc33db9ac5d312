//! Grid merge: tile downloaded thumbnails into one PNG.
//!
//! DESIGN
//! ======
//! The grid has a fixed shape (`columns × rows` square cells) no matter how
//! many downloads have finished. Slot `i` lands in cell `i`, row-major, so
//! placement always follows the original URL order. A missing or
//! undecodable slot gets the shared placeholder tile; cells past the last
//! slot stay transparent; slots past `max_items` are ignored.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::debug;

pub const DEFAULT_CELL_SIZE: u32 = 150;

/// Placeholder body colour.
pub const PLACEHOLDER_FILL: Rgba<u8> = Rgba([0x2b, 0x2d, 0x31, 0xff]);
const PLACEHOLDER_BORDER: Rgba<u8> = Rgba([0x4e, 0x50, 0x58, 0xff]);
const PLACEHOLDER_BORDER_WIDTH: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("grid has no cells ({columns}x{rows})")]
    Empty { columns: u32, rows: u32 },
    #[error("grid encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub max_items: usize,
    pub cell_size: u32,
}

impl GridLayout {
    /// Number of slots that can appear in the grid.
    #[must_use]
    pub fn capacity(&self) -> usize {
        let cells = usize::try_from(self.columns.saturating_mul(self.rows)).unwrap_or(usize::MAX);
        cells.min(self.max_items)
    }
}

/// Dark tile with a lighter frame, shown for failed or pending downloads.
#[must_use]
pub fn placeholder(cell_size: u32) -> RgbaImage {
    RgbaImage::from_fn(cell_size, cell_size, |x, y| {
        let edge = PLACEHOLDER_BORDER_WIDTH;
        let on_border = x < edge || y < edge || x + edge >= cell_size || y + edge >= cell_size;
        if on_border { PLACEHOLDER_BORDER } else { PLACEHOLDER_FILL }
    })
}

/// Compose `slots` into one PNG buffer.
///
/// # Errors
///
/// Returns an error for a zero-sized layout or if PNG encoding fails.
pub fn compose(slots: &[Option<Vec<u8>>], layout: GridLayout, placeholder: &RgbaImage) -> Result<Vec<u8>, GridError> {
    if layout.columns == 0 || layout.rows == 0 {
        return Err(GridError::Empty { columns: layout.columns, rows: layout.rows });
    }

    let cell = layout.cell_size;
    let mut canvas = RgbaImage::new(layout.columns * cell, layout.rows * cell);

    for (index, slot) in slots.iter().enumerate().take(layout.capacity()) {
        let Ok(index) = u32::try_from(index) else {
            break;
        };
        let x = i64::from((index % layout.columns) * cell);
        let y = i64::from((index / layout.columns) * cell);

        match slot.as_deref().and_then(|bytes| decode_tile(bytes, cell)) {
            Some(tile) => imageops::replace(&mut canvas, &tile, x, y),
            None => imageops::replace(&mut canvas, placeholder, x, y),
        }
    }

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

fn decode_tile(bytes: &[u8], cell: u32) -> Option<RgbaImage> {
    let decoded = match image::load_from_memory(bytes) {
        Ok(image) => image,
        Err(e) => {
            debug!(error = %e, len = bytes.len(), "stream: thumbnail decode failed; using placeholder");
            return None;
        }
    };
    if decoded.width() == cell && decoded.height() == cell {
        return Some(decoded.to_rgba8());
    }
    Some(decoded.resize_to_fill(cell, cell, FilterType::Triangle).to_rgba8())
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod tests;
