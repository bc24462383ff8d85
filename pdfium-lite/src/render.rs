//! Page rasterization into caller-owned pixel buffers

use crate::backend::PdfBackend;
use crate::error::{PdfError, Result};
use std::ops::{BitOr, BitOrAssign};
use tracing::{debug, warn};

/// Opaque white, 0xAARRGGBB.
const WHITE: u32 = 0xFFFF_FFFF;

/// Bytes per pixel of a [`PixelBuffer`].
const BYTES_PER_PIXEL: usize = 4;

/// PDFium page rendering flags (`FPDF_ANNOT`, `FPDF_LCD_TEXT`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderFlags(u32);

impl RenderFlags {
    /// Render annotations
    pub const ANNOT: Self = Self(0x01);
    /// Optimize text for LCD displays
    pub const LCD_TEXT: Self = Self(0x02);
    /// Don't use the platform's native text output
    pub const NO_NATIVE_TEXT: Self = Self(0x04);
    /// Grayscale output
    pub const GRAYSCALE: Self = Self(0x08);
    /// Emit pixels in RGBA order instead of BGRA
    pub const REVERSE_BYTE_ORDER: Self = Self(0x10);
    /// Emit renderer debug information
    pub const DEBUG_INFO: Self = Self(0x80);
    /// Don't catch exceptions inside the renderer
    pub const NO_CATCH: Self = Self(0x100);
    /// Limit the image cache size
    pub const LIMITED_IMAGE_CACHE: Self = Self(0x200);
    /// Always use halftone for image stretching
    pub const FORCE_HALFTONE: Self = Self(0x400);
    /// Render for printing
    pub const PRINTING: Self = Self(0x800);

    /// No flags set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bit value passed to the native renderer.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if every bit in `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for RenderFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RenderFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Configuration for page rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    flags: RenderFlags,
}

impl RenderConfig {
    /// Create a new render configuration with default settings (no flags).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the render flags.
    pub fn set_flags(mut self, flags: RenderFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Add render flags to the ones already set.
    pub fn add_flags(mut self, flags: RenderFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Get the render flags.
    pub fn flags(&self) -> RenderFlags {
        self.flags
    }
}

/// A rendered page: `width × height` pixels of 32-bit ARGB.
///
/// Pixels are stored row by row with no padding, each as a little-endian
/// `0xAARRGGBB` word, i.e. bytes `B, G, R, A`. The DPI pair is a tag for
/// downstream consumers and does not affect the pixel count.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    dpi_x: f32,
    dpi_y: f32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Get the width of the buffer in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height of the buffer in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resolution tag `(dpi_x, dpi_y)`.
    pub fn dpi(&self) -> (f32, f32) {
        (self.dpi_x, self.dpi_y)
    }

    /// Bytes per row (`width * 4`).
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// Raw BGRA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the raw BGRA bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Pixel at `(x, y)` as `0xAARRGGBB`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        let bytes = self.data.get(offset..offset + BYTES_PER_PIXEL)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Iterate over all pixels as `0xAARRGGBB`, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = u32> + '_ {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|p| u32::from_le_bytes([p[0], p[1], p[2], p[3]]))
    }

    /// True when every pixel has full alpha.
    pub fn is_opaque(&self) -> bool {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .all(|p| p[3] == 0xFF)
    }

    /// Convert BGRA to RGBA data (copies and converts).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.data.len());
        for p in self.data.chunks_exact(BYTES_PER_PIXEL) {
            rgba.extend_from_slice(&[p[2], p[1], p[0], p[3]]);
        }
        rgba
    }
}

// Scoped native handles. Each guard releases its handle on drop, so every
// exit path out of `paint` (including `?`) cleans up. The handle is only
// `None` after `Drop` has taken it.

struct PageGuard<'a, B: PdfBackend> {
    backend: &'a B,
    page: Option<B::Page>,
}

impl<B: PdfBackend> Drop for PageGuard<'_, B> {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            self.backend.close_page(page);
        }
    }
}

struct TextPageGuard<'a, B: PdfBackend> {
    backend: &'a B,
    text_page: Option<B::TextPage>,
}

impl<B: PdfBackend> Drop for TextPageGuard<'_, B> {
    fn drop(&mut self) {
        if let Some(text_page) = self.text_page.take() {
            self.backend.close_text_page(text_page);
        }
    }
}

struct BitmapGuard<'a, 'buf, B: PdfBackend> {
    backend: &'a B,
    bitmap: Option<B::Bitmap<'buf>>,
}

impl<B: PdfBackend> Drop for BitmapGuard<'_, '_, B> {
    fn drop(&mut self) {
        if let Some(bitmap) = self.bitmap.take() {
            self.backend.destroy_bitmap(bitmap);
        }
    }
}

/// Render one page into a new `width × height` ARGB buffer.
///
/// The buffer is filled with opaque white before the page is painted. Page
/// index range checking is the caller's job; an index the engine rejects is
/// reported as `RenderFailed`. On any failure the partially written buffer is
/// dropped and every native handle acquired so far is released.
#[allow(clippy::too_many_arguments)]
pub(crate) fn render_page<B: PdfBackend>(
    backend: &B,
    document: &B::Document,
    page_index: usize,
    width: u32,
    height: u32,
    dpi_x: f32,
    dpi_y: f32,
    config: &RenderConfig,
) -> Result<PixelBuffer> {
    let (w, h, len) = checked_dimensions(width, height)?;
    let index = i32::try_from(page_index)
        .map_err(|_| PdfError::render_failed(page_index, "page index exceeds native range"))?;

    debug!(page_index, width, height, dpi_x, dpi_y, "rendering page");

    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|err| {
        PdfError::InvalidParameter(format!(
            "render size {}x{} does not fit in memory: {}",
            width, height, err
        ))
    })?;
    data.resize(len, 0);

    if let Err(err) = paint(backend, document, page_index, index, w, h, &mut data, config) {
        warn!(page_index, error = %err, "page render failed");
        return Err(err);
    }

    Ok(PixelBuffer {
        width,
        height,
        dpi_x,
        dpi_y,
        data,
    })
}

#[allow(clippy::too_many_arguments)]
fn paint<B: PdfBackend>(
    backend: &B,
    document: &B::Document,
    page_index: usize,
    index: i32,
    width: i32,
    height: i32,
    pixels: &mut [u8],
    config: &RenderConfig,
) -> Result<()> {
    let stride = width * BYTES_PER_PIXEL as i32;

    let mut bitmap = BitmapGuard {
        backend,
        bitmap: Some(
            backend
                .create_bitmap(width, height, pixels, stride)
                .ok_or_else(|| {
                    PdfError::render_failed(page_index, "FPDFBitmap_CreateEx returned null")
                })?,
        ),
    };
    if let Some(bitmap) = bitmap.bitmap.as_mut() {
        backend.fill_rect(bitmap, 0, 0, width, height, WHITE);
    }

    let page = PageGuard {
        backend,
        page: Some(
            backend
                .load_page(document, index)
                .ok_or_else(|| PdfError::render_failed(page_index, "FPDF_LoadPage returned null"))?,
        ),
    };

    // The text layer is not needed to paint; a page without one still renders.
    let text_page = TextPageGuard {
        backend,
        text_page: page.page.as_ref().and_then(|p| backend.load_text_page(p)),
    };
    if text_page.text_page.is_none() {
        debug!(page_index, "text layer unavailable");
    }

    let painted = match (bitmap.bitmap.as_mut(), page.page.as_ref()) {
        (Some(bitmap), Some(page)) => backend.render_page_bitmap(
            bitmap,
            page,
            0,
            0,
            width,
            height,
            0, // no rotation
            config.flags().bits(),
        ),
        _ => false,
    };
    if !painted {
        return Err(PdfError::render_failed(
            page_index,
            "FPDF_RenderPageBitmap reported failure",
        ));
    }

    Ok(())
}

/// Validate output dimensions: both non-zero, each representable as a
/// native `int` row/stride, and the total byte size addressable.
fn checked_dimensions(width: u32, height: u32) -> Result<(i32, i32, usize)> {
    if width == 0 || height == 0 {
        return Err(PdfError::InvalidParameter(format!(
            "render size must be non-zero, got {}x{}",
            width, height
        )));
    }

    let too_large = || {
        PdfError::InvalidParameter(format!("render size {}x{} is too large", width, height))
    };

    let stride = (width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .filter(|s| i32::try_from(*s).is_ok())
        .ok_or_else(too_large)?;
    let len = stride.checked_mul(height as usize).ok_or_else(too_large)?;
    let h = i32::try_from(height).map_err(|_| too_large())?;

    // stride fits in i32, so width does too
    Ok((width as i32, h, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(width: u32, height: u32, data: Vec<u8>) -> PixelBuffer {
        PixelBuffer {
            width,
            height,
            dpi_x: 72.0,
            dpi_y: 96.0,
            data,
        }
    }

    #[test]
    fn test_render_flags() {
        let flags = RenderFlags::ANNOT | RenderFlags::PRINTING;
        assert_eq!(flags.bits(), 0x801);
        assert!(flags.contains(RenderFlags::ANNOT));
        assert!(flags.contains(RenderFlags::PRINTING));
        assert!(!flags.contains(RenderFlags::GRAYSCALE));
        assert!(RenderFlags::empty().is_empty());
        assert_eq!(RenderFlags::default(), RenderFlags::empty());
    }

    #[test]
    fn test_render_config() {
        let config = RenderConfig::new();
        assert!(config.flags().is_empty());

        let config = config
            .set_flags(RenderFlags::ANNOT)
            .add_flags(RenderFlags::LCD_TEXT);
        assert_eq!(config.flags().bits(), 0x03);

        let config = config.set_flags(RenderFlags::GRAYSCALE);
        assert_eq!(config.flags(), RenderFlags::GRAYSCALE);
    }

    #[test]
    fn test_pixel_buffer_accessors() {
        // 2x1: white, then semi-transparent red
        let buf = buffer(2, 1, vec![0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0x80]);
        assert_eq!(buf.stride(), 8);
        assert_eq!(buf.dpi(), (72.0, 96.0));
        assert_eq!(buf.pixel(0, 0), Some(0xFFFF_FFFF));
        assert_eq!(buf.pixel(1, 0), Some(0x80FF_0000));
        assert_eq!(buf.pixel(2, 0), None);
        assert_eq!(buf.pixel(0, 1), None);
        assert!(!buf.is_opaque());
        assert_eq!(buf.pixels().collect::<Vec<_>>(), vec![0xFFFF_FFFF, 0x80FF_0000]);
        assert_eq!(buf.to_rgba(), vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x80]);
        assert_eq!(buf.into_vec().len(), 8);
    }

    #[test]
    fn test_checked_dimensions() {
        assert_eq!(checked_dimensions(100, 200).unwrap(), (100, 200, 80_000));
        assert!(matches!(
            checked_dimensions(0, 10),
            Err(PdfError::InvalidParameter(_))
        ));
        assert!(matches!(
            checked_dimensions(10, 0),
            Err(PdfError::InvalidParameter(_))
        ));
        assert!(matches!(
            checked_dimensions(u32::MAX, 1),
            Err(PdfError::InvalidParameter(_))
        ));
    }
}
