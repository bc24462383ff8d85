//! The boundary with the native rendering engine.
//!
//! Everything the façade needs from PDFium goes through [`PdfBackend`]. The
//! production implementation is `PdfiumFfi` (feature `pdfium`); tests drive
//! the same code paths with an in-memory engine.
//!
//! Methods mirror the C API one-to-one and report failure the way the C API
//! does (`None` for a null handle, `false`/`0` for failed calls). Interpreting
//! those results is the façade's job, not the backend's.

use std::path::Path;

use crate::pdfium::LibraryUsers;

/// Native PDF engine capabilities used by the façade.
///
/// Handles are plain values owned by whoever holds them; the `close_*` and
/// `destroy_*` methods consume them. The façade guarantees each handle it
/// obtains is released exactly once.
pub trait PdfBackend {
    /// Open document handle
    type Document;
    /// Loaded page handle
    type Page;
    /// Text layer of a loaded page
    type TextPage;
    /// BGRA bitmap view over caller-owned pixel memory
    type Bitmap<'buf>;

    /// Process-wide bookkeeping for [`init_library`](Self::init_library) /
    /// [`destroy_library`](Self::destroy_library). Every backend value that
    /// talks to the same native library must return the same counter.
    fn library_users(&self) -> &LibraryUsers;

    /// `FPDF_InitLibrary`
    fn init_library(&self);

    /// `FPDF_DestroyLibrary`
    fn destroy_library(&self);

    /// `FPDF_LoadDocument`. `None` on failure; see [`last_error`](Self::last_error).
    fn load_document(&self, path: &Path, password: Option<&str>) -> Option<Self::Document>;

    /// `FPDF_GetLastError`
    fn last_error(&self) -> u32;

    /// `FPDF_CloseDocument`
    fn close_document(&self, document: Self::Document);

    /// `FPDF_GetPageCount`
    fn page_count(&self, document: &Self::Document) -> i32;

    /// `FPDF_GetMetaText`.
    ///
    /// Returns the number of bytes the UTF-16LE value needs, terminator
    /// included. With `buffer == None` nothing is written; with a buffer at
    /// least that long the value is copied into it. A return of 0 signals
    /// failure.
    fn meta_text(&self, document: &Self::Document, tag: &str, buffer: Option<&mut [u8]>)
        -> usize;

    /// `FPDF_LoadPage`
    fn load_page(&self, document: &Self::Document, index: i32) -> Option<Self::Page>;

    /// `FPDF_ClosePage`
    fn close_page(&self, page: Self::Page);

    /// `FPDFText_LoadPage`
    fn load_text_page(&self, page: &Self::Page) -> Option<Self::TextPage>;

    /// `FPDFText_ClosePage`
    fn close_text_page(&self, text_page: Self::TextPage);

    /// `FPDFBitmap_CreateEx` with `FPDFBitmap_BGRA` over `pixels`, which
    /// must hold at least `stride * height` bytes.
    fn create_bitmap<'buf>(
        &self,
        width: i32,
        height: i32,
        pixels: &'buf mut [u8],
        stride: i32,
    ) -> Option<Self::Bitmap<'buf>>;

    /// `FPDFBitmap_FillRect`; `color` is 0xAARRGGBB.
    fn fill_rect(
        &self,
        bitmap: &mut Self::Bitmap<'_>,
        left: i32,
        top: i32,
        width: i32,
        height: i32,
        color: u32,
    );

    /// `FPDF_RenderPageBitmap`. Returns `false` when the engine reports a
    /// rasterization failure.
    #[allow(clippy::too_many_arguments)]
    fn render_page_bitmap(
        &self,
        bitmap: &mut Self::Bitmap<'_>,
        page: &Self::Page,
        start_x: i32,
        start_y: i32,
        size_x: i32,
        size_y: i32,
        rotate: i32,
        flags: u32,
    ) -> bool;

    /// `FPDFBitmap_Destroy`. The pixel memory itself is not freed.
    fn destroy_bitmap(&self, bitmap: Self::Bitmap<'_>);
}
