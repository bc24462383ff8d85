//! FFI bindings to PDFium
//!
//! Declarations for the subset of the PDFium C API that `pdfium-lite` drives:
//! library init/teardown, document and page lifecycle, metadata text, and
//! rendering into caller-owned bitmaps. Signatures follow `public/fpdfview.h`
//! and `public/fpdf_text.h`.
//!
//! Linking is configured by `build.rs` (see `PDFIUM_LIB_DIR`).

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use libc::{c_char, c_int, c_uint, c_ulong, c_void};

#[repr(C)]
pub struct fpdf_document_t__ {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct fpdf_page_t__ {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct fpdf_textpage_t__ {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct fpdf_bitmap_t__ {
    _unused: [u8; 0],
}

pub type FPDF_DOCUMENT = *mut fpdf_document_t__;
pub type FPDF_PAGE = *mut fpdf_page_t__;
pub type FPDF_TEXTPAGE = *mut fpdf_textpage_t__;
pub type FPDF_BITMAP = *mut fpdf_bitmap_t__;

pub type FPDF_BOOL = c_int;
pub type FPDF_DWORD = c_ulong;
pub type FPDF_STRING = *const c_char;
pub type FPDF_BYTESTRING = *const c_char;

// Error codes returned by FPDF_GetLastError.
pub const FPDF_ERR_SUCCESS: u32 = 0;
pub const FPDF_ERR_UNKNOWN: u32 = 1;
pub const FPDF_ERR_FILE: u32 = 2;
pub const FPDF_ERR_FORMAT: u32 = 3;
pub const FPDF_ERR_PASSWORD: u32 = 4;
pub const FPDF_ERR_SECURITY: u32 = 5;
pub const FPDF_ERR_PAGE: u32 = 6;

// Bitmap formats for FPDFBitmap_CreateEx.
pub const FPDFBitmap_Unknown: u32 = 0;
pub const FPDFBitmap_Gray: u32 = 1;
pub const FPDFBitmap_BGR: u32 = 2;
pub const FPDFBitmap_BGRx: u32 = 3;
pub const FPDFBitmap_BGRA: u32 = 4;

// Page rendering flags for FPDF_RenderPageBitmap.
pub const FPDF_ANNOT: u32 = 0x01;
pub const FPDF_LCD_TEXT: u32 = 0x02;
pub const FPDF_NO_NATIVETEXT: u32 = 0x04;
pub const FPDF_GRAYSCALE: u32 = 0x08;
pub const FPDF_REVERSE_BYTE_ORDER: u32 = 0x10;
pub const FPDF_DEBUG_INFO: u32 = 0x80;
pub const FPDF_NO_CATCH: u32 = 0x100;
pub const FPDF_RENDER_LIMITEDIMAGECACHE: u32 = 0x200;
pub const FPDF_RENDER_FORCEHALFTONE: u32 = 0x400;
pub const FPDF_PRINTING: u32 = 0x800;

extern "C" {
    pub fn FPDF_InitLibrary();
    pub fn FPDF_DestroyLibrary();
    pub fn FPDF_GetLastError() -> c_ulong;

    pub fn FPDF_LoadDocument(file_path: FPDF_STRING, password: FPDF_BYTESTRING) -> FPDF_DOCUMENT;
    pub fn FPDF_CloseDocument(document: FPDF_DOCUMENT);
    pub fn FPDF_GetPageCount(document: FPDF_DOCUMENT) -> c_int;

    /// Returns the number of bytes (UTF-16LE, including the terminator) the
    /// value needs. Writes only when `buflen` is large enough.
    pub fn FPDF_GetMetaText(
        document: FPDF_DOCUMENT,
        tag: FPDF_BYTESTRING,
        buffer: *mut c_void,
        buflen: c_ulong,
    ) -> c_ulong;

    pub fn FPDF_LoadPage(document: FPDF_DOCUMENT, page_index: c_int) -> FPDF_PAGE;
    pub fn FPDF_ClosePage(page: FPDF_PAGE);

    pub fn FPDFText_LoadPage(page: FPDF_PAGE) -> FPDF_TEXTPAGE;
    pub fn FPDFText_ClosePage(text_page: FPDF_TEXTPAGE);

    pub fn FPDFBitmap_CreateEx(
        width: c_int,
        height: c_int,
        format: c_int,
        first_scan: *mut c_void,
        stride: c_int,
    ) -> FPDF_BITMAP;
    pub fn FPDFBitmap_FillRect(
        bitmap: FPDF_BITMAP,
        left: c_int,
        top: c_int,
        width: c_int,
        height: c_int,
        color: FPDF_DWORD,
    ) -> FPDF_BOOL;
    pub fn FPDFBitmap_Destroy(bitmap: FPDF_BITMAP);

    pub fn FPDF_RenderPageBitmap(
        bitmap: FPDF_BITMAP,
        page: FPDF_PAGE,
        start_x: c_int,
        start_y: c_int,
        size_x: c_int,
        size_y: c_int,
        rotate: c_int,
        flags: c_int,
    );
}

/// Number of bytes per pixel for a `FPDFBitmap_*` format constant, or `None`
/// for `FPDFBitmap_Unknown` and unrecognized values.
pub fn bitmap_bytes_per_pixel(format: c_uint) -> Option<usize> {
    match format {
        FPDFBitmap_Gray => Some(1),
        FPDFBitmap_BGR => Some(3),
        FPDFBitmap_BGRx | FPDFBitmap_BGRA => Some(4),
        _ => None,
    }
}
