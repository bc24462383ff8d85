//! PDFium backend over the C API in `pdfium-sys`

use crate::backend::PdfBackend;
use crate::error::{ERR_FILE, ERR_FORMAT, ERR_PASSWORD, ERR_SECURITY};
use crate::pdfium::LibraryUsers;
use crate::render::RenderFlags;
use pdfium_sys::*;
use std::ffi::{c_int, c_void, CString};
use std::marker::PhantomData;
use std::path::Path;
use std::ptr::NonNull;

// Error codes and render flags are mirrored in the backend-independent
// modules; keep them in step with the C headers.
const _: () = {
    assert!(ERR_FILE == FPDF_ERR_FILE);
    assert!(ERR_FORMAT == FPDF_ERR_FORMAT);
    assert!(ERR_PASSWORD == FPDF_ERR_PASSWORD);
    assert!(ERR_SECURITY == FPDF_ERR_SECURITY);
    assert!(RenderFlags::ANNOT.bits() == FPDF_ANNOT);
    assert!(RenderFlags::LCD_TEXT.bits() == FPDF_LCD_TEXT);
    assert!(RenderFlags::NO_NATIVE_TEXT.bits() == FPDF_NO_NATIVETEXT);
    assert!(RenderFlags::GRAYSCALE.bits() == FPDF_GRAYSCALE);
    assert!(RenderFlags::REVERSE_BYTE_ORDER.bits() == FPDF_REVERSE_BYTE_ORDER);
    assert!(RenderFlags::DEBUG_INFO.bits() == FPDF_DEBUG_INFO);
    assert!(RenderFlags::NO_CATCH.bits() == FPDF_NO_CATCH);
    assert!(RenderFlags::LIMITED_IMAGE_CACHE.bits() == FPDF_RENDER_LIMITEDIMAGECACHE);
    assert!(RenderFlags::FORCE_HALFTONE.bits() == FPDF_RENDER_FORCEHALFTONE);
    assert!(RenderFlags::PRINTING.bits() == FPDF_PRINTING);
};

/// PDFium is one library per process, so every `PdfiumFfi` shares this.
static LIBRARY_USERS: LibraryUsers = LibraryUsers::new();

/// The linked PDFium library.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumFfi;

/// Owned `FPDF_DOCUMENT`.
#[derive(Debug)]
pub struct FfiDocument(NonNull<fpdf_document_t__>);

/// Owned `FPDF_PAGE`.
#[derive(Debug)]
pub struct FfiPage(NonNull<fpdf_page_t__>);

/// Owned `FPDF_TEXTPAGE`.
#[derive(Debug)]
pub struct FfiTextPage(NonNull<fpdf_textpage_t__>);

/// `FPDF_BITMAP` wrapping external memory borrowed for `'buf`.
#[derive(Debug)]
pub struct FfiBitmap<'buf> {
    handle: NonNull<fpdf_bitmap_t__>,
    _pixels: PhantomData<&'buf mut [u8]>,
}

impl PdfBackend for PdfiumFfi {
    type Document = FfiDocument;
    type Page = FfiPage;
    type TextPage = FfiTextPage;
    type Bitmap<'buf> = FfiBitmap<'buf>;

    fn library_users(&self) -> &LibraryUsers {
        &LIBRARY_USERS
    }

    fn init_library(&self) {
        unsafe { FPDF_InitLibrary() }
    }

    fn destroy_library(&self) {
        unsafe { FPDF_DestroyLibrary() }
    }

    fn load_document(&self, path: &Path, password: Option<&str>) -> Option<Self::Document> {
        let c_path = CString::new(path.to_str()?).ok()?;
        let c_password = match password {
            Some(p) => Some(CString::new(p).ok()?),
            None => None,
        };
        let password_ptr = c_password
            .as_ref()
            .map(|p| p.as_ptr())
            .unwrap_or(std::ptr::null());

        let doc = unsafe { FPDF_LoadDocument(c_path.as_ptr(), password_ptr) };
        NonNull::new(doc).map(FfiDocument)
    }

    fn last_error(&self) -> u32 {
        unsafe { FPDF_GetLastError() as u32 }
    }

    fn close_document(&self, document: Self::Document) {
        unsafe { FPDF_CloseDocument(document.0.as_ptr()) }
    }

    fn page_count(&self, document: &Self::Document) -> i32 {
        unsafe { FPDF_GetPageCount(document.0.as_ptr()) }
    }

    fn meta_text(
        &self,
        document: &Self::Document,
        tag: &str,
        buffer: Option<&mut [u8]>,
    ) -> usize {
        let Ok(c_tag) = CString::new(tag) else {
            return 0;
        };
        let (ptr, len) = match buffer {
            Some(buf) => (buf.as_mut_ptr() as *mut c_void, buf.len()),
            None => (std::ptr::null_mut(), 0),
        };
        let written = unsafe {
            FPDF_GetMetaText(
                document.0.as_ptr(),
                c_tag.as_ptr(),
                ptr,
                len as FPDF_DWORD,
            )
        };
        written as usize
    }

    fn load_page(&self, document: &Self::Document, index: i32) -> Option<Self::Page> {
        let page = unsafe { FPDF_LoadPage(document.0.as_ptr(), index) };
        NonNull::new(page).map(FfiPage)
    }

    fn close_page(&self, page: Self::Page) {
        unsafe { FPDF_ClosePage(page.0.as_ptr()) }
    }

    fn load_text_page(&self, page: &Self::Page) -> Option<Self::TextPage> {
        let text_page = unsafe { FPDFText_LoadPage(page.0.as_ptr()) };
        NonNull::new(text_page).map(FfiTextPage)
    }

    fn close_text_page(&self, text_page: Self::TextPage) {
        unsafe { FPDFText_ClosePage(text_page.0.as_ptr()) }
    }

    fn create_bitmap<'buf>(
        &self,
        width: i32,
        height: i32,
        pixels: &'buf mut [u8],
        stride: i32,
    ) -> Option<Self::Bitmap<'buf>> {
        // PDFium writes `stride * height` bytes through the pointer; refuse
        // anything the slice cannot hold.
        let bpp = bitmap_bytes_per_pixel(FPDFBitmap_BGRA)?;
        let (w, h, s) = (
            usize::try_from(width).ok()?,
            usize::try_from(height).ok()?,
            usize::try_from(stride).ok()?,
        );
        if s < w.checked_mul(bpp)? || pixels.len() < s.checked_mul(h)? {
            return None;
        }

        let handle = unsafe {
            FPDFBitmap_CreateEx(
                width,
                height,
                FPDFBitmap_BGRA as c_int,
                pixels.as_mut_ptr() as *mut c_void,
                stride,
            )
        };
        NonNull::new(handle).map(|handle| FfiBitmap {
            handle,
            _pixels: PhantomData,
        })
    }

    fn fill_rect(
        &self,
        bitmap: &mut Self::Bitmap<'_>,
        left: i32,
        top: i32,
        width: i32,
        height: i32,
        color: u32,
    ) {
        unsafe {
            FPDFBitmap_FillRect(
                bitmap.handle.as_ptr(),
                left,
                top,
                width,
                height,
                color as FPDF_DWORD,
            );
        }
    }

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
    ) -> bool {
        // FPDF_RenderPageBitmap has no failure result; a loaded page always
        // paints (possibly nothing).
        unsafe {
            FPDF_RenderPageBitmap(
                bitmap.handle.as_ptr(),
                page.0.as_ptr(),
                start_x,
                start_y,
                size_x,
                size_y,
                rotate,
                flags as i32,
            );
        }
        true
    }

    fn destroy_bitmap(&self, bitmap: Self::Bitmap<'_>) {
        unsafe { FPDFBitmap_Destroy(bitmap.handle.as_ptr()) }
    }
}

/// A [`PdfDocument`](crate::PdfDocument) backed by the linked PDFium library.
pub type Document = crate::PdfDocument<PdfiumFfi>;
