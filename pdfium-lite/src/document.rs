//! PDF document representation

use crate::backend::PdfBackend;
use crate::error::{LoadFailure, PdfError, Result};
use crate::metadata::{self, PdfInformation};
use crate::pdfium::Pdfium;
use crate::render::{self, PixelBuffer, RenderConfig};
use chrono::{DateTime, FixedOffset};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An open PDF document.
///
/// Owns the native document handle until [`close`](Self::close) is called or
/// the value is dropped. Once closed, every operation fails with
/// [`PdfError::DocumentClosed`]. Calls on one document must not overlap;
/// share it between threads only behind a lock.
///
/// # Example
///
/// ```no_run
/// use pdfium_lite::{PdfBackend, Pdfium};
///
/// fn first_page<B: PdfBackend>(pdfium: &Pdfium<B>) -> pdfium_lite::Result<()> {
///     let mut doc = pdfium.load_document("document.pdf", None)?;
///
///     let info = doc.information()?;
///     println!("Title: {:?}, pages: {}", info.title, doc.page_count()?);
///
///     let pixels = doc.render(0, 850, 1100, 100.0, 100.0)?;
///     assert_eq!(pixels.width(), 850);
///
///     doc.close();
///     Ok(())
/// }
/// ```
pub struct PdfDocument<B: PdfBackend> {
    // Both are `Some` while open and `None` once closed; a closed document
    // holds no library registration.
    library: Option<Pdfium<B>>,
    handle: Option<B::Document>,
    path: PathBuf,
}

impl<B: PdfBackend> PdfDocument<B> {
    /// Open a PDF file.
    ///
    /// # Arguments
    ///
    /// * `pdfium` - Library handle; the document keeps a clone of it
    /// * `path` - Path to the PDF file
    /// * `password` - Optional password for encrypted PDFs
    pub fn load<P: AsRef<Path>>(
        pdfium: &Pdfium<B>,
        path: P,
        password: Option<&str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        // The native loader takes a NUL-terminated UTF-8 path.
        if path.to_str().map_or(true, |p| p.contains('\0')) {
            warn!(path = %path_str, "path cannot be passed to PDFium");
            return Err(LoadFailure::InvalidPath(path_str).into());
        }
        if password.is_some_and(|p| p.contains('\0')) {
            warn!(path = %path_str, "password contains NUL");
            return Err(LoadFailure::InvalidPassword.into());
        }

        let backend = pdfium.backend();
        let Some(handle) = backend.load_document(path, password) else {
            let cause = LoadFailure::from_error_code(backend.last_error(), &path_str);
            warn!(path = %path_str, %cause, "failed to open PDF document");
            return Err(cause.into());
        };

        debug!(
            path = %path_str,
            pages = backend.page_count(&handle),
            "opened PDF document"
        );
        Ok(Self {
            library: Some(pdfium.clone()),
            handle: Some(handle),
            path: path.to_path_buf(),
        })
    }

    /// Backend and native handle of an open document.
    fn open(&self) -> Result<(&B, &B::Document)> {
        match (&self.library, &self.handle) {
            (Some(library), Some(handle)) => Ok((library.backend(), handle)),
            _ => Err(PdfError::DocumentClosed),
        }
    }

    /// Path the document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True after [`close`](Self::close).
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// Get the number of pages in the document.
    ///
    /// Asks the native engine on every call; nothing is cached.
    pub fn page_count(&self) -> Result<usize> {
        let (backend, handle) = self.open()?;
        let count = backend.page_count(handle);
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Get the document information dictionary.
    ///
    /// Missing or malformed entries come back as `None`; the only error is
    /// [`PdfError::DocumentClosed`].
    pub fn information(&self) -> Result<PdfInformation> {
        let (backend, handle) = self.open()?;
        Ok(PdfInformation::read(backend, handle))
    }

    /// Get a metadata text value by tag (e.g. "Title", "Author", "Trapped").
    ///
    /// Returns an empty string if the tag is absent.
    pub fn metadata_text(&self, tag: &str) -> Result<String> {
        let (backend, handle) = self.open()?;
        Ok(metadata::read_text(backend, handle, tag))
    }

    /// Get a metadata date value by tag (e.g. "CreationDate", "ModDate").
    ///
    /// Returns `None` if the tag is absent or is not a valid PDF date.
    pub fn metadata_date(&self, tag: &str) -> Result<Option<DateTime<FixedOffset>>> {
        let (backend, handle) = self.open()?;
        Ok(metadata::read_date(backend, handle, tag))
    }

    /// Render a page into a `width × height` ARGB buffer on a white
    /// background.
    ///
    /// # Arguments
    ///
    /// * `page_index` - Page index (0-based)
    /// * `width`, `height` - Output size in pixels, both non-zero
    /// * `dpi_x`, `dpi_y` - Resolution tag copied onto the buffer unchanged
    ///
    /// # Errors
    ///
    /// * [`PdfError::PageIndexOutOfBounds`] if `page_index >= page_count()`
    /// * [`PdfError::RenderFailed`] if the native engine fails on the page
    /// * [`PdfError::InvalidParameter`] for a zero or oversized output size
    /// * [`PdfError::DocumentClosed`] after `close()`
    pub fn render(
        &self,
        page_index: usize,
        width: u32,
        height: u32,
        dpi_x: f32,
        dpi_y: f32,
    ) -> Result<PixelBuffer> {
        self.render_with_config(page_index, width, height, dpi_x, dpi_y, &RenderConfig::default())
    }

    /// Render a page with explicit render flags.
    pub fn render_with_config(
        &self,
        page_index: usize,
        width: u32,
        height: u32,
        dpi_x: f32,
        dpi_y: f32,
        config: &RenderConfig,
    ) -> Result<PixelBuffer> {
        let (backend, handle) = self.open()?;
        let count = self.page_count()?;
        if page_index >= count {
            return Err(PdfError::PageIndexOutOfBounds {
                index: page_index,
                count,
            });
        }

        render::render_page(
            backend,
            handle,
            page_index,
            width,
            height,
            dpi_x,
            dpi_y,
            config,
        )
    }

    /// Close the document, release the native handle and give up this
    /// document's hold on the native library.
    ///
    /// Calling `close` more than once has no further effect.
    pub fn close(&mut self) {
        if let (Some(library), Some(handle)) = (self.library.take(), self.handle.take()) {
            library.backend().close_document(handle);
            debug!(path = %self.path.display(), "closed PDF document");
        }
    }
}

impl<B: PdfBackend> Drop for PdfDocument<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: PdfBackend> std::fmt::Debug for PdfDocument<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .finish()
    }
}
