//! Main PDFium entry point and native library lifetime

use crate::backend::PdfBackend;
use crate::document::PdfDocument;
use crate::error::Result;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// Process-wide reference count for one native library.
///
/// The first [`Pdfium`] handle to be created initializes the library; the
/// last one to be dropped tears it down. Documents keep a `Pdfium` clone, so
/// the library is never destroyed while a document is still open.
#[derive(Debug, Default)]
pub struct LibraryUsers {
    count: Mutex<usize>,
}

impl LibraryUsers {
    /// Create a counter with no users. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(0),
        }
    }

    /// Number of live `Pdfium` handles using the library.
    pub fn count(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a user, running `init` on the 0 -> 1 transition.
    ///
    /// The lock is held while `init` runs so a concurrent caller cannot
    /// observe the library as initialized before it is.
    pub(crate) fn acquire(&self, init: impl FnOnce()) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        if *count == 0 {
            trace!("initializing native PDF library");
            init();
        }
        *count += 1;
    }

    /// Drop a user, running `destroy` on the 1 -> 0 transition.
    pub(crate) fn release(&self, destroy: impl FnOnce()) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        match *count {
            0 => {}
            1 => {
                *count = 0;
                trace!("destroying native PDF library");
                destroy();
            }
            _ => *count -= 1,
        }
    }
}

/// Main entry point for PDFium operations.
///
/// Holding a `Pdfium` keeps the native library initialized. Clones share one
/// registration; independent handles (e.g. two calls to `Pdfium::new()`) each
/// register separately with the backend's [`LibraryUsers`].
///
/// # Example
///
/// ```no_run
/// use pdfium_lite::{PdfBackend, Pdfium};
///
/// fn page_total<B: PdfBackend>(pdfium: &Pdfium<B>) -> pdfium_lite::Result<usize> {
///     let doc = pdfium.load_document("document.pdf", None)?;
///     doc.page_count()
/// }
/// ```
pub struct Pdfium<B: PdfBackend> {
    inner: Arc<PdfiumInner<B>>,
}

struct PdfiumInner<B: PdfBackend> {
    backend: B,
}

impl<B: PdfBackend> Pdfium<B> {
    /// Wrap a backend, initializing its native library if no other handle
    /// has done so yet.
    pub fn with_backend(backend: B) -> Self {
        backend
            .library_users()
            .acquire(|| backend.init_library());
        Self {
            inner: Arc::new(PdfiumInner { backend }),
        }
    }

    /// The native engine behind this handle.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Number of live library registrations (see [`LibraryUsers`]).
    pub fn library_users(&self) -> usize {
        self.inner.backend.library_users().count()
    }

    /// Load a PDF document from a file path.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the PDF file
    /// * `password` - Optional password for encrypted PDFs
    ///
    /// # Returns
    ///
    /// A `PdfDocument` on success, or `PdfError::LoadFailed` describing why
    /// the native engine refused the file.
    pub fn load_document<P: AsRef<Path>>(
        &self,
        path: P,
        password: Option<&str>,
    ) -> Result<PdfDocument<B>> {
        PdfDocument::load(self, path, password)
    }
}

impl<B: PdfBackend> Clone for Pdfium<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: PdfBackend> Drop for PdfiumInner<B> {
    fn drop(&mut self) {
        let backend = &self.backend;
        backend.library_users().release(|| backend.destroy_library());
    }
}

#[cfg(feature = "pdfium")]
impl Pdfium<crate::ffi::PdfiumFfi> {
    /// Create a handle to the linked PDFium library, initializing it if
    /// needed.
    pub fn new() -> Self {
        Self::with_backend(crate::ffi::PdfiumFfi)
    }
}

#[cfg(feature = "pdfium")]
impl Default for Pdfium<crate::ffi::PdfiumFfi> {
    fn default() -> Self {
        Self::new()
    }
}
