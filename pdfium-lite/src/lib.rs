//! # pdfium-lite
//!
//! A small, safe façade over PDFium: open a document, read its information
//! dictionary, and rasterize pages into ARGB pixel buffers.
//!
//! - **Scoped native handles**: every page, text page and bitmap handle taken
//!   during a call is released before the call returns, on success or error.
//! - **Best-effort metadata**: missing or malformed Info entries are `None`,
//!   never errors.
//! - **Reference-counted library lifetime**: the native library is
//!   initialized by the first [`Pdfium`] handle and torn down after the last
//!   handle and the last open document are gone.
//!
//! The native engine sits behind the [`PdfBackend`] trait. Enable the
//! `pdfium` feature for `PdfiumFfi`, which links against `libpdfium` (see
//! `PDFIUM_LIB_DIR` in `pdfium-sys`).
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfium_lite::{PdfBackend, Pdfium};
//!
//! fn summarize<B: PdfBackend>(pdfium: &Pdfium<B>) -> pdfium_lite::Result<()> {
//!     let doc = pdfium.load_document("document.pdf", None)?;
//!
//!     let info = doc.information()?;
//!     println!("{:?} by {:?}", info.title, info.author);
//!
//!     for index in 0..doc.page_count()? {
//!         let page = doc.render(index, 612, 792, 72.0, 72.0)?;
//!         println!("page {} -> {} bytes", index, page.data().len());
//!     }
//!     Ok(())
//! }
//! ```

mod backend;
mod document;
mod error;
#[cfg(feature = "pdfium")]
mod ffi;
mod metadata;
mod pdfium;
mod render;

pub use backend::PdfBackend;
pub use document::PdfDocument;
pub use error::{LoadFailure, PdfError, Result};
#[cfg(feature = "pdfium")]
pub use ffi::{Document, FfiBitmap, FfiDocument, FfiPage, FfiTextPage, PdfiumFfi};
pub use metadata::{parse_pdf_date, read_date, read_text, tags, PdfInformation};
pub use pdfium::{LibraryUsers, Pdfium};
pub use render::{PixelBuffer, RenderConfig, RenderFlags};
