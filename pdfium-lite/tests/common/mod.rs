//! In-memory PDF engine for exercising the façade without libpdfium.
//!
//! Documents are registered by path. Every handle the façade obtains is
//! tracked so tests can assert that nothing is leaked, and each handle kind
//! has a fixed capacity so a leak eventually surfaces as a load failure, the
//! way a real engine runs out of resources.

#![allow(dead_code)]

use pdfium_lite::{LibraryUsers, PdfBackend};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const ERR_FILE: u32 = 2;
pub const ERR_FORMAT: u32 = 3;
pub const ERR_PASSWORD: u32 = 4;
pub const ERR_SECURITY: u32 = 5;

/// Opaque black, painted over the top-left quarter of every rendered page.
pub const INK: u32 = 0xFF00_0000;

/// A document the fake engine can open.
#[derive(Debug, Clone, Default)]
pub struct FakePdf {
    pub pages: usize,
    pub password: Option<String>,
    pub corrupt: bool,
    pub unsupported_security: bool,
    pub metadata: HashMap<String, String>,
    /// Tags whose second (filling) metadata call fails.
    pub broken_tags: HashSet<String>,
    /// Pages whose rasterization reports failure.
    pub failing_pages: HashSet<usize>,
    /// Pages without a text layer.
    pub pages_without_text: HashSet<usize>,
    /// Pages counted by the document that fail to load.
    pub unloadable_pages: HashSet<usize>,
}

impl FakePdf {
    pub fn with_pages(pages: usize) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn meta(mut self, tag: &str, value: &str) -> Self {
        self.metadata.insert(tag.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Default)]
pub struct State {
    pub files: HashMap<PathBuf, FakePdf>,
    pub last_error: u32,
    next_id: u32,
    pub capacity: usize,
    pub live_documents: HashSet<u32>,
    pub live_pages: HashSet<u32>,
    pub live_text_pages: HashSet<u32>,
    pub live_bitmaps: HashSet<u32>,
    pub inits: usize,
    pub destroys: usize,
    /// (tag, called with a buffer)
    pub meta_calls: Vec<(String, bool)>,
    pub fail_bitmap_creation: bool,
    pub last_flags: Option<u32>,
    pub last_rotation: Option<i32>,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug)]
pub struct FakeDocument {
    id: u32,
    path: PathBuf,
}

#[derive(Debug)]
pub struct FakePage {
    id: u32,
    index: usize,
    path: PathBuf,
}

#[derive(Debug)]
pub struct FakeTextPage {
    id: u32,
}

#[derive(Debug)]
pub struct FakeBitmap<'buf> {
    id: u32,
    width: usize,
    height: usize,
    stride: usize,
    pixels: &'buf mut [u8],
}

impl FakeBitmap<'_> {
    fn fill(&mut self, left: i32, top: i32, width: i32, height: i32, color: u32) {
        let x0 = left.max(0) as usize;
        let y0 = top.max(0) as usize;
        let x1 = ((left + width).max(0) as usize).min(self.width);
        let y1 = ((top + height).max(0) as usize).min(self.height);
        let bytes = color.to_le_bytes();
        for y in y0..y1 {
            for x in x0..x1 {
                let offset = y * self.stride + x * 4;
                self.pixels[offset..offset + 4].copy_from_slice(&bytes);
            }
        }
    }
}

/// Cloning shares state and the library counter, like two handles onto one
/// process-wide native library.
#[derive(Debug, Clone)]
pub struct FakeEngine {
    state: Arc<Mutex<State>>,
    users: Arc<LibraryUsers>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        let state = State {
            capacity: 16,
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            users: Arc::new(LibraryUsers::new()),
        }
    }

    pub fn with_pdf(self, path: &str, pdf: FakePdf) -> Self {
        self.state().files.insert(PathBuf::from(path), pdf);
        self
    }

    /// Shared state. Poisoning from a failed assertion is ignored.
    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// (documents, pages, text pages, bitmaps) currently open.
    pub fn live_handles(&self) -> (usize, usize, usize, usize) {
        let s = self.state();
        (
            s.live_documents.len(),
            s.live_pages.len(),
            s.live_text_pages.len(),
            s.live_bitmaps.len(),
        )
    }

    /// Live library registrations.
    pub fn users_count(&self) -> usize {
        self.users.count()
    }

    pub fn meta_calls_for(&self, tag: &str) -> usize {
        self.state()
            .meta_calls
            .iter()
            .filter(|(t, _)| t == tag)
            .count()
    }

    fn pdf(&self, path: &Path) -> Option<FakePdf> {
        self.state().files.get(path).cloned()
    }
}

fn encode_utf16le(value: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = value.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

impl PdfBackend for FakeEngine {
    type Document = FakeDocument;
    type Page = FakePage;
    type TextPage = FakeTextPage;
    type Bitmap<'buf> = FakeBitmap<'buf>;

    fn library_users(&self) -> &LibraryUsers {
        &self.users
    }

    fn init_library(&self) {
        self.state().inits += 1;
    }

    fn destroy_library(&self) {
        self.state().destroys += 1;
    }

    fn load_document(&self, path: &Path, password: Option<&str>) -> Option<Self::Document> {
        let mut s = self.state();
        let Some(pdf) = s.files.get(path).cloned() else {
            s.last_error = ERR_FILE;
            return None;
        };
        if pdf.corrupt {
            s.last_error = ERR_FORMAT;
            return None;
        }
        if pdf.unsupported_security {
            s.last_error = ERR_SECURITY;
            return None;
        }
        if pdf.password.is_some() && pdf.password.as_deref() != password {
            s.last_error = ERR_PASSWORD;
            return None;
        }
        if s.live_documents.len() >= s.capacity {
            s.last_error = 1;
            return None;
        }
        let id = s.next_id();
        s.live_documents.insert(id);
        s.last_error = 0;
        Some(FakeDocument {
            id,
            path: path.to_path_buf(),
        })
    }

    fn last_error(&self) -> u32 {
        self.state().last_error
    }

    fn close_document(&self, document: Self::Document) {
        assert!(
            self.state().live_documents.remove(&document.id),
            "document closed twice"
        );
    }

    fn page_count(&self, document: &Self::Document) -> i32 {
        self.pdf(&document.path).map_or(0, |pdf| pdf.pages as i32)
    }

    fn meta_text(
        &self,
        document: &Self::Document,
        tag: &str,
        buffer: Option<&mut [u8]>,
    ) -> usize {
        self.state()
            .meta_calls
            .push((tag.to_string(), buffer.is_some()));

        let Some(pdf) = self.pdf(&document.path) else {
            return 0;
        };
        let encoded = encode_utf16le(pdf.metadata.get(tag).map_or("", String::as_str));

        match buffer {
            None => encoded.len(),
            Some(_) if pdf.broken_tags.contains(tag) => 0,
            Some(buf) => {
                if buf.len() >= encoded.len() {
                    buf[..encoded.len()].copy_from_slice(&encoded);
                }
                encoded.len()
            }
        }
    }

    fn load_page(&self, document: &Self::Document, index: i32) -> Option<Self::Page> {
        let pdf = self.pdf(&document.path)?;
        let index = usize::try_from(index).ok()?;
        let mut s = self.state();
        if index >= pdf.pages
            || pdf.unloadable_pages.contains(&index)
            || s.live_pages.len() >= s.capacity
        {
            return None;
        }
        let id = s.next_id();
        s.live_pages.insert(id);
        Some(FakePage {
            id,
            index,
            path: document.path.clone(),
        })
    }

    fn close_page(&self, page: Self::Page) {
        assert!(self.state().live_pages.remove(&page.id), "page closed twice");
    }

    fn load_text_page(&self, page: &Self::Page) -> Option<Self::TextPage> {
        let pdf = self.pdf(&page.path)?;
        if pdf.pages_without_text.contains(&page.index) {
            return None;
        }
        let mut s = self.state();
        if s.live_text_pages.len() >= s.capacity {
            return None;
        }
        let id = s.next_id();
        s.live_text_pages.insert(id);
        Some(FakeTextPage { id })
    }

    fn close_text_page(&self, text_page: Self::TextPage) {
        assert!(
            self.state().live_text_pages.remove(&text_page.id),
            "text page closed twice"
        );
    }

    fn create_bitmap<'buf>(
        &self,
        width: i32,
        height: i32,
        pixels: &'buf mut [u8],
        stride: i32,
    ) -> Option<Self::Bitmap<'buf>> {
        let (width, height, stride) = (width as usize, height as usize, stride as usize);
        assert_eq!(stride, width * 4, "stride must be width * 4");
        assert!(pixels.len() >= stride * height);

        let mut s = self.state();
        if s.fail_bitmap_creation || s.live_bitmaps.len() >= s.capacity {
            return None;
        }
        let id = s.next_id();
        s.live_bitmaps.insert(id);
        Some(FakeBitmap {
            id,
            width,
            height,
            stride,
            pixels,
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
        bitmap.fill(left, top, width, height, color);
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
        {
            let mut s = self.state();
            s.last_flags = Some(flags);
            s.last_rotation = Some(rotate);
        }
        let failing = self
            .pdf(&page.path)
            .is_some_and(|pdf| pdf.failing_pages.contains(&page.index));

        // Paint before reporting, so a failed render leaves a dirty buffer.
        bitmap.fill(start_x, start_y, size_x / 2, size_y / 2, INK);
        !failing
    }

    fn destroy_bitmap(&self, bitmap: Self::Bitmap<'_>) {
        assert!(
            self.state().live_bitmaps.remove(&bitmap.id),
            "bitmap destroyed twice"
        );
    }
}
