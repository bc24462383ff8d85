//! Document metadata: Info-dictionary text and PDF date strings

use crate::backend::PdfBackend;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Metadata tags read by [`PdfInformation`].
pub mod tags {
    pub const AUTHOR: &str = "Author";
    pub const CREATOR: &str = "Creator";
    pub const KEYWORDS: &str = "Keywords";
    pub const PRODUCER: &str = "Producer";
    pub const SUBJECT: &str = "Subject";
    pub const TITLE: &str = "Title";
    pub const CREATION_DATE: &str = "CreationDate";
    pub const MOD_DATE: &str = "ModDate";
}

/// `D:YYYYMMDDHHmmSS` with an optional `Z`, or `+`/`-` `HH'mm'` offset.
static RE_PDF_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"D:(?P<year>\d{4})(?P<month>\d{2})(?P<day>\d{2})(?P<hour>\d{2})(?P<minute>\d{2})(?P<second>\d{2})(?P<tz>[+\-Zz])?(?P<tz_hour>\d{2})?'?(?P<tz_minute>\d{2})?'?",
    )
    .expect("valid PDF date regex")
});

/// Document information dictionary.
///
/// Every field is either a real value or `None`; missing tags, empty values
/// and unparsable dates all come back as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfInformation {
    pub author: Option<String>,
    pub creator: Option<String>,
    pub keywords: Option<String>,
    pub producer: Option<String>,
    pub subject: Option<String>,
    pub title: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
    pub modification_date: Option<DateTime<FixedOffset>>,
}

impl PdfInformation {
    /// Read all eight fields from an open document.
    pub(crate) fn read<B: PdfBackend>(backend: &B, document: &B::Document) -> Self {
        let text = |tag: &str| non_empty(read_text(backend, document, tag));
        Self {
            author: text(tags::AUTHOR),
            creator: text(tags::CREATOR),
            keywords: text(tags::KEYWORDS),
            producer: text(tags::PRODUCER),
            subject: text(tags::SUBJECT),
            title: text(tags::TITLE),
            creation_date: read_date(backend, document, tags::CREATION_DATE),
            modification_date: read_date(backend, document, tags::MOD_DATE),
        }
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Read a metadata text value.
///
/// Uses the native two-call protocol: the first call reports the byte length
/// of the UTF-16LE value including its 2-byte terminator, the second fills a
/// buffer of exactly that length. Returns an empty string when the tag has no
/// value or the native layer fails to produce one.
pub fn read_text<B: PdfBackend>(backend: &B, document: &B::Document, tag: &str) -> String {
    if tag.contains('\0') {
        return String::new();
    }

    let length = backend.meta_text(document, tag, None);
    if length <= 2 {
        return String::new();
    }

    let mut buffer = vec![0u8; length];
    let written = backend.meta_text(document, tag, Some(&mut buffer));
    if written == 0 || written > length {
        debug!(tag, length, written, "metadata read failed, treating as absent");
        return String::new();
    }

    // Never decode past what either call reported, and drop the terminator.
    decode_utf16le(&buffer[..written.saturating_sub(2)])
}

/// Read a metadata date value. `None` when the tag is absent or its value is
/// not a PDF date.
pub fn read_date<B: PdfBackend>(
    backend: &B,
    document: &B::Document,
    tag: &str,
) -> Option<DateTime<FixedOffset>> {
    let raw = read_text(backend, document, tag);
    if raw.is_empty() {
        return None;
    }
    parse_pdf_date(&raw)
}

/// Parse a PDF date string such as `D:20230615143022+05'30'`.
///
/// A `Z`/`z` designator, or no designator at all, gives a zero offset. A
/// `+`/`-` designator needs both offset hours and minutes. Strings that do not
/// match, or that name an impossible date, time or offset, yield `None`.
pub fn parse_pdf_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let caps = RE_PDF_DATE.captures(value)?;
    let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = i32::try_from(num("year")?).ok()?;
    let date = NaiveDate::from_ymd_opt(year, num("month")?, num("day")?)?;
    let local = date.and_hms_opt(num("hour")?, num("minute")?, num("second")?)?;

    let offset = match caps.name("tz").map(|m| m.as_str()) {
        None | Some("Z") | Some("z") => FixedOffset::east_opt(0)?,
        Some(sign) => {
            let hours = num("tz_hour")?;
            let minutes = num("tz_minute")?;
            if hours > 23 || minutes > 59 {
                return None;
            }
            let seconds = i32::try_from(hours * 3600 + minutes * 60).ok()?;
            if sign == "-" {
                FixedOffset::west_opt(seconds)?
            } else {
                FixedOffset::east_opt(seconds)?
            }
        }
    };

    offset.from_local_datetime(&local).single()
}

/// Decode UTF-16LE bytes; an odd trailing byte is ignored and unpaired
/// surrogates become U+FFFD.
fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
