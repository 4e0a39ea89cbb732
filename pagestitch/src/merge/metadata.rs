//! Document information for the compiled output.
//!
//! Writes the `/Info` dictionary: the user's Title, Author, Subject and
//! Keywords plus Creator, Producer and the creation date.

use crate::config::Metadata;
use lopdf::{Dictionary, Document, Object, StringFormat};
use std::time::{SystemTime, UNIX_EPOCH};

/// Name written to `/Creator` and `/Producer`.
const PRODUCER: &str = concat!("pagestitch ", env!("CARGO_PKG_VERSION"));

/// Writes and reads the output document's Info dictionary.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataManager;

impl MetadataManager {
    /// Create a new metadata manager.
    pub fn new() -> Self {
        Self
    }

    /// Set metadata on a document.
    ///
    /// Producer and dates are always written; user fields only when set.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pagestitch::merge::metadata::MetadataManager;
    /// # use pagestitch::config::Metadata;
    /// # use lopdf::Document;
    /// # fn example(mut doc: Document) {
    /// let metadata = Metadata::new(Some("Quarterly report".to_string()), None, None, None);
    /// MetadataManager::new().set_metadata(&mut doc, &metadata);
    /// # }
    /// ```
    pub fn set_metadata(&self, doc: &mut Document, metadata: &Metadata) {
        let mut info = Dictionary::new();

        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
            ("Keywords", &metadata.keywords),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, text(value));
            }
        }

        info.set("Creator", text(PRODUCER));
        info.set("Producer", text(PRODUCER));

        let date = format_pdf_date(SystemTime::now());
        info.set("CreationDate", text(&date));
        info.set("ModDate", text(&date));

        let info_id = doc.add_object(info);
        doc.trailer.set("Info", Object::Reference(info_id));
    }

    /// Read user metadata back from a document.
    pub fn get_metadata(&self, doc: &Document) -> Metadata {
        let Some(info) = doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .ok()
            .and_then(|id| doc.get_dictionary(id).ok())
        else {
            return Metadata::default();
        };

        Metadata::new(
            string_field(info, b"Title"),
            string_field(info, b"Author"),
            string_field(info, b"Subject"),
            string_field(info, b"Keywords"),
        )
    }
}

fn text(value: &str) -> Object {
    Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
}

fn string_field(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Format a time as a PDF date string (`D:YYYYMMDDHHmmSSZ`, UTC).
fn format_pdf_date(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let days = (secs / 86_400) as i64;
    let (year, month, day) = civil_from_days(days);
    let time_of_day = secs % 86_400;

    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}Z",
        year,
        month,
        day,
        time_of_day / 3_600,
        (time_of_day % 3_600) / 60,
        time_of_day % 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
