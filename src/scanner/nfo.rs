//! TMDB id extraction from NFO sidecar files.
//!
//! Only direct children of the document's root element are inspected:
//! `<uniqueid type="...">` entries and a bare `<tmdbid>`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, warn};

/// `uniqueid` type attributes checked, in order, before `tmdbid`.
const UNIQUEID_TYPES: [&str; 3] = ["Tmdb", "tmdb", "TMDB"];

/// Errors that can occur while reading an NFO file.
#[derive(Debug, thiserror::Error)]
pub enum NfoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),
}

/// Values of interest collected from one NFO document.
#[derive(Debug, Default)]
struct NfoIds {
    /// First `uniqueid` text per exact `type` attribute value.
    unique_ids: HashMap<String, String>,
    tmdbid: Option<String>,
}

/// Read the TMDB id from an NFO file.
///
/// Checks `uniqueid[@type='Tmdb']`, `uniqueid[@type='tmdb']`,
/// `uniqueid[@type='TMDB']`, then `tmdbid`, and returns the first non-empty
/// value.
pub fn read_tmdb_id(path: &Path) -> Result<Option<String>, NfoError> {
    let file = std::fs::File::open(path)?;
    let ids = parse_ids(std::io::BufReader::new(file))?;
    Ok(pick_tmdb_id(ids))
}

/// Like [`read_tmdb_id`], but missing files and parse failures yield `None`.
pub fn tmdb_id_from_nfo(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    match read_tmdb_id(path) {
        Ok(id) => {
            debug!(nfo = %path.display(), tmdb_id = ?id, "Read NFO");
            id
        }
        Err(e) => {
            warn!(nfo = %path.display(), error = %e, "Failed to read tmdbid from NFO");
            None
        }
    }
}

/// Parse a TMDB id from an in-memory NFO document.
pub fn parse_tmdb_id(xml: &str) -> Result<Option<String>, NfoError> {
    let ids = parse_ids(xml.as_bytes())?;
    Ok(pick_tmdb_id(ids))
}

fn pick_tmdb_id(mut ids: NfoIds) -> Option<String> {
    UNIQUEID_TYPES
        .iter()
        .find_map(|t| ids.unique_ids.remove(*t))
        .or(ids.tmdbid)
}

fn parse_ids<R: BufRead>(reader: R) -> Result<NfoIds, NfoError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut ids = NfoIds::default();
    let mut depth = 0usize;
    // Open depth-1 element whose text we are collecting, with its uniqueid type.
    let mut capture: Option<Capture> = None;
    let mut text = String::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                depth += 1;
                if depth == 2 {
                    capture = Capture::from_element(e)?;
                    text.clear();
                }
            }
            Event::Text(ref e) => {
                if capture.is_some() && depth == 2 {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(ref e) => {
                if capture.is_some() && depth == 2 {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some(captured) = capture.take() {
                        let value = text.trim();
                        if !value.is_empty() {
                            captured.store(&mut ids, value);
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(ids)
}

#[derive(Debug)]
enum Capture {
    UniqueId(String),
    TmdbId,
}

impl Capture {
    fn from_element(e: &BytesStart<'_>) -> Result<Option<Self>, NfoError> {
        match e.name().as_ref() {
            b"uniqueid" => {
                for attr in e.attributes() {
                    let attr = attr?;
                    if attr.key.as_ref() == b"type" {
                        let kind = String::from_utf8_lossy(&attr.value).to_string();
                        return Ok(Some(Self::UniqueId(kind)));
                    }
                }
                Ok(None)
            }
            b"tmdbid" => Ok(Some(Self::TmdbId)),
            _ => Ok(None),
        }
    }

    fn store(self, ids: &mut NfoIds, value: &str) {
        match self {
            Self::UniqueId(kind) => {
                ids.unique_ids.entry(kind).or_insert_with(|| value.to_string());
            }
            Self::TmdbId => {
                if ids.tmdbid.is_none() {
                    ids.tmdbid = Some(value.to_string());
                }
            }
        }
    }
}
