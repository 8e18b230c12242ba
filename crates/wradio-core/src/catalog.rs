//! Station catalog — model, validity rules, and document parsing.
//!
//! The catalog is supplied to the core fully parsed; nothing here performs
//! I/O.  Both the JSON document (`{"stations": [...]}`) and the TOML
//! `[[station]]` form normalize into the same `Station` list, synthesizing
//! ids and names for entries that omit them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog must include at least one station")]
    NoStations,
    #[error("failed to parse stations JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse stations TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A playable item.  Only tracks with an absolute http/https URL are ever
/// selected or offered to the analysis graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
}

impl Track {
    pub fn is_valid(&self) -> bool {
        is_http_url(&self.url)
    }

    /// Title for the now-playing label, with a fallback for untitled tracks.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled Track")
    }
}

/// True for a non-empty absolute `http://` or `https://` URL.  Relative,
/// opaque, and non-network schemes fail both track validity and graph
/// eligibility, so the two checks can never disagree.
pub fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(r) if !r.is_empty())
}

/// Named, ordered collection of tracks.  Identity is by `id`; uniqueness is
/// assumed by selection-history keying but not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Station {
    pub fn valid_tracks(&self) -> Vec<&Track> {
        self.tracks.iter().filter(|t| t.is_valid()).collect()
    }

    pub fn valid_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_valid()).count()
    }
}

// ── Document parsing ──────────────────────────────────────────────────────────

/// Raw station entry as it appears in source documents: id and name are
/// optional and get synthesized from the position in the list.
#[derive(Debug, Deserialize)]
struct RawStation {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct JsonCatalog {
    #[serde(default)]
    stations: Vec<RawStation>,
}

/// TOML form: a list of `[[station]]` tables, tracks as inline tables.
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    station: Vec<RawStation>,
}

fn normalize(raw: Vec<RawStation>) -> Result<Vec<Station>, CatalogError> {
    if raw.is_empty() {
        return Err(CatalogError::NoStations);
    }
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(index, s)| Station {
            id: s.id.unwrap_or_else(|| format!("station-{index}")),
            name: s.name.unwrap_or_else(|| format!("Station {}", index + 1)),
            tracks: s.tracks,
        })
        .collect())
}

pub fn parse_catalog_json(content: &str) -> Result<Vec<Station>, CatalogError> {
    let doc: JsonCatalog = serde_json::from_str(content)?;
    normalize(doc.stations)
}

pub fn parse_catalog_toml(content: &str) -> Result<Vec<Station>, CatalogError> {
    let doc: TomlCatalog = toml::from_str(content)?;
    normalize(doc.station)
}
