//! Station catalog resolution — local file first, then the configured URL.

use std::path::Path;

use anyhow::{bail, Context};
use tracing::{info, warn};

use wradio_core::config::Config;
use wradio_core::{parse_catalog_json, parse_catalog_toml, CatalogError, Station};

/// Resolve the station catalog from, in order: the configured local file,
/// `./stations.toml`, `./stations.json`, then the configured URL.  An empty
/// catalog is returned as an empty Vec, not an error; the caller decides how
/// inert to be.
pub async fn resolve(config: &Config) -> anyhow::Result<Vec<Station>> {
    let configured = &config.catalog.stations_path;
    if configured.exists() {
        return load_file(configured);
    }

    for fallback in ["stations.toml", "stations.json"] {
        let path = Path::new(fallback);
        if path.exists() {
            return load_file(path);
        }
    }

    if !config.catalog.stations_url.is_empty() {
        return fetch_url(&config.catalog.stations_url).await;
    }

    warn!(
        "no stations file at {} and no stations_url configured",
        configured.display()
    );
    Ok(Vec::new())
}

fn load_file(path: &Path) -> anyhow::Result<Vec<Station>> {
    info!("loading stations from {}", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_catalog_toml(&content),
        Some("json") => parse_catalog_json(&content),
        other => bail!(
            "unsupported stations file extension {:?} ({})",
            other,
            path.display()
        ),
    };
    let stations = degrade_empty(parsed)?;
    info!("loaded {} stations", stations.len());
    Ok(stations)
}

/// A document with zero stations keeps the receiver inert instead of
/// aborting startup.
fn degrade_empty(parsed: Result<Vec<Station>, CatalogError>) -> anyhow::Result<Vec<Station>> {
    match parsed {
        Err(CatalogError::NoStations) => {
            warn!("stations document contains no stations");
            Ok(Vec::new())
        }
        other => Ok(other?),
    }
}

async fn fetch_url(url: &str) -> anyhow::Result<Vec<Station>> {
    info!("fetching stations from {url}");
    let body = reqwest::get(url)
        .await
        .with_context(|| format!("failed to fetch {url}"))?
        .error_for_status()?
        .text()
        .await?;
    let stations = degrade_empty(parse_catalog_json(&body))?;
    info!("fetched {} stations", stations.len());
    Ok(stations)
}
