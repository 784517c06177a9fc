use std::future::Future;
use std::io::Read;

use flate2::read::GzDecoder;
use js_sys::Uint8Array;
use serde::Serialize;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::config::{DatasetUrls, PlaceGeometry};
use crate::console_log;
use crate::geojson_features::FeatureCollection;
use crate::view_state::AdminLevel;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// The five datasets loaded at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    PlacePoints,
    PlaceBoundaries,
    Admin0,
    Admin1,
    Admin2,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 5] = [
        DatasetKind::PlacePoints,
        DatasetKind::PlaceBoundaries,
        DatasetKind::Admin0,
        DatasetKind::Admin1,
        DatasetKind::Admin2,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DatasetKind::PlacePoints => "place_points",
            DatasetKind::PlaceBoundaries => "place_boundaries",
            DatasetKind::Admin0 => "admin0",
            DatasetKind::Admin1 => "admin1",
            DatasetKind::Admin2 => "admin2",
        }
    }
}

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to fetch {uri}: {reason}")]
    Fetch { uri: String, reason: String },
    #[error("failed to decompress {uri}")]
    Decompress {
        uri: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {uri}: {source}")]
    Parse {
        uri: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{uri} is a GeoJSON {found}, expected a FeatureCollection")]
    NotACollection { uri: String, found: String },
}

/// Where dataset bytes come from. The browser implementation goes through
/// `fetch`; anything else (tests, a native host) can supply its own.
pub trait DatasetSource {
    fn fetch(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>, String>>;
}

// Fetches datasets with the browser's fetch API
#[derive(Debug, Default, Clone, Copy)]
pub struct WebFetchSource;

impl DatasetSource for WebFetchSource {
    fn fetch(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>, String>> {
        let uri = uri.to_string();
        async move { fetch_bytes(&uri).await.map_err(describe_js_error) }
    }
}

async fn fetch_bytes(uri: &str) -> Result<Vec<u8>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(uri)).await?.dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "HTTP {} {}",
            response.status(),
            response.status_text()
        )));
    }
    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

fn describe_js_error(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// Read-only store of every loaded collection. Built once by
/// [`load_datasets`] and shared for the rest of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStore {
    pub place_points: FeatureCollection,
    pub place_boundaries: FeatureCollection,
    pub admin0: FeatureCollection,
    pub admin1: FeatureCollection,
    pub admin2: FeatureCollection,
}

impl DatasetStore {
    pub fn collection(&self, kind: DatasetKind) -> &FeatureCollection {
        match kind {
            DatasetKind::PlacePoints => &self.place_points,
            DatasetKind::PlaceBoundaries => &self.place_boundaries,
            DatasetKind::Admin0 => &self.admin0,
            DatasetKind::Admin1 => &self.admin1,
            DatasetKind::Admin2 => &self.admin2,
        }
    }

    pub fn boundary_collection(&self, level: AdminLevel) -> &FeatureCollection {
        self.collection(level.dataset_kind())
    }

    // Unknown level keys resolve to the state (admin1) boundaries
    pub fn boundary_collection_for_key(&self, key: &str) -> &FeatureCollection {
        self.boundary_collection(AdminLevel::from_key(key).unwrap_or(AdminLevel::Admin1))
    }

    pub fn place_collection(&self, geometry: PlaceGeometry) -> &FeatureCollection {
        match geometry {
            PlaceGeometry::Outlines => &self.place_boundaries,
            PlaceGeometry::Points => &self.place_points,
        }
    }
}

/// Fetch and parse all five datasets concurrently. Either every dataset
/// loads and parses, or the first failure is returned and nothing is kept.
pub async fn load_datasets<S: DatasetSource + ?Sized>(
    source: &S,
    urls: &DatasetUrls,
) -> Result<DatasetStore, DataLoadError> {
    console_log!("Loading {} datasets", DatasetKind::ALL.len());

    let (place_points, place_boundaries, admin0, admin1, admin2) = futures::try_join!(
        fetch_collection(source, urls.url(DatasetKind::PlacePoints)),
        fetch_collection(source, urls.url(DatasetKind::PlaceBoundaries)),
        fetch_collection(source, urls.url(DatasetKind::Admin0)),
        fetch_collection(source, urls.url(DatasetKind::Admin1)),
        fetch_collection(source, urls.url(DatasetKind::Admin2)),
    )?;

    let store = DatasetStore {
        place_points,
        place_boundaries,
        admin0,
        admin1,
        admin2,
    };
    for kind in DatasetKind::ALL {
        console_log!("Loaded {}: {} features", kind.key(), store.collection(kind).len());
    }
    Ok(store)
}

async fn fetch_collection<S: DatasetSource + ?Sized>(
    source: &S,
    uri: &str,
) -> Result<FeatureCollection, DataLoadError> {
    let payload = source.fetch(uri).await.map_err(|reason| DataLoadError::Fetch {
        uri: uri.to_string(),
        reason,
    })?;
    parse_collection(uri, &payload)
}

/// Parse one dataset payload, gunzipping it first if it carries the gzip
/// magic bytes.
pub fn parse_collection(uri: &str, payload: &[u8]) -> Result<FeatureCollection, DataLoadError> {
    let inflated;
    let json = if payload.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(payload);
        let mut buf = Vec::new();
        decoder
            .read_to_end(&mut buf)
            .map_err(|source| DataLoadError::Decompress {
                uri: uri.to_string(),
                source,
            })?;
        inflated = buf;
        inflated.as_slice()
    } else {
        payload
    };

    let collection: FeatureCollection =
        serde_json::from_slice(json).map_err(|source| DataLoadError::Parse {
            uri: uri.to_string(),
            source,
        })?;
    if collection.r#type != "FeatureCollection" {
        return Err(DataLoadError::NotACollection {
            uri: uri.to_string(),
            found: collection.r#type,
        });
    }
    Ok(collection)
}
