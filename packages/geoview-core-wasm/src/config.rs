use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;

use crate::basemap::BasemapStyle;
use crate::data_loader::DatasetKind;

// Locations of the five datasets the viewer needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasetUrls {
    pub place_points: String,
    pub place_boundaries: String,
    pub admin0: String,
    pub admin1: String,
    pub admin2: String,
}

impl Default for DatasetUrls {
    fn default() -> Self {
        DatasetUrls {
            place_points: "/data/geojson/populated_places_points.geojson".to_string(),
            place_boundaries: "/data/geojson/populated_places_polygons.geojson".to_string(),
            admin0: "/data/geojson/sdn_admin0.geojson".to_string(),
            admin1: "/data/geojson/sdn_admin1.geojson".to_string(),
            admin2: "/data/geojson/sdn_admin2.geojson".to_string(),
        }
    }
}

impl DatasetUrls {
    pub fn url(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::PlacePoints => &self.place_points,
            DatasetKind::PlaceBoundaries => &self.place_boundaries,
            DatasetKind::Admin0 => &self.admin0,
            DatasetKind::Admin1 => &self.admin1,
            DatasetKind::Admin2 => &self.admin2,
        }
    }
}

/// Map center as `[lat, lng]` plus zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        MapView {
            center: [15.5007, 32.5599],
            zoom: 6.0,
        }
    }
}

/// Which collection the places overlay draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceGeometry {
    // Place boundary polygons drawn as outlines
    #[default]
    Outlines,
    Points,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerConfig {
    pub datasets: DatasetUrls,
    pub initial_view: MapView,
    pub default_basemap: BasemapStyle,
    pub place_geometry: PlaceGeometry,
}

impl ViewerConfig {
    // Decode the options object handed over from JS. Missing fields keep
    // their defaults; `undefined` or `null` means "all defaults".
    pub fn from_js(value: JsValue) -> Result<Self, JsValue> {
        if value.is_undefined() || value.is_null() {
            return Ok(ViewerConfig::default());
        }
        from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid viewer config: {}", e)))
    }
}
