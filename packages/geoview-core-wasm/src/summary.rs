use std::collections::BTreeMap;

use geo::BoundingRect;
use serde::Serialize;

use crate::data_loader::{DatasetKind, DatasetStore};
use crate::geojson_features::FeatureCollection;

/// Geographic extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Extent {
    fn merge(self, other: Extent) -> Extent {
        Extent {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }
}

// Overview of the loaded datasets: place counts by type, the extent of the
// populated places and the size of every collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub place_count: usize,
    pub places_by_type: BTreeMap<String, usize>,
    pub extent: Option<Extent>,
    pub collections: BTreeMap<&'static str, usize>,
}

pub fn collection_extent(collection: &FeatureCollection) -> Option<Extent> {
    collection
        .iter()
        .filter_map(|feature| feature.to_geo())
        .filter_map(|geometry| geometry.bounding_rect())
        .map(|rect| Extent {
            west: rect.min().x,
            south: rect.min().y,
            east: rect.max().x,
            north: rect.max().y,
        })
        .reduce(Extent::merge)
}

pub fn places_by_type(collection: &FeatureCollection) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for feature in collection.iter() {
        let place = feature.place().unwrap_or("unknown");
        *counts.entry(place.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn summarize(store: &DatasetStore) -> DatasetSummary {
    let places = &store.place_points;
    DatasetSummary {
        place_count: places.len(),
        places_by_type: places_by_type(places),
        extent: collection_extent(places),
        collections: DatasetKind::ALL
            .into_iter()
            .map(|kind| (kind.key(), store.collection(kind).len()))
            .collect(),
    }
}
