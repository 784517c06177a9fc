use js_sys::Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::basemap::TileSource;
use crate::config::MapView;
use crate::console_warn;
use crate::layer_renderer::{MapSurface, OverlayGroup, RenderedShape};
use crate::styles::PathOptions;
use crate::to_js;

// Bindings to the global Leaflet namespace `L`
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = js_sys::Object)]
    pub type LeafletMap;

    #[wasm_bindgen(extends = js_sys::Object)]
    pub type Layer;

    #[wasm_bindgen(extends = Layer)]
    pub type LayerGroup;

    #[wasm_bindgen(js_namespace = L, js_name = map, catch)]
    fn create_map(container_id: &str) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &LeafletMap, center: &Array, zoom: f64) -> LeafletMap;

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_layer(this: &LeafletMap, layer: &Layer) -> LeafletMap;

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &LeafletMap, layer: &Layer) -> LeafletMap;

    #[wasm_bindgen(method, js_name = hasLayer)]
    fn has_layer(this: &LeafletMap, layer: &Layer) -> bool;

    #[wasm_bindgen(js_namespace = L, js_name = layerGroup)]
    fn layer_group() -> LayerGroup;

    #[wasm_bindgen(method, js_name = clearLayers)]
    fn clear_layers(this: &LayerGroup) -> LayerGroup;

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_to_group(this: &LayerGroup, layer: &Layer) -> LayerGroup;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url_template: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = geoJSON, catch)]
    fn geo_json(data: &JsValue, options: &JsValue) -> Result<Layer, JsValue>;

    #[wasm_bindgen(js_namespace = L, js_name = circleMarker)]
    fn circle_marker(lat_lng: &Array, options: &JsValue) -> Layer;

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, html: &str) -> Layer;
}

const POINT_RADIUS: f64 = 6.0;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TileLayerOptions<'a> {
    attribution: &'a str,
    max_zoom: u8,
}

#[derive(Serialize)]
struct GeoJsonOptions {
    style: PathOptions,
}

#[derive(Serialize)]
struct CircleMarkerOptions {
    radius: f64,
    #[serde(flatten)]
    path: PathOptions,
}

fn lat_lng(lat: f64, lng: f64) -> Array {
    Array::of2(&JsValue::from_f64(lat), &JsValue::from_f64(lng))
}

/// Map surface backed by a Leaflet map. Owns the two overlay groups and the
/// currently attached tile layer.
pub struct LeafletSurface {
    map: LeafletMap,
    tiles: Option<Layer>,
    places: LayerGroup,
    boundaries: LayerGroup,
}

impl LeafletSurface {
    pub fn new(container_id: &str) -> Result<Self, JsValue> {
        let map = create_map(container_id)?;
        Ok(LeafletSurface {
            map,
            tiles: None,
            places: layer_group(),
            boundaries: layer_group(),
        })
    }

    fn group(&self, group: OverlayGroup) -> &LayerGroup {
        match group {
            OverlayGroup::Places => &self.places,
            OverlayGroup::Boundaries => &self.boundaries,
        }
    }

    fn build_layer(shape: &RenderedShape<'_>) -> Result<Layer, JsValue> {
        let path = shape.style.path_options();

        // Single points become circle markers, everything else goes through L.geoJSON
        let point = shape
            .feature
            .geometry
            .as_ref()
            .filter(|geometry| geometry.r#type == "Point")
            .and_then(|geometry| geometry.coordinates.as_array())
            .and_then(|coords| Some((coords.first()?.as_f64()?, coords.get(1)?.as_f64()?)));

        let layer = match point {
            Some((lng, lat)) => circle_marker(
                &lat_lng(lat, lng),
                &to_js(&CircleMarkerOptions {
                    radius: POINT_RADIUS,
                    path,
                })?,
            ),
            None => geo_json(&to_js(shape.feature)?, &to_js(&GeoJsonOptions { style: path })?)?,
        };
        Ok(layer.bind_popup(&shape.popup.to_html()))
    }
}

impl MapSurface for LeafletSurface {
    fn set_view(&mut self, view: &MapView) {
        self.map.set_view(&lat_lng(view.center[0], view.center[1]), view.zoom);
    }

    fn set_tile_source(&mut self, source: &TileSource) {
        let options = match to_js(&TileLayerOptions {
            attribution: source.attribution,
            max_zoom: source.max_zoom,
        }) {
            Ok(options) => options,
            Err(err) => {
                console_warn!("Could not build tile layer options: {:?}", err);
                return;
            }
        };

        if let Some(previous) = self.tiles.take() {
            self.map.remove_layer(&previous);
        }
        let layer = tile_layer(source.url_template, &options);
        self.map.add_layer(&layer);
        self.tiles = Some(layer);
    }

    fn clear_group(&mut self, group: OverlayGroup) {
        self.group(group).clear_layers();
    }

    fn add_shape(&mut self, group: OverlayGroup, shape: &RenderedShape<'_>) {
        match Self::build_layer(shape) {
            Ok(layer) => {
                self.group(group).add_to_group(&layer);
            }
            Err(err) => console_warn!("Skipping feature {}: {:?}", shape.popup.title, err),
        }
    }

    fn set_group_visible(&mut self, group: OverlayGroup, visible: bool) {
        let layer: &Layer = self.group(group);
        let attached = self.map.has_layer(layer);
        if visible && !attached {
            self.map.add_layer(layer);
        } else if !visible && attached {
            self.map.remove_layer(layer);
        }
    }
}
