use serde::Serialize;

use crate::basemap::TileSource;
use crate::config::MapView;
use crate::format::format_number;
use crate::geojson_features::{Feature, FeatureCollection};
use crate::styles::{admin_style, style_for_place, StyleSpec};
use crate::view_state::AdminLevel;

/// The two overlay layer groups drawn above the basemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayGroup {
    Places,
    Boundaries,
}

/// Something the renderer can draw into: the Leaflet map in the browser, or
/// an in-memory scene for headless use.
pub trait MapSurface {
    fn set_view(&mut self, view: &MapView);

    /// Detach the current tile layer and attach `source` in its place.
    fn set_tile_source(&mut self, source: &TileSource);

    fn clear_group(&mut self, group: OverlayGroup);

    fn add_shape(&mut self, group: OverlayGroup, shape: &RenderedShape<'_>);

    /// Attach or detach a group from the map without touching its contents.
    fn set_group_visible(&mut self, group: OverlayGroup, visible: bool);
}

// One feature ready to draw
#[derive(Debug, Clone)]
pub struct RenderedShape<'a> {
    pub feature: &'a Feature,
    pub style: StyleSpec,
    pub popup: Popup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Popup {
    pub title: String,
    pub rows: Vec<PopupRow>,
}

impl Popup {
    fn new(title: &str) -> Self {
        Popup {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    fn row(&mut self, label: &'static str, value: impl Into<String>) {
        self.rows.push(PopupRow {
            label,
            value: value.into(),
        });
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<div style=\"text-align: center; font-weight: bold; margin-bottom: 8px;\">{}</div>",
            escape_html(&self.title)
        );
        for row in &self.rows {
            html.push_str(&format!(
                "<div style=\"margin-bottom: 4px;\"><strong>{}:</strong> {}</div>",
                row.label,
                escape_html(&row.value)
            ));
        }
        html
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const UNKNOWN: &str = "Unknown";

fn place_type_arabic(place: &str) -> Option<&'static str> {
    match place {
        "city" => Some("مدينة"),
        "town" => Some("بلدة"),
        "village" => Some("قرية"),
        _ => None,
    }
}

pub fn place_popup(feature: &Feature) -> Popup {
    let mut popup = Popup::new(feature.name().unwrap_or(UNKNOWN));

    let place = feature.place();
    popup.row(
        "Type / النوع",
        format!(
            "{} / {}",
            place.unwrap_or(UNKNOWN),
            place.and_then(place_type_arabic).unwrap_or("غير معروف")
        ),
    );

    // A zero population is treated as "not recorded"
    if let Some(population) = feature.population().filter(|p| *p != 0.0) {
        popup.row("Population / السكان", format_number(population));
    }
    popup
}

/// Most specific available name: generic name, then country, state and
/// locality names.
pub fn boundary_name(feature: &Feature) -> &str {
    ["name", "adm0_name", "adm1_name", "adm2_name"]
        .iter()
        .find_map(|key| feature.string_property(key))
        .unwrap_or(UNKNOWN)
}

pub fn boundary_popup(feature: &Feature, level: AdminLevel) -> Popup {
    let mut popup = Popup::new(boundary_name(feature));
    let state = feature.string_property("adm1_name");

    match level {
        AdminLevel::Admin1 => {
            if let Some(state) = state {
                popup.row("State / الولاية", state);
            }
            if let Some(area) = feature.area_sqkm().filter(|a| *a != 0.0) {
                popup.row(
                    "Area / المساحة",
                    format!("{} km² / كم²", format_number(area.round())),
                );
            }
        }
        AdminLevel::Admin2 => {
            if let Some(locality) = feature.string_property("adm2_name") {
                popup.row("Locality / المحلية", locality);
            }
            if let Some(state) = state {
                popup.row("State / الولاية", state);
            }
        }
        AdminLevel::Admin0 | AdminLevel::PopulatedPlaces => {}
    }
    popup
}

/// Replace the places overlay with `features`. The group is cleared first, so
/// calling this twice with the same input leaves the same shapes on the map.
/// Returns the number of features drawn.
pub fn render_places<S: MapSurface + ?Sized>(surface: &mut S, features: &[&Feature]) -> usize {
    surface.clear_group(OverlayGroup::Places);
    for &feature in features {
        let shape = RenderedShape {
            feature,
            style: style_for_place(feature.place().unwrap_or_default()),
            popup: place_popup(feature),
        };
        surface.add_shape(OverlayGroup::Places, &shape);
    }
    features.len()
}

/// Replace the boundary overlay with every feature of `collection`, styled
/// for `level`. Returns the number of features drawn.
pub fn render_boundaries<S: MapSurface + ?Sized>(
    surface: &mut S,
    collection: &FeatureCollection,
    level: AdminLevel,
) -> usize {
    surface.clear_group(OverlayGroup::Boundaries);
    let style = admin_style(level);
    for feature in collection.iter() {
        let shape = RenderedShape {
            feature,
            style,
            popup: boundary_popup(feature, level),
        };
        surface.add_shape(OverlayGroup::Boundaries, &shape);
    }
    collection.len()
}
