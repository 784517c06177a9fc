use serde::{Deserialize, Serialize};

use crate::console_log;
use crate::layer_renderer::MapSurface;

/// Background tile style selectable from the map style control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasemapStyle {
    #[default]
    OpenStreetMap,
    Satellite,
    Terrain,
    Dark,
    Light,
}

// Raster tile endpoint for one basemap style
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSource {
    pub url_template: &'static str,
    pub attribution: &'static str,
    pub max_zoom: u8,
}

impl BasemapStyle {
    pub const OPTIONS: [BasemapStyle; 5] = [
        BasemapStyle::OpenStreetMap,
        BasemapStyle::Satellite,
        BasemapStyle::Terrain,
        BasemapStyle::Dark,
        BasemapStyle::Light,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BasemapStyle::OpenStreetMap => "openstreetmap",
            BasemapStyle::Satellite => "satellite",
            BasemapStyle::Terrain => "terrain",
            BasemapStyle::Dark => "dark",
            BasemapStyle::Light => "light",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::OPTIONS.into_iter().find(|s| s.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            BasemapStyle::OpenStreetMap => "OpenStreetMap",
            BasemapStyle::Satellite => "Satellite / الأقمار الصناعية",
            BasemapStyle::Terrain => "Terrain / التضاريس",
            BasemapStyle::Dark => "Dark Mode / الوضع المظلم",
            BasemapStyle::Light => "Light Mode / الوضع المضيء",
        }
    }

    pub fn tile_source(self) -> TileSource {
        match self {
            BasemapStyle::OpenStreetMap => TileSource {
                url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
                attribution: "© OpenStreetMap contributors",
                max_zoom: 19,
            },
            BasemapStyle::Satellite => TileSource {
                url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                attribution: "© Esri, Maxar, Earthstar Geographics",
                max_zoom: 19,
            },
            BasemapStyle::Terrain => TileSource {
                url_template: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
                attribution: "© OpenTopoMap contributors",
                max_zoom: 17,
            },
            BasemapStyle::Dark => TileSource {
                url_template: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
                attribution: "© CartoDB, © OpenStreetMap contributors",
                max_zoom: 20,
            },
            BasemapStyle::Light => TileSource {
                url_template: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
                attribution: "© CartoDB, © OpenStreetMap contributors",
                max_zoom: 20,
            },
        }
    }
}

/// Keeps track of the attached tile source and swaps it on request. Only the
/// tile layer is touched; the viewport and overlays stay as they are.
#[derive(Debug, Default)]
pub struct BasemapSwitcher {
    current: Option<BasemapStyle>,
}

impl BasemapSwitcher {
    pub fn current(&self) -> Option<BasemapStyle> {
        self.current
    }

    // Unknown keys fall back to the default style
    pub fn set_basemap<S: MapSurface + ?Sized>(&mut self, surface: &mut S, key: &str) -> BasemapStyle {
        let style = BasemapStyle::from_key(key).unwrap_or_default();
        self.apply(surface, style)
    }

    pub fn apply<S: MapSurface + ?Sized>(&mut self, surface: &mut S, style: BasemapStyle) -> BasemapStyle {
        surface.set_tile_source(&style.tile_source());
        self.current = Some(style);
        console_log!("Basemap set to {}", style.key());
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapView;
    use crate::layer_renderer::OverlayGroup;
    use crate::scene::SceneModel;

    #[test]
    fn every_style_has_an_attribution() {
        for style in BasemapStyle::OPTIONS {
            let source = style.tile_source();
            assert!(source.url_template.contains("{z}"));
            assert!(!source.attribution.is_empty());
        }
    }

    #[test]
    fn unknown_key_falls_back_to_default() {
        let mut scene = SceneModel::default();
        let mut switcher = BasemapSwitcher::default();

        let applied = switcher.set_basemap(&mut scene, "watercolor");
        assert_eq!(applied, BasemapStyle::OpenStreetMap);
        assert_eq!(scene.tile_source(), Some(&BasemapStyle::OpenStreetMap.tile_source()));
    }

    #[test]
    fn swapping_keeps_viewport_and_overlays() {
        let mut scene = SceneModel::default();
        let view = MapView::default();
        scene.set_view(&view);
        scene.set_group_visible(OverlayGroup::Boundaries, true);

        let mut switcher = BasemapSwitcher::default();
        switcher.set_basemap(&mut scene, "dark");
        switcher.set_basemap(&mut scene, "satellite");

        assert_eq!(switcher.current(), Some(BasemapStyle::Satellite));
        assert_eq!(scene.tile_source(), Some(&BasemapStyle::Satellite.tile_source()));
        assert_eq!(scene.view(), Some(&view));
        assert_eq!(scene.view_changes(), 1);
        assert!(scene.group(OverlayGroup::Boundaries).visible);
        assert_eq!(scene.tile_swaps(), 2);
    }
}
