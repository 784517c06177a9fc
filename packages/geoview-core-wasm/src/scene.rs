use serde::Serialize;

use crate::basemap::TileSource;
use crate::config::MapView;
use crate::geojson_features::FeatureGeometry;
use crate::layer_renderer::{MapSurface, OverlayGroup, Popup, RenderedShape};
use crate::styles::StyleSpec;

// A drawn feature as recorded by the scene
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneShape {
    pub geometry: Option<FeatureGeometry>,
    pub style: StyleSpec,
    pub popup: Popup,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneGroup {
    pub visible: bool,
    pub shapes: Vec<SceneShape>,
}

/// In-memory map surface. Records the attached tile source, the viewport and
/// the contents of both overlay groups, which makes it usable headless and
/// lets the view logic be checked without a browser.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneModel {
    tile_source: Option<TileSource>,
    view: Option<MapView>,
    places: SceneGroup,
    boundaries: SceneGroup,
    view_changes: usize,
    tile_swaps: usize,
}

impl SceneModel {
    pub fn tile_source(&self) -> Option<&TileSource> {
        self.tile_source.as_ref()
    }

    pub fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    pub fn view_changes(&self) -> usize {
        self.view_changes
    }

    pub fn tile_swaps(&self) -> usize {
        self.tile_swaps
    }

    pub fn group(&self, group: OverlayGroup) -> &SceneGroup {
        match group {
            OverlayGroup::Places => &self.places,
            OverlayGroup::Boundaries => &self.boundaries,
        }
    }

    fn group_mut(&mut self, group: OverlayGroup) -> &mut SceneGroup {
        match group {
            OverlayGroup::Places => &mut self.places,
            OverlayGroup::Boundaries => &mut self.boundaries,
        }
    }

    // Popup titles of a group in draw order
    pub fn titles(&self, group: OverlayGroup) -> Vec<&str> {
        self.group(group)
            .shapes
            .iter()
            .map(|shape| shape.popup.title.as_str())
            .collect()
    }

    /// Shapes currently on screen: hidden groups contribute nothing.
    pub fn visible_shapes(&self, group: OverlayGroup) -> &[SceneShape] {
        let group = self.group(group);
        if group.visible {
            group.shapes.as_slice()
        } else {
            &[]
        }
    }
}

impl MapSurface for SceneModel {
    fn set_view(&mut self, view: &MapView) {
        self.view = Some(*view);
        self.view_changes += 1;
    }

    fn set_tile_source(&mut self, source: &TileSource) {
        self.tile_source = Some(source.clone());
        self.tile_swaps += 1;
    }

    fn clear_group(&mut self, group: OverlayGroup) {
        self.group_mut(group).shapes.clear();
    }

    fn add_shape(&mut self, group: OverlayGroup, shape: &RenderedShape<'_>) {
        self.group_mut(group).shapes.push(SceneShape {
            geometry: shape.feature.geometry.clone(),
            style: shape.style,
            popup: shape.popup.clone(),
        });
    }

    fn set_group_visible(&mut self, group: OverlayGroup, visible: bool) {
        self.group_mut(group).visible = visible;
    }
}
