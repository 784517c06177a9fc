use serde::Serialize;

use crate::view_state::AdminLevel;

pub const RED: &str = "#e74c3c";
pub const ORANGE: &str = "#f39c12";
pub const GREEN: &str = "#27ae60";
pub const BLUE: &str = "#3498db";
pub const GRAY: &str = "#95a5a6";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DashPattern {
    Solid,
    Dashed,
    Dotted,
}

impl DashPattern {
    /// SVG dash array, `None` for a solid stroke.
    pub fn dash_array(self) -> Option<&'static str> {
        match self {
            DashPattern::Solid => None,
            DashPattern::Dashed => Some("5, 5"),
            DashPattern::Dotted => Some("3, 3"),
        }
    }
}

// Outline style for one feature category. There is no fill colour: every
// overlay is drawn as borders only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSpec {
    pub stroke_color: &'static str,
    pub stroke_weight: f64,
    pub opacity: f64,
    pub dash: DashPattern,
}

// Leaflet path options derived from a StyleSpec
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathOptions {
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub fill: bool,
    pub fill_opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<&'static str>,
    pub line_cap: &'static str,
    pub line_join: &'static str,
}

impl StyleSpec {
    const fn solid(stroke_color: &'static str, stroke_weight: f64, opacity: f64) -> Self {
        StyleSpec {
            stroke_color,
            stroke_weight,
            opacity,
            dash: DashPattern::Solid,
        }
    }

    pub fn fill(&self) -> bool {
        false
    }

    pub fn path_options(&self) -> PathOptions {
        PathOptions {
            color: self.stroke_color,
            weight: self.stroke_weight,
            opacity: self.opacity,
            fill: self.fill(),
            fill_opacity: 0.0,
            dash_array: self.dash.dash_array(),
            line_cap: "round",
            line_join: "round",
        }
    }
}

/// Style for a place outline keyed by its `place` property. Unknown or
/// missing categories get the gray fallback.
pub fn style_for_place(category: &str) -> StyleSpec {
    match category {
        "city" => StyleSpec::solid(RED, 3.0, 0.8),
        "town" => StyleSpec::solid(ORANGE, 2.5, 0.8),
        "village" => StyleSpec::solid(GREEN, 2.0, 0.8),
        _ => StyleSpec::solid(GRAY, 1.5, 0.8),
    }
}

/// Style for a boundary overlay keyed by admin level key.
pub fn style_for_admin_level(level: &str) -> StyleSpec {
    match AdminLevel::from_key(level) {
        Some(level) => admin_style(level),
        None => StyleSpec::solid(GRAY, 1.5, 0.7),
    }
}

pub fn admin_style(level: AdminLevel) -> StyleSpec {
    match level {
        AdminLevel::Admin0 => StyleSpec::solid(RED, 4.0, 0.9),
        AdminLevel::Admin1 => StyleSpec::solid(BLUE, 3.0, 0.8),
        AdminLevel::Admin2 => StyleSpec {
            dash: DashPattern::Dashed,
            ..StyleSpec::solid(ORANGE, 2.0, 0.7)
        },
        AdminLevel::PopulatedPlaces => StyleSpec {
            dash: DashPattern::Dotted,
            ..StyleSpec::solid(GREEN, 2.0, 0.7)
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub style: StyleSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendSection {
    pub title: &'static str,
    pub entries: Vec<LegendEntry>,
}

// Static legend, built from the same tables the renderer uses so the two
// cannot drift apart.
pub fn legend() -> Vec<LegendSection> {
    vec![
        LegendSection {
            title: "Places / الأماكن",
            entries: vec![
                LegendEntry { label: "Cities / المدن", style: style_for_place("city") },
                LegendEntry { label: "Towns / البلدات", style: style_for_place("town") },
                LegendEntry { label: "Villages / القرى", style: style_for_place("village") },
            ],
        },
        LegendSection {
            title: "Boundaries / الحدود",
            entries: vec![
                LegendEntry { label: "Country Border / حدود البلد", style: admin_style(AdminLevel::Admin0) },
                LegendEntry { label: "State Borders / حدود الولايات", style: admin_style(AdminLevel::Admin1) },
                LegendEntry { label: "Locality Borders / حدود المحليات", style: admin_style(AdminLevel::Admin2) },
                LegendEntry {
                    label: "City/Town Boundaries / حدود المدن والبلدات",
                    style: admin_style(AdminLevel::PopulatedPlaces),
                },
            ],
        },
    ]
}
