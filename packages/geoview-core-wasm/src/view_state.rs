use serde::{Deserialize, Serialize};

use crate::basemap::BasemapStyle;
use crate::data_loader::DatasetKind;

/// Which places are drawn. `None` suppresses the places overlay entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceFilter {
    #[default]
    None,
    All,
    City,
    Town,
    Village,
}

impl PlaceFilter {
    pub const OPTIONS: [PlaceFilter; 5] = [
        PlaceFilter::None,
        PlaceFilter::All,
        PlaceFilter::City,
        PlaceFilter::Town,
        PlaceFilter::Village,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PlaceFilter::None => "none",
            PlaceFilter::All => "all",
            PlaceFilter::City => "city",
            PlaceFilter::Town => "town",
            PlaceFilter::Village => "village",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::OPTIONS.into_iter().find(|f| f.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaceFilter::None => "None / لا شيء",
            PlaceFilter::All => "All Places / جميع الأماكن",
            PlaceFilter::City => "Cities Only / المدن فقط",
            PlaceFilter::Town => "Towns Only / البلدات فقط",
            PlaceFilter::Village => "Villages Only / القرى فقط",
        }
    }

    /// The `place` property value this filter keeps, if it filters by category.
    pub fn category(self) -> Option<&'static str> {
        match self {
            PlaceFilter::City | PlaceFilter::Town | PlaceFilter::Village => Some(self.key()),
            PlaceFilter::None | PlaceFilter::All => None,
        }
    }
}

/// Administrative granularity of the boundary overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    Admin0,
    #[default]
    Admin1,
    Admin2,
    PopulatedPlaces,
}

impl AdminLevel {
    pub const OPTIONS: [AdminLevel; 4] = [
        AdminLevel::Admin0,
        AdminLevel::Admin1,
        AdminLevel::Admin2,
        AdminLevel::PopulatedPlaces,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AdminLevel::Admin0 => "admin0",
            AdminLevel::Admin1 => "admin1",
            AdminLevel::Admin2 => "admin2",
            AdminLevel::PopulatedPlaces => "populated_places",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::OPTIONS.into_iter().find(|l| l.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            AdminLevel::Admin0 => "Country / البلد",
            AdminLevel::Admin1 => "States / الولايات",
            AdminLevel::Admin2 => "Localities / المحليات",
            AdminLevel::PopulatedPlaces => "City/Town Boundaries / حدود المدن والبلدات",
        }
    }

    pub fn dataset_kind(self) -> DatasetKind {
        match self {
            AdminLevel::Admin0 => DatasetKind::Admin0,
            AdminLevel::Admin1 => DatasetKind::Admin1,
            AdminLevel::Admin2 => DatasetKind::Admin2,
            AdminLevel::PopulatedPlaces => DatasetKind::PlaceBoundaries,
        }
    }
}

/// The user-selected view filters. Owned by the controller.
///
/// `admin_level` only matters while `show_boundaries` is set, but every
/// combination is valid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub place_filter: PlaceFilter,
    pub search_text: String,
    pub show_boundaries: bool,
    pub admin_level: AdminLevel,
    pub basemap: BasemapStyle,
}

impl FilterState {
    // Defaults with a configured starting basemap
    pub fn with_basemap(basemap: BasemapStyle) -> Self {
        FilterState {
            basemap,
            ..FilterState::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_initial_view() {
        let state = FilterState::default();
        assert_eq!(state.place_filter, PlaceFilter::None);
        assert_eq!(state.search_text, "");
        assert!(!state.show_boundaries);
        assert_eq!(state.admin_level, AdminLevel::Admin1);
        assert_eq!(state.basemap, BasemapStyle::OpenStreetMap);
    }

    #[test]
    fn keys_round_trip_through_from_key() {
        for filter in PlaceFilter::OPTIONS {
            assert_eq!(PlaceFilter::from_key(filter.key()), Some(filter));
        }
        for level in AdminLevel::OPTIONS {
            assert_eq!(AdminLevel::from_key(level.key()), Some(level));
        }
        assert_eq!(PlaceFilter::from_key("City"), None);
        assert_eq!(AdminLevel::from_key("admin3"), None);
    }

    #[test]
    fn only_type_filters_have_a_category() {
        assert_eq!(PlaceFilter::None.category(), None);
        assert_eq!(PlaceFilter::All.category(), None);
        assert_eq!(PlaceFilter::Town.category(), Some("town"));
    }

    #[test]
    fn serializes_with_ui_keys() {
        let json = serde_json::to_value(FilterState::default()).expect("serializable");
        assert_eq!(json["placeFilter"], "none");
        assert_eq!(json["adminLevel"], "admin1");
        assert_eq!(json["basemap"], "openstreetmap");
    }
}
