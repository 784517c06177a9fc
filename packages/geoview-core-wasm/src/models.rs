// Shared data structures handed across to JS
use serde::Serialize;

use crate::format::format_count;
use crate::view_state::FilterState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisplayStats {
    pub total: usize,
    pub visible: usize,
    pub boundaries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loading,
    Ready,
    Error,
}

pub const LOADING_TEXT: &str = "Loading... / جاري التحميل...";
pub const ERROR_TEXT: &str = "Error / خطأ";

// Text shown in the stats panel for each counter. The visible count is known
// before load (nothing drawn yet), so only an error replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsPanel {
    pub total: String,
    pub visible: String,
    pub boundaries: String,
}

impl StatsPanel {
    pub fn new(stats: &DisplayStats, status: &LoadStatus) -> Self {
        let show = |count: usize| match status {
            LoadStatus::Loading => LOADING_TEXT.to_string(),
            LoadStatus::Error => ERROR_TEXT.to_string(),
            LoadStatus::Ready => format_count(count),
        };
        let visible = match status {
            LoadStatus::Error => ERROR_TEXT.to_string(),
            LoadStatus::Loading | LoadStatus::Ready => format_count(stats.visible),
        };
        StatsPanel {
            total: show(stats.total),
            visible,
            boundaries: show(stats.boundaries),
        }
    }
}

/// Everything an observer needs to redraw the controls and stats panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub state: FilterState,
    pub stats: DisplayStats,
    pub status: LoadStatus,
    pub error: Option<String>,
    pub panel: StatsPanel,
    // The admin level selector is only usable while boundaries are shown
    pub admin_level_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlOption {
    pub key: &'static str,
    pub label: &'static str,
}
