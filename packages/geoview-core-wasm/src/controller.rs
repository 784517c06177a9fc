use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{LocalBoxFuture, Shared};

use crate::basemap::{BasemapStyle, BasemapSwitcher};
use crate::config::ViewerConfig;
use crate::data_loader::{load_datasets, DataLoadError, DatasetSource, DatasetStore};
use crate::feature_filter::filter_features;
use crate::layer_renderer::{self, MapSurface, OverlayGroup};
use crate::models::{DisplayStats, LoadStatus, StatsPanel, ViewSnapshot};
use crate::view_state::{AdminLevel, FilterState, PlaceFilter};
use crate::{console_log, console_warn};

/// A user action coming from the controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    SetPlaceFilter(PlaceFilter),
    SetSearchText(String),
    SetShowBoundaries(bool),
    SetAdminLevel(AdminLevel),
    SetBasemap(BasemapStyle),
    Reset,
}

/// A load started once and awaited by every caller that asks for it.
pub type PendingLoad = Shared<LocalBoxFuture<'static, Result<(), String>>>;

enum Session {
    Loading,
    // Fetch in flight; later load requests must not start another
    Fetching,
    Ready(Rc<DatasetStore>),
    Failed(String),
}

/// Owns the filter state and keeps the map surface in sync with it.
///
/// Every event is turned into a next state, then the differences between the
/// previous and next state decide what gets redrawn. Until the datasets have
/// loaded, state changes are recorded but nothing is drawn; a completed load
/// brings the map up to date with whatever was recorded.
pub struct ViewController<S: MapSurface> {
    surface: S,
    config: ViewerConfig,
    state: FilterState,
    stats: DisplayStats,
    session: Session,
    basemap: BasemapSwitcher,
    // Level the boundary group currently holds shapes for
    boundaries_rendered: Option<AdminLevel>,
}

impl<S: MapSurface> ViewController<S> {
    pub fn new(mut surface: S, config: ViewerConfig) -> Self {
        let state = FilterState::with_basemap(config.default_basemap);

        surface.set_view(&config.initial_view);
        let mut basemap = BasemapSwitcher::default();
        basemap.apply(&mut surface, state.basemap);
        surface.set_group_visible(OverlayGroup::Places, true);
        surface.set_group_visible(OverlayGroup::Boundaries, state.show_boundaries);

        ViewController {
            surface,
            config,
            state,
            stats: DisplayStats::default(),
            session: Session::Loading,
            basemap,
            boundaries_rendered: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn stats(&self) -> DisplayStats {
        self.stats
    }

    pub fn datasets(&self) -> Option<&DatasetStore> {
        match &self.session {
            Session::Ready(store) => Some(store),
            _ => None,
        }
    }

    pub fn status(&self) -> LoadStatus {
        match self.session {
            Session::Loading | Session::Fetching => LoadStatus::Loading,
            Session::Ready(_) => LoadStatus::Ready,
            Session::Failed(_) => LoadStatus::Error,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.session {
            Session::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Claim the one load attempt of this session. Returns `false` if a
    /// load is already in flight or finished.
    pub fn begin_load(&mut self) -> bool {
        if matches!(self.session, Session::Loading) {
            self.session = Session::Fetching;
            true
        } else {
            false
        }
    }

    pub fn load_outcome(&self) -> Result<(), String> {
        match &self.session {
            Session::Failed(message) => Err(message.clone()),
            _ => Ok(()),
        }
    }

    /// Install the result of the initial load. Only the first result is
    /// accepted; datasets are never replaced within a session.
    pub fn finish_load(&mut self, result: Result<DatasetStore, DataLoadError>) {
        if !matches!(self.session, Session::Loading | Session::Fetching) {
            console_warn!("Ignoring dataset load result: session already initialized");
            return;
        }

        match result {
            Ok(store) => {
                self.stats.total = store.place_points.len();
                self.stats.boundaries = store.boundary_collection(self.state.admin_level).len();
                self.session = Session::Ready(Rc::new(store));
                console_log!(
                    "Datasets ready: {} places, {} boundaries",
                    self.stats.total,
                    self.stats.boundaries
                );

                self.refresh_places();
                self.sync_boundary_visibility();
            }
            Err(err) => {
                console_warn!("Error loading data: {}", err);
                self.session = Session::Failed(err.to_string());
            }
        }
    }

    pub fn apply(&mut self, event: ViewEvent) {
        let mut next = self.state.clone();
        match event {
            ViewEvent::SetPlaceFilter(filter) => next.place_filter = filter,
            ViewEvent::SetSearchText(text) => next.search_text = text,
            ViewEvent::SetShowBoundaries(show) => next.show_boundaries = show,
            ViewEvent::SetAdminLevel(level) => next.admin_level = level,
            ViewEvent::SetBasemap(style) => next.basemap = style,
            ViewEvent::Reset => next = FilterState::with_basemap(self.config.default_basemap),
        }
        self.transition(next);
    }

    /// Switch the basemap by key through the switcher. Unknown keys fall
    /// back to the default style.
    pub fn select_basemap(&mut self, key: &str) {
        let style = self.basemap.set_basemap(&mut self.surface, key);
        self.state.basemap = style;
    }

    fn transition(&mut self, next: FilterState) {
        let previous = std::mem::replace(&mut self.state, next);
        let state = &self.state;

        let basemap_changed = self.basemap.current() != Some(state.basemap);
        let places_changed =
            previous.place_filter != state.place_filter || previous.search_text != state.search_text;
        let level_changed = previous.admin_level != state.admin_level;
        let visibility_changed = previous.show_boundaries != state.show_boundaries;

        if basemap_changed {
            self.basemap.apply(&mut self.surface, self.state.basemap);
        }
        if places_changed {
            self.refresh_places();
        }
        if level_changed {
            self.refresh_boundary_count();
            if self.state.show_boundaries {
                self.render_boundaries();
            }
        }
        if visibility_changed {
            self.sync_boundary_visibility();
        }
    }

    fn store(&self) -> Option<Rc<DatasetStore>> {
        match &self.session {
            Session::Ready(store) => Some(Rc::clone(store)),
            _ => None,
        }
    }

    fn refresh_places(&mut self) {
        let Some(store) = self.store() else {
            return;
        };
        let collection = store.place_collection(self.config.place_geometry);
        let visible = filter_features(collection.iter(), self.state.place_filter, &self.state.search_text);
        self.stats.visible = layer_renderer::render_places(&mut self.surface, &visible);
    }

    fn refresh_boundary_count(&mut self) {
        if let Some(store) = self.store() {
            self.stats.boundaries = store.boundary_collection(self.state.admin_level).len();
        }
    }

    fn render_boundaries(&mut self) {
        let Some(store) = self.store() else {
            return;
        };
        let level = self.state.admin_level;
        self.stats.boundaries =
            layer_renderer::render_boundaries(&mut self.surface, store.boundary_collection(level), level);
        self.boundaries_rendered = Some(level);
    }

    // Show or hide the boundary group. Hiding keeps the drawn shapes; showing
    // draws them first if the group holds a different level (or nothing).
    fn sync_boundary_visibility(&mut self) {
        if self.state.show_boundaries && self.boundaries_rendered != Some(self.state.admin_level) {
            self.render_boundaries();
        }
        self.surface
            .set_group_visible(OverlayGroup::Boundaries, self.state.show_boundaries);
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let status = self.status();
        ViewSnapshot {
            state: self.state.clone(),
            stats: self.stats,
            panel: StatsPanel::new(&self.stats, &status),
            status,
            error: self.error().map(str::to_string),
            admin_level_enabled: self.state.show_boundaries,
        }
    }
}

/// Run the session's single dataset load against `source`. A second call
/// while the first is in flight, or after it finished, fetches nothing and
/// reports the session outcome. Callers that must wait for the in-flight
/// load share one [`PendingLoad`].
pub async fn run_load<S, M>(controller: &RefCell<ViewController<M>>, source: &S) -> Result<(), String>
where
    S: DatasetSource + ?Sized,
    M: MapSurface,
{
    let urls = {
        let mut controller = controller.borrow_mut();
        if !controller.begin_load() {
            return controller.load_outcome();
        }
        controller.config.datasets.clone()
    };

    let result = load_datasets(source, &urls).await;

    let mut controller = controller.borrow_mut();
    controller.finish_load(result);
    controller.load_outcome()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatasetUrls, PlaceGeometry};
    use crate::data_loader::tests::{complete_source, MemorySource};
    use crate::models::ERROR_TEXT;
    use crate::scene::SceneModel;
    use crate::styles::{BLUE, ORANGE};
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::FutureExt;
    use std::cell::Cell;
    use std::future::Future;
    use std::task::Poll;

    fn loaded_store() -> DatasetStore {
        block_on(load_datasets(&complete_source(), &DatasetUrls::default())).expect("datasets load")
    }

    fn ready_controller() -> ViewController<SceneModel> {
        let mut controller = ViewController::new(SceneModel::default(), ViewerConfig::default());
        controller.finish_load(Ok(loaded_store()));
        controller
    }

    fn place_titles(controller: &ViewController<SceneModel>) -> Vec<&str> {
        controller.surface().titles(OverlayGroup::Places)
    }

    #[test]
    fn starts_loading_with_nothing_drawn() {
        let controller = ViewController::new(SceneModel::default(), ViewerConfig::default());
        let snapshot = controller.snapshot();

        assert_eq!(snapshot.status, LoadStatus::Loading);
        assert_eq!(snapshot.stats, DisplayStats::default());
        assert_eq!(snapshot.error, None);
        assert!(!snapshot.admin_level_enabled);
        assert_eq!(controller.state(), &FilterState::default());

        let scene = controller.surface();
        assert_eq!(scene.tile_source(), Some(&BasemapStyle::OpenStreetMap.tile_source()));
        assert!(scene.group(OverlayGroup::Places).shapes.is_empty());
        assert!(!scene.group(OverlayGroup::Boundaries).visible);
    }

    #[test]
    fn load_sets_initial_stats_without_drawing() {
        let controller = ready_controller();
        let stats = controller.stats();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.visible, 0);
        assert_eq!(stats.boundaries, 2);
        assert_eq!(controller.status(), LoadStatus::Ready);
        assert!(place_titles(&controller).is_empty());
    }

    #[test]
    fn city_filter_shows_two_cities() {
        let mut controller = ready_controller();
        controller.apply(ViewEvent::SetPlaceFilter(PlaceFilter::City));

        assert_eq!(controller.stats().visible, 2);
        assert_eq!(place_titles(&controller), vec!["Khartoum", "Omdurman"]);
    }

    #[test]
    fn search_matches_case_insensitively() {
        let mut controller = ready_controller();
        controller.apply(ViewEvent::SetPlaceFilter(PlaceFilter::All));
        controller.apply(ViewEvent::SetSearchText("atb".to_string()));

        assert_eq!(controller.stats().visible, 1);
        assert_eq!(place_titles(&controller), vec!["Atbara"]);
        let shape = &controller.surface().group(OverlayGroup::Places).shapes[0];
        assert_eq!(shape.style.stroke_color, ORANGE);
    }

    #[test]
    fn places_can_be_drawn_from_points() {
        let config = ViewerConfig {
            place_geometry: PlaceGeometry::Points,
            ..ViewerConfig::default()
        };
        let mut controller = ViewController::new(SceneModel::default(), config);
        controller.finish_load(Ok(loaded_store()));
        controller.apply(ViewEvent::SetPlaceFilter(PlaceFilter::Town));

        let shapes = &controller.surface().group(OverlayGroup::Places).shapes;
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].geometry.as_ref().map(|g| g.r#type.as_str()), Some("Point"));
    }

    #[test]
    fn switching_filter_back_to_none_clears_places() {
        let mut controller = ready_controller();
        controller.apply(ViewEvent::SetPlaceFilter(PlaceFilter::All));
        assert_eq!(controller.stats().visible, 3);

        controller.apply(ViewEvent::SetPlaceFilter(PlaceFilter::None));
        assert_eq!(controller.stats().visible, 0);
        assert!(place_titles(&controller).is_empty());
    }

    #[test]
    fn showing_boundaries_renders_current_level() {
        let mut controller = ready_controller();
        controller.apply(ViewEvent::SetShowBoundaries(true));

        let group = controller.surface().group(OverlayGroup::Boundaries);
        assert!(group.visible);
        assert_eq!(group.shapes.len(), 2);
        assert!(group.shapes.iter().all(|s| s.style.stroke_color == BLUE));
        assert!(controller.snapshot().admin_level_enabled);
    }

    #[test]
    fn toggling_boundaries_reproduces_the_same_set() {
        let mut controller = ready_controller();
        controller.apply(ViewEvent::SetShowBoundaries(true));
        let shown = controller.surface().group(OverlayGroup::Boundaries).clone();

        controller.apply(ViewEvent::SetShowBoundaries(false));
        let hidden = controller.surface().group(OverlayGroup::Boundaries);
        assert!(!hidden.visible);
        assert_eq!(hidden.shapes, shown.shapes);
        assert!(controller.surface().visible_shapes(OverlayGroup::Boundaries).is_empty());

        for _ in 0..5 {
            controller.apply(ViewEvent::SetShowBoundaries(true));
            controller.apply(ViewEvent::SetShowBoundaries(false));
        }
        controller.apply(ViewEvent::SetShowBoundaries(true));
        assert_eq!(controller.surface().group(OverlayGroup::Boundaries), &shown);
    }

    #[test]
    fn admin_level_change_while_shown_redraws() {
        let mut controller = ready_controller();
        controller.apply(ViewEvent::SetShowBoundaries(true));
        controller.apply(ViewEvent::SetAdminLevel(AdminLevel::Admin2));

        assert_eq!(controller.stats().boundaries, 3);
        assert_eq!(
            controller.surface().titles(OverlayGroup::Boundaries),
            vec!["Bahri", "Aroma", "Karari"]
        );
    }

    #[test]
    fn admin_level_change_while_hidden_draws_on_next_show() {
        let mut controller = ready_controller();
        controller.apply(ViewEvent::SetShowBoundaries(true));
        controller.apply(ViewEvent::SetShowBoundaries(false));
        controller.apply(ViewEvent::SetAdminLevel(AdminLevel::Admin0));

        // Count follows the level, shapes wait for the group to be shown
        assert_eq!(controller.stats().boundaries, 1);
        assert_eq!(controller.surface().group(OverlayGroup::Boundaries).shapes.len(), 2);

        controller.apply(ViewEvent::SetShowBoundaries(true));
        assert_eq!(controller.surface().titles(OverlayGroup::Boundaries), vec!["Sudan"]);
    }

    #[test]
    fn basemap_change_leaves_overlays_alone() {
        let mut controller = ready_controller();
        controller.apply(ViewEvent::SetPlaceFilter(PlaceFilter::City));
        controller.apply(ViewEvent::SetShowBoundaries(true));
        let places = controller.surface().group(OverlayGroup::Places).clone();
        let boundaries = controller.surface().group(OverlayGroup::Boundaries).clone();

        controller.apply(ViewEvent::SetBasemap(BasemapStyle::Terrain));

        let scene = controller.surface();
        assert_eq!(scene.tile_source(), Some(&BasemapStyle::Terrain.tile_source()));
        assert_eq!(scene.group(OverlayGroup::Places), &places);
        assert_eq!(scene.group(OverlayGroup::Boundaries), &boundaries);
        assert_eq!(scene.view_changes(), 1);
    }

    #[test]
    fn reset_restores_defaults_from_any_state() {
        let mut controller = ready_controller();
        controller.apply(ViewEvent::SetPlaceFilter(PlaceFilter::All));
        controller.apply(ViewEvent::SetSearchText("om".to_string()));
        controller.apply(ViewEvent::SetShowBoundaries(true));
        controller.apply(ViewEvent::SetAdminLevel(AdminLevel::Admin2));
        controller.apply(ViewEvent::SetBasemap(BasemapStyle::Dark));

        controller.apply(ViewEvent::Reset);

        assert_eq!(controller.state(), &FilterState::default());
        let scene = controller.surface();
        assert!(scene.group(OverlayGroup::Places).shapes.is_empty());
        assert!(!scene.group(OverlayGroup::Boundaries).visible);
        assert_eq!(scene.tile_source(), Some(&BasemapStyle::OpenStreetMap.tile_source()));
        assert_eq!(controller.stats().visible, 0);
        assert_eq!(controller.stats().boundaries, 2);
    }

    #[test]
    fn reset_uses_configured_basemap() {
        let config = ViewerConfig {
            default_basemap: BasemapStyle::Light,
            ..ViewerConfig::default()
        };
        let mut controller = ViewController::new(SceneModel::default(), config);
        controller.apply(ViewEvent::SetBasemap(BasemapStyle::Satellite));
        controller.apply(ViewEvent::Reset);
        assert_eq!(controller.state().basemap, BasemapStyle::Light);
    }

    #[test]
    fn failed_load_reports_error_and_never_draws() {
        let urls = DatasetUrls::default();
        let source = complete_source().with_failure(&urls.admin2, "HTTP 404 Not Found");
        let mut controller = ViewController::new(SceneModel::default(), ViewerConfig::default());

        controller.finish_load(block_on(load_datasets(&source, &urls)));
        controller.apply(ViewEvent::SetPlaceFilter(PlaceFilter::All));
        controller.apply(ViewEvent::SetShowBoundaries(true));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, LoadStatus::Error);
        assert!(snapshot.error.as_deref().unwrap_or_default().contains("sdn_admin2"));
        assert_eq!(snapshot.panel.total, ERROR_TEXT);
        assert_eq!(snapshot.panel.boundaries, ERROR_TEXT);
        assert!(controller.datasets().is_none());

        let scene = controller.surface();
        assert!(scene.group(OverlayGroup::Places).shapes.is_empty());
        assert!(scene.group(OverlayGroup::Boundaries).shapes.is_empty());
    }

    #[test]
    fn changes_before_load_apply_once_loaded() {
        let mut controller = ViewController::new(SceneModel::default(), ViewerConfig::default());
        controller.apply(ViewEvent::SetPlaceFilter(PlaceFilter::City));
        controller.apply(ViewEvent::SetShowBoundaries(true));
        assert!(place_titles(&controller).is_empty());

        controller.finish_load(Ok(loaded_store()));
        assert_eq!(place_titles(&controller), vec!["Khartoum", "Omdurman"]);
        assert_eq!(controller.surface().group(OverlayGroup::Boundaries).shapes.len(), 2);
        assert!(controller.surface().group(OverlayGroup::Boundaries).visible);
    }

    #[test]
    fn second_load_result_is_ignored() {
        let mut controller = ready_controller();
        let err = DataLoadError::Fetch {
            uri: "late.geojson".to_string(),
            reason: "timeout".to_string(),
        };
        controller.finish_load(Err(err));
        assert_eq!(controller.status(), LoadStatus::Ready);
        assert_eq!(controller.stats().total, 3);
    }

    // Serves `inner` only after the gate opens, counting fetch calls
    struct GatedSource {
        inner: MemorySource,
        gate: Shared<oneshot::Receiver<()>>,
        fetches: Cell<usize>,
    }

    impl DatasetSource for GatedSource {
        fn fetch(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>, String>> {
            self.fetches.set(self.fetches.get() + 1);
            let gate = self.gate.clone();
            let response = self.inner.fetch(uri);
            async move {
                let _ = gate.await;
                response.await
            }
        }
    }

    fn gated(inner: MemorySource) -> (oneshot::Sender<()>, Rc<GatedSource>) {
        let (open, gate) = oneshot::channel();
        let source = GatedSource {
            inner,
            gate: gate.shared(),
            fetches: Cell::new(0),
        };
        (open, Rc::new(source))
    }

    fn pending_load(
        controller: &Rc<RefCell<ViewController<SceneModel>>>,
        source: &Rc<GatedSource>,
    ) -> PendingLoad {
        let controller = Rc::clone(controller);
        let source = Rc::clone(source);
        async move { run_load(&controller, &*source).await }
            .boxed_local()
            .shared()
    }

    fn shared_controller() -> Rc<RefCell<ViewController<SceneModel>>> {
        Rc::new(RefCell::new(ViewController::new(SceneModel::default(), ViewerConfig::default())))
    }

    #[test]
    fn load_can_only_begin_once() {
        let mut controller = ViewController::new(SceneModel::default(), ViewerConfig::default());
        assert!(controller.begin_load());
        assert!(!controller.begin_load());
        assert_eq!(controller.status(), LoadStatus::Loading);

        controller.finish_load(Ok(loaded_store()));
        assert!(!controller.begin_load());
        assert_eq!(controller.status(), LoadStatus::Ready);
    }

    #[test]
    fn load_requested_twice_fetches_once() {
        let controller = shared_controller();
        let (open, source) = gated(complete_source());

        let first = pending_load(&controller, &source);
        let second = first.clone();
        let (first, second, _) = block_on(async {
            futures::join!(first, second, async {
                let _ = open.send(());
            })
        });

        assert_eq!(first, Ok(()));
        assert_eq!(second, Ok(()));
        assert_eq!(source.fetches.get(), 5);
        assert_eq!(controller.borrow().status(), LoadStatus::Ready);

        // A later request reuses the finished session
        assert_eq!(block_on(run_load(&controller, &*source)), Ok(()));
        assert_eq!(source.fetches.get(), 5);
    }

    #[test]
    fn overlapping_run_does_not_fetch_while_first_is_in_flight() {
        let controller = shared_controller();
        let (open, source) = gated(complete_source());

        let mut first = pending_load(&controller, &source);
        let polled = block_on(futures::future::poll_fn(|cx| Poll::Ready(first.poll_unpin(cx))));
        assert!(polled.is_pending());
        assert_eq!(source.fetches.get(), 5);

        assert_eq!(block_on(run_load(&controller, &*source)), Ok(()));
        assert_eq!(source.fetches.get(), 5);
        assert_eq!(controller.borrow().status(), LoadStatus::Loading);

        let _ = open.send(());
        assert_eq!(block_on(first), Ok(()));
        assert_eq!(controller.borrow().status(), LoadStatus::Ready);
    }

    #[test]
    fn every_waiter_sees_the_same_failure() {
        let urls = DatasetUrls::default();
        let controller = shared_controller();
        let (open, source) = gated(complete_source().with_failure(&urls.admin2, "HTTP 404 Not Found"));

        let first = pending_load(&controller, &source);
        let second = first.clone();
        let (first, second, _) = block_on(async {
            futures::join!(first, second, async {
                let _ = open.send(());
            })
        });

        assert!(first.as_ref().is_err_and(|message| message.contains("sdn_admin2")));
        assert_eq!(first, second);
        assert_eq!(source.fetches.get(), 5);
        assert_eq!(controller.borrow().status(), LoadStatus::Error);
        assert_eq!(block_on(run_load(&controller, &*source)), first);
    }

    #[test]
    fn basemap_key_goes_through_the_switcher() {
        let mut controller = ready_controller();
        controller.select_basemap("satellite");
        assert_eq!(controller.state().basemap, BasemapStyle::Satellite);
        assert_eq!(
            controller.surface().tile_source(),
            Some(&BasemapStyle::Satellite.tile_source())
        );

        controller.select_basemap("watercolor");
        assert_eq!(controller.state().basemap, BasemapStyle::OpenStreetMap);

        // Reset compares against the attached style, not the last event
        controller.select_basemap("dark");
        controller.apply(ViewEvent::Reset);
        assert_eq!(
            controller.surface().tile_source(),
            Some(&BasemapStyle::OpenStreetMap.tile_source())
        );
    }
}
