use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use js_sys::{Function, Promise};
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

// Console logging (browser console in wasm, `log` facade natively)
pub mod console;
// GeoJSON feature model
pub mod geojson_features;
// Dataset fetching and the loaded dataset store
pub mod data_loader;
pub mod feature_filter;
pub mod styles;
// Drawing features into a map surface
pub mod layer_renderer;
pub mod scene;
pub mod leaflet;
pub mod basemap;
pub mod view_state;
pub mod controller;
pub mod config;
pub mod format;
pub mod summary;
pub mod models;

use basemap::BasemapStyle;
use config::ViewerConfig;
use controller::{run_load, PendingLoad, ViewController, ViewEvent};
use data_loader::WebFetchSource;
use leaflet::LeafletSurface;
use models::ControlOption;
use view_state::{AdminLevel, PlaceFilter};

#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::console::log(&format!($($t)*)))
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => ($crate::console::warn(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("geoview core initialized");
    });
}

// Plain objects and arrays (never Maps) for JS consumers and Leaflet
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(JsValue::from)
}

type SharedController = Rc<RefCell<ViewController<LeafletSurface>>>;
type Listeners = Rc<RefCell<Vec<Function>>>;

// Snapshot the controller, release the borrow, then call every listener.
// Listeners may call back into the viewer.
fn notify(controller: &SharedController, listeners: &Listeners) {
    let snapshot = match to_js(&controller.borrow().snapshot()) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            console_warn!("Could not serialize view snapshot: {:?}", err);
            return;
        }
    };
    let callbacks: Vec<Function> = listeners.borrow().clone();
    for callback in callbacks {
        if let Err(err) = callback.call1(&JsValue::NULL, &snapshot) {
            console_warn!("onChange listener threw: {:?}", err);
        }
    }
}

/// Interactive map viewer bound to a DOM container.
#[wasm_bindgen]
pub struct GeoViewer {
    controller: SharedController,
    listeners: Listeners,
    pending_load: RefCell<Option<PendingLoad>>,
}

#[wasm_bindgen]
impl GeoViewer {
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, config: JsValue) -> Result<GeoViewer, JsValue> {
        start();
        let config = ViewerConfig::from_js(config)?;
        let surface = LeafletSurface::new(container_id)?;
        Ok(GeoViewer {
            controller: Rc::new(RefCell::new(ViewController::new(surface, config))),
            listeners: Rc::new(RefCell::new(Vec::new())),
            pending_load: RefCell::new(None),
        })
    }

    /// Fetch every dataset. Resolves with the view snapshot once the map is
    /// populated, or rejects with the load error. Every call awaits the same
    /// single load; nothing is fetched twice.
    pub fn load(&self) -> Promise {
        let pending = self
            .pending_load
            .borrow_mut()
            .get_or_insert_with(|| {
                let controller = Rc::clone(&self.controller);
                let listeners = Rc::clone(&self.listeners);
                async move {
                    let outcome = run_load(&controller, &WebFetchSource).await;
                    notify(&controller, &listeners);
                    outcome
                }
                .boxed_local()
                .shared()
            })
            .clone();
        let controller = Rc::clone(&self.controller);

        future_to_promise(async move {
            pending.await.map_err(|message| JsValue::from_str(&message))?;
            let snapshot = controller.borrow().snapshot();
            to_js(&snapshot)
        })
    }

    fn dispatch(&self, event: ViewEvent) {
        self.controller.borrow_mut().apply(event);
        notify(&self.controller, &self.listeners);
    }

    #[wasm_bindgen(js_name = setPlaceFilter)]
    pub fn set_place_filter(&self, key: &str) {
        let filter = PlaceFilter::from_key(key).unwrap_or_default();
        self.dispatch(ViewEvent::SetPlaceFilter(filter));
    }

    #[wasm_bindgen(js_name = setSearchText)]
    pub fn set_search_text(&self, text: &str) {
        self.dispatch(ViewEvent::SetSearchText(text.to_string()));
    }

    #[wasm_bindgen(js_name = setShowBoundaries)]
    pub fn set_show_boundaries(&self, show: bool) {
        self.dispatch(ViewEvent::SetShowBoundaries(show));
    }

    #[wasm_bindgen(js_name = setAdminLevel)]
    pub fn set_admin_level(&self, key: &str) {
        let level = AdminLevel::from_key(key).unwrap_or_default();
        self.dispatch(ViewEvent::SetAdminLevel(level));
    }

    #[wasm_bindgen(js_name = setBasemap)]
    pub fn set_basemap(&self, key: &str) {
        self.controller.borrow_mut().select_basemap(key);
        notify(&self.controller, &self.listeners);
    }

    pub fn reset(&self) {
        self.dispatch(ViewEvent::Reset);
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.controller.borrow().snapshot())
    }

    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: Function) {
        self.listeners.borrow_mut().push(callback);
    }

    /// Boundary collection for an admin level key (unknown keys give the
    /// state boundaries), or `null` before load.
    #[wasm_bindgen(js_name = boundaryCollection)]
    pub fn boundary_collection(&self, key: &str) -> Result<JsValue, JsValue> {
        match self.controller.borrow().datasets() {
            Some(store) => to_js(store.boundary_collection_for_key(key)),
            None => Ok(JsValue::NULL),
        }
    }

    /// Place counts and extent of the loaded data, or `null` before load.
    #[wasm_bindgen(js_name = datasetSummary)]
    pub fn dataset_summary(&self) -> Result<JsValue, JsValue> {
        match self.controller.borrow().datasets() {
            Some(store) => to_js(&summary::summarize(store)),
            None => Ok(JsValue::NULL),
        }
    }
}

#[wasm_bindgen]
pub fn legend() -> Result<JsValue, JsValue> {
    to_js(&styles::legend())
}

#[wasm_bindgen(js_name = basemapOptions)]
pub fn basemap_options() -> Result<JsValue, JsValue> {
    let options: Vec<ControlOption> = BasemapStyle::OPTIONS
        .into_iter()
        .map(|style| ControlOption {
            key: style.key(),
            label: style.label(),
        })
        .collect();
    to_js(&options)
}

#[wasm_bindgen(js_name = placeFilterOptions)]
pub fn place_filter_options() -> Result<JsValue, JsValue> {
    let options: Vec<ControlOption> = PlaceFilter::OPTIONS
        .into_iter()
        .map(|filter| ControlOption {
            key: filter.key(),
            label: filter.label(),
        })
        .collect();
    to_js(&options)
}

#[wasm_bindgen(js_name = adminLevelOptions)]
pub fn admin_level_options() -> Result<JsValue, JsValue> {
    let options: Vec<ControlOption> = AdminLevel::OPTIONS
        .into_iter()
        .map(|level| ControlOption {
            key: level.key(),
            label: level.label(),
        })
        .collect();
    to_js(&options)
}
