#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// Browser console bindings, only linked when running inside wasm
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log_str(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    fn console_warn_str(s: &str);
}

/// Write an informational line to the browser console, or to the `log`
/// facade when compiled for a native target.
pub fn log(s: &str) {
    #[cfg(target_arch = "wasm32")]
    console_log_str(s);
    #[cfg(not(target_arch = "wasm32"))]
    log::info!("{}", s);
}

pub fn warn(s: &str) {
    #[cfg(target_arch = "wasm32")]
    console_warn_str(s);
    #[cfg(not(target_arch = "wasm32"))]
    log::warn!("{}", s);
}

// Note: the console_log / console_warn macros are defined in lib.rs
