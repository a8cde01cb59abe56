use wasm_bindgen::JsValue;

/// Set panic hook for better error messages in browser console
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! console_log {
    ($($t:tt)*) => (crate::utils::log(&format_args!($($t)*).to_string()))
}

pub(crate) use console_log;

/// Wrap an error message in a JS `Error`.
pub fn js_error(context: &str, e: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&format!("{}: {}", context, e)).into()
}
