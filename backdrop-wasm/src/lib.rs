use wasm_bindgen::prelude::*;

mod params;
mod processor;
mod utils;

pub use params::RemovalParams;
pub use processor::{BackdropProcessor, ProcessedImage};

/// Initialize the WASM module (sets up panic hook).
#[wasm_bindgen(start)]
pub fn init() {
    utils::set_panic_hook();
}
