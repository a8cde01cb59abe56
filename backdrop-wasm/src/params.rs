use backdrop_core::detect::{parse_hex, Detector};
use backdrop_core::pipeline::RemovalParams as CoreRemovalParams;
use wasm_bindgen::prelude::*;

use crate::utils::js_error;

/// Background removal parameters.
#[wasm_bindgen]
pub struct RemovalParams {
    pub(crate) inner: CoreRemovalParams,
}

#[wasm_bindgen]
impl RemovalParams {
    /// Create parameters with custom values.
    #[wasm_bindgen(constructor)]
    pub fn new(tolerance: u8, crop: bool, smooth_iterations: u32) -> Self {
        Self {
            inner: CoreRemovalParams::standard()
                .with_tolerance(tolerance)
                .with_crop(crop)
                .with_smooth_iterations(smooth_iterations),
        }
    }

    /// Tolerance 10, cropping, two smoothing passes.
    #[wasm_bindgen(js_name = standard)]
    pub fn standard() -> Self {
        Self {
            inner: CoreRemovalParams::standard(),
        }
    }

    /// Exact color match, no smoothing.
    #[wasm_bindgen(js_name = exact)]
    pub fn exact() -> Self {
        Self {
            inner: CoreRemovalParams::exact(),
        }
    }

    /// Wider tolerance with extra feathering.
    #[wasm_bindgen(js_name = soft)]
    pub fn soft() -> Self {
        Self {
            inner: CoreRemovalParams::soft(),
        }
    }

    /// Key out a fixed color ("#RRGGBB") instead of detecting one.
    #[wasm_bindgen(js_name = setBackground)]
    pub fn set_background(&mut self, hex: &str) -> Result<(), JsValue> {
        let color = parse_hex(hex).map_err(|e| js_error("Invalid background", e))?;
        self.inner.background = Some(color);
        Ok(())
    }

    /// Choose the detector: "dominant" or "extremes".
    #[wasm_bindgen(js_name = setDetector)]
    pub fn set_detector(&mut self, name: &str) -> Result<(), JsValue> {
        let detector = Detector::from_name(name).ok_or_else(|| {
            js_error(
                "Unknown detector",
                format!("'{}' (available: {})", name, Detector::all_names().join(", ")),
            )
        })?;
        self.inner.detector = detector;
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn tolerance(&self) -> u8 {
        self.inner.tolerance
    }
}
