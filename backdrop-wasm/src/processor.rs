use backdrop_core::codec::{process_bytes, EncodedOutput};
use backdrop_core::detect::to_hex;
use std::path::Path;
use wasm_bindgen::prelude::*;

use crate::params::RemovalParams;
use crate::utils::{console_log, js_error};

/// Encoded output of a processing request.
#[wasm_bindgen]
pub struct ProcessedImage {
    inner: EncodedOutput,
}

#[wasm_bindgen]
impl ProcessedImage {
    /// PNG or GIF bytes.
    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }

    /// "png" or "gif".
    #[wasm_bindgen(getter)]
    pub fn format(&self) -> String {
        self.inner.format.extension().to_string()
    }

    #[wasm_bindgen(getter, js_name = mimeType)]
    pub fn mime_type(&self) -> String {
        self.inner.format.mime_type().to_string()
    }

    /// Keyed-out background color as "#RRGGBB".
    #[wasm_bindgen(getter)]
    pub fn background(&self) -> String {
        to_hex(self.inner.background)
    }

    #[wasm_bindgen(getter)]
    pub fn frames(&self) -> usize {
        self.inner.frames
    }
}

/// Stateless entry point for the browser.
#[wasm_bindgen]
pub struct BackdropProcessor;

#[wasm_bindgen]
impl BackdropProcessor {
    /// Remove the background of an image.
    ///
    /// # Arguments
    /// * `image_bytes` - Input file as byte array (PNG, JPEG, GIF, BMP)
    /// * `params` - Processing parameters
    ///
    /// # Returns
    /// GIF bytes for GIF input, PNG bytes otherwise
    #[wasm_bindgen(js_name = processImage)]
    pub fn process_image(
        image_bytes: &[u8],
        params: &RemovalParams,
    ) -> Result<ProcessedImage, JsValue> {
        // No path in the browser; the name only matters when sniffing fails
        let output = process_bytes(image_bytes, Path::new("upload"), &params.inner)
            .map_err(|e| js_error("Failed to process image", e))?;

        console_log!(
            "backdrop: keyed {} over {} frame(s), {} bytes of {}",
            to_hex(output.background),
            output.frames,
            output.bytes.len(),
            output.format.extension()
        );
        Ok(ProcessedImage { inner: output })
    }
}
