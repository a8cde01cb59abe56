pub mod codec;
pub mod crop;
pub mod detect;
pub mod error;
pub mod exif_orientation;
pub mod mask;
pub mod pipeline;
pub mod smooth;

#[cfg(not(target_arch = "wasm32"))]
pub mod batch;

pub use error::{Error, Result};
