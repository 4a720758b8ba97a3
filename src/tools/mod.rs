pub mod crop;

pub use crop::{CropPhase, CropRect, CropTool, Handle};
