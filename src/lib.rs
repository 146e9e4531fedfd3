#![forbid(unsafe_code)]

pub mod encode;
pub mod error;
pub mod region;
pub mod render;
pub mod render_gpu;

pub use encode::{rgba_to_rgb24, save_jpeg};
pub use error::{VorosetError, VorosetResult};
pub use region::{Region, generate_regions};
pub use render::{FrameRgba, KernelTiming, RenderOptions};
pub use render_gpu::{
    ComputeKernel, GpuRenderer, KERNEL_ENTRY_POINT, KERNEL_SOURCE_PATH, load_kernel_source,
};
