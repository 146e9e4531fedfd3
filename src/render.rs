use crate::error::{VorosetError, VorosetResult};

/// A frame read back from the device: tightly packed RGBA8, row-major.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// How the kernel time was measured.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KernelTiming {
    /// Start/end device timestamps resolved from a query set, in seconds.
    Device(f64),
    /// Host wall clock around submit/wait, in seconds. Used when the adapter
    /// does not expose timestamp queries.
    Wall(f64),
}

impl KernelTiming {
    pub fn seconds(self) -> f64 {
        match self {
            KernelTiming::Device(s) | KernelTiming::Wall(s) => s,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl RenderOptions {
    pub fn validate(&self) -> VorosetResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VorosetError::validation(format!(
                "output dimensions must be nonzero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_reject_zero_dimensions() {
        assert!(RenderOptions { width: 0, height: 64 }.validate().is_err());
        assert!(RenderOptions { width: 64, height: 0 }.validate().is_err());
        assert!(RenderOptions { width: 64, height: 64 }.validate().is_ok());
    }

    #[test]
    fn timing_seconds_ignores_source() {
        assert_eq!(KernelTiming::Device(1.5).seconds(), 1.5);
        assert_eq!(KernelTiming::Wall(0.25).seconds(), 0.25);
    }
}
