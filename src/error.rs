pub type VorosetResult<T> = Result<T, VorosetError>;

#[derive(thiserror::Error, Debug)]
pub enum VorosetError {
    #[error("gpu error: {0}")]
    Gpu(String),

    #[error("kernel error: {0}")]
    Kernel(String),

    #[error("resource error: {0}")]
    Resource(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VorosetError {
    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }

    pub fn kernel(msg: impl Into<String>) -> Self {
        Self::Kernel(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
