#[derive(Debug, thiserror::Error)]
pub enum WxError {
    #[error("Invalid capacity policy: {0}")]
    InvalidPolicy(String),
    #[error("Series already holds data and cannot be seeded again")]
    AlreadySeeded,
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, WxError>;
