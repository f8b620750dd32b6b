use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("empty frame")]
    TooShort,
    #[error("trailing bytes after message: {0}")]
    LengthMismatch(usize),
    #[error("message too large: {0}")]
    PayloadTooLarge(usize),
    #[error("frame too large: {0}")]
    FrameTooLarge(usize),
    #[error("postcard decode error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
