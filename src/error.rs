use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serde")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Shape check shared by the loss functions and the network entry points.
#[inline]
pub(crate) fn check_len(what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(Error::InvalidShape(format!(
            "{what} len {got} does not match expected len {expected}"
        )));
    }
    Ok(())
}
