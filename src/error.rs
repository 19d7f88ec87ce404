use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation core.
///
/// The core is a closed numerical system: degenerate states reached during
/// stepping (coincident particles, a zero pointer distance) are handled by
/// explicit skip conditions, not errors. What remains is parameter
/// validation at the API boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),
}
