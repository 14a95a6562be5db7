use thiserror::Error;

/// Crate-wide error type. Variants carry stringified causes so results stay
/// cloneable for single-flight waiters sharing one outcome.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("No template matches '{entity}'. Available: {}", available.join(", "))]
    TemplateNotFound {
        entity: String,
        available: Vec<String>,
    },

    #[error("Could not read template {path}: {cause}")]
    TemplateRead { path: String, cause: String },

    #[error("Invalid document container: {0}")]
    BadContainer(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
