use thiserror::Error;

/// Failures of a single verification call.
///
/// Collaborator flakiness is normally absorbed into fallback scores; these
/// variants only surface when no verdict can be produced at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerificationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("All evidence collaborators unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Verification exceeded deadline of {0}s")]
    DeadlineExceeded(u64),

    #[error("Internal verification error: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum VerityError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
