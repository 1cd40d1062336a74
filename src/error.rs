use thiserror::Error;

/// Errors raised by the harness core.
///
/// Everything here is fatal for the run: duplicate identities and labels are
/// configuration mistakes made before any measurement starts, and a backend
/// failure during a timed operation leaves cryptographic state the harness
/// cannot reason about. Precondition skips are not errors; they are reported
/// through [`crate::timing::CaseOutcome::Skipped`].
#[derive(Error, Debug)]
pub enum HeBenchError {
    #[error("duplicate parameter identity: {0}")]
    DuplicateIdentity(String),

    #[error("duplicate benchmark label: {0}")]
    DuplicateLabel(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, HeBenchError>;
