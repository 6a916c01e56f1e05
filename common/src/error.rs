//! Classification of transfer errors
//!
//! Batches report every unfinished transfer through the waiter's error
//! sequence, including transfers that were skipped on purpose (`--no-clobber`
//! and friends). Reporting layers use [`TransferError::is_acceptable`] to keep
//! those skips out of the process exit status while still counting them.

/// Why a transfer was intentionally skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ObjectExists,
    ObjectIsNewer,
    SizesMatch,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            SkipReason::ObjectExists => "object already exists",
            SkipReason::ObjectIsNewer => "object is newer or same age",
            SkipReason::SizesMatch => "object size matches",
        };
        write!(f, "{message}")
    }
}

/// Error produced by a transfer task.
///
/// `Skipped` is acceptable: the transfer did not happen by policy, and the
/// error exists only so the batch can account for it. Everything else is
/// fatal, including metadata-lookup transport failures. Classification is
/// carried by the variant itself, so it survives wrapping and forwarding
/// through the waiter channel; new acceptable kinds only need a new
/// [`SkipReason`], not changes at call sites.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("{0}")]
    Skipped(SkipReason),
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl TransferError {
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        matches!(self, TransferError::Skipped(_))
    }

    #[must_use]
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            TransferError::Skipped(reason) => Some(*reason),
            TransferError::Fatal(_) => None,
        }
    }
}

impl From<SkipReason> for TransferError {
    fn from(reason: SkipReason) -> Self {
        TransferError::Skipped(reason)
    }
}

/// Classifies an error that crossed a waiter channel as `anyhow::Error`.
///
/// Anything that does not carry a [`TransferError`] is fatal.
#[must_use]
pub fn is_acceptable_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<TransferError>()
        .is_some_and(TransferError::is_acceptable)
}

/// Collapses the multi-line error messages storage clients tend to produce
/// into a single display line. Cosmetic only; never consulted for
/// classification.
#[must_use]
pub fn cleanup_error(error: &anyhow::Error) -> String {
    format!("{error:#}")
        .replace('\n', " ")
        .replace('\t', " ")
        .replace("  ", " ")
        .trim()
        .to_string()
}
