//! Pre-flight conflict resolution for overwriting destination objects
//!
//! Every conditional-copy flag (`--no-clobber`, `--if-size-differ`,
//! `--if-source-newer`) funnels into [`check_conditions`], which runs before
//! the actual transfer and decides whether it should happen at all.

use crate::error::{SkipReason, TransferError};
use crate::object::{ObjectStore, ObjectUrl};

/// Conditions gating overwrite of an existing destination object. All three
/// are independent; see [`check_conditions`] for how they combine.
#[derive(Debug, Clone, Copy, Default)]
pub struct Settings {
    /// Skip the transfer when the destination already exists.
    pub no_clobber: bool,
    /// Transfer only when source and destination sizes differ.
    pub if_size_differ: bool,
    /// Transfer only when the source is strictly newer than the destination.
    pub if_source_newer: bool,
}

impl Settings {
    fn is_unconditional(&self) -> bool {
        !(self.no_clobber || self.if_size_differ || self.if_source_newer)
    }
}

/// Outcome of the conflict check. A skip is not a failure here; callers turn
/// it into an acceptable [`TransferError`] when reporting it to a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Skip(SkipReason),
}

/// Decides whether a transfer from `src` may overwrite `dst`.
///
/// With no flag set this returns `Proceed` without any metadata lookup, so
/// the common unconditional copy pays no extra round trip. Otherwise both
/// descriptors are fetched; a missing destination always proceeds since the
/// flags only gate overwriting an existing object.
///
/// The flags are evaluated as a priority chain in a fixed order -- no_clobber,
/// then if_size_differ, then if_source_newer -- where each step that applies
/// overrides the decision left by the previous one. In particular
/// no_clobber + if_size_differ with differing sizes proceeds: the size check
/// clears the no_clobber skip. This is a compatibility contract, not an AND
/// or OR of the three conditions; a new flag must be slotted into this order
/// deliberately.
///
/// # Errors
///
/// Returns a fatal [`TransferError`] only for lookup failures; a business
/// rule mismatch is always a `Skip` decision, never an error.
#[tracing::instrument(skip(store))]
pub async fn check_conditions<S: ObjectStore>(
    store: &S,
    src: &ObjectUrl,
    dst: &ObjectUrl,
    settings: &Settings,
) -> Result<Decision, TransferError> {
    if settings.is_unconditional() {
        return Ok(Decision::Proceed);
    }
    let src_object = store
        .stat(src)
        .await?
        .ok_or_else(|| anyhow::anyhow!("source object not found: {}", src))?;
    let Some(dst_object) = store.stat(dst).await? else {
        return Ok(Decision::Proceed);
    };

    let mut decision = Decision::Proceed;
    if settings.no_clobber {
        decision = Decision::Skip(SkipReason::ObjectExists);
    }
    if settings.if_size_differ {
        decision = if src_object.size == dst_object.size {
            Decision::Skip(SkipReason::SizesMatch)
        } else {
            Decision::Proceed
        };
    }
    if settings.if_source_newer {
        // strictly newer; equal modification times skip
        decision = if src_object.mod_time > dst_object.mod_time {
            Decision::Proceed
        } else {
            Decision::Skip(SkipReason::ObjectIsNewer)
        };
    }
    tracing::debug!("conflict check {} -> {}: {:?}", src, dst, decision);
    Ok(decision)
}
