//! Capture-and-replace of a single console slot.
//!
//! [`patch`] swaps a method for a wrapper built around the original and hands
//! back an [`Unpatch`] that puts the captured original back. Each unpatch
//! restores exactly the slot value it captured, so stacked patches on the
//! same slot must be undone in reverse order.

use std::sync::Arc;

use logtap_protocol::Method;

use crate::console::{Console, LogFn};
use crate::error::PatchError;

/// Restores one patched slot when invoked.
pub type Unpatch = Box<dyn FnOnce() + Send + Sync + 'static>;

/// Replaces `method` on `target` with `make_replacement(original)`.
///
/// Fails without touching `target` if the method is absent.
pub fn patch<F>(target: &Arc<Console>, method: Method, make_replacement: F) -> Result<Unpatch, PatchError>
where
    F: FnOnce(LogFn) -> LogFn,
{
    let original = target.get(method).ok_or(PatchError::MissingMethod(method))?;
    target.set(method, make_replacement(Arc::clone(&original)));
    tracing::debug!(%method, "console method patched");

    let target = Arc::clone(target);
    Ok(Box::new(move || {
        target.set(method, original);
        tracing::debug!(%method, "console method restored");
    }))
}
