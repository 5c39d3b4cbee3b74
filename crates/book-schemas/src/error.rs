//! Shared error taxonomy (§7 of the design).
//!
//! The core never returns raw driver/bus errors to its callers. Instead every
//! fallible operation returns `anyhow::Result<T>` and, where the *kind* of
//! failure matters to the caller (not just the message), the error chain
//! carries one of the [`Kind`] markers produced here via `anyhow::Context`.
//!
//! Wrapping with `.context(...)` does not erase the marker: `anyhow::Error`
//! keeps the original cause in its source chain, so `Kind::downcast` below
//! walks the whole chain rather than only the outermost layer.

use thiserror::Error;

/// A closed set of failure kinds that callers (usecases, the outbox worker,
/// the supervisor) branch on. Anything that is not one of these is treated
/// as [`Kind::Transient`]-like by the caller without needing a dedicated
/// variant: a bare driver/bus error wrapped in context is already distinct
/// from the markers below.
#[derive(Debug, Error)]
pub enum Kind {
    /// Expected absence: an empty `Lock`, an empty `GetByIDs`, or a list page
    /// with no matching rows.
    #[error("not found")]
    NotFound,

    /// A pagination cursor failed to decode. Kept distinct from the generic
    /// `InvalidArgument` so callers (and tests) can assert on the exact
    /// decode failure reason.
    #[error("invalid cursor: {0}")]
    InvalidCursor(&'static str),

    /// Malformed caller input other than a cursor: unknown sort field, empty
    /// id list, and similar.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A `rows-affected` count did not match what the caller believed it
    /// owned. Always fatal for the enclosing transaction/worker.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl Kind {
    /// True if `err`'s chain contains [`Kind::NotFound`].
    pub fn is_not_found(err: &anyhow::Error) -> bool {
        err.chain()
            .any(|c| matches!(c.downcast_ref::<Kind>(), Some(Kind::NotFound)))
    }

    /// True if `err`'s chain contains [`Kind::InvalidCursor`] or
    /// [`Kind::InvalidArgument`].
    pub fn is_invalid_argument(err: &anyhow::Error) -> bool {
        err.chain().any(|c| {
            matches!(
                c.downcast_ref::<Kind>(),
                Some(Kind::InvalidCursor(_)) | Some(Kind::InvalidArgument(_))
            )
        })
    }

    /// True if `err`'s chain contains [`Kind::Invariant`].
    pub fn is_invariant(err: &anyhow::Error) -> bool {
        err.chain()
            .any(|c| matches!(c.downcast_ref::<Kind>(), Some(Kind::Invariant(_))))
    }
}
