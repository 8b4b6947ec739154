//! # Error Handling for Streamfold
//!
//! A single error enum ([`Error`]) represents all failure modes, which keeps
//! function signatures simple and lets callers handle faults uniformly.
//!
//! ## Error Categories
//!
//! | Category | Variants | Typical Response |
//! |----------|----------|------------------|
//! | Client fault | `WrongExpectedVersion` | Converted to a conflict result by the write primitive |
//! | Fatal | `StreamDeleted`, `BatchLimitExceeded`, `MissingVersion` | Surface to the caller |
//! | Transient | `Transport` | Subject to the retry policy |
//!
//! Note that an optimistic-concurrency conflict is *not* an error at the
//! adapter's surface: [`try_sync`](crate::StoreGateway::try_sync) returns it
//! as a result variant so the caller can resync and retry. The
//! `WrongExpectedVersion` variant exists for event-log clients to raise; the
//! write primitive intercepts it before it reaches adapter callers.

use thiserror::Error;

/// All errors that can occur in adapter operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The stream's actual version did not match the expected version
    /// presented on an append.
    ///
    /// # When This Happens
    ///
    /// Another writer appended between this writer's load and its append.
    /// Raised by [`EventLog`](crate::EventLog) implementations; the write
    /// primitive translates it into a conflict result, so it only surfaces
    /// as an error when the client is used directly.
    ///
    /// # Recovery
    ///
    /// 1. Catch up with
    ///    [`load_from_token`](crate::StoreGateway::load_from_token)
    /// 2. Re-apply domain logic to the refreshed state
    /// 3. Retry the sync with the fresh token
    #[error("wrong expected version on stream '{stream}': expected {expected}, actual {actual}")]
    WrongExpectedVersion {
        /// The stream the append targeted.
        stream: String,
        /// The version the writer expected.
        expected: i64,
        /// The stream's actual version at append time.
        actual: i64,
    },

    /// The stream has been tombstoned.
    ///
    /// # When This Happens
    ///
    /// The underlying store deleted the stream, either through an explicit
    /// tombstone or a data-retention policy.
    ///
    /// # Recovery
    ///
    /// None. The aggregate is gone; there is nothing to resync.
    #[error("stream '{stream}' has been deleted")]
    StreamDeleted {
        /// The deleted stream.
        stream: String,
    },

    /// A paged read hit the configured batch cap before reaching the end of
    /// the stream.
    ///
    /// # When This Happens
    ///
    /// The stream has grown past `batch_size × max_batches` events, so the
    /// cap that exists to bound read cost fired before end-of-stream.
    ///
    /// # Recovery
    ///
    /// Configuration-level: raise the cap, enlarge the batch size, or
    /// compact the stream more often. Retrying the same load will fail the
    /// same way.
    #[error("read on stream '{stream}' exceeded the maximum of {max_batches} batches")]
    BatchLimitExceeded {
        /// The stream being read.
        stream: String,
        /// The configured cap that was hit.
        max_batches: usize,
    },

    /// A batch sequence terminated without reporting a stream version.
    ///
    /// # When This Happens
    ///
    /// Invariant breach: the first slice of every read carries the stream's
    /// last event number, so a load that completes without one indicates a
    /// defective client.
    #[error("read on stream '{stream}' completed without reporting a stream version")]
    MissingVersion {
        /// The stream being read.
        stream: String,
    },

    /// A fault in the underlying transport or store.
    ///
    /// # When This Happens
    ///
    /// Connection drops, timeouts, store unavailability — anything the
    /// client reports that is not one of the protocol-level faults above.
    ///
    /// # Recovery
    ///
    /// The only retryable kind: the retry policy re-issues the physical
    /// call for these and gives up immediately on everything else.
    #[error("transport fault: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary error as a transport fault.
    pub fn transport(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Transport(err.into())
    }

    /// True for faults the retry policy may re-issue.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// A `Result` type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let conflict = Error::WrongExpectedVersion {
            stream: "cart-1".to_string(),
            expected: 5,
            actual: 7,
        };
        assert_eq!(
            conflict.to_string(),
            "wrong expected version on stream 'cart-1': expected 5, actual 7"
        );

        let deleted = Error::StreamDeleted {
            stream: "cart-1".to_string(),
        };
        assert_eq!(deleted.to_string(), "stream 'cart-1' has been deleted");

        let capped = Error::BatchLimitExceeded {
            stream: "cart-1".to_string(),
            max_batches: 1,
        };
        assert_eq!(
            capped.to_string(),
            "read on stream 'cart-1' exceeded the maximum of 1 batches"
        );
    }

    #[test]
    fn only_transport_is_transient() {
        assert!(Error::transport("connection reset").is_transient());
        assert!(!Error::StreamDeleted {
            stream: "s".to_string()
        }
        .is_transient());
        assert!(!Error::WrongExpectedVersion {
            stream: "s".to_string(),
            expected: 0,
            actual: 1,
        }
        .is_transient());
    }
}
