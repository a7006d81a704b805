//! Per-call correlation ids for one-shot query responses.
//!
//! # Why not derive the id from the accelerator? (for beginners)
//!
//! The bridge has no request ids, so every `query` needs its own reply
//! channel.  Naming that channel after a hash of the accelerator looks
//! tempting but breaks in two ways:
//!
//! - Two *different* accelerators can hash to the same value, so one caller
//!   could receive the other's answer.
//! - Two concurrent queries for the *same* accelerator share a channel, so the
//!   first reply resolves (and unsubscribes) the wrong caller.
//!
//! A [`CorrelationId`] is instead allocated per call from a
//! [`CorrelationAllocator`]: a random session nonce fixed at construction plus
//! an atomic sequence number.  Within one allocator no two calls ever get the
//! same id, and two allocators (e.g. across a process restart) differ in
//! their nonce.
//!
//! # Thread safety
//!
//! The sequence uses `AtomicU64::fetch_add`, so any number of threads can
//! allocate concurrently without a lock and without producing duplicates.
//! At one million queries per second, the 64-bit counter lasts for more than
//! half a million years before wrapping.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use super::events::QUERY_COMPLETED_PREFIX;
use super::messages::ProtocolError;

/// Identifies a single in-flight query.
///
/// The textual form is `<session-uuid-simple>-<sequence>`, for example
/// `5f0c6e8d4b2a4c1e9d7f3a2b1c0d9e8f-42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId {
    session: Uuid,
    sequence: u64,
}

impl CorrelationId {
    /// Returns the session nonce of the allocator that issued this id.
    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Returns the per-allocator sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the name of the one-shot event channel that carries the answer.
    ///
    /// ```rust
    /// use shortcut_core::CorrelationAllocator;
    ///
    /// let id = CorrelationAllocator::new().next();
    /// assert!(id.channel().starts_with("query-completed:"));
    /// ```
    pub fn channel(&self) -> String {
        format!("{QUERY_COMPLETED_PREFIX}{self}")
    }

    /// Parses a channel name produced by [`CorrelationId::channel`].
    ///
    /// Returns `None` if `event` is not a query-completed channel or the id
    /// part is malformed.
    pub fn from_channel(event: &str) -> Option<Self> {
        event
            .strip_prefix(QUERY_COMPLETED_PREFIX)
            .and_then(|id| id.parse().ok())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.session.simple(), self.sequence)
    }
}

impl FromStr for CorrelationId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidCorrelationId(s.to_string());

        // The simple UUID form contains no hyphens, so the first hyphen is
        // always the separator.
        let (session, sequence) = s.split_once('-').ok_or_else(invalid)?;
        if session.len() != 32 {
            return Err(invalid());
        }
        let session = Uuid::parse_str(session).map_err(|_| invalid())?;
        let sequence = sequence.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self { session, sequence })
    }
}

/// Thread-safe source of unique [`CorrelationId`]s.
///
/// # Examples
///
/// ```rust
/// use shortcut_core::CorrelationAllocator;
///
/// let alloc = CorrelationAllocator::new();
/// let a = alloc.next();
/// let b = alloc.next();
/// assert_ne!(a, b);
/// assert_eq!(b.sequence(), a.sequence() + 1);
/// ```
#[derive(Debug)]
pub struct CorrelationAllocator {
    session: Uuid,
    next: AtomicU64,
}

impl CorrelationAllocator {
    /// Creates an allocator with a fresh random session nonce.
    pub fn new() -> Self {
        Self::with_session(Uuid::new_v4())
    }

    /// Creates an allocator with an explicit session nonce.
    pub fn with_session(session: Uuid) -> Self {
        Self {
            session,
            next: AtomicU64::new(0),
        }
    }

    /// Allocates the next id.
    ///
    /// `Ordering::Relaxed` is enough: uniqueness comes from the atomicity of
    /// `fetch_add`, not from ordering against other memory.
    pub fn next(&self) -> CorrelationId {
        CorrelationId {
            session: self.session,
            sequence: self.next.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Returns how many ids have been handed out so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }

    /// Returns this allocator's session nonce.
    pub fn session(&self) -> Uuid {
        self.session
    }
}

impl Default for CorrelationAllocator {
    fn default() -> Self {
        Self::new()
    }
}
