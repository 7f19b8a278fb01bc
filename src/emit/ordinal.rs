//! Per-type method ordinals.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use crate::{Error, Result};

#[derive(Debug, Default)]
struct TypeOrdinals {
    next: u32,
    taken: HashSet<u32>,
}

/// Hands out method ordinals, counting separately for every declaring type.
///
/// Ordinals start at 0, follow the order of allocation and are never reused. A routine
/// that brings its own ordinal claims it with [`OrdinalAllocator::reserve`], and later
/// allocations for the type continue after it. Clones share the same counters, so one
/// allocator can be passed to every compilation unit that contributes routines to the
/// same types.
///
/// # Examples
///
/// ```rust
/// use symscope::emit::OrdinalAllocator;
///
/// let ordinals = OrdinalAllocator::new();
/// assert_eq!(ordinals.allocate("C")?, 0);
/// assert_eq!(ordinals.allocate("D")?, 0);
/// ordinals.reserve("C", 5)?;
/// assert_eq!(ordinals.allocate("C")?, 6);
/// assert!(ordinals.reserve("C", 0).is_err());
/// # Ok::<(), symscope::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct OrdinalAllocator {
    types: Arc<Mutex<HashMap<String, TypeOrdinals>>>,
}

impl OrdinalAllocator {
    /// Create an allocator with every counter at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next ordinal of `declaring_type`.
    ///
    /// # Errors
    /// Returns [`Error::LockError`] if another thread panicked while allocating and
    /// [`Error::ValueOutOfRange`] once a type runs out of ordinals.
    pub fn allocate(&self, declaring_type: &str) -> Result<u32> {
        let mut types = lock!(self.types);
        let ordinals = types.entry(declaring_type.to_string()).or_default();

        let ordinal = ordinals.next;
        ordinals.next = ordinal
            .checked_add(1)
            .ok_or(Error::ValueOutOfRange(i64::from(ordinal)))?;
        ordinals.taken.insert(ordinal);
        Ok(ordinal)
    }

    /// Claim `ordinal` of `declaring_type` for a routine that brings its own, e.g. a
    /// member index. Allocation continues after the highest claimed ordinal.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateOrdinal`] if `ordinal` was already handed out or claimed,
    /// and [`Error::LockError`] on a poisoned lock.
    pub fn reserve(&self, declaring_type: &str, ordinal: u32) -> Result<()> {
        let mut types = lock!(self.types);
        let ordinals = types.entry(declaring_type.to_string()).or_default();

        if !ordinals.taken.insert(ordinal) {
            return Err(Error::DuplicateOrdinal {
                declaring_type: declaring_type.to_string(),
                ordinal,
            });
        }
        ordinals.next = ordinals.next.max(ordinal.saturating_add(1));
        Ok(())
    }
}
