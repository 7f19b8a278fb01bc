#![allow(unused_macros)]

/// Helper macro for locking items
///
/// Maps a poisoned mutex to [`crate::Error::LockError`] and returns early.
///
/// ```rust, ignore
///  let mut data = lock!(my_mutex);
///  data.some_field = 42;
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().map_err(|_| crate::Error::LockError)?
    };
}
