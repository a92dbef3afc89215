//! Per-path write serialization for derived assets.
//!
//! Two requests rendering the same image can race to create or blur the same
//! derived file. [`SourceImage`](super::source::SourceImage) and the tiny-blur
//! step take the lock for the target path before checking and writing it; the
//! write itself goes through a temp file + rename (see
//! [`rust_backend`](super::rust_backend)), so readers never see a torn file.
//!
//! The locks are not reentrant: backends must not take them.
//!
//! Entries are pruned once no caller holds them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

static PATH_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn lock_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The shared lock guarding writes to `path`.
pub fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let mut table = PATH_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    table.retain(|_, lock| Arc::strong_count(lock) > 1);
    table
        .entry(lock_key(path))
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Run `f` while holding the write lock for `path`.
///
/// A poisoned lock is taken over: the guarded data is `()`, and the file
/// itself is protected by the atomic rename.
pub fn with_path_lock<T>(path: &Path, f: impl FnOnce() -> T) -> T {
    let lock = lock_for(path);
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
    f()
}
