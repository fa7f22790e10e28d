//! Shared utilities for tiercache
//!
//! Filesystem helpers used by the cache engine (atomic writes, advisory
//! cross-process locks, cache directory resolution) and subscriber setup for
//! the command-line client.

pub mod atomic_file;
pub mod file_lock;
pub mod logging;
pub mod xdg;

pub use atomic_file::*;
pub use file_lock::FileLock;
pub use xdg::XdgPaths;
