//! Synchronization primitives.
//!
//! The caches lock through these re-exports so every module agrees on one lock
//! implementation.
pub use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
pub use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
