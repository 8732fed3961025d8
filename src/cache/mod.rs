//! # Caches
//!
//! Two tiers share one lock:
//!
//! - [`SynthesisCache`] maps a target type to its synthesized implementation
//!   and runs the builder at most once per target.
//! - [`InstanceCache`] maps a target plus constructor arguments to a constructed
//!   instance, layered on a synthesis cache.
//!
//! Both tiers live in a single [`CacheTables`] behind one `RwLock`. A layered
//! cache stores its own table in the `layer` slot and reaches the synthesis
//! tier through [`SynthesisCache::get_locked`] while already holding the write
//! guard, so no code path ever holds two cache locks.
use crate::{
    builder::SynthesizedImplementation,
    error::GenerationError,
    types::TypeDescription,
    utils::sync::{Arc, RwLock},
};
use std::collections::HashMap;

pub mod instance;
pub mod synthesis;

pub use instance::{InstanceCache, InstanceKey, InstanceTable};
pub use synthesis::SynthesisCache;

/// A table layered on the synthesis tier. Purged together with it.
pub trait Purge {
    fn purge(&mut self);

    fn entries(&self) -> usize;
}

impl Purge for () {
    fn purge(&mut self) {}

    fn entries(&self) -> usize {
        0
    }
}

#[derive(Default)]
pub struct CacheTables<L = ()> {
    pub(crate) implementations: HashMap<TypeDescription, Arc<SynthesizedImplementation>>,
    pub layer: L,
}

impl<L> CacheTables<L> {
    pub fn implementation(
        &self,
        target: &TypeDescription,
    ) -> Option<&Arc<SynthesizedImplementation>> {
        self.implementations.get(target)
    }

    pub fn implementations(&self) -> usize {
        self.implementations.len()
    }
}

impl<L: Purge> CacheTables<L> {
    pub fn purge(&mut self) {
        self.implementations.clear();
        self.layer.purge();
    }
}

/// Lazily produces values per request and keeps them until purged.
pub trait Factory {
    type Request;
    type Output;
    type Tables;

    fn get(&self, request: Self::Request) -> Result<Self::Output, GenerationError>;

    /// The lock guarding every table of this factory.
    fn lock(&self) -> &RwLock<Self::Tables>;

    fn purge(&self);
}
