use crate::{
    builder::Builder,
    cache::{CacheTables, Factory, Purge, SynthesisCache},
    error::GenerationError,
    metrics::{CacheMetrics, CacheStats},
    types::TypeDescription,
    utils::sync::{Arc, RwLock, RwLockWriteGuard},
    value::{Instance, Value},
};
use std::collections::{hash_map::Entry, HashMap};
use tracing::{debug, trace};

/// Target type plus constructor arguments, compared structurally.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct InstanceKey {
    pub target: TypeDescription,
    pub arguments: Vec<Value>,
}

impl InstanceKey {
    pub fn new(target: TypeDescription, arguments: Vec<Value>) -> Self {
        Self { target, arguments }
    }
}

#[derive(Default)]
pub struct InstanceTable {
    instances: HashMap<InstanceKey, Arc<Instance>>,
}

impl InstanceTable {
    pub fn get(&self, key: &InstanceKey) -> Option<&Arc<Instance>> {
        self.instances.get(key)
    }
}

impl Purge for InstanceTable {
    fn purge(&mut self) {
        self.instances.clear();
    }

    fn entries(&self) -> usize {
        self.instances.len()
    }
}

/// Constructed instances per [`InstanceKey`], layered on a [`SynthesisCache`]
/// that shares its lock.
pub struct InstanceCache<B> {
    synthesis: SynthesisCache<B, InstanceTable>,
}

impl<B: Builder> InstanceCache<B> {
    pub fn new(builder: B) -> Self {
        Self {
            synthesis: SynthesisCache::new(builder),
        }
    }

    pub fn get(
        &self,
        target: &TypeDescription,
        arguments: Vec<Value>,
    ) -> Result<Arc<Instance>, GenerationError> {
        self.get_key(InstanceKey::new(target.clone(), arguments))
    }

    pub fn get_key(&self, key: InstanceKey) -> Result<Arc<Instance>, GenerationError> {
        let cached = self.synthesis.lock().read().layer.get(&key).cloned();
        if let Some(instance) = cached {
            self.metrics().record_instance_hit();
            return Ok(instance);
        }

        let mut tables = self.synthesis.lock().write();
        self.get_or_construct_locked(&mut tables, key)
    }

    /// Slow path under the write guard. Another thread may have filled `key`
    /// since the read miss; the fresh instance is then discarded and the
    /// stored one returned.
    fn get_or_construct_locked(
        &self,
        tables: &mut RwLockWriteGuard<'_, CacheTables<InstanceTable>>,
        key: InstanceKey,
    ) -> Result<Arc<Instance>, GenerationError> {
        let implementation = self.synthesis.get_locked(tables, &key.target)?;
        let instance = implementation.instantiate(key.arguments.clone())?;

        match tables.layer.instances.entry(key) {
            Entry::Occupied(existing) => {
                trace!("discarding duplicate instance of {}", implementation.name());
                self.metrics().record_instance_hit();
                self.metrics().record_discarded_instance();
                Ok(existing.get().clone())
            }
            Entry::Vacant(slot) => {
                debug!("constructed {:?}", instance);
                self.metrics().record_instance_miss();
                Ok(slot.insert(instance).clone())
            }
        }
    }

    /// Clears both the instances and the implementations they were built from.
    pub fn purge(&self) {
        self.synthesis.purge();
    }

    pub fn lock(&self) -> &RwLock<CacheTables<InstanceTable>> {
        self.synthesis.lock()
    }

    pub fn synthesis(&self) -> &SynthesisCache<B, InstanceTable> {
        &self.synthesis
    }

    pub fn len(&self) -> usize {
        self.lock().read().layer.entries()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> &CacheMetrics {
        self.synthesis.metrics()
    }

    pub fn statistics(&self) -> CacheStats {
        self.synthesis.statistics()
    }
}

impl<B: Builder> Factory for InstanceCache<B> {
    type Request = InstanceKey;
    type Output = Arc<Instance>;
    type Tables = CacheTables<InstanceTable>;

    fn get(&self, request: InstanceKey) -> Result<Self::Output, GenerationError> {
        self.get_key(request)
    }

    fn lock(&self) -> &RwLock<Self::Tables> {
        InstanceCache::lock(self)
    }

    fn purge(&self) {
        InstanceCache::purge(self)
    }
}
