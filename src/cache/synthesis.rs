use crate::{
    builder::{Builder, SynthesizedImplementation},
    cache::{CacheTables, Factory, Purge},
    error::GenerationError,
    metrics::{CacheMetrics, CacheStats},
    types::TypeDescription,
    utils::sync::{Arc, RwLock, RwLockWriteGuard},
};
use std::ptr;
use tracing::{debug, trace};

/// Target type to synthesized implementation, built at most once per target.
pub struct SynthesisCache<B, L = ()> {
    builder: B,
    tables: RwLock<CacheTables<L>>,
    metrics: CacheMetrics,
}

impl<B: Builder, L: Purge + Default> SynthesisCache<B, L> {
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            tables: RwLock::new(CacheTables::default()),
            metrics: CacheMetrics::new(),
        }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn get(
        &self,
        target: &TypeDescription,
    ) -> Result<Arc<SynthesizedImplementation>, GenerationError> {
        let cached = self.tables.read().implementations.get(target).cloned();
        if let Some(implementation) = cached {
            self.metrics.record_synthesis_hit();
            return Ok(implementation);
        }

        let mut tables = self.tables.write();
        self.get_locked(&mut tables, target)
    }

    /// Lookup-or-build for callers already holding the write guard of
    /// [`lock`](Self::lock). A failed build leaves the tables untouched.
    ///
    /// Guards of any other lock are rejected with
    /// [`GenerationError::ForeignLock`] before the builder runs.
    pub fn get_locked(
        &self,
        tables: &mut RwLockWriteGuard<'_, CacheTables<L>>,
        target: &TypeDescription,
    ) -> Result<Arc<SynthesizedImplementation>, GenerationError> {
        if !ptr::eq(RwLockWriteGuard::rwlock(tables), &self.tables) {
            return Err(GenerationError::ForeignLock(target.to_string()));
        }

        if let Some(implementation) = tables.implementations.get(target) {
            trace!("{} was synthesized while waiting for the lock", target);
            self.metrics.record_synthesis_hit();
            return Ok(implementation.clone());
        }

        self.metrics.record_synthesis_miss();
        debug!("synthesis cache miss for {}", target);
        let implementation = Arc::new(self.builder.build(target)?);
        self.metrics.record_build();
        tables
            .implementations
            .insert(target.clone(), implementation.clone());
        Ok(implementation)
    }

    /// Drops every implementation and the layered table; later requests rebuild.
    pub fn purge(&self) {
        debug!("purging synthesis cache");
        self.tables.write().purge();
    }

    pub fn lock(&self) -> &RwLock<CacheTables<L>> {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.read().implementations()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    pub fn statistics(&self) -> CacheStats {
        let tables = self.tables.read();
        self.metrics
            .snapshot(tables.implementations(), tables.layer.entries())
    }
}

impl<B: Builder, L: Purge + Default> Factory for SynthesisCache<B, L> {
    type Request = TypeDescription;
    type Output = Arc<SynthesizedImplementation>;
    type Tables = CacheTables<L>;

    fn get(&self, request: TypeDescription) -> Result<Self::Output, GenerationError> {
        SynthesisCache::get(self, &request)
    }

    fn lock(&self) -> &RwLock<Self::Tables> {
        SynthesisCache::lock(self)
    }

    fn purge(&self) {
        SynthesisCache::purge(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builder::StrategyBuilder,
        strategy::AnnotatedStrategy,
        types::{
            generics::MemberType,
            members::{Marker, MethodDefinition},
            CatalogBuilder, TypeCatalog,
        },
    };

    fn catalog() -> Arc<TypeCatalog> {
        let mut b = CatalogBuilder::new();
        let greeter = b.declare_interface("Greeter").unwrap();
        let broken = b.declare_interface("Broken").unwrap();
        b[greeter].methods.push(
            MethodDefinition::new("greet")
                .returns(MemberType::String)
                .abstract_member()
                .marker(Marker::with_value("Literal", "\"hello\"")),
        );
        b[broken].methods.push(
            MethodDefinition::new("fail")
                .returns(MemberType::String)
                .abstract_member(),
        );
        b.build().unwrap()
    }

    fn cache() -> SynthesisCache<StrategyBuilder> {
        SynthesisCache::new(StrategyBuilder::new().strategy(AnnotatedStrategy::new("Literal")))
    }

    #[test]
    fn test_hit_returns_same_implementation() {
        let catalog = catalog();
        let greeter = catalog.find_type("Greeter").unwrap();
        let cache = cache();

        let first = cache.get(&greeter).unwrap();
        let second = cache.get(&greeter).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let stats = cache.statistics();
        assert_eq!(stats.builds, 1);
        assert_eq!(stats.synthesis.hits, 1);
        assert_eq!(stats.synthesis.misses, 1);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let catalog = catalog();
        let broken = catalog.find_type("Broken").unwrap();
        let cache = cache();

        assert!(cache.get(&broken).is_err());
        assert!(cache.is_empty());
        assert!(cache.get(&broken).is_err());
        assert_eq!(cache.metrics().builds(), 0);
        assert_eq!(cache.statistics().synthesis.misses, 2);
    }

    #[test]
    fn test_purge_forces_rebuild() {
        let catalog = catalog();
        let greeter = catalog.find_type("Greeter").unwrap();
        let cache = cache();

        let before = cache.get(&greeter).unwrap();
        Factory::purge(&cache);
        assert!(cache.is_empty());
        let after = cache.get(&greeter).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.wiring(), after.wiring());
        assert_eq!(cache.metrics().builds(), 2);
    }

    #[test]
    fn test_get_locked_composes_with_exposed_lock() {
        let catalog = catalog();
        let greeter = catalog.find_type("Greeter").unwrap();
        let cache = cache();

        let mut tables = cache.lock().write();
        let implementation = cache.get_locked(&mut tables, &greeter).unwrap();
        assert!(tables.implementation(&greeter).is_some());
        drop(tables);
        assert!(Arc::ptr_eq(&implementation, &cache.get(&greeter).unwrap()));
    }

    #[test]
    fn test_get_locked_rejects_foreign_tables() {
        let catalog = catalog();
        let greeter = catalog.find_type("Greeter").unwrap();
        let cache = cache();
        let foreign = RwLock::new(CacheTables::default());

        for _ in 0..2 {
            let err = cache
                .get_locked(&mut foreign.write(), &greeter)
                .unwrap_err();
            assert_eq!(err, GenerationError::ForeignLock("Greeter".into()));
        }
        assert_eq!(cache.metrics().builds(), 0);
        assert!(foreign.read().implementation(&greeter).is_none());

        cache.get(&greeter).unwrap();
        assert_eq!(cache.metrics().builds(), 1);
        assert_eq!(cache.statistics().synthesis.misses, 1);
    }
}
