use crate::utils::sync::{AtomicU64, Ordering};
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct CacheStat {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub size: usize,
}

impl CacheStat {
    pub fn new(hits: u64, misses: u64, size: usize) -> Self {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        Self {
            hits,
            misses,
            hit_rate,
            size,
        }
    }
}

impl std::fmt::Display for CacheStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hits: {:>8}, misses: {:>8}, hit_rate: {:>6.2}%, size: {:>8}",
            self.hits,
            self.misses,
            self.hit_rate * 100.0,
            self.size
        )
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub synthesis: CacheStat,
    pub instance: CacheStat,
    /// Builder invocations that produced a stored implementation.
    pub builds: u64,
    /// Instances constructed and then dropped because the key was already filled.
    pub discarded: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cache Statistics:")?;
        writeln!(f, "  Synthesis Cache:  {}", self.synthesis)?;
        writeln!(f, "  Instance Cache:   {}", self.instance)?;
        writeln!(f, "  Builds:           {:>8}", self.builds)?;
        writeln!(f, "  Discarded:        {:>8}", self.discarded)?;
        Ok(())
    }
}

/// Cache counters.
///
/// All counters use `Ordering::Relaxed`: they are independent and never used to
/// order other memory operations.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub synthesis_hits: AtomicU64,
    pub synthesis_misses: AtomicU64,
    pub instance_hits: AtomicU64,
    pub instance_misses: AtomicU64,
    pub builds: AtomicU64,
    pub discarded_instances: AtomicU64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_synthesis_hit(&self) {
        self.synthesis_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_synthesis_miss(&self) {
        self.synthesis_misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_instance_hit(&self) {
        self.instance_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_instance_miss(&self) {
        self.instance_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_build(&self) {
        self.builds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded_instance(&self) {
        self.discarded_instances.fetch_add(1, Ordering::Relaxed);
    }

    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, implementations: usize, instances: usize) -> CacheStats {
        CacheStats {
            synthesis: CacheStat::new(
                self.synthesis_hits.load(Ordering::Relaxed),
                self.synthesis_misses.load(Ordering::Relaxed),
                implementations,
            ),
            instance: CacheStat::new(
                self.instance_hits.load(Ordering::Relaxed),
                self.instance_misses.load(Ordering::Relaxed),
                instances,
            ),
            builds: self.builds(),
            discarded: self.discarded_instances.load(Ordering::Relaxed),
        }
    }
}
