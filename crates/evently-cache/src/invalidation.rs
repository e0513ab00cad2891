//! Write invalidation.
//!
//! After a create, update, or delete succeeds, the entity's detail key is
//! deleted and every list key of its model is swept. Entity types opt in by
//! implementing [`Invalidatable`] and registering with the
//! [`CacheInvalidator`] at startup; writes to unregistered types leave the
//! cache alone.
//!
//! Failures are logged and counted but never returned: a missed invalidation
//! leaves an entry stale until its TTL, it never fails the write.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::keys::{detail_key, gql_pattern, list_pattern};
use crate::store::{SharedCache, bounded};

/// An entity whose reads are cached under a model name.
pub trait CacheModel {
    /// Model segment of every cache key for this type, e.g. `event`.
    const MODEL_NAME: &'static str;

    /// Identifier used in the detail key.
    fn cache_id(&self) -> String;
}

/// Opt-in capability: writes to this type invalidate its cached reads.
pub trait Invalidatable: CacheModel {
    /// Keys and patterns to clear when the entity with `id` changes.
    fn invalidation_targets(id: &str) -> InvalidationTargets {
        InvalidationTargets {
            keys: vec![detail_key(Self::MODEL_NAME, id)],
            patterns: vec![list_pattern(Self::MODEL_NAME)],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvalidationTargets {
    pub keys: Vec<String>,
    pub patterns: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Created,
    Updated,
    Deleted,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

/// Concrete keys and patterns captured from an entity.
///
/// Computing the plan before a delete keeps the detail key available after
/// the entity itself is gone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub model: &'static str,
    pub id: String,
    pub kind: MutationKind,
    pub targets: InvalidationTargets,
}

/// Outcome of executing a plan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    /// Exact keys that existed and were removed.
    pub keys_deleted: u64,
    /// Entries removed by pattern sweeps.
    pub entries_swept: u64,
    /// Cache calls that failed or timed out.
    pub failures: u64,
}

impl InvalidationReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

type TargetsFn = fn(&str) -> InvalidationTargets;

/// Runs write invalidation for the registered entity types.
#[derive(Clone)]
pub struct CacheInvalidator {
    cache: SharedCache,
    registry: HashMap<&'static str, TargetsFn>,
    sweep_graphql: bool,
    timeout: Duration,
    sweep_timeout: Duration,
}

impl fmt::Debug for CacheInvalidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut models: Vec<_> = self.registry.keys().collect();
        models.sort();
        f.debug_struct("CacheInvalidator")
            .field("models", &models)
            .field("sweep_graphql", &self.sweep_graphql)
            .field("timeout", &self.timeout)
            .field("sweep_timeout", &self.sweep_timeout)
            .finish_non_exhaustive()
    }
}

pub struct CacheInvalidatorBuilder {
    cache: SharedCache,
    registry: HashMap<&'static str, TargetsFn>,
    sweep_graphql: bool,
    timeout: Duration,
    sweep_timeout: Duration,
}

impl CacheInvalidatorBuilder {
    /// Opts `E` in to invalidation.
    pub fn register<E: Invalidatable>(mut self) -> Self {
        self.registry
            .insert(E::MODEL_NAME, E::invalidation_targets as TargetsFn);
        self
    }

    /// Also sweep cached GraphQL operations on every write.
    pub fn sweep_graphql(mut self, enabled: bool) -> Self {
        self.sweep_graphql = enabled;
        self
    }

    /// Upper bound for each exact-key delete.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upper bound for each pattern sweep.
    ///
    /// A sweep walks the whole keyspace, so it gets far more room than a
    /// single-key call.
    pub fn sweep_timeout(mut self, timeout: Duration) -> Self {
        self.sweep_timeout = timeout;
        self
    }

    pub fn build(self) -> CacheInvalidator {
        CacheInvalidator {
            cache: self.cache,
            registry: self.registry,
            sweep_graphql: self.sweep_graphql,
            timeout: self.timeout,
            sweep_timeout: self.sweep_timeout,
        }
    }
}

impl CacheInvalidator {
    pub fn builder(cache: SharedCache) -> CacheInvalidatorBuilder {
        CacheInvalidatorBuilder {
            cache,
            registry: HashMap::new(),
            sweep_graphql: false,
            timeout: Duration::from_millis(250),
            sweep_timeout: Duration::from_secs(5),
        }
    }

    pub fn is_registered(&self, model: &str) -> bool {
        self.registry.contains_key(model)
    }

    /// Captures what to invalidate for `entity`.
    ///
    /// Returns `None` when the entity's type has not opted in.
    pub fn plan<E: CacheModel>(&self, entity: &E, kind: MutationKind) -> Option<InvalidationPlan> {
        let targets_for = self.registry.get(E::MODEL_NAME)?;
        let id = entity.cache_id();

        let mut targets = targets_for(&id);
        if self.sweep_graphql {
            targets.patterns.push(gql_pattern());
        }

        Some(InvalidationPlan {
            model: E::MODEL_NAME,
            id,
            kind,
            targets,
        })
    }

    /// Deletes every key and sweeps every pattern in `plan`.
    #[instrument(
        skip(self, plan),
        fields(cache.model = plan.model, cache.id = %plan.id, cache.mutation = plan.kind.as_str())
    )]
    pub async fn execute(&self, plan: &InvalidationPlan) -> InvalidationReport {
        let mut report = InvalidationReport::default();

        for key in &plan.targets.keys {
            match bounded(self.timeout, "DEL", self.cache.delete(key)).await {
                Ok(removed) => report.keys_deleted += u64::from(removed),
                Err(e) => {
                    warn!(error = %e, cache.key = %key, "Failed to invalidate cache key");
                    report.failures += 1;
                }
            }
        }

        for pattern in &plan.targets.patterns {
            match bounded(
                self.sweep_timeout,
                "SCAN_DEL",
                self.cache.delete_matching(pattern),
            ).await {
                Ok(swept) => report.entries_swept += swept,
                Err(e) => {
                    warn!(error = %e, cache.pattern = %pattern, "Failed to sweep cache pattern");
                    report.failures += 1;
                }
            }
        }

        counter!("cache_invalidations_total", "model" => plan.model).increment(1);
        if !report.is_clean() {
            counter!("cache_invalidation_failures_total", "model" => plan.model)
                .increment(report.failures);
        }

        debug!(
            cache.keys_deleted = report.keys_deleted,
            cache.entries_swept = report.entries_swept,
            cache.failures = report.failures,
            "Cache invalidation complete"
        );

        report
    }

    /// Plans and executes in one step, for writes where the entity's state is
    /// still available afterwards (create and update).
    pub async fn after_write<E: CacheModel>(
        &self,
        entity: &E,
        kind: MutationKind,
    ) -> Option<InvalidationReport> {
        let plan = self.plan(entity, kind)?;
        Some(self.execute(&plan).await)
    }
}
