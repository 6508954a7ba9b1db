//! Layout algorithm registry.

use crate::engine::LayoutScope;
use crate::error::{AlgorithmError, ConfigurationConflict};
use crate::fixed::FixedMetaDataProvider;
use crate::model::LayoutGraph;
use crate::progress::ProgressMonitor;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

/// A layout algorithm.
///
/// `layout` positions the direct children of every container in `scope.containers` (in
/// that order) and sizes those containers. Nested scopes have already been laid out.
pub trait LayoutProvider: Send + Sync {
    fn layout(
        &self,
        graph: &mut LayoutGraph,
        scope: &LayoutScope,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<(), AlgorithmError>;

    /// Checks the scope's configuration before any layout work runs.
    fn validate(
        &self,
        _graph: &LayoutGraph,
        _scope: &LayoutScope,
    ) -> Result<(), ConfigurationConflict> {
        Ok(())
    }

    /// Whether one run may cover nested containers (`INCLUDE_CHILDREN`).
    fn supports_hierarchy(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct LayoutAlgorithmData {
    pub id: String,
    pub name: String,
    pub description: String,
    pub provider: Arc<dyn LayoutProvider>,
}

impl fmt::Debug for LayoutAlgorithmData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutAlgorithmData")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("supports_hierarchy", &self.provider.supports_hierarchy())
            .finish()
    }
}

/// Contributes algorithms to a registry.
pub trait LayoutMetaDataProvider {
    fn algorithms(&self) -> Vec<LayoutAlgorithmData>;
}

#[derive(Debug)]
pub struct AlgorithmRegistry {
    algorithms: RwLock<Vec<LayoutAlgorithmData>>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlgorithmRegistry {
    /// A registry holding only the built-in `orca.fixed` algorithm.
    pub fn new() -> Self {
        let registry = Self {
            algorithms: RwLock::new(Vec::new()),
        };
        registry.register_layout_meta_data_providers(&[&FixedMetaDataProvider]);
        registry
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static AlgorithmRegistry {
        static GLOBAL: OnceLock<AlgorithmRegistry> = OnceLock::new();
        GLOBAL.get_or_init(AlgorithmRegistry::new)
    }

    /// Registers every algorithm of `providers`. Ids that are already known are skipped, so
    /// repeated registration is harmless. Returns the number of newly added algorithms.
    pub fn register_layout_meta_data_providers(
        &self,
        providers: &[&dyn LayoutMetaDataProvider],
    ) -> usize {
        let mut algorithms = self
            .algorithms
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut added = 0;
        for provider in providers {
            for data in provider.algorithms() {
                if algorithms.iter().any(|a| a.id == data.id) {
                    continue;
                }
                debug!(algorithm = %data.id, "registered layout algorithm");
                algorithms.push(data);
                added += 1;
            }
        }
        added
    }

    /// Looks up an algorithm by exact id, then by a unique `.{name}` suffix
    /// (`"layered"` finds `orca.layered`).
    pub fn resolve(&self, name: &str) -> Option<LayoutAlgorithmData> {
        let algorithms = self
            .algorithms
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(data) = algorithms.iter().find(|a| a.id == name) {
            return Some(data.clone());
        }
        let suffix = format!(".{name}");
        let mut matches = algorithms.iter().filter(|a| a.id.ends_with(&suffix));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resolve(id).is_some()
    }

    /// Registered ids in registration order.
    pub fn algorithm_ids(&self) -> Vec<String> {
        self.algorithms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|a| a.id.clone())
            .collect()
    }
}
