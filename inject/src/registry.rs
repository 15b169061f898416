//! The per-container map from interface to binding.

use crate::binding::Binding;
use crate::core::InjectionKey;
use dashmap::DashMap;
use std::sync::Arc;

/// One level of the binding hierarchy.
///
/// Lookups clone the `Arc<Binding>` out and release the shard lock right away,
/// so a provider that resolves further dependencies never runs while holding
/// a registry lock.
#[derive(Default)]
pub(crate) struct BindingRegistry {
  bindings: DashMap<InjectionKey, Arc<Binding>>,
}

impl BindingRegistry {
  /// Stores `binding`, returning whatever it replaced.
  pub(crate) fn insert(&self, binding: Arc<Binding>) -> Option<Arc<Binding>> {
    self.bindings.insert(binding.key().clone(), binding)
  }

  pub(crate) fn get(&self, key: &InjectionKey) -> Option<Arc<Binding>> {
    self.bindings.get(key).map(|entry| Arc::clone(entry.value()))
  }

  pub(crate) fn contains(&self, key: &InjectionKey) -> bool {
    self.bindings.contains_key(key)
  }

  pub(crate) fn len(&self) -> usize {
    self.bindings.len()
  }

  pub(crate) fn keys(&self) -> Vec<InjectionKey> {
    self.bindings.iter().map(|entry| entry.key().clone()).collect()
  }
}
