//! Per-request state backing request-scoped resolution.

use crate::binding::Binding;
use crate::core::InjectionKey;
use crate::provider::Instance;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

#[derive(Default)]
struct ContextState {
  overrides: HashMap<InjectionKey, Arc<Binding>>,
  instances: HashMap<u64, Instance>,
}

/// The cache of one in-flight request.
///
/// Request-scoped instances are stored here keyed by binding, together with
/// any per-request overrides installed through
/// [`Resolver::update_context`](crate::Resolver::update_context). A context is
/// never shared between requests; it is cleared when dropped.
///
/// The lock is only taken around map reads and writes, never while a provider
/// runs, so providers are free to resolve more request-scoped dependencies.
pub struct RequestContext {
  id: u64,
  state: Mutex<ContextState>,
}

impl RequestContext {
  pub fn new() -> Self {
    static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);
    Self {
      id: NEXT_REQUEST.fetch_add(1, Ordering::Relaxed),
      state: Mutex::new(ContextState::default()),
    }
  }

  /// Sequential id of this request, for logs.
  pub fn id(&self) -> u64 {
    self.id
  }

  /// Number of request-scoped instances cached so far.
  pub fn len(&self) -> usize {
    self.state.lock().instances.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drops every cached instance and override.
  pub fn clear(&self) {
    let mut state = self.state.lock();
    state.instances.clear();
    state.overrides.clear();
  }

  pub(crate) fn override_for(&self, key: &InjectionKey) -> Option<Arc<Binding>> {
    self.state.lock().overrides.get(key).cloned()
  }

  pub(crate) fn set_override(&self, binding: Arc<Binding>) {
    trace!(request_id = self.id, interface = %binding.key(), "overriding binding for request");
    self.state.lock().overrides.insert(binding.key().clone(), binding);
  }

  pub(crate) fn cached(&self, binding_id: u64) -> Option<Instance> {
    self.state.lock().instances.get(&binding_id).cloned()
  }

  /// Stores `instance` unless another one got there first, and returns the
  /// instance that ends up cached.
  pub(crate) fn store(&self, binding_id: u64, instance: Instance) -> Instance {
    self
      .state
      .lock()
      .instances
      .entry(binding_id)
      .or_insert(instance)
      .clone()
  }
}

impl Default for RequestContext {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for RequestContext {
  fn drop(&mut self) {
    let state = self.state.get_mut();
    trace!(
      request_id = self.id,
      instances = state.instances.len(),
      overrides = state.overrides.len(),
      "tearing down request context"
    );
    state.instances.clear();
    state.overrides.clear();
  }
}

impl fmt::Debug for RequestContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("RequestContext")
      .field("id", &self.id)
      .field("instances", &state.instances.len())
      .field("overrides", &state.overrides.len())
      .finish()
  }
}
