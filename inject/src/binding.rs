use crate::container::{Container, ContainerInner};
use crate::core::{next_id, InjectionKey, CONTEXT_ORIGIN};
use crate::provider::{Instance, Provider};
use crate::scope::ScopeKind;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Weak;

/// The association of an interface with a provider and a scope.
///
/// A binding remembers the container it was registered in (its *home*). The
/// provider's own dependencies are resolved from there, which keeps a module's
/// private providers private even after one of its services is exported.
///
/// The singleton slot also lives here: whoever can see this binding (children
/// through parent lookup, importers through module exports) shares the one
/// instance stored in it.
pub struct Binding {
  id: u64,
  key: InjectionKey,
  provider: Provider,
  scope: ScopeKind,
  home: Weak<ContainerInner>,
  origin: u64,
  singleton: OnceCell<Instance>,
}

impl Binding {
  pub(crate) fn new(key: InjectionKey, provider: Provider, scope: ScopeKind, home: &Container) -> Self {
    Self {
      id: next_id(),
      key,
      provider,
      scope,
      home: home.downgrade(),
      origin: home.id(),
      singleton: OnceCell::new(),
    }
  }

  /// A binding that only exists inside one request context.
  pub(crate) fn contextual(key: InjectionKey, provider: Provider) -> Self {
    Self {
      id: next_id(),
      key,
      provider,
      scope: ScopeKind::Request,
      home: Weak::new(),
      origin: CONTEXT_ORIGIN,
      singleton: OnceCell::new(),
    }
  }

  /// Process-unique id; request-scoped caches are keyed by it.
  pub fn id(&self) -> u64 {
    self.id
  }

  pub fn key(&self) -> &InjectionKey {
    &self.key
  }

  pub fn provider(&self) -> &Provider {
    &self.provider
  }

  pub fn scope(&self) -> ScopeKind {
    self.scope
  }

  /// Whether a singleton instance has already been stored.
  pub fn is_resolved(&self) -> bool {
    self.singleton.get().is_some()
  }

  /// The container this binding was registered in, if it is still alive.
  /// Context overrides have no home.
  pub fn home(&self) -> Option<Container> {
    self.home.upgrade().map(Container::from_inner)
  }

  pub(crate) fn origin(&self) -> u64 {
    self.origin
  }

  pub(crate) fn singleton_slot(&self) -> &OnceCell<Instance> {
    &self.singleton
  }
}

impl fmt::Debug for Binding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Binding")
      .field("id", &self.id)
      .field("key", &self.key)
      .field("provider", &self.provider)
      .field("scope", &self.scope)
      .field("resolved", &self.is_resolved())
      .finish()
  }
}
