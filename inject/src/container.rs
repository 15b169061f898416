//! The main `Container` struct and its associated methods.

use crate::binding::Binding;
use crate::builder::ContainerBuilder;
use crate::config::ContainerConfig;
use crate::context::RequestContext;
use crate::core::{next_id, InjectionKey};
use crate::error::{Error, Result};
use crate::provider::{Implements, Injectable, Provider};
use crate::registry::BindingRegistry;
use crate::resolver::Resolver;
use crate::scope::ScopeKind;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, debug_span, trace};

pub(crate) struct ContainerInner {
  id: u64,
  config: ContainerConfig,
  registry: BindingRegistry,
  parent: Option<Weak<ContainerInner>>,
  // Module containers whose exported bindings were adopted here.
  retained: Mutex<Vec<Container>>,
}

/// The Inversion of Control (IoC) container.
///
/// Holds one level of bindings and an optional, non-owning link to a parent
/// container that is searched when a key is missing locally. `Container` is a
/// cheap handle: clones share the same registry.
///
/// Registration takes `&self` and is thread-safe, but the intended life cycle
/// is to register everything at startup and treat the container as read-only
/// once requests are being served.
#[derive(Clone)]
pub struct Container {
  inner: Arc<ContainerInner>,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Container {
  /// Creates a new, empty root `Container` with the default configuration.
  pub fn new() -> Self {
    ContainerBuilder::new().build()
  }

  pub fn builder() -> ContainerBuilder {
    ContainerBuilder::new()
  }

  pub fn with_config(config: ContainerConfig) -> Self {
    ContainerBuilder::from_config(config).build()
  }

  /// Creates a child that falls back to `self` for missing keys.
  pub fn create_child(&self) -> Container {
    ContainerBuilder::new().parent(self).build()
  }

  pub(crate) fn from_parts(config: ContainerConfig, parent: Option<&Container>) -> Self {
    Self {
      inner: Arc::new(ContainerInner {
        id: next_id(),
        config,
        registry: BindingRegistry::default(),
        parent: parent.map(Container::downgrade),
        retained: Mutex::new(Vec::new()),
      }),
    }
  }

  pub(crate) fn from_inner(inner: Arc<ContainerInner>) -> Self {
    Self { inner }
  }

  pub(crate) fn downgrade(&self) -> Weak<ContainerInner> {
    Arc::downgrade(&self.inner)
  }

  pub fn id(&self) -> u64 {
    self.inner.id
  }

  pub fn name(&self) -> Option<&str> {
    self.inner.config.name.as_deref()
  }

  pub fn config(&self) -> &ContainerConfig {
    &self.inner.config
  }

  /// The parent container, if there is one and it is still alive.
  pub fn parent(&self) -> Option<Container> {
    self
      .inner
      .parent
      .as_ref()
      .and_then(Weak::upgrade)
      .map(Container::from_inner)
  }

  /// Whether both handles point at the same container.
  pub fn ptr_eq(&self, other: &Container) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  // --- PRIVATE HELPERS ---

  fn insert(&self, key: InjectionKey, provider: Provider, scope: ScopeKind) {
    trace!(container = %self, interface = %key, ?scope, ?provider, "registering binding");
    let binding = Arc::new(Binding::new(key, provider, scope, self));
    if let Some(previous) = self.inner.registry.insert(binding) {
      debug!(container = %self, interface = %previous.key(), "binding overwritten");
    }
  }

  pub(crate) fn adopt(&self, binding: Arc<Binding>, source: &Container) {
    trace!(container = %self, interface = %binding.key(), source = %source, "adopting exported binding");
    self.inner.registry.insert(binding);
    let mut retained = self.inner.retained.lock();
    if !retained.iter().any(|kept| kept.ptr_eq(source)) {
      retained.push(source.clone());
    }
  }

  // --- PUBLIC API ---

  // --- Generic Registration ---

  /// Binds interface `I` to `provider` with the given lifetime.
  ///
  /// Fails with [`Error::Configuration`] if the provider does not produce `I`.
  pub fn register<I: ?Sized + Any>(&self, provider: Provider, scope: ScopeKind) -> Result<()> {
    self.register_key(InjectionKey::of::<I>(), provider, scope)
  }

  pub fn register_named<I: ?Sized + Any>(&self, name: &str, provider: Provider, scope: ScopeKind) -> Result<()> {
    self.register_key(InjectionKey::named::<I>(name), provider, scope)
  }

  /// Type-erased registration, used by module provider configs.
  pub fn register_key(&self, key: InjectionKey, provider: Provider, scope: ScopeKind) -> Result<()> {
    if provider.produces() != key.type_id() {
      return Err(Error::configuration(format!(
        "Cannot register {} for {}",
        provider.produces_name(),
        key
      )));
    }
    if let Provider::Alias(alias) = &provider {
      if *alias.target() == key {
        return Err(Error::configuration(format!("{} cannot be an alias of itself", key)));
      }
    }
    self.insert(key, provider, scope);
    Ok(())
  }

  // --- Instance Registration ---

  /// Registers `instance` as the singleton for its own type.
  pub fn add_instance<T: Send + Sync + 'static>(&self, instance: T) {
    self.insert(InjectionKey::of::<T>(), Provider::value(instance), ScopeKind::Singleton);
  }

  pub fn add_instance_with_name<T: Send + Sync + 'static>(&self, name: &str, instance: T) {
    self.insert(InjectionKey::named::<T>(name), Provider::value(instance), ScopeKind::Singleton);
  }

  /// Registers an existing shared value as the singleton for interface `I`.
  pub fn add_instance_as<I: ?Sized + Send + Sync + 'static>(&self, instance: Arc<I>) {
    self.insert(InjectionKey::of::<I>(), Provider::instance(instance), ScopeKind::Singleton);
  }

  // --- Class Registration ---

  pub fn add_singleton<I, C>(&self)
  where
    I: ?Sized + Send + Sync + 'static,
    C: Injectable + Implements<I>,
  {
    self.insert(InjectionKey::of::<I>(), Provider::class::<I, C>(), ScopeKind::Singleton);
  }

  pub fn add_transient<I, C>(&self)
  where
    I: ?Sized + Send + Sync + 'static,
    C: Injectable + Implements<I>,
  {
    self.insert(InjectionKey::of::<I>(), Provider::class::<I, C>(), ScopeKind::Transient);
  }

  /// Binds `I` to `C` with one instance per request.
  pub fn add_scoped<I, C>(&self)
  where
    I: ?Sized + Send + Sync + 'static,
    C: Injectable + Implements<I>,
  {
    self.insert(InjectionKey::of::<I>(), Provider::class::<I, C>(), ScopeKind::Request);
  }

  pub fn add_exact_singleton<C: Injectable>(&self) {
    self.add_singleton::<C, C>();
  }

  pub fn add_exact_transient<C: Injectable>(&self) {
    self.add_transient::<C, C>();
  }

  pub fn add_exact_scoped<C: Injectable>(&self) {
    self.add_scoped::<C, C>();
  }

  // --- Factory Registration ---

  pub fn add_singleton_factory<I, F>(&self, factory: F)
  where
    I: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<Arc<I>> + Send + Sync + 'static,
  {
    self.insert(InjectionKey::of::<I>(), Provider::factory(factory), ScopeKind::Singleton);
  }

  pub fn add_transient_factory<I, F>(&self, factory: F)
  where
    I: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<Arc<I>> + Send + Sync + 'static,
  {
    self.insert(InjectionKey::of::<I>(), Provider::factory(factory), ScopeKind::Transient);
  }

  pub fn add_scoped_factory<I, F>(&self, factory: F)
  where
    I: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<Arc<I>> + Send + Sync + 'static,
  {
    self.insert(InjectionKey::of::<I>(), Provider::factory(factory), ScopeKind::Request);
  }

  // --- Alias Registration ---

  /// Makes `I` resolve through the binding of `C`, keeping `C`'s lifetime.
  pub fn add_alias<I, C>(&self) -> Result<()>
  where
    I: ?Sized + Send + Sync + 'static,
    C: ?Sized + Implements<I>,
  {
    self.register::<I>(Provider::alias::<I, C>(), ScopeKind::Transient)
  }

  // --- Lookup ---

  /// Finds the binding for `key` here or in the nearest ancestor that has one.
  pub fn get_binding(&self, key: &InjectionKey) -> Result<Arc<Binding>> {
    self.find_binding(key).ok_or_else(|| Error::not_found(key))
  }

  /// Like [`get_binding`](Self::get_binding), but when auto-binding is
  /// enabled an unregistered `T` gets a transient binding synthesized on the
  /// spot. The synthesized binding is not stored.
  pub fn get_binding_auto<T: Injectable>(&self) -> Result<Arc<Binding>> {
    let key = InjectionKey::of::<T>();
    if let Some(binding) = self.find_binding(&key) {
      return Ok(binding);
    }
    if !self.config().auto_bind {
      return Err(Error::not_found(&key));
    }
    trace!(container = %self, interface = %key, "auto-binding transient");
    Ok(Arc::new(Binding::new(key, Provider::class::<T, T>(), ScopeKind::Transient, self)))
  }

  fn find_binding(&self, key: &InjectionKey) -> Option<Arc<Binding>> {
    let mut current = Some(self.clone());
    while let Some(container) = current {
      if let Some(binding) = container.inner.registry.get(key) {
        return Some(binding);
      }
      current = container.parent();
    }
    None
  }

  /// The binding registered at this level only, ignoring ancestors.
  pub fn local_binding(&self, key: &InjectionKey) -> Option<Arc<Binding>> {
    self.inner.registry.get(key)
  }

  pub fn has_binding(&self, key: &InjectionKey) -> bool {
    self.find_binding(key).is_some()
  }

  pub fn has_local_binding(&self, key: &InjectionKey) -> bool {
    self.inner.registry.contains(key)
  }

  pub fn is_registered<I: ?Sized + Any>(&self) -> bool {
    self.has_binding(&InjectionKey::of::<I>())
  }

  /// Number of bindings at this level.
  pub fn binding_count(&self) -> usize {
    self.inner.registry.len()
  }

  /// Keys bound at this level.
  pub fn keys(&self) -> Vec<InjectionKey> {
    self.inner.registry.keys()
  }

  // --- Resolution ---

  /// Creates a resolver for one request.
  pub fn create_resolver<'r>(&self, context: &'r RequestContext) -> Resolver<'r> {
    Resolver::new(self, context)
  }

  /// Runs `handler` inside a fresh request context.
  ///
  /// The context, and every request-scoped instance in it, is torn down when
  /// this returns, whether `handler` succeeded, failed or panicked.
  pub fn run_in_request<R>(&self, handler: impl FnOnce(&Resolver<'_>) -> R) -> R {
    let context = RequestContext::new();
    let span = debug_span!("request", request_id = context.id(), container = %self);
    let _entered = span.enter();
    let resolver = Resolver::new(self, &context);
    handler(&resolver)
  }

  /// Resolves `I` outside of any real request.
  ///
  /// Request-scoped instances produced along the way live only for this call.
  pub fn get<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>> {
    self.run_in_request(|resolver| resolver.get::<I>())
  }

  pub fn get_named<I: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<I>> {
    self.run_in_request(|resolver| resolver.get_named::<I>(name))
  }
}

impl fmt::Display for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.name() {
      Some(name) => f.write_str(name),
      None => write!(f, "container#{}", self.id()),
    }
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("id", &self.id())
      .field("name", &self.name())
      .field("auto_bind", &self.config().auto_bind)
      .field("bindings", &self.binding_count())
      .field("has_parent", &self.inner.parent.is_some())
      .finish()
  }
}
