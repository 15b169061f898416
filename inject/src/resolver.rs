//! Per-request resolution.

use crate::binding::Binding;
use crate::container::Container;
use crate::context::RequestContext;
use crate::core::{InjectionKey, ResolutionGuard};
use crate::error::{Error, Result};
use crate::provider::{Injectable, Instance, Provider};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Resolves interfaces for one request.
///
/// A resolver pairs a container with the request's [`RequestContext`]. It is
/// cheap to create and is handed to every provider, so constructors resolve
/// their own dependencies through it. The context is borrowed, never owned:
/// the request pipeline decides when it ends.
pub struct Resolver<'r> {
  container: Container,
  context: &'r RequestContext,
}

impl<'r> Resolver<'r> {
  pub fn new(container: &Container, context: &'r RequestContext) -> Self {
    Self {
      container: container.clone(),
      context,
    }
  }

  /// The container resolution starts from.
  pub fn container(&self) -> &Container {
    &self.container
  }

  pub fn context(&self) -> &'r RequestContext {
    self.context
  }

  pub fn request_id(&self) -> u64 {
    self.context.id()
  }

  /// Resolves the unnamed binding of `I`.
  pub fn get<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>> {
    self.get_typed(InjectionKey::of::<I>())
  }

  /// Resolves the binding of `I` registered under `name`.
  pub fn get_named<I: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<I>> {
    self.get_typed(InjectionKey::named::<I>(name))
  }

  /// Resolves `T`, synthesizing a transient binding when nothing is
  /// registered and the container allows auto-binding.
  pub fn get_injectable<T: Injectable>(&self) -> Result<Arc<T>> {
    let key = InjectionKey::of::<T>();
    let binding = match self.context.override_for(&key) {
      Some(binding) => binding,
      None => self.container.get_binding_auto::<T>()?,
    };
    let instance = self.resolve_binding(&binding)?;
    downcast(&key, instance)
  }

  /// Type-erased resolution of `key`.
  ///
  /// Per-request overrides win over container bindings.
  pub fn get_key(&self, key: &InjectionKey) -> Result<Instance> {
    let binding = match self.context.override_for(key) {
      Some(binding) => binding,
      None => self.container.get_binding(key)?,
    };
    self.resolve_binding(&binding)
  }

  fn get_typed<I: ?Sized + Send + Sync + 'static>(&self, key: InjectionKey) -> Result<Arc<I>> {
    let instance = self.get_key(&key)?;
    downcast(&key, instance)
  }

  fn resolve_binding(&self, binding: &Binding) -> Result<Instance> {
    let _guard = ResolutionGuard::enter(binding.key(), binding.origin(), binding.scope())?;

    // Dependencies of a provider resolve from where it was registered.
    let home = binding.home().unwrap_or_else(|| self.container.clone());
    debug!(
      request_id = self.context.id(),
      interface = %binding.key(),
      scope = ?binding.scope(),
      provider = ?binding.provider(),
      container = %home,
      "resolving"
    );
    let scoped = Resolver {
      container: home,
      context: self.context,
    };
    let instance = binding.scope().strategy().get(binding, &scoped)?;
    debug!(request_id = self.context.id(), interface = %binding.key(), instance = ?instance, "resolved");
    Ok(instance)
  }

  // --- Request Overrides ---

  /// Makes `I` resolve to `value` for the rest of this request, without
  /// touching the container.
  pub fn update_context<I: ?Sized + Send + Sync + 'static>(&self, value: Arc<I>) {
    self.install_override(InjectionKey::of::<I>(), Provider::instance(value));
  }

  /// Owned-value shorthand for [`update_context`](Self::update_context).
  pub fn update_context_value<T: Send + Sync + 'static>(&self, value: T) {
    self.update_context::<T>(Arc::new(value));
  }

  /// Makes `I` resolve through `provider` for the rest of this request. The
  /// provider runs at most once per request.
  pub fn update_context_provider<I: ?Sized + Any>(&self, provider: Provider) -> Result<()> {
    self.update_context_key(InjectionKey::of::<I>(), provider)
  }

  pub fn update_context_key(&self, key: InjectionKey, provider: Provider) -> Result<()> {
    if provider.produces() != key.type_id() {
      return Err(Error::configuration(format!(
        "Cannot override {} with a provider of {}",
        key,
        provider.produces_name()
      )));
    }
    self.install_override(key, provider);
    Ok(())
  }

  fn install_override(&self, key: InjectionKey, provider: Provider) {
    self.context.set_override(Arc::new(Binding::contextual(key, provider)));
  }
}

fn downcast<I: ?Sized + 'static>(key: &InjectionKey, instance: Instance) -> Result<Arc<I>> {
  instance.downcast::<I>().ok_or_else(|| {
    Error::configuration(format!(
      "binding for {} produced an instance of {}",
      key,
      instance.type_name()
    ))
  })
}

impl fmt::Debug for Resolver<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Resolver")
      .field("container", &self.container)
      .field("request_id", &self.context.id())
      .finish()
  }
}
