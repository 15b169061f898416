//! Module declarations.
//!
//! A module is a unit of registration: it declares the providers it owns, the
//! modules it imports and the keys it exports. Declarations are plain values
//! built with a builder API and validated once by the
//! [`ModuleInstaller`](crate::ModuleInstaller) at startup.

use crate::container::Container;
use crate::core::InjectionKey;
use crate::error::Result;
use crate::provider::{Implements, Injectable, Provider};
use crate::resolver::Resolver;
use crate::scope::ScopeKind;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// What the surrounding framework does with a provider.
///
/// The container treats every role the same way; the role only lets the
/// routing and rendering layers enumerate, say, all controllers of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProviderRole {
  #[default]
  Service,
  Controller,
  ExceptionHandler,
  Middleware,
  TemplateFilter,
}

/// One provider declared by a module.
///
/// Defaults to singleton scope, the service role and no export.
#[derive(Clone)]
pub struct ProviderConfig {
  key: InjectionKey,
  provider: Provider,
  scope: ScopeKind,
  role: ProviderRole,
  export: bool,
}

impl ProviderConfig {
  pub fn new(key: InjectionKey, provider: Provider) -> Self {
    Self {
      key,
      provider,
      scope: ScopeKind::Singleton,
      role: ProviderRole::Service,
      export: false,
    }
  }

  /// Binds `I` to the injectable type `C`.
  pub fn use_class<I, C>() -> Self
  where
    I: ?Sized + Send + Sync + 'static,
    C: Injectable + Implements<I>,
  {
    Self::new(InjectionKey::of::<I>(), Provider::class::<I, C>())
  }

  /// Binds the value's own type to `value`.
  pub fn use_value<T: Send + Sync + 'static>(value: T) -> Self {
    Self::new(InjectionKey::of::<T>(), Provider::value(value))
  }

  /// Binds `I` to an existing shared value.
  pub fn use_instance<I: ?Sized + Send + Sync + 'static>(value: Arc<I>) -> Self {
    Self::new(InjectionKey::of::<I>(), Provider::instance(value))
  }

  pub fn use_factory<I, F>(factory: F) -> Self
  where
    I: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<Arc<I>> + Send + Sync + 'static,
  {
    Self::new(InjectionKey::of::<I>(), Provider::factory(factory))
  }

  /// Makes `I` resolve through the binding of `C`. Aliases default to
  /// transient scope so that `C`'s own lifetime decides caching.
  pub fn use_alias<I, C>() -> Self
  where
    I: ?Sized + Send + Sync + 'static,
    C: ?Sized + Implements<I>,
  {
    Self::new(InjectionKey::of::<I>(), Provider::alias::<I, C>()).scope(ScopeKind::Transient)
  }

  pub fn scope(mut self, scope: ScopeKind) -> Self {
    self.scope = scope;
    self
  }

  pub fn role(mut self, role: ProviderRole) -> Self {
    self.role = role;
    self
  }

  /// Registers the provider under `name`.
  pub fn named(mut self, name: &str) -> Self {
    self.key = self.key.with_name(name);
    self
  }

  /// Also publishes the provider to the importing module.
  pub fn exported(mut self) -> Self {
    self.export = true;
    self
  }

  pub fn key(&self) -> &InjectionKey {
    &self.key
  }

  pub fn provider(&self) -> &Provider {
    &self.provider
  }

  pub fn scope_kind(&self) -> ScopeKind {
    self.scope
  }

  pub fn provider_role(&self) -> ProviderRole {
    self.role
  }

  pub fn is_exported(&self) -> bool {
    self.export
  }
}

impl fmt::Debug for ProviderConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ProviderConfig")
      .field("key", &self.key)
      .field("provider", &self.provider)
      .field("scope", &self.scope)
      .field("role", &self.role)
      .field("export", &self.export)
      .finish()
  }
}

/// A reference from one module to another.
#[derive(Clone)]
pub enum ModuleRef {
  /// The module itself.
  Module(Arc<dyn Module>),
  /// A module declared elsewhere in the same tree, by name. Lets two modules
  /// refer to each other's position in the tree without owning each other.
  Forward(String),
}

impl fmt::Debug for ModuleRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ModuleRef::Module(module) => write!(f, "Module({})", module.declare().name()),
      ModuleRef::Forward(name) => write!(f, "Forward({})", name),
    }
  }
}

/// The typed description of a module.
#[derive(Debug, Clone)]
pub struct ModuleDeclaration {
  name: String,
  providers: Vec<ProviderConfig>,
  exports: Vec<InjectionKey>,
  imports: Vec<ModuleRef>,
}

impl ModuleDeclaration {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      providers: Vec::new(),
      exports: Vec::new(),
      imports: Vec::new(),
    }
  }

  pub fn provider(mut self, config: ProviderConfig) -> Self {
    self.providers.push(config);
    self
  }

  /// Declares `C` as a singleton controller of this module.
  pub fn controller<C: Injectable>(self) -> Self {
    self.provider(ProviderConfig::use_class::<C, C>().role(ProviderRole::Controller))
  }

  /// Exports the unnamed binding of `I`, which may be provided by this module
  /// or re-exported from one of its imports.
  pub fn export<I: ?Sized + Any>(self) -> Self {
    self.export_key(InjectionKey::of::<I>())
  }

  pub fn export_key(mut self, key: InjectionKey) -> Self {
    self.exports.push(key);
    self
  }

  pub fn import(mut self, module: impl Module) -> Self {
    self.imports.push(ModuleRef::Module(Arc::new(module)));
    self
  }

  pub fn import_shared(mut self, module: Arc<dyn Module>) -> Self {
    self.imports.push(ModuleRef::Module(module));
    self
  }

  pub fn import_forward(mut self, name: impl Into<String>) -> Self {
    self.imports.push(ModuleRef::Forward(name.into()));
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn providers(&self) -> &[ProviderConfig] {
    &self.providers
  }

  pub fn imports(&self) -> &[ModuleRef] {
    &self.imports
  }

  /// Every exported key: the explicit exports followed by providers marked
  /// as exported, without duplicates.
  pub fn exported_keys(&self) -> Vec<InjectionKey> {
    let mut keys = self.exports.clone();
    for config in self.providers.iter().filter(|config| config.export) {
      if !keys.contains(&config.key) {
        keys.push(config.key.clone());
      }
    }
    keys
  }

  // Two declarations under one name must describe the same module.
  pub(crate) fn same_shape(&self, other: &ModuleDeclaration) -> bool {
    let provider_keys = |decl: &ModuleDeclaration| decl.providers.iter().map(|p| p.key.clone()).collect::<Vec<_>>();
    let import_names = |decl: &ModuleDeclaration| decl.imports.iter().map(import_name).collect::<Vec<_>>();
    self.name == other.name
      && provider_keys(self) == provider_keys(other)
      && self.exported_keys() == other.exported_keys()
      && import_names(self) == import_names(other)
  }
}

pub(crate) fn import_name(import: &ModuleRef) -> String {
  match import {
    ModuleRef::Module(module) => module.declare().name().to_owned(),
    ModuleRef::Forward(name) => name.clone(),
  }
}

/// A unit of registration.
///
/// `declare` describes the module; `register_providers` is a hook for
/// registrations the declaration cannot express. It runs against the module's
/// own container, after the declared providers are in place.
pub trait Module: Send + Sync + 'static {
  fn declare(&self) -> ModuleDeclaration;

  fn register_providers(&self, _container: &Container) -> Result<()> {
    Ok(())
  }
}

impl Module for ModuleDeclaration {
  fn declare(&self) -> ModuleDeclaration {
    self.clone()
  }
}
