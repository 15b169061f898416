//! Providers: the strategies that actually produce instances.

use crate::core::InjectionKey;
use crate::error::{Error, Result};
use crate::resolver::Resolver;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A type that can build itself from a resolver.
///
/// This is the constructor side of a `Class` provider: `construct` pulls the
/// dependencies it needs out of the resolver and returns the finished value.
/// Every `get` made from inside `construct` is tracked for cycles.
///
/// `get` only sees registered bindings. Use
/// [`Resolver::get_injectable`] for concrete dependencies that should be
/// auto-bound when the container has `auto_bind` enabled.
///
/// ```
/// use fibre_inject::{Injectable, Resolver, Result};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Database { config: Arc<Config> }
///
/// impl Injectable for Database {
///   fn construct(resolver: &Resolver<'_>) -> Result<Self> {
///     Ok(Database { config: resolver.get::<Config>()? })
///   }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
  fn construct(resolver: &Resolver<'_>) -> Result<Self>;
}

/// Declares that `Self` can be handed out as the interface `I`.
///
/// Every type implements it for itself. To bind a concrete type behind a trait
/// object, implement it for that trait, usually through the
/// [`implements!`](crate::implements) macro.
pub trait Implements<I: ?Sized>: Send + Sync + 'static {
  fn into_interface(self: Arc<Self>) -> Arc<I>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
  fn into_interface(self: Arc<Self>) -> Arc<T> {
    self
  }
}

/// A type-erased, cheaply cloneable handle to a produced instance.
///
/// It wraps the `Arc<I>` for the interface the instance was produced for, so
/// clones share one allocation and `Arc::ptr_eq` on the downcast values is
/// the identity of the instance.
#[derive(Clone)]
pub struct Instance {
  value: Arc<dyn Any + Send + Sync>,
  type_id: TypeId,
  type_name: &'static str,
}

impl Instance {
  pub fn new<I: ?Sized + Send + Sync + 'static>(value: Arc<I>) -> Self {
    Self {
      value: Arc::new(value),
      type_id: TypeId::of::<I>(),
      type_name: std::any::type_name::<I>(),
    }
  }

  /// Recovers the typed handle. `None` if this instance was produced for a
  /// different interface.
  pub fn downcast<I: ?Sized + 'static>(&self) -> Option<Arc<I>> {
    self.value.downcast_ref::<Arc<I>>().cloned()
  }

  /// The interface this instance was produced for.
  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Instance({})", self.type_name)
  }
}

type Constructor = Arc<dyn Fn(&Resolver<'_>) -> Result<Instance> + Send + Sync>;
type Cast = Arc<dyn Fn(Instance) -> Result<Instance> + Send + Sync>;

/// Discriminates the three provider strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
  Instance,
  Class,
  Alias,
}

/// Knows how to produce an instance of one interface.
///
/// Providers are immutable once built and are shared freely between bindings,
/// containers and threads.
#[derive(Clone)]
pub enum Provider {
  /// Hands out a value that already exists.
  Instance(Instance),
  /// Builds a new value, resolving its dependencies first.
  Class(ClassProvider),
  /// Forwards to the binding of another key.
  Alias(AliasProvider),
}

/// See [`Provider::Class`].
#[derive(Clone)]
pub struct ClassProvider {
  concrete: Option<&'static str>,
  produces: TypeId,
  produces_name: &'static str,
  construct: Constructor,
}

/// See [`Provider::Alias`].
#[derive(Clone)]
pub struct AliasProvider {
  target: InjectionKey,
  produces: TypeId,
  produces_name: &'static str,
  cast: Cast,
}

impl AliasProvider {
  pub fn target(&self) -> &InjectionKey {
    &self.target
  }
}

impl ClassProvider {
  /// The concrete type being constructed, `None` for closure factories.
  pub fn concrete(&self) -> Option<&'static str> {
    self.concrete
  }
}

impl Provider {
  /// Wraps an existing shared value as interface `I`.
  pub fn instance<I: ?Sized + Send + Sync + 'static>(value: Arc<I>) -> Self {
    Provider::Instance(Instance::new(value))
  }

  /// Wraps an owned value.
  pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
    Self::instance(Arc::new(value))
  }

  /// Constructs `C` through [`Injectable`] and exposes it as `I`.
  pub fn class<I, C>() -> Self
  where
    I: ?Sized + Send + Sync + 'static,
    C: Injectable + Implements<I>,
  {
    Provider::Class(ClassProvider {
      concrete: Some(std::any::type_name::<C>()),
      produces: TypeId::of::<I>(),
      produces_name: std::any::type_name::<I>(),
      construct: Arc::new(|resolver: &Resolver<'_>| {
        let concrete = C::construct(resolver)?;
        Ok(Instance::new(<C as Implements<I>>::into_interface(Arc::new(concrete))))
      }),
    })
  }

  /// Builds `I` with an arbitrary closure over the resolver.
  pub fn factory<I, F>(factory: F) -> Self
  where
    I: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<Arc<I>> + Send + Sync + 'static,
  {
    Provider::Class(ClassProvider {
      concrete: None,
      produces: TypeId::of::<I>(),
      produces_name: std::any::type_name::<I>(),
      construct: Arc::new(move |resolver: &Resolver<'_>| factory(resolver).map(Instance::new)),
    })
  }

  /// Resolves the unnamed binding of `C` and exposes it as `I`.
  pub fn alias<I, C>() -> Self
  where
    I: ?Sized + Send + Sync + 'static,
    C: ?Sized + Implements<I>,
  {
    Self::alias_key::<I, C>(InjectionKey::of::<C>())
  }

  /// Resolves the binding of `C` registered under `name` and exposes it as `I`.
  pub fn alias_named<I, C>(name: &str) -> Self
  where
    I: ?Sized + Send + Sync + 'static,
    C: ?Sized + Implements<I>,
  {
    Self::alias_key::<I, C>(InjectionKey::named::<C>(name))
  }

  fn alias_key<I, C>(target: InjectionKey) -> Self
  where
    I: ?Sized + Send + Sync + 'static,
    C: ?Sized + Implements<I>,
  {
    Provider::Alias(AliasProvider {
      target,
      produces: TypeId::of::<I>(),
      produces_name: std::any::type_name::<I>(),
      cast: Arc::new(|instance: Instance| {
        instance
          .downcast::<C>()
          .map(|target| Instance::new(<C as Implements<I>>::into_interface(target)))
          .ok_or_else(|| {
            Error::configuration(format!(
              "alias target produced {} where {} was expected",
              instance.type_name(),
              std::any::type_name::<C>()
            ))
          })
      }),
    })
  }

  pub fn kind(&self) -> ProviderKind {
    match self {
      Provider::Instance(_) => ProviderKind::Instance,
      Provider::Class(_) => ProviderKind::Class,
      Provider::Alias(_) => ProviderKind::Alias,
    }
  }

  /// `TypeId` of the interface this provider hands out.
  pub fn produces(&self) -> TypeId {
    match self {
      Provider::Instance(instance) => instance.type_id(),
      Provider::Class(class) => class.produces,
      Provider::Alias(alias) => alias.produces,
    }
  }

  pub fn produces_name(&self) -> &'static str {
    match self {
      Provider::Instance(instance) => instance.type_name(),
      Provider::Class(class) => class.produces_name,
      Provider::Alias(alias) => alias.produces_name,
    }
  }

  /// Produces an instance. Only `Class` and `Alias` touch the resolver.
  pub fn get(&self, resolver: &Resolver<'_>) -> Result<Instance> {
    match self {
      Provider::Instance(instance) => Ok(instance.clone()),
      Provider::Class(class) => (class.construct)(resolver),
      Provider::Alias(alias) => {
        let target = resolver.get_key(&alias.target)?;
        (alias.cast)(target)
      }
    }
  }
}

impl fmt::Debug for Provider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Provider::Instance(instance) => write!(f, "InstanceProvider({})", instance.type_name()),
      Provider::Class(class) => match class.concrete {
        Some(concrete) => write!(f, "ClassProvider({})", concrete),
        None => write!(f, "ClassProvider(<factory for {}>)", class.produces_name),
      },
      Provider::Alias(alias) => write!(f, "AliasProvider({})", alias.target),
    }
  }
}
