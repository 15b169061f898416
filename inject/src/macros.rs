//! Public macros that cut down on registration boilerplate.

/// Declares which interfaces a concrete type can be bound behind.
///
/// Expands to one [`Implements`](crate::Implements) impl per interface, each
/// being a plain unsizing coercion. The concrete type must implement every
/// listed trait.
///
/// ```
/// use fibre_inject::{implements, injectable, Container};
///
/// trait Logger: Send + Sync {
///   fn log(&self, line: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// injectable!(ConsoleLogger);
/// implements!(ConsoleLogger => dyn Logger);
///
/// impl Logger for ConsoleLogger {
///   fn log(&self, line: &str) -> String {
///     format!("[console] {line}")
///   }
/// }
///
/// let container = Container::new();
/// container.add_singleton::<dyn Logger, ConsoleLogger>();
/// let logger = container.get::<dyn Logger>().unwrap();
/// assert_eq!(logger.log("up"), "[console] up");
/// ```
#[macro_export]
macro_rules! implements {
  ($concrete:ty => $($interface:ty),+ $(,)?) => {
    $(
      impl $crate::Implements<$interface> for $concrete {
        fn into_interface(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$interface> {
          self
        }
      }
    )+
  };
}

/// Implements [`Injectable`](crate::Injectable) for simple types.
///
/// - `injectable!(Unit)` for unit structs.
/// - `injectable!(default Type)` builds through `Default`.
/// - `injectable!(Type { field: Dep, .. })` resolves each field as `Arc<Dep>`.
///
/// A field written `field: auto Dep` is resolved with
/// [`Resolver::get_injectable`](crate::Resolver::get_injectable) instead, so
/// a container with `auto_bind` enabled can build `Dep` without a
/// registration. Plain fields only see registered bindings.
///
/// ```
/// use fibre_inject::{injectable, Container};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Settings { retries: u32 }
/// struct Client { settings: Arc<Settings> }
///
/// injectable!(default Settings);
/// injectable!(Client { settings: Settings });
///
/// let container = Container::new();
/// container.add_exact_singleton::<Settings>();
/// container.add_exact_transient::<Client>();
/// assert_eq!(container.get::<Client>().unwrap().settings.retries, 0);
///
/// struct Pool;
/// struct Repository { pool: Arc<Pool> }
///
/// injectable!(Pool);
/// injectable!(Repository { pool: auto Pool });
///
/// let container = Container::builder().auto_bind(true).build();
/// container.add_exact_transient::<Repository>();
/// assert!(container.get::<Repository>().is_ok());
/// ```
#[macro_export]
macro_rules! injectable {
  (@fields $resolver:ident, $ty:ident, [$($done:tt)*]) => {
    Ok($ty { $($done)* })
  };

  (@fields $resolver:ident, $ty:ident, [$($done:tt)*] $field:ident : auto $dep:ty $(, $($rest:tt)*)?) => {
    $crate::injectable!(
      @fields $resolver, $ty,
      [$($done)* $field: $resolver.get_injectable::<$dep>()?,]
      $($($rest)*)?
    )
  };

  (@fields $resolver:ident, $ty:ident, [$($done:tt)*] $field:ident : $dep:ty $(, $($rest:tt)*)?) => {
    $crate::injectable!(
      @fields $resolver, $ty,
      [$($done)* $field: $resolver.get::<$dep>()?,]
      $($($rest)*)?
    )
  };

  (default $ty:ty) => {
    impl $crate::Injectable for $ty {
      fn construct(_resolver: &$crate::Resolver<'_>) -> $crate::Result<Self> {
        Ok(<$ty as ::std::default::Default>::default())
      }
    }
  };

  ($ty:ident) => {
    impl $crate::Injectable for $ty {
      fn construct(_resolver: &$crate::Resolver<'_>) -> $crate::Result<Self> {
        Ok($ty)
      }
    }
  };

  ($ty:ident { $($fields:tt)* }) => {
    impl $crate::Injectable for $ty {
      fn construct(resolver: &$crate::Resolver<'_>) -> $crate::Result<Self> {
        $crate::injectable!(@fields resolver, $ty, [] $($fields)*)
      }
    }
  };
}
