//! Keys and the per-thread cycle guard shared by every resolution path.

use crate::error::{Error, Result};
use crate::scope::ScopeKind;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

thread_local! {
  // Bindings currently under construction on this thread, outermost first.
  // A resolution never awaits, so one top-level `get` runs start to finish on
  // a single thread and concurrent requests never see each other's frames.
  static RESOLVING_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

#[derive(Clone)]
struct Frame {
  key: InjectionKey,
  origin: u64,
  scope: ScopeKind,
}

impl Frame {
  fn same_binding(&self, other: &Frame) -> bool {
    self.key == other.key && self.origin == other.origin
  }
}

/// Origin used for bindings that live in a request context instead of a
/// container.
pub(crate) const CONTEXT_ORIGIN: u64 = 0;

/// Hands out process-unique ids for containers and bindings. Zero is reserved
/// for request-context overrides.
pub(crate) fn next_id() -> u64 {
  static NEXT: AtomicU64 = AtomicU64::new(1);
  NEXT.fetch_add(1, Ordering::Relaxed)
}

/// An RAII guard that detects circular dependencies on the current thread.
///
/// A frame is identified by the requested key *and* the container the binding
/// lives in. Resolving the same key through another container's binding (for
/// instance explicitly through the parent) is therefore not a cycle, while a
/// binding that resolves its own key from its home container finds itself
/// again and is. Dropping the guard pops the frame, including when a factory
/// panics.
///
/// Request-scoped bindings, including request overrides, may not be entered
/// while a singleton is being constructed further up the stack: the singleton
/// would keep the first request's instance for good.
pub(crate) struct ResolutionGuard {
  frame: Frame,
}

impl ResolutionGuard {
  pub(crate) fn enter(key: &InjectionKey, origin: u64, scope: ScopeKind) -> Result<Self> {
    let frame = Frame {
      key: key.clone(),
      origin,
      scope,
    };
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(start) = stack.iter().position(|f| f.same_binding(&frame)) {
        let mut chain: Vec<String> = stack[start..].iter().map(|f| f.key.to_string()).collect();
        chain.push(frame.key.to_string());
        return Err(Error::CyclicDependency { chain });
      }
      if scope == ScopeKind::Request {
        if let Some(singleton) = stack.iter().rev().find(|f| f.scope == ScopeKind::Singleton) {
          return Err(Error::configuration(format!(
            "request-scoped {} cannot be injected into singleton {}",
            frame.key, singleton.key
          )));
        }
      }
      stack.push(frame.clone());
      Ok(())
    })?;
    Ok(Self { frame })
  }

  /// Number of frames currently on this thread's stack.
  #[cfg(test)]
  pub(crate) fn depth() -> usize {
    RESOLVING_STACK.with(|stack| stack.borrow().len())
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(pos) = stack.iter().rposition(|f| f.same_binding(&self.frame)) {
        stack.remove(pos);
      }
    });
  }
}

/// Identifies an interface inside a container.
///
/// The interface is any `'static` type, including trait objects such as
/// `dyn Logger`. An optional name distinguishes several bindings of the same
/// type. The type name is carried along for diagnostics only and does not take
/// part in equality.
#[derive(Clone)]
pub struct InjectionKey {
  type_id: TypeId,
  type_name: &'static str,
  name: Option<Arc<str>>,
}

impl InjectionKey {
  /// The unnamed key for `T`.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
      name: None,
    }
  }

  /// The key for `T` registered under `name`.
  pub fn named<T: ?Sized + Any>(name: &str) -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
      name: Some(Arc::from(name)),
    }
  }

  /// The same type under `name`.
  pub fn with_name(&self, name: &str) -> Self {
    Self {
      name: Some(Arc::from(name)),
      ..self.clone()
    }
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }
}

impl PartialEq for InjectionKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id && self.name == other.name
  }
}

impl Eq for InjectionKey {}

impl Hash for InjectionKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
    self.name.hash(state);
  }
}

impl fmt::Display for InjectionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "{}[{}]", self.type_name, name),
      None => f.write_str(self.type_name),
    }
  }
}

impl fmt::Debug for InjectionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "Key({}, Name({}))", self.type_name, name),
      None => write!(f, "Key({})", self.type_name),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  trait Marker {}

  #[test]
  fn keys_compare_by_type_and_name() {
    assert_eq!(InjectionKey::of::<String>(), InjectionKey::of::<String>());
    assert_ne!(InjectionKey::of::<String>(), InjectionKey::named::<String>("a"));
    assert_ne!(InjectionKey::named::<String>("a"), InjectionKey::named::<String>("b"));
    assert_ne!(InjectionKey::of::<String>(), InjectionKey::of::<dyn Marker>());
  }

  #[test]
  fn display_includes_name() {
    assert_eq!(InjectionKey::named::<u32>("port").to_string(), "u32[port]");
    assert_eq!(InjectionKey::of::<u32>().to_string(), "u32");
  }

  #[test]
  fn guard_reports_chain_and_unwinds() {
    let a = InjectionKey::of::<u8>();
    let b = InjectionKey::of::<u16>();

    let outer = ResolutionGuard::enter(&a, 1, ScopeKind::Transient).unwrap();
    let inner = ResolutionGuard::enter(&b, 1, ScopeKind::Transient).unwrap();
    let err = ResolutionGuard::enter(&a, 1, ScopeKind::Transient).err().unwrap();
    match err {
      Error::CyclicDependency { chain } => assert_eq!(chain, vec!["u8", "u16", "u8"]),
      other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ResolutionGuard::depth(), 2);

    drop(inner);
    drop(outer);
    assert_eq!(ResolutionGuard::depth(), 0);
  }

  #[test]
  fn same_key_from_another_container_is_not_a_cycle() {
    let a = InjectionKey::of::<u8>();
    let _child = ResolutionGuard::enter(&a, 7, ScopeKind::Singleton).unwrap();
    let parent = ResolutionGuard::enter(&a, 3, ScopeKind::Singleton);
    assert!(parent.is_ok());
  }

  #[test]
  fn request_frame_below_singleton_is_rejected() {
    let singleton = InjectionKey::of::<u32>();
    let request = InjectionKey::of::<u64>();

    let _outer = ResolutionGuard::enter(&singleton, 1, ScopeKind::Singleton).unwrap();
    let _between = ResolutionGuard::enter(&InjectionKey::of::<u16>(), 1, ScopeKind::Transient).unwrap();
    let err = ResolutionGuard::enter(&request, 1, ScopeKind::Request).err().unwrap();

    match err {
      Error::Configuration(message) => {
        assert!(message.contains("u64"));
        assert!(message.contains("u32"));
      }
      other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ResolutionGuard::depth(), 2);
  }

  #[test]
  fn request_frame_outside_singleton_is_allowed() {
    let _outer = ResolutionGuard::enter(&InjectionKey::of::<u16>(), 1, ScopeKind::Transient).unwrap();
    assert!(ResolutionGuard::enter(&InjectionKey::of::<u64>(), 1, ScopeKind::Request).is_ok());
  }
}
