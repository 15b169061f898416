//! Lifetime policies for produced instances.

use crate::binding::Binding;
use crate::core::InjectionKey;
use crate::error::{Error, Result};
use crate::provider::Instance;
use crate::resolver::Resolver;
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::thread::{self, ThreadId};
use tracing::trace;

/// Where (and whether) a produced instance is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScopeKind {
  /// One instance for the lifetime of the binding's container.
  Singleton,
  /// A fresh instance on every resolution.
  #[default]
  Transient,
  /// One instance per request context.
  Request,
}

impl ScopeKind {
  /// The policy implementing this kind.
  pub fn strategy(self) -> &'static dyn Scope {
    match self {
      ScopeKind::Singleton => &SingletonScope,
      ScopeKind::Transient => &TransientScope,
      ScopeKind::Request => &RequestScope,
    }
  }
}

/// A lifetime policy.
///
/// `get` receives the binding being resolved and a resolver rooted at the
/// binding's home container, and decides whether to hand back a cached
/// instance or to invoke the binding's provider.
pub trait Scope: Send + Sync {
  fn get(&self, binding: &Binding, resolver: &Resolver<'_>) -> Result<Instance>;
}

/// Never caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientScope;

impl Scope for TransientScope {
  fn get(&self, binding: &Binding, resolver: &Resolver<'_>) -> Result<Instance> {
    binding.provider().get(resolver)
  }
}

// --- Singleton construction ---

/// Singletons under construction right now, across all threads.
///
/// The per-thread resolution stack cannot see a cycle that spans two threads
/// (A builds `X` which needs `Y` while B builds `Y` which needs `X`). Each
/// thread records which binding it is building and which one it is waiting
/// for, so a thread about to wait can follow the chain and fail instead.
#[derive(Default)]
struct InFlight {
  owners: HashMap<u64, (ThreadId, InjectionKey)>,
  waiting: HashMap<ThreadId, u64>,
}

impl InFlight {
  /// The chain of keys leading from `wanted` back to a binding `me` is
  /// building, if waiting for `wanted` would never end.
  fn cycle_through(&self, wanted: u64, me: ThreadId) -> Option<Vec<String>> {
    let mut chain = Vec::new();
    let mut current = wanted;
    for _ in 0..=self.owners.len() {
      let (owner, key) = self.owners.get(&current)?;
      chain.push(key.to_string());
      if *owner == me {
        chain.push(chain[0].clone());
        return Some(chain);
      }
      current = *self.waiting.get(owner)?;
    }
    None
  }
}

static IN_FLIGHT: Lazy<Mutex<InFlight>> = Lazy::new(|| Mutex::new(InFlight::default()));
static CONSTRUCTED: Condvar = Condvar::new();

/// Releases a construction claim and wakes waiters, also on error or panic.
struct Claim {
  id: u64,
}

impl Drop for Claim {
  fn drop(&mut self) {
    IN_FLIGHT.lock().owners.remove(&self.id);
    CONSTRUCTED.notify_all();
  }
}

enum Turn {
  Ready(Instance),
  Build(Claim),
}

/// Caches in the binding's singleton slot.
///
/// Concurrent first resolutions of the same binding wait for the thread that
/// claimed it, and only for that thread. A failed construction leaves the slot
/// empty and the next waiter takes over. Waiting on a thread that is itself
/// (directly or through others) waiting on us fails with
/// [`Error::CyclicDependency`] instead of blocking forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingletonScope;

impl SingletonScope {
  fn take_turn(binding: &Binding) -> Result<Turn> {
    let slot = binding.singleton_slot();
    let me = thread::current().id();
    let mut table = IN_FLIGHT.lock();
    loop {
      if let Some(instance) = slot.get() {
        return Ok(Turn::Ready(instance.clone()));
      }
      if !table.owners.contains_key(&binding.id()) {
        table.owners.insert(binding.id(), (me, binding.key().clone()));
        return Ok(Turn::Build(Claim { id: binding.id() }));
      }
      if let Some(chain) = table.cycle_through(binding.id(), me) {
        return Err(Error::CyclicDependency { chain });
      }
      table.waiting.insert(me, binding.id());
      CONSTRUCTED.wait(&mut table);
      table.waiting.remove(&me);
    }
  }
}

impl Scope for SingletonScope {
  fn get(&self, binding: &Binding, resolver: &Resolver<'_>) -> Result<Instance> {
    if let Some(instance) = binding.singleton_slot().get() {
      return Ok(instance.clone());
    }
    let claim = match Self::take_turn(binding)? {
      Turn::Ready(instance) => return Ok(instance),
      Turn::Build(claim) => claim,
    };
    trace!(interface = %binding.key(), "constructing singleton");
    let produced = binding.provider().get(resolver)?;
    let instance = binding.singleton_slot().get_or_init(|| produced).clone();
    drop(claim);
    Ok(instance)
  }
}

/// Caches in the resolver's request context, keyed by binding id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestScope;

impl Scope for RequestScope {
  fn get(&self, binding: &Binding, resolver: &Resolver<'_>) -> Result<Instance> {
    let context = resolver.context();
    if let Some(cached) = context.cached(binding.id()) {
      return Ok(cached);
    }
    let produced = binding.provider().get(resolver)?;
    Ok(context.store(binding.id(), produced))
  }
}
