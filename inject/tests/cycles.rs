mod common;

use fibre_inject::{implements, injectable, Container, Error, Injectable, Resolver, Result};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct ServiceA {
  _b: Arc<ServiceB>,
}

struct ServiceB {
  _a: Arc<ServiceA>,
}

injectable!(ServiceA { _b: ServiceB });
injectable!(ServiceB { _a: ServiceA });

fn chain_of(err: Error) -> Vec<String> {
  match err {
    Error::CyclicDependency { chain } => chain,
    other => panic!("expected a cycle, got: {other}"),
  }
}

#[test]
fn test_two_service_cycle_is_reported() {
  common::init_tracing();
  let container = Container::new();
  container.add_exact_singleton::<ServiceA>();
  container.add_exact_singleton::<ServiceB>();

  let err = container.get::<ServiceA>().err().unwrap();
  assert!(err.to_string().starts_with("Circular dependency detected"));

  let chain = chain_of(err);
  assert_eq!(chain.len(), 3);
  assert!(chain[0].ends_with("ServiceA"));
  assert!(chain[1].ends_with("ServiceB"));
  assert!(chain[2].ends_with("ServiceA"));
}

#[test]
fn test_container_is_usable_after_a_cycle() {
  let container = Container::new();
  container.add_exact_transient::<ServiceA>();
  container.add_exact_transient::<ServiceB>();
  container.add_instance(7u32);

  assert!(container.get::<ServiceB>().is_err());
  assert_eq!(*container.get::<u32>().unwrap(), 7);
}

#[test]
fn test_self_dependency_is_a_cycle() {
  struct Recursive;
  impl Injectable for Recursive {
    fn construct(resolver: &Resolver<'_>) -> Result<Self> {
      resolver.get::<Recursive>()?;
      Ok(Recursive)
    }
  }

  let container = Container::new();
  container.add_exact_transient::<Recursive>();

  let chain = chain_of(container.get::<Recursive>().err().unwrap());
  assert_eq!(chain.len(), 2);
}

trait Left: Send + Sync {}
trait Right: Send + Sync {}

struct Both;
impl Left for Both {}
impl Right for Both {}
implements!(Both => dyn Left, dyn Right);

#[test]
fn test_alias_cycle_is_reported() {
  let container = Container::new();
  container.add_alias::<dyn Left, Both>().unwrap();
  container.add_transient_factory::<Both, _>(|resolver| {
    resolver.get::<dyn Left>()?;
    Ok(Arc::new(Both))
  });

  let err = container.get::<dyn Left>().err().unwrap();
  assert!(matches!(err, Error::CyclicDependency { .. }));
}

#[test]
fn test_diamond_is_not_a_cycle() {
  struct Shared;
  injectable!(Shared);
  struct Top {
    left: Arc<dyn Left>,
    right: Arc<dyn Right>,
  }
  injectable!(Top { left: dyn Left, right: dyn Right });

  let container = Container::new();
  container.add_exact_singleton::<Shared>();
  container.add_singleton_factory::<dyn Left, _>(|resolver| {
    resolver.get::<Shared>()?;
    Ok(Arc::new(Both))
  });
  container.add_singleton_factory::<dyn Right, _>(|resolver| {
    resolver.get::<Shared>()?;
    Ok(Arc::new(Both))
  });
  container.add_exact_transient::<Top>();

  let top = container.get::<Top>().unwrap();
  assert_eq!(
    Arc::as_ptr(&top.left) as *const (),
    Arc::as_ptr(&container.get::<dyn Left>().unwrap()) as *const ()
  );
  assert_eq!(
    Arc::as_ptr(&top.right) as *const (),
    Arc::as_ptr(&container.get::<dyn Right>().unwrap()) as *const ()
  );
}
