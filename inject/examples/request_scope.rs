use fibre_inject::{implements, Container, Injectable, RequestContext, Resolver, Result};
use rand::Rng;
use std::sync::Arc;

trait RequestId: Send + Sync {
  fn value(&self) -> u64;
}

struct RandomRequestId(u64);
implements!(RandomRequestId => dyn RequestId);

impl RequestId for RandomRequestId {
  fn value(&self) -> u64 {
    self.0
  }
}

impl Injectable for RandomRequestId {
  fn construct(_: &Resolver<'_>) -> Result<Self> {
    Ok(RandomRequestId(rand::rng().random()))
  }
}

struct CurrentUser(String);

// Pretend handler: everything it resolves shares the request's context.
fn handle(resolver: &Resolver<'_>, user: &str) -> Result<()> {
  resolver.update_context_value(CurrentUser(user.to_string()));

  let id = resolver.get::<dyn RequestId>()?;
  let again = resolver.get::<dyn RequestId>()?;
  let current = resolver.get::<CurrentUser>()?;

  assert!(Arc::ptr_eq(&id, &again));
  println!("request #{} -> id {:016x} for {}", resolver.request_id(), id.value(), current.0);
  Ok(())
}

fn main() -> Result<()> {
  let container = Container::builder().name("web").build();
  container.add_scoped::<dyn RequestId, RandomRequestId>();

  // One context per request; dropping it drops every request-scoped instance.
  for user in ["ada", "grace"] {
    let context = RequestContext::new();
    let resolver = container.create_resolver(&context);
    handle(&resolver, user)?;
  }

  // Or let the container manage the context.
  container.run_in_request(|resolver| handle(resolver, "linus"))
}
