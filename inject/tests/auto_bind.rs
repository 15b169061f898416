mod common;

use fibre_inject::{injectable, Container, ContainerConfig, Error, InjectionKey, RequestContext};
use std::sync::Arc;

struct Clock;
injectable!(Clock);

struct Scheduler {
  clock: Arc<Clock>,
}
injectable!(Scheduler { clock: Clock });

struct Calendar {
  clock: Arc<Clock>,
}
injectable!(Calendar { clock: auto Clock });

struct Reminders {
  calendar: Arc<Calendar>,
  scheduler: Arc<Scheduler>,
}
injectable!(Reminders {
  calendar: auto Calendar,
  scheduler: Scheduler,
});

#[test]
fn test_auto_bind_is_off_by_default() {
  common::init_tracing();
  let container = Container::new();
  let context = RequestContext::new();

  let err = container.create_resolver(&context).get_injectable::<Clock>().err().unwrap();
  assert!(matches!(err, Error::BindingNotFound { .. }));
}

#[test]
fn test_auto_bind_synthesizes_transient_bindings() {
  let container = Container::builder().auto_bind(true).build();
  let context = RequestContext::new();
  let resolver = container.create_resolver(&context);

  let first = resolver.get_injectable::<Clock>().unwrap();
  let second = resolver.get_injectable::<Clock>().unwrap();

  assert!(!Arc::ptr_eq(&first, &second));
  assert!(!container.has_binding(&InjectionKey::of::<Clock>()));
}

#[test]
fn test_auto_bind_prefers_registered_binding() {
  let container = Container::with_config(ContainerConfig {
    name: Some("web".into()),
    auto_bind: true,
  });
  container.add_exact_singleton::<Clock>();
  let context = RequestContext::new();
  let resolver = container.create_resolver(&context);

  let first = resolver.get_injectable::<Clock>().unwrap();
  let second = resolver.get_injectable::<Clock>().unwrap();
  assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_auto_bind_only_applies_to_the_requested_type() {
  let container = Container::builder().auto_bind(true).build();
  let context = RequestContext::new();
  let resolver = container.create_resolver(&context);

  // Scheduler is synthesized, but its `Clock` dependency goes through `get`.
  let err = resolver.get_injectable::<Scheduler>().err().unwrap();
  assert!(matches!(err, Error::BindingNotFound { ref interface } if interface.ends_with("Clock")));

  container.add_exact_singleton::<Clock>();
  let scheduler = resolver.get_injectable::<Scheduler>().unwrap();
  assert!(Arc::ptr_eq(&scheduler.clock, &resolver.get::<Clock>().unwrap()));
}

#[test]
fn test_auto_fields_are_auto_bound_transitively() {
  let container = Container::builder().auto_bind(true).build();
  container.add_exact_singleton::<Scheduler>();
  container.add_exact_singleton::<Clock>();
  let context = RequestContext::new();
  let resolver = container.create_resolver(&context);

  // Calendar is synthesized, and its auto Clock still finds the registered singleton.
  let reminders = resolver.get_injectable::<Reminders>().unwrap();
  assert!(Arc::ptr_eq(&reminders.calendar.clock, &reminders.scheduler.clock));
  assert!(!container.has_binding(&InjectionKey::of::<Calendar>()));
  assert!(!container.has_binding(&InjectionKey::of::<Reminders>()));
}

#[test]
fn test_auto_fields_synthesize_unregistered_dependencies() {
  let container = Container::builder().auto_bind(true).build();
  container.add_exact_transient::<Calendar>();

  let first = container.get::<Calendar>().unwrap();
  let second = container.get::<Calendar>().unwrap();
  assert!(!Arc::ptr_eq(&first.clock, &second.clock));
}

#[test]
fn test_auto_fields_need_auto_bind_enabled() {
  let container = Container::new();
  container.add_exact_transient::<Calendar>();

  let err = container.get::<Calendar>().err().unwrap();
  assert!(matches!(err, Error::BindingNotFound { ref interface } if interface.ends_with("Clock")));
}

#[test]
fn test_child_inherits_auto_bind() {
  let root = Container::builder().auto_bind(true).build();
  let child = root.create_child();
  let context = RequestContext::new();

  assert!(child.create_resolver(&context).get_injectable::<Clock>().is_ok());
}
