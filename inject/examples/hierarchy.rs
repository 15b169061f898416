use fibre_inject::Container;

struct DatabaseUrl(String);

// By accepting a `&Container`, this can run against a test child container.
fn describe(container: &Container) -> String {
  let url = container.get::<DatabaseUrl>().expect("DatabaseUrl not found in container");
  format!("Connecting to {}", url.0)
}

fn main() {
  let app = Container::builder().name("app").build();
  app.add_instance(DatabaseUrl("postgres://prod".to_string()));

  // --- A child that falls back to the application container ---
  let request_scope = app.create_child();
  println!("{}", describe(&request_scope));
  assert_eq!(describe(&request_scope), "Connecting to postgres://prod");

  // --- A child that shadows one binding for tests ---
  let test_scope = app.create_child();
  test_scope.add_instance(DatabaseUrl("sqlite::memory:".to_string()));
  println!("{}", describe(&test_scope));
  assert_eq!(describe(&test_scope), "Connecting to sqlite::memory:");

  // The parent is untouched.
  assert_eq!(describe(&app), "Connecting to postgres://prod");
  println!("\nVerified that child registrations never leak into the parent.");
}
