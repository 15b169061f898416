use fibre_inject::{injectable, Container, ModuleDeclaration, ProviderConfig, ScopeKind};
use std::sync::Arc;

struct Pool;
injectable!(Pool);

struct UserRepository {
  _pool: Arc<Pool>,
}
injectable!(UserRepository { _pool: Pool });

struct UserController {
  repository: Arc<UserRepository>,
}
injectable!(UserController { repository: UserRepository });

fn main() -> fibre_inject::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter("fibre_inject=info")
    .init();

  // `persistence` keeps its pool private and exports only the repository.
  let persistence = ModuleDeclaration::new("persistence")
    .provider(ProviderConfig::use_class::<Pool, Pool>())
    .provider(ProviderConfig::use_class::<UserRepository, UserRepository>().exported());

  let users = ModuleDeclaration::new("users")
    .import(persistence)
    .controller::<UserController>()
    .provider(ProviderConfig::use_value(String::from("/users")).scope(ScopeKind::Singleton));

  let app = Container::builder().name("app").build();
  let tree = app.install(users)?;

  for module in tree.iter() {
    println!(
      "module '{}' (parent: {}) controllers: {:?}",
      module.name(),
      module.parent_name().unwrap_or("<root>"),
      module.controllers()
    );
  }

  let users = tree.get("users").expect("users module is installed").container();
  let controller = users.get::<UserController>()?;
  let repository = tree
    .get("persistence")
    .expect("persistence module is installed")
    .container()
    .get::<UserRepository>()?;
  assert!(Arc::ptr_eq(&controller.repository, &repository));
  assert!(users.get::<Pool>().is_err());

  println!("The controller shares the exported repository; the pool stays private.");
  Ok(())
}
