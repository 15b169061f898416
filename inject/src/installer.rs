//! Builds the module tree on top of a root container.

use crate::builder::ContainerBuilder;
use crate::container::Container;
use crate::core::InjectionKey;
use crate::error::{Error, Result};
use crate::module::{import_name, Module, ModuleDeclaration, ModuleRef, ProviderRole};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A module that has been installed, together with its container.
#[derive(Clone)]
pub struct InstalledModule {
  declaration: ModuleDeclaration,
  container: Container,
  parent: Option<String>,
}

impl InstalledModule {
  pub fn name(&self) -> &str {
    self.declaration.name()
  }

  /// The module's own container.
  pub fn container(&self) -> &Container {
    &self.container
  }

  /// Name of the module that installed this one, `None` for top-level modules.
  pub fn parent_name(&self) -> Option<&str> {
    self.parent.as_deref()
  }

  pub fn declaration(&self) -> &ModuleDeclaration {
    &self.declaration
  }

  /// Keys of the declared providers playing `role`, in declaration order.
  pub fn keys_with_role(&self, role: ProviderRole) -> Vec<InjectionKey> {
    self
      .declaration
      .providers()
      .iter()
      .filter(|config| config.provider_role() == role)
      .map(|config| config.key().clone())
      .collect()
  }

  pub fn controllers(&self) -> Vec<InjectionKey> {
    self.keys_with_role(ProviderRole::Controller)
  }

  pub fn middleware(&self) -> Vec<InjectionKey> {
    self.keys_with_role(ProviderRole::Middleware)
  }

  pub fn exception_handlers(&self) -> Vec<InjectionKey> {
    self.keys_with_role(ProviderRole::ExceptionHandler)
  }

  pub fn template_filters(&self) -> Vec<InjectionKey> {
    self.keys_with_role(ProviderRole::TemplateFilter)
  }
}

impl fmt::Debug for InstalledModule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("InstalledModule")
      .field("name", &self.name())
      .field("parent", &self.parent)
      .field("container", &self.container)
      .finish()
  }
}

/// Every installed module, by name, in installation order.
#[derive(Debug, Default, Clone)]
pub struct ModuleTree {
  modules: Vec<InstalledModule>,
  index: HashMap<String, usize>,
}

impl ModuleTree {
  pub fn get(&self, name: &str) -> Option<&InstalledModule> {
    self.index.get(name).map(|&pos| &self.modules[pos])
  }

  pub fn contains(&self, name: &str) -> bool {
    self.index.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &InstalledModule> {
    self.modules.iter()
  }

  fn insert(&mut self, module: InstalledModule) {
    self.index.insert(module.name().to_owned(), self.modules.len());
    self.modules.push(module);
  }

  // Forgets every module installed after the first `len`.
  fn truncate(&mut self, len: usize) {
    for module in self.modules.drain(len..) {
      self.index.remove(module.name());
    }
  }
}

// A module collected for installation but not instantiated yet.
struct Pending {
  module: Arc<dyn Module>,
  declaration: ModuleDeclaration,
  imports: Vec<String>,
}

/// Installs modules into a root container.
///
/// Each module gets its own child container, parented to the container of
/// the module that imported it (or to the root). Its declared providers are
/// registered there, then its imports are installed and their exports are
/// published into it. A module imported from several places is installed
/// once; every importer receives the same exported bindings, and therefore
/// the same singletons.
///
/// Names, forward references and import cycles are validated before any
/// container is created. If a later step fails (a provider that does not
/// match its key, a failing `register_providers` hook, an export that is
/// neither provided nor imported), every module of that call is dropped from
/// the tree again and nothing is published into the root container.
pub struct ModuleInstaller {
  root: Container,
  tree: ModuleTree,
}

impl ModuleInstaller {
  pub fn new(root: &Container) -> Self {
    Self {
      root: root.clone(),
      tree: ModuleTree::default(),
    }
  }

  pub fn root(&self) -> &Container {
    &self.root
  }

  pub fn tree(&self) -> &ModuleTree {
    &self.tree
  }

  pub fn into_tree(self) -> ModuleTree {
    self.tree
  }

  /// Installs `module` and everything it imports as a top-level module. Its
  /// exports are published into the root container.
  pub fn install(&mut self, module: impl Module) -> Result<&InstalledModule> {
    self.install_shared(Arc::new(module))
  }

  pub fn install_shared(&mut self, module: Arc<dyn Module>) -> Result<&InstalledModule> {
    let declaration = module.declare();
    let name = declaration.name().to_owned();

    let pending = self.collect(module, declaration)?;
    self.check_forward_refs(&pending)?;
    detect_cycles(&pending)?;

    let root = self.root.clone();
    let installed = self.tree.len();
    let outcome = self
      .instantiate(&name, &root, None, &pending)
      .and_then(|container| self.publish(&name, &container, &root));
    if let Err(err) = outcome {
      warn!(module = %name, error = %err, "module installation failed, rolling back");
      self.tree.truncate(installed);
      return Err(err);
    }

    info!(module = %name, modules = self.tree.len(), root = %root, "module tree installed");
    self
      .tree
      .get(&name)
      .ok_or_else(|| Error::configuration(format!("module '{}' vanished during installation", name)))
  }

  // Walks concrete imports from `module`, validating names along the way.
  fn collect(&self, module: Arc<dyn Module>, declaration: ModuleDeclaration) -> Result<HashMap<String, Pending>> {
    let mut pending: HashMap<String, Pending> = HashMap::new();
    let mut queue = vec![(module, declaration)];

    while let Some((module, declaration)) = queue.pop() {
      let name = declaration.name();
      if name.trim().is_empty() {
        return Err(Error::configuration("a module was declared without a name"));
      }
      let known = self
        .tree
        .get(name)
        .map(InstalledModule::declaration)
        .or_else(|| pending.get(name).map(|entry| &entry.declaration));
      if let Some(known) = known {
        if !known.same_shape(&declaration) {
          return Err(Error::configuration(format!(
            "two different modules are declared with the name '{}'",
            name
          )));
        }
        continue;
      }

      for import in declaration.imports() {
        if let ModuleRef::Module(imported) = import {
          queue.push((Arc::clone(imported), imported.declare()));
        }
      }
      let imports = declaration.imports().iter().map(import_name).collect();
      pending.insert(
        name.to_owned(),
        Pending {
          module,
          declaration,
          imports,
        },
      );
    }
    Ok(pending)
  }

  fn check_forward_refs(&self, pending: &HashMap<String, Pending>) -> Result<()> {
    for entry in pending.values() {
      for import in entry.declaration.imports() {
        if let ModuleRef::Forward(target) = import {
          if !pending.contains_key(target) && !self.tree.contains(target) {
            return Err(Error::configuration(format!(
              "module '{}' references unknown module '{}'",
              entry.declaration.name(),
              target
            )));
          }
        }
      }
    }
    Ok(())
  }

  fn instantiate(
    &mut self,
    name: &str,
    parent: &Container,
    parent_module: Option<&str>,
    pending: &HashMap<String, Pending>,
  ) -> Result<Container> {
    if let Some(installed) = self.tree.get(name) {
      return Ok(installed.container.clone());
    }
    let entry = pending
      .get(name)
      .ok_or_else(|| Error::configuration(format!("module '{}' is not part of the tree", name)))?;

    let container = ContainerBuilder::new().parent(parent).name(name).build();
    for config in entry.declaration.providers() {
      container.register_key(config.key().clone(), config.provider().clone(), config.scope_kind())?;
    }
    entry.module.register_providers(&container)?;

    self.tree.insert(InstalledModule {
      declaration: entry.declaration.clone(),
      container: container.clone(),
      parent: parent_module.map(str::to_owned),
    });

    for import in &entry.imports {
      let imported = self.instantiate(import, &container, Some(name), pending)?;
      self.publish(import, &imported, &container)?;
    }

    info!(
      module = name,
      parent = parent_module.unwrap_or("<root>"),
      providers = entry.declaration.providers().len(),
      imports = entry.imports.len(),
      "installed module"
    );
    Ok(container)
  }

  // Copies the exported bindings of module `name` into `target`, all or none.
  fn publish(&self, name: &str, source: &Container, target: &Container) -> Result<()> {
    let exports = self
      .tree
      .get(name)
      .map(|installed| installed.declaration.exported_keys())
      .unwrap_or_default();

    let bindings = exports
      .into_iter()
      .map(|key| {
        source.local_binding(&key).ok_or_else(|| {
          Error::configuration(format!(
            "module '{}' exports {} but neither provides nor imports it",
            name, key
          ))
        })
      })
      .collect::<Result<Vec<_>>>()?;

    for binding in bindings {
      debug!(module = name, interface = %binding.key(), into = %target, "exporting provider");
      target.adopt(binding, source);
    }
    Ok(())
  }
}

impl fmt::Debug for ModuleInstaller {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ModuleInstaller")
      .field("root", &self.root)
      .field("modules", &self.tree.len())
      .finish()
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  Visiting,
  Done,
}

// Depth-first search over import names; modules must form a DAG.
fn detect_cycles(pending: &HashMap<String, Pending>) -> Result<()> {
  let mut marks: HashMap<&str, Mark> = HashMap::new();
  let mut path: Vec<&str> = Vec::new();

  let mut names: Vec<&str> = pending.keys().map(String::as_str).collect();
  names.sort_unstable();
  for name in names {
    visit(name, pending, &mut marks, &mut path)?;
  }
  Ok(())
}

fn visit<'a>(
  name: &'a str,
  pending: &'a HashMap<String, Pending>,
  marks: &mut HashMap<&'a str, Mark>,
  path: &mut Vec<&'a str>,
) -> Result<()> {
  match marks.get(name) {
    Some(Mark::Done) => return Ok(()),
    Some(Mark::Visiting) => {
      let start = path.iter().position(|seen| *seen == name).unwrap_or(0);
      let mut chain: Vec<String> = path[start..].iter().map(|seen| seen.to_string()).collect();
      chain.push(name.to_owned());
      return Err(Error::CyclicModuleDependency { chain });
    }
    None => {}
  }
  // Already installed modules cannot import anything new.
  let Some(entry) = pending.get(name) else {
    return Ok(());
  };

  marks.insert(name, Mark::Visiting);
  path.push(name);
  for import in &entry.imports {
    visit(import, pending, marks, path)?;
  }
  path.pop();
  marks.insert(name, Mark::Done);
  Ok(())
}

impl Container {
  /// Installs `module` as a top-level module of this container.
  ///
  /// Keep the returned tree alive: it owns the module containers that are
  /// not reachable through an export.
  pub fn install(&self, module: impl Module) -> Result<ModuleTree> {
    let mut installer = ModuleInstaller::new(self);
    installer.install(module)?;
    Ok(installer.into_tree())
  }
}
