use crate::config::ContainerConfig;
use crate::container::Container;

use core::fmt;

/// A builder for creating `Container` instances.
///
/// A child built with [`parent`](Self::parent) inherits the parent's
/// `auto_bind` setting unless [`auto_bind`](Self::auto_bind) is called
/// explicitly.
#[derive(Default)]
pub struct ContainerBuilder {
  name: Option<String>,
  auto_bind: Option<bool>,
  parent: Option<Container>,
}

impl fmt::Debug for ContainerBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContainerBuilder")
      .field("name", &self.name)
      .field("auto_bind", &self.auto_bind)
      .field("has_parent", &self.parent.is_some())
      .finish()
  }
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Starts from an existing configuration.
  pub fn from_config(config: ContainerConfig) -> Self {
    Self {
      name: config.name,
      auto_bind: Some(config.auto_bind),
      parent: None,
    }
  }

  /// Sets the label used in logs.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Enables or disables auto-binding of unregistered injectable types.
  pub fn auto_bind(mut self, enabled: bool) -> Self {
    self.auto_bind = Some(enabled);
    self
  }

  /// Makes the new container a child of `parent`.
  ///
  /// The parent link is non-owning: keep the parent alive for as long as the
  /// child should fall back to it.
  pub fn parent(mut self, parent: &Container) -> Self {
    self.parent = Some(parent.clone());
    self
  }

  pub fn build(self) -> Container {
    let inherited = self
      .parent
      .as_ref()
      .map(|parent| parent.config().auto_bind)
      .unwrap_or_default();
    let config = ContainerConfig {
      name: self.name,
      auto_bind: self.auto_bind.unwrap_or(inherited),
    };
    Container::from_parts(config, self.parent.as_ref())
  }
}
