/// Settings applied to a container.
///
/// With the `serde` feature enabled this can be read straight out of an
/// application settings file; every field is optional there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct ContainerConfig {
  /// Label used in logs and diagnostics.
  pub name: Option<String>,
  /// Synthesize a transient binding for unregistered concrete types that
  /// implement [`Injectable`](crate::Injectable), when they are requested
  /// through [`Resolver::get_injectable`](crate::Resolver::get_injectable).
  pub auto_bind: bool,
}

impl ContainerConfig {
  pub fn new() -> Self {
    Self::default()
  }
}
