use thiserror::Error;

/// The main error type for the `fibre_inject` library.
///
/// None of these are transient: they all point at a wiring defect, so nothing
/// in the container retries. Startup errors (`Configuration`,
/// `CyclicModuleDependency`) should abort the process, resolution errors are
/// surfaced to whoever asked for the instance.
#[derive(Debug, Error)]
pub enum Error {
  /// A registration or module declaration is malformed.
  #[error("Invalid container configuration: {0}")]
  Configuration(String),

  /// Nothing in the container hierarchy can produce the interface.
  #[error("No binding found for '{interface}'")]
  BindingNotFound { interface: String },

  /// Constructor dependencies loop back on themselves.
  #[error("Circular dependency detected: {}", .chain.join(" -> "))]
  CyclicDependency { chain: Vec<String> },

  /// Module imports loop back on themselves.
  #[error("Circular module import detected: {}", .chain.join(" -> "))]
  CyclicModuleDependency { chain: Vec<String> },

  /// A user supplied constructor or factory failed.
  #[error("Failed to construct '{interface}': {source}")]
  Construction {
    interface: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  /// Wraps an arbitrary error raised while building `interface`.
  pub fn construction<E>(interface: impl Into<String>, source: E) -> Self
  where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
  {
    Error::Construction {
      interface: interface.into(),
      source: source.into(),
    }
  }

  pub(crate) fn configuration(message: impl Into<String>) -> Self {
    Error::Configuration(message.into())
  }

  pub(crate) fn not_found(interface: impl std::fmt::Display) -> Self {
    Error::BindingNotFound {
      interface: interface.to_string(),
    }
  }
}

/// A specialized `Result` type for `fibre_inject` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
