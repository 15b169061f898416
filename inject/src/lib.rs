//! # Fibre Inject
//!
//! A hierarchical, request-scoped dependency injection container for web
//! applications.
//!
//! Bindings map an interface (any `'static` type, including trait objects
//! such as `dyn Logger`) to a provider and a lifetime. Containers form a tree
//! where children fall back to their parents, requests get their own cache
//! through a [`RequestContext`], and applications are composed of
//! [`Module`]s that keep their providers private unless they export them.
//!
//! ## Core Concepts
//!
//! - **Container**: one level of bindings with an optional parent.
//! - **Provider**: an existing instance, a constructed class or factory, or
//!   an alias for another binding.
//! - **Scope**: `Singleton`, `Transient` or `Request`.
//! - **Resolver**: resolves interfaces for one request and tracks cycles.
//! - **Modules**: declarations installed into a tree of child containers.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_inject::{implements, injectable, Container, RequestContext};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct Greeting(String);
//!
//! struct EnglishGreeter {
//!   greeting: Arc<Greeting>,
//! }
//!
//! injectable!(EnglishGreeter { greeting: Greeting });
//! implements!(EnglishGreeter => dyn Greeter);
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     self.greeting.0.clone()
//!   }
//! }
//!
//! let container = Container::new();
//! container.add_instance(Greeting("Hello, World!".to_string()));
//! container.add_singleton::<dyn Greeter, EnglishGreeter>();
//!
//! // One context per request; request-scoped instances die with it.
//! let context = RequestContext::new();
//! let resolver = container.create_resolver(&context);
//! let greeter = resolver.get::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "Hello, World!");
//! ```

mod binding;
mod builder;
mod config;
mod container;
mod context;
mod core;
mod error;
mod installer;
mod macros;
mod module;
mod provider;
mod registry;
mod resolver;
mod scope;

pub use binding::Binding;
pub use builder::ContainerBuilder;
pub use config::ContainerConfig;
pub use container::Container;
pub use context::RequestContext;
pub use crate::core::InjectionKey;
pub use error::{Error, Result};
pub use installer::{InstalledModule, ModuleInstaller, ModuleTree};
pub use module::{Module, ModuleDeclaration, ModuleRef, ProviderConfig, ProviderRole};
pub use provider::{AliasProvider, ClassProvider, Implements, Injectable, Instance, Provider, ProviderKind};
pub use resolver::Resolver;
pub use scope::{RequestScope, Scope, ScopeKind, SingletonScope, TransientScope};
