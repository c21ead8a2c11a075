//! # Weave IoC
//!
//! A scoped dependency-resolution container for Rust.
//!
//! Weave IoC resolves object graphs from declarative bindings. Bindings live in
//! scopes: nested, stack-disciplined units of work (a request, a job, a
//! command) that can override bindings for their duration and cache their own
//! singletons. The current scope is tracked per thread, and per task with the
//! `tokio` feature, so concurrent units of work never see each other's state.
//!
//! ## Core Concepts
//!
//! - **Container**: bindings, injectors and tags, plus the root scope.
//! - **Definition**: how an id is produced: a constructible [`Class`], a
//!   [`Callable`] factory, a fixed instance or an alias.
//! - **Autowire**: the constructor signature of a type, described by hand or
//!   generated. The resolver fills parameters from explicit arguments,
//!   injectors, bindings, defaults and finally by building them.
//! - **Scope**: opened with [`Container::run_scope`]; closed on every exit
//!   path, running the finalizers of what was built inside it.
//! - **Injector**: a custom strategy for types that cannot be built from
//!   their constructor alone.
//! - **Scoped**: a proxy handle that resolves a service from the caller's
//!   current scope on every use, so long-lived singletons can reach
//!   request-scoped services without capturing them.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use weave_ioc::{Callable, Container, Definition, Key, Scope};
//!
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!   message: String,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     self.message.clone()
//!   }
//! }
//!
//! let container = Container::new();
//! container
//!   .bind(Key::named::<String>("greeting"), Definition::instance(String::from("Hello, World!")))
//!   .unwrap();
//!
//! // A singleton factory that itself resolves another binding.
//! container
//!   .bind_singleton(
//!     Key::of::<dyn Greeter>(),
//!     Callable::raw("greeter", Vec::new(), |c, _| {
//!       let message = c.get::<String>(Key::named::<String>("greeting"))?;
//!       let greeter: Arc<dyn Greeter> = Arc::new(EnglishGreeter { message: (*message).clone() });
//!       Ok(weave_ioc::Value::from_arc(greeter))
//!     }),
//!   )
//!   .unwrap();
//!
//! let greeter = container.resolve::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "Hello, World!");
//!
//! // Inside a scope the greeting can be overridden without touching the root.
//! let scoped = container
//!   .run_scope(
//!     Scope::named("request").bind(Key::named::<String>("greeting"), Definition::instance(String::from("Hi"))),
//!     |c| c.get::<String>(Key::named::<String>("greeting")).unwrap(),
//!   )
//!   .unwrap();
//! assert_eq!(*scoped, "Hi");
//! ```

mod binder;
mod binding;
mod container;
mod core;
mod error;
mod inflector;
mod injector;
mod invoker;
mod macros;
mod options;
mod proxy;
mod resolver;
mod scope;
mod signature;
mod tags;

pub use binder::ScopeBinder;
pub use binding::Definition;
pub use container::Container;
pub use crate::core::{Key, Value};
pub use error::{BoxError, ContainerError, Result, ScopeError};
pub use injector::{FnInjector, InjectionRequest, Injector};
pub use options::{ContainerBuilder, ContainerOptions};
pub use proxy::{Proxy, Scoped};
pub use scope::{Scope, ScopeInfo, ROOT_SCOPE};
pub use signature::{Arguments, Autowire, Callable, Class, ParamType, Parameter, Params};
