//! # Rong Container
//!
//! 依赖注入容器的具体实现：提供者注册表、解析引擎、
//! 作用域树、实例释放追踪与根级覆盖控制。
//!
//! ## 快速上手
//!
//! ```rust
//! use rong_container::{Container, Provider};
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Greeter {
//!     greeting: Arc<String>,
//! }
//!
//! let container = Container::new();
//! container
//!     .register(Provider::value(String::from("你好")).build())
//!     .unwrap();
//! container
//!     .register(
//!         Provider::factory(|ctx| {
//!             Ok(Greeter {
//!                 greeting: ctx.get::<String>()?,
//!             })
//!         })
//!         .singleton()
//!         .build(),
//!     )
//!     .unwrap();
//!
//! let greeter = container.get::<Greeter>().unwrap();
//! assert_eq!(greeter.greeting.as_str(), "你好");
//! ```

pub mod container;
pub mod global;
pub mod lifecycle;
pub mod registry;

pub use container::Container;
pub use lifecycle::{DisposalRecord, LifecycleTracker};
pub use registry::ProviderRegistry;

pub use rong_abstractions::{
    downcast_shared, typed_key, ConstructFallback, DefaultConstructSource, DependencyProbe,
    Produce, Provider, ProviderBuilder, ResolveContext, ScopeResolver, SharedInstance,
    StaticDependencyProbe,
};
pub use rong_common::{
    ContainerOptions, DependencyError, DependencyResult, Disposable, DisposeError, Lifetime,
    OverrideStrategy, ProviderKey,
};
