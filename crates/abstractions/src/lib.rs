//! # Rong Abstractions
//!
//! 依赖注入抽象层，定义提供者描述符与解析上下文。
//!
//! ## 核心类型
//!
//! - [`Provider`] - 不可变的提供者描述符
//! - [`ProviderBuilder`] - 类型化的提供者构建器
//! - [`ResolveContext`] - 传递给工厂函数的解析上下文
//! - [`DependencyProbe`] / [`ConstructFallback`] - 可注入的外部协作能力

pub mod capability;
pub mod context;
pub mod provider;

pub use capability::*;
pub use context::*;
pub use provider::*;
