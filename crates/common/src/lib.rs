//! # Rong Common
//!
//! Rong 依赖注入框架的公共基础类型。
//!
//! ## 核心类型
//!
//! - [`ProviderKey`] - 提供者复合键（类型标识 + 可选限定符）
//! - [`Lifetime`] - 实例生命周期（单例 / 作用域 / 瞬时）
//! - [`Disposable`] - 显式释放能力 trait
//! - [`ContainerOptions`] - 容器配置选项
//! - [`DependencyError`] - 依赖注入错误类型
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 异步优先的设计理念
//! - 显式能力接口，不做运行时方法探测

pub mod disposal;
pub mod errors;
pub mod key;
pub mod lifetime;
pub mod options;

pub use disposal::*;
pub use errors::*;
pub use key::*;
pub use lifetime::*;
pub use options::*;
