//! 解析上下文定义
//!
//! 工厂函数通过解析上下文回到发起解析的容器，
//! 递归解析进一步的依赖并继承其循环检测。

use crate::provider::SharedInstance;
use futures::future::BoxFuture;
use rong_common::{DependencyError, DependencyResult, ProviderKey};
use std::sync::Arc;

/// 作用域解析器 trait
///
/// 容器实现此 trait，向工厂函数暴露类型擦除的解析入口。
pub trait ScopeResolver: Send + Sync {
    /// 同步解析一个复合键
    fn resolve_any(&self, key: &ProviderKey) -> DependencyResult<SharedInstance>;

    /// 异步解析一个复合键
    fn resolve_any_async<'a>(
        &'a self,
        key: &'a ProviderKey,
    ) -> BoxFuture<'a, DependencyResult<SharedInstance>>;
}

/// 解析上下文
///
/// 绑定到发起解析的容器；工厂内的 `get` / `get_async`
/// 走的是同一台解析引擎，循环检测因此自然延续。
#[derive(Clone)]
pub struct ResolveContext {
    resolver: Arc<dyn ScopeResolver>,
}

impl ResolveContext {
    /// 从解析器创建上下文
    pub fn new(resolver: Arc<dyn ScopeResolver>) -> Self {
        Self { resolver }
    }

    /// 同步解析指定类型（无限定符）
    pub fn get<T: Send + Sync + 'static>(&self) -> DependencyResult<Arc<T>> {
        self.get_with(None)
    }

    /// 同步解析指定类型
    pub fn get_with<T: Send + Sync + 'static>(
        &self,
        qualifier: Option<&str>,
    ) -> DependencyResult<Arc<T>> {
        let key = typed_key::<T>(qualifier);
        downcast_shared(&key, self.resolver.resolve_any(&key)?)
    }

    /// 异步解析指定类型（无限定符）
    pub async fn get_async<T: Send + Sync + 'static>(&self) -> DependencyResult<Arc<T>> {
        self.get_async_with(None).await
    }

    /// 异步解析指定类型
    pub async fn get_async_with<T: Send + Sync + 'static>(
        &self,
        qualifier: Option<&str>,
    ) -> DependencyResult<Arc<T>> {
        let key = typed_key::<T>(qualifier);
        let instance = self.resolver.resolve_any_async(&key).await?;
        downcast_shared(&key, instance)
    }

    /// 同步解析一个复合键（类型擦除）
    pub fn resolve_any(&self, key: &ProviderKey) -> DependencyResult<SharedInstance> {
        self.resolver.resolve_any(key)
    }

    /// 异步解析一个复合键（类型擦除）
    pub async fn resolve_any_async(
        &self,
        key: &ProviderKey,
    ) -> DependencyResult<SharedInstance> {
        self.resolver.resolve_any_async(key).await
    }
}

/// 由类型和可选限定符组装复合键
pub fn typed_key<T: 'static>(qualifier: Option<&str>) -> ProviderKey {
    match qualifier {
        Some(q) => ProviderKey::qualified::<T>(q),
        None => ProviderKey::of::<T>(),
    }
}

/// 将类型擦除实例转换回具体类型
pub fn downcast_shared<T: Send + Sync + 'static>(
    key: &ProviderKey,
    instance: SharedInstance,
) -> DependencyResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })
}
