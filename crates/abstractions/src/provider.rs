//! 提供者描述符定义
//!
//! 提供者是不可变的"配方"：一个复合键、一种生命周期、
//! 恰好一种生产方法，以及可选的释放钩子。

use crate::context::ResolveContext;
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use rong_common::{
    DependencyResult, Disposable, DisposeError, Lifetime, ProviderKey,
};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// 类型擦除后的共享实例
pub type SharedInstance = Arc<dyn Any + Send + Sync>;

/// 同步工厂函数类型
pub type FactoryFn =
    Arc<dyn Fn(&ResolveContext) -> DependencyResult<SharedInstance> + Send + Sync>;

/// 异步工厂函数类型
pub type AsyncFactoryFn = Arc<
    dyn Fn(ResolveContext) -> BoxFuture<'static, DependencyResult<SharedInstance>> + Send + Sync,
>;

/// 构造函数类型，入参为按声明顺序解析出的依赖实例
pub type CtorFn =
    Arc<dyn Fn(Vec<SharedInstance>) -> DependencyResult<SharedInstance> + Send + Sync>;

/// 释放钩子函数类型
pub type DisposeFn =
    Arc<dyn Fn(SharedInstance) -> BoxFuture<'static, Result<(), DisposeError>> + Send + Sync>;

/// 生产方法
///
/// 枚举保证每个提供者恰好配置一种生产方法。
#[derive(Clone)]
pub enum Produce {
    /// 固定值：解析时直接返回存储的实例
    Value(SharedInstance),
    /// 同步工厂：携带解析上下文调用，可递归解析进一步的依赖
    Factory(FactoryFn),
    /// 异步工厂：同步入口只会对其轮询一次，未完成即报错
    AsyncFactory(AsyncFactoryFn),
    /// 显式依赖构造：先按声明顺序解析依赖，再调用构造函数。
    /// `deps` 为 `None` 时交由依赖探测能力补全，探测缺席则按零依赖构造。
    Construct {
        /// 构造函数
        ctor: CtorFn,
        /// 显式声明的依赖键列表
        deps: Option<Vec<ProviderKey>>,
    },
}

/// 提供者描述符
///
/// 在注册时创建，之后不可变；覆盖操作替换注册表条目而非修改原描述符。
#[derive(Clone)]
pub struct Provider {
    /// 复合键
    pub key: ProviderKey,
    /// 实例生命周期
    pub lifetime: Lifetime,
    /// 生产方法
    pub produce: Produce,
    /// 可选的释放钩子
    pub dispose: Option<DisposeFn>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("key", &self.key.to_string())
            .field("lifetime", &self.lifetime)
            .field("produce", &self.produce_kind())
            .field("dispose", &self.dispose.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl Provider {
    /// 固定值提供者，默认单例生命周期
    pub fn value<T: Send + Sync + 'static>(value: T) -> ProviderBuilder<T> {
        ProviderBuilder::new(Lifetime::Singleton, Produce::Value(Arc::new(value)))
    }

    /// 同步工厂提供者，默认瞬时生命周期
    pub fn factory<T, F>(factory: F) -> ProviderBuilder<T>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolveContext) -> DependencyResult<T> + Send + Sync + 'static,
    {
        ProviderBuilder::new(
            Lifetime::Transient,
            Produce::Factory(Arc::new(move |ctx| {
                Ok(Arc::new(factory(ctx)?) as SharedInstance)
            })),
        )
    }

    /// 异步工厂提供者，默认瞬时生命周期
    pub fn async_factory<T, F, Fut>(factory: F) -> ProviderBuilder<T>
    where
        T: Send + Sync + 'static,
        F: Fn(ResolveContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DependencyResult<T>> + Send + 'static,
    {
        ProviderBuilder::new(
            Lifetime::Transient,
            Produce::AsyncFactory(Arc::new(move |ctx| {
                let fut = factory(ctx);
                async move { Ok(Arc::new(fut.await?) as SharedInstance) }.boxed()
            })),
        )
    }

    /// 显式依赖构造提供者，默认瞬时生命周期
    ///
    /// 依赖列表通过 [`ProviderBuilder::dependencies`] 声明；
    /// 未声明时解析引擎会求助依赖探测能力。
    pub fn construct<T, F>(ctor: F) -> ProviderBuilder<T>
    where
        T: Send + Sync + 'static,
        F: Fn(Vec<SharedInstance>) -> DependencyResult<T> + Send + Sync + 'static,
    {
        ProviderBuilder::new(
            Lifetime::Transient,
            Produce::Construct {
                ctor: Arc::new(move |deps| Ok(Arc::new(ctor(deps)?) as SharedInstance)),
                deps: None,
            },
        )
    }

    /// 从已有键和类型擦除实例创建单例固定值提供者
    ///
    /// 覆盖控制器用此路径绕过类型化构建器。
    pub fn fixed_value(key: ProviderKey, instance: SharedInstance) -> Self {
        Self {
            key,
            lifetime: Lifetime::Singleton,
            produce: Produce::Value(instance),
            dispose: None,
        }
    }

    fn produce_kind(&self) -> &'static str {
        match &self.produce {
            Produce::Value(_) => "value",
            Produce::Factory(_) => "factory",
            Produce::AsyncFactory(_) => "async-factory",
            Produce::Construct { .. } => "construct",
        }
    }
}

/// 类型化的提供者构建器
///
/// 携带具体类型参数 `T`，以便静态接入释放能力。
pub struct ProviderBuilder<T> {
    key: ProviderKey,
    lifetime: Lifetime,
    produce: Produce,
    dispose: Option<DisposeFn>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ProviderBuilder<T> {
    fn new(lifetime: Lifetime, produce: Produce) -> Self {
        Self {
            key: ProviderKey::of::<T>(),
            lifetime,
            produce,
            dispose: None,
            _marker: PhantomData,
        }
    }

    /// 设置限定符
    #[must_use]
    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.key = self.key.with_qualifier(qualifier);
        self
    }

    /// 单例生命周期
    #[must_use]
    pub fn singleton(mut self) -> Self {
        self.lifetime = Lifetime::Singleton;
        self
    }

    /// 作用域生命周期
    #[must_use]
    pub fn scoped(mut self) -> Self {
        self.lifetime = Lifetime::Scoped;
        self
    }

    /// 瞬时生命周期
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.lifetime = Lifetime::Transient;
        self
    }

    /// 声明显式依赖键列表（仅对构造提供者有意义）
    #[must_use]
    pub fn dependencies(mut self, keys: Vec<ProviderKey>) -> Self {
        if let Produce::Construct { deps, .. } = &mut self.produce {
            *deps = Some(keys);
        }
        self
    }

    /// 设置自定义释放钩子
    #[must_use]
    pub fn dispose_with<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DisposeError>> + Send + 'static,
    {
        self.dispose = Some(Arc::new(move |instance: SharedInstance| {
            match instance.downcast::<T>() {
                Ok(typed) => hook(typed).boxed(),
                Err(_) => future::ready(Err(downcast_dispose_error::<T>())).boxed(),
            }
        }));
        self
    }

    /// 接入 [`Disposable`] 能力作为释放钩子
    #[must_use]
    pub fn disposable(mut self) -> Self
    where
        T: Disposable,
    {
        self.dispose = Some(Arc::new(|instance: SharedInstance| {
            match instance.downcast::<T>() {
                Ok(typed) => async move { typed.dispose().await }.boxed(),
                Err(_) => future::ready(Err(downcast_dispose_error::<T>())).boxed(),
            }
        }));
        self
    }

    /// 固化为不可变的提供者描述符
    pub fn build(self) -> Provider {
        Provider {
            key: self.key,
            lifetime: self.lifetime,
            produce: self.produce,
            dispose: self.dispose,
        }
    }
}

fn downcast_dispose_error<T>() -> DisposeError {
    format!(
        "释放钩子类型转换失败: 期望 {}",
        std::any::type_name::<T>()
    )
    .into()
}
