//! 依赖注入容器实现
//!
//! 容器是作用域树上的一个节点：持有本层注册表、解析集、
//! 作用域缓存与释放列表；单例缓存与外部协作能力只存在于根节点。
//! 子节点只持有指向父节点的非拥有引用，父节点永远不引用子节点。

use crate::lifecycle::LifecycleTracker;
use crate::registry::ProviderRegistry;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use rong_abstractions::{
    downcast_shared, typed_key, ConstructFallback, DependencyProbe, Produce, Provider,
    ResolveContext, ScopeResolver, SharedInstance,
};
use rong_common::{
    ContainerOptions, DependencyError, DependencyResult, Lifetime, ProviderKey,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use tracing::{debug, info};
use uuid::Uuid;

/// 依赖注入容器
///
/// 克隆是浅拷贝：克隆体与原值指向同一个作用域节点。
/// 需要新作用域时使用 [`begin_scope`](Container::begin_scope)。
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    id: Uuid,
    created_at: DateTime<Utc>,
    options: ContainerOptions,
    /// 指向父作用域的非拥有引用，仅用于注册表与单例缓存的向上查找
    parent: Option<Container>,
    registry: ProviderRegistry,
    /// 当前调用栈上正在解析中的键，用于循环检测
    resolving: Mutex<HashSet<ProviderKey>>,
    /// 本作用域的实例缓存
    scoped_cache: DashMap<ProviderKey, SharedInstance>,
    /// 单例实例缓存，仅根节点持有
    single_cache: Option<DashMap<ProviderKey, SharedInstance>>,
    tracker: LifecycleTracker,
    /// 构造依赖探测能力（仅根节点）
    probe: RwLock<Option<Arc<dyn DependencyProbe>>>,
    /// 零参构造回退能力（仅根节点）
    fallback: RwLock<Option<Arc<dyn ConstructFallback>>>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("root", &self.is_root())
            .field("providers", &self.inner.registry.len())
            .field("tracked", &self.inner.tracker.len())
            .finish()
    }
}

impl Container {
    /// 创建默认配置的根容器
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    /// 创建指定配置的根容器
    pub fn with_options(options: ContainerOptions) -> Self {
        let container = Self::node(options, None);
        info!("创建根容器: {}", container.inner.id);
        container
    }

    fn node(options: ContainerOptions, parent: Option<Container>) -> Self {
        let single_cache = parent.is_none().then(DashMap::new);
        Self {
            inner: Arc::new(ContainerInner {
                id: Uuid::new_v4(),
                created_at: Utc::now(),
                options,
                parent,
                registry: ProviderRegistry::new(),
                resolving: Mutex::new(HashSet::new()),
                scoped_cache: DashMap::new(),
                single_cache,
                tracker: LifecycleTracker::new(),
                probe: RwLock::new(None),
                fallback: RwLock::new(None),
            }),
        }
    }

    /// 容器标识
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// 创建时间
    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    /// 是否为根容器
    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// 容器配置
    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// 创建子作用域
    ///
    /// 子作用域继承覆盖策略，但作用域缓存、解析集与释放列表全部为空。
    pub fn begin_scope(&self) -> Self {
        let child = Self::node(self.inner.options.clone(), Some(self.clone()));
        info!("创建子作用域: {} (父容器: {})", child.inner.id, self.inner.id);
        child
    }

    /// 安装构造依赖探测能力（作用于整棵作用域树）
    pub fn install_dependency_probe(&self, probe: Arc<dyn DependencyProbe>) {
        *self.root().inner.probe.write() = Some(probe);
    }

    /// 安装零参构造回退能力（作用于整棵作用域树）
    pub fn install_construct_fallback(&self, fallback: Arc<dyn ConstructFallback>) {
        *self.root().inner.fallback.write() = Some(fallback);
    }

    // ── 注册 ──

    /// 注册单个提供者到本容器层
    pub fn register(&self, provider: Provider) -> DependencyResult<()> {
        self.inner.registry.register(provider, &self.inner.options)
    }

    /// 批量注册提供者，遇到第一个冲突即失败
    pub fn load(&self, providers: impl IntoIterator<Item = Provider>) -> DependencyResult<()> {
        for provider in providers {
            self.register(provider)?;
        }
        Ok(())
    }

    /// 指定类型（无限定符）是否可由本容器或其祖先解析到提供者
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.contains_key(&ProviderKey::of::<T>())
    }

    /// 指定复合键是否可由本容器或其祖先解析到提供者
    pub fn contains_key(&self, key: &ProviderKey) -> bool {
        self.lookup_provider(key).is_some()
    }

    // ── 解析（类型化入口） ──

    /// 同步解析指定类型（无限定符）
    pub fn get<T: Send + Sync + 'static>(&self) -> DependencyResult<Arc<T>> {
        self.get_with(None)
    }

    /// 同步解析指定类型
    ///
    /// 提供者的生产方法未能立即完成时返回
    /// [`DependencyError::SyncOnAsync`]，调用方应改用异步入口。
    pub fn get_with<T: Send + Sync + 'static>(
        &self,
        qualifier: Option<&str>,
    ) -> DependencyResult<Arc<T>> {
        let key = typed_key::<T>(qualifier);
        downcast_shared(&key, self.resolve_any(&key)?)
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
        let instance = self.resolve_any_async(&key).await?;
        downcast_shared(&key, instance)
    }

    // ── 解析引擎 ──

    /// 同步解析一个复合键（类型擦除）
    pub fn resolve_any(&self, key: &ProviderKey) -> DependencyResult<SharedInstance> {
        let Some(provider) = self.lookup_provider(key) else {
            return self.construct_unregistered(key);
        };
        if let Some(hit) = self.cache_lookup(provider.lifetime, key) {
            debug!("缓存命中: {}", key);
            return Ok(hit);
        }
        self.enter_resolving(key)?;
        let produced = self.produce_sync(&provider, key);
        self.leave_resolving(key);
        let instance = produced?;
        self.commit(&provider, key, &instance);
        Ok(instance)
    }

    /// 异步解析一个复合键（类型擦除）
    pub fn resolve_any_async<'a>(
        &'a self,
        key: &'a ProviderKey,
    ) -> BoxFuture<'a, DependencyResult<SharedInstance>> {
        async move {
            let Some(provider) = self.lookup_provider(key) else {
                return self.construct_unregistered(key);
            };
            if let Some(hit) = self.cache_lookup(provider.lifetime, key) {
                debug!("缓存命中: {}", key);
                return Ok(hit);
            }
            // 进入解析集发生在第一个挂起点之前，异步路径的循环检测同样同步生效
            self.enter_resolving(key)?;
            let produced = self.produce_async(&provider, key).await;
            self.leave_resolving(key);
            let instance = produced?;
            self.commit(&provider, key, &instance);
            Ok(instance)
        }
        .boxed()
    }

    fn produce_sync(
        &self,
        provider: &Provider,
        key: &ProviderKey,
    ) -> DependencyResult<SharedInstance> {
        match &provider.produce {
            Produce::Value(value) => Ok(value.clone()),
            Produce::Factory(factory) => factory(&self.context()),
            Produce::AsyncFactory(factory) => {
                // 只轮询一次，绝不阻塞等待：立即就绪的结果被接受，
                // 未完成则指引调用方使用异步入口
                match poll_once(factory(self.context())) {
                    Some(result) => result,
                    None => Err(DependencyError::SyncOnAsync {
                        key: key.to_string(),
                    }),
                }
            }
            Produce::Construct { ctor, deps } => {
                let deps = self.dependency_list(key, deps.as_deref());
                let mut resolved = Vec::with_capacity(deps.len());
                for dep in &deps {
                    resolved.push(self.resolve_any(dep)?);
                }
                ctor(resolved)
            }
        }
    }

    async fn produce_async(
        &self,
        provider: &Provider,
        key: &ProviderKey,
    ) -> DependencyResult<SharedInstance> {
        match &provider.produce {
            Produce::Value(value) => Ok(value.clone()),
            Produce::Factory(factory) => factory(&self.context()),
            Produce::AsyncFactory(factory) => factory(self.context()).await,
            Produce::Construct { ctor, deps } => {
                let deps = self.dependency_list(key, deps.as_deref());
                let mut resolved = Vec::with_capacity(deps.len());
                for dep in &deps {
                    resolved.push(self.resolve_any_async(dep).await?);
                }
                ctor(resolved)
            }
        }
    }

    // ── 覆盖控制 ──

    /// 在根作用域热替换一个提供者及其缓存实例
    ///
    /// 无视覆盖策略强制注册单例固定值提供者，并直接播种根单例缓存，
    /// 后续任何解析（包括子作用域发起的）都会观察到新值而不经过生产管线。
    pub fn override_value<T: Send + Sync + 'static>(&self, value: T, qualifier: Option<&str>) {
        let key = typed_key::<T>(qualifier);
        let instance: SharedInstance = Arc::new(value);
        let root = self.root();
        info!("覆盖提供者: {}", key);
        root.inner
            .registry
            .force_register(Provider::fixed_value(key.clone(), instance.clone()));
        if let Some(cache) = &root.inner.single_cache {
            cache.insert(key, instance);
        }
    }

    // ── 生命周期 ──

    /// 关闭本容器
    ///
    /// 按创建顺序的逆序执行本容器的释放钩子（单条失败只记录日志），
    /// 然后清空本容器的缓存；单例缓存仅在根容器关闭时清空。
    /// 不影响父容器或兄弟作用域。
    pub async fn shutdown(&self) {
        info!(
            "关闭容器: {} (待释放 {} 个实例)",
            self.inner.id,
            self.inner.tracker.len()
        );
        self.inner.tracker.drain().await;
        self.inner.scoped_cache.clear();
        if let Some(cache) = &self.inner.single_cache {
            cache.clear();
        }
    }

    /// 硬重置：清空注册表、缓存、解析集与释放列表，不执行任何钩子
    ///
    /// 面向测试隔离，不是优雅停机。
    pub fn reset(&self) {
        info!("重置容器: {}", self.inner.id);
        self.inner.registry.clear();
        self.inner.scoped_cache.clear();
        if let Some(cache) = &self.inner.single_cache {
            cache.clear();
        }
        self.inner.resolving.lock().clear();
        self.inner.tracker.clear();
    }

    // ── 内部 ──

    fn root(&self) -> Self {
        let mut current = self.clone();
        while let Some(parent) = current.inner.parent.clone() {
            current = parent;
        }
        current
    }

    fn context(&self) -> ResolveContext {
        ResolveContext::new(Arc::new(self.clone()))
    }

    /// 按提供者的生命周期探测对应的缓存
    ///
    /// 单例查根缓存，作用域查本层缓存，瞬时从不缓存。
    /// 缓存探测跟随查找到的提供者，子层遮蔽的键因此不会被
    /// 父层已缓存的单例实例拦截。
    fn cache_lookup(&self, lifetime: Lifetime, key: &ProviderKey) -> Option<SharedInstance> {
        match lifetime {
            Lifetime::Singleton => self
                .root()
                .inner
                .single_cache
                .as_ref()?
                .get(key)
                .map(|entry| entry.value().clone()),
            Lifetime::Scoped => self
                .inner
                .scoped_cache
                .get(key)
                .map(|entry| entry.value().clone()),
            Lifetime::Transient => None,
        }
    }

    /// 沿父链向上查找提供者，本层优先
    fn lookup_provider(&self, key: &ProviderKey) -> Option<Arc<Provider>> {
        let mut current = Some(self.clone());
        while let Some(container) = current {
            if let Some(found) = container.inner.registry.lookup(key) {
                return Some(found);
            }
            current = container.inner.parent.clone();
        }
        None
    }

    fn enter_resolving(&self, key: &ProviderKey) -> DependencyResult<()> {
        let mut resolving = self.inner.resolving.lock();
        if !resolving.insert(key.clone()) {
            return Err(DependencyError::CircularDependency {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn leave_resolving(&self, key: &ProviderKey) {
        self.inner.resolving.lock().remove(key);
    }

    /// 按生命周期缓存实例并追加释放记录
    ///
    /// 瞬时实例既不缓存也不追踪；单例进根缓存、作用域进本层缓存，
    /// 两者的释放记录都落在发起解析的容器上。
    fn commit(&self, provider: &Provider, key: &ProviderKey, instance: &SharedInstance) {
        match provider.lifetime {
            Lifetime::Singleton => {
                if let Some(cache) = &self.root().inner.single_cache {
                    cache.insert(key.clone(), instance.clone());
                }
            }
            Lifetime::Scoped => {
                self.inner.scoped_cache.insert(key.clone(), instance.clone());
            }
            Lifetime::Transient => {}
        }
        if provider.lifetime.is_tracked() {
            self.inner
                .tracker
                .track(key.clone(), instance.clone(), provider.dispose.clone());
        }
    }

    /// 显式依赖列表缺席时求助依赖探测能力，探测缺席则按零依赖处理
    fn dependency_list(
        &self,
        key: &ProviderKey,
        explicit: Option<&[ProviderKey]>,
    ) -> Vec<ProviderKey> {
        if let Some(deps) = explicit {
            return deps.to_vec();
        }
        let probe = self.root().inner.probe.read().clone();
        probe
            .and_then(|probe| probe.dependencies_of(key))
            .unwrap_or_default()
    }

    /// 未注册键的最后机会：零参构造回退
    ///
    /// 回退构造出的实例按瞬时语义处理（不缓存、不追踪释放）。
    fn construct_unregistered(&self, key: &ProviderKey) -> DependencyResult<SharedInstance> {
        let fallback = self.root().inner.fallback.read().clone();
        if let Some(fallback) = fallback {
            if let Some(result) = fallback.construct(key) {
                debug!("零参构造回退: {}", key);
                return result;
            }
        }
        Err(DependencyError::NoProvider {
            key: key.to_string(),
        })
    }
}

impl ScopeResolver for Container {
    fn resolve_any(&self, key: &ProviderKey) -> DependencyResult<SharedInstance> {
        Self::resolve_any(self, key)
    }

    fn resolve_any_async<'a>(
        &'a self,
        key: &'a ProviderKey,
    ) -> BoxFuture<'a, DependencyResult<SharedInstance>> {
        Self::resolve_any_async(self, key)
    }
}

/// 对 future 恰好轮询一次
///
/// 立即就绪返回 `Some`，未完成返回 `None`；唤醒器是空操作，
/// 因此这永远不会等待。
fn poll_once<F: std::future::Future>(future: F) -> Option<F::Output> {
    let mut future = Box::pin(future);
    let waker = futures::task::noop_waker();
    let mut cx = TaskContext::from_waker(&waker);
    match future.as_mut().poll(&mut cx) {
        Poll::Ready(output) => Some(output),
        Poll::Pending => None,
    }
}
