//! 提供者注册表
//!
//! 二级映射：类型标识 -> 限定符 -> 提供者。每个容器节点持有自己的
//! 注册层，父链查找由容器完成，注册表本身只管本层。

use parking_lot::RwLock;
use rong_abstractions::Provider;
use rong_common::{ContainerOptions, DependencyError, DependencyResult, ProviderKey};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

type QualifierMap = HashMap<Option<String>, Arc<Provider>>;

/// 单个容器层的提供者注册表
#[derive(Default)]
pub struct ProviderRegistry {
    entries: RwLock<HashMap<TypeId, QualifierMap>>,
}

impl ProviderRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册提供者，按容器配置执行覆盖策略
    ///
    /// 同一复合键已存在时：覆盖被禁止或策略为报错则注册失败，
    /// 策略为后者生效则静默替换。失败不影响既有注册。
    pub fn register(
        &self,
        provider: Provider,
        options: &ContainerOptions,
    ) -> DependencyResult<()> {
        let key = provider.key.clone();
        let qualifier = key.qualifier().map(str::to_owned);
        let mut entries = self.entries.write();
        let slot = entries.entry(key.type_id()).or_default();
        if slot.contains_key(&qualifier) {
            if !options.replaces_on_duplicate() {
                return Err(DependencyError::DuplicateProvider {
                    key: key.to_string(),
                });
            }
            debug!("覆盖已注册的提供者: {}", key);
        }
        info!("注册提供者: {} ({:?})", key, provider.lifetime);
        slot.insert(qualifier, Arc::new(provider));
        Ok(())
    }

    /// 无条件注册，绕过覆盖策略（覆盖控制器专用）
    pub fn force_register(&self, provider: Provider) {
        let key = provider.key.clone();
        let qualifier = key.qualifier().map(str::to_owned);
        self.entries
            .write()
            .entry(key.type_id())
            .or_default()
            .insert(qualifier, Arc::new(provider));
    }

    /// 查找本层的提供者，限定符按精确值相等比较
    pub fn lookup(&self, key: &ProviderKey) -> Option<Arc<Provider>> {
        let entries = self.entries.read();
        entries
            .get(&key.type_id())?
            .get(&key.qualifier().map(str::to_owned))
            .cloned()
    }

    /// 本层是否注册了指定键
    pub fn contains(&self, key: &ProviderKey) -> bool {
        self.lookup(key).is_some()
    }

    /// 本层注册的提供者数量
    pub fn len(&self) -> usize {
        self.entries.read().values().map(QualifierMap::len).sum()
    }

    /// 本层是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 本层注册的全部复合键
    pub fn keys(&self) -> Vec<ProviderKey> {
        self.entries
            .read()
            .values()
            .flat_map(|slot| slot.values().map(|provider| provider.key.clone()))
            .collect()
    }

    /// 清空本层注册
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
