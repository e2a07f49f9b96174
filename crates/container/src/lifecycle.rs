//! 实例释放追踪
//!
//! 每个容器节点独立记录自己创建的可释放实例，
//! 关闭时按创建顺序的逆序执行释放钩子。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rong_abstractions::{DisposeFn, SharedInstance};
use rong_common::ProviderKey;
use tracing::{debug, warn};

/// 释放记录
pub struct DisposalRecord {
    /// 实例对应的复合键
    pub key: ProviderKey,
    /// 实例本体
    pub instance: SharedInstance,
    /// 可选的释放钩子；缺席时关闭流程直接跳过该实例
    pub hook: Option<DisposeFn>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 生命周期追踪器
///
/// 追加式列表；消费（关闭）与清空（重置）都只影响本容器。
#[derive(Default)]
pub struct LifecycleTracker {
    records: Mutex<Vec<DisposalRecord>>,
}

impl LifecycleTracker {
    /// 创建空追踪器
    pub fn new() -> Self {
        Self::default()
    }

    /// 在创建时点追加一条释放记录
    pub fn track(&self, key: ProviderKey, instance: SharedInstance, hook: Option<DisposeFn>) {
        debug!("追踪实例释放: {}", key);
        self.records.lock().push(DisposalRecord {
            key,
            instance,
            hook,
            created_at: Utc::now(),
        });
    }

    /// 当前记录数量
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// 是否没有记录
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// 清空记录而不执行任何钩子（硬重置路径）
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// 逆序执行全部释放钩子并清空记录
    ///
    /// 单条钩子的失败只记录日志，绝不阻断其余实例的释放。
    /// 记录先整体移出锁外，异步钩子执行期间不持有任何锁。
    pub async fn drain(&self) {
        let records = std::mem::take(&mut *self.records.lock());
        for record in records.into_iter().rev() {
            let Some(hook) = record.hook else { continue };
            debug!("释放实例: {}", record.key);
            if let Err(error) = hook(record.instance).await {
                warn!("释放钩子执行失败: {}, 原因: {error}, 已忽略", record.key);
            }
        }
    }
}
