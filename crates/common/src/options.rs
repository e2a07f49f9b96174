//! 容器配置选项

use serde::{Deserialize, Serialize};

/// 提供者覆盖策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideStrategy {
    /// 重复注册报错
    Error,
    /// 后注册者静默替换先注册者
    LastWins,
}

/// 容器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// 是否允许覆盖已注册的提供者
    pub allow_override: bool,
    /// 覆盖策略；未指定时由 [`effective_strategy`](ContainerOptions::effective_strategy) 推导
    pub override_strategy: Option<OverrideStrategy>,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            allow_override: false,
            override_strategy: None,
        }
    }
}

impl ContainerOptions {
    /// 创建默认配置（不允许覆盖）
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置是否允许覆盖
    #[must_use]
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// 显式指定覆盖策略
    #[must_use]
    pub fn override_strategy(mut self, strategy: OverrideStrategy) -> Self {
        self.override_strategy = Some(strategy);
        self
    }

    /// 实际生效的覆盖策略
    ///
    /// 显式指定时以指定值为准；否则允许覆盖默认 `LastWins`，
    /// 不允许覆盖默认 `Error`。
    pub fn effective_strategy(&self) -> OverrideStrategy {
        self.override_strategy.unwrap_or(if self.allow_override {
            OverrideStrategy::LastWins
        } else {
            OverrideStrategy::Error
        })
    }

    /// 重复注册是否应当替换旧提供者
    pub fn replaces_on_duplicate(&self) -> bool {
        self.allow_override && self.effective_strategy() == OverrideStrategy::LastWins
    }
}
