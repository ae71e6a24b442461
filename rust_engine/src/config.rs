//! 引擎运行时配置
//!
//! 参数扁平化，进程内全局共享。

use once_cell::sync::Lazy;
use std::sync::{PoisonError, RwLock};

/// 引擎配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    // ========== 蒙皮 ==========
    /// 是否允许用 rayon 并行蒙皮，默认 true
    pub parallel_skinning: bool,
    /// 顶点数达到此值才走并行路径，默认 4096
    pub parallel_threshold: usize,

    // ========== 调试 ==========
    /// 是否输出逐帧调试日志，默认 false
    pub debug_log: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_skinning: true,
            parallel_threshold: 4096,
            debug_log: false,
        }
    }
}

impl EngineConfig {
    /// 给定顶点数时是否应并行蒙皮
    pub fn use_parallel(&self, vertex_count: usize) -> bool {
        self.parallel_skinning && vertex_count >= self.parallel_threshold
    }
}

/// 全局配置实例
static ENGINE_CONFIG: Lazy<RwLock<EngineConfig>> =
    Lazy::new(|| RwLock::new(EngineConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> EngineConfig {
    ENGINE_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: EngineConfig) {
    *ENGINE_CONFIG.write().unwrap_or_else(PoisonError::into_inner) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(EngineConfig::default());
}
