// ==========================================
// 鱼塘养殖管理系统 - 配置层
// ==========================================
// 职责: 计算引擎可调参数（阈值、回看窗口、季节月份）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, EngineConfig};
