// ==========================================
// 鱼塘养殖管理系统 - 应用层
// ==========================================
// 职责: 组装应用状态，供命令行与上层服务调用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
