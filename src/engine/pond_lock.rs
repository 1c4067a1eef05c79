// ==========================================
// 鱼塘养殖管理系统 - 池塘级串行锁
// ==========================================
// 职责: 同一池塘的抽样写入与级联重算串行执行
// 说明: 不同池塘互不阻塞；注册表只在取锁时短暂持有
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct PondLockRegistry {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl PondLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, pond_id: i64) -> Result<Arc<Mutex<()>>, String> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| format!("池塘锁注册表获取失败: {}", e))?;
        Ok(locks.entry(pond_id).or_default().clone())
    }

    /// 持有池塘锁执行 f
    pub fn with_pond<T>(&self, pond_id: i64, f: impl FnOnce() -> T) -> Result<T, String> {
        let lock = self.lock_for(pond_id)?;
        let _guard = lock
            .lock()
            .map_err(|e| format!("池塘锁获取失败: pond_id={}, {}", pond_id, e))?;
        Ok(f())
    }

    /// 已登记的池塘数
    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
