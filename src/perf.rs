// ==========================================
// 鱼塘养殖管理系统 - 性能统计
// ==========================================
// 职责: 入口耗时、SQL 语句计数、慢语句告警
// 开关: FISH_FARM_PERF_SQL（默认 Debug 开、Release 关）
//       FISH_FARM_SLOW_SQL_MS（慢语句阈值，毫秒）
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 0 表示不告警
static SLOW_SQL_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// (语句数, 慢语句数)，按线程累计
    static SQL_COUNTERS: Cell<(u64, u64)> = const { Cell::new((0, 0)) };
}

/// 语句统计设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlPerfSettings {
    pub enabled: bool,
    pub slow_ms: u64,
}

impl SqlPerfSettings {
    /// 由环境变量值解析（None 表示未设置）
    pub fn parse(enabled: Option<&str>, slow_ms: Option<&str>) -> Self {
        let enabled = enabled.map_or(cfg!(debug_assertions), |v| {
            matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on")
        });
        let slow_ms = slow_ms
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        Self { enabled, slow_ms }
    }

    pub fn from_env() -> Self {
        Self::parse(
            std::env::var("FISH_FARM_PERF_SQL").ok().as_deref(),
            std::env::var("FISH_FARM_SLOW_SQL_MS").ok().as_deref(),
        )
    }
}

/// 在连接上挂载语句 profile 回调
pub fn install_sqlite_tracing(conn: &mut Connection) {
    install_with(conn, SqlPerfSettings::from_env());
}

fn install_with(conn: &mut Connection, settings: SqlPerfSettings) {
    if !settings.enabled {
        conn.profile(None);
        return;
    }
    SLOW_SQL_MS.store(settings.slow_ms, Ordering::Relaxed);
    conn.profile(Some(on_statement));
}

fn on_statement(sql: &str, duration: Duration) {
    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_MS.load(Ordering::Relaxed);
    let slow = threshold > 0 && ms >= threshold;
    if slow {
        let sql: String = sql.split_whitespace().collect::<Vec<_>>().join(" ");
        let short: String = sql.chars().take(400).collect();
        tracing::warn!(target: "slow_sql", duration_ms = ms, sql = %short, "慢 SQL");
    }
    SQL_COUNTERS.with(|c| {
        let (total, slow_total) = c.get();
        c.set((total.saturating_add(1), slow_total.saturating_add(slow as u64)));
    });
}

fn counters() -> (u64, u64) {
    SQL_COUNTERS.with(|c| c.get())
}

/// 入口统计：drop 时输出耗时与期间执行的语句数
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    counters_at_start: (u64, u64),
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            start: Instant::now(),
            counters_at_start: counters(),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let (total, slow) = counters();
        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            sql_count = total.saturating_sub(self.counters_at_start.0),
            slow_sql_count = slow.saturating_sub(self.counters_at_start.1),
            "done"
        );
    }
}
