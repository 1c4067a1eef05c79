// ==========================================
// 鱼塘养殖管理系统 - 引擎层事件发布
// ==========================================
// 职责: 定义派生指标事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，上层（通知/缓存刷新）实现适配器
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 事件类型
// ==========================================

/// 派生指标事件类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricsEventType {
    /// 生长链（抽样派生值）已重算
    GrowthChainUpdated,
    /// 生成了新的投喂建议
    AdviceGenerated,
    /// 存活快照已重算
    SurvivalRecalculated,
    /// 手动触发（全量重算）
    ManualTrigger,
}

impl MetricsEventType {
    pub fn as_str(&self) -> &str {
        match self {
            MetricsEventType::GrowthChainUpdated => "GrowthChainUpdated",
            MetricsEventType::AdviceGenerated => "AdviceGenerated",
            MetricsEventType::SurvivalRecalculated => "SurvivalRecalculated",
            MetricsEventType::ManualTrigger => "ManualTrigger",
        }
    }
}

/// 派生指标事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsEvent {
    pub pond_id: i64,
    pub species_id: Option<i64>,
    pub event_type: MetricsEventType,
    /// 事件来源描述
    pub source: Option<String>,
    /// 受影响记录的起始日期（None 表示整塘）
    pub affected_from: Option<NaiveDate>,
    /// 受影响的记录数
    pub affected_records: usize,
}

impl MetricsEvent {
    /// 整塘事件
    pub fn pond_wide(pond_id: i64, event_type: MetricsEventType, source: Option<String>) -> Self {
        Self {
            pond_id,
            species_id: None,
            event_type,
            source,
            affected_from: None,
            affected_records: 0,
        }
    }

    /// 从某日期起的增量事件
    pub fn from_date(
        pond_id: i64,
        species_id: Option<i64>,
        event_type: MetricsEventType,
        source: Option<String>,
        affected_from: NaiveDate,
        affected_records: usize,
    ) -> Self {
        Self {
            pond_id,
            species_id,
            event_type,
            source,
            affected_from: Some(affected_from),
            affected_records,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 派生指标事件发布者
///
/// # 返回
/// - `Ok(task_id)`: 下游任务 ID（如果支持）或空字符串
/// - `Err`: 发布失败（调用方只记日志，不回滚已写入的派生值）
pub trait MetricsEventPublisher: Send + Sync {
    fn publish(&self, event: MetricsEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl MetricsEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: MetricsEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - pond_id={}, event_type={}",
            event.pond_id,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn MetricsEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn MetricsEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: MetricsEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - pond_id={}, event_type={}",
                    event.pond_id,
                    event.event_type.as_str()
                );
                Ok(String::new())
            }
        }
    }

    /// 发布失败只记录告警
    pub fn publish_or_warn(&self, event: MetricsEvent) {
        let pond_id = event.pond_id;
        let event_type = event.event_type.as_str().to_string();
        if let Err(e) = self.publish(event) {
            tracing::warn!(pond_id, event_type = %event_type, error = %e, "事件发布失败");
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    pub fn inner(&self) -> Option<Arc<dyn MetricsEventPublisher>> {
        self.inner.clone()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
