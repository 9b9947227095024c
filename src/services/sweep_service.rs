//! 批量巡检与实时消息处理
//!
//! 调度本身由外部触发，这里只负责一次巡检的执行。

use crate::errors::AppError;
use crate::models::ConversationMessage;
use crate::services::{AlertNotificationService, DetectionService};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// 一次巡检的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 新写入的预警数（不含同日重复）
    pub alerts_triggered: usize,
}

/// 预警巡检服务
pub struct AlertSweepService {
    detection: Arc<DetectionService>,
    notifier: Arc<AlertNotificationService>,
    concurrency: usize,
}

impl AlertSweepService {
    pub fn new(
        detection: Arc<DetectionService>,
        notifier: Arc<AlertNotificationService>,
        concurrency: usize,
    ) -> Self {
        Self {
            detection,
            notifier,
            concurrency: concurrency.max(1),
        }
    }

    /// 对一个对象执行检测并触发预警，返回新写入的预警数
    ///
    /// 单条预警触发失败只记录日志，其余预警照常触发；全部失败时返回第一个错误。
    pub async fn process_subject(&self, subject_id: Uuid) -> Result<usize, AppError> {
        let results = self.detection.detect_anomalies(subject_id).await?;
        let mut triggered = 0;
        let mut first_error = None;
        let mut failures = 0;

        for result in &results {
            match self.notifier.trigger(subject_id, result).await {
                Ok(outcome) => {
                    if !outcome.duplicate {
                        triggered += 1;
                    }
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!(
                        subject_id = %subject_id,
                        alert_type = ?result.alert_type,
                        error = %e,
                        "预警触发失败"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if failures == results.len() => Err(e),
            _ => Ok(triggered),
        }
    }

    /// 巡检一批对象，单个对象失败只记录不中断
    pub async fn sweep(&self, subject_ids: &[Uuid]) -> SweepReport {
        tracing::info!(subjects = subject_ids.len(), concurrency = self.concurrency, "开始预警巡检");

        let outcomes: Vec<(Uuid, Result<usize, AppError>)> = stream::iter(subject_ids.iter().copied())
            .map(|subject_id| async move { (subject_id, self.process_subject(subject_id).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = SweepReport::default();
        for (subject_id, outcome) in outcomes {
            report.processed += 1;
            match outcome {
                Ok(triggered) => {
                    report.succeeded += 1;
                    report.alerts_triggered += triggered;
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(subject_id = %subject_id, error = %e, "对象巡检失败");
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            alerts_triggered = report.alerts_triggered,
            "预警巡检完成"
        );
        report
    }

    /// 实时处理一条新消息：命中关键词时立即触发预警
    pub async fn process_message(
        &self,
        subject_id: Uuid,
        message: &ConversationMessage,
    ) -> Result<Option<Uuid>, AppError> {
        let result = self.detection.detect_keyword_alert(message, subject_id).await?;
        if !result.detected {
            return Ok(None);
        }

        let history_id = self.notifier.trigger_alert(subject_id, &result).await?;
        Ok(Some(history_id))
    }
}
