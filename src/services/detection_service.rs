//! 异常检测服务

use crate::config::AlertSettings;
use crate::errors::AppError;
use crate::models::{AlertResult, AlertRule, AlertType, AnalysisContext, ConversationMessage};
use crate::repositories::AlertRuleStore;
use crate::services::{require_subject, AnalysisOrchestrator, SubjectDirectory};
use std::cmp::Reverse;
use std::sync::Arc;
use uuid::Uuid;

/// 异常检测服务
pub struct DetectionService {
    rules: Arc<dyn AlertRuleStore>,
    subjects: Arc<dyn SubjectDirectory>,
    orchestrator: Arc<AnalysisOrchestrator>,
    analysis_days: u32,
}

impl DetectionService {
    pub fn new(
        rules: Arc<dyn AlertRuleStore>,
        subjects: Arc<dyn SubjectDirectory>,
        orchestrator: Arc<AnalysisOrchestrator>,
        settings: &AlertSettings,
    ) -> Self {
        Self {
            rules,
            subjects,
            orchestrator,
            analysis_days: settings.analysis_days,
        }
    }

    /// 按启用规则批量检测
    ///
    /// 关键词规则由实时路径处理，这里跳过。结果按规则顺序排列，并标记来源规则。
    pub async fn detect_anomalies(&self, subject_id: Uuid) -> Result<Vec<AlertResult>, AppError> {
        let subject = require_subject(self.subjects.as_ref(), subject_id).await?;
        let rules = self.rules.find_active_rules(subject_id).await?;

        let mut detected = Vec::new();
        for rule in rules {
            if rule.alert_type == AlertType::KeywordDetection {
                continue;
            }
            if !self.orchestrator.is_supported(rule.alert_type) {
                tracing::debug!(rule_id = %rule.id, alert_type = %rule.alert_type, "不支持的规则类型，跳过");
                continue;
            }

            let context = AnalysisContext::for_type(rule.alert_type, self.analysis_days);
            let result = self
                .orchestrator
                .analyze_by_type(rule.alert_type, &subject, &context)
                .await?;

            if result.detected {
                tracing::info!(subject_id = %subject_id, rule_id = %rule.id, result = %result, "检测到异常");
                detected.push(result.with_rule(rule.id));
            }
        }

        Ok(detected)
    }

    /// 实时关键词检测，不经过规则表
    pub async fn detect_keyword_alert(
        &self,
        message: &ConversationMessage,
        subject_id: Uuid,
    ) -> Result<AlertResult, AppError> {
        let subject = require_subject(self.subjects.as_ref(), subject_id).await?;
        let context = AnalysisContext::for_keyword(message.clone());

        let result = self
            .orchestrator
            .analyze_by_type(AlertType::KeywordDetection, &subject, &context)
            .await?;

        if result.detected {
            tracing::warn!(subject_id = %subject_id, result = %result, "实时关键词预警");
        }
        Ok(result)
    }

    pub async fn get_active_rules(&self, subject_id: Uuid) -> Result<Vec<AlertRule>, AppError> {
        self.rules.find_active_rules(subject_id).await
    }

    /// 按级别降序、类型、创建时间倒序排列的启用规则
    pub async fn get_active_rules_ordered_by_priority(
        &self,
        subject_id: Uuid,
    ) -> Result<Vec<AlertRule>, AppError> {
        let mut rules = self.rules.find_active_rules(subject_id).await?;
        rules.sort_by_key(|r| (Reverse(r.alert_level), r.alert_type, Reverse(r.created_at)));
        Ok(rules)
    }
}
