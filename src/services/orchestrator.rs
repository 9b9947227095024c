//! 分析调度
//!
//! 预警类型到分析器的唯一分发点，检测服务不直接引用具体分析器。

use crate::errors::AppError;
use crate::models::{AlertResult, AlertType, AnalysisContext, Subject};
use crate::services::analyzer::AnomalyAnalyzer;
use std::collections::HashMap;
use std::sync::Arc;

/// 分析调度器
pub struct AnalysisOrchestrator {
    analyzers: HashMap<AlertType, Arc<dyn AnomalyAnalyzer>>,
}

impl AnalysisOrchestrator {
    /// 构建分发表，同一类型重复注册时保留先注册者
    pub fn new(analyzers: Vec<Arc<dyn AnomalyAnalyzer>>) -> Self {
        let mut map: HashMap<AlertType, Arc<dyn AnomalyAnalyzer>> = HashMap::new();

        for analyzer in analyzers {
            let alert_type = analyzer.supported_type();
            if let Some(existing) = map.get(&alert_type) {
                tracing::warn!(
                    alert_type = %alert_type,
                    existing = existing.name(),
                    duplicate = analyzer.name(),
                    "分析器重复注册，保留已有实现"
                );
                continue;
            }
            map.insert(alert_type, analyzer);
        }

        let mut registered: Vec<String> = map.keys().map(|t| t.to_string()).collect();
        registered.sort();
        tracing::info!(count = map.len(), types = %registered.join(", "), "分析调度器已初始化");

        Self { analyzers: map }
    }

    pub fn is_supported(&self, alert_type: AlertType) -> bool {
        self.analyzers.contains_key(&alert_type)
    }

    /// 按类型分析，不支持的类型返回无预警
    pub async fn analyze_by_type(
        &self,
        alert_type: AlertType,
        subject: &Subject,
        context: &AnalysisContext,
    ) -> Result<AlertResult, AppError> {
        let Some(analyzer) = self.analyzers.get(&alert_type) else {
            tracing::debug!(alert_type = %alert_type, "无对应分析器，跳过");
            return Ok(AlertResult::no_alert());
        };

        tracing::debug!(
            alert_type = %alert_type,
            analyzer = analyzer.name(),
            subject_id = %subject.id,
            "执行异常分析"
        );
        analyzer.analyze(subject, context).await
    }
}
