//! 服务组装
//!
//! 启动时构建一次，之后只读共享。

use crate::config::Settings;
use crate::db::PostgresPool;
use crate::repositories::{
    AlertHistoryRepository, AlertHistoryStore, AlertRuleRepository, AlertRuleStore,
    InMemoryAlertHistoryStore, InMemoryAlertRuleStore, InMemoryNotificationHistoryStore,
    NotificationHistoryStore, NotificationRepository,
};
use crate::services::{
    AlertHistoryService, AlertNotificationService, AlertSweepService, AnalysisOrchestrator,
    AnomalyAnalyzer, CheckInProvider, DetectionService, EmotionPatternAnalyzer, FailureRecovery,
    KeywordAnalyzer, LoggingRecovery, MessageProvider, NoResponseAnalyzer,
    NotificationHistoryService, NotificationPipeline, PipelineComponents, PushChannel,
    PushNotificationSender, SubjectDirectory,
};
use std::sync::Arc;

/// 外部协作方
#[derive(Clone)]
pub struct Collaborators {
    pub subjects: Arc<dyn SubjectDirectory>,
    pub messages: Arc<dyn MessageProvider>,
    pub check_ins: Arc<dyn CheckInProvider>,
    pub primary_push: Arc<dyn PushChannel>,
    pub secondary_push: Option<Arc<dyn PushChannel>>,
    pub recovery: Arc<dyn FailureRecovery>,
}

impl Collaborators {
    pub fn new(
        subjects: Arc<dyn SubjectDirectory>,
        messages: Arc<dyn MessageProvider>,
        check_ins: Arc<dyn CheckInProvider>,
        primary_push: Arc<dyn PushChannel>,
    ) -> Self {
        Self {
            subjects,
            messages,
            check_ins,
            primary_push,
            secondary_push: None,
            recovery: Arc::new(LoggingRecovery),
        }
    }

    pub fn with_secondary_push(mut self, channel: Arc<dyn PushChannel>) -> Self {
        self.secondary_push = Some(channel);
        self
    }

    pub fn with_recovery(mut self, recovery: Arc<dyn FailureRecovery>) -> Self {
        self.recovery = recovery;
        self
    }
}

/// 存储组合
#[derive(Clone)]
pub struct Stores {
    pub rules: Arc<dyn AlertRuleStore>,
    pub alert_history: Arc<dyn AlertHistoryStore>,
    pub notification_history: Arc<dyn NotificationHistoryStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            rules: Arc::new(InMemoryAlertRuleStore::new()),
            alert_history: Arc::new(InMemoryAlertHistoryStore::new()),
            notification_history: Arc::new(InMemoryNotificationHistoryStore::new()),
        }
    }

    pub fn postgres(pool: PostgresPool) -> Self {
        Self {
            rules: Arc::new(AlertRuleRepository::new(pool.clone())),
            alert_history: Arc::new(AlertHistoryRepository::new(pool.clone())),
            notification_history: Arc::new(NotificationRepository::new(pool)),
        }
    }
}

/// 组装完成的核心服务
pub struct CareCore {
    pub stores: Stores,
    pub detection: Arc<DetectionService>,
    pub notifier: Arc<AlertNotificationService>,
    pub pipeline: Arc<NotificationPipeline>,
    pub sweep: Arc<AlertSweepService>,
    pub alert_history: AlertHistoryService,
    pub notification_history: NotificationHistoryService,
}

impl CareCore {
    pub fn build(settings: &Settings, stores: Stores, collaborators: Collaborators) -> Self {
        let alert = &settings.alert;

        let analyzers: Vec<Arc<dyn AnomalyAnalyzer>> = vec![
            Arc::new(EmotionPatternAnalyzer::new(
                collaborators.messages.clone(),
                alert.emotion.clone(),
            )),
            Arc::new(NoResponseAnalyzer::new(
                collaborators.check_ins.clone(),
                alert.no_response.clone(),
            )),
            Arc::new(KeywordAnalyzer::new(&alert.keyword)),
        ];
        let orchestrator = Arc::new(AnalysisOrchestrator::new(analyzers));

        let detection = Arc::new(DetectionService::new(
            stores.rules.clone(),
            collaborators.subjects.clone(),
            orchestrator,
            alert,
        ));

        let mut components = PipelineComponents::new(Arc::new(PushNotificationSender::new(
            collaborators.primary_push.clone(),
        )))
        .with_history(stores.notification_history.clone())
        .with_recovery(collaborators.recovery.clone());
        if let Some(secondary) = collaborators.secondary_push.clone() {
            components = components.with_secondary(Arc::new(PushNotificationSender::new(secondary)));
        }
        let pipeline = Arc::new(NotificationPipeline::new(components, &settings.notification));

        let notifier = Arc::new(AlertNotificationService::new(
            collaborators.subjects.clone(),
            stores.alert_history.clone(),
            pipeline.clone(),
            alert.clone(),
        ));

        let sweep = Arc::new(AlertSweepService::new(
            detection.clone(),
            notifier.clone(),
            alert.sweep_concurrency,
        ));

        Self {
            alert_history: AlertHistoryService::new(stores.alert_history.clone()),
            notification_history: NotificationHistoryService::new(stores.notification_history.clone()),
            stores,
            detection,
            notifier,
            pipeline,
            sweep,
        }
    }
}
