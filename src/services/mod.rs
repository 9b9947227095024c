//! 业务逻辑层（Service）

pub mod analyzer;
pub mod notification;

mod alert_history_service;
mod alert_notification_service;
mod detection_service;
mod notification_history_service;
mod orchestrator;
mod providers;
mod sweep_service;

pub use alert_history_service::AlertHistoryService;
pub use alert_notification_service::{AlertNotificationService, TriggeredAlert};
pub use analyzer::{AnomalyAnalyzer, EmotionPatternAnalyzer, KeywordAnalyzer, NoResponseAnalyzer};
pub use detection_service::DetectionService;
pub use notification::{
    FailureRecovery, FallbackNotificationService, LoggingPushChannel, LoggingRecovery,
    NotificationHistoryRecorder, NotificationPipeline, NotificationService,
    PipelineComponents, PushChannel, PushNotificationSender, RetryingNotificationService,
};
pub use notification_history_service::NotificationHistoryService;
pub use orchestrator::AnalysisOrchestrator;
pub use providers::{require_subject, CheckInProvider, MessageProvider, SubjectDirectory};
pub use sweep_service::{AlertSweepService, SweepReport};
