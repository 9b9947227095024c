//! 通知投递管道
//!
//! 调用顺序固定为：重试 → 历史记录 → 主备切换 → 主渠道。
//! 历史层观察主备切换后的最终结果，重试层每次都重新执行"切换 + 记录"整体。

mod channels;
mod fallback;
mod history_recorder;
mod pipeline;
mod push_sender;
mod retry;

pub use channels::LoggingPushChannel;
pub use fallback::FallbackNotificationService;
pub use history_recorder::NotificationHistoryRecorder;
pub use pipeline::{NotificationPipeline, PipelineComponents};
pub use push_sender::PushNotificationSender;
pub use retry::{FailureRecovery, LoggingRecovery, RetryingNotificationService};

use crate::errors::NotificationError;
use crate::models::{DeliveryReceipt, NotificationChannelType, NotificationRequest};
use async_trait::async_trait;

/// 通知服务（管道中的每一层都实现它）
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// 发送通知；`Ok` 且 `delivered == false` 表示渠道正常返回但未送达
    async fn send(&self, request: &NotificationRequest) -> Result<DeliveryReceipt, NotificationError>;

    fn is_available(&self) -> bool;

    fn channel_type(&self) -> NotificationChannelType;
}

/// 具体推送渠道（FCM、APNs 等由外部实现）
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// 发送推送，成功返回渠道侧消息 ID
    async fn send(&self, token: &str, title: &str, body: &str) -> Result<String, NotificationError>;

    fn is_available(&self) -> bool;

    fn channel_type(&self) -> NotificationChannelType;
}
