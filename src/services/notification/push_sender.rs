//! 推送发送适配器

use super::{NotificationService, PushChannel};
use crate::errors::NotificationError;
use crate::models::{DeliveryReceipt, NotificationChannelType, NotificationRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// 把通知请求转换为具体推送渠道调用
pub struct PushNotificationSender {
    channel: Arc<dyn PushChannel>,
}

impl PushNotificationSender {
    pub fn new(channel: Arc<dyn PushChannel>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl NotificationService for PushNotificationSender {
    async fn send(&self, request: &NotificationRequest) -> Result<DeliveryReceipt, NotificationError> {
        let token = request
            .push_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                NotificationError::InvalidToken(format!("接收人 {} 未注册推送令牌", request.recipient_id))
            })?;

        if !self.channel.is_available() {
            return Err(NotificationError::ChannelUnavailable(self.channel.channel_type()));
        }

        let message_id = self
            .channel
            .send(token, &request.title, &request.body)
            .await?;

        tracing::debug!(
            recipient_id = %request.recipient_id,
            channel = %self.channel.channel_type(),
            message_id = %message_id,
            "推送已发送"
        );

        Ok(DeliveryReceipt::delivered(self.channel.channel_type(), Some(message_id)))
    }

    fn is_available(&self) -> bool {
        self.channel.is_available()
    }

    fn channel_type(&self) -> NotificationChannelType {
        self.channel.channel_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notification::LoggingPushChannel;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_missing_token_is_invalid() {
        let sender = PushNotificationSender::new(Arc::new(LoggingPushChannel::default()));
        let request = NotificationRequest::new(Uuid::new_v4(), Some("   ".into()), "제목", "본문");

        let err = sender.send(&request).await.unwrap_err();
        assert!(matches!(err, NotificationError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn test_delivered_with_message_id() {
        let sender = PushNotificationSender::new(Arc::new(LoggingPushChannel::default()));
        let request = NotificationRequest::new(Uuid::new_v4(), Some("token-1".into()), "제목", "본문");

        let receipt = sender.send(&request).await.unwrap();
        assert!(receipt.delivered);
        assert!(receipt.message_id.is_some());
    }
}
