//! 开发用推送渠道

use super::PushChannel;
use crate::errors::NotificationError;
use crate::models::NotificationChannelType;
use async_trait::async_trait;
use uuid::Uuid;

/// 只写日志、总是成功的推送渠道，用作开发环境的备用渠道
#[derive(Debug, Clone)]
pub struct LoggingPushChannel {
    channel_type: NotificationChannelType,
}

impl LoggingPushChannel {
    pub fn new(channel_type: NotificationChannelType) -> Self {
        Self { channel_type }
    }
}

impl Default for LoggingPushChannel {
    fn default() -> Self {
        Self::new(NotificationChannelType::InApp)
    }
}

#[async_trait]
impl PushChannel for LoggingPushChannel {
    async fn send(&self, token: &str, title: &str, body: &str) -> Result<String, NotificationError> {
        let message_id = format!("log-{}", Uuid::new_v4());
        tracing::info!(
            channel = %self.channel_type,
            token_len = token.len(),
            title = %title,
            body = %body,
            message_id = %message_id,
            "通知已写入日志"
        );
        Ok(message_id)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn channel_type(&self) -> NotificationChannelType {
        self.channel_type
    }
}
