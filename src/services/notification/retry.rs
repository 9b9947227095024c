//! 重试层（管道最外层）

use super::NotificationService;
use crate::config::RetrySettings;
use crate::errors::NotificationError;
use crate::models::{DeliveryReceipt, NotificationChannelType, NotificationRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// 重试耗尽后的收尾处理
#[async_trait]
pub trait FailureRecovery: Send + Sync {
    async fn recover(&self, request: &NotificationRequest, error: &NotificationError);
}

/// 默认收尾：记录错误日志
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRecovery;

#[async_trait]
impl FailureRecovery for LoggingRecovery {
    async fn recover(&self, request: &NotificationRequest, error: &NotificationError) {
        tracing::error!(
            recipient_id = %request.recipient_id,
            source_entity_id = ?request.source_entity_id,
            title = %request.title,
            error = %error,
            "通知最终发送失败"
        );
    }
}

/// 把"未送达"视为可重试错误，按指数退避重试整个内层
///
/// 调用方永远不会收到错误：耗尽后调用一次收尾处理并返回未送达回执。
pub struct RetryingNotificationService {
    inner: Arc<dyn NotificationService>,
    recovery: Arc<dyn FailureRecovery>,
    settings: RetrySettings,
}

impl RetryingNotificationService {
    pub fn new(
        inner: Arc<dyn NotificationService>,
        recovery: Arc<dyn FailureRecovery>,
        settings: RetrySettings,
    ) -> Self {
        Self {
            inner,
            recovery,
            settings,
        }
    }
}

#[async_trait]
impl NotificationService for RetryingNotificationService {
    async fn send(&self, request: &NotificationRequest) -> Result<DeliveryReceipt, NotificationError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempts = 0;
        let mut last_error = NotificationError::SendFailed("未执行发送".to_string());

        while attempts < max_attempts {
            attempts += 1;

            match self.inner.send(request).await {
                Ok(receipt) if receipt.delivered => {
                    if attempts > 1 {
                        tracing::info!(recipient_id = %request.recipient_id, attempts, "重试后发送成功");
                    }
                    return Ok(receipt);
                }
                Ok(_) => {
                    last_error = NotificationError::SendFailed(
                        "Notification service returned false".to_string(),
                    );
                }
                Err(e) => last_error = e,
            }

            if !last_error.is_retryable() {
                break;
            }

            tracing::warn!(
                recipient_id = %request.recipient_id,
                attempt = attempts,
                max_attempts,
                error = %last_error,
                "通知发送失败"
            );

            if attempts < max_attempts {
                let delay = self.settings.delay_ms(attempts);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        let exhausted = NotificationError::RetryExhausted {
            attempts,
            last_error: last_error.to_string(),
        };
        self.recovery.recover(request, &exhausted).await;

        Ok(DeliveryReceipt::not_delivered(self.inner.channel_type()))
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn channel_type(&self) -> NotificationChannelType {
        self.inner.channel_type()
    }
}
