//! 通知历史记录层

use super::NotificationService;
use crate::errors::NotificationError;
use crate::models::{DeliveryReceipt, NewNotificationHistory, NotificationChannelType, NotificationRequest};
use crate::repositories::NotificationHistoryStore;
use async_trait::async_trait;
use std::sync::Arc;

const RETURNED_FALSE: &str = "Notification service returned false";

/// 记录内层的最终结果并原样返回；写历史失败只记日志
pub struct NotificationHistoryRecorder {
    inner: Arc<dyn NotificationService>,
    store: Arc<dyn NotificationHistoryStore>,
}

impl NotificationHistoryRecorder {
    pub fn new(inner: Arc<dyn NotificationService>, store: Arc<dyn NotificationHistoryStore>) -> Self {
        Self { inner, store }
    }

    fn entry_for(
        &self,
        request: &NotificationRequest,
        outcome: &Result<DeliveryReceipt, NotificationError>,
    ) -> NewNotificationHistory {
        match outcome {
            Ok(receipt) if receipt.delivered => {
                NewNotificationHistory::success(request, receipt.channel, receipt.message_id.clone())
            }
            Ok(receipt) => NewNotificationHistory::failure(request, receipt.channel, RETURNED_FALSE),
            Err(e) => NewNotificationHistory::failure(
                request,
                self.inner.channel_type(),
                format!("Exception occurred: {}", e),
            ),
        }
    }
}

#[async_trait]
impl NotificationService for NotificationHistoryRecorder {
    async fn send(&self, request: &NotificationRequest) -> Result<DeliveryReceipt, NotificationError> {
        let outcome = self.inner.send(request).await;
        let entry = self.entry_for(request, &outcome);
        let success = entry.success;

        if let Err(e) = self.store.append(entry).await {
            tracing::error!(
                recipient_id = %request.recipient_id,
                success,
                error = %e,
                "通知历史写入失败"
            );
        }

        outcome
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn channel_type(&self) -> NotificationChannelType {
        self.inner.channel_type()
    }
}
