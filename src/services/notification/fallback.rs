//! 主备渠道切换

use super::NotificationService;
use crate::errors::NotificationError;
use crate::models::{DeliveryReceipt, NotificationChannelType, NotificationRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// 主渠道不可用、出错或返回未送达时改用备用渠道
pub struct FallbackNotificationService {
    primary: Arc<dyn NotificationService>,
    secondary: Arc<dyn NotificationService>,
}

impl FallbackNotificationService {
    pub fn new(primary: Arc<dyn NotificationService>, secondary: Arc<dyn NotificationService>) -> Self {
        Self { primary, secondary }
    }

    async fn try_channel(
        service: &dyn NotificationService,
        request: &NotificationRequest,
        role: &'static str,
    ) -> Option<DeliveryReceipt> {
        if !service.is_available() {
            tracing::warn!(role, channel = %service.channel_type(), "通知渠道不可用");
            return None;
        }

        match service.send(request).await {
            Ok(receipt) if receipt.delivered => Some(receipt),
            Ok(_) => {
                tracing::warn!(role, channel = %service.channel_type(), recipient_id = %request.recipient_id, "通知渠道返回未送达");
                None
            }
            Err(e) => {
                tracing::warn!(role, channel = %service.channel_type(), recipient_id = %request.recipient_id, error = %e, "通知渠道发送出错");
                None
            }
        }
    }
}

#[async_trait]
impl NotificationService for FallbackNotificationService {
    async fn send(&self, request: &NotificationRequest) -> Result<DeliveryReceipt, NotificationError> {
        if let Some(receipt) = Self::try_channel(self.primary.as_ref(), request, "primary").await {
            return Ok(receipt);
        }

        if let Some(receipt) = Self::try_channel(self.secondary.as_ref(), request, "secondary").await {
            tracing::info!(
                recipient_id = %request.recipient_id,
                channel = %receipt.channel,
                "备用渠道发送成功"
            );
            return Ok(receipt);
        }

        tracing::error!(recipient_id = %request.recipient_id, "主备渠道均发送失败");
        Err(NotificationError::AllChannelsFailed)
    }

    fn is_available(&self) -> bool {
        self.primary.is_available() || self.secondary.is_available()
    }

    fn channel_type(&self) -> NotificationChannelType {
        self.primary.channel_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// 固定返回值的渠道
    struct Fixed {
        available: bool,
        outcome: Result<bool, NotificationError>,
        channel: NotificationChannelType,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(channel: NotificationChannelType, available: bool, outcome: Result<bool, NotificationError>) -> Arc<Self> {
            Arc::new(Self { available, outcome, channel, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl NotificationService for Fixed {
        async fn send(&self, _request: &NotificationRequest) -> Result<DeliveryReceipt, NotificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Ok(true) => Ok(DeliveryReceipt::delivered(self.channel, None)),
                Ok(false) => Ok(DeliveryReceipt::not_delivered(self.channel)),
                Err(e) => Err(e.clone()),
            }
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn channel_type(&self) -> NotificationChannelType {
            self.channel
        }
    }

    fn request() -> NotificationRequest {
        NotificationRequest::new(Uuid::new_v4(), Some("t".into()), "제목", "본문")
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let primary = Fixed::new(NotificationChannelType::Push, true, Ok(true));
        let secondary = Fixed::new(NotificationChannelType::InApp, true, Ok(true));
        let service = FallbackNotificationService::new(primary.clone(), secondary.clone());

        let receipt = service.send(&request()).await.unwrap();
        assert_eq!(receipt.channel, NotificationChannelType::Push);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_primary_uses_secondary() {
        let primary = Fixed::new(NotificationChannelType::Push, false, Ok(true));
        let secondary = Fixed::new(NotificationChannelType::InApp, true, Ok(true));
        let service = FallbackNotificationService::new(primary.clone(), secondary);

        let receipt = service.send(&request()).await.unwrap();
        assert_eq!(receipt.channel, NotificationChannelType::InApp);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_primary_error_uses_secondary() {
        let primary = Fixed::new(
            NotificationChannelType::Push,
            true,
            Err(NotificationError::InvalidToken("expired".into())),
        );
        let secondary = Fixed::new(NotificationChannelType::InApp, true, Ok(true));
        let service = FallbackNotificationService::new(primary, secondary);

        assert!(service.send(&request()).await.unwrap().delivered);
    }

    #[tokio::test]
    async fn test_both_fail_is_terminal() {
        let primary = Fixed::new(NotificationChannelType::Push, true, Ok(false));
        let secondary = Fixed::new(NotificationChannelType::InApp, false, Ok(true));
        let service = FallbackNotificationService::new(primary, secondary);

        let err = service.send(&request()).await.unwrap_err();
        assert!(matches!(err, NotificationError::AllChannelsFailed));
    }
}
