//! 通知投递错误类型

use crate::models::NotificationChannelType;

/// 通知投递错误
///
/// 区分可重试的瞬时错误与所有渠道都失败后的终态错误。
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotificationError {
    /// 推送令牌缺失或无效
    #[error("推送令牌无效: {0}")]
    InvalidToken(String),

    /// 传输层故障（网络、推送服务返回错误）
    #[error("{channel} 渠道传输失败: {message}")]
    Transport {
        channel: NotificationChannelType,
        message: String,
    },

    /// 渠道当前不可用
    #[error("{0} 渠道不可用")]
    ChannelUnavailable(NotificationChannelType),

    /// 渠道返回发送失败（包装后的 false 返回值）
    #[error("通知发送失败: {0}")]
    SendFailed(String),

    /// 主渠道与备用渠道均失败
    #[error("所有通知渠道均发送失败")]
    AllChannelsFailed,

    /// 重试次数耗尽
    #[error("重试 {attempts} 次后仍发送失败: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    /// 通知历史写入失败
    #[error("通知历史写入失败: {0}")]
    History(String),
}

impl NotificationError {
    /// 是否可由重试层重新尝试
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            NotificationError::RetryExhausted { .. } | NotificationError::History(_)
        )
    }
}
