//! 外部协作方接口
//!
//! 账户、对话与每日问候数据由外部系统提供，这里只定义读取契约。

use crate::errors::AppError;
use crate::models::{ConversationMessage, DailyCheckRecord, Subject};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// 被监护对象查询
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    async fn find_subject(&self, subject_id: Uuid) -> Result<Option<Subject>, AppError>;
}

/// 对话消息来源
#[async_trait]
pub trait MessageProvider: Send + Sync {
    /// 最近 `window_days` 天内对象发出的消息，按时间顺序
    async fn recent_messages(
        &self,
        subject_id: Uuid,
        window_days: u32,
    ) -> Result<Vec<ConversationMessage>, AppError>;
}

/// 每日问候记录来源
#[async_trait]
pub trait CheckInProvider: Send + Sync {
    /// `[from, to]` 闭区间内的记录
    async fn recent_check_ins(
        &self,
        subject_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyCheckRecord>, AppError>;
}

/// 查询对象，不存在时返回 NotFound
pub async fn require_subject(
    directory: &dyn SubjectDirectory,
    subject_id: Uuid,
) -> Result<Subject, AppError> {
    directory
        .find_subject(subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("监护对象不存在: {}", subject_id)))
}
