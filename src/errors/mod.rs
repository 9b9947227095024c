//! 错误类型模块

mod app_error;
mod notification_error;

pub use app_error::AppError;
pub use notification_error::NotificationError;
