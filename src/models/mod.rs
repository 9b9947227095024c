//! 数据模型模块

mod alert;
mod alert_history;
mod analysis;
mod conversation;
mod notification;
mod subject;

pub use alert::*;
pub use alert_history::*;
pub use analysis::*;
pub use conversation::*;
pub use notification::*;
pub use subject::*;
