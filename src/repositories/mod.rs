//! 数据访问层（Repository）

mod alert_history_repo;
mod alert_rule_repo;
mod memory;
mod notification_repo;
mod traits;

pub use alert_history_repo::AlertHistoryRepository;
pub use alert_rule_repo::AlertRuleRepository;
pub use memory::{InMemoryAlertHistoryStore, InMemoryAlertRuleStore, InMemoryNotificationHistoryStore};
pub use notification_repo::NotificationRepository;
pub use traits::{AlertHistoryStore, AlertRuleStore, NotificationHistoryStore};
