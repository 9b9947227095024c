//! 被监护对象与监护人模型（由外部账户系统提供）

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 监护人
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guardian {
    pub id: Uuid,
    pub name: String,
    /// 推送令牌，未注册设备时为空
    pub push_token: Option<String>,
}

/// 被监护对象
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub guardian: Option<Guardian>,
}

impl Subject {
    pub fn has_guardian(&self) -> bool {
        self.guardian.is_some()
    }
}
