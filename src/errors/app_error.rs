//! 统一错误类型定义

/// 应用错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // 资源不存在（未知的对象 / 规则 / 历史记录）
    #[error("资源不存在: {0}")]
    NotFound(String),

    // 无权访问他人数据
    #[error("权限不足: {0}")]
    Forbidden(String),

    // 参数验证错误
    #[error("请求参数无效: {0}")]
    ValidationError(String),

    // 冲突错误（同日重复预警）
    #[error("资源冲突: {0}")]
    Conflict(String),

    // 数据库错误
    #[error("数据库错误")]
    DatabaseError(#[from] sqlx::Error),

    // 序列化错误
    #[error("序列化错误")]
    SerializationError(#[from] serde_json::Error),

    // 内部错误
    #[error("内部服务错误: {0}")]
    InternalError(String),

    // 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),
}

impl AppError {
    /// 是否为资源不存在错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// 对外展示的安全错误信息（不泄露内部细节）
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotFound(_) => "资源不存在".to_string(),
            AppError::Forbidden(_) => "权限不足".to_string(),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::DatabaseError(_) => "服务暂时不可用".to_string(),
            AppError::SerializationError(_) => "服务内部错误".to_string(),
            AppError::InternalError(_) => "服务内部错误".to_string(),
            AppError::ConfigError(_) => "服务配置错误".to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}
