//! 预警存储使用的 PostgreSQL 连接池

use crate::config::{DatabaseSettings, Settings};
use crate::errors::AppError;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

/// 连接池句柄，克隆开销很小，可在各仓库间共享
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// 按配置连接，URL 取自 `DATABASE_URL`
    pub async fn new(settings: &Settings) -> Result<Self, AppError> {
        let url = Settings::database_url()?;
        Self::connect(&url, &settings.database).await
    }

    /// 用显式 URL 连接（嵌入方自行管理凭据时使用）
    pub async fn connect(url: &SecretString, database: &DatabaseSettings) -> Result<Self, AppError> {
        let mut options = PgConnectOptions::from_str(url.expose_secret())
            .map_err(|e| AppError::ConfigError(format!("数据库 URL 无效: {}", e)))?;
        if database.require_ssl {
            options = options.ssl_mode(PgSslMode::Require);
        }

        let pool = PgPoolOptions::new()
            .max_connections(database.max_connections)
            .min_connections(database.min_connections)
            .acquire_timeout(Duration::from_secs(database.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(database.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "连接预警数据库失败");
                AppError::DatabaseError(e)
            })?;

        tracing::info!(
            max_connections = database.max_connections,
            min_connections = database.min_connections,
            ssl = database.require_ssl,
            "预警数据库连接池就绪"
        );
        Ok(Self { pool })
    }

    /// 包装已有连接池
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 探测连接并确认预警表已迁移
    pub async fn health_check(&self) -> Result<(), AppError> {
        let (ready,): (bool,) = sqlx::query_as("SELECT to_regclass('public.alert_history') IS NOT NULL")
            .fetch_one(&self.pool)
            .await?;

        if !ready {
            return Err(AppError::InternalError("预警表尚未创建，请先执行迁移".to_string()));
        }

        tracing::debug!(size = self.pool.size(), idle = self.pool.num_idle(), "数据库健康检查通过");
        Ok(())
    }

    /// 执行 `migrations/` 下的建表脚本
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::InternalError(format!("迁移失败: {}", e)))?;

        tracing::info!("预警表迁移完成");
        Ok(())
    }

    /// 关闭连接池，等待在途查询结束
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("数据库连接池已关闭");
    }
}
