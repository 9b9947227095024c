//! 预警规则数据仓库

use crate::db::PostgresPool;
use crate::errors::AppError;
use crate::models::AlertRule;
use crate::repositories::AlertRuleStore;
use async_trait::async_trait;
use uuid::Uuid;

/// 预警规则数据仓库
#[derive(Clone)]
pub struct AlertRuleRepository {
    pool: PostgresPool,
}

impl AlertRuleRepository {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertRuleStore for AlertRuleRepository {
    async fn save_rule(&self, rule: &AlertRule) -> Result<AlertRule, AppError> {
        let saved = sqlx::query_as::<_, AlertRule>(
            r#"
            INSERT INTO alert_rules (
                id, subject_id, alert_type, name, description,
                consecutive_days, threshold_count, target_emotion, keywords,
                alert_level, active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                consecutive_days = EXCLUDED.consecutive_days,
                threshold_count = EXCLUDED.threshold_count,
                target_emotion = EXCLUDED.target_emotion,
                keywords = EXCLUDED.keywords,
                alert_level = EXCLUDED.alert_level,
                active = EXCLUDED.active,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(rule.id)
        .bind(rule.subject_id)
        .bind(rule.alert_type)
        .bind(&rule.name)
        .bind(&rule.description)
        .bind(rule.condition.consecutive_days)
        .bind(rule.condition.threshold_count)
        .bind(rule.condition.target_emotion)
        .bind(&rule.condition.keywords)
        .bind(rule.alert_level)
        .bind(rule.active)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .fetch_one(self.pool.pool())
        .await?;

        Ok(saved)
    }

    async fn find_rule(&self, rule_id: Uuid) -> Result<Option<AlertRule>, AppError> {
        let rule = sqlx::query_as::<_, AlertRule>("SELECT * FROM alert_rules WHERE id = $1")
            .bind(rule_id)
            .fetch_optional(self.pool.pool())
            .await?;

        Ok(rule)
    }

    async fn find_active_rules(&self, subject_id: Uuid) -> Result<Vec<AlertRule>, AppError> {
        let rules = sqlx::query_as::<_, AlertRule>(
            "SELECT * FROM alert_rules WHERE subject_id = $1 AND active = true ORDER BY created_at",
        )
        .bind(subject_id)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(rules)
    }

    async fn delete_rule(&self, rule_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM alert_rules WHERE id = $1")
            .bind(rule_id)
            .execute(self.pool.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("预警规则不存在: {}", rule_id)));
        }

        Ok(())
    }
}
