//! 异常分析器
//!
//! 每种预警类型一个实现，各自负责取数与判定。

mod emotion_pattern;
mod keyword;
mod no_response;

pub use emotion_pattern::EmotionPatternAnalyzer;
pub use keyword::KeywordAnalyzer;
pub use no_response::NoResponseAnalyzer;

use crate::errors::AppError;
use crate::models::{AlertResult, AlertType, AnalysisContext, Subject};
use async_trait::async_trait;

/// 异常分析器
#[async_trait]
pub trait AnomalyAnalyzer: Send + Sync {
    /// 分析对象，上下文类型不匹配时返回无预警
    async fn analyze(&self, subject: &Subject, context: &AnalysisContext) -> Result<AlertResult, AppError>;

    fn supported_type(&self) -> AlertType;

    fn supports(&self, alert_type: AlertType) -> bool {
        self.supported_type() == alert_type
    }

    /// 日志中显示的名称
    fn name(&self) -> &'static str;
}
