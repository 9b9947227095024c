//! 关键词分析器（实时）

use super::AnomalyAnalyzer;
use crate::config::KeywordSettings;
use crate::errors::AppError;
use crate::models::{
    AlertLevel, AlertResult, AlertType, AnalysisContext, AnalysisDetails, KeywordKind,
    KeywordMatch, Subject,
};
use async_trait::async_trait;

/// 危险关键词分析：紧急关键词优先于警告关键词
pub struct KeywordAnalyzer {
    emergency: Vec<Keyword>,
    warning: Vec<Keyword>,
}

/// 配置中的原始关键词与其小写形式
struct Keyword {
    configured: String,
    lowered: String,
}

impl KeywordAnalyzer {
    pub fn new(settings: &KeywordSettings) -> Self {
        Self {
            emergency: normalize(&settings.emergency),
            warning: normalize(&settings.warning),
        }
    }

    /// 分析单条消息内容
    pub fn analyze_content(&self, content: &str) -> AlertResult {
        let lowered = content.to_lowercase();

        if let Some(keyword) = first_match(&lowered, &self.emergency) {
            return keyword_alert(AlertLevel::Emergency, KeywordKind::Emergency, keyword, content);
        }
        if let Some(keyword) = first_match(&lowered, &self.warning) {
            return keyword_alert(AlertLevel::High, KeywordKind::Warning, keyword, content);
        }

        AlertResult::no_alert()
    }
}

/// 只在比较时转小写，命中结果保留配置原文
fn normalize(keywords: &[String]) -> Vec<Keyword> {
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| Keyword {
            configured: k.clone(),
            lowered: k.to_lowercase(),
        })
        .collect()
}

fn first_match<'a>(content: &str, keywords: &'a [Keyword]) -> Option<&'a str> {
    keywords
        .iter()
        .find(|k| content.contains(k.lowered.as_str()))
        .map(|k| k.configured.as_str())
}

fn keyword_alert(level: AlertLevel, kind: KeywordKind, keyword: &str, content: &str) -> AlertResult {
    let label = match kind {
        KeywordKind::Emergency => "긴급",
        KeywordKind::Warning => "위험",
    };

    AlertResult::alert(
        level,
        AlertType::KeywordDetection,
        format!("{} 키워드 감지: '{}'", label, keyword),
        AnalysisDetails::KeywordMatch(KeywordMatch {
            matched_keyword: keyword.to_string(),
            original_message: content.to_string(),
            kind,
        }),
    )
}

#[async_trait]
impl AnomalyAnalyzer for KeywordAnalyzer {
    async fn analyze(&self, _subject: &Subject, context: &AnalysisContext) -> Result<AlertResult, AppError> {
        Ok(context
            .target_message()
            .map(|message| self.analyze_content(&message.content))
            .unwrap_or_else(AlertResult::no_alert))
    }

    fn supported_type(&self) -> AlertType {
        AlertType::KeywordDetection
    }

    fn name(&self) -> &'static str {
        "KeywordAnalyzer"
    }
}
