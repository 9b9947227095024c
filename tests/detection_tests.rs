//! 异常检测集成测试

mod helpers;
mod mocks;

use carewatch::config::{AlertSettings, EmotionThresholds, KeywordSettings, NoResponseThresholds};
use carewatch::models::{
    AlertLevel, AlertRule, AlertType, AnalysisContext, AnalysisDetails, ConversationMessage,
    EmotionType,
};
use carewatch::repositories::{AlertRuleStore, InMemoryAlertRuleStore};
use carewatch::services::{
    AnalysisOrchestrator, AnomalyAnalyzer, DetectionService, EmotionPatternAnalyzer,
    KeywordAnalyzer, NoResponseAnalyzer,
};
use helpers::{check_ins, messages, subject_with_guardian};
use mocks::{InMemorySubjects, StaticCheckIns, StaticMessages};
use std::sync::Arc;
use tokio_test::assert_ok;
use uuid::Uuid;

use EmotionType::{Negative as N, Neutral as U, Positive as P};

struct Fixture {
    messages: StaticMessages,
    check_ins: StaticCheckIns,
    rules: Arc<InMemoryAlertRuleStore>,
    detection: DetectionService,
}

fn fixture(subject_seeds: &[u8]) -> Fixture {
    let subjects = InMemorySubjects::with(subject_seeds.iter().map(|s| subject_with_guardian(*s)).collect());
    let messages = StaticMessages::default();
    let check_ins = StaticCheckIns::default();
    let rules = Arc::new(InMemoryAlertRuleStore::new());
    let settings = AlertSettings::default();

    let analyzers: Vec<Arc<dyn AnomalyAnalyzer>> = vec![
        Arc::new(EmotionPatternAnalyzer::new(Arc::new(messages.clone()), settings.emotion.clone())),
        Arc::new(NoResponseAnalyzer::new(Arc::new(check_ins.clone()), settings.no_response.clone())),
        Arc::new(KeywordAnalyzer::new(&settings.keyword)),
    ];
    let detection = DetectionService::new(
        rules.clone(),
        Arc::new(subjects.clone()),
        Arc::new(AnalysisOrchestrator::new(analyzers)),
        &settings,
    );

    Fixture {
        messages,
        check_ins,
        rules,
        detection,
    }
}

#[tokio::test]
async fn three_negative_messages_raise_high_emotion_alert() {
    let subject = subject_with_guardian(1);
    let provider = StaticMessages::default();
    provider.set(subject.id, messages(subject.id, &[N, N, N]));
    let analyzer = EmotionPatternAnalyzer::new(Arc::new(provider), EmotionThresholds::default());

    let result = assert_ok!(analyzer.analyze(&subject, &AnalysisContext::for_emotion_pattern(7)).await);

    assert!(result.detected);
    assert_eq!(result.alert_level, Some(AlertLevel::High));
    assert_eq!(result.alert_type, Some(AlertType::EmotionPattern));
    assert_eq!(
        result.message.as_deref(),
        Some("3일 연속 부정감정 감지 (부정감정비율: 100.0%)")
    );
}

#[tokio::test]
async fn interrupted_negative_run_is_not_detected() {
    let subject = subject_with_guardian(1);
    let provider = StaticMessages::default();
    provider.set(subject.id, messages(subject.id, &[N, P, N]));
    let analyzer = EmotionPatternAnalyzer::new(Arc::new(provider), EmotionThresholds::default());

    let result = assert_ok!(analyzer.analyze(&subject, &AnalysisContext::for_emotion_pattern(7)).await);
    assert!(!result.detected);
    assert!(result.alert_level.is_none());
}

#[tokio::test]
async fn two_negative_of_three_is_medium() {
    let subject = subject_with_guardian(1);
    let provider = StaticMessages::default();
    provider.set(subject.id, messages(subject.id, &[P, N, N]));
    let analyzer = EmotionPatternAnalyzer::new(Arc::new(provider), EmotionThresholds::default());

    let result = assert_ok!(analyzer.analyze(&subject, &AnalysisContext::for_emotion_pattern(7)).await);
    assert_eq!(result.alert_level, Some(AlertLevel::Medium));
    assert_eq!(
        result.message.as_deref(),
        Some("2일 연속 부정감정 감지 (부정감정비율: 66.7%)")
    );
    match result.details {
        Some(AnalysisDetails::EmotionTrend(trend)) => {
            assert_eq!(trend.positive_count, 1);
            assert_eq!(trend.negative_count, 2);
            assert_eq!(trend.consecutive_negative_count, 2);
        }
        other => panic!("unexpected details: {:?}", other),
    }
}

#[tokio::test]
async fn empty_message_window_is_not_detected() {
    let subject = subject_with_guardian(1);
    let analyzer = EmotionPatternAnalyzer::new(Arc::new(StaticMessages::default()), EmotionThresholds::default());

    let result = assert_ok!(analyzer.analyze(&subject, &AnalysisContext::for_emotion_pattern(7)).await);
    assert!(!result.detected);
}

#[tokio::test]
async fn three_missed_check_ins_raise_high_no_response_alert() {
    let subject = subject_with_guardian(2);
    let provider = StaticCheckIns::default();
    provider.set(subject.id, check_ins(subject.id, &[false, false, false]));
    let thresholds = NoResponseThresholds {
        high_consecutive_days: 3,
        ..NoResponseThresholds::default()
    };
    let analyzer = NoResponseAnalyzer::new(Arc::new(provider), thresholds);

    let result = assert_ok!(analyzer.analyze(&subject, &AnalysisContext::for_no_response(7)).await);

    assert!(result.detected);
    assert_eq!(result.alert_level, Some(AlertLevel::High));
    match result.details {
        Some(AnalysisDetails::ResponsePattern(pattern)) => {
            assert_eq!(pattern.consecutive_no_response_days, 3);
            assert_eq!(pattern.response_rate, 0.0);
        }
        other => panic!("unexpected details: {:?}", other),
    }
}

#[tokio::test]
async fn no_response_streak_counts_back_from_latest_record() {
    let subject = subject_with_guardian(2);
    let provider = StaticCheckIns::default();
    // 乱序返回，最近一天无回应，前一天有回应
    let mut records = check_ins(subject.id, &[false, true, true, true]);
    records.reverse();
    provider.set(subject.id, records);
    let analyzer = NoResponseAnalyzer::new(Arc::new(provider), NoResponseThresholds::default());

    let result = assert_ok!(analyzer.analyze(&subject, &AnalysisContext::for_no_response(7)).await);

    assert_eq!(result.alert_level, Some(AlertLevel::Medium));
    assert_eq!(
        result.message.as_deref(),
        Some("1일 연속 무응답 감지 (무응답비율: 25.0%)")
    );
}

#[tokio::test]
async fn no_check_ins_is_not_detected() {
    let subject = subject_with_guardian(2);
    let analyzer = NoResponseAnalyzer::new(Arc::new(StaticCheckIns::default()), NoResponseThresholds::default());

    let result = assert_ok!(analyzer.analyze(&subject, &AnalysisContext::for_no_response(7)).await);
    assert!(!result.detected);
}

#[tokio::test]
async fn emergency_keyword_is_matched() {
    let subject = subject_with_guardian(3);
    let analyzer = KeywordAnalyzer::new(&KeywordSettings {
        emergency: vec!["아파요".into()],
        warning: vec![],
    });
    let message = ConversationMessage::new(subject.id, "정말 아파요", U);

    let result = assert_ok!(analyzer.analyze(&subject, &AnalysisContext::for_keyword(message)).await);

    assert!(result.detected);
    assert_eq!(result.alert_level, Some(AlertLevel::Emergency));
    assert_eq!(result.matched_keyword(), Some("아파요"));
}

#[tokio::test]
async fn keyword_analyzer_ignores_window_context() {
    let subject = subject_with_guardian(3);
    let analyzer = KeywordAnalyzer::new(&KeywordSettings::default());

    let result = assert_ok!(analyzer.analyze(&subject, &AnalysisContext::for_emotion_pattern(7)).await);
    assert!(!result.detected);
}

#[tokio::test]
async fn orchestrator_fails_soft_for_unsupported_type() {
    let subject = subject_with_guardian(4);
    let analyzers: Vec<Arc<dyn AnomalyAnalyzer>> = vec![Arc::new(KeywordAnalyzer::new(&KeywordSettings::default()))];
    let orchestrator = AnalysisOrchestrator::new(analyzers);

    assert!(orchestrator.is_supported(AlertType::KeywordDetection));
    assert!(!orchestrator.is_supported(AlertType::HealthConcern));

    let result = assert_ok!(
        orchestrator
            .analyze_by_type(AlertType::HealthConcern, &subject, &AnalysisContext::for_emotion_pattern(7))
            .await
    );
    assert!(!result.detected);
}

#[tokio::test]
async fn orchestrator_keeps_first_duplicate_registration() {
    let subject = subject_with_guardian(4);
    let first = KeywordAnalyzer::new(&KeywordSettings {
        emergency: vec!["살려줘".into()],
        warning: vec![],
    });
    let second = KeywordAnalyzer::new(&KeywordSettings {
        emergency: vec!["배고파".into()],
        warning: vec![],
    });
    let analyzers: Vec<Arc<dyn AnomalyAnalyzer>> = vec![Arc::new(first), Arc::new(second)];
    let orchestrator = AnalysisOrchestrator::new(analyzers);

    let hungry = ConversationMessage::new(subject.id, "배고파", U);
    let result = assert_ok!(
        orchestrator
            .analyze_by_type(AlertType::KeywordDetection, &subject, &AnalysisContext::for_keyword(hungry))
            .await
    );
    assert!(!result.detected);

    let help = ConversationMessage::new(subject.id, "살려줘", U);
    let result = assert_ok!(
        orchestrator
            .analyze_by_type(AlertType::KeywordDetection, &subject, &AnalysisContext::for_keyword(help))
            .await
    );
    assert!(result.detected);
}

#[tokio::test]
async fn detect_anomalies_tags_rules_and_skips_keyword_rules() {
    let f = fixture(&[5]);
    let subject = subject_with_guardian(5);
    f.messages.set(subject.id, messages(subject.id, &[N, N, N, N]));
    f.check_ins.set(subject.id, check_ins(subject.id, &[true, true, true]));

    let emotion_rule = AlertRule::emotion_pattern(subject.id, 3, AlertLevel::High);
    let no_response_rule = AlertRule::no_response(subject.id, 2, AlertLevel::Medium);
    let keyword_rule = AlertRule::keyword(subject.id, "아파요", AlertLevel::Emergency);
    for rule in [&emotion_rule, &no_response_rule, &keyword_rule] {
        assert_ok!(f.rules.save_rule(rule).await);
    }

    let results = assert_ok!(f.detection.detect_anomalies(subject.id).await);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].alert_type, Some(AlertType::EmotionPattern));
    assert_eq!(results[0].rule_id, Some(emotion_rule.id));
}

#[tokio::test]
async fn detect_anomalies_skips_rules_without_analyzer() {
    let f = fixture(&[6]);
    let subject = subject_with_guardian(6);
    let mut rule = AlertRule::emotion_pattern(subject.id, 3, AlertLevel::High);
    rule.alert_type = AlertType::HealthConcern;
    assert_ok!(f.rules.save_rule(&rule).await);

    let results = assert_ok!(f.detection.detect_anomalies(subject.id).await);
    assert!(results.is_empty());
}

#[tokio::test]
async fn detect_anomalies_unknown_subject_is_not_found() {
    let f = fixture(&[]);
    let err = f.detection.detect_anomalies(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn detect_keyword_alert_uses_configured_lists() {
    let f = fixture(&[7]);
    let subject = subject_with_guardian(7);
    let message = ConversationMessage::new(subject.id, "가슴이 답답해요", U);
    let result = assert_ok!(f.detection.detect_keyword_alert(&message, subject.id).await);

    assert_eq!(result.alert_level, Some(AlertLevel::Emergency));
    assert_eq!(result.matched_keyword(), Some("가슴이"));
    assert!(result.rule_id.is_none());
}

#[tokio::test]
async fn active_rules_are_ordered_by_priority() {
    let f = fixture(&[8]);
    let subject_id = subject_with_guardian(8).id;
    let low = AlertRule::no_response(subject_id, 3, AlertLevel::Low);
    let emergency = AlertRule::keyword(subject_id, "도와주세요", AlertLevel::Emergency);
    let high = AlertRule::emotion_pattern(subject_id, 3, AlertLevel::High);
    let mut inactive = AlertRule::emotion_pattern(subject_id, 2, AlertLevel::Emergency);
    inactive.deactivate();
    for rule in [&low, &emergency, &high, &inactive] {
        assert_ok!(f.rules.save_rule(rule).await);
    }

    let ordered = assert_ok!(f.detection.get_active_rules_ordered_by_priority(subject_id).await);
    let levels: Vec<AlertLevel> = ordered.iter().map(|r| r.alert_level).collect();
    assert_eq!(levels, vec![AlertLevel::Emergency, AlertLevel::High, AlertLevel::Low]);

    let unordered = assert_ok!(f.detection.get_active_rules(subject_id).await);
    assert_eq!(unordered.len(), 3);
}
