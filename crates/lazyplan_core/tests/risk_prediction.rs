use chrono::{Duration, TimeZone, Utc};
use lazyplan_core::risk::bottleneck::BottleneckKind;
use lazyplan_core::risk::cache::AssessmentCache;
use lazyplan_core::risk::trajectory::{FixedNoise, RngNoise};
use lazyplan_core::{Goal, HistoricalData, KeyResult, Priority, RiskConfig, RiskPredictor, Task};

fn now() -> chrono::DateTime<Utc> {
    // April: neutral seasonal factor.
    Utc.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap()
}

#[test]
fn empty_history_still_produces_bounded_assessment() {
    let goal = Goal::new("Run a half marathon");
    let assessment =
        RiskPredictor::default().assess_goal_risk_at(&goal, &[], &HistoricalData::default(), now());

    assert!(!assessment.fallback);
    assert!(assessment.velocity.cold_start);
    assert!((0.0..=0.5).contains(&assessment.confidence));
    assert!((0.0..=1.0).contains(&assessment.risk_score));
    assert!(!assessment.recommendations.is_empty());
    assert!(assessment.recommendations.len() <= 8);
}

#[test]
fn required_velocity_for_half_done_goal() {
    let mut goal = Goal::new("Finish thesis");
    goal.deadline = Some(now() + Duration::weeks(10));
    let mut key_result = KeyResult::new(goal.id, "chapters written");
    key_result.progress = 50.0;
    let history = HistoricalData {
        weekly_velocity: vec![0.05, 0.05, 0.05],
        available_hours_per_week: Some(25.0),
        ..HistoricalData::default()
    };

    let assessment =
        RiskPredictor::default().assess_goal_risk_at(&goal, &[key_result], &history, now());

    assert!((assessment.velocity.required - 0.05).abs() < 1e-9);
    assert!(assessment.confidence <= 0.95);
}

#[test]
fn overloaded_week_saturates_time_bottleneck() {
    let goal = Goal::new("Renovate the garden");
    let history = HistoricalData {
        available_hours_per_week: Some(10.0),
        tasks: vec![
            Task::new("dig beds", 600, Priority::Medium),
            Task::new("plant hedges", 600, Priority::Medium),
        ],
        ..HistoricalData::default()
    };

    let assessment = RiskPredictor::default().assess_goal_risk_at(&goal, &[], &history, now());
    let time = assessment
        .bottlenecks
        .iter()
        .find(|b| b.kind == BottleneckKind::Time)
        .expect("time bottleneck");
    assert_eq!(time.severity, 1.0);
}

#[test]
fn trajectory_percentiles_are_ordered() {
    let predictor = RiskPredictor::default();
    let goal = Goal::new("Save an emergency fund");
    let history = HistoricalData {
        weekly_velocity: vec![0.03, 0.05, 0.04],
        ..HistoricalData::default()
    };

    let mut fixed_noise = FixedNoise(0.5);
    let fixed = predictor.predict_trajectory_with(&goal, 0.25, &history, &mut fixed_noise, now());
    assert_eq!(fixed.optimistic.completion, fixed.conservative.completion);

    let mut noise = RngNoise::from_seed_option(Some(42));
    let sampled = predictor.predict_trajectory_with(&goal, 0.25, &history, &mut noise, now());
    assert!(sampled.optimistic.completion <= sampled.realistic.completion);
    assert!(sampled.realistic.completion <= sampled.conservative.completion);
    assert_eq!(sampled.optimistic.probability, 0.9);
    assert_eq!(sampled.realistic.probability, 0.5);
    assert_eq!(sampled.conservative.probability, 0.1);
    assert_eq!(sampled.iterations, 1000);
    assert_eq!(sampled.milestones.len(), 4);
    assert!(sampled.milestones[0].achieved);
}

#[test]
fn tight_deadline_surfaces_velocity_blocker() {
    let mut goal = Goal::new("Write a novel");
    goal.deadline = Some(now() + Duration::weeks(2));
    let history = HistoricalData {
        weekly_velocity: vec![0.01, 0.01],
        available_hours_per_week: Some(3.0),
        ..HistoricalData::default()
    };

    let trajectory = RiskPredictor::default().predict_trajectory_with(
        &goal,
        0.1,
        &history,
        &mut FixedNoise(0.5),
        now(),
    );
    assert!(trajectory
        .blockers
        .iter()
        .any(|blocker| blocker.contains("insufficient")));
    assert!(trajectory.blockers.iter().any(|blocker| blocker.contains("time budget")));
}

#[test]
fn seeded_configuration_reproduces_trajectory() {
    let mut config = RiskConfig::default();
    config.monte_carlo.seed = Some(7);
    config.monte_carlo.iterations = 200;
    let predictor = RiskPredictor::new(config);
    let goal = Goal::new("Learn to swim");

    let first = predictor.predict_trajectory(&goal, 0.4);
    let second = predictor.predict_trajectory(&goal, 0.4);
    assert_eq!(first.realistic.weeks, second.realistic.weeks);
    assert_eq!(first.iterations, 200);
}

#[test]
fn cache_reuses_fresh_assessments() {
    let predictor = RiskPredictor::default();
    let goal = Goal::new("Run a half marathon");
    let mut cache = AssessmentCache::new(predictor.config().cache_ttl_seconds);

    let first = cache.get_or_assess(goal.id, now(), || {
        predictor.assess_goal_risk_at(&goal, &[], &HistoricalData::default(), now())
    });
    let later = now() + Duration::minutes(5);
    let second = cache.get_or_assess(goal.id, later, || {
        predictor.assess_goal_risk_at(&goal, &[], &HistoricalData::default(), later)
    });
    assert_eq!(first.assessed_at, second.assessed_at);
}
