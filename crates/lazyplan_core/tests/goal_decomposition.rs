use chrono::{Duration, TimeZone, Utc};
use lazyplan_core::planner::strategy::DecompositionStrategy;
use lazyplan_core::{
    ConfigError, DecompositionError, Goal, GoalDecomposer, GoalRiskAssessment, HistoricalData,
    KeyResult, PlannerConfig, Priority, RiskLevel, RiskPredictor, TimeBlockType,
};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 6, 8, 0, 0).unwrap()
}

#[test]
fn key_results_become_ordered_milestones() {
    let mut goal = Goal::new("Grow the newsletter");
    goal.deadline = Some(now() + Duration::days(90));
    let titles = ["1000 subscribers", "40% open rate", "weekly issue", "2 sponsors"];
    let key_results: Vec<KeyResult> = titles
        .iter()
        .map(|title| KeyResult::new(goal.id, *title))
        .collect();

    let plan = GoalDecomposer::default()
        .decompose_at(&goal, &key_results, now())
        .unwrap();

    assert_eq!(plan.strategy, DecompositionStrategy::KeyResults);
    assert_eq!(plan.milestones.len(), key_results.len());
    let mut previous = now() + Duration::days(14) - Duration::seconds(1);
    for milestone in &plan.milestones {
        assert!(milestone.deadline > previous);
        previous = milestone.deadline;
    }
    assert!(plan.milestones.last().unwrap().deadline <= goal.deadline.unwrap());
}

fn key_results_for(goal: &Goal, count: usize) -> Vec<KeyResult> {
    (0..count)
        .map(|i| KeyResult::new(goal.id, format!("key result {i}")))
        .collect()
}

#[test]
fn tight_deadline_keeps_milestones_between_spacing_floor_and_deadline() {
    let mut goal = Goal::new("Prepare the trade fair booth");
    let deadline = now() + Duration::days(20);
    goal.deadline = Some(deadline);

    let plan = GoalDecomposer::default()
        .decompose_at(&goal, &key_results_for(&goal, 3), now())
        .unwrap();

    assert_eq!(plan.milestones.len(), 3);
    for pair in plan.milestones.windows(2) {
        assert!(pair[0].deadline < pair[1].deadline);
    }
    for milestone in &plan.milestones {
        assert!(milestone.deadline >= now() + Duration::days(14));
        assert!(milestone.deadline <= deadline);
    }
    assert_eq!(plan.milestones.last().unwrap().deadline, deadline);
}

#[test]
fn deadline_inside_spacing_window_is_rejected() {
    let mut goal = Goal::new("Prepare the trade fair booth");
    goal.deadline = Some(now() + Duration::days(10));

    let err = GoalDecomposer::default()
        .decompose_at(&goal, &key_results_for(&goal, 5), now())
        .unwrap_err();
    assert!(matches!(err, DecompositionError::MilestoneGeneration(_)));
}

#[test]
fn every_milestone_gets_three_or_four_tasks() {
    let mut goal = Goal::new("Launch a mobile app for the bakery");
    goal.deadline = Some(now() + Duration::days(120));

    let plan = GoalDecomposer::default().decompose_at(&goal, &[], now()).unwrap();

    for milestone in &plan.milestones {
        let tasks: Vec<_> = plan
            .tasks
            .iter()
            .filter(|task| task.milestone_id == Some(milestone.id))
            .collect();
        assert!((3..=4).contains(&tasks.len()), "{} tasks", tasks.len());
        assert!(tasks.iter().all(|task| task.goal_ids == vec![goal.id]));
        assert_eq!(milestone.task_ids.len(), tasks.len());
    }
}

#[test]
fn learn_spanish_uses_skill_stages_three_weeks_apart() {
    let mut goal = Goal::new("Learn Spanish");
    goal.deadline = Some(now() + Duration::days(90));

    let plan = GoalDecomposer::default().decompose_at(&goal, &[], now()).unwrap();

    assert_eq!(plan.strategy, DecompositionStrategy::SkillBased);
    assert_eq!(plan.milestones.len(), 4);
    for pair in plan.milestones.windows(2) {
        assert_eq!(pair[1].deadline - pair[0].deadline, Duration::days(21));
    }
}

#[test]
fn past_deadline_is_rejected() {
    let mut goal = Goal::new("Ship v2");
    goal.deadline = Some(now() - Duration::days(1));
    let err = GoalDecomposer::default()
        .decompose_at(&goal, &[], now())
        .unwrap_err();
    assert!(matches!(err, DecompositionError::DeadlineInPast { .. }));
}

#[test]
fn proposed_blocks_stay_inside_the_first_week() {
    let mut goal = Goal::new("Write a research paper");
    goal.deadline = Some(now() + Duration::days(60));

    let plan = GoalDecomposer::default().decompose_at(&goal, &[], now()).unwrap();

    assert!(!plan.time_blocks.is_empty());
    for block in &plan.time_blocks {
        assert!(block.start_time >= now());
        assert!(block.end_time <= now() + Duration::days(8));
        assert!(block.duration_minutes() >= 30);
        if block.block_type == TimeBlockType::DeepWork {
            assert!(block.duration_minutes() >= 90);
        }
    }
    assert!(plan.weekly_schedule.hours_per_week > 0.0);
}

#[test]
fn risky_goals_escalate_first_milestone_tasks() {
    let mut goal = Goal::new("Write a research paper");
    goal.deadline = Some(now() + Duration::days(60));
    let history = HistoricalData::default();
    let mut assessment: GoalRiskAssessment =
        RiskPredictor::default().assess_goal_risk_at(&goal, &[], &history, now());
    assessment.risk_level = RiskLevel::Critical;

    let decomposer = GoalDecomposer::default();
    let baseline = decomposer.decompose_at(&goal, &[], now()).unwrap();
    let escalated = decomposer
        .decompose_with_assessment(&goal, &[], &assessment, now())
        .unwrap();

    let first = escalated.milestones[0].id;
    assert!(escalated
        .tasks
        .iter()
        .filter(|task| task.milestone_id == Some(first))
        .all(|task| task.priority != Priority::Medium));
    let high_before = baseline.tasks.iter().filter(|t| t.priority == Priority::High).count();
    let high_after = escalated.tasks.iter().filter(|t| t.priority == Priority::High).count();
    assert!(high_after >= high_before);
}

#[test]
fn assessment_for_another_goal_is_rejected() {
    let mut goal = Goal::new("Write a research paper");
    goal.deadline = Some(now() + Duration::days(60));
    let other = Goal::new("Run a half marathon");
    let history = HistoricalData::default();
    let assessment = RiskPredictor::default().assess_goal_risk_at(&other, &[], &history, now());

    let err = GoalDecomposer::default()
        .decompose_with_assessment(&goal, &[], &assessment, now())
        .unwrap_err();
    assert!(matches!(err, DecompositionError::InvalidGoal(_)));
}

#[test]
fn checked_constructor_rejects_inverted_phase_bounds() {
    let config = PlannerConfig {
        min_phases: 6,
        max_phases: 3,
        ..PlannerConfig::default()
    };
    let err = GoalDecomposer::try_new(config.clone()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let mut goal = Goal::new("Save for a house");
    goal.deadline = Some(now() + Duration::days(120));
    let plan = GoalDecomposer::new(config).decompose_at(&goal, &[], now()).unwrap();
    assert_eq!(plan.milestones.len(), 3);
}
