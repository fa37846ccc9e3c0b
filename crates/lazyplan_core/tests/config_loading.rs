use lazyplan_core::{
    ConfigError, EngineConfig, GoalDecomposer, IndexConfig, RiskConfig, RiskPredictor,
    SemanticIndex,
};
use std::io::Write;

#[test]
fn loads_partial_file_over_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "[index]\nrelevance_threshold = 0.5\nmax_results = 5\n\n[planner]\nmin_milestone_spacing_days = 10"
    )
    .expect("write config");

    let config = EngineConfig::load(file.path()).expect("config loads");
    assert_eq!(config.index.relevance_threshold, 0.5);
    assert_eq!(config.index.max_results, 5);
    assert_eq!(config.index.question_threshold, 0.4);
    assert_eq!(config.planner.min_milestone_spacing_days, 10);
    assert_eq!(config.risk, EngineConfig::default().risk);

    let decomposer = GoalDecomposer::new(config.planner.clone());
    assert_eq!(decomposer.config().min_milestone_spacing_days, 10);
    let index = SemanticIndex::new(config.index);
    assert_eq!(index.config().max_results, 5);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = EngineConfig::load(dir.path().join("absent.toml")).expect_err("no file");
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn out_of_range_threshold_is_rejected() {
    let err = EngineConfig::from_toml_str("[index]\nrelevance_threshold = 1.5\n")
        .expect_err("threshold above 1");
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn checked_constructors_validate_their_section() {
    let mut risk = RiskConfig::default();
    risk.monte_carlo.iterations = 0;
    assert!(matches!(RiskPredictor::try_new(risk), Err(ConfigError::Invalid(_))));

    let index = IndexConfig {
        question_threshold: -0.1,
        ..IndexConfig::default()
    };
    assert!(matches!(SemanticIndex::try_new(index), Err(ConfigError::Invalid(_))));

    assert!(RiskPredictor::try_new(RiskConfig::default()).is_ok());
}
