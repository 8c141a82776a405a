use bouncy_epidemics::config::{Config, PatientZero, SpeedRule, StationaryRule};

const FULL_CONFIG: &str = r#"
[model]
social_distance = 0.8
mortality = 0.05
sick_duration = 120
speed = { rule = "scaled", max_speed = 5.0 }

[arena]
width = 640.0
height = 480.0

[init]
population = 2000
patient_zero = "last"
stationary = "sampled"

[output]
max_time_factor = 10
steps_per_log = 100
"#;

const MINIMAL_CONFIG: &str = r#"
[model]
social_distance = 0.95
mortality = 0.1
sick_duration = 100

[arena]
width = 320.0
height = 240.0

[init]
population = 1000
"#;

#[test]
fn full_config_is_parsed() {
    let cfg = Config::from_toml(FULL_CONFIG).expect("failed to parse config");
    assert_eq!(cfg.model.social_distance, 0.8);
    assert_eq!(cfg.model.mortality, 0.05);
    assert_eq!(cfg.model.sick_duration, 120);
    assert_eq!(cfg.model.speed, SpeedRule::Scaled { max_speed: 5.0 });
    assert_eq!(cfg.arena.width, 640.0);
    assert_eq!(cfg.arena.height, 480.0);
    assert_eq!(cfg.init.population, 2000);
    assert_eq!(cfg.init.patient_zero, PatientZero::Last);
    assert_eq!(cfg.init.stationary, StationaryRule::Sampled);
    assert_eq!(cfg.output.steps_per_log, 100);
    assert_eq!(cfg.max_time(), 1200);
}

#[test]
fn missing_fields_take_defaults() {
    let cfg = Config::from_toml(MINIMAL_CONFIG).expect("failed to parse config");
    assert_eq!(cfg.model.speed, SpeedRule::Fixed { speed: 2.0 });
    assert_eq!(cfg.init.patient_zero, PatientZero::First);
    assert_eq!(cfg.init.stationary, StationaryRule::Leading);
    assert_eq!(cfg.output.max_time_factor, 30);
    assert_eq!(cfg.output.steps_per_log, 64);
    assert_eq!(cfg.max_time(), 3000);
}

#[test]
fn speed_rules() {
    assert_eq!(SpeedRule::Fixed { speed: 2.0 }.speed(0.9), 2.0);
    assert_eq!(SpeedRule::Scaled { max_speed: 4.0 }.speed(0.25), 3.0);
    assert_eq!(SpeedRule::Scaled { max_speed: 4.0 }.speed(1.0), 0.0);
}

#[test]
fn out_of_range_values_are_rejected() {
    let cases = [
        ("mortality = 0.1", "mortality = 1.1", "invalid mortality"),
        ("social_distance = 0.95", "social_distance = -0.5", "invalid social distance fraction"),
        ("sick_duration = 100", "sick_duration = 0", "invalid sickness duration"),
        ("population = 1000", "population = 0", "invalid population"),
        ("width = 320.0", "width = 0.0", "invalid arena width"),
        ("height = 240.0", "height = nan", "invalid arena height"),
    ];
    for (from, to, msg) in cases {
        let contents = MINIMAL_CONFIG.replace(from, to);
        let error = Config::from_toml(&contents).expect_err("invalid config was accepted");
        let error = format!("{error:#}");
        assert!(error.contains("failed to validate config"), "{error}");
        assert!(error.contains(msg), "{error}");
    }
}

#[test]
fn negative_speed_is_rejected() {
    let contents = MINIMAL_CONFIG.replace(
        "sick_duration = 100",
        "sick_duration = 100\nspeed = { rule = \"fixed\", speed = -1.0 }",
    );
    let error = Config::from_toml(&contents).expect_err("negative speed was accepted");
    assert!(format!("{error:#}").contains("invalid speed"));
}

#[test]
fn malformed_toml_is_rejected() {
    let error = Config::from_toml("[model]\nmortality = \"high\"\n")
        .expect_err("bad config was accepted");
    assert!(format!("{error:#}").contains("failed to deserialize config"));

    let contents = MINIMAL_CONFIG.replace("[init]\npopulation = 1000\n", "");
    assert!(Config::from_toml(&contents).is_err());
}

#[test]
fn missing_file_is_reported() {
    let error = Config::from_file("/nonexistent/config.toml")
        .expect_err("missing file was accepted");
    assert!(format!("{error:#}").contains("failed to read"));
}
