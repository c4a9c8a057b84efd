use std::io::Write;
use tempfile::NamedTempFile;
use vigie_forecast::{ForecastConfig, ForecastError, ForecastService};

#[test]
fn test_partial_json_keeps_defaults() {
    let config = ForecastConfig::from_json_str(
        r#"{ "advanced_min_points": 21, "arima": { "max_p": 3 }, "seasonal": { "weekly": false } }"#,
    )
    .unwrap();

    assert_eq!(config.advanced_min_points, 21);
    assert_eq!(config.linear_min_points, 2);
    assert_eq!(config.arima.max_p, 3);
    assert_eq!(config.arima.max_q, 2);
    assert!(!config.seasonal.weekly);
    assert_eq!(config.seasonal.n_changepoints, 25);
}

#[test]
fn test_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "linear_band": 0.1, "arima_weight": 3.0 }}"#).unwrap();

    let config = ForecastConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.linear_band, 0.1);

    let service = ForecastService::new(config).unwrap();
    assert_eq!(service.config().arima_weight, 3.0);
}

#[test]
fn test_invalid_values_are_rejected() {
    for json in [
        r#"{ "linear_min_points": 1 }"#,
        r#"{ "advanced_min_points": 1 }"#,
        r#"{ "seasonal_weight": 0.0 }"#,
        r#"{ "linear_band": 1.5 }"#,
        r#"{ "arima": { "confidence": 1.0 } }"#,
        r#"{ "seasonal": { "changepoint_range": 0.0 } }"#,
    ] {
        assert!(
            matches!(
                ForecastConfig::from_json_str(json),
                Err(ForecastError::ConfigError(_))
            ),
            "accepted {}",
            json
        );
    }
}

#[test]
fn test_malformed_json() {
    assert!(matches!(
        ForecastConfig::from_json_str("{ not json"),
        Err(ForecastError::JsonError(_))
    ));
}
