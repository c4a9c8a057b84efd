use approx::assert_relative_eq;
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use vigie_forecast::models::arima::ArimaOrder;
use vigie_forecast::models::{ArimaModel, LinearExtrapolation, SeasonalModel};
use vigie_forecast::{
    ArimaConfig, Ensemble, FitOutcome, ForecastConfig, ForecastModel, Model, ModelKind,
    ModelSelector, Series,
};

fn create_test_series(values: &[f64]) -> Series {
    let start = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
    Series::from_pairs(
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (start + Days::new(i as u64), v)),
    )
    .unwrap()
}

// Random walk with drift, seeded
fn drifting_counts(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 3.0).unwrap();
    let mut level = 100.0_f64;
    (0..n)
        .map(|_| {
            level = (level + 1.0 + noise.sample(&mut rng)).max(0.0);
            level.round()
        })
        .collect()
}

#[test]
fn test_linear_extrapolation() {
    let series = create_test_series(&[30.0, 40.0, 50.0]);
    let mut model = LinearExtrapolation::new();

    assert_eq!(model.train(&series), FitOutcome::Trained);
    assert_relative_eq!(model.growth_rate().unwrap(), 10.0);

    let points = model.predict(3).unwrap();
    let expected = [(60.0, 48.0, 72.0), (70.0, 56.0, 84.0), (80.0, 64.0, 96.0)];
    for (p, (point, lower, upper)) in points.iter().zip(expected) {
        assert_relative_eq!(p.point, point, epsilon = 1e-9);
        assert_relative_eq!(p.lower, lower, epsilon = 1e-9);
        assert_relative_eq!(p.upper, upper, epsilon = 1e-9);
    }
}

#[test]
fn test_arima_on_drifting_counts() {
    let values = drifting_counts(80, 7);
    let mut model = ArimaModel::new();

    assert_eq!(model.train(&create_test_series(&values)), FitOutcome::Trained);
    let order = model.order().unwrap();
    assert!(order.p <= 2 && order.d <= 1 && order.q <= 2);

    let points = model.predict(14).unwrap();
    assert_eq!(points.len(), 14);
    assert!(points.iter().all(|p| p.point.is_finite() && p.lower >= 0.0));
    let first_width = points[0].upper - points[0].lower;
    let last_width = points[13].upper - points[13].lower;
    assert!(last_width >= first_width);
}

#[test]
fn test_arima_respects_configured_grid() {
    let config = ForecastConfig {
        arima: ArimaConfig {
            max_p: 1,
            max_d: 0,
            max_q: 0,
            ..ArimaConfig::default()
        },
        ..ForecastConfig::default()
    };
    let mut model = ArimaModel::from_config(&config);
    model.train(&create_test_series(&drifting_counts(40, 3)));

    let order = model.order().unwrap();
    assert!(order.p <= 1);
    assert_eq!((order.d, order.q), (0, 0));
    assert_eq!(order.to_string(), format!("({},0,0)", order.p));
    assert_ne!(order, ArimaOrder::new(2, 1, 2));
}

#[test]
fn test_seasonal_model_on_weekly_reporting() {
    // Lower counts at weekends, as seen in bulletin data
    let values: Vec<f64> = (0..63)
        .map(|i| {
            let weekend = if i % 7 >= 5 { 0.6 } else { 1.0 };
            ((30.0 + 0.8 * i as f64) * weekend).round()
        })
        .collect();
    let mut model = SeasonalModel::new();

    assert_eq!(model.train(&create_test_series(&values)), FitOutcome::Trained);
    assert!(model.fitted_cycle(7.0));

    let points = model.predict(7).unwrap();
    assert_eq!(points.len(), 7);
    assert!(points.iter().all(|p| p.lower <= p.point && p.point <= p.upper));
}

#[test]
fn test_models_share_the_capability() {
    let series = create_test_series(&drifting_counts(35, 11));
    let selector = ModelSelector::default();

    for kind in ModelKind::ALL {
        let mut model: Model = selector.build(kind);
        assert_eq!(model.kind(), kind);
        assert_eq!(model.name(), kind.name());
        assert!(!model.is_trained());

        assert!(model.train(&series).is_trained());
        let points = model.predict(5).unwrap();
        assert_eq!(points[0].date, series.last().unwrap().date + Days::new(1));
    }
}

#[test]
fn test_ensemble_built_by_hand() {
    let series = create_test_series(&drifting_counts(50, 5));
    let mut ensemble = Ensemble::new();
    ensemble.add_model(LinearExtrapolation::new(), 1.0).unwrap();
    ensemble.add_model(SeasonalModel::new(), 3.0).unwrap();
    ensemble.train(&series);

    let combined = ensemble.predict(4).unwrap();
    assert_eq!(combined.points.len(), 4);
    assert_relative_eq!(combined.contributions[0].weight, 0.25);
    assert_relative_eq!(combined.contributions[1].weight, 0.75);
    assert!(combined.failures.is_empty());
}
