use chrono::{Days, NaiveDate};
use vigie_forecast::{ForecastConfig, ForecastService, Population, Series};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Vigie Forecast: Model Ladder");
    println!("============================\n");

    let service = ForecastService::new(ForecastConfig::default())?;
    let history = outbreak_curve(120);

    for n in [1, 2, 10, 29, 30, 60, 120] {
        let series = Series::new(history[..n].to_vec())?;
        let status = service.status(&Population::National, &series);

        println!("{} data points:", n);
        for (key, model) in &status.models {
            println!(
                "  {:<8} {:<28} needs {:>3} more",
                key, model.status, model.points_needed
            );
        }

        match service.forecast(&series, 3) {
            Ok(report) => {
                println!("  mode {:?}, models {:?}", report.mode, report.models_used);
                if let Some(first) = report.predictions.first() {
                    println!(
                        "  next day: {} [{}, {}]",
                        first.predicted_cases, first.lower_bound, first.upper_bound
                    );
                }
            }
            Err(e) => println!("  no forecast: {}", e),
        }
        println!();
    }

    Ok(())
}

// Logistic epidemic curve of new daily cases
fn outbreak_curve(days: u64) -> Vec<vigie_forecast::Observation> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..days)
        .map(|i| {
            let t = i as f64;
            let cumulative = |t: f64| 5000.0 / (1.0 + (-(t - 60.0) / 9.0).exp());
            let daily = cumulative(t + 1.0) - cumulative(t);
            vigie_forecast::Observation::new(start + Days::new(i), daily.round())
        })
        .collect()
}
