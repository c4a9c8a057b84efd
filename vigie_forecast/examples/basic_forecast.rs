use chrono::{Days, NaiveDate};
use vigie_forecast::{CaseRecord, CaseTable, ForecastService, Population, PredictionRow};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Vigie Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    let table = create_sample_table(45);
    println!(
        "Sample bulletins: {} rows across {:?}\n",
        table.len(),
        table.regions()
    );

    let service = ForecastService::default();

    // National aggregate, long enough for the full ensemble
    let national = table.series(&Population::National)?;
    let report = service.forecast(&national, 7)?;

    println!("{}", report.message);
    for weight in &report.weights {
        println!("  {:<22} weight {:.2}", weight.model, weight.weight);
    }
    println!();
    print_rows(&report.predictions);

    // One region, truncated to a short history: fallback mode
    let population = Population::Region("Dakar".to_string());
    let short = create_sample_table(10).series(&population)?;
    let regional = service.forecast_for(&population, &short, 5)?;

    println!("\n{}", regional.message);
    print_rows(&regional.predictions);

    println!("\nJSON report:");
    println!("{}", serde_json::to_string_pretty(&regional)?);

    Ok(())
}

fn print_rows(rows: &[PredictionRow]) {
    println!(
        "{:<12} {:>10} {:>10} {:>10}",
        "date", "predicted", "lower", "upper"
    );
    for row in rows {
        println!(
            "{:<12} {:>10} {:>10} {:>10}",
            row.date, row.predicted_cases, row.lower_bound, row.upper_bound
        );
    }
}

// Two regions with a growing outbreak and a weekly reporting dip
fn create_sample_table(days: u64) -> CaseTable {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let mut records = Vec::new();

    for i in 0..days {
        let date = start + Days::new(i);
        let weekend = if i % 7 >= 5 { 0.7 } else { 1.0 };
        let dakar = (20.0 + 1.5 * i as f64) * weekend;
        let thies = (8.0 + 0.6 * i as f64) * weekend;

        records.push(CaseRecord {
            date,
            region: "Dakar".to_string(),
            cases: dakar.round(),
        });
        records.push(CaseRecord {
            date,
            region: "Thies".to_string(),
            cases: thies.round(),
        });
    }

    CaseTable::new(records)
}
