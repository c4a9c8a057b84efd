use chrono::NaiveDate;
use std::io::Write;
use tempfile::NamedTempFile;
use vigie_forecast::{DataLoader, ForecastError, ForecastService, Population};

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_data_loader_from_csv() {
    let file = write_csv(&[
        "date,region,cases",
        "2024-05-01,Dakar,12",
        "2024-05-01,Thies,4",
        "2024-05-02,Dakar,15",
        "2024-05-03, Thies , 7",
    ]);

    let table = DataLoader::from_csv(file.path()).unwrap();
    assert_eq!(table.len(), 4);
    assert!(!table.is_empty());
    assert_eq!(table.regions(), vec!["Dakar".to_string(), "Thies".to_string()]);

    let national = table.series(&Population::National).unwrap();
    assert_eq!(national.values(), vec![16.0, 15.0, 7.0]);
    assert_eq!(
        national.first().unwrap().date,
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    );

    let thies = table.series(&Population::Region("Thies".to_string())).unwrap();
    assert_eq!(thies.values(), vec![4.0, 7.0]);
    assert_eq!(thies.span_days(), 2);
}

#[test]
fn test_unknown_region_is_empty() {
    let file = write_csv(&["date,region,cases", "2024-05-01,Dakar,12"]);
    let table = DataLoader::from_csv(file.path()).unwrap();

    let series = table.series(&Population::Region("Matam".to_string())).unwrap();
    assert!(series.is_empty());

    let result = ForecastService::default().forecast(&series, 3);
    assert!(matches!(
        result,
        Err(ForecastError::InsufficientData { got: 0, .. })
    ));
}

#[test]
fn test_negative_counts_are_rejected() {
    let file = write_csv(&["date,region,cases", "2024-05-01,Dakar,-3"]);
    let result = DataLoader::from_csv(file.path());
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_malformed_rows_are_csv_errors() {
    let file = write_csv(&["date,region,cases", "01/05/2024,Dakar,3"]);
    assert!(matches!(
        DataLoader::from_csv(file.path()),
        Err(ForecastError::CsvError(_))
    ));

    let missing = write_csv(&["date,region,cases", "2024-05-01,Dakar,many"]);
    assert!(DataLoader::from_csv(missing.path()).is_err());
}

#[test]
fn test_missing_file_is_io_error() {
    let result = DataLoader::from_csv("/nonexistent/bulletins.csv");
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_from_reader() {
    let csv = "date,region,cases\n2024-05-01,Louga,2\n2024-05-02,Louga,3\n";
    let table = DataLoader::from_reader(csv.as_bytes()).unwrap();
    let series = table.series(&Population::National).unwrap();

    let report = ForecastService::default().forecast(&series, 2).unwrap();
    assert_eq!(report.predictions[0].predicted_cases, 4);
}
