//! Case-count observations and their loading from CSV
//!
//! The engine only ever sees a [`Series`]: one value per day, dates strictly
//! increasing, no negative counts. [`DataLoader`] and [`CaseTable`] stand in
//! for the storage layer that produces such a series from raw bulletin rows.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A single (date, case-count) data point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Bulletin date
    pub date: NaiveDate,
    /// Confirmed cases on that date
    pub value: f64,
}

impl Observation {
    /// Create a new observation
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Ordered history of observations for one population
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    /// Create a series, checking date order and value ranges
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        for obs in &observations {
            if !obs.value.is_finite() || obs.value < 0.0 {
                return Err(ForecastError::DataError(format!(
                    "Invalid case count {} on {}",
                    obs.value, obs.date
                )));
            }
        }

        if let Some(pair) = observations.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(ForecastError::DataError(format!(
                "Dates must be strictly increasing: {} is followed by {}",
                pair[0].date, pair[1].date
            )));
        }

        Ok(Self { observations })
    }

    /// Create a series from `(date, value)` pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, value)| Observation::new(date, value))
                .collect(),
        )
    }

    /// Number of data points
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series has no data points
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Earliest observation
    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    /// Latest observation
    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Case counts in date order
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// Dates in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    /// Calendar days between first and last observation
    pub fn span_days(&self) -> i64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        }
    }
}

/// Population a forecast is computed for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Population {
    /// Aggregate over every region
    #[default]
    National,
    /// A single named region
    Region(String),
}

impl Population {
    /// Population for an optional region name
    pub fn from_region(region: Option<&str>) -> Self {
        match region {
            Some(name) => Population::Region(name.to_string()),
            None => Population::National,
        }
    }

    /// Region name, if this is a sub-population
    pub fn region(&self) -> Option<&str> {
        match self {
            Population::National => None,
            Population::Region(name) => Some(name),
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Population::National => write!(f, "National"),
            Population::Region(name) => write!(f, "{}", name),
        }
    }
}

/// One row of a bulletin extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Bulletin date
    pub date: NaiveDate,
    /// Reporting region
    pub region: String,
    /// Confirmed cases reported for the region on that date
    pub cases: f64,
}

/// Raw case rows, possibly several per date
#[derive(Debug, Clone, Default)]
pub struct CaseTable {
    records: Vec<CaseRecord>,
}

impl CaseTable {
    /// Create a table from raw records
    pub fn new(records: Vec<CaseRecord>) -> Self {
        Self { records }
    }

    /// Number of raw rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct region names, sorted
    pub fn regions(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Daily totals for a population, one observation per date
    pub fn series(&self, population: &Population) -> Result<Series> {
        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for record in &self.records {
            if let Some(region) = population.region() {
                if record.region != region {
                    continue;
                }
            }
            *totals.entry(record.date).or_insert(0.0) += record.cases;
        }

        Series::from_pairs(totals)
    }
}

/// Data loader for bulletin extracts
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load case rows from a CSV file with `date,region,cases` columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<CaseTable> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Load case rows from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<CaseTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for row in csv_reader.deserialize() {
            let record: CaseRecord = row?;
            if !record.cases.is_finite() || record.cases < 0.0 {
                return Err(ForecastError::DataError(format!(
                    "Invalid case count {} for {} on {}",
                    record.cases, record.region, record.date
                )));
            }
            records.push(record);
        }

        Ok(CaseTable::new(records))
    }
}
