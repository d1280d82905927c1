//! Loading benchmark runs and slicing them into configuration groups.
//!
//! A [`Dataset`] holds every [`RunRecord`] recorded for one map. Reports are
//! built one [`ConfigurationGroup`] at a time; a group borrows the records of a
//! single configuration id and exposes the success and timing subsets the
//! charts are drawn from.

use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ReportError;

/// Header columns every dataset must provide.
pub const REQUIRED_COLUMNS: [&str; 5] = ["conf", "algorithm", "time", "length", "roughness"];

/// Largest configuration id a report is generated for; one page is drawn per id.
pub const MAX_CONFIGURATION_ID: u32 = 9_999;

/// One planner run as recorded by the benchmark harness.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RunRecord {
    /// Configuration (start/goal scenario) the run belongs to.
    #[serde(rename = "conf")]
    pub configuration: u32,
    /// Name of the planner.
    pub algorithm: String,
    /// Planning time in seconds.
    pub time: f64,
    /// Path length; `0` marks a run that found no path.
    pub length: f64,
    /// Smoothness metric of the produced path.
    pub roughness: f64,
}

impl RunRecord {
    /// Creates a record from its fields.
    pub fn new(
        configuration: u32,
        algorithm: impl Into<String>,
        time: f64,
        length: f64,
        roughness: f64,
    ) -> Self {
        Self {
            configuration,
            algorithm: algorithm.into(),
            time,
            length,
            roughness,
        }
    }

    /// Returns whether the run produced a path.
    pub fn is_success(&self) -> bool {
        self.length != 0.0
    }
}

/// Numeric column plotted by a distribution chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    /// Planning time.
    Time,
    /// Path length.
    Length,
    /// Path roughness.
    Roughness,
}

impl Metric {
    /// Extracts the metric from a record.
    pub fn value(self, record: &RunRecord) -> f64 {
        match self {
            Self::Time => record.time,
            Self::Length => record.length,
            Self::Roughness => record.roughness,
        }
    }
}

/// Every run recorded for one map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    map: String,
    records: Vec<RunRecord>,
}

impl Dataset {
    /// Creates a dataset from records that are already in memory.
    pub fn new(map: impl Into<String>, records: Vec<RunRecord>) -> Self {
        Self {
            map: map.into(),
            records,
        }
    }

    /// Loads the dataset for `map` from the CSV file at `path`.
    pub fn load(map: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| ReportError::DataLoad {
                path: path.to_path_buf(),
                source,
            })?;
        let dataset = Self::read(map, path, reader)?;
        log::debug!(
            "Loaded {} runs for map '{}' from {}",
            dataset.len(),
            dataset.map,
            path.display()
        );
        Ok(dataset)
    }

    /// Parses a dataset from any reader; `origin` is only used in error messages.
    pub fn from_reader<R: io::Read>(
        map: impl Into<String>,
        origin: impl Into<PathBuf>,
        reader: R,
    ) -> Result<Self, ReportError> {
        let origin = origin.into();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::read(map, &origin, reader)
    }

    fn read<R: io::Read>(
        map: impl Into<String>,
        path: &Path,
        mut reader: csv::Reader<R>,
    ) -> Result<Self, ReportError> {
        let data_error = |source| ReportError::DataLoad {
            path: path.to_path_buf(),
            source,
        };

        let map = map.into();
        let headers = reader.headers().map_err(data_error)?;
        // No header record means the input holds no bytes besides blank lines.
        if headers.is_empty() {
            return Err(ReportError::EmptyDataset { map });
        }
        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|header| header == *column))
            .collect();
        if !missing.is_empty() {
            return Err(ReportError::MissingColumns {
                path: path.to_path_buf(),
                columns: missing,
            });
        }

        let records = reader
            .deserialize::<RunRecord>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(data_error)?;

        Ok(Self::new(map, records))
    }

    /// Name of the map the runs were recorded on.
    pub fn map(&self) -> &str {
        &self.map
    }

    /// All runs in file order.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the dataset holds no runs.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every run whose algorithm is not in `names`.
    pub fn retain_algorithms(&mut self, names: &[String]) {
        self.records
            .retain(|record| names.iter().any(|name| *name == record.algorithm));
    }

    /// Distinct algorithm names in order of first appearance.
    pub fn algorithms(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.algorithm.as_str()) {
                seen.push(&record.algorithm);
            }
        }
        seen
    }

    /// Number of pages a report needs: `max(conf) + 1`, or `None` when empty.
    pub fn configuration_count(&self) -> Option<u64> {
        self.max_configuration().map(|max| u64::from(max) + 1)
    }

    fn max_configuration(&self) -> Option<u32> {
        self.records.iter().map(|record| record.configuration).max()
    }

    /// The dense range of configuration ids `[0, max(conf)]`.
    ///
    /// Ids missing from the data are still part of the range and yield empty
    /// groups. Ids above [`MAX_CONFIGURATION_ID`] are rejected.
    pub fn configuration_ids(&self) -> Result<Range<u32>, ReportError> {
        let max = self
            .max_configuration()
            .ok_or_else(|| ReportError::EmptyDataset {
                map: self.map.clone(),
            })?;
        if max > MAX_CONFIGURATION_ID {
            return Err(ReportError::ConfigurationOutOfRange {
                map: self.map.clone(),
                configuration: max,
                limit: MAX_CONFIGURATION_ID,
            });
        }
        Ok(0..max + 1)
    }

    /// Collects the runs of one configuration.
    pub fn group(&self, configuration: u32) -> ConfigurationGroup<'_> {
        ConfigurationGroup {
            configuration,
            records: self
                .records
                .iter()
                .filter(|record| record.configuration == configuration)
                .collect(),
        }
    }

    /// Iterates every configuration group in ascending id order.
    pub fn groups(&self) -> Result<impl Iterator<Item = ConfigurationGroup<'_>> + '_, ReportError> {
        let ids = self.configuration_ids()?;
        Ok(ids.map(move |configuration| self.group(configuration)))
    }
}

/// A borrowed selection of runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSubset<'a> {
    records: Vec<&'a RunRecord>,
}

impl<'a> RunSubset<'a> {
    /// Runs in the subset.
    pub fn records(&self) -> &[&'a RunRecord] {
        &self.records
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the subset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of runs of `algorithm`.
    pub fn count_for(&self, algorithm: &str) -> usize {
        self.records
            .iter()
            .filter(|record| record.algorithm == algorithm)
            .count()
    }

    /// Values of `metric` for the runs of `algorithm`, in file order.
    pub fn values_for(&self, algorithm: &str, metric: Metric) -> Vec<f64> {
        self.records
            .iter()
            .filter(|record| record.algorithm == algorithm)
            .map(|record| metric.value(record))
            .collect()
    }

    /// Returns whether any run belongs to `algorithm`.
    pub fn contains_algorithm(&self, algorithm: &str) -> bool {
        self.records.iter().any(|record| record.algorithm == algorithm)
    }

    fn filtered(&self, mut keep: impl FnMut(&RunRecord) -> bool) -> Self {
        Self {
            records: self
                .records
                .iter()
                .copied()
                .filter(|record| keep(record))
                .collect(),
        }
    }
}

/// The runs sharing one configuration id; the unit of one report page.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigurationGroup<'a> {
    configuration: u32,
    records: Vec<&'a RunRecord>,
}

impl<'a> ConfigurationGroup<'a> {
    /// Configuration id of the group.
    pub fn configuration(&self) -> u32 {
        self.configuration
    }

    /// Every run of the group as a subset.
    pub fn all(&self) -> RunSubset<'a> {
        RunSubset {
            records: self.records.clone(),
        }
    }

    /// Number of runs in the group.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the configuration id has no runs.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Runs that found a path (`length != 0`).
    pub fn success(&self) -> RunSubset<'a> {
        self.all().filtered(RunRecord::is_success)
    }

    /// Successful runs minus the algorithms accepted by `excluded`.
    pub fn timing(&self, mut excluded: impl FnMut(&str) -> bool) -> RunSubset<'a> {
        self.success()
            .filtered(|record| !excluded(record.algorithm.as_str()))
    }

    /// Percentage of runs of `algorithm` that found a path.
    ///
    /// Fails with [`ReportError::DivideByZero`] when the group has no run of
    /// `algorithm`.
    pub fn checked_success_rate(&self, algorithm: &str) -> Result<f64, ReportError> {
        let total = self.all().count_for(algorithm);
        if total == 0 {
            return Err(ReportError::DivideByZero {
                algorithm: algorithm.to_string(),
                configuration: self.configuration,
            });
        }
        let successes = self.success().count_for(algorithm);
        Ok(successes as f64 / total as f64 * 100.0)
    }

    /// Percentage of runs of `algorithm` that found a path, `0` without runs.
    pub fn success_rate(&self, algorithm: &str) -> f64 {
        match self.checked_success_rate(algorithm) {
            Ok(rate) => rate,
            Err(err) => {
                log::debug!("{}; reporting a success rate of 0", err);
                0.0
            }
        }
    }
}
