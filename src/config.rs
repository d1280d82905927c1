//! Report configuration: which maps to process and how algorithms are laid out.
//!
//! The defaults reproduce the comparison run that the benchmark harness writes
//! under `results/compare`. Callers adjust them through the `with_*` methods
//! and hand the finished [`ReportConfig`] to [`crate::generator::ReportGenerator`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ReportError;

/// Maps processed by a default batch run.
pub const DEFAULT_MAPS: &[&str] = &["open", "map", "buildings", "offices"];

/// Display order of the compared planners.
pub const DEFAULT_ALGORITHMS: &[&str] = &[
    "nh",
    "rrt",
    "rrt_star_first",
    "rrt_star_last",
    "theta_star_rrt",
    "voronoi_rrt",
];

/// Planners whose timing is left out of the time chart.
///
/// Both variants stop as soon as a first or best path is found, so their run
/// time is not comparable with planners that run a fixed procedure.
pub const DEFAULT_TIMING_EXCLUSIONS: &[&str] = &["rrt_star_first", "rrt_star_last"];

const DEFAULT_INPUT_SUBDIR: &str = "results/compare";
const DEFAULT_OUTPUT_SUBDIR: &str = "results";

/// Behaviour for algorithms that appear in the data but not in the display list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnlistedAlgorithmPolicy {
    /// Leave the algorithm out of every chart and log a warning.
    #[default]
    Skip,
    /// Place the algorithm after the listed ones, in order of first appearance.
    Append,
    /// Fail the map with [`ReportError::UnknownAlgorithm`].
    Reject,
}

impl std::str::FromStr for UnlistedAlgorithmPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "append" => Ok(Self::Append),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown policy '{other}', expected one of: skip, append, reject"
            )),
        }
    }
}

/// Explicit mapping from algorithm name to its position on the category axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlgorithmOrder {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl AlgorithmOrder {
    /// Builds an order from the given names, rejecting empty or duplicated entries.
    pub fn new<I, S>(names: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order = Self {
            names: Vec::new(),
            positions: HashMap::new(),
        };

        for name in names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(ReportError::InvalidConfig(
                    "algorithm names must not be empty".to_string(),
                ));
            }
            if order.positions.contains_key(&name) {
                return Err(ReportError::InvalidConfig(format!(
                    "algorithm '{name}' is listed more than once"
                )));
            }
            order.push(name);
        }

        Ok(order)
    }

    /// The default display order, [`DEFAULT_ALGORITHMS`].
    pub fn defaults() -> Self {
        let mut order = Self {
            names: Vec::new(),
            positions: HashMap::new(),
        };
        for name in DEFAULT_ALGORITHMS {
            order.push(name.to_string());
        }
        order
    }

    fn push(&mut self, name: String) {
        self.positions.insert(name.clone(), self.names.len());
        self.names.push(name);
    }

    /// Returns the display position of `name`, if listed.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Returns whether `name` is part of the order.
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Returns the names in display order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of listed algorithms.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` when no algorithm is listed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolves the order used for one dataset according to `policy`.
    ///
    /// `observed` lists the algorithm names found in the data in order of first
    /// appearance. Listed algorithms keep their position whether or not they
    /// were observed.
    pub fn resolve<'a, I>(
        &self,
        observed: I,
        policy: UnlistedAlgorithmPolicy,
    ) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut resolved = self.clone();
        for name in observed {
            if resolved.contains(name) {
                continue;
            }
            match policy {
                UnlistedAlgorithmPolicy::Skip => {
                    log::warn!("Skipping algorithm '{}' missing from the display list", name);
                }
                UnlistedAlgorithmPolicy::Append => {
                    log::debug!("Appending unlisted algorithm '{}' to the display list", name);
                    resolved.push(name.to_string());
                }
                UnlistedAlgorithmPolicy::Reject => {
                    return Err(ReportError::UnknownAlgorithm {
                        algorithm: name.to_string(),
                    });
                }
            }
        }
        Ok(resolved)
    }

    /// Returns a copy restricted to the names accepted by `keep`, preserving order.
    pub fn retain(&self, mut keep: impl FnMut(&str) -> bool) -> Self {
        let mut narrowed = Self {
            names: Vec::new(),
            positions: HashMap::new(),
        };
        for name in self.names.iter().filter(|name| keep(name.as_str())) {
            narrowed.push(name.clone());
        }
        narrowed
    }
}

/// Configuration for a batch of map reports.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    maps: Vec<String>,
    algorithms: AlgorithmOrder,
    timing_exclusions: Vec<String>,
    algorithm_filter: Option<Vec<String>>,
    unlisted_policy: UnlistedAlgorithmPolicy,
    input_dir: PathBuf,
    output_dir: PathBuf,
    bookmarks: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            maps: DEFAULT_MAPS.iter().map(|name| name.to_string()).collect(),
            algorithms: AlgorithmOrder::defaults(),
            timing_exclusions: DEFAULT_TIMING_EXCLUSIONS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            algorithm_filter: None,
            unlisted_policy: UnlistedAlgorithmPolicy::default(),
            input_dir: PathBuf::from(DEFAULT_INPUT_SUBDIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_SUBDIR),
            bookmarks: false,
        }
    }
}

impl ReportConfig {
    /// Creates the default configuration relative to the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the input and output directories below `root`.
    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        self.input_dir = root.join(DEFAULT_INPUT_SUBDIR);
        self.output_dir = root.join(DEFAULT_OUTPUT_SUBDIR);
        self
    }

    /// Sets the directory holding `<map>.csv` files.
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Sets the directory receiving `<map>.pdf` files.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Replaces the list of maps to process.
    pub fn with_maps<I, S>(mut self, maps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.maps = maps.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the display order of algorithms.
    pub fn with_algorithms(mut self, algorithms: AlgorithmOrder) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Replaces the algorithms excluded from the time chart.
    pub fn with_timing_exclusions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.timing_exclusions = names.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts reports to the given algorithms; `None` keeps every row.
    pub fn with_algorithm_filter<I, S>(mut self, names: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.algorithm_filter = names.map(|names| names.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the policy for algorithms missing from the display list.
    pub fn with_unlisted_policy(mut self, policy: UnlistedAlgorithmPolicy) -> Self {
        self.unlisted_policy = policy;
        self
    }

    /// Enables per-page PDF bookmarks (requires the `bookmarks` feature).
    pub fn with_bookmarks(mut self, bookmarks: bool) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    /// Returns the maps to process, in order.
    pub fn maps(&self) -> &[String] {
        &self.maps
    }

    /// Returns the configured display order.
    pub fn algorithms(&self) -> &AlgorithmOrder {
        &self.algorithms
    }

    /// Returns whether `algorithm` is left out of the time chart.
    pub fn is_timing_excluded(&self, algorithm: &str) -> bool {
        self.timing_exclusions.iter().any(|name| name == algorithm)
    }

    /// Returns the algorithms left out of the time chart.
    pub fn timing_exclusions(&self) -> &[String] {
        &self.timing_exclusions
    }

    /// Returns the algorithm filter, if any.
    pub fn algorithm_filter(&self) -> Option<&[String]> {
        self.algorithm_filter.as_deref()
    }

    /// Returns the unlisted algorithm policy.
    pub fn unlisted_policy(&self) -> UnlistedAlgorithmPolicy {
        self.unlisted_policy
    }

    /// Returns whether page bookmarks were requested.
    pub fn bookmarks(&self) -> bool {
        self.bookmarks
    }

    /// Path of the dataset for `map`.
    pub fn input_path(&self, map: &str) -> PathBuf {
        self.input_dir.join(format!("{map}.csv"))
    }

    /// Path of the report for `map`.
    pub fn output_path(&self, map: &str) -> PathBuf {
        self.output_dir.join(format!("{map}.pdf"))
    }

    /// Checks the configuration before any map is processed.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.maps.is_empty() {
            return Err(ReportError::InvalidConfig("no maps configured".to_string()));
        }
        if let Some(map) = self
            .maps
            .iter()
            .find(|map| map.is_empty() || map.contains(&['/', '\\'][..]))
        {
            return Err(ReportError::InvalidConfig(format!(
                "map name '{map}' cannot be used as a file name"
            )));
        }
        if self.algorithms.is_empty() && self.unlisted_policy != UnlistedAlgorithmPolicy::Append {
            return Err(ReportError::InvalidConfig(
                "the display list is empty and unlisted algorithms are not appended".to_string(),
            ));
        }
        if let Some(filter) = &self.algorithm_filter {
            if filter.is_empty() {
                return Err(ReportError::InvalidConfig(
                    "the algorithm filter is empty".to_string(),
                ));
            }
            let charted = self.unlisted_policy == UnlistedAlgorithmPolicy::Append
                || filter.iter().any(|name| self.algorithms.contains(name));
            if !charted {
                return Err(ReportError::InvalidConfig(format!(
                    "none of the filtered algorithms ({}) is in the display list",
                    filter.join(", ")
                )));
            }
        }
        if self.bookmarks && !cfg!(feature = "bookmarks") {
            return Err(ReportError::InvalidConfig(
                "page bookmarks need the `bookmarks` feature".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AlgorithmOrder, ReportConfig, UnlistedAlgorithmPolicy};
    use crate::error::ReportError;

    #[test]
    fn default_order_matches_display_list() {
        let config = ReportConfig::default();
        assert_eq!(config.algorithms().position("nh"), Some(0));
        assert_eq!(config.algorithms().position("voronoi_rrt"), Some(5));
        assert!(config.is_timing_excluded("rrt_star_first"));
        assert!(config.is_timing_excluded("rrt_star_last"));
        assert!(!config.is_timing_excluded("rrt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = AlgorithmOrder::new(["rrt", "nh", "rrt"]).unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfig(_)));
    }

    #[test]
    fn resolve_appends_unlisted_names_in_order_of_appearance() {
        let order = AlgorithmOrder::new(["rrt", "nh"]).unwrap();
        let resolved = order
            .resolve(["prm", "nh", "bit_star", "prm"], UnlistedAlgorithmPolicy::Append)
            .unwrap();
        assert_eq!(resolved.names(), ["rrt", "nh", "prm", "bit_star"]);
    }

    #[test]
    fn resolve_skips_or_rejects_unlisted_names() {
        let order = AlgorithmOrder::new(["rrt"]).unwrap();
        let skipped = order.resolve(["prm"], UnlistedAlgorithmPolicy::Skip).unwrap();
        assert_eq!(skipped.names(), ["rrt"]);

        let err = order
            .resolve(["prm"], UnlistedAlgorithmPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, ReportError::UnknownAlgorithm { algorithm } if algorithm == "prm"));
    }

    #[test]
    fn paths_follow_results_layout() {
        let config = ReportConfig::new().with_root("/data");
        assert_eq!(
            config.input_path("open"),
            std::path::Path::new("/data/results/compare/open.csv")
        );
        assert_eq!(
            config.output_path("open"),
            std::path::Path::new("/data/results/open.pdf")
        );
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(
            "Append".parse::<UnlistedAlgorithmPolicy>(),
            Ok(UnlistedAlgorithmPolicy::Append)
        );
        assert!("drop".parse::<UnlistedAlgorithmPolicy>().is_err());
    }

    #[test]
    fn filter_outside_the_display_list_is_invalid() {
        let config = ReportConfig::new().with_algorithm_filter(Some(vec!["prm".to_string()]));
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidConfig(message)) if message.contains("prm")
        ));

        let config = config.with_unlisted_policy(UnlistedAlgorithmPolicy::Append);
        assert!(config.validate().is_ok());

        let config = ReportConfig::new()
            .with_algorithm_filter(Some(vec!["prm".to_string(), "rrt".to_string()]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_map_list_is_invalid() {
        let config = ReportConfig::new().with_maps(Vec::<String>::new());
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidConfig(_))
        ));
    }
}
