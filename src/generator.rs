//! Per-map report pipeline and batch driver.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::builder::GenpdfRenderer;
use crate::chart::{ChartPage, PagePlanner, PageRenderer};
use crate::config::ReportConfig;
use crate::dataset::Dataset;
use crate::error::ReportError;

/// Outcome of a successfully generated report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportSummary {
    /// Map the report was generated for.
    pub map: String,
    /// Where the PDF was written.
    pub output_path: PathBuf,
    /// Number of pages, one per configuration id.
    pub pages: usize,
    /// Size of the written file.
    pub bytes: usize,
}

/// Per-map results of [`ReportGenerator::run_all`], in configuration order.
#[derive(Debug, Default)]
pub struct BatchReport {
    results: Vec<(String, Result<ReportSummary, ReportError>)>,
}

impl BatchReport {
    /// Every map with its outcome.
    pub fn results(&self) -> &[(String, Result<ReportSummary, ReportError>)] {
        &self.results
    }

    /// Reports that were written.
    pub fn successes(&self) -> impl Iterator<Item = &ReportSummary> {
        self.results.iter().filter_map(|(_, result)| result.as_ref().ok())
    }

    /// Maps that failed together with their error.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ReportError)> {
        self.results
            .iter()
            .filter_map(|(map, result)| result.as_ref().err().map(|err| (map.as_str(), err)))
    }

    /// Number of failed maps.
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True when every map produced a report.
    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Loads datasets, plans their pages and writes one PDF per map.
pub struct ReportGenerator<R = GenpdfRenderer> {
    config: ReportConfig,
    renderer: R,
}

impl ReportGenerator<GenpdfRenderer> {
    /// Creates a generator that renders with `genpdf`.
    pub fn new(config: ReportConfig) -> Self {
        #[cfg(feature = "bookmarks")]
        let renderer = GenpdfRenderer::new().with_bookmarks(config.bookmarks());
        #[cfg(not(feature = "bookmarks"))]
        let renderer = GenpdfRenderer::new();
        Self { config, renderer }
    }
}

impl<R: PageRenderer> ReportGenerator<R> {
    /// Creates a generator with a custom page renderer.
    pub fn with_renderer(config: ReportConfig, renderer: R) -> Self {
        Self { config, renderer }
    }

    /// The configuration driving this generator.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// The page renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Builds the pages for `map` without rendering or writing anything.
    pub fn plan(&self, map: &str) -> Result<Vec<ChartPage>, ReportError> {
        self.config.validate()?;
        let path = self.config.input_path(map);
        let mut dataset = Dataset::load(map, &path)?;

        let mut order = self.config.algorithms().clone();
        if let Some(filter) = self.config.algorithm_filter() {
            dataset.retain_algorithms(filter);
            order = order.retain(|name| filter.iter().any(|kept| kept == name));
        }

        let ids = dataset.configuration_ids()?;
        let order = order.resolve(dataset.algorithms(), self.config.unlisted_policy())?;
        debug!(
            "Planning {} pages for '{}' with algorithms {:?}",
            ids.len(),
            map,
            order.names()
        );

        let planner = PagePlanner::new(map, &order, &self.config);
        Ok(ids
            .map(|configuration| planner.plan(&dataset.group(configuration)))
            .collect())
    }

    /// Generates the report for one map.
    pub fn generate(&mut self, map: &str) -> Result<ReportSummary, ReportError> {
        let pages = self.plan(map)?;
        let source = self.config.input_path(map);
        let bytes = self.renderer.render_pages(
            map,
            &source.display().to_string(),
            &pages,
        )?;

        let output_path = self.config.output_path(map);
        write_atomically(&output_path, &bytes)?;
        info!(
            "Wrote {} ({} pages, {} bytes)",
            output_path.display(),
            pages.len(),
            bytes.len()
        );

        Ok(ReportSummary {
            map: map.to_string(),
            output_path,
            pages: pages.len(),
            bytes: bytes.len(),
        })
    }

    /// Generates every configured map, continuing past failures.
    ///
    /// Fails up front only when the configuration itself is invalid.
    pub fn run_all(&mut self) -> Result<BatchReport, ReportError> {
        self.config.validate()?;

        let maps = self.config.maps().to_vec();
        let mut report = BatchReport::default();
        for map in maps {
            let result = self.generate(&map);
            if let Err(err) = &result {
                warn!("Report for '{}' failed: {}", map, err);
            }
            report.results.push((map, result));
        }

        info!(
            "Generated {} of {} reports",
            report.successes().count(),
            report.results.len()
        );
        Ok(report)
    }
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}

/// Writes `bytes` to a sibling file first and renames it over `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let io_error = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let partial = temporary_sibling(path);
    if let Err(err) = fs::write(&partial, bytes).and_then(|()| fs::rename(&partial, path)) {
        let _ = fs::remove_file(&partial);
        return Err(io_error(err));
    }
    Ok(())
}
