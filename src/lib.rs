//! Comparison reports for path-planner benchmark results.
//!
//! Each map's CSV of planner runs becomes a PDF with one page per
//! configuration, showing time, length and roughness box plots next to a
//! success-rate bar chart.

pub mod builder;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod generator;
pub mod stats;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use builder::GenpdfRenderer;
pub use config::{AlgorithmOrder, ReportConfig, UnlistedAlgorithmPolicy};
pub use dataset::{Dataset, RunRecord};
pub use error::ReportError;
pub use generator::{BatchReport, ReportGenerator, ReportSummary};
