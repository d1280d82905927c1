//! Error type shared by every stage of report generation.

use std::path::PathBuf;

#[cfg(feature = "bookmarks")]
use crate::bookmarks::BookmarkError;

/// Errors that can occur while loading a dataset or producing its report.
///
/// Every variant is local to a single map: the batch driver in
/// [`crate::generator`] logs the error and moves on to the next map.
#[derive(Debug)]
pub enum ReportError {
    /// The dataset file could not be opened, read, or parsed.
    DataLoad {
        /// Path of the CSV source.
        path: PathBuf,
        /// Underlying reader error.
        source: csv::Error,
    },
    /// The dataset header lacks one or more required columns.
    MissingColumns {
        /// Path of the CSV source.
        path: PathBuf,
        /// Names of the absent columns, in declaration order.
        columns: Vec<&'static str>,
    },
    /// The dataset contains no rows, so no page can be produced.
    EmptyDataset {
        /// Map whose dataset was empty.
        map: String,
    },
    /// A configuration id is too large to give every id its own page.
    ConfigurationOutOfRange {
        /// Map whose dataset holds the id.
        map: String,
        /// The largest id found.
        configuration: u32,
        /// Largest accepted id.
        limit: u32,
    },
    /// A row names an algorithm that is not part of the display list.
    UnknownAlgorithm {
        /// The unlisted algorithm name.
        algorithm: String,
    },
    /// A success ratio was requested for an algorithm with no rows in the group.
    DivideByZero {
        /// Algorithm whose denominator was zero.
        algorithm: String,
        /// Configuration id of the group.
        configuration: u32,
    },
    /// The report configuration is inconsistent.
    InvalidConfig(String),
    /// Fonts could not be loaded or the document could not be laid out.
    Render(genpdf::error::Error),
    /// Writing the report to disk failed.
    Io {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Page bookmarks could not be embedded into the rendered document.
    #[cfg(feature = "bookmarks")]
    Bookmarks(BookmarkError),
}

impl ReportError {
    /// Returns `true` for failures caused by the input data rather than the environment.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::DataLoad { .. }
                | Self::MissingColumns { .. }
                | Self::EmptyDataset { .. }
                | Self::ConfigurationOutOfRange { .. }
                | Self::UnknownAlgorithm { .. }
                | Self::DivideByZero { .. }
        )
    }
}

impl From<genpdf::error::Error> for ReportError {
    fn from(err: genpdf::error::Error) -> Self {
        Self::Render(err)
    }
}

#[cfg(feature = "bookmarks")]
impl From<BookmarkError> for ReportError {
    fn from(err: BookmarkError) -> Self {
        Self::Bookmarks(err)
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataLoad { path, .. } => {
                write!(f, "Failed to load dataset from {}", path.display())
            }
            Self::MissingColumns { path, columns } => write!(
                f,
                "Dataset {} is missing required columns: {}",
                path.display(),
                columns.join(", ")
            ),
            Self::EmptyDataset { map } => write!(f, "Dataset for map '{map}' has no rows"),
            Self::ConfigurationOutOfRange {
                map,
                configuration,
                limit,
            } => write!(
                f,
                "Dataset for map '{}' uses configuration {} (at most {} is supported)",
                map, configuration, limit
            ),
            Self::UnknownAlgorithm { algorithm } => write!(
                f,
                "Algorithm '{algorithm}' is not part of the display list"
            ),
            Self::DivideByZero {
                algorithm,
                configuration,
            } => write!(
                f,
                "Algorithm '{}' has no runs in configuration {}",
                algorithm, configuration
            ),
            Self::InvalidConfig(message) => write!(f, "Invalid report configuration: {message}"),
            Self::Render(err) => write!(f, "Failed to render report: {err}"),
            Self::Io { path, .. } => write!(f, "Failed to write report to {}", path.display()),
            #[cfg(feature = "bookmarks")]
            Self::Bookmarks(err) => write!(f, "Failed to embed page bookmarks: {err}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DataLoad { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Render(err) => Some(err),
            #[cfg(feature = "bookmarks")]
            Self::Bookmarks(err) => Some(err),
            Self::MissingColumns { .. }
            | Self::EmptyDataset { .. }
            | Self::ConfigurationOutOfRange { .. }
            | Self::UnknownAlgorithm { .. }
            | Self::DivideByZero { .. }
            | Self::InvalidConfig(_) => None,
        }
    }
}
