use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use planner_report::{ReportConfig, ReportGenerator, UnlistedAlgorithmPolicy};

/// Writes one comparison PDF per map from planner benchmark CSVs.
///
/// Reads `<root>/results/compare/<map>.csv` and writes `<root>/results/<map>.pdf`.
/// Fonts are taken from `PLANNER_REPORT_FONTS_DIR`, `assets/fonts`, or a
/// system sans-serif family.
#[derive(Parser)]
#[command(author, version, about = "Render planner benchmark comparison reports")]
struct Cli {
    /// Directory containing `results/compare`.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Map to process; repeat for several. Defaults to every known map.
    #[arg(long = "map", value_name = "NAME")]
    maps: Vec<String>,

    /// Only chart these algorithms; repeat for several.
    #[arg(long = "only", value_name = "ALG")]
    only: Vec<String>,

    /// What to do with algorithms missing from the display list.
    #[arg(long, value_name = "skip|append|reject", default_value = "skip")]
    unlisted: UnlistedAlgorithmPolicy,

    /// Add a PDF bookmark per page (needs the `bookmarks` feature).
    #[arg(long)]
    bookmarks: bool,
}

impl Cli {
    fn into_config(self) -> ReportConfig {
        let mut config = ReportConfig::new()
            .with_root(&self.root)
            .with_unlisted_policy(self.unlisted)
            .with_bookmarks(self.bookmarks);
        if !self.maps.is_empty() {
            config = config.with_maps(self.maps);
        }
        if !self.only.is_empty() {
            config = config.with_algorithm_filter(Some(self.only));
        }
        config
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Reading benchmark results under {}", cli.root.display());

    let mut generator = ReportGenerator::new(cli.into_config());
    let report = match generator.run_all() {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Error: {}", err);
            print_error_sources(&err);
            std::process::exit(2);
        }
    };

    for summary in report.successes() {
        println!(
            "{}: {} ({} pages)",
            summary.map,
            summary.output_path.display(),
            summary.pages
        );
    }

    if !report.is_success() {
        for (map, err) in report.failures() {
            eprintln!("Error: {}: {}", map, err);
            print_error_sources(err);
        }
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
