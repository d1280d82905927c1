//! Declarative description of report pages.
//!
//! A [`ChartPage`] lists the four [`ChartPanel`]s drawn for one configuration
//! group. Panels carry only data (category labels, box statistics, bar
//! heights, axis limits and a title); they know nothing about PDF rendering.
//! Any [`PageRenderer`] can turn a sequence of pages into a document, which
//! keeps the page planning testable without fonts or a PDF backend.

use crate::config::{AlgorithmOrder, ReportConfig};
use crate::dataset::{ConfigurationGroup, Metric, RunSubset};
use crate::error::ReportError;
use crate::stats::{AxisRange, BoxStats};

/// Title of the planning time panel.
pub const TIME_TITLE: &str = "Time (s)";
/// Title of the path length panel.
pub const LENGTH_TITLE: &str = "Length";
/// Title of the path roughness panel.
pub const ROUGHNESS_TITLE: &str = "Roughness";
/// Title of the success rate panel.
pub const SUCCESS_RATE_TITLE: &str = "Success rate (%)";

/// Fixed value axis of the success rate panel.
pub const SUCCESS_RATE_LIMITS: AxisRange = AxisRange {
    min: 0.0,
    max: 120.0,
};

/// How a panel draws its categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelKind {
    /// One box per category.
    Distribution {
        /// Whether samples beyond the whiskers are drawn as points.
        show_outliers: bool,
    },
    /// One bar per category.
    Bar,
}

/// Data plotted in one category slot.
#[derive(Clone, Debug, PartialEq)]
pub enum CategoryData {
    /// Box statistics; `None` leaves the slot empty.
    Box(Option<BoxStats>),
    /// Bar height.
    Bar(f64),
}

/// A labelled slot on the category axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    label: String,
    data: CategoryData,
}

impl Category {
    /// Label printed under the slot.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Data drawn in the slot.
    pub fn data(&self) -> &CategoryData {
        &self.data
    }
}

/// Value axis limits of a panel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum AxisLimits {
    /// Fit the axis around the drawn data.
    #[default]
    Auto,
    /// Use the given range regardless of the data.
    Fixed(AxisRange),
}

/// One chart on a report page.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartPanel {
    title: String,
    kind: PanelKind,
    categories: Vec<Category>,
    limits: AxisLimits,
}

impl ChartPanel {
    /// Creates an empty box-plot panel.
    pub fn distribution(title: impl Into<String>, show_outliers: bool) -> Self {
        Self {
            title: title.into(),
            kind: PanelKind::Distribution { show_outliers },
            categories: Vec::new(),
            limits: AxisLimits::Auto,
        }
    }

    /// Creates an empty bar panel.
    pub fn bars(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: PanelKind::Bar,
            categories: Vec::new(),
            limits: AxisLimits::Auto,
        }
    }

    /// Appends a box summarising `values` and returns the updated panel.
    pub fn with_box(mut self, label: impl Into<String>, values: &[f64]) -> Self {
        self.categories.push(Category {
            label: label.into(),
            data: CategoryData::Box(BoxStats::from_values(values)),
        });
        self
    }

    /// Appends a bar of height `value` and returns the updated panel.
    pub fn with_bar(mut self, label: impl Into<String>, value: f64) -> Self {
        self.categories.push(Category {
            label: label.into(),
            data: CategoryData::Bar(value),
        });
        self
    }

    /// Sets the value axis limits and returns the updated panel.
    pub fn with_limits(mut self, limits: AxisLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Panel title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Panel kind.
    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    /// Categories in axis order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category labels in axis order.
    pub fn labels(&self) -> Vec<&str> {
        self.categories.iter().map(Category::label).collect()
    }

    /// Configured axis limits.
    pub fn limits(&self) -> AxisLimits {
        self.limits
    }

    /// Resolves the value axis, fitting [`AxisLimits::Auto`] around the drawn data.
    pub fn value_range(&self) -> AxisRange {
        if let AxisLimits::Fixed(range) = self.limits {
            return range;
        }

        let with_outliers = matches!(
            self.kind,
            PanelKind::Distribution {
                show_outliers: true
            }
        );
        let mut extent: Option<(f64, f64)> = None;
        for category in &self.categories {
            let (low, high) = match &category.data {
                CategoryData::Box(Some(stats)) => stats.extent(with_outliers),
                CategoryData::Box(None) => continue,
                // Bars grow from zero.
                CategoryData::Bar(value) => (value.min(0.0), value.max(0.0)),
            };
            extent = Some(match extent {
                Some((min, max)) => (min.min(low), max.max(high)),
                None => (low, high),
            });
        }

        match extent {
            Some((low, high)) => AxisRange::padded(low, high),
            None => AxisRange::EMPTY,
        }
    }
}

/// A report page: a title and its panels, left to right.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartPage {
    title: String,
    panels: Vec<ChartPanel>,
}

impl ChartPage {
    /// Creates a page without panels.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            panels: Vec::new(),
        }
    }

    /// Appends a panel and returns the updated page.
    pub fn with_panel(mut self, panel: ChartPanel) -> Self {
        self.panels.push(panel);
        self
    }

    /// Page title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Panels, left to right.
    pub fn panels(&self) -> &[ChartPanel] {
        &self.panels
    }

    /// Returns the panel with the given title, if present.
    pub fn panel(&self, title: &str) -> Option<&ChartPanel> {
        self.panels.iter().find(|panel| panel.title == title)
    }
}

/// Turns planned pages into a finished document.
pub trait PageRenderer {
    /// Renders `pages` in order and returns the encoded document.
    ///
    /// `title` names the document and `source` describes where the data came
    /// from; renderers may print either.
    fn render_pages(
        &mut self,
        title: &str,
        source: &str,
        pages: &[ChartPage],
    ) -> Result<Vec<u8>, ReportError>;
}

/// Builds the page for one configuration group.
pub struct PagePlanner<'a> {
    map: &'a str,
    order: &'a AlgorithmOrder,
    config: &'a ReportConfig,
}

impl<'a> PagePlanner<'a> {
    /// Creates a planner for `map` laying out algorithms in `order`.
    pub fn new(map: &'a str, order: &'a AlgorithmOrder, config: &'a ReportConfig) -> Self {
        Self { map, order, config }
    }

    /// Title of the page for `configuration`.
    pub fn page_title(&self, configuration: u32) -> String {
        format!("{} {}", self.map, configuration)
    }

    /// Lays out the time, length, roughness and success rate panels for `group`.
    pub fn plan(&self, group: &ConfigurationGroup<'_>) -> ChartPage {
        let success = group.success();
        let timing = group.timing(|name| self.config.is_timing_excluded(name));

        let time = self.distribution(TIME_TITLE, false, &timing, Metric::Time, true);
        let length = self.distribution(LENGTH_TITLE, true, &success, Metric::Length, false);
        let roughness =
            self.distribution(ROUGHNESS_TITLE, true, &success, Metric::Roughness, false);

        let success_rate = self
            .order
            .names()
            .iter()
            .fold(ChartPanel::bars(SUCCESS_RATE_TITLE), |panel, name| {
                panel.with_bar(name.as_str(), group.success_rate(name))
            })
            .with_limits(AxisLimits::Fixed(SUCCESS_RATE_LIMITS));

        ChartPage::new(self.page_title(group.configuration()))
            .with_panel(time)
            .with_panel(length)
            .with_panel(roughness)
            .with_panel(success_rate)
    }

    fn distribution(
        &self,
        title: &str,
        show_outliers: bool,
        subset: &RunSubset<'_>,
        metric: Metric,
        drop_timing_exclusions: bool,
    ) -> ChartPanel {
        self.order
            .names()
            .iter()
            .filter(|name| !(drop_timing_exclusions && self.config.is_timing_excluded(name)))
            .fold(
                ChartPanel::distribution(title, show_outliers),
                |panel, name| panel.with_box(name.as_str(), &subset.values_for(name, metric)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AxisLimits, CategoryData, ChartPanel, PagePlanner, LENGTH_TITLE, ROUGHNESS_TITLE,
        SUCCESS_RATE_LIMITS, SUCCESS_RATE_TITLE, TIME_TITLE,
    };
    use crate::config::{AlgorithmOrder, ReportConfig};
    use crate::dataset::{Dataset, RunRecord};
    use crate::stats::{AxisRange, MAX_TICKS};

    fn bar_heights(panel: &ChartPanel) -> Vec<f64> {
        panel
            .categories()
            .iter()
            .map(|category| match category.data() {
                CategoryData::Bar(value) => *value,
                CategoryData::Box(_) => panic!("expected bars"),
            })
            .collect()
    }

    #[test]
    fn page_has_four_titled_panels() {
        let config = ReportConfig::default();
        let data = Dataset::new("open", vec![RunRecord::new(0, "rrt", 1.2, 5.0, 0.3)]);
        let page = PagePlanner::new("open", config.algorithms(), &config).plan(&data.group(0));

        assert_eq!(page.title(), "open 0");
        let titles: Vec<&str> = page.panels().iter().map(ChartPanel::title).collect();
        assert_eq!(
            titles,
            vec![TIME_TITLE, LENGTH_TITLE, ROUGHNESS_TITLE, SUCCESS_RATE_TITLE]
        );
        assert_eq!(
            page.panel(SUCCESS_RATE_TITLE).unwrap().limits(),
            AxisLimits::Fixed(SUCCESS_RATE_LIMITS)
        );
    }

    #[test]
    fn time_axis_omits_excluded_algorithms() {
        let config = ReportConfig::default();
        let data = Dataset::new(
            "open",
            vec![
                RunRecord::new(0, "rrt", 1.0, 5.0, 0.3),
                RunRecord::new(0, "rrt_star_first", 2.0, 4.0, 0.2),
                RunRecord::new(0, "rrt_star_last", 9.0, 3.5, 0.1),
            ],
        );
        let page = PagePlanner::new("open", config.algorithms(), &config).plan(&data.group(0));

        let time = page.panel(TIME_TITLE).unwrap();
        assert_eq!(
            time.labels(),
            vec!["nh", "rrt", "theta_star_rrt", "voronoi_rrt"]
        );
        let length = page.panel(LENGTH_TITLE).unwrap();
        assert!(length.labels().contains(&"rrt_star_last"));
    }

    #[test]
    fn success_bars_follow_display_order() {
        let config = ReportConfig::default();
        let data = Dataset::new(
            "open",
            vec![
                RunRecord::new(0, "rrt", 1.2, 5.0, 0.3),
                RunRecord::new(0, "rrt", 0.0, 0.0, 0.0),
                RunRecord::new(0, "nh", 0.3, 4.0, 0.1),
            ],
        );
        let page = PagePlanner::new("open", config.algorithms(), &config).plan(&data.group(0));

        let bars = page.panel(SUCCESS_RATE_TITLE).unwrap();
        assert_eq!(bar_heights(bars), vec![100.0, 50.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn failed_runs_give_empty_boxes_and_zero_bar() {
        let config = ReportConfig::default();
        let order = AlgorithmOrder::new(["rrt"]).unwrap();
        let data = Dataset::new(
            "open",
            vec![
                RunRecord::new(0, "rrt", 1.0, 0.0, 0.0),
                RunRecord::new(0, "rrt", 2.0, 0.0, 0.0),
            ],
        );
        let page = PagePlanner::new("open", &order, &config).plan(&data.group(0));

        for title in [TIME_TITLE, LENGTH_TITLE, ROUGHNESS_TITLE] {
            let panel = page.panel(title).unwrap();
            assert!(panel
                .categories()
                .iter()
                .all(|category| matches!(category.data(), CategoryData::Box(None))));
            assert_eq!(panel.value_range(), AxisRange::EMPTY);
        }
        assert_eq!(bar_heights(page.panel(SUCCESS_RATE_TITLE).unwrap()), vec![0.0]);
    }

    #[test]
    fn auto_range_ignores_hidden_outliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 100.0];
        let hidden = ChartPanel::distribution("t", false).with_box("a", &values);
        let shown = ChartPanel::distribution("t", true).with_box("a", &values);
        assert!(hidden.value_range().max < 10.0);
        assert!(shown.value_range().max > 100.0);
    }

    #[test]
    fn extreme_lengths_keep_a_bounded_axis() {
        let panel = ChartPanel::distribution(LENGTH_TITLE, true).with_box("rrt", &[0.0, 1.79e308]);
        let range = panel.value_range();
        assert!(range.min.is_finite() && range.max.is_finite());
        let ticks = range.ticks(6);
        assert!(!ticks.is_empty() && ticks.len() <= MAX_TICKS);
    }
}
