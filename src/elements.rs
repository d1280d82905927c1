//! `genpdf` elements that draw planned chart pages.
//!
//! [`ChartPageElement`] splits the available page area into one column per
//! [`ChartPanel`]. Each panel is laid out as a square [`PlotFrame`] below its
//! title, with value ticks on the left and category labels set vertically
//! underneath.
//!
//! `genpdf` strokes every line with the default width, so the line work of a
//! panel is first collected into a [`Sketch`]: boxes and bars become a closed
//! outline plus vertical hatching spaced tighter than the stroke width, which
//! prints as a solid fill.

use genpdf::error::{Error, ErrorKind};
use genpdf::style::{Color, Style};
use genpdf::{render, Element, Mm, Position, RenderResult};

use crate::chart::{CategoryData, ChartPage, ChartPanel, PanelKind};
use crate::stats::{format_tick, AxisRange, BoxStats};

const PANEL_TITLE_FONT_SIZE: u8 = 15;
const TICK_FONT_SIZE: u8 = 8;
const CATEGORY_FONT_SIZE: u8 = 7;

const PANEL_PADDING_MM: f64 = 4.0;
const TITLE_GAP_MM: f64 = 2.0;
const VALUE_GUTTER_MM: f64 = 12.0;
const TICK_LENGTH_MM: f64 = 1.2;
const LABEL_GAP_MM: f64 = 1.5;
const MIN_PLOT_SIDE_MM: f64 = 20.0;
const VALUE_TICK_TARGET: usize = 6;

/// Longest category label printed, in glyphs.
pub const MAX_LABEL_GLYPHS: usize = 16;

/// Share of a category slot covered by a box or bar.
pub const SLOT_FILL: f64 = 0.8;

/// Distance between hatching strokes; below the default 1 pt stroke width.
pub const HATCH_SPACING_MM: f64 = 0.3;

const OUTLIER_RADIUS_MM: f64 = 0.7;

const AXIS_COLOR: Color = Color::Rgb(38, 38, 38);
const BOX_EDGE_COLOR: Color = Color::Rgb(61, 61, 61);

/// Fill of the success-rate bars.
pub const BAR_COLOR: Color = Color::Rgb(31, 119, 180);

/// Category colours, cycled by slot index.
pub const PALETTE: [Color; 10] = [
    Color::Rgb(76, 114, 176),
    Color::Rgb(221, 132, 82),
    Color::Rgb(85, 168, 104),
    Color::Rgb(196, 78, 82),
    Color::Rgb(129, 114, 179),
    Color::Rgb(147, 120, 96),
    Color::Rgb(218, 139, 195),
    Color::Rgb(140, 140, 140),
    Color::Rgb(204, 185, 116),
    Color::Rgb(100, 181, 205),
];

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn position(x: f64, y: f64) -> Position {
    Position::new(mm_from_f64(x), mm_from_f64(y))
}

/// A polyline in millimetres, measured from the top left of the panel column.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    points: Vec<(f64, f64)>,
    color: Color,
}

impl Stroke {
    /// Vertices in drawing order.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Outline colour.
    pub fn color(&self) -> Color {
        self.color
    }

    /// True when the polyline returns to its first vertex.
    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points.first() == self.points.last()
    }

    /// Smallest and largest `y` of the polyline.
    pub fn vertical_extent(&self) -> (f64, f64) {
        self.points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), (_, y)| {
                (low.min(*y), high.max(*y))
            })
    }
}

/// The line work of one panel, in drawing order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sketch {
    strokes: Vec<Stroke>,
}

impl Sketch {
    /// Every stroke, first drawn first.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Strokes drawn in `color`.
    pub fn strokes_in(&self, color: Color) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter().filter(move |stroke| stroke.color == color)
    }

    fn line(&mut self, color: Color, points: Vec<(f64, f64)>) {
        self.strokes.push(Stroke { points, color });
    }

    fn outline(&mut self, color: Color, left: f64, top: f64, right: f64, bottom: f64) {
        self.line(
            color,
            vec![
                (left, top),
                (right, top),
                (right, bottom),
                (left, bottom),
                (left, top),
            ],
        );
    }

    /// Covers the rectangle with vertical strokes [`HATCH_SPACING_MM`] apart.
    fn fill(&mut self, color: Color, left: f64, top: f64, right: f64, bottom: f64) {
        let width = right - left;
        if width <= 0.0 || bottom - top <= 0.0 {
            return;
        }
        let count = (width / HATCH_SPACING_MM).ceil() as usize;
        for index in 0..=count {
            let x = (left + HATCH_SPACING_MM * index as f64).min(right);
            self.line(color, vec![(x, top), (x, bottom)]);
        }
    }

    fn draw(&self, area: &render::Area<'_>) {
        for stroke in &self.strokes {
            area.draw_line(
                stroke.points.iter().map(|(x, y)| position(*x, *y)).collect(),
                Style::new().with_color(stroke.color),
            );
        }
    }
}

/// Draws one report page: all panels of a [`ChartPage`] side by side.
pub struct ChartPageElement {
    page: ChartPage,
}

impl ChartPageElement {
    /// Wraps a planned page.
    pub fn new(page: ChartPage) -> Self {
        Self { page }
    }

    /// The page being drawn.
    pub fn page(&self) -> &ChartPage {
        &self.page
    }

    /// Longest category label on the page, capped at [`MAX_LABEL_GLYPHS`].
    fn label_glyphs(&self) -> usize {
        self.page
            .panels()
            .iter()
            .flat_map(|panel| panel.categories())
            .map(|category| category.label().chars().count())
            .max()
            .unwrap_or(0)
            .min(MAX_LABEL_GLYPHS)
    }
}

impl Element for ChartPageElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let panels = self.page.panels();
        if panels.is_empty() {
            return Ok(result);
        }

        let label_style = style.with_font_size(CATEGORY_FONT_SIZE);
        let label_height =
            mm_to_f64(label_style.line_height(&context.font_cache)) * self.label_glyphs() as f64;

        let weights = vec![1; panels.len()];
        for (panel, mut column) in panels.iter().zip(area.split_horizontally(&weights)) {
            column.add_margins(genpdf::Margins::trbl(
                0,
                mm_from_f64(PANEL_PADDING_MM),
                0,
                mm_from_f64(PANEL_PADDING_MM),
            ));
            PanelPainter::new(panel, label_height).paint(context, &column, style)?;
        }

        result.size = area.size();
        Ok(result)
    }
}

/// Geometry of the square plot area inside one panel column, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotFrame {
    left: f64,
    top: f64,
    side: f64,
}

impl PlotFrame {
    /// A square with its top left corner at `(left, top)`.
    pub fn new(left: f64, top: f64, side: f64) -> Self {
        Self { left, top, side }
    }

    /// Largest square that fits `width` × `height` after the value gutter,
    /// centred horizontally; `None` when it would be unreadably small.
    pub fn fit(width: f64, height: f64, top: f64) -> Option<Self> {
        let width = width - VALUE_GUTTER_MM;
        let side = width.min(height);
        (side >= MIN_PLOT_SIDE_MM).then(|| Self {
            left: VALUE_GUTTER_MM + (width - side) / 2.0,
            top,
            side,
        })
    }

    /// Left edge.
    pub fn left(&self) -> f64 {
        self.left
    }

    /// Top edge.
    pub fn top(&self) -> f64 {
        self.top
    }

    /// Edge length.
    pub fn side(&self) -> f64 {
        self.side
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.side
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.side
    }

    /// Vertical position of `value`, clamped onto the frame.
    pub fn y(&self, range: &AxisRange, value: f64) -> f64 {
        self.bottom() - range.normalize(value) * self.side
    }

    /// Width of each of `slots` equal category slots.
    pub fn slot_width(&self, slots: usize) -> f64 {
        self.side / slots.max(1) as f64
    }

    /// Horizontal centre of slot `index`.
    pub fn slot_center(&self, slots: usize, index: usize) -> f64 {
        self.left + self.slot_width(slots) * (index as f64 + 0.5)
    }
}

/// Tick values of `range` paired with their printed labels.
pub fn value_ticks(range: &AxisRange) -> Vec<(f64, String)> {
    let step = range.tick_step(VALUE_TICK_TARGET).unwrap_or(1.0);
    range
        .ticks(VALUE_TICK_TARGET)
        .into_iter()
        .map(|value| (value, format_tick(value, step)))
        .collect()
}

/// The lines of a vertically set category label, one glyph each.
pub fn label_lines(label: &str) -> Vec<String> {
    label
        .chars()
        .take(MAX_LABEL_GLYPHS)
        .map(String::from)
        .collect()
}

/// Collects the line work of `panel` drawn into `frame`.
///
/// Boxes and bars come first, then value and category ticks, then the frame
/// so that shapes clipped at the limits do not cover it.
pub fn sketch_panel(panel: &ChartPanel, frame: &PlotFrame) -> Sketch {
    let mut sketch = Sketch::default();
    let range = panel.value_range();
    let show_outliers = matches!(
        panel.kind(),
        PanelKind::Distribution {
            show_outliers: true
        }
    );

    let slots = panel.categories().len();
    let half_width = frame.slot_width(slots) * SLOT_FILL / 2.0;
    for (index, category) in panel.categories().iter().enumerate() {
        let center = frame.slot_center(slots, index);
        match category.data() {
            CategoryData::Box(Some(stats)) => {
                let color = PALETTE[index % PALETTE.len()];
                let shape = BoxShape {
                    center,
                    half_width,
                    color,
                    show_outliers,
                };
                shape.sketch(&mut sketch, frame, &range, stats);
            }
            CategoryData::Box(None) => {}
            CategoryData::Bar(value) => {
                sketch_bar(&mut sketch, frame, &range, center, half_width, *value);
            }
        }
        sketch.line(
            AXIS_COLOR,
            vec![
                (center, frame.bottom()),
                (center, frame.bottom() + TICK_LENGTH_MM),
            ],
        );
    }

    for (value, _) in value_ticks(&range) {
        let y = frame.y(&range, value);
        sketch.line(AXIS_COLOR, vec![(frame.left - TICK_LENGTH_MM, y), (frame.left, y)]);
    }

    sketch.outline(AXIS_COLOR, frame.left, frame.top, frame.right(), frame.bottom());
    sketch
}

struct BoxShape {
    center: f64,
    half_width: f64,
    color: Color,
    show_outliers: bool,
}

impl BoxShape {
    fn sketch(&self, sketch: &mut Sketch, frame: &PlotFrame, range: &AxisRange, stats: &BoxStats) {
        let (left, right) = (self.center - self.half_width, self.center + self.half_width);
        let top = frame.y(range, stats.q3);
        let bottom = frame.y(range, stats.q1);

        sketch.fill(self.color, left, top, right, bottom);
        sketch.outline(BOX_EDGE_COLOR, left, top, right, bottom);

        let median = frame.y(range, stats.median);
        sketch.line(BOX_EDGE_COLOR, vec![(left, median), (right, median)]);

        let cap = self.half_width / 2.0;
        for (from, to) in [(bottom, stats.whisker_low), (top, stats.whisker_high)] {
            let to = frame.y(range, to);
            sketch.line(BOX_EDGE_COLOR, vec![(self.center, from), (self.center, to)]);
            sketch.line(
                BOX_EDGE_COLOR,
                vec![(self.center - cap, to), (self.center + cap, to)],
            );
        }

        if !self.show_outliers {
            return;
        }
        let r = OUTLIER_RADIUS_MM;
        for value in &stats.outliers {
            if *value < range.min || *value > range.max {
                continue;
            }
            let (x, y) = (self.center, frame.y(range, *value));
            sketch.line(
                BOX_EDGE_COLOR,
                vec![(x, y - r), (x + r, y), (x, y + r), (x - r, y), (x, y - r)],
            );
        }
    }
}

fn sketch_bar(
    sketch: &mut Sketch,
    frame: &PlotFrame,
    range: &AxisRange,
    center: f64,
    half_width: f64,
    value: f64,
) {
    let base = frame.y(range, 0.0);
    let end = frame.y(range, value);
    if (base - end).abs() < f64::EPSILON {
        return;
    }
    let (top, bottom) = (base.min(end), base.max(end));
    let (left, right) = (center - half_width, center + half_width);
    sketch.fill(BAR_COLOR, left, top, right, bottom);
    sketch.outline(BAR_COLOR, left, top, right, bottom);
}

struct PanelPainter<'p> {
    panel: &'p ChartPanel,
    label_height: f64,
}

impl<'p> PanelPainter<'p> {
    fn new(panel: &'p ChartPanel, label_height: f64) -> Self {
        Self {
            panel,
            label_height,
        }
    }

    fn paint(
        &self,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        style: Style,
    ) -> Result<(), Error> {
        let title_style = style.with_font_size(PANEL_TITLE_FONT_SIZE);
        let title_height = mm_to_f64(title_style.line_height(&context.font_cache));
        let frame = self.frame(area, title_height)?;

        let title = self.panel.title();
        let title_width = mm_to_f64(title_style.str_width(&context.font_cache, title));
        let title_x = (frame.left + (frame.side - title_width) / 2.0).max(0.0);
        area.print_str(&context.font_cache, position(title_x, 0.0), title_style, title)?;

        sketch_panel(self.panel, &frame).draw(area);

        let range = self.panel.value_range();
        self.paint_value_labels(context, area, style, &frame, &range)?;

        let slots = self.panel.categories().len();
        for (index, category) in self.panel.categories().iter().enumerate() {
            let center = frame.slot_center(slots, index);
            self.paint_category_label(context, area, style, &frame, center, category.label())?;
        }
        Ok(())
    }

    /// Places the largest square that fits below the title and above the labels.
    fn frame(&self, area: &render::Area<'_>, title_height: f64) -> Result<PlotFrame, Error> {
        let size = area.size();
        let height = mm_to_f64(size.height)
            - title_height
            - TITLE_GAP_MM
            - TICK_LENGTH_MM
            - LABEL_GAP_MM
            - self.label_height;
        PlotFrame::fit(mm_to_f64(size.width), height, title_height + TITLE_GAP_MM).ok_or_else(
            || {
                Error::new(
                    format!(
                        "Chart panel '{}' does not fit into the page ({:.1} mm high)",
                        self.panel.title(),
                        height
                    ),
                    ErrorKind::PageSizeExceeded,
                )
            },
        )
    }

    fn paint_value_labels(
        &self,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        style: Style,
        frame: &PlotFrame,
        range: &AxisRange,
    ) -> Result<(), Error> {
        let tick_style = style.with_font_size(TICK_FONT_SIZE);
        let line_height = mm_to_f64(tick_style.line_height(&context.font_cache));

        for (value, text) in value_ticks(range) {
            let y = frame.y(range, value);
            let width = mm_to_f64(tick_style.str_width(&context.font_cache, &text));
            let x = (frame.left - TICK_LENGTH_MM - LABEL_GAP_MM - width).max(0.0);
            area.print_str(
                &context.font_cache,
                position(x, (y - line_height / 2.0).max(0.0)),
                tick_style,
                &text,
            )?;
        }
        Ok(())
    }

    /// Sets `label` one glyph per line below the slot centred at `center`.
    fn paint_category_label(
        &self,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        style: Style,
        frame: &PlotFrame,
        center: f64,
        label: &str,
    ) -> Result<(), Error> {
        let label_style = style.with_font_size(CATEGORY_FONT_SIZE);
        let line_height = mm_to_f64(label_style.line_height(&context.font_cache));
        let top = frame.bottom() + TICK_LENGTH_MM + LABEL_GAP_MM;

        for (line, glyph) in label_lines(label).iter().enumerate() {
            let width = mm_to_f64(label_style.str_width(&context.font_cache, glyph));
            let printed = area.print_str(
                &context.font_cache,
                position(center - width / 2.0, top + line_height * line as f64),
                label_style,
                glyph,
            )?;
            if !printed {
                log::debug!("Category label '{}' truncated after {} glyphs", label, line);
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        label_lines, sketch_panel, value_ticks, PlotFrame, BAR_COLOR, HATCH_SPACING_MM,
        MAX_LABEL_GLYPHS, PALETTE, SLOT_FILL,
    };
    use crate::chart::{AxisLimits, ChartPanel, SUCCESS_RATE_LIMITS};
    use crate::stats::AxisRange;

    fn frame() -> PlotFrame {
        PlotFrame::new(12.0, 8.0, 120.0)
    }

    #[test]
    fn frame_maps_values_bottom_up() {
        let frame = PlotFrame::new(10.0, 5.0, 100.0);
        let range = AxisRange::new(0.0, 120.0);
        assert_eq!(frame.y(&range, 0.0), 105.0);
        assert_eq!(frame.y(&range, 120.0), 5.0);
        assert_eq!(frame.y(&range, 60.0), 55.0);
        // Values beyond the range are clamped onto the frame.
        assert_eq!(frame.y(&range, 500.0), 5.0);
    }

    #[test]
    fn slots_split_the_frame_evenly() {
        let frame = PlotFrame::new(0.0, 0.0, 60.0);
        assert_eq!(frame.slot_width(6), 10.0);
        assert_eq!(frame.slot_center(6, 0), 5.0);
        assert_eq!(frame.slot_center(6, 5), 55.0);
        assert_eq!(frame.slot_width(0), 60.0);
    }

    #[test]
    fn frame_fits_the_smaller_side() {
        let frame = PlotFrame::fit(112.0, 80.0, 9.0).unwrap();
        assert_eq!(frame.side(), 80.0);
        assert_eq!(frame.left(), 12.0 + 10.0);
        assert_eq!(frame.top(), 9.0);
        assert!(PlotFrame::fit(25.0, 80.0, 0.0).is_none());
    }

    #[test]
    fn bars_are_filled_rectangles() {
        let panel = ChartPanel::bars("Success rate (%)")
            .with_bar("nh", 100.0)
            .with_bar("rrt", 50.0)
            .with_bar("prm", 0.0)
            .with_limits(AxisLimits::Fixed(SUCCESS_RATE_LIMITS));
        let frame = frame();
        let sketch = sketch_panel(&panel, &frame);
        let range = panel.value_range();

        let outlines: Vec<_> = sketch.strokes_in(BAR_COLOR).filter(|s| s.is_closed()).collect();
        assert_eq!(outlines.len(), 2, "the zero bar draws nothing");
        assert_eq!(outlines[0].vertical_extent(), (frame.y(&range, 100.0), frame.bottom()));
        assert_eq!(outlines[1].vertical_extent(), (frame.y(&range, 50.0), frame.bottom()));

        let bar_width = frame.slot_width(3) * SLOT_FILL;
        let hatches = sketch.strokes_in(BAR_COLOR).filter(|s| !s.is_closed()).count();
        let per_bar = (bar_width / HATCH_SPACING_MM).ceil() as usize + 1;
        assert_eq!(hatches, per_bar * 2);

        let xs: Vec<f64> = outlines[0].points().iter().map(|(x, _)| *x).collect();
        let width = xs.iter().cloned().fold(f64::MIN, f64::max)
            - xs.iter().cloned().fold(f64::MAX, f64::min);
        assert!((width - bar_width).abs() < 1e-9);
    }

    #[test]
    fn boxes_are_filled_between_quartiles() {
        let panel = ChartPanel::distribution("Length", true)
            .with_box("nh", &[1.0, 2.0, 3.0, 4.0, 5.0])
            .with_box("rrt", &[]);
        let frame = frame();
        let sketch = sketch_panel(&panel, &frame);
        let range = panel.value_range();

        let fill: Vec<_> = sketch.strokes_in(PALETTE[0]).collect();
        assert!(fill.len() > 1);
        for stroke in &fill {
            assert_eq!(stroke.vertical_extent(), (frame.y(&range, 4.0), frame.y(&range, 2.0)));
        }
        assert_eq!(sketch.strokes_in(PALETTE[1]).count(), 0, "no box for an empty slot");
    }

    #[test]
    fn success_axis_ticks_run_to_120() {
        let labels: Vec<String> = value_ticks(&SUCCESS_RATE_LIMITS)
            .into_iter()
            .map(|(_, label)| label)
            .collect();
        assert_eq!(labels, vec!["0", "20", "40", "60", "80", "100", "120"]);
    }

    #[test]
    fn labels_are_set_one_glyph_per_line() {
        assert_eq!(label_lines("nh"), vec!["n", "h"]);
        let long = "x".repeat(40);
        assert_eq!(label_lines(&long).len(), MAX_LABEL_GLYPHS);
    }
}
