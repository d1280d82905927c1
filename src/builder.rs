//! Document construction for chart reports.
//!
//! [`GenpdfRenderer`] turns planned [`ChartPage`]s into PDF bytes. Every page
//! is decorated by a [`ReportPageDecorator`], which applies the report margins,
//! sets the page title above the charts and reserves a footer line naming the
//! source file and the page number.

use genpdf::elements::{Break, LinearLayout, PageBreak, Paragraph};
use genpdf::error::{Error, ErrorKind};
use genpdf::style::Style;
use genpdf::{self, Alignment, Element, Margins, Mm, PageDecorator, Position, Size};

use crate::chart::{ChartPage, PageRenderer};
use crate::elements::ChartPageElement;
use crate::error::ReportError;
use crate::fonts;

/// Report page width: the 20 inch figure the comparison charts were designed for.
pub const REPORT_PAGE_WIDTH_MM: f64 = 508.0;
/// Report page height: 7 inches.
pub const REPORT_PAGE_HEIGHT_MM: f64 = 177.8;

const VERTICAL_MARGIN_MM: f64 = 8.0;
/// Left and right margins as a share of the page width.
const HORIZONTAL_MARGIN_SHARE: f64 = 0.05;
const FOOTER_HEIGHT_MM: f64 = 5.0;

const PAGE_TITLE_FONT_SIZE: u8 = 20;
const FOOTER_FONT_SIZE: u8 = 7;

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Paper size of report pages.
pub fn report_paper_size() -> Size {
    Size::new(
        mm_from_f64(REPORT_PAGE_WIDTH_MM),
        mm_from_f64(REPORT_PAGE_HEIGHT_MM),
    )
}

/// Margins of report pages.
pub fn report_margins() -> Margins {
    let horizontal = mm_from_f64(REPORT_PAGE_WIDTH_MM * HORIZONTAL_MARGIN_SHARE);
    let vertical = mm_from_f64(VERTICAL_MARGIN_MM);
    Margins::trbl(vertical, horizontal, vertical, horizontal)
}

/// Page decorator that knows the title of every report page.
///
/// Pages are numbered from 1 in the order genpdf requests them; a page past
/// the end of `titles` gets no title.
pub struct ReportPageDecorator {
    page: usize,
    margins: Margins,
    titles: Vec<String>,
    source: String,
    footer_height: Mm,
}

impl ReportPageDecorator {
    /// Creates a decorator for a report of `titles.len()` pages read from `source`.
    pub fn new(margins: Margins, titles: Vec<String>, source: impl Into<String>) -> Self {
        Self {
            page: 0,
            margins,
            titles,
            source: source.into(),
            footer_height: mm_from_f64(FOOTER_HEIGHT_MM),
        }
    }

    /// Title of the 1-based `page`.
    pub fn title(&self, page: usize) -> &str {
        page.checked_sub(1)
            .and_then(|index| self.titles.get(index))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Footer text of the 1-based `page`.
    pub fn footer_text(&self, page: usize) -> String {
        format!(
            "{}    page {} of {}",
            self.source,
            page,
            self.titles.len()
        )
    }

    fn header(&self) -> LinearLayout {
        let mut layout = LinearLayout::vertical();
        let mut line = Paragraph::new(self.title(self.page).to_string());
        line.set_alignment(Alignment::Center);
        layout.push(line.styled(Style::new().with_font_size(PAGE_TITLE_FONT_SIZE)));
        layout.push(Break::new(0.5));
        layout
    }

    fn footer(&self) -> impl Element {
        let mut line = Paragraph::new(self.footer_text(self.page));
        line.set_alignment(Alignment::Right);
        line.styled(Style::new().with_font_size(FOOTER_FONT_SIZE))
    }
}

impl PageDecorator for ReportPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;
        area.add_margins(self.margins);

        let result = self.header().render(context, area.clone(), style)?;
        area.add_offset(Position::new(0, result.size.height));

        let available = area.size().height;
        if self.footer_height > available {
            return Err(Error::new(
                format!("No room for the footer of page {}", self.page),
                ErrorKind::InvalidData,
            ));
        }

        let mut footer_area = area.clone();
        footer_area.add_offset(Position::new(0, available - self.footer_height));
        let result = self.footer().render(context, footer_area, style)?;
        if result.has_more {
            return Err(Error::new(
                format!("Footer of page {} does not fit on one line", self.page),
                ErrorKind::PageSizeExceeded,
            ));
        }

        area.set_height(available - self.footer_height);
        Ok(area)
    }
}

/// Renders chart pages with `genpdf`, one PDF page per [`ChartPage`].
#[derive(Clone, Debug)]
pub struct GenpdfRenderer {
    paper_size: Size,
    margins: Margins,
    #[cfg(feature = "bookmarks")]
    bookmarks: bool,
}

impl Default for GenpdfRenderer {
    fn default() -> Self {
        Self {
            paper_size: report_paper_size(),
            margins: report_margins(),
            #[cfg(feature = "bookmarks")]
            bookmarks: false,
        }
    }
}

impl GenpdfRenderer {
    /// Creates a renderer using the report page geometry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the paper size.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = paper_size.into();
        self
    }

    /// Overrides the page margins.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = margins.into();
        self
    }

    /// Adds one outline entry per page after rendering.
    #[cfg(feature = "bookmarks")]
    pub fn with_bookmarks(mut self, bookmarks: bool) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    fn build_document(
        &self,
        title: &str,
        source: &str,
        titles: Vec<String>,
    ) -> Result<genpdf::Document, Error> {
        let font_family = fonts::default_font_family()?;
        let mut document = genpdf::Document::new(font_family);
        document.set_paper_size(self.paper_size);
        document.set_page_decorator(ReportPageDecorator::new(self.margins, titles, source));
        document.set_title(title);
        Ok(document)
    }
}

impl PageRenderer for GenpdfRenderer {
    fn render_pages(
        &mut self,
        title: &str,
        source: &str,
        pages: &[ChartPage],
    ) -> Result<Vec<u8>, ReportError> {
        let titles: Vec<String> = pages.iter().map(|page| page.title().to_string()).collect();
        #[cfg(feature = "bookmarks")]
        let outline = titles.clone();
        let mut document = self.build_document(title, source, titles)?;

        for (index, page) in pages.iter().enumerate() {
            if index > 0 {
                document.push(PageBreak::new());
            }
            document.push(ChartPageElement::new(page.clone()));
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes)?;

        #[cfg(feature = "bookmarks")]
        if self.bookmarks {
            bytes = crate::bookmarks::apply_page_bookmarks(&bytes, &outline)?;
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::{report_margins, report_paper_size, ReportPageDecorator, REPORT_PAGE_WIDTH_MM};

    fn decorator() -> ReportPageDecorator {
        let titles = vec!["open 0".to_string(), "open 1".to_string()];
        ReportPageDecorator::new(report_margins(), titles, "results/compare/open.csv")
    }

    #[test]
    fn pages_are_titled_in_order() {
        let decorator = decorator();
        assert_eq!(decorator.title(1), "open 0");
        assert_eq!(decorator.title(2), "open 1");
        assert_eq!(decorator.title(0), "");
        assert_eq!(decorator.title(3), "");
    }

    #[test]
    fn footer_counts_every_page() {
        assert_eq!(
            decorator().footer_text(2),
            "results/compare/open.csv    page 2 of 2"
        );
    }

    #[test]
    fn pages_use_the_wide_figure_format() {
        let size = report_paper_size();
        assert_eq!(f64::from(size.width), REPORT_PAGE_WIDTH_MM);
        assert!(size.width > size.height);
    }
}
