use std::fs;
use std::path::Path;

use planner_report::builder::GenpdfRenderer;
use planner_report::chart::{
    ChartPage, PagePlanner, PageRenderer, LENGTH_TITLE, SUCCESS_RATE_TITLE, TIME_TITLE,
};
use planner_report::elements::{sketch_panel, PlotFrame, BAR_COLOR, PALETTE};
use planner_report::fonts;
use planner_report::{Dataset, ReportConfig, ReportGenerator};
use sha2::{Digest, Sha256};

const SAMPLE_CSV: &str = "\
conf,algorithm,time,length,roughness
0,nh,0.12,14.2,0.31
0,nh,0.15,13.9,0.29
0,rrt,0.40,18.5,0.52
0,rrt,0.38,0,0
0,rrt_star_first,1.10,16.0,0.44
0,rrt_star_first,1.30,16.8,0.47
0,rrt_star_last,5.00,15.1,0.40
0,rrt_star_last,5.40,15.9,0.43
0,theta_star_rrt,0.70,14.8,0.35
0,theta_star_rrt,0.75,15.3,0.38
0,voronoi_rrt,0.90,17.2,0.47
0,voronoi_rrt,0.95,17.9,0.49
2,nh,0.20,21.0,0.33
2,rrt,0.55,25.4,0.61
2,voronoi_rrt,1.30,60.0,0.90
";

const SKIP_NOTE: &str = "fonts missing. Set PLANNER_REPORT_FONTS_DIR or install DejaVu Sans.";

fn write_sample(root: &Path, map: &str) {
    let dir = root.join("results/compare");
    fs::create_dir_all(&dir).expect("create input directory");
    fs::write(dir.join(format!("{}.csv", map)), SAMPLE_CSV).expect("write sample csv");
}

fn sample_pages() -> Vec<ChartPage> {
    let config = ReportConfig::default();
    let dataset = Dataset::from_reader("open", "sample.csv", SAMPLE_CSV.as_bytes())
        .expect("parse sample csv");
    let planner = PagePlanner::new("open", config.algorithms(), &config);
    dataset
        .groups()
        .expect("sample has rows")
        .map(|group| planner.plan(&group))
        .collect()
}

fn render_sample_pdf() -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let bytes = GenpdfRenderer::new()
        .render_pages("open", "sample.csv", &sample_pages())
        .expect("render sample pdf");

    Some(bytes)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            if let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            {
                let start_index = offset + start_pos + start.len();
                if let Some(end_pos) = data[start_index..]
                    .windows(end.len())
                    .position(|window| window == end)
                {
                    for byte in &mut data[start_index..start_index + end_pos] {
                        if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                            *byte = b'0';
                        }
                    }
                    offset = start_index + end_pos + end.len();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(
        &mut normalized,
        b"<xmp:MetadataDate>",
        b"</xmp:MetadataDate>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:DocumentID>",
        b"</xmpMM:DocumentID>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:InstanceID>",
        b"</xmpMM:InstanceID>",
    );
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_non_empty_output() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping renders_non_empty_output: {}", SKIP_NOTE);
        return;
    };
    assert!(bytes.starts_with(b"%PDF"), "output should be a PDF document");
    assert!(bytes.len() > 1024, "rendered PDF should contain chart content");
}

#[test]
fn rendering_is_deterministic() {
    let Some(bytes_a) = render_sample_pdf() else {
        eprintln!("Skipping rendering_is_deterministic: {}", SKIP_NOTE);
        return;
    };
    let Some(bytes_b) = render_sample_pdf() else {
        eprintln!("Skipping rendering_is_deterministic: {}", SKIP_NOTE);
        return;
    };

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");

    let hash_a = normalized_hash(&bytes_a);
    let hash_b = normalized_hash(&bytes_b);

    assert_eq!(
        hash_a, hash_b,
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn generator_writes_report_per_map() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping generator_writes_report_per_map: {}", SKIP_NOTE);
        return;
    }

    let root = tempfile::tempdir().expect("create scratch directory");
    write_sample(root.path(), "open");
    write_sample(root.path(), "offices");

    let config = ReportConfig::new()
        .with_root(root.path())
        .with_maps(["open", "map", "offices"]);
    let report = ReportGenerator::new(config)
        .run_all()
        .expect("configuration is valid");

    assert_eq!(report.failure_count(), 1);
    let written: Vec<&str> = report.successes().map(|summary| summary.map.as_str()).collect();
    assert_eq!(written, vec!["open", "offices"]);

    for summary in report.successes() {
        assert_eq!(summary.pages, 3);
        let bytes = fs::read(&summary.output_path).expect("report written");
        assert_eq!(bytes.len(), summary.bytes);
        assert!(bytes.starts_with(b"%PDF"));
    }
    assert!(!root.path().join("results/map.pdf").exists());
}

#[cfg(feature = "bookmarks")]
#[test]
fn bookmarks_match_page_titles() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping bookmarks_match_page_titles: {}", SKIP_NOTE);
        return;
    };
    let titles: Vec<String> = sample_pages()
        .iter()
        .map(|page| page.title().to_string())
        .collect();

    let marked = planner_report::bookmarks::apply_page_bookmarks(&bytes, &titles)
        .expect("embed bookmarks");
    let document = lopdf::Document::load_mem(&marked).expect("reparse pdf");
    assert_eq!(document.get_pages().len(), 3);

    let catalog = document.catalog().expect("catalog present");
    assert!(catalog.get(b"Outlines").is_ok());
}

#[test]
fn sample_pages_draw_filled_bars_and_boxes() {
    let pages = sample_pages();
    assert_eq!(pages.len(), 3);
    let frame = PlotFrame::new(12.0, 10.0, 90.0);

    let success = pages[0].panel(SUCCESS_RATE_TITLE).expect("success panel");
    let range = success.value_range();
    let sketch = sketch_panel(success, &frame);
    let tops: Vec<f64> = sketch
        .strokes_in(BAR_COLOR)
        .filter(|stroke| stroke.is_closed())
        .map(|stroke| stroke.vertical_extent().0)
        .collect();
    let expected: Vec<f64> = [100.0, 50.0, 100.0, 100.0, 100.0, 100.0]
        .iter()
        .map(|rate| frame.y(&range, *rate))
        .collect();
    assert_eq!(tops, expected);
    assert!(
        sketch.strokes_in(BAR_COLOR).filter(|stroke| !stroke.is_closed()).count() > 6 * 10,
        "bars should be hatched across their width"
    );

    let length = pages[0].panel(LENGTH_TITLE).expect("length panel");
    let sketch = sketch_panel(length, &frame);
    for (index, color) in PALETTE[..6].iter().enumerate() {
        let fill = sketch.strokes_in(*color).count();
        if index == 1 {
            // A single successful rrt run collapses the box to its median.
            assert_eq!(fill, 0);
        } else {
            assert!(fill > 1, "box {} should be filled", index);
        }
    }

    let time = pages[0].panel(TIME_TITLE).expect("time panel");
    assert_eq!(
        time.labels(),
        vec!["nh", "rrt", "theta_star_rrt", "voronoi_rrt"]
    );

    // Configuration 1 has no runs: empty slots and no bars.
    let gap = pages[1].panel(SUCCESS_RATE_TITLE).expect("success panel");
    let sketch = sketch_panel(gap, &frame);
    assert_eq!(sketch.strokes_in(BAR_COLOR).count(), 0);
}

#[cfg(feature = "bookmarks")]
#[test]
fn page_streams_contain_hatched_shapes() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping page_streams_contain_hatched_shapes: {}", SKIP_NOTE);
        return;
    };
    let document = lopdf::Document::load_mem(&bytes).expect("parse pdf");
    let pages = document.get_pages();
    let first = *pages.get(&1).expect("first page");
    let content = document.get_page_content(first).expect("page content");
    let operations = lopdf::content::Content::decode(&content)
        .expect("decode content")
        .operations;
    let strokes = operations
        .iter()
        .filter(|operation| operation.operator == "S")
        .count();
    assert!(strokes > 200, "expected hatched boxes and bars, found {} strokes", strokes);
}
