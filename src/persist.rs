//! Histogram text files and figure images written next to the input file.
//!
//! Text files are space separated with a header row and one row per cell
//! (x outer, y inner):
//!
//! ```text
//! x y z zlog
//! -40 -25 0 nan
//! -40 -24.9 3 0.47712125471966244
//! ```
//!
//! `x` and `y` are the lower edges of the cell, `z` the count and `zlog`
//! its base-10 logarithm (`nan` for empty cells, distributions only).

use std::path::{Path, PathBuf};

use crate::error::{DstError, Result};
use crate::histogram::{log10_or_nan, Histogram2D};
use crate::render::bitmap::{render_figure, FIGURE_SIZE};
use crate::render::figure::{Figure, RenderedHistogram};

/// What a histogram file holds; decides its name and its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramKind {
    Distribution,
    Acceptance,
}

// ---------------------------------------------------------------------------
// File naming
// ---------------------------------------------------------------------------

/// `<stem>_<col1>_<col2>.csv`, or `<stem>_acceptance_<col1>_<col2>.csv`.
pub fn histogram_path(original: &Path, columns: &(String, String), kind: HistogramKind) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let pair = format!("{}_{}", columns.0, columns.1).replace(' ', "_");
    let name = match kind {
        HistogramKind::Distribution => format!("{stem}_{pair}.csv"),
        HistogramKind::Acceptance => format!("{stem}_acceptance_{pair}.csv"),
    };
    original.with_file_name(name)
}

/// `<stem>.png` next to the original file.
pub fn figure_path(original: &Path) -> PathBuf {
    original.with_extension("png")
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else {
        v.to_string()
    }
}

/// Write one histogram. The `zlog` column is only written for distributions.
pub fn save_histogram(path: &Path, hist: &Histogram2D, kind: HistogramKind) -> Result<()> {
    let with_log = kind == HistogramKind::Distribution;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .from_path(path)?;

    if with_log {
        writer.write_record(["x", "y", "z", "zlog"])?;
    } else {
        writer.write_record(["x", "y", "z"])?;
    }

    for (ix, iy, count) in hist.cells() {
        let x = format_value(hist.x_edges()[ix]);
        let y = format_value(hist.y_edges()[iy]);
        let z = count.to_string();
        if with_log {
            writer.write_record([x, y, z, format_value(log10_or_nan(count))])?;
        } else {
            writer.write_record([x, y, z])?;
        }
    }
    writer.flush().map_err(|e| DstError::io(path, e))?;
    log::info!("Saved histogram data in {}", path.display());
    Ok(())
}

/// Save every histogram next to `original`, returning the written paths.
///
/// Panels repeating a column pair map to the same file, which is written once.
pub fn save_all(
    hists: &[RenderedHistogram],
    original: &Path,
    kind: HistogramKind,
) -> Result<Vec<PathBuf>> {
    let mut written: Vec<PathBuf> = Vec::with_capacity(hists.len());
    for h in hists {
        let path = histogram_path(original, &h.columns, kind);
        if written.contains(&path) {
            continue;
        }
        save_histogram(&path, &h.histogram, kind)?;
        written.push(path);
    }
    Ok(written)
}

pub fn save_all_distributions(hists: &[RenderedHistogram], original: &Path) -> Result<Vec<PathBuf>> {
    save_all(hists, original, HistogramKind::Distribution)
}

pub fn save_all_acceptances(hists: &[RenderedHistogram], original: &Path) -> Result<Vec<PathBuf>> {
    save_all(hists, original, HistogramKind::Acceptance)
}

/// Render `figure` and write it as PNG to `path`.
pub fn save_figure(figure: &Figure, path: &Path) -> Result<()> {
    let image = render_figure(figure, FIGURE_SIZE)?;
    image.save(path)?;
    log::info!("Saved figure in {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading back
// ---------------------------------------------------------------------------

/// Rebuild a histogram from a file written by [`save_histogram`].
///
/// Only lower edges are stored, so the last edge of each axis is
/// extrapolated from the spacing of the two before it. This needs at least
/// two bins per axis.
pub fn load_histogram(path: &Path) -> Result<Histogram2D> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .from_path(path)?;

    let mut xs: Vec<f64> = Vec::new();
    let mut ys: Vec<f64> = Vec::new();
    let mut counts: Vec<u32> = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let line = row + 2;
        let not_a = |value: &str, what: &str| DstError::Parse {
            line,
            message: format!("'{value}' is not {what}"),
        };
        let (fx, fy, fz) = (
            field(&record, 0, line)?,
            field(&record, 1, line)?,
            field(&record, 2, line)?,
        );
        let x: f64 = fx.parse().map_err(|_| not_a(fx, "a number"))?;
        let y: f64 = fy.parse().map_err(|_| not_a(fy, "a number"))?;
        let z: u32 = fz.parse().map_err(|_| not_a(fz, "a bin count"))?;

        if xs.last() != Some(&x) {
            xs.push(x);
        }
        if xs.len() == 1 {
            ys.push(y);
        }
        counts.push(z);
    }

    let x_edges = close_edges(xs, "x")?;
    let y_edges = close_edges(ys, "y")?;
    Histogram2D::from_parts(x_edges, y_edges, counts)
}

fn field(record: &csv::StringRecord, i: usize, line: usize) -> Result<&str> {
    record.get(i).ok_or_else(|| DstError::Parse {
        line,
        message: format!("missing field {i}"),
    })
}

fn close_edges(mut lower: Vec<f64>, axis: &str) -> Result<Vec<f64>> {
    let n = lower.len();
    if n < 2 {
        return Err(DstError::InvalidBins(format!(
            "cannot recover the {axis} bin width from {n} bin(s)"
        )));
    }
    let step = lower[n - 1] - lower[n - 2];
    lower.push(lower[n - 1] + step);
    Ok(lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{histogram2d, Bins};

    fn columns() -> (String, String) {
        ("x(mm)".to_string(), "x'(mrad)".to_string())
    }

    #[test]
    fn file_names_follow_input_stem() {
        let original = Path::new("/data/part_rfq.txt");
        assert_eq!(
            histogram_path(original, &columns(), HistogramKind::Distribution),
            PathBuf::from("/data/part_rfq_x(mm)_x'(mrad).csv")
        );
        assert_eq!(
            histogram_path(original, &columns(), HistogramKind::Acceptance),
            PathBuf::from("/data/part_rfq_acceptance_x(mm)_x'(mrad).csv")
        );
        let spaced = ("Phase deg".to_string(), "W".to_string());
        assert_eq!(
            histogram_path(original, &spaced, HistogramKind::Distribution),
            PathBuf::from("/data/part_rfq_Phase_deg_W.csv")
        );
        assert_eq!(figure_path(original), PathBuf::from("/data/part_rfq.png"));
    }

    #[test]
    fn distribution_file_has_log_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist.csv");
        let hist = Histogram2D::from_parts(vec![0.0, 1.0, 2.0], vec![0.0, 0.5, 1.0], vec![0, 10, 1, 0])
            .unwrap();
        save_histogram(&path, &hist, HistogramKind::Distribution).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "x y z zlog");
        assert_eq!(lines[1], "0 0 0 nan");
        assert_eq!(lines[2], "0 0.5 10 1");
        assert_eq!(lines[3], "1 0 1 0");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn acceptance_file_has_no_log_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acc.csv");
        let hist = Histogram2D::from_parts(vec![0.0, 1.0], vec![0.0, 1.0], vec![1]).unwrap();
        save_histogram(&path, &hist, HistogramKind::Acceptance).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["x y z", "0 0 1"]);
    }

    #[test]
    fn saved_histogram_reloads_with_same_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.csv");
        let xs: Vec<f64> = (0..200).map(|i| (i % 40) as f64 * 2.0 - 40.0).collect();
        let ys: Vec<f64> = (0..200).map(|i| (i % 25) as f64 * 2.0 - 25.0).collect();
        let hist =
            histogram2d(&xs, &ys, &Bins::PerAxis(8, 5), Some(((-40.0, 40.0), (-25.0, 25.0))))
                .unwrap();
        save_histogram(&path, &hist, HistogramKind::Distribution).unwrap();

        let back = load_histogram(&path).unwrap();
        assert_eq!(back.bins_x(), 8);
        assert_eq!(back.bins_y(), 5);
        assert_eq!(back.x_edges().len(), 9);
        assert_eq!(back.y_edges().len(), 6);
        assert_eq!(back.counts(), hist.counts());
        assert!((back.x_edges()[8] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn save_all_writes_one_file_per_panel() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("out.txt");
        let hist = Histogram2D::from_parts(vec![0.0, 1.0], vec![0.0, 1.0], vec![2]).unwrap();
        let hists = vec![
            RenderedHistogram {
                columns: columns(),
                histogram: hist.clone(),
            },
            RenderedHistogram {
                columns: ("x(mm)".into(), "y(mm)".into()),
                histogram: hist,
            },
        ];
        let written = save_all_acceptances(&hists, &original).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|p| p.exists()));
        assert!(dir.path().join("out_acceptance_x(mm)_y(mm).csv").exists());
    }

    #[test]
    fn non_integer_counts_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["-3", "2.5"] {
            let path = dir.path().join("edited.csv");
            let text = format!("x y z\n0 0 1\n0 1 {bad}\n1 0 0\n1 1 4\n");
            std::fs::write(&path, text).unwrap();
            match load_histogram(&path) {
                Err(DstError::Parse { line, message }) => {
                    assert_eq!(line, 3);
                    assert!(message.contains(bad));
                }
                other => panic!("expected a parse error, got {other:?}"),
            }
        }
    }
}
