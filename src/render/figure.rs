use crate::color::{acceptance_colors, Normalizer, Rgb8};
use crate::data::model::Table;
use crate::error::{DstError, Result};
use crate::histogram::{histogram2d, Bins, Histogram2D, Interval};
use crate::layout::PlotSpec;

/// Number of panels the acceptance of a single phase-space pair is fanned
/// across.
pub const FANNED_PANELS: usize = 4;

// ---------------------------------------------------------------------------
// Figure model
// ---------------------------------------------------------------------------

/// A rendered histogram: one optional colour per cell, `None` = blank.
#[derive(Debug, Clone)]
pub struct Layer {
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    /// Row-major over x, same indexing as [`Histogram2D::counts`].
    pub cells: Vec<Option<Rgb8>>,
}

impl Layer {
    pub fn bins_x(&self) -> usize {
        self.x_edges.len() - 1
    }

    pub fn bins_y(&self) -> usize {
        self.y_edges.len() - 1
    }

    pub fn cell(&self, ix: usize, iy: usize) -> Option<Rgb8> {
        self.cells[ix * self.bins_y() + iy]
    }

    /// `(x0, x1)` and `(y0, y1)` covered by the layer.
    pub fn extent(&self) -> (Interval, Interval) {
        (
            (self.x_edges[0], self.x_edges[self.bins_x()]),
            (self.y_edges[0], self.y_edges[self.bins_y()]),
        )
    }
}

/// One subplot.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    pub title: String,
    pub xlim: Option<Interval>,
    pub ylim: Option<Interval>,
    pub grid: bool,
    /// Drawn in order, later layers on top.
    pub layers: Vec<Layer>,
}

impl Panel {
    /// Visible window: the display limits when set, otherwise the union of
    /// the layer extents.
    pub fn view(&self) -> (Interval, Interval) {
        let ((mut x0, mut x1), (mut y0, mut y1)) = self
            .layers
            .iter()
            .map(Layer::extent)
            .reduce(|(ax, ay), (bx, by)| {
                (
                    (ax.0.min(bx.0), ax.1.max(bx.1)),
                    (ay.0.min(by.0), ay.1.max(by.1)),
                )
            })
            .unwrap_or(((0.0, 1.0), (0.0, 1.0)));
        if let Some((lo, hi)) = self.xlim {
            (x0, x1) = (lo, hi);
        }
        if let Some((lo, hi)) = self.ylim {
            (y0, y1) = (lo, hi);
        }
        ((x0, x1), (y0, y1))
    }
}

/// Panels laid out row by row on a grid.
#[derive(Debug, Clone, Default)]
pub struct Figure {
    pub panels: Vec<Panel>,
}

impl Figure {
    /// `(rows, cols)`: as square as possible, four panels give 2×2.
    pub fn grid_shape(&self) -> (usize, usize) {
        let n = self.panels.len().max(1);
        let cols = (n as f64).sqrt().ceil() as usize;
        let rows = n.div_ceil(cols);
        (rows, cols)
    }
}

/// A histogram together with the column pair it was computed on.
#[derive(Debug, Clone)]
pub struct RenderedHistogram {
    pub columns: (String, String),
    pub histogram: Histogram2D,
}

// ---------------------------------------------------------------------------
// Binning a panel
// ---------------------------------------------------------------------------

fn bin_spec(table: &Table, spec: &PlotSpec, bins: usize) -> Result<Histogram2D> {
    let xs = table.column(&spec.columns.0)?;
    let ys = table.column(&spec.columns.1)?;
    histogram2d(xs, ys, &Bins::Count(bins), spec.binning_range()?)
}

fn empty_panel(spec: &PlotSpec) -> Panel {
    Panel {
        title: spec.title(),
        xlim: spec.xlim,
        ylim: spec.ylim,
        grid: spec.grid,
        layers: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Distribution: log-intensity heatmap
// ---------------------------------------------------------------------------

pub struct DistributionRenderer {
    pub bins: usize,
}

impl DistributionRenderer {
    pub fn new(bins: usize) -> Self {
        Self { bins }
    }

    /// Bin the spec's columns and colour the counts.
    pub fn render(&self, table: &Table, spec: &PlotSpec) -> Result<(Layer, Histogram2D)> {
        let hist = bin_spec(table, spec, self.bins)?;
        let cmin = spec.cmin.unwrap_or(f64::NEG_INFINITY);
        let shown = |c: u32| f64::from(c) >= cmin;

        let normalizer = Normalizer::autoscale(
            spec.norm,
            hist.counts()
                .iter()
                .copied()
                .filter(|&c| shown(c))
                .map(f64::from),
        );

        let cells = hist
            .counts()
            .iter()
            .map(|&c| {
                if !shown(c) {
                    return None;
                }
                let t = normalizer?.scale(f64::from(c))?;
                Some(spec.colormap.sample(t))
            })
            .collect();

        let layer = Layer {
            x_edges: hist.x_edges().to_vec(),
            y_edges: hist.y_edges().to_vec(),
            cells,
        };
        Ok((layer, hist))
    }

    /// Draw `spec` onto `panel`, on top of what is already there.
    pub fn render_onto(
        &self,
        panel: &mut Panel,
        table: &Table,
        spec: &PlotSpec,
    ) -> Result<RenderedHistogram> {
        let (layer, histogram) = self.render(table, spec)?;
        panel.layers.push(layer);
        log::debug!(
            "{}: {} of {} particles inside the binning range",
            spec.title(),
            histogram.total(),
            table.len()
        );
        Ok(RenderedHistogram {
            columns: spec.columns.clone(),
            histogram,
        })
    }
}

// ---------------------------------------------------------------------------
// Acceptance: binary mask
// ---------------------------------------------------------------------------

pub struct AcceptanceRenderer {
    pub bins: usize,
    pub inverted: bool,
}

impl AcceptanceRenderer {
    pub fn new(bins: usize, inverted: bool) -> Self {
        Self { bins, inverted }
    }

    /// Bin the spec's columns and return the accepted/rejected mask.
    pub fn render(&self, table: &Table, spec: &PlotSpec) -> Result<(Layer, Histogram2D)> {
        let mask = bin_spec(table, spec, self.bins)?.acceptance_mask();
        let [rejected, accepted] = acceptance_colors(self.inverted);
        let cells = mask
            .counts()
            .iter()
            .map(|&m| Some(if m > 0 { accepted } else { rejected }))
            .collect();
        let layer = Layer {
            x_edges: mask.x_edges().to_vec(),
            y_edges: mask.y_edges().to_vec(),
            cells,
        };
        Ok((layer, mask))
    }
}

// ---------------------------------------------------------------------------
// Multi-panel entry points
// ---------------------------------------------------------------------------

/// One distribution panel per spec, in order.
pub fn plot_all_distributions(
    table: &Table,
    specs: &[PlotSpec],
    bins: usize,
) -> Result<(Figure, Vec<RenderedHistogram>)> {
    let renderer = DistributionRenderer::new(bins);
    let mut figure = Figure::default();
    let mut hists = Vec::with_capacity(specs.len());
    for spec in specs {
        let mut panel = empty_panel(spec);
        hists.push(renderer.render_onto(&mut panel, table, spec)?);
        figure.panels.push(panel);
    }
    Ok((figure, hists))
}

/// One acceptance panel per spec, in order.
pub fn plot_all_acceptances(
    table: &Table,
    specs: &[PlotSpec],
    bins: usize,
    inverted: bool,
) -> Result<(Figure, Vec<RenderedHistogram>)> {
    let renderer = AcceptanceRenderer::new(bins, inverted);
    let mut figure = Figure::default();
    let mut hists = Vec::with_capacity(specs.len());
    for spec in specs {
        let (layer, histogram) = renderer.render(table, spec)?;
        let mut panel = empty_panel(spec);
        panel.layers.push(layer);
        figure.panels.push(panel);
        hists.push(RenderedHistogram {
            columns: spec.columns.clone(),
            histogram,
        });
    }
    Ok((figure, hists))
}

/// The first spec's acceptance, repeated in `slots` panels.
pub fn plot_same_acceptance_four_times(
    table: &Table,
    specs: &[PlotSpec],
    bins: usize,
    inverted: bool,
    slots: usize,
) -> Result<(Figure, Vec<RenderedHistogram>)> {
    let spec = specs
        .first()
        .ok_or_else(|| DstError::InvalidLayout("no panel to plot the acceptance in".into()))?;
    let (layer, histogram) = AcceptanceRenderer::new(bins, inverted).render(table, spec)?;

    let mut figure = Figure::default();
    let mut hists = Vec::with_capacity(slots);
    for _ in 0..slots {
        let mut panel = empty_panel(spec);
        panel.layers.push(layer.clone());
        figure.panels.push(panel);
        hists.push(RenderedHistogram {
            columns: spec.columns.clone(),
            histogram: histogram.clone(),
        });
    }
    Ok((figure, hists))
}

/// Draw distributions on top of an existing figure, spec `i` onto panel `i`.
///
/// The panel takes the density spec's title and limits, like a second plot
/// call on the same axes would.
pub fn overlay_distributions(
    figure: &mut Figure,
    table: &Table,
    specs: &[PlotSpec],
    bins: usize,
) -> Result<Vec<RenderedHistogram>> {
    if specs.len() != figure.panels.len() {
        return Err(DstError::InvalidLayout(format!(
            "{} density panels for a figure of {}",
            specs.len(),
            figure.panels.len()
        )));
    }
    let renderer = DistributionRenderer::new(bins);
    figure
        .panels
        .iter_mut()
        .zip(specs)
        .map(|(panel, spec)| {
            panel.title = spec.title();
            panel.xlim = spec.xlim.or(panel.xlim);
            panel.ylim = spec.ylim.or(panel.ylim);
            renderer.render_onto(panel, table, spec)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE};
    use crate::histogram::BinRange;
    use crate::layout::default_distribution_layout;

    fn beam(n: usize) -> Table {
        let col = |scale: f64, offset: f64| -> Vec<f64> {
            (0..n)
                .map(|i| ((i * 7919) % 1000) as f64 / 1000.0 * scale - scale / 2.0 + offset)
                .collect()
        };
        Table::from_columns(vec![
            ("x(mm)", col(60.0, 0.0)),
            ("x'(mrad)", col(30.0, 0.0)),
            ("y(mm)", col(50.0, 1.0)),
            ("y'(mrad)", col(20.0, -1.0)),
            ("Phase(deg)", col(20.0, 0.0)),
            ("Energy(MeV)", col(2.0, 99.0)),
        ])
        .unwrap()
    }

    #[test]
    fn four_specs_make_a_two_by_two_figure() {
        let (figure, hists) = plot_all_distributions(&beam(400), &default_distribution_layout(), 20)
            .unwrap();
        assert_eq!(figure.panels.len(), 4);
        assert_eq!(figure.grid_shape(), (2, 2));
        assert_eq!(hists.len(), 4);
        assert_eq!(figure.panels[0].title, "x(mm) - x'(mrad)");
        assert_eq!(figure.panels[2].xlim, Some((-15.0, 15.0)));
        assert_eq!(hists[2].columns.1, "Energy(MeV)");
    }

    #[test]
    fn bins_below_cmin_are_blank() {
        let table = Table::from_columns(vec![
            ("a", vec![0.1, 0.1, 0.1, 0.9]),
            ("b", vec![0.1, 0.1, 0.1, 0.9]),
        ])
        .unwrap();
        let mut spec = PlotSpec::new("a", "b")
            .with_range(BinRange::Explicit {
                x: (0.0, 1.0),
                y: (0.0, 1.0),
            });
        spec.cmin = Some(2.0);
        let (layer, hist) = DistributionRenderer::new(2).render(&table, &spec).unwrap();
        assert_eq!(hist.count(0, 0), 3);
        assert_eq!(hist.count(1, 1), 1);
        assert!(layer.cell(0, 0).is_some());
        assert!(layer.cell(1, 1).is_none());
        assert!(layer.cell(0, 1).is_none());
    }

    #[test]
    fn densest_bin_gets_top_of_colormap() {
        let table = Table::from_columns(vec![
            ("a", vec![0.1, 0.1, 0.1, 0.9]),
            ("b", vec![0.1, 0.1, 0.1, 0.9]),
        ])
        .unwrap();
        let spec = PlotSpec::new("a", "b");
        let (layer, _) = DistributionRenderer::new(2).render(&table, &spec).unwrap();
        assert_eq!(layer.cell(0, 0), Some(spec.colormap.sample(1.0)));
        assert_eq!(layer.cell(1, 1), Some(spec.colormap.sample(0.0)));
    }

    #[test]
    fn acceptance_layer_is_black_and_white() {
        let table = Table::from_columns(vec![("a", vec![0.1, 0.9]), ("b", vec![0.1, 0.9])])
            .unwrap();
        let spec = PlotSpec::new("a", "b");
        let (layer, mask) = AcceptanceRenderer::new(2, false).render(&table, &spec).unwrap();
        assert_eq!(mask.counts(), &[1, 0, 0, 1]);
        assert_eq!(layer.cell(0, 0), Some(WHITE));
        assert_eq!(layer.cell(0, 1), Some(BLACK));

        let (inverted, _) = AcceptanceRenderer::new(2, true).render(&table, &spec).unwrap();
        assert_eq!(inverted.cell(0, 0), Some(BLACK));
    }

    #[test]
    fn acceptance_is_fanned_from_first_spec() {
        let specs = default_distribution_layout();
        let (figure, hists) =
            plot_same_acceptance_four_times(&beam(300), &specs, 16, false, FANNED_PANELS)
                .unwrap();
        assert_eq!(figure.panels.len(), 4);
        assert!(figure.panels.iter().all(|p| p.title == "x(mm) - x'(mrad)"));
        assert!(hists.iter().all(|h| h.histogram == hists[0].histogram));
    }

    #[test]
    fn density_is_drawn_over_acceptance() {
        let table = beam(300);
        let specs = default_distribution_layout();
        let (mut figure, _) =
            plot_same_acceptance_four_times(&table, &specs, 16, false, FANNED_PANELS).unwrap();
        let hists = overlay_distributions(&mut figure, &table, &specs, 32).unwrap();
        assert_eq!(hists.len(), 4);
        for (panel, spec) in figure.panels.iter().zip(&specs) {
            assert_eq!(panel.layers.len(), 2);
            assert_eq!(panel.layers[1].bins_x(), 32);
            assert_eq!(panel.title, spec.title());
        }
    }

    #[test]
    fn overlay_needs_one_spec_per_panel() {
        let table = beam(10);
        let specs = default_distribution_layout();
        let (mut figure, _) = plot_all_acceptances(&table, &specs[..2], 4, false).unwrap();
        assert!(overlay_distributions(&mut figure, &table, &specs, 4).is_err());
    }

    #[test]
    fn missing_column_propagates() {
        let table = Table::from_columns(vec![("a", vec![1.0])]).unwrap();
        let spec = PlotSpec::new("a", "Energy(MeV)");
        assert!(matches!(
            plot_all_distributions(&table, &[spec], 10),
            Err(DstError::MissingColumn(_))
        ));
    }

    #[test]
    fn view_prefers_limits_over_extent() {
        let panel = Panel {
            xlim: Some((-1.0, 1.0)),
            layers: vec![Layer {
                x_edges: vec![0.0, 5.0],
                y_edges: vec![2.0, 3.0],
                cells: vec![None],
            }],
            ..Default::default()
        };
        assert_eq!(panel.view(), ((-1.0, 1.0), (2.0, 3.0)));
    }

    #[test]
    fn grid_shape_for_other_counts() {
        let figure = |n| Figure {
            panels: vec![Panel::default(); n],
        };
        assert_eq!(figure(1).grid_shape(), (1, 1));
        assert_eq!(figure(3).grid_shape(), (2, 2));
        assert_eq!(figure(5).grid_shape(), (2, 3));
    }
}
