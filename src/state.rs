use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use dst_util::histogram::BinRange;
use dst_util::layout::{
    default_acceptance_layout, default_distribution_layout, parse_limits, PlotOptions, PlotSpec,
};
use dst_util::pipeline::{plot_acceptance, plot_distribution, AcceptanceJob, DistributionJob, Plotted};
use dst_util::render::figure::Figure;

// ---------------------------------------------------------------------------
// Form state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Acceptance,
    Distribution,
}

/// Text fields of one subplot.
#[derive(Debug, Clone)]
pub struct PanelForm {
    pub columns: (String, String),
    pub xlim: String,
    pub ylim: String,
    /// `key=value` overrides, see [`PlotOptions`].
    pub options: String,
}

impl PanelForm {
    pub fn from_spec(spec: &PlotSpec) -> Self {
        let limits = |lim: Option<(f64, f64)>| {
            lim.map(|(lo, hi)| format!("{lo:?}, {hi:?}"))
                .unwrap_or_default()
        };
        let options = match spec.range {
            BinRange::AsPlotLimits => "range=as_plot_limits".to_string(),
            _ => String::new(),
        };
        Self {
            columns: spec.columns.clone(),
            xlim: limits(spec.xlim),
            ylim: limits(spec.ylim),
            options,
        }
    }

    pub fn to_spec(&self) -> Result<PlotSpec> {
        let title = format!("{} vs {}", self.columns.0, self.columns.1);
        let mut spec = PlotSpec::new(&self.columns.0, &self.columns.1);
        spec.xlim = parse_limits(&self.xlim).with_context(|| format!("{title}: xlim"))?;
        spec.ylim = parse_limits(&self.ylim).with_context(|| format!("{title}: ylim"))?;
        let options =
            PlotOptions::parse(&self.options).with_context(|| format!("{title}: options"))?;
        spec.apply(&options);
        Ok(spec)
    }
}

fn panel_forms(layout: &[PlotSpec]) -> Vec<PanelForm> {
    layout.iter().map(PanelForm::from_spec).collect()
}

fn specs(panels: &[PanelForm]) -> Result<Vec<PlotSpec>> {
    panels.iter().map(PanelForm::to_spec).collect()
}

pub struct DistributionForm {
    pub path: String,
    pub bins: usize,
    pub save_hist_data: bool,
    pub panels: Vec<PanelForm>,
}

impl Default for DistributionForm {
    fn default() -> Self {
        Self {
            path: String::new(),
            bins: 500,
            save_hist_data: false,
            panels: panel_forms(&default_distribution_layout()),
        }
    }
}

impl DistributionForm {
    pub fn job(&self) -> Result<DistributionJob> {
        if self.path.trim().is_empty() {
            bail!("Please select a file to plot.");
        }
        Ok(DistributionJob {
            path: PathBuf::from(self.path.trim()),
            bins: self.bins,
            specs: specs(&self.panels)?,
        })
    }
}

pub struct AcceptanceForm {
    pub acceptance_path: String,
    /// Optional distribution drawn over the acceptance.
    pub density_path: String,
    pub acceptance_bins: usize,
    pub density_bins: usize,
    pub save_hist_data: bool,
    pub invert_colors: bool,
    pub same_in_every_panel: bool,
    pub panels: Vec<PanelForm>,
}

impl Default for AcceptanceForm {
    fn default() -> Self {
        Self {
            acceptance_path: String::new(),
            density_path: String::new(),
            acceptance_bins: 200,
            density_bins: 500,
            save_hist_data: false,
            invert_colors: false,
            same_in_every_panel: true,
            panels: panel_forms(&default_acceptance_layout()),
        }
    }
}

impl AcceptanceForm {
    pub fn job(&self) -> Result<AcceptanceJob> {
        if self.acceptance_path.trim().is_empty() {
            bail!("Please select a file for acceptance.");
        }
        let density = Some(self.density_path.trim())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Ok(AcceptanceJob {
            acceptance: PathBuf::from(self.acceptance_path.trim()),
            density,
            acceptance_bins: self.acceptance_bins,
            density_bins: self.density_bins,
            specs: specs(&self.panels)?,
            same_in_every_panel: self.same_in_every_panel,
            inverted: self.invert_colors,
        })
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub tab: Tab,
    pub distribution: DistributionForm,
    pub acceptance: AcceptanceForm,

    /// Last plotted figure.
    pub figure: Option<Figure>,

    /// Bumped whenever `figure` changes so the view can rebuild textures.
    pub figure_generation: u64,

    /// Status line shown in the top bar.
    pub status_message: Option<String>,

    /// Error shown in a dialog until dismissed.
    pub error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            tab: Tab::Acceptance,
            distribution: DistributionForm::default(),
            acceptance: AcceptanceForm::default(),
            figure: None,
            figure_generation: 0,
            status_message: None,
            error: None,
        }
    }
}

impl AppState {
    /// Run the distribution tab's job.
    pub fn plot_distribution(&mut self) {
        let save = self.distribution.save_hist_data;
        let result = self
            .distribution
            .job()
            .and_then(|job| Ok(plot_distribution(&job)?));
        self.finish(result, save);
    }

    /// Run the acceptance tab's job.
    pub fn plot_acceptance(&mut self) {
        let save = self.acceptance.save_hist_data;
        let result = self
            .acceptance
            .job()
            .and_then(|job| Ok(plot_acceptance(&job)?));
        self.finish(result, save);
    }

    fn finish(&mut self, result: Result<Plotted>, save: bool) {
        let outcome = result.and_then(|plotted| {
            let mut message = format!("Plotted {}", plotted.primary.display());
            if save {
                let written = plotted.save_histograms().context("saving histogram data")?;
                let figure = plotted.save_figure(None).context("saving figure")?;
                message = format!(
                    "{message}; saved {} histogram files and {}",
                    written.len(),
                    figure.display()
                );
            }
            Ok((plotted.figure, message))
        });

        match outcome {
            Ok((figure, message)) => {
                log::info!("{message}");
                self.figure = Some(figure);
                self.figure_generation += 1;
                self.status_message = Some(message);
                self.error = None;
            }
            Err(e) => {
                log::error!("Plot failed: {e:#}");
                self.error = Some(format!("{e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dst_util::color::Colormap;

    #[test]
    fn default_forms_round_trip_to_default_layouts() {
        let form = DistributionForm::default();
        assert_eq!(specs(&form.panels).unwrap(), default_distribution_layout());
        let form = AcceptanceForm::default();
        assert_eq!(specs(&form.panels).unwrap(), default_acceptance_layout());
    }

    #[test]
    fn panel_options_reach_the_spec() {
        let mut panel = PanelForm::from_spec(&PlotSpec::new("x(mm)", "y(mm)"));
        panel.xlim = "-10, 10".into();
        panel.options = "cmap=hot, grid=false".into();
        let spec = panel.to_spec().unwrap();
        assert_eq!(spec.xlim, Some((-10.0, 10.0)));
        assert_eq!(spec.ylim, None);
        assert_eq!(spec.colormap, Colormap::Hot);
        assert!(!spec.grid);
    }

    #[test]
    fn bad_limits_name_the_panel() {
        let mut panel = PanelForm::from_spec(&PlotSpec::new("x(mm)", "y(mm)"));
        panel.ylim = "wide".into();
        let err = panel.to_spec().unwrap_err();
        assert!(format!("{err:#}").contains("x(mm) vs y(mm): ylim"));
    }

    #[test]
    fn empty_path_is_reported_in_dialog() {
        let mut state = AppState::default();
        state.plot_distribution();
        assert_eq!(state.error.as_deref(), Some("Please select a file to plot."));
        assert!(state.figure.is_none());
    }

    #[test]
    fn blank_density_path_means_no_overlay() {
        let form = AcceptanceForm {
            acceptance_path: "accepted.txt".into(),
            density_path: "  ".into(),
            ..Default::default()
        };
        let job = form.job().unwrap();
        assert!(job.density.is_none());
        assert!(job.same_in_every_panel);
    }
}
