//! What the front-ends run: read the file(s), build the figure, and save.

use std::path::{Path, PathBuf};

use crate::data::loader::{classify, load_file, FileFormat};
use crate::error::{DstError, Result};
use crate::layout::PlotSpec;
use crate::persist;
use crate::render::figure::{
    overlay_distributions, plot_all_acceptances, plot_all_distributions,
    plot_same_acceptance_four_times, Figure, RenderedHistogram, FANNED_PANELS,
};

/// Plot the phase-space distributions of one particle file.
#[derive(Debug, Clone)]
pub struct DistributionJob {
    pub path: PathBuf,
    pub bins: usize,
    pub specs: Vec<PlotSpec>,
}

/// Plot an acceptance, optionally with a distribution drawn over it.
#[derive(Debug, Clone)]
pub struct AcceptanceJob {
    pub acceptance: PathBuf,
    pub density: Option<PathBuf>,
    pub acceptance_bins: usize,
    pub density_bins: usize,
    pub specs: Vec<PlotSpec>,
    /// Repeat the first spec's acceptance in every panel instead of
    /// binning each spec.
    pub same_in_every_panel: bool,
    pub inverted: bool,
}

/// A finished figure and the histograms behind it, keyed by source file.
#[derive(Debug, Clone)]
pub struct Plotted {
    pub figure: Figure,
    /// File the figure is named after.
    pub primary: PathBuf,
    pub acceptance: Option<(PathBuf, Vec<RenderedHistogram>)>,
    pub distribution: Option<(PathBuf, Vec<RenderedHistogram>)>,
}

/// Reject `.dst` and unknown extensions before anything is read.
fn ensure_ascii(path: &Path) -> Result<()> {
    match classify(path)? {
        FileFormat::Ascii => Ok(()),
        FileFormat::Binary => Err(DstError::BinaryNotImplemented(path.to_path_buf())),
    }
}

pub fn plot_distribution(job: &DistributionJob) -> Result<Plotted> {
    ensure_ascii(&job.path)?;
    let table = load_file(&job.path)?;
    let (figure, hists) = plot_all_distributions(&table, &job.specs, job.bins)?;
    Ok(Plotted {
        figure,
        primary: job.path.clone(),
        acceptance: None,
        distribution: Some((job.path.clone(), hists)),
    })
}

pub fn plot_acceptance(job: &AcceptanceJob) -> Result<Plotted> {
    ensure_ascii(&job.acceptance)?;
    if let Some(density) = &job.density {
        ensure_ascii(density)?;
    }

    let table = load_file(&job.acceptance)?;
    let (mut figure, acceptance) = if job.same_in_every_panel {
        let slots = if job.density.is_some() {
            job.specs.len()
        } else {
            FANNED_PANELS
        };
        plot_same_acceptance_four_times(&table, &job.specs, job.acceptance_bins, job.inverted, slots)?
    } else {
        plot_all_acceptances(&table, &job.specs, job.acceptance_bins, job.inverted)?
    };
    drop(table);

    let distribution = match &job.density {
        Some(density) => {
            let table = load_file(density)?;
            let hists = overlay_distributions(&mut figure, &table, &job.specs, job.density_bins)?;
            Some((density.clone(), hists))
        }
        None => None,
    };

    Ok(Plotted {
        figure,
        primary: job.acceptance.clone(),
        acceptance: Some((job.acceptance.clone(), acceptance)),
        distribution,
    })
}

impl Plotted {
    /// Write every histogram next to the file it came from.
    pub fn save_histograms(&self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if let Some((path, hists)) = &self.acceptance {
            written.extend(persist::save_all_acceptances(hists, path)?);
        }
        if let Some((path, hists)) = &self.distribution {
            written.extend(persist::save_all_distributions(hists, path)?);
        }
        Ok(written)
    }

    /// Write the figure to `output`, or to `<primary stem>.png`.
    pub fn save_figure(&self, output: Option<&Path>) -> Result<PathBuf> {
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| persist::figure_path(&self.primary));
        persist::save_figure(&self.figure, &path)?;
        Ok(path)
    }
}
