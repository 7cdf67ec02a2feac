use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use dst_util::layout::{default_acceptance_layout, default_distribution_layout, load_layout, PlotSpec};
use dst_util::pipeline::{plot_acceptance, plot_distribution, AcceptanceJob, DistributionJob, Plotted};

/// Plot phase-space distributions and acceptances from TraceWin ASCII files
#[derive(Parser, Debug)]
#[command(name = "dst-plot", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plot x-x', y-y', Phase-Energy and x-y distributions of a particle file
    Distribution {
        /// ASCII file holding the distribution, generally part_rfq.txt
        #[arg(short, long)]
        density: PathBuf,

        /// Number of bins per axis
        #[arg(short, long, default_value_t = 500)]
        bins: usize,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Plot an acceptance, optionally with a distribution on top
    Acceptance {
        /// ASCII file holding the acceptance (not generated automatically by TraceWin)
        #[arg(short, long)]
        acceptance: PathBuf,

        /// ASCII file holding the input distribution, generally part_rfq.txt
        #[arg(short, long)]
        density: Option<PathBuf>,

        /// Number of bins per axis for the acceptance
        #[arg(long, default_value_t = 200)]
        acceptance_bins: usize,

        /// Number of bins per axis for the distribution
        #[arg(short, long, default_value_t = 500)]
        bins: usize,

        /// Draw accepted bins black on white
        #[arg(long)]
        invert: bool,

        /// Bin the acceptance for every panel instead of repeating the first one
        #[arg(long)]
        per_panel: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Do not write the histogram data files
    #[arg(short = 's', long)]
    no_save: bool,

    /// JSON file with the panels to draw, replacing the built-in layout
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Where to write the figure [default: <input stem>.png]
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl CommonArgs {
    fn specs(&self, default: fn() -> Vec<PlotSpec>) -> Result<Vec<PlotSpec>> {
        match &self.layout {
            Some(path) => load_layout(path).with_context(|| format!("reading layout {}", path.display())),
            None => Ok(default()),
        }
    }
}

fn finish(plotted: Plotted, common: &CommonArgs) -> Result<()> {
    if !common.no_save {
        let written = plotted.save_histograms().context("saving histogram data")?;
        log::info!("Wrote {} histogram files", written.len());
    }
    let figure = plotted
        .save_figure(common.output.as_deref())
        .context("saving figure")?;
    println!("Saved figure in {}", figure.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Distribution {
            density,
            bins,
            common,
        } => {
            let job = DistributionJob {
                specs: common.specs(default_distribution_layout)?,
                path: density,
                bins,
            };
            let plotted = plot_distribution(&job)
                .with_context(|| format!("plotting distribution {}", job.path.display()))?;
            finish(plotted, &common)
        }
        Command::Acceptance {
            acceptance,
            density,
            acceptance_bins,
            bins,
            invert,
            per_panel,
            common,
        } => {
            let job = AcceptanceJob {
                specs: common.specs(default_acceptance_layout)?,
                acceptance,
                density,
                acceptance_bins,
                density_bins: bins,
                same_in_every_panel: !per_panel,
                inverted: invert,
            };
            let plotted = plot_acceptance(&job)
                .with_context(|| format!("plotting acceptance {}", job.acceptance.display()))?;
            finish(plotted, &common)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn distribution_defaults() {
        let cli = Cli::parse_from(["dst-plot", "distribution", "-d", "part_rfq.txt"]);
        match cli.command {
            Command::Distribution { bins, common, .. } => {
                assert_eq!(bins, 500);
                assert!(!common.no_save);
                assert!(common.output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn acceptance_flags() {
        let cli = Cli::parse_from([
            "dst-plot", "acceptance", "-a", "accepted.txt", "-d", "in.txt", "-s", "--invert",
        ]);
        match cli.command {
            Command::Acceptance {
                density,
                acceptance_bins,
                invert,
                per_panel,
                common,
                ..
            } => {
                assert_eq!(density, Some(PathBuf::from("in.txt")));
                assert_eq!(acceptance_bins, 200);
                assert!(invert);
                assert!(!per_panel);
                assert!(common.no_save);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn acceptance_file_is_required() {
        assert!(Cli::try_parse_from(["dst-plot", "acceptance"]).is_err());
    }

    #[test]
    fn output_flag_chooses_figure_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("part_rfq.txt");
        let mut text = String::from("meta\nmeta\nx(mm) x'(mrad) y(mm) y'(mrad) Phase(deg) Energy(MeV)\n");
        for i in 0..200 {
            let u = (i % 20) as f64 - 10.0;
            text.push_str(&format!("{u} {} {} {u} {} 99.5\n", -u, u / 2.0, u / 4.0));
        }
        std::fs::write(&input, text).unwrap();
        let output = dir.path().join("figure.png");

        let cli = Cli::parse_from([
            "dst-plot",
            "distribution",
            "-d",
            input.to_str().unwrap(),
            "-b",
            "20",
            "-s",
            "-o",
            output.to_str().unwrap(),
        ]);
        let Command::Distribution { density, bins, common } = cli.command else {
            panic!("expected the distribution command");
        };
        let job = DistributionJob {
            specs: common.specs(default_distribution_layout).unwrap(),
            path: density,
            bins,
        };
        finish(plot_distribution(&job).unwrap(), &common).unwrap();

        assert!(output.exists());
        assert!(!dir.path().join("part_rfq.png").exists());
        assert!(!dir.path().join("part_rfq_x(mm)_y(mm).csv").exists());
    }
}
