//! Per-panel plot configuration and the built-in four-panel layouts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::{ColorNorm, Colormap};
use crate::error::{DstError, Result};
use crate::histogram::{BinRange, Interval};

// ---------------------------------------------------------------------------
// PlotSpec
// ---------------------------------------------------------------------------

/// Which pair of columns a panel shows, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSpec {
    /// `(x column, y column)`.
    pub columns: (String, String),
    pub xlim: Option<Interval>,
    pub ylim: Option<Interval>,
    pub range: BinRange,
    /// Bins with fewer counts are left blank. `None` draws every bin.
    pub cmin: Option<f64>,
    pub norm: ColorNorm,
    pub colormap: Colormap,
    pub grid: bool,
}

impl Default for PlotSpec {
    fn default() -> Self {
        Self {
            columns: (String::new(), String::new()),
            xlim: None,
            ylim: None,
            range: BinRange::Auto,
            cmin: Some(1.0),
            norm: ColorNorm::Log,
            colormap: Colormap::Rainbow,
            grid: true,
        }
    }
}

impl PlotSpec {
    pub fn new(x: &str, y: &str) -> Self {
        Self {
            columns: (x.to_string(), y.to_string()),
            ..Default::default()
        }
    }

    pub fn with_limits(mut self, xlim: Interval, ylim: Interval) -> Self {
        self.xlim = Some(xlim);
        self.ylim = Some(ylim);
        self
    }

    pub fn with_range(mut self, range: BinRange) -> Self {
        self.range = range;
        self
    }

    /// Panel title: the column names joined by `" - "`.
    pub fn title(&self) -> String {
        format!("{} - {}", self.columns.0, self.columns.1)
    }

    /// Binning range; `None` means the data extent.
    pub fn binning_range(&self) -> Result<Option<(Interval, Interval)>> {
        match self.range {
            BinRange::Auto => Ok(None),
            BinRange::Explicit { x, y } => Ok(Some((x, y))),
            BinRange::AsPlotLimits => match (self.xlim, self.ylim) {
                (Some(x), Some(y)) => Ok(Some((x, y))),
                _ => Err(DstError::MissingPlotLimits(self.title())),
            },
        }
    }

    /// Apply parsed panel options on top of this spec.
    pub fn apply(&mut self, options: &PlotOptions) {
        if let Some(range) = options.range {
            self.range = range;
        }
        if let Some(cmin) = options.cmin {
            self.cmin = cmin;
        }
        if let Some(norm) = options.norm {
            self.norm = norm;
        }
        if let Some(colormap) = options.colormap {
            self.colormap = colormap;
        }
        if let Some(grid) = options.grid {
            self.grid = grid;
        }
    }
}

// ---------------------------------------------------------------------------
// PlotOptions – the free-text panel options field
// ---------------------------------------------------------------------------

/// Overrides typed as `key=value` pairs separated by commas, e.g.
/// `range=as_plot_limits, cmap=jet, cmin=2`.
///
/// Known keys: `range` (`as_plot_limits` | `auto`), `cmin` (number or
/// `none`), `norm` (`log` | `linear`), `cmap`, `grid` (`true` | `false`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotOptions {
    pub range: Option<BinRange>,
    pub cmin: Option<Option<f64>>,
    pub norm: Option<ColorNorm>,
    pub colormap: Option<Colormap>,
    pub grid: Option<bool>,
}

impl PlotOptions {
    pub fn parse(text: &str) -> Result<Self> {
        let mut options = PlotOptions::default();

        for pair in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| DstError::InvalidOption {
                key: pair.to_string(),
                message: "expected key=value".into(),
            })?;
            let key = key.trim();
            let value = unquote(value.trim());
            let invalid = |message: String| DstError::InvalidOption {
                key: key.to_string(),
                message,
            };

            match key {
                "range" => {
                    options.range = Some(match value {
                        "as_plot_limits" => BinRange::AsPlotLimits,
                        "auto" | "none" | "None" => BinRange::Auto,
                        other => {
                            return Err(invalid(format!(
                                "'{other}' is not one of as_plot_limits, auto"
                            )))
                        }
                    })
                }
                "cmin" => {
                    options.cmin = Some(match value {
                        "none" | "None" => None,
                        number => Some(
                            number
                                .parse::<f64>()
                                .map_err(|_| invalid(format!("'{number}' is not a number")))?,
                        ),
                    })
                }
                "norm" => {
                    options.norm = Some(match value {
                        "log" => ColorNorm::Log,
                        "linear" => ColorNorm::Linear,
                        other => {
                            return Err(invalid(format!("'{other}' is not one of log, linear")))
                        }
                    })
                }
                "cmap" => options.colormap = Some(value.parse().map_err(invalid)?),
                "grid" => {
                    options.grid = Some(match value {
                        "true" | "True" => true,
                        "false" | "False" => false,
                        other => return Err(invalid(format!("'{other}' is not a boolean"))),
                    })
                }
                _ => return Err(invalid("unknown option".into())),
            }
        }
        Ok(options)
    }
}

fn unquote(s: &str) -> &str {
    s.trim_matches(|c| c == '\'' || c == '"')
}

/// Parse `"lo, hi"` into an interval. Empty text means no limit.
pub fn parse_limits(text: &str) -> Result<Option<Interval>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let bad = || DstError::InvalidRange(format!("'{text}' is not of the form 'lo, hi'"));
    let (lo, hi) = text.split_once(',').ok_or_else(bad)?;
    let lo = lo.trim().parse::<f64>().map_err(|_| bad())?;
    let hi = hi.trim().parse::<f64>().map_err(|_| bad())?;
    check_limits((lo, hi))?;
    Ok(Some((lo, hi)))
}

/// Display limits must be finite and increasing.
fn check_limits((lo, hi): Interval) -> Result<()> {
    if lo.is_finite() && hi.is_finite() && lo < hi {
        Ok(())
    } else {
        Err(DstError::InvalidRange(format!(
            "limits ({lo}, {hi}) must be finite with lo < hi"
        )))
    }
}

// ---------------------------------------------------------------------------
// Built-in layouts
// ---------------------------------------------------------------------------

/// x–x', y–y', Phase–Energy, x–y.
pub fn default_distribution_layout() -> Vec<PlotSpec> {
    vec![
        PlotSpec::new("x(mm)", "x'(mrad)").with_limits((-40.0, 40.0), (-25.0, 25.0)),
        PlotSpec::new("y(mm)", "y'(mrad)").with_limits((-40.0, 40.0), (-25.0, 25.0)),
        PlotSpec::new("Phase(deg)", "Energy(MeV)")
            .with_limits((-15.0, 15.0), (98.0, 100.5))
            .with_range(BinRange::AsPlotLimits),
        PlotSpec::new("x(mm)", "y(mm)").with_limits((-40.0, 40.0), (-40.0, 40.0)),
    ]
}

/// Same panels as the distribution layout, with the longitudinal window
/// centred on the acceptance energy.
pub fn default_acceptance_layout() -> Vec<PlotSpec> {
    let mut layout = default_distribution_layout();
    layout[2] = PlotSpec::new("Phase(deg)", "Energy(MeV)")
        .with_limits((-20.0, 20.0), (16.0, 17.0))
        .with_range(BinRange::AsPlotLimits);
    layout
}

/// Read a JSON array of [`PlotSpec`].
pub fn load_layout(path: &Path) -> Result<Vec<PlotSpec>> {
    let text = std::fs::read_to_string(path).map_err(|e| DstError::io(path, e))?;
    let layout: Vec<PlotSpec> = serde_json::from_str(&text)?;
    if layout.is_empty() {
        return Err(DstError::InvalidLayout(format!(
            "{} holds no panels",
            path.display()
        )));
    }
    for spec in &layout {
        for lim in [spec.xlim, spec.ylim].into_iter().flatten() {
            check_limits(lim).map_err(|e| {
                DstError::InvalidLayout(format!("panel '{}': {e}", spec.title()))
            })?;
        }
    }
    log::info!("Loaded {} panels from {}", layout.len(), path.display());
    Ok(layout)
}
