/// Rendering: histograms → coloured layers → panels → figure.
///
/// ```text
///   Table + [PlotSpec]
///        │
///        ▼
///   ┌──────────────────────────────┐
///   │ Distribution/AcceptanceRenderer │  bin, threshold, colour
///   └──────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │  Figure   │ ───▶ │  bitmap   │  PNG via plotters
///   └──────────┘      └──────────┘
///        │
///        └──────────▶  GUI plot panels (egui_plot)
/// ```

pub mod bitmap;
pub mod figure;
