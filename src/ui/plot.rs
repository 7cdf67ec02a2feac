use eframe::egui::{self, ColorImage, RichText, TextureHandle, TextureOptions, Ui, Vec2b};
use egui_extras::{Size, StripBuilder};
use egui_plot::{Plot, PlotBounds, PlotImage, PlotPoint};

use dst_util::render::figure::{Layer, Panel};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Layer textures
// ---------------------------------------------------------------------------

/// GPU textures of the current figure, one per panel layer.
#[derive(Default)]
pub struct FigureTextures {
    generation: u64,
    panels: Vec<Vec<TextureHandle>>,
    /// Set when the figure changed; the next frame snaps every plot to its view.
    reset_bounds: bool,
}

impl FigureTextures {
    /// Re-upload the layers when the figure changed.
    pub fn sync(&mut self, ctx: &egui::Context, state: &AppState) {
        if self.generation == state.figure_generation {
            return;
        }
        self.generation = state.figure_generation;
        self.reset_bounds = true;
        self.panels = state
            .figure
            .iter()
            .flat_map(|figure| figure.panels.iter().enumerate())
            .map(|(p, panel)| {
                panel
                    .layers
                    .iter()
                    .enumerate()
                    .map(|(l, layer)| {
                        ctx.load_texture(
                            format!("panel{p}_layer{l}"),
                            layer_image(layer),
                            TextureOptions::NEAREST,
                        )
                    })
                    .collect()
            })
            .collect();
    }
}

/// One pixel per bin, y pointing up; blank bins are transparent.
fn layer_image(layer: &Layer) -> ColorImage {
    let (nx, ny) = (layer.bins_x(), layer.bins_y());
    let mut rgba = Vec::with_capacity(nx * ny * 4);
    for row in 0..ny {
        let iy = ny - 1 - row;
        for ix in 0..nx {
            match layer.cell(ix, iy) {
                Some(c) => rgba.extend_from_slice(&[c.red, c.green, c.blue, 255]),
                None => rgba.extend_from_slice(&[0, 0, 0, 0]),
            }
        }
    }
    ColorImage::from_rgba_unmultiplied([nx, ny], &rgba)
}

// ---------------------------------------------------------------------------
// Figure view (central panel)
// ---------------------------------------------------------------------------

/// Render the figure as a grid of interactive plots.
pub fn figure_view(ui: &mut Ui, state: &AppState, textures: &mut FigureTextures) {
    let figure = match &state.figure {
        Some(f) => f,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Fill in the form and press Plot");
            });
            return;
        }
    };

    let (rows, cols) = figure.grid_shape();
    let reset = std::mem::take(&mut textures.reset_bounds);
    let textures = &*textures;
    StripBuilder::new(ui)
        .sizes(Size::remainder(), rows)
        .vertical(|mut strip| {
            for r in 0..rows {
                strip.strip(|builder| {
                    builder
                        .sizes(Size::remainder(), cols)
                        .horizontal(|mut strip| {
                            for c in 0..cols {
                                let idx = r * cols + c;
                                strip.cell(|ui: &mut Ui| {
                                    if let Some(panel) = figure.panels.get(idx) {
                                        let layers = textures
                                            .panels
                                            .get(idx)
                                            .map(Vec::as_slice)
                                            .unwrap_or_default();
                                        panel_plot(ui, idx, panel, layers, reset);
                                    }
                                });
                            }
                        });
                });
            }
        });
}

fn panel_plot(
    ui: &mut Ui,
    idx: usize,
    panel: &Panel,
    textures: &[TextureHandle],
    reset: bool,
) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(RichText::new(&panel.title).strong());
    });

    let bounds = view_bounds(panel);

    Plot::new(("figure_panel", idx))
        .auto_bounds(Vec2b::new(false, false))
        .include_x(bounds.min()[0])
        .include_x(bounds.max()[0])
        .include_y(bounds.min()[1])
        .include_y(bounds.max()[1])
        .show_grid(panel.grid)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            // Double click goes back to the configured limits.
            if reset || plot_ui.response().double_clicked() {
                plot_ui.set_plot_bounds(bounds);
            }
            for (layer, texture) in panel.layers.iter().zip(textures) {
                let ((lx0, lx1), (ly0, ly1)) = layer.extent();
                plot_ui.image(PlotImage::new(
                    texture,
                    PlotPoint::new((lx0 + lx1) / 2.0, (ly0 + ly1) / 2.0),
                    [(lx1 - lx0) as f32, (ly1 - ly0) as f32],
                ));
            }
        });
}

/// The panel's display limits, never widened by the layer images.
fn view_bounds(panel: &Panel) -> PlotBounds {
    let ((x0, x1), (y0, y1)) = panel.view();
    PlotBounds::from_min_max([x0, y0], [x1, y1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use dst_util::color::{BLACK, WHITE};
    use eframe::egui::Color32;

    #[test]
    fn image_rows_run_top_down() {
        let layer = Layer {
            x_edges: vec![0.0, 1.0, 2.0],
            y_edges: vec![0.0, 1.0, 2.0],
            // (0,0) white, (0,1) blank, (1,0) black, (1,1) white
            cells: vec![Some(WHITE), None, Some(BLACK), Some(WHITE)],
        };
        let image = layer_image(&layer);
        assert_eq!(image.size, [2, 2]);
        // Top row is iy = 1.
        assert_eq!(image.pixels[0], Color32::TRANSPARENT);
        assert_eq!(image.pixels[1], Color32::WHITE);
        // Bottom row is iy = 0.
        assert_eq!(image.pixels[2], Color32::WHITE);
        assert_eq!(image.pixels[3], Color32::BLACK);
    }

    #[test]
    fn plot_bounds_follow_limits_not_layers() {
        let panel = Panel {
            title: "x(mm) - x'(mrad)".into(),
            xlim: Some((-40.0, 40.0)),
            ylim: Some((-25.0, 25.0)),
            grid: true,
            layers: vec![Layer {
                x_edges: vec![-60.0, 0.0, 60.0],
                y_edges: vec![-30.0, 30.0],
                cells: vec![Some(WHITE), Some(WHITE)],
            }],
        };
        let bounds = view_bounds(&panel);
        assert_eq!(bounds.min(), [-40.0, -25.0]);
        assert_eq!(bounds.max(), [40.0, 25.0]);

        let unlimited = Panel {
            xlim: None,
            ylim: None,
            ..panel
        };
        let bounds = view_bounds(&unlimited);
        assert_eq!(bounds.min(), [-60.0, -30.0]);
        assert_eq!(bounds.max(), [60.0, 30.0]);
    }
}
