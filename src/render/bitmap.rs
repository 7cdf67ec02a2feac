use image::RgbImage;
use plotters::prelude::*;

use crate::color::Rgb8;
use crate::error::{DstError, Result};

use super::figure::{Figure, Layer, Panel};

/// Pixel size of a saved figure.
pub const FIGURE_SIZE: (u32, u32) = (1400, 1100);

const GRID_COLOR: RGBColor = RGBColor(200, 200, 200);

// ---------------------------------------------------------------------------
// Figure → RGB bitmap
// ---------------------------------------------------------------------------

/// Rasterise the figure, panels laid out on its grid.
pub fn render_figure(figure: &Figure, (width, height): (u32, u32)) -> Result<RgbImage> {
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let areas = root.split_evenly(figure.grid_shape());
        for (area, panel) in areas.iter().zip(&figure.panels) {
            draw_panel(area, panel)?;
        }
        root.present()?;
    }
    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| DstError::Render("bitmap buffer has the wrong size".into()))
}

fn draw_panel<DB>(area: &DrawingArea<DB, plotters::coord::Shift>, panel: &Panel) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let ((x0, x1), (y0, y1)) = panel.view();

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 20))
        .margin(12)
        .x_label_area_size(35)
        .y_label_area_size(55)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let mut mesh = chart.configure_mesh();
    if panel.grid {
        mesh.light_line_style(TRANSPARENT).bold_line_style(GRID_COLOR);
    } else {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    for layer in &panel.layers {
        chart.draw_series(
            visible_cells(layer, (x0, x1), (y0, y1))
                .map(|(a, b, color)| Rectangle::new([a, b], to_plotters(color).filled())),
        )?;
    }
    Ok(())
}

/// Coloured cells clipped to the visible window, as `(corner, corner, color)`.
fn visible_cells(
    layer: &Layer,
    (vx0, vx1): (f64, f64),
    (vy0, vy1): (f64, f64),
) -> impl Iterator<Item = ((f64, f64), (f64, f64), Rgb8)> + '_ {
    (0..layer.bins_x()).flat_map(move |ix| {
        (0..layer.bins_y()).filter_map(move |iy| {
            let color = layer.cell(ix, iy)?;
            let x0 = layer.x_edges[ix].max(vx0);
            let x1 = layer.x_edges[ix + 1].min(vx1);
            let y0 = layer.y_edges[iy].max(vy0);
            let y1 = layer.y_edges[iy + 1].min(vy1);
            (x0 < x1 && y0 < y1).then_some(((x0, y0), (x1, y1), color))
        })
    })
}

fn to_plotters(c: Rgb8) -> RGBColor {
    RGBColor(c.red, c.green, c.blue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::WHITE as CELL_WHITE;

    fn layer() -> Layer {
        Layer {
            x_edges: vec![0.0, 1.0, 2.0],
            y_edges: vec![0.0, 1.0],
            cells: vec![Some(CELL_WHITE), None],
        }
    }

    #[test]
    fn blank_cells_are_skipped() {
        let cells: Vec<_> = visible_cells(&layer(), (0.0, 2.0), (0.0, 1.0)).collect();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].0, (0.0, 0.0));
    }

    #[test]
    fn cells_are_clipped_to_window() {
        let cells: Vec<_> = visible_cells(&layer(), (0.5, 2.0), (0.0, 0.25)).collect();
        assert_eq!(cells, vec![((0.5, 0.0), (1.0, 0.25), CELL_WHITE)]);
        assert_eq!(visible_cells(&layer(), (1.5, 2.0), (0.0, 1.0)).count(), 0);
    }
}
