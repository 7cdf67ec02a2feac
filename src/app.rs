use eframe::egui;

use crate::state::AppState;
use crate::ui::plot::FigureTextures;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct DstUtilApp {
    pub state: AppState,
    textures: FigureTextures,
}

impl eframe::App for DstUtilApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: plot settings ----
        egui::SidePanel::left("settings_panel")
            .default_width(380.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        self.textures.sync(ctx, &self.state);

        // ---- Central panel: figure ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::figure_view(ui, &self.state, &mut self.textures);
        });

        panels::error_dialog(ctx, &mut self.state);
    }
}
