use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AcceptanceForm, AppState, DistributionForm, PanelForm, Tab};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the tab selector and status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.tab, Tab::Acceptance, "Acceptance");
        ui.selectable_value(&mut state.tab, Tab::Distribution, "Distribution");

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(msg);
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – plot settings
// ---------------------------------------------------------------------------

/// Render the form of the active tab.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.tab {
            Tab::Acceptance => {
                if acceptance_form(ui, &mut state.acceptance) {
                    state.plot_acceptance();
                }
            }
            Tab::Distribution => {
                if distribution_form(ui, &mut state.distribution) {
                    state.plot_distribution();
                }
            }
        });
}

/// Returns true when Plot was pressed.
fn acceptance_form(ui: &mut Ui, form: &mut AcceptanceForm) -> bool {
    ui.heading("Acceptance");
    ui.separator();

    egui::Grid::new("acceptance_files")
        .num_columns(3)
        .spacing([8.0, 6.0])
        .show(ui, |ui: &mut Ui| {
            path_row(ui, "Filepath acceptance:", &mut form.acceptance_path);
            path_row(ui, "Filepath density (optional):", &mut form.density_path);

            ui.label("Bins acceptance:");
            ui.add(egui::DragValue::new(&mut form.acceptance_bins).range(1..=5000));
            ui.end_row();

            ui.label("Bins density:");
            ui.add(egui::DragValue::new(&mut form.density_bins).range(1..=5000));
            ui.end_row();
        });

    ui.checkbox(&mut form.save_hist_data, "Save histogram data");
    ui.checkbox(&mut form.invert_colors, "Invert acceptance colors");
    ui.checkbox(
        &mut form.same_in_every_panel,
        "Same acceptance in every panel",
    );
    ui.separator();

    panel_forms(ui, "acceptance", &mut form.panels);

    ui.add_space(8.0);
    plot_button(ui)
}

/// Returns true when Plot was pressed.
fn distribution_form(ui: &mut Ui, form: &mut DistributionForm) -> bool {
    ui.heading("Distribution");
    ui.separator();

    egui::Grid::new("distribution_files")
        .num_columns(3)
        .spacing([8.0, 6.0])
        .show(ui, |ui: &mut Ui| {
            path_row(ui, "File to plot:", &mut form.path);

            ui.label("Number of bins:");
            ui.add(egui::DragValue::new(&mut form.bins).range(1..=5000));
            ui.end_row();
        });

    ui.checkbox(&mut form.save_hist_data, "Save histogram data");
    ui.separator();

    panel_forms(ui, "distribution", &mut form.panels);

    ui.add_space(8.0);
    plot_button(ui)
}

fn path_row(ui: &mut Ui, label: &str, path: &mut String) {
    ui.label(label);
    ui.add(egui::TextEdit::singleline(path).desired_width(220.0));
    if ui.button("Browse").clicked() {
        if let Some(picked) = browse_file() {
            *path = picked;
        }
    }
    ui.end_row();
}

/// Per-subplot limits and options, one collapsible block each.
fn panel_forms(ui: &mut Ui, salt: &str, panels: &mut [PanelForm]) {
    for (i, panel) in panels.iter_mut().enumerate() {
        let header = format!("{} vs {}", panel.columns.0, panel.columns.1);
        egui::CollapsingHeader::new(RichText::new(header).strong())
            .id_salt((salt, i))
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                egui::Grid::new((salt, "panel", i))
                    .num_columns(2)
                    .show(ui, |ui: &mut Ui| {
                        ui.label("xlim:");
                        ui.text_edit_singleline(&mut panel.xlim);
                        ui.end_row();

                        ui.label("ylim:");
                        ui.text_edit_singleline(&mut panel.ylim);
                        ui.end_row();

                        ui.label("Options:")
                            .on_hover_text("key=value, ... with keys range, cmin, norm, cmap, grid");
                        ui.text_edit_singleline(&mut panel.options);
                        ui.end_row();
                    });
            });
    }
}

fn plot_button(ui: &mut Ui) -> bool {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_sized([120.0, 28.0], egui::Button::new("Plot"))
            .clicked()
    })
    .inner
}

// ---------------------------------------------------------------------------
// Error dialog
// ---------------------------------------------------------------------------

pub fn error_dialog(ctx: &egui::Context, state: &mut AppState) {
    let Some(message) = state.error.clone() else {
        return;
    };
    let mut dismissed = false;
    egui::Window::new("Error")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            ui.label(RichText::new(message).color(Color32::RED));
            ui.add_space(6.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
    if dismissed {
        state.error = None;
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn browse_file() -> Option<String> {
    rfd::FileDialog::new()
        .set_title("Open particle file")
        .add_filter("ASCII particle files", &["txt"])
        .add_filter("All files", &["*"])
        .pick_file()
        .map(|p| p.display().to_string())
}
