use eframe::egui::{self, Color32, RichText, Ui};

use crate::state::{AppState, ViewKind};

// ---------------------------------------------------------------------------
// Left side panel – view list
// ---------------------------------------------------------------------------

/// Render the left panel listing every chart.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Views");
    ui.separator();

    for kind in ViewKind::ALL {
        let available = state
            .dashboard
            .as_ref()
            .is_some_and(|d| view_loaded(d, kind));
        let mut text = RichText::new(kind.title());
        if !available {
            text = text.color(Color32::GRAY);
        }
        if ui
            .selectable_label(state.active_view == kind, text)
            .clicked()
        {
            state.active_view = kind;
        }
    }

    ui.separator();
    ui.small(format!("Data: {}", state.config.data_dir.display()));
}

fn view_loaded(dash: &crate::dashboard::Dashboard, kind: ViewKind) -> bool {
    match kind {
        ViewKind::Embedding => dash.embedding.is_some(),
        ViewKind::ScaledSalary => dash.scaled_salary.is_some(),
        ViewKind::StateIndustries => dash.state_industries.is_some(),
        ViewKind::Umap => dash.umap.is_some(),
        ViewKind::SalaryDistribution => dash.salary.is_some(),
        ViewKind::ExperienceLevels => dash.experience.is_some(),
        ViewKind::WorkTypes => dash.work_type.is_some(),
        ViewKind::Regions => dash.region.is_some(),
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        let mut clear_selection = false;
        if let Some(pair) = state
            .dashboard
            .as_ref()
            .and_then(|d| d.state_industries.as_ref())
        {
            let selected = pair
                .selected()
                .and_then(|id| pair.map().find(id))
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "none".into());
            ui.label(format!("Selected state: {selected}"));
            clear_selection = pair.selected().is_some() && ui.small_button("Clear").clicked();
        }
        if clear_selection {
            if let Some(pair) = state
                .dashboard
                .as_mut()
                .and_then(|d| d.state_industries.as_mut())
            {
                pair.clear();
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open dashboard data folder")
        .set_directory(&state.config.data_dir)
        .pick_folder();

    if let Some(path) = folder {
        log::info!("Switching data folder to {}", path.display());
        state.set_data_dir(path);
    }
}
