use std::path::PathBuf;

use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The dashboard's charts, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Embedding,
    ScaledSalary,
    StateIndustries,
    Umap,
    SalaryDistribution,
    ExperienceLevels,
    WorkTypes,
    Regions,
}

impl ViewKind {
    pub const ALL: [ViewKind; 8] = [
        ViewKind::Embedding,
        ViewKind::ScaledSalary,
        ViewKind::StateIndustries,
        ViewKind::Umap,
        ViewKind::SalaryDistribution,
        ViewKind::ExperienceLevels,
        ViewKind::WorkTypes,
        ViewKind::Regions,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ViewKind::Embedding => "Job Embedding Space by Seniority",
            ViewKind::ScaledSalary => "Histogram Scaled Salaries",
            ViewKind::StateIndustries => "Median Salary by State",
            ViewKind::Umap => "Job Embedding Space (UMAP Projection)",
            ViewKind::SalaryDistribution => "Salary Distribution",
            ViewKind::ExperienceLevels => "Experience Level Distribution",
            ViewKind::WorkTypes => "Work Type Distribution",
            ViewKind::Regions => "Regional Distribution",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded views (None until the data folder has been read).
    pub dashboard: Option<Dashboard>,

    /// Which chart the central panel shows.
    pub active_view: ViewKind,

    /// Data-space corner where the current brush drag started.
    pub brush_origin: Option<[f64; 2]>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = Self {
            config,
            dashboard: None,
            active_view: ViewKind::Embedding,
            brush_origin: None,
            status_message: None,
        };
        state.reload();
        state
    }

    /// (Re)read every data file and rebuild every view.
    pub fn reload(&mut self) {
        let dashboard = Dashboard::load(&self.config);
        self.status_message = match dashboard.errors.len() {
            0 => None,
            1 => Some(format!("Error: {}", dashboard.errors[0])),
            n => Some(format!("{n} errors, first: {}", dashboard.errors[0])),
        };
        log::info!(
            "Dashboard loaded from {} ({} errors)",
            self.config.data_dir.display(),
            dashboard.errors.len()
        );
        self.brush_origin = None;
        self.dashboard = Some(dashboard);
    }

    /// Point the dashboard at another data folder.
    pub fn set_data_dir(&mut self, dir: PathBuf) {
        self.config.data_dir = dir;
        self.reload();
    }
}
