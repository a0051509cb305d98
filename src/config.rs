use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::{named_color, Scheme, LIGHT_GRAY};
use crate::data::bin::BinSpec;
use crate::selection::EmptyPolicy;

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Data file names, relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    /// `id,x,y` 2-D projection of the job embeddings.
    pub embeddings_2d: String,
    /// Full feature table keyed by `id`.
    pub embeddings_full: String,
    /// Per-state aggregates keyed by `fips_int`.
    pub state_aggregates: String,
    /// Cleaned postings carrying `fips_int` and `industry`.
    pub clean_posts: String,
    /// UMAP projection with display fields.
    pub umap: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            embeddings_2d: "data_science_job_posts_2025_embeddings_2d.csv".into(),
            embeddings_full: "data_science_job_posts_2025_embeddings_full.csv".into(),
            state_aggregates: "v1_state_agg.csv".into(),
            clean_posts: "data_science_job_posts_2025_clean.csv".into(),
            umap: "embeddings_umap_2d.csv".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub maxbins: usize,
    /// Fixed `[min, max]`; rows outside it are filtered out first.
    pub extent: Option<[f64; 2]>,
}

impl HistogramConfig {
    pub fn bin_spec(&self) -> BinSpec {
        let spec = BinSpec::new(self.maxbins);
        match self.extent {
            Some([min, max]) => spec.with_extent(min, max),
            None => spec,
        }
    }
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            maxbins: 20,
            extent: None,
        }
    }
}

/// Everything the dashboard reads at startup.  Every field has a default,
/// so a partial JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub files: DataFiles,
    pub scaled_salary_histogram: HistogramConfig,
    pub salary_histogram: HistogramConfig,
    /// What the industry chart shows before a state is picked.
    pub industry_empty: EmptyPolicy,
    /// What the UMAP scatter shows while no brush is drawn.
    pub umap_empty: EmptyPolicy,
    /// Colour of points outside the brush.
    pub fallback_color: String,
    pub seniority_scheme: Scheme,
    pub experience_scheme: Scheme,
    pub work_type_scheme: Scheme,
    pub region_scheme: Scheme,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            files: DataFiles::default(),
            scaled_salary_histogram: HistogramConfig {
                maxbins: 20,
                extent: Some([0.0, 0.1]),
            },
            salary_histogram: HistogramConfig {
                maxbins: 25,
                extent: None,
            },
            industry_empty: EmptyPolicy::None,
            umap_empty: EmptyPolicy::All,
            fallback_color: "lightgray".into(),
            seniority_scheme: Scheme::Category10,
            experience_scheme: Scheme::Tableau10,
            work_type_scheme: Scheme::Category20,
            region_scheme: Scheme::Set2,
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Full path of a data file.
    pub fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Falls back to light gray for unknown colour names.
    pub fn fallback_color(&self) -> eframe::egui::Color32 {
        named_color(&self.fallback_color).unwrap_or_else(|| {
            log::warn!("unknown fallback colour '{}', using lightgray", self.fallback_color);
            LIGHT_GRAY
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_layout() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.industry_empty, EmptyPolicy::None);
        assert_eq!(cfg.umap_empty, EmptyPolicy::All);
        assert_eq!(cfg.scaled_salary_histogram.bin_spec().extent, Some((0.0, 0.1)));
        assert_eq!(cfg.salary_histogram.bin_spec().maxbins, 25);
        assert_eq!(cfg.fallback_color(), LIGHT_GRAY);
        assert_eq!(cfg.path("v1_state_agg.csv"), PathBuf::from("data/v1_state_agg.csv"));
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg = DashboardConfig::from_json(
            r#"{ "data_dir": "/srv/jobs", "industry_empty": "all", "files": { "umap": "u.csv" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/srv/jobs"));
        assert_eq!(cfg.industry_empty, EmptyPolicy::All);
        assert_eq!(cfg.files.umap, "u.csv");
        assert_eq!(cfg.files.state_aggregates, "v1_state_agg.csv");
        assert_eq!(cfg.umap_empty, EmptyPolicy::All);
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        assert!(DashboardConfig::from_json(r#"{ "region_scheme": "viridis" }"#).is_err());
    }
}
