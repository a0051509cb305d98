use anyhow::{Context, Result};

use crate::config::DashboardConfig;
use crate::data::loader::load_file;
use crate::data::model::Table;
use crate::views::brush::BrushScatter;
use crate::views::charts::{
    CategoryDistribution, EmbeddingScatter, Histogram, SALARY, SALARY_MID_SCALED,
};
use crate::views::linked::LinkedRegionPair;

// ---------------------------------------------------------------------------
// All views of the dashboard
// ---------------------------------------------------------------------------

/// Every chart, each built from its own data files.  A view whose inputs
/// failed to load is `None`; its error is kept in `errors`.
#[derive(Default)]
pub struct Dashboard {
    pub embedding: Option<EmbeddingScatter>,
    pub scaled_salary: Option<Histogram>,
    pub state_industries: Option<LinkedRegionPair>,
    pub umap: Option<BrushScatter>,
    pub salary: Option<Histogram>,
    pub experience: Option<CategoryDistribution>,
    pub work_type: Option<CategoryDistribution>,
    pub region: Option<CategoryDistribution>,
    pub errors: Vec<String>,
}

impl Dashboard {
    pub fn load(config: &DashboardConfig) -> Self {
        let mut dash = Dashboard::default();
        let files = &config.files;

        let embeddings_2d = dash.table(config, &files.embeddings_2d);
        let embeddings_full = dash.table(config, &files.embeddings_full);
        let state_agg = dash.table(config, &files.state_aggregates);
        let clean_posts = dash.table(config, &files.clean_posts);
        let umap = dash.table(config, &files.umap);

        if let (Some(points), Some(full)) = (&embeddings_2d, &embeddings_full) {
            dash.embedding = dash.view("embedding scatter", || {
                Ok(EmbeddingScatter::build(points, full, config.seniority_scheme)?)
            });
        }

        if let Some(full) = &embeddings_full {
            dash.scaled_salary = dash.view("scaled salary histogram", || {
                let spec = config.scaled_salary_histogram.bin_spec();
                Ok(Histogram::build(full, SALARY_MID_SCALED, spec)?.shaded_by_count())
            });
        }

        if let (Some(agg), Some(posts)) = (&state_agg, clean_posts) {
            dash.state_industries = dash.view("state map", || {
                Ok(LinkedRegionPair::new(agg, posts, config.industry_empty)?)
            });
        }

        if let Some(umap) = umap {
            dash.salary = dash.view("salary distribution", || {
                Ok(Histogram::build(&umap, SALARY, config.salary_histogram.bin_spec())?)
            });
            dash.experience = dash.view("experience levels", || {
                Ok(CategoryDistribution::build(&umap, "experience_level", config.experience_scheme)?)
            });
            dash.work_type = dash.view("work types", || {
                Ok(CategoryDistribution::build(&umap, "work_type", config.work_type_scheme)?)
            });
            dash.region = dash.view("regions", || {
                Ok(CategoryDistribution::build(&umap, "region", config.region_scheme)?)
            });
            dash.umap = dash.view("UMAP scatter", || {
                Ok(BrushScatter::new(
                    umap,
                    config.experience_scheme,
                    config.fallback_color(),
                    config.umap_empty,
                )?)
            });
        }

        dash
    }

    fn table(&mut self, config: &DashboardConfig, file: &str) -> Option<Table> {
        let path = config.path(file);
        match load_file(&path) {
            Ok(table) => Some(table),
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.errors.push(format!("{e:#}"));
                None
            }
        }
    }

    fn view<T>(&mut self, name: &str, build: impl FnOnce() -> Result<T>) -> Option<T> {
        match build().with_context(|| format!("building {name}")) {
            Ok(view) => Some(view),
            Err(e) => {
                log::error!("{e:#}");
                self.errors.push(format!("{e:#}"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::DataFiles;
    use crate::data::model::Value;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("jobviz-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn one_missing_group_leaves_the_others_working() {
        let dir = scratch_dir("partial");
        let files = DataFiles::default();
        std::fs::write(
            dir.join(&files.state_aggregates),
            "fips_int,state,median_salary,n_jobs
6,California,150000,2
36,New York,140000,1
",
        )
        .unwrap();
        std::fs::write(
            dir.join(&files.clean_posts),
            "id,fips_int,state,industry,salary
             1,6,California,Tech,150000
             2,6,California,Finance,120000
             3,36,New York,Tech,140000
",
        )
        .unwrap();

        let config = DashboardConfig {
            data_dir: dir.clone(),
            ..DashboardConfig::default()
        };
        let mut dash = Dashboard::load(&config);

        assert_eq!(dash.errors.len(), 3);
        assert!(dash.embedding.is_none());
        assert!(dash.scaled_salary.is_none());
        assert!(dash.umap.is_none());
        assert!(dash.salary.is_none());

        let pair = dash.state_industries.as_mut().unwrap();
        assert!(pair.visible_secondary_rows().is_empty());
        pair.select(Value::Integer(6));
        let rows = pair.visible_secondary_rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.value("state") == &Value::from("California")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_folder_reports_every_file() {
        let config = DashboardConfig {
            data_dir: PathBuf::from("/nonexistent/jobviz-data"),
            ..DashboardConfig::default()
        };
        let dash = Dashboard::load(&config);
        assert_eq!(dash.errors.len(), 5);
        assert!(dash.embedding.is_none());
        assert!(dash.state_industries.is_none());
        assert!(dash.umap.is_none());
    }
}
