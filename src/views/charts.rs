use eframe::egui::Color32;

use crate::color::{CategoricalScale, Scheme, SequentialScale, STEEL_BLUE};
use crate::data::bin::{self, BinSpec, Bucket};
use crate::data::model::{Record, Table, Value};
use crate::data::transform::{Aggregate, AggregateOp, Calculate, Filter, Lookup, Pipeline, Transform};
use crate::data::TransformError;

// ---------------------------------------------------------------------------
// Status label
// ---------------------------------------------------------------------------

/// Fields copied from the full-feature file onto each 2-D point.
pub const ENRICHMENT_FIELDS: [&str; 7] = [
    "salary_mid_scaled",
    "seniority_level_num",
    "status_clean",
    "status_hybrid",
    "status_on_site",
    "status_remote",
    "post_age_scaled",
];

pub const SENIORITY: &str = "seniority_level_num";
pub const STATUS_LABEL: &str = "status_label";
pub const SALARY: &str = "salary";
pub const SALARY_MID_SCALED: &str = "salary_mid_scaled";

/// Work arrangement from the three 0/1 indicator columns.  When several
/// flags are set, remote wins over hybrid, which wins over on-site.
pub fn status_label(record: &Record) -> &'static str {
    if record.value("status_remote").is_flag_set() {
        "remote"
    } else if record.value("status_hybrid").is_flag_set() {
        "hybrid"
    } else if record.value("status_on_site").is_flag_set() {
        "on-site"
    } else {
        "unknown"
    }
}

// ---------------------------------------------------------------------------
// Embedding scatter (seniority / status)
// ---------------------------------------------------------------------------

/// 2-D embedding points enriched with the full feature row of each job.
pub struct EmbeddingScatter {
    pub points: Table,
    pub scale: CategoricalScale,
}

impl EmbeddingScatter {
    /// `points` carries `id,x,y`; `full` is the feature table keyed by `id`.
    /// Points whose id has no feature row are kept with null enrichment.
    pub fn build(points: &Table, full: &Table, scheme: Scheme) -> Result<Self, TransformError> {
        for field in ["id", "x", "y"] {
            if !points.has_column(field) {
                return Err(TransformError::MissingField {
                    field: field.into(),
                    table: "2-D embeddings",
                });
            }
        }

        let pipeline = Pipeline::new()
            .then(Lookup::new("id", full, "id", &ENRICHMENT_FIELDS)?)
            .then(Calculate::new(STATUS_LABEL, |r| Value::from(status_label(r))));
        let points = pipeline.apply(points)?;

        let domain = points.unique_values.get(SENIORITY).cloned().unwrap_or_default();
        let scale = CategoricalScale::new(SENIORITY, &domain, scheme);
        Ok(Self { points, scale })
    }

    pub fn color_of(&self, record: &Record) -> Color32 {
        self.scale.color_for(record.value(SENIORITY))
    }

    /// Points grouped by status label, so each group can get its own marker.
    pub fn by_status(&self) -> Vec<(String, Vec<&Record>)> {
        ["remote", "hybrid", "on-site", "unknown"]
            .into_iter()
            .map(|label| {
                let rows = self
                    .points
                    .records
                    .iter()
                    .filter(|r| r.value(STATUS_LABEL) == &Value::from(label))
                    .collect();
                (label.to_string(), rows)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Count of rows per bucket of a numeric field.
#[derive(Debug, Clone)]
pub struct Histogram {
    pub field: String,
    pub buckets: Vec<Bucket>,
    /// Colours bars by count, when set; otherwise every bar is `color`.
    pub count_scale: Option<SequentialScale>,
    pub color: Color32,
}

impl Histogram {
    /// Rows outside a fixed extent are filtered out before binning.
    pub fn build(table: &Table, field: &str, spec: BinSpec) -> Result<Self, TransformError> {
        if !table.is_empty() && !table.has_column(field) {
            return Err(TransformError::MissingField {
                field: field.to_string(),
                table: "histogram input",
            });
        }
        let mut pipeline = Pipeline::new();
        if let Some((min, max)) = spec.extent {
            pipeline = pipeline.then(Filter::range(field, min, max));
        }
        let rows = pipeline.apply(table)?;
        let (_, buckets) = bin::histogram(&rows.numeric_column(field), &spec)?;
        Ok(Self {
            field: field.to_string(),
            buckets,
            count_scale: None,
            color: STEEL_BLUE,
        })
    }

    /// Colour each bar on the blues ramp by its count.
    pub fn shaded_by_count(mut self) -> Self {
        self.count_scale = Some(SequentialScale::blues_over(
            self.buckets.iter().map(|b| b.count as f64),
        ));
        self
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn bar_color(&self, bucket: &Bucket) -> Color32 {
        match &self.count_scale {
            Some(scale) => scale.color_for(bucket.count as f64),
            None => self.color,
        }
    }
}

// ---------------------------------------------------------------------------
// Category distribution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBar {
    pub label: Value,
    pub count: usize,
    /// Mean salary in the category; `None` if no row has a salary.
    pub mean_salary: Option<f64>,
    pub color: Color32,
}

/// Rows counted per category, largest first, with the mean salary of each.
#[derive(Debug, Clone)]
pub struct CategoryDistribution {
    pub field: String,
    pub bars: Vec<CategoryBar>,
}

impl CategoryDistribution {
    pub fn build(table: &Table, field: &str, scheme: Scheme) -> Result<Self, TransformError> {
        if !table.has_column(field) {
            return Err(TransformError::MissingField {
                field: field.to_string(),
                table: "distribution input",
            });
        }
        let domain = table.unique_values.get(field).cloned().unwrap_or_default();
        let scale = CategoricalScale::new(field, &domain, scheme);

        let mean_field = AggregateOp::Mean(SALARY.into());
        let grouped = Aggregate::new(&[field], vec![AggregateOp::Count, mean_field.clone()])
            .apply(table)?;
        let bars = grouped
            .records
            .iter()
            .map(|r| {
                let label = r.value(field).clone();
                CategoryBar {
                    color: scale.color_for(&label),
                    count: r.get_f64("count").unwrap_or(0.0) as usize,
                    mean_salary: r.get_f64(&mean_field.output_name()),
                    label,
                }
            })
            .collect();
        Ok(Self {
            field: field.to_string(),
            bars,
        })
    }
}

// ---------------------------------------------------------------------------
// Tooltip formatting
// ---------------------------------------------------------------------------

/// Hover text for one embedding point.
pub fn embedding_tooltip(record: &Record) -> String {
    let text = |field: &str| {
        let v = record.value(field);
        if v.is_null() {
            "–".to_string()
        } else {
            v.to_string()
        }
    };
    format!(
        "Job ID: {}\nStatus: {}\nSeniority Level: {}\nScaled Mid Salary: {}\nPost Age (scaled): {}",
        text("id"),
        text(STATUS_LABEL),
        text(SENIORITY),
        text(SALARY_MID_SCALED),
        text("post_age_scaled"),
    )
}

/// `$123,457` style, rounded to whole units.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    #[test]
    fn status_precedence_is_remote_hybrid_onsite() {
        let rec = |r: i64, h: i64, o: i64| {
            Record::new()
                .with("status_remote", r)
                .with("status_hybrid", h)
                .with("status_on_site", o)
        };
        assert_eq!(status_label(&rec(1, 1, 1)), "remote");
        assert_eq!(status_label(&rec(0, 1, 1)), "hybrid");
        assert_eq!(status_label(&rec(0, 0, 1)), "on-site");
        assert_eq!(status_label(&rec(0, 0, 0)), "unknown");
        assert_eq!(status_label(&Record::new()), "unknown");
    }

    fn embedding_inputs() -> (Table, Table) {
        let points = read_csv("id,x,y\n1,0.1,0.2\n2,0.3,0.4\n3,0.5,0.6\n".as_bytes()).unwrap();
        let full = read_csv(
            "id,salary_mid_scaled,seniority_level_num,status_clean,status_hybrid,status_on_site,status_remote,post_age_scaled\n\
             1,0.04,2,remote,0,0,1,0.3\n\
             2,0.06,3,hybrid,1,1,0,0.1\n"
                .as_bytes(),
        )
        .unwrap();
        (points, full)
    }

    #[test]
    fn embedding_keeps_points_without_features() {
        let (points, full) = embedding_inputs();
        let scatter = EmbeddingScatter::build(&points, &full, Scheme::Category10).unwrap();

        assert_eq!(scatter.points.len(), 3);
        let orphan = &scatter.points.records[2];
        assert!(orphan.value(SENIORITY).is_null());
        assert_eq!(orphan.value(STATUS_LABEL), &Value::from("unknown"));

        let labels: Vec<_> = scatter
            .points
            .records
            .iter()
            .map(|r| r.value(STATUS_LABEL).to_string())
            .collect();
        assert_eq!(labels, vec!["remote", "hybrid", "unknown"]);
    }

    #[test]
    fn embedding_tooltip_lists_job_fields() {
        let (points, full) = embedding_inputs();
        let scatter = EmbeddingScatter::build(&points, &full, Scheme::Category10).unwrap();

        let text = embedding_tooltip(&scatter.points.records[0]);
        assert_eq!(
            text,
            "Job ID: 1\nStatus: remote\nSeniority Level: 2\nScaled Mid Salary: 0.04\nPost Age (scaled): 0.3"
        );

        let orphan = embedding_tooltip(&scatter.points.records[2]);
        assert!(orphan.contains("Job ID: 3"));
        assert!(orphan.contains("Status: unknown"));
        assert!(orphan.contains("Seniority Level: –"));
    }

    #[test]
    fn embedding_groups_cover_every_point() {
        let (points, full) = embedding_inputs();
        let scatter = EmbeddingScatter::build(&points, &full, Scheme::Category10).unwrap();
        let total: usize = scatter.by_status().iter().map(|(_, rows)| rows.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn scaled_salary_histogram_counts_rows_in_extent() {
        let table = read_csv(
            "salary_mid_scaled\n0.0\n0.004\n0.05\n0.1\n0.2\n-0.01\n\n".as_bytes(),
        )
        .unwrap();
        let hist = Histogram::build(&table, SALARY_MID_SCALED, BinSpec::new(20).with_extent(0.0, 0.1))
            .unwrap()
            .shaded_by_count();
        assert_eq!(hist.buckets.len(), 20);
        assert_eq!(hist.total(), 4);
        assert_eq!(hist.buckets[0].count, 2);
        assert_eq!(hist.buckets[19].count, 1);
        let busiest = hist.bar_color(&hist.buckets[0]);
        let idle = hist.bar_color(&hist.buckets[5]);
        assert!(busiest.r() < idle.r());
    }

    #[test]
    fn salary_histogram_uses_data_extent() {
        let table = read_csv("salary\n41250\n90000\n198300\n\n".as_bytes()).unwrap();
        let hist = Histogram::build(&table, SALARY, BinSpec::new(25)).unwrap();
        assert_eq!(hist.total(), 3);
        assert_eq!(hist.buckets.first().unwrap().lo, 40_000.0);
        assert_eq!(hist.bar_color(&hist.buckets[0]), STEEL_BLUE);
    }

    #[test]
    fn distribution_sorted_with_mean_salary() {
        let table = read_csv(
            "work_type,salary\nRemote,100\nOnsite,50\nRemote,200\nHybrid,\n".as_bytes(),
        )
        .unwrap();
        let dist = CategoryDistribution::build(&table, "work_type", Scheme::Category20).unwrap();

        assert_eq!(dist.bars[0].label, Value::from("Remote"));
        assert_eq!(dist.bars[0].count, 2);
        assert_eq!(dist.bars[0].mean_salary, Some(150.0));
        let hybrid = dist.bars.iter().find(|b| b.label == Value::from("Hybrid")).unwrap();
        assert_eq!(hybrid.mean_salary, None);
        assert_ne!(dist.bars[0].color, dist.bars[1].color);
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(1234567.4), "$1,234,567");
        assert_eq!(format_currency(999.5), "$1,000");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(-4200.0), "-$4,200");
    }
}
