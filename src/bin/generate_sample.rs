//! Writes a small synthetic job-postings data set into `data/` with the
//! five CSV files the dashboard expects.

use std::fs;
use std::path::Path;

const STATES: [(i64, &str); 12] = [
    (6, "California"),
    (8, "Colorado"),
    (12, "Florida"),
    (13, "Georgia"),
    (17, "Illinois"),
    (25, "Massachusetts"),
    (36, "New York"),
    (37, "North Carolina"),
    (41, "Oregon"),
    (48, "Texas"),
    (51, "Virginia"),
    (53, "Washington"),
];

const INDUSTRIES: [&str; 6] = [
    "Technology",
    "Finance",
    "Healthcare",
    "Retail",
    "Manufacturing",
    "Consulting",
];

const TITLES: [&str; 5] = [
    "Data Scientist",
    "Data Analyst",
    "Machine Learning Engineer",
    "Data Engineer",
    "Research Scientist",
];

const EXPERIENCE: [&str; 4] = ["Entry", "Mid", "Senior", "Lead"];
const WORK_TYPES: [&str; 3] = ["Remote", "Hybrid", "On-site"];
const REGIONS: [&str; 4] = ["West", "Midwest", "South", "Northeast"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// One synthetic posting; every output file is a projection of these.
struct Posting {
    id: i64,
    title: &'static str,
    seniority: usize,
    work_type: usize,
    state: (i64, &'static str),
    industry: &'static str,
    salary: f64,
    post_age: f64,
    engagement: f64,
}

fn writer(dir: &Path, name: &str) -> csv::Writer<fs::File> {
    let path = dir.join(name);
    csv::Writer::from_path(&path)
        .unwrap_or_else(|e| panic!("Failed to create {}: {e}", path.display()))
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let n_posts = 600;

    let posts: Vec<Posting> = (0..n_posts)
        .map(|id| {
            let seniority = (rng.next_u64() % EXPERIENCE.len() as u64) as usize;
            let base = 70_000.0 + 25_000.0 * seniority as f64;
            Posting {
                id,
                title: *rng.pick(&TITLES),
                seniority,
                work_type: (rng.next_u64() % WORK_TYPES.len() as u64) as usize,
                state: *rng.pick(&STATES),
                industry: *rng.pick(&INDUSTRIES),
                salary: rng.gauss(base, 18_000.0).max(35_000.0),
                post_age: rng.next_f64(),
                engagement: (rng.gauss(4.0, 1.5)).clamp(0.0, 12.0),
            }
        })
        .collect();

    let dir = Path::new("data");
    fs::create_dir_all(dir).expect("Failed to create data directory");

    let max_salary = posts.iter().map(|p| p.salary).fold(0.0_f64, f64::max);

    // ---- 2-D embedding: clusters by seniority ----
    let mut w = writer(dir, "data_science_job_posts_2025_embeddings_2d.csv");
    w.write_record(["id", "x", "y"]).expect("write header");
    for p in &posts {
        let angle = p.seniority as f64 * std::f64::consts::FRAC_PI_2;
        let x = 4.0 * angle.cos() + rng.gauss(0.0, 1.0);
        let y = 4.0 * angle.sin() + rng.gauss(0.0, 1.0);
        w.write_record([p.id.to_string(), format!("{x:.4}"), format!("{y:.4}")])
            .expect("write row");
    }
    w.flush().expect("flush");

    // ---- Full features ----
    let mut w = writer(dir, "data_science_job_posts_2025_embeddings_full.csv");
    w.write_record([
        "id",
        "salary_mid_scaled",
        "seniority_level_num",
        "status_clean",
        "status_hybrid",
        "status_on_site",
        "status_remote",
        "post_age_scaled",
    ])
    .expect("write header");
    for p in &posts {
        let flag = |i: usize| if p.work_type == i { "1" } else { "0" };
        // salary scaled so the bulk lands in [0, 0.1]
        let scaled = p.salary / max_salary * 0.1;
        w.write_record([
            p.id.to_string(),
            format!("{scaled:.5}"),
            p.seniority.to_string(),
            WORK_TYPES[p.work_type].to_lowercase(),
            flag(1).to_string(),
            flag(2).to_string(),
            flag(0).to_string(),
            format!("{:.4}", p.post_age),
        ])
        .expect("write row");
    }
    w.flush().expect("flush");

    // ---- Per-state aggregates ----
    let mut w = writer(dir, "v1_state_agg.csv");
    w.write_record(["fips_int", "state", "median_salary", "n_jobs"])
        .expect("write header");
    for (fips, name) in STATES {
        let mut salaries: Vec<f64> = posts
            .iter()
            .filter(|p| p.state.0 == fips)
            .map(|p| p.salary)
            .collect();
        salaries.sort_by(|a, b| a.total_cmp(b));
        let median = salaries.get(salaries.len() / 2).copied().unwrap_or(0.0);
        w.write_record([
            fips.to_string(),
            name.to_string(),
            format!("{median:.0}"),
            salaries.len().to_string(),
        ])
        .expect("write row");
    }
    w.flush().expect("flush");

    // ---- Cleaned postings ----
    let mut w = writer(dir, "data_science_job_posts_2025_clean.csv");
    w.write_record(["id", "fips_int", "state", "industry", "salary"])
        .expect("write header");
    for p in &posts {
        w.write_record([
            p.id.to_string(),
            p.state.0.to_string(),
            p.state.1.to_string(),
            p.industry.to_string(),
            format!("{:.0}", p.salary),
        ])
        .expect("write row");
    }
    w.flush().expect("flush");

    // ---- UMAP projection ----
    let mut w = writer(dir, "embeddings_umap_2d.csv");
    w.write_record([
        "umap_x",
        "umap_y",
        "title",
        "salary",
        "experience_level",
        "work_type",
        "state",
        "region",
        "engagement_rate",
    ])
    .expect("write header");
    for p in &posts {
        let ux = 2.5 * p.seniority as f64 + rng.gauss(0.0, 0.8);
        let uy = 2.0 * p.work_type as f64 + rng.gauss(0.0, 0.8);
        w.write_record([
            format!("{ux:.4}"),
            format!("{uy:.4}"),
            p.title.to_string(),
            format!("{:.0}", p.salary),
            EXPERIENCE[p.seniority].to_string(),
            WORK_TYPES[p.work_type].to_string(),
            p.state.1.to_string(),
            REGIONS[(p.state.0 as usize) % REGIONS.len()].to_string(),
            format!("{:.2}", p.engagement),
        ])
        .expect("write row");
    }
    w.flush().expect("flush");

    println!("Wrote {n_posts} postings across 5 files to {}", dir.display());
}
