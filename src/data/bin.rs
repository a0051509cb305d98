use super::TransformError;

// ---------------------------------------------------------------------------
// Bin parameters
// ---------------------------------------------------------------------------

const BASE: f64 = 10.0;
const DIVIDE: [f64; 2] = [5.0, 2.0];
const EPSILON: f64 = 1.0e-14;
// Slack when dividing a span by a step that is itself a rounded decimal.
const STEP_SLACK: f64 = 1.0e-9;

/// How a numeric field is cut into buckets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSpec {
    /// Upper bound on the number of buckets.
    pub maxbins: usize,
    /// Fixed extent; `None` means "extent of the data".
    pub extent: Option<(f64, f64)>,
    /// Round start/stop outwards to multiples of the step.
    pub nice: bool,
}

impl BinSpec {
    pub fn new(maxbins: usize) -> Self {
        Self {
            maxbins,
            extent: None,
            nice: true,
        }
    }

    pub fn with_extent(mut self, min: f64, max: f64) -> Self {
        self.extent = Some((min, max));
        self
    }
}

/// Solved bucket layout: `n` buckets of width `step` from `start` to `stop`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinParams {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
    pub n: usize,
}

/// Pick a readable step size (1, 2 or 5 times a power of ten) giving at most
/// `maxbins` buckets over `[min, max]`.
pub fn solve(min: f64, max: f64, maxbins: usize, nice: bool) -> Result<BinParams, TransformError> {
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(TransformError::InvalidExtent { min, max });
    }
    if maxbins == 0 {
        return Err(TransformError::InvalidMaxbins);
    }
    let maxbins = maxbins as f64;

    let span = if (max - min).abs() > f64::EPSILON {
        max - min
    } else if min.abs() > f64::EPSILON {
        min.abs()
    } else {
        1.0
    };

    let logb = BASE.ln();
    let level = (maxbins.ln() / logb).ceil();
    let mut step = BASE.powf((span.ln() / logb).round() - level);

    // increase step size if too many bins
    while (span / step).ceil() > maxbins {
        step *= BASE;
    }

    // decrease step size if allowed
    for div in DIVIDE {
        let v = step / div;
        if span / v <= maxbins {
            step = v;
        }
    }

    let v = step.ln();
    let precision = if v >= 0.0 { 0.0 } else { (-v / logb).floor() + 1.0 };
    let eps = BASE.powf(-precision - 1.0);
    let (min, max) = if nice {
        let v = (min / step + eps).floor() * step;
        let min = if min < v { v - step } else { v };
        let max = (max / step - STEP_SLACK).ceil() * step;
        (min, max)
    } else {
        (min, max)
    };

    let start = min;
    let stop = if (max - min).abs() > f64::EPSILON {
        max
    } else {
        min + step
    };

    Ok(BinParams {
        start,
        stop,
        step,
        n: ((stop - start) / step - STEP_SLACK).ceil().max(1.0) as usize,
    })
}

impl BinParams {
    /// Bucket index of `value`, or `None` if it lies outside `[start, stop]`.
    /// A value equal to `stop` belongs to the last bucket.
    pub fn index_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() || value < self.start - EPSILON || value > self.stop + EPSILON {
            return None;
        }
        let idx = ((value - self.start) / self.step + EPSILON).floor();
        let idx = if idx < 0.0 { 0 } else { idx as usize };
        Some(idx.min(self.n - 1))
    }

    /// Lower and upper bound of bucket `i`.
    pub fn bounds(&self, i: usize) -> (f64, f64) {
        let lo = self.start + self.step * i as f64;
        (lo, lo + self.step)
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// One histogram bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

/// Bin `values` according to `spec`.  Empty input with no fixed extent
/// yields no buckets.
pub fn histogram(values: &[f64], spec: &BinSpec) -> Result<(BinParams, Vec<Bucket>), TransformError> {
    let (min, max) = match spec.extent {
        Some(extent) => extent,
        None => match data_extent(values) {
            Some(extent) => extent,
            None => return Ok((BinParams { start: 0.0, stop: 0.0, step: 1.0, n: 0 }, Vec::new())),
        },
    };
    let params = solve(min, max, spec.maxbins, spec.nice)?;

    let mut buckets: Vec<Bucket> = (0..params.n)
        .map(|i| {
            let (lo, hi) = params.bounds(i);
            Bucket { lo, hi, count: 0 }
        })
        .collect();
    for &v in values {
        if let Some(i) = params.index_of(v) {
            buckets[i].count += 1;
        }
    }
    Ok((params, buckets))
}

fn data_extent(values: &[f64]) -> Option<(f64, f64)> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    finite.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
