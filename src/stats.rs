use serde::Serialize;

/// Mean, sample standard deviation and standard error of a group.
///
/// `mean` is undefined for an empty group; `sd` and `sem` are undefined
/// below two values. Undefined statistics stay `None` instead of NaN so
/// callers can render them as missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub n: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub sd: Option<f64>,
    pub sem: Option<f64>,
}

impl Summary {
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = values.into_iter().collect();
        let n = values.len();
        let sum = values.iter().sum::<f64>();
        if n == 0 {
            return Self::empty();
        }

        let mean = sum / n as f64;
        let sd = (n >= 2).then(|| {
            let variance = values
                .iter()
                .map(|&x| {
                    let diff = x - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (n - 1) as f64;
            variance.sqrt()
        });
        let sem = sd.map(|sd| sd / (n as f64).sqrt());

        Self {
            n,
            sum,
            mean: Some(mean),
            sd,
            sem,
        }
    }

    pub fn empty() -> Self {
        Self {
            n: 0,
            sum: 0.0,
            mean: None,
            sd: None,
            sem: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.n > 0
    }
}

/// Mean of the values, `None` when there are none.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), x| (sum + x, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Median of the values, `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
