use std::collections::HashMap;

use super::model::{Column, Dataset, Value};

// ---------------------------------------------------------------------------
// Descriptive statistics per column
// ---------------------------------------------------------------------------

/// One row of the statistics table. Fields that do not apply to the
/// column's kind are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStats {
    pub name: String,
    pub count: usize,
    pub unique: Option<usize>,
    pub top: Option<String>,
    pub freq: Option<usize>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    pub const HEADERS: [&'static str; 12] = [
        "column", "count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%",
        "max",
    ];

    /// Cells in the order of [`ColumnStats::HEADERS`]; missing values render empty.
    pub fn cells(&self) -> Vec<String> {
        fn num(v: Option<f64>) -> String {
            v.map(|x| format!("{x:.4}")).unwrap_or_default()
        }
        fn int(v: Option<usize>) -> String {
            v.map(|x| x.to_string()).unwrap_or_default()
        }
        vec![
            self.name.clone(),
            self.count.to_string(),
            int(self.unique),
            self.top.clone().unwrap_or_default(),
            int(self.freq),
            num(self.mean),
            num(self.std),
            num(self.min),
            num(self.q25),
            num(self.median),
            num(self.q75),
            num(self.max),
        ]
    }
}

/// Summarise every column of the dataset.
pub fn describe(dataset: &Dataset) -> Vec<ColumnStats> {
    dataset.columns().iter().map(describe_column).collect()
}

fn describe_column(col: &Column) -> ColumnStats {
    let present: Vec<&Value> = col.values.iter().filter(|v| !v.is_null()).collect();
    let mut stats = ColumnStats {
        name: col.name.clone(),
        count: present.len(),
        ..Default::default()
    };

    if col.is_numeric() {
        let mut values: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
        values.sort_by(f64::total_cmp);
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        stats.mean = Some(mean);
        stats.std = (values.len() > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });
        stats.min = values.first().copied();
        stats.q25 = quantile(&values, 0.25);
        stats.median = quantile(&values, 0.5);
        stats.q75 = quantile(&values, 0.75);
        stats.max = values.last().copied();
    } else if !present.is_empty() {
        // Ties resolve to the value seen first.
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        for v in &present {
            let key = v.to_string();
            let c = counts.entry(key.clone()).or_insert(0);
            if *c == 0 {
                order.push(key);
            }
            *c += 1;
        }
        let mut top: Option<(&String, usize)> = None;
        for key in &order {
            let c = counts[key];
            if top.map_or(true, |(_, best)| c > best) {
                top = Some((key, c));
            }
        }
        stats.unique = Some(order.len());
        stats.top = top.map(|(k, _)| k.clone());
        stats.freq = top.map(|(_, c)| c);
    }

    stats
}

/// Quantile of sorted data with linear interpolation between closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
