use std::sync::Arc;

use anyhow::Result;
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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
}

struct Row {
    region: String,
    month: i64,
    year: i64,
    units: i64,
    price: f64,
    revenue: f64,
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    // (region, base units per month, base unit price)
    let regions = [
        ("North", 120.0, 19.5),
        ("South", 90.0, 21.0),
        ("East", 150.0, 17.25),
        ("West", 70.0, 24.0),
    ];

    let mut rows = Vec::new();
    for year in [2022_i64, 2023] {
        for &(region, base_units, base_price) in &regions {
            for month in 1..=12_i64 {
                // Mild seasonality peaking mid-year, plus growth in 2023.
                let season = 1.0 + 0.25 * ((month as f64 - 3.0) / 12.0 * std::f64::consts::TAU).sin();
                let growth = if year == 2023 { 1.1 } else { 1.0 };
                let units = (base_units * season * growth + rng.gauss(0.0, 8.0)).max(0.0).round();
                let price = (base_price + rng.gauss(0.0, 0.75)).max(1.0);
                rows.push(Row {
                    region: region.to_string(),
                    month,
                    year,
                    units: units as i64,
                    price: (price * 100.0).round() / 100.0,
                    revenue: (units * price * 100.0).round() / 100.0,
                });
            }
        }
    }
    rows
}

const HEADERS: [&str; 6] = ["Region", "Month", "Year", "Units", "Price", "Revenue"];

fn write_parquet(rows: &[Row], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Utf8, false),
        Field::new(HEADERS[1], DataType::Int64, false),
        Field::new(HEADERS[2], DataType::Int64, false),
        Field::new(HEADERS[3], DataType::Int64, false),
        Field::new(HEADERS[4], DataType::Float64, false),
        Field::new(HEADERS[5], DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.region.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.month).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.year).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.units).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.price).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.revenue).collect::<Vec<_>>())),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADERS)?;
    for r in rows {
        writer.write_record([
            r.region.clone(),
            r.month.to_string(),
            r.year.to_string(),
            r.units.to_string(),
            r.price.to_string(),
            r.revenue.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    write_parquet(&rows, "sample_sales.parquet")?;
    write_csv(&rows, "sample_sales.csv")?;

    println!(
        "Wrote {} rows ({} columns) to sample_sales.parquet and sample_sales.csv",
        rows.len(),
        HEADERS.len()
    );
    Ok(())
}
