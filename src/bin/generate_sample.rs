use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
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

/// One survey row. Rates and salary are text so missing markers can appear.
struct SurveyRow {
    year: i64,
    university: String,
    degree: String,
    employment_rate_overall: String,
    employment_rate_ft_perm: String,
    gross_monthly_median: String,
}

// (name, base employment rate, base salary, yearly salary growth, volatility)
const UNIVERSITIES: [(&str, f64, f64, f64, f64); 4] = [
    ("Northbridge University", 92.0, 3600.0, 120.0, 1.5),
    ("Harbour Institute of Technology", 89.0, 3900.0, 150.0, 3.0),
    ("Lakeside College", 84.0, 3000.0, 60.0, 5.0),
    ("Summit School of Management", 90.0, 4200.0, 90.0, 2.0),
];

const DEGREES: [&str; 4] = ["Accountancy", "Computer Science", "Engineering", "Business"];

const YEARS: std::ops::RangeInclusive<i64> = 2013..=2022;

fn generate(rng: &mut SimpleRng) -> Vec<SurveyRow> {
    let mut rows = Vec::new();
    for &(name, base_rate, base_salary, growth, volatility) in &UNIVERSITIES {
        for year in YEARS {
            let t = (year - YEARS.start()) as f64;
            for (d, degree) in DEGREES.iter().enumerate() {
                let degree_premium = d as f64 * 150.0;
                let overall = (base_rate + rng.gauss(0.0, volatility)).clamp(50.0, 100.0);
                let ft_perm = (overall - 4.0 + rng.gauss(0.0, 1.5)).clamp(40.0, 100.0);
                let salary = base_salary + growth * t + degree_premium + rng.gauss(0.0, 80.0);

                // A few cells carry the "na" marker used in the published extract.
                let blank = rng.next_f64() < 0.03;
                rows.push(SurveyRow {
                    year,
                    university: name.to_string(),
                    degree: degree.to_string(),
                    employment_rate_overall: if blank {
                        "na".to_string()
                    } else {
                        format!("{overall:.1}")
                    },
                    employment_rate_ft_perm: format!("{ft_perm:.1}"),
                    gross_monthly_median: format!("{:.0}", salary.round()),
                });
            }
        }
    }
    rows
}

fn write_csv(rows: &[SurveyRow], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record([
        "year",
        "university",
        "degree",
        "employment_rate_overall",
        "employment_rate_ft_perm",
        "gross_monthly_median",
    ])?;
    for r in rows {
        writer.write_record([
            r.year.to_string().as_str(),
            r.university.as_str(),
            r.degree.as_str(),
            r.employment_rate_overall.as_str(),
            r.employment_rate_ft_perm.as_str(),
            r.gross_monthly_median.as_str(),
        ])?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

/// Parquet gets typed numeric columns; missing markers become nulls.
fn write_parquet(rows: &[SurveyRow], path: &str) -> Result<()> {
    let parse = |s: &str| s.parse::<f64>().ok();

    let schema = Arc::new(Schema::new(vec![
        Field::new("year", DataType::Int64, false),
        Field::new("university", DataType::Utf8, false),
        Field::new("degree", DataType::Utf8, false),
        Field::new("employment_rate_overall", DataType::Float64, true),
        Field::new("employment_rate_ft_perm", DataType::Float64, true),
        Field::new("gross_monthly_median", DataType::Float64, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.year))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.university))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| &r.degree))),
        Arc::new(Float64Array::from_iter(
            rows.iter().map(|r| parse(&r.employment_rate_overall)),
        )),
        Arc::new(Float64Array::from_iter(
            rows.iter().map(|r| parse(&r.employment_rate_ft_perm)),
        )),
        Arc::new(Float64Array::from_iter(
            rows.iter().map(|r| parse(&r.gross_monthly_median)),
        )),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    write_csv(&rows, "sample_survey.csv")?;
    write_parquet(&rows, "sample_survey.parquet")?;

    println!(
        "Wrote {} survey rows ({} universities x {} years x {} degrees) to sample_survey.csv / .parquet",
        rows.len(),
        UNIVERSITIES.len(),
        YEARS.count(),
        DEGREES.len()
    );
    Ok(())
}
