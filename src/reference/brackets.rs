use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ReferenceError;
use crate::domain::FilingStatus;

/// One rung of a progressive schedule: income at or above `floor` is taxed
/// at `rate` until the next rung's floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BracketStep {
    pub floor: f64,
    pub rate: f64,
}

/// `(year, filing status) → ordered bracket schedule`.
#[derive(Debug, Clone)]
pub struct BracketTable {
    schedules: BTreeMap<(i32, FilingStatus), Vec<BracketStep>>,
}

const RATES: [f64; 7] = [0.10, 0.12, 0.22, 0.24, 0.32, 0.35, 0.37];

fn schedule_from_floors(floors: [f64; 7]) -> Vec<BracketStep> {
    floors
        .iter()
        .zip(RATES.iter())
        .map(|(&floor, &rate)| BracketStep { floor, rate })
        .collect()
}

impl BracketTable {
    pub fn builtin() -> Self {
        let mut schedules = BTreeMap::new();

        // 2023
        schedules.insert(
            (2023, FilingStatus::Single),
            schedule_from_floors([0.0, 11_000.0, 44_725.0, 95_375.0, 182_100.0, 231_250.0, 578_125.0]),
        );
        schedules.insert(
            (2023, FilingStatus::MarriedFilingJointly),
            schedule_from_floors([0.0, 22_000.0, 89_450.0, 190_750.0, 364_200.0, 462_500.0, 693_750.0]),
        );
        schedules.insert(
            (2023, FilingStatus::MarriedFilingSeparately),
            schedule_from_floors([0.0, 11_000.0, 44_725.0, 95_375.0, 182_100.0, 231_250.0, 346_875.0]),
        );
        schedules.insert(
            (2023, FilingStatus::HeadOfHousehold),
            schedule_from_floors([0.0, 15_700.0, 59_850.0, 95_350.0, 182_100.0, 231_250.0, 578_100.0]),
        );

        // 2024
        schedules.insert(
            (2024, FilingStatus::Single),
            schedule_from_floors([0.0, 11_600.0, 47_150.0, 100_525.0, 191_950.0, 243_725.0, 609_350.0]),
        );
        schedules.insert(
            (2024, FilingStatus::MarriedFilingJointly),
            schedule_from_floors([0.0, 23_200.0, 94_300.0, 201_050.0, 383_900.0, 487_450.0, 731_200.0]),
        );
        schedules.insert(
            (2024, FilingStatus::MarriedFilingSeparately),
            schedule_from_floors([0.0, 11_600.0, 47_150.0, 100_525.0, 191_950.0, 243_725.0, 365_600.0]),
        );
        schedules.insert(
            (2024, FilingStatus::HeadOfHousehold),
            schedule_from_floors([0.0, 16_550.0, 63_100.0, 100_500.0, 191_950.0, 243_700.0, 609_350.0]),
        );

        Self { schedules }
    }

    pub fn schedule(&self, year: i32, status: FilingStatus) -> Option<&[BracketStep]> {
        self.schedules.get(&(year, status)).map(Vec::as_slice)
    }

    /// Marginal accumulation across the schedule: each slice of income is
    /// taxed at its own rung's rate, never the top rate alone.
    pub fn tax_on(schedule: &[BracketStep], taxable_income: f64) -> f64 {
        let mut tax = 0.0;
        for (index, step) in schedule.iter().enumerate() {
            if taxable_income <= step.floor {
                break;
            }
            let ceiling = schedule
                .get(index + 1)
                .map(|next| next.floor)
                .unwrap_or(f64::INFINITY);
            tax += (taxable_income.min(ceiling) - step.floor) * step.rate;
        }
        tax
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, ReferenceError> {
        #[derive(Debug, Deserialize)]
        struct Row {
            year: i32,
            filing_status: String,
            floor: f64,
            rate: f64,
        }

        let file = std::fs::File::open(path).map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut schedules: BTreeMap<(i32, FilingStatus), Vec<BracketStep>> = BTreeMap::new();
        for (index, record) in reader.deserialize::<Row>().enumerate() {
            let row = record.map_err(|source| ReferenceError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let status =
                FilingStatus::parse(&row.filing_status).ok_or_else(|| ReferenceError::InvalidRow {
                    path: path.to_path_buf(),
                    reason: format!(
                        "row {}: unrecognized filing status '{}'",
                        index + 2,
                        row.filing_status
                    ),
                })?;
            schedules.entry((row.year, status)).or_default().push(BracketStep {
                floor: row.floor,
                rate: row.rate,
            });
        }

        for schedule in schedules.values_mut() {
            schedule.sort_by(|a, b| a.floor.total_cmp(&b.floor));
        }

        Ok(Self { schedules })
    }
}

/// `(year, filing status) → standard deduction`.
#[derive(Debug, Clone)]
pub struct DeductionTable {
    amounts: BTreeMap<(i32, FilingStatus), f64>,
}

impl DeductionTable {
    pub fn builtin() -> Self {
        let mut amounts = BTreeMap::new();
        let entries = [
            (2023, FilingStatus::Single, 13_850.0),
            (2023, FilingStatus::MarriedFilingJointly, 27_700.0),
            (2023, FilingStatus::MarriedFilingSeparately, 13_850.0),
            (2023, FilingStatus::HeadOfHousehold, 20_800.0),
            (2024, FilingStatus::Single, 14_600.0),
            (2024, FilingStatus::MarriedFilingJointly, 29_200.0),
            (2024, FilingStatus::MarriedFilingSeparately, 14_600.0),
            (2024, FilingStatus::HeadOfHousehold, 21_900.0),
        ];
        for (year, status, amount) in entries {
            amounts.insert((year, status), amount);
        }
        Self { amounts }
    }

    pub fn amount(&self, year: i32, status: FilingStatus) -> Option<f64> {
        self.amounts.get(&(year, status)).copied()
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, ReferenceError> {
        #[derive(Debug, Deserialize)]
        struct Row {
            year: i32,
            filing_status: String,
            amount: f64,
        }

        let file = std::fs::File::open(path).map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut amounts = BTreeMap::new();
        for (index, record) in reader.deserialize::<Row>().enumerate() {
            let row = record.map_err(|source| ReferenceError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let status =
                FilingStatus::parse(&row.filing_status).ok_or_else(|| ReferenceError::InvalidRow {
                    path: path.to_path_buf(),
                    reason: format!(
                        "row {}: unrecognized filing status '{}'",
                        index + 2,
                        row.filing_status
                    ),
                })?;
            amounts.insert((row.year, status), row.amount);
        }

        Ok(Self { amounts })
    }
}
