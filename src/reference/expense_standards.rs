use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::ReferenceError;
use crate::domain::ExpenseCategory;

/// Published collection financial standards:
/// `(locality, household size, category) → allowable monthly amount`.
///
/// Lookups fall back from the requested locality to the `NATIONAL` rows, and
/// within a locality to the largest published household size at or below the
/// requested one.
#[derive(Debug, Clone)]
pub struct ExpenseStandardTable {
    amounts: BTreeMap<(String, ExpenseCategory, u32), f64>,
}

const NATIONAL: &str = "NATIONAL";

impl ExpenseStandardTable {
    pub fn builtin() -> Self {
        let mut amounts = BTreeMap::new();
        let mut add = |category: ExpenseCategory, by_size: [(u32, f64); 4]| {
            for (size, amount) in by_size {
                amounts.insert((NATIONAL.to_string(), category, size), amount);
            }
        };

        add(ExpenseCategory::Food, [(1, 458.0), (2, 819.0), (3, 965.0), (4, 1_160.0)]);
        add(ExpenseCategory::Housekeeping, [(1, 45.0), (2, 78.0), (3, 79.0), (4, 89.0)]);
        add(ExpenseCategory::Apparel, [(1, 92.0), (2, 164.0), (3, 199.0), (4, 268.0)]);
        add(ExpenseCategory::PersonalCare, [(1, 45.0), (2, 80.0), (3, 86.0), (4, 102.0)]);
        add(ExpenseCategory::Miscellaneous, [(1, 189.0), (2, 342.0), (3, 389.0), (4, 459.0)]);
        add(ExpenseCategory::Housing, [(1, 1_642.0), (2, 1_928.0), (3, 2_032.0), (4, 2_266.0)]);
        add(ExpenseCategory::Utilities, [(1, 340.0), (2, 400.0), (3, 420.0), (4, 470.0)]);
        add(ExpenseCategory::Transportation, [(1, 619.0), (2, 1_238.0), (3, 1_238.0), (4, 1_238.0)]);
        add(
            ExpenseCategory::PublicTransportation,
            [(1, 242.0), (2, 242.0), (3, 242.0), (4, 242.0)],
        );
        add(ExpenseCategory::HealthCare, [(1, 83.0), (2, 166.0), (3, 249.0), (4, 332.0)]);

        Self { amounts }
    }

    /// The published standard, if one applies to this category at all.
    /// Actual-only categories intentionally have no rows.
    pub fn standard(
        &self,
        locality: &str,
        household_size: u32,
        category: ExpenseCategory,
    ) -> Option<f64> {
        let locality = locality.trim().to_ascii_uppercase();
        self.lookup(&locality, household_size, category)
            .or_else(|| self.lookup(NATIONAL, household_size, category))
    }

    fn lookup(&self, locality: &str, household_size: u32, category: ExpenseCategory) -> Option<f64> {
        let sizes: Vec<(u32, f64)> = self
            .amounts
            .range(
                (locality.to_string(), category, 0)..=(locality.to_string(), category, u32::MAX),
            )
            .map(|((_, _, size), amount)| (*size, *amount))
            .collect();
        if sizes.is_empty() {
            return None;
        }
        sizes
            .iter()
            .rev()
            .find(|(size, _)| *size <= household_size.max(1))
            .or_else(|| sizes.first())
            .map(|(_, amount)| *amount)
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, ReferenceError> {
        #[derive(Debug, Deserialize)]
        struct Row {
            locality: String,
            household_size: u32,
            category: String,
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
            let category =
                ExpenseCategory::parse(&row.category).ok_or_else(|| ReferenceError::InvalidRow {
                    path: path.to_path_buf(),
                    reason: format!(
                        "row {}: unrecognized expense category '{}'",
                        index + 2,
                        row.category
                    ),
                })?;
            amounts.insert(
                (row.locality.to_ascii_uppercase(), category, row.household_size),
                row.amount,
            );
        }

        Ok(Self { amounts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn household_size_falls_back_to_largest_published_at_or_below() {
        let table = ExpenseStandardTable::builtin();
        let four = table
            .standard(NATIONAL, 4, ExpenseCategory::Food)
            .expect("four-person standard");
        let six = table
            .standard(NATIONAL, 6, ExpenseCategory::Food)
            .expect("six-person standard");
        assert_eq!(four, six);
    }

    #[test]
    fn unknown_locality_falls_back_to_national() {
        let table = ExpenseStandardTable::builtin();
        let national = table.standard(NATIONAL, 2, ExpenseCategory::Housing);
        let county = table.standard("POLK, IA", 2, ExpenseCategory::Housing);
        assert_eq!(national, county);
    }

    #[test]
    fn actual_only_categories_have_no_standard() {
        let table = ExpenseStandardTable::builtin();
        assert!(table.standard(NATIONAL, 1, ExpenseCategory::ChildCare).is_none());
        assert!(table.standard(NATIONAL, 1, ExpenseCategory::Taxes).is_none());
    }

    #[test]
    fn csv_rows_override_by_locality() {
        use std::io::Write;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("expense_standards.csv");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "locality,household_size,category,amount").expect("header");
        writeln!(file, "POLK IA,1,housing,1500").expect("row");
        writeln!(file, "NATIONAL,1,housing,1400").expect("row");
        drop(file);

        let table = ExpenseStandardTable::from_csv_path(&path).expect("load");
        assert_eq!(table.standard("polk ia", 1, ExpenseCategory::Housing), Some(1500.0));
        assert_eq!(table.standard("ADA, ID", 1, ExpenseCategory::Housing), Some(1400.0));
    }
}
