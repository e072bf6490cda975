//! Versioned, immutable reference data: transaction-code rules, income-form
//! rules, bracket and deduction tables, and collection expense standards.
//!
//! Rule changes ship as a new table version; nothing here mutates after load.

mod brackets;
mod document_rules;
mod expense_standards;
mod transaction_rules;

pub use brackets::{BracketStep, BracketTable, DeductionTable};
pub use document_rules::{DocumentRule, DocumentRuleTable};
pub use expense_standards::ExpenseStandardTable;
pub use transaction_rules::{TollingRule, TransactionRule, TransactionRuleTable};

use std::path::{Path, PathBuf};

use crate::config::{EngineConfig, ReferenceSource};

/// Release stamped on the compiled-in table set.
pub const BUILTIN_VERSION: &str = "2024.1";

/// The complete rule and lookup set one engine run operates against.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub version: String,
    pub transaction_rules: TransactionRuleTable,
    pub document_rules: DocumentRuleTable,
    pub brackets: BracketTable,
    pub deductions: DeductionTable,
    pub expense_standards: ExpenseStandardTable,
}

impl ReferenceTables {
    /// The compiled-in rule set.
    pub fn builtin() -> Self {
        Self {
            version: BUILTIN_VERSION.to_string(),
            transaction_rules: TransactionRuleTable::builtin(),
            document_rules: DocumentRuleTable::builtin(),
            brackets: BracketTable::builtin(),
            deductions: DeductionTable::builtin(),
            expense_standards: ExpenseStandardTable::builtin(),
        }
    }

    /// Builds tables for the configured source.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ReferenceError> {
        match &config.reference {
            ReferenceSource::BuiltIn => Ok(Self::builtin()),
            ReferenceSource::Directory(dir) => Self::from_dir(dir),
        }
    }

    /// Starts from the compiled-in set and overrides each table a CSV file is
    /// present for. File names: `brackets.csv`, `deductions.csv`,
    /// `expense_standards.csv`.
    pub fn from_dir(dir: &Path) -> Result<Self, ReferenceError> {
        let mut tables = Self::builtin();
        tables.version = format!("{}+{}", BUILTIN_VERSION, dir.display());

        let brackets = dir.join("brackets.csv");
        if brackets.is_file() {
            tables.brackets = BracketTable::from_csv_path(&brackets)?;
        }

        let deductions = dir.join("deductions.csv");
        if deductions.is_file() {
            tables.deductions = DeductionTable::from_csv_path(&deductions)?;
        }

        let standards = dir.join("expense_standards.csv");
        if standards.is_file() {
            tables.expense_standards = ExpenseStandardTable::from_csv_path(&standards)?;
        }

        Ok(tables)
    }
}

/// Failures loading reference data from disk.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("could not open reference file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid CSV in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("invalid row in {path}: {reason}")]
    InvalidRow { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExpenseCategory, FilingStatus};
    use std::io::Write;

    #[test]
    fn builtin_tables_cover_recent_years() {
        let tables = ReferenceTables::builtin();
        assert_eq!(tables.version, BUILTIN_VERSION);
        for year in [2023, 2024] {
            assert!(tables.brackets.schedule(year, FilingStatus::Single).is_some());
            assert!(tables
                .deductions
                .amount(year, FilingStatus::MarriedFilingJointly)
                .is_some());
        }
        assert!(tables.brackets.schedule(1999, FilingStatus::Single).is_none());
    }

    #[test]
    fn directory_overrides_only_present_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut file =
            std::fs::File::create(dir.path().join("deductions.csv")).expect("create csv");
        writeln!(file, "year,filing_status,amount").expect("header");
        writeln!(file, "2030,single,17000").expect("row");
        drop(file);

        let tables = ReferenceTables::from_dir(dir.path()).expect("tables load");
        assert_eq!(tables.deductions.amount(2030, FilingStatus::Single), Some(17000.0));
        // Untouched tables fall back to the compiled-in set.
        assert!(tables.brackets.schedule(2024, FilingStatus::Single).is_some());
        assert!(tables
            .expense_standards
            .standard("NATIONAL", 1, ExpenseCategory::Food)
            .is_some());
    }
}
