use serde::{Deserialize, Serialize};

use crate::domain::{FilingStatus, IncomeDocumentRecord, TaxYearKey, TaxYearRecord};
use crate::reference::{BracketTable, ReferenceTables};

/// Self-employment tax on net self-employment earnings.
const SELF_EMPLOYMENT_TAX_RATE: f64 = 0.153;
/// The employer-equivalent share deducted before income tax.
const SELF_EMPLOYMENT_AGI_ADJUSTMENT: f64 = 0.0765;

/// One projection per tax-year row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxProjectionRecord {
    pub tax_year: TaxYearKey,
    pub filing_status: Option<FilingStatus>,
    pub outcome: ProjectionOutcome,
}

/// Either a fully computed liability or an explicit statement of why none
/// could be computed. A missing lookup never silently projects zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectionOutcome {
    Computed(ProjectedLiability),
    Unavailable { reason: String },
}

impl ProjectionOutcome {
    pub fn computed(&self) -> Option<&ProjectedLiability> {
        match self {
            ProjectionOutcome::Computed(liability) => Some(liability),
            ProjectionOutcome::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedLiability {
    pub total_income: f64,
    pub self_employment_income: f64,
    pub self_employment_tax: f64,
    pub estimated_agi: f64,
    pub taxable_income: f64,
    pub income_tax: f64,
    pub total_tax: f64,
    pub total_withholding: f64,
    pub projected_balance: f64,
}

/// Deterministic projection over one filer-year's income documents.
pub fn project(
    record: &TaxYearRecord,
    documents: &[&IncomeDocumentRecord],
    tables: &ReferenceTables,
) -> TaxProjectionRecord {
    let unavailable = |reason: String| TaxProjectionRecord {
        tax_year: record.key.clone(),
        filing_status: record.filing_status,
        outcome: ProjectionOutcome::Unavailable { reason },
    };

    if documents.is_empty() {
        return unavailable("no income documents for this filer and year".to_string());
    }

    let Some(filing_status) = record.filing_status else {
        return unavailable("filing status unknown".to_string());
    };

    let year = record.key.year;
    let Some(schedule) = tables.brackets.schedule(year, filing_status) else {
        return unavailable(format!(
            "no bracket table for {year} {}",
            filing_status.label()
        ));
    };
    let Some(standard_deduction) = tables.deductions.amount(year, filing_status) else {
        return unavailable(format!(
            "no standard deduction for {year} {}",
            filing_status.label()
        ));
    };

    let total_income: f64 = documents.iter().filter_map(|d| d.gross_amount).sum();
    let self_employment_income: f64 = documents
        .iter()
        .filter(|d| d.is_self_employment)
        .filter_map(|d| d.gross_amount)
        .sum();
    let total_withholding: f64 = documents.iter().filter_map(|d| d.federal_withholding).sum();

    let self_employment_tax = self_employment_income * SELF_EMPLOYMENT_TAX_RATE;
    let estimated_agi = total_income - self_employment_income * SELF_EMPLOYMENT_AGI_ADJUSTMENT;
    // Deduction larger than income clamps to zero rather than erroring.
    let taxable_income = (estimated_agi - standard_deduction).max(0.0);
    let income_tax = BracketTable::tax_on(schedule, taxable_income);
    let total_tax = income_tax + self_employment_tax;
    let projected_balance = total_tax - total_withholding;

    TaxProjectionRecord {
        tax_year: record.key.clone(),
        filing_status: Some(filing_status),
        outcome: ProjectionOutcome::Computed(ProjectedLiability {
            total_income,
            self_employment_income,
            self_employment_tax,
            estimated_agi,
            taxable_income,
            income_tax,
            total_tax,
            total_withholding,
            projected_balance,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseId, FilerRole, IncomeCategory};

    fn record(year: i32, status: Option<FilingStatus>) -> TaxYearRecord {
        let mut record = TaxYearRecord::new(TaxYearKey {
            case_id: CaseId::new("1273247"),
            year,
            filer: FilerRole::Taxpayer,
        });
        record.filing_status = status;
        record
    }

    fn wage_document(record: &TaxYearRecord, gross: f64, withheld: f64) -> IncomeDocumentRecord {
        IncomeDocumentRecord {
            tax_year: record.key.clone(),
            document_type: "W-2".to_string(),
            gross_amount: Some(gross),
            federal_withholding: Some(withheld),
            issuer_name: None,
            issuer_id: None,
            recipient_name: None,
            recipient_id: None,
            category: IncomeCategory::Wages,
            is_self_employment: false,
        }
    }

    fn nec_document(record: &TaxYearRecord, gross: f64) -> IncomeDocumentRecord {
        IncomeDocumentRecord {
            tax_year: record.key.clone(),
            document_type: "1099-NEC".to_string(),
            gross_amount: Some(gross),
            federal_withholding: None,
            issuer_name: None,
            issuer_id: None,
            recipient_name: None,
            recipient_id: None,
            category: IncomeCategory::SelfEmployment,
            is_self_employment: true,
        }
    }

    #[test]
    fn wage_only_projection_uses_marginal_bracket_math() {
        let tables = ReferenceTables::builtin();
        let record = record(2023, Some(FilingStatus::Single));
        let wages = wage_document(&record, 63_850.0, 6_000.0);
        let documents = vec![&wages];

        let projection = project(&record, &documents, &tables);
        let liability = projection.outcome.computed().expect("computed");

        // 63,850 − 13,850 standard deduction = 50,000 taxable.
        assert!((liability.taxable_income - 50_000.0).abs() < 1e-9);
        let expected_tax =
            11_000.0 * 0.10 + (44_725.0 - 11_000.0) * 0.12 + (50_000.0 - 44_725.0) * 0.22;
        assert!((liability.income_tax - expected_tax).abs() < 1e-9);
        assert!((liability.projected_balance - (expected_tax - 6_000.0)).abs() < 1e-9);
    }

    #[test]
    fn self_employment_income_adds_se_tax_and_agi_adjustment() {
        let tables = ReferenceTables::builtin();
        let record = record(2023, Some(FilingStatus::Single));
        let wages = wage_document(&record, 30_000.0, 2_500.0);
        let gig = nec_document(&record, 20_000.0);
        let documents = vec![&wages, &gig];

        let projection = project(&record, &documents, &tables);
        let liability = projection.outcome.computed().expect("computed");

        assert!((liability.self_employment_income - 20_000.0).abs() < 1e-9);
        assert!((liability.self_employment_tax - 3_060.0).abs() < 1e-9);
        assert!((liability.estimated_agi - (50_000.0 - 1_530.0)).abs() < 1e-9);
        assert!(
            (liability.total_tax - (liability.income_tax + liability.self_employment_tax)).abs()
                < 1e-9
        );
    }

    #[test]
    fn missing_bracket_year_is_explicitly_unavailable() {
        let tables = ReferenceTables::builtin();
        let record = record(1998, Some(FilingStatus::Single));
        let wages = wage_document(&record, 40_000.0, 0.0);
        let documents = vec![&wages];

        let projection = project(&record, &documents, &tables);
        match projection.outcome {
            ProjectionOutcome::Unavailable { reason } => {
                assert!(reason.contains("1998"), "reason names the year: {reason}");
            }
            ProjectionOutcome::Computed(_) => panic!("expected unavailable projection"),
        }
    }

    #[test]
    fn unknown_filing_status_is_unavailable_not_assumed() {
        let tables = ReferenceTables::builtin();
        let record = record(2023, None);
        let wages = wage_document(&record, 40_000.0, 0.0);
        let documents = vec![&wages];

        let projection = project(&record, &documents, &tables);
        assert!(matches!(
            projection.outcome,
            ProjectionOutcome::Unavailable { .. }
        ));
    }

    #[test]
    fn deduction_exceeding_income_clamps_taxable_to_zero() {
        let tables = ReferenceTables::builtin();
        let record = record(2024, Some(FilingStatus::Single));
        let wages = wage_document(&record, 9_000.0, 500.0);
        let documents = vec![&wages];

        let projection = project(&record, &documents, &tables);
        let liability = projection.outcome.computed().expect("computed");
        assert_eq!(liability.taxable_income, 0.0);
        assert_eq!(liability.income_tax, 0.0);
        assert!((liability.projected_balance - -500.0).abs() < 1e-9);
    }
}
