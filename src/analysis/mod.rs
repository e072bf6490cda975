//! Aggregation and calculation engine.
//!
//! Every entity produced here is a pure function of the typed-record set the
//! extraction engine has accumulated: each recompute rebuilds statute dates,
//! balances, projections, and resolution options from scratch and swaps them
//! into the store. Nothing is incrementally patched, so re-running after new
//! documents is always safe.

pub mod balance;
pub mod csed;
pub mod projection;
pub mod resolution;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{
    AccountActivityEvent, CaseId, FilerRole, TaxYearKey, TaxYearRecord, TollingEvent,
};
use crate::reference::ReferenceTables;
use crate::store::CaseStore;

pub use projection::{ProjectedLiability, ProjectionOutcome, TaxProjectionRecord};
pub use resolution::ResolutionOptions;

/// Everything one recompute produced for a case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseAnalysis {
    pub case_id: CaseId,
    pub tax_years: Vec<TaxYearRecord>,
    pub tolling_events: Vec<TollingEvent>,
    pub projections: Vec<TaxProjectionRecord>,
    pub resolution: Option<ResolutionOptions>,
}

/// Stateless recomputation over the store's current records.
pub struct AnalysisEngine<'a> {
    tables: &'a ReferenceTables,
}

impl<'a> AnalysisEngine<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        Self { tables }
    }

    pub fn recompute(
        &self,
        case_id: &CaseId,
        store: &mut CaseStore,
        as_of: NaiveDate,
    ) -> CaseAnalysis {
        let year_keys: Vec<TaxYearKey> = store
            .tax_years_for_case(case_id)
            .iter()
            .map(|record| record.key.clone())
            .collect();

        let mut tolling_events = Vec::new();

        for key in &year_keys {
            let events: Vec<AccountActivityEvent> = store
                .activity_for_year(key)
                .into_iter()
                .cloned()
                .collect();

            // Reads complete; now rewrite the derived fields on the row.
            let statute = {
                let record = store.tax_year(key).cloned();
                record.map(|record| csed::resolve(&record, &events, &self.tables.transaction_rules))
            };

            if let Some(statute) = statute {
                let current_balance = store
                    .tax_year(key)
                    .and_then(|record| balance::current_balance(record, &events));
                let aur = balance::aur_indicator(&events);
                let sfr = balance::sfr_indicator(&events);

                if let Some(record) = store
                    .tax_years_for_case_mut(case_id)
                    .into_iter()
                    .find(|record| &record.key == key)
                {
                    record.reset_derived();
                    record.current_balance = current_balance;
                    record.base_csed_date = statute.base_date;
                    record.adjusted_csed_date = statute.adjusted_date;
                    record.csed_state = statute.state;
                    record.aur_indicator = aur;
                    record.sfr_indicator = sfr;
                }
                tolling_events.extend(statute.tolling);
            }
        }

        let mut projections = Vec::new();
        for key in &year_keys {
            let Some(record) = store.tax_year(key).cloned() else {
                continue;
            };
            // Joint rows aggregate every filer's documents for the year;
            // separate rows project over their own documents only.
            let documents = match key.filer {
                FilerRole::Joint => store.income_documents_for_case_year(case_id, key.year),
                _ => store.income_documents_for_year(key),
            };
            projections.push(projection::project(&record, &documents, self.tables));
        }

        let resolution = store.profile(case_id).map(|profile| {
            let tax_years = store.tax_years_for_case(case_id);
            resolution::evaluate(profile, &tax_years, self.tables, as_of)
        });

        store.replace_derived(
            case_id,
            tolling_events.clone(),
            projections.clone(),
            resolution.clone(),
        );

        CaseAnalysis {
            case_id: case_id.clone(),
            tax_years: store
                .tax_years_for_case(case_id)
                .into_iter()
                .cloned()
                .collect(),
            tolling_events,
            projections,
            resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CsedState, FilingStatus, IncomeCategory, IncomeDocumentRecord};

    fn key(case: &str, year: i32) -> TaxYearKey {
        TaxYearKey {
            case_id: CaseId::new(case),
            year,
            filer: FilerRole::Taxpayer,
        }
    }

    fn date(value: &str) -> NaiveDate {
        value.parse().expect("date")
    }

    #[test]
    fn recompute_is_idempotent_over_unchanged_records() {
        let tables = ReferenceTables::builtin();
        let mut store = CaseStore::new();
        let case_id = CaseId::new("1295022");

        let row = store.ensure_tax_year(key("1295022", 2023));
        row.filing_status = Some(FilingStatus::Single);
        row.return_filed = true;
        row.return_filed_date = Some(date("2024-04-15"));
        store.upsert_income_document(IncomeDocumentRecord {
            tax_year: key("1295022", 2023),
            document_type: "W-2".to_string(),
            gross_amount: Some(40_000.0),
            federal_withholding: Some(3_000.0),
            issuer_name: Some("ACME".to_string()),
            issuer_id: None,
            recipient_name: None,
            recipient_id: None,
            category: IncomeCategory::Wages,
            is_self_employment: false,
        });

        let engine = AnalysisEngine::new(&tables);
        let first = engine.recompute(&case_id, &mut store, date("2026-01-01"));
        let second = engine.recompute(&case_id, &mut store, date("2026-01-01"));

        let first_json = serde_json::to_string(&first).expect("serialize");
        let second_json = serde_json::to_string(&second).expect("serialize");
        assert_eq!(first_json, second_json);
        assert_eq!(store.projections(&case_id).len(), 1);
    }

    #[test]
    fn recompute_sets_statute_fields_on_the_year_row() {
        let tables = ReferenceTables::builtin();
        let mut store = CaseStore::new();
        let case_id = CaseId::new("941839");

        let row = store.ensure_tax_year(key("941839", 2013));
        row.return_filed = true;
        row.return_filed_date = Some(date("2014-04-15"));

        let engine = AnalysisEngine::new(&tables);
        engine.recompute(&case_id, &mut store, date("2026-01-01"));

        let record = store.tax_year(&key("941839", 2013)).expect("row");
        assert_eq!(record.csed_state, CsedState::BaseSet);
        assert_eq!(record.base_csed_date, Some(date("2024-04-15")));
        assert_eq!(record.adjusted_csed_date, Some(date("2024-04-15")));
    }

    #[test]
    fn unknown_case_yields_an_empty_analysis() {
        let tables = ReferenceTables::builtin();
        let mut store = CaseStore::new();
        let engine = AnalysisEngine::new(&tables);
        let analysis = engine.recompute(&CaseId::new("missing"), &mut store, date("2026-01-01"));
        assert!(analysis.tax_years.is_empty());
        assert!(analysis.projections.is_empty());
        assert!(analysis.resolution.is_none());
    }
}
