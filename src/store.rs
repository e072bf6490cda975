use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::projection::TaxProjectionRecord;
use crate::analysis::resolution::ResolutionOptions;
use crate::domain::{
    AccountActivityEvent, Case, CaseId, CollectionProfile, IncomeDocumentRecord, TaxYearKey,
    TaxYearRecord, TollingEvent,
};

/// Natural key of an account activity event inside a tax year. Two lines
/// with the same code on the same day are one logical record; the latest
/// extraction wins.
pub type ActivityKey = (TaxYearKey, String, Option<NaiveDate>);

/// Natural key of an income document: form code plus the issuer identity
/// (id when reported, name otherwise).
pub type IncomeDocumentKey = (TaxYearKey, String, String);

/// In-memory keyed store backing both engines. All writes are replaces by
/// natural key, so re-running extraction over the same documents converges
/// instead of accumulating duplicates. `BTreeMap` keeps iteration order
/// deterministic, which the idempotence guarantees lean on.
#[derive(Debug, Default)]
pub struct CaseStore {
    cases: BTreeMap<CaseId, Case>,
    tax_years: BTreeMap<TaxYearKey, TaxYearRecord>,
    activity: BTreeMap<ActivityKey, AccountActivityEvent>,
    income_documents: BTreeMap<IncomeDocumentKey, IncomeDocumentRecord>,
    profiles: BTreeMap<CaseId, CollectionProfile>,
    tolling_events: BTreeMap<CaseId, Vec<TollingEvent>>,
    projections: BTreeMap<CaseId, Vec<TaxProjectionRecord>>,
    resolutions: BTreeMap<CaseId, ResolutionOptions>,
}

impl CaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_case(&mut self, case_id: &CaseId) -> &mut Case {
        self.cases.entry(case_id.clone()).or_default()
    }

    pub fn case(&self, case_id: &CaseId) -> Option<&Case> {
        self.cases.get(case_id)
    }

    pub fn case_ids(&self) -> impl Iterator<Item = &CaseId> {
        self.cases.keys()
    }

    /// Gets or creates the tax-year row for a natural key. Creation fills a
    /// skeleton; extraction then assigns the fields its document carries.
    pub fn ensure_tax_year(&mut self, key: TaxYearKey) -> &mut TaxYearRecord {
        self.ensure_case(&key.case_id.clone());
        self.tax_years
            .entry(key.clone())
            .or_insert_with(|| TaxYearRecord::new(key))
    }

    pub fn tax_year(&self, key: &TaxYearKey) -> Option<&TaxYearRecord> {
        self.tax_years.get(key)
    }

    pub fn tax_years_for_case(&self, case_id: &CaseId) -> Vec<&TaxYearRecord> {
        self.tax_years
            .values()
            .filter(|record| &record.key.case_id == case_id)
            .collect()
    }

    pub fn tax_years_for_case_mut(&mut self, case_id: &CaseId) -> Vec<&mut TaxYearRecord> {
        self.tax_years
            .values_mut()
            .filter(|record| &record.key.case_id == case_id)
            .collect()
    }

    /// Whole-record replace by natural key.
    pub fn upsert_activity(&mut self, event: AccountActivityEvent) {
        let key = (
            event.tax_year.clone(),
            event.code.clone(),
            event.date,
        );
        self.activity.insert(key, event);
    }

    pub fn activity_for_year(&self, key: &TaxYearKey) -> Vec<&AccountActivityEvent> {
        self.activity
            .values()
            .filter(|event| &event.tax_year == key)
            .collect()
    }

    pub fn activity_for_case(&self, case_id: &CaseId) -> Vec<&AccountActivityEvent> {
        self.activity
            .values()
            .filter(|event| &event.tax_year.case_id == case_id)
            .collect()
    }

    /// Whole-record replace by natural key.
    pub fn upsert_income_document(&mut self, document: IncomeDocumentRecord) {
        let issuer_key = document
            .issuer_id
            .clone()
            .or_else(|| document.issuer_name.clone())
            .unwrap_or_default();
        let key = (
            document.tax_year.clone(),
            document.document_type.clone(),
            issuer_key,
        );
        self.income_documents.insert(key, document);
    }

    pub fn income_documents_for_year(&self, key: &TaxYearKey) -> Vec<&IncomeDocumentRecord> {
        self.income_documents
            .values()
            .filter(|document| &document.tax_year == key)
            .collect()
    }

    /// Documents for a `(case, year)` across filer rows, used when a joint
    /// projection aggregates both spouses.
    pub fn income_documents_for_case_year(
        &self,
        case_id: &CaseId,
        year: i32,
    ) -> Vec<&IncomeDocumentRecord> {
        self.income_documents
            .values()
            .filter(|document| {
                &document.tax_year.case_id == case_id && document.tax_year.year == year
            })
            .collect()
    }

    pub fn income_documents_for_case(&self, case_id: &CaseId) -> Vec<&IncomeDocumentRecord> {
        self.income_documents
            .values()
            .filter(|document| &document.tax_year.case_id == case_id)
            .collect()
    }

    /// Single profile per case, replaced wholesale on re-extraction.
    pub fn upsert_profile(&mut self, profile: CollectionProfile) {
        self.ensure_case(&profile.case_id.clone());
        self.profiles.insert(profile.case_id.clone(), profile);
    }

    pub fn profile(&self, case_id: &CaseId) -> Option<&CollectionProfile> {
        self.profiles.get(case_id)
    }

    /// Swaps in the analysis output for one case. Derived collections are
    /// replaced, never patched, so stale rows cannot linger.
    pub fn replace_derived(
        &mut self,
        case_id: &CaseId,
        tolling: Vec<TollingEvent>,
        projections: Vec<TaxProjectionRecord>,
        resolution: Option<ResolutionOptions>,
    ) {
        self.tolling_events.insert(case_id.clone(), tolling);
        self.projections.insert(case_id.clone(), projections);
        match resolution {
            Some(resolution) => {
                self.resolutions.insert(case_id.clone(), resolution);
            }
            None => {
                self.resolutions.remove(case_id);
            }
        }
    }

    pub fn tolling_events(&self, case_id: &CaseId) -> &[TollingEvent] {
        self.tolling_events
            .get(case_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn projections(&self, case_id: &CaseId) -> &[TaxProjectionRecord] {
        self.projections
            .get(case_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn resolution(&self, case_id: &CaseId) -> Option<&ResolutionOptions> {
        self.resolutions.get(case_id)
    }

    /// Serializable view of everything known about a case, typed records and
    /// derived entities alike. Byte-identical across runs over identical
    /// inputs.
    pub fn snapshot(&self, case_id: &CaseId) -> CaseSnapshot<'_> {
        CaseSnapshot {
            case: self.case(case_id),
            tax_years: self.tax_years_for_case(case_id),
            activity: self.activity_for_case(case_id),
            income_documents: self.income_documents_for_case(case_id),
            profile: self.profile(case_id),
            tolling_events: self.tolling_events(case_id),
            projections: self.projections(case_id),
            resolution: self.resolution(case_id),
        }
    }
}

/// Borrowed, serializable projection of one case's full state.
#[derive(Debug, Serialize)]
pub struct CaseSnapshot<'a> {
    pub case: Option<&'a Case>,
    pub tax_years: Vec<&'a TaxYearRecord>,
    pub activity: Vec<&'a AccountActivityEvent>,
    pub income_documents: Vec<&'a IncomeDocumentRecord>,
    pub profile: Option<&'a CollectionProfile>,
    pub tolling_events: &'a [TollingEvent],
    pub projections: &'a [TaxProjectionRecord],
    pub resolution: Option<&'a ResolutionOptions>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilerRole, IncomeCategory};

    fn year_key(case: &str, year: i32) -> TaxYearKey {
        TaxYearKey {
            case_id: CaseId::new(case),
            year,
            filer: FilerRole::Taxpayer,
        }
    }

    fn document(key: TaxYearKey, gross: f64) -> IncomeDocumentRecord {
        IncomeDocumentRecord {
            tax_year: key,
            document_type: "W-2".to_string(),
            gross_amount: Some(gross),
            federal_withholding: Some(1_000.0),
            issuer_name: Some("ACME".to_string()),
            issuer_id: Some("12-3456789".to_string()),
            recipient_name: None,
            recipient_id: None,
            category: IncomeCategory::Wages,
            is_self_employment: false,
        }
    }

    #[test]
    fn repeated_income_document_upsert_overwrites_instead_of_appending() {
        let mut store = CaseStore::new();
        let key = year_key("1295022", 2023);
        store.ensure_tax_year(key.clone());

        store.upsert_income_document(document(key.clone(), 40_000.0));
        store.upsert_income_document(document(key.clone(), 42_500.0));

        let documents = store.income_documents_for_year(&key);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].gross_amount, Some(42_500.0));
    }

    #[test]
    fn activity_events_are_keyed_by_code_and_date() {
        let mut store = CaseStore::new();
        let key = year_key("1295022", 2018);
        store.ensure_tax_year(key.clone());

        let event = |code: &str, day: u32| AccountActivityEvent {
            tax_year: key.clone(),
            code: code.to_string(),
            date: NaiveDate::from_ymd_opt(2018, 1, day),
            amount: Some(10.0),
            explanation: None,
            affects_balance: false,
            affects_csed: false,
            indicates_collection_action: false,
            tolling_category: None,
        };

        store.upsert_activity(event("670", 5));
        store.upsert_activity(event("670", 5));
        store.upsert_activity(event("670", 6));

        assert_eq!(store.activity_for_year(&key).len(), 2);
    }

    #[test]
    fn ensure_tax_year_does_not_clobber_existing_fields() {
        let mut store = CaseStore::new();
        let key = year_key("1295022", 2020);
        store.ensure_tax_year(key.clone()).return_filed = true;
        store.ensure_tax_year(key.clone());
        assert!(store.tax_year(&key).expect("record").return_filed);
    }

    #[test]
    fn replace_derived_swaps_rather_than_accumulates() {
        let mut store = CaseStore::new();
        let case_id = CaseId::new("1295022");
        store.ensure_case(&case_id);

        let tolling = TollingEvent {
            tax_year: year_key("1295022", 2018),
            category: crate::domain::TollingCategory::Penalty,
            opened_on: None,
            closed_on: None,
            interval_days: None,
            fixed_days: 30,
            extension_days: Some(30),
        };

        store.replace_derived(&case_id, vec![tolling.clone(), tolling], Vec::new(), None);
        assert_eq!(store.tolling_events(&case_id).len(), 2);

        store.replace_derived(&case_id, Vec::new(), Vec::new(), None);
        assert!(store.tolling_events(&case_id).is_empty());
    }
}
