use chrono::NaiveDate;
use tracing::info;

use crate::analysis::{AnalysisEngine, CaseAnalysis};
use crate::config::EngineConfig;
use crate::domain::CaseId;
use crate::error::EngineError;
use crate::extraction::{ExtractionEngine, ExtractionOutcome, RawDocument};
use crate::reference::ReferenceTables;
use crate::store::{CaseSnapshot, CaseStore};

/// Facade composing the two engines over one store. The orchestration layer
/// owns scheduling: it calls [`CasePipeline::process`] whenever a new raw
/// document lands and reads results back through the query surface. Cases
/// are independent units of work; callers wanting parallelism run one
/// pipeline per case partition.
pub struct CasePipeline {
    tables: ReferenceTables,
    store: CaseStore,
}

impl CasePipeline {
    pub fn new(tables: ReferenceTables) -> Self {
        Self {
            tables,
            store: CaseStore::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let tables = ReferenceTables::from_config(config)?;
        Ok(Self::new(tables))
    }

    pub fn reference_version(&self) -> &str {
        &self.tables.version
    }

    /// Runs extraction for one document. Malformed documents error; bad
    /// records inside an otherwise usable document are reported in the
    /// outcome instead.
    pub fn ingest(&mut self, document: &RawDocument) -> Result<ExtractionOutcome, EngineError> {
        let engine = ExtractionEngine::new(&self.tables);
        let outcome = engine.extract(document, &mut self.store)?;
        info!(
            case = %outcome.case_id.0,
            kind = outcome.kind.label(),
            records = outcome.records_written,
            failures = outcome.failures.len(),
            "document extracted"
        );
        Ok(outcome)
    }

    /// Rebuilds every derived entity for a case from the current records.
    pub fn recompute(&mut self, case_id: &CaseId, as_of: NaiveDate) -> CaseAnalysis {
        let engine = AnalysisEngine::new(&self.tables);
        let analysis = engine.recompute(case_id, &mut self.store, as_of);
        info!(
            case = %case_id.0,
            tax_years = analysis.tax_years.len(),
            tolling_events = analysis.tolling_events.len(),
            projections = analysis.projections.len(),
            "case recomputed"
        );
        analysis
    }

    /// The re-run trigger: extract the new document, then recompute its case.
    pub fn process(
        &mut self,
        document: &RawDocument,
        as_of: NaiveDate,
    ) -> Result<(ExtractionOutcome, CaseAnalysis), EngineError> {
        let outcome = self.ingest(document)?;
        let analysis = self.recompute(&document.case_id, as_of);
        Ok((outcome, analysis))
    }

    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    pub fn snapshot(&self, case_id: &CaseId) -> CaseSnapshot<'_> {
        self.store.snapshot(case_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::DocumentKind;
    use serde_json::json;

    #[test]
    fn process_runs_extraction_then_recompute() {
        let mut pipeline = CasePipeline::new(ReferenceTables::builtin());
        let document = RawDocument {
            case_id: CaseId::new("1295022"),
            kind: DocumentKind::AccountTranscript,
            payload: json!({
                "at_records": [{
                    "tax_year": 2023,
                    "filing_status": "Single",
                    "return_filed": "Filed",
                    "return_filed_date": "2024-04-15",
                    "total_balance": "4,000"
                }]
            }),
        };

        let (outcome, analysis) = pipeline
            .process(&document, "2026-01-01".parse().expect("date"))
            .expect("processes");

        assert_eq!(outcome.records_written, 1);
        assert_eq!(analysis.tax_years.len(), 1);
        assert_eq!(
            analysis.tax_years[0].base_csed_date,
            "2034-04-15".parse().ok()
        );
    }

    #[test]
    fn malformed_document_surfaces_as_an_engine_error() {
        let mut pipeline = CasePipeline::new(ReferenceTables::builtin());
        let document = RawDocument {
            case_id: CaseId::new("1295022"),
            kind: DocumentKind::AccountTranscript,
            payload: json!([1, 2, 3]),
        };

        let error = pipeline.ingest(&document).expect_err("document error");
        assert!(matches!(error, EngineError::Document(_)));
    }
}
