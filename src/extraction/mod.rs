//! Extraction engine: one raw document in, zero or more typed records out.
//!
//! Documents come from upstream capture with a declared kind and an
//! unspecified internal shape. Each extractor declares candidate key paths
//! per field, parses defensively, enriches from the rule tables, and upserts
//! by natural key. A bad record never takes its siblings down with it; only
//! a document that cannot be interpreted at all is an error.

mod interview;
mod paths;
mod scalars;
mod transcript;
mod wage_income;

pub use paths::{resolve, resolve_string};
pub use scalars::{parse_date, parse_date_str, parse_flag, parse_money, parse_year};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::CaseId;
use crate::reference::ReferenceTables;
use crate::store::CaseStore;

/// Source document families the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    AccountTranscript,
    WageIncome,
    Interview,
}

impl DocumentKind {
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "accounttranscript" | "at" | "transcript" => Some(Self::AccountTranscript),
            "wageincome" | "wi" | "wageandincome" => Some(Self::WageIncome),
            "interview" | "financialinterview" => Some(Self::Interview),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::AccountTranscript => "account_transcript",
            DocumentKind::WageIncome => "wage_income",
            DocumentKind::Interview => "interview",
        }
    }
}

/// A captured upstream response, tagged with the case it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub case_id: CaseId,
    pub kind: DocumentKind,
    pub payload: Value,
}

/// Document-level failures: the only extraction errors a caller sees.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("unrecognized document kind '{0}'")]
    UnrecognizedKind(String),
    #[error("{kind} document for case {case} is unusable: {reason}")]
    Unparseable {
        kind: &'static str,
        case: String,
        reason: String,
    },
}

/// A sub-record that could not be extracted, kept alongside the records that
/// could.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub context: String,
    pub reason: String,
}

/// What one document produced.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    pub case_id: CaseId,
    pub kind: DocumentKind,
    pub records_written: usize,
    pub failures: Vec<RecordFailure>,
}

/// Stateless transformer from raw documents to typed, enriched records.
pub struct ExtractionEngine<'a> {
    tables: &'a ReferenceTables,
}

impl<'a> ExtractionEngine<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        Self { tables }
    }

    pub fn extract(
        &self,
        document: &RawDocument,
        store: &mut CaseStore,
    ) -> Result<ExtractionOutcome, DocumentError> {
        if !document.payload.is_object() {
            return Err(DocumentError::Unparseable {
                kind: document.kind.label(),
                case: document.case_id.0.clone(),
                reason: "payload is not an object".to_string(),
            });
        }

        let outcome = match document.kind {
            DocumentKind::AccountTranscript => {
                transcript::extract(self.tables, document, store)?
            }
            DocumentKind::WageIncome => wage_income::extract(self.tables, document, store)?,
            DocumentKind::Interview => interview::extract(document, store)?,
        };

        for failure in &outcome.failures {
            tracing::warn!(
                case = %outcome.case_id.0,
                kind = outcome.kind.label(),
                context = %failure.context,
                reason = %failure.reason,
                "record skipped during extraction"
            );
        }

        Ok(outcome)
    }
}
