use serde_json::Value;

use super::paths::{resolve, resolve_string};
use super::scalars::{parse_date, parse_flag, parse_money, parse_year};
use super::{DocumentError, ExtractionOutcome, RawDocument, RecordFailure};
use crate::domain::{AccountActivityEvent, FilerRole, FilingStatus, TaxYearKey};
use crate::reference::ReferenceTables;
use crate::store::CaseStore;

// Candidate key paths per extracted field. Shapes drift between transcript
// deliveries, so the orderings are declared here, not rediscovered per call
// site.
const RECORD_ARRAY_KEYS: [&str; 3] = ["at_records", "records", "years"];
const YEAR_KEYS: [&str; 4] = ["tax_year", "year", "period", "Year"];
const FILER_KEYS: [&str; 3] = ["filer", "filer_role", "transcript_for"];
const FILING_STATUS_KEYS: [&str; 3] = ["filing_status", "FilingStatus", "status"];
const RETURN_FILED_KEYS: [&str; 2] = ["return_filed", "ReturnFiled"];
const FILED_DATE_KEYS: [&str; 3] = ["return_filed_date", "filed_date", "ReturnFiledDate"];
const AGI_KEYS: [&str; 3] = ["adjusted_gross_income", "agi", "AGI"];
const TAXABLE_INCOME_KEYS: [&str; 2] = ["taxable_income", "TaxableIncome"];
const BALANCE_KEYS: [&str; 4] = ["total_balance", "account_balance", "balance", "AccountBalance"];
const TRANSACTION_ARRAY_KEYS: [&str; 2] = ["transactions", "activity"];
const TRANSACTION_CODE_KEYS: [&str; 3] = ["code", "transaction_code", "Code"];
const TRANSACTION_DATE_KEYS: [&str; 3] = ["date", "transaction_date", "Date"];
const TRANSACTION_AMOUNT_KEYS: [&str; 2] = ["amount", "Amount"];
const TRANSACTION_EXPLANATION_KEYS: [&str; 3] = ["description", "explanation", "Description"];

/// The return-filed assessment code; its transaction date doubles as the
/// filing date when the summary fields omit one.
const RETURN_FILED_CODE: &str = "150";

pub(super) fn extract(
    tables: &ReferenceTables,
    document: &RawDocument,
    store: &mut CaseStore,
) -> Result<ExtractionOutcome, DocumentError> {
    let records = resolve(&document.payload, &RECORD_ARRAY_KEYS)
        .and_then(Value::as_array)
        .ok_or_else(|| DocumentError::Unparseable {
            kind: document.kind.label(),
            case: document.case_id.0.clone(),
            reason: "no transcript record array under any known key".to_string(),
        })?;

    let mut outcome = ExtractionOutcome {
        case_id: document.case_id.clone(),
        kind: document.kind,
        records_written: 0,
        failures: Vec::new(),
    };

    for (index, record) in records.iter().enumerate() {
        if !record.is_object() {
            outcome.failures.push(RecordFailure {
                context: format!("transcript record {index}"),
                reason: "record is not an object".to_string(),
            });
            continue;
        }

        let Some(year) = resolve(record, &YEAR_KEYS).and_then(parse_year) else {
            outcome.failures.push(RecordFailure {
                context: format!("transcript record {index}"),
                reason: "no usable tax year".to_string(),
            });
            continue;
        };

        let filer = resolve_string(record, &FILER_KEYS)
            .as_deref()
            .and_then(parse_filer)
            .unwrap_or(FilerRole::Taxpayer);

        let key = TaxYearKey {
            case_id: document.case_id.clone(),
            year,
            filer,
        };

        // The year-level summary fields this document carries. Unresolved
        // candidates land as nulls; re-extraction replaces the whole set.
        let filing_status =
            resolve_string(record, &FILING_STATUS_KEYS).and_then(|s| FilingStatus::parse(&s));
        let mut return_filed = resolve(record, &RETURN_FILED_KEYS)
            .and_then(parse_flag)
            .unwrap_or(false);
        let mut return_filed_date = resolve(record, &FILED_DATE_KEYS).and_then(parse_date);
        let adjusted_gross_income = resolve(record, &AGI_KEYS).and_then(parse_money);
        let taxable_income = resolve(record, &TAXABLE_INCOME_KEYS).and_then(parse_money);
        let reported_balance = resolve(record, &BALANCE_KEYS).and_then(parse_money);

        let transactions = resolve(record, &TRANSACTION_ARRAY_KEYS)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut events = Vec::new();
        for (txn_index, transaction) in transactions.iter().enumerate() {
            let context = format!("transcript record {index}, transaction {txn_index}");
            if !transaction.is_object() {
                outcome.failures.push(RecordFailure {
                    context,
                    reason: "transaction is not an object".to_string(),
                });
                continue;
            }
            let Some(code) = resolve_string(transaction, &TRANSACTION_CODE_KEYS) else {
                outcome.failures.push(RecordFailure {
                    context,
                    reason: "transaction has no code".to_string(),
                });
                continue;
            };

            let date = resolve(transaction, &TRANSACTION_DATE_KEYS).and_then(parse_date);
            let amount = resolve(transaction, &TRANSACTION_AMOUNT_KEYS).and_then(parse_money);
            let explanation = resolve_string(transaction, &TRANSACTION_EXPLANATION_KEYS);

            // Enrichment comes from the rule table alone. Unlisted codes
            // keep neutral flags rather than failing the record.
            let rule = tables.transaction_rules.rule(&code);
            if rule.is_none() {
                tracing::debug!(code = %code, "transaction code not in rule table");
            }

            // A filed return shows up as an assessment transaction even when
            // the summary block omits the flag.
            if code == RETURN_FILED_CODE {
                if let Some(assessed_on) = date {
                    return_filed = true;
                    return_filed_date.get_or_insert(assessed_on);
                }
            }

            events.push(AccountActivityEvent {
                tax_year: key.clone(),
                code,
                date,
                amount,
                explanation,
                affects_balance: rule.map(|r| r.affects_balance).unwrap_or(false),
                affects_csed: rule.map(|r| r.affects_csed).unwrap_or(false),
                indicates_collection_action: rule
                    .map(|r| r.indicates_collection_action)
                    .unwrap_or(false),
                tolling_category: rule.and_then(|r| r.tolling.as_ref()).map(|t| t.category),
            });
        }

        let row = store.ensure_tax_year(key);
        row.filing_status = filing_status;
        row.return_filed = return_filed;
        row.return_filed_date = return_filed_date;
        row.adjusted_gross_income = adjusted_gross_income;
        row.taxable_income = taxable_income;
        row.reported_balance = reported_balance;
        outcome.records_written += 1;

        for event in events {
            store.upsert_activity(event);
            outcome.records_written += 1;
        }
    }

    Ok(outcome)
}

fn parse_filer(value: &str) -> Option<FilerRole> {
    match value.trim().to_ascii_lowercase().as_str() {
        "taxpayer" | "primary" | "tp" => Some(FilerRole::Taxpayer),
        "spouse" => Some(FilerRole::Spouse),
        "joint" | "both" => Some(FilerRole::Joint),
        _ => None,
    }
}
