use serde_json::Value;

use super::paths::{resolve, resolve_string};
use super::scalars::{parse_money, parse_year};
use super::{DocumentError, ExtractionOutcome, RawDocument, RecordFailure};
use crate::domain::{FilerRole, IncomeDocumentRecord, TaxYearKey};
use crate::reference::ReferenceTables;
use crate::store::CaseStore;

// Wage and income deliveries are the least consistent source: the canonical
// candidate orderings below were settled against real sample documents and
// are the single authority on fallback priority.
const INCOME_KEYS: [&str; 9] = [
    "Income",
    "income",
    "gross_amount",
    "amount",
    "Gross",
    "Wages",
    "wages",
    "Total",
    "total",
];
const WITHHOLDING_KEYS: [&str; 5] = [
    "Withholding",
    "withholding",
    "federal_withholding",
    "Federal",
    "FederalTaxWithheld",
];
const ISSUER_NAME_KEYS: [&str; 8] = [
    "Issuer.Name",
    "Issuer.name",
    "issuer_name",
    "Employer",
    "employer_name",
    "EmployerName",
    "Fields.PayerName",
    "Fields.EmployerName",
];
const ISSUER_ID_KEYS: [&str; 8] = [
    "Issuer.EIN",
    "Issuer.ein",
    "issuer_ein",
    "EIN",
    "ein",
    "EmployerEIN",
    "Fields.PayerEIN",
    "Fields.EmployerEIN",
];
const RECIPIENT_NAME_KEYS: [&str; 8] = [
    "Recipient.Name",
    "Recipient.name",
    "recipient_name",
    "Employee",
    "employee_name",
    "EmployeeName",
    "Fields.RecipientName",
    "Fields.EmployeeName",
];
const RECIPIENT_ID_KEYS: [&str; 8] = [
    "Recipient.SSN",
    "Recipient.ssn",
    "recipient_ssn",
    "SSN",
    "ssn",
    "EmployeeSSN",
    "Fields.RecipientSSN",
    "Fields.EmployeeSSN",
];
const FORM_TYPE_KEYS: [&str; 10] = [
    "Form",
    "form",
    "form_type",
    "document_type",
    "type",
    "FormType",
    "formCode",
    "FormCode",
    "Code",
    "code",
];
const NESTED_FORM_TYPE_KEYS: [&str; 4] = ["Form.Type", "Form.type", "Form.Code", "Form.code"];
const FORM_YEAR_KEYS: [&str; 2] = ["tax_year", "year"];

pub(super) fn extract(
    tables: &ReferenceTables,
    document: &RawDocument,
    store: &mut CaseStore,
) -> Result<ExtractionOutcome, DocumentError> {
    let mut outcome = ExtractionOutcome {
        case_id: document.case_id.clone(),
        kind: document.kind,
        records_written: 0,
        failures: Vec::new(),
    };

    let spouse_id = store
        .ensure_case(&document.case_id)
        .spouse_id
        .clone();

    let forms = collect_forms(&document.payload).ok_or_else(|| DocumentError::Unparseable {
        kind: document.kind.label(),
        case: document.case_id.0.clone(),
        reason: "no forms under years_data, forms, or data".to_string(),
    })?;

    for (index, (year_hint, form)) in forms.iter().enumerate() {
        let context = format!("wage/income form {index}");
        if !form.is_object() {
            outcome.failures.push(RecordFailure {
                context,
                reason: "form is not an object".to_string(),
            });
            continue;
        }

        let year = (*year_hint).or_else(|| resolve(form, &FORM_YEAR_KEYS).and_then(parse_year));
        let Some(year) = year else {
            outcome.failures.push(RecordFailure {
                context,
                reason: "no usable tax year".to_string(),
            });
            continue;
        };

        // Forms with no recognizable type still land, classified Unknown.
        let document_type = detect_form_type(form).unwrap_or_else(|| "UNKNOWN".to_string());
        let rule = tables.document_rules.classify(&document_type);

        let recipient_id = resolve_string(form, &RECIPIENT_ID_KEYS);
        let filer = match (&recipient_id, &spouse_id) {
            (Some(recipient), Some(spouse)) if recipient == spouse => FilerRole::Spouse,
            _ => FilerRole::Taxpayer,
        };

        let key = TaxYearKey {
            case_id: document.case_id.clone(),
            year,
            filer,
        };
        store.ensure_tax_year(key.clone());

        store.upsert_income_document(IncomeDocumentRecord {
            tax_year: key,
            document_type,
            gross_amount: resolve(form, &INCOME_KEYS).and_then(parse_money),
            federal_withholding: resolve(form, &WITHHOLDING_KEYS).and_then(parse_money),
            issuer_name: resolve_string(form, &ISSUER_NAME_KEYS),
            issuer_id: resolve_string(form, &ISSUER_ID_KEYS),
            recipient_name: resolve_string(form, &RECIPIENT_NAME_KEYS),
            recipient_id,
            category: rule.category,
            is_self_employment: rule.is_self_employment,
        });
        outcome.records_written += 1;
    }

    Ok(outcome)
}

/// Flattens the delivery's grouping into `(year hint, form)` pairs. The
/// usual shape is a `years_data` map of year → forms; older feeds put a
/// `forms` or `data` array at the top with the year on each form.
fn collect_forms(payload: &Value) -> Option<Vec<(Option<i32>, Value)>> {
    if let Some(years_data) = payload.get("years_data").and_then(Value::as_object) {
        let mut forms = Vec::new();
        for (year_key, year_data) in years_data {
            let year = parse_year(&Value::String(year_key.clone()));
            let year_forms = match year_data {
                Value::Object(map) => map.get("forms").and_then(Value::as_array).cloned(),
                Value::Array(list) => Some(list.clone()),
                _ => None,
            };
            for form in year_forms.unwrap_or_default() {
                forms.push((year, form));
            }
        }
        return Some(forms);
    }

    let top_level = payload
        .get("forms")
        .or_else(|| payload.get("data"))
        .and_then(Value::as_array)?;
    Some(top_level.iter().map(|form| (None, form.clone())).collect())
}

/// Form-code detection: direct keys first, then the nested `Form` object,
/// then a last-resort scan for W-2/1099 markers in string values.
fn detect_form_type(form: &Value) -> Option<String> {
    if let Some(direct) = resolve_string(form, &FORM_TYPE_KEYS) {
        let upper = direct.to_ascii_uppercase();
        if upper != "NULL" && !upper.is_empty() {
            return Some(upper);
        }
    }

    if let Some(nested) = resolve_string(form, &NESTED_FORM_TYPE_KEYS) {
        let upper = nested.to_ascii_uppercase();
        if upper != "NULL" && !upper.is_empty() {
            return Some(upper);
        }
    }

    let object = form.as_object()?;
    for value in object.values() {
        if let Some(text) = value.as_str() {
            let upper = text.trim().to_ascii_uppercase();
            if ["W-2", "W2", "1099"].iter().any(|marker| upper.contains(marker)) {
                return Some(upper);
            }
        }
    }
    None
}
