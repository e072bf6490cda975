use serde_json::Value;

use super::paths::{resolve, resolve_string};
use super::scalars::{parse_count, parse_money};
use super::{DocumentError, ExtractionOutcome, RawDocument};
use crate::domain::{AssetRecord, CollectionProfile, ExpenseCategory};
use crate::store::CaseStore;

// The interview payload is sectioned (employment / household / assets /
// income / expenses) with camelCase keys; older captures flatten sections or
// snake_case them, so every field lists both shapes.
const HOUSEHOLD_SIZE_KEYS: [&str; 3] = [
    "household.clientHouseMembers",
    "household.house_members",
    "household_size",
];
const UNDER_65_KEYS: [&str; 2] = ["household.under65", "household.under_65"];
const OVER_65_KEYS: [&str; 2] = ["household.over65", "household.over_65"];
const STATE_KEYS: [&str; 2] = ["household.state", "state"];
const COUNTY_KEYS: [&str; 2] = ["household.county", "county"];
const TAXPAYER_ID_KEYS: [&str; 3] = ["employment.clientSSN", "household.clientSSN", "clientSSN"];
const SPOUSE_ID_KEYS: [&str; 3] = ["employment.spouseSSN", "household.spouseSSN", "spouseSSN"];

/// Monthly income sources: stable name → candidate paths. Employment
/// monthlies win over the raw wage entries when both are present.
const INCOME_SOURCES: [(&str, &[&str]); 12] = [
    (
        "taxpayer_wages",
        &[
            "employment.clientMonthlyIncome",
            "employment.client_monthly_income",
            "income.clientWages",
            "income.client_wages",
        ],
    ),
    (
        "spouse_wages",
        &[
            "employment.spouseMonthlyIncome",
            "employment.spouse_monthly_income",
            "income.spouseWages",
            "income.spouse_wages",
        ],
    ),
    ("taxpayer_social_security", &["income.clientSocialSecurity"]),
    ("spouse_social_security", &["income.spouseSocialSecurity"]),
    ("taxpayer_pension", &["income.clientPension"]),
    ("spouse_pension", &["income.spousePension"]),
    ("dividends_interest", &["income.dividendsInterest"]),
    ("distributions", &["income.distributions"]),
    ("alimony", &["income.alimony"]),
    ("child_support", &["income.childSupport"]),
    ("other", &["income.otherIncome"]),
    ("additional", &["income.additional1"]),
];

const RENTAL_GROSS_KEYS: [&str; 1] = ["income.rentalGross"];
const RENTAL_EXPENSE_KEYS: [&str; 1] = ["income.rentalExpenses"];

/// Expense buckets: each category sums every path that resolves.
const EXPENSES: [(ExpenseCategory, &[&str]); 15] = [
    (ExpenseCategory::Food, &["expenses.food"]),
    (ExpenseCategory::Housekeeping, &["expenses.housekeeping"]),
    (ExpenseCategory::Apparel, &["expenses.apparel"]),
    (ExpenseCategory::PersonalCare, &["expenses.personalCare"]),
    (ExpenseCategory::Miscellaneous, &["expenses.misc"]),
    (
        ExpenseCategory::Housing,
        &[
            "expenses.mortgageLien1",
            "expenses.mortgageLien2",
            "expenses.rent",
            "expenses.insurance",
            "expenses.propertyTax",
        ],
    ),
    (
        ExpenseCategory::Utilities,
        &[
            "expenses.gas",
            "expenses.electricity",
            "expenses.water",
            "expenses.sewer",
            "expenses.cable",
            "expenses.trash",
            "expenses.phone",
        ],
    ),
    (
        ExpenseCategory::Transportation,
        &[
            "expenses.transportation",
            "expenses.autoInsurance",
            "expenses.autoPayment1",
            "expenses.autoPayment2",
        ],
    ),
    (
        ExpenseCategory::PublicTransportation,
        &["expenses.publicTransportation"],
    ),
    (
        ExpenseCategory::HealthCare,
        &["expenses.prescriptions", "expenses.copays"],
    ),
    (ExpenseCategory::HealthInsurance, &["expenses.healthInsurance"]),
    (ExpenseCategory::Taxes, &["expenses.taxes"]),
    (ExpenseCategory::ChildCare, &["expenses.childCare"]),
    (ExpenseCategory::CourtPayments, &["expenses.courtPayments"]),
    (
        ExpenseCategory::LifeInsurance,
        &["expenses.wholeLifeInsurance", "expenses.termLifeInsurance"],
    ),
];

/// Asset lines: value path(s) and the loan secured against the asset.
const ASSETS: [(&str, &[&str], &[&str]); 9] = [
    ("checking_accounts", &["assets.checkingAccounts"], &["assets.checkingLoans"]),
    ("cash_on_hand", &["assets.cashOnHand"], &["assets.cashLoans"]),
    ("investments", &["assets.investments"], &[]),
    ("life_insurance_cash_value", &["assets.lifeInsurance"], &[]),
    ("retirement_accounts", &["assets.retirement"], &[]),
    ("real_estate", &["assets.realEstateValue"], &["assets.realEstateLoan"]),
    ("vehicle_1", &["assets.vehicle1Value"], &["assets.vehicle1Loan"]),
    ("vehicle_2", &["assets.vehicle2Value"], &["assets.vehicle2Loan"]),
    ("vehicle_3", &["assets.vehicle3Value"], &["assets.vehicle3Loan"]),
];

pub(super) fn extract(
    document: &RawDocument,
    store: &mut CaseStore,
) -> Result<ExtractionOutcome, DocumentError> {
    let payload = &document.payload;
    let known_section = ["employment", "household", "assets", "income", "expenses"]
        .iter()
        .any(|section| payload.get(section).map(Value::is_object).unwrap_or(false));
    if !known_section {
        return Err(DocumentError::Unparseable {
            kind: document.kind.label(),
            case: document.case_id.0.clone(),
            reason: "no recognizable interview section".to_string(),
        });
    }

    let mut profile = CollectionProfile::new(document.case_id.clone());

    profile.household_size = resolve(payload, &HOUSEHOLD_SIZE_KEYS)
        .and_then(parse_count)
        .filter(|size| *size > 0)
        .unwrap_or(1);
    profile.members_under_65 = resolve(payload, &UNDER_65_KEYS).and_then(parse_count);
    profile.members_over_65 = resolve(payload, &OVER_65_KEYS).and_then(parse_count);
    profile.state = resolve_string(payload, &STATE_KEYS);
    profile.county = resolve_string(payload, &COUNTY_KEYS);

    for (name, candidates) in INCOME_SOURCES {
        if let Some(amount) = resolve(payload, candidates).and_then(|v| parse_money(v)) {
            if amount != 0.0 {
                profile.monthly_income.insert(name.to_string(), amount);
            }
        }
    }

    // Rental nets out its expenses; a loss counts as zero income, not a
    // deduction against other sources.
    let rental_gross = resolve(payload, &RENTAL_GROSS_KEYS).and_then(|v| parse_money(v));
    if let Some(gross) = rental_gross {
        let expenses = resolve(payload, &RENTAL_EXPENSE_KEYS)
            .and_then(|v| parse_money(v))
            .unwrap_or(0.0);
        let net = (gross - expenses).max(0.0);
        if net != 0.0 {
            profile.monthly_income.insert("net_rental".to_string(), net);
        }
    }

    for (category, candidates) in EXPENSES {
        let total: f64 = candidates
            .iter()
            .filter_map(|path| resolve(payload, &[*path]).and_then(|v| parse_money(v)))
            .sum();
        if total != 0.0 {
            profile.actual_expenses.insert(category, total);
        }
    }

    for (name, value_paths, loan_paths) in ASSETS {
        let value = resolve(payload, value_paths)
            .and_then(|v| parse_money(v))
            .unwrap_or(0.0);
        let loan_balance = resolve(payload, loan_paths)
            .and_then(|v| parse_money(v))
            .unwrap_or(0.0);
        if value != 0.0 || loan_balance != 0.0 {
            profile.assets.push(AssetRecord {
                name: name.to_string(),
                value,
                loan_balance,
            });
        }
    }

    let taxpayer_id = resolve_string(payload, &TAXPAYER_ID_KEYS);
    let spouse_id = resolve_string(payload, &SPOUSE_ID_KEYS);
    let case = store.ensure_case(&document.case_id);
    if taxpayer_id.is_some() {
        case.taxpayer_id = taxpayer_id;
    }
    if spouse_id.is_some() {
        case.spouse_id = spouse_id;
    }

    store.upsert_profile(profile);

    Ok(ExtractionOutcome {
        case_id: document.case_id.clone(),
        kind: document.kind,
        records_written: 1,
        failures: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CaseId;
    use crate::extraction::DocumentKind;
    use serde_json::json;

    fn interview_document(payload: Value) -> RawDocument {
        RawDocument {
            case_id: CaseId::new("1295022"),
            kind: DocumentKind::Interview,
            payload,
        }
    }

    #[test]
    fn builds_profile_from_sectioned_payload() {
        let mut store = CaseStore::new();
        let document = interview_document(json!({
            "employment": {
                "clientMonthlyIncome": "3,200",
                "spouseMonthlyIncome": 1800,
                "clientSSN": "111-22-3333",
                "spouseSSN": "987-65-4321"
            },
            "household": {"clientHouseMembers": "3", "state": "IA", "county": "Polk"},
            "income": {"clientSocialSecurity": 0, "dividendsInterest": "50"},
            "expenses": {
                "food": 700, "rent": "1,100", "gas": 80, "electricity": 120,
                "healthInsurance": 350, "childCare": 400
            },
            "assets": {
                "checkingAccounts": "2,500",
                "vehicle1Value": "9,000", "vehicle1Loan": "4,000"
            }
        }));

        extract(&document, &mut store).expect("extracts");

        let profile = store.profile(&CaseId::new("1295022")).expect("profile");
        assert_eq!(profile.household_size, 3);
        assert_eq!(profile.state.as_deref(), Some("IA"));
        assert_eq!(profile.total_monthly_income(), 3_200.0 + 1_800.0 + 50.0);
        assert_eq!(
            profile.actual_expenses.get(&ExpenseCategory::Housing),
            Some(&1_100.0)
        );
        assert_eq!(
            profile.actual_expenses.get(&ExpenseCategory::Utilities),
            Some(&200.0)
        );
        assert_eq!(profile.total_asset_value(), 2_500.0 + 9_000.0);
        assert_eq!(profile.total_liabilities(), 4_000.0);

        let case = store.case(&CaseId::new("1295022")).expect("case");
        assert_eq!(case.spouse_id.as_deref(), Some("987-65-4321"));
    }

    #[test]
    fn rental_loss_counts_as_zero_not_negative_income() {
        let mut store = CaseStore::new();
        let document = interview_document(json!({
            "income": {"rentalGross": 900, "rentalExpenses": 1_200}
        }));

        extract(&document, &mut store).expect("extracts");
        let profile = store.profile(&CaseId::new("1295022")).expect("profile");
        assert!(profile.monthly_income.get("net_rental").is_none());
        assert_eq!(profile.total_monthly_income(), 0.0);
    }

    #[test]
    fn reextraction_replaces_the_profile() {
        let mut store = CaseStore::new();
        extract(
            &interview_document(json!({"expenses": {"food": 500}})),
            &mut store,
        )
        .expect("first");
        extract(
            &interview_document(json!({"expenses": {"rent": 900}})),
            &mut store,
        )
        .expect("second");

        let profile = store.profile(&CaseId::new("1295022")).expect("profile");
        assert!(profile.actual_expenses.get(&ExpenseCategory::Food).is_none());
        assert_eq!(
            profile.actual_expenses.get(&ExpenseCategory::Housing),
            Some(&900.0)
        );
    }

    #[test]
    fn sectionless_payload_is_a_document_error() {
        let mut store = CaseStore::new();
        let document = interview_document(json!({"something": "else"}));
        let error = extract(&document, &mut store).expect_err("error");
        assert!(matches!(error, DocumentError::Unparseable { .. }));
    }
}
