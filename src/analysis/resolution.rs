use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CaseId, CollectionProfile, ExpenseCategory, TaxYearRecord};
use crate::reference::ReferenceTables;

/// Discount applied to net asset equity in a quick sale.
const QUICK_SALE_FACTOR: f64 = 0.80;
/// Months of future disposable income priced into an offer.
const FUTURE_INCOME_MONTHS: f64 = 24.0;
/// An offer makes sense when collection potential sits below this share of
/// the debt.
const OFFER_DEBT_THRESHOLD: f64 = 0.80;
/// Offers are recommended slightly under full collection potential.
const RECOMMENDED_OFFER_FACTOR: f64 = 0.90;
/// Average month length used to turn a date gap into months.
const DAYS_PER_MONTH: f64 = 30.4375;

/// One expense line in the disposable-income computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowableExpense {
    pub category: ExpenseCategory,
    pub reported_actual: f64,
    pub published_standard: Option<f64>,
    pub allowed: f64,
}

/// Installment-agreement assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentAgreement {
    pub eligible: bool,
    pub monthly_payment: Option<f64>,
    pub payoff_months: Option<f64>,
    pub months_until_expiration: Option<f64>,
}

/// Offer-in-compromise assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferInCompromise {
    pub eligible: bool,
    pub quick_sale_value: f64,
    pub future_income_value: f64,
    pub reasonable_collection_potential: f64,
    pub recommended_offer: f64,
}

/// Currently-not-collectible assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentlyNotCollectible {
    pub eligible: bool,
}

/// All three resolution paths, always evaluated independently and reported
/// together; choosing between them is the practitioner's call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOptions {
    pub case_id: CaseId,
    pub total_monthly_income: f64,
    pub allowable_expenses: Vec<AllowableExpense>,
    pub total_allowable_expenses: f64,
    pub disposable_income: f64,
    pub total_balance: f64,
    pub installment_agreement: InstallmentAgreement,
    pub offer_in_compromise: OfferInCompromise,
    pub currently_not_collectible: CurrentlyNotCollectible,
}

/// Complete evaluation for one case as of a given day.
pub fn evaluate(
    profile: &CollectionProfile,
    tax_years: &[&TaxYearRecord],
    tables: &ReferenceTables,
    as_of: NaiveDate,
) -> ResolutionOptions {
    let locality = profile.locality();
    let household_size = profile.household_size;

    let mut allowable_expenses = Vec::new();
    for category in ExpenseCategory::ALL {
        let reported_actual = profile
            .actual_expenses
            .get(&category)
            .copied()
            .unwrap_or(0.0);

        if category.actual_only() {
            if reported_actual > 0.0 {
                allowable_expenses.push(AllowableExpense {
                    category,
                    reported_actual,
                    published_standard: None,
                    allowed: reported_actual,
                });
            }
            continue;
        }

        let published_standard =
            tables
                .expense_standards
                .standard(&locality, household_size, category);
        let allowed = match published_standard {
            Some(standard) => standard.max(reported_actual),
            None => reported_actual,
        };
        if allowed > 0.0 {
            allowable_expenses.push(AllowableExpense {
                category,
                reported_actual,
                published_standard,
                allowed,
            });
        }
    }

    let total_allowable_expenses: f64 = allowable_expenses.iter().map(|e| e.allowed).sum();
    let total_monthly_income = profile.total_monthly_income();
    let disposable_income = total_monthly_income - total_allowable_expenses;

    let total_balance: f64 = tax_years
        .iter()
        .filter_map(|year| year.current_balance)
        .filter(|balance| *balance > 0.0)
        .sum();

    let months_until_expiration = latest_statute_date(tax_years)
        .map(|expires| ((expires - as_of).num_days().max(0)) as f64 / DAYS_PER_MONTH);

    let installment_agreement =
        assess_installment(disposable_income, total_balance, months_until_expiration);
    let offer_in_compromise = assess_offer(profile, disposable_income, total_balance);
    let currently_not_collectible = CurrentlyNotCollectible {
        eligible: disposable_income <= 0.0,
    };

    ResolutionOptions {
        case_id: profile.case_id.clone(),
        total_monthly_income,
        allowable_expenses,
        total_allowable_expenses,
        disposable_income,
        total_balance,
        installment_agreement,
        offer_in_compromise,
        currently_not_collectible,
    }
}

/// The last statute expiration among years still carrying a balance: the
/// payoff horizon an agreement has to fit inside.
fn latest_statute_date(tax_years: &[&TaxYearRecord]) -> Option<NaiveDate> {
    tax_years
        .iter()
        .filter(|year| year.current_balance.map(|b| b > 0.0).unwrap_or(false))
        .filter_map(|year| year.adjusted_csed_date)
        .max()
}

fn assess_installment(
    disposable_income: f64,
    total_balance: f64,
    months_until_expiration: Option<f64>,
) -> InstallmentAgreement {
    if disposable_income <= 0.0 || total_balance <= 0.0 {
        return InstallmentAgreement {
            eligible: false,
            monthly_payment: None,
            payoff_months: None,
            months_until_expiration,
        };
    }

    let payoff_months = total_balance / disposable_income;
    let eligible = months_until_expiration
        .map(|window| payoff_months < window)
        .unwrap_or(false);

    InstallmentAgreement {
        eligible,
        monthly_payment: Some(disposable_income),
        payoff_months: Some(payoff_months),
        months_until_expiration,
    }
}

fn assess_offer(
    profile: &CollectionProfile,
    disposable_income: f64,
    total_balance: f64,
) -> OfferInCompromise {
    let quick_sale_value =
        (profile.total_asset_value() - profile.total_liabilities()) * QUICK_SALE_FACTOR;
    let future_income_value = disposable_income * FUTURE_INCOME_MONTHS;
    let reasonable_collection_potential = quick_sale_value + future_income_value;
    let recommended_offer = reasonable_collection_potential * RECOMMENDED_OFFER_FACTOR;

    let eligible = total_balance > 0.0
        && disposable_income >= 0.0
        && reasonable_collection_potential < total_balance * OFFER_DEBT_THRESHOLD;

    OfferInCompromise {
        eligible,
        quick_sale_value,
        future_income_value,
        reasonable_collection_potential,
        recommended_offer,
    }
}
