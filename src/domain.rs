use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for the external case number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaseId(pub String);

impl CaseId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Root entity a document batch hangs off. Taxpayer and spouse identifiers
/// are learned during extraction and drive filer attribution of wage forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub taxpayer_id: Option<String>,
    pub spouse_id: Option<String>,
}

/// Whose liability a record describes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum FilerRole {
    #[default]
    Taxpayer,
    Spouse,
    Joint,
}

impl FilerRole {
    pub const fn label(self) -> &'static str {
        match self {
            FilerRole::Taxpayer => "taxpayer",
            FilerRole::Spouse => "spouse",
            FilerRole::Joint => "joint",
        }
    }
}

/// Return filing status, parsed leniently from transcript strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
}

impl FilingStatus {
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "single" | "s" => Some(Self::Single),
            "marriedfilingjoint" | "marriedfilingjointly" | "mfj" | "joint" => {
                Some(Self::MarriedFilingJointly)
            }
            "marriedfilingseparate" | "marriedfilingseparately" | "mfs" | "separate" => {
                Some(Self::MarriedFilingSeparately)
            }
            "headofhousehold" | "hoh" => Some(Self::HeadOfHousehold),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedFilingJointly => "married_filing_jointly",
            FilingStatus::MarriedFilingSeparately => "married_filing_separately",
            FilingStatus::HeadOfHousehold => "head_of_household",
        }
    }
}

/// Natural key of a tax-year row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaxYearKey {
    pub case_id: CaseId,
    pub year: i32,
    pub filer: FilerRole,
}

/// Per-year account state. Extraction owns the reported fields; the analysis
/// pass owns everything derived (balance, statute dates, indicators) and
/// rewrites them wholesale on each recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxYearRecord {
    pub key: TaxYearKey,
    pub filing_status: Option<FilingStatus>,
    pub return_filed: bool,
    pub return_filed_date: Option<NaiveDate>,
    pub adjusted_gross_income: Option<f64>,
    pub taxable_income: Option<f64>,
    pub reported_balance: Option<f64>,
    pub current_balance: Option<f64>,
    pub base_csed_date: Option<NaiveDate>,
    pub adjusted_csed_date: Option<NaiveDate>,
    pub csed_state: CsedState,
    pub aur_indicator: bool,
    pub sfr_indicator: bool,
}

impl TaxYearRecord {
    pub fn new(key: TaxYearKey) -> Self {
        Self {
            key,
            filing_status: None,
            return_filed: false,
            return_filed_date: None,
            adjusted_gross_income: None,
            taxable_income: None,
            reported_balance: None,
            current_balance: None,
            base_csed_date: None,
            adjusted_csed_date: None,
            csed_state: CsedState::NotFiled,
            aur_indicator: false,
            sfr_indicator: false,
        }
    }

    /// Clears every analysis-owned field ahead of a recompute.
    pub fn reset_derived(&mut self) {
        self.current_balance = None;
        self.base_csed_date = None;
        self.adjusted_csed_date = None;
        self.csed_state = CsedState::NotFiled;
        self.aur_indicator = false;
        self.sfr_indicator = false;
    }
}

/// Where a tax year sits in the collection-statute lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CsedState {
    /// No filed return, so no statute clock is running.
    #[default]
    NotFiled,
    /// Base date set from the filing date; no tolling applied yet.
    BaseSet,
    /// One or more tolling events are suspending the clock.
    Tolled(u32),
    /// Adjusted date computed from the complete event set.
    Final,
}

/// One account-transcript transaction, enriched from the transaction-code
/// rule table. Enrichment fields are never set by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountActivityEvent {
    pub tax_year: TaxYearKey,
    pub code: String,
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub explanation: Option<String>,
    pub affects_balance: bool,
    pub affects_csed: bool,
    pub indicates_collection_action: bool,
    pub tolling_category: Option<TollingCategory>,
}

/// Legal event families that suspend the collection statute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TollingCategory {
    Bankruptcy,
    OfferInCompromise,
    CollectionDueProcess,
    Penalty,
}

impl TollingCategory {
    pub const fn label(self) -> &'static str {
        match self {
            TollingCategory::Bankruptcy => "bankruptcy",
            TollingCategory::OfferInCompromise => "offer_in_compromise",
            TollingCategory::CollectionDueProcess => "collection_due_process",
            TollingCategory::Penalty => "penalty",
        }
    }
}

/// Classification a wage or income form resolves to through the form-type
/// rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum IncomeCategory {
    Wages,
    SelfEmployment,
    Interest,
    Dividends,
    Retirement,
    SocialSecurity,
    GovernmentPayments,
    Gambling,
    CapitalGains,
    InformationOnly,
    #[default]
    Unknown,
}

impl IncomeCategory {
    pub const fn label(self) -> &'static str {
        match self {
            IncomeCategory::Wages => "wages",
            IncomeCategory::SelfEmployment => "self_employment",
            IncomeCategory::Interest => "interest",
            IncomeCategory::Dividends => "dividends",
            IncomeCategory::Retirement => "retirement",
            IncomeCategory::SocialSecurity => "social_security",
            IncomeCategory::GovernmentPayments => "government_payments",
            IncomeCategory::Gambling => "gambling",
            IncomeCategory::CapitalGains => "capital_gains",
            IncomeCategory::InformationOnly => "information_only",
            IncomeCategory::Unknown => "unknown",
        }
    }
}

/// One wage/income information return (W-2, 1099 family, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeDocumentRecord {
    pub tax_year: TaxYearKey,
    pub document_type: String,
    pub gross_amount: Option<f64>,
    pub federal_withholding: Option<f64>,
    pub issuer_name: Option<String>,
    pub issuer_id: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_id: Option<String>,
    pub category: IncomeCategory,
    pub is_self_employment: bool,
}

/// Monthly expense buckets used for resolution math. The actual-only set
/// never consults the published standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Food,
    Housekeeping,
    Apparel,
    PersonalCare,
    Miscellaneous,
    Housing,
    Utilities,
    Transportation,
    PublicTransportation,
    HealthCare,
    HealthInsurance,
    Taxes,
    ChildCare,
    CourtPayments,
    LifeInsurance,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 15] = [
        ExpenseCategory::Food,
        ExpenseCategory::Housekeeping,
        ExpenseCategory::Apparel,
        ExpenseCategory::PersonalCare,
        ExpenseCategory::Miscellaneous,
        ExpenseCategory::Housing,
        ExpenseCategory::Utilities,
        ExpenseCategory::Transportation,
        ExpenseCategory::PublicTransportation,
        ExpenseCategory::HealthCare,
        ExpenseCategory::HealthInsurance,
        ExpenseCategory::Taxes,
        ExpenseCategory::ChildCare,
        ExpenseCategory::CourtPayments,
        ExpenseCategory::LifeInsurance,
    ];

    /// Categories where only the reported actual is allowable.
    pub const fn actual_only(self) -> bool {
        matches!(
            self,
            ExpenseCategory::HealthInsurance
                | ExpenseCategory::Taxes
                | ExpenseCategory::ChildCare
                | ExpenseCategory::CourtPayments
                | ExpenseCategory::LifeInsurance
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Food => "food",
            ExpenseCategory::Housekeeping => "housekeeping",
            ExpenseCategory::Apparel => "apparel",
            ExpenseCategory::PersonalCare => "personal_care",
            ExpenseCategory::Miscellaneous => "miscellaneous",
            ExpenseCategory::Housing => "housing",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Transportation => "transportation",
            ExpenseCategory::PublicTransportation => "public_transportation",
            ExpenseCategory::HealthCare => "health_care",
            ExpenseCategory::HealthInsurance => "health_insurance",
            ExpenseCategory::Taxes => "taxes",
            ExpenseCategory::ChildCare => "child_care",
            ExpenseCategory::CourtPayments => "court_payments",
            ExpenseCategory::LifeInsurance => "life_insurance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        let category = match normalized.as_str() {
            "food" => Self::Food,
            "housekeeping" => Self::Housekeeping,
            "apparel" | "clothing" => Self::Apparel,
            "personalcare" => Self::PersonalCare,
            "miscellaneous" | "misc" => Self::Miscellaneous,
            "housing" => Self::Housing,
            "utilities" => Self::Utilities,
            "transportation" | "vehicle" => Self::Transportation,
            "publictransportation" => Self::PublicTransportation,
            "healthcare" => Self::HealthCare,
            "healthinsurance" => Self::HealthInsurance,
            "taxes" => Self::Taxes,
            "childcare" => Self::ChildCare,
            "courtpayments" => Self::CourtPayments,
            "lifeinsurance" => Self::LifeInsurance,
            _ => return None,
        };
        Some(category)
    }
}

/// An asset line from the financial interview: current value and any loan
/// balance secured against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub name: String,
    pub value: f64,
    pub loan_balance: f64,
}

/// Household financial picture assembled from the interview document.
/// Single row per case, replaced on re-extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionProfile {
    pub case_id: CaseId,
    pub household_size: u32,
    pub members_under_65: Option<u32>,
    pub members_over_65: Option<u32>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub monthly_income: BTreeMap<String, f64>,
    pub actual_expenses: BTreeMap<ExpenseCategory, f64>,
    pub assets: Vec<AssetRecord>,
}

impl CollectionProfile {
    pub fn new(case_id: CaseId) -> Self {
        Self {
            case_id,
            household_size: 1,
            members_under_65: None,
            members_over_65: None,
            state: None,
            county: None,
            monthly_income: BTreeMap::new(),
            actual_expenses: BTreeMap::new(),
            assets: Vec::new(),
        }
    }

    pub fn total_monthly_income(&self) -> f64 {
        self.monthly_income.values().sum()
    }

    pub fn total_asset_value(&self) -> f64 {
        self.assets.iter().map(|asset| asset.value).sum()
    }

    pub fn total_liabilities(&self) -> f64 {
        self.assets.iter().map(|asset| asset.loan_balance).sum()
    }

    /// Locality key used against the expense-standard table.
    pub fn locality(&self) -> String {
        match (self.county.as_deref(), self.state.as_deref()) {
            (Some(county), Some(state)) => format!("{county}, {state}").to_ascii_uppercase(),
            (None, Some(state)) => state.to_ascii_uppercase(),
            _ => "NATIONAL".to_string(),
        }
    }
}

/// A materialized statute suspension derived from qualifying account events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TollingEvent {
    pub tax_year: TaxYearKey,
    pub category: TollingCategory,
    pub opened_on: Option<NaiveDate>,
    pub closed_on: Option<NaiveDate>,
    pub interval_days: Option<i64>,
    pub fixed_days: i64,
    /// Days this event adds to the statute date; `None` while an interval
    /// remains open and cannot be measured yet.
    pub extension_days: Option<i64>,
}
