use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::IncomeCategory;

/// Classification for one information-return form code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRule {
    pub category: IncomeCategory,
    pub is_self_employment: bool,
}

/// Form code → classification. Lookups ignore punctuation and case, so
/// `W2`, `w-2`, and `W-2` resolve identically.
#[derive(Debug, Clone)]
pub struct DocumentRuleTable {
    rules: BTreeMap<String, DocumentRule>,
}

fn canonical(form_code: &str) -> String {
    form_code
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase()
}

impl DocumentRuleTable {
    pub fn builtin() -> Self {
        let entries: [(&str, IncomeCategory, bool); 13] = [
            ("W-2", IncomeCategory::Wages, false),
            ("W-2G", IncomeCategory::Gambling, false),
            ("1099-NEC", IncomeCategory::SelfEmployment, true),
            ("1099-MISC", IncomeCategory::SelfEmployment, true),
            ("1099-K", IncomeCategory::SelfEmployment, true),
            ("1099-INT", IncomeCategory::Interest, false),
            ("1099-DIV", IncomeCategory::Dividends, false),
            ("1099-B", IncomeCategory::CapitalGains, false),
            ("1099-R", IncomeCategory::Retirement, false),
            ("1099-G", IncomeCategory::GovernmentPayments, false),
            ("SSA-1099", IncomeCategory::SocialSecurity, false),
            ("1098", IncomeCategory::InformationOnly, false),
            ("5498", IncomeCategory::InformationOnly, false),
        ];

        let rules = entries
            .into_iter()
            .map(|(code, category, is_self_employment)| {
                (
                    canonical(code),
                    DocumentRule {
                        category,
                        is_self_employment,
                    },
                )
            })
            .collect();

        Self { rules }
    }

    pub fn rule(&self, form_code: &str) -> Option<DocumentRule> {
        self.rules.get(&canonical(form_code)).copied()
    }

    /// Rule lookup that never misses: unmatched codes classify as `Unknown`,
    /// non-self-employment.
    pub fn classify(&self, form_code: &str) -> DocumentRule {
        self.rule(form_code).unwrap_or(DocumentRule {
            category: IncomeCategory::Unknown,
            is_self_employment: false,
        })
    }
}
