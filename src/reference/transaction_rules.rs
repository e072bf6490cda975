use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::TollingCategory;

/// How a transaction code opens (and what closes) a statute suspension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TollingRule {
    pub category: TollingCategory,
    /// Days added on top of any measured interval.
    pub fixed_days: i64,
    /// Codes that terminate the interval. Empty for flat extensions.
    pub closing_codes: Vec<String>,
}

impl TollingRule {
    pub fn is_interval(&self) -> bool {
        !self.closing_codes.is_empty()
    }
}

/// Classification attached to an IRS transaction code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRule {
    pub description: &'static str,
    pub affects_balance: bool,
    pub affects_csed: bool,
    pub indicates_collection_action: bool,
    pub tolling: Option<TollingRule>,
}

/// Immutable code → rule mapping.
#[derive(Debug, Clone)]
pub struct TransactionRuleTable {
    rules: BTreeMap<String, TransactionRule>,
}

impl TransactionRuleTable {
    pub fn builtin() -> Self {
        let mut rules = BTreeMap::new();
        let mut add = |code: &str, rule: TransactionRule| {
            rules.insert(code.to_string(), rule);
        };

        add(
            "150",
            TransactionRule {
                description: "Tax return filed / tax assessed",
                affects_balance: true,
                affects_csed: false,
                indicates_collection_action: false,
                tolling: None,
            },
        );
        add(
            "196",
            TransactionRule {
                description: "Interest assessed",
                affects_balance: true,
                affects_csed: true,
                indicates_collection_action: false,
                tolling: Some(TollingRule {
                    category: TollingCategory::Penalty,
                    fixed_days: 30,
                    closing_codes: Vec::new(),
                }),
            },
        );
        add(
            "276",
            TransactionRule {
                description: "Failure-to-pay penalty assessed",
                affects_balance: true,
                affects_csed: true,
                indicates_collection_action: false,
                tolling: Some(TollingRule {
                    category: TollingCategory::Penalty,
                    fixed_days: 30,
                    closing_codes: Vec::new(),
                }),
            },
        );
        for code in ["420", "424", "430"] {
            add(
                code,
                TransactionRule {
                    description: "Examination / underreporter review opened",
                    affects_balance: false,
                    affects_csed: false,
                    indicates_collection_action: false,
                    tolling: None,
                },
            );
        }
        add(
            "480",
            TransactionRule {
                description: "Offer in compromise pending",
                affects_balance: false,
                affects_csed: true,
                indicates_collection_action: false,
                tolling: Some(TollingRule {
                    category: TollingCategory::OfferInCompromise,
                    fixed_days: 30,
                    closing_codes: vec!["481".to_string(), "482".to_string(), "483".to_string()],
                }),
            },
        );
        for (code, description) in [
            ("481", "Offer in compromise rejected"),
            ("482", "Offer in compromise withdrawn"),
            ("483", "Offer in compromise returned"),
        ] {
            add(
                code,
                TransactionRule {
                    description,
                    affects_balance: false,
                    affects_csed: true,
                    indicates_collection_action: false,
                    tolling: None,
                },
            );
        }
        add(
            "520",
            TransactionRule {
                description: "Bankruptcy or other litigation filed",
                affects_balance: false,
                affects_csed: true,
                indicates_collection_action: false,
                tolling: Some(TollingRule {
                    category: TollingCategory::Bankruptcy,
                    fixed_days: 180,
                    closing_codes: vec!["521".to_string()],
                }),
            },
        );
        add(
            "521",
            TransactionRule {
                description: "Bankruptcy or other litigation closed",
                affects_balance: false,
                affects_csed: true,
                indicates_collection_action: false,
                tolling: None,
            },
        );
        add(
            "530",
            TransactionRule {
                description: "Account placed in currently-not-collectible status",
                affects_balance: false,
                affects_csed: false,
                indicates_collection_action: true,
                tolling: None,
            },
        );
        add(
            "582",
            TransactionRule {
                description: "Federal tax lien recorded",
                affects_balance: false,
                affects_csed: false,
                indicates_collection_action: true,
                tolling: None,
            },
        );
        add(
            "610",
            TransactionRule {
                description: "Payment received with return",
                affects_balance: true,
                affects_csed: false,
                indicates_collection_action: false,
                tolling: None,
            },
        );
        add(
            "670",
            TransactionRule {
                description: "Subsequent payment",
                affects_balance: true,
                affects_csed: false,
                indicates_collection_action: false,
                tolling: None,
            },
        );
        add(
            "706",
            TransactionRule {
                description: "Overpayment applied from another period",
                affects_balance: true,
                affects_csed: false,
                indicates_collection_action: false,
                tolling: None,
            },
        );
        add(
            "806",
            TransactionRule {
                description: "Withholding and excess FICA credit",
                affects_balance: true,
                affects_csed: false,
                indicates_collection_action: false,
                tolling: None,
            },
        );
        add(
            "971",
            TransactionRule {
                description: "Collection due process notice issued",
                affects_balance: false,
                affects_csed: true,
                indicates_collection_action: true,
                tolling: Some(TollingRule {
                    category: TollingCategory::CollectionDueProcess,
                    fixed_days: 0,
                    closing_codes: vec!["972".to_string()],
                }),
            },
        );
        add(
            "972",
            TransactionRule {
                description: "Collection due process resolved",
                affects_balance: false,
                affects_csed: true,
                indicates_collection_action: false,
                tolling: None,
            },
        );

        Self { rules }
    }

    pub fn rule(&self, code: &str) -> Option<&TransactionRule> {
        self.rules.get(code.trim())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
