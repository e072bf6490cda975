use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{AccountActivityEvent, CsedState, TaxYearRecord, TollingEvent};
use crate::reference::TransactionRuleTable;

/// Years the statute runs from the filing date before tolling.
const STATUTE_MONTHS: u32 = 120;

/// Outcome of one statute computation for a tax year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsedResolution {
    pub state: CsedState,
    pub base_date: Option<NaiveDate>,
    pub adjusted_date: Option<NaiveDate>,
    pub tolling: Vec<TollingEvent>,
}

/// Walks the statute machine for one tax year:
/// `NotFiled → BaseSet → Tolled(n) → Final`.
///
/// The base date is the filing date plus ten years, set only once a return
/// is actually filed. Every qualifying event then materializes a
/// `TollingEvent`; interval categories pair an opening code with the
/// earliest later closing code, and an interval still missing its close
/// holds the year at `Tolled(n)` with a provisional adjusted date. The
/// adjusted date is always base plus the sum of measurable extensions,
/// recomputed from the complete event set.
pub fn resolve(
    record: &TaxYearRecord,
    events: &[AccountActivityEvent],
    rules: &TransactionRuleTable,
) -> CsedResolution {
    let filed_date = record.return_filed.then_some(record.return_filed_date).flatten();
    let Some(filed_on) = filed_date else {
        return CsedResolution {
            state: CsedState::NotFiled,
            base_date: None,
            adjusted_date: None,
            tolling: Vec::new(),
        };
    };

    let base_date = filed_on.checked_add_months(Months::new(STATUTE_MONTHS));
    let Some(base) = base_date else {
        // Filing date so far out that the statute date overflows; nothing
        // sensible to compute.
        return CsedResolution {
            state: CsedState::NotFiled,
            base_date: None,
            adjusted_date: None,
            tolling: Vec::new(),
        };
    };

    let mut statute_events: Vec<&AccountActivityEvent> =
        events.iter().filter(|event| event.affects_csed).collect();
    statute_events.sort_by(|a, b| (a.date, &a.code).cmp(&(b.date, &b.code)));

    if statute_events.is_empty() {
        return CsedResolution {
            state: CsedState::BaseSet,
            base_date: Some(base),
            adjusted_date: Some(base),
            tolling: Vec::new(),
        };
    }

    let mut tolling = Vec::new();
    let mut consumed_closures = vec![false; statute_events.len()];

    for (index, event) in statute_events.iter().enumerate() {
        let Some(tolling_rule) = rules.rule(&event.code).and_then(|rule| rule.tolling.as_ref())
        else {
            continue;
        };

        if !tolling_rule.is_interval() {
            tolling.push(TollingEvent {
                tax_year: record.key.clone(),
                category: tolling_rule.category,
                opened_on: event.date,
                closed_on: None,
                interval_days: None,
                fixed_days: tolling_rule.fixed_days,
                extension_days: Some(tolling_rule.fixed_days),
            });
            continue;
        }

        // Interval category: pair with the earliest unconsumed closing code
        // dated at or after the opening event.
        let closure = statute_events
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(candidate_index, candidate)| {
                !consumed_closures[*candidate_index]
                    && tolling_rule.closing_codes.contains(&candidate.code)
                    && candidate.date.is_some()
                    && event.date.is_some()
                    && candidate.date >= event.date
            });

        match closure {
            Some((closure_index, closing)) => {
                consumed_closures[closure_index] = true;
                let opened = event.date.unwrap_or(closing.date.unwrap_or(base));
                let closed = closing.date.unwrap_or(opened);
                let interval_days = (closed - opened).num_days();
                tolling.push(TollingEvent {
                    tax_year: record.key.clone(),
                    category: tolling_rule.category,
                    opened_on: event.date,
                    closed_on: closing.date,
                    interval_days: Some(interval_days),
                    fixed_days: tolling_rule.fixed_days,
                    extension_days: Some(interval_days + tolling_rule.fixed_days),
                });
            }
            None => {
                // Still open: nothing measurable yet, the clock is simply
                // suspended.
                tolling.push(TollingEvent {
                    tax_year: record.key.clone(),
                    category: tolling_rule.category,
                    opened_on: event.date,
                    closed_on: None,
                    interval_days: None,
                    fixed_days: tolling_rule.fixed_days,
                    extension_days: None,
                });
            }
        }
    }

    let extension_total: i64 = tolling
        .iter()
        .filter_map(|event| event.extension_days)
        .sum();
    let adjusted = base
        .checked_add_signed(chrono::Duration::days(extension_total))
        .unwrap_or(base);
    let pending = tolling.iter().any(|event| event.extension_days.is_none());

    let state = if pending {
        CsedState::Tolled(tolling.len() as u32)
    } else if tolling.is_empty() {
        CsedState::BaseSet
    } else {
        CsedState::Final
    };

    CsedResolution {
        state,
        base_date: Some(base),
        adjusted_date: Some(adjusted),
        tolling,
    }
}
