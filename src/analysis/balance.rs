use crate::domain::{AccountActivityEvent, TaxYearRecord};

/// Examination / automated-underreporter codes.
const EXAMINATION_CODES: [&str; 3] = ["420", "424", "430"];

/// Assessment code whose explanation reveals a substitute-for-return.
const ASSESSMENT_CODE: &str = "150";
const SUBSTITUTE_MARKERS: [&str; 2] = ["SFR", "SUBSTITUTE"];

/// The transcript's own balance figure wins when present; otherwise the
/// balance is reconstructed from the balance-affecting transactions.
pub fn current_balance(
    record: &TaxYearRecord,
    events: &[AccountActivityEvent],
) -> Option<f64> {
    if record.reported_balance.is_some() {
        return record.reported_balance;
    }

    let amounts: Vec<f64> = events
        .iter()
        .filter(|event| event.affects_balance)
        .filter_map(|event| event.amount)
        .collect();
    if amounts.is_empty() {
        return None;
    }
    Some(amounts.into_iter().sum())
}

pub fn aur_indicator(events: &[AccountActivityEvent]) -> bool {
    events
        .iter()
        .any(|event| EXAMINATION_CODES.contains(&event.code.as_str()))
}

pub fn sfr_indicator(events: &[AccountActivityEvent]) -> bool {
    events.iter().any(|event| {
        event.code == ASSESSMENT_CODE
            && event
                .explanation
                .as_deref()
                .map(|text| {
                    let upper = text.to_ascii_uppercase();
                    SUBSTITUTE_MARKERS.iter().any(|marker| upper.contains(marker))
                })
                .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseId, FilerRole, TaxYearKey};

    fn key() -> TaxYearKey {
        TaxYearKey {
            case_id: CaseId::new("1333562"),
            year: 2019,
            filer: FilerRole::Taxpayer,
        }
    }

    fn event(code: &str, amount: Option<f64>, affects_balance: bool) -> AccountActivityEvent {
        AccountActivityEvent {
            tax_year: key(),
            code: code.to_string(),
            date: None,
            amount,
            explanation: None,
            affects_balance,
            affects_csed: false,
            indicates_collection_action: false,
            tolling_category: None,
        }
    }

    #[test]
    fn reported_balance_wins_over_reconstruction() {
        let mut record = TaxYearRecord::new(key());
        record.reported_balance = Some(7_500.0);
        let events = vec![event("150", Some(5_000.0), true)];
        assert_eq!(current_balance(&record, &events), Some(7_500.0));
    }

    #[test]
    fn balance_reconstructs_from_flagged_transactions_only() {
        let record = TaxYearRecord::new(key());
        let events = vec![
            event("150", Some(5_000.0), true),
            event("670", Some(-1_200.0), true),
            event("971", Some(999.0), false),
        ];
        assert_eq!(current_balance(&record, &events), Some(3_800.0));
    }

    #[test]
    fn no_information_means_no_balance_not_zero() {
        let record = TaxYearRecord::new(key());
        assert_eq!(current_balance(&record, &[]), None);
    }

    #[test]
    fn examination_codes_raise_the_aur_flag() {
        assert!(aur_indicator(&[event("420", None, false)]));
        assert!(!aur_indicator(&[event("670", None, true)]));
    }

    #[test]
    fn substitute_return_detected_from_assessment_explanation() {
        let mut assessed = event("150", Some(4_000.0), true);
        assessed.explanation = Some("Substitute tax return prepared by IRS".to_string());
        assert!(sfr_indicator(&[assessed]));

        let mut ordinary = event("150", Some(4_000.0), true);
        ordinary.explanation = Some("Tax return filed".to_string());
        assert!(!sfr_indicator(&[ordinary]));
    }
}
