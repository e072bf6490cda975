use serde_json::Value;

/// Resolves the first candidate path that yields a present, non-null,
/// non-empty value. Paths may reach into nested objects with dots
/// (`"Issuer.EIN"`). Source documents disagree on key names and nesting, so
/// every extracted field declares its candidates up front and flows through
/// this one interpreter.
pub fn resolve<'a>(object: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .find_map(|path| lookup(object, path).filter(|value| is_present(value)))
}

fn lookup<'a>(object: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = object;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// String resolution: trims, and stringifies bare numbers so identifier
/// fields survive documents that carry them unquoted.
pub fn resolve_string(object: &Value, candidates: &[&str]) -> Option<String> {
    match resolve(object, candidates)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_present_candidate_wins() {
        let form = json!({"income": 100.0, "gross_amount": 250.0});
        let value = resolve(&form, &["Income", "income", "gross_amount"]).expect("resolved");
        assert_eq!(value.as_f64(), Some(100.0));
    }

    #[test]
    fn null_and_empty_values_are_skipped() {
        let form = json!({"Income": null, "income": "   ", "gross_amount": "1,200"});
        let value = resolve(&form, &["Income", "income", "gross_amount"]).expect("resolved");
        assert_eq!(value.as_str(), Some("1,200"));
    }

    #[test]
    fn dotted_paths_reach_nested_objects() {
        let form = json!({"Issuer": {"EIN": "12-3456789"}});
        let ein = resolve_string(&form, &["issuer_ein", "Issuer.EIN"]).expect("ein");
        assert_eq!(ein, "12-3456789");
    }

    #[test]
    fn missing_everything_resolves_to_none() {
        let form = json!({"unrelated": true});
        assert!(resolve(&form, &["Income", "income"]).is_none());
    }

    #[test]
    fn numbers_stringify_for_identifier_fields() {
        let form = json!({"ssn": 123456789});
        assert_eq!(resolve_string(&form, &["ssn"]), Some("123456789".to_string()));
    }
}
