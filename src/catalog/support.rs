//! Feature support report
//!
//! The catalog publishes a JSON map of feature name to flag; a flag of `1`
//! marks a feature that does not work on the device.

use indexmap::IndexMap;

/// Features flagged as not working, in catalog order.
///
/// Returns `None` when the map is empty, meaning nothing was reported.
pub fn parse_not_working(report: &str) -> Result<Option<Vec<String>>, serde_json::Error> {
    let features: IndexMap<String, serde_json::Value> = serde_json::from_str(report)?;
    if features.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        features
            .into_iter()
            .filter(|(_, flag)| flag.as_i64() == Some(1))
            .map(|(name, _)| name)
            .collect(),
    ))
}

/// Join feature names as prose: "a", "a and b", "a, b and c"
pub fn format_not_working(features: &[String]) -> String {
    match features.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    }
}

/// Parse and format in one step; `None` when nothing was reported
pub fn formatted_not_working(report: &str) -> Result<Option<String>, serde_json::Error> {
    Ok(parse_not_working(report)?.map(|features| format_not_working(&features)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags_in_order() {
        assert_eq!(
            parse_not_working(r#"{"a": 1, "b": 0, "c": 1}"#).unwrap(),
            Some(names(&["a", "c"]))
        );
    }

    #[test]
    fn test_parse_empty_map_reports_nothing() {
        assert_eq!(parse_not_working("{}").unwrap(), None);
    }

    #[test]
    fn test_parse_all_working() {
        assert_eq!(
            parse_not_working(r#"{"wifi": 0}"#).unwrap(),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_not_working("[1, 2").is_err());
    }

    #[test]
    fn test_format_not_working() {
        assert_eq!(format_not_working(&[]), "");
        assert_eq!(format_not_working(&names(&["a"])), "a");
        assert_eq!(format_not_working(&names(&["a", "c"])), "a and c");
        assert_eq!(format_not_working(&names(&["a", "b", "c"])), "a, b and c");
    }

    #[test]
    fn test_formatted_not_working() {
        assert_eq!(
            formatted_not_working(r#"{"camera": 1, "gps": 1, "nfc": 0, "sms": 1}"#).unwrap(),
            Some("camera, gps and sms".to_string())
        );
        assert_eq!(formatted_not_working("{}").unwrap(), None);
    }
}
