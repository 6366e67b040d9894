//! Plain-text presentation of canonical records.
//!
//! Everything here is a pure function from a record to the string a tool
//! returns. Missing values are shown as [`UNKNOWN`](crate::models::UNKNOWN).

pub mod fetch;
pub mod ip;
pub mod search;
pub mod ufc;
pub mod weather;
pub mod wiki;

use std::fmt::Write as _;

use crate::models::UNKNOWN;

/// Separator between entries of a result list
pub(crate) const RULE: &str = "----------------------------------------";

/// `value unit`, or [`UNKNOWN`] when the value is missing
pub(crate) fn measure(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1}{}", v, unit),
        None => UNKNOWN.to_string(),
    }
}

/// Append `label: value` when `value` is present
pub(crate) fn push_line(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        let _ = writeln!(out, "{}: {}", label, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure() {
        assert_eq!(measure(Some(18.44), "°C"), "18.4°C");
        assert_eq!(measure(None, "°C"), "unknown");
    }

    #[test]
    fn test_push_line_skips_blank() {
        let mut out = String::new();
        push_line(&mut out, "City", Some("Paris"));
        push_line(&mut out, "Zip", Some("  "));
        push_line(&mut out, "Region", None);
        assert_eq!(out, "City: Paris\n");
    }
}
