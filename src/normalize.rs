//! Normalization of raw card fields: colour names, mana costs and timestamps
//!
//! Upstream documents are messy. Nothing here fails; values that cannot be
//! interpreted fall back to `Colorless` (colours) or `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Fallback bucket for unrecognized colour names
pub const COLORLESS: &str = "Colorless";

/// Colour and guild/shard names to their colour-code combination
pub const COLOR_TO_LABEL: [(&str, &str); 25] = [
    ("White", "W"),
    ("Blue", "U"),
    ("Black", "B"),
    ("Red", "R"),
    ("Green", "G"),
    ("Colorless", "C"),
    ("Azorius", "WU"),
    ("Orzhov", "WB"),
    ("Boros", "WR"),
    ("Selesnya", "WG"),
    ("Dimir", "UB"),
    ("Izzet", "UR"),
    ("Rakdos", "BR"),
    ("Gruul", "RG"),
    ("Bant", "WUG"),
    ("Esper", "WUB"),
    ("Grixis", "UBR"),
    ("Jund", "BRG"),
    ("Naya", "RGW"),
    ("Abzan", "WBG"),
    ("Jeskai", "URW"),
    ("Sultai", "BGU"),
    ("Mardu", "BRW"),
    ("Temur", "RUG"),
    ("Rainbow", "WUBRG"),
];

/// Chart colour per colour-code combination, keyed by the sorted letters
pub const COLOR_TO_HEX: [(&str, &str); 25] = [
    ("B", "#000000"),
    ("BGU", "#2E8B57"),
    ("BR", "#8B0000"),
    ("BGR", "#556B2F"),
    ("BRW", "#CD5C5C"),
    ("C", "#D3D3D3"),
    ("G", "#008000"),
    ("R", "#FF0000"),
    ("GR", "#32CD32"),
    ("GRW", "#FFD700"),
    ("GRU", "#20B2AA"),
    ("U", "#1E90FF"),
    ("BU", "#4682B4"),
    ("BRU", "#8A2BE2"),
    ("RU", "#FF6347"),
    ("RUW", "#FF4500"),
    ("W", "#FFFFFF"),
    ("BW", "#A9A9A9"),
    ("BGW", "#9ACD32"),
    ("GW", "#98FB98"),
    ("RW", "#FFA07A"),
    ("UW", "#ADD8E6"),
    ("BUW", "#87CEEB"),
    ("GUW", "#90EE90"),
    ("BGRUW", "#DAA520"),
];

fn label_map() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| COLOR_TO_LABEL.iter().copied().collect())
}

fn hex_map() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| COLOR_TO_HEX.iter().copied().collect())
}

/// Title-case a string: the first letter of every alphabetic run is
/// uppercased and the rest lowercased (`"rED blue"` → `"Red Blue"`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Render a scalar as text; strings are taken as-is, null is empty
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The entries of a list-valued field, or `None` for null and empty values
fn entries(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(items.iter().collect()),
        scalar => Some(vec![scalar]),
    }
}

/// Map one colour name to its code
pub fn normalize_color(raw: &str) -> String {
    let name = title_case(raw);
    let name = name.trim();
    if name.is_empty() {
        return COLORLESS.to_string();
    }
    if let Some(code) = label_map().get(name) {
        return (*code).to_string();
    }
    if name.chars().count() == 1 {
        name.to_string()
    } else {
        COLORLESS.to_string()
    }
}

/// Normalize a colour field to a sorted, deduplicated list of codes.
///
/// A scalar is treated as a one-element list. Null and empty input give `None`.
pub fn normalize_colors(value: &Value) -> Option<Vec<String>> {
    let entries = entries(value)?;
    let codes: BTreeSet<String> = entries
        .into_iter()
        .map(|v| normalize_color(&scalar_text(v)))
        .collect();
    Some(codes.into_iter().collect())
}

/// Normalize a mana-cost field to the set of its symbols (`"{R}"` → `"R"`)
pub fn normalize_mana_cost(value: &Value) -> Option<BTreeSet<String>> {
    let entries = entries(value)?;
    let symbols = entries
        .into_iter()
        .map(|v| {
            scalar_text(v)
                .to_uppercase()
                .chars()
                .filter(|c| !matches!(c, '{' | '}' | '/'))
                .collect::<String>()
        })
        .filter(|s| !s.is_empty())
        .collect();
    Some(symbols)
}

/// Parse a timestamp cell.
///
/// Accepts epoch milliseconds (as a number or numeric string), RFC 3339,
/// `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`, all read as UTC.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(millis) = s.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Chart colour for a colour-code combination, in any letter order
pub fn color_hex(label: &str) -> Option<&'static str> {
    let mut letters: Vec<char> = label.chars().collect();
    letters.sort_unstable();
    let key: String = letters.into_iter().collect();
    hex_map().get(key.as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn colors_map_and_sort() {
        assert_eq!(
            normalize_colors(&json!(["Red", "Blue"])),
            Some(vec!["R".to_string(), "U".to_string()])
        );
    }

    #[test]
    fn unrecognized_color_is_colorless() {
        assert_eq!(
            normalize_colors(&json!(["Red", "Unrecognized"])),
            Some(vec!["Colorless".to_string(), "R".to_string()])
        );
    }

    #[test]
    fn colors_are_title_cased_and_trimmed() {
        assert_eq!(
            normalize_colors(&json!(["  gREEN ", "azorius", "green"])),
            Some(vec!["G".to_string(), "WU".to_string()])
        );
    }

    #[test]
    fn single_letter_passes_through() {
        assert_eq!(normalize_colors(&json!(["w", "x"])), Some(vec!["W".into(), "X".into()]));
    }

    #[test]
    fn colorless_name_maps_to_code() {
        assert_eq!(normalize_colors(&json!("Colorless")), Some(vec!["C".to_string()]));
        assert_eq!(normalize_colors(&json!([""])), Some(vec!["Colorless".to_string()]));
    }

    #[test]
    fn empty_colors_are_none() {
        assert_eq!(normalize_colors(&Value::Null), None);
        assert_eq!(normalize_colors(&json!([])), None);
        assert_eq!(normalize_colors(&json!("")), None);
    }

    #[test]
    fn mana_cost_strips_braces() {
        let symbols = normalize_mana_cost(&json!(["{R}", "{G}", "{1}"])).unwrap();
        let expected: BTreeSet<String> = ["R", "G", "1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(symbols, expected);
    }

    #[test]
    fn mana_cost_handles_hybrid_and_case() {
        let symbols = normalize_mana_cost(&json!(["{w/u}", "{W/U}"])).unwrap();
        assert_eq!(symbols.into_iter().collect::<Vec<_>>(), vec!["WU".to_string()]);
        assert_eq!(normalize_mana_cost(&Value::Null), None);
    }

    #[test]
    fn title_case_matches_word_rules() {
        assert_eq!(title_case("rED blue"), "Red Blue");
        assert_eq!(title_case("o'brien"), "O'Brien");
        assert_eq!(title_case("x2y"), "X2Y");
    }

    #[test]
    fn timestamps_from_epoch_millis() {
        let dt = parse_timestamp(&json!(1_700_000_000_000i64)).unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-11-14T22:13:20+00:00");
        assert_eq!(parse_timestamp(&json!("1700000000000")), Some(dt));
    }

    #[test]
    fn timestamps_from_strings() {
        let rfc = parse_timestamp(&json!("2024-03-01T12:30:00Z")).unwrap();
        let plain = parse_timestamp(&json!("2024-03-01 12:30:00")).unwrap();
        assert_eq!(rfc, plain);
        let day = parse_timestamp(&json!("2024-03-01")).unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn bad_timestamps_are_none() {
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
        assert_eq!(parse_timestamp(&Value::Null), None);
    }

    #[test]
    fn hex_lookup_sorts_letters() {
        assert_eq!(color_hex("UW"), Some("#ADD8E6"));
        assert_eq!(color_hex("WU"), Some("#ADD8E6"));
        assert_eq!(color_hex("WUBRG"), Some("#DAA520"));
        assert_eq!(color_hex("Colorless"), None);
    }

    #[test]
    fn every_label_has_a_hex_colour() {
        for (name, code) in COLOR_TO_LABEL {
            assert!(color_hex(code).is_some(), "no colour for {} ({})", name, code);
        }
    }
}
