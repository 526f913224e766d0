//! Output normalization. The model is untrusted; whatever JSON it returns is
//! parsed into a `serde_json::Value` and coerced field by field into a
//! `ResumeSummary` that always satisfies the declared shape.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::resume::models::{ResumeError, ResumeSummary};

pub const MAX_SKILLS: usize = 12;
pub const MIN_YEAR_OF_STUDY: f64 = 1.0;
pub const MAX_YEAR_OF_STUDY: f64 = 8.0;
pub const GRADUATED: i32 = -1;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"))
}

/// Simple `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Parses the model's text output into a JSON object.
///
/// Tries the whole (trimmed) text first, then the span from the first `{` to
/// the last `}`. Empty output is treated as `{}`. Number literals too large
/// for an `f64` become the string `"Infinity"` (or `"-Infinity"`) instead of
/// failing the parse, so the non-finite rules below apply to them.
pub fn parse_model_json(text: &str) -> Result<Map<String, Value>, ResumeError> {
    let trimmed = text.trim();
    let trimmed = if trimmed.is_empty() { "{}" } else { trimmed };
    let quoted = quote_overflowing_numbers(trimmed);
    let trimmed = quoted.as_ref();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(map);
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            match serde_json::from_str::<Value>(&trimmed[start..=end]) {
                Ok(Value::Object(map)) => Ok(map),
                _ => Err(ResumeError::InvalidJson),
            }
        }
        _ => Err(ResumeError::InvalidJson),
    }
}

/// Rewrites number literals outside strings whose value overflows `f64`.
fn quote_overflowing_numbers(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }
        if b != b'-' && !b.is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && matches!(bytes[i], b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E') {
            i += 1;
        }
        let literal = &text[start..i];
        if let Ok(n) = literal.parse::<f64>() {
            if n.is_infinite() {
                let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
                buf.push_str(&text[copied..start]);
                buf.push_str(if n < 0.0 { "\"-Infinity\"" } else { "\"Infinity\"" });
                copied = i;
            }
        }
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}

/// Coerces a raw model object into a `ResumeSummary`.
pub fn normalize_summary(raw: &Map<String, Value>) -> ResumeSummary {
    ResumeSummary {
        name: trimmed_string(raw.get("name")),
        email: normalize_email(raw.get("email")),
        short_description: scalar_string(raw.get("short_description")).unwrap_or_default(),
        skills: normalize_skills(raw.get("skills")),
        university: trimmed_string(raw.get("university")),
        year_of_study: normalize_year_of_study(raw.get("yearOfStudy")),
        years_experience: normalize_years_experience(raw.get("yearsExperience")),
    }
}

/// Trimmed string value, or empty for anything that is not a string.
fn trimmed_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

/// Strings trimmed; numbers and booleans stringified; everything else `None`.
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn normalize_skills(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| scalar_string(Some(item)))
        .filter(|skill| !skill.is_empty())
        .take(MAX_SKILLS)
        .collect()
}

fn normalize_email(value: Option<&Value>) -> String {
    let email = trimmed_string(value).to_lowercase();
    if is_valid_email(&email) {
        email
    } else {
        String::new()
    }
}

/// Finite number from a JSON number or a numeric string.
fn finite_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn normalize_years_experience(value: Option<&Value>) -> u32 {
    let years = finite_number(value).unwrap_or(0.0).round();
    if years <= 0.0 {
        0
    } else {
        years.min(u32::MAX as f64) as u32
    }
}

/// Loose numeric conversion in the manner of JavaScript's `Number()`:
/// missing, null, `false`, blank strings and `[]` are 0, `true` is 1,
/// `0x`/`0o`/`0b` strings use their radix, a one-element array converts its
/// element, anything else unparsable is NaN.
fn loose_number(value: Option<&Value>) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => string_to_number(s),
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            // A lone boolean stringifies to "true"/"false", which is NaN.
            [Value::Bool(_) | Value::Object(_)] => f64::NAN,
            [only] => loose_number(Some(only)),
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

fn string_to_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return f64::NAN;
        }
        return u64::from_str_radix(digits, radix).map_or(f64::INFINITY, |v| v as f64);
    }

    s.parse::<f64>().unwrap_or(f64::NAN)
}

fn normalize_year_of_study(value: Option<&Value>) -> i32 {
    let year = loose_number(value);
    if !year.is_finite() {
        return 0;
    }
    if year == f64::from(GRADUATED) || year == 0.0 {
        return year as i32;
    }
    if year.fract() != 0.0 || !(MIN_YEAR_OF_STUDY..=MAX_YEAR_OF_STUDY).contains(&year) {
        return 0;
    }
    year as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize_value(value: Value) -> ResumeSummary {
        match value {
            Value::Object(map) => normalize_summary(&map),
            other => panic!("expected object, got {other}"),
        }
    }

    fn assert_shape(summary: &ResumeSummary) {
        assert!(matches!(summary.year_of_study, -1..=8));
        assert!(summary.skills.len() <= MAX_SKILLS);
        assert!(summary.email.is_empty() || email_pattern().is_match(&summary.email));
        assert_eq!(summary.email, summary.email.to_lowercase());
        assert_eq!(summary.name, summary.name.trim());
        assert_eq!(summary.university, summary.university.trim());
        assert_eq!(summary.short_description, summary.short_description.trim());
    }

    // ── JSON recovery ─────────────────────────────────────────────────────

    #[test]
    fn test_parse_plain_object() {
        let map = parse_model_json(r#"{"name": "A"}"#).unwrap();
        assert_eq!(map["name"], "A");
    }

    #[test]
    fn test_parse_recovers_object_wrapped_in_prose() {
        let text = r#"Sure! {"name":"A","skills":["Rust"]} Hope that helps"#;
        let map = parse_model_json(text).unwrap();
        assert_eq!(map["name"], "A");
        assert_eq!(map["skills"], json!(["Rust"]));
    }

    #[test]
    fn test_parse_recovers_fenced_json() {
        let text = "```json\n{\"email\": \"a@b.co\"}\n```";
        let map = parse_model_json(text).unwrap();
        assert_eq!(map["email"], "a@b.co");
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = parse_model_json("not json at all").unwrap_err();
        assert!(matches!(err, ResumeError::InvalidJson));
    }

    #[test]
    fn test_parse_rejects_reversed_braces() {
        assert!(parse_model_json("} nothing here {").is_err());
    }

    #[test]
    fn test_parse_rejects_broken_embedded_object() {
        assert!(parse_model_json("here: {\"name\": } done").is_err());
    }

    #[test]
    fn test_parse_rejects_top_level_array() {
        assert!(parse_model_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_parse_empty_output_is_empty_object() {
        let map = parse_model_json("   ").unwrap();
        assert!(map.is_empty());
        assert_eq!(normalize_summary(&map), ResumeSummary::default());
    }

    // ── Field coercion ────────────────────────────────────────────────────

    #[test]
    fn test_well_formed_output_passes_through() {
        let summary = normalize_value(json!({
            "name": "  Ada Lovelace ",
            "email": " ADA@Example.COM ",
            "short_description": "  Analytical engine programmer.\nLoves math. ",
            "skills": ["Rust", "SQL"],
            "yearsExperience": 4,
            "university": " Cambridge ",
            "yearOfStudy": 3
        }));
        assert_eq!(summary.name, "Ada Lovelace");
        assert_eq!(summary.email, "ada@example.com");
        assert_eq!(
            summary.short_description,
            "Analytical engine programmer.\nLoves math."
        );
        assert_eq!(summary.skills, vec!["Rust", "SQL"]);
        assert_eq!(summary.years_experience, 4);
        assert_eq!(summary.university, "Cambridge");
        assert_eq!(summary.year_of_study, 3);
    }

    #[test]
    fn test_skills_truncated_to_twelve() {
        let skills: Vec<String> = (0..20).map(|i| format!("skill{i}")).collect();
        let summary = normalize_value(json!({ "skills": skills }));
        assert_eq!(summary.skills.len(), MAX_SKILLS);
        assert_eq!(summary.skills[0], "skill0");
        assert_eq!(summary.skills[11], "skill11");
    }

    #[test]
    fn test_skills_not_an_array_becomes_empty() {
        let summary = normalize_value(json!({ "skills": "Rust, Go" }));
        assert!(summary.skills.is_empty());
    }

    #[test]
    fn test_skills_drop_blank_and_nested_entries() {
        let summary = normalize_value(json!({ "skills": [" Go ", "", null, {"x": 1}, 5] }));
        assert_eq!(summary.skills, vec!["Go", "5"]);
    }

    #[test]
    fn test_invalid_email_is_cleared() {
        for bad in ["not-an-email", "a@b", "a b@c.de", "@x.io", ""] {
            let summary = normalize_value(json!({ "email": bad }));
            assert_eq!(summary.email, "", "{bad:?} should be rejected");
        }
        let summary = normalize_value(json!({ "email": 42 }));
        assert_eq!(summary.email, "");
    }

    #[test]
    fn test_years_experience_defaults_and_clamps() {
        assert_eq!(normalize_value(json!({})).years_experience, 0);
        assert_eq!(normalize_value(json!({"yearsExperience": "lots"})).years_experience, 0);
        assert_eq!(normalize_value(json!({"yearsExperience": null})).years_experience, 0);
        assert_eq!(normalize_value(json!({"yearsExperience": -3})).years_experience, 0);
        assert_eq!(normalize_value(json!({"yearsExperience": 2.6})).years_experience, 3);
        assert_eq!(normalize_value(json!({"yearsExperience": "5"})).years_experience, 5);
    }

    #[test]
    fn test_overflowing_numbers_default_to_zero() {
        let map = parse_model_json(
            r#"{"name": "A", "yearsExperience": 1e999, "yearOfStudy": -1e999}"#,
        )
        .unwrap();
        let summary = normalize_summary(&map);
        assert_eq!(summary.name, "A");
        assert_eq!(summary.years_experience, 0);
        assert_eq!(summary.year_of_study, 0);
    }

    #[test]
    fn test_overflowing_literals_inside_strings_are_untouched() {
        let map = parse_model_json(
            r#"{"short_description": "scored 1e999 \"points\"", "skills": [1e999, 2]}"#,
        )
        .unwrap();
        assert_eq!(map["short_description"], "scored 1e999 \"points\"");
        assert_eq!(map["skills"], json!(["Infinity", 2]));
        assert!(matches!(quote_overflowing_numbers("{\"a\": 1.5e3}"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_year_of_study_keeps_sentinels() {
        assert_eq!(normalize_value(json!({"yearOfStudy": -1})).year_of_study, -1);
        assert_eq!(normalize_value(json!({"yearOfStudy": 0})).year_of_study, 0);
        assert_eq!(normalize_value(json!({"yearOfStudy": "-1"})).year_of_study, -1);
    }

    #[test]
    fn test_year_of_study_out_of_range_resets_to_unknown() {
        for raw in [json!(9), json!(-2), json!(100), json!(2.5), json!("abc"), json!([1, 2])] {
            let summary = normalize_value(json!({ "yearOfStudy": raw }));
            assert_eq!(summary.year_of_study, 0, "{raw} should reset to 0");
        }
    }

    #[test]
    fn test_year_of_study_loose_numbers() {
        assert_eq!(normalize_value(json!({"yearOfStudy": "4"})).year_of_study, 4);
        assert_eq!(normalize_value(json!({"yearOfStudy": true})).year_of_study, 1);
        assert_eq!(normalize_value(json!({"yearOfStudy": null})).year_of_study, 0);
        assert_eq!(normalize_value(json!({"yearOfStudy": ""})).year_of_study, 0);
        assert_eq!(normalize_value(json!({"yearOfStudy": 8})).year_of_study, 8);
    }

    #[test]
    fn test_year_of_study_radix_strings_and_single_element_arrays() {
        assert_eq!(normalize_value(json!({"yearOfStudy": "0x5"})).year_of_study, 5);
        assert_eq!(normalize_value(json!({"yearOfStudy": "0b11"})).year_of_study, 3);
        assert_eq!(normalize_value(json!({"yearOfStudy": [5]})).year_of_study, 5);
        assert_eq!(normalize_value(json!({"yearOfStudy": ["2"]})).year_of_study, 2);
        assert_eq!(normalize_value(json!({"yearOfStudy": [[-1]]})).year_of_study, -1);
        assert_eq!(normalize_value(json!({"yearOfStudy": []})).year_of_study, 0);
        assert_eq!(normalize_value(json!({"yearOfStudy": [true]})).year_of_study, 0);
        assert_eq!(normalize_value(json!({"yearOfStudy": "0x"})).year_of_study, 0);
        assert_eq!(normalize_value(json!({"yearOfStudy": "0x+5"})).year_of_study, 0);
        assert_eq!(normalize_value(json!({"yearOfStudy": "-0x5"})).year_of_study, 0);
    }

    #[test]
    fn test_wrong_types_fall_back_to_defaults() {
        let summary = normalize_value(json!({
            "name": ["A"],
            "university": 12,
            "short_description": {"text": "x"}
        }));
        assert_eq!(summary.name, "");
        assert_eq!(summary.university, "");
        assert_eq!(summary.short_description, "");
    }

    #[test]
    fn test_short_description_stringifies_scalars() {
        let summary = normalize_value(json!({"short_description": 7}));
        assert_eq!(summary.short_description, "7");
    }

    // ── Properties ────────────────────────────────────────────────────────

    fn hostile_inputs() -> Vec<Value> {
        vec![
            json!({}),
            json!({"name": null, "email": null, "skills": null}),
            json!({"yearOfStudy": 1e300, "yearsExperience": -1e300}),
            json!({"yearOfStudy": "Infinity", "yearsExperience": "NaN"}),
            json!({"email": "MiXeD@Case.Org", "skills": (0..40).collect::<Vec<_>>()}),
            json!({"name": "  ", "university": "\tMIT\n", "yearOfStudy": 7.0}),
            json!({"skills": [[], {}, true, "  C++  "], "yearOfStudy": false}),
            json!({"email": "x@y.z ", "yearOfStudy": -1.0, "yearsExperience": 40}),
        ]
    }

    #[test]
    fn test_output_always_satisfies_shape() {
        for input in hostile_inputs() {
            let summary = normalize_value(input.clone());
            assert_shape(&summary);
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for input in hostile_inputs() {
            let once = normalize_value(input);
            let twice = normalize_value(serde_json::to_value(&once).unwrap());
            assert_eq!(once, twice);
        }
    }
}
