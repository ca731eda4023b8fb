//! Encoding of condition rows into a single URL query parameter value.
//!
//! Grammar:
//!
//! ```text
//! params  = row *( "___" row )
//! row     = key "__" type [ "__" operand [ "__" operand ] ]
//! operand = number | "null" | member *( "_" member )
//! ```
//!
//! `%` and `_` inside keys and list members are written as `%25` and `%5F`,
//! so the separators never appear inside a value. Absent numeric bounds are
//! written as `null`.

use std::collections::HashSet;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use super::condition::{Condition, ConditionRow, ConditionType};

pub const ROW_SEPARATOR: &str = "___";
pub const FIELD_SEPARATOR: &str = "__";
pub const LIST_SEPARATOR: char = '_';

const ABSENT: &str = "null";

/// Bytes escaped inside keys and list members. Non-ASCII is always escaped.
const ESCAPED: &AsciiSet = &CONTROLS.add(b'%').add(b'_');

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Serialize rows in order. Rows with an empty key are skipped.
pub fn stringify_params(rows: &[ConditionRow]) -> String {
    rows.iter()
        .filter(|row| !row.key.is_empty())
        .map(encode_row)
        .collect::<Vec<_>>()
        .join(ROW_SEPARATOR)
}

fn encode_row(row: &ConditionRow) -> String {
    let mut fields = vec![escape(&row.key), row.condition_type().as_str().to_string()];

    match &row.condition {
        Condition::Gte(v) | Condition::Lte(v) => fields.push(encode_number(*v)),
        Condition::Between { gte, lte } => {
            fields.push(encode_number(*gte));
            fields.push(encode_number(*lte));
        }
        Condition::In(values) => {
            // No operand at all for a missing or empty list; an empty trailing
            // field would run into the row separator.
            if let Some(list) = values
                .as_deref()
                .map(stringify_list)
                .filter(|list| !list.is_empty())
            {
                fields.push(list);
            }
        }
    }

    fields.join(FIELD_SEPARATOR)
}

fn encode_number(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => ABSENT.to_string(),
    }
}

/// Join list members with `_`, escaping each. Empty members are dropped.
pub fn stringify_list(values: &[String]) -> String {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .map(|v| escape(v))
        .collect::<Vec<_>>()
        .join(&LIST_SEPARATOR.to_string())
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Parse an encoded parameter value. The first segment for a key claims it,
/// whatever its condition type; later segments with the same key are dropped.
/// Never fails: malformed numbers decode to `NaN` and a segment with an
/// unknown condition type yields no row.
pub fn parse_params(input: Option<&str>) -> Vec<ConditionRow> {
    let Some(input) = input.filter(|s| !s.is_empty()) else {
        return Vec::new();
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut rows = Vec::new();

    for segment in input.split(ROW_SEPARATOR) {
        let mut fields = segment.split(FIELD_SEPARATOR);

        let key = fields.next().map(unescape).unwrap_or_default();
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }

        match decode_condition(fields) {
            Some(condition) => rows.push(ConditionRow { key, condition }),
            None => tracing::debug!(%key, segment, "Dropping filter segment with unknown condition"),
        }
    }

    rows
}

fn decode_condition<'a>(mut fields: impl Iterator<Item = &'a str>) -> Option<Condition> {
    let condition = match ConditionType::from_str(fields.next()?)? {
        ConditionType::Gte => Condition::Gte(decode_number(fields.next())),
        ConditionType::Lte => Condition::Lte(decode_number(fields.next())),
        ConditionType::Between => {
            let gte = decode_number(fields.next());
            let lte = decode_number(fields.next());
            Condition::Between { gte, lte }
        }
        ConditionType::In => Condition::In(fields.next().map(parse_list)),
    };

    Some(condition)
}

fn decode_number(field: Option<&str>) -> Option<f64> {
    let text = field?.trim();
    if text.is_empty() || text == ABSENT {
        return None;
    }
    Some(text.parse().unwrap_or(f64::NAN))
}

/// Split a `_`-joined list and unescape each member. Empty members are dropped.
pub fn parse_list(field: &str) -> Vec<String> {
    field
        .split(LIST_SEPARATOR)
        .filter(|v| !v.is_empty())
        .map(unescape)
        .collect()
}

/// Keep the first row for each key, preserving order.
pub fn dedup_rows<I>(rows: I) -> Vec<ConditionRow>
where
    I: IntoIterator<Item = ConditionRow>,
{
    let mut seen: HashSet<String> = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.key.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

fn escape(value: &str) -> String {
    utf8_percent_encode(value, ESCAPED).to_string()
}

/// Reverse `escape`. A value whose escapes do not decode to UTF-8 is kept
/// verbatim.
fn unescape(value: &str) -> String {
    match percent_decode_str(value).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::debug!(value, error = %e, "Keeping undecodable escape verbatim");
            value.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gte_row() {
        let rows = vec![ConditionRow::gte("pnl", 100.0)];
        let encoded = stringify_params(&rows);
        assert_eq!(encoded, "pnl__gte__100");

        let decoded = parse_params(Some(&encoded));
        assert_eq!(decoded, rows);
        assert_eq!(decoded[0].lte_bound(), None);
    }

    #[test]
    fn test_between_row() {
        let rows = vec![ConditionRow::between("winRate", 10.0, 90.0)];
        let encoded = stringify_params(&rows);
        assert_eq!(encoded, "winRate__between__10__90");
        assert_eq!(parse_params(Some(&encoded)), rows);
    }

    #[test]
    fn test_in_row() {
        let rows = vec![ConditionRow::one_of("indexTokens", ["BTC", "ETH"])];
        let encoded = stringify_params(&rows);
        assert_eq!(encoded, "indexTokens__in__BTC_ETH");
        assert_eq!(parse_params(Some(&encoded)), rows);
    }

    #[test]
    fn test_duplicate_key_first_wins() {
        let decoded = parse_params(Some("pnl__gte__100___pnl__lte__50"));
        assert_eq!(decoded, vec![ConditionRow::gte("pnl", 100.0)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_params(None).is_empty());
        assert!(parse_params(Some("")).is_empty());
        assert_eq!(stringify_params(&[]), "");
    }

    #[test]
    fn test_multi_row_order_preserved() {
        let rows = vec![
            ConditionRow::lte("maxDrawdown", 25.5),
            ConditionRow::gte("pnl", -1000.0),
            ConditionRow::one_of("indexTokens", ["SOL"]),
            ConditionRow::between("avgRoi", 0.5, 3.0),
        ];
        let encoded = stringify_params(&rows);
        assert_eq!(
            encoded,
            "maxDrawdown__lte__25.5___pnl__gte__-1000___indexTokens__in__SOL___avgRoi__between__0.5__3"
        );
        assert_eq!(parse_params(Some(&encoded)), rows);
    }

    #[test]
    fn test_decode_is_idempotent_on_reencode() {
        let input = "pnl__gte__abc___winRate__between__null__80___pnl__lte__1___indexTokens__in";
        let first = parse_params(Some(input));
        let second = parse_params(Some(&stringify_params(&first)));
        // NaN != NaN, so compare through the encoding.
        assert_eq!(stringify_params(&first), stringify_params(&second));
        assert_eq!(first.len(), second.len());
        assert_eq!(first[1], second[1]);
        assert_eq!(first[2], second[2]);
    }

    #[test]
    fn test_absent_bound_is_not_zero() {
        let rows = vec![
            ConditionRow::new(
                "winRate",
                Condition::Between {
                    gte: None,
                    lte: Some(90.0),
                },
            ),
            ConditionRow::new(
                "avgRoi",
                Condition::Between {
                    gte: Some(0.0),
                    lte: Some(5.0),
                },
            ),
        ];
        let encoded = stringify_params(&rows);
        assert_eq!(encoded, "winRate__between__null__90___avgRoi__between__0__5");
        assert_eq!(parse_params(Some(&encoded)), rows);
    }

    #[test]
    fn test_missing_operand_decodes_as_absent() {
        let decoded = parse_params(Some("pnl__gte___winRate__between__10"));
        assert_eq!(decoded[0], ConditionRow::new("pnl", Condition::Gte(None)));
        assert_eq!(
            decoded[1],
            ConditionRow::new(
                "winRate",
                Condition::Between {
                    gte: Some(10.0),
                    lte: None
                }
            )
        );
    }

    #[test]
    fn test_malformed_number_is_nan() {
        let decoded = parse_params(Some("pnl__gte__12abc"));
        assert_eq!(decoded.len(), 1);
        assert!(decoded[0].gte_bound().unwrap().is_nan());
        assert!(!decoded[0].is_complete());
    }

    #[test]
    fn test_unknown_condition_type_claims_key() {
        let decoded = parse_params(Some("pnl__eq__5___pnl__gte__1"));
        assert!(decoded.is_empty());

        let decoded = parse_params(Some("pnl__eq__5___winRate__gte__1"));
        assert_eq!(decoded, vec![ConditionRow::gte("winRate", 1.0)]);
    }

    #[test]
    fn test_empty_key_skipped() {
        let rows = vec![ConditionRow::gte("", 1.0), ConditionRow::gte("pnl", 2.0)];
        assert_eq!(stringify_params(&rows), "pnl__gte__2");
    }

    #[test]
    fn test_in_without_members() {
        let rows = vec![
            ConditionRow::new("indexTokens", Condition::In(None)),
            ConditionRow::gte("pnl", 1.0),
        ];
        let encoded = stringify_params(&rows);
        assert_eq!(encoded, "indexTokens__in___pnl__gte__1");
        assert_eq!(parse_params(Some(&encoded)), rows);

        let empty = vec![ConditionRow::one_of("indexTokens", Vec::<String>::new())];
        assert_eq!(stringify_params(&empty), "indexTokens__in");
    }

    #[test]
    fn test_values_with_separators_roundtrip() {
        let rows = vec![
            ConditionRow::one_of("indexTokens", ["WRAPPED_BTC", "100%_ETH", "__"]),
            ConditionRow::gte("custom_key", 3.0),
        ];
        let encoded = stringify_params(&rows);
        assert_eq!(
            encoded,
            "indexTokens__in__WRAPPED%5FBTC_100%25%5FETH_%5F%5F___custom%5Fkey__gte__3"
        );
        assert_eq!(parse_params(Some(&encoded)), rows);
    }

    #[test]
    fn test_unescape_leaves_stray_percent() {
        assert_eq!(unescape("50%"), "50%");
        assert_eq!(unescape("%zz"), "%zz");
        assert_eq!(unescape("%4"), "%4");
        assert_eq!(unescape("%41"), "A");
    }

    #[test]
    fn test_undecodable_escape_kept_verbatim() {
        let decoded = parse_params(Some("indexTokens__in__%FF"));
        assert_eq!(decoded, vec![ConditionRow::one_of("indexTokens", ["%FF"])]);

        // The literal text survives a round trip instead of becoming U+FFFD.
        let encoded = stringify_params(&decoded);
        assert_eq!(encoded, "indexTokens__in__%25FF");
        assert_eq!(parse_params(Some(&encoded)), decoded);
    }

    #[test]
    fn test_non_ascii_members_roundtrip() {
        let rows = vec![ConditionRow::one_of("indexTokens", ["ÉTH", "币"])];
        let encoded = stringify_params(&rows);
        assert!(encoded.is_ascii());
        assert_eq!(parse_params(Some(&encoded)), rows);
    }

    #[test]
    fn test_dedup_rows() {
        let rows = dedup_rows(vec![
            ConditionRow::gte("pnl", 1.0),
            ConditionRow::gte("winRate", 50.0),
            ConditionRow::lte("pnl", 9.0),
        ]);
        assert_eq!(
            rows,
            vec![ConditionRow::gte("pnl", 1.0), ConditionRow::gte("winRate", 50.0)]
        );
    }

    #[test]
    fn test_list_helpers() {
        let values = vec!["a".to_string(), String::new(), "b_c".to_string()];
        let encoded = stringify_list(&values);
        assert_eq!(encoded, "a_b%5Fc");
        assert_eq!(parse_list(&encoded), vec!["a".to_string(), "b_c".to_string()]);
        assert!(parse_list("").is_empty());
    }
}
