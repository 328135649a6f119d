//! Schema-drift-tolerant lookups into imported spreadsheet rows
//!
//! Draft rows carry the original spreadsheet record as an opaque JSON bag.
//! Column headers drift between imports ("sku", "SKU", "Seller SKU", ...),
//! so every canonical field is resolved through an ordered list of synonym
//! keys instead of a single literal.

use serde_json::Value;

/// Look up the first matching key in `bag` and return it as a trimmed string.
///
/// Keys are compared case-insensitively with surrounding whitespace ignored.
/// Numeric values are stringified; empty strings count as missing so a blank
/// spreadsheet cell never shadows a later synonym.
pub fn pick_str(bag: &Value, keys: &[&str]) -> Option<String> {
    let map = bag.as_object()?;
    for key in keys {
        let want = key.trim().to_lowercase();
        for (k, v) in map {
            if k.trim().to_lowercase() != want {
                continue;
            }
            match v {
                Value::String(s) => {
                    let s = s.trim();
                    if !s.is_empty() {
                        return Some(s.to_string());
                    }
                }
                Value::Number(n) => return Some(n.to_string()),
                Value::Bool(b) => return Some(b.to_string()),
                _ => {}
            }
        }
    }
    None
}

/// Like [`pick_str`] but parsed as a number.
///
/// Accepts JSON numbers and numeric strings (currency symbols and thousands
/// separators stripped), since spreadsheets export prices inconsistently.
pub fn pick_f64(bag: &Value, keys: &[&str]) -> Option<f64> {
    let raw = pick_str(bag, keys)?;
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_synonym_wins() {
        let bag = json!({"SKU": "A-1", "sku code": "A-2"});
        assert_eq!(pick_str(&bag, &["sku", "sku code"]), Some("A-1".into()));
    }

    #[test]
    fn keys_match_case_and_whitespace_insensitively() {
        let bag = json!({" Seller SKU ": "B-9"});
        assert_eq!(pick_str(&bag, &["seller sku"]), Some("B-9".into()));
    }

    #[test]
    fn blank_cell_falls_through_to_next_synonym() {
        let bag = json!({"sku": "  ", "Seller SKU": "C-3"});
        assert_eq!(pick_str(&bag, &["sku", "seller sku"]), Some("C-3".into()));
    }

    #[test]
    fn missing_key_is_none() {
        let bag = json!({"title": "Lamp"});
        assert_eq!(pick_str(&bag, &["sku"]), None);
        assert_eq!(pick_str(&json!(null), &["sku"]), None);
    }

    #[test]
    fn numbers_come_back_as_strings_and_floats() {
        let bag = json!({"price": 12.5, "weight": "1,234.5 g", "cost": "$9.99"});
        assert_eq!(pick_str(&bag, &["price"]), Some("12.5".into()));
        assert_eq!(pick_f64(&bag, &["weight"]), Some(1234.5));
        assert_eq!(pick_f64(&bag, &["cost"]), Some(9.99));
    }
}
