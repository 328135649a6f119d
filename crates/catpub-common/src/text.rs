//! Cleanup of free text carried over from spreadsheet exports
//!
//! Imported titles and descriptions arrive with Excel export artifacts:
//! literal `_x000D_` markers, non-breaking spaces, BOMs, and mixed line
//! endings. Everything written to staging goes through [`clean_text`] first.

/// Excel encodes embedded carriage returns as this literal marker.
const EXCEL_CR_ARTIFACT: &str = "_x000D_";

/// Normalize a free-text field for staging.
///
/// Removes `_x000D_` artifacts, BOM and non-breaking spaces, collapses CRLF
/// and lone CR to `\n`, and trims the result.
pub fn clean_text(raw: &str) -> String {
    // The marker usually precedes a real newline; fold the pair first so the
    // replacement never doubles blank lines.
    let no_artifacts = raw
        .replace("_x000D_\n", "\n")
        .replace(EXCEL_CR_ARTIFACT, "\n");
    let mut out = String::with_capacity(no_artifacts.len());
    let mut chars = no_artifacts.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\u{feff}' => {}
            '\u{a0}' => out.push(' '),
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    out.push('\n');
                }
            }
            _ => out.push(c),
        }
    }
    out.trim().to_string()
}

/// Clean an optional field, mapping cleaned-to-empty values to `None`.
pub fn clean_opt(raw: Option<&str>) -> Option<String> {
    let cleaned = clean_text(raw?);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_excel_cr_artifacts() {
        assert_eq!(clean_text("line one_x000D_line two"), "line one\nline two");
    }

    #[test]
    fn collapses_line_endings() {
        assert_eq!(clean_text("a\r\nb\rc\n"), "a\nb\nc");
    }

    #[test]
    fn strips_bom_and_nbsp() {
        assert_eq!(clean_text("\u{feff}wide\u{a0}lamp "), "wide lamp");
    }

    #[test]
    fn empty_optional_becomes_none() {
        assert_eq!(clean_opt(Some("  _x000D_ ")), None);
        assert_eq!(clean_opt(None), None);
        assert_eq!(clean_opt(Some(" x ")), Some("x".into()));
    }
}
