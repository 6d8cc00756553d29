use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

/// Bucket for documents whose header yields no recognizable date.
pub const UNKNOWN_DATE_LABEL: &str = "Nežinoma data";

/// How many leading lines of a document are scanned for a date.
pub const DATE_SCAN_LINES: usize = 40;

lazy_static! {
    // "2023 m. gegužės 7 d.": year marker, month words, day, optional day marker
    static ref LONG_DATE_RE: Regex = Regex::new(
        r"(?i)\b\d{4}\s*m\.\s*[A-Za-zĄČĘĖĮŠŲŪŽąčęėįšųūž]+(?:\s+[A-Za-zĄČĘĖĮŠŲŪŽąčęėįšųūž]+)*\s+\d{1,2}\s*d\.?"
    )
    .unwrap();
    static ref NUMERIC_DATE_RE: Regex =
        Regex::new(r"\b\d{4}[-/.]\d{1,2}[-/.]\d{1,2}\b").unwrap();
    static ref SEPARATOR_RE: Regex = Regex::new(r"[-/.]").unwrap();
    static ref LABEL_LONG_RE: Regex = Regex::new(
        r"(?i)(\d{4})\s*m\.\s*([A-Za-zĄČĘĖĮŠŲŪŽąčęėįšųūž\s.]*)\s+(\d{1,2})(?:\s*d\.?)?"
    )
    .unwrap();
    static ref NON_LETTER_RE: Regex =
        Regex::new(r"[^A-Za-zĄČĘĖĮŠŲŪŽąčęėįšųūž\s]").unwrap();
}

/// Find the first date-like string near the start of a document.
///
/// Only the first `max_lines` lines are scanned; dates deep in the body
/// are intentionally ignored. Per line, the localized long form is tried
/// before the numeric form, and the first matching line wins. Long-form
/// matches come back verbatim with whitespace runs collapsed; numeric
/// matches are re-rendered as zero-padded `YYYY-MM-DD` whatever separator
/// the source used.
pub fn extract_document_date(text: &str, max_lines: usize) -> Option<String> {
    for raw_line in text.lines().take(max_lines) {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(m) = LONG_DATE_RE.find(line) {
            let found = m.as_str().trim().trim_end_matches([',', ';']);
            return Some(found.split_whitespace().collect::<Vec<_>>().join(" "));
        }

        if let Some(m) = NUMERIC_DATE_RE.find(line) {
            let found = m.as_str().trim().trim_end_matches([',', ';']);
            let parts: Vec<&str> = SEPARATOR_RE.split(found).collect();
            let year = parts[0];
            let month: u32 = parts[1].parse().ok()?;
            let day: u32 = parts[2].parse().ok()?;
            return Some(format!("{year}-{month:02}-{day:02}"));
        }
    }
    None
}

/// Fold the Lithuanian diacritic letters used in month names.
fn fold_lithuanian(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ą' => 'a',
            'č' => 'c',
            'ę' | 'ė' => 'e',
            'į' => 'i',
            'š' => 's',
            'ų' | 'ū' => 'u',
            'ž' => 'z',
            other => other,
        })
        .collect()
}

/// Month number for an accent-folded Lithuanian month word, genitive or
/// nominative.
fn month_number(token: &str) -> Option<u32> {
    match token {
        "sausio" | "sausis" => Some(1),
        "vasario" | "vasaris" => Some(2),
        "kovo" | "kovas" => Some(3),
        "balandzio" | "balandis" => Some(4),
        "geguzes" | "geguze" => Some(5),
        "birzelio" | "birzelis" => Some(6),
        "liepos" | "liepa" => Some(7),
        "rugpjucio" | "rugpjutis" => Some(8),
        "rugsejo" | "rugsejis" => Some(9),
        "spalio" | "spalis" => Some(10),
        "lapkricio" | "lapkritis" => Some(11),
        "gruodzio" | "gruodis" => Some(12),
        _ => None,
    }
}

/// Resolve a stored date label back to a calendar date.
///
/// ISO labels parse directly; long-form labels go through the month-name
/// table. The unknown sentinel and anything unparsable resolve to `None`.
pub fn parse_date_label(label: &str) -> Option<NaiveDate> {
    let cleaned = label.trim();
    if cleaned.is_empty() || cleaned == UNKNOWN_DATE_LABEL {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(cleaned, "%Y-%m-%d") {
        return Some(date);
    }

    let captures = LABEL_LONG_RE.captures(cleaned)?;
    let year: i32 = captures[1].parse().ok()?;
    let day: u32 = captures[3].parse().ok()?;

    let month_raw = NON_LETTER_RE.replace_all(&captures[2], " ");
    let month = month_raw.split_whitespace().find_map(|token| {
        let base = fold_lithuanian(&token.to_lowercase());
        if base == "men" {
            return None; // "mėn." filler between year and month name
        }
        month_number(&base)
    })?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Sort key for date labels: chronological, unknown and unparsable labels
/// after every real date, ties broken by case-insensitive label text.
pub fn date_sort_key(label: &str) -> (NaiveDate, String) {
    (
        parse_date_label(label).unwrap_or(NaiveDate::MAX),
        label.to_lowercase(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_date_is_normalized() {
        let text = "2023-05-07 posėdis";
        assert_eq!(
            extract_document_date(text, DATE_SCAN_LINES),
            Some("2023-05-07".to_string())
        );
    }

    #[test]
    fn test_numeric_date_separators_and_padding() {
        assert_eq!(
            extract_document_date("Protokolas 2023/5/7", DATE_SCAN_LINES),
            Some("2023-05-07".to_string())
        );
        assert_eq!(
            extract_document_date("Data: 2023.12.31", DATE_SCAN_LINES),
            Some("2023-12-31".to_string())
        );
    }

    #[test]
    fn test_long_form_is_whitespace_collapsed() {
        let text = "2023  m.   gegužės  7 d. posėdis";
        assert_eq!(
            extract_document_date(text, DATE_SCAN_LINES),
            Some("2023 m. gegužės 7 d.".to_string())
        );
    }

    #[test]
    fn test_long_form_wins_over_numeric_on_same_line() {
        let text = "2023 m. gegužės 7 d. (2023-05-08)";
        assert_eq!(
            extract_document_date(text, DATE_SCAN_LINES),
            Some("2023 m. gegužės 7 d.".to_string())
        );
    }

    #[test]
    fn test_dates_beyond_scan_window_are_ignored() {
        let mut lines = vec!["be datos"; DATE_SCAN_LINES];
        lines.push("2023-05-07");
        let text = lines.join("\n");
        assert_eq!(extract_document_date(&text, DATE_SCAN_LINES), None);
    }

    #[test]
    fn test_no_date_found() {
        assert_eq!(
            extract_document_date("posėdžio stenograma\nbe jokios datos", DATE_SCAN_LINES),
            None
        );
    }

    #[test]
    fn test_parse_iso_label() {
        assert_eq!(
            parse_date_label("2023-05-07"),
            NaiveDate::from_ymd_opt(2023, 5, 7)
        );
    }

    #[test]
    fn test_parse_long_form_label() {
        assert_eq!(
            parse_date_label("2023 m. gegužės 7 d."),
            NaiveDate::from_ymd_opt(2023, 5, 7)
        );
    }

    #[test]
    fn test_parse_long_form_label_without_diacritics() {
        assert_eq!(
            parse_date_label("2023 m. geguzes 7 d."),
            NaiveDate::from_ymd_opt(2023, 5, 7)
        );
    }

    #[test]
    fn test_parse_label_skips_men_filler() {
        assert_eq!(
            parse_date_label("2023 m. mėn. spalio 12 d."),
            NaiveDate::from_ymd_opt(2023, 10, 12)
        );
    }

    #[test]
    fn test_unknown_sentinel_has_no_date() {
        assert_eq!(parse_date_label(UNKNOWN_DATE_LABEL), None);
        assert_eq!(parse_date_label("  "), None);
        assert_eq!(parse_date_label("šiaip tekstas"), None);
    }

    #[test]
    fn test_invalid_calendar_date_is_rejected() {
        assert_eq!(parse_date_label("2023 m. vasario 30 d."), None);
    }

    #[test]
    fn test_sort_key_puts_unknown_last() {
        let mut labels = vec![UNKNOWN_DATE_LABEL, "2023-02-01", "2023 m. sausio 1 d."];
        labels.sort_by_key(|label| date_sort_key(label));
        assert_eq!(
            labels,
            vec!["2023 m. sausio 1 d.", "2023-02-01", UNKNOWN_DATE_LABEL]
        );
    }
}
