use std::ops::Range;

use crate::util::re;

// Numeric day/month/year with '/', '-' or '.' separators, ISO year-first, and
// written month names in either order. Alternation order matters: the regex
// engine takes the leftmost alternative that matches.
re!(re_date, concat!(
    r"(?i)",
    r"\b\d{4}[-/]\d{1,2}[-/]\d{1,2}\b",
    r"|\b\d{1,2}/\d{1,2}/(?:\d{4}|\d{2})\b",
    r"|\b\d{1,2}-\d{1,2}-(?:\d{4}|\d{2})\b",
    r"|\b\d{1,2}\.\d{1,2}\.(?:\d{4}|\d{2})\b",
    r"|\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b\.?\s+\d{1,2},?\s+\d{4}\b",
    r"|\b\d{1,2}\s+(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b\.?,?\s+\d{4}\b"
));

const STATEMENT_DATE_KEYWORDS: &[&str] = &["statement date", "as of", "period ending", "date:"];
const STATEMENT_HEADER_LINES: usize = 10;

/// A date as printed on the statement, with its byte span in the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateToken<'a> {
    pub text: &'a str,
    pub span: Range<usize>,
}

/// All date tokens in `line`, left to right.
pub fn find_dates(line: &str) -> Vec<DateToken<'_>> {
    re_date()
        .find_iter(line)
        .filter(|m| is_plausible(m.as_str()))
        .map(|m| DateToken {
            text: m.as_str(),
            span: m.range(),
        })
        .collect()
}

/// Rejects numeric tokens that cannot be a day/month pair (e.g. `45/67/23`).
/// Written-month forms are accepted as matched.
fn is_plausible(token: &str) -> bool {
    let parts: Vec<u32> = token
        .split(['/', '-', '.'])
        .filter_map(|p| p.trim().parse().ok())
        .collect();
    if parts.len() != 3 {
        return true;
    }
    let (a, b) = if parts[0] > 999 {
        (parts[1], parts[2])
    } else {
        (parts[0], parts[1])
    };
    (1..=31).contains(&a) && (1..=31).contains(&b) && (a <= 12 || b <= 12)
}

/// The statement's own date, read from its header.
///
/// Prefers a date on a line naming the statement date ("Statement date",
/// "As of", …); otherwise the first date anywhere in the header.
pub fn detect_statement_date<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    let header: Vec<&str> = lines
        .iter()
        .take(STATEMENT_HEADER_LINES)
        .map(|l| l.as_ref())
        .collect();

    let keyed = header.iter().find_map(|line| {
        let lower = line.to_lowercase();
        if STATEMENT_DATE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            find_dates(line).first().map(|d| d.text.to_string())
        } else {
            None
        }
    });

    keyed.or_else(|| {
        header
            .iter()
            .find_map(|line| find_dates(line).first().map(|d| d.text.to_string()))
    })
}
