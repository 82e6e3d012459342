use ledgerline_core::Money;
use rust_decimal::Decimal;
use std::ops::Range;
use std::str::FromStr;

use crate::util::re;

// Two alternatives: accounting parentheses, or an optionally signed figure
// with an optional leading currency symbol. Thousands may be grouped with
// commas or single spaces; exactly two decimals are required so that years,
// account numbers and references never read as money.
re!(re_amount, concat!(
    r"\(\s*(?:[$€£¥]|R)?\s*(?P<pnum>(?:\d{1,3}(?:[ ,]\d{3})+|\d+)\.\d{2})\s*\)",
    r"|(?:(?P<sign>[+-])\s?)?(?:[$€£¥]\s?\b|\bR\s?|\b)(?P<num>(?:\d{1,3}(?:[ ,]\d{3})+|\d+)\.\d{2})\b"
));

/// A monetary figure found on a statement line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountToken {
    pub value: Money,
    /// The line printed a `+`/`-` sign or used parentheses.
    pub explicitly_signed: bool,
    pub span: Range<usize>,
}

/// All amount tokens in `line`, left to right.
///
/// Date tokens should be blanked out first: dotted dates such as `15.06.2023`
/// otherwise contain a figure that looks like `15.06`.
pub fn find_amounts(line: &str) -> Vec<AmountToken> {
    re_amount()
        .captures_iter(line)
        .filter_map(|caps| {
            let span = caps.get(0)?.range();
            if let Some(num) = caps.name("pnum") {
                let value = parse_digits(num.as_str())?;
                return Some(AmountToken {
                    value: -value.abs(),
                    explicitly_signed: true,
                    span,
                });
            }
            let num = caps.name("num")?;
            let magnitude = parse_digits(num.as_str())?;
            let sign = caps.name("sign").map(|s| s.as_str());
            Some(AmountToken {
                value: if sign == Some("-") { -magnitude } else { magnitude },
                explicitly_signed: sign.is_some(),
                span,
            })
        })
        .collect()
}

/// Parse a single amount such as `-1,234.56`, `(75.25)` or `+114 337.50`.
/// Returns `None` unless the whole (trimmed) input is one amount token.
pub fn parse_amount(s: &str) -> Option<Money> {
    let s = s.trim();
    let tokens = find_amounts(s);
    match tokens.as_slice() {
        [only] if s[..only.span.start].trim().is_empty() && s[only.span.end..].trim().is_empty() => {
            Some(only.value)
        }
        _ => None,
    }
}

fn parse_digits(num: &str) -> Option<Money> {
    let clean: String = num.chars().filter(|c| *c != ',' && *c != ' ').collect();
    Decimal::from_str(&clean).ok().map(Money::from_decimal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(line: &str) -> Vec<Money> {
        find_amounts(line).into_iter().map(|t| t.value).collect()
    }

    fn m(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn signed_amounts_on_a_transaction_line() {
        let line = "** MTN May 2023 A0159924 -121.00 +114216.50";
        assert_eq!(values(line), vec![m(-12100), m(11_421_650)]);
    }

    #[test]
    fn space_and_comma_thousands() {
        assert_eq!(values("-10 000.00 +124 345.00"), vec![m(-1_000_000), m(12_434_500)]);
        assert_eq!(values("1,234.56"), vec![m(123_456)]);
    }

    #[test]
    fn trailing_comma_is_not_part_of_amount() {
        assert_eq!(
            values("Directors Fees -7.50 -10000.00, +114 337.50"),
            vec![m(-750), m(-1_000_000), m(11_433_750)]
        );
    }

    #[test]
    fn parentheses_are_negative() {
        let tokens = find_amounts("Refund (1,234.56) 500.00");
        assert_eq!(tokens[0].value, m(-123_456));
        assert!(tokens[0].explicitly_signed);
        assert_eq!(tokens[1].value, m(50_000));
        assert!(!tokens[1].explicitly_signed);
    }

    #[test]
    fn currency_symbols_are_ignored() {
        assert_eq!(values("$5.50 -€12.00 £ 3.10 R1 234.56"), vec![m(550), m(-1200), m(310), m(123_456)]);
    }

    #[test]
    fn unsigned_balance_is_positive() {
        assert_eq!(values("114216.50"), vec![m(11_421_650)]);
    }

    #[test]
    fn integers_years_and_references_are_not_amounts() {
        assert!(values("May 2023 A0159924 4063304150 632005").is_empty());
        assert!(values("version 1.2.3").is_empty());
    }

    #[test]
    fn figures_inside_words_are_not_amounts() {
        assert!(values("ABC12.50").is_empty());
    }

    #[test]
    fn spans_cover_the_sign() {
        let line = "x -121.00";
        let t = &find_amounts(line)[0];
        assert_eq!(&line[t.span.clone()], "-121.00");
    }

    #[test]
    fn parse_amount_whole_token_only() {
        assert_eq!(parse_amount(" -1,234.56 "), Some(m(-123_456)));
        assert_eq!(parse_amount("(75.25)"), Some(m(-7525)));
        assert_eq!(parse_amount("+114 337.50"), Some(m(11_433_750)));
        assert_eq!(parse_amount("0.01"), Some(m(1)));
        assert_eq!(parse_amount("12.00 13.00"), None);
        assert_eq!(parse_amount("fee 12.00"), None);
        assert_eq!(parse_amount("not_a_number"), None);
        assert_eq!(parse_amount(""), None);
    }
}
