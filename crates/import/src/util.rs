use std::ops::Range;

/// Lazily compiled, process-wide regex. Patterns are literals, so a compile
/// failure is a programming error caught by the unit tests.
macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub(crate) use re;

/// Replace each byte range in `spans` with spaces. Byte offsets of the rest of
/// the line are preserved, so spans found earlier stay valid.
pub fn blank_spans(line: &str, spans: &[Range<usize>]) -> String {
    let mut sorted: Vec<&Range<usize>> = spans.iter().collect();
    sorted.sort_by_key(|r| r.start);

    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for span in sorted {
        let start = span.start.max(cursor).min(line.len());
        let end = span.end.min(line.len());
        if start >= end || !line.is_char_boundary(start) || !line.is_char_boundary(end) {
            continue;
        }
        out.push_str(&line[cursor..start]);
        out.extend(std::iter::repeat(' ').take(end - start));
        cursor = end;
    }
    out.push_str(&line[cursor..]);
    out
}

const RESIDUAL_PUNCTUATION: &[char] = &[',', ';', ':', '|'];

/// Collapse whitespace and drop separator debris left behind after dates and
/// amounts are cut out of a line.
pub fn clean_fragment<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    let joined = tokens
        .into_iter()
        .filter(|t| !t.chars().all(|c| RESIDUAL_PUNCTUATION.contains(&c)))
        .collect::<Vec<_>>()
        .join(" ");
    joined
        .trim_matches(|c: char| c.is_whitespace() || RESIDUAL_PUNCTUATION.contains(&c))
        .to_string()
}
