use ledgerline_core::TransactionRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::amounts::{find_amounts, AmountToken};
use crate::dates::find_dates;
use crate::layout::{AmountFields, ColumnLayout};
use crate::report::{Assembly, AssemblyReport, BalanceMismatch, LineSkipped, SkipReason};
use crate::util::{blank_spans, clean_fragment};

const MIN_REFERENCE_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    pub layout: ColumnLayout,
    /// Date tokens a line needs to open a transaction (posting + transaction date).
    pub start_date_tokens: usize,
    /// Unindented text shorter than this many characters is treated as a
    /// wrapped description rather than body text.
    pub continuation_max_len: usize,
    /// Case-insensitive phrases marking rows that look like transactions but
    /// are not, e.g. carried-forward balances.
    pub noise_phrases: Vec<String>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            layout: ColumnLayout::default(),
            start_date_tokens: 2,
            continuation_max_len: 30,
            noise_phrases: vec!["balance brought forward".into(), "interest rate".into()],
        }
    }
}

/// Turns statement text lines into transaction records.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    config: AssemblerConfig,
}

/// One line with its dates and amounts located. Amount spans refer to the
/// line with dates already blanked out.
struct ClassifiedLine<'a> {
    dates: Vec<&'a str>,
    amounts: Vec<AmountToken>,
    /// The line with dates and amounts blanked out.
    residue: String,
}

impl<'a> ClassifiedLine<'a> {
    fn classify(line: &'a str) -> Self {
        let dates = find_dates(line);
        let date_spans: Vec<_> = dates.iter().map(|d| d.span.clone()).collect();
        let without_dates = blank_spans(line, &date_spans);
        let amounts = find_amounts(&without_dates);
        let amount_spans: Vec<_> = amounts.iter().map(|a| a.span.clone()).collect();
        let residue = blank_spans(&without_dates, &amount_spans);
        Self {
            dates: dates.into_iter().map(|d| d.text).collect(),
            amounts,
            residue,
        }
    }
}

impl Assembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Assemble `lines` in source order. Malformed lines are skipped and
    /// recorded in the report; nothing here aborts the document.
    pub fn assemble<S: AsRef<str>>(&self, lines: &[S]) -> Assembly {
        let start_dates = self.config.start_date_tokens.max(1);
        let mut report = AssemblyReport {
            total_lines: lines.len(),
            ..Default::default()
        };
        let mut transactions: Vec<TransactionRecord> = Vec::new();
        let mut current: Option<TransactionRecord> = None;

        for (idx, raw) in lines.iter().enumerate() {
            let raw = raw.as_ref();
            let line_number = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                report.blank_lines += 1;
                continue;
            }

            let line = ClassifiedLine::classify(raw);
            let mut skip = |reason: SkipReason| {
                debug!(line_number, %reason, "line skipped");
                report.skipped.push(LineSkipped {
                    line_number,
                    reason,
                    text: trimmed.to_string(),
                });
            };

            if line.dates.len() >= start_dates {
                let Some(fields) = self.config.layout.assign(&line.amounts) else {
                    skip(SkipReason::MissingAmounts);
                    continue;
                };
                let (reference, description) = split_reference(&line.residue);
                if self.is_noise(&description) {
                    skip(SkipReason::NoisePhrase);
                    continue;
                }
                let post_date = line.dates[0].to_string();
                let trans_date = line.dates.get(1).unwrap_or(&line.dates[0]).to_string();
                if let Some(done) = current.take() {
                    transactions.push(done);
                }
                report.transactions_detected += 1;
                current = Some(TransactionRecord {
                    post_date,
                    trans_date,
                    description,
                    reference,
                    fees: fields.fees,
                    amount: fields.amount,
                    balance: fields.balance,
                    source_line_number: line_number,
                });
                continue;
            }

            let Some(open) = current.as_mut() else {
                skip(SkipReason::BeforeFirstTransaction);
                continue;
            };

            if let Some(first) = line.amounts.first() {
                match self.config.layout.assign(&line.amounts) {
                    Some(fields) => amend(open, fields),
                    // A lone figure corrects the amount; fees and balance stand.
                    None => open.amount = first.value,
                }
                append_description(open, &clean_fragment(line.residue.split_whitespace()));
                report.continuation_lines += 1;
                continue;
            }

            if !line.dates.is_empty() {
                skip(SkipReason::StrayDate);
                continue;
            }

            let indented = raw.starts_with(char::is_whitespace);
            if indented || trimmed.chars().count() < self.config.continuation_max_len {
                append_description(open, &clean_fragment(trimmed.split_whitespace()));
                report.continuation_lines += 1;
            } else {
                skip(SkipReason::UnattachedText);
            }
        }

        if let Some(done) = current.take() {
            transactions.push(done);
        }
        report.balance_mismatches = balance_mismatches(&transactions);

        info!(
            lines = report.total_lines,
            transactions = transactions.len(),
            skipped = report.skipped.len(),
            balance_mismatches = report.balance_mismatches.len(),
            "statement assembled"
        );
        Assembly {
            transactions,
            report,
        }
    }

    /// A noise phrase must make up the whole description; rows that merely
    /// mention one are real transactions.
    fn is_noise(&self, description: &str) -> bool {
        let lower = description.trim().to_lowercase();
        !lower.is_empty()
            && self
                .config
                .noise_phrases
                .iter()
                .any(|p| p.trim().to_lowercase() == lower)
    }
}

/// Assemble with the default configuration, discarding the report.
pub fn assemble<S: AsRef<str>>(lines: &[S]) -> Vec<TransactionRecord> {
    Assembler::default().assemble(lines).transactions
}

fn amend(tx: &mut TransactionRecord, fields: AmountFields) {
    tx.fees = fields.fees;
    tx.amount = fields.amount;
    tx.balance = fields.balance;
}

fn append_description(tx: &mut TransactionRecord, text: &str) {
    if text.is_empty() {
        return;
    }
    if !tx.description.is_empty() {
        tx.description.push(' ');
    }
    tx.description.push_str(text);
}

/// Pull the first reference-like token out of `residue` and clean what is left
/// into a description.
fn split_reference(residue: &str) -> (Option<String>, String) {
    let mut tokens: Vec<&str> = residue.split_whitespace().collect();
    let position = tokens
        .iter()
        .position(|t| is_reference(t.trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '.'))));
    let reference = position.map(|i| {
        tokens
            .remove(i)
            .trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '.'))
            .to_string()
    });
    (reference, clean_fragment(tokens))
}

/// Reference codes are long unbroken alphanumeric runs carrying at least one
/// digit; plain words of the same length are description.
fn is_reference(token: &str) -> bool {
    token.chars().count() >= MIN_REFERENCE_LEN
        && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '*')
        && token.chars().any(|c| c.is_ascii_digit())
}

fn balance_mismatches(transactions: &[TransactionRecord]) -> Vec<BalanceMismatch> {
    transactions
        .windows(2)
        .filter_map(|pair| {
            let (prev, tx) = (&pair[0], &pair[1]);
            let expected = prev.balance + tx.net_movement();
            (expected != tx.balance).then(|| BalanceMismatch {
                source_line_number: tx.source_line_number,
                expected_balance: expected,
                actual_balance: tx.balance,
            })
        })
        .collect()
}
