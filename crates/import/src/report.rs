use ledgerline_core::{Money, TransactionRecord};
use serde::{Deserialize, Serialize};

/// Why a line did not contribute to any transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Text seen before the first transaction-start line (headers, address blocks).
    BeforeFirstTransaction,
    /// Carried the dates of a transaction start but fewer than two amounts.
    MissingAmounts,
    /// A transaction start whose description is a known non-transaction row.
    NoisePhrase,
    /// A lone date with no amounts, e.g. a page header.
    StrayDate,
    /// Long, unindented text following a transaction: body text, not a wrap.
    UnattachedText,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::BeforeFirstTransaction => "before first transaction",
            SkipReason::MissingAmounts => "transaction start without amount and balance",
            SkipReason::NoisePhrase => "noise phrase",
            SkipReason::StrayDate => "date without amounts",
            SkipReason::UnattachedText => "unattached text",
        };
        f.write_str(s)
    }
}

/// A line the assembler passed over. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSkipped {
    pub line_number: usize,
    pub reason: SkipReason,
    pub text: String,
}

/// A transaction whose balance does not follow from the one before it.
///
/// Usually means the statement's columns are not in the configured layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceMismatch {
    pub source_line_number: usize,
    pub expected_balance: Money,
    pub actual_balance: Money,
}

/// Accuracy audit for one assembled document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub total_lines: usize,
    pub blank_lines: usize,
    pub transactions_detected: usize,
    /// Lines merged into an open transaction (description wraps and amendments).
    pub continuation_lines: usize,
    pub skipped: Vec<LineSkipped>,
    pub balance_mismatches: Vec<BalanceMismatch>,
}

impl AssemblyReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }

    /// Share of non-blank lines that ended up in a transaction, in `[0, 1]`.
    pub fn detection_rate(&self) -> f64 {
        let considered = self.total_lines.saturating_sub(self.blank_lines);
        if considered == 0 {
            return 0.0;
        }
        (self.transactions_detected + self.continuation_lines) as f64 / considered as f64
    }
}

/// Output of one assembly run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub transactions: Vec<TransactionRecord>,
    pub report: AssemblyReport,
}

impl Assembly {
    /// Sum of the `amount` column, fees excluded.
    pub fn total_amount(&self) -> Money {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}
