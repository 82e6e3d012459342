use ledgerline_core::Money;
use serde::{Deserialize, Serialize};

use crate::amounts::AmountToken;

/// Where a statement prints its fees, amount and balance columns.
///
/// The assembler never infers this per line; a statement whose columns differ
/// from the configured layout mis-assigns fields, which shows up as
/// balance-continuity warnings in the assembly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// `... [fees] amount balance`: balance last, amount before it, and an
    /// optional third trailing figure as fees.
    #[default]
    FeesAmountBalance,
    /// `... amount balance`: never reads fees.
    AmountBalance,
    /// `balance amount [fees] ...`: leading figures.
    BalanceAmountFees,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountFields {
    pub fees: Option<Money>,
    pub amount: Money,
    pub balance: Money,
}

impl ColumnLayout {
    /// Assign the amount tokens of one line to fields. `None` when the line
    /// carries fewer than two figures.
    pub fn assign(self, tokens: &[AmountToken]) -> Option<AmountFields> {
        let n = tokens.len();
        if n < 2 {
            return None;
        }
        let v = |i: usize| tokens[i].value;
        let fields = match self {
            ColumnLayout::FeesAmountBalance => AmountFields {
                fees: (n >= 3).then(|| v(n - 3)),
                amount: v(n - 2),
                balance: v(n - 1),
            },
            ColumnLayout::AmountBalance => AmountFields {
                fees: None,
                amount: v(n - 2),
                balance: v(n - 1),
            },
            ColumnLayout::BalanceAmountFees => AmountFields {
                fees: (n >= 3).then(|| v(2)),
                amount: v(1),
                balance: v(0),
            },
        };
        Some(fields)
    }
}

impl std::fmt::Display for ColumnLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ColumnLayout::FeesAmountBalance => "fees_amount_balance",
            ColumnLayout::AmountBalance => "amount_balance",
            ColumnLayout::BalanceAmountFees => "balance_amount_fees",
        };
        f.write_str(s)
    }
}
