use serde::{Deserialize, Serialize};

use super::money::Money;

/// One financial movement read off a statement.
///
/// Dates are kept exactly as printed; no calendar parsing happens here because
/// statements disagree on day/month order and the raw text is what a reviewer
/// compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub post_date: String,
    pub trans_date: String,
    pub description: String,
    pub reference: Option<String>,
    /// Absent when the line printed no fee column. Never defaulted to zero.
    pub fees: Option<Money>,
    pub amount: Money,
    /// Running account balance after this transaction.
    pub balance: Money,
    /// 1-based line number in the extracted text that started this record.
    pub source_line_number: usize,
}

impl TransactionRecord {
    /// Net effect on the running balance: amount plus fees when present.
    pub fn net_movement(&self) -> Money {
        self.amount + self.fees.unwrap_or_else(Money::zero)
    }

    pub fn is_debit(&self) -> bool {
        self.amount.is_negative()
    }
}
