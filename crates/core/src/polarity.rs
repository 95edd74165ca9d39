use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Direction of a statement transaction, derived from the signed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    /// Negative amounts are debits; zero and positive amounts are credits.
    pub fn from_amount(amount: Decimal) -> Self {
        if amount < Decimal::ZERO {
            TransactionKind::Debit
        } else {
            TransactionKind::Credit
        }
    }

    /// The ledger side a transaction of this kind can settle: money in
    /// pays receivables, money out pays payables.
    pub fn entry_table(self) -> EntryTable {
        match self {
            TransactionKind::Credit => EntryTable::Receivable,
            TransactionKind::Debit => EntryTable::Payable,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Credit => write!(f, "credit"),
            TransactionKind::Debit => write!(f, "debit"),
        }
    }
}

/// Which open-entries table a ledger row belongs to. The string forms
/// are the table identifiers the rest of the product uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryTable {
    #[serde(rename = "contas_receber")]
    Receivable,
    #[serde(rename = "contas_pagar")]
    Payable,
}

impl EntryTable {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryTable::Receivable => "contas_receber",
            EntryTable::Payable => "contas_pagar",
        }
    }
}

impl fmt::Display for EntryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("tabela de lançamentos desconhecida: \"{0}\"")]
pub struct UnknownEntryTable(pub String);

impl FromStr for EntryTable {
    type Err = UnknownEntryTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contas_receber" => Ok(EntryTable::Receivable),
            "contas_pagar" => Ok(EntryTable::Payable),
            other => Err(UnknownEntryTable(other.to_string())),
        }
    }
}
