pub mod money;
pub mod period;
pub mod polarity;

pub use money::{format_amount, parse_amount};
pub use period::StatementPeriod;
pub use polarity::{EntryTable, TransactionKind, UnknownEntryTable};
