pub mod matcher;
pub mod ofx;
pub(crate) mod util;

pub use matcher::{
    CandidateLedgerEntry, Confidence, ConfigError, ItemStatus, MatchConfig, MatchEngine,
    ReconciliationItem, ReconciliationMatch, TransitionError,
};
pub use ofx::{ParseError, ParsedAccount, ParsedStatement, Transaction};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything one imported statement produces: the parsed file plus the
/// pending reconciliation worklist derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementReconciliation {
    pub statement: ParsedStatement,
    pub items: Vec<ReconciliationItem>,
}

/// Parses one OFX/QFX file and builds the reconciliation worklist
/// against the supplied open ledger entries in a single call.
pub fn reconcile_statement(
    raw: &str,
    candidates: &[CandidateLedgerEntry],
    previously_imported: &HashSet<String>,
    config: &MatchConfig,
) -> Result<StatementReconciliation, ParseError> {
    let statement = ofx::parse(raw)?;
    if !statement.warnings.is_empty() {
        tracing::warn!(count = statement.warnings.len(), "statement parsed with warnings");
    }

    let engine = MatchEngine::new(config.clone());
    let items = engine.build_items(&statement.transactions, candidates, previously_imported);

    tracing::info!(
        transactions = statement.transactions.len(),
        items = items.len(),
        candidates = candidates.len(),
        "reconciliation worklist built"
    );

    Ok(StatementReconciliation { statement, items })
}

/// Same as [`reconcile_statement`] for callers holding raw file bytes.
pub fn reconcile_bytes(
    data: &[u8],
    candidates: &[CandidateLedgerEntry],
    previously_imported: &HashSet<String>,
    config: &MatchConfig,
) -> Result<StatementReconciliation, ParseError> {
    reconcile_statement(
        &String::from_utf8_lossy(data),
        candidates,
        previously_imported,
        config,
    )
}
