use std::collections::HashSet;
use std::fmt;

use chrono::NaiveDate;
use concilia_core::money::format_amount;
use concilia_core::{EntryTable, StatementPeriod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ofx::Transaction;
use crate::util::significant_tokens;

/// Matching tolerances. Defaults are the product values; deployments
/// can override them from configuration without touching scoring code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Largest absolute amount difference, in currency units, still
    /// counted as an amount match.
    pub amount_epsilon: Decimal,
    /// Day window for the strong "due date is near" signal.
    pub near_days: i64,
    /// Day window for the weaker "due date is plausible" signal. Rows
    /// beyond it lose the date signal but are not disqualified.
    pub outer_days: i64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            amount_epsilon: Decimal::new(1, 2), // 0.01
            near_days: 3,
            outer_days: 30,
        }
    }
}

#[derive(Debug, Error)]
#[error("configuração de conciliação inválida: {0}")]
pub struct ConfigError(String);

impl MatchConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError(e.to_string()))
    }

    /// Defaults adjusted to a statement's coverage: a statement spanning
    /// more than the standard outer window widens it, so due dates
    /// anywhere in the covered period keep their date signal.
    pub fn for_period(period: StatementPeriod) -> Self {
        let mut config = MatchConfig::default();
        if let Some(span) = period.span_days() {
            config.outer_days = config.outer_days.max(span);
        }
        config
    }
}

/// One open receivable or payable row supplied by the caller. Read-only
/// here: the engine never creates, mutates or persists ledger entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateLedgerEntry {
    pub id: i64,
    pub entry_table: EntryTable,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Amount matched and the due date is within the near window.
    High,
    /// Amount matched plus a weaker corroborating signal.
    Medium,
    /// A single signal fired.
    Low,
}

impl Confidence {
    /// Sort rank; high sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Confidence::High => 0,
            Confidence::Medium => 1,
            Confidence::Low => 2,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationMatch {
    pub entry_id: i64,
    pub entry_table: EntryTable,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub confidence: Confidence,
    /// User-facing justifications, always in amount, date, description
    /// order.
    pub match_reasons: Vec<String>,
}

/// Workflow state of one statement line. The engine only ever emits
/// Pending; the terminal states record the operator's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Matched,
    Created,
    Ignored,
}

impl ItemStatus {
    pub fn is_final(self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "pending"),
            ItemStatus::Matched => write!(f, "matched"),
            ItemStatus::Created => write!(f, "created"),
            ItemStatus::Ignored => write!(f, "ignored"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("o lançamento já foi tratado ({0})")]
    AlreadyResolved(ItemStatus),
    #[error("um lançamento tratado não pode voltar a pendente")]
    BackToPending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationItem {
    pub transaction: Transaction,
    pub suggested_matches: Vec<ReconciliationMatch>,
    pub status: ItemStatus,
}

impl ReconciliationItem {
    /// Records the operator's decision. Only a pending item can move,
    /// and only into a terminal state.
    pub fn apply_status(&mut self, next: ItemStatus) -> Result<(), TransitionError> {
        if self.status.is_final() {
            return Err(TransitionError::AlreadyResolved(self.status));
        }
        if next == ItemStatus::Pending {
            return Err(TransitionError::BackToPending);
        }
        self.status = next;
        Ok(())
    }
}

pub struct MatchEngine {
    pub config: MatchConfig,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        MatchEngine { config }
    }

    /// Builds the pending worklist for one imported statement: one item
    /// per transaction not seen in an earlier import, each carrying its
    /// ranked suggestions.
    pub fn build_items(
        &self,
        transactions: &[Transaction],
        candidates: &[CandidateLedgerEntry],
        previously_imported: &HashSet<String>,
    ) -> Vec<ReconciliationItem> {
        transactions
            .iter()
            .filter(|tx| !previously_imported.contains(&tx.fit_id))
            .map(|tx| ReconciliationItem {
                transaction: tx.clone(),
                suggested_matches: self.suggestions_for(tx, candidates),
                status: ItemStatus::Pending,
            })
            .collect()
    }

    /// Suggestions for one transaction, restricted to candidates on the
    /// ledger side its polarity can settle, ordered best first. The sort
    /// is stable, so fully tied candidates keep their input order.
    fn suggestions_for(
        &self,
        tx: &Transaction,
        candidates: &[CandidateLedgerEntry],
    ) -> Vec<ReconciliationMatch> {
        let table = tx.kind.entry_table();
        let mut scored: Vec<(Decimal, i64, ReconciliationMatch)> = candidates
            .iter()
            .filter(|c| c.entry_table == table)
            .filter_map(|c| self.score(tx, c))
            .collect();

        scored.sort_by(|a, b| {
            (a.2.confidence.rank(), a.0, a.1).cmp(&(b.2.confidence.rank(), b.0, b.1))
        });

        scored.into_iter().map(|(_, _, m)| m).collect()
    }

    /// Returns `Some((amount_diff, date_diff, match))` when at least one
    /// signal fires, else `None`. Candidates with no signal at all are
    /// not surfaced even as low confidence.
    fn score(
        &self,
        tx: &Transaction,
        candidate: &CandidateLedgerEntry,
    ) -> Option<(Decimal, i64, ReconciliationMatch)> {
        let amount_diff = (tx.absolute_amount - candidate.amount.abs()).abs();
        let date_diff = (candidate.due_date - tx.date).num_days().abs();

        let amount = self.amount_signal(amount_diff);
        let date = self.date_signal(date_diff);
        let description = description_signal(tx, candidate);

        let confidence = tier(&amount, &date, &description)?;

        let mut reasons = Vec::new();
        if let Some(reason) = amount.reason() {
            reasons.push(reason);
        }
        if let Some(reason) = date.reason() {
            reasons.push(reason);
        }
        if let Some(reason) = description.reason() {
            reasons.push(reason);
        }

        Some((
            amount_diff,
            date_diff,
            ReconciliationMatch {
                entry_id: candidate.id,
                entry_table: candidate.entry_table,
                due_date: candidate.due_date,
                amount: candidate.amount,
                description: candidate.description.clone(),
                confidence,
                match_reasons: reasons,
            },
        ))
    }

    fn amount_signal(&self, diff: Decimal) -> AmountSignal {
        if diff.is_zero() {
            AmountSignal::Exact
        } else if diff <= self.config.amount_epsilon {
            AmountSignal::Near { diff }
        } else {
            AmountSignal::Absent
        }
    }

    fn date_signal(&self, days: i64) -> DateSignal {
        if days <= self.config.near_days {
            DateSignal::Near { days }
        } else if days <= self.config.outer_days {
            DateSignal::Plausible { days }
        } else {
            DateSignal::Absent
        }
    }
}

enum AmountSignal {
    Exact,
    Near { diff: Decimal },
    Absent,
}

enum DateSignal {
    Near { days: i64 },
    Plausible { days: i64 },
    Absent,
}

enum DescriptionSignal {
    Shared { token: String },
    Absent,
}

impl AmountSignal {
    fn reason(&self) -> Option<String> {
        match self {
            AmountSignal::Exact => Some("Valor idêntico".to_string()),
            AmountSignal::Near { diff } => Some(format!(
                "Valor aproximado (diferença de {})",
                format_amount(*diff)
            )),
            AmountSignal::Absent => None,
        }
    }
}

impl DateSignal {
    fn reason(&self) -> Option<String> {
        match self {
            DateSignal::Near { days } => Some(format!("Data próxima ({})", day_count(*days))),
            DateSignal::Plausible { days } => {
                Some(format!("Data no período esperado ({})", day_count(*days)))
            }
            DateSignal::Absent => None,
        }
    }
}

impl DescriptionSignal {
    fn reason(&self) -> Option<String> {
        match self {
            DescriptionSignal::Shared { token } => {
                Some(format!("Descrição semelhante (\"{token}\")"))
            }
            DescriptionSignal::Absent => None,
        }
    }
}

/// First transaction token also present in the candidate description,
/// scanning in transaction token order.
fn description_signal(tx: &Transaction, candidate: &CandidateLedgerEntry) -> DescriptionSignal {
    let candidate_tokens = significant_tokens(&candidate.description);
    let shared = significant_tokens(&tx.description)
        .into_iter()
        .find(|token| candidate_tokens.iter().any(|c| c == token));
    match shared {
        Some(token) => DescriptionSignal::Shared { token },
        None => DescriptionSignal::Absent,
    }
}

fn tier(
    amount: &AmountSignal,
    date: &DateSignal,
    description: &DescriptionSignal,
) -> Option<Confidence> {
    let amount_hit = !matches!(amount, AmountSignal::Absent);
    let date_hit = !matches!(date, DateSignal::Absent);
    let description_hit = !matches!(description, DescriptionSignal::Absent);

    if amount_hit && matches!(date, DateSignal::Near { .. }) {
        return Some(Confidence::High);
    }
    if amount_hit && (date_hit || description_hit) {
        return Some(Confidence::Medium);
    }
    if amount_hit || date_hit || description_hit {
        return Some(Confidence::Low);
    }
    None
}

fn day_count(days: i64) -> String {
    match days {
        0 => "mesmo dia".to_string(),
        1 => "1 dia".to_string(),
        n => format!("{n} dias"),
    }
}
