use chrono::NaiveDate;
use concilia_core::{money, StatementPeriod, TransactionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{collapse_whitespace, description_slug};

/// One normalized statement line. Built by the parser and read-only
/// afterwards; `absolute_amount` and `kind` are derived from the signed
/// amount at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Bank-assigned id, or a synthesized "SYN-..." id when the bank
    /// omitted it (flagged in the statement warnings).
    pub fit_id: String,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub absolute_amount: Decimal,
    pub description: String,
    /// Raw TRNTYPE code, preserved for display. The credit/debit kind
    /// comes from the amount sign, never from this code.
    pub ofx_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAccount {
    pub bank_id: Option<String>,
    pub branch_id: Option<String>,
    pub account_id: Option<String>,
    pub ledger_balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedStatement {
    pub account: ParsedAccount,
    pub period: StatementPeriod,
    pub currency: Option<String>,
    pub transactions: Vec<Transaction>,
    /// Recoverable issues found while parsing, in the order they were
    /// hit. Messages are user-facing.
    pub warnings: Vec<String>,
}

/// The single fatal failure. Every recoverable problem becomes a
/// warning on the statement instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("o arquivo não é um extrato OFX/QFX reconhecível")]
    NotOfx,
}

/// Parses the decoded text of an OFX/QFX file. Both the SGML tag-soup
/// flavor (no closing tags, value runs to end of line) and the
/// well-formed XML flavor are accepted; tags match case-insensitively.
pub fn parse(raw: &str) -> Result<ParsedStatement, ParseError> {
    let body = ofx_body(raw);
    let upper = body.to_ascii_uppercase();

    let records = extract_blocks(body, &upper, "STMTTRN");
    let has_account = extract_block(body, &upper, "BANKACCTFROM").is_some()
        || extract_block(body, &upper, "CCACCTFROM").is_some()
        || extract_value(body, &upper, "ACCTID").is_some();
    if records.is_empty() && !has_account {
        return Err(ParseError::NotOfx);
    }

    let mut warnings = Vec::new();
    let account = parse_account(body, &upper, &mut warnings);
    let period = parse_period(body, &upper, &mut warnings);
    let currency = extract_value(body, &upper, "CURDEF").map(str::to_string);

    let mut transactions: Vec<Transaction> = Vec::new();
    for (index, block) in records.iter().enumerate() {
        if let Some(transaction) = parse_record(block, index, &mut warnings) {
            if transactions.iter().any(|t| t.fit_id == transaction.fit_id) {
                warnings.push(format!("FITID \"{}\" repetido no extrato", transaction.fit_id));
            }
            transactions.push(transaction);
        }
    }
    if records.is_empty() {
        warnings.push("O extrato não contém lançamentos".to_string());
    }

    tracing::debug!(
        transactions = transactions.len(),
        warnings = warnings.len(),
        "statement parsed"
    );

    Ok(ParsedStatement {
        account,
        period,
        currency,
        transactions,
        warnings,
    })
}

/// Entry point for raw file contents. Legacy charsets should be decoded
/// by the caller; invalid UTF-8 is replaced rather than rejected.
pub fn parse_bytes(data: &[u8]) -> Result<ParsedStatement, ParseError> {
    parse(&String::from_utf8_lossy(data))
}

fn parse_account(body: &str, upper: &str, warnings: &mut Vec<String>) -> ParsedAccount {
    let container = extract_block(body, upper, "BANKACCTFROM")
        .or_else(|| extract_block(body, upper, "CCACCTFROM"));

    // Some emitters skip the account container and leave ACCTID at the
    // top level; fall back to a whole-body scan.
    let scope = container.unwrap_or(body);
    let scope_upper = scope.to_ascii_uppercase();
    let field = |tag: &str| extract_value(scope, &scope_upper, tag).map(str::to_string);

    let account = ParsedAccount {
        bank_id: field("BANKID"),
        branch_id: field("BRANCHID"),
        account_id: field("ACCTID"),
        ledger_balance: parse_ledger_balance(body, upper, warnings),
    };

    if account.account_id.is_none() {
        warnings.push("Extrato sem identificação de conta (ACCTID)".to_string());
    }
    account
}

fn parse_ledger_balance(body: &str, upper: &str, warnings: &mut Vec<String>) -> Option<Decimal> {
    let block = extract_block(body, upper, "LEDGERBAL")?;
    let block_upper = block.to_ascii_uppercase();
    let raw = extract_value(block, &block_upper, "BALAMT")?;
    let parsed = money::parse_amount(raw);
    if parsed.is_none() {
        warnings.push(format!("Saldo final do extrato ilegível: \"{raw}\""));
    }
    parsed
}

fn parse_period(body: &str, upper: &str, warnings: &mut Vec<String>) -> StatementPeriod {
    let mut bound = |tag: &str, label: &str| match extract_value(body, upper, tag) {
        Some(raw) => {
            let parsed = parse_ofx_date(raw);
            if parsed.is_none() {
                warnings.push(format!("Período do extrato ilegível: {label} \"{raw}\""));
            }
            parsed
        }
        None => None,
    };

    let start = bound("DTSTART", "início");
    let end = bound("DTEND", "fim");
    StatementPeriod::new(start, end)
}

/// One STMTTRN block. Records without a usable date or amount are
/// dropped with a warning; everything else is tolerated.
fn parse_record(block: &str, index: usize, warnings: &mut Vec<String>) -> Option<Transaction> {
    let upper = block.to_ascii_uppercase();
    let field = |tag: &str| extract_value(block, &upper, tag);
    let position = index + 1;

    let date = match field("DTPOSTED") {
        Some(raw) => match parse_ofx_date(raw) {
            Some(date) => date,
            None => {
                tracing::debug!(record = position, value = raw, "record dropped: bad DTPOSTED");
                warnings.push(format!("Lançamento {position} descartado: data \"{raw}\" inválida"));
                return None;
            }
        },
        None => {
            tracing::debug!(record = position, "record dropped: missing DTPOSTED");
            warnings.push(format!("Lançamento {position} descartado: sem data de postagem"));
            return None;
        }
    };

    let amount = match field("TRNAMT") {
        Some(raw) => match money::parse_amount(raw) {
            Some(amount) => amount,
            None => {
                tracing::debug!(record = position, value = raw, "record dropped: bad TRNAMT");
                warnings.push(format!("Lançamento {position} descartado: valor \"{raw}\" ilegível"));
                return None;
            }
        },
        None => {
            tracing::debug!(record = position, "record dropped: missing TRNAMT");
            warnings.push(format!("Lançamento {position} descartado: sem valor"));
            return None;
        }
    };

    let description = field("MEMO")
        .or_else(|| field("NAME"))
        .map(collapse_whitespace)
        .unwrap_or_default();
    if description.is_empty() {
        warnings.push(format!("Lançamento {position}: sem descrição (MEMO/NAME)"));
    }

    let fit_id = match field("FITID") {
        Some(raw) => raw.to_string(),
        None => {
            let synthetic = format!("SYN-{date}-{amount}-{}", description_slug(&description, 16));
            warnings.push(format!(
                "Lançamento {position}: sem FITID, usando identificador sintético \"{synthetic}\""
            ));
            synthetic
        }
    };

    Some(Transaction {
        fit_id,
        date,
        kind: TransactionKind::from_amount(amount),
        amount,
        absolute_amount: amount.abs(),
        description,
        ofx_type: field("TRNTYPE").map(str::to_string),
    })
}

/// Skips the OFX header (SGML "KEY:value" lines or the XML prolog); the
/// parseable body starts at the <OFX> root when one is present.
fn ofx_body(content: &str) -> &str {
    let upper = content.to_ascii_uppercase();
    match upper.find("<OFX>") {
        Some(at) => &content[at..],
        None => content,
    }
}

/// All <TAG>...</TAG> blocks, case-insensitive. A block ends at its
/// close tag or at the next opener, whichever comes first: an unclosed
/// SGML record ends where the following record starts, even when a
/// closed record appears later in the same file.
fn extract_blocks<'a>(content: &'a str, upper: &str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let mut blocks = Vec::new();
    let mut from = 0;
    while let Some(found) = upper[from..].find(&open) {
        let start = from + found + open.len();
        let tail = &upper[start..];
        let end = match (tail.find(&close), tail.find(&open)) {
            (Some(close_at), Some(next_open)) => start + close_at.min(next_open),
            (Some(close_at), None) => start + close_at,
            (None, Some(next_open)) => start + next_open,
            (None, None) => upper.len(),
        };
        blocks.push(&content[start..end]);
        from = end;
    }
    blocks
}

fn extract_block<'a>(content: &'a str, upper: &str, tag: &str) -> Option<&'a str> {
    extract_blocks(content, upper, tag).into_iter().next()
}

/// Value text of the first <TAG>: runs until the next '<', which covers
/// both "<MEMO>text" soup and "<MEMO>text</MEMO>" XML. Empty values
/// count as absent.
fn extract_value<'a>(content: &'a str, upper: &str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let start = upper.find(&open)? + open.len();
    let tail = &content[start..];
    let end = tail.find('<').unwrap_or(tail.len());
    let value = tail[..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_ofx_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    // OFX standard form: YYYYMMDD with optional time and "[-03:EST]"
    // style timezone suffix. Only the leading date digits matter.
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 8 {
        let year: i32 = digits[0..4].parse().ok()?;
        let month: u32 = digits[4..6].parse().ok()?;
        let day: u32 = digits[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}
