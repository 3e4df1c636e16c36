//! Monthly reports over the ledger: normalized rows, newest first, and the
//! totals shown on the closing screen.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::errors::{Result, StoreError};
use crate::ledger::LedgerStore;
use crate::rows::{LedgerRow, KIND_EXPENSE, KIND_SALE, STATUS_PAID};

const OTHER_PAYMENTS: &str = "Outros";
const CREDIT_FAMILY: &str = "Crédito";
const DEBIT_FAMILY: &str = "Débito";

/// Parse a `YYYY-MM` month key into the first day of that month.
pub fn parse_month_key(key: &str) -> Result<NaiveDate> {
    let invalid = || StoreError::InvalidMonth {
        value: key.to_string(),
    };
    let (year, month) = key.trim().split_once('-').ok_or_else(invalid)?;
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(year) || !digits(month) {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)
}

/// A ledger row with its amount normalized to a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Data")]
    pub date: String,
    #[serde(rename = "Valor")]
    pub amount: f64,
    #[serde(rename = "Tipo")]
    pub kind: String,
    #[serde(rename = "Pagamento")]
    pub payment: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "ID_Único")]
    pub id: String,
}

impl From<LedgerRow> for ReportRow {
    fn from(row: LedgerRow) -> Self {
        Self {
            amount: row.amount.value(),
            date: row.date,
            kind: row.kind,
            payment: row.payment,
            status: row.status,
            id: row.id,
        }
    }
}

/// Rows of one month, most recent first.
pub fn monthly_report(
    store: &LedgerStore,
    establishment: &str,
    month: Option<NaiveDate>,
) -> Result<Vec<ReportRow>> {
    let rows = store.read(establishment, month)?;
    debug!(establishment = %establishment, rows = rows.len(), "building monthly report");
    Ok(rows.into_iter().rev().map(ReportRow::from).collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub sales_total: f64,
    pub expenses_total: f64,
    pub other_total: f64,
    pub pending_sales: usize,
    pub pending_sales_total: f64,
    /// Sales per payment family. Card labels with a brand suffix
    /// (`Crédito (Visa)`) fold into their family.
    pub sales_by_payment: BTreeMap<String, f64>,
}

/// Card labels fold into `Crédito` / `Débito`; blank labels go to `Outros`.
pub fn payment_family(label: &str) -> &str {
    if label.contains(CREDIT_FAMILY) {
        CREDIT_FAMILY
    } else if label.contains(DEBIT_FAMILY) {
        DEBIT_FAMILY
    } else if label.is_empty() {
        OTHER_PAYMENTS
    } else {
        label
    }
}

pub fn summarize(rows: &[ReportRow]) -> MonthlySummary {
    let mut summary = MonthlySummary::default();
    for row in rows {
        match row.kind.as_str() {
            KIND_SALE => {
                summary.sales_total += row.amount;
                *summary
                    .sales_by_payment
                    .entry(payment_family(&row.payment).to_string())
                    .or_insert(0.0) += row.amount;
                if row.status != STATUS_PAID {
                    summary.pending_sales += 1;
                    summary.pending_sales_total += row.amount;
                }
            }
            KIND_EXPENSE => summary.expenses_total += row.amount,
            _ => summary.other_total += row.amount,
        }
    }
    summary
}
