//! Ledger row schema and amount normalization.
//!
//! Every sheet is written with the fixed column order in [`COLUMNS`]. Amounts
//! may come back from disk either as numbers or as locale-formatted text
//! (`"1.234,56"`, `"R$ 12,00"`); [`normalize_amount`] is the single rule used
//! whenever one of those has to take part in arithmetic.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::xlsx::Cell;

pub const COL_DATE: &str = "Data";
pub const COL_AMOUNT: &str = "Valor";
pub const COL_KIND: &str = "Tipo";
pub const COL_PAYMENT: &str = "Pagamento";
pub const COL_STATUS: &str = "Status";
pub const COL_ID: &str = "ID_Único";

/// Column order of every ledger sheet.
pub const COLUMNS: [&str; 6] = [
    COL_DATE,
    COL_AMOUNT,
    COL_KIND,
    COL_PAYMENT,
    COL_STATUS,
    COL_ID,
];

pub const SHEET_NAME: &str = "Vendas";

pub const KIND_SALE: &str = "Venda";
pub const KIND_EXPENSE: &str = "Gasto";
pub const KIND_OTHER: &str = "Outro";

pub const STATUS_PENDING: &str = "Pendente";
pub const STATUS_PAID: &str = "Pago";

pub const DEFAULT_PAYMENT: &str = "N/A";

const ENTRY_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// A stored `Valor`: numeric when written by this crate, possibly text when
/// the sheet was edited by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn value(&self) -> f64 {
        match self {
            Amount::Number(n) => *n,
            Amount::Text(s) => normalize_amount(s),
        }
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Number(value)
    }
}

/// Parse a possibly locale-formatted amount. Unparseable input yields `0.0`.
///
/// With both `.` and `,` present the Brazilian convention applies (`.`
/// groups thousands, `,` is the decimal separator); a lone `,` is a decimal
/// separator; anything else is parsed as-is.
pub fn normalize_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$')
        .collect();

    let decimal = if cleaned.contains(',') && cleaned.contains('.') {
        cleaned.replace('.', "").replacen(',', ".", 1)
    } else if cleaned.contains(',') {
        cleaned.replacen(',', ".", 1)
    } else {
        cleaned
    };

    parse_number_prefix(&decimal).unwrap_or(0.0)
}

/// Split free-form operator input (`"15,00 22.50 30"`) into amounts. Tokens
/// that do not start with a number are dropped.
pub fn parse_amount_list(input: &str) -> Vec<f64> {
    input
        .split_whitespace()
        .filter_map(|token| parse_number_prefix(&token.replacen(',', ".", 1)))
        .collect()
}

/// Longest leading decimal number in `s` (`"12.5abc"` -> 12.5).
fn parse_number_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One ledger transaction. Serializes with the sheet's column names as keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(rename = "Data")]
    pub date: String,
    #[serde(rename = "Valor")]
    pub amount: Amount,
    #[serde(rename = "Tipo")]
    pub kind: String,
    #[serde(rename = "Pagamento")]
    pub payment: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "ID_Único")]
    pub id: String,
}

pub fn format_entry_timestamp(at: NaiveDateTime) -> String {
    at.format(ENTRY_TIMESTAMP_FORMAT).to_string()
}

impl LedgerRow {
    /// Build one pending row per amount, all sharing the entry timestamp.
    /// Blank `kind` / `payment` fall back to `Venda` / `N/A`.
    pub fn batch(
        amounts: &[f64],
        kind: Option<&str>,
        payment: Option<&str>,
        at: NaiveDateTime,
    ) -> Vec<LedgerRow> {
        let date = format_entry_timestamp(at);
        let kind = non_blank(kind).unwrap_or(KIND_SALE);
        let payment = non_blank(payment).unwrap_or(DEFAULT_PAYMENT);
        amounts
            .iter()
            .map(|amount| LedgerRow {
                date: date.clone(),
                amount: Amount::Number(*amount),
                kind: kind.to_string(),
                payment: payment.to_string(),
                status: STATUS_PENDING.to_string(),
                id: Uuid::new_v4().to_string(),
            })
            .collect()
    }

    pub fn is_paid(&self) -> bool {
        self.status == STATUS_PAID
    }

    /// Shallow merge: only the fields present in `patch` change.
    pub fn apply(&mut self, patch: &RowPatch) {
        if let Some(amount) = &patch.amount {
            self.amount = amount.clone();
        }
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
    }

    pub(crate) fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.date),
            match &self.amount {
                Amount::Number(n) => Cell::Number(*n),
                Amount::Text(s) => Cell::text(s),
            },
            Cell::text(&self.kind),
            Cell::text(&self.payment),
            Cell::text(&self.status),
            Cell::text(&self.id),
        ]
    }

    /// Rebuild a row from a sheet record. `columns` holds, for each entry of
    /// [`COLUMNS`], the index of that header in the sheet (if present).
    pub(crate) fn from_cells(columns: &[Option<usize>; 6], cells: &[Cell]) -> LedgerRow {
        let cell = |slot: usize| {
            columns[slot]
                .and_then(|idx| cells.get(idx))
                .cloned()
                .unwrap_or(Cell::Empty)
        };
        LedgerRow {
            date: cell(0).into_text(),
            amount: match cell(1) {
                Cell::Number(n) => Amount::Number(n),
                other => Amount::Text(other.into_text()),
            },
            kind: cell(2).into_text(),
            payment: cell(3).into_text(),
            status: cell(4).into_text(),
            id: cell(5).into_text(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Patches
// ---------------------------------------------------------------------------

/// Field updates accepted by `patch`. Only `Valor` and `Status` are mutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowPatch {
    #[serde(rename = "Valor", default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RowPatch {
    pub fn paid() -> Self {
        Self::status(STATUS_PAID)
    }

    pub fn pending() -> Self {
        Self::status(STATUS_PENDING)
    }

    pub fn status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            ..Self::default()
        }
    }

    pub fn value(amount: f64) -> Self {
        Self {
            amount: Some(Amount::Number(amount)),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 3)
            .unwrap()
    }

    #[test]
    fn test_normalize_brazilian_formats() {
        assert_eq!(normalize_amount("1.234,56"), 1234.56);
        assert_eq!(normalize_amount("50,00"), 50.0);
        assert_eq!(normalize_amount("R$ 12.00"), 12.0);
        assert_eq!(normalize_amount("abc"), 0.0);
    }

    #[test]
    fn test_normalize_edge_cases() {
        assert_eq!(normalize_amount(""), 0.0);
        assert_eq!(normalize_amount("  R$1.000.000,10 "), 1_000_000.1);
        assert_eq!(normalize_amount("-7,5"), -7.5);
        assert_eq!(normalize_amount("1.234"), 1.234);
        assert_eq!(normalize_amount("12abc"), 12.0);
    }

    #[test]
    fn test_amount_value() {
        assert_eq!(Amount::Number(15.0).value(), 15.0);
        assert_eq!(Amount::Text("22,50".into()).value(), 22.5);
        assert_eq!(Amount::Text(String::new()).value(), 0.0);
    }

    #[test]
    fn test_parse_amount_list() {
        assert_eq!(parse_amount_list("15,00 22.50 30"), vec![15.0, 22.5, 30.0]);
        assert_eq!(parse_amount_list("  10\t\nabc 5,5x "), vec![10.0, 5.5]);
        assert!(parse_amount_list("nada aqui").is_empty());
    }

    #[test]
    fn test_batch_shares_timestamp_and_defaults() {
        let rows = LedgerRow::batch(&[15.0, 22.5], None, Some("  "), sample_time());
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.date, "07/03/2026 09:05:03");
            assert_eq!(row.kind, KIND_SALE);
            assert_eq!(row.payment, DEFAULT_PAYMENT);
            assert_eq!(row.status, STATUS_PENDING);
            assert!(Uuid::parse_str(&row.id).is_ok());
        }
        assert_ne!(rows[0].id, rows[1].id);
        assert_eq!(rows[1].amount, Amount::Number(22.5));
    }

    #[test]
    fn test_apply_patch_only_touches_listed_fields() {
        let mut row = LedgerRow::batch(&[10.0], Some(KIND_EXPENSE), Some("Pix"), sample_time())
            .remove(0);
        let before = row.clone();

        row.apply(&RowPatch::paid());
        assert_eq!(row.status, STATUS_PAID);
        assert_eq!(row.amount, before.amount);
        assert_eq!(row.kind, before.kind);
        assert_eq!(row.id, before.id);

        row.apply(&RowPatch::value(12.5));
        assert_eq!(row.amount, Amount::Number(12.5));
        assert_eq!(row.status, STATUS_PAID);
    }

    #[test]
    fn test_row_json_uses_column_names() {
        let row = LedgerRow::batch(&[3.0], Some(KIND_OTHER), Some("Crédito (Visa)"), sample_time())
            .remove(0);
        let json = serde_json::to_value(&row).unwrap();
        for column in COLUMNS {
            assert!(json.get(column).is_some(), "missing {column}");
        }
        assert_eq!(json["Valor"], serde_json::json!(3.0));

        let text: LedgerRow = serde_json::from_value(serde_json::json!({
            "Data": "01/01/2026 10:00:00",
            "Valor": "12,00",
            "Tipo": "Venda",
            "Pagamento": "Pix",
            "Status": "Pago",
            "ID_Único": "x"
        }))
        .unwrap();
        assert_eq!(text.amount, Amount::Text("12,00".into()));
    }

    #[test]
    fn test_patch_rejects_immutable_fields() {
        let ok: RowPatch = serde_json::from_str(r#"{"Status":"Pago"}"#).unwrap();
        assert_eq!(ok, RowPatch::paid());
        assert!(serde_json::from_str::<RowPatch>(r#"{"Tipo":"Gasto"}"#).is_err());
    }

    #[test]
    fn test_cells_round_trip_through_column_map() {
        let row = LedgerRow::batch(&[7.25], None, Some("Débito"), sample_time()).remove(0);
        let cells = row.to_cells();
        let identity = [Some(0), Some(1), Some(2), Some(3), Some(4), Some(5)];
        assert_eq!(LedgerRow::from_cells(&identity, &cells), row);
    }

    #[test]
    fn test_from_cells_tolerates_missing_columns() {
        let columns = [Some(1), Some(0), None, None, None, Some(2)];
        let cells = vec![Cell::Text("9,90".into()), Cell::Text("hoje".into())];
        let row = LedgerRow::from_cells(&columns, &cells);
        assert_eq!(row.date, "hoje");
        assert_eq!(row.amount, Amount::Text("9,90".into()));
        assert_eq!(row.kind, "");
        assert_eq!(row.id, "");
    }
}
