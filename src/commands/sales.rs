use anyhow::bail;
use chrono::Local;
use tracing::info;

use crate::ledger::LedgerStore;
use crate::report::{monthly_report, parse_month_key, summarize};
use crate::rows::{normalize_amount, parse_amount_list, LedgerRow, RowPatch};
use crate::settings::StoreSettings;

use super::print_json;

fn store(settings: &StoreSettings) -> LedgerStore {
    LedgerStore::new(settings.paths())
}

pub(super) fn add(
    settings: &StoreSettings,
    establishment: &str,
    amounts: &str,
    kind: Option<&str>,
    payment: Option<&str>,
) -> anyhow::Result<()> {
    let values = parse_amount_list(amounts);
    if values.is_empty() {
        bail!("no valid amount in {amounts:?}");
    }

    let rows = LedgerRow::batch(&values, kind, payment, Local::now().naive_local());
    let path = store(settings).append(establishment, &rows)?;
    info!(establishment = %establishment, count = rows.len(), path = %path.display(), "rows recorded");
    print_json(&rows)
}

pub(super) fn list(
    settings: &StoreSettings,
    establishment: &str,
    month: Option<&str>,
) -> anyhow::Result<()> {
    let month = month.map(parse_month_key).transpose()?;
    let report = monthly_report(&store(settings), establishment, month)?;
    print_json(&report)
}

pub(super) fn summary(
    settings: &StoreSettings,
    establishment: &str,
    month: Option<&str>,
) -> anyhow::Result<()> {
    let month = month.map(parse_month_key).transpose()?;
    let report = monthly_report(&store(settings), establishment, month)?;
    print_json(&summarize(&report))
}

pub(super) fn set_paid(
    settings: &StoreSettings,
    establishment: &str,
    ids: &[String],
    paid: bool,
) -> anyhow::Result<()> {
    let patch = if paid {
        RowPatch::paid()
    } else {
        RowPatch::pending()
    };
    store(settings).patch_many(establishment, ids, &patch)?;
    print_json(&serde_json::json!({ "success": true, "updated": ids.len() }))
}

pub(super) fn set_value(
    settings: &StoreSettings,
    establishment: &str,
    id: &str,
    value: &str,
) -> anyhow::Result<()> {
    let amount = normalize_amount(value);
    store(settings).patch(establishment, id, &RowPatch::value(amount))?;
    print_json(&serde_json::json!({ "success": true, "id": id, "Valor": amount }))
}

pub(super) fn delete(settings: &StoreSettings, establishment: &str, id: &str) -> anyhow::Result<()> {
    store(settings).delete(establishment, id)?;
    print_json(&serde_json::json!({ "success": true, "id": id }))
}
