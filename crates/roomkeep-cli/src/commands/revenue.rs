//! Revenue report command

use anyhow::{Context, Result};
use chrono::NaiveDate;

use roomkeep_core::{DateRange, Store};

use crate::output::Output;

pub async fn show(
    store: &Store,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    output: &Output,
) -> Result<()> {
    let range = match (from, to) {
        (None, None) => None,
        (from, to) => Some(open_ended(from, to)?),
    };

    let report = store.get_revenue(range).await?;
    output.print_revenue(&report)
}

/// Fill a missing bound with the widest four-digit year
///
/// Dates are compared as ISO text, so the bounds must stay in 0001..=9999.
fn open_ended(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<DateRange> {
    let from = match from {
        Some(date) => date,
        None => NaiveDate::from_ymd_opt(1, 1, 1).context("invalid lower bound")?,
    };
    let to = match to {
        Some(date) => date,
        None => NaiveDate::from_ymd_opt(9999, 12, 31).context("invalid upper bound")?,
    };
    Ok(DateRange::new(from, to)?)
}
