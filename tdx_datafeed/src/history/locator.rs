//! Finds the backward offset of the page that ends at a target time.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::{
    history::{MAX_PROBES, PAGE_SIZE},
    providers::{BarQuery, ProviderError, QuoteSession},
};

/// Probe pages `0, 800, 1600, ...` until one starts at or before `target`.
///
/// Returns the offset of the newest bar not after `target`, or `Some(0)` when
/// the matching page is under-full (the whole remaining history fits in one
/// walk from the top). `None` when the vendor has nothing, sends an
/// unreadable first row, or every probe starts after `target`.
///
/// Comparisons use the vendor's raw row labels.
pub async fn locate_offset<S>(
    session: &mut S,
    query: &BarQuery,
    target: NaiveDateTime,
) -> Result<Option<u32>, ProviderError>
where
    S: QuoteSession + ?Sized,
{
    for step in 0..MAX_PROBES {
        let offset = step * PAGE_SIZE;
        let mut rows = session.get_security_bars(query, offset, PAGE_SIZE).await?;
        if rows.len() > PAGE_SIZE as usize {
            // only the newest PAGE_SIZE rows belong to this offset
            warn!(offset, rows = rows.len(), "oversized probe page, keeping the newest rows");
            rows.drain(..rows.len() - PAGE_SIZE as usize);
        }

        let Some(first) = rows.first() else {
            debug!(offset, "probe page empty, history exhausted");
            return Ok(None);
        };
        let Some(oldest) = first.timestamp() else {
            warn!(offset, datetime = %first.datetime, "unreadable timestamp on probe page");
            return Ok(None);
        };
        if oldest > target {
            continue;
        }

        if rows.len() < PAGE_SIZE as usize {
            debug!(offset, rows = rows.len(), "under-full probe page, walking from the top");
            return Ok(Some(0));
        }
        let within = rows
            .iter()
            .filter(|row| row.timestamp().is_some_and(|ts| ts <= target))
            .count() as u32;
        let located = offset + PAGE_SIZE.saturating_sub(within);
        debug!(step, located, "located end offset");
        return Ok(Some(located));
    }

    warn!(probes = MAX_PROBES, %target, "end date lies beyond the probe budget");
    Ok(None)
}
