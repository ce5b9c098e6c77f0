//! Bar-window reconciliation.
//!
//! The quote service only serves pages of up to [`PAGE_SIZE`] bars counted
//! backward from the newest bar. Turning a date range into bars takes three
//! steps, all on one session:
//!
//! 1. [`locator::locate_offset`] probes page by page for the offset of the
//!    newest bar at or before the end of the requested end date;
//! 2. [`walker::walk_pages`] requests pages from that offset backward,
//!    normalizing rows with [`builder`] as they arrive, until the history or
//!    the requested start is passed;
//! 3. [`walker::finalize`] cuts the result to the exact window and re-stamps
//!    the newest intraday bar.
//!
//! Offsets drift when new bars print between requests, so the final date
//! filter is what guarantees the window, not the page arithmetic.

pub mod builder;
pub mod locator;
pub mod walker;

use tracing::debug;

use crate::{
    mapping::Frequency,
    models::{bar::NormalizedBar, request::HistoryRequest},
    providers::{BarQuery, ProviderError, QuoteSession},
};

use self::walker::PagePlan;

/// Rows per vendor page.
pub const PAGE_SIZE: u32 = 800;
/// Upper bound on pages probed while locating the end offset.
pub const MAX_PROBES: u32 = 31;
/// Pages a walk may reach back from the newest bar.
pub const MAX_PAGES: u32 = 30;

/// Fetch the bars of `request`, oldest first. Empty when the vendor has
/// nothing inside the window.
pub async fn fetch_history<S>(
    session: &mut S,
    query: &BarQuery,
    request: &HistoryRequest,
    frequency: &Frequency,
) -> Result<Vec<NormalizedBar>, ProviderError>
where
    S: QuoteSession + ?Sized,
{
    let target = request.end_bound().naive_local();
    let Some(offset) = locator::locate_offset(session, query, target).await? else {
        debug!(vt_symbol = %request.vt_symbol(), "end offset not found");
        return Ok(Vec::new());
    };

    let plan = PagePlan::from_offset(offset);
    if plan.pages().is_empty() {
        debug!(
            vt_symbol = %request.vt_symbol(),
            offset,
            max_pages = MAX_PAGES,
            "end offset lies beyond the page budget, nothing to walk"
        );
        return Ok(Vec::new());
    }
    let sequence = walker::walk_pages(session, query, request, frequency, &plan).await?;
    debug!(
        vt_symbol = %request.vt_symbol(),
        offset,
        planned = plan.pages().len(),
        fetched = sequence.page_count(),
        "page walk complete"
    );
    Ok(walker::finalize(sequence.into_bars(), request, frequency))
}
