//! Page walking and final window trimming.

use tracing::debug;

use crate::{
    bucket::bar_end_time_tz,
    history::{MAX_PAGES, PAGE_SIZE, builder::build_bars},
    mapping::Frequency,
    models::{bar::NormalizedBar, request::HistoryRequest},
    providers::{BarQuery, ProviderError, QuoteSession},
};

/// One page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSpec {
    pub offset: u32,
    pub count: u32,
}

/// The pages to request from a located offset, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PagePlan {
    pages: Vec<PageSpec>,
}

impl PagePlan {
    /// Split `budget` rows into pages of at most [`PAGE_SIZE`] starting at
    /// `offset`, each one further back than the last.
    pub fn new(offset: u32, budget: u32) -> Self {
        let mut pages = Vec::new();
        let mut remaining = budget;
        let mut at = offset;
        while remaining > 0 {
            let count = remaining.min(PAGE_SIZE);
            pages.push(PageSpec { offset: at, count });
            remaining -= count;
            at = at.saturating_add(count);
        }
        Self { pages }
    }

    /// The row budget shrinks with the located offset so the walk never
    /// reaches further back than [`MAX_PAGES`] pages from now.
    pub fn from_offset(offset: u32) -> Self {
        let budget = MAX_PAGES.saturating_sub(offset / PAGE_SIZE) * PAGE_SIZE;
        Self::new(offset, budget)
    }

    pub fn pages(&self) -> &[PageSpec] {
        &self.pages
    }

    pub fn budget(&self) -> u32 {
        self.pages.iter().map(|p| p.count).sum()
    }
}

/// Pages collected newest first, released oldest first.
#[derive(Debug, Default)]
pub struct BarSequence {
    pages: Vec<Vec<NormalizedBar>>,
}

impl BarSequence {
    /// Record a page that is older than every page recorded so far.
    pub fn push_older(&mut self, page: Vec<NormalizedBar>) {
        self.pages.push(page);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All bars, oldest page first, each page in its own order.
    pub fn into_bars(self) -> Vec<NormalizedBar> {
        self.pages.into_iter().rev().flatten().collect()
    }
}

/// Request the plan's pages until history or the requested window runs out.
pub async fn walk_pages<S>(
    session: &mut S,
    query: &BarQuery,
    request: &HistoryRequest,
    frequency: &Frequency,
    plan: &PagePlan,
) -> Result<BarSequence, ProviderError>
where
    S: QuoteSession + ?Sized,
{
    let start = request.start_bound().naive_local();
    let mut sequence = BarSequence::default();

    for page in plan.pages() {
        let rows = session
            .get_security_bars(query, page.offset, page.count)
            .await?;
        let exhausted = rows.len() < page.count as usize;
        let past_start = rows
            .first()
            .and_then(|row| row.timestamp())
            .is_some_and(|oldest| oldest < start);

        sequence.push_older(build_bars(&rows, request, frequency));

        if exhausted || past_start {
            debug!(
                offset = page.offset,
                rows = rows.len(),
                exhausted,
                past_start,
                "page walk finished early"
            );
            break;
        }
    }
    Ok(sequence)
}

/// Order by time, cut to the request window and re-stamp the newest
/// intraday bar to its bucket end.
pub fn finalize(
    mut bars: Vec<NormalizedBar>,
    request: &HistoryRequest,
    frequency: &Frequency,
) -> Vec<NormalizedBar> {
    let start = request.start_bound();
    let end = request.end_bound();

    bars.sort_by_key(|bar| bar.datetime);
    bars.retain(|bar| bar.datetime >= start);
    if let (Some(width), Some(last)) = (frequency.bucket_minutes, bars.last_mut()) {
        last.datetime = bar_end_time_tz(last.datetime, width);
    }
    bars.retain(|bar| bar.datetime <= end);
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_from_top_uses_the_full_budget() {
        let plan = PagePlan::from_offset(0);
        assert_eq!(plan.pages().len(), MAX_PAGES as usize);
        assert_eq!(plan.budget(), MAX_PAGES * PAGE_SIZE);
        assert_eq!(plan.pages()[1], PageSpec { offset: 800, count: 800 });
    }

    #[test]
    fn plan_shrinks_with_located_offset() {
        let plan = PagePlan::from_offset(2 * PAGE_SIZE + 150);
        assert_eq!(plan.budget(), (MAX_PAGES - 2) * PAGE_SIZE);
        assert_eq!(plan.pages()[0].offset, 1750);
        assert_eq!(plan.pages()[1].offset, 2550);

        assert!(PagePlan::from_offset(MAX_PAGES * PAGE_SIZE + 5).pages().is_empty());
    }

    #[test]
    fn plan_ends_with_partial_page() {
        let plan = PagePlan::new(100, 2000);
        assert_eq!(
            plan.pages(),
            &[
                PageSpec { offset: 100, count: 800 },
                PageSpec { offset: 900, count: 800 },
                PageSpec { offset: 1700, count: 400 },
            ]
        );
    }
}
