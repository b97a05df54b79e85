//! Pagination over a filtered step sequence.

use reportgen_proto::Step;
use serde::Serialize;

use super::error::ValidationError;
use super::filter::StepQuery;

/// One page of matching steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepPage<'a> {
    pub steps: Vec<&'a Step>,
    pub page_index: usize,
    pub page_count: usize,
    /// Matching steps across all pages.
    pub total_matches: usize,
}

/// Number of pages needed for `len` matches. A page size of 0 counts as 1.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// Returns page `page_index` (0-based) of the steps matching `query`.
///
/// Out-of-range pages are rejected rather than clamped. When nothing matches
/// there are no pages and every index is out of range.
pub fn query_page<'a>(
    steps: &'a [Step],
    query: &StepQuery,
    page_index: usize,
    page_size: usize,
) -> Result<StepPage<'a>, ValidationError> {
    let page_size = page_size.max(1);
    let matches: Vec<&Step> = steps.iter().filter(|step| query.matches(step)).collect();
    let total_matches = matches.len();
    let page_count = page_count(total_matches, page_size);
    if page_index >= page_count {
        return Err(ValidationError::PageOutOfRange {
            page: page_index,
            page_count,
        });
    }

    let steps = matches
        .into_iter()
        .skip(page_index * page_size)
        .take(page_size)
        .collect();
    Ok(StepPage {
        steps,
        page_index,
        page_count,
        total_matches,
    })
}
