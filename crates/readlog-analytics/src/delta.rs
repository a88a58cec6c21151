/// Pages read since the previous reading of the same book.
///
/// The first reading of a book has no previous position, so everything up to
/// `new_page` counts as read. Moving backwards (a correction) yields zero.
pub fn session_delta(previous_page: Option<u32>, new_page: u32) -> u32 {
    new_page.saturating_sub(previous_page.unwrap_or(0))
}

/// Applies [`session_delta`] across a series of page positions ordered by time.
pub fn session_deltas(pages: &[u32]) -> Vec<u32> {
    let mut previous = None;
    pages
        .iter()
        .map(|&page| {
            let delta = session_delta(previous, page);
            previous = Some(page);
            delta
        })
        .collect()
}
