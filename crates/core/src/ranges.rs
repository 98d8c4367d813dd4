//! Block range chunking for log catch-up queries.

/// Split the inclusive range `[from, to]` into chunks of at most `size`
/// blocks, covering every block exactly once.
///
/// Yields nothing when `from > to`.
pub fn block_chunks(from: u64, to: u64, size: u64) -> impl Iterator<Item = (u64, u64)> {
    assert!(size > 0, "chunk size must be positive");
    let mut next = Some(from);
    std::iter::from_fn(move || {
        let start = next?;
        if start > to {
            return None;
        }
        let end = to.min(start.saturating_add(size - 1));
        next = end.checked_add(1);
        Some((start, end))
    })
}
