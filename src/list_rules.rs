use crate::models::JokeItem;

/// Number of jokes kept in the rolling list.
pub const ROLLING_LIST_CAPACITY: usize = 10;

/// Appends `new_item` and, if that pushes the list past `capacity`, drops the
/// single entry with the smallest `fetched_at`.
///
/// Ties go to the lowest index. Entries without a `fetched_at` sort after
/// every timestamped entry, so they are only evicted when nothing else
/// can be. The input slice is never modified.
pub fn insert_bounded(current: &[JokeItem], new_item: JokeItem, capacity: usize) -> Vec<JokeItem> {
    if capacity == 0 {
        return Vec::new();
    }

    let mut combined = Vec::with_capacity(current.len() + 1);
    combined.extend_from_slice(current);
    combined.push(new_item);

    if combined.len() <= capacity {
        return combined;
    }

    if let Some(index) = oldest_index(&combined) {
        combined.remove(index);
    }
    combined
}

fn oldest_index(items: &[JokeItem]) -> Option<usize> {
    // min_by_key keeps the first of several equal minima
    items
        .iter()
        .enumerate()
        .min_by_key(|(_, item)| match item.fetched_at {
            Some(ts) => (false, ts),
            None => (true, 0),
        })
        .map(|(index, _)| index)
}
