use std::collections::HashSet;

use serde::Serialize;

use crate::models::reciter::Reciter;

/// A reciter with the number of users who favorited it.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteTally {
    pub reciter: Reciter,
    pub count: i64,
}

/// Orders reciters by favorite count (highest first, ties by lowest id) and
/// keeps the first `limit` with at least one favorite. When that leaves
/// fewer than `limit`, the list is topped up from `latest` in order,
/// skipping reciters already present. Backfilled entries carry their own
/// count (usually zero).
pub fn top_reciters(
    mut tallies: Vec<FavoriteTally>,
    latest: Vec<Reciter>,
    limit: usize,
) -> Vec<FavoriteTally> {
    tallies.retain(|t| t.count > 0);
    tallies.sort_by(|a, b| b.count.cmp(&a.count).then(a.reciter.id.cmp(&b.reciter.id)));
    tallies.truncate(limit);

    if tallies.len() < limit {
        let mut seen: HashSet<i64> = tallies.iter().map(|t| t.reciter.id).collect();
        for reciter in latest {
            if tallies.len() >= limit {
                break;
            }
            if seen.insert(reciter.id) {
                tallies.push(FavoriteTally { reciter, count: 0 });
            }
        }
    }

    tallies
}
