use serde::Serialize;

use crate::store::Store;

/// Figures shown on the admin dashboard tiles.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub total_reciters: i64,
    pub total_favorites: i64,
    pub recent_reciters: i64,
    pub most_favorited: Option<String>,
    pub pending_requests: i64,
}

impl DashboardStats {
    pub fn gather(store: &dyn Store) -> Self {
        let most_favorited = store
            .favorite_tallies()
            .into_iter()
            .next()
            .map(|t| t.reciter.name);

        DashboardStats {
            total_reciters: store.reader_count(),
            total_favorites: store.favorite_count(),
            recent_reciters: store.reader_count_since_days(30),
            most_favorited,
            pending_requests: store.request_count(),
        }
    }
}
