use rocket::tokio::sync::broadcast;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// One row-level change, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub table: &'static str,
    pub action: ChangeAction,
    pub id: i64,
}

impl ChangeEvent {
    pub fn new(table: &'static str, action: ChangeAction, id: i64) -> Self {
        ChangeEvent { table, action, id }
    }
}

/// In-process change feed. Route handlers publish after a successful write;
/// SSE streams subscribe and filter by table.
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        ChangeFeed { tx }
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        log::debug!("change: {} {:?} #{}", event.table, event.action, event.id);
        // No subscribers is not an error
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        ChangeFeed::new(64)
    }
}
