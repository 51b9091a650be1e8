use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{info, warn};
use ulid::Ulid;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Per-room change feed. Every committed room event is published to the
/// room's channel and to the hotel-wide feed.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<Event>>,
    all_rooms: broadcast::Sender<Event>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            all_rooms: broadcast::channel(CHANNEL_CAPACITY * 4).0,
        }
    }

    /// Subscribe to a room's events. Creates the channel if needed.
    pub fn subscribe(&self, room_id: Ulid) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Events of every room, in commit order per room.
    pub fn subscribe_all(&self) -> broadcast::Receiver<Event> {
        self.all_rooms.subscribe()
    }

    /// Publish a committed event. No-op for feeds nobody listens to.
    pub fn send(&self, room_id: Ulid, event: &Event) {
        if let Some(sender) = self.channels.get(&room_id) {
            let _ = sender.send(event.clone());
        }
        if self.all_rooms.receiver_count() > 0 {
            let _ = self.all_rooms.send(event.clone());
        }
    }

    /// Drop a room's channel once the room is deleted.
    pub fn remove(&self, room_id: &Ulid) {
        self.channels.remove(room_id);
    }
}

/// Front-desk log: one line per room status change until the hub is dropped.
pub async fn log_status_changes(hub: Arc<NotifyHub>) {
    let mut rx = hub.subscribe_all();
    drop(hub);
    loop {
        match rx.recv().await {
            Ok(Event::RoomStatusSet { id, status }) => {
                info!(room = %id, status = status.as_str(), "room status changed");
            }
            Ok(Event::MaintenanceSet { room_id, on }) => {
                info!(room = %room_id, on, "manual maintenance toggled");
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("status log lagged, skipped {n} events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
