use tokio::sync::oneshot;
use tracing::info;

use crate::model::*;

use super::{Engine, EngineError, WalCommand};

impl Engine {
    /// Compact the WAL by rewriting it as one commit that recreates the
    /// current state: directory first, then each room with its bookings
    /// and tasks.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        // Exclusive: no write may land between the snapshot and the swap.
        let _gate = self.gate.write().await;
        let mut events = Vec::new();

        for entry in self.guests.iter() {
            events.push(Event::GuestCreated {
                guest: entry.record.clone(),
            });
        }
        for entry in self.staff.iter() {
            events.push(Event::StaffCreated {
                staff: entry.record.clone(),
            });
        }

        let rooms: Vec<_> = self.rooms.iter().map(|e| e.value().clone()).collect();
        for rs in rooms {
            let guard = rs.read().await;
            events.push(Event::RoomCreated {
                room: guard.room.clone(),
            });
            events.extend(guard.bookings.iter().map(|b| Event::BookingCreated {
                booking: b.clone(),
            }));
            events.extend(guard.tasks.iter().map(|t| Event::TaskCreated { task: t.clone() }));
        }

        let count = events.len();
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))?;
        info!("WAL compacted to {count} events");
        Ok(())
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
