use std::sync::Arc;

use dashmap::mapref::entry::Entry as MapEntry;
use tokio::sync::RwLock;
use tracing::info;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::{Engine, EngineError, check_len, check_required};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub id: Ulid,
    pub number: String,
    pub room_type: RoomType,
    pub nightly_rate: Money,
    pub capacity: u32,
    pub description: Option<String>,
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomPatch {
    pub number: Option<String>,
    pub room_type: Option<RoomType>,
    pub nightly_rate: Option<Money>,
    pub capacity: Option<u32>,
    pub description: Option<Option<String>>,
    pub amenities: Option<Vec<String>>,
}

fn validate_room_fields(
    number: &str,
    capacity: u32,
    description: Option<&str>,
    amenities: &[String],
) -> Result<(), EngineError> {
    check_required(number, MAX_NAME_LEN, "room number is empty", "room number too long")?;
    if capacity == 0 {
        return Err(EngineError::Invalid("capacity must be positive"));
    }
    check_len(description, MAX_TEXT_LEN, "description too long")?;
    if amenities.len() > MAX_AMENITIES {
        return Err(EngineError::LimitExceeded("too many amenities"));
    }
    if amenities.iter().any(|a| a.len() > MAX_NAME_LEN) {
        return Err(EngineError::LimitExceeded("amenity too long"));
    }
    Ok(())
}

impl Engine {
    pub async fn create_room(&self, new: NewRoom) -> Result<Room, EngineError> {
        validate_room_fields(
            &new.number,
            new.capacity,
            new.description.as_deref(),
            &new.amenities,
        )?;
        let _gate = self.gate.read().await;
        if self.rooms.len() >= MAX_ROOMS {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }
        if self.rooms.contains_key(&new.id) {
            return Err(EngineError::AlreadyExists(new.id.to_string()));
        }
        match self.room_numbers.entry(new.number.clone()) {
            MapEntry::Occupied(_) => {
                return Err(EngineError::AlreadyExists(format!("room number {}", new.number)));
            }
            MapEntry::Vacant(v) => {
                v.insert(new.id);
            }
        }

        let room = Room {
            id: new.id,
            number: new.number,
            room_type: new.room_type,
            nightly_rate: new.nightly_rate,
            capacity: new.capacity,
            status: OccupancyStatus::Available,
            manual_maintenance: false,
            description: new.description,
            amenities: new.amenities,
            created_at: now_ms(),
        };
        let event = Event::RoomCreated { room: room.clone() };
        if let Err(e) = self.wal_append(std::slice::from_ref(&event)).await {
            self.room_numbers.remove(&room.number);
            return Err(e);
        }
        self.rooms
            .insert(room.id, Arc::new(RwLock::new(RoomState::new(room.clone()))));
        self.notify.send(room.id, &event);
        info!("room {} created ({})", room.number, room.room_type);
        Ok(room)
    }

    /// Edit descriptive fields. Status is never set here; existing bookings
    /// keep the rate they were priced at.
    pub async fn update_room(&self, id: Ulid, patch: RoomPatch) -> Result<Room, EngineError> {
        let mut txn = self.lock_room(id).await?;
        let room = &txn.state.room;
        let number = patch.number.unwrap_or_else(|| room.number.clone());
        let room_type = patch.room_type.unwrap_or_else(|| room.room_type.clone());
        let nightly_rate = patch.nightly_rate.unwrap_or(room.nightly_rate);
        let capacity = patch.capacity.unwrap_or(room.capacity);
        let description = patch.description.unwrap_or_else(|| room.description.clone());
        let amenities = patch.amenities.unwrap_or_else(|| room.amenities.clone());
        validate_room_fields(&number, capacity, description.as_deref(), &amenities)?;

        let old_number = room.number.clone();
        let renumbered = number != old_number;
        if renumbered {
            match self.room_numbers.entry(number.clone()) {
                MapEntry::Occupied(_) => {
                    return Err(EngineError::AlreadyExists(format!("room number {number}")));
                }
                MapEntry::Vacant(v) => {
                    v.insert(id);
                }
            }
        }

        let event = Event::RoomUpdated {
            id,
            number: number.clone(),
            room_type,
            nightly_rate,
            capacity,
            description,
            amenities,
        };
        if let Err(e) = self.commit(&mut txn, vec![event]).await {
            if renumbered {
                self.room_numbers.remove(&number);
            }
            return Err(e);
        }
        if renumbered {
            self.room_numbers.remove(&old_number);
        }
        Ok(txn.state.room.clone())
    }

    /// Delete a room that no booking or task refers to.
    pub async fn delete_room(&self, id: Ulid) -> Result<(), EngineError> {
        let txn = self.lock_room(id).await?;
        if !txn.state.bookings.is_empty() || !txn.state.tasks.is_empty() {
            return Err(EngineError::InUse { entity: "room", id });
        }
        let event = Event::RoomDeleted { id };
        self.wal_append(std::slice::from_ref(&event)).await?;

        self.rooms.remove(&id);
        self.room_numbers.remove(&txn.state.room.number);
        self.notify.send(id, &event);
        self.notify.remove(&id);
        info!("room {} deleted", txn.state.room.number);
        Ok(())
    }

    /// Turn the manual maintenance override on or off. Turning it off hands
    /// the room back to its bookings and open maintenance tasks.
    pub async fn set_maintenance(&self, room_id: Ulid, on: bool) -> Result<Room, EngineError> {
        let mut txn = self.lock_room(room_id).await?;
        let events = if txn.state.room.manual_maintenance == on {
            vec![]
        } else {
            vec![Event::MaintenanceSet { room_id, on }]
        };
        self.commit(&mut txn, events).await?;
        info!(
            "room {} maintenance override {}",
            txn.state.room.number,
            if on { "on" } else { "off" }
        );
        Ok(txn.state.room.clone())
    }

    /// Recompute the room's status from its bookings and maintenance and
    /// write it if it drifted.
    pub async fn reconcile_room(&self, room_id: Ulid) -> Result<Room, EngineError> {
        let mut txn = self.lock_room(room_id).await?;
        self.commit(&mut txn, vec![]).await?;
        Ok(txn.state.room.clone())
    }
}
