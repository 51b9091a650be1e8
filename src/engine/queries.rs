use std::cmp::Reverse;

use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::*;

use super::{Engine, EngineError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomFilter {
    pub status: Option<OccupancyStatus>,
    pub room_type: Option<RoomType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub room_id: Option<Ulid>,
}

impl Engine {
    pub async fn room(&self, id: Ulid) -> Result<Room, EngineError> {
        let rs = self.room_state(&id).ok_or(EngineError::NotFound(id))?;
        let guard = rs.read().await;
        Ok(guard.room.clone())
    }

    /// Rooms matching the filter, ordered by room number.
    pub async fn list_rooms(&self, filter: &RoomFilter) -> Vec<Room> {
        let mut rooms = Vec::new();
        for rs in self.snapshot_rooms() {
            let guard = rs.read().await;
            let room = &guard.room;
            if filter.status.is_some_and(|s| s != room.status) {
                continue;
            }
            if filter.room_type.as_ref().is_some_and(|t| *t != room.room_type) {
                continue;
            }
            rooms.push(room.clone());
        }
        rooms.sort_by(|a, b| a.number.cmp(&b.number));
        rooms
    }

    pub async fn booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        let room_id = self.room_for_entity(&id).ok_or(EngineError::NotFound(id))?;
        let rs = self.room_state(&room_id).ok_or(EngineError::NotFound(id))?;
        let guard = rs.read().await;
        guard.booking(id).cloned().ok_or(EngineError::NotFound(id))
    }

    /// A booking joined with its guest and room.
    pub async fn booking_view(&self, id: Ulid) -> Result<BookingView, EngineError> {
        let room_id = self.room_for_entity(&id).ok_or(EngineError::NotFound(id))?;
        let rs = self.room_state(&room_id).ok_or(EngineError::NotFound(id))?;
        let guard = rs.read().await;
        let booking = guard.booking(id).ok_or(EngineError::NotFound(id))?;
        Ok(self.view(&guard.room, booking))
    }

    /// Confirmed bookings of one room.
    pub async fn active_bookings(&self, room_id: Ulid) -> Result<Vec<Booking>, EngineError> {
        let rs = self.room_state(&room_id).ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        Ok(guard.confirmed_bookings().cloned().collect())
    }

    /// Booking views, newest first.
    pub async fn list_bookings(&self, status: Option<BookingStatus>) -> Vec<BookingView> {
        let mut views = Vec::new();
        for rs in self.snapshot_rooms() {
            let guard = rs.read().await;
            views.extend(
                guard
                    .bookings
                    .iter()
                    .filter(|b| status.is_none_or(|s| s == b.status))
                    .map(|b| self.view(&guard.room, b)),
            );
        }
        views.sort_by_key(|v| Reverse((v.booking.created_at, v.booking.id)));
        views
    }

    pub async fn recent_bookings(&self, limit: usize) -> Vec<BookingView> {
        let mut views = self.list_bookings(None).await;
        views.truncate(limit);
        views
    }

    pub fn guest(&self, id: Ulid) -> Result<Guest, EngineError> {
        self.guests
            .get(&id)
            .filter(|e| !e.retired)
            .map(|e| e.record.clone())
            .ok_or(EngineError::NotFound(id))
    }

    /// Guests, newest first.
    pub fn list_guests(&self) -> Vec<Guest> {
        let mut guests: Vec<Guest> = self
            .guests
            .iter()
            .filter(|e| !e.retired)
            .map(|e| e.record.clone())
            .collect();
        guests.sort_by_key(|g| Reverse((g.created_at, g.id)));
        guests
    }

    pub fn staff_member(&self, id: Ulid) -> Result<Staff, EngineError> {
        self.staff
            .get(&id)
            .filter(|e| !e.retired)
            .map(|e| e.record.clone())
            .ok_or(EngineError::NotFound(id))
    }

    /// Staff ordered by username.
    pub fn list_staff(&self) -> Vec<Staff> {
        let mut staff: Vec<Staff> = self
            .staff
            .iter()
            .filter(|e| !e.retired)
            .map(|e| e.record.clone())
            .collect();
        staff.sort_by(|a, b| a.username.cmp(&b.username));
        staff
    }

    pub async fn task(&self, id: Ulid) -> Result<HousekeepingTask, EngineError> {
        let room_id = self.room_for_entity(&id).ok_or(EngineError::NotFound(id))?;
        let rs = self.room_state(&room_id).ok_or(EngineError::NotFound(id))?;
        let guard = rs.read().await;
        guard.task(id).cloned().ok_or(EngineError::NotFound(id))
    }

    /// Tasks matching the filter, by scheduled date.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> Vec<HousekeepingTask> {
        let rooms = match filter.room_id {
            Some(rid) => self.room_state(&rid).into_iter().collect(),
            None => self.snapshot_rooms(),
        };
        let mut tasks = Vec::new();
        for rs in rooms {
            let guard = rs.read().await;
            tasks.extend(
                guard
                    .tasks
                    .iter()
                    .filter(|t| filter.status.is_none_or(|s| s == t.status))
                    .cloned(),
            );
        }
        tasks.sort_by_key(|t| (t.scheduled_date, t.id));
        tasks
    }

    /// Front-desk dashboard counters. Revenue counts confirmed and completed
    /// bookings; `today` decides the arrival and departure counts.
    pub async fn stats(&self, today: NaiveDate) -> DashboardStats {
        let mut stats = DashboardStats {
            total_guests: self.guests.iter().filter(|e| !e.retired).count(),
            ..DashboardStats::default()
        };
        for rs in self.snapshot_rooms() {
            let guard = rs.read().await;
            stats.total_rooms += 1;
            match guard.room.status {
                OccupancyStatus::Available => stats.available_rooms += 1,
                OccupancyStatus::Occupied => stats.occupied_rooms += 1,
                OccupancyStatus::Maintenance => stats.maintenance_rooms += 1,
            }
            for b in &guard.bookings {
                match b.status {
                    BookingStatus::Confirmed => stats.active_bookings += 1,
                    BookingStatus::Completed => stats.completed_bookings += 1,
                    BookingStatus::Cancelled => continue,
                }
                stats.total_revenue = stats.total_revenue.saturating_add(b.total_amount);
                if b.status == BookingStatus::Confirmed {
                    if b.stay.check_in == today {
                        stats.today_check_ins += 1;
                    }
                    if b.stay.check_out == today {
                        stats.today_check_outs += 1;
                    }
                }
            }
        }
        stats
    }

    fn snapshot_rooms(&self) -> Vec<super::SharedRoomState> {
        self.rooms.iter().map(|e| e.value().clone()).collect()
    }

    fn view(&self, room: &Room, booking: &Booking) -> BookingView {
        let guest = self.guests.get(&booking.guest_id);
        BookingView {
            booking: booking.clone(),
            guest_name: guest.as_ref().map(|g| g.record.full_name()).unwrap_or_default(),
            guest_email: guest.as_ref().map(|g| g.record.email.clone()).unwrap_or_default(),
            guest_phone: guest.as_ref().map(|g| g.record.phone.clone()).unwrap_or_default(),
            room_number: room.number.clone(),
            room_type: room.room_type.clone(),
        }
    }
}
