//! Room availability ledger: derives a room's occupancy status from its
//! bookings and maintenance override. Pure functions, no locking; callers
//! hold the room lock.

use crate::model::*;

/// Maintenance wins over bookings; any confirmed booking means occupied.
pub fn compute_status<'a>(
    maintenance_active: bool,
    bookings: impl IntoIterator<Item = &'a Booking>,
) -> OccupancyStatus {
    if maintenance_active {
        return OccupancyStatus::Maintenance;
    }
    if bookings
        .into_iter()
        .any(|b| b.status == BookingStatus::Confirmed)
    {
        OccupancyStatus::Occupied
    } else {
        OccupancyStatus::Available
    }
}

pub fn derived_status(rs: &RoomState) -> OccupancyStatus {
    compute_status(rs.maintenance_active(), &rs.bookings)
}

/// The status write needed to bring the materialized status in line with
/// the derived one, or `None` if they already agree.
pub fn reconcile(rs: &RoomState) -> Option<Event> {
    let status = derived_status(rs);
    (rs.room.status != status).then_some(Event::RoomStatusSet {
        id: rs.room.id,
        status,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use ulid::Ulid;

    use super::*;

    fn room_state() -> RoomState {
        RoomState::new(Room {
            id: Ulid::new(),
            number: "201".into(),
            room_type: RoomType::Double,
            nightly_rate: 120_000,
            capacity: 2,
            status: OccupancyStatus::Available,
            manual_maintenance: false,
            description: None,
            amenities: vec![],
            created_at: 0,
        })
    }

    fn booking(room_id: Ulid, status: BookingStatus) -> Booking {
        let d: NaiveDate = "2024-01-01".parse().unwrap();
        Booking {
            id: Ulid::new(),
            guest_id: Ulid::new(),
            room_id,
            stay: Stay::new(d, d.succ_opt().unwrap()),
            nightly_rate: 120_000,
            total_amount: 120_000,
            status,
            special_requests: None,
            created_at: 0,
        }
    }

    #[test]
    fn no_bookings_is_available() {
        assert_eq!(compute_status(false, &[]), OccupancyStatus::Available);
    }

    #[test]
    fn confirmed_booking_occupies() {
        let rid = Ulid::new();
        let bookings = [
            booking(rid, BookingStatus::Completed),
            booking(rid, BookingStatus::Confirmed),
        ];
        assert_eq!(compute_status(false, &bookings), OccupancyStatus::Occupied);
    }

    #[test]
    fn terminal_bookings_do_not_occupy() {
        let rid = Ulid::new();
        let bookings = [
            booking(rid, BookingStatus::Completed),
            booking(rid, BookingStatus::Cancelled),
        ];
        assert_eq!(compute_status(false, &bookings), OccupancyStatus::Available);
    }

    #[test]
    fn maintenance_takes_precedence() {
        let rid = Ulid::new();
        let bookings = [booking(rid, BookingStatus::Confirmed)];
        assert_eq!(compute_status(true, &bookings), OccupancyStatus::Maintenance);
        assert_eq!(compute_status(true, &[]), OccupancyStatus::Maintenance);
    }

    #[test]
    fn reconcile_only_when_out_of_line() {
        let mut rs = room_state();
        assert_eq!(reconcile(&rs), None);

        let b = booking(rs.id(), BookingStatus::Confirmed);
        rs.insert_booking(b);
        assert_eq!(
            reconcile(&rs),
            Some(Event::RoomStatusSet {
                id: rs.id(),
                status: OccupancyStatus::Occupied
            })
        );

        rs.room.status = OccupancyStatus::Occupied;
        assert_eq!(reconcile(&rs), None);
    }

    #[test]
    fn reconcile_restores_booking_status_after_override() {
        let mut rs = room_state();
        rs.insert_booking(booking(rs.id(), BookingStatus::Confirmed));
        rs.room.status = OccupancyStatus::Maintenance;
        rs.room.manual_maintenance = false;
        assert_eq!(
            reconcile(&rs),
            Some(Event::RoomStatusSet {
                id: rs.id(),
                status: OccupancyStatus::Occupied
            })
        );
    }
}
