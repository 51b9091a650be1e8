use chrono::NaiveDate;
use tracing::{debug, info};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::{Engine, EngineError, RoomTxn, check_len, ledger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub id: Ulid,
    pub guest_id: Ulid,
    pub room_id: Ulid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub special_requests: Option<String>,
}

/// Fields an update may touch. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingPatch {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    /// Explicit total; otherwise a date change reprices at the booking's rate.
    pub total_amount: Option<Money>,
    pub special_requests: Option<Option<String>>,
    pub status: Option<BookingStatus>,
}

/// Booking state machine. Confirmed may move to Completed or Cancelled;
/// terminal states never move. Re-setting the current status is allowed.
pub fn transition(from: BookingStatus, to: BookingStatus) -> Result<BookingStatus, EngineError> {
    use BookingStatus::*;
    match (from, to) {
        (a, b) if a == b => Ok(b),
        (Confirmed, Completed) | (Confirmed, Cancelled) => Ok(to),
        _ => Err(EngineError::InvalidTransition { from, to }),
    }
}

fn price(stay: &Stay, nightly_rate: Money) -> Result<Money, EngineError> {
    let nights = stay.nights();
    if nights <= 0 {
        return Err(EngineError::InvalidDateRange {
            check_in: stay.check_in,
            check_out: stay.check_out,
        });
    }
    if nights > MAX_STAY_NIGHTS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    (nights as Money)
        .checked_mul(nightly_rate)
        .ok_or(EngineError::LimitExceeded("booking total overflows"))
}

impl Engine {
    /// Book a room for a guest. The availability check and the insert happen
    /// under the room lock, so of two concurrent requests at most one wins.
    pub async fn create_booking(&self, req: NewBooking) -> Result<Booking, EngineError> {
        check_len(req.special_requests.as_deref(), MAX_TEXT_LEN, "special requests too long")?;
        let stay = Stay::new(req.check_in, req.check_out);
        if stay.nights() <= 0 {
            return Err(EngineError::InvalidDateRange {
                check_in: req.check_in,
                check_out: req.check_out,
            });
        }

        let mut txn = self.lock_room(req.room_id).await?;
        self.pin_guest(req.guest_id)?;
        let result = self.insert_booking(&mut txn, req.clone(), stay).await;
        if result.is_err() {
            self.unpin_guest(req.guest_id);
        }
        result
    }

    async fn insert_booking(
        &self,
        txn: &mut RoomTxn<'_>,
        req: NewBooking,
        stay: Stay,
    ) -> Result<Booking, EngineError> {
        if self.entity_to_room.contains_key(&req.id) {
            return Err(EngineError::AlreadyExists(req.id.to_string()));
        }
        if txn.state.bookings.len() >= MAX_BOOKINGS_PER_ROOM {
            return Err(EngineError::LimitExceeded("too many bookings on room"));
        }
        let status = ledger::derived_status(&txn.state);
        if status != OccupancyStatus::Available {
            debug!("room {} refused booking: {status}", txn.state.room.number);
            return Err(EngineError::RoomUnavailable(req.room_id));
        }

        let nightly_rate = txn.state.room.nightly_rate;
        let booking = Booking {
            id: req.id,
            guest_id: req.guest_id,
            room_id: req.room_id,
            stay,
            nightly_rate,
            total_amount: price(&stay, nightly_rate)?,
            status: BookingStatus::Confirmed,
            special_requests: req.special_requests,
            created_at: now_ms(),
        };
        self.commit(txn, vec![Event::BookingCreated {
            booking: booking.clone(),
        }])
        .await?;

        info!(
            "booking {} confirmed: room {} for {} nights, total {}",
            booking.id,
            txn.state.room.number,
            stay.nights(),
            booking.total_amount
        );
        metrics::counter!(crate::observability::BOOKING_TRANSITIONS_TOTAL, "to" => "confirmed")
            .increment(1);
        Ok(booking)
    }

    /// General edit: dates, amount, requests and status.
    pub async fn update_booking(&self, id: Ulid, patch: BookingPatch) -> Result<Booking, EngineError> {
        if let Some(Some(text)) = &patch.special_requests {
            check_len(Some(text), MAX_TEXT_LEN, "special requests too long")?;
        }
        let mut txn = self.resolve_entity(id).await?;
        let current = txn.state.booking(id).cloned().ok_or(EngineError::NotFound(id))?;

        let mut next = current.clone();
        if let Some(to) = patch.status {
            next.status = transition(current.status, to)?;
        }
        if patch.check_in.is_some() || patch.check_out.is_some() {
            let stay = Stay::new(
                patch.check_in.unwrap_or(current.stay.check_in),
                patch.check_out.unwrap_or(current.stay.check_out),
            );
            if stay != current.stay {
                next.total_amount = price(&stay, current.nightly_rate)?;
                next.stay = stay;
            }
        }
        if let Some(amount) = patch.total_amount {
            next.total_amount = amount;
        }
        if let Some(requests) = patch.special_requests {
            next.special_requests = requests;
        }
        if next == current {
            return Ok(current);
        }

        self.commit(&mut txn, vec![Event::BookingUpdated {
            booking: next.clone(),
        }])
        .await?;
        if next.status != current.status {
            info!("booking {id}: {} -> {}", current.status, next.status);
            metrics::counter!(
                crate::observability::BOOKING_TRANSITIONS_TOTAL,
                "to" => next.status.as_str()
            )
            .increment(1);
        }
        Ok(next)
    }

    /// Confirmed → Completed. The room frees up unless something else holds it.
    pub async fn checkout(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.finish_booking(id, BookingStatus::Completed).await
    }

    /// Confirmed → Cancelled.
    pub async fn cancel_booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.finish_booking(id, BookingStatus::Cancelled).await
    }

    async fn finish_booking(&self, id: Ulid, to: BookingStatus) -> Result<Booking, EngineError> {
        let mut txn = self.resolve_entity(id).await?;
        let current = txn.state.booking(id).cloned().ok_or(EngineError::NotFound(id))?;
        if current.status != BookingStatus::Confirmed {
            return Err(EngineError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        let next = Booking {
            status: to,
            ..current
        };
        self.commit(&mut txn, vec![Event::BookingUpdated {
            booking: next.clone(),
        }])
        .await?;

        info!("booking {id}: confirmed -> {to} (room {})", txn.state.room.number);
        metrics::counter!(crate::observability::BOOKING_TRANSITIONS_TOTAL, "to" => to.as_str())
            .increment(1);
        Ok(next)
    }

    /// Remove a booking outright; the room is re-derived afterwards.
    pub async fn delete_booking(&self, id: Ulid) -> Result<(), EngineError> {
        let mut txn = self.resolve_entity(id).await?;
        let current = txn.state.booking(id).cloned().ok_or(EngineError::NotFound(id))?;
        self.commit(&mut txn, vec![Event::BookingDeleted {
            id,
            room_id: current.room_id,
        }])
        .await?;
        self.unpin_guest(current.guest_id);
        info!("booking {id} deleted");
        Ok(())
    }
}
