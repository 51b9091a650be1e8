mod bookings;
mod compact;
mod directory;
mod error;
mod housekeeping;
pub mod ledger;
mod queries;
mod rooms;

pub use bookings::{BookingPatch, NewBooking, transition};
pub use directory::{GuestPatch, NewGuest, NewStaff, StaffPatch};
pub use error::EngineError;
pub use housekeeping::{NewTask, TaskPatch};
pub use queries::{RoomFilter, TaskFilter};
pub use rooms::{NewRoom, RoomPatch};

use std::io;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedRwLockWriteGuard, RwLock, RwLockReadGuard, mpsc, oneshot};
use tracing::{error, info};
use ulid::Ulid;

use crate::model::*;
use crate::notify::NotifyHub;
use crate::wal::Wal;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
    Shutdown {
        response: oneshot::Sender<io::Result<()>>,
    },
}

type Pending = (Vec<Event>, oneshot::Sender<io::Result<()>>);

/// Background task that owns the WAL and batches commits.
/// 1. Block until the first Append arrives.
/// 2. Drain all immediately available Appends (the batch window).
/// 3. Single flush_sync for the whole batch, then answer every sender.
///
/// With no WAL (ephemeral engine) every append is acknowledged as-is.
async fn wal_writer_loop(mut wal: Option<Wal>, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let flow = match cmd {
            WalCommand::Append { events, response } => {
                let mut batch = vec![(events, response)];
                let mut next = None;
                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { events, response }) => batch.push((events, response)),
                        Ok(other) => {
                            next = Some(other);
                            break;
                        }
                        Err(_) => break, // channel empty, flush batch
                    }
                }
                commit_batch(wal.as_mut(), &mut batch);
                match next {
                    Some(other) => handle_non_append(&mut wal, other),
                    None => ControlFlow::Continue(()),
                }
            }
            other => handle_non_append(&mut wal, other),
        };
        if flow.is_break() {
            break;
        }
    }
}

fn commit_batch(wal: Option<&mut Wal>, batch: &mut Vec<Pending>) {
    let Some(wal) = wal else {
        respond_batch(batch, &Ok(()));
        return;
    };
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());
    if let Err(e) = &result {
        error!("WAL flush failed for {} commits: {e}", batch.len());
    }
    respond_batch(batch, &result);
}

fn flush_batch(wal: &mut Wal, batch: &[Pending]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (events, _) in batch {
        if let Err(e) = wal.append_buffered(events) {
            append_err = Some(e);
            break;
        }
    }
    // Flush even on append error so partially buffered bytes
    // don't leak into the next batch.
    let flush_err = wal.flush_sync().err();
    match (append_err, flush_err) {
        (Some(e), _) | (None, Some(e)) => Err(e),
        (None, None) => Ok(()),
    }
}

fn respond_batch(batch: &mut Vec<Pending>, result: &io::Result<()>) {
    for (_, tx) in batch.drain(..) {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Option<Wal>, cmd: WalCommand) -> ControlFlow<()> {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = match wal.as_mut() {
                Some(wal) => Wal::write_compact_file(wal.path(), &events)
                    .and_then(|()| wal.swap_compact_file()),
                None => Ok(()),
            };
            let _ = response.send(result);
            ControlFlow::Continue(())
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.as_ref().map_or(0, Wal::appends_since_compact));
            ControlFlow::Continue(())
        }
        WalCommand::Shutdown { response } => {
            let result = wal.as_mut().map_or(Ok(()), Wal::flush_sync);
            let _ = response.send(result);
            ControlFlow::Break(())
        }
        WalCommand::Append { .. } => unreachable!("appends are batched by the writer loop"),
    }
}

/// Guest or staff record plus the number of bookings/tasks pointing at it.
pub(super) struct Entry<T> {
    pub record: T,
    pub refs: u32,
    /// Set while a delete is being committed; pins are refused.
    pub retired: bool,
}

impl<T> Entry<T> {
    fn new(record: T) -> Self {
        Self {
            record,
            refs: 0,
            retired: false,
        }
    }
}

/// An open room transaction: the compaction gate (shared) plus the room's
/// write lock. Every check and write of one operation happens under it.
pub(super) struct RoomTxn<'a> {
    _gate: RwLockReadGuard<'a, ()>,
    pub state: OwnedRwLockWriteGuard<RoomState>,
}

pub struct Engine {
    pub(super) rooms: DashMap<Ulid, SharedRoomState>,
    /// Room number → room id.
    pub(super) room_numbers: DashMap<String, Ulid>,
    pub(super) guests: DashMap<Ulid, Entry<Guest>>,
    /// Lowercased email → guest id.
    pub(super) guest_emails: DashMap<String, Ulid>,
    pub(super) staff: DashMap<Ulid, Entry<Staff>>,
    pub(super) staff_usernames: DashMap<String, Ulid>,
    pub(super) staff_emails: DashMap<String, Ulid>,
    /// Reverse lookup: booking/task id → room id.
    pub(super) entity_to_room: DashMap<Ulid, Ulid>,
    /// Serializes guest and staff writes; their uniqueness checks span several maps.
    pub(super) directory: Mutex<()>,
    /// Held shared by every write, exclusively by compaction.
    pub(super) gate: RwLock<()>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    pub notify: Arc<NotifyHub>,
}

impl Engine {
    /// Open a durable engine, replaying the WAL at `wal_path`.
    pub fn new(wal_path: PathBuf, notify: Arc<NotifyHub>) -> io::Result<Self> {
        let commits = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let engine = Self::with_writer(Some(wal), notify);

        // We are the sole owner of every room lock here, so try_read/try_write
        // always succeed. Never block: this may run inside an async context.
        for event in commits.iter().flatten() {
            engine.replay_event(event);
        }
        engine.rebuild_pins();

        info!(
            "replayed {} commits: {} rooms, {} guests, {} staff",
            commits.len(),
            engine.rooms.len(),
            engine.guests.len(),
            engine.staff.len()
        );
        Ok(engine)
    }

    /// An engine that keeps everything in memory and persists nothing.
    pub fn ephemeral(notify: Arc<NotifyHub>) -> Self {
        Self::with_writer(None, notify)
    }

    fn with_writer(wal: Option<Wal>, notify: Arc<NotifyHub>) -> Self {
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));
        Self {
            rooms: DashMap::new(),
            room_numbers: DashMap::new(),
            guests: DashMap::new(),
            guest_emails: DashMap::new(),
            staff: DashMap::new(),
            staff_usernames: DashMap::new(),
            staff_emails: DashMap::new(),
            entity_to_room: DashMap::new(),
            directory: Mutex::new(()),
            gate: RwLock::new(()),
            wal_tx,
            notify,
        }
    }

    fn replay_event(&self, event: &Event) {
        match event {
            Event::RoomCreated { room } => {
                self.room_numbers.insert(room.number.clone(), room.id);
                self.rooms
                    .insert(room.id, Arc::new(RwLock::new(RoomState::new(room.clone()))));
            }
            Event::RoomDeleted { id } => {
                if let Some((_, rs)) = self.rooms.remove(id) {
                    let guard = rs.try_read().expect("replay: uncontended read");
                    self.room_numbers.remove(&guard.room.number);
                }
            }
            Event::GuestCreated { guest } | Event::GuestUpdated { guest } => {
                self.put_guest(guest.clone());
            }
            Event::GuestDeleted { id } => self.drop_guest(id),
            Event::StaffCreated { staff } | Event::StaffUpdated { staff } => {
                self.put_staff(staff.clone());
            }
            Event::StaffDeleted { id } => self.drop_staff(id),
            other => {
                if let Some(room_id) = other.room_id()
                    && let Some(rs) = self.room_state(&room_id)
                {
                    let mut guard = rs.try_write().expect("replay: uncontended write");
                    if let Event::RoomUpdated { number, .. } = other {
                        self.room_numbers.remove(&guard.room.number);
                        self.room_numbers.insert(number.clone(), room_id);
                    }
                    guard.apply(other);
                    self.index_entity(other);
                }
            }
        }
    }

    /// Reference counts are derived state: recount them from bookings and tasks.
    fn rebuild_pins(&self) {
        for entry in self.rooms.iter() {
            let guard = entry.value().try_read().expect("replay: uncontended read");
            for booking in &guard.bookings {
                if let Some(mut g) = self.guests.get_mut(&booking.guest_id) {
                    g.refs += 1;
                }
            }
            for task in &guard.tasks {
                if let Some(sid) = task.staff_id
                    && let Some(mut s) = self.staff.get_mut(&sid)
                {
                    s.refs += 1;
                }
            }
        }
    }

    /// Keep the booking/task → room index in step with a committed event.
    fn index_entity(&self, event: &Event) {
        match event {
            Event::BookingCreated { booking } => {
                self.entity_to_room.insert(booking.id, booking.room_id);
            }
            Event::TaskCreated { task } => {
                self.entity_to_room.insert(task.id, task.room_id);
            }
            Event::BookingDeleted { id, .. } | Event::TaskDeleted { id, .. } => {
                self.entity_to_room.remove(id);
            }
            _ => {}
        }
    }

    /// Write one commit to the WAL via the background group-commit writer.
    pub(super) async fn wal_append(&self, events: &[Event]) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                events: events.to_vec(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn room_state(&self, id: &Ulid) -> Option<SharedRoomState> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    pub fn room_for_entity(&self, entity_id: &Ulid) -> Option<Ulid> {
        self.entity_to_room.get(entity_id).map(|e| *e.value())
    }

    /// Open a transaction on a room: gate, then the room's write lock.
    pub(super) async fn lock_room(&self, room_id: Ulid) -> Result<RoomTxn<'_>, EngineError> {
        let gate = self.gate.read().await;
        let rs = self
            .room_state(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let state = rs.write_owned().await;
        // Deleted while we waited for the lock.
        if !self.rooms.contains_key(&room_id) {
            return Err(EngineError::NotFound(room_id));
        }
        Ok(RoomTxn { _gate: gate, state })
    }

    /// Lookup booking/task → room, then open a transaction on that room.
    pub(super) async fn resolve_entity(&self, entity_id: Ulid) -> Result<RoomTxn<'_>, EngineError> {
        let room_id = self
            .room_for_entity(&entity_id)
            .ok_or(EngineError::NotFound(entity_id))?;
        self.lock_room(room_id).await
    }

    /// The scoped transaction behind every room-level operation.
    ///
    /// Stage `events` on a copy of the room, let the ledger append the status
    /// change they cause, write the whole list as one WAL record, and only
    /// then install the staged state. A WAL failure leaves nothing applied.
    pub(super) async fn commit(
        &self,
        txn: &mut RoomTxn<'_>,
        mut events: Vec<Event>,
    ) -> Result<(), EngineError> {
        let mut staged = txn.state.clone();
        for event in &events {
            staged.apply(event);
        }
        if let Some(status_event) = ledger::reconcile(&staged) {
            staged.apply(&status_event);
            events.push(status_event);
        }
        if events.is_empty() {
            return Ok(());
        }

        self.wal_append(&events).await?;

        let room_id = staged.room.id;
        *txn.state = staged;
        for event in &events {
            self.index_entity(event);
            if let Event::RoomStatusSet { status, .. } = event {
                info!("room {} is now {status}", txn.state.room.number);
                metrics::counter!(
                    crate::observability::ROOM_STATUS_CHANGES_TOTAL,
                    "status" => status.as_str()
                )
                .increment(1);
            }
            self.notify.send(room_id, event);
        }
        Ok(())
    }

    /// Flush and stop the WAL writer. Later writes fail with `WalError`.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Shutdown { response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }
}

pub(super) fn check_len(text: Option<&str>, max: usize, what: &'static str) -> Result<(), EngineError> {
    match text {
        Some(t) if t.len() > max => Err(EngineError::LimitExceeded(what)),
        _ => Ok(()),
    }
}

/// Required text: non-empty after trimming and within `max`.
pub(super) fn check_required(
    text: &str,
    max: usize,
    empty: &'static str,
    too_long: &'static str,
) -> Result<(), EngineError> {
    if text.trim().is_empty() {
        return Err(EngineError::Invalid(empty));
    }
    check_len(Some(text), max, too_long)
}
