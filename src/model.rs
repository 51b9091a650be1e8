use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds, used for creation and completion stamps.
pub type Ms = i64;

/// Amount in the smallest currency unit.
pub type Money = u64;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as Ms)
        .unwrap_or(0)
}

/// Returned by the `FromStr` impls below; carries the rejected text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

// ── Enumerations ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    Single,
    Double,
    Suite,
    Deluxe,
    Other(String),
}

impl RoomType {
    pub fn as_str(&self) -> &str {
        match self {
            RoomType::Single => "Single",
            RoomType::Double => "Double",
            RoomType::Suite => "Suite",
            RoomType::Deluxe => "Deluxe",
            RoomType::Other(name) => name,
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.to_lowercase().as_str() {
            "single" => RoomType::Single,
            "double" => RoomType::Double,
            "suite" => RoomType::Suite,
            "deluxe" => RoomType::Deluxe,
            "" => return Err(UnknownVariant(s.to_string())),
            _ => RoomType::Other(trimmed.to_string()),
        })
    }
}

/// Occupancy status of a room, as materialized by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupancyStatus {
    Available,
    Occupied,
    Maintenance,
}

impl OccupancyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OccupancyStatus::Available => "available",
            OccupancyStatus::Occupied => "occupied",
            OccupancyStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OccupancyStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(OccupancyStatus::Available),
            "occupied" => Ok(OccupancyStatus::Occupied),
            "maintenance" => Ok(OccupancyStatus::Maintenance),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    Cleaning,
    Maintenance,
    Inspection,
    Laundry,
    Restocking,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Cleaning => "cleaning",
            TaskType::Maintenance => "maintenance",
            TaskType::Inspection => "inspection",
            TaskType::Laundry => "laundry",
            TaskType::Restocking => "restocking",
        }
    }
}

impl FromStr for TaskType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cleaning" => Ok(TaskType::Cleaning),
            "maintenance" => Ok(TaskType::Maintenance),
            "inspection" => Ok(TaskType::Inspection),
            "laundry" => Ok(TaskType::Laundry),
            "restocking" => Ok(TaskType::Restocking),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    Normal,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Normal => "normal",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "normal" => Ok(TaskPriority::Normal),
            "high" => Ok(TaskPriority::High),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    Admin,
    Manager,
    Receptionist,
    Housekeeping,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Manager => "manager",
            StaffRole::Receptionist => "receptionist",
            StaffRole::Housekeeping => "housekeeping",
        }
    }
}

impl FromStr for StaffRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(StaffRole::Admin),
            "manager" => Ok(StaffRole::Manager),
            "receptionist" => Ok(StaffRole::Receptionist),
            "housekeeping" => Ok(StaffRole::Housekeeping),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

// ── Records ─────────────────────────────────────────────────────

/// Check-in / check-out calendar dates. A valid stay has `check_out > check_in`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self { check_in, check_out }
    }

    /// Whole nights between the two dates; zero or negative for an invalid stay.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Ulid,
    pub number: String,
    pub room_type: RoomType,
    pub nightly_rate: Money,
    pub capacity: u32,
    /// Materialized occupancy; only the ledger writes it.
    pub status: OccupancyStatus,
    /// Manual maintenance override, set and cleared explicitly.
    pub manual_maintenance: bool,
    pub description: Option<String>,
    pub amenities: Vec<String>,
    pub created_at: Ms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: Ulid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub id_number: Option<String>,
    pub created_at: Ms,
}

impl Guest {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: Ulid,
    pub username: String,
    pub credential_hash: String,
    pub full_name: String,
    pub role: StaffRole,
    pub email: String,
    pub created_at: Ms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub guest_id: Ulid,
    pub room_id: Ulid,
    pub stay: Stay,
    /// Room rate captured at creation; date edits are priced with it.
    pub nightly_rate: Money,
    pub total_amount: Money,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    pub created_at: Ms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingTask {
    pub id: Ulid,
    pub room_id: Ulid,
    pub staff_id: Option<Ulid>,
    pub task_type: TaskType,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub scheduled_date: NaiveDate,
    pub completed_at: Option<Ms>,
    pub notes: Option<String>,
    pub created_at: Ms,
}

impl HousekeepingTask {
    /// An open maintenance task keeps its room under the maintenance override.
    pub fn holds_room(&self) -> bool {
        self.task_type == TaskType::Maintenance && self.status != TaskStatus::Completed
    }
}

// ── Per-room state ──────────────────────────────────────────────

/// Everything guarded by one room lock: the room, its bookings, its tasks.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub room: Room,
    /// Bookings of every status, sorted by check-in date.
    pub bookings: Vec<Booking>,
    /// Housekeeping tasks, sorted by scheduled date.
    pub tasks: Vec<HousekeepingTask>,
}

impl RoomState {
    pub fn new(room: Room) -> Self {
        Self {
            room,
            bookings: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn id(&self) -> Ulid {
        self.room.id
    }

    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .partition_point(|b| b.stay.check_in <= booking.stay.check_in);
        self.bookings.insert(pos, booking);
    }

    pub fn remove_booking(&mut self, id: Ulid) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }

    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn confirmed_bookings(&self) -> impl Iterator<Item = &Booking> {
        self.bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Confirmed)
    }

    pub fn insert_task(&mut self, task: HousekeepingTask) {
        let pos = self
            .tasks
            .partition_point(|t| t.scheduled_date <= task.scheduled_date);
        self.tasks.insert(pos, task);
    }

    pub fn remove_task(&mut self, id: Ulid) -> Option<HousekeepingTask> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(pos))
    }

    pub fn task(&self, id: Ulid) -> Option<&HousekeepingTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// True while the manual flag is set or any maintenance task is open.
    pub fn maintenance_active(&self) -> bool {
        self.room.manual_maintenance || self.tasks.iter().any(HousekeepingTask::holds_room)
    }

    /// Apply a room-scoped event. Guest/staff events and room creation or
    /// deletion are handled by the engine's maps, not here.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::RoomUpdated {
                number,
                room_type,
                nightly_rate,
                capacity,
                description,
                amenities,
                ..
            } => {
                self.room.number = number.clone();
                self.room.room_type = room_type.clone();
                self.room.nightly_rate = *nightly_rate;
                self.room.capacity = *capacity;
                self.room.description = description.clone();
                self.room.amenities = amenities.clone();
            }
            Event::RoomStatusSet { status, .. } => self.room.status = *status,
            Event::MaintenanceSet { on, .. } => self.room.manual_maintenance = *on,
            Event::BookingCreated { booking } => self.insert_booking(booking.clone()),
            Event::BookingUpdated { booking } => {
                self.remove_booking(booking.id);
                self.insert_booking(booking.clone());
            }
            Event::BookingDeleted { id, .. } => {
                self.remove_booking(*id);
            }
            Event::TaskCreated { task } => self.insert_task(task.clone()),
            Event::TaskUpdated { task } => {
                self.remove_task(task.id);
                self.insert_task(task.clone());
            }
            Event::TaskDeleted { id, .. } => {
                self.remove_task(*id);
            }
            Event::RoomCreated { .. }
            | Event::RoomDeleted { .. }
            | Event::GuestCreated { .. }
            | Event::GuestUpdated { .. }
            | Event::GuestDeleted { .. }
            | Event::StaffCreated { .. }
            | Event::StaffUpdated { .. }
            | Event::StaffDeleted { .. } => {}
        }
    }
}

/// The event types. A WAL record is one commit: a `Vec<Event>` applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomCreated {
        room: Room,
    },
    RoomUpdated {
        id: Ulid,
        number: String,
        room_type: RoomType,
        nightly_rate: Money,
        capacity: u32,
        description: Option<String>,
        amenities: Vec<String>,
    },
    RoomDeleted {
        id: Ulid,
    },
    RoomStatusSet {
        id: Ulid,
        status: OccupancyStatus,
    },
    MaintenanceSet {
        room_id: Ulid,
        on: bool,
    },
    GuestCreated {
        guest: Guest,
    },
    GuestUpdated {
        guest: Guest,
    },
    GuestDeleted {
        id: Ulid,
    },
    StaffCreated {
        staff: Staff,
    },
    StaffUpdated {
        staff: Staff,
    },
    StaffDeleted {
        id: Ulid,
    },
    BookingCreated {
        booking: Booking,
    },
    BookingUpdated {
        booking: Booking,
    },
    BookingDeleted {
        id: Ulid,
        room_id: Ulid,
    },
    TaskCreated {
        task: HousekeepingTask,
    },
    TaskUpdated {
        task: HousekeepingTask,
    },
    TaskDeleted {
        id: Ulid,
        room_id: Ulid,
    },
}

impl Event {
    /// The room this event belongs to, if any.
    pub fn room_id(&self) -> Option<Ulid> {
        match self {
            Event::RoomCreated { room } => Some(room.id),
            Event::RoomUpdated { id, .. }
            | Event::RoomDeleted { id }
            | Event::RoomStatusSet { id, .. } => Some(*id),
            Event::MaintenanceSet { room_id, .. }
            | Event::BookingDeleted { room_id, .. }
            | Event::TaskDeleted { room_id, .. } => Some(*room_id),
            Event::BookingCreated { booking } | Event::BookingUpdated { booking } => {
                Some(booking.room_id)
            }
            Event::TaskCreated { task } | Event::TaskUpdated { task } => Some(task.room_id),
            Event::GuestCreated { .. }
            | Event::GuestUpdated { .. }
            | Event::GuestDeleted { .. }
            | Event::StaffCreated { .. }
            | Event::StaffUpdated { .. }
            | Event::StaffDeleted { .. } => None,
        }
    }
}

// ── Query result types ──────────────────────────────────────────

/// A booking joined with its guest and room, as listed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingView {
    pub booking: Booking,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub room_number: String,
    pub room_type: RoomType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_rooms: usize,
    pub available_rooms: usize,
    pub occupied_rooms: usize,
    pub maintenance_rooms: usize,
    pub total_guests: usize,
    pub active_bookings: usize,
    pub completed_bookings: usize,
    /// Sum over confirmed and completed bookings.
    pub total_revenue: Money,
    pub today_check_ins: usize,
    pub today_check_outs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn room() -> Room {
        Room {
            id: Ulid::new(),
            number: "101".into(),
            room_type: RoomType::Single,
            nightly_rate: 80_000,
            capacity: 1,
            status: OccupancyStatus::Available,
            manual_maintenance: false,
            description: None,
            amenities: vec![],
            created_at: 0,
        }
    }

    fn booking(room_id: Ulid, check_in: &str, check_out: &str) -> Booking {
        Booking {
            id: Ulid::new(),
            guest_id: Ulid::new(),
            room_id,
            stay: Stay::new(date(check_in), date(check_out)),
            nightly_rate: 80_000,
            total_amount: 0,
            status: BookingStatus::Confirmed,
            special_requests: None,
            created_at: 0,
        }
    }

    fn task(room_id: Ulid, task_type: TaskType, status: TaskStatus) -> HousekeepingTask {
        HousekeepingTask {
            id: Ulid::new(),
            room_id,
            staff_id: None,
            task_type,
            priority: TaskPriority::Normal,
            status,
            scheduled_date: date("2024-01-01"),
            completed_at: None,
            notes: None,
            created_at: 0,
        }
    }

    #[test]
    fn stay_nights() {
        let s = Stay::new(date("2024-01-01"), date("2024-01-04"));
        assert_eq!(s.nights(), 3);
    }

    #[test]
    fn stay_across_month_and_leap_day() {
        let s = Stay::new(date("2024-02-28"), date("2024-03-01"));
        assert_eq!(s.nights(), 2);
    }

    #[test]
    fn stay_inverted_is_not_positive() {
        let s = Stay::new(date("2024-01-04"), date("2024-01-01"));
        assert!(s.nights() <= 0);
        let same = Stay::new(date("2024-01-04"), date("2024-01-04"));
        assert_eq!(same.nights(), 0);
    }

    #[test]
    fn status_parsing() {
        assert_eq!("Confirmed".parse::<BookingStatus>(), Ok(BookingStatus::Confirmed));
        assert_eq!("canceled".parse::<BookingStatus>(), Ok(BookingStatus::Cancelled));
        assert!("pending".parse::<BookingStatus>().is_err());
        assert_eq!("in_progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("MAINTENANCE".parse::<OccupancyStatus>(), Ok(OccupancyStatus::Maintenance));
    }

    #[test]
    fn room_type_is_extensible() {
        assert_eq!("suite".parse::<RoomType>(), Ok(RoomType::Suite));
        assert_eq!(
            "Penthouse".parse::<RoomType>(),
            Ok(RoomType::Other("Penthouse".into()))
        );
        assert_eq!(RoomType::Other("Penthouse".into()).to_string(), "Penthouse");
        assert!("  ".parse::<RoomType>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn bookings_kept_sorted_by_check_in() {
        let r = room();
        let mut rs = RoomState::new(r.clone());
        rs.insert_booking(booking(r.id, "2024-03-01", "2024-03-02"));
        rs.insert_booking(booking(r.id, "2024-01-01", "2024-01-02"));
        rs.insert_booking(booking(r.id, "2024-02-01", "2024-02-02"));
        let months: Vec<u32> = rs
            .bookings
            .iter()
            .map(|b| chrono::Datelike::month(&b.stay.check_in))
            .collect();
        assert_eq!(months, vec![1, 2, 3]);
    }

    #[test]
    fn remove_nonexistent_booking_returns_none() {
        let r = room();
        let mut rs = RoomState::new(r.clone());
        rs.insert_booking(booking(r.id, "2024-01-01", "2024-01-02"));
        assert!(rs.remove_booking(Ulid::new()).is_none());
        assert_eq!(rs.bookings.len(), 1);
    }

    #[test]
    fn booking_update_reorders() {
        let r = room();
        let mut rs = RoomState::new(r.clone());
        let early = booking(r.id, "2024-01-01", "2024-01-02");
        let late = booking(r.id, "2024-02-01", "2024-02-02");
        rs.insert_booking(early.clone());
        rs.insert_booking(late.clone());

        let mut moved = early.clone();
        moved.stay = Stay::new(date("2024-03-01"), date("2024-03-05"));
        rs.apply(&Event::BookingUpdated { booking: moved });

        assert_eq!(rs.bookings.len(), 2);
        assert_eq!(rs.bookings[0].id, late.id);
        assert_eq!(rs.bookings[1].id, early.id);
    }

    #[test]
    fn maintenance_active_from_flag_or_open_task() {
        let r = room();
        let mut rs = RoomState::new(r.clone());
        assert!(!rs.maintenance_active());

        rs.apply(&Event::MaintenanceSet { room_id: r.id, on: true });
        assert!(rs.maintenance_active());
        rs.apply(&Event::MaintenanceSet { room_id: r.id, on: false });
        assert!(!rs.maintenance_active());

        rs.insert_task(task(r.id, TaskType::Cleaning, TaskStatus::Pending));
        assert!(!rs.maintenance_active());

        let repair = task(r.id, TaskType::Maintenance, TaskStatus::InProgress);
        rs.insert_task(repair.clone());
        assert!(rs.maintenance_active());

        let mut done = repair;
        done.status = TaskStatus::Completed;
        rs.apply(&Event::TaskUpdated { task: done });
        assert!(!rs.maintenance_active());
    }

    #[test]
    fn event_room_id() {
        let r = room();
        let b = booking(r.id, "2024-01-01", "2024-01-02");
        assert_eq!(Event::BookingCreated { booking: b }.room_id(), Some(r.id));
        assert_eq!(Event::GuestDeleted { id: Ulid::new() }.room_id(), None);
    }

    #[test]
    fn commit_serialization_roundtrip() {
        let r = room();
        let commit = vec![
            Event::BookingCreated {
                booking: booking(r.id, "2024-01-01", "2024-01-04"),
            },
            Event::RoomStatusSet {
                id: r.id,
                status: OccupancyStatus::Occupied,
            },
        ];
        let bytes = bincode::serialize(&commit).unwrap();
        let decoded: Vec<Event> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(commit, decoded);
    }
}
