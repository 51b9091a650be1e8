/// Max length of short identifiers: room numbers, names, emails, usernames.
pub const MAX_NAME_LEN: usize = 256;

/// Max length of free text: descriptions, notes, special requests, addresses.
pub const MAX_TEXT_LEN: usize = 4096;

/// Max amenity tags per room.
pub const MAX_AMENITIES: usize = 64;

pub const MAX_ROOMS: usize = 10_000;

pub const MAX_GUESTS: usize = 1_000_000;

pub const MAX_STAFF: usize = 10_000;

/// Bookings (any status) kept on a single room.
pub const MAX_BOOKINGS_PER_ROOM: usize = 100_000;

/// Housekeeping tasks (any status) kept on a single room.
pub const MAX_TASKS_PER_ROOM: usize = 100_000;

/// Longest bookable stay.
pub const MAX_STAY_NIGHTS: i64 = 366;

/// Rows returned by `recent_bookings`.
pub const RECENT_BOOKINGS: usize = 5;
