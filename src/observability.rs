use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;

use crate::sql::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total queries executed. Labels: command, status.
pub const QUERIES_TOTAL: &str = "innkeep_queries_total";

/// Histogram: query latency in seconds. Labels: command.
pub const QUERY_DURATION_SECONDS: &str = "innkeep_query_duration_seconds";

// ── Domain metrics ──────────────────────────────────────────────

/// Counter: materialized room status changes. Labels: status.
pub const ROOM_STATUS_CHANGES_TOTAL: &str = "innkeep_room_status_changes_total";

/// Counter: bookings entering a status. Labels: to.
pub const BOOKING_TRANSITIONS_TOTAL: &str = "innkeep_booking_transitions_total";

/// Counter: WAL compactions run by the background compactor.
pub const WAL_COMPACTIONS_TOTAL: &str = "innkeep_wal_compactions_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "innkeep_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "innkeep_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "innkeep_connections_rejected_total";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "innkeep_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (commits per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "innkeep_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::InsertRoom(_) => "insert_room",
        Command::UpdateRoom { .. } => "update_room",
        Command::DeleteRoom { .. } => "delete_room",
        Command::InsertGuest(_) => "insert_guest",
        Command::UpdateGuest { .. } => "update_guest",
        Command::DeleteGuest { .. } => "delete_guest",
        Command::InsertStaff(_) => "insert_staff",
        Command::UpdateStaff { .. } => "update_staff",
        Command::DeleteStaff { .. } => "delete_staff",
        Command::InsertBooking(_) => "insert_booking",
        Command::UpdateBooking { .. } => "update_booking",
        Command::DeleteBooking { .. } => "delete_booking",
        Command::InsertTask(_) => "insert_task",
        Command::UpdateTask { .. } => "update_task",
        Command::DeleteTask { .. } => "delete_task",
        Command::Checkout { .. } => "checkout",
        Command::CancelBooking { .. } => "cancel_booking",
        Command::SetMaintenance { .. } => "set_maintenance",
        Command::CompleteTask { .. } => "complete_task",
        Command::ReconcileRoom { .. } => "reconcile_room",
        Command::SelectRooms { .. } => "select_rooms",
        Command::SelectGuests { .. } => "select_guests",
        Command::SelectStaff { .. } => "select_staff",
        Command::SelectBookings { .. } => "select_bookings",
        Command::SelectTasks { .. } => "select_tasks",
        Command::SelectDashboard { .. } => "select_dashboard",
        Command::SelectRecentBookings => "select_recent_bookings",
        Command::Listen { .. } => "listen",
    }
}
