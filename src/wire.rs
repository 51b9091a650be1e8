use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::Sink;
use futures::stream;
use pgwire::api::auth::StartupHandler;
use pgwire::api::copy::CopyHandler;
use pgwire::api::portal::{Format, Portal};
use pgwire::api::query::{ExtendedQueryHandler, SimpleQueryHandler};
use pgwire::api::results::{
    DataRowEncoder, DescribePortalResponse, DescribeStatementResponse, FieldFormat, FieldInfo,
    QueryResponse, Response, Tag,
};
use pgwire::api::stmt::{QueryParser, StoredStatement};
use pgwire::api::store::PortalStore;
use pgwire::api::{ClientInfo, ClientPortalStore, NoopHandler, PgWireServerHandlers, Type};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};
use pgwire::messages::PgWireBackendMessage;
use tokio::net::TcpStream;
use tracing::debug;
use ulid::Ulid;

use crate::engine::{Engine, EngineError};
use crate::limits::RECENT_BOOKINGS;
use crate::model::*;
use crate::observability;
use crate::sql::{self, Command, SqlError, Table};

pub struct InnkeepHandler {
    engine: Arc<Engine>,
    query_parser: Arc<InnkeepQueryParser>,
}

impl InnkeepHandler {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            query_parser: Arc::new(InnkeepQueryParser),
        }
    }

    /// Parse and execute one statement, recording query metrics.
    async fn run(&self, query: &str, format: Option<&Format>) -> PgWireResult<Response> {
        let start = Instant::now();
        let cmd = match sql::parse_sql(query) {
            Ok(cmd) => cmd,
            Err(e) => {
                metrics::counter!(observability::QUERIES_TOTAL, "command" => "parse", "status" => "error")
                    .increment(1);
                return Err(sql_err(e));
            }
        };
        let label = observability::command_label(&cmd);
        let result = self.execute_command(cmd, format).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(observability::QUERIES_TOTAL, "command" => label, "status" => status)
            .increment(1);
        metrics::histogram!(observability::QUERY_DURATION_SECONDS, "command" => label)
            .record(start.elapsed().as_secs_f64());
        result
    }

    async fn execute_command(&self, cmd: Command, format: Option<&Format>) -> PgWireResult<Response> {
        let engine = &self.engine;
        let out = Out(format);
        match cmd {
            Command::InsertRoom(new) => {
                let room = engine.create_room(new).await.map_err(engine_err)?;
                Ok(out.room_rows(vec![room]))
            }
            Command::UpdateRoom { id, patch } => {
                let room = engine.update_room(id, patch).await.map_err(engine_err)?;
                Ok(out.room_rows(vec![room]))
            }
            Command::DeleteRoom { id } => {
                engine.delete_room(id).await.map_err(engine_err)?;
                Ok(Response::Execution(Tag::new("DELETE").with_rows(1)))
            }
            Command::InsertGuest(new) => {
                let guest = engine.create_guest(new).await.map_err(engine_err)?;
                Ok(out.guest_rows(vec![guest]))
            }
            Command::UpdateGuest { id, patch } => {
                let guest = engine.update_guest(id, patch).await.map_err(engine_err)?;
                Ok(out.guest_rows(vec![guest]))
            }
            Command::DeleteGuest { id } => {
                engine.delete_guest(id).await.map_err(engine_err)?;
                Ok(Response::Execution(Tag::new("DELETE").with_rows(1)))
            }
            Command::InsertStaff(new) => {
                let staff = engine.create_staff(new).await.map_err(engine_err)?;
                Ok(out.staff_rows(vec![staff]))
            }
            Command::UpdateStaff { id, patch } => {
                let staff = engine.update_staff(id, patch).await.map_err(engine_err)?;
                Ok(out.staff_rows(vec![staff]))
            }
            Command::DeleteStaff { id } => {
                engine.delete_staff(id).await.map_err(engine_err)?;
                Ok(Response::Execution(Tag::new("DELETE").with_rows(1)))
            }
            Command::InsertBooking(new) => {
                let booking = engine.create_booking(new).await.map_err(engine_err)?;
                self.booking_row(booking.id, out).await
            }
            Command::UpdateBooking { id, patch } => {
                engine.update_booking(id, patch).await.map_err(engine_err)?;
                self.booking_row(id, out).await
            }
            Command::DeleteBooking { id } => {
                engine.delete_booking(id).await.map_err(engine_err)?;
                Ok(Response::Execution(Tag::new("DELETE").with_rows(1)))
            }
            Command::Checkout { id } => {
                engine.checkout(id).await.map_err(engine_err)?;
                self.booking_row(id, out).await
            }
            Command::CancelBooking { id } => {
                engine.cancel_booking(id).await.map_err(engine_err)?;
                self.booking_row(id, out).await
            }
            Command::InsertTask(new) => {
                let task = engine.create_task(new).await.map_err(engine_err)?;
                Ok(out.task_rows(vec![task]))
            }
            Command::UpdateTask { id, patch } => {
                let task = engine.update_task(id, patch).await.map_err(engine_err)?;
                Ok(out.task_rows(vec![task]))
            }
            Command::DeleteTask { id } => {
                engine.delete_task(id).await.map_err(engine_err)?;
                Ok(Response::Execution(Tag::new("DELETE").with_rows(1)))
            }
            Command::CompleteTask { id } => {
                let (room, _) = engine.complete_task(id).await.map_err(engine_err)?;
                Ok(out.room_rows(vec![room]))
            }
            Command::SetMaintenance { room_id, on } => {
                let room = engine.set_maintenance(room_id, on).await.map_err(engine_err)?;
                Ok(out.room_rows(vec![room]))
            }
            Command::ReconcileRoom { id } => {
                let room = engine.reconcile_room(id).await.map_err(engine_err)?;
                Ok(out.room_rows(vec![room]))
            }
            Command::SelectRooms { id, filter } => {
                let rooms = match id {
                    Some(id) => found(engine.room(id).await)?,
                    None => engine.list_rooms(&filter).await,
                };
                Ok(out.room_rows(rooms))
            }
            Command::SelectGuests { id } => {
                let guests = match id {
                    Some(id) => found(engine.guest(id))?,
                    None => engine.list_guests(),
                };
                Ok(out.guest_rows(guests))
            }
            Command::SelectStaff { id } => {
                let staff = match id {
                    Some(id) => found(engine.staff_member(id))?,
                    None => engine.list_staff(),
                };
                Ok(out.staff_rows(staff))
            }
            Command::SelectBookings { id, status } => {
                let views = match id {
                    Some(id) => found(engine.booking_view(id).await)?
                        .into_iter()
                        .filter(|v| status.is_none_or(|s| s == v.booking.status))
                        .collect(),
                    None => engine.list_bookings(status).await,
                };
                Ok(out.booking_rows(views))
            }
            Command::SelectTasks { id, filter } => {
                let tasks = match id {
                    Some(id) => found(engine.task(id).await)?,
                    None => engine.list_tasks(&filter).await,
                };
                Ok(out.task_rows(tasks))
            }
            Command::SelectDashboard { today } => {
                let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
                Ok(out.dashboard_rows(engine.stats(today).await))
            }
            Command::SelectRecentBookings => {
                Ok(out.booking_rows(engine.recent_bookings(RECENT_BOOKINGS).await))
            }
            Command::Listen { channel } => {
                let room_id = channel.strip_prefix("room_").ok_or_else(|| {
                    user_error("42000", format!("invalid channel: {channel} (expected room_{{id}})"))
                })?;
                Ulid::from_string(room_id)
                    .map_err(|e| user_error("42000", format!("bad ULID in channel: {e}")))?;
                Ok(Response::Execution(Tag::new("LISTEN")))
            }
        }
    }

    async fn booking_row(&self, id: Ulid, out: Out<'_>) -> PgWireResult<Response> {
        let view = self.engine.booking_view(id).await.map_err(engine_err)?;
        Ok(out.booking_rows(vec![view]))
    }
}

/// A single-row lookup: a missing id yields zero rows, not an error.
fn found<T>(result: Result<T, EngineError>) -> PgWireResult<Vec<T>> {
    match result {
        Ok(v) => Ok(vec![v]),
        Err(EngineError::NotFound(_)) => Ok(vec![]),
        Err(e) => Err(engine_err(e)),
    }
}

// ── Result schemas ───────────────────────────────────────────────

fn column(name: &str, ty: Type) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, ty, FieldFormat::Text)
}

fn room_schema() -> Vec<FieldInfo> {
    vec![
        column("id", Type::VARCHAR),
        column("room_number", Type::VARCHAR),
        column("room_type", Type::VARCHAR),
        column("price_per_night", Type::INT8),
        column("capacity", Type::INT8),
        column("status", Type::VARCHAR),
        column("manual_maintenance", Type::BOOL),
        column("description", Type::VARCHAR),
        column("amenities", Type::VARCHAR),
        column("created_at", Type::INT8),
    ]
}

fn guest_schema() -> Vec<FieldInfo> {
    vec![
        column("id", Type::VARCHAR),
        column("first_name", Type::VARCHAR),
        column("last_name", Type::VARCHAR),
        column("email", Type::VARCHAR),
        column("phone", Type::VARCHAR),
        column("address", Type::VARCHAR),
        column("id_number", Type::VARCHAR),
        column("created_at", Type::INT8),
    ]
}

/// The credential hash is write-only.
fn staff_schema() -> Vec<FieldInfo> {
    vec![
        column("id", Type::VARCHAR),
        column("username", Type::VARCHAR),
        column("full_name", Type::VARCHAR),
        column("role", Type::VARCHAR),
        column("email", Type::VARCHAR),
        column("created_at", Type::INT8),
    ]
}

fn booking_schema() -> Vec<FieldInfo> {
    vec![
        column("id", Type::VARCHAR),
        column("guest_id", Type::VARCHAR),
        column("room_id", Type::VARCHAR),
        column("check_in_date", Type::VARCHAR),
        column("check_out_date", Type::VARCHAR),
        column("nights", Type::INT8),
        column("nightly_rate", Type::INT8),
        column("total_amount", Type::INT8),
        column("status", Type::VARCHAR),
        column("special_requests", Type::VARCHAR),
        column("created_at", Type::INT8),
        column("guest_name", Type::VARCHAR),
        column("guest_email", Type::VARCHAR),
        column("guest_phone", Type::VARCHAR),
        column("room_number", Type::VARCHAR),
        column("room_type", Type::VARCHAR),
    ]
}

fn task_schema() -> Vec<FieldInfo> {
    vec![
        column("id", Type::VARCHAR),
        column("room_id", Type::VARCHAR),
        column("staff_id", Type::VARCHAR),
        column("task_type", Type::VARCHAR),
        column("priority", Type::VARCHAR),
        column("status", Type::VARCHAR),
        column("scheduled_date", Type::VARCHAR),
        column("completed_at", Type::INT8),
        column("notes", Type::VARCHAR),
        column("created_at", Type::INT8),
    ]
}

fn dashboard_schema() -> Vec<FieldInfo> {
    [
        "total_rooms",
        "available_rooms",
        "occupied_rooms",
        "maintenance_rooms",
        "total_guests",
        "active_bookings",
        "completed_bookings",
        "total_revenue",
        "today_check_ins",
        "today_check_outs",
    ]
    .into_iter()
    .map(|name| column(name, Type::INT8))
    .collect()
}

fn table_schema(table: Table) -> Vec<FieldInfo> {
    match table {
        Table::Rooms => room_schema(),
        Table::Guests => guest_schema(),
        Table::Staff => staff_schema(),
        Table::Bookings | Table::RecentBookings => booking_schema(),
        Table::Housekeeping => task_schema(),
        Table::Dashboard => dashboard_schema(),
    }
}

/// Row description of a statement, read from its leading keyword and
/// table. Used to describe prepared statements before parameters are bound.
fn result_schema(sql: &str) -> Vec<FieldInfo> {
    let words: Vec<String> = sql
        .split(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ';' | ','))
        .filter(|w| !w.is_empty())
        .map(|w| w.trim_matches('"').to_lowercase())
        .collect();
    let after = |keyword: &str| {
        words
            .iter()
            .position(|w| w == keyword)
            .and_then(|i| words.get(i + 1))
            .map(String::as_str)
    };
    let table = match words.first().map(String::as_str) {
        Some("select") => after("from"),
        Some("insert") => after("into"),
        Some("update") => words.get(1).map(String::as_str),
        Some("call") => match words.get(1).map(String::as_str) {
            Some("checkout" | "cancel_booking") => Some("bookings"),
            Some("set_maintenance" | "reconcile_room" | "complete_task") => Some("rooms"),
            _ => None,
        },
        _ => None,
    };
    table
        .and_then(|t| Table::from_name(t).ok())
        .map(table_schema)
        .unwrap_or_default()
}

/// Apply the client's requested result formats to a text schema.
fn with_format(schema: Vec<FieldInfo>, format: Option<&Format>) -> Vec<FieldInfo> {
    let Some(format) = format else { return schema };
    schema
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            FieldInfo::new(f.name().to_string(), None, None, f.datatype().clone(), format.format_for(i))
        })
        .collect()
}

// ── Row encoding ─────────────────────────────────────────────────

fn int(v: impl TryInto<i64>) -> i64 {
    v.try_into().unwrap_or(i64::MAX)
}

/// Result encoding for one execution, in the formats the client asked for.
#[derive(Clone, Copy)]
struct Out<'a>(Option<&'a Format>);

impl Out<'_> {
    fn rows<T>(
        self,
        schema: Vec<FieldInfo>,
        items: Vec<T>,
        encode: impl Fn(&mut DataRowEncoder, &T) -> PgWireResult<()>,
    ) -> Response {
        let schema = Arc::new(with_format(schema, self.0));
        let rows: Vec<PgWireResult<_>> = items
            .iter()
            .map(|item| {
                let mut encoder = DataRowEncoder::new(schema.clone());
                encode(&mut encoder, item)?;
                Ok(encoder.take_row())
            })
            .collect();
        Response::Query(QueryResponse::new(schema, stream::iter(rows)))
    }

    fn room_rows(self, rooms: Vec<Room>) -> Response {
        self.rows(room_schema(), rooms, |e, r| {
            e.encode_field(&r.id.to_string())?;
            e.encode_field(&r.number)?;
            e.encode_field(&r.room_type.to_string())?;
            e.encode_field(&int(r.nightly_rate))?;
            e.encode_field(&i64::from(r.capacity))?;
            e.encode_field(&r.status.to_string())?;
            e.encode_field(&r.manual_maintenance)?;
            e.encode_field(&r.description)?;
            e.encode_field(&r.amenities.join(","))?;
            e.encode_field(&r.created_at)
        })
    }

    fn guest_rows(self, guests: Vec<Guest>) -> Response {
        self.rows(guest_schema(), guests, |e, g| {
            e.encode_field(&g.id.to_string())?;
            e.encode_field(&g.first_name)?;
            e.encode_field(&g.last_name)?;
            e.encode_field(&g.email)?;
            e.encode_field(&g.phone)?;
            e.encode_field(&g.address)?;
            e.encode_field(&g.id_number)?;
            e.encode_field(&g.created_at)
        })
    }

    fn staff_rows(self, staff: Vec<Staff>) -> Response {
        self.rows(staff_schema(), staff, |e, s| {
            e.encode_field(&s.id.to_string())?;
            e.encode_field(&s.username)?;
            e.encode_field(&s.full_name)?;
            e.encode_field(&s.role.as_str().to_string())?;
            e.encode_field(&s.email)?;
            e.encode_field(&s.created_at)
        })
    }

    fn booking_rows(self, views: Vec<BookingView>) -> Response {
        self.rows(booking_schema(), views, |e, v| {
            let b = &v.booking;
            e.encode_field(&b.id.to_string())?;
            e.encode_field(&b.guest_id.to_string())?;
            e.encode_field(&b.room_id.to_string())?;
            e.encode_field(&b.stay.check_in.to_string())?;
            e.encode_field(&b.stay.check_out.to_string())?;
            e.encode_field(&b.stay.nights())?;
            e.encode_field(&int(b.nightly_rate))?;
            e.encode_field(&int(b.total_amount))?;
            e.encode_field(&b.status.to_string())?;
            e.encode_field(&b.special_requests)?;
            e.encode_field(&b.created_at)?;
            e.encode_field(&v.guest_name)?;
            e.encode_field(&v.guest_email)?;
            e.encode_field(&v.guest_phone)?;
            e.encode_field(&v.room_number)?;
            e.encode_field(&v.room_type.to_string())
        })
    }

    fn task_rows(self, tasks: Vec<HousekeepingTask>) -> Response {
        self.rows(task_schema(), tasks, |e, t| {
            e.encode_field(&t.id.to_string())?;
            e.encode_field(&t.room_id.to_string())?;
            e.encode_field(&t.staff_id.map(|s| s.to_string()))?;
            e.encode_field(&t.task_type.as_str().to_string())?;
            e.encode_field(&t.priority.as_str().to_string())?;
            e.encode_field(&t.status.as_str().to_string())?;
            e.encode_field(&t.scheduled_date.to_string())?;
            e.encode_field(&t.completed_at)?;
            e.encode_field(&t.notes)?;
            e.encode_field(&t.created_at)
        })
    }

    fn dashboard_rows(self, stats: DashboardStats) -> Response {
        self.rows(dashboard_schema(), vec![stats], |e, s| {
            for v in [
                s.total_rooms,
                s.available_rooms,
                s.occupied_rooms,
                s.maintenance_rooms,
                s.total_guests,
                s.active_bookings,
                s.completed_bookings,
            ] {
                e.encode_field(&int(v))?;
            }
            e.encode_field(&int(s.total_revenue))?;
            e.encode_field(&int(s.today_check_ins))?;
            e.encode_field(&int(s.today_check_outs))
        })
    }
}

#[async_trait]
impl SimpleQueryHandler for InnkeepHandler {
    async fn do_query<C>(
        &self,
        _client: &mut C,
        query: &str,
    ) -> PgWireResult<Vec<Response>>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        Ok(vec![self.run(query, None).await?])
    }
}

// ── Extended Query Protocol ──────────────────────────────────────

#[derive(Debug)]
pub struct InnkeepQueryParser;

#[async_trait]
impl QueryParser for InnkeepQueryParser {
    type Statement = String;

    async fn parse_sql<C>(
        &self,
        _client: &C,
        sql: &str,
        _types: &[Option<Type>],
    ) -> PgWireResult<String>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        Ok(sql.to_string())
    }

    fn get_parameter_types(&self, stmt: &String) -> PgWireResult<Vec<Type>> {
        Ok(vec![Type::VARCHAR; count_params(stmt)])
    }

    fn get_result_schema(
        &self,
        stmt: &String,
        column_format: Option<&Format>,
    ) -> PgWireResult<Vec<FieldInfo>> {
        Ok(with_format(result_schema(stmt), column_format))
    }
}

#[async_trait]
impl ExtendedQueryHandler for InnkeepHandler {
    type Statement = String;
    type QueryParser = InnkeepQueryParser;

    fn query_parser(&self) -> Arc<Self::QueryParser> {
        self.query_parser.clone()
    }

    async fn do_query<C>(
        &self,
        _client: &mut C,
        portal: &Portal<Self::Statement>,
        _max_rows: usize,
    ) -> PgWireResult<Response>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let sql = substitute_params(portal);
        self.run(&sql, Some(&portal.result_column_format)).await
    }

    async fn do_describe_statement<C>(
        &self,
        _client: &mut C,
        target: &StoredStatement<Self::Statement>,
    ) -> PgWireResult<DescribeStatementResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let param_types = vec![Type::VARCHAR; count_params(&target.statement)];
        Ok(DescribeStatementResponse::new(
            param_types,
            result_schema(&target.statement),
        ))
    }

    async fn do_describe_portal<C>(
        &self,
        _client: &mut C,
        target: &Portal<Self::Statement>,
    ) -> PgWireResult<DescribePortalResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        Ok(DescribePortalResponse::new(with_format(
            result_schema(&target.statement.statement),
            Some(&target.result_column_format),
        )))
    }
}

/// Count the highest $N parameter placeholder in the SQL string.
fn count_params(sql: &str) -> usize {
    let mut max = 0usize;
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i > start
                && let Ok(n) = sql[start..i].parse::<usize>()
            {
                max = max.max(n);
            }
        } else {
            i += 1;
        }
    }
    max
}

/// Substitute $1, $2, ... placeholders with bound parameter values (text format).
fn substitute_params(portal: &Portal<String>) -> String {
    let mut result = portal.statement.statement.to_string();

    // Highest index first so $1 does not clobber $10.
    for (i, param) in portal.parameters.iter().enumerate().rev() {
        let placeholder = format!("${}", i + 1);
        let value = match param {
            Some(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                format!("'{}'", text.replace('\'', "''"))
            }
            None => "NULL".to_string(),
        };
        result = result.replace(&placeholder, &value);
    }

    result
}

// ── Factory ──────────────────────────────────────────────────────

/// Handlers for one connection. No authentication: the startup
/// handshake accepts any user.
pub struct InnkeepFactory {
    handler: Arc<InnkeepHandler>,
    noop: Arc<NoopHandler>,
}

impl InnkeepFactory {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            handler: Arc::new(InnkeepHandler::new(engine)),
            noop: Arc::new(NoopHandler),
        }
    }
}

impl PgWireServerHandlers for InnkeepFactory {
    fn simple_query_handler(&self) -> Arc<impl SimpleQueryHandler> {
        self.handler.clone()
    }

    fn extended_query_handler(&self) -> Arc<impl ExtendedQueryHandler> {
        self.handler.clone()
    }

    fn startup_handler(&self) -> Arc<impl StartupHandler> {
        self.noop.clone()
    }

    fn copy_handler(&self) -> Arc<impl CopyHandler> {
        self.noop.clone()
    }
}

/// Serve one client connection until it closes.
pub async fn process_connection(socket: TcpStream, engine: Arc<Engine>) -> std::io::Result<()> {
    pgwire::tokio::process_socket(socket, None, InnkeepFactory::new(engine)).await
}

// ── Errors ───────────────────────────────────────────────────────

fn user_error(code: &str, message: String) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        code.into(),
        message,
    )))
}

/// Map engine failures to SQLSTATE codes clients can branch on.
pub fn sqlstate(e: &EngineError) -> &'static str {
    match e {
        EngineError::NotFound(_) => "P0002",
        EngineError::AlreadyExists(_) => "23505",
        EngineError::InUse { .. } => "23503",
        EngineError::InvalidDateRange { .. } | EngineError::Invalid(_) => "22023",
        EngineError::RoomUnavailable(_) | EngineError::InvalidTransition { .. } => "55000",
        EngineError::LimitExceeded(_) => "54000",
        EngineError::WalError(_) => "58030",
    }
}

fn engine_err(e: EngineError) -> PgWireError {
    debug!("request failed: {e}");
    user_error(sqlstate(&e), e.to_string())
}

fn sql_err(e: SqlError) -> PgWireError {
    user_error("42601", e.to_string())
}
