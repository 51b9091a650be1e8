use chrono::NaiveDate;
use sqlparser::ast::{
    self, AssignmentTarget, Expr, FromTable, FunctionArg, FunctionArgExpr, FunctionArguments,
    ObjectNamePart, SetExpr, Statement, TableFactor, TableObject, Value, ValueWithSpan,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use ulid::Ulid;

use crate::engine::{
    BookingPatch, GuestPatch, NewBooking, NewGuest, NewRoom, NewStaff, NewTask, RoomFilter,
    RoomPatch, StaffPatch, TaskFilter, TaskPatch,
};
use crate::model::*;

/// Tables exposed over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Rooms,
    Guests,
    Staff,
    Bookings,
    Housekeeping,
    Dashboard,
    RecentBookings,
}

impl Table {
    pub fn from_name(name: &str) -> Result<Self, SqlError> {
        Ok(match name {
            "rooms" => Table::Rooms,
            "guests" => Table::Guests,
            "staff" => Table::Staff,
            "bookings" => Table::Bookings,
            "housekeeping" => Table::Housekeeping,
            "dashboard" => Table::Dashboard,
            "recent_bookings" => Table::RecentBookings,
            _ => return Err(SqlError::UnknownTable(name.to_string())),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Table::Rooms => "rooms",
            Table::Guests => "guests",
            Table::Staff => "staff",
            Table::Bookings => "bookings",
            Table::Housekeeping => "housekeeping",
            Table::Dashboard => "dashboard",
            Table::RecentBookings => "recent_bookings",
        }
    }

    /// Computed tables; only SELECT applies.
    fn is_view(&self) -> bool {
        matches!(self, Table::Dashboard | Table::RecentBookings)
    }

    /// Columns accepted by INSERT and UPDATE.
    fn writable(&self) -> &'static [&'static str] {
        match self {
            Table::Rooms => &[
                "id",
                "room_number",
                "room_type",
                "price_per_night",
                "capacity",
                "description",
                "amenities",
            ],
            Table::Guests => &["id", "first_name", "last_name", "email", "phone", "address", "id_number"],
            Table::Staff => &["id", "username", "password_hash", "full_name", "role", "email"],
            Table::Bookings => &[
                "id",
                "guest_id",
                "room_id",
                "check_in_date",
                "check_out_date",
                "total_amount",
                "status",
                "special_requests",
            ],
            Table::Housekeeping => &[
                "id",
                "room_id",
                "staff_id",
                "task_type",
                "priority",
                "status",
                "scheduled_date",
                "notes",
            ],
            Table::Dashboard | Table::RecentBookings => &[],
        }
    }
}

/// Parsed command from SQL input.
#[derive(Debug, PartialEq)]
pub enum Command {
    InsertRoom(NewRoom),
    UpdateRoom { id: Ulid, patch: RoomPatch },
    DeleteRoom { id: Ulid },
    InsertGuest(NewGuest),
    UpdateGuest { id: Ulid, patch: GuestPatch },
    DeleteGuest { id: Ulid },
    InsertStaff(NewStaff),
    UpdateStaff { id: Ulid, patch: StaffPatch },
    DeleteStaff { id: Ulid },
    InsertBooking(NewBooking),
    UpdateBooking { id: Ulid, patch: BookingPatch },
    DeleteBooking { id: Ulid },
    InsertTask(NewTask),
    UpdateTask { id: Ulid, patch: TaskPatch },
    DeleteTask { id: Ulid },
    Checkout { id: Ulid },
    CancelBooking { id: Ulid },
    SetMaintenance { room_id: Ulid, on: bool },
    CompleteTask { id: Ulid },
    ReconcileRoom { id: Ulid },
    SelectRooms { id: Option<Ulid>, filter: RoomFilter },
    SelectGuests { id: Option<Ulid> },
    SelectStaff { id: Option<Ulid> },
    SelectBookings { id: Option<Ulid>, status: Option<BookingStatus> },
    SelectTasks { id: Option<Ulid>, filter: TaskFilter },
    SelectDashboard { today: Option<NaiveDate> },
    SelectRecentBookings,
    Listen { channel: String },
}

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    let trimmed = sql.trim();
    if trimmed.get(..7).is_some_and(|p| p.eq_ignore_ascii_case("LISTEN ")) {
        let channel = trimmed[7..].trim().trim_matches(';').trim().to_string();
        return Ok(Command::Listen { channel });
    }

    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    let Some(stmt) = stmts.first() else {
        return Err(SqlError::Empty);
    };

    match stmt {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => parse_update(table, assignments, selection),
        Statement::Delete(delete) => parse_delete(delete),
        Statement::Call(function) => parse_call(function),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

// ── INSERT ────────────────────────────────────────────────────

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = Table::from_name(&insert_table_name(insert)?)?;
    if table.is_view() {
        return Err(SqlError::ReadOnlyTable(table.name()));
    }
    let columns: Vec<String> = insert.columns.iter().map(|c| c.value.to_lowercase()).collect();
    if columns.is_empty() {
        return Err(SqlError::Parse("INSERT needs an explicit column list".into()));
    }
    let row = extract_insert_row(insert)?;
    if row.len() != columns.len() {
        return Err(SqlError::Parse(format!(
            "{} columns but {} values",
            columns.len(),
            row.len()
        )));
    }
    let fields = Fields::new(table, columns.into_iter().zip(row.iter()).collect(), &[])?
        .restrict(table.writable())?;

    match table {
        Table::Rooms => Ok(Command::InsertRoom(NewRoom {
            id: fields.id_or_new()?,
            number: parse_string(fields.required("room_number")?)?,
            room_type: parse_enum(fields.required("room_type")?)?,
            nightly_rate: parse_money(fields.required("price_per_night")?)?,
            capacity: parse_u32(fields.required("capacity")?)?,
            description: fields.opt_string("description")?,
            amenities: fields.amenities()?.unwrap_or_default(),
        })),
        Table::Guests => Ok(Command::InsertGuest(NewGuest {
            id: fields.id_or_new()?,
            first_name: parse_string(fields.required("first_name")?)?,
            last_name: parse_string(fields.required("last_name")?)?,
            email: parse_string(fields.required("email")?)?,
            phone: fields.opt_string("phone")?.unwrap_or_default(),
            address: fields.opt_string("address")?,
            id_number: fields.opt_string("id_number")?,
        })),
        Table::Staff => Ok(Command::InsertStaff(NewStaff {
            id: fields.id_or_new()?,
            username: parse_string(fields.required("username")?)?,
            credential_hash: parse_string(fields.required("password_hash")?)?,
            full_name: parse_string(fields.required("full_name")?)?,
            role: parse_enum(fields.required("role")?)?,
            email: parse_string(fields.required("email")?)?,
        })),
        Table::Bookings => {
            // Amount and status are derived on creation.
            for derived in ["total_amount", "status"] {
                if fields.get(derived).is_some() {
                    return Err(SqlError::ReadOnlyColumn("bookings", derived));
                }
            }
            Ok(Command::InsertBooking(NewBooking {
                id: fields.id_or_new()?,
                guest_id: parse_ulid(fields.required("guest_id")?)?,
                room_id: parse_ulid(fields.required("room_id")?)?,
                check_in: parse_date(fields.required("check_in_date")?)?,
                check_out: parse_date(fields.required("check_out_date")?)?,
                special_requests: fields.opt_string("special_requests")?,
            }))
        }
        Table::Housekeeping => Ok(Command::InsertTask(NewTask {
            id: fields.id_or_new()?,
            room_id: parse_ulid(fields.required("room_id")?)?,
            staff_id: fields.get("staff_id").map(parse_ulid_or_null).transpose()?.flatten(),
            task_type: parse_enum(fields.required("task_type")?)?,
            priority: fields.get("priority").map(parse_enum).transpose()?.unwrap_or(TaskPriority::Normal),
            status: fields.get("status").map(parse_enum).transpose()?.unwrap_or(TaskStatus::Pending),
            scheduled_date: parse_date(fields.required("scheduled_date")?)?,
            notes: fields.opt_string("notes")?,
        })),
        Table::Dashboard | Table::RecentBookings => unreachable!("views rejected above"),
    }
}

// ── UPDATE ────────────────────────────────────────────────────

fn parse_update(
    table: &ast::TableWithJoins,
    assignments: &[ast::Assignment],
    selection: &Option<Expr>,
) -> Result<Command, SqlError> {
    let table = Table::from_name(&table_factor_name(&table.relation)?)?;
    if table.is_view() {
        return Err(SqlError::ReadOnlyTable(table.name()));
    }
    let id = extract_where_id(selection)?;

    let mut pairs = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let column = match &assignment.target {
            AssignmentTarget::ColumnName(name) => {
                object_name_last(name).ok_or_else(|| SqlError::Parse("empty column name".into()))?
            }
            AssignmentTarget::Tuple(_) => {
                return Err(SqlError::Unsupported("tuple assignment".into()));
            }
        };
        pairs.push((column, &assignment.value));
    }

    let read_only: &[&'static str] = match table {
        Table::Rooms => &["id", "status"],
        Table::Bookings => &["id", "guest_id", "room_id"],
        Table::Housekeeping => &["id", "room_id"],
        _ => &["id"],
    };
    let fields = Fields::new(table, pairs, read_only)?.restrict(table.writable())?;

    match table {
        Table::Rooms => Ok(Command::UpdateRoom {
            id,
            patch: RoomPatch {
                number: fields.get("room_number").map(parse_string).transpose()?,
                room_type: fields.get("room_type").map(parse_enum).transpose()?,
                nightly_rate: fields.get("price_per_night").map(parse_money).transpose()?,
                capacity: fields.get("capacity").map(parse_u32).transpose()?,
                description: fields.get("description").map(parse_opt_string).transpose()?,
                amenities: fields.amenities()?,
            },
        }),
        Table::Guests => Ok(Command::UpdateGuest {
            id,
            patch: GuestPatch {
                first_name: fields.get("first_name").map(parse_string).transpose()?,
                last_name: fields.get("last_name").map(parse_string).transpose()?,
                email: fields.get("email").map(parse_string).transpose()?,
                phone: fields.get("phone").map(parse_string).transpose()?,
                address: fields.get("address").map(parse_opt_string).transpose()?,
                id_number: fields.get("id_number").map(parse_opt_string).transpose()?,
            },
        }),
        Table::Staff => Ok(Command::UpdateStaff {
            id,
            patch: StaffPatch {
                username: fields.get("username").map(parse_string).transpose()?,
                credential_hash: fields.get("password_hash").map(parse_string).transpose()?,
                full_name: fields.get("full_name").map(parse_string).transpose()?,
                role: fields.get("role").map(parse_enum).transpose()?,
                email: fields.get("email").map(parse_string).transpose()?,
            },
        }),
        Table::Bookings => Ok(Command::UpdateBooking {
            id,
            patch: BookingPatch {
                check_in: fields.get("check_in_date").map(parse_date).transpose()?,
                check_out: fields.get("check_out_date").map(parse_date).transpose()?,
                total_amount: fields.get("total_amount").map(parse_money).transpose()?,
                special_requests: fields.get("special_requests").map(parse_opt_string).transpose()?,
                status: fields.get("status").map(parse_enum).transpose()?,
            },
        }),
        Table::Housekeeping => Ok(Command::UpdateTask {
            id,
            patch: TaskPatch {
                staff_id: fields.get("staff_id").map(parse_ulid_or_null).transpose()?,
                task_type: fields.get("task_type").map(parse_enum).transpose()?,
                priority: fields.get("priority").map(parse_enum).transpose()?,
                status: fields.get("status").map(parse_enum).transpose()?,
                scheduled_date: fields.get("scheduled_date").map(parse_date).transpose()?,
                notes: fields.get("notes").map(parse_opt_string).transpose()?,
            },
        }),
        Table::Dashboard | Table::RecentBookings => unreachable!("views rejected above"),
    }
}

// ── DELETE ────────────────────────────────────────────────────

fn parse_delete(delete: &ast::Delete) -> Result<Command, SqlError> {
    let table = Table::from_name(&delete_table_name(delete)?)?;
    let id = extract_where_id(&delete.selection)?;

    match table {
        Table::Rooms => Ok(Command::DeleteRoom { id }),
        Table::Guests => Ok(Command::DeleteGuest { id }),
        Table::Staff => Ok(Command::DeleteStaff { id }),
        Table::Bookings => Ok(Command::DeleteBooking { id }),
        Table::Housekeeping => Ok(Command::DeleteTask { id }),
        Table::Dashboard | Table::RecentBookings => Err(SqlError::ReadOnlyTable(table.name())),
    }
}

// ── CALL ──────────────────────────────────────────────────────

fn parse_call(function: &ast::Function) -> Result<Command, SqlError> {
    let name = object_name_last(&function.name)
        .ok_or_else(|| SqlError::Parse("empty procedure name".into()))?;
    let args: Vec<&Expr> = match &function.args {
        FunctionArguments::None => Vec::new(),
        FunctionArguments::List(list) => list
            .args
            .iter()
            .map(|arg| match arg {
                FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => Ok(expr),
                _ => Err(SqlError::Unsupported("named or wildcard argument".into())),
            })
            .collect::<Result<_, _>>()?,
        FunctionArguments::Subquery(_) => {
            return Err(SqlError::Unsupported("subquery argument".into()));
        }
    };

    let (procedure, arity): (&'static str, usize) = match name.as_str() {
        "checkout" => ("checkout", 1),
        "cancel_booking" => ("cancel_booking", 1),
        "set_maintenance" => ("set_maintenance", 2),
        "complete_task" => ("complete_task", 1),
        "reconcile_room" => ("reconcile_room", 1),
        _ => return Err(SqlError::UnknownProcedure(name.clone())),
    };
    if args.len() != arity {
        return Err(SqlError::WrongArity(procedure, arity, args.len()));
    }

    let id = parse_ulid(args[0])?;
    Ok(match procedure {
        "checkout" => Command::Checkout { id },
        "cancel_booking" => Command::CancelBooking { id },
        "set_maintenance" => Command::SetMaintenance {
            room_id: id,
            on: parse_bool(args[1])?,
        },
        "complete_task" => Command::CompleteTask { id },
        _ => Command::ReconcileRoom { id },
    })
}

// ── SELECT ────────────────────────────────────────────────────

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    if select.from.is_empty() {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    }
    let table = Table::from_name(&table_factor_name(&select.from[0].relation)?)?;

    let mut filters = Vec::new();
    if let Some(selection) = &select.selection {
        collect_eq_filters(selection, &mut filters)?;
    }
    let allowed: &[&str] = match table {
        Table::Rooms => &["id", "status", "room_type"],
        Table::Bookings => &["id", "status"],
        Table::Housekeeping => &["id", "status", "room_id"],
        Table::Guests | Table::Staff => &["id"],
        Table::Dashboard => &["today"],
        Table::RecentBookings => &[],
    };
    let fields = Fields::new(table, filters, &[])?.restrict(allowed)?;
    let id = fields.get("id").map(parse_ulid).transpose()?;

    Ok(match table {
        Table::Rooms => Command::SelectRooms {
            id,
            filter: RoomFilter {
                status: fields.get("status").map(parse_enum).transpose()?,
                room_type: fields.get("room_type").map(parse_enum).transpose()?,
            },
        },
        Table::Guests => Command::SelectGuests { id },
        Table::Staff => Command::SelectStaff { id },
        Table::Bookings => Command::SelectBookings {
            id,
            status: fields.get("status").map(parse_enum).transpose()?,
        },
        Table::Housekeeping => Command::SelectTasks {
            id,
            filter: TaskFilter {
                status: fields.get("status").map(parse_enum).transpose()?,
                room_id: fields.get("room_id").map(parse_ulid).transpose()?,
            },
        },
        Table::Dashboard => Command::SelectDashboard {
            today: fields.get("today").map(parse_date).transpose()?,
        },
        Table::RecentBookings => Command::SelectRecentBookings,
    })
}

/// Flatten `a = x AND b = y ...` into (column, value) pairs.
fn collect_eq_filters<'a>(expr: &'a Expr, out: &mut Vec<(String, &'a Expr)>) -> Result<(), SqlError> {
    match expr {
        Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::And,
            right,
        } => {
            collect_eq_filters(left, out)?;
            collect_eq_filters(right, out)
        }
        Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::Eq,
            right,
        } => {
            let col = expr_column_name(left)
                .ok_or_else(|| SqlError::Unsupported(format!("filter on {left}")))?;
            out.push((col, right.as_ref()));
            Ok(())
        }
        Expr::Nested(inner) => collect_eq_filters(inner, out),
        other => Err(SqlError::Unsupported(format!("filter {other}"))),
    }
}

// ── Column/value mapping ──────────────────────────────────────

/// Column → value for one INSERT row, UPDATE SET list or WHERE clause.
struct Fields<'a> {
    table: Table,
    values: Vec<(String, &'a Expr)>,
}

impl<'a> Fields<'a> {
    fn new(table: Table, values: Vec<(String, &'a Expr)>, read_only: &[&'static str]) -> Result<Self, SqlError> {
        for (i, (col, _)) in values.iter().enumerate() {
            if let Some(ro) = read_only.iter().find(|ro| **ro == col.as_str()) {
                return Err(SqlError::ReadOnlyColumn(table.name(), *ro));
            }
            if values[..i].iter().any(|(c, _)| c == col) {
                return Err(SqlError::Parse(format!("column {col} given twice")));
            }
        }
        Ok(Self { table, values })
    }

    fn restrict(self, allowed: &[&str]) -> Result<Self, SqlError> {
        if let Some((col, _)) = self.values.iter().find(|(c, _)| !allowed.contains(&c.as_str())) {
            return Err(SqlError::UnknownColumn(self.table.name(), col.clone()));
        }
        Ok(self)
    }

    fn get(&self, col: &str) -> Option<&'a Expr> {
        self.values.iter().find(|(c, _)| c == col).map(|(_, e)| *e)
    }

    fn required(&self, col: &'static str) -> Result<&'a Expr, SqlError> {
        self.get(col).ok_or(SqlError::MissingColumn(self.table.name(), col))
    }

    fn id_or_new(&self) -> Result<Ulid, SqlError> {
        Ok(self.get("id").map(parse_ulid).transpose()?.unwrap_or_else(Ulid::new))
    }

    fn opt_string(&self, col: &str) -> Result<Option<String>, SqlError> {
        Ok(self.get(col).map(parse_opt_string).transpose()?.flatten())
    }

    /// `amenities` as comma-separated text.
    fn amenities(&self) -> Result<Option<Vec<String>>, SqlError> {
        let Some(expr) = self.get("amenities") else {
            return Ok(None);
        };
        let text = parse_opt_string(expr)?.unwrap_or_default();
        Ok(Some(
            text.split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect(),
        ))
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn delete_table_name(delete: &ast::Delete) -> Result<String, SqlError> {
    let tables_with_joins = match &delete.from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    if let Some(first) = tables_with_joins.first() {
        table_factor_name(&first.relation)
    } else {
        Err(SqlError::Parse("DELETE without table".into()))
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn extract_insert_row(insert: &ast::Insert) -> Result<&[Expr], SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => match values.rows.as_slice() {
            [row] => Ok(row.as_slice()),
            [] => Err(SqlError::Parse("empty VALUES".into())),
            _ => Err(SqlError::Unsupported("multi-row INSERT".into())),
        },
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn extract_where_id(selection: &Option<Expr>) -> Result<Ulid, SqlError> {
    let sel = selection.as_ref().ok_or(SqlError::MissingFilter("id"))?;
    match sel {
        Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::Eq,
            right,
        } => {
            if expr_column_name(left).as_deref() == Some("id") {
                parse_ulid(right)
            } else {
                Err(SqlError::MissingFilter("id"))
            }
        }
        _ => Err(SqlError::MissingFilter("id")),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        Expr::Cast { expr, .. } | Expr::Nested(expr) => extract_value(expr),
        _ => None,
    }
}

/// Text literal; bare numbers are accepted too (room numbers, phones).
fn parse_string(expr: &Expr) -> Result<String, SqlError> {
    match extract_value(expr) {
        Some(Value::SingleQuotedString(s)) | Some(Value::Number(s, _)) => Ok(s.clone()),
        Some(other) => Err(SqlError::Parse(format!("expected string, got {other}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

fn parse_opt_string(expr: &Expr) -> Result<Option<String>, SqlError> {
    match extract_value(expr) {
        Some(Value::Null) => Ok(None),
        _ => parse_string(expr).map(Some),
    }
}

fn parse_enum<T>(expr: &Expr) -> Result<T, SqlError>
where
    T: std::str::FromStr<Err = UnknownVariant>,
{
    parse_string(expr)?
        .parse()
        .map_err(|e: UnknownVariant| SqlError::Parse(e.to_string()))
}

fn parse_ulid(expr: &Expr) -> Result<Ulid, SqlError> {
    let s = parse_string(expr)?;
    Ulid::from_string(&s).map_err(|e| SqlError::Parse(format!("bad ULID {s}: {e}")))
}

fn parse_ulid_or_null(expr: &Expr) -> Result<Option<Ulid>, SqlError> {
    match extract_value(expr) {
        Some(Value::Null) => Ok(None),
        _ => parse_ulid(expr).map(Some),
    }
}

fn parse_date(expr: &Expr) -> Result<NaiveDate, SqlError> {
    let s = parse_string(expr)?;
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| SqlError::Parse(format!("bad date {s}: {e}")))
}

fn parse_i64(expr: &Expr) -> Result<i64, SqlError> {
    if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        return Ok(-parse_i64(expr)?);
    }
    match extract_value(expr) {
        Some(Value::Number(s, _)) | Some(Value::SingleQuotedString(s)) => s
            .trim()
            .parse()
            .map_err(|e| SqlError::Parse(format!("bad integer {s}: {e}"))),
        Some(other) => Err(SqlError::Parse(format!("expected number, got {other}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

fn parse_money(expr: &Expr) -> Result<Money, SqlError> {
    let v = parse_i64(expr)?;
    Money::try_from(v).map_err(|_| SqlError::Parse(format!("amount {v} must not be negative")))
}

fn parse_u32(expr: &Expr) -> Result<u32, SqlError> {
    let v = parse_i64(expr)?;
    u32::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of u32 range")))
}

fn parse_bool(expr: &Expr) -> Result<bool, SqlError> {
    match extract_value(expr) {
        Some(Value::Boolean(b)) => Ok(*b),
        Some(Value::SingleQuotedString(s)) => match s.to_lowercase().as_str() {
            "true" | "t" | "on" | "1" => Ok(true),
            "false" | "f" | "off" | "0" => Ok(false),
            _ => Err(SqlError::Parse(format!("bad bool: {s}"))),
        },
        Some(Value::Number(n, _)) => Ok(n != "0"),
        Some(other) => Err(SqlError::Parse(format!("expected bool, got {other}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    ReadOnlyTable(&'static str),
    UnknownColumn(&'static str, String),
    MissingColumn(&'static str, &'static str),
    ReadOnlyColumn(&'static str, &'static str),
    UnknownProcedure(String),
    WrongArity(&'static str, usize, usize),
    MissingFilter(&'static str),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::ReadOnlyTable(t) => write!(f, "{t} is read-only"),
            SqlError::UnknownColumn(t, c) => write!(f, "{t}: unknown column {c}"),
            SqlError::MissingColumn(t, c) => write!(f, "{t}: missing column {c}"),
            SqlError::ReadOnlyColumn(t, c) => write!(f, "{t}: column {c} cannot be written"),
            SqlError::UnknownProcedure(p) => write!(f, "unknown procedure: {p}"),
            SqlError::WrongArity(p, expected, got) => {
                write!(f, "{p}: expected {expected} arguments, got {got}")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
        }
    }
}

impl std::error::Error for SqlError {}
