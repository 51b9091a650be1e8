use std::sync::Arc;

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use ulid::Ulid;

use innkeep::engine::ledger::compute_status;
use innkeep::engine::{Engine, NewBooking, NewGuest, NewRoom, NewTask, TaskFilter};
use innkeep::model::*;
use innkeep::notify::NotifyHub;

const ROOMS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Book { room: usize, start: u64, nights: u64 },
    Checkout(usize),
    Cancel(usize),
    DeleteBooking(usize),
    SetMaintenance { room: usize, on: bool },
    OpenRepair(usize),
    CompleteTask(usize),
    DeleteTask(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..ROOMS, 0u64..60, 1u64..10).prop_map(|(room, start, nights)| Op::Book { room, start, nights }),
        2 => any::<usize>().prop_map(Op::Checkout),
        2 => any::<usize>().prop_map(Op::Cancel),
        1 => any::<usize>().prop_map(Op::DeleteBooking),
        2 => (0..ROOMS, any::<bool>()).prop_map(|(room, on)| Op::SetMaintenance { room, on }),
        1 => (0..ROOMS).prop_map(Op::OpenRepair),
        2 => any::<usize>().prop_map(Op::CompleteTask),
        1 => any::<usize>().prop_map(Op::DeleteTask),
    ]
}

fn pick(ids: &[Ulid], i: usize) -> Option<Ulid> {
    (!ids.is_empty()).then(|| ids[i % ids.len()])
}

/// Materialized status matches the status derived from bookings and the
/// maintenance override, and no room holds two confirmed bookings.
async fn assert_consistent(engine: &Engine, rooms: &[Ulid]) {
    let bookings = engine.list_bookings(None).await;
    for &room_id in rooms {
        let room = engine.room(room_id).await.unwrap();
        let held: Vec<Booking> = bookings
            .iter()
            .filter(|v| v.booking.room_id == room_id)
            .map(|v| v.booking.clone())
            .collect();
        let open_repair = engine
            .list_tasks(&TaskFilter {
                status: None,
                room_id: Some(room_id),
            })
            .await
            .iter()
            .any(HousekeepingTask::holds_room);

        let expected = compute_status(room.manual_maintenance || open_repair, &held);
        assert_eq!(room.status, expected, "room {}", room.number);
        let confirmed = held
            .iter()
            .filter(|b| b.status == BookingStatus::Confirmed)
            .count();
        assert!(confirmed <= 1, "room {} has {confirmed} confirmed bookings", room.number);
    }
}

async fn run(ops: Vec<Op>) {
    let engine = Engine::ephemeral(Arc::new(NotifyHub::new()));
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let mut rooms = Vec::new();
    for n in 0..ROOMS {
        let room = engine
            .create_room(NewRoom {
                id: Ulid::new(),
                number: format!("{}", 101 + n),
                room_type: RoomType::Double,
                nightly_rate: 100_000,
                capacity: 2,
                description: None,
                amenities: vec![],
            })
            .await
            .unwrap();
        rooms.push(room.id);
    }
    let guest = engine
        .create_guest(NewGuest {
            id: Ulid::new(),
            first_name: "Prop".into(),
            last_name: "Test".into(),
            email: "prop@example.com".into(),
            phone: "0".into(),
            address: None,
            id_number: None,
        })
        .await
        .unwrap();

    let mut bookings = Vec::new();
    let mut tasks = Vec::new();
    for op in ops {
        match op {
            Op::Book { room, start, nights } => {
                let check_in = base + Days::new(start);
                let req = NewBooking {
                    id: Ulid::new(),
                    guest_id: guest.id,
                    room_id: rooms[room],
                    check_in,
                    check_out: check_in + Days::new(nights),
                    special_requests: None,
                };
                if let Ok(b) = engine.create_booking(req).await {
                    bookings.push(b.id);
                }
            }
            Op::Checkout(i) => {
                if let Some(id) = pick(&bookings, i) {
                    let _ = engine.checkout(id).await;
                }
            }
            Op::Cancel(i) => {
                if let Some(id) = pick(&bookings, i) {
                    let _ = engine.cancel_booking(id).await;
                }
            }
            Op::DeleteBooking(i) => {
                if let Some(id) = pick(&bookings, i) {
                    engine.delete_booking(id).await.unwrap();
                    bookings.retain(|b| *b != id);
                }
            }
            Op::SetMaintenance { room, on } => {
                engine.set_maintenance(rooms[room], on).await.unwrap();
            }
            Op::OpenRepair(room) => {
                let task = engine
                    .create_task(NewTask {
                        id: Ulid::new(),
                        room_id: rooms[room],
                        staff_id: None,
                        task_type: TaskType::Maintenance,
                        priority: TaskPriority::High,
                        status: TaskStatus::Pending,
                        scheduled_date: base,
                        notes: None,
                    })
                    .await
                    .unwrap();
                tasks.push(task.id);
            }
            Op::CompleteTask(i) => {
                if let Some(id) = pick(&tasks, i) {
                    engine.complete_task(id).await.unwrap();
                }
            }
            Op::DeleteTask(i) => {
                if let Some(id) = pick(&tasks, i) {
                    engine.delete_task(id).await.unwrap();
                    tasks.retain(|t| *t != id);
                }
            }
        }
        assert_consistent(&engine, &rooms).await;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn status_always_matches_ledger(ops in prop::collection::vec(op(), 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(run(ops));
    }
}
