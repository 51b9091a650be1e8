use tracing::info;
use ulid::Ulid;

use crate::engine::{Engine, EngineError, NewRoom, RoomFilter};
use crate::model::{Money, RoomType};

struct SampleRoom {
    number: &'static str,
    room_type: RoomType,
    nightly_rate: Money,
    capacity: u32,
    description: &'static str,
    amenities: &'static str,
    maintenance: bool,
}

fn sample_rooms() -> Vec<SampleRoom> {
    let room = |number, room_type, nightly_rate, capacity, description, amenities| SampleRoom {
        number,
        room_type,
        nightly_rate,
        capacity,
        description,
        amenities,
        maintenance: false,
    };
    vec![
        room("101", RoomType::Single, 80_000, 1, "Cozy single room with city view", "WiFi,TV,AC"),
        room("102", RoomType::Single, 80_000, 1, "Comfortable single room", "WiFi,TV,AC"),
        room("201", RoomType::Double, 120_000, 2, "Spacious double room with balcony", "WiFi,TV,AC,Balcony"),
        room("202", RoomType::Double, 120_000, 2, "Modern double room", "WiFi,TV,AC,Minibar"),
        room("301", RoomType::Suite, 250_000, 4, "Luxury suite with ocean view", "WiFi,TV,AC,Balcony,Minibar,Jacuzzi"),
        room("302", RoomType::Suite, 250_000, 4, "Presidential suite", "WiFi,TV,AC,Balcony,Minibar,Jacuzzi,Kitchen"),
        room("103", RoomType::Single, 80_000, 1, "Budget-friendly single room", "WiFi,TV"),
        room("203", RoomType::Double, 120_000, 2, "Family-friendly double room", "WiFi,TV,AC"),
        // Created available: an occupied room needs a booking to justify it.
        room("204", RoomType::Double, 120_000, 2, "Deluxe double room", "WiFi,TV,AC,Minibar"),
        SampleRoom {
            maintenance: true,
            ..room("303", RoomType::Suite, 250_000, 4, "Royal suite under renovation", "WiFi,TV,AC,Balcony,Minibar")
        },
    ]
}

/// Create the sample inventory if the store has no rooms. Returns the
/// number of rooms created.
pub async fn seed_rooms(engine: &Engine) -> Result<usize, EngineError> {
    if !engine.list_rooms(&RoomFilter::default()).await.is_empty() {
        return Ok(0);
    }
    let samples = sample_rooms();
    let count = samples.len();
    for sample in samples {
        let room = engine
            .create_room(NewRoom {
                id: Ulid::new(),
                number: sample.number.into(),
                room_type: sample.room_type,
                nightly_rate: sample.nightly_rate,
                capacity: sample.capacity,
                description: Some(sample.description.into()),
                amenities: sample.amenities.split(',').map(String::from).collect(),
            })
            .await?;
        if sample.maintenance {
            engine.set_maintenance(room.id, true).await?;
        }
    }
    info!("seeded {count} sample rooms");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::OccupancyStatus;
    use crate::notify::NotifyHub;

    #[tokio::test]
    async fn seeds_inventory_once() {
        let engine = Engine::ephemeral(Arc::new(NotifyHub::new()));
        assert_eq!(seed_rooms(&engine).await.unwrap(), 10);
        assert_eq!(seed_rooms(&engine).await.unwrap(), 0);

        let rooms = engine.list_rooms(&RoomFilter::default()).await;
        assert_eq!(rooms.len(), 10);
        assert_eq!(rooms[0].number, "101");

        let maintenance: Vec<_> = rooms
            .iter()
            .filter(|r| r.status == OccupancyStatus::Maintenance)
            .map(|r| r.number.as_str())
            .collect();
        assert_eq!(maintenance, vec!["303"]);

        let r204 = rooms.iter().find(|r| r.number == "204").unwrap();
        assert_eq!(r204.status, OccupancyStatus::Available);
        assert_eq!(r204.amenities, vec!["WiFi", "TV", "AC", "Minibar"]);
    }
}
