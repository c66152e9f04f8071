// src/publisher.rs
//! Read-only access to the current fix for the web layer and viewers

use crate::gps::{Fix, FixStore};
use serde_json::{json, Value};

/// Snapshot reader handed to everything that serves the fix.
///
/// Reads never block on the receiver and never fail: before any data arrives
/// they return the all-zero record.
#[derive(Debug, Clone)]
pub struct Publisher {
    store: FixStore,
}

impl Publisher {
    pub fn new(store: FixStore) -> Self {
        Self { store }
    }

    pub fn current_fix(&self) -> Fix {
        self.store.snapshot()
    }

    /// The current fix as the key/value record served to clients
    pub fn current_fix_json(&self) -> Value {
        let fix = self.current_fix();
        json!({
            "latitude": fix.latitude,
            "longitude": fix.longitude,
            "speed": fix.speed,
            "timestamp": fix.timestamp,
            "satellites": fix.satellites,
            "altitude": fix.altitude,
            "fix_quality": fix.fix_quality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::parse_sentence;

    #[test]
    fn test_sentinel_record_before_data() {
        let publisher = Publisher::new(FixStore::new());
        let record = publisher.current_fix_json();

        assert_eq!(record["latitude"], 0.0);
        assert_eq!(record["longitude"], 0.0);
        assert_eq!(record["speed"], 0.0);
        assert_eq!(record["altitude"], 0.0);
        assert_eq!(record["satellites"], 0);
        assert_eq!(record["fix_quality"], 0);
        assert_eq!(record["timestamp"], "");
        assert_eq!(record.as_object().map(|o| o.len()), Some(7));
    }

    #[test]
    fn test_record_tracks_store() {
        let store = FixStore::new();
        let publisher = Publisher::new(store.clone());

        let gga = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
        store.update(&parse_sentence(gga).unwrap());

        let record = publisher.current_fix_json();
        assert_eq!(record["satellites"], 8);
        assert_eq!(record["altitude"], 545.4);
        assert_eq!(record["timestamp"], "12:35:19");
    }

    #[test]
    fn test_json_matches_serde_form() {
        let store = FixStore::new();
        store.replace(Fix {
            latitude: 40.785091,
            longitude: -73.968285,
            speed: 3.5,
            timestamp: "2024-05-01 10:00:00".to_string(),
            satellites: 7,
            altitude: 51.0,
            fix_quality: 2,
        });

        let publisher = Publisher::new(store);
        let via_serde = serde_json::to_value(publisher.current_fix()).unwrap();
        assert_eq!(publisher.current_fix_json(), via_serde);
    }
}
