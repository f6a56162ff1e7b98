//! Snowflake ID Generator
//!
//! Time-sortable 64-bit ids: 41 bits of milliseconds since the service
//! epoch, 5 bits machine, 5 bits node, 12 bits sequence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Service epoch (2024-01-01T00:00:00.000Z)
const SKILLSWAP_EPOCH: u64 = 1704067200000;

const TIMESTAMP_SHIFT: u64 = 22;
const MACHINE_SHIFT: u64 = 17;
const NODE_SHIFT: u64 = 12;
const WORKER_MASK: u64 = 0x1F;
const SEQUENCE_MASK: u64 = 0xFFF;

/// Snowflake ID generator
pub struct SnowflakeGenerator {
    machine_id: u64,
    node_id: u64,
    sequence: AtomicU64,
    last_timestamp: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a generator for one worker. Ids above five bits are truncated.
    pub fn new(machine_id: u64, node_id: u64) -> Self {
        Self {
            machine_id: machine_id & WORKER_MASK,
            node_id: node_id & WORKER_MASK,
            sequence: AtomicU64::new(0),
            last_timestamp: AtomicU64::new(0),
        }
    }

    /// Generate the next id. The sequence counter increments within a
    /// millisecond and resets when the clock moves forward.
    pub fn generate(&self) -> i64 {
        let now = unix_millis();

        let sequence = if now == self.last_timestamp.load(Ordering::SeqCst) {
            self.sequence.fetch_add(1, Ordering::SeqCst) & SEQUENCE_MASK
        } else {
            self.last_timestamp.store(now, Ordering::SeqCst);
            self.sequence.store(0, Ordering::SeqCst);
            0
        };

        let id = ((now - SKILLSWAP_EPOCH) << TIMESTAMP_SHIFT)
            | (self.machine_id << MACHINE_SHIFT)
            | (self.node_id << NODE_SHIFT)
            | sequence;

        id as i64
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

/// Recover the creation timestamp (unix millis) from an id
pub fn extract_timestamp(snowflake: i64) -> u64 {
    ((snowflake as u64) >> TIMESTAMP_SHIFT) + SKILLSWAP_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique() {
        let gen = SnowflakeGenerator::new(1, 1);
        assert_ne!(gen.generate(), gen.generate());
    }

    #[test]
    fn test_extract_timestamp() {
        let gen = SnowflakeGenerator::new(1, 1);
        let ts = extract_timestamp(gen.generate());
        let now = unix_millis();
        assert!(ts <= now);
        assert!(ts > now - 1000); // Within 1 second
    }

    #[test]
    fn test_worker_bits_land_in_the_id() {
        let gen = SnowflakeGenerator::new(7, 3);
        let id = gen.generate() as u64;
        assert_eq!((id >> MACHINE_SHIFT) & WORKER_MASK, 7);
        assert_eq!((id >> NODE_SHIFT) & WORKER_MASK, 3);
    }

    #[test]
    fn test_ids_are_monotonic_within_a_worker() {
        let gen = SnowflakeGenerator::new(2, 3);
        let mut prev = gen.generate();
        for _ in 0..50 {
            let next = gen.generate();
            assert!(next > prev);
            prev = next;
        }
    }
}
