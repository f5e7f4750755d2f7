use crate::schema::AutoIdStrategy;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Produces one unique, non-empty identifier per inserted record.
pub trait IdGenerator {
    fn next_id(&self) -> String;
}

type Clock = Box<dyn Fn() -> u64 + Send + Sync>;

/// Hex-encoded millisecond timestamps. Two calls within the same
/// millisecond bump the timestamp forward so ids stay unique within a
/// process.
pub struct TimestampIds {
    clock: Clock,
    last: Mutex<u64>,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self::with_clock(Box::new(now_millis))
    }

    /// Use a caller-supplied millisecond clock. Ids are deterministic
    /// for a fixed clock.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            last: Mutex::new(0),
        }
    }
}

impl Default for TimestampIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for TimestampIds {
    fn next_id(&self) -> String {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let now = (self.clock)();
        let millis = if now > *last { now } else { *last + 1 };
        *last = millis;
        format!("{millis:x}")
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct UlidIds;

impl IdGenerator for UlidIds {
    fn next_id(&self) -> String {
        ulid::Ulid::new().to_string().to_lowercase()
    }
}

pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

pub struct NanoIds;

impl IdGenerator for NanoIds {
    fn next_id(&self) -> String {
        nanoid::nanoid!()
    }
}

/// Build the generator for a collection's declared strategy.
pub fn generator_for(strategy: AutoIdStrategy) -> Box<dyn IdGenerator + Send + Sync> {
    match strategy {
        AutoIdStrategy::Timestamp => Box::new(TimestampIds::new()),
        AutoIdStrategy::Ulid => Box::new(UlidIds),
        AutoIdStrategy::Uuid => Box::new(UuidIds),
        AutoIdStrategy::Nanoid => Box::new(NanoIds),
    }
}
