use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use logwarden_model::LogEntry;

/// Fingerprints and suppresses duplicate entries within a trailing time
/// window (spec §4.7). Duplicates are detected on content, not identity:
/// two entries with the same source, message, and labels within the same
/// `time_quantum` bucket collide even if captured independently.
///
/// A single mutex guards both the map and the eviction queue; check-and-
/// insert has to be atomic or two racing duplicates both get admitted.
pub struct Deduplicator {
    ttl: Duration,
    time_quantum: Duration,
    capacity: usize,
    state: Mutex<State>,
}

struct State {
    seen: HashMap<u64, Instant>,
    order: VecDeque<u64>,
}

impl Deduplicator {
    pub fn new(capacity: usize, ttl: Duration, time_quantum: Duration) -> Self {
        Self {
            ttl,
            time_quantum: time_quantum.max(Duration::from_millis(1)),
            capacity: capacity.max(1),
            state: Mutex::new(State {
                seen: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
        }
    }

    fn fingerprint(&self, entry: &LogEntry) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        entry.source_type.hash(&mut hasher);
        entry.source_id.hash(&mut hasher);
        entry.message.as_bytes().hash(&mut hasher);
        for (k, v) in &entry.labels {
            k.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        let bucket = entry.timestamp.timestamp_millis() / self.time_quantum.as_millis().max(1) as i64;
        bucket.hash(&mut hasher);
        hasher.finish()
    }

    /// Returns `true` if this entry was already seen within the TTL window
    /// and should be dropped; records it as seen either way.
    pub fn check_and_record(&self, entry: &LogEntry) -> bool {
        let fp = self.fingerprint(entry);
        let now = Instant::now();
        let mut state = self.state.lock();

        self.evict_expired(&mut state, now);

        if let Some(seen_at) = state.seen.get(&fp) {
            if now.duration_since(*seen_at) < self.ttl {
                return true;
            }
        }

        if state.seen.len() >= self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.seen.remove(&oldest);
            }
        }

        state.seen.insert(fp, now);
        state.order.push_back(fp);
        false
    }

    fn evict_expired(&self, state: &mut State, now: Instant) {
        while let Some(&front) = state.order.front() {
            match state.seen.get(&front) {
                Some(seen_at) if now.duration_since(*seen_at) >= self.ttl => {
                    state.order.pop_front();
                    state.seen.remove(&front);
                }
                _ => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logwarden_model::SourceType;

    fn entry(message: &str) -> LogEntry {
        LogEntry::new(SourceType::File, "source-1", message, Default::default())
    }

    #[test]
    fn second_identical_entry_is_duplicate() {
        let dedup = Deduplicator::new(100, Duration::from_secs(60), Duration::from_secs(1));
        assert!(!dedup.check_and_record(&entry("hello")));
        assert!(dedup.check_and_record(&entry("hello")));
    }

    #[test]
    fn distinct_messages_are_not_duplicates() {
        let dedup = Deduplicator::new(100, Duration::from_secs(60), Duration::from_secs(1));
        assert!(!dedup.check_and_record(&entry("hello")));
        assert!(!dedup.check_and_record(&entry("world")));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let dedup = Deduplicator::new(2, Duration::from_secs(60), Duration::from_secs(1));
        assert!(!dedup.check_and_record(&entry("a")));
        assert!(!dedup.check_and_record(&entry("b")));
        assert!(!dedup.check_and_record(&entry("c")));
        assert_eq!(dedup.len(), 2);
        // "a" was evicted to make room for "c", so it is no longer flagged.
        assert!(!dedup.check_and_record(&entry("a")));
    }

    #[test]
    fn ttl_expiry_allows_repeat() {
        let dedup = Deduplicator::new(100, Duration::from_millis(5), Duration::from_millis(1));
        assert!(!dedup.check_and_record(&entry("hello")));
        std::thread::sleep(Duration::from_millis(20));
        assert!(!dedup.check_and_record(&entry("hello")));
    }
}
