use std::collections::{HashMap, VecDeque};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Bounds the number of simultaneously open output files (spec §4.13).
/// High-cardinality label sets can otherwise produce one file per source
/// and exhaust the process's file descriptor limit.
pub struct FdLru {
    capacity: usize,
    state: Mutex<State>,
}

struct State {
    open: HashMap<PathBuf, File>,
    order: VecDeque<PathBuf>,
}

impl FdLru {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(State {
                open: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Runs `write` with a handle to `path`, opening (and evicting the
    /// least-recently-used handle, if at capacity) as needed.
    pub fn with_file<R>(&self, path: &Path, write: impl FnOnce(&mut File) -> std::io::Result<R>) -> std::io::Result<R> {
        let mut state = self.state.lock();

        if !state.open.contains_key(path) {
            if state.open.len() >= self.capacity {
                if let Some(evicted) = state.order.pop_front() {
                    state.open.remove(&evicted);
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            state.open.insert(path.to_path_buf(), file);
        } else {
            state.order.retain(|p| p != path);
        }
        state.order.push_back(path.to_path_buf());

        let file = state.open.get_mut(path).expect("just inserted or already present");
        write(file)
    }

    pub fn close(&self, path: &Path) {
        let mut state = self.state.lock();
        state.open.remove(path);
        state.order.retain(|p| p != path);
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().open.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn evicts_least_recently_used_beyond_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let lru = FdLru::new(2);

        for name in ["a.log", "b.log", "c.log"] {
            let path = dir.path().join(name);
            lru.with_file(&path, |f| f.write_all(b"x")).unwrap();
        }

        assert_eq!(lru.open_count(), 2);
    }

    #[test]
    fn reopening_works_after_eviction() {
        let dir = tempfile::tempdir().unwrap();
        let lru = FdLru::new(1);
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");

        lru.with_file(&a, |f| f.write_all(b"1")).unwrap();
        lru.with_file(&b, |f| f.write_all(b"1")).unwrap();
        lru.with_file(&a, |f| f.write_all(b"2")).unwrap();

        let contents = std::fs::read_to_string(&a).unwrap();
        assert_eq!(contents, "12");
    }
}
