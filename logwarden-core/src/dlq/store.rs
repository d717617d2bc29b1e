use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use logwarden_config::DlqConfig;
use logwarden_model::DlqEntry;

const SEGMENT_PREFIX: &str = "segment-";
const SEGMENT_SUFFIX: &str = ".jsonl";

/// Durable, disk-backed, append-only store for entries every sink rejected
/// permanently (spec §4.8). Segmented so a single file never grows
/// unbounded and so replay can drop whole segments once they're exhausted
/// instead of rewriting one giant file per entry.
pub struct DlqStore {
    dir: PathBuf,
    segment_max_bytes: u64,
    max_entries: usize,
    inner: Mutex<Inner>,
    entry_count: AtomicUsize,
}

struct Inner {
    active_path: PathBuf,
    active_file: File,
    active_size: u64,
    next_segment_id: u64,
}

impl DlqStore {
    pub fn open(config: &DlqConfig) -> anyhow::Result<Self> {
        fs::create_dir_all(&config.directory)?;

        let mut existing = Self::list_segments(&config.directory)?;
        existing.sort();

        let entry_count = existing
            .iter()
            .map(|p| count_lines(p).unwrap_or(0))
            .sum();

        let next_segment_id = existing
            .iter()
            .filter_map(|p| segment_id(p))
            .max()
            .map(|n| n + 1)
            .unwrap_or(0);

        let active_path = segment_path(&config.directory, next_segment_id);
        let active_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&active_path)?;

        Ok(Self {
            dir: config.directory.clone(),
            segment_max_bytes: config.segment_max_bytes,
            max_entries: config.max_entries,
            inner: Mutex::new(Inner {
                active_path,
                active_file,
                active_size: 0,
                next_segment_id: next_segment_id + 1,
            }),
            entry_count: AtomicUsize::new(entry_count),
        })
    }

    fn list_segments(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(SEGMENT_PREFIX) && n.ends_with(SEGMENT_SUFFIX))
            {
                out.push(path);
            }
        }
        Ok(out)
    }

    /// Appends one entry, rotating the active segment if it would exceed
    /// `segment_max_bytes`, and evicting the oldest segment if the store
    /// is at `max_entries` capacity. Eviction is oldest-first: a full DLQ
    /// drops the entries least likely to still be actionable.
    pub fn append(&self, entry: &DlqEntry) -> anyhow::Result<()> {
        let line = serde_json::to_string(entry)?;
        let mut inner = self.inner.lock();

        if inner.active_size > 0 && inner.active_size + line.len() as u64 > self.segment_max_bytes
        {
            self.rotate(&mut inner)?;
        }

        writeln!(inner.active_file, "{line}")?;
        inner.active_size += line.len() as u64 + 1;
        drop(inner);

        if self.entry_count.fetch_add(1, Ordering::AcqRel) + 1 > self.max_entries {
            self.evict_oldest()?;
        }

        Ok(())
    }

    fn rotate(&self, inner: &mut Inner) -> anyhow::Result<()> {
        let new_path = segment_path(&self.dir, inner.next_segment_id);
        inner.next_segment_id += 1;
        inner.active_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&new_path)?;
        inner.active_path = new_path;
        inner.active_size = 0;
        Ok(())
    }

    fn evict_oldest(&self) -> anyhow::Result<()> {
        let mut segments = Self::list_segments(&self.dir)?;
        segments.sort();
        let Some(oldest) = segments.first() else {
            return Ok(());
        };
        let dropped = count_lines(oldest).unwrap_or(0);
        fs::remove_file(oldest)?;
        self.entry_count.fetch_sub(dropped.min(self.entry_count.load(Ordering::Acquire)), Ordering::AcqRel);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entry_count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walks closed segments oldest-first, handing each entry to `handler`.
    /// Entries the handler accepts (`true`) are dropped from the segment;
    /// entries it rejects are kept for the next replay pass. A segment with
    /// nothing left is deleted; one with only rejects is rewritten in place.
    pub fn replay<F>(&self, mut handler: F) -> anyhow::Result<(usize, usize)>
    where
        F: FnMut(&DlqEntry) -> bool,
    {
        let active_path = self.inner.lock().active_path.clone();
        let mut segments = Self::list_segments(&self.dir)?;
        segments.sort();

        let mut replayed = 0;
        let mut remaining = 0;

        for segment in segments {
            if segment == active_path {
                // Never replay the segment still being appended to.
                continue;
            }

            let file = File::open(&segment)?;
            let reader = BufReader::new(file);
            let mut kept = Vec::new();

            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let parsed: DlqEntry = serde_json::from_str(&line)?;
                if handler(&parsed) {
                    replayed += 1;
                } else {
                    kept.push(line);
                }
            }

            if kept.is_empty() {
                fs::remove_file(&segment)?;
            } else {
                remaining += kept.len();
                fs::write(&segment, kept.join("\n") + "\n")?;
            }
        }

        self.entry_count.fetch_sub(
            replayed.min(self.entry_count.load(Ordering::Acquire)),
            Ordering::AcqRel,
        );

        Ok((replayed, remaining))
    }
}

fn segment_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("{SEGMENT_PREFIX}{id:020}{SEGMENT_SUFFIX}"))
}

fn segment_id(path: &Path) -> Option<u64> {
    path.file_stem()?
        .to_str()?
        .strip_prefix(SEGMENT_PREFIX)?
        .parse()
        .ok()
}

fn count_lines(path: &Path) -> anyhow::Result<usize> {
    let file = File::open(path)?;
    Ok(BufReader::new(file)
        .lines()
        .filter(|l| l.as_ref().is_ok_and(|s| !s.trim().is_empty()))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logwarden_model::{ErrorKind, LogEntry, SourceType};

    fn config(dir: &Path) -> DlqConfig {
        DlqConfig {
            directory: dir.to_path_buf(),
            max_entries: 5,
            segment_max_bytes: 64 * 1024,
        }
    }

    fn entry(message: &str) -> DlqEntry {
        DlqEntry::new(
            LogEntry::new(SourceType::File, "src", message, Default::default()),
            "boom",
            ErrorKind::Permanent,
            "loki",
            0,
            "worker-0",
        )
    }

    #[test]
    fn append_then_replay_drains_accepted_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = DlqStore::open(&config(dir.path())).unwrap();

        store.append(&entry("a")).unwrap();
        store.append(&entry("b")).unwrap();

        // Force rotation so the entries land in a closed (replayable) segment.
        store.inner.lock().active_size = u64::MAX / 2;
        store.append(&entry("c")).unwrap();

        let (replayed, remaining) = store.replay(|_| true).unwrap();
        assert_eq!(replayed, 2);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn eviction_drops_oldest_segment_at_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DlqConfig {
            max_entries: 2,
            ..config(dir.path())
        };
        let store = DlqStore::open(&cfg).unwrap();

        for i in 0..5 {
            store.inner.lock().active_size = u64::MAX / 2;
            store.append(&entry(&format!("msg-{i}"))).unwrap();
        }

        assert!(store.len() <= 2);
    }
}
