use std::path::PathBuf;

use logwarden_config::DiskGuardConfig;
use walkdir::WalkDir;

/// Watches the sink's output directory and deletes the oldest rotated
/// segments once usage crosses `cleanup_threshold_percent` of
/// `max_total_disk_gb` (spec §4.13). Runs on its own interval from the
/// sink, independent of the write path, so a write never blocks on a
/// filesystem walk.
pub struct DiskGuard {
    directory: PathBuf,
    config: DiskGuardConfig,
}

impl DiskGuard {
    pub fn new(directory: PathBuf, config: DiskGuardConfig) -> Self {
        Self { directory, config }
    }

    pub fn directory_size_bytes(&self) -> u64 {
        WalkDir::new(&self.directory)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum()
    }

    fn usage_percent(&self) -> f64 {
        let max_bytes = self.config.max_total_disk_gb * 1024.0 * 1024.0 * 1024.0;
        if max_bytes <= 0.0 {
            return 0.0;
        }
        (self.directory_size_bytes() as f64 / max_bytes) * 100.0
    }

    /// Deletes oldest-modified files first until usage drops back under the
    /// configured threshold, or there's nothing left to delete. Returns the
    /// number of files removed.
    pub fn enforce(&self) -> std::io::Result<usize> {
        if self.usage_percent() < self.config.cleanup_threshold_percent {
            return Ok(0);
        }

        let mut files: Vec<(PathBuf, std::time::SystemTime)> = WalkDir::new(&self.directory)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let modified = e.metadata().ok()?.modified().ok()?;
                Some((e.path().to_path_buf(), modified))
            })
            .collect();
        files.sort_by_key(|(_, modified)| *modified);

        let mut removed = 0;
        for (path, _) in files {
            if self.usage_percent() < self.config.cleanup_threshold_percent {
                break;
            }
            if !self.config.emergency_cleanup_enabled {
                break;
            }
            std::fs::remove_file(&path)?;
            removed += 1;
        }

        Ok(removed)
    }

    pub fn free_space_bytes(&self) -> std::io::Result<u64> {
        fs2::free_space(&self.directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_zero_usage_for_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let guard = DiskGuard::new(dir.path().to_path_buf(), DiskGuardConfig {
            max_total_disk_gb: 1.0,
            ..DiskGuardConfig::default()
        });
        assert_eq!(guard.directory_size_bytes(), 0);
    }

    #[test]
    fn enforce_removes_files_over_threshold() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.log"), vec![0u8; 2 * 1024 * 1024]).unwrap();
        std::fs::write(dir.path().join("b.log"), vec![0u8; 2 * 1024 * 1024]).unwrap();

        let guard = DiskGuard::new(
            dir.path().to_path_buf(),
            DiskGuardConfig {
                max_total_disk_gb: 0.000_1,
                cleanup_threshold_percent: 1.0,
                emergency_cleanup_enabled: true,
                ..DiskGuardConfig::default()
            },
        );

        let removed = guard.enforce().unwrap();
        assert!(removed > 0);
    }
}
