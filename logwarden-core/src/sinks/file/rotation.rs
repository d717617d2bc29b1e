use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use logwarden_config::RotationConfig;

use super::fd_lru::FdLru;

/// Rotates `path` if it has grown past `rotation.max_size_mb`, shifting
/// `path.N` to `path.N+1` up to `max_files`, dropping the oldest, and
/// gzipping the freshly rotated file when `compress` is set (spec §4.13).
/// Must close `path`'s handle in `fd_lru` first — renaming a file out from
/// under an open append handle leaves writes going to the unlinked inode.
pub fn rotate_if_needed(path: &Path, rotation: &RotationConfig, fd_lru: &FdLru) -> std::io::Result<()> {
    let Ok(metadata) = fs::metadata(path) else {
        return Ok(());
    };

    if metadata.len() < rotation.max_size_mb * 1024 * 1024 {
        return Ok(());
    }

    fd_lru.close(path);

    for i in (1..rotation.max_files).rev() {
        let src = rotated_path(path, i, rotation.compress);
        let dst = rotated_path(path, i + 1, rotation.compress);
        if src.exists() {
            if i + 1 >= rotation.max_files {
                fs::remove_file(&src)?;
            } else {
                fs::rename(&src, &dst)?;
            }
        }
    }

    let first = rotated_path(path, 1, false);
    fs::rename(path, &first)?;

    if rotation.compress {
        compress_in_place(&first)?;
    }

    Ok(())
}

fn rotated_path(path: &Path, index: usize, compressed: bool) -> std::path::PathBuf {
    let suffix = if compressed { format!(".{index}.gz") } else { format!(".{index}") };
    let mut name = path.as_os_str().to_os_string();
    name.push(&suffix);
    std::path::PathBuf::from(name)
}

fn compress_in_place(path: &Path) -> std::io::Result<()> {
    let mut raw = Vec::new();
    fs::File::open(path)?.read_to_end(&mut raw)?;

    let gz_path = {
        let mut p = path.as_os_str().to_os_string();
        p.push(".gz");
        std::path::PathBuf::from(p)
    };

    let mut encoder = GzEncoder::new(fs::File::create(&gz_path)?, Compression::default());
    encoder.write_all(&raw)?;
    encoder.finish()?;
    fs::remove_file(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_skipped_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log");
        fs::write(&path, b"small").unwrap();

        let rotation = RotationConfig { max_size_mb: 1, max_files: 3, compress: false };
        let fd_lru = FdLru::new(8);
        rotate_if_needed(&path, &rotation, &fd_lru).unwrap();

        assert!(path.exists());
        assert!(!rotated_path(&path, 1, false).exists());
    }

    #[test]
    fn rotates_and_compresses_when_over_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log");
        fs::write(&path, vec![b'x'; 2 * 1024 * 1024]).unwrap();

        let rotation = RotationConfig { max_size_mb: 1, max_files: 3, compress: true };
        let fd_lru = FdLru::new(8);
        rotate_if_needed(&path, &rotation, &fd_lru).unwrap();

        assert!(!path.exists());
        assert!(rotated_path(&path, 1, true).exists());
    }
}
