//! Build output directory.
//!
//! Everything a build emits lands in one directory. Files are written to a
//! temporary name first and renamed into place, so an interrupted build never
//! leaves a truncated descriptor or script behind. A lock file keeps two
//! builds from writing into the same directory at once.

use anyhow::{bail, Context, Result};
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Lock file name inside the output directory.
pub const LOCK_FILENAME: &str = ".setup-builder.lock";

/// Output directory for one build.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

/// Held for the duration of a build; released on drop.
#[derive(Debug)]
pub struct OutputLock {
    file: File,
    path: PathBuf,
}

impl Drop for OutputLock {
    fn drop(&mut self) {
        // Unlinking a lock file another process may be waiting on would let a
        // third process lock a fresh inode, so only release it.
        let _ = FileExt::unlock(&self.file);
        log::debug!("released output lock {}", self.path.display());
    }
}

impl OutputDir {
    /// Open (and create if needed) an output directory.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("creating output directory '{}'", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Take the directory's exclusive lock without waiting.
    pub fn lock(&self) -> Result<OutputLock> {
        let path = self.path(LOCK_FILENAME);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("creating lock file '{}'", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            bail!(
                "output directory '{}' is locked by another build ({})",
                self.root.display(),
                path.display()
            );
        }

        log::debug!("acquired output lock {}", path.display());
        Ok(OutputLock { file, path })
    }

    /// Scratch path next to the final outputs, on the same filesystem.
    pub fn tmp_path(&self, name: &str) -> PathBuf {
        self.root.join(tmp_name(&format!(".{name}")))
    }

    /// Move a finished temporary file to its final name.
    pub fn commit(&self, tmp: &Path, name: &str) -> Result<PathBuf> {
        let dest = self.path(name);
        atomic_rename(tmp, &dest)?;
        Ok(dest)
    }

    /// Write `bytes` to `name` atomically.
    pub fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let tmp = self.tmp_path(name);
        fs::write(&tmp, bytes).with_context(|| format!("writing '{}'", tmp.display()))?;
        self.commit(&tmp, name)
    }
}

fn tmp_name(prefix: &str) -> String {
    let n = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{prefix}-{n}.tmp")
}

fn atomic_rename(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            // Fall back to copy+remove (e.g. EXDEV).
            fs::copy(src, dst).with_context(|| {
                format!("copying '{}' to '{}'", src.display(), dst.display())
            })?;
            fs::remove_file(src)
                .with_context(|| format!("removing temporary file '{}'", src.display()))?;
            Ok(())
        }
    }
}

/// Streamed sha256 of a file, with its size.
pub fn sha256_file(path: &Path) -> Result<(String, u64)> {
    let f = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut size = 0u64;
    loop {
        let n = r
            .read(&mut buf)
            .with_context(|| format!("reading '{}'", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((format!("{:x}", hasher.finalize()), size))
}
