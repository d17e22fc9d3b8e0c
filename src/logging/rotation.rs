//! Size-based rotating log file.
//!
//! When a write would push the active file past the size limit, the file is
//! renamed to `<stem>-<UTC timestamp>.<ext>`, a fresh file is opened, and
//! backups are pruned by count and age and then gzipped.

use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

const MEGABYTE: u64 = 1024 * 1024;
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// Rotation limits. The collector always uses [`RotationOptions::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationOptions {
    /// Size in bytes at which the active file is rotated.
    pub max_size: u64,
    /// Backups to keep; 0 keeps all.
    pub max_backups: usize,
    /// Age after which backups are removed; zero keeps all.
    pub max_age: Duration,
    /// Gzip backups after rotation.
    pub compress: bool,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            max_size: 100 * MEGABYTE,
            max_backups: 5,
            max_age: Duration::from_secs(7 * 24 * 60 * 60),
            compress: true,
        }
    }
}

struct ActiveFile {
    file: Option<File>,
    size: u64,
}

/// A log file that rotates itself by size. All writes are serialized.
pub struct RotatingWriter {
    path: PathBuf,
    options: RotationOptions,
    active: Mutex<ActiveFile>,
}

impl RotatingWriter {
    /// Writer with the default rotation limits. The file is opened on first
    /// write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, RotationOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: RotationOptions) -> Self {
        Self {
            path: path.into(),
            options,
            active: Mutex::new(ActiveFile {
                file: None,
                size: 0,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &RotationOptions {
        &self.options
    }

    /// Append `buf` as one unit, rotating first if it would not fit.
    pub fn write_record(&self, buf: &[u8]) -> io::Result<()> {
        let len = buf.len() as u64;
        if len > self.options.max_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {} exceeds maximum file size {}",
                    len, self.options.max_size
                ),
            ));
        }

        let mut active = self.lock();
        let rotated = if active.file.is_none() {
            self.open_existing_or_new(&mut active, len)?
        } else if active.size + len > self.options.max_size {
            self.rotate_locked(&mut active)?;
            true
        } else {
            false
        };

        if let Some(file) = active.file.as_mut() {
            file.write_all(buf)?;
            active.size += len;
        }
        let cleanup = if rotated { self.mill() } else { Ok(()) };
        drop(active);
        self.report_cleanup(cleanup);
        Ok(())
    }

    /// Close the active file, move it to a backup and start a new one.
    pub fn rotate(&self) -> io::Result<()> {
        let mut active = self.lock();
        self.rotate_locked(&mut active)?;
        let cleanup = self.mill();
        drop(active);
        self.report_cleanup(cleanup);
        Ok(())
    }

    /// Cleanup failures go to stderr: a `tracing` event could be routed back
    /// into this writer and rotate it again.
    fn report_cleanup(&self, cleanup: io::Result<()>) {
        if let Err(e) = cleanup {
            eprintln!(
                "failed to clean up rotated log files for {}: {}",
                self.path.display(),
                e
            );
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        match self.lock().file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ActiveFile> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open the log file for the first write. Returns whether it had to be
    /// rotated first.
    fn open_existing_or_new(&self, active: &mut ActiveFile, write_len: u64) -> io::Result<bool> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() + write_len <= self.options.max_size => {
                let file = OpenOptions::new().append(true).open(&self.path)?;
                active.file = Some(file);
                active.size = meta.len();
                Ok(false)
            }
            Ok(_) => self.rotate_locked(active).map(|()| true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.open_new(active).map(|()| false),
            Err(e) => Err(e),
        }
    }

    fn rotate_locked(&self, active: &mut ActiveFile) -> io::Result<()> {
        if let Some(mut file) = active.file.take() {
            file.flush()?;
        }
        if self.path.exists() {
            let backup = self.backup_path();
            fs::rename(&self.path, &backup)?;
        }
        self.open_new(active)
    }

    fn open_new(&self, active: &mut ActiveFile) -> io::Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        active.file = Some(file);
        active.size = 0;
        Ok(())
    }

    fn stem_and_ext(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (stem, ext)
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// A backup name that does not collide with an existing backup.
    fn backup_path(&self) -> PathBuf {
        let (stem, ext) = self.stem_and_ext();
        let stamp = Utc::now().format(BACKUP_TIME_FORMAT).to_string();
        let dir = self.dir();
        let mut candidate = dir.join(format!("{stem}-{stamp}{ext}"));
        let mut n = 1;
        while candidate.exists() || gz_path(&candidate).exists() {
            candidate = dir.join(format!("{stem}-{stamp}.{n}{ext}"));
            n += 1;
        }
        candidate
    }

    /// Existing backups, newest first.
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        let (stem, ext) = self.stem_and_ext();
        let prefix = format!("{stem}-");
        let gz_ext = format!("{ext}.gz");

        let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(self.dir())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };
            if !rest.starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            if !(rest.ends_with(&ext) || rest.ends_with(&gz_ext)) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((modified, entry.path()));
        }
        found.sort_by(|a, b| b.cmp(a));
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    /// Remove backups beyond the count and age limits, then compress the rest.
    fn mill(&self) -> io::Result<()> {
        let backups = self.backups()?;
        let now = SystemTime::now();
        let mut keep = Vec::new();
        for (index, backup) in backups.into_iter().enumerate() {
            let too_many = self.options.max_backups > 0 && index >= self.options.max_backups;
            let too_old = !self.options.max_age.is_zero()
                && fs::metadata(&backup)
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age > self.options.max_age);
            if too_many || too_old {
                fs::remove_file(&backup)?;
            } else {
                keep.push(backup);
            }
        }

        if self.options.compress {
            for backup in keep {
                if backup.extension().is_some_and(|e| e == "gz") {
                    continue;
                }
                compress_file(&backup)?;
            }
        }
        Ok(())
    }
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzip `src` to `src.gz` and remove `src`.
fn compress_file(src: &Path) -> io::Result<()> {
    let dst = gz_path(src);
    let mut input = File::open(src)?;
    let output = File::create(&dst)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;
    fs::remove_file(src)
}
