//! Checkpoint codec and flush session for the parallel driver
//!
//! A checkpoint is a binary snapshot of the processed-candidate bitmap,
//! keyed by a header describing the run it belongs to. Resume only happens
//! when every header field matches the current run exactly; anything else,
//! including a truncated file, is treated as "no resume".
//!
//! File layout (little-endian):
//!
//! | bytes | field |
//! |---|---|
//! | 4 | magic `GRCP` |
//! | 4 | version (= 1) |
//! | 4 | order n |
//! | 4 | target length L |
//! | 8 | total candidate count |
//! | 4 | hint second mark |
//! | 4 | hint third mark |
//! | 4 | hint-used flag |
//! | ceil(total/32) x 4 | processed bits, LSB-first per word |
//!
//! Saves go through `<path>.tmp` followed by an atomic rename, so readers
//! never observe a half-written file. All failures are best-effort: the
//! driver logs and keeps searching without checkpoint support.

use crate::error::CheckpointError;
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// File magic identifying a checkpoint
pub const CHECKPOINT_MAGIC: [u8; 4] = *b"GRCP";

/// Current checkpoint format version
pub const CHECKPOINT_VERSION: u32 = 1;

const HEADER_LEN: usize = 36;

/// Identity of a search run; all fields must match for a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointHeader {
    /// Ruler order being searched
    pub order: u32,
    /// Target length being searched
    pub length: u32,
    /// Number of seed candidates in the ordered list
    pub total: u64,
    /// Second mark of the ordering hint (0 when unhinted)
    pub hint_second: u32,
    /// Third mark of the ordering hint (0 when unhinted)
    pub hint_third: u32,
    /// Whether hint ordering was active for this run
    pub hint_used: bool,
}

impl CheckpointHeader {
    fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&CHECKPOINT_MAGIC);
        buf[4..8].copy_from_slice(&CHECKPOINT_VERSION.to_le_bytes());
        buf[8..12].copy_from_slice(&self.order.to_le_bytes());
        buf[12..16].copy_from_slice(&self.length.to_le_bytes());
        buf[16..24].copy_from_slice(&self.total.to_le_bytes());
        buf[24..28].copy_from_slice(&self.hint_second.to_le_bytes());
        buf[28..32].copy_from_slice(&self.hint_third.to_le_bytes());
        buf[32..36].copy_from_slice(&u32::from(self.hint_used).to_le_bytes());
        buf
    }
}

/// Lock-free bitmap of completed seed candidates.
///
/// Bit i is set once the DFS for candidate i has finished, successfully or
/// not. Writers use `fetch_or`; readers tolerate staleness, since a stale
/// "not processed" only costs redundant work.
pub struct ProcessedBitmap {
    total: u64,
    words: Vec<AtomicU32>,
}

impl ProcessedBitmap {
    /// Fresh bitmap with no candidate marked
    pub fn new(total: u64) -> Self {
        let word_count = ((total + 31) / 32) as usize;
        Self { total, words: (0..word_count).map(|_| AtomicU32::new(0)).collect() }
    }

    fn from_words(total: u64, words: Vec<u32>) -> Self {
        Self { total, words: words.into_iter().map(AtomicU32::new).collect() }
    }

    /// Number of candidates this bitmap covers
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Mark candidate `index` as processed
    #[inline]
    pub fn mark(&self, index: u64) {
        self.words[(index / 32) as usize].fetch_or(1 << (index % 32), Ordering::Relaxed);
    }

    /// Whether candidate `index` has been processed
    #[inline]
    pub fn is_marked(&self, index: u64) -> bool {
        (self.words[(index / 32) as usize].load(Ordering::Relaxed) >> (index % 32)) & 1 != 0
    }

    /// Number of processed candidates
    pub fn marked_count(&self) -> u64 {
        (0..self.total).filter(|&i| self.is_marked(i)).count() as u64
    }

    /// Whether every candidate has been processed
    pub fn is_complete(&self) -> bool {
        self.marked_count() == self.total
    }

    /// Consistent copy of the packed words for serialization
    pub fn snapshot(&self) -> Vec<u32> {
        self.words.iter().map(|w| w.load(Ordering::Relaxed)).collect()
    }
}

/// Write a checkpoint atomically: `<path>.tmp` then rename over `path`.
pub fn save(
    path: &Path,
    header: &CheckpointHeader,
    bitmap: &ProcessedBitmap,
) -> Result<(), CheckpointError> {
    let mut buf = Vec::with_capacity(HEADER_LEN + bitmap.words.len() * 4);
    buf.extend_from_slice(&header.encode());
    for word in bitmap.snapshot() {
        buf.extend_from_slice(&word.to_le_bytes());
    }

    let tmp = tmp_path(path);
    if let Err(e) = fs::write(&tmp, &buf) {
        let _ = fs::remove_file(&tmp);
        return Err(CheckpointError::io(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(CheckpointError::rename(path, e));
    }
    Ok(())
}

/// Load the processed bitmap from `path` when its header matches `expected`.
///
/// Any mismatch, including a missing file or a short read, yields
/// `Ok(None)` ("no resume"). Only hard I/O failures surface as errors.
pub fn load(
    path: &Path,
    expected: &CheckpointHeader,
) -> Result<Option<ProcessedBitmap>, CheckpointError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CheckpointError::io(path, e)),
    };

    if data.len() < HEADER_LEN || data[..HEADER_LEN] != expected.encode() {
        return Ok(None);
    }

    let word_count = ((expected.total + 31) / 32) as usize;
    let payload = &data[HEADER_LEN..];
    if payload.len() < word_count * 4 {
        // short read, treat as mismatch
        return Ok(None);
    }

    let words = payload[..word_count * 4]
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(Some(ProcessedBitmap::from_words(expected.total, words)))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Shared checkpoint state for one parallel solve.
///
/// Owns the processed bitmap, gates flushes by wall-clock interval, and
/// serializes the file I/O so at most one worker writes per interval.
pub struct CheckpointSession {
    path: PathBuf,
    header: CheckpointHeader,
    bitmap: ProcessedBitmap,
    interval: Duration,
    epoch: Instant,
    last_flush_ms: AtomicU64,
    flush_lock: Mutex<()>,
}

impl CheckpointSession {
    /// Open a session: resume from a matching file when one exists, then
    /// immediately stamp the file for the current run.
    pub fn start(path: PathBuf, interval_secs: u64, header: CheckpointHeader) -> Self {
        let bitmap = match load(&path, &header) {
            Ok(Some(bitmap)) => {
                log::info!(
                    "resuming from checkpoint '{}' ({}/{} candidates done)",
                    path.display(),
                    bitmap.marked_count(),
                    bitmap.total()
                );
                bitmap
            }
            Ok(None) => ProcessedBitmap::new(header.total),
            Err(e) => {
                log::warn!("checkpoint load failed, starting fresh: {}", e);
                ProcessedBitmap::new(header.total)
            }
        };

        let session = Self {
            path,
            header,
            bitmap,
            interval: Duration::from_secs(interval_secs.max(1)),
            epoch: Instant::now(),
            last_flush_ms: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
        };
        session.write_now();
        session
    }

    /// The processed bitmap shared by all workers
    pub fn bitmap(&self) -> &ProcessedBitmap {
        &self.bitmap
    }

    /// Flush when the interval has elapsed; serialized across workers with
    /// a clock re-check under the lock so only one thread does the I/O.
    pub fn maybe_flush(&self) {
        let interval_ms = self.interval.as_millis() as u64;
        let now_ms = self.epoch.elapsed().as_millis() as u64;
        if now_ms.saturating_sub(self.last_flush_ms.load(Ordering::Relaxed)) < interval_ms {
            return;
        }
        let _guard = self.flush_lock.lock();
        let now_ms = self.epoch.elapsed().as_millis() as u64;
        if now_ms.saturating_sub(self.last_flush_ms.load(Ordering::Relaxed)) < interval_ms {
            return;
        }
        self.write_now();
        self.last_flush_ms.store(now_ms, Ordering::Relaxed);
    }

    /// Unconditional flush at the end of the parallel region
    pub fn final_flush(&self) {
        let _guard = self.flush_lock.lock();
        self.write_now();
    }

    fn write_now(&self) {
        if let Err(e) = save(&self.path, &self.header, &self.bitmap) {
            log::warn!("checkpoint save failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> CheckpointHeader {
        CheckpointHeader {
            order: 10,
            length: 55,
            total: 70,
            hint_second: 1,
            hint_third: 6,
            hint_used: true,
        }
    }

    #[test]
    fn test_bitmap_marking() {
        let bitmap = ProcessedBitmap::new(70);
        assert!(!bitmap.is_marked(0));
        bitmap.mark(0);
        bitmap.mark(31);
        bitmap.mark(32);
        bitmap.mark(69);
        assert!(bitmap.is_marked(0));
        assert!(bitmap.is_marked(31));
        assert!(bitmap.is_marked(32));
        assert!(bitmap.is_marked(69));
        assert_eq!(bitmap.marked_count(), 4);
        assert!(!bitmap.is_complete());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.grcp");
        let header = header();

        let bitmap = ProcessedBitmap::new(header.total);
        bitmap.mark(3);
        bitmap.mark(33);
        save(&path, &header, &bitmap).expect("save");

        let loaded = load(&path, &header).expect("load").expect("resume");
        assert_eq!(loaded.total(), 70);
        assert_eq!(loaded.snapshot(), bitmap.snapshot());
    }

    #[test]
    fn test_header_mismatch_is_no_resume() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.grcp");
        let header = header();
        save(&path, &header, &ProcessedBitmap::new(header.total)).expect("save");

        for mismatched in [
            CheckpointHeader { order: 11, ..header },
            CheckpointHeader { length: 56, ..header },
            CheckpointHeader { total: 71, ..header },
            CheckpointHeader { hint_second: 2, ..header },
            CheckpointHeader { hint_third: 7, ..header },
            CheckpointHeader { hint_used: false, ..header },
        ] {
            assert!(load(&path, &mismatched).expect("load").is_none(), "{:?}", mismatched);
        }
    }

    #[test]
    fn test_missing_file_is_no_resume() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.grcp");
        assert!(load(&path, &header()).expect("load").is_none());
    }

    #[test]
    fn test_short_read_is_no_resume() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.grcp");
        let header = header();
        save(&path, &header, &ProcessedBitmap::new(header.total)).expect("save");

        let data = fs::read(&path).expect("read");
        fs::write(&path, &data[..data.len() - 1]).expect("truncate");
        assert!(load(&path, &header).expect("load").is_none());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.grcp");
        let header = header();
        save(&path, &header, &ProcessedBitmap::new(header.total)).expect("save");
        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_session_stamps_file_on_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.grcp");
        let header = header();

        let session = CheckpointSession::start(path.clone(), 60, header);
        assert!(path.exists());
        session.bitmap().mark(5);
        session.final_flush();

        let loaded = load(&path, &header).expect("load").expect("resume");
        assert!(loaded.is_marked(5));
        assert_eq!(loaded.marked_count(), 1);
    }
}
