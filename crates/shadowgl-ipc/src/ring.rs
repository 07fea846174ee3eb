//! Mirrored single-producer/single-consumer byte ring.
//!
//! One shared-memory region of `L` bytes is mapped twice, back to back, so `base..base + 2L` is
//! valid and `base + L + k` aliases `base + k`. Any run of up to `L` bytes that starts below `L`
//! is therefore contiguous in the address space:
//!
//! - records are never split at the wrap point, so there are no wrap markers or padding records
//! - producers and consumers get plain slices and copy with `copy_from_slice`
//!
//! `head` is only written by the [`Producer`] and `tail` only by the [`Consumer`]; `fill` is the
//! single counter both sides publish through.

use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::config::RingConfig;
use crate::error::RingError;
use crate::layout::{round_to_page, NO_TOKEN};
use crate::transport::{Direction, TransportMode, WaitStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// Not enough free space right now.
    Full,
    /// The record can never fit in this ring.
    TooLarge,
}

pub struct MirroredRing {
    base: NonNull<u8>,
    len: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
    fill: AtomicUsize,
    last_token: AtomicU32,
    waiter: Box<dyn WaitStrategy>,
    poll_interval: Duration,
}

// SAFETY: the mapping is process-wide and the producer/consumer halves only ever touch disjoint
// byte ranges, handed over through the `fill` counter with release/acquire ordering.
unsafe impl Send for MirroredRing {}
unsafe impl Sync for MirroredRing {}

impl MirroredRing {
    /// Creates a ring and returns its two halves.
    pub fn create(config: &RingConfig) -> Result<(Producer, Consumer), RingError> {
        let ring = Self::new(config)
            .inspect_err(|err| error!(error = %err, "mirrored ring setup failed"))?;
        let ring = Arc::new(ring);
        Ok((Producer { ring: ring.clone() }, Consumer { ring }))
    }

    fn new(config: &RingConfig) -> Result<Self, RingError> {
        let len = round_to_page(config.capacity_bytes);
        if len >= u32::MAX as usize {
            return Err(RingError::CapacityTooLarge(len));
        }

        let file =
            tempfile::tempfile_in(&config.shm_dir).map_err(|source| RingError::BackingFile {
                dir: config.shm_dir.clone(),
                source,
            })?;
        file.set_len(len as u64)
            .map_err(|source| RingError::Truncate { len, source })?;

        let base = map_mirrored(&file, len)?;
        // The two mappings keep the pages alive; the file never had a visible name.
        drop(file);

        debug!(len, mode = ?config.mode, "created mirrored ring");
        Ok(Self {
            base,
            len,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            fill: AtomicUsize::new(0),
            last_token: AtomicU32::new(NO_TOKEN),
            waiter: config.mode.strategy(),
            poll_interval: config.poll_interval,
        })
    }

    /// Usable capacity `L` (the requested size rounded up to the page size).
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// Bytes currently committed by the producer and not yet consumed.
    pub fn entry_count(&self) -> usize {
        self.fill.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    pub fn mode(&self) -> TransportMode {
        self.waiter.mode()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Token of the last record the consumer finished handling.
    pub fn last_token(&self) -> u32 {
        self.last_token.load(Ordering::Acquire)
    }

    fn free(&self) -> usize {
        self.len - self.entry_count()
    }

    fn at(&self, offset: usize) -> *mut u8 {
        debug_assert!(offset < 2 * self.len);
        // SAFETY: `offset` stays inside the 2L reservation.
        unsafe { self.base.as_ptr().add(offset) }
    }
}

impl Drop for MirroredRing {
    fn drop(&mut self) {
        // SAFETY: `base..base + 2L` is exactly the reservation made in `map_mirrored`.
        let rc = unsafe { libc::munmap(self.base.as_ptr().cast(), 2 * self.len) };
        if rc != 0 {
            error!(error = %io::Error::last_os_error(), "failed to unmap mirrored ring");
        }
    }
}

/// Reserves `2 * len` bytes with no access and maps `file` over both halves.
fn map_mirrored(file: &File, len: usize) -> Result<NonNull<u8>, RingError> {
    let fd = file.as_raw_fd();
    // SAFETY: an anonymous PROT_NONE reservation has no preconditions; the fixed mappings below
    // only replace pages inside that reservation.
    unsafe {
        let reserve = libc::mmap(
            ptr::null_mut(),
            2 * len,
            libc::PROT_NONE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        );
        if reserve == libc::MAP_FAILED {
            return Err(RingError::Reserve {
                len: 2 * len,
                source: io::Error::last_os_error(),
            });
        }

        for (image, offset) in [0, len].into_iter().enumerate() {
            let want = reserve.cast::<u8>().add(offset).cast::<libc::c_void>();
            let got = libc::mmap(
                want,
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_FIXED | libc::MAP_SHARED,
                fd,
                0,
            );
            if got != want {
                let source = io::Error::last_os_error();
                libc::munmap(reserve, 2 * len);
                return Err(RingError::Map {
                    image,
                    offset,
                    source,
                });
            }
        }

        NonNull::new(reserve.cast::<u8>()).ok_or_else(|| RingError::Reserve {
            len: 2 * len,
            source: io::Error::from(io::ErrorKind::AddrNotAvailable),
        })
    }
}

/// Writing half. Exactly one exists per ring.
pub struct Producer {
    ring: Arc<MirroredRing>,
}

impl Producer {
    pub fn ring(&self) -> &MirroredRing {
        &self.ring
    }

    /// The free region starting at `head`, `L - fill` bytes long.
    ///
    /// Busy-poll rings return `None` when full; blocking rings wait for space.
    pub fn writable_region(&mut self) -> Option<&mut [u8]> {
        let ring = &*self.ring;
        if !ring.waiter.wait(Direction::Space, &|| ring.free() > 0) {
            return None;
        }
        let free = ring.free();
        let head = ring.head.load(Ordering::Relaxed);
        // SAFETY: head < L and free <= L keep the run inside the mirrored range. The consumer only
        // reads the `fill` bytes starting at `tail`, which don't overlap the free run.
        Some(unsafe { std::slice::from_raw_parts_mut(ring.at(head), free) })
    }

    /// Publishes `n` bytes written at the start of the last writable region.
    pub fn commit_write(&mut self, n: usize) {
        let ring = &*self.ring;
        assert!(n <= ring.free(), "commit_write of {n} bytes overruns the free region");
        let head = ring.head.load(Ordering::Relaxed);
        ring.head.store((head + n) % ring.len, Ordering::Relaxed);
        ring.fill.fetch_add(n, Ordering::AcqRel);
        ring.waiter.notify(Direction::Data);
    }

    /// Copies `record` in if it fits right now.
    pub fn try_push(&mut self, record: &[u8]) -> Result<(), PushError> {
        if record.len() > self.ring.len {
            return Err(PushError::TooLarge);
        }
        if self.ring.free() < record.len() {
            return Err(PushError::Full);
        }
        self.copy_in(record);
        Ok(())
    }

    /// Copies `record` in, waiting (or polling) for enough space.
    pub fn push(&mut self, record: &[u8]) -> Result<(), PushError> {
        if record.len() > self.ring.len {
            return Err(PushError::TooLarge);
        }
        let ring = &*self.ring;
        while !ring
            .waiter
            .wait(Direction::Space, &|| ring.free() >= record.len())
        {
            std::thread::sleep(ring.poll_interval);
        }
        self.copy_in(record);
        Ok(())
    }

    fn copy_in(&mut self, record: &[u8]) {
        let head = self.ring.head.load(Ordering::Relaxed);
        // SAFETY: the caller checked `record.len() <= free`, see `writable_region`.
        unsafe { ptr::copy_nonoverlapping(record.as_ptr(), self.ring.at(head), record.len()) };
        self.commit_write(record.len());
    }
}

/// Reading half. Exactly one exists per ring.
pub struct Consumer {
    ring: Arc<MirroredRing>,
}

impl Consumer {
    pub fn ring(&self) -> &MirroredRing {
        &self.ring
    }

    /// The committed region starting at `tail`, `fill` bytes long.
    ///
    /// Busy-poll rings return `None` when empty; blocking rings wait for data.
    pub fn readable_region(&mut self) -> Option<&[u8]> {
        self.wait_readable(1)
    }

    /// Like [`Consumer::readable_region`], but only succeeds once at least `min` bytes are committed.
    pub fn wait_readable(&mut self, min: usize) -> Option<&[u8]> {
        let ring = &*self.ring;
        let min = min.max(1);
        if !ring.waiter.wait(Direction::Data, &|| ring.entry_count() >= min) {
            return None;
        }
        let fill = ring.entry_count();
        let tail = ring.tail.load(Ordering::Relaxed);
        // SAFETY: tail < L and fill <= L; the producer never writes into committed bytes.
        Some(unsafe { std::slice::from_raw_parts(ring.at(tail), fill) })
    }

    /// Releases `n` bytes at the start of the readable region back to the producer.
    pub fn commit_read(&mut self, n: usize) {
        let ring = &*self.ring;
        assert!(n <= ring.entry_count(), "commit_read of {n} bytes overruns the filled region");
        let tail = ring.tail.load(Ordering::Relaxed);
        ring.tail.store((tail + n) % ring.len, Ordering::Relaxed);
        ring.fill.fetch_sub(n, Ordering::AcqRel);
        ring.waiter.notify(Direction::Space);
    }

    /// Copies out exactly `len` bytes, polling or waiting until they are available.
    pub fn pop_exact(&mut self, len: usize) -> Vec<u8> {
        let interval = self.ring.poll_interval;
        let out = loop {
            if let Some(region) = self.wait_readable(len) {
                break region[..len].to_vec();
            }
            std::thread::sleep(interval);
        };
        self.commit_read(len);
        out
    }

    /// Records `token` as the last acknowledged one.
    pub fn acknowledge(&mut self, token: u32) {
        self.ring.last_token.store(token, Ordering::Release);
    }

    /// Resets both cursors and the fill count. Holding both halves mutably proves neither side is
    /// mid-operation.
    pub fn clear(&mut self, producer: &mut Producer) {
        assert!(
            Arc::ptr_eq(&self.ring, &producer.ring),
            "clear called with halves of different rings"
        );
        let ring = &*self.ring;
        ring.head.store(0, Ordering::Relaxed);
        ring.tail.store(0, Ordering::Relaxed);
        ring.fill.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: usize) -> (Producer, Consumer) {
        let cfg = RingConfig::default().with_capacity(capacity);
        MirroredRing::create(&cfg).expect("create ring")
    }

    #[test]
    fn second_image_aliases_the_first() {
        let (mut tx, rx) = ring(1024);
        let len = rx.ring().capacity();
        let region = tx.writable_region().expect("empty ring is writable");
        assert_eq!(region.len(), len);
        region[0] = 0xAB;
        // SAFETY: test-only peek at the mirror image.
        let mirrored = unsafe { *rx.ring().at(len) };
        assert_eq!(mirrored, 0xAB);
    }

    #[test]
    fn busy_poll_reports_full_and_empty_as_none() {
        let (mut tx, mut rx) = ring(1);
        let len = tx.ring().capacity();
        assert!(rx.readable_region().is_none());

        tx.writable_region().expect("writable");
        tx.commit_write(len);
        assert!(tx.writable_region().is_none());
        assert_eq!(rx.ring().entry_count(), len);

        rx.commit_read(len);
        assert!(rx.ring().is_empty());
    }

    #[test]
    fn clear_resets_cursors() {
        let (mut tx, mut rx) = ring(1);
        tx.push(&[1, 2, 3]).unwrap();
        rx.clear(&mut tx);
        assert_eq!(rx.ring().entry_count(), 0);
        tx.push(&[9]).unwrap();
        assert_eq!(rx.readable_region().unwrap(), &[9]);
    }

    #[test]
    fn acknowledge_publishes_token() {
        let (tx, mut rx) = ring(1);
        assert_eq!(tx.ring().last_token(), NO_TOKEN);
        rx.acknowledge(42);
        assert_eq!(tx.ring().last_token(), 42);
    }
}
