//! # In-memory ring event source.
//!
//! [`RingSource`] keeps the most recent `capacity` posted events in a fixed ring.
//! Each post is stamped with a strictly increasing index and the current
//! [`Instant`]; once the ring is full the oldest slot is overwritten.
//!
//! ## Fetch rule
//! `fetch_next(cursor)` returns the stored event with the **smallest** index that
//! the cursor admits (`at >= since` and `index > last_index`). If there is none it
//! waits for the next `post`, an `interrupt`, or `close`.
//!
//! ## Rules
//! - Names must be `1..=max_name_len` bytes.
//! - A poller that falls more than `capacity` events behind loses the overwritten
//!   ones; the gap is visible as a jump in the returned index.
//! - `interrupt()` with no waiting fetch is latched and consumed by the next fetch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{Cursor, EventSource, Fetched};
use crate::error::{FetchError, SourceError};
use crate::events::Event;

/// Sizing of a [`RingSource`].
#[derive(Clone, Copy, Debug)]
pub struct RingConfig {
    /// Number of slots (min 1).
    pub capacity: usize,
    /// Maximum event name length in bytes.
    pub max_name_len: usize,
}

impl Default for RingConfig {
    /// 15 slots, names up to 15 bytes.
    fn default() -> Self {
        Self {
            capacity: 15,
            max_name_len: 15,
        }
    }
}

struct Slot {
    at: Instant,
    index: u64,
    event: Event,
}

struct Ring {
    slots: Vec<Option<Slot>>,
    next_index: u64,
}

/// Fixed-size in-memory event source.
pub struct RingSource {
    cfg: RingConfig,
    ring: Mutex<Ring>,
    arrived: Notify,
    interrupted: Notify,
    closed: AtomicBool,
}

impl RingSource {
    /// Creates a source with [`RingConfig::default`].
    pub fn new() -> Self {
        Self::with_config(RingConfig::default())
    }

    /// Creates a source with the given sizing.
    pub fn with_config(cfg: RingConfig) -> Self {
        let capacity = cfg.capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            cfg: RingConfig { capacity, ..cfg },
            ring: Mutex::new(Ring {
                slots,
                next_index: 0,
            }),
            arrived: Notify::new(),
            interrupted: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Effective sizing.
    pub fn config(&self) -> RingConfig {
        self.cfg
    }

    /// Number of events currently held.
    pub fn len(&self) -> usize {
        self.lock().slots.iter().filter(|s| s.is_some()).count()
    }

    /// True if nothing was posted yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index the next posted event will receive.
    pub fn next_index(&self) -> u64 {
        self.lock().next_index
    }

    /// Closes the source: further posts fail, and fetches return `Closed`
    /// once the stored events past the cursor are exhausted.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.arrived.notify_waiters();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_name(&self, name: &str) -> Result<(), SourceError> {
        if name.is_empty() {
            return Err(SourceError::InvalidName {
                name: name.to_string(),
                reason: "empty",
            });
        }
        if name.len() > self.cfg.max_name_len {
            return Err(SourceError::InvalidName {
                name: name.to_string(),
                reason: "too long",
            });
        }
        Ok(())
    }

    fn find(&self, cursor: Cursor) -> Option<Fetched> {
        let ring = self.lock();
        ring.slots
            .iter()
            .flatten()
            .filter(|slot| cursor.admits(slot.at, slot.index))
            .min_by_key(|slot| slot.index)
            .map(|slot| Fetched {
                index: slot.index,
                event: slot.event.clone().with_index(slot.index),
            })
    }
}

impl Default for RingSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSource for RingSource {
    async fn fetch_next(&self, cursor: Cursor) -> Result<Fetched, FetchError> {
        loop {
            // Register for wake-ups before looking, so a post in between is not missed.
            let arrived = self.arrived.notified();
            tokio::pin!(arrived);
            arrived.as_mut().enable();

            if let Some(fetched) = self.find(cursor) {
                return Ok(fetched);
            }
            if self.closed.load(Ordering::Acquire) {
                return Err(FetchError::Closed);
            }

            tokio::select! {
                _ = &mut arrived => continue,
                _ = self.interrupted.notified() => return Err(FetchError::Interrupted),
            }
        }
    }

    fn interrupt(&self) {
        self.interrupted.notify_one();
    }

    fn post(&self, event: Event) -> Result<u64, SourceError> {
        self.check_name(event.name())?;
        if self.closed.load(Ordering::Acquire) {
            return Err(SourceError::Closed);
        }

        let index = {
            let mut ring = self.lock();
            let index = ring.next_index;
            let slot = (index % ring.slots.len() as u64) as usize;
            ring.slots[slot] = Some(Slot {
                at: Instant::now(),
                index,
                event,
            });
            ring.next_index += 1;
            index
        };
        self.arrived.notify_waiters();
        Ok(index)
    }

    fn name(&self) -> &'static str {
        "ring"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn names(source: &RingSource, mut cursor: Cursor, n: usize) -> Vec<(u64, String)> {
        let mut out = Vec::new();
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        for _ in 0..n {
            let f = rt.block_on(source.fetch_next(cursor)).unwrap();
            cursor.advance(f.index);
            out.push((f.index, f.event.name().to_string()));
        }
        out
    }

    #[test]
    fn test_fetch_resumes_after_cursor() {
        let src = RingSource::new();
        for n in ["BTN", "BTN", "PWR", "BTN"] {
            src.post(Event::new(n)).unwrap();
        }

        let got = names(&src, Cursor::UNSET, 4);
        assert_eq!(
            got,
            vec![
                (0, "BTN".to_string()),
                (1, "BTN".to_string()),
                (2, "PWR".to_string()),
                (3, "BTN".to_string()),
            ]
        );

        let mut resume = Cursor::UNSET;
        resume.advance(1);
        assert_eq!(names(&src, resume, 1), vec![(2, "PWR".to_string())]);
    }

    #[test]
    fn test_events_before_since_are_ignored() {
        let src = RingSource::new();
        src.post(Event::new("OLD")).unwrap();

        let mut cursor = Cursor::UNSET;
        cursor.start_at(Instant::now() + Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(2));
        src.post(Event::new("NEW")).unwrap();

        assert_eq!(names(&src, cursor, 1), vec![(1, "NEW".to_string())]);
    }

    #[test]
    fn test_overwrite_drops_oldest() {
        let src = RingSource::with_config(RingConfig {
            capacity: 2,
            max_name_len: 15,
        });
        for n in ["A", "B", "C"] {
            src.post(Event::new(n)).unwrap();
        }
        assert_eq!(src.len(), 2);
        assert_eq!(src.next_index(), 3);
        assert_eq!(
            names(&src, Cursor::UNSET, 2),
            vec![(1, "B".to_string()), (2, "C".to_string())]
        );
    }

    #[test]
    fn test_name_validation() {
        let src = RingSource::new();
        assert!(matches!(
            src.post(Event::new("")),
            Err(SourceError::InvalidName { reason: "empty", .. })
        ));
        assert!(matches!(
            src.post(Event::new("0123456789abcdef")),
            Err(SourceError::InvalidName { reason: "too long", .. })
        ));
        assert_eq!(src.post(Event::new("0123456789abcde")), Ok(0));
    }

    #[tokio::test]
    async fn test_waiting_fetch_wakes_on_post() {
        let src = Arc::new(RingSource::new());
        let waiter = {
            let src = Arc::clone(&src);
            tokio::spawn(async move { src.fetch_next(Cursor::UNSET).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        src.post(Event::new("BTN")).unwrap();

        let fetched = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(fetched.index, 0);
        assert_eq!(fetched.event.index, Some(0));
    }

    #[tokio::test]
    async fn test_interrupt_wakes_waiting_fetch() {
        let src = Arc::new(RingSource::new());
        let waiter = {
            let src = Arc::clone(&src);
            tokio::spawn(async move { src.fetch_next(Cursor::UNSET).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        src.interrupt();

        let res = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(res.unwrap_err(), FetchError::Interrupted);
    }

    #[tokio::test]
    async fn test_interrupt_is_latched() {
        let src = RingSource::new();
        src.interrupt();
        let res = tokio::time::timeout(Duration::from_secs(1), src.fetch_next(Cursor::UNSET))
            .await
            .unwrap();
        assert_eq!(res.unwrap_err(), FetchError::Interrupted);
    }

    #[tokio::test]
    async fn test_close_after_drain() {
        let src = RingSource::new();
        src.post(Event::new("LAST")).unwrap();
        src.close();
        assert_eq!(src.post(Event::new("LATE")), Err(SourceError::Closed));

        let first = src.fetch_next(Cursor::UNSET).await.unwrap();
        let mut cursor = Cursor::UNSET;
        cursor.advance(first.index);
        assert_eq!(src.fetch_next(cursor).await.unwrap_err(), FetchError::Closed);
    }
}
