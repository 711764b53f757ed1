//! Self-advancing banner rotation.
//!
//! The rotator is either Idle (nothing eligible) or Rotating (an interval
//! timer advances the index). Any change to the eligible titles restarts
//! the timer from slot 0; ticks from a previous timer are recognised by
//! their generation and ignored.

use shared::MAX_BANNER_SLOTS;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Emitted by the rotation timer once per interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerTick {
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPhase {
    Idle,
    Rotating,
}

pub struct BannerRotator {
    interval: Duration,
    max_slots: usize,
    ticks: mpsc::UnboundedSender<BannerTick>,
    eligible: Vec<u32>,
    index: Option<usize>,
    generation: u64,
    timer: Option<CancellationToken>,
}

impl BannerRotator {
    pub fn new(
        interval: Duration,
        max_slots: usize,
        ticks: mpsc::UnboundedSender<BannerTick>,
    ) -> Self {
        Self {
            interval,
            max_slots: max_slots.clamp(1, MAX_BANNER_SLOTS),
            ticks,
            eligible: Vec::new(),
            index: None,
            generation: 0,
            timer: None,
        }
    }

    /// Replace the eligible set with the leading `max_slots` identities.
    ///
    /// Returns true when the rotation was restarted or stopped.
    pub fn set_eligible(&mut self, ids: impl IntoIterator<Item = u32>) -> bool {
        let eligible: Vec<u32> = ids.into_iter().take(self.max_slots).collect();

        if eligible == self.eligible {
            return false;
        }
        self.eligible = eligible;

        if self.eligible.is_empty() {
            debug!("Banner idle, nothing to rotate");
            self.stop();
            return true;
        }

        self.restart();
        true
    }

    /// Advance the index for a tick from the current timer
    pub fn on_tick(&mut self, tick: BannerTick) -> Option<usize> {
        if tick.generation != self.generation || self.eligible.is_empty() {
            trace!(
                tick_generation = tick.generation,
                generation = self.generation,
                "Ignoring stale banner tick"
            );
            return None;
        }

        let next = self.index.map(|i| (i + 1) % self.eligible.len()).unwrap_or(0);
        self.index = Some(next);
        Some(next)
    }

    /// Stop rotating and forget the index. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.generation += 1;
        self.index = None;
        self.eligible.clear();
    }

    pub fn phase(&self) -> BannerPhase {
        if self.timer.is_some() {
            BannerPhase::Rotating
        } else {
            BannerPhase::Idle
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn eligible(&self) -> &[u32] {
        &self.eligible
    }

    /// Identity shown in the current slot
    pub fn current(&self) -> Option<u32> {
        self.index.and_then(|i| self.eligible.get(i).copied())
    }

    fn restart(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.generation += 1;
        self.index = Some(0);

        let token = CancellationToken::new();
        self.timer = Some(token.clone());

        let generation = self.generation;
        let period = self.interval;
        let ticks = self.ticks.clone();

        debug!(
            slots = self.eligible.len(),
            generation,
            interval_ms = period.as_millis() as u64,
            "Banner rotation started"
        );

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if ticks.send(BannerTick { generation }).is_err() {
                            break;
                        }
                    }
                }
            }
            trace!(generation, "Banner timer stopped");
        });
    }
}

impl Drop for BannerRotator {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const INTERVAL: Duration = Duration::from_millis(4000);

    fn rotator() -> (BannerRotator, mpsc::UnboundedReceiver<BannerTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (BannerRotator::new(INTERVAL, MAX_BANNER_SLOTS, tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_idle() {
        let (rotator, _rx) = rotator();
        assert_eq!(rotator.phase(), BannerPhase::Idle);
        assert_eq!(rotator.index(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advances_once_per_interval_and_wraps() {
        let (mut rotator, mut rx) = rotator();
        assert!(rotator.set_eligible([10, 20, 30]));
        assert_eq!(rotator.phase(), BannerPhase::Rotating);
        assert_eq!(rotator.index(), Some(0));

        let start = Instant::now();
        let mut seen = Vec::new();
        for _ in 0..4 {
            let tick = rx.recv().await.unwrap();
            seen.push(rotator.on_tick(tick).unwrap());
        }

        assert_eq!(seen, vec![1, 2, 0, 1]);
        assert!(start.elapsed() >= INTERVAL * 4);
        assert!(start.elapsed() < INTERVAL * 4 + Duration::from_millis(10));
        assert_eq!(rotator.current(), Some(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_index_stays_below_slot_cap() {
        let (mut rotator, mut rx) = rotator();
        rotator.set_eligible(1..=21);
        assert_eq!(rotator.eligible().len(), 5);

        for _ in 0..12 {
            let tick = rx.recv().await.unwrap();
            let index = rotator.on_tick(tick).unwrap();
            assert!(index < 5);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_count_never_exceeds_cap() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut rotator = BannerRotator::new(INTERVAL, 8, tx);
        rotator.set_eligible(1..=21);
        assert_eq!(rotator.eligible(), &[1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_changed_set_restarts_from_zero() {
        let (mut rotator, mut rx) = rotator();
        rotator.set_eligible([1, 2, 3]);
        let tick = rx.recv().await.unwrap();
        assert_eq!(rotator.on_tick(tick), Some(1));

        sleep(Duration::from_millis(1000)).await;
        assert!(rotator.set_eligible([7, 8]));
        assert_eq!(rotator.index(), Some(0));

        // Next tick comes a full interval after the restart
        let restarted = Instant::now();
        let tick = rx.recv().await.unwrap();
        assert!(restarted.elapsed() >= INTERVAL);
        assert!(restarted.elapsed() < INTERVAL + Duration::from_millis(10));
        assert_eq!(rotator.on_tick(tick), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_set_keeps_rotating() {
        let (mut rotator, mut rx) = rotator();
        rotator.set_eligible([1, 2, 3]);
        let tick = rx.recv().await.unwrap();
        rotator.on_tick(tick);

        assert!(!rotator.set_eligible([1, 2, 3]));
        assert_eq!(rotator.index(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_from_old_generation_are_ignored() {
        let (mut rotator, _rx) = rotator();
        rotator.set_eligible([1, 2]);
        let old = BannerTick {
            generation: rotator.generation,
        };
        rotator.set_eligible([3, 4]);

        assert_eq!(rotator.on_tick(old), None);
        assert_eq!(rotator.index(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_set_goes_idle_and_stops_timer() {
        let (mut rotator, mut rx) = rotator();
        rotator.set_eligible([1, 2]);
        assert!(rotator.set_eligible(std::iter::empty::<u32>()));

        assert_eq!(rotator.phase(), BannerPhase::Idle);
        assert_eq!(rotator.index(), None);

        sleep(INTERVAL * 3).await;
        assert!(rx.try_recv().is_err());

        // Stopping again is harmless
        rotator.stop();
        assert_eq!(rotator.phase(), BannerPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_timer() {
        let (mut rotator, mut rx) = rotator();
        rotator.set_eligible([1, 2]);
        drop(rotator);

        sleep(INTERVAL * 2).await;
        // Sender dropped with the rotator and the timer task has exited
        assert!(rx.recv().await.is_none());
    }
}
