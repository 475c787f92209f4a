//! Fixed-period heartbeat scheduler for Matchforge.
//!
//! A [`Heartbeat`] fires on a fixed period until it is dropped or
//! [stopped](Heartbeat::stop). Match controllers hold one only while they
//! are waiting for both players to confirm readiness, as an
//! `Option<Heartbeat>`: `Some` means the ready-check is armed, `None`
//! means it is not, and taking it out of the option is the cancellation.
//!
//! # Integration
//!
//! The heartbeat has no task of its own. It is polled from the match
//! actor's `tokio::select!` loop, so every beat is serialized with the
//! commands the match processes:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* connect, ready, ... */ }
//!         beat = heartbeat.tick() => { /* emit ready-check */ }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when the heartbeat could not fire on time (the match task
/// was busy, e.g. waiting on a slow store write).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissPolicy {
    /// Drop the missed beats and keep the original cadence.
    #[default]
    Skip,
    /// Fire the missed beats back to back.
    Burst,
    /// Fire once, then restart the period from now.
    Delay,
}

impl From<MissPolicy> for MissedTickBehavior {
    fn from(policy: MissPolicy) -> Self {
        match policy {
            MissPolicy::Skip => MissedTickBehavior::Skip,
            MissPolicy::Burst => MissedTickBehavior::Burst,
            MissPolicy::Delay => MissedTickBehavior::Delay,
        }
    }
}

/// Configuration for a [`Heartbeat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Time between beats. The first beat fires one period after start.
    pub period: Duration,
    /// Missed-beat handling.
    pub miss_policy: MissPolicy,
    /// Random delay (0..=max) added before the first beat, so matches
    /// that become ready at the same instant don't beat in lockstep.
    pub initial_jitter: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            miss_policy: MissPolicy::default(),
            initial_jitter: Duration::ZERO,
        }
    }
}

impl HeartbeatConfig {
    /// Shortest supported period.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);
    /// Longest supported period.
    pub const MAX_PERIOD: Duration = Duration::from_secs(60);

    /// A config with the given period and default everything else.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called by [`Heartbeat::start`]. The period is clamped to
    /// [`MIN_PERIOD`](Self::MIN_PERIOD)..=[`MAX_PERIOD`](Self::MAX_PERIOD)
    /// and the jitter to at most one period.
    pub fn validated(mut self) -> Self {
        let clamped = self.period.clamp(Self::MIN_PERIOD, Self::MAX_PERIOD);
        if clamped != self.period {
            warn!(
                requested_ms = self.period.as_millis() as u64,
                clamped_ms = clamped.as_millis() as u64,
                "heartbeat period out of range, clamping"
            );
            self.period = clamped;
        }
        if self.initial_jitter > self.period {
            self.initial_jitter = self.period;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

/// One completed beat, returned by [`Heartbeat::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beat {
    /// Monotonically increasing beat number (starts at 1).
    pub seq: u64,
}

/// A repeating fixed-period timer.
pub struct Heartbeat {
    interval: Interval,
    period: Duration,
    beats: u64,
}

impl Heartbeat {
    /// Arms a new heartbeat. The first beat is due one period (plus
    /// jitter) from now.
    pub fn start(config: HeartbeatConfig) -> Self {
        let config = config.validated();

        let jitter = if config.initial_jitter.is_zero() {
            Duration::ZERO
        } else {
            let max_us = config.initial_jitter.as_micros() as u64;
            Duration::from_micros(rand::rng().random_range(0..=max_us))
        };

        let mut interval =
            time::interval_at(Instant::now() + config.period + jitter, config.period);
        interval.set_missed_tick_behavior(config.miss_policy.into());

        debug!(
            period_ms = config.period.as_millis() as u64,
            jitter_us = jitter.as_micros() as u64,
            policy = ?config.miss_policy,
            "heartbeat started"
        );

        Self {
            interval,
            period: config.period,
            beats: 0,
        }
    }

    /// Waits for the next beat.
    ///
    /// Cancel-safe: dropping the future before it resolves does not lose
    /// or double-count a beat, so it can sit in a `select!` loop.
    pub async fn tick(&mut self) -> Beat {
        self.interval.tick().await;
        self.beats += 1;
        trace!(beat = self.beats, "heartbeat");
        Beat { seq: self.beats }
    }

    /// Stops the heartbeat and returns how many beats it fired.
    ///
    /// Takes `self` by value, so a stopped heartbeat cannot be stopped or
    /// polled again.
    pub fn stop(self) -> u64 {
        debug!(beats = self.beats, "heartbeat stopped");
        self.beats
    }

    /// Beats fired so far.
    pub fn beats(&self) -> u64 {
        self.beats
    }

    /// The (validated) period.
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl std::fmt::Debug for Heartbeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heartbeat")
            .field("period", &self.period)
            .field("beats", &self.beats)
            .finish()
    }
}
