//! Operator feedback
//!
//! A single notice slot: a new notice replaces the visible one and restarts
//! its expiry. Every notice is also emitted as a tracing event.

use crate::config::FeedbackConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Toggle confirmations and similar chatter
    Routine,
    /// Completed write
    Success,
    /// Degraded but usable
    Warning,
    /// Failed operation
    Error,
    /// Blocked by dependent findings
    Constraint,
}

/// One visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Text shown to the operator
    pub message: String,
    /// Severity
    pub severity: Severity,
    /// How long it stays visible
    pub duration: Duration,
    /// Monotonic notice number
    pub seq: u64,
    issued_at: Instant,
}

impl Notice {
    /// When the notice stops being visible
    #[inline]
    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.issued_at + self.duration
    }

    /// Check if the notice is still visible at `now`
    #[inline]
    #[must_use]
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now < self.expires_at()
    }
}

/// Single-slot notice channel
#[derive(Debug)]
pub struct FeedbackChannel {
    slot: watch::Sender<Option<Notice>>,
    next_seq: AtomicU64,
    config: FeedbackConfig,
}

impl FeedbackChannel {
    /// Create channel with per-severity durations
    #[must_use]
    pub fn new(config: FeedbackConfig) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot,
            next_seq: AtomicU64::new(1),
            config,
        }
    }

    /// Show `message` for `duration`, replacing any visible notice
    ///
    /// Returns the notice number.
    pub fn notify(&self, message: impl Into<String>, duration: Duration) -> u64 {
        self.publish(message.into(), Severity::Routine, duration)
    }

    /// Show `message` with the configured duration for `severity`
    pub fn notify_with(&self, severity: Severity, message: impl Into<String>) -> u64 {
        self.publish(message.into(), severity, self.config.duration(severity))
    }

    fn publish(&self, message: String, severity: Severity, duration: Duration) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        match severity {
            Severity::Routine => tracing::debug!(seq, %message, "notice"),
            Severity::Success => tracing::info!(seq, %message, "notice"),
            Severity::Warning | Severity::Constraint => tracing::warn!(seq, %message, "notice"),
            Severity::Error => tracing::error!(seq, %message, "notice"),
        }
        self.slot.send_replace(Some(Notice {
            message,
            severity,
            duration,
            seq,
            issued_at: Instant::now(),
        }));
        seq
    }

    /// Visible notice, if any
    #[must_use]
    pub fn current(&self) -> Option<Notice> {
        let now = Instant::now();
        self.slot
            .borrow()
            .as_ref()
            .filter(|notice| notice.is_visible_at(now))
            .cloned()
    }

    /// Hide notice `seq`; a newer notice is left alone
    pub fn dismiss(&self, seq: u64) -> bool {
        self.slot.send_if_modified(|slot| {
            if slot.as_ref().is_some_and(|n| n.seq == seq) {
                *slot = None;
                true
            } else {
                false
            }
        })
    }

    /// Receiver that wakes on every new notice
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Notice>> {
        self.slot.subscribe()
    }
}

impl Default for FeedbackChannel {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}
