//! Typing indicators
//!
//! Each indicator is a restartable countdown: arming it again replaces the
//! pending deadline instead of stacking another one. An indicator is shown
//! exactly while its countdown is armed.

use std::time::Duration;
use tokio::time::Instant;

/// Lifetime of a human typing indicator when the server gives none
pub const DEFAULT_TYPING_DURATION: Duration = Duration::from_secs(3);

/// Lifetime of a robot typing indicator
pub const AGENT_TYPING_DURATION: Duration = Duration::from_secs(3);

/// Longest time any indicator stays up
pub const MAX_TYPING_DURATION: Duration = Duration::from_secs(60 * 60);

/// A single restartable deadline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    deadline: Option<Instant>,
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the countdown, replacing any pending deadline
    ///
    /// Durations past [`MAX_TYPING_DURATION`] are cut down to it.
    pub fn arm(&mut self, now: Instant, duration: Duration) {
        let duration = duration.min(MAX_TYPING_DURATION);
        self.deadline = Some(now.checked_add(duration).unwrap_or(now));
    }

    /// Cancel the countdown. Returns `true` if it was armed.
    pub fn disarm(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fire the countdown if its deadline has passed
    ///
    /// Returns `true` exactly once per arming.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Human and robot typing indicators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypingState {
    human: Countdown,
    agent: Countdown,
}

impl TypingState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Some human chatter is typing
    #[must_use]
    pub fn is_human_typing(&self) -> bool {
        self.human.is_armed()
    }

    /// Some robot is typing
    #[must_use]
    pub fn is_agent_typing(&self) -> bool {
        self.agent.is_armed()
    }

    /// Both flags as `(human, agent)`
    #[must_use]
    pub fn flags(&self) -> (bool, bool) {
        (self.is_human_typing(), self.is_agent_typing())
    }

    /// (Re)start the human indicator. Returns `true` if the flag flipped on.
    pub fn start_human(&mut self, now: Instant, duration: Duration) -> bool {
        let was_typing = self.human.is_armed();
        self.human.arm(now, duration);
        !was_typing
    }

    /// (Re)start the robot indicator. Returns `true` if the flag flipped on.
    pub fn start_agent(&mut self, now: Instant) -> bool {
        let was_typing = self.agent.is_armed();
        self.agent.arm(now, AGENT_TYPING_DURATION);
        !was_typing
    }

    /// Drop every indicator whose countdown has run out
    ///
    /// Returns `true` if any flag flipped off.
    pub fn expire(&mut self, now: Instant) -> bool {
        let human = self.human.fire_if_due(now);
        let agent = self.agent.fire_if_due(now);
        human || agent
    }

    /// Earliest pending deadline, if any indicator is up
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.human.deadline(), self.agent.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Clear both indicators. Returns `true` if any flag flipped off.
    pub fn reset(&mut self) -> bool {
        let human = self.human.disarm();
        let agent = self.agent.disarm();
        human || agent
    }
}
