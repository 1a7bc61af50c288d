//! RoboChatter entity - an automated chat participant

use serde::{Deserialize, Serialize};

/// Chat text announcing that a robot was switched on
pub const ROBOT_ENABLED_TEXT: &str = "enabled a robot...";
/// Chat text announcing that a robot was switched off
pub const ROBOT_DISABLED_TEXT: &str = "disabled a robot...";

/// An automated chatter as listed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoboChatter {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
}

impl RoboChatter {
    /// Create a new RoboChatter
    pub fn new(id: i64, name: impl Into<String>, enabled: bool) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            enabled,
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Chat text announcing this robot's current status
    #[must_use]
    pub fn announcement(&self) -> &'static str {
        robot_toggle_announcement(self.enabled)
    }
}

/// Chat text announcing a robot toggle
#[must_use]
pub fn robot_toggle_announcement(enabled: bool) -> &'static str {
    if enabled {
        ROBOT_ENABLED_TEXT
    } else {
        ROBOT_DISABLED_TEXT
    }
}

/// Check if a chat line is a robot toggle announcement
#[must_use]
pub fn is_robot_action_message(text: &str) -> bool {
    text.contains(ROBOT_ENABLED_TEXT) || text.contains(ROBOT_DISABLED_TEXT)
}
