//! Domain entities

mod robo_chatter;

pub use robo_chatter::{is_robot_action_message, robot_toggle_announcement, RoboChatter};
