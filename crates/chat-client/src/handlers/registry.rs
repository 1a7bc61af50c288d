//! Handler registry

use chat_core::BroadcastPayload;

/// Called with every broadcast payload
pub type MessageHandler = Box<dyn FnMut(&BroadcastPayload) + Send>;

/// Called with the named users (most recent first) and the lurker count
pub type PresenceHandler = Box<dyn FnMut(&[String], u32) + Send>;

/// Called when the robot roster should be re-fetched
pub type AgentListHandler = Box<dyn FnMut() + Send>;

/// Called with `(human_typing, agent_typing)`
pub type TypingHandler = Box<dyn FnMut(bool, bool) + Send>;

/// Four replaceable handler slots
#[derive(Default)]
pub struct HandlerRegistry {
    message: Option<MessageHandler>,
    presence: Option<PresenceHandler>,
    agent_list: Option<AgentListHandler>,
    typing: Option<TypingHandler>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_message<F>(&mut self, handler: F)
    where
        F: FnMut(&BroadcastPayload) + Send + 'static,
    {
        self.message = Some(Box::new(handler));
    }

    pub fn set_presence<F>(&mut self, handler: F)
    where
        F: FnMut(&[String], u32) + Send + 'static,
    {
        self.presence = Some(Box::new(handler));
    }

    pub fn set_agent_list<F>(&mut self, handler: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.agent_list = Some(Box::new(handler));
    }

    pub fn set_typing<F>(&mut self, handler: F)
    where
        F: FnMut(bool, bool) + Send + 'static,
    {
        self.typing = Some(Box::new(handler));
    }

    /// Empty every slot
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn notify_message(&mut self, payload: &BroadcastPayload) {
        if let Some(handler) = self.message.as_mut() {
            handler(payload);
        }
    }

    pub(crate) fn notify_presence(&mut self, users: &[String], lurkers: u32) {
        if let Some(handler) = self.presence.as_mut() {
            handler(users, lurkers);
        }
    }

    pub(crate) fn notify_agent_list(&mut self) {
        if let Some(handler) = self.agent_list.as_mut() {
            handler();
        }
    }

    pub(crate) fn notify_typing(&mut self, human: bool, agent: bool) {
        if let Some(handler) = self.typing.as_mut() {
            handler(human, agent);
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("message", &self.message.is_some())
            .field("presence", &self.presence.is_some())
            .field("agent_list", &self.agent_list.is_some())
            .field("typing", &self.typing.is_some())
            .finish()
    }
}
