//! The single user-visible status line.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    None,
    Success(String),
    Error(String),
}

impl Status {
    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Status::None => None,
            Status::Success(text) | Status::Error(text) => Some(text),
        }
    }
}

/// Holds at most one message; setting either kind replaces the other.
#[derive(Debug, Default)]
pub struct StatusChannel {
    current: Status,
}

impl StatusChannel {
    pub fn current(&self) -> &Status {
        &self.current
    }

    pub fn clear(&mut self) {
        self.current = Status::None;
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.current = Status::Success(message.into());
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.current = Status::Error(message.into());
    }
}
