use formats::DirectionKey;

/// A move the user has to approve before it happens.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    pub direction: Option<DirectionKey>,
    /// One entry confirms directly; several require a choice.
    pub destinations: Vec<String>,
}

impl PendingMove {
    pub fn to(destination: impl Into<String>) -> Self {
        Self {
            direction: None,
            destinations: vec![destination.into()],
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.destinations.len() > 1
    }
}
