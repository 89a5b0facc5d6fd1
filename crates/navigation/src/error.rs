#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    EmptyPath,
    UnknownNode { id: String },
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationError::EmptyPath => write!(f, "navigation path is empty"),
            NavigationError::UnknownNode { id } => write!(f, "unknown node in path: {id}"),
        }
    }
}

impl std::error::Error for NavigationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmError {
    NothingPending,
    /// Several destinations are possible and no choice was given.
    ChoiceRequired { options: Vec<String> },
    InvalidChoice { choice: String },
}

impl std::fmt::Display for ConfirmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmError::NothingPending => write!(f, "no navigation awaiting confirmation"),
            ConfirmError::ChoiceRequired { options } => {
                write!(f, "choose one of: {}", options.join(", "))
            }
            ConfirmError::InvalidChoice { choice } => {
                write!(f, "{choice} is not one of the offered destinations")
            }
        }
    }
}

impl std::error::Error for ConfirmError {}
