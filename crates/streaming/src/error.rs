/// Why an asset (photo texture or marker icon) could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    Http { url: String, status: u16 },
    Network { url: String, message: String },
    Decode { url: String, message: String },
    /// The load was dropped before it produced a value.
    Cancelled,
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Http { url, status } => write!(f, "GET {url} returned HTTP {status}"),
            AssetError::Network { url, message } => write!(f, "fetching {url} failed: {message}"),
            AssetError::Decode { url, message } => write!(f, "decoding {url} failed: {message}"),
            AssetError::Cancelled => write!(f, "asset load cancelled"),
        }
    }
}

impl std::error::Error for AssetError {}
