use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// why one dashboard refresh cycle produced no update
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed reading from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "FETCH_TRANSPORT",
            FetchError::Status { .. } => "FETCH_STATUS",
            FetchError::Decode { .. } => "FETCH_DECODE",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO error on weather log '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on weather log '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let error = FetchError::Status {
            url: "http://station/api/current".to_string(),
            status: 503,
        };
        assert_eq!(error.to_string(), "http://station/api/current returned HTTP 503");
        assert_eq!(error.error_code(), "FETCH_STATUS");
    }

    #[test]
    fn test_transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let error = FetchError::Transport {
            url: "http://station/api/current".to_string(),
            source: Box::new(io),
        };
        assert!(error.to_string().ends_with("connection refused"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
