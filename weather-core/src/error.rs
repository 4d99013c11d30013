use thiserror::Error;

/// Failure of a lookup against an external provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The geocoder returned no results for the query.
    #[error("no geocoding results for '{0}'")]
    NotFound(String),

    /// Transport failure, non-2xx status or a malformed response.
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}
