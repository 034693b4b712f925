use thiserror::Error;
use url::Url;

/// Reasons a configured sync endpoint is rejected.
#[derive(Error, Debug)]
pub enum EndpointError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("Endpoint URL has no host")]
    MissingHost,
    /// Credentials embedded in the URL would be logged alongside it.
    #[error("Endpoint URL must not embed credentials")]
    EmbeddedCredentials,
}

/// Validates the remote endpoint used for sync.
///
/// Localhost is allowed so a local mock server can stand in for the real
/// endpoint.
///
/// ```
/// use quoteshelf::util::validate_endpoint;
///
/// assert!(validate_endpoint("https://jsonplaceholder.typicode.com/posts").is_ok());
/// assert!(validate_endpoint("http://127.0.0.1:8080/posts").is_ok());
/// assert!(validate_endpoint("file:///etc/passwd").is_err());
/// ```
pub fn validate_endpoint(url_str: &str) -> Result<Url, EndpointError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(EndpointError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(EndpointError::MissingHost);
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(EndpointError::EmbeddedCredentials);
    }

    Ok(url)
}
