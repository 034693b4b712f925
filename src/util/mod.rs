//! Small helpers shared by the store, the view layer and the sync client.
//!
//! - **Text**: control-character stripping and width-aware truncation for
//!   terminal output
//! - **Endpoint validation**: scheme/host checks for the remote sync URL

mod endpoint;
mod text;

pub use endpoint::{validate_endpoint, EndpointError};
pub use text::{display_width, sanitize_field, strip_control_chars, truncate_to_width};
