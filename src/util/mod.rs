//! Utility functions shared by the fetcher, the renderer and configuration.
//!
//! - **URL validation**: base URL checks that keep the access token off plain HTTP
//! - **Text processing**: removal of characters XML cannot carry

mod text;
mod url_validator;

pub use text::strip_invalid_xml_chars;
pub use url_validator::{validate_api_base_url, validate_public_base_url, UrlValidationError};
