//! `meteo-feed` — getting the XML document and turning it into JSON.
//!
//! - [`normalize_source_url`] rewrites paste-site page URLs to raw content.
//! - [`HttpFetcher`] performs one bounded GET and validates the body.
//! - [`convert`] transcodes XML to a JSON object; [`stamp`] adds the
//!   `timestamp` field.

pub mod convert;
pub mod error;
pub mod fetch;
pub mod normalize;

pub use convert::{convert, stamp, stamp_at, validate};
pub use error::{ConvertError, FetchError};
pub use fetch::{FeedSource, FetchOptions, HttpFetcher};
pub use normalize::normalize_source_url;
