//! Runtime value model and bounded stringification.
//!
//! [`Value`] stands in for the dynamically typed arguments a console method
//! receives. [`stringify`] turns any value, including self-referential
//! graphs, into text bounded by [`StringifyOptions`].

pub mod error;
pub mod stringify;
pub mod value;

pub use error::StringifyError;
pub use logtap_protocol::StringifyOptions;
pub use stringify::{TRUNCATION_MARKER, stringify, truncate};
pub use value::{ArrayValue, ErrorValue, ObjectValue, TextConversion, Value};
