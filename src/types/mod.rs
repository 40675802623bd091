//! Public types for the Lectern API.

mod method;
mod options;
mod output;

pub use method::Method;
pub use options::{CallOptions, Params};
pub use output::EndpointOutput;
