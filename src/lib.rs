//! Lectern - endpoint dispatch runtime for Canvas-style REST APIs
//!
//! This crate turns a declarative catalogue of endpoints (path template,
//! HTTP method, required parameters) into a tree of callable operations.
//! Every call resolves its configuration against the client's defaults,
//! goes through a shared response cache, retries transient failures and
//! follows pagination until the whole result has been assembled.
//! Mutating calls invalidate the cached paths they name, including
//! prefix wildcards.
//!
//! # Example
//!
//! ```rust,no_run
//! use lectern::{CallOptions, CategoryDescriptor, EndpointDef, Lectern};
//!
//! #[tokio::main]
//! async fn main() -> lectern::Result<()> {
//!     let api = Lectern::builder()
//!         .host("school.instructure.com")
//!         .access_token("secret")
//!         .cache("memory")
//!         .catalogue(
//!             CategoryDescriptor::new().category(
//!                 "courses",
//!                 CategoryDescriptor::new()
//!                     .endpoint("get", EndpointDef::get("get info on a course", "/courses/{course_id}"))
//!                     .endpoint(
//!                         "update",
//!                         EndpointDef::put("update a course", "/courses/{course_id}")
//!                             .required(["course"])
//!                             .uncache(["/courses/{course_id}*"]),
//!                     ),
//!             ),
//!         )
//!         .build()?;
//!
//!     let course = api
//!         .call("courses.get", CallOptions::new().param("course_id", 42))
//!         .await?;
//!     println!("{course}");
//!     Ok(())
//! }
//! ```
//!
//! # Transports
//!
//! The core only talks to the [`Transport`] trait. With the default `http`
//! feature, [`HttpTransport`] (reqwest) is used when no transport is given.

pub mod api;
pub mod builder;
pub mod cache;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod telemetry;
pub mod transport;
pub mod tree;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use api::{Api, Category, OperationInfo, OperationRef};
pub use builder::{Lectern, LecternBuilder};
pub use error::{LecternError, Result, TransportError};

pub use cache::{
    Cache, CacheEntry, CacheMode, CacheSelector, InMemorySession, MemoryCache, SessionCache,
    SessionStore,
};
pub use config::{ClientConfig, Defaults, EffectiveConfig, RetryPolicy};
pub use endpoint::{EndpointContext, EndpointDef, EndpointHandler};
pub use transport::{Transport, TransportRequest, TransportResponse};
pub use tree::{CategoryDescriptor, Member};
pub use types::{CallOptions, EndpointOutput, Method, Params};
pub use version::{PKG_VERSION, version_string};

#[cfg(feature = "http")]
pub use transport::HttpTransport;
