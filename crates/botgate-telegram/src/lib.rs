//! Botgate Telegram - the Bot API surface behind the pipeline.
//!
//! Two concerns:
//!
//! - [`MethodRegistry`]: a precomputed, **total** table mapping every
//!   known Bot API method name to exactly one [`MethodFamily`] and one
//!   risk level. The table is built once by running ordered regex sets
//!   over the method list; lookups at call time are plain hash lookups,
//!   and unknown method names are rejected with a typed error instead of
//!   a runtime lookup failure.
//! - [`Invoker`]: the domain-operation boundary. The pipeline hands it a
//!   resolved payload and account reference and treats anything it throws
//!   as an execution failure. [`HttpInvoker`] is the reqwest-backed
//!   implementation with a per-request timeout and bounded, capped
//!   exponential backoff on 429/5xx/transport errors.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod invoker;
pub mod methods;

pub use error::{InvokeError, TelegramError};
pub use invoker::{HttpInvoker, Invoker, RetryPolicy};
pub use methods::{MethodFamily, MethodInfo, MethodRegistry};
