//! Mediatag API Library
//!
//! HTTP surface for the media catalog: handlers, error rendering, state and
//! application setup.

mod api_doc;
mod handlers;
mod utils;

pub mod error;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
