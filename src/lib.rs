//! random-names: a framed TCP service for random baby names.
//!
//! A client sends one length-prefixed JSON request naming a gender and a
//! starting letter; the server acknowledges it, samples ten names from a
//! paginated web catalog and answers with a JSON array (or a plain-text
//! error) in the same framing.

pub mod catalog;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod validator;

pub use catalog::{HttpCatalog, NameCatalog, NameRecord};
pub use config::Config;
pub use error::{CatalogError, ConfigError, FrameError, SessionError, ValidationError};
pub use protocol::FramedChannel;
pub use server::Server;
pub use validator::{validate, Criteria, Gender};
