//! Length-prefixed message framing.
//!
//! Every message on the wire is a fixed-width ASCII decimal header followed
//! by exactly that many payload bytes. There is no delimiter; both peers
//! must agree on the header width (64 bytes by default).
//!
//! ## Protocol Format
//!
//! ```text
//! Header:  "16" padded with spaces to the header width
//! Payload: Message received
//! ```
//!
//! A header that decodes to 0, or a stream that ends before any header
//! byte arrives, means "no message".

pub mod channel;
pub mod frame;

pub use channel::FramedChannel;
pub use frame::{encode_header, parse_header, DEFAULT_HEADER_WIDTH, MIN_HEADER_WIDTH};
