//! Client side of the AMAS gateway wire protocol.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐      TCP, one connection     ┌─────────────────────┐
//! │  amas-console   │  ──── per request ─────────► │   AMAS gateway      │
//! │  (round_trip)   │  ◄── single response ─────── │   (ingw server)     │
//! └─────────────────┘                              └─────────────────────┘
//! ```
//!
//! # Protocol
//!
//! Every message carries a fixed 10-character header with the body's UTF-8
//! byte length:
//!
//! ```text
//! (00000019){"cmd":"heartBeat"}
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use amas_console::wire::{round_trip, ExchangeOptions, Target};
//!
//! let target = Target::new("127.0.0.1", 15021);
//! let outcome = round_trip(&target, r#"{"cmd":"heartBeat"}"#, &ExchangeOptions::default()).await?;
//! println!("{}", outcome.display_text());
//! ```

mod client;
mod framing;
mod request;

pub use client::{
    exchange, round_trip, send_prepared, ExchangeError, ExchangeOptions, ExchangeOutcome,
    ExchangeState, ReadStrategy, Target, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS,
    RECV_BUFFER_SIZE,
};
pub use framing::{
    declared_length, extract_body, frame, length_mismatch, FrameError, ResponseBody, HEADER_LEN,
    INVALID_FORMAT, MAX_PAYLOAD_LEN,
};
pub use request::{PreparedRequest, RequestError};
