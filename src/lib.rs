//! AMAS console library.
//!
//! Core pieces of the AMAS gateway test client:
//!
//! - `wire` - envelope framing, response unwrapping and the TCP exchange
//! - `bridge` - background worker that runs exchanges off the UI thread
//! - `models` - command templates and exchange history
//! - `config` - layered configuration (defaults, TOML file, environment)
//! - `logging` - tracing subscriber setup
//!
//! # Sending a request
//!
//! ```no_run
//! use amas_console::wire::{round_trip, ExchangeOptions, Target};
//!
//! # async fn demo() -> Result<(), amas_console::wire::RequestError> {
//! let target = Target::new("127.0.0.1", 15021);
//! let outcome = round_trip(
//!     &target,
//!     r#"{"cmd":"heartBeat","sessionId":"abcde12345"}"#,
//!     &ExchangeOptions::default(),
//! )
//! .await?;
//! println!("{}", outcome.display_text());
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod logging;
pub mod models;
pub mod wire;
