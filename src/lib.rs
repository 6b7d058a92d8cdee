//! # podwire
//!
//! Protocol engine and controller for editing a multi-effects hardware unit
//! over its raw device transport.
//!
//! ## Architecture
//!
//! - **Protocol** ([`protocol`]): raw frames and the message wire format
//! - **Messages** ([`message`]): reassembly, registry, decoders and encoders
//! - **Model** ([`model`]): items, parameters, presets and sets behind one
//!   board-wide lock
//! - **Controller** ([`controller`]): reader, processor, monitor and writer
//!   tasks plus the action API
//!
//! ## Example
//!
//! ```
//! use podwire::controller::Controller;
//! use podwire::transport::MemoryDevice;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> podwire::Result<()> {
//! let controller = Controller::builder()
//!     .notify(|n| println!("{:?} {:?}", n.kind, n.target))
//!     .build(MemoryDevice::new());
//!
//! controller.start("pod").await?;
//! controller.set_item_active(4, true).await?;
//! controller.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod error;
pub mod message;
pub mod model;
pub mod notify;
pub mod protocol;
pub mod transport;
pub mod writer;

pub use controller::{Controller, ControllerBuilder, ControllerState};
pub use error::{PodError, Result};
pub use notify::{ChangeKind, Notification, Target};
