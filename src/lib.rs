//! Three shared-state containers behind one chat screen.
//!
//! A small single-threaded reactive runtime ([`core`]) drives widgets that
//! share the chat state through a [`store::ChatStore`]. The containers differ
//! only in how a reader subscribes to part of the state.
pub mod clock;
pub mod core;
pub mod store;
pub mod widgets;

mod command;
mod config;
mod effect;
mod error;
mod keyboard;
mod message;
mod state;
mod subscription;

pub use command::*;
pub use config::*;
pub use self::core::{spawn_action, ActionContext, Runtime, SignalContext};
pub use effect::*;
pub use error::*;
pub use keyboard::*;
pub use message::*;
pub use state::*;
pub use subscription::*;
