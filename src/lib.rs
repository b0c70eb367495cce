pub mod client;
pub mod config;
pub mod conversation;
pub mod documents;
pub mod error;
pub mod logging;
pub mod markup;
pub mod preview;
pub mod protocol;
pub mod stream;
pub mod theme;
pub mod ui;

pub use error::{Error, Result};
