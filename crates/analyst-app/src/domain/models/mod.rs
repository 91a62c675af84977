mod document;
mod event;
mod layer;
mod message;
mod session;
mod slash_command;

pub use document::*;
pub use event::*;
pub use layer::*;
pub use message::*;
pub use session::*;
pub use slash_command::*;
