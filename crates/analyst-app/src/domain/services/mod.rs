mod app_state;
mod chat_service;
mod chat_store;
mod document_service;
mod document_store;
mod export_service;
mod layer_store;
mod session_service;
mod sessions;
mod updates;

pub use app_state::*;
pub use chat_service::*;
pub use chat_store::*;
pub use document_service::*;
pub use document_store::*;
pub use export_service::*;
pub use layer_store::*;
pub use session_service::*;
pub use sessions::*;
pub use updates::*;
