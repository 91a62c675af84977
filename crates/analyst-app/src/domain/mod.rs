//! Domain layer: chat, layer and document state and the services that move
//! it forward.

pub mod models;
pub mod services;
