//! Application layer: the interactive chat loop and its text output.
//!
//! Nothing here touches the terminal directly. [`repl::Repl`] turns input
//! lines and socket events into printable blocks, and [`render`] formats the
//! domain state.

pub mod render;
pub mod repl;
