//! Infrastructure layer: document exporters.
//!
//! Markdown from the assistant or the backend is parsed once into blocks and
//! written out as DOCX or PDF.

pub mod exporters;
