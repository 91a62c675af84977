mod docx;
mod markdown;
mod pdf;

pub use docx::render as render_docx;
pub use markdown::*;
pub use pdf::render as render_pdf;
