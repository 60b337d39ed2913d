//! Page rendering for MovieHub.
//!
//! Templates are plain HTML files with `{{ name }}` placeholders. Rendering
//! is pure substitution; loading templates from disk is the only I/O.

pub mod pages;
pub mod template;

pub use pages::{PageRenderer, Templates, DEFAULT_INDEX_TEMPLATE, DEFAULT_MOVIE_TEMPLATE, UNKNOWN_DIRECTOR};
pub use template::{escape_html, render};
