//! Text processing shared by the source clients
//!
//! - `normalize` - label cleanup and case-insensitive de-duplication
//! - `image` - canonical image URLs
//! - `html` - markup to plain text
//! - `article` - section, list and paragraph extraction

pub mod article;
pub mod html;
pub mod image;
pub mod normalize;

pub use article::{
    extract_list, extract_paragraphs, extract_section, fragment_items, fragment_text, page_title,
    truncate,
};
pub use normalize::{clean_label, dedupe, is_ui_friendly, merge_unique, split_packed};
