//! # Clause Markup
//!
//! Typed rich-content model for contract template pages, plus the tokenizer,
//! parser and serializer for the stored markup dialect.
//!
//! ```text
//! stored page markup ──parse──▶ Content (Element / Text / Placeholder / Comment)
//!         ▲                                   │
//!         └──────────────serialize────────────┘
//! ```
//!
//! Placeholders are a distinct node variant rather than styled spans, so a
//! placeholder can never contain another placeholder once parsed. Legacy
//! markup that nests placeholder spans is flattened while parsing.

pub mod ast;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::{
    derive_key, display_text, Attribute, Content, Element, FieldType, Node, NodePath, Placeholder,
};
pub use error::{ParseError, ParseResult};
pub use parser::{decode_entities, parse, Parser};
pub use serializer::{join_pages, serialize, split_pages, Serializer, PAGE_DELIMITER};
pub use tokenizer::{tokenize, Token};
