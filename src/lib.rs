mod ast;
mod html;
mod inline;
pub mod lexer;
pub mod markdown;
mod parser;
pub mod utils;

pub use ast::{Block, Document, Inline, ListInfo, Node, NodeId, Reference, ReferenceMap};
pub use markdown::{parse, render, to_html};
