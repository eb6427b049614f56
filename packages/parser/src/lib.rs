pub mod ast;
pub mod error;
pub mod header;
pub mod id_generator;
pub mod parser;
pub mod path;
pub mod serializer;
pub mod tokenizer;

#[cfg(test)]
mod tests_parser;

#[cfg(test)]
mod tests_serializer;

pub use ast::*;
pub use error::{ParseError, ParseResult};
pub use id_generator::{get_component_id, get_document_id};
pub use parser::{parse, parse_with_path, Parser};
pub use path::{NodePath, Step};
pub use serializer::{serialize, Serializer};
pub use tokenizer::{tokenize, Token};
