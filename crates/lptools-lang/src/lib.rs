pub mod lexer;
pub mod parser;
pub mod statement;

pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::{parse, parse_statement, ParseError};
pub use statement::{to_statement, ObjectiveFunction, ProblemStatement};
