//! ingen-lex - Lexers for the ingen code generator.
//!
//! Two source languages are tokenized here:
//!
//! - The **inspect language** (`.ins` files): declarations of structs,
//!   nominal types, imports and attributes. One token stream per file,
//!   free-form whitespace, `//` and `/* */` comments.
//! - The **template language**: literal text interleaved with `$...$`
//!   expression regions. The lexer is a dual-mode scanner that flips
//!   between Text mode and Expression mode every time it crosses a `$`.
//!
//! Both lexers are forward-only; the parsers keep every produced token in
//! a [`TokenStream`] so they can re-read and jump (loops and procedure
//! bodies are evaluated by moving the cursor over already-recorded
//! tokens).

pub mod cursor;
pub mod inspect;
pub mod stream;
pub mod template;
pub mod token;

pub use cursor::Cursor;
pub use inspect::InspectLexer;
pub use stream::TokenStream;
pub use template::TemplateLexer;
pub use token::{InspectKind, InspectToken, TemplateKind, TemplateToken};
