pub mod keywords;
pub mod text;
mod translator;

pub use translator::{LlmTranslator, TextKind, Translator};
