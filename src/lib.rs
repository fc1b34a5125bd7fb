//! Translate clipboard or selected text with a locally running Ollama server,
//! streaming the answer into whatever surface is listening.

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod logger;
pub mod prompt;
pub mod protocol;
pub mod result;
pub mod source;
pub mod ticker;
pub mod translator;

pub use client::{Client, FrameHandler};
pub use config::Config;
pub use display::{ChannelDisplay, DisplayEvent, DisplaySink};
pub use error::{Error, ErrorKind, Result, SourceError, TranslateError};
pub use prompt::PromptTemplate;
pub use result::{TranslationResult, TranslationState};
pub use source::TextSource;
pub use translator::Translator;
