mod backend;
mod marian;
mod translator;

pub use backend::{TranslationBackend, TranslationModel};
pub use marian::{MarianBackend, MarianModel};
pub use translator::{
    DEFAULT_MAX_LENGTH, ERROR_MARKER, Translator, TranslatorState, UNAVAILABLE_MARKER,
};
