//! Voice-markup production for Capitol Call.
//!
//! Two concerns live here:
//!
//! - [`Twiml`] / [`Verb`]: a typed builder for the telephony provider's XML
//!   response document (`Say`, `Play`, `Gather`, `Redirect`, `Dial`,
//!   `Record`). The provider owns the schema; this crate only has to emit
//!   it correctly, including nested gather bodies and text escaping.
//! - [`SpeechRenderer`]: the explicit rendering step between "what the flow
//!   wants to say" and "what goes on the wire". When a pre-rendered audio
//!   clip exists for the text in the caller's locale it plays the clip;
//!   otherwise it speaks the stored translation (or the original text for
//!   the default language). This is a deliberate, visible branch, with no
//!   patching of the markup types.

mod markup;
mod render;

pub use markup::{Gather, Twiml, Verb};
pub use render::{text_hash, AudioLibrary, ManifestError, SpeechRenderer, TranslationTable};
