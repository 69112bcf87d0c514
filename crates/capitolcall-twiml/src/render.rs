//! The explicit speech-rendering step.
//!
//! Every prompt the flow produces goes through [`SpeechRenderer::speech`]:
//! if a pre-rendered audio clip exists for the text in the caller's locale,
//! the rendered verb is a `Play`; otherwise it is a `Say` carrying the
//! stored translation (identity for the default language). Clip inventory
//! comes from a JSON manifest produced by the audio pipeline; translations
//! are pre-seeded rows loaded from the database at startup.

use crate::markup::Verb;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use thiserror::Error;

/// Hex SHA-256 of the source text. Clip manifests and the translation table
/// are both keyed by this hash so prompt wording changes invalidate stale
/// recordings and translations automatically.
pub fn text_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Errors loading the audio manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse audio manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct Manifest {
    /// Base URL the telephony provider fetches clips from.
    root: String,
    /// language code -> clip key (logical name or text hash) -> filename.
    clips: HashMap<String, HashMap<String, String>>,
}

/// Inventory of pre-rendered audio clips, per locale.
#[derive(Debug, Clone)]
pub struct AudioLibrary {
    root: String,
    clips: HashMap<String, HashMap<String, String>>,
}

impl AudioLibrary {
    /// Parses the JSON manifest emitted by the audio rendering pipeline.
    pub fn from_manifest_str(json: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_str(json)?;
        Ok(Self {
            root: manifest.root.trim_end_matches('/').to_string(),
            clips: manifest.clips,
        })
    }

    /// An empty library rooted at the given URL. Useful in tests.
    pub fn empty(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            clips: HashMap::new(),
        }
    }

    /// Registers a clip. Test and tooling hook; production inventories come
    /// from the manifest.
    pub fn insert(&mut self, language: &str, key: &str, filename: &str) {
        self.clips
            .entry(language.to_string())
            .or_default()
            .insert(key.to_string(), filename.to_string());
    }

    /// Resolves the URL for a clip key in the given locale, if present.
    pub fn url_for(&self, key: &str, language: &str) -> Option<String> {
        let filename = self.clips.get(language)?.get(key)?;
        Some(format!("{}/{}/{}", self.root, language, filename))
    }
}

/// Pre-seeded prompt translations keyed by (language, source-text hash).
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: HashMap<(String, String), String>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a translation for a source text.
    pub fn insert(&mut self, language: &str, source_text: &str, translation: &str) {
        self.insert_hashed(language, &text_hash(source_text), translation);
    }

    /// Inserts a translation keyed by an already-computed hash (the form
    /// the database rows arrive in).
    pub fn insert_hashed(&mut self, language: &str, hash: &str, translation: &str) {
        self.entries.insert(
            (language.to_string(), hash.to_string()),
            translation.to_string(),
        );
    }

    /// Looks up the stored translation for the text in the given language.
    pub fn translate(&self, text: &str, language: &str) -> Option<&str> {
        self.entries
            .get(&(language.to_string(), text_hash(text)))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Renders prompt text into a wire verb for a given locale.
#[derive(Debug, Clone)]
pub struct SpeechRenderer {
    audio: Option<AudioLibrary>,
    translations: TranslationTable,
    default_language: String,
    voice: Option<String>,
}

impl SpeechRenderer {
    pub fn new(default_language: impl Into<String>, voice: Option<String>) -> Self {
        Self {
            audio: None,
            translations: TranslationTable::new(),
            default_language: default_language.into(),
            voice,
        }
    }

    pub fn with_audio(mut self, audio: AudioLibrary) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_translations(mut self, translations: TranslationTable) -> Self {
        self.translations = translations;
        self
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Renders spoken text for the locale.
    ///
    /// Pre-rendered audio wins when a clip exists for this exact text in
    /// this locale; otherwise the text is spoken, translated if a stored
    /// translation exists and the locale is not the default.
    pub fn speech(&self, text: &str, language: &str) -> Verb {
        if let Some(audio) = &self.audio {
            if let Some(url) = audio.url_for(&text_hash(text), language) {
                return Verb::play(url);
            }
        }

        let spoken = if language == self.default_language {
            text.to_string()
        } else {
            self.translations
                .translate(text, language)
                .map(str::to_string)
                .unwrap_or_else(|| text.to_string())
        };

        Verb::Say {
            text: spoken,
            language: Some(language.to_string()),
            voice: self.voice.clone(),
        }
    }

    /// Renders a named clip (e.g. "intro") for the locale, falling back to
    /// the default locale's recording when the localized one is missing.
    pub fn audio(&self, key: &str, language: &str) -> Option<Verb> {
        let audio = self.audio.as_ref()?;
        audio
            .url_for(key, language)
            .or_else(|| audio.url_for(key, &self.default_language))
            .map(Verb::play)
    }
}
