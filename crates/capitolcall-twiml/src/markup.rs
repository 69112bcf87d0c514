//! The voice response document and its verbs.

use std::fmt::Write;

/// Attributes for a `<Gather>` digit-collection window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    /// Number of digits to collect. `None` collects until the caller
    /// presses `#` (the provider's default finish key).
    pub num_digits: Option<u32>,
    /// Seconds to wait for input before falling through to the next verb.
    pub timeout: u32,
    /// URL the collected digits are posted to. `None` re-posts to the
    /// current document's URL.
    pub action: Option<String>,
}

impl Gather {
    /// A fixed-width digit window.
    pub fn digits(num_digits: u32, timeout: u32) -> Self {
        Self {
            num_digits: Some(num_digits),
            timeout,
            action: None,
        }
    }

    /// A variable-length entry window, terminated by `#`.
    pub fn entry(timeout: u32) -> Self {
        Self {
            num_digits: None,
            timeout,
            action: None,
        }
    }

    /// Sets the action URL the digits are posted to.
    pub fn action(mut self, url: impl Into<String>) -> Self {
        self.action = Some(url.into());
        self
    }
}

/// One voice action in the response document.
#[derive(Debug, Clone, PartialEq)]
pub enum Verb {
    Say {
        text: String,
        language: Option<String>,
        voice: Option<String>,
    },
    Play {
        url: String,
    },
    Gather {
        spec: Gather,
        body: Vec<Verb>,
    },
    Redirect {
        url: String,
    },
    Dial {
        number: String,
    },
    Record {
        timeout: u32,
        max_length: u32,
    },
}

impl Verb {
    /// Plain spoken text with no language/voice attributes.
    pub fn say(text: impl Into<String>) -> Self {
        Self::Say {
            text: text.into(),
            language: None,
            voice: None,
        }
    }

    /// Spoken text tagged with a language code.
    pub fn say_in(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Say {
            text: text.into(),
            language: Some(language.into()),
            voice: None,
        }
    }

    pub fn play(url: impl Into<String>) -> Self {
        Self::Play { url: url.into() }
    }

    fn write_xml(&self, out: &mut String) {
        match self {
            Self::Say {
                text,
                language,
                voice,
            } => {
                out.push_str("<Say");
                if let Some(voice) = voice {
                    let _ = write!(out, " voice=\"{}\"", escape(voice));
                }
                if let Some(language) = language {
                    let _ = write!(out, " language=\"{}\"", escape(language));
                }
                let _ = write!(out, ">{}</Say>", escape(text));
            }
            Self::Play { url } => {
                let _ = write!(out, "<Play>{}</Play>", escape(url));
            }
            Self::Gather { spec, body } => {
                out.push_str("<Gather");
                if let Some(n) = spec.num_digits {
                    let _ = write!(out, " numDigits=\"{n}\"");
                }
                let _ = write!(out, " timeout=\"{}\"", spec.timeout);
                if let Some(action) = &spec.action {
                    let _ = write!(out, " action=\"{}\"", escape(action));
                }
                out.push_str(" method=\"POST\">");
                for verb in body {
                    verb.write_xml(out);
                }
                out.push_str("</Gather>");
            }
            Self::Redirect { url } => {
                let _ = write!(out, "<Redirect>{}</Redirect>", escape(url));
            }
            Self::Dial { number } => {
                let _ = write!(out, "<Dial><Number>{}</Number></Dial>", escape(number));
            }
            Self::Record {
                timeout,
                max_length,
            } => {
                let _ = write!(
                    out,
                    "<Record timeout=\"{timeout}\" maxLength=\"{max_length}\"/>"
                );
            }
        }
    }
}

/// A voice response document: an ordered sequence of verbs inside the
/// provider's `<Response>` envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Twiml {
    verbs: Vec<Verb>,
}

impl Twiml {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an already-built verb (typically from the speech renderer).
    pub fn push(&mut self, verb: Verb) {
        self.verbs.push(verb);
    }

    /// Appends plain spoken text.
    pub fn say(&mut self, text: impl Into<String>) {
        self.verbs.push(Verb::say(text));
    }

    pub fn play(&mut self, url: impl Into<String>) {
        self.verbs.push(Verb::play(url));
    }

    pub fn redirect(&mut self, url: impl Into<String>) {
        self.verbs.push(Verb::Redirect { url: url.into() });
    }

    pub fn dial(&mut self, number: impl Into<String>) {
        self.verbs.push(Verb::Dial {
            number: number.into(),
        });
    }

    pub fn record(&mut self, timeout: u32, max_length: u32) {
        self.verbs.push(Verb::Record {
            timeout,
            max_length,
        });
    }

    /// Opens a digit-collection window; the closure fills its nested body.
    pub fn gather<F: FnOnce(&mut Twiml)>(&mut self, spec: Gather, f: F) {
        let mut body = Twiml::new();
        f(&mut body);
        self.verbs.push(Verb::Gather {
            spec,
            body: body.verbs,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// The verbs in document order. Used by flow tests to assert on the
    /// produced conversation without string-matching XML.
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Serializes the document to the provider's XML wire format.
    pub fn render(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
        for verb in &self.verbs {
            verb.write_xml(&mut out);
        }
        out.push_str("</Response>");
        out
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_valid_envelope() {
        let doc = Twiml::new();
        assert_eq!(
            doc.render(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>"
        );
    }

    #[test]
    fn renders_nested_gather() {
        let mut doc = Twiml::new();
        doc.gather(Gather::digits(1, 6).action("/voice/member?bioguide_id=B000944"), |g| {
            g.say("Press 1 to hear a short biography.");
        });

        let xml = doc.render();
        assert!(xml.contains(
            "<Gather numDigits=\"1\" timeout=\"6\" \
             action=\"/voice/member?bioguide_id=B000944\" method=\"POST\">"
        ));
        assert!(xml.contains("<Say>Press 1 to hear a short biography.</Say></Gather>"));
    }

    #[test]
    fn entry_gather_omits_num_digits() {
        let mut doc = Twiml::new();
        doc.gather(Gather::entry(10), |g| g.say("Enter the bill number."));
        let xml = doc.render();
        assert!(xml.contains("<Gather timeout=\"10\" method=\"POST\">"));
    }

    #[test]
    fn escapes_reserved_characters() {
        let mut doc = Twiml::new();
        doc.say("Ways & Means <subcommittee>");
        doc.redirect("/voice/bill?bill_id=hr1-112&next_url=/voice/bills");
        let xml = doc.render();
        assert!(xml.contains("<Say>Ways &amp; Means &lt;subcommittee&gt;</Say>"));
        assert!(xml.contains("<Redirect>/voice/bill?bill_id=hr1-112&amp;next_url=/voice/bills</Redirect>"));
    }

    #[test]
    fn dial_wraps_number() {
        let mut doc = Twiml::new();
        doc.say("Connecting you now.");
        doc.dial("202-224-3121");
        assert!(doc
            .render()
            .contains("<Dial><Number>202-224-3121</Number></Dial>"));
    }

    #[test]
    fn record_carries_limits() {
        let mut doc = Twiml::new();
        doc.record(10, 120);
        assert!(doc
            .render()
            .contains("<Record timeout=\"10\" maxLength=\"120\"/>"));
    }

    #[test]
    fn say_attributes_in_order() {
        let mut doc = Twiml::new();
        doc.push(Verb::Say {
            text: "Hola".to_string(),
            language: Some("es".to_string()),
            voice: Some("woman".to_string()),
        });
        assert!(doc
            .render()
            .contains("<Say voice=\"woman\" language=\"es\">Hola</Say>"));
    }
}
