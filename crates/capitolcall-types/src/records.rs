//! Record types sourced from the congressional data APIs.
//!
//! The call-flow engine only relies on the stable identity fields
//! (`bioguide_id`, `bill_id`) and the display fields; everything else is
//! carried opaquely. Records are cached transiently inside the per-call
//! context, so they all serialize.

use serde::{Deserialize, Serialize};

/// A member of Congress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legislator {
    /// Canonical identifier, stable across sessions of Congress.
    pub bioguide_id: String,
    /// Center for Responsive Politics candidate id, used for contribution
    /// and biography lookups. Absent for some historical members.
    #[serde(default)]
    pub crp_id: Option<String>,
    /// Readable title ("Senator" / "Representative").
    pub title: String,
    /// Short wire title ("Sen" / "Rep").
    #[serde(default)]
    pub short_title: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// "{title} {first_name} {last_name}", precomputed for prompts.
    pub full_name: String,
    /// Capitol Hill office number, if published.
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// House district; `None` for senators.
    #[serde(default)]
    pub district: Option<u32>,
}

/// A bill or resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// e.g. "hr4310-112".
    pub bill_id: String,
    /// Raw type prefix, e.g. "hr", "sjres".
    pub bill_type: String,
    pub number: u32,
    /// Official title.
    pub title: String,
    #[serde(default)]
    pub short_title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Sponsor's display name.
    #[serde(default)]
    pub sponsor: Option<String>,
    #[serde(default)]
    pub cosponsor_count: Option<u32>,
    /// Cosponsor display names, when the list is short enough to read.
    #[serde(default)]
    pub cosponsors: Vec<String>,
    /// Last recorded action, spoken as the bill's status.
    #[serde(default)]
    pub last_action: Option<String>,
    #[serde(default)]
    pub chamber: Option<String>,
}

impl Bill {
    /// Spoken description like "House Bill 4310", falling back to the raw
    /// prefix for unrecognized types.
    pub fn spoken_name(&self) -> String {
        match bill_type_name(&self.bill_type) {
            Some(name) => format!("{} {}", name, self.number),
            None => format!("{} {}", self.bill_type, self.number),
        }
    }
}

/// A bill scheduled for floor debate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingBill {
    pub bill_id: String,
    /// "house" or "senate".
    pub chamber: String,
    /// Scheduled legislative day, ISO date ("2012-06-05").
    pub legislative_day: String,
    pub bill: Bill,
    /// Free-form context lines supplied by the source feed.
    #[serde(default)]
    pub context: Vec<String>,
}

/// One roll-call vote cast by a legislator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// Question text, already trimmed of its leading category prefix.
    pub question: String,
    /// Overall result ("passed" / "failed").
    pub result: String,
    /// How the member voted, relabeled to "yes" / "no" where applicable.
    pub voted: String,
}

/// A top campaign contributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    /// Dollar amount as reported by the source, kept as a display string.
    pub total_amount: String,
}

/// A local election administration office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionOffice {
    #[serde(default)]
    pub authority_name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub mailing_street: Option<String>,
    #[serde(default)]
    pub mailing_city: Option<String>,
    #[serde(default)]
    pub mailing_zip: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Maps a bill-type prefix to its spoken name.
///
/// Accepts the raw prefix with or without punctuation ("H.R." == "hr").
pub fn bill_type_name(abbr: &str) -> Option<&'static str> {
    let key: String = abbr
        .chars()
        .take_while(|c| c.is_ascii_alphabetic() || *c == '.')
        .filter(|c| *c != '.')
        .collect::<String>()
        .to_ascii_lowercase();
    match key.as_str() {
        "hr" => Some("House Bill"),
        "hres" => Some("House Resolution"),
        "hjres" => Some("House Joint Resolution"),
        "hcres" => Some("House Concurrent Resolution"),
        "s" => Some("Senate Bill"),
        "sres" => Some("Senate Resolution"),
        "sjres" => Some("Senate Joint Resolution"),
        "scres" => Some("Senate Concurrent Resolution"),
        _ => None,
    }
}
