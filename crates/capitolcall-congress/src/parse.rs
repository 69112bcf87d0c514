//! Wire-format parsing for the upstream APIs.
//!
//! Kept free of HTTP so the response handling is testable against fixture
//! payloads. Every function takes a response body and returns the shared
//! record types, applying the spoken-form normalizations here so the flow
//! engine never sees raw wire values.

use capitolcall_flow::DirectoryError;
use capitolcall_types::{
    Bill, Contributor, ElectionOffice, Legislator, UpcomingBill, Vote,
};
use serde::Deserialize;
use std::collections::HashMap;

fn payload(err: serde_json::Error) -> DirectoryError {
    DirectoryError::Payload(err.to_string())
}

#[derive(Debug, Deserialize)]
struct ResultsEnvelope<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct WireLegislator {
    bioguide_id: String,
    #[serde(default)]
    crp_id: Option<String>,
    /// Short wire title: "Sen", "Rep", "Del", "Com".
    title: String,
    first_name: String,
    last_name: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    party: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    district: Option<u32>,
}

fn full_title(short: &str) -> String {
    match short {
        "Sen" => "Senator".to_string(),
        "Rep" => "Representative".to_string(),
        "Del" => "Delegate".to_string(),
        "Com" => "Resident Commissioner".to_string(),
        other => other.to_string(),
    }
}

impl From<WireLegislator> for Legislator {
    fn from(wire: WireLegislator) -> Self {
        let title = full_title(&wire.title);
        let full_name = format!("{} {} {}", title, wire.first_name, wire.last_name);
        Self {
            bioguide_id: wire.bioguide_id,
            crp_id: wire.crp_id,
            title,
            short_title: Some(wire.title),
            first_name: wire.first_name,
            last_name: wire.last_name,
            full_name,
            phone: wire.phone,
            party: wire.party,
            state: wire.state,
            district: wire.district,
        }
    }
}

/// Parses a legislator list, senators first, then by last name. Senators
/// lead because pick lists read top to bottom and both of a state's
/// senators cover every zip code in it.
pub fn legislators(body: &str) -> Result<Vec<Legislator>, DirectoryError> {
    let envelope: ResultsEnvelope<WireLegislator> = serde_json::from_str(body).map_err(payload)?;
    let mut out: Vec<Legislator> = envelope.results.into_iter().map(Legislator::from).collect();
    out.sort_by(|a, b| {
        senate_rank(a)
            .cmp(&senate_rank(b))
            .then_with(|| a.last_name.cmp(&b.last_name))
    });
    Ok(out)
}

fn senate_rank(legislator: &Legislator) -> u8 {
    if legislator.short_title.as_deref() == Some("Sen") {
        0
    } else {
        1
    }
}

#[derive(Debug, Deserialize)]
struct WireVote {
    question: String,
    result: String,
    #[serde(default)]
    voter_ids: HashMap<String, String>,
}

/// Parses roll-call votes for one member. The question keeps only the text
/// after its category prefix, and positions are relabeled for speech.
pub fn votes(body: &str, bioguide_id: &str) -> Result<Vec<Vote>, DirectoryError> {
    let envelope: ResultsEnvelope<WireVote> = serde_json::from_str(body).map_err(payload)?;
    Ok(envelope
        .results
        .into_iter()
        .filter_map(|wire| {
            let position = wire.voter_ids.get(bioguide_id)?;
            Some(Vote {
                question: trim_question(&wire.question),
                result: wire.result,
                voted: spoken_position(position),
            })
        })
        .collect())
}

fn trim_question(question: &str) -> String {
    question
        .rsplit(':')
        .next()
        .unwrap_or(question)
        .trim()
        .to_string()
}

fn spoken_position(position: &str) -> String {
    match position {
        "Yea" | "Aye" => "yes".to_string(),
        "Nay" | "No" => "no".to_string(),
        other => other.to_lowercase(),
    }
}

#[derive(Debug, Deserialize)]
struct WireCommittee {
    name: String,
    #[serde(default)]
    subcommittees: Vec<WireCommittee>,
}

/// Parses committee memberships into a flat list of names, each committee
/// followed by its subcommittees, the order they are read aloud in.
pub fn committees(body: &str) -> Result<Vec<String>, DirectoryError> {
    let envelope: ResultsEnvelope<WireCommittee> = serde_json::from_str(body).map_err(payload)?;
    let mut names = Vec::new();
    for committee in envelope.results {
        names.push(committee.name);
        for sub in committee.subcommittees {
            names.push(sub.name);
        }
    }
    Ok(names)
}

#[derive(Debug, Deserialize)]
struct WireBill {
    bill_id: String,
    bill_type: String,
    number: u32,
    #[serde(default)]
    official_title: Option<String>,
    #[serde(default)]
    short_title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    sponsor: Option<WireSponsor>,
    #[serde(default)]
    cosponsors_count: Option<u32>,
    #[serde(default)]
    cosponsor_names: Vec<String>,
    #[serde(default)]
    last_action: Option<WireAction>,
    #[serde(default)]
    chamber: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSponsor {
    title: String,
    first_name: String,
    last_name: String,
}

#[derive(Debug, Deserialize)]
struct WireAction {
    text: String,
}

impl From<WireBill> for Bill {
    fn from(wire: WireBill) -> Self {
        let title = wire
            .short_title
            .clone()
            .or(wire.official_title)
            .unwrap_or_else(|| wire.bill_id.clone());
        Self {
            bill_id: wire.bill_id,
            bill_type: wire.bill_type,
            number: wire.number,
            title,
            short_title: wire.short_title,
            summary: wire.summary,
            sponsor: wire.sponsor.map(|s| {
                format!("{} {} {}", full_title(&s.title), s.first_name, s.last_name)
            }),
            cosponsor_count: wire.cosponsors_count,
            cosponsors: wire.cosponsor_names,
            last_action: wire.last_action.map(|a| a.text),
            chamber: wire.chamber,
        }
    }
}

/// Parses a bill list, truncated to what a caller can reasonably pick
/// from by digit.
pub fn bills(body: &str, limit: usize) -> Result<Vec<Bill>, DirectoryError> {
    let envelope: ResultsEnvelope<WireBill> = serde_json::from_str(body).map_err(payload)?;
    Ok(envelope
        .results
        .into_iter()
        .take(limit)
        .map(Bill::from)
        .collect())
}

pub fn first_bill(body: &str) -> Result<Option<Bill>, DirectoryError> {
    Ok(bills(body, 1)?.into_iter().next())
}

#[derive(Debug, Deserialize)]
struct WireUpcoming {
    bill_id: String,
    chamber: String,
    legislative_day: String,
    #[serde(default)]
    context: Vec<String>,
    bill: WireBill,
}

pub fn upcoming_bills(body: &str) -> Result<Vec<UpcomingBill>, DirectoryError> {
    let envelope: ResultsEnvelope<WireUpcoming> = serde_json::from_str(body).map_err(payload)?;
    Ok(envelope
        .results
        .into_iter()
        .map(|wire| UpcomingBill {
            bill_id: wire.bill_id,
            chamber: wire.chamber,
            legislative_day: wire.legislative_day,
            bill: wire.bill.into(),
            context: wire.context,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct WireEntityRef {
    id: String,
}

/// Parses a campaign-finance entity id lookup: a bare array of matches.
pub fn entity_id(body: &str) -> Result<Option<String>, DirectoryError> {
    let matches: Vec<WireEntityRef> = serde_json::from_str(body).map_err(payload)?;
    Ok(matches.into_iter().next().map(|entity| entity.id))
}

#[derive(Debug, Deserialize)]
struct WireEntity {
    #[serde(default)]
    metadata: WireEntityMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct WireEntityMetadata {
    #[serde(default)]
    bio: Option<String>,
}

pub fn entity_bio(body: &str) -> Result<Option<String>, DirectoryError> {
    let entity: WireEntity = serde_json::from_str(body).map_err(payload)?;
    Ok(entity.metadata.bio.filter(|bio| !bio.trim().is_empty()))
}

#[derive(Debug, Deserialize)]
struct WireContributor {
    name: String,
    total_amount: String,
}

/// Parses contributor aggregates: a bare array, already ranked.
pub fn contributors(body: &str) -> Result<Vec<Contributor>, DirectoryError> {
    let wire: Vec<WireContributor> = serde_json::from_str(body).map_err(payload)?;
    Ok(wire
        .into_iter()
        .map(|c| Contributor {
            name: c.name,
            total_amount: c.total_amount,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct WireOffice {
    #[serde(default)]
    authority_name: Option<String>,
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    mailing_street: Option<String>,
    #[serde(default)]
    mailing_city: Option<String>,
    #[serde(default)]
    mailing_zip: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

pub fn election_offices(body: &str) -> Result<Vec<ElectionOffice>, DirectoryError> {
    let envelope: ResultsEnvelope<WireOffice> = serde_json::from_str(body).map_err(payload)?;
    Ok(envelope
        .results
        .into_iter()
        .map(|wire| ElectionOffice {
            authority_name: wire.authority_name,
            street: wire.street,
            city: wire.city,
            state: wire.state,
            mailing_street: wire.mailing_street,
            mailing_city: wire.mailing_city,
            mailing_zip: wire.mailing_zip,
            phone: wire.phone,
        })
        .collect())
}
