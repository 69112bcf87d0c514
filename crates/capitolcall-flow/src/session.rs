//! Per-call state and the typed request view.
//!
//! A call's entire cross-request memory is the [`Call`] document: identity
//! fields, a status log, and the [`CallContext`] of accumulated answers
//! (language, zip code, cached lookups, menu referrer). Every step receives
//! the session and the parsed [`RequestParams`] explicitly; nothing is
//! resolved from ambient request state.

use crate::menu::{MenuName, Route};
use capitolcall_types::{Bill, CallStatus, Legislator};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Names of the parameters a menu choice may forward to its action.
///
/// Dispatch copies a parameter onto the redirect URL only when the chosen
/// menu entry whitelists it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamName {
    BioguideId,
    BillId,
    NextUrl,
}

impl ParamName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BioguideId => "bioguide_id",
            Self::BillId => "bill_id",
            Self::NextUrl => "next_url",
        }
    }
}

/// The request was not a well-formed provider webhook.
#[derive(Debug, Error)]
pub enum ParamError {
    /// No call id. Per the provider contract every voice webhook carries
    /// one, so its absence means the request did not come from the provider.
    #[error("missing call id parameter")]
    MissingCallSid,
}

/// Typed view over the merged query + form parameters of one webhook.
///
/// Digits are consumed, not just read: when a gate interprets the `Digits`
/// value (say, as a language choice) it calls [`consume_digits`] so the
/// step behind it cannot re-interpret the same keypress as a menu
/// selection.
///
/// [`consume_digits`]: RequestParams::consume_digits
#[derive(Debug, Clone)]
pub struct RequestParams {
    call_sid: String,
    call_status: CallStatus,
    from: String,
    to: String,
    caller_name: Option<String>,
    digits: Option<String>,
    zipcode: Option<String>,
    language: Option<String>,
    bioguide_id: Option<String>,
    bill_id: Option<String>,
    next_url: Option<String>,
    recording_url: Option<String>,
}

impl RequestParams {
    /// Builds the typed view from decoded key/value pairs. Later duplicates
    /// win, matching form-body-over-query-string precedence when the caller
    /// appends form pairs after query pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut call_sid = None;
        let mut call_status = None;
        let mut from = None;
        let mut to = None;
        let mut caller_name = None;
        let mut digits = None;
        let mut zipcode = None;
        let mut language = None;
        let mut bioguide_id = None;
        let mut bill_id = None;
        let mut next_url = None;
        let mut recording_url = None;

        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "CallSid" => call_sid = Some(value),
                "CallStatus" => call_status = value.parse().ok(),
                "From" => from = Some(value),
                "To" => to = Some(value),
                "CallerName" => caller_name = Some(value),
                "Digits" => digits = Some(value),
                "zipcode" => zipcode = Some(value),
                "language" => language = Some(value),
                "bioguide_id" => bioguide_id = Some(value),
                "bill_id" => bill_id = Some(value),
                "next_url" => next_url = Some(value),
                "RecordingUrl" => recording_url = Some(value),
                _ => {}
            }
        }

        Ok(Self {
            call_sid: call_sid.ok_or(ParamError::MissingCallSid)?,
            call_status: call_status.unwrap_or(CallStatus::InProgress),
            from: from.unwrap_or_default(),
            to: to.unwrap_or_default(),
            caller_name,
            digits: digits.filter(|d| !d.is_empty()),
            zipcode,
            language,
            bioguide_id,
            bill_id,
            next_url,
            recording_url,
        })
    }

    pub fn call_sid(&self) -> &str {
        &self.call_sid
    }

    pub fn call_status(&self) -> CallStatus {
        self.call_status
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn caller_name(&self) -> Option<&str> {
        self.caller_name.as_deref()
    }

    /// The digits pressed, unless a gate has already consumed them.
    pub fn digits(&self) -> Option<&str> {
        self.digits.as_deref()
    }

    /// Takes the digits, leaving none for later interpreters.
    pub fn consume_digits(&mut self) -> Option<String> {
        self.digits.take()
    }

    pub fn zipcode(&self) -> Option<&str> {
        self.zipcode.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn bioguide_id(&self) -> Option<&str> {
        self.bioguide_id.as_deref()
    }

    /// Records the legislator resolved from a menu selection so the step
    /// behind the gate sees the same parameter an explicit link would carry.
    pub fn set_bioguide_id(&mut self, bioguide_id: String) {
        self.bioguide_id = Some(bioguide_id);
    }

    pub fn bill_id(&self) -> Option<&str> {
        self.bill_id.as_deref()
    }

    pub fn next_url(&self) -> Option<&str> {
        self.next_url.as_deref()
    }

    pub fn recording_url(&self) -> Option<&str> {
        self.recording_url.as_deref()
    }

    /// Looks up a whitelistable parameter by name.
    pub fn get(&self, name: ParamName) -> Option<&str> {
        match name {
            ParamName::BioguideId => self.bioguide_id(),
            ParamName::BillId => self.bill_id(),
            ParamName::NextUrl => self.next_url(),
        }
    }

    /// URL for re-posting to the given route with this request's step
    /// parameters but without any `Digits`. Gates use this as the gather
    /// action so the caller's answer lands back on the same step.
    pub fn self_url(&self, route: Route) -> String {
        let mut forwarded: Vec<(&str, &str)> = Vec::new();
        for name in [ParamName::BioguideId, ParamName::BillId, ParamName::NextUrl] {
            if let Some(value) = self.get(name) {
                forwarded.push((name.as_str(), value));
            }
        }
        route.url_with(&forwarded)
    }
}

/// One entry in the call's status log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub timestamp: DateTime<Utc>,
    pub status: CallStatus,
}

/// Answers and cached lookups accumulated over the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallContext {
    /// Chosen prompt language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Validated five-digit zip code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,

    /// Candidate list offered by the legislator gate, retained so the
    /// caller's one-digit answer can be resolved on the next request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legislators: Option<Vec<Legislator>>,

    /// The legislator the caller most recently selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legislator: Option<Legislator>,

    /// Search results offered by the bill-selection step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bills: Option<Vec<Bill>>,

    /// The menu whose selection led to the current step. Menus whose
    /// parent is declared "from referrer" navigate back through this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<MenuName>,
}

/// The persisted per-call document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub call_sid: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub caller_name: Option<String>,
    pub current_status: CallStatus,
    /// Status log, one entry per webhook received.
    #[serde(default)]
    pub requests: Vec<StatusEntry>,
    #[serde(default)]
    pub context: CallContext,
}

impl Call {
    /// A fresh document for a call seen for the first time.
    pub fn new(params: &RequestParams) -> Self {
        Self {
            call_sid: params.call_sid().to_string(),
            from: params.from().to_string(),
            to: params.to().to_string(),
            caller_name: params.caller_name().map(str::to_string),
            current_status: params.call_status(),
            requests: Vec::new(),
            context: CallContext::default(),
        }
    }

    /// Appends a status-log entry and updates the current status.
    pub fn log_status(&mut self, status: CallStatus, timestamp: DateTime<Utc>) {
        self.current_status = status;
        self.requests.push(StatusEntry { timestamp, status });
    }
}

/// Request-scoped wrapper around the loaded call document.
#[derive(Debug)]
pub struct CallSession {
    call: Call,
}

impl CallSession {
    pub fn new(call: Call) -> Self {
        Self { call }
    }

    pub fn call(&self) -> &Call {
        &self.call
    }

    pub fn into_call(self) -> Call {
        self.call
    }

    pub fn context(&self) -> &CallContext {
        &self.call.context
    }

    pub fn context_mut(&mut self) -> &mut CallContext {
        &mut self.call.context
    }

    /// The caller's chosen language, or the given default before the
    /// language gate has run.
    pub fn language(&self, default: &str) -> String {
        self.call
            .context
            .language
            .clone()
            .unwrap_or_else(|| default.to_string())
    }
}
