//! Precondition gates.
//!
//! A gate checks that a step's prerequisite (language, zip code, selected
//! legislator, selected bill) is satisfied, interpreting an explicit
//! parameter, the session context, or the pressed digits, in that order.
//! When nothing satisfies it, the gate intercepts the request with a
//! prompt whose gather re-posts to the same step, so the conversation
//! resumes exactly where it was interrupted.
//!
//! Gates that interpret digits consume them; a keypress answers exactly
//! one question.

use crate::dispatch::parent_route;
use crate::error::FlowError;
use crate::menu::{MenuName, Route, ZipPurpose};
use crate::session::{CallSession, RequestParams};
use crate::steps::Engine;
use capitolcall_twiml::{Gather, Twiml, Verb};
use capitolcall_types::Language;

/// Result of running a gate.
#[derive(Debug)]
pub enum GateOutcome {
    /// The prerequisite is satisfied; the step proceeds.
    Pass,
    /// The gate answered the request itself.
    Intercept(Twiml),
}

/// Ensures the session has a prompt language.
///
/// Order of interpretation: an explicit `language` parameter (code or
/// 1-based position), the session context, then the pressed digits. With
/// none of those the gate prompts for a choice, each option spoken in its
/// own language.
pub async fn language_selection(
    engine: &Engine,
    session: &mut CallSession,
    params: &mut RequestParams,
    route: Route,
) -> Result<GateOutcome, FlowError> {
    if let Some(value) = params.language().map(str::to_string) {
        if let Some(language) = resolve_language(engine.languages(), &value) {
            session.context_mut().language = Some(language.code.clone());
            return Ok(GateOutcome::Pass);
        }
        tracing::debug!(value, "ignoring unrecognized language parameter");
    }

    if session.context().language.is_some() {
        return Ok(GateOutcome::Pass);
    }

    let mut errors: Vec<String> = Vec::new();
    if let Some(digits) = params.consume_digits() {
        match position_in(engine.languages(), &digits) {
            Some(language) => {
                session.context_mut().language = Some(language.code.clone());
                return Ok(GateOutcome::Pass);
            }
            None => errors.push(format!("{digits} is not a valid selection, please try again.")),
        }
    }

    let default_language = engine.default_language().to_string();
    let action = params.self_url(route);
    let mut doc = Twiml::new();
    doc.gather(Gather::digits(1, engine.input_timeout()).action(action), |g| {
        if errors.is_empty() {
            g.push(
                engine
                    .renderer()
                    .speech("Welcome to Capitol Call.", &default_language),
            );
        }
        for error in &errors {
            g.push(engine.renderer().speech(error, &default_language));
        }
        // Each option is spoken in the language it offers.
        for (index, language) in engine.languages().iter().enumerate() {
            g.push(Verb::say_in(
                language.selection_prompt(index + 1),
                &language.code,
            ));
        }
    });
    Ok(GateOutcome::Intercept(doc))
}

fn resolve_language<'a>(languages: &'a [Language], value: &str) -> Option<&'a Language> {
    languages
        .iter()
        .find(|language| language.code == value)
        .or_else(|| position_in(languages, value))
}

fn position_in<'a>(languages: &'a [Language], value: &str) -> Option<&'a Language> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| languages.get(index))
}

/// Ensures the session has a validated five-digit zip code.
///
/// An explicit `zipcode` parameter wins, then the context, then the
/// digits. Digit `9` during zip entry backs out to the main menu. The
/// prompt wording follows the step's [`ZipPurpose`].
pub async fn zipcode_selection(
    engine: &Engine,
    session: &mut CallSession,
    params: &mut RequestParams,
    route: Route,
) -> Result<GateOutcome, FlowError> {
    let mut errors: Vec<String> = Vec::new();

    if let Some(zip) = params.zipcode().map(str::to_string) {
        if is_zipcode(&zip) {
            session.context_mut().zipcode = Some(zip);
            return Ok(GateOutcome::Pass);
        }
        errors.push(format!("{zip} is not a valid zip code, please try again."));
    }

    if session.context().zipcode.is_some() {
        return Ok(GateOutcome::Pass);
    }

    if let Some(digits) = params.consume_digits() {
        if digits == "9" {
            let mut doc = Twiml::new();
            doc.redirect(Route::Index.url());
            return Ok(GateOutcome::Intercept(doc));
        }
        if is_zipcode(&digits) {
            session.context_mut().zipcode = Some(digits);
            return Ok(GateOutcome::Pass);
        }
        errors.push(format!("{digits} is not a valid zip code, please try again."));
    }

    let language = session.language(engine.default_language());
    let prompt = match route.zip_purpose() {
        ZipPurpose::Representative => {
            "To find your members of Congress, please enter your five digit zip code now."
        }
        ZipPurpose::ElectionOffice => {
            "To find your local election office, please enter your five digit zip code now."
        }
    };
    let action = params.self_url(route);
    let mut doc = Twiml::new();
    doc.gather(Gather::digits(5, engine.input_timeout()).action(action), |g| {
        for error in &errors {
            g.push(engine.renderer().speech(error, &language));
        }
        g.push(engine.renderer().speech(prompt, &language));
    });
    Ok(GateOutcome::Intercept(doc))
}

fn is_zipcode(value: &str) -> bool {
    value.len() == 5 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Ensures the request identifies a legislator.
///
/// Passes straight through on an explicit `bioguide_id`. Otherwise the
/// caller picks from the legislators for their zip code: the candidate
/// list is cached in context so the follow-up digit can be resolved, and
/// the resolved id is written back into the request parameters so the
/// step behind the gate reads it the same way an explicit link would
/// provide it. Digit `0` discards the zip code and starts over; digit `9`
/// backs out to the member menu's parent.
pub async fn bioguide_selection(
    engine: &Engine,
    session: &mut CallSession,
    params: &mut RequestParams,
    route: Route,
) -> Result<GateOutcome, FlowError> {
    if params.bioguide_id().is_some() {
        return Ok(GateOutcome::Pass);
    }

    match params.digits() {
        Some("0") => {
            params.consume_digits();
            let context = session.context_mut();
            context.zipcode = None;
            context.legislators = None;
            context.legislator = None;
            let mut doc = Twiml::new();
            doc.redirect(Route::Members.url());
            return Ok(GateOutcome::Intercept(doc));
        }
        Some("9") => {
            params.consume_digits();
            let mut doc = Twiml::new();
            doc.redirect(parent_route(MenuName::Member, session.context()).url());
            return Ok(GateOutcome::Intercept(doc));
        }
        _ => {}
    }

    let mut errors: Vec<String> = Vec::new();

    if session.context().legislators.is_some() {
        if let Some(digits) = params.consume_digits() {
            let resolved = digits
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| {
                    session
                        .context()
                        .legislators
                        .as_ref()
                        .and_then(|list| list.get(index))
                        .cloned()
                });
            match resolved {
                Some(legislator) => {
                    params.set_bioguide_id(legislator.bioguide_id.clone());
                    session.context_mut().legislator = Some(legislator);
                    return Ok(GateOutcome::Pass);
                }
                None => {
                    errors.push(format!("{digits} is not a valid selection, please try again."))
                }
            }
        }
    }

    if session.context().legislators.is_none() {
        let Some(zipcode) = session.context().zipcode.clone() else {
            return zipcode_selection(engine, session, params, route).await;
        };

        let legislators = engine.directory().legislators_for_zip(&zipcode).await?;
        if legislators.is_empty() {
            session.context_mut().zipcode = None;
            let language = session.language(engine.default_language());
            let action = params.self_url(route);
            let mut doc = Twiml::new();
            doc.push(engine.renderer().speech(
                &format!(
                    "I'm sorry, I wasn't able to find any members of Congress for {}.",
                    spell_out(&zipcode)
                ),
                &language,
            ));
            doc.gather(Gather::digits(5, engine.input_timeout()).action(action), |g| {
                g.push(
                    engine
                        .renderer()
                        .speech("Please enter a new five digit zip code now.", &language),
                );
            });
            return Ok(GateOutcome::Intercept(doc));
        }
        session.context_mut().legislators = Some(legislators);
    }

    let language = session.language(engine.default_language());
    let legislators = session.context().legislators.clone().unwrap_or_default();
    let intro = if legislators.len() > 3 {
        "Your zip code covers more than one congressional district."
    } else {
        "Please select from your members of Congress."
    };
    let action = params.self_url(route);
    let mut doc = Twiml::new();
    for error in &errors {
        doc.push(engine.renderer().speech(error, &language));
    }
    doc.gather(Gather::digits(1, engine.input_timeout()).action(action), |g| {
        g.push(engine.renderer().speech(intro, &language));
        for (index, legislator) in legislators.iter().enumerate() {
            g.push(engine.renderer().speech(
                &format!("Press {} for {}.", index + 1, legislator.full_name),
                &language,
            ));
        }
        g.push(
            engine
                .renderer()
                .speech("Press 0 to enter a new zip code.", &language),
        );
    });
    Ok(GateOutcome::Intercept(doc))
}

/// Spoken digit-by-digit rendering, "2 0 0 0 1".
fn spell_out(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() * 2);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Ensures the request identifies a bill. There is no per-call bill
/// memory to fall back on, so a missing `bill_id` redirects to the
/// search step.
pub async fn bill_selection(
    _engine: &Engine,
    _session: &mut CallSession,
    params: &mut RequestParams,
    _route: Route,
) -> Result<GateOutcome, FlowError> {
    if params.bill_id().is_some() {
        return Ok(GateOutcome::Pass);
    }
    let mut doc = Twiml::new();
    doc.redirect(Route::SearchBills.url());
    Ok(GateOutcome::Intercept(doc))
}
