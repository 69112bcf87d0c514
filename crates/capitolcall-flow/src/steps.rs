//! The conversation engine: one method per step.
//!
//! Every step follows the same shape: run the gates it declares, interpret
//! any remaining digits (usually by dispatching against a menu), do its own
//! work through the directory, and emit a voice document. Steps return
//! `Err` only for infrastructure failures; anything the caller did wrong is
//! answered with spoken prompts.

use crate::dispatch::handle_selection;
use crate::error::FlowError;
use crate::gates::{self, GateOutcome};
use crate::menu::{menu, MenuName, Route};
use crate::services::{Directory, Mailbox};
use crate::session::{CallSession, RequestParams};
use capitolcall_twiml::{Gather, SpeechRenderer, Twiml, Verb};
use capitolcall_types::{Language, Legislator, UpcomingBill, DEFAULT_LANGUAGE};
use chrono::NaiveDate;
use std::sync::Arc;

/// Drives one call-flow step per webhook.
pub struct Engine {
    directory: Arc<dyn Directory>,
    mailbox: Arc<dyn Mailbox>,
    renderer: SpeechRenderer,
    languages: Vec<Language>,
    input_timeout: u32,
}

impl Engine {
    pub fn new(
        directory: Arc<dyn Directory>,
        mailbox: Arc<dyn Mailbox>,
        renderer: SpeechRenderer,
        languages: Vec<Language>,
        input_timeout: u32,
    ) -> Self {
        let languages = if languages.is_empty() {
            vec![Language {
                code: DEFAULT_LANGUAGE.to_string(),
                label: "English".to_string(),
                prompt: "Press {digit} to continue in English.".to_string(),
            }]
        } else {
            languages
        };
        Self {
            directory,
            mailbox,
            renderer,
            languages,
            input_timeout,
        }
    }

    pub fn directory(&self) -> &dyn Directory {
        self.directory.as_ref()
    }

    pub fn renderer(&self) -> &SpeechRenderer {
        &self.renderer
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn default_language(&self) -> &str {
        self.renderer.default_language()
    }

    pub fn input_timeout(&self) -> u32 {
        self.input_timeout
    }

    /// Routes a webhook to its step.
    pub async fn handle(
        &self,
        route: Route,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        match route {
            Route::Index => self.index(session, params).await,
            Route::Members => self.members(session, params).await,
            Route::Member => self.member(session, params).await,
            Route::MemberBio => self.member_bio(session, params).await,
            Route::MemberDonors => self.member_donors(session, params).await,
            Route::MemberVotes => self.member_votes(session, params).await,
            Route::MemberCommittees => self.member_committees(session, params).await,
            Route::CallMember => self.call_member(session, params).await,
            Route::Bills => self.bills(session, params).await,
            Route::UpcomingBills => self.upcoming_bills(session, params).await,
            Route::SearchBills => self.search_bills(session, params).await,
            Route::SelectBill => self.select_bill(session, params).await,
            Route::Bill => self.bill(session, params).await,
            Route::BillSubscribe => self.bill_subscribe(session, params).await,
            Route::Voting => self.voting(session, params).await,
            Route::CallElectionOffice => self.call_election_office(session, params).await,
            Route::About => self.about(session, params).await,
            Route::AboutSunlight => self.about_sunlight(session, params).await,
            Route::Signup => self.signup(session, params).await,
            Route::Feedback => self.feedback(session, params).await,
        }
    }

    fn speech(&self, session: &CallSession, text: &str) -> Verb {
        let language = session.language(self.default_language());
        self.renderer.speech(text, &language)
    }

    fn say(&self, doc: &mut Twiml, session: &CallSession, text: &str) {
        doc.push(self.speech(session, text));
    }

    /// Continues the conversation after a terminal read: an explicit
    /// `next_url` wins, then the step's default, then the main menu.
    fn next_action(&self, doc: &mut Twiml, params: &RequestParams, default: Option<String>) {
        if let Some(next) = params.next_url() {
            doc.redirect(next.to_string());
        } else if let Some(default) = default {
            doc.redirect(default);
        } else {
            doc.redirect(Route::Index.url());
        }
    }

    /// The legislator identified by `bioguide_id`, read from the context
    /// cache when it already holds them.
    async fn member_for(
        &self,
        session: &mut CallSession,
        bioguide_id: &str,
    ) -> Result<Option<Legislator>, FlowError> {
        if let Some(cached) = session.context().legislator.as_ref() {
            if cached.bioguide_id == bioguide_id {
                return Ok(Some(cached.clone()));
            }
        }
        let fetched = self.directory.legislator_by_bioguide(bioguide_id).await?;
        if let Some(legislator) = &fetched {
            session.context_mut().legislator = Some(legislator.clone());
        }
        Ok(fetched)
    }

    /// Shared preamble for the member sub-steps: resolve the legislator or
    /// answer the request with an apology.
    async fn require_member(
        &self,
        session: &mut CallSession,
        params: &RequestParams,
    ) -> Result<Result<Legislator, Twiml>, FlowError> {
        let Some(bioguide_id) = params.bioguide_id().map(str::to_string) else {
            let mut doc = Twiml::new();
            doc.redirect(Route::Members.url());
            return Ok(Err(doc));
        };
        match self.member_for(session, &bioguide_id).await? {
            Some(legislator) => Ok(Ok(legislator)),
            None => {
                let mut doc = Twiml::new();
                self.say(
                    &mut doc,
                    session,
                    "I'm sorry, I couldn't find that member of Congress.",
                );
                doc.redirect(Route::Members.url());
                Ok(Err(doc))
            }
        }
    }

    /// Entry point: language gate, then the main menu.
    pub async fn index(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::Index).await?
        {
            return Ok(doc);
        }

        if let Some(digits) = params.digits().map(str::to_string) {
            return Ok(handle_selection(self, session, MenuName::Main, &digits, params));
        }

        let mut doc = Twiml::new();
        doc.gather(Gather::digits(1, self.input_timeout), |g| {
            for line in [
                "To begin, select from the following:",
                "To find your members of Congress, press 1.",
                "To learn about bills in Congress, press 2.",
                "For voter information, press 3.",
                "To learn more about this service, press 4.",
                "At any point in this call, you can press 9 to return to the previous menu.",
            ] {
                g.push(self.speech(session, line));
            }
        });
        Ok(doc)
    }

    /// Collects a zip code, then moves on to the member picker.
    pub async fn members(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::Members).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::zipcode_selection(self, session, params, Route::Members).await?
        {
            return Ok(doc);
        }

        let mut doc = Twiml::new();
        self.next_action(&mut doc, params, Some(Route::Member.url()));
        Ok(doc)
    }

    /// The per-member menu.
    pub async fn member(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::Member).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::bioguide_selection(self, session, params, Route::Member).await?
        {
            return Ok(doc);
        }

        let legislator = match self.require_member(session, params).await? {
            Ok(legislator) => legislator,
            Err(doc) => return Ok(doc),
        };

        if let Some(digits) = params.digits().map(str::to_string) {
            return Ok(handle_selection(self, session, MenuName::Member, &digits, params));
        }

        let mut doc = Twiml::new();
        self.say(
            &mut doc,
            session,
            &menu(MenuName::Member).label.render(Some(&legislator.full_name)),
        );
        doc.gather(
            Gather::digits(1, self.input_timeout).action(params.self_url(Route::Member)),
            |g| {
                for line in [
                    "To hear a short biography, press 1.",
                    "For a list of top campaign donors, press 2.",
                    "For recent votes in Congress, press 3.",
                    "To call this member's Capitol Hill office, press 4.",
                    "For committee assignments, press 5.",
                    "To return to the previous menu, press 9.",
                ] {
                    g.push(self.speech(session, line));
                }
            },
        );
        Ok(doc)
    }

    pub async fn member_bio(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::MemberBio).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::bioguide_selection(self, session, params, Route::MemberBio).await?
        {
            return Ok(doc);
        }
        let legislator = match self.require_member(session, params).await? {
            Ok(legislator) => legislator,
            Err(doc) => return Ok(doc),
        };

        let member_url = params.self_url(Route::Member);
        let bio = self.directory.legislator_bio(&legislator).await?;
        let text = bio.unwrap_or_else(|| {
            format!(
                "I'm sorry, no biography is available for {}.",
                legislator.full_name
            )
        });

        let mut doc = Twiml::new();
        // Reading happens inside a short gather so a keypress skips ahead.
        doc.gather(Gather::digits(1, 1).action(member_url.clone()), |g| {
            g.push(self.speech(session, &text));
        });
        self.next_action(&mut doc, params, Some(member_url));
        Ok(doc)
    }

    pub async fn member_donors(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::MemberDonors).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::bioguide_selection(self, session, params, Route::MemberDonors).await?
        {
            return Ok(doc);
        }
        let legislator = match self.require_member(session, params).await? {
            Ok(legislator) => legislator,
            Err(doc) => return Ok(doc),
        };

        let member_url = params.self_url(Route::Member);
        let contributors = self.directory.top_contributors(&legislator).await?;

        let mut doc = Twiml::new();
        if contributors.is_empty() {
            self.say(
                &mut doc,
                session,
                &format!(
                    "No campaign contribution records were found for {}.",
                    legislator.full_name
                ),
            );
        } else {
            let mut script = format!(
                "The top campaign contributors for {} are: ",
                legislator.full_name
            );
            for contributor in &contributors {
                script.push_str(&format!("{}, {}. ", contributor.name, contributor.total_amount));
            }
            doc.gather(Gather::digits(1, 1).action(member_url.clone()), |g| {
                g.push(self.speech(session, script.trim_end()));
            });
        }
        self.next_action(&mut doc, params, Some(member_url));
        Ok(doc)
    }

    pub async fn member_votes(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::MemberVotes).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::bioguide_selection(self, session, params, Route::MemberVotes).await?
        {
            return Ok(doc);
        }
        let legislator = match self.require_member(session, params).await? {
            Ok(legislator) => legislator,
            Err(doc) => return Ok(doc),
        };

        let member_url = params.self_url(Route::Member);
        let votes = self.directory.recent_votes(&legislator.bioguide_id).await?;

        let mut doc = Twiml::new();
        if votes.is_empty() {
            self.say(
                &mut doc,
                session,
                &format!("No recent votes were found for {}.", legislator.full_name),
            );
        } else {
            let mut script = format!("Recent votes for {}: ", legislator.full_name);
            for vote in &votes {
                script.push_str(&format!(
                    "On {}, voted {}. The vote {}. ",
                    vote.question, vote.voted, vote.result
                ));
            }
            doc.gather(Gather::digits(1, 1).action(member_url.clone()), |g| {
                g.push(self.speech(session, script.trim_end()));
            });
        }
        self.next_action(&mut doc, params, Some(member_url));
        Ok(doc)
    }

    pub async fn member_committees(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::MemberCommittees).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::bioguide_selection(self, session, params, Route::MemberCommittees).await?
        {
            return Ok(doc);
        }
        let legislator = match self.require_member(session, params).await? {
            Ok(legislator) => legislator,
            Err(doc) => return Ok(doc),
        };

        let member_url = params.self_url(Route::Member);
        let committees = self.directory.committees(&legislator).await?;

        let mut doc = Twiml::new();
        if committees.is_empty() {
            self.say(
                &mut doc,
                session,
                &format!(
                    "No committee assignments were found for {}.",
                    legislator.full_name
                ),
            );
        } else {
            let mut script = format!("{} serves on: ", legislator.full_name);
            for name in &committees {
                script.push_str(&format!("{name}. "));
            }
            doc.gather(Gather::digits(1, 1).action(member_url.clone()), |g| {
                g.push(self.speech(session, script.trim_end()));
            });
        }
        self.next_action(&mut doc, params, Some(member_url));
        Ok(doc)
    }

    /// Connects the caller to the member's Capitol Hill office.
    pub async fn call_member(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::CallMember).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::bioguide_selection(self, session, params, Route::CallMember).await?
        {
            return Ok(doc);
        }
        let legislator = match self.require_member(session, params).await? {
            Ok(legislator) => legislator,
            Err(doc) => return Ok(doc),
        };

        let mut doc = Twiml::new();
        match &legislator.phone {
            Some(phone) => {
                self.say(
                    &mut doc,
                    session,
                    &format!("Connecting you to {} at {}.", legislator.full_name, phone),
                );
                doc.dial(phone.clone());
            }
            None => {
                self.say(
                    &mut doc,
                    session,
                    &format!(
                        "I'm sorry, no office number is available for {}.",
                        legislator.full_name
                    ),
                );
                doc.redirect(params.self_url(Route::Member));
            }
        }
        Ok(doc)
    }

    /// The bills menu.
    pub async fn bills(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::Bills).await?
        {
            return Ok(doc);
        }

        if let Some(digits) = params.digits().map(str::to_string) {
            return Ok(handle_selection(self, session, MenuName::Bills, &digits, params));
        }

        let mut doc = Twiml::new();
        doc.gather(Gather::digits(1, self.input_timeout), |g| {
            for line in [
                "To learn about legislation in Congress, select from the following:",
                "For upcoming bills in the news, press 1.",
                "To search bills by number, press 2.",
                "To return to the previous menu, press 9.",
            ] {
                g.push(self.speech(session, line));
            }
        });
        Ok(doc)
    }

    /// Reads the bills scheduled for floor debate this week.
    pub async fn upcoming_bills(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::UpcomingBills).await?
        {
            return Ok(doc);
        }

        if params.digits() == Some("9") {
            let mut doc = Twiml::new();
            doc.redirect(Route::Bills.url());
            return Ok(doc);
        }

        let upcoming = self.directory.upcoming_bills().await?;

        let mut doc = Twiml::new();
        if upcoming.is_empty() {
            self.say(
                &mut doc,
                session,
                "No bills are scheduled for debate in the next few days.",
            );
        } else {
            self.say(
                &mut doc,
                session,
                "The following bills are coming up in the next few days:",
            );
            doc.gather(Gather::digits(1, 1).action(Route::Bills.url()), |g| {
                for entry in upcoming.iter().take(9) {
                    g.push(self.speech(session, &upcoming_bill_line(entry)));
                }
            });
        }
        self.next_action(&mut doc, params, Some(Route::Bills.url()));
        Ok(doc)
    }

    /// Bill search by number. A unique match goes straight to the bill;
    /// multiple matches are offered as a pick list.
    pub async fn search_bills(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::SearchBills).await?
        {
            return Ok(doc);
        }

        let mut doc = Twiml::new();

        if let Some(digits) = params.digits().map(str::to_string) {
            if digits == "0" {
                doc.redirect(Route::Bills.url());
                return Ok(doc);
            }
            match digits.trim().parse::<u32>() {
                Ok(number) => {
                    let bills = self.directory.bill_search(number).await?;
                    match bills.len() {
                        0 => {
                            self.say(
                                &mut doc,
                                session,
                                &format!("No bills were found matching {number}."),
                            );
                        }
                        1 => {
                            session.context_mut().referrer = Some(MenuName::Bills);
                            doc.redirect(
                                Route::Bill.url_with(&[("bill_id", &bills[0].bill_id)]),
                            );
                            return Ok(doc);
                        }
                        _ => {
                            session.context_mut().bills = Some(bills.clone());
                            doc.gather(
                                Gather::digits(1, self.input_timeout)
                                    .action(Route::SelectBill.url()),
                                |g| {
                                    g.push(self.speech(
                                        session,
                                        "More than one bill matches. Please select from the following:",
                                    ));
                                    for (index, bill) in bills.iter().enumerate() {
                                        g.push(self.speech(
                                            session,
                                            &format!(
                                                "Press {} for {}, {}.",
                                                index + 1,
                                                bill.spoken_name(),
                                                bill.title
                                            ),
                                        ));
                                    }
                                    g.push(self.speech(
                                        session,
                                        "Press 0 to search for a different number.",
                                    ));
                                },
                            );
                            return Ok(doc);
                        }
                    }
                }
                Err(_) => {
                    self.say(
                        &mut doc,
                        session,
                        "That search is not a number, please try again.",
                    );
                }
            }
        }

        doc.gather(Gather::entry(self.input_timeout), |g| {
            for line in [
                "Enter the number of the bill to search for, followed by the pound key.",
                "Exclude any prefixes such as H R or S.",
                "To return to the previous menu, press 0, followed by the pound key.",
            ] {
                g.push(self.speech(session, line));
            }
        });
        Ok(doc)
    }

    /// Resolves a digit against the search results cached by
    /// [`search_bills`](Self::search_bills).
    pub async fn select_bill(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::SelectBill).await?
        {
            return Ok(doc);
        }

        let mut doc = Twiml::new();
        let candidates = session.context().bills.clone();
        if let (Some(digits), Some(bills)) = (params.digits().map(str::to_string), candidates) {
            if digits == "0" {
                session.context_mut().bills = None;
                doc.redirect(Route::SearchBills.url());
                return Ok(doc);
            }
            let chosen = digits
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| bills.get(index).cloned());
            match chosen {
                Some(bill) => {
                    session.context_mut().bills = None;
                    session.context_mut().referrer = Some(MenuName::Bills);
                    doc.redirect(Route::Bill.url_with(&[("bill_id", &bill.bill_id)]));
                    return Ok(doc);
                }
                None => {
                    self.say(
                        &mut doc,
                        session,
                        "I'm sorry, that selection doesn't match any of the bills found.",
                    );
                }
            }
        }
        doc.redirect(Route::SearchBills.url());
        Ok(doc)
    }

    /// Reads a bill's overview, with the long summary on request.
    pub async fn bill(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::Bill).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::bill_selection(self, session, params, Route::Bill).await?
        {
            return Ok(doc);
        }

        let Some(bill_id) = params.bill_id().map(str::to_string) else {
            let mut doc = Twiml::new();
            doc.redirect(Route::SearchBills.url());
            return Ok(doc);
        };

        let Some(bill) = self.directory.bill_by_id(&bill_id).await? else {
            let mut doc = Twiml::new();
            self.say(&mut doc, session, "I'm sorry, I couldn't find that bill.");
            doc.redirect(Route::Bills.url());
            return Ok(doc);
        };

        // Digit 3 is handled inline as "read the full summary"; everything
        // else goes through the menu.
        let digits = params.digits().map(str::to_string);
        if let Some(digits) = &digits {
            if digits != "3" {
                return Ok(handle_selection(self, session, MenuName::Bill, digits, params));
            }
        }
        let read_summary = digits.is_some();

        let self_url = params.self_url(Route::Bill);
        let mut doc = Twiml::new();

        if !read_summary {
            if let Some(summary) = bill.summary.as_deref() {
                // Warn before committing the caller to a very long read.
                if summary.len() > 800 {
                    let words = summary.split_whitespace().count();
                    doc.gather(Gather::digits(1, 2).action(self_url.clone()), |g| {
                        g.push(self.speech(
                            session,
                            &format!(
                                "This bill's summary is {words} words long. \
                                 Press 3 now to hear all of it after the overview."
                            ),
                        ));
                    });
                }
            }
        }

        doc.gather(Gather::digits(1, 1).action(self_url.clone()), |g| {
            g.push(self.speech(
                session,
                &format!("{}. {}.", bill.spoken_name(), bill.title),
            ));
            if read_summary {
                if let Some(summary) = &bill.summary {
                    g.push(self.speech(session, summary));
                }
            }
            if let Some(sponsor) = &bill.sponsor {
                g.push(self.speech(session, &format!("Sponsored by {sponsor}.")));
            }
            let cosponsor_count = bill
                .cosponsor_count
                .unwrap_or(bill.cosponsors.len() as u32);
            if cosponsor_count > 8 {
                g.push(self.speech(
                    session,
                    &format!("This bill has {cosponsor_count} cosponsors."),
                ));
            } else if !bill.cosponsors.is_empty() {
                g.push(self.speech(
                    session,
                    &format!("Cosponsored by {}.", bill.cosponsors.join(", ")),
                ));
            }
            if let Some(action) = &bill.last_action {
                g.push(self.speech(session, &format!("Most recent action: {action}")));
            }
        });

        if params.next_url().is_some() {
            self.next_action(&mut doc, params, None);
            return Ok(doc);
        }

        doc.gather(Gather::digits(1, self.input_timeout).action(self_url), |g| {
            for line in [
                "To get text message updates about this bill, press 1.",
                "To search for another bill, press 2.",
                "To hear this bill's full summary, press 3.",
                "To return to the previous menu, press 9.",
                "To return to the main menu, press 0.",
            ] {
                g.push(self.speech(session, line));
            }
        });
        Ok(doc)
    }

    /// Subscribes the caller's number to SMS updates about a bill.
    pub async fn bill_subscribe(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::BillSubscribe).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::bill_selection(self, session, params, Route::BillSubscribe).await?
        {
            return Ok(doc);
        }

        let Some(bill_id) = params.bill_id().map(str::to_string) else {
            let mut doc = Twiml::new();
            doc.redirect(Route::SearchBills.url());
            return Ok(doc);
        };

        let phone = session.call().from.clone();
        let subscribed = self
            .directory
            .subscribe_to_bill_updates(&phone, &bill_id)
            .await?;

        let mut doc = Twiml::new();
        if subscribed {
            self.say(
                &mut doc,
                session,
                "You are subscribed. A text message confirmation is on its way to your phone.",
            );
        } else {
            self.say(
                &mut doc,
                session,
                "I'm sorry, I wasn't able to subscribe you to updates about this bill.",
            );
        }
        self.next_action(
            &mut doc,
            params,
            Some(Route::Bill.url_with(&[("bill_id", &bill_id)])),
        );
        Ok(doc)
    }

    /// Reads the caller's local election office details.
    pub async fn voting(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::Voting).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::zipcode_selection(self, session, params, Route::Voting).await?
        {
            return Ok(doc);
        }

        let Some(zipcode) = session.context().zipcode.clone() else {
            let mut doc = Twiml::new();
            doc.redirect(Route::Voting.url());
            return Ok(doc);
        };

        let offices = self.directory.election_offices_for_zip(&zipcode).await?;

        let mut doc = Twiml::new();
        if offices.is_empty() {
            self.say(
                &mut doc,
                session,
                "I'm sorry, no election offices were found for that zip code.",
            );
            session.context_mut().zipcode = None;
            doc.redirect(Route::Voting.url());
            return Ok(doc);
        }

        if let Some(digits) = params.digits().map(str::to_string) {
            // 3 re-prompts for a zip code; 1 and 2 go through the menu.
            if digits == "3" {
                session.context_mut().zipcode = None;
                doc.redirect(Route::Voting.url());
                return Ok(doc);
            }
            return Ok(handle_selection(self, session, MenuName::Voting, &digits, params));
        }

        let has_phone = offices.iter().any(|office| office.phone.is_some());
        doc.gather(Gather::digits(1, self.input_timeout), |g| {
            if offices.len() > 1 {
                g.push(self.speech(
                    session,
                    "More than one election office covers your zip code.",
                ));
            }
            g.push(self.speech(
                session,
                "Voter information, including how to register to vote and where to vote, \
                 is available from:",
            ));
            for office in &offices {
                for line in office_lines(office) {
                    g.push(self.speech(session, &line));
                }
            }
            if has_phone {
                g.push(self.speech(session, "To call your election office, press 1."));
            }
            g.push(self.speech(session, "To repeat this information, press 2."));
            g.push(self.speech(session, "To enter a new zip code, press 3."));
            g.push(self.speech(session, "To return to the previous menu, press 9."));
        });
        Ok(doc)
    }

    /// Connects the caller to an election office with a published number.
    pub async fn call_election_office(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::CallElectionOffice).await?
        {
            return Ok(doc);
        }
        if let GateOutcome::Intercept(doc) =
            gates::zipcode_selection(self, session, params, Route::CallElectionOffice).await?
        {
            return Ok(doc);
        }

        let Some(zipcode) = session.context().zipcode.clone() else {
            let mut doc = Twiml::new();
            doc.redirect(Route::Voting.url());
            return Ok(doc);
        };

        let offices = self.directory.election_offices_for_zip(&zipcode).await?;
        let reachable: Vec<_> = offices
            .into_iter()
            .filter(|office| office.phone.is_some())
            .collect();

        let mut doc = Twiml::new();
        if reachable.is_empty() {
            self.say(
                &mut doc,
                session,
                "I'm sorry, no phone number is published for your election office.",
            );
            doc.redirect(Route::Voting.url());
            return Ok(doc);
        }

        let chosen = if reachable.len() == 1 {
            Some(&reachable[0])
        } else {
            match params.digits() {
                None => {
                    doc.gather(Gather::digits(1, self.input_timeout), |g| {
                        for (index, office) in reachable.iter().enumerate() {
                            let name = office
                                .authority_name
                                .as_deref()
                                .unwrap_or("your election office");
                            let phone = office.phone.as_deref().unwrap_or_default();
                            g.push(self.speech(
                                session,
                                &format!("Press {} to call {} at {}.", index + 1, name, phone),
                            ));
                        }
                    });
                    return Ok(doc);
                }
                Some(digits) => digits
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| reachable.get(index)),
            }
        };

        match chosen.and_then(|office| office.phone.clone()) {
            Some(phone) => {
                self.say(
                    &mut doc,
                    session,
                    &format!("Connecting you to your election office at {phone}."),
                );
                doc.dial(phone);
            }
            None => {
                self.say(
                    &mut doc,
                    session,
                    "I'm sorry, I don't recognize that selection.",
                );
                doc.redirect(Route::Voting.url());
            }
        }
        Ok(doc)
    }

    /// The about menu.
    pub async fn about(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::About).await?
        {
            return Ok(doc);
        }

        if let Some(digits) = params.digits().map(str::to_string) {
            return Ok(handle_selection(self, session, MenuName::About, &digits, params));
        }

        let mut doc = Twiml::new();
        doc.gather(Gather::digits(1, self.input_timeout), |g| {
            for line in [
                "Thank you for using Capitol Call.",
                "To learn about the organization behind this service, press 1.",
                "To sign up for text message updates, press 2.",
                "To leave feedback about this service, press 3.",
                "To return to the previous menu, press 9.",
            ] {
                g.push(self.speech(session, line));
            }
        });
        Ok(doc)
    }

    pub async fn about_sunlight(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::AboutSunlight).await?
        {
            return Ok(doc);
        }

        let mut doc = Twiml::new();
        doc.gather(Gather::digits(1, 1).action(Route::About.url()), |g| {
            g.push(self.speech(
                session,
                "This service is built on data published by the Sunlight Foundation, \
                 a non-partisan, non-profit organization that uses the power of the \
                 Internet to make government more open and accountable.",
            ));
        });
        self.next_action(&mut doc, params, Some(Route::About.url()));
        Ok(doc)
    }

    /// SMS signup: the calling number with one keypress, or any ten-digit
    /// number entered manually.
    pub async fn signup(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::Signup).await?
        {
            return Ok(doc);
        }

        let mut doc = Twiml::new();
        let mut number: Option<String> = None;
        if let Some(digits) = params.digits().map(str::to_string) {
            if digits == "0" {
                doc.redirect(Route::About.url());
                return Ok(doc);
            }
            if digits == "1" {
                number = Some(session.call().from.clone());
            } else if digits.len() == 10 && digits.bytes().all(|b| b.is_ascii_digit()) {
                number = Some(format!("+1{digits}"));
            } else {
                self.say(
                    &mut doc,
                    session,
                    "That is not a valid phone number, please try again.",
                );
            }
        }

        if let Some(number) = number {
            self.mailbox.record_signup(&number).await?;
            self.say(&mut doc, session, "Thank you for signing up.");
            if params.next_url().is_none() {
                self.say(
                    &mut doc,
                    session,
                    "You will now be returned to the main menu.",
                );
            }
            self.next_action(&mut doc, params, None);
            return Ok(doc);
        }

        doc.gather(Gather::entry(self.input_timeout), |g| {
            for line in [
                "To subscribe with the number you are calling from, press 1, \
                 followed by the pound key.",
                "To subscribe with a different number, enter the ten digit number now, \
                 followed by the pound key.",
                "To return to the previous menu, press 0, followed by the pound key.",
            ] {
                g.push(self.speech(session, line));
            }
        });
        Ok(doc)
    }

    /// Records a feedback message and files it by recording URL.
    pub async fn feedback(
        &self,
        session: &mut CallSession,
        params: &mut RequestParams,
    ) -> Result<Twiml, FlowError> {
        if let GateOutcome::Intercept(doc) =
            gates::language_selection(self, session, params, Route::Feedback).await?
        {
            return Ok(doc);
        }

        let mut doc = Twiml::new();
        if let Some(recording_url) = params.recording_url() {
            self.mailbox
                .record_message(&session.call().call_sid, recording_url)
                .await?;
            self.say(&mut doc, session, "Thank you for your feedback.");
            if params.next_url().is_none() {
                self.say(
                    &mut doc,
                    session,
                    "You will now be returned to the main menu.",
                );
            }
            self.next_action(&mut doc, params, None);
            return Ok(doc);
        }

        self.say(
            &mut doc,
            session,
            "Please leave your message at the tone. Press the pound key when you are finished.",
        );
        doc.record(10, 120);
        Ok(doc)
    }
}

fn upcoming_bill_line(entry: &UpcomingBill) -> String {
    let chamber = match entry.chamber.as_str() {
        "house" => "House".to_string(),
        "senate" => "Senate".to_string(),
        other => other.to_string(),
    };
    let day = NaiveDate::parse_from_str(&entry.legislative_day, "%Y-%m-%d")
        .map(|date| format!("{} {}", date.format("%B"), date.format("%-d")))
        .unwrap_or_else(|_| entry.legislative_day.clone());
    let mut line = format!(
        "On {}, the {} will discuss {}, {}.",
        day,
        chamber,
        entry.bill.spoken_name(),
        entry.bill.title
    );
    for context in &entry.context {
        line.push(' ');
        line.push_str(context);
    }
    line
}

fn office_lines(office: &capitolcall_types::ElectionOffice) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(name) = &office.authority_name {
        lines.push(format!("{name}."));
    }
    if let Some(street) = &office.street {
        lines.push(format!(
            "Street address: {street}, {} {}.",
            office.city.as_deref().unwrap_or(""),
            office.state.as_deref().unwrap_or("")
        ));
    }
    if let Some(mailing) = &office.mailing_street {
        lines.push(format!(
            "Mailing address: {mailing}, {} {} {}.",
            office.mailing_city.as_deref().unwrap_or(""),
            office.state.as_deref().unwrap_or(""),
            office.mailing_zip.as_deref().unwrap_or("")
        ));
    }
    if let Some(phone) = &office.phone {
        lines.push(format!("Telephone number: {phone}."));
    }
    lines
}
