//! End-to-end conversation tests against canned directory data.
//!
//! These drive the engine exactly the way the server does: one `handle`
//! call per webhook, with the session carried between requests.

use async_trait::async_trait;
use capitolcall_flow::menu::{MenuName, Route};
use capitolcall_flow::session::{Call, CallSession, RequestParams};
use capitolcall_flow::{Directory, DirectoryError, Engine, Mailbox, StoreError};
use capitolcall_twiml::{SpeechRenderer, Twiml, Verb};
use capitolcall_types::{
    Bill, Contributor, ElectionOffice, Language, Legislator, UpcomingBill, Vote,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct StubDirectory {
    legislators: Vec<Legislator>,
    bills: Vec<Bill>,
    upcoming: Vec<UpcomingBill>,
    offices: Vec<ElectionOffice>,
    votes: Vec<Vote>,
    contributors: Vec<Contributor>,
    bio: Option<String>,
    committees: Vec<String>,
    subscribe_ok: bool,
    fail: bool,
}

impl StubDirectory {
    fn check(&self) -> Result<(), DirectoryError> {
        if self.fail {
            Err(DirectoryError::Upstream("stub failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Directory for StubDirectory {
    async fn legislators_for_zip(&self, _zipcode: &str) -> Result<Vec<Legislator>, DirectoryError> {
        self.check()?;
        Ok(self.legislators.clone())
    }

    async fn legislator_by_bioguide(
        &self,
        bioguide_id: &str,
    ) -> Result<Option<Legislator>, DirectoryError> {
        self.check()?;
        Ok(self
            .legislators
            .iter()
            .find(|l| l.bioguide_id == bioguide_id)
            .cloned())
    }

    async fn legislator_bio(
        &self,
        _legislator: &Legislator,
    ) -> Result<Option<String>, DirectoryError> {
        self.check()?;
        Ok(self.bio.clone())
    }

    async fn top_contributors(
        &self,
        _legislator: &Legislator,
    ) -> Result<Vec<Contributor>, DirectoryError> {
        self.check()?;
        Ok(self.contributors.clone())
    }

    async fn recent_votes(&self, _bioguide_id: &str) -> Result<Vec<Vote>, DirectoryError> {
        self.check()?;
        Ok(self.votes.clone())
    }

    async fn committees(&self, _legislator: &Legislator) -> Result<Vec<String>, DirectoryError> {
        self.check()?;
        Ok(self.committees.clone())
    }

    async fn upcoming_bills(&self) -> Result<Vec<UpcomingBill>, DirectoryError> {
        self.check()?;
        Ok(self.upcoming.clone())
    }

    async fn bill_search(&self, number: u32) -> Result<Vec<Bill>, DirectoryError> {
        self.check()?;
        Ok(self
            .bills
            .iter()
            .filter(|b| b.number == number)
            .cloned()
            .collect())
    }

    async fn bill_by_id(&self, bill_id: &str) -> Result<Option<Bill>, DirectoryError> {
        self.check()?;
        Ok(self.bills.iter().find(|b| b.bill_id == bill_id).cloned())
    }

    async fn subscribe_to_bill_updates(
        &self,
        _phone: &str,
        _bill_id: &str,
    ) -> Result<bool, DirectoryError> {
        self.check()?;
        Ok(self.subscribe_ok)
    }

    async fn election_offices_for_zip(
        &self,
        _zipcode: &str,
    ) -> Result<Vec<ElectionOffice>, DirectoryError> {
        self.check()?;
        Ok(self.offices.clone())
    }
}

#[derive(Default)]
struct StubMailbox {
    signups: Mutex<Vec<String>>,
    messages: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailbox for StubMailbox {
    async fn record_signup(&self, phone: &str) -> Result<(), StoreError> {
        self.signups.lock().unwrap().push(phone.to_string());
        Ok(())
    }

    async fn record_message(&self, call_sid: &str, recording_url: &str) -> Result<(), StoreError> {
        self.messages
            .lock()
            .unwrap()
            .push((call_sid.to_string(), recording_url.to_string()));
        Ok(())
    }
}

fn languages() -> Vec<Language> {
    vec![
        Language {
            code: "en".to_string(),
            label: "English".to_string(),
            prompt: "Press {digit} to continue in English.".to_string(),
        },
        Language {
            code: "es".to_string(),
            label: "Spanish".to_string(),
            prompt: "Presione {digit} para continuar en espanol.".to_string(),
        },
    ]
}

fn engine_with(directory: StubDirectory, mailbox: Arc<StubMailbox>) -> Engine {
    Engine::new(
        Arc::new(directory),
        mailbox,
        SpeechRenderer::new("en", None),
        languages(),
        6,
    )
}

fn engine(directory: StubDirectory) -> Engine {
    engine_with(directory, Arc::new(StubMailbox::default()))
}

fn request(extra: &[(&str, &str)]) -> RequestParams {
    let mut pairs = vec![
        ("CallSid".to_string(), "CA100".to_string()),
        ("CallStatus".to_string(), "in-progress".to_string()),
        ("From".to_string(), "+12025551234".to_string()),
        ("To".to_string(), "+18005559876".to_string()),
    ];
    pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    RequestParams::from_pairs(pairs).unwrap()
}

fn english_session() -> CallSession {
    let mut session = CallSession::new(Call::new(&request(&[])));
    session.context_mut().language = Some("en".to_string());
    session
}

fn legislator(bioguide_id: &str, full_name: &str, phone: Option<&str>) -> Legislator {
    let mut parts = full_name.split_whitespace();
    let title = parts.next().unwrap_or_default().to_string();
    let first_name = parts.next().unwrap_or_default().to_string();
    let last_name = parts.next().unwrap_or_default().to_string();
    Legislator {
        bioguide_id: bioguide_id.to_string(),
        crp_id: None,
        title,
        short_title: None,
        first_name,
        last_name,
        full_name: full_name.to_string(),
        phone: phone.map(str::to_string),
        party: None,
        state: Some("OH".to_string()),
        district: None,
    }
}

fn bill(bill_id: &str, number: u32, title: &str) -> Bill {
    Bill {
        bill_id: bill_id.to_string(),
        bill_type: "hr".to_string(),
        number,
        title: title.to_string(),
        short_title: None,
        summary: None,
        sponsor: Some("Representative Jane Doe".to_string()),
        cosponsor_count: None,
        cosponsors: Vec::new(),
        last_action: Some("Referred to committee.".to_string()),
        chamber: Some("house".to_string()),
    }
}

/// All spoken text in the document, gathered bodies included.
fn spoken(doc: &Twiml) -> Vec<String> {
    fn walk(verbs: &[Verb], out: &mut Vec<String>) {
        for verb in verbs {
            match verb {
                Verb::Say { text, .. } => out.push(text.clone()),
                Verb::Gather { body, .. } => walk(body, out),
                _ => {}
            }
        }
    }
    let mut out = Vec::new();
    walk(doc.verbs(), &mut out);
    out
}

fn redirects(doc: &Twiml) -> Vec<String> {
    doc.verbs()
        .iter()
        .filter_map(|verb| match verb {
            Verb::Redirect { url } => Some(url.clone()),
            _ => None,
        })
        .collect()
}

fn says_containing(doc: &Twiml, needle: &str) -> bool {
    spoken(doc).iter().any(|line| line.contains(needle))
}

#[tokio::test]
async fn first_contact_prompts_for_language() {
    let engine = engine(StubDirectory::default());
    let mut session = CallSession::new(Call::new(&request(&[])));
    let mut params = request(&[]);

    let doc = engine
        .handle(Route::Index, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(&doc, "Press 1 to continue in English."));
    assert!(says_containing(&doc, "Presione 2 para continuar en espanol."));
    assert_eq!(session.context().language, None);
}

#[tokio::test]
async fn language_digit_is_consumed_exactly_once() {
    let engine = engine(StubDirectory::default());
    let mut session = CallSession::new(Call::new(&request(&[])));
    let mut params = request(&[("Digits", "2")]);

    let doc = engine
        .handle(Route::Index, &mut session, &mut params)
        .await
        .unwrap();

    // The 2 chose Spanish; it must not also select "bills" from the main
    // menu. The caller sees the main menu prompt instead.
    assert_eq!(session.context().language.as_deref(), Some("es"));
    assert!(redirects(&doc).is_empty());
    assert!(says_containing(&doc, "select from the following"));
}

#[tokio::test]
async fn explicit_language_param_leaves_digits_for_the_menu() {
    let engine = engine(StubDirectory::default());
    let mut session = CallSession::new(Call::new(&request(&[])));
    let mut params = request(&[("language", "es"), ("Digits", "1")]);

    let doc = engine
        .handle(Route::Index, &mut session, &mut params)
        .await
        .unwrap();

    assert_eq!(session.context().language.as_deref(), Some("es"));
    assert_eq!(redirects(&doc), vec!["/voice/members".to_string()]);
}

#[tokio::test]
async fn explicit_language_param_overrides_context() {
    let engine = engine(StubDirectory::default());
    let mut session = english_session();
    let mut params = request(&[("language", "es")]);

    engine
        .handle(Route::Index, &mut session, &mut params)
        .await
        .unwrap();

    assert_eq!(session.context().language.as_deref(), Some("es"));
}

#[tokio::test]
async fn unknown_main_menu_digit_apologizes_and_replays() {
    let engine = engine(StubDirectory::default());
    let mut session = english_session();
    let mut params = request(&[("Digits", "7")]);

    let doc = engine
        .handle(Route::Index, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(&doc, "I don't recognize that selection"));
    assert_eq!(redirects(&doc), vec!["/voice/".to_string()]);
}

#[tokio::test]
async fn members_without_zip_prompts_for_one() {
    let engine = engine(StubDirectory::default());
    let mut session = english_session();
    let mut params = request(&[]);

    let doc = engine
        .handle(Route::Members, &mut session, &mut params)
        .await
        .unwrap();

    let gather = doc
        .verbs()
        .iter()
        .find_map(|verb| match verb {
            Verb::Gather { spec, .. } => Some(spec.clone()),
            _ => None,
        })
        .expect("zip prompt should gather digits");
    assert_eq!(gather.num_digits, Some(5));
    assert!(says_containing(&doc, "five digit zip code"));
}

#[tokio::test]
async fn invalid_zip_reprompts_with_error() {
    let engine = engine(StubDirectory::default());
    let mut session = english_session();
    let mut params = request(&[("Digits", "123")]);

    let doc = engine
        .handle(Route::Members, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(&doc, "123 is not a valid zip code"));
    assert_eq!(session.context().zipcode, None);
}

#[tokio::test]
async fn zip_entry_flows_into_member_pick_list() {
    let directory = StubDirectory {
        legislators: vec![
            legislator("B000944", "Senator Sherrod Brown", Some("202-224-2315")),
            legislator("P000449", "Senator Rob Portman", Some("202-224-3353")),
            legislator("F000455", "Representative Marcia Fudge", None),
        ],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();

    // Zip entry on the members step.
    let mut params = request(&[("Digits", "44101")]);
    let doc = engine
        .handle(Route::Members, &mut session, &mut params)
        .await
        .unwrap();
    assert_eq!(session.context().zipcode.as_deref(), Some("44101"));
    assert_eq!(redirects(&doc), vec!["/voice/member".to_string()]);

    // The member step offers the pick list and caches it.
    let mut params = request(&[]);
    let doc = engine
        .handle(Route::Member, &mut session, &mut params)
        .await
        .unwrap();
    assert!(says_containing(&doc, "Press 1 for Senator Sherrod Brown."));
    assert!(says_containing(&doc, "Press 3 for Representative Marcia Fudge."));
    assert_eq!(
        session.context().legislators.as_ref().map(Vec::len),
        Some(3)
    );

    // A digit resolves against the cached list and lands on the menu.
    let mut params = request(&[("Digits", "1")]);
    let doc = engine
        .handle(Route::Member, &mut session, &mut params)
        .await
        .unwrap();
    assert!(says_containing(&doc, "Options for Senator Sherrod Brown"));
    assert_eq!(
        session
            .context()
            .legislator
            .as_ref()
            .map(|l| l.bioguide_id.as_str()),
        Some("B000944")
    );
}

#[tokio::test]
async fn zip_with_no_members_apologizes_and_clears_zip() {
    let engine = engine(StubDirectory::default());
    let mut session = english_session();
    session.context_mut().zipcode = Some("00000".to_string());

    let mut params = request(&[]);
    let doc = engine
        .handle(Route::Member, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(&doc, "wasn't able to find any members"));
    // Spelled out digit by digit.
    assert!(says_containing(&doc, "0 0 0 0 0"));
    assert_eq!(session.context().zipcode, None);
}

#[tokio::test]
async fn member_menu_nine_returns_to_main() {
    let directory = StubDirectory {
        legislators: vec![legislator("B000944", "Senator Sherrod Brown", None)],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    let mut params = request(&[("bioguide_id", "B000944"), ("Digits", "9")]);

    let doc = engine
        .handle(Route::Member, &mut session, &mut params)
        .await
        .unwrap();

    assert_eq!(redirects(&doc), vec!["/voice/".to_string()]);
}

#[tokio::test]
async fn member_selection_forwards_bioguide_to_substep() {
    let directory = StubDirectory {
        legislators: vec![legislator("B000944", "Senator Sherrod Brown", None)],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    let mut params = request(&[("bioguide_id", "B000944"), ("Digits", "2")]);

    let doc = engine
        .handle(Route::Member, &mut session, &mut params)
        .await
        .unwrap();

    assert_eq!(
        redirects(&doc),
        vec!["/voice/member/donors?bioguide_id=B000944".to_string()]
    );
    assert_eq!(session.context().referrer, Some(MenuName::Member));
}

#[tokio::test]
async fn member_committees_reads_assignments_then_offers_the_menu() {
    let directory = StubDirectory {
        legislators: vec![legislator("B000944", "Senator Sherrod Brown", None)],
        committees: vec![
            "Committee on Agriculture, Nutrition, and Forestry".to_string(),
            "Subcommittee on Jobs, Rural Economic Growth and Energy Innovation".to_string(),
        ],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    let mut params = request(&[("bioguide_id", "B000944")]);

    let doc = engine
        .handle(Route::MemberCommittees, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(&doc, "Senator Sherrod Brown serves on:"));
    assert!(says_containing(
        &doc,
        "Committee on Agriculture, Nutrition, and Forestry."
    ));
    assert!(says_containing(
        &doc,
        "Subcommittee on Jobs, Rural Economic Growth and Energy Innovation."
    ));
    assert_eq!(
        redirects(&doc),
        vec!["/voice/member?bioguide_id=B000944".to_string()]
    );
}

#[tokio::test]
async fn member_committees_without_assignments_apologizes() {
    let directory = StubDirectory {
        legislators: vec![legislator("B000944", "Senator Sherrod Brown", None)],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    let mut params = request(&[("bioguide_id", "B000944")]);

    let doc = engine
        .handle(Route::MemberCommittees, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(
        &doc,
        "No committee assignments were found for Senator Sherrod Brown."
    ));
}

#[tokio::test]
async fn call_member_dials_the_office() {
    let directory = StubDirectory {
        legislators: vec![legislator(
            "B000944",
            "Senator Sherrod Brown",
            Some("202-224-2315"),
        )],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    let mut params = request(&[("bioguide_id", "B000944")]);

    let doc = engine
        .handle(Route::CallMember, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(&doc, "Connecting you to Senator Sherrod Brown"));
    assert!(doc
        .verbs()
        .iter()
        .any(|verb| matches!(verb, Verb::Dial { number } if number == "202-224-2315")));
}

#[tokio::test]
async fn search_with_unique_match_goes_straight_to_the_bill() {
    let directory = StubDirectory {
        bills: vec![bill("hr4310-112", 4310, "National Defense Authorization Act")],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    let mut params = request(&[("Digits", "4310")]);

    let doc = engine
        .handle(Route::SearchBills, &mut session, &mut params)
        .await
        .unwrap();

    assert_eq!(
        redirects(&doc),
        vec!["/voice/bill?bill_id=hr4310-112".to_string()]
    );
    assert_eq!(session.context().referrer, Some(MenuName::Bills));
}

#[tokio::test]
async fn ambiguous_search_offers_pick_list_then_resolves() {
    let directory = StubDirectory {
        bills: vec![
            bill("hr1-112", 1, "Full-Year Continuing Appropriations Act"),
            bill("hr1-111", 1, "American Recovery and Reinvestment Act"),
        ],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();

    let mut params = request(&[("Digits", "1")]);
    let doc = engine
        .handle(Route::SearchBills, &mut session, &mut params)
        .await
        .unwrap();
    assert!(says_containing(&doc, "More than one bill matches"));
    assert_eq!(session.context().bills.as_ref().map(Vec::len), Some(2));

    let mut params = request(&[("Digits", "2")]);
    let doc = engine
        .handle(Route::SelectBill, &mut session, &mut params)
        .await
        .unwrap();
    assert_eq!(
        redirects(&doc),
        vec!["/voice/bill?bill_id=hr1-111".to_string()]
    );
    assert_eq!(session.context().bills, None);
}

#[tokio::test]
async fn bill_read_includes_sponsor_and_follow_up_menu() {
    let directory = StubDirectory {
        bills: vec![bill("hr4310-112", 4310, "National Defense Authorization Act")],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    let mut params = request(&[("bill_id", "hr4310-112")]);

    let doc = engine
        .handle(Route::Bill, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(&doc, "House Bill 4310"));
    assert!(says_containing(&doc, "Sponsored by Representative Jane Doe."));
    assert!(says_containing(&doc, "press 1"));
}

#[tokio::test]
async fn bill_menu_nine_returns_to_referring_menu() {
    let directory = StubDirectory {
        bills: vec![bill("hr4310-112", 4310, "National Defense Authorization Act")],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    session.context_mut().referrer = Some(MenuName::Bills);
    let mut params = request(&[("bill_id", "hr4310-112"), ("Digits", "9")]);

    let doc = engine
        .handle(Route::Bill, &mut session, &mut params)
        .await
        .unwrap();

    assert_eq!(redirects(&doc), vec!["/voice/bills".to_string()]);
}

#[tokio::test]
async fn bill_subscription_confirms() {
    let directory = StubDirectory {
        bills: vec![bill("hr4310-112", 4310, "National Defense Authorization Act")],
        subscribe_ok: true,
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    let mut params = request(&[("bill_id", "hr4310-112")]);

    let doc = engine
        .handle(Route::BillSubscribe, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(&doc, "You are subscribed"));
    assert_eq!(
        redirects(&doc),
        vec!["/voice/bill?bill_id=hr4310-112".to_string()]
    );
}

#[tokio::test]
async fn missing_bill_id_redirects_to_search() {
    let engine = engine(StubDirectory::default());
    let mut session = english_session();
    let mut params = request(&[]);

    let doc = engine
        .handle(Route::Bill, &mut session, &mut params)
        .await
        .unwrap();

    assert_eq!(redirects(&doc), vec!["/voice/bills/search".to_string()]);
}

#[tokio::test]
async fn upcoming_bills_reads_the_schedule() {
    let mut scheduled = bill("hr4310-112", 4310, "National Defense Authorization Act");
    scheduled.chamber = Some("house".to_string());
    let directory = StubDirectory {
        upcoming: vec![UpcomingBill {
            bill_id: "hr4310-112".to_string(),
            chamber: "house".to_string(),
            legislative_day: "2012-06-05".to_string(),
            bill: scheduled,
            context: vec!["Defense spending for fiscal year 2013.".to_string()],
        }],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    let mut params = request(&[]);

    let doc = engine
        .handle(Route::UpcomingBills, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(
        &doc,
        "On June 5, the House will discuss House Bill 4310"
    ));
    assert!(says_containing(&doc, "Defense spending for fiscal year 2013."));
}

#[tokio::test]
async fn voting_reads_office_details() {
    let directory = StubDirectory {
        offices: vec![ElectionOffice {
            authority_name: Some("Cuyahoga County Board of Elections".to_string()),
            street: Some("2925 Euclid Avenue".to_string()),
            city: Some("Cleveland".to_string()),
            state: Some("OH".to_string()),
            mailing_street: None,
            mailing_city: None,
            mailing_zip: None,
            phone: Some("216-443-8683".to_string()),
        }],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    session.context_mut().zipcode = Some("44101".to_string());
    let mut params = request(&[]);

    let doc = engine
        .handle(Route::Voting, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(&doc, "Cuyahoga County Board of Elections."));
    assert!(says_containing(
        &doc,
        "Street address: 2925 Euclid Avenue, Cleveland OH."
    ));
    assert!(says_containing(&doc, "To call your election office, press 1."));
}

#[tokio::test]
async fn call_election_office_dials_the_only_office() {
    let directory = StubDirectory {
        offices: vec![ElectionOffice {
            authority_name: Some("Cuyahoga County Board of Elections".to_string()),
            street: None,
            city: None,
            state: None,
            mailing_street: None,
            mailing_city: None,
            mailing_zip: None,
            phone: Some("216-443-8683".to_string()),
        }],
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    session.context_mut().zipcode = Some("44101".to_string());
    let mut params = request(&[]);

    let doc = engine
        .handle(Route::CallElectionOffice, &mut session, &mut params)
        .await
        .unwrap();

    assert!(doc
        .verbs()
        .iter()
        .any(|verb| matches!(verb, Verb::Dial { number } if number == "216-443-8683")));
}

#[tokio::test]
async fn signup_with_calling_number() {
    let mailbox = Arc::new(StubMailbox::default());
    let engine = engine_with(StubDirectory::default(), mailbox.clone());
    let mut session = english_session();
    let mut params = request(&[("Digits", "1")]);

    let doc = engine
        .handle(Route::Signup, &mut session, &mut params)
        .await
        .unwrap();

    assert!(says_containing(&doc, "Thank you for signing up."));
    assert_eq!(
        mailbox.signups.lock().unwrap().as_slice(),
        ["+12025551234".to_string()]
    );
    assert_eq!(redirects(&doc), vec!["/voice/".to_string()]);
}

#[tokio::test]
async fn signup_with_entered_number_gets_country_code() {
    let mailbox = Arc::new(StubMailbox::default());
    let engine = engine_with(StubDirectory::default(), mailbox.clone());
    let mut session = english_session();
    let mut params = request(&[("Digits", "2165551234")]);

    engine
        .handle(Route::Signup, &mut session, &mut params)
        .await
        .unwrap();

    assert_eq!(
        mailbox.signups.lock().unwrap().as_slice(),
        ["+12165551234".to_string()]
    );
}

#[tokio::test]
async fn feedback_records_then_files_the_recording() {
    let mailbox = Arc::new(StubMailbox::default());
    let engine = engine_with(StubDirectory::default(), mailbox.clone());
    let mut session = english_session();

    let mut params = request(&[]);
    let doc = engine
        .handle(Route::Feedback, &mut session, &mut params)
        .await
        .unwrap();
    assert!(doc
        .verbs()
        .iter()
        .any(|verb| matches!(verb, Verb::Record { .. })));

    let mut params = request(&[(
        "RecordingUrl",
        "https://api.example.org/recordings/RE123",
    )]);
    let doc = engine
        .handle(Route::Feedback, &mut session, &mut params)
        .await
        .unwrap();
    assert!(says_containing(&doc, "Thank you for your feedback."));
    assert_eq!(
        mailbox.messages.lock().unwrap().as_slice(),
        [(
            "CA100".to_string(),
            "https://api.example.org/recordings/RE123".to_string()
        )]
    );
}

#[tokio::test]
async fn directory_failure_surfaces_as_an_error() {
    let directory = StubDirectory {
        fail: true,
        ..StubDirectory::default()
    };
    let engine = engine(directory);
    let mut session = english_session();
    session.context_mut().zipcode = Some("44101".to_string());
    let mut params = request(&[]);

    let result = engine.handle(Route::Member, &mut session, &mut params).await;
    assert!(result.is_err());
}
