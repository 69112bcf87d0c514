//! The static menu graph.
//!
//! Every menu, numbered choice, forwarded-parameter whitelist, and parent
//! reference is declared here as data. Because menus and routes are enums,
//! a dangling action or parent is a compile error rather than a runtime
//! lookup failure; the dispatcher only has to handle bad digits.

use crate::session::ParamName;

/// Named menus a digit selection can be resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuName {
    Main,
    Member,
    Bills,
    Bill,
    Voting,
    About,
}

/// Every addressable conversation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    Members,
    Member,
    MemberBio,
    MemberDonors,
    MemberVotes,
    MemberCommittees,
    CallMember,
    Bills,
    UpcomingBills,
    SearchBills,
    SelectBill,
    Bill,
    BillSubscribe,
    Voting,
    CallElectionOffice,
    About,
    AboutSunlight,
    Signup,
    Feedback,
}

impl Route {
    /// The step's URL path.
    pub fn path(self) -> &'static str {
        match self {
            Self::Index => "/voice/",
            Self::Members => "/voice/members",
            Self::Member => "/voice/member",
            Self::MemberBio => "/voice/member/bio",
            Self::MemberDonors => "/voice/member/donors",
            Self::MemberVotes => "/voice/member/votes",
            Self::MemberCommittees => "/voice/member/committees",
            Self::CallMember => "/voice/member/call",
            Self::Bills => "/voice/bills",
            Self::UpcomingBills => "/voice/bills/upcoming",
            Self::SearchBills => "/voice/bills/search",
            Self::SelectBill => "/voice/bills/select",
            Self::Bill => "/voice/bill",
            Self::BillSubscribe => "/voice/bill/subscribe",
            Self::Voting => "/voice/voting",
            Self::CallElectionOffice => "/voice/voting/call",
            Self::About => "/voice/about",
            Self::AboutSunlight => "/voice/about/sunlight",
            Self::Signup => "/voice/signup",
            Self::Feedback => "/voice/feedback",
        }
    }

    /// The step's URL with no parameters.
    pub fn url(self) -> String {
        self.path().to_string()
    }

    /// The step's URL with query parameters, form-encoded.
    pub fn url_with(self, params: &[(&str, &str)]) -> String {
        if params.is_empty() {
            return self.url();
        }
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            query.append_pair(key, value);
        }
        format!("{}?{}", self.path(), query.finish())
    }

    /// What a zip code entered at this step is for. Decides the prompt
    /// wording the zip-code gate speaks.
    pub fn zip_purpose(self) -> ZipPurpose {
        match self {
            Self::Voting | Self::CallElectionOffice => ZipPurpose::ElectionOffice,
            _ => ZipPurpose::Representative,
        }
    }
}

/// Why the zip-code gate is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipPurpose {
    Representative,
    ElectionOffice,
}

/// A menu's spoken label. Templates substitute a display name, e.g. the
/// selected legislator's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuLabel {
    Literal(&'static str),
    /// `{}` is replaced with the substitution at render time.
    Template(&'static str),
}

impl MenuLabel {
    pub fn render(&self, substitution: Option<&str>) -> String {
        match self {
            Self::Literal(text) => (*text).to_string(),
            Self::Template(template) => template.replace("{}", substitution.unwrap_or("")),
        }
    }
}

/// Where digit `9` goes from a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    /// Always the named menu.
    Static(MenuName),
    /// The menu recorded as the session's referrer, falling back to the
    /// main menu when there is none. Used by steps reachable from more
    /// than one place.
    FromReferrer,
}

/// One numbered menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub key: u8,
    /// The step the selection redirects to.
    pub action: Route,
    /// Request parameters forwarded onto the redirect URL. Anything not
    /// listed here is dropped at the menu boundary.
    pub params: &'static [ParamName],
}

/// A menu definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Menu {
    pub name: MenuName,
    pub label: MenuLabel,
    /// The step that replays this menu's prompt.
    pub route: Route,
    /// `None` only for the main menu; `9` from there replays it.
    pub parent: Option<ParentRef>,
    pub choices: &'static [Choice],
}

static MAIN: Menu = Menu {
    name: MenuName::Main,
    label: MenuLabel::Literal("Main menu"),
    route: Route::Index,
    parent: None,
    choices: &[
        Choice {
            key: 1,
            action: Route::Members,
            params: &[],
        },
        Choice {
            key: 2,
            action: Route::Bills,
            params: &[],
        },
        Choice {
            key: 3,
            action: Route::Voting,
            params: &[],
        },
        Choice {
            key: 4,
            action: Route::About,
            params: &[],
        },
    ],
};

static MEMBER: Menu = Menu {
    name: MenuName::Member,
    label: MenuLabel::Template("Options for {}"),
    route: Route::Member,
    parent: Some(ParentRef::Static(MenuName::Main)),
    choices: &[
        Choice {
            key: 1,
            action: Route::MemberBio,
            params: &[ParamName::BioguideId],
        },
        Choice {
            key: 2,
            action: Route::MemberDonors,
            params: &[ParamName::BioguideId],
        },
        Choice {
            key: 3,
            action: Route::MemberVotes,
            params: &[ParamName::BioguideId],
        },
        Choice {
            key: 4,
            action: Route::CallMember,
            params: &[ParamName::BioguideId],
        },
        Choice {
            key: 5,
            action: Route::MemberCommittees,
            params: &[ParamName::BioguideId],
        },
    ],
};

static BILLS: Menu = Menu {
    name: MenuName::Bills,
    label: MenuLabel::Literal("Bills in Congress"),
    route: Route::Bills,
    parent: Some(ParentRef::Static(MenuName::Main)),
    choices: &[
        Choice {
            key: 1,
            action: Route::UpcomingBills,
            params: &[],
        },
        Choice {
            key: 2,
            action: Route::SearchBills,
            params: &[],
        },
    ],
};

static BILL: Menu = Menu {
    name: MenuName::Bill,
    label: MenuLabel::Template("Information about {}"),
    route: Route::Bill,
    parent: Some(ParentRef::FromReferrer),
    choices: &[
        Choice {
            key: 1,
            action: Route::BillSubscribe,
            params: &[ParamName::BillId],
        },
        Choice {
            key: 2,
            action: Route::SearchBills,
            params: &[],
        },
        Choice {
            key: 3,
            action: Route::Bill,
            params: &[ParamName::BillId],
        },
        Choice {
            key: 0,
            action: Route::Index,
            params: &[],
        },
    ],
};

static VOTING: Menu = Menu {
    name: MenuName::Voting,
    label: MenuLabel::Literal("Voter information"),
    route: Route::Voting,
    parent: Some(ParentRef::Static(MenuName::Main)),
    choices: &[
        Choice {
            key: 1,
            action: Route::CallElectionOffice,
            params: &[],
        },
        Choice {
            key: 2,
            action: Route::Voting,
            params: &[],
        },
    ],
};

static ABOUT: Menu = Menu {
    name: MenuName::About,
    label: MenuLabel::Literal("About this service"),
    route: Route::About,
    parent: Some(ParentRef::Static(MenuName::Main)),
    choices: &[
        Choice {
            key: 1,
            action: Route::AboutSunlight,
            params: &[],
        },
        Choice {
            key: 2,
            action: Route::Signup,
            params: &[],
        },
        Choice {
            key: 3,
            action: Route::Feedback,
            params: &[],
        },
    ],
};

/// Looks up a menu definition.
pub fn menu(name: MenuName) -> &'static Menu {
    match name {
        MenuName::Main => &MAIN,
        MenuName::Member => &MEMBER,
        MenuName::Bills => &BILLS,
        MenuName::Bill => &BILL,
        MenuName::Voting => &VOTING,
        MenuName::About => &ABOUT,
    }
}
