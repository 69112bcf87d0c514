//! Menu selection dispatch.

use crate::menu::{menu, MenuName, ParentRef, Route};
use crate::session::{CallContext, CallSession, RequestParams};
use crate::steps::Engine;
use capitolcall_twiml::Twiml;
use thiserror::Error;

/// Where digit `9` leads from the given menu.
pub fn parent_route(menu_name: MenuName, context: &CallContext) -> Route {
    let definition = menu(menu_name);
    match definition.parent {
        None => Route::Index,
        Some(ParentRef::Static(parent)) => menu(parent).route,
        Some(ParentRef::FromReferrer) => context
            .referrer
            .filter(|referrer| *referrer != menu_name)
            .map(|referrer| menu(referrer).route)
            .unwrap_or(Route::Index),
    }
}

#[derive(Debug, Error)]
enum SelectionError {
    #[error("selection {0:?} is not a digit")]
    NotADigit(String),
    #[error("menu has no choice for digit {0}")]
    NoSuchChoice(u8),
}

/// Resolves a pressed digit against a menu.
///
/// Digit `9` always navigates to the menu's parent. Any other digit must
/// match a declared choice; the response redirects to the choice's action
/// with only its whitelisted parameters forwarded, and the menu is recorded
/// as the session referrer. A digit that matches nothing gets a spoken
/// apology and a redirect back to the same menu, never an HTTP error.
pub fn handle_selection(
    engine: &Engine,
    session: &mut CallSession,
    menu_name: MenuName,
    digits: &str,
    params: &RequestParams,
) -> Twiml {
    match try_select(session, menu_name, digits, params) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!(menu = ?menu_name, digits, %err, "menu selection not recognized");
            let language = session.language(engine.default_language());
            let mut doc = Twiml::new();
            doc.push(engine.renderer().speech(
                "I'm sorry, I don't recognize that selection. Let's try again.",
                &language,
            ));
            doc.redirect(menu(menu_name).route.url());
            doc
        }
    }
}

fn try_select(
    session: &mut CallSession,
    menu_name: MenuName,
    digits: &str,
    params: &RequestParams,
) -> Result<Twiml, SelectionError> {
    let digit: u8 = digits
        .trim()
        .parse()
        .map_err(|_| SelectionError::NotADigit(digits.to_string()))?;

    let mut doc = Twiml::new();
    if digit == 9 {
        doc.redirect(parent_route(menu_name, session.context()).url());
        return Ok(doc);
    }

    let definition = menu(menu_name);
    let choice = definition
        .choices
        .iter()
        .find(|choice| choice.key == digit)
        .ok_or(SelectionError::NoSuchChoice(digit))?;

    let forwarded: Vec<(&str, &str)> = choice
        .params
        .iter()
        .filter_map(|name| params.get(*name).map(|value| (name.as_str(), value)))
        .collect();

    session.context_mut().referrer = Some(menu_name);
    doc.redirect(choice.action.url_with(&forwarded));
    Ok(doc)
}
