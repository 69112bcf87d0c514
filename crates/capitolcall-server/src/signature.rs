//! Webhook signature verification.
//!
//! The telephony provider signs every webhook: the full public URL of the
//! request, concatenated with each POST parameter name and value in
//! alphabetical order of name, is HMAC-SHA1'd with the account's auth
//! token and base64 encoded into the `X-Twilio-Signature` header.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

fn signed_payload(url: &str, form_params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = form_params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let mut payload = url.to_string();
    for (key, value) in sorted {
        payload.push_str(key);
        payload.push_str(value);
    }
    payload
}

fn mac_for(auth_token: &str, url: &str, form_params: &[(String, String)]) -> HmacSha1 {
    // HMAC accepts keys of any length; new_from_slice cannot fail.
    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes())
        .expect("HMAC key of any length is accepted");
    mac.update(signed_payload(url, form_params).as_bytes());
    mac
}

/// Computes the expected signature for a request. Used by tests and
/// outbound tooling; inbound checks go through [`validate`].
pub fn compute(auth_token: &str, url: &str, form_params: &[(String, String)]) -> String {
    BASE64.encode(mac_for(auth_token, url, form_params).finalize().into_bytes())
}

/// Verifies a provided signature header in constant time.
pub fn validate(
    auth_token: &str,
    url: &str,
    form_params: &[(String, String)],
    provided: &str,
) -> bool {
    let Ok(expected) = BASE64.decode(provided.trim()) else {
        return false;
    };
    mac_for(auth_token, url, form_params)
        .verify_slice(&expected)
        .is_ok()
}
