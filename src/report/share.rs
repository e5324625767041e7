//! Prefilled WhatsApp share links.

use url::form_urlencoded;
use url::Url;

const WHATSAPP_BASE: &str = "https://wa.me/";

/// Build a `wa.me` link that opens a chat with `text` prefilled.
///
/// Non-digit characters in `phone` are dropped; without a phone number the
/// link lets the user pick the recipient.
pub fn whatsapp_link(text: &str, phone: Option<&str>) -> Result<Url, url::ParseError> {
    let digits: String = phone
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    // form encoding writes spaces as '+'; a literal '+' is already %2B
    let encoded = form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20");

    Url::parse(&format!("{WHATSAPP_BASE}{digits}?text={encoded}"))
}
