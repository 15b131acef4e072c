//! Mexican phone number → transport address normalization.
//!
//! Deliberately permissive: nothing stringifiable is rejected here.
//! Malformed numbers fall through with the domain suffix appended and
//! the transport rejects them at send time (or the registration check
//! catches them first).

const COUNTRY_MOBILE_PREFIX: &str = "521";
const COUNTRY_CODE: &str = "52";
const DOMAIN_SUFFIX: &str = "@s.whatsapp.net";

/// Map a raw phone string to a canonical transport address.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 10 {
        // Local 10-digit number: prepend country + mobile prefix.
        format!("{COUNTRY_MOBILE_PREFIX}{digits}{DOMAIN_SUFFIX}")
    } else if digits.len() == 12 && digits.starts_with(COUNTRY_CODE) {
        // Country code without the mobile "1": re-prefix.
        format!(
            "{COUNTRY_MOBILE_PREFIX}{}{DOMAIN_SUFFIX}",
            &digits[COUNTRY_CODE.len()..]
        )
    } else if digits.len() == 13 && digits.starts_with(COUNTRY_MOBILE_PREFIX) {
        // Already canonical.
        format!("{digits}{DOMAIN_SUFFIX}")
    } else {
        // Permissive fallback: pass the digits through unvalidated.
        format!("{digits}{DOMAIN_SUFFIX}")
    }
}

/// The address body without the domain suffix, for display.
pub fn address_body(address: &str) -> &str {
    address.strip_suffix(DOMAIN_SUFFIX).unwrap_or(address)
}
