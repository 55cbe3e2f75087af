//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Turns an Instagram handle (`@tulocal` or `tulocal`) into a profile URL.
///
/// Usage in templates: `{{ instagram|instagram_url }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn instagram_url(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(profile_url(&value.to_string()))
}

fn profile_url(handle: &str) -> String {
    let handle = handle.trim().trim_start_matches('@');
    format!("https://www.instagram.com/{handle}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_url_strips_at_sign() {
        assert_eq!(profile_url("@donarosa"), "https://www.instagram.com/donarosa/");
        assert_eq!(profile_url(" panaderia.sur "), "https://www.instagram.com/panaderia.sur/");
    }
}
