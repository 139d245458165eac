/// Base URL of the Ladder API. Override at build time with `LADDER_API_URL`.
pub const API_BASE_URL: &str = match option_env!("LADDER_API_URL") {
    Some(url) => url,
    None => "http://localhost:8000",
};

/// Rows requested per page on the transactions view.
pub const TRANSACTIONS_PAGE_SIZE: usize = 10;

pub const TOKEN_KEY: &str = "authToken";
pub const OTP_EMAIL_KEY: &str = "emailForOtp";

/// Dashboard insights cover this many trailing days.
pub const INSIGHT_WINDOW_DAYS: i64 = 30;
pub const INSIGHT_PROVIDER: &str = "gemini";

pub fn api_url(path: &str) -> String {
    format!("{}{}", API_BASE_URL.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_joins_path() {
        let url = api_url("/expenses");
        assert!(url.ends_with("/expenses"));
        assert!(!url.contains("//expenses"));
    }
}
