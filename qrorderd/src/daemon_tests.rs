use super::*;

#[test]
fn reads_intervals_from_env_or_default() {
    assert_eq!(read_u64_env("NO_SUCH_ENV_FOR_TEST", 42), 42);
}

#[test]
fn qr_decoding_is_enabled_by_default() {
    assert!(read_bool_env("NO_SUCH_BOOL_ENV_FOR_TEST", true));
}

#[test]
fn parses_common_truthy_spellings() {
    assert!(parse_bool("1"));
    assert!(parse_bool("true"));
    assert!(parse_bool("Yes"));
    assert!(parse_bool(" on "));

    assert!(!parse_bool("0"));
    assert!(!parse_bool("false"));
    assert!(!parse_bool("off"));
    assert!(!parse_bool(""));
}

#[test]
fn missing_oauth_env_yields_no_client() {
    // Neither GOOGLE_CLIENT_ID nor GOOGLE_CLIENT_SECRET is set in the test
    // environment.
    if std::env::var("GOOGLE_CLIENT_ID").is_err() || std::env::var("GOOGLE_CLIENT_SECRET").is_err()
    {
        let client = oauth_client_from_env().expect("no error without env");
        assert!(client.is_none());
    }
}
