fn log_delta(delta: &IntakeDelta) {
    if !delta.is_quiet() {
        eprintln!(
            "[qrorderd] intake delta: listed={}, logged={}, duplicates={}, unmatched={}",
            delta.listed, delta.logged, delta.duplicates, delta.unmatched
        );
    }
    for failure in &delta.failures {
        eprintln!("[qrorderd] intake warning: {failure}");
    }
}

fn read_u64_env(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn read_bool_env(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => parse_bool(&value),
        Err(_) => default,
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// `GOOGLE_TOKEN` wins when set; otherwise the refresh grant runs with the
/// configured client id, secret, and refresh token.
async fn resolve_valid_token() -> anyhow::Result<String> {
    if let Ok(token) = std::env::var("GOOGLE_TOKEN") {
        return Ok(token);
    }
    let client = oauth_client_from_env()?.context(
        "GOOGLE_TOKEN is not set and GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET are not configured",
    )?;
    let refresh_token =
        std::env::var("GOOGLE_REFRESH_TOKEN").context("GOOGLE_REFRESH_TOKEN is not set")?;
    let mut provider = TokenProvider::new(TokenState::from_refresh_token(refresh_token), Some(client));
    provider
        .refresh_now()
        .await
        .context("failed to refresh access token")
}

fn oauth_client_from_env() -> anyhow::Result<Option<OAuthClient>> {
    match (
        std::env::var("GOOGLE_CLIENT_ID"),
        std::env::var("GOOGLE_CLIENT_SECRET"),
    ) {
        (Ok(client_id), Ok(client_secret)) => Ok(Some(
            OAuthClient::new(client_id, client_secret).context("invalid oauth config")?,
        )),
        _ => Ok(None),
    }
}
