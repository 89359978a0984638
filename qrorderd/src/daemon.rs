use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use qrorder_core::{ApiErrorClass, DriveClient, OAuthClient, SheetsClient};

use crate::intake::backoff::PollBackoff;
use crate::intake::engine::{IntakeDelta, IntakeEngine, IntakeSettings};
use crate::token_provider::{TokenProvider, TokenState};

const DEFAULT_WORKSHEET: &str = "MESSAGE_MAP";
const DEFAULT_POLL_SECS: u64 = 2;
const DEFAULT_PAGE_SIZE: u64 = 100;
const BACKOFF_BASE_MS: u64 = 500;
const BACKOFF_CAP_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct DaemonConfig {
    pub folder_id: String,
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub poll_interval: Duration,
    pub page_size: u32,
    pub decode_qr: bool,
}

impl DaemonConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let folder_id =
            std::env::var("QRORDER_FOLDER_ID").context("QRORDER_FOLDER_ID is not set")?;
        let spreadsheet_id = std::env::var("QRORDER_SPREADSHEET_ID")
            .context("QRORDER_SPREADSHEET_ID is not set")?;
        let worksheet = std::env::var("QRORDER_WORKSHEET")
            .unwrap_or_else(|_| DEFAULT_WORKSHEET.to_string());
        let poll_interval =
            Duration::from_secs(read_u64_env("QRORDER_POLL_SECS", DEFAULT_POLL_SECS));
        let page_size =
            read_u64_env("QRORDER_PAGE_SIZE", DEFAULT_PAGE_SIZE).min(u64::from(u32::MAX)) as u32;
        let decode_qr = read_bool_env("QRORDER_DECODE_QR", true);

        Ok(Self {
            folder_id,
            spreadsheet_id,
            worksheet,
            poll_interval,
            page_size,
            decode_qr,
        })
    }
}

pub struct DaemonRuntime {
    config: DaemonConfig,
    engine: Arc<IntakeEngine>,
}

impl DaemonRuntime {
    pub async fn bootstrap(config: DaemonConfig) -> anyhow::Result<Self> {
        let token = resolve_valid_token().await?;
        let drive = DriveClient::new(token.clone()).context("failed to build storage client")?;
        let sheets = SheetsClient::new(token).context("failed to build ledger client")?;

        let about = drive
            .about()
            .await
            .context("failed to validate credentials against the storage api")?;
        if let Some(user) = about.user {
            if let Some(email) = user.email_address {
                eprintln!("[qrorderd] authenticated as {email}");
            }
        }

        let engine = Arc::new(IntakeEngine::new(
            drive,
            sheets,
            IntakeSettings {
                folder_id: config.folder_id.clone(),
                spreadsheet_id: config.spreadsheet_id.clone(),
                worksheet: config.worksheet.clone(),
                page_size: config.page_size,
                decode_qr: config.decode_qr,
            },
        ));

        Ok(Self { config, engine })
    }

    pub async fn poll_once(&self) -> anyhow::Result<IntakeDelta> {
        Ok(self.engine.poll_once().await?)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        eprintln!(
            "[qrorderd] started: folder={}, spreadsheet={}, worksheet={}, poll={}s, decode_qr={}",
            self.config.folder_id,
            self.config.spreadsheet_id,
            self.config.worksheet,
            self.config.poll_interval.as_secs(),
            if self.config.decode_qr {
                "enabled"
            } else {
                "disabled"
            }
        );

        let engine = Arc::clone(&self.engine);
        let poll_interval = self.config.poll_interval;
        let poll_handle = tokio::spawn(async move {
            let backoff = PollBackoff::new(
                Duration::from_millis(BACKOFF_BASE_MS),
                Duration::from_secs(BACKOFF_CAP_SECS),
            );
            let mut failed_polls = 0u32;
            loop {
                match engine.poll_once().await {
                    Ok(delta) => {
                        failed_polls = 0;
                        log_delta(&delta);
                        tokio::time::sleep(poll_interval).await;
                    }
                    Err(err) => {
                        eprintln!("[qrorderd] poll error: {err}");
                        if err.classification() == Some(ApiErrorClass::Auth) {
                            eprintln!(
                                "[qrorderd] credentials were rejected; the access token may have expired"
                            );
                        }
                        let delay = if err.is_retryable() {
                            poll_interval + backoff.delay(failed_polls)
                        } else {
                            poll_interval
                        };
                        failed_polls = failed_polls.saturating_add(1);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        });

        tokio::signal::ctrl_c()
            .await
            .context("failed waiting for shutdown signal")?;
        eprintln!("[qrorderd] shutting down");
        poll_handle.abort();

        Ok(())
    }
}

include!("daemon_helpers.rs");

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
