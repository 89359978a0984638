use std::collections::HashSet;
use std::sync::Mutex;

use qrorder_core::{ApiErrorClass, DriveClient, DriveError, DriveFile, SheetsClient, SheetsError};
use thiserror::Error;

use super::decode;
use super::design;
use super::ledger;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("drive api error: {0}")]
    Drive(#[from] DriveError),
    #[error("sheets api error: {0}")]
    Sheets(#[from] SheetsError),
}

impl EngineError {
    pub fn classification(&self) -> Option<ApiErrorClass> {
        match self {
            EngineError::Drive(err) => err.classification(),
            EngineError::Sheets(err) => err.classification(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Drive(err) => err.is_retryable(),
            EngineError::Sheets(err) => err.is_retryable(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IntakeSettings {
    pub folder_id: String,
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub page_size: u32,
    pub decode_qr: bool,
}

/// Outcome of one poll pass. `failures` carries human-readable notes for
/// files that hit an API error or held undecodable bytes.
#[derive(Debug, Default)]
pub struct IntakeDelta {
    pub listed: usize,
    pub logged: usize,
    pub duplicates: usize,
    pub unmatched: usize,
    pub failures: Vec<String>,
}

impl IntakeDelta {
    pub fn is_quiet(&self) -> bool {
        self.logged == 0 && self.duplicates == 0 && self.unmatched == 0 && self.failures.is_empty()
    }
}

enum FileOutcome {
    Logged,
    Duplicate,
    Unmatched,
}

pub struct IntakeEngine {
    drive: DriveClient,
    sheets: SheetsClient,
    settings: IntakeSettings,
    // File ids handled this process lifetime. The ledger scan, not this
    // set, is the durable duplicate guard.
    processed: Mutex<HashSet<String>>,
}

impl IntakeEngine {
    pub fn new(drive: DriveClient, sheets: SheetsClient, settings: IntakeSettings) -> Self {
        Self {
            drive,
            sheets,
            settings,
            processed: Mutex::new(HashSet::new()),
        }
    }

    /// One pass of the intake loop: list the watched folder, ingest every
    /// file not yet handled, and report what happened.
    ///
    /// A listing failure fails the pass. A per-file failure leaves that
    /// file unprocessed so the next pass retries it.
    pub async fn poll_once(&self) -> Result<IntakeDelta, EngineError> {
        let files = self
            .drive
            .list_folder_all(&self.settings.folder_id, self.settings.page_size)
            .await?;

        let mut delta = IntakeDelta {
            listed: files.len(),
            ..IntakeDelta::default()
        };

        for file in files {
            if self.is_processed(&file.id) {
                continue;
            }
            match self.ingest_file(&file, &mut delta.failures).await {
                Ok(outcome) => {
                    self.mark_processed(&file.id);
                    match outcome {
                        FileOutcome::Logged => delta.logged += 1,
                        FileOutcome::Duplicate => delta.duplicates += 1,
                        FileOutcome::Unmatched => delta.unmatched += 1,
                    }
                }
                Err(err) => delta.failures.push(format!("{}: {err}", file.name)),
            }
        }

        Ok(delta)
    }

    async fn ingest_file(
        &self,
        file: &DriveFile,
        notes: &mut Vec<String>,
    ) -> Result<FileOutcome, EngineError> {
        let design = match design::extract_design_number(&file.name) {
            Some(design) => Some(design),
            None if self.settings.decode_qr => self.decode_from_storage(file, notes).await?,
            None => None,
        };

        let Some(design) = design else {
            self.delete_best_effort(file, notes).await;
            return Ok(FileOutcome::Unmatched);
        };

        if self.is_design_logged(&design).await? {
            self.delete_best_effort(file, notes).await;
            return Ok(FileOutcome::Duplicate);
        }

        self.append_order(&design).await?;
        self.delete_best_effort(file, notes).await;
        Ok(FileOutcome::Logged)
    }

    async fn decode_from_storage(
        &self,
        file: &DriveFile,
        notes: &mut Vec<String>,
    ) -> Result<Option<String>, EngineError> {
        let bytes = self.drive.download_file(&file.id).await?;
        match decode::decode_design(&bytes) {
            Ok(design) => Ok(design),
            Err(err) => {
                notes.push(format!("{}: {err}", file.name));
                Ok(None)
            }
        }
    }

    async fn is_design_logged(&self, design: &str) -> Result<bool, EngineError> {
        let range = self
            .sheets
            .get_values(&self.settings.spreadsheet_id, &self.settings.worksheet)
            .await?;
        Ok(ledger::is_design_logged(&range.values, design))
    }

    async fn append_order(&self, design: &str) -> Result<(), EngineError> {
        let row = ledger::order_row(design, &ledger::order_timestamp());
        self.sheets
            .append_row(&self.settings.spreadsheet_id, &self.settings.worksheet, &row)
            .await?;
        Ok(())
    }

    // Deletion is best-effort: a logged order stays logged even when the
    // source file lingers, and the ledger scan catches a re-encounter.
    async fn delete_best_effort(&self, file: &DriveFile, notes: &mut Vec<String>) {
        if let Err(err) = self.drive.delete_file(&file.id).await {
            notes.push(format!("could not delete {}: {err}", file.name));
        }
    }

    fn is_processed(&self, file_id: &str) -> bool {
        self.processed
            .lock()
            .map(|seen| seen.contains(file_id))
            .unwrap_or(false)
    }

    fn mark_processed(&self, file_id: &str) {
        if let Ok(mut seen) = self.processed.lock() {
            seen.insert(file_id.to_string());
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
