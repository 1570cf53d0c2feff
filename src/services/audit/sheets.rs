use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Url;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::ServiceAccountAuthenticator;

use super::{AuditEntry, AuditLogger};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Appends audit rows to a Google Sheets worksheet, signing in as a service
/// account. Tokens are cached and refreshed by the authenticator.
pub struct GoogleSheetsLogger {
    spreadsheet_id: String,
    sheet_name: String,
    auth: DefaultAuthenticator,
    client: reqwest::Client,
}

impl GoogleSheetsLogger {
    /// `service_account_json` is the key file content as downloaded from the
    /// Google Cloud console.
    pub async fn from_service_account_json(
        spreadsheet_id: String,
        sheet_name: String,
        service_account_json: &str,
    ) -> anyhow::Result<Self> {
        let key = yup_oauth2::parse_service_account_key(service_account_json)
            .context("invalid service account key")?;
        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("failed to build service account authenticator")?;

        Ok(Self {
            spreadsheet_id,
            sheet_name,
            auth,
            client: reqwest::Client::new(),
        })
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        let token = self
            .auth
            .token(&[SHEETS_SCOPE])
            .await
            .context("failed to obtain Google access token")?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Google returned an empty access token"))
    }
}

/// `{SHEETS_API}/{id}/values/{sheet}:append`, with the id and sheet name
/// encoded as single path segments.
fn append_url(spreadsheet_id: &str, sheet_name: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(SHEETS_API).context("invalid Sheets API base")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Sheets API base cannot carry a path"))?
        .push(spreadsheet_id)
        .push("values")
        .push(&format!("{sheet_name}:append"));
    Ok(url)
}

#[async_trait]
impl AuditLogger for GoogleSheetsLogger {
    async fn log_reservation(&self, entry: &AuditEntry) -> anyhow::Result<()> {
        let url = append_url(&self.spreadsheet_id, &self.sheet_name)?;
        let token = self.access_token().await?;

        self.client
            .post(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&serde_json::json!({ "values": [entry.to_row()] }))
            .send()
            .await
            .context("failed to append audit row")?
            .error_for_status()
            .context("Sheets API returned error")?;

        tracing::info!(slot = %entry.slot, user_id = %entry.user_id, "audit row appended");
        Ok(())
    }
}
