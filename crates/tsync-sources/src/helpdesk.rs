//! Helpdesk REST source (service records API)

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};
use tsync_core::{CoreError, Ticket};

use crate::checkpoint::SyncCheckpoint;
use crate::handler::TicketSource;
use crate::{Result, SourceError};

const RECORD_FIELDS: &str = "id,title,description,insert_time,update_time,status,priority,parent_id";

pub struct HelpdeskClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    page_size: u32,
    checkpoint: SyncCheckpoint,
    /// Start time of the last complete fetch, stored on commit
    pending: Mutex<Option<i64>>,
}

impl HelpdeskClient {
    pub fn new(
        base_url: &str,
        api_token: &str,
        page_size: u32,
        checkpoint: SyncCheckpoint,
        timeout: Duration,
    ) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(SourceError::NotConfigured("helpdesk.base_url".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent("tsync/0.2 (helpdesk sync)")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            page_size: page_size.max(1),
            checkpoint,
            pending: Mutex::new(None),
        })
    }

    async fn fetch_page(&self, offset: u32) -> Result<Vec<Value>> {
        let url = format!("{}/api/v1/sr", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[
                ("fields", RECORD_FIELDS.to_string()),
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        match response.json::<Value>().await? {
            Value::Array(records) => Ok(records),
            other => Err(SourceError::Decode(format!(
                "expected a JSON array of service records, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Convert one service record (`{ id, info: [{ key, value }] }`) into a
    /// ticket. Captions win over raw values for display fields.
    pub fn parse_record(record: &Value) -> Result<Ticket> {
        let id = record
            .get("id")
            .and_then(scalar_text)
            .ok_or_else(|| CoreError::MissingField("id".to_string()))?;

        let mut ticket = Ticket::new(id, "");

        let entries = record
            .get("info")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for entry in entries {
            let Some(key) = entry.get("key").and_then(Value::as_str) else {
                continue;
            };
            let value = entry.get("value").unwrap_or(&Value::Null);
            let text = entry
                .get("valueCaption")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .or_else(|| scalar_text(value));

            match key {
                "title" => ticket.title = text.unwrap_or_default(),
                "description" => ticket.description = text,
                "priority" => ticket.priority = text,
                "parent_id" => ticket.parent_id = text.filter(|p| !p.trim().is_empty()),
                "insert_time" => ticket.insert_time = epoch_millis(value),
                "update_time" => ticket.update_time = epoch_millis(value),
                other => {
                    ticket.extra.insert(other.to_string(), value.clone());
                }
            }
        }

        Ok(ticket)
    }
}

#[async_trait]
impl TicketSource for HelpdeskClient {
    async fn fetch_tickets(&self) -> Result<Vec<Ticket>> {
        let last_sync = self.checkpoint.load()?;
        let started_at = now_millis();

        let mut tickets = Vec::new();
        let mut offset = 0u32;
        let mut complete = true;

        loop {
            let records = match self.fetch_page(offset).await {
                Ok(records) => records,
                Err(e) => {
                    error!(offset, error = %e, "failed to fetch service records; returning partial batch");
                    complete = false;
                    break;
                }
            };
            let page_len = records.len();

            for record in &records {
                match Self::parse_record(record) {
                    Ok(ticket) if ticket.insert_time > last_sync || ticket.update_time > last_sync => {
                        tickets.push(ticket)
                    }
                    Ok(ticket) => debug!(ticket_id = %ticket.id, "unchanged since last sync"),
                    Err(e) => warn!(offset, error = %e, "skipping malformed service record"),
                }
            }

            if page_len < self.page_size as usize {
                break;
            }
            offset += self.page_size;
        }

        // A partial fetch never becomes a checkpoint so missed pages are
        // picked up next run.
        if let Ok(mut pending) = self.pending.lock() {
            *pending = complete.then_some(started_at);
        }

        info!(count = tickets.len(), since = last_sync, "fetched helpdesk tickets");
        Ok(tickets)
    }

    async fn commit(&self) -> Result<()> {
        let pending = self.pending.lock().ok().and_then(|mut p| p.take());
        let Some(started_at) = pending else {
            debug!("no complete fetch to commit; checkpoint unchanged");
            return Ok(());
        };

        self.checkpoint.store(started_at)?;
        info!(
            path = %self.checkpoint.path().display(),
            last_sync_time = started_at,
            "sync checkpoint stored"
        );
        Ok(())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn epoch_millis(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
