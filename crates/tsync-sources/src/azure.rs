//! Azure Boards work-item tracker (REST + WIQL)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};
use tsync_core::{HIERARCHY_PARENT, Relation, RemoteId, RemotePayload, RemoteWorkItem};

use crate::handler::WorkTracker;
use crate::{Result, SourceError};

const JSON_PATCH: &str = "application/json-patch+json";

#[derive(Debug, Clone)]
pub struct AzureBoardsSettings {
    pub organization: String,
    pub project: String,
    pub api_version: String,
    pub personal_access_token: String,
    pub external_id_field: String,
    pub work_item_type: String,
}

pub struct AzureBoardsClient {
    client: reqwest::Client,
    settings: AzureBoardsSettings,
    base_url: String,
}

impl AzureBoardsClient {
    pub fn new(settings: AzureBoardsSettings, timeout: Duration) -> Result<Self> {
        if settings.organization.is_empty() || settings.project.is_empty() {
            return Err(SourceError::NotConfigured(
                "tracker.organization and tracker.project".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent("tsync/0.2 (helpdesk sync)")
            .timeout(timeout)
            .build()?;
        let base_url = format!(
            "https://dev.azure.com/{}/{}/_apis/wit",
            settings.organization, settings.project
        );

        Ok(Self {
            client,
            settings,
            base_url,
        })
    }

    /// URL a hierarchy relation to `parent_id` points at
    pub fn parent_url(&self, parent_id: &str) -> String {
        format!("{}/workItems/{}", self.base_url, parent_id)
    }

    fn url(&self, path: &str, query: &str) -> String {
        let sep = if query.is_empty() { "" } else { "&" };
        format!(
            "{}/{}?{}{}api-version={}",
            self.base_url, path, query, sep, self.settings.api_version
        )
    }

    async fn send(&self, method: Method, url: String, body: Option<(&str, Value)>) -> Result<Value> {
        let mut request = self
            .client
            .request(method, &url)
            .basic_auth("", Some(&self.settings.personal_access_token));

        if let Some((content_type, body)) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(serde_json::to_vec(&body)?);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response.json::<Value>().await?)
    }

    async fn get_work_item(&self, remote_id: RemoteId, with_relations: bool) -> Result<Value> {
        let query = if with_relations { "$expand=relations" } else { "" };
        let url = self.url(&format!("workitems/{}", remote_id), query);
        self.send(Method::GET, url, None).await
    }

    fn patch_document(&self, payload: &RemotePayload) -> Value {
        build_patch_document(payload, &self.settings.external_id_field, |id| {
            self.parent_url(id)
        })
    }
}

#[async_trait]
impl WorkTracker for AzureBoardsClient {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<RemoteId>> {
        let query = wiql_query(
            &self.settings.work_item_type,
            &self.settings.external_id_field,
            external_id,
        );
        let body = self
            .send(
                Method::POST,
                self.url("wiql", ""),
                Some(("application/json", json!({ "query": query }))),
            )
            .await?;

        let found = body
            .get("workItems")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(|item| item.get("id"))
            .and_then(Value::as_u64)
            .map(RemoteId);
        debug!(external_id, remote_id = ?found, "work item lookup");
        Ok(found)
    }

    async fn get_remote_last_modified(&self, remote_id: RemoteId) -> Result<i64> {
        let body = self.get_work_item(remote_id, false).await?;
        Ok(parse_work_item(&body)?.last_modified)
    }

    async fn create_remote_item(&self, payload: &RemotePayload) -> Result<RemoteId> {
        let url = self.url(&format!("workitems/${}", self.settings.work_item_type), "");
        let body = self
            .send(Method::POST, url, Some((JSON_PATCH, self.patch_document(payload))))
            .await?;

        let remote_id = body
            .get("id")
            .and_then(Value::as_u64)
            .map(RemoteId)
            .ok_or_else(|| SourceError::Decode("create response has no work item id".to_string()))?;
        info!(remote_id = %remote_id, "created work item");
        Ok(remote_id)
    }

    async fn update_remote_item(&self, remote_id: RemoteId, payload: &RemotePayload) -> Result<()> {
        let url = self.url(&format!("workitems/{}", remote_id), "");
        self.send(Method::PATCH, url, Some((JSON_PATCH, self.patch_document(payload))))
            .await?;
        info!(remote_id = %remote_id, "updated work item");
        Ok(())
    }

    async fn has_existing_link(&self, remote_id: RemoteId, parent_id: &str) -> Result<bool> {
        let body = self.get_work_item(remote_id, true).await?;
        let item = parse_work_item(&body)?;
        let expected = expected_parent_url(&body, parent_id, &self.parent_url(""));

        Ok(item.has_link(HIERARCHY_PARENT, &expected))
    }
}

/// Lowercased URL a parent relation to `parent_id` must carry. Relation URLs
/// are rooted wherever the item itself lives (`_links.self.href`); without
/// that link `default_root` is used.
pub fn expected_parent_url(body: &Value, parent_id: &str, default_root: &str) -> String {
    let root = body
        .pointer("/_links/self/href")
        .and_then(Value::as_str)
        .and_then(|href| href.rsplit_once('/'))
        .map(|(root, _)| root)
        .unwrap_or_else(|| default_root.trim_end_matches('/'));

    format!("{}/{}", root, parent_id).to_ascii_lowercase()
}

/// WIQL selecting the work item carrying a helpdesk id
pub fn wiql_query(work_item_type: &str, external_id_field: &str, external_id: &str) -> String {
    format!(
        "SELECT [System.Id] FROM WorkItems WHERE [System.WorkItemType] = '{}' AND [{}] = '{}'",
        work_item_type.replace('\'', "''"),
        external_id_field,
        external_id.replace('\'', "''")
    )
}

/// JSON-Patch document for a create or update call
pub fn build_patch_document(
    payload: &RemotePayload,
    external_id_field: &str,
    parent_url: impl Fn(&str) -> String,
) -> Value {
    let mut ops = vec![json!({
        "op": "add",
        "path": "/fields/System.Title",
        "value": payload.title,
    })];

    if let Some(description) = &payload.description {
        ops.push(json!({
            "op": "add",
            "path": "/fields/System.Description",
            "value": description,
        }));
    }

    if let Some(external_id) = &payload.external_id {
        ops.push(json!({
            "op": "add",
            "path": format!("/fields/{}", external_id_field),
            "value": external_id,
        }));
    }

    ops.push(json!({
        "op": "add",
        "path": "/fields/Microsoft.VSTS.Common.Priority",
        "value": payload.priority,
    }));

    if let Some(parent) = &payload.parent {
        ops.push(json!({
            "op": "add",
            "path": "/relations/-",
            "value": {
                "rel": HIERARCHY_PARENT,
                "url": parent_url(&parent.parent_id),
                "attributes": { "comment": parent.comment },
            },
        }));
    }

    Value::Array(ops)
}

/// Work item id, `System.ChangedDate` and relations from a REST body.
/// Relation URLs are lowercased.
pub fn parse_work_item(body: &Value) -> Result<RemoteWorkItem> {
    let id = body
        .get("id")
        .and_then(Value::as_u64)
        .map(RemoteId)
        .ok_or_else(|| SourceError::Decode("work item has no id".to_string()))?;

    let changed = body
        .pointer("/fields/System.ChangedDate")
        .and_then(Value::as_str)
        .ok_or_else(|| SourceError::Decode(format!("work item {} has no System.ChangedDate", id)))?;
    let last_modified = OffsetDateTime::parse(changed, &Rfc3339)
        .map_err(|e| SourceError::Decode(format!("bad System.ChangedDate '{}': {}", changed, e)))?;

    let relations = body
        .get("relations")
        .and_then(Value::as_array)
        .map(|rels| {
            rels.iter()
                .filter_map(|r| {
                    Some(Relation {
                        rel: r.get("rel")?.as_str()?.to_string(),
                        url: r.get("url")?.as_str()?.to_ascii_lowercase(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(RemoteWorkItem {
        id,
        last_modified: (last_modified.unix_timestamp_nanos() / 1_000_000) as i64,
        relations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsync_core::ParentLink;

    fn payload(external_id: Option<&str>, parent: Option<&str>) -> RemotePayload {
        RemotePayload {
            title: "Login failure".to_string(),
            description: Some("User [REDACTED] cannot log in".to_string()),
            priority: 1,
            external_id: external_id.map(str::to_string),
            parent: parent.map(|p| ParentLink {
                parent_id: p.to_string(),
                comment: "Linked to parent work item via helpdesk integration".to_string(),
            }),
        }
    }

    fn parent_url(id: &str) -> String {
        format!("https://dev.azure.com/acme/support/_apis/wit/workItems/{}", id)
    }

    #[test]
    fn test_wiql_escapes_quotes() {
        let query = wiql_query("Bug", "Custom.SysAidID", "42' OR '1'='1");
        assert_eq!(
            query,
            "SELECT [System.Id] FROM WorkItems WHERE [System.WorkItemType] = 'Bug' \
             AND [Custom.SysAidID] = '42'' OR ''1''=''1'"
        );
    }

    #[test]
    fn test_create_document_with_parent() {
        let doc = build_patch_document(&payload(Some("42"), Some("7")), "Custom.SysAidID", parent_url);
        let ops = doc.as_array().unwrap();

        let paths: Vec<&str> = ops.iter().map(|op| op["path"].as_str().unwrap()).collect();
        assert_eq!(
            paths,
            vec![
                "/fields/System.Title",
                "/fields/System.Description",
                "/fields/Custom.SysAidID",
                "/fields/Microsoft.VSTS.Common.Priority",
                "/relations/-",
            ]
        );
        assert_eq!(ops[2]["value"], "42");
        assert_eq!(ops[3]["value"], 1);
        assert_eq!(ops[4]["value"]["rel"], HIERARCHY_PARENT);
        assert_eq!(ops[4]["value"]["url"], parent_url("7"));
    }

    #[test]
    fn test_update_document_omits_external_id() {
        let doc = build_patch_document(&payload(None, None), "Custom.SysAidID", parent_url);
        let ops = doc.as_array().unwrap();

        assert_eq!(ops.len(), 3);
        assert!(ops.iter().all(|op| op["path"] != "/fields/Custom.SysAidID"));
        assert!(ops.iter().all(|op| op["path"] != "/relations/-"));
    }

    #[test]
    fn test_parse_work_item() {
        let body = json!({
            "id": 101,
            "fields": { "System.ChangedDate": "2024-01-15T10:20:30.5Z" },
            "relations": [
                { "rel": HIERARCHY_PARENT, "url": "https://dev.azure.com/acme/_apis/wit/workItems/7" },
                { "rel": "System.LinkTypes.Related" }
            ]
        });

        let item = parse_work_item(&body).unwrap();

        assert_eq!(item.id, RemoteId(101));
        assert_eq!(item.last_modified, 1_705_314_030_500);
        assert_eq!(item.relations.len(), 1);
        assert!(item.has_link(HIERARCHY_PARENT, "https://dev.azure.com/acme/_apis/wit/workitems/7"));
    }

    #[test]
    fn test_expected_parent_url_follows_self_link() {
        let body = json!({
            "id": 101,
            "fields": { "System.ChangedDate": "2024-01-15T10:20:30Z" },
            "relations": [
                {
                    "rel": HIERARCHY_PARENT,
                    "url": "https://dev.azure.com/Acme/5f0c-guid/_apis/wit/workItems/7"
                }
            ],
            "_links": {
                "self": { "href": "https://dev.azure.com/Acme/5f0c-guid/_apis/wit/workItems/101" }
            }
        });

        let expected = expected_parent_url(&body, "7", &parent_url(""));
        assert_eq!(expected, "https://dev.azure.com/acme/5f0c-guid/_apis/wit/workitems/7");

        let item = parse_work_item(&body).unwrap();
        assert!(item.has_link(HIERARCHY_PARENT, &expected));
        assert!(!item.has_link(HIERARCHY_PARENT, &expected_parent_url(&body, "8", "")));
    }

    #[test]
    fn test_expected_parent_url_without_self_link() {
        let body = json!({ "id": 101 });
        assert_eq!(
            expected_parent_url(&body, "7", &parent_url("")),
            "https://dev.azure.com/acme/support/_apis/wit/workitems/7"
        );
    }

    #[test]
    fn test_parse_work_item_missing_changed_date() {
        let body = json!({ "id": 5, "fields": {} });
        assert!(matches!(parse_work_item(&body), Err(SourceError::Decode(_))));
    }

    #[test]
    fn test_unconfigured_tracker_rejected() {
        let settings = AzureBoardsSettings {
            organization: String::new(),
            project: "support".to_string(),
            api_version: "7.1".to_string(),
            personal_access_token: String::new(),
            external_id_field: "Custom.SysAidID".to_string(),
            work_item_type: "Bug".to_string(),
        };
        assert!(matches!(
            AzureBoardsClient::new(settings, Duration::from_secs(5)),
            Err(SourceError::NotConfigured(_))
        ));
    }
}
