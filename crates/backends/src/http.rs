//! Thin reqwest JSON bridges implementing the RPC traits.
//!
//! Each profile's backend runs as a local sidecar speaking JSON over HTTP.
//! The bulk profile wraps every response in a `{ret, msg, data}` envelope;
//! the other two answer with plain JSON bodies.

use std::path::Path;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, de::DeserializeOwned},
    serde_json::json,
};

use crate::{
    error::{Error, Result},
    rpc::{BriefEntry, BulkRpc, DirectRpc, IdPartition, MemberRecord, RoomRecord, SearchRpc},
};

/// Application status meaning success inside the bulk envelope.
const STATUS_OK: i64 = 200;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ret: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

/// Surface non-2xx responses as [`Error::Status`] with the body text.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::status(i64::from(status.as_u16()), body))
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

// ── Bulk profile ────────────────────────────────────────────────────────────

pub struct HttpBulkRpc {
    http: reqwest::Client,
    base_url: String,
    token: Secret<String>,
    app_id: String,
}

impl HttpBulkRpc {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: Secret<String>, app_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
            app_id: app_id.into(),
        }
    }

    async fn call<T>(&self, path: &str, mut body: serde_json::Value) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        if let Some(obj) = body.as_object_mut() {
            obj.insert("app_id".into(), json!(self.app_id));
        }
        let resp = self
            .http
            .post(join(&self.base_url, path))
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await?;
        let envelope: Envelope<T> = check(resp).await?.json().await?;
        if envelope.ret != STATUS_OK {
            return Err(Error::status(envelope.ret, envelope.msg));
        }
        Ok(envelope.data.unwrap_or_default())
    }

    async fn exec(&self, path: &str, body: serde_json::Value) -> Result<()> {
        self.call::<serde_json::Value>(path, body).await.map(|_| ())
    }
}

#[async_trait]
impl BulkRpc for HttpBulkRpc {
    async fn fetch_contact_ids(&self) -> Result<IdPartition> {
        self.call("contacts/list", json!({})).await
    }

    async fn brief_info(&self, ids: &[String]) -> Result<Vec<BriefEntry>> {
        self.call("contacts/brief", json!({ "ids": ids })).await
    }

    async fn room_members(&self, room_id: &str) -> Result<Vec<MemberRecord>> {
        self.call("room/members", json!({ "room_id": room_id })).await
    }

    async fn send_text(&self, target: &str, body: &str, mention_spec: &str) -> Result<()> {
        self.exec(
            "message/text",
            json!({ "target": target, "body": body, "mention": mention_spec }),
        )
        .await
    }

    async fn send_image(&self, target: &str, url: &str) -> Result<()> {
        self.exec("message/image", json!({ "target": target, "url": url }))
            .await
    }

    async fn send_video(&self, target: &str, url: &str) -> Result<()> {
        self.exec("message/video", json!({ "target": target, "url": url }))
            .await
    }

    async fn send_file(&self, target: &str, url: &str, file_name: &str) -> Result<()> {
        self.exec(
            "message/file",
            json!({ "target": target, "url": url, "file_name": file_name }),
        )
        .await
    }
}

// ── Search profile ──────────────────────────────────────────────────────────

pub struct HttpSearchRpc {
    http: reqwest::Client,
    base_url: String,
    token: Secret<String>,
}

impl HttpSearchRpc {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: Secret<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let resp = self
            .http
            .post(join(&self.base_url, path))
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await?;
        check(resp).await
    }

    async fn query<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        Ok(self.post(path, body).await?.json().await?)
    }
}

#[async_trait]
impl SearchRpc for HttpSearchRpc {
    async fn refresh_friends_index(&self) -> Result<()> {
        self.post("friends/refresh", json!({})).await.map(|_| ())
    }

    async fn refresh_rooms_index(&self) -> Result<()> {
        self.post("rooms/refresh", json!({})).await.map(|_| ())
    }

    async fn search_rooms_by_title(&self, title: &str) -> Result<Vec<RoomRecord>> {
        self.query("rooms/search", json!({ "title": title })).await
    }

    async fn search_friends_by_remark(&self, remark: &str) -> Result<Vec<BriefEntry>> {
        self.query("friends/search-remark", json!({ "remark": remark }))
            .await
    }

    async fn search_friends_by_nickname(&self, name: &str) -> Result<Vec<BriefEntry>> {
        self.query("friends/search-nickname", json!({ "name": name }))
            .await
    }

    async fn send_to_target(&self, body: &str, target: &str) -> Result<()> {
        self.post("message/text", json!({ "target": target, "body": body }))
            .await
            .map(|_| ())
    }

    async fn send_image(&self, path: &Path, target: &str) -> Result<()> {
        self.post(
            "message/image",
            json!({ "target": target, "path": path.display().to_string() }),
        )
        .await
        .map(|_| ())
    }

    async fn send_video(&self, path: &Path, target: &str) -> Result<()> {
        self.post(
            "message/video",
            json!({ "target": target, "path": path.display().to_string() }),
        )
        .await
        .map(|_| ())
    }

    async fn send_file(&self, path: &Path, target: &str) -> Result<()> {
        self.post(
            "message/file",
            json!({ "target": target, "path": path.display().to_string() }),
        )
        .await
        .map(|_| ())
    }
}

// ── Direct profile ──────────────────────────────────────────────────────────

pub struct HttpDirectRpc {
    http: reqwest::Client,
    base_url: String,
    token: Secret<String>,
}

impl HttpDirectRpc {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: Secret<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let resp = self
            .http
            .post(join(&self.base_url, path))
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await?;
        check(resp).await
    }

    async fn query<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        Ok(self.post(path, body).await?.json().await?)
    }
}

#[async_trait]
impl DirectRpc for HttpDirectRpc {
    async fn list_rooms(&self) -> Result<Vec<RoomRecord>> {
        self.query("rooms/list", json!({})).await
    }

    async fn list_contacts(&self) -> Result<Vec<BriefEntry>> {
        self.query("contacts/list", json!({})).await
    }

    async fn room_members(&self, room_id: &str) -> Result<Vec<MemberRecord>> {
        self.query("room/members", json!({ "room_id": room_id })).await
    }

    async fn send_text(&self, target: &str, body: &str) -> Result<()> {
        self.post("message/text", json!({ "target": target, "body": body }))
            .await
            .map(|_| ())
    }

    async fn send_room_mention(
        &self,
        target: &str,
        body: &str,
        member_ids: &[String],
    ) -> Result<()> {
        self.post(
            "message/mention",
            json!({ "target": target, "body": body, "member_ids": member_ids }),
        )
        .await
        .map(|_| ())
    }

    async fn send_image(&self, target: &str, path: &Path) -> Result<()> {
        self.post(
            "message/image",
            json!({ "target": target, "path": path.display().to_string() }),
        )
        .await
        .map(|_| ())
    }

    async fn send_video(&self, target: &str, path: &Path) -> Result<()> {
        self.post(
            "message/video",
            json!({ "target": target, "path": path.display().to_string() }),
        )
        .await
        .map(|_| ())
    }

    async fn send_file(&self, target: &str, path: &Path) -> Result<()> {
        self.post(
            "message/file",
            json!({ "target": target, "path": path.display().to_string() }),
        )
        .await
        .map(|_| ())
    }
}
