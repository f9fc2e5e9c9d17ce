//! Authenticated session against the Splunk management API

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{Password, Settings};
use crate::constants::CONNECT_TIMEOUT_SECS;
use crate::error::{AppError, AppResult};
use crate::models::row::Row;
use crate::services::kvstore::KvService;

const LOGIN_PATH: [&str; 3] = ["services", "auth", "login"];

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(rename = "sessionKey")]
    session_key: Option<String>,
}

#[derive(Deserialize)]
struct EntityList {
    #[serde(default)]
    entry: Vec<Entity>,
}

#[derive(Deserialize)]
struct Entity {
    name: String,
    #[serde(default)]
    content: serde_json::Map<String, Value>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    messages: Vec<ErrorMessage>,
}

#[derive(Deserialize)]
struct ErrorMessage {
    text: String,
}

/// Live session handle. Holds the session key obtained at login and the
/// credentials needed for the web-tier reload call.
pub struct Session {
    client: Client,
    base_url: Url,
    owner: String,
    app: String,
    session_key: String,
    reload_url: String,
    user: String,
    password: Password,
}

impl Session {
    /// Logs in and returns a session scoped to the configured owner and app.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails, the credentials are
    /// rejected, or the response carries no session key.
    pub async fn connect(settings: &Settings, password: Password) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()?;

        let base_url = Url::parse(&settings.management_url()).map_err(|e| {
            AppError::Config(format!("invalid server address {}: {e}", settings.server))
        })?;
        let login_url = url_for(&base_url, &LOGIN_PATH)?;
        let login_endpoint = endpoint_label(&login_url);
        let response = client
            .post(login_url)
            .form(&[
                ("username", settings.user.as_str()),
                ("password", password.expose()),
                ("output_mode", "json"),
            ])
            .send()
            .await?;

        let login: LoginResponse = check(response, &login_endpoint).await?.json().await?;
        let session_key = login
            .session_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::UnexpectedResponse {
                endpoint: login_endpoint.clone(),
                message: "missing sessionKey".to_owned(),
            })?;

        debug!("Logged in to {base_url} as {}", settings.user);

        Ok(Self {
            client,
            base_url,
            owner: settings.collection_owner.clone(),
            app: settings.app.clone(),
            session_key,
            reload_url: settings.reload_url(),
            user: settings.user.clone(),
            password,
        })
    }

    /// URL under `servicesNS/{owner}/{app}` for the given path segments.
    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let namespace = ["servicesNS", self.owner.as_str(), self.app.as_str()];
        let mut url = url_for(&self.base_url, &namespace)?;
        url.path_segments_mut()
            .map_err(|()| cannot_be_base(&self.base_url))?
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, format!("Splunk {}", self.session_key))
            .query(&[("output_mode", "json")])
    }

    async fn list_entities(&self, url: Url) -> AppResult<Vec<Entity>> {
        let endpoint = endpoint_label(&url);
        let response = self
            .request(Method::GET, url)
            .query(&[("count", "0")])
            .send()
            .await?;
        let list: EntityList = check(response, &endpoint).await?.json().await?;
        Ok(list.entry)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        form: Option<&[(&str, &str)]>,
    ) -> AppResult<()> {
        let endpoint = endpoint_label(&url);
        let mut request = self.request(method, url);
        if let Some(form) = form {
            request = request.form(form);
        }
        check(request.send().await?, &endpoint).await?;
        Ok(())
    }
}

impl KvService for Session {
    async fn list_collections(&self) -> AppResult<BTreeSet<String>> {
        let entities = self
            .list_entities(self.endpoint(&COLLECTIONS_CONFIG)?)
            .await?;
        Ok(entities.into_iter().map(|e| e.name).collect())
    }

    async fn create_collection(&self, name: &str) -> AppResult<()> {
        let url = self.endpoint(&COLLECTIONS_CONFIG)?;
        self.send(Method::POST, url, Some(&[("name", name)])).await
    }

    async fn delete_collection(&self, name: &str) -> AppResult<()> {
        let url = self.endpoint(&["storage", "collections", "config", name])?;
        self.send(Method::DELETE, url, None).await
    }

    async fn batch_save(&self, collection: &str, rows: &[Row]) -> AppResult<()> {
        let url = self.endpoint(&["storage", "collections", "data", collection, "batch_save"])?;
        let endpoint = endpoint_label(&url);
        let response = self.request(Method::POST, url).json(rows).send().await?;
        check(response, &endpoint).await?;
        Ok(())
    }

    async fn list_stanzas(&self, conf: &str) -> AppResult<BTreeSet<String>> {
        let conf = format!("conf-{conf}");
        let entities = self.list_entities(self.endpoint(&["configs", conf.as_str()])?).await?;
        Ok(entities.into_iter().map(|e| e.name).collect())
    }

    async fn create_stanza(&self, conf: &str, stanza: &str) -> AppResult<()> {
        let conf = format!("conf-{conf}");
        let url = self.endpoint(&["configs", conf.as_str()])?;
        self.send(Method::POST, url, Some(&[("name", stanza)])).await
    }

    async fn stanza_content(
        &self,
        conf: &str,
        stanza: &str,
    ) -> AppResult<BTreeMap<String, String>> {
        let conf = format!("conf-{conf}");
        let url = self.endpoint(&["configs", conf.as_str(), stanza])?;
        let endpoint = endpoint_label(&url);
        let entity = self
            .list_entities(url)
            .await?
            .into_iter()
            .find(|e| e.name == stanza)
            .ok_or_else(|| AppError::UnexpectedResponse {
                endpoint: endpoint.clone(),
                message: format!("stanza {stanza} not in response"),
            })?;

        Ok(entity
            .content
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect())
    }

    async fn submit_stanza(
        &self,
        conf: &str,
        stanza: &str,
        key: &str,
        value: &str,
    ) -> AppResult<()> {
        let conf = format!("conf-{conf}");
        let url = self.endpoint(&["configs", conf.as_str(), stanza])?;
        self.send(Method::POST, url, Some(&[(key, value)])).await
    }

    async fn reload_app(&self) -> AppResult<()> {
        let response = self
            .client
            .post(&self.reload_url)
            .basic_auth(&self.user, Some(self.password.expose()))
            .send()
            .await?;
        check(response, "debug/refresh").await?;
        Ok(())
    }
}

const COLLECTIONS_CONFIG: [&str; 3] = ["storage", "collections", "config"];

/// Appends `segments` to `base`, percent-encoding each one so names holding
/// `/`, `?` or `#` stay inside their own segment.
fn url_for(base: &Url, segments: &[&str]) -> AppResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| cannot_be_base(base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn cannot_be_base(base: &Url) -> AppError {
    AppError::Config(format!("server address {base} cannot carry a path"))
}

/// Encoded path without the leading slash, used in error reports.
fn endpoint_label(url: &Url) -> String {
    url.path().trim_start_matches('/').to_owned()
}

/// Turns a non-success status into `AppError::Api`, keeping the server's
/// message text when it sends one.
async fn check(response: Response, endpoint: &str) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.messages.into_iter().next())
        .map_or(body, |m| m.text);

    Err(AppError::Api {
        status: status.as_u16(),
        endpoint: endpoint.to_owned(),
        message,
    })
}
