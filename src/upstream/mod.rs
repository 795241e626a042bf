pub mod dto;
pub mod resource;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PortalConfig;
use crate::error::AppError;
use crate::models::{
    AttendanceRecord, Credentials, GroupSchedule, GroupSummary, TokenPair, TrainerSchedule,
    TrainerSummary, User,
};

pub use dto::{AttendanceQuery, ScheduleQuery, Upload};
pub use resource::Resource;

/// Everything the portal asks of the training backend.
///
/// Every call except `obtain_token` and `logout` carries the caller's access
/// token; the portal never holds credentials of its own.
#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn obtain_token(&self, credentials: &Credentials) -> Result<TokenPair, AppError>;
    async fn current_user(&self, token: &str) -> Result<User, AppError>;
    async fn logout(&self, refresh: &str) -> Result<(), AppError>;

    async fn list(
        &self,
        token: &str,
        resource: Resource,
        query: &[(String, String)],
    ) -> Result<Vec<Value>, AppError>;
    async fn retrieve(&self, token: &str, resource: Resource, id: i64) -> Result<Value, AppError>;
    async fn create(&self, token: &str, resource: Resource, body: &Value) -> Result<Value, AppError>;
    async fn update(
        &self,
        token: &str,
        resource: Resource,
        id: i64,
        body: &Value,
    ) -> Result<Value, AppError>;
    async fn replace(
        &self,
        token: &str,
        resource: Resource,
        id: i64,
        body: &Value,
    ) -> Result<Value, AppError>;
    async fn delete(&self, token: &str, resource: Resource, id: i64) -> Result<(), AppError>;
    async fn bulk_import_students(&self, token: &str, upload: Upload) -> Result<Value, AppError>;

    async fn trainer_schedule(
        &self,
        token: &str,
        trainer_id: i64,
        query: &ScheduleQuery,
    ) -> Result<TrainerSchedule, AppError>;
    async fn group_schedule(
        &self,
        token: &str,
        group_id: i64,
        query: &ScheduleQuery,
    ) -> Result<GroupSchedule, AppError>;
    async fn trainers_by_center(
        &self,
        token: &str,
        center_id: i64,
        academic_year: Option<&str>,
    ) -> Result<Vec<TrainerSummary>, AppError>;
    async fn groups_by_center(
        &self,
        token: &str,
        center_id: i64,
        academic_year: Option<&str>,
    ) -> Result<Vec<GroupSummary>, AppError>;

    async fn attendance_records(
        &self,
        token: &str,
        query: &AttendanceQuery,
    ) -> Result<Vec<AttendanceRecord>, AppError>;
    async fn attendance_by_session(
        &self,
        token: &str,
        session_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError>;
}

/// Lists a collection and decodes each item into `T`.
pub async fn fetch_list<T: DeserializeOwned>(
    api: &dyn PortalApi,
    token: &str,
    resource: Resource,
    query: &[(String, String)],
) -> Result<Vec<T>, AppError> {
    let items = api.list(token, resource, query).await?;
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(AppError::from))
        .collect()
}

/// Retrieves one item and decodes it into `T`.
pub async fn fetch_one<T: DeserializeOwned>(
    api: &dyn PortalApi,
    token: &str,
    resource: Resource,
    id: i64,
) -> Result<T, AppError> {
    let item = api.retrieve(token, resource, id).await?;
    serde_json::from_value(item).map_err(AppError::from)
}

pub struct HttpPortalApi {
    client: Client,
    base_url: Url,
}

impl HttpPortalApi {
    pub fn new(config: &PortalConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;

        // Url::join drops the last segment unless the base ends with '/'.
        let mut base = config.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| AppError::Config(format!("Invalid API base URL {}: {}", base, e)))?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, AppError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| AppError::BadRequest(format!("Invalid path {}: {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("backend {} returned {}", url.path(), status);
            return Err(AppError::upstream(status.as_u16(), &body));
        }

        debug!("backend {} returned {} ({} bytes)", url.path(), status, body.len());
        serde_json::from_str(&body).map_err(AppError::from)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), AppError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let path = response.url().path().to_string();
            let body = response.text().await.unwrap_or_default();
            warn!("backend {} returned {}", path, status);
            return Err(AppError::upstream(status.as_u16(), &body));
        }
        Ok(())
    }

    async fn get_list(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>, AppError> {
        let url = self.url(path, query)?;
        let envelope: dto::ListEnvelope = self
            .send_json(self.client.get(url).bearer_auth(token))
            .await?;
        if let dto::ListEnvelope::Page {
            results,
            count,
            next: Some(next),
        } = &envelope
        {
            debug!(
                "{} returned {} of {:?} items, more at {}",
                path,
                results.len(),
                count,
                next
            );
        }
        Ok(envelope.into_items())
    }

    async fn get_typed_list<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        self.get_list(token, path, query)
            .await?
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(AppError::from))
            .collect()
    }
}

fn center_query(center_id: i64, academic_year: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![("center_id", center_id.to_string())];
    if let Some(year) = academic_year {
        query.push(("academic_year", year.to_string()));
    }
    query
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn obtain_token(&self, credentials: &Credentials) -> Result<TokenPair, AppError> {
        let url = self.url("token/", &[])?;
        self.send_json(self.client.post(url).json(credentials)).await
    }

    async fn current_user(&self, token: &str) -> Result<User, AppError> {
        let url = self.url("accounts/users/me/", &[])?;
        self.send_json(self.client.get(url).bearer_auth(token)).await
    }

    async fn logout(&self, refresh: &str) -> Result<(), AppError> {
        let url = self.url("accounts/users/logout/", &[])?;
        self.send_empty(self.client.post(url).json(&dto::LogoutRequest { refresh }))
            .await
    }

    async fn list(
        &self,
        token: &str,
        resource: Resource,
        query: &[(String, String)],
    ) -> Result<Vec<Value>, AppError> {
        let query: Vec<(&str, String)> = query
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        self.get_list(token, resource.path(), &query).await
    }

    async fn retrieve(&self, token: &str, resource: Resource, id: i64) -> Result<Value, AppError> {
        let url = self.url(&resource.item_path(id), &[])?;
        self.send_json(self.client.get(url).bearer_auth(token)).await
    }

    async fn create(&self, token: &str, resource: Resource, body: &Value) -> Result<Value, AppError> {
        let url = self.url(resource.path(), &[])?;
        self.send_json(self.client.post(url).bearer_auth(token).json(body))
            .await
    }

    async fn update(
        &self,
        token: &str,
        resource: Resource,
        id: i64,
        body: &Value,
    ) -> Result<Value, AppError> {
        let url = self.url(&resource.item_path(id), &[])?;
        self.send_json(self.client.patch(url).bearer_auth(token).json(body))
            .await
    }

    async fn replace(
        &self,
        token: &str,
        resource: Resource,
        id: i64,
        body: &Value,
    ) -> Result<Value, AppError> {
        let url = self.url(&resource.item_path(id), &[])?;
        self.send_json(self.client.put(url).bearer_auth(token).json(body))
            .await
    }

    async fn delete(&self, token: &str, resource: Resource, id: i64) -> Result<(), AppError> {
        let url = self.url(&resource.item_path(id), &[])?;
        self.send_empty(self.client.delete(url).bearer_auth(token))
            .await
    }

    async fn bulk_import_students(&self, token: &str, upload: Upload) -> Result<Value, AppError> {
        let url = self.url("students/students/bulk_import/", &[])?;
        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = upload
            .fields
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
            .part("file", part);

        self.send_json(self.client.post(url).bearer_auth(token).multipart(form))
            .await
    }

    async fn trainer_schedule(
        &self,
        token: &str,
        trainer_id: i64,
        query: &ScheduleQuery,
    ) -> Result<TrainerSchedule, AppError> {
        let mut pairs = vec![("trainer_id", trainer_id.to_string())];
        pairs.extend(query.pairs());
        let url = self.url("schedule/api/sessions/trainer_schedule/", &pairs)?;
        self.send_json(self.client.get(url).bearer_auth(token)).await
    }

    async fn group_schedule(
        &self,
        token: &str,
        group_id: i64,
        query: &ScheduleQuery,
    ) -> Result<GroupSchedule, AppError> {
        let mut pairs = vec![("group_id", group_id.to_string())];
        pairs.extend(query.pairs());
        let url = self.url("schedule/api/sessions/group_schedule/", &pairs)?;
        self.send_json(self.client.get(url).bearer_auth(token)).await
    }

    async fn trainers_by_center(
        &self,
        token: &str,
        center_id: i64,
        academic_year: Option<&str>,
    ) -> Result<Vec<TrainerSummary>, AppError> {
        self.get_typed_list(
            token,
            "schedule/api/sessions/trainers_by_center/",
            &center_query(center_id, academic_year),
        )
        .await
    }

    async fn groups_by_center(
        &self,
        token: &str,
        center_id: i64,
        academic_year: Option<&str>,
    ) -> Result<Vec<GroupSummary>, AppError> {
        self.get_typed_list(
            token,
            "schedule/api/sessions/groups_by_center/",
            &center_query(center_id, academic_year),
        )
        .await
    }

    async fn attendance_records(
        &self,
        token: &str,
        query: &AttendanceQuery,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        self.get_typed_list(token, Resource::AttendanceRecords.path(), &query.pairs())
            .await
    }

    async fn attendance_by_session(
        &self,
        token: &str,
        session_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let query = [
            ("session_template_id", session_id.to_string()),
            ("date", date.to_string()),
            ("page_size", "1000".to_string()),
        ];
        self.get_typed_list(token, "attendance/api/records/by_session/", &query)
            .await
    }
}
