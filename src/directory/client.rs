use crate::{
    directory::{
        models::{ClassRecord, Document, Role, StudentDocument},
        StudentDirectory,
    },
    error::{BoardError, BoardResult},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::{fmt, time::Duration};
use tracing::debug;

enum Endpoint<'a> {
    Students(Role),
    Class(&'a str),
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endpoint::Students(role) => {
                write!(f, "/students?role={}", role)
            }
            Endpoint::Class(id) => {
                write!(f, "/classes/{}", id)
            }
        }
    }
}

impl Endpoint<'_> {
    // Segments are percent-encoded, so an id never spills into the query or
    // another path segment.
    fn url(&self, base: &Url) -> BoardResult<Url> {
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| BoardError::Config(format!("{base} cannot be a base URL")))?;
            segments.pop_if_empty();
            match self {
                Endpoint::Students(_) => segments.push("students"),
                Endpoint::Class(id) => segments.extend(["classes", *id]),
            };
        }
        if let Endpoint::Students(role) = self {
            url.query_pairs_mut().append_pair("role", &role.to_string());
        }
        Ok(url)
    }
}

/// HTTP client of the document store.
pub struct DocumentStore {
    http_client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl DocumentStore {
    pub fn new(base_url: String, timeout: Duration, api_token: Option<String>) -> BoardResult<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(&base_url)
            .map_err(|e| BoardError::Config(format!("invalid store base URL '{base_url}'. {e}")))?;
        Ok(Self {
            http_client,
            base_url,
            api_token,
        })
    }

    // Ok(None) when the store answers 404.
    async fn get(&self, endpoint: &Endpoint<'_>) -> BoardResult<Option<String>> {
        let url = endpoint.url(&self.base_url)?;
        debug!("GET {url}");

        let mut request = self.http_client.get(url);

        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.text().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            // Listing every student requires a staff role on the store side.
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BoardError::Permission(format!(
                "{} on {}. The API token might lack the required role.",
                response.status(),
                endpoint
            ))),
            _ => Err(BoardError::Http(format!("{}", response.status()))),
        }
    }

    fn parse_students(body: &str) -> BoardResult<Vec<StudentDocument>> {
        let documents = serde_json::from_str::<Vec<Document<StudentDocument>>>(body)?;
        Ok(documents.into_iter().map(|d| d.into_student()).collect())
    }

    fn parse_class(body: &str) -> BoardResult<ClassRecord> {
        let document = serde_json::from_str::<Document<ClassRecord>>(body)?;
        Ok(document.into_class())
    }
}

#[async_trait]
impl StudentDirectory for DocumentStore {
    async fn list_students(&self, role: Role) -> BoardResult<Vec<StudentDocument>> {
        let endpoint = Endpoint::Students(role);
        match self.get(&endpoint).await? {
            Some(body) => DocumentStore::parse_students(&body),
            // The collection itself is missing: nothing to list.
            None => Ok(vec![]),
        }
    }

    async fn get_class(&self, class_id: &str) -> BoardResult<Option<ClassRecord>> {
        let endpoint = Endpoint::Class(class_id);
        self.get(&endpoint)
            .await?
            .map(|body| DocumentStore::parse_class(&body))
            .transpose()
    }
}
