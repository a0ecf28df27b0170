//! reqwest client for the remote vocabulary service.

use std::time::Duration;

use async_trait::async_trait;
use axum_extra::extract::cookie::Cookie;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::wire::{
  ClozeRequest, ClozeResponse, EntriesResponse, ErrorBody, ExamplesResponse, FlashcardRequest,
  FlashcardResponse, LoginRequest, ProgressResponse, SaveRequest,
};
use super::{ApiError, ApiSession, Result, VocabularyApi};
use crate::domain::{
  ClozeQuestion, Completion, EntryId, ExampleSentence, FlashcardDirection, FlashcardQuestion,
  ProgressSummary, Provenance, VocabularyEntry,
};

pub struct HttpVocabularyApi {
  client: reqwest::Client,
  base_url: String,
  cookie_name: String,
}

impl HttpVocabularyApi {
  pub fn new(base_url: &str, cookie_name: &str, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      cookie_name: cookie_name.to_string(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  fn authed(&self, builder: RequestBuilder, session: &ApiSession) -> RequestBuilder {
    builder.header(COOKIE, format!("{}={}", self.cookie_name, session.token))
  }

  /// Find our session cookie among the `Set-Cookie` headers
  fn session_cookie(&self, response: &Response) -> Option<String> {
    response
      .headers()
      .get_all(SET_COOKIE)
      .iter()
      .filter_map(|value| value.to_str().ok())
      .filter_map(|raw| Cookie::parse(raw.to_string()).ok())
      .find(|cookie| cookie.name() == self.cookie_name)
      .map(|cookie| cookie.value().to_string())
  }
}

/// Turn error statuses into [`ApiError`], keeping the service's message
async fn check(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  if status == StatusCode::UNAUTHORIZED {
    return Err(ApiError::Unauthorized);
  }

  let message = match response.json::<ErrorBody>().await {
    Ok(body) if !body.error.trim().is_empty() => body.error,
    _ => format!("The vocabulary service failed ({}).", status),
  };
  Err(ApiError::Service(message))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
  response
    .json::<T>()
    .await
    .map_err(|e| ApiError::Malformed(e.to_string()))
}

async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
  let response = check(builder.send().await?).await?;
  decode(response).await
}

async fn send_unit(builder: RequestBuilder) -> Result<()> {
  check(builder.send().await?).await?;
  Ok(())
}

#[async_trait]
impl VocabularyApi for HttpVocabularyApi {
  async fn sign_in(&self, username: &str, password: &str) -> Result<ApiSession> {
    let response = self
      .client
      .post(self.url("/login"))
      .json(&LoginRequest { username, password })
      .send()
      .await?;

    // A 401 here means bad credentials, not a lapsed session
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
      let message = response
        .json::<ErrorBody>()
        .await
        .map(|b| b.error)
        .unwrap_or_else(|_| "Invalid credentials.".to_string());
      return Err(ApiError::SignInRejected(message));
    }
    let response = check(response).await?;

    let token = self.session_cookie(&response).ok_or_else(|| {
      ApiError::Malformed(format!("sign-in response has no '{}' cookie", self.cookie_name))
    })?;
    tracing::info!("Signed in to vocabulary service as {}", username);
    Ok(ApiSession {
      username: username.to_string(),
      token,
    })
  }

  async fn sign_out(&self, session: &ApiSession) -> Result<()> {
    send_unit(self.authed(self.client.post(self.url("/logout")), session)).await
  }

  async fn fetch_entries(&self, session: &ApiSession) -> Result<Vec<VocabularyEntry>> {
    let response: EntriesResponse = send(self.authed(self.client.get(self.url("/entries")), session)).await?;
    Ok(response.entries.into_iter().map(VocabularyEntry::from).collect())
  }

  async fn request_flashcard(
    &self,
    session: &ApiSession,
    entry_id: EntryId,
    direction: FlashcardDirection,
  ) -> Result<FlashcardQuestion> {
    let builder = self
      .client
      .post(self.url("/practise/ai"))
      .json(&FlashcardRequest { entry_id });
    let response: FlashcardResponse = send(self.authed(builder, session)).await?;
    Ok(response.into_question(entry_id, direction))
  }

  async fn request_cloze(&self, session: &ApiSession, entry_id: EntryId) -> Result<ClozeQuestion> {
    let builder = self
      .client
      .post(self.url("/practise/cloze"))
      .json(&ClozeRequest { entry_id });
    let response: ClozeResponse = send(self.authed(builder, session)).await?;
    Ok(response.into_question(entry_id))
  }

  async fn log_exercise_completion(&self, session: &ApiSession, completion: Completion) -> Result<()> {
    let builder = self.client.post(self.url("/progress/exercise")).json(&completion);
    send_unit(self.authed(builder, session)).await
  }

  async fn save_entry(
    &self,
    session: &ApiSession,
    text: &str,
    translation: &str,
    provenance: Provenance,
  ) -> Result<()> {
    let builder = self.client.post(self.url("/save")).json(&SaveRequest {
      english: text,
      danish: translation,
      is_external_input: provenance.is_external(),
    });
    send_unit(self.authed(builder, session)).await
  }

  async fn delete_entry(&self, session: &ApiSession, entry_id: EntryId) -> Result<()> {
    let builder = self.client.delete(self.url(&format!("/entries/{}", entry_id)));
    send_unit(self.authed(builder, session)).await
  }

  async fn generate_example(
    &self,
    session: &ApiSession,
    entry_id: EntryId,
    append: bool,
  ) -> Result<Vec<ExampleSentence>> {
    let mut builder = self.client.post(self.url(&format!("/entries/{}/example", entry_id)));
    if append {
      builder = builder.query(&[("append", "1")]);
    }
    let response: ExamplesResponse = send(self.authed(builder, session)).await?;
    Ok(response.into_examples())
  }

  async fn delete_example(
    &self,
    session: &ApiSession,
    entry_id: EntryId,
    index: usize,
  ) -> Result<Vec<ExampleSentence>> {
    let builder = self
      .client
      .delete(self.url(&format!("/entries/{}/examples/{}", entry_id, index)));
    let response: ExamplesResponse = send(self.authed(builder, session)).await?;
    Ok(response.into_examples())
  }

  async fn progress_daily(&self, session: &ApiSession, days: u32) -> Result<ProgressSummary> {
    let builder = self
      .client
      .get(self.url("/progress/daily"))
      .query(&[("days", days)]);
    let response: ProgressResponse = send(self.authed(builder, session)).await?;
    Ok(response.into())
  }
}
