// API client module: a small blocking HTTP client that talks to the recipe
// service gateway. Reads go through a bounded-retry strategy; writes are
// issued once and never retried. Every call funnels through one shared
// response classification so the handlers all report failures the same way.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::domain::{DownloadTicket, Recipe, RowError, User};

/// Status codes treated as final outcomes by [`ApiClient::resilient_get`]:
/// the server answered, even if unfavorably. Anything else is transient and
/// retried. 480, 481 and 482 are service business-error codes and must not
/// trigger retries.
const RESOLVED_STATUSES: [u16; 6] = [200, 400, 480, 481, 482, 500];

/// Transport-level failure: the call never produced an HTTP response.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportFault(String);

impl TransportFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<reqwest::Error> for TransportFault {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// Minimal response descriptor: the status code plus a body that can be
/// parsed as JSON on demand.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Blocking HTTP seam. Production uses reqwest; tests substitute a
/// scripted fake.
pub trait Transport {
    fn get(&self, url: &str) -> Result<RawResponse, TransportFault>;
    fn post(&self, url: &str) -> Result<RawResponse, TransportFault>;
}

/// Sleep seam for the retry backoff, injected so tests can observe the
/// waits instead of serving them.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Production transport backed by a blocking reqwest client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportFault> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { client })
    }

    fn read(response: reqwest::blocking::Response) -> Result<RawResponse, TransportFault> {
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(RawResponse { status, body })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<RawResponse, TransportFault> {
        Self::read(self.client.get(url).send()?)
    }

    fn post(&self, url: &str) -> Result<RawResponse, TransportFault> {
        Self::read(self.client.post(url).send()?)
    }
}

/// Backoff sleeper used outside tests.
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Retry schedule for [`ApiClient::resilient_get`]: `attempts` calls in
/// total, sleeping `attempt_number * unit` between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            unit: Duration::from_secs(1),
        }
    }
}

/// Uniform per-call error shared by every command handler. The display
/// output is exactly what the console reports for each failure class.
#[derive(Debug, Error)]
pub enum CallError {
    /// HTTP 500: the body carries a service error message, shown verbatim.
    #[error("Failed with status code: 500\nurl: {url}\nError message: {message}")]
    Service { url: String, message: String },

    /// Any status outside the handler contract.
    #[error("Failed with status code: {status}\nurl: {url}")]
    Unexpected { status: u16, url: String },

    /// The call never completed.
    #[error("request failed: {fault}\nurl: {url}")]
    Transport { url: String, fault: TransportFault },

    /// The resilient fetcher gave up without producing a response.
    #[error("no response from web service\nurl: {url}")]
    Unavailable { url: String },

    /// The body did not match the shape the handler expects.
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl From<RowError> for CallError {
    fn from(err: RowError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for CallError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Outcome of an add-allergy call that reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllergyOutcome {
    Added,
    /// The service answered the not-found sentinel: the owning user does
    /// not exist.
    UnknownUser,
}

/// Outcome of a download-recipe call that reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Ready(DownloadTicket),
    UnknownRecipe,
}

/// Apply the shared response contract: 200 passes through, 500 surfaces
/// the service's message, anything else is reported with the request URL.
fn classify(response: RawResponse, url: &str) -> Result<RawResponse, CallError> {
    match response.status {
        200 => Ok(response),
        500 => {
            let message = response
                .json()
                .map(|body| match body {
                    Value::String(text) => text,
                    other => other.to_string(),
                })
                .unwrap_or_else(|_| response.body.clone());
            Err(CallError::Service {
                url: url.to_string(),
                message,
            })
        }
        status => Err(CallError::Unexpected {
            status,
            url: url.to_string(),
        }),
    }
}

/// The service answers a bare `0` in place of a body when a referenced
/// entity does not exist.
fn is_not_found_sentinel(body: &Value) -> bool {
    *body == Value::from(0)
}

/// Client for the recipe service. Holds the validated base URL and the
/// injected transport, sleeper and retry schedule.
pub struct ApiClient {
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    base_url: String,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a client for a validated base URL using the production
    /// transport and backoff.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportFault> {
        Ok(Self::with_parts(
            Box::new(ReqwestTransport::new()?),
            Box::new(ThreadSleeper),
            base_url,
            RetryPolicy::default(),
        ))
    }

    /// Assemble a client from explicit parts. Tests use this to substitute
    /// scripted transports and recording sleepers.
    pub fn with_parts(
        transport: Box<dyn Transport>,
        sleeper: Box<dyn Sleeper>,
        base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            base_url: base_url.into(),
            retry,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with the bounded-retry strategy used for idempotent reads.
    ///
    /// A status in [`RESOLVED_STATUSES`] resolves the call immediately; any
    /// other status sleeps `attempt * unit` and tries again, at most
    /// `retry.attempts` times in total, returning the last response on
    /// exhaustion. A transport fault aborts at once with `None`.
    pub fn resilient_get(&self, url: &str) -> Option<RawResponse> {
        let mut attempt = 1;
        loop {
            match self.transport.get(url) {
                Ok(response) => {
                    if RESOLVED_STATUSES.contains(&response.status)
                        || attempt >= self.retry.attempts
                    {
                        return Some(response);
                    }
                    self.sleeper.sleep(self.retry.unit * attempt);
                    attempt += 1;
                }
                Err(fault) => {
                    error!("web service call failed: {fault} (url: {url})");
                    return None;
                }
            }
        }
    }

    /// One direct POST, classified. Writes are not idempotent and are
    /// never retried.
    fn post_classified(&self, url: &str) -> Result<RawResponse, CallError> {
        let response = self.transport.post(url).map_err(|fault| {
            error!("web service call failed: {fault} (url: {url})");
            CallError::Transport {
                url: url.to_string(),
                fault,
            }
        })?;
        classify(response, url)
    }

    /// One read through the resilient fetcher, classified.
    fn get_classified(&self, url: &str) -> Result<RawResponse, CallError> {
        let response = self
            .resilient_get(url)
            .ok_or_else(|| CallError::Unavailable {
                url: url.to_string(),
            })?;
        classify(response, url)
    }

    /// POST `/adduser/{first}/{last}`.
    pub fn add_user(&self, first_name: &str, last_name: &str) -> Result<(), CallError> {
        let url = self.url(&format!("/adduser/{first_name}/{last_name}"));
        self.post_classified(&url).map(|_| ())
    }

    /// GET `/getallusers` through the resilient fetcher and map each row.
    pub fn all_users(&self) -> Result<Vec<User>, CallError> {
        let url = self.url("/getallusers");
        let response = self.get_classified(&url)?;
        let rows: Vec<Vec<Value>> = serde_json::from_str(&response.body)?;
        rows.iter()
            .map(|row| User::from_row(row).map_err(CallError::from))
            .collect()
    }

    /// POST `/addallergy/{userid}/{allergy}`. A sentinel body on a 200
    /// response means the owning user does not exist.
    pub fn add_allergy(&self, user_id: &str, allergy: &str) -> Result<AllergyOutcome, CallError> {
        let url = self.url(&format!("/addallergy/{user_id}/{allergy}"));
        let response = self.post_classified(&url)?;
        if is_not_found_sentinel(&response.json()?) {
            return Ok(AllergyOutcome::UnknownUser);
        }
        Ok(AllergyOutcome::Added)
    }

    /// POST `/getrecipe/{userid}/{category}` and return the raw recipe
    /// body. The service filters out the user's known allergies.
    pub fn find_recipe(&self, user_id: &str, category: &str) -> Result<Value, CallError> {
        let url = self.url(&format!("/getrecipe/{user_id}/{category}"));
        let response = self.post_classified(&url)?;
        Ok(response.json()?)
    }

    /// GET `/getallrecipes` through the resilient fetcher and map each row.
    pub fn all_recipes(&self) -> Result<Vec<Recipe>, CallError> {
        let url = self.url("/getallrecipes");
        let response = self.get_classified(&url)?;
        let rows: Vec<Vec<Value>> = serde_json::from_str(&response.body)?;
        rows.iter()
            .map(|row| Recipe::from_row(row).map_err(CallError::from))
            .collect()
    }

    /// GET `/getrecipecost/{recipeid}` through the resilient fetcher and
    /// return the raw cost body.
    pub fn recipe_cost(&self, mealdb_id: &str) -> Result<Value, CallError> {
        let url = self.url(&format!("/getrecipecost/{mealdb_id}"));
        let response = self.get_classified(&url)?;
        Ok(response.json()?)
    }

    /// POST `/downloadrecipe/{recipeid}`. The sentinel means the recipe id
    /// is unknown; otherwise the body is a download ticket.
    pub fn download_recipe(&self, mealdb_id: &str) -> Result<DownloadOutcome, CallError> {
        let url = self.url(&format!("/downloadrecipe/{mealdb_id}"));
        let response = self.post_classified(&url)?;
        let body = response.json()?;
        if is_not_found_sentinel(&body) {
            return Ok(DownloadOutcome::UnknownRecipe);
        }
        let ticket: DownloadTicket = serde_json::from_value(body)?;
        Ok(DownloadOutcome::Ready(ticket))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Scripted transport: serves one queued step per call and records
    /// every URL hit. Clones share state so tests keep a handle after the
    /// client takes ownership.
    #[derive(Clone, Default)]
    pub struct FakeTransport {
        state: Rc<RefCell<FakeState>>,
    }

    #[derive(Default)]
    struct FakeState {
        steps: VecDeque<Result<RawResponse, TransportFault>>,
        calls: Vec<String>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_response(&self, status: u16, body: &str) {
            self.state.borrow_mut().steps.push_back(Ok(RawResponse {
                status,
                body: body.to_string(),
            }));
        }

        pub fn push_fault(&self, message: &str) {
            self.state
                .borrow_mut()
                .steps
                .push_back(Err(TransportFault::new(message)));
        }

        pub fn calls(&self) -> Vec<String> {
            self.state.borrow().calls.clone()
        }

        fn step(&self, url: &str) -> Result<RawResponse, TransportFault> {
            let mut state = self.state.borrow_mut();
            state.calls.push(url.to_string());
            state
                .steps
                .pop_front()
                .expect("no scripted response left for this call")
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str) -> Result<RawResponse, TransportFault> {
            self.step(url)
        }

        fn post(&self, url: &str) -> Result<RawResponse, TransportFault> {
            self.step(url)
        }
    }

    /// Sleeper that records requested durations instead of waiting.
    #[derive(Clone, Default)]
    pub struct RecordingSleeper {
        slept: Rc<RefCell<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        pub fn slept(&self) -> Vec<Duration> {
            self.slept.borrow().clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
        }
    }

    pub const BASE: &str = "https://svc.example.com";

    pub fn client(transport: &FakeTransport, sleeper: &RecordingSleeper) -> ApiClient {
        ApiClient::with_parts(
            Box::new(transport.clone()),
            Box::new(sleeper.clone()),
            BASE,
            RetryPolicy::default(),
        )
    }
}
