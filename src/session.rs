use log::debug;
use reqwest::cookie::Jar;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const UPLOAD_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Failure of the two-GET handshake, tagged with the stage that broke.
/// A session-stage failure means the token stage was never attempted.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("session bootstrap failed: {0}")]
    Session(anyhow::Error),
    #[error("token fetch failed: {0}")]
    Token(anyhow::Error),
}

impl NegotiationError {
    pub fn stage(&self) -> &'static str {
        match self {
            NegotiationError::Session(_) => "session",
            NegotiationError::Token(_) => "token",
        }
    }
}

/// Cookie/token state authorizing exactly one submission attempt.
/// Never reused across attempts or shared between batches.
#[derive(Debug)]
pub struct Session {
    pub client: Client,
    pub form_token: String,
}

/// Performs the handshake: GET the task page for session cookies, force
/// the client identifier cookie, then GET a fresh form token under that
/// session. No retries here; the retry controller owns reattempts.
pub struct SessionNegotiator {
    task_url: Url,
    token_url: Url,
    client_token: String,
}

impl SessionNegotiator {
    pub fn new(task_url: &str, token_url: &str, client_token: &str) -> anyhow::Result<Self> {
        Ok(Self {
            task_url: Url::parse(task_url)?,
            token_url: Url::parse(token_url)?,
            client_token: client_token.to_string(),
        })
    }

    /// Starts from an empty cookie jar every time.
    pub async fn negotiate(&self) -> Result<Session, NegotiationError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(UPLOAD_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NegotiationError::Session(e.into()))?;

        client
            .get(self.task_url.clone())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| NegotiationError::Session(e.into()))?;

        // The server does not reliably set this cookie itself, so force
        // it, overriding any value from the GET above.
        jar.add_cookie_str(
            &format!("x-user_id={}; Path=/", self.client_token),
            &self.task_url,
        );

        let resp = client
            .get(self.token_url.clone())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| NegotiationError::Token(e.into()))?;
        let form_token = resp
            .text()
            .await
            .map_err(|e| NegotiationError::Token(e.into()))?
            .trim()
            .to_string();
        debug!("session negotiated, form token {:?}", form_token);

        Ok(Session { client, form_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn negotiator(server: &MockServer) -> SessionNegotiator {
        SessionNegotiator::new(
            &format!("{}/task", server.uri()),
            &format!("{}/api/get_token", server.uri()),
            "t_0000test",
        )
        .unwrap()
    }

    async fn mount_task(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/task"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    async fn mount_token(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/api/get_token"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn negotiates_and_carries_the_forced_cookie() {
        let server = MockServer::start().await;
        mount_task(
            &server,
            ResponseTemplate::new(200).insert_header("Set-Cookie", "sid=abc; Path=/"),
        )
        .await;
        mount_token(
            &server,
            ResponseTemplate::new(200).set_body_string("form-token-1\n"),
        )
        .await;

        let session = negotiator(&server).negotiate().await.unwrap();
        assert_eq!(session.form_token, "form-token-1");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url.path(), "/task");
        assert_eq!(requests[1].url.path(), "/api/get_token");

        // Token request carries both the server cookie and the forced one.
        let cookies = requests[1]
            .headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(cookies.contains("x-user_id=t_0000test"), "cookies: {cookies}");
        assert!(cookies.contains("sid=abc"), "cookies: {cookies}");
    }

    #[tokio::test]
    async fn session_stage_failure_never_reaches_the_token_stage() {
        let server = MockServer::start().await;
        mount_task(&server, ResponseTemplate::new(500)).await;
        mount_token(
            &server,
            ResponseTemplate::new(200).set_body_string("form-token-1"),
        )
        .await;

        let err = negotiator(&server).negotiate().await.unwrap_err();
        assert_eq!(err.stage(), "session");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/task");
    }

    #[tokio::test]
    async fn token_stage_failure_is_tagged_as_token() {
        let server = MockServer::start().await;
        mount_task(&server, ResponseTemplate::new(200)).await;
        mount_token(&server, ResponseTemplate::new(403)).await;

        let err = negotiator(&server).negotiate().await.unwrap_err();
        assert_eq!(err.stage(), "token");
    }
}
