use std::cell::RefCell;
use std::fmt;

use reqwest::{Method, StatusCode, Url};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::request::{Request, Response, Transport};

pub const LOGIN_PATH: &str = "/api/users/login";

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Receives the body of every successful login, before the failed request is
/// retried.
pub trait LoginHandler {
    fn on_login(&mut self, body: &Map<String, Value>) -> Result<()>;
}

impl<F> LoginHandler for F
where
    F: FnMut(&Map<String, Value>) -> Result<()>,
{
    fn on_login(&mut self, body: &Map<String, Value>) -> Result<()> {
        self(body)
    }
}

/// Token authentication over a [`Transport`].
///
/// Once a token is known it is added to every request. A 401 answer triggers
/// exactly one login with the stored credentials, after which the original
/// request is sent again with the fresh token.
pub struct Session<T> {
    transport: T,
    credentials: Credentials,
    login_url: Url,
    token: RefCell<Option<String>>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, credentials: Credentials, base_url: &Url) -> Result<Self> {
        let login_url = base_url
            .join(LOGIN_PATH)
            .map_err(|e| Error::InvalidUrl(format!("{base_url}{LOGIN_PATH}: {e}")))?;

        Ok(Self {
            transport,
            credentials,
            login_url,
            token: RefCell::new(None),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn send(&self, mut request: Request, handler: &mut dyn LoginHandler) -> Result<Response> {
        if let Some(token) = self.token.borrow().as_deref() {
            if !request.has_token() {
                request.set_token(token);
            }
        }

        let response = self.transport.send(&request)?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        self.reauthenticate(request, response, handler)
    }

    fn login_request(&self) -> Request {
        let mut url = self.login_url.clone();
        url.query_pairs_mut()
            .append_pair("email", &self.credentials.email)
            .append_pair("password", &self.credentials.password);
        Request::new(Method::POST, url)
    }

    fn reauthenticate(
        &self,
        mut original: Request,
        unauthorized: Response,
        handler: &mut dyn LoginHandler,
    ) -> Result<Response> {
        info!(path = original.url.path(), "request unauthorized, logging in");

        let login = self.transport.send(&self.login_request())?;

        if login.status == StatusCode::UNAUTHORIZED {
            warn!(email = %self.credentials.email, "login rejected");
            return Err(Error::Authorization { response: login });
        }

        if login.status != StatusCode::OK {
            warn!(status = login.status.as_u16(), "login failed, keeping original response");
            return Ok(unauthorized);
        }

        let body = login.json_object()?;
        let token = body.get("token").and_then(Value::as_str).map(str::to_owned);
        if token.is_none() {
            warn!("login succeeded without a token");
        }
        *self.token.borrow_mut() = token.clone();

        handler.on_login(&body)?;

        match token.as_deref() {
            Some(token) => original.set_token(token),
            None => original.clear_token(),
        }

        debug!(path = original.url.path(), "retrying request");
        self.transport.send(&original)
    }
}
