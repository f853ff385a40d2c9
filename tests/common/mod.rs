#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use batterytender::{Request, Response, StatusCode, Transport, Url};
use serde_json::Value;

pub const BASE: &str = "https://btconnectedpower.com";

/// Replays canned responses in order and records every request it is given.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Rc<RefCell<VecDeque<(StatusCode, Vec<u8>)>>>,
    sent: Rc<RefCell<Vec<Request>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push_raw(status, body.to_string().into_bytes())
    }

    pub fn push_status(&self, status: u16) -> &Self {
        self.push_raw(status, Vec::new())
    }

    pub fn push_raw(&self, status: u16, body: Vec<u8>) -> &Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.responses.borrow_mut().push_back((status, body));
        self
    }

    pub fn sent(&self) -> Vec<Request> {
        self.sent.borrow().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.borrow().len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &Request) -> batterytender::Result<Response> {
        self.sent.borrow_mut().push(request.clone());
        let (status, body) = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request: {} {}", request.method, request.url));
        Ok(Response {
            status,
            url: request.url.clone(),
            body,
        })
    }
}

pub fn base_url() -> Url {
    Url::parse(BASE).unwrap()
}

pub fn query(request: &Request, key: &str) -> Vec<String> {
    request
        .url
        .query_pairs()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .collect()
}
