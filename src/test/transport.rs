//! Implementation of a transport for testing purposes. This is largely based on
//! the `rust-web3` `TestTransport` type with some modifications.

use jsonrpc_core::{Call, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use web3::error::Error;
use web3::futures::future::{self, Ready};
use web3::helpers;
use web3::{RequestId, Transport};

/// Type alias for request method and value pairs
type Requests = Vec<(String, Vec<Value>)>;

#[derive(Debug, Default)]
struct Inner {
    asserted: usize,
    requests: Requests,
    responses: VecDeque<Result<Value, Error>>,
}

/// Test transport
#[derive(Debug, Default, Clone)]
pub struct TestTransport {
    inner: Arc<Mutex<Inner>>,
}

impl Transport for TestTransport {
    type Out = Ready<Result<Value, Error>>;

    fn prepare(&self, method: &str, params: Vec<Value>) -> (RequestId, Call) {
        let request = helpers::build_request(1, method, params.clone());
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push((method.into(), params));
        (inner.requests.len(), request)
    }

    fn send(&self, id: RequestId, request: Call) -> Self::Out {
        let response = self.inner.lock().unwrap().responses.pop_front();
        match response {
            Some(response) => future::ready(response),
            None => {
                println!("Unexpected request (id: {:?}): {:?}", id, request);
                future::err(Error::Unreachable)
            }
        }
    }
}

impl TestTransport {
    /// Create a new test transport instance.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a response to an eventual request.
    pub fn add_response(&mut self, value: Value) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.push_back(Ok(value));
    }

    /// Make an eventual request fail with an RPC error.
    pub fn add_error(&mut self, message: &str) {
        let mut error = jsonrpc_core::Error::internal_error();
        error.message = message.to_owned();
        let mut inner = self.inner.lock().unwrap();
        inner.responses.push_back(Err(Error::Rpc(error)));
    }

    /// Assert that a request was made.
    pub fn assert_request(&mut self, method: &str, params: &[Value]) {
        let mut inner = self.inner.lock().unwrap();
        let idx = inner.asserted;
        inner.asserted += 1;

        let (m, p) = inner.requests.get(idx).expect("Expected result.").clone();
        assert_eq!(&m, method);
        assert_eq!(&p[..], params);
    }

    /// Assert that a request was made without checking its parameters.
    pub fn assert_method(&mut self, method: &str) {
        let mut inner = self.inner.lock().unwrap();
        let idx = inner.asserted;
        inner.asserted += 1;

        let (m, _) = inner.requests.get(idx).expect("Expected result.").clone();
        assert_eq!(&m, method);
    }

    /// Assert that there are no more pending requests.
    pub fn assert_no_more_requests(&self) {
        let inner = self.inner.lock().unwrap();
        assert_eq!(
            inner.asserted,
            inner.requests.len(),
            "Expected no more requests, got: {:?}",
            &inner.requests[inner.asserted..]
        );
    }

    /// Assert that no request was made at all.
    pub fn assert_untouched(&self) {
        let inner = self.inner.lock().unwrap();
        assert!(
            inner.requests.is_empty(),
            "Expected no requests, got: {:?}",
            inner.requests
        );
    }
}
