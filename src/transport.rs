//! Module containing the `Provider` transport through which every JSON-RPC
//! request of a binding flows. It wraps other valid transports and uses
//! dynamic dispatch to call the underlying transport implementation, so that
//! bindings and contract instances are not generic over the transport.
//!
//! Each request is logged when it is sent and again if it fails.

use futures::future::BoxFuture;
use futures::FutureExt as _;
use jsonrpc_core::Call;
use serde_json::Value;
use std::any::Any;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use web3::error::Error as Web3Error;
use web3::{RequestId, Transport};

/// Type alias for the output future in for the `Provider`'s `Transport`
/// implementation.
type BoxedFuture = BoxFuture<'static, Result<Value, Web3Error>>;

/// Helper trait that wraps `Transport` trait so it can be used as a trait
/// object. This trait is implemented for all `Transport`'s.
trait TransportBoxed: Debug + Send + Sync + 'static {
    /// Wraps `Transport::prepare`
    fn prepare_boxed(&self, method: &str, params: Vec<Value>) -> (RequestId, Call);

    /// Wraps `Transport::send`
    fn send_boxed(&self, id: RequestId, request: Call) -> BoxedFuture;

    /// Returns reference to inner transport.
    fn inner(&self) -> &(dyn Any + Send + Sync);
}

impl<F, T> TransportBoxed for T
where
    F: Future<Output = Result<Value, Web3Error>> + Send + 'static,
    T: Transport<Out = F> + Debug + Send + Sync + 'static,
{
    #[inline(always)]
    fn prepare_boxed(&self, method: &str, params: Vec<Value>) -> (RequestId, Call) {
        self.prepare(method, params)
    }

    #[inline(always)]
    fn send_boxed(&self, id: RequestId, request: Call) -> BoxedFuture {
        self.send(id, request).boxed()
    }

    #[inline(always)]
    fn inner(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

/// Dynamic `Transport` implementation used by bindings. This type wraps any
/// `Transport` type and implements `Transport` itself.
#[derive(Clone, Debug)]
pub struct Provider {
    inner: Arc<dyn TransportBoxed>,
}

impl Provider {
    /// Wrap a `Transport` in a `Provider`.
    pub fn new<F, T>(inner: T) -> Self
    where
        F: Future<Output = Result<Value, Web3Error>> + Send + 'static,
        T: Transport<Out = F> + Send + Sync + 'static,
    {
        let inner_ref: &dyn Any = &inner;
        let inner_arc = match inner_ref.downcast_ref::<Provider>() {
            // NOTE: Avoid double wrapping when a provider is created from
            //   another provider.
            Some(provider) => provider.inner.clone(),
            None => Arc::new(inner),
        };

        Provider { inner: inner_arc }
    }

    /// Casts this provider into the underlying transport type.
    pub fn downcast<T: Any + Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner.inner().downcast_ref()
    }
}

fn method_name(request: &Call) -> &str {
    match request {
        Call::MethodCall(call) => &call.method,
        Call::Notification(notification) => &notification.method,
        Call::Invalid { .. } => "<invalid>",
    }
}

impl Transport for Provider {
    type Out = BoxedFuture;

    #[inline(always)]
    fn prepare(&self, method: &str, params: Vec<Value>) -> (RequestId, Call) {
        self.inner.prepare_boxed(method, params)
    }

    fn send(&self, id: RequestId, request: Call) -> Self::Out {
        let method = method_name(&request).to_owned();
        tracing::trace!(id, %method, "sending request");

        let response = self.inner.send_boxed(id, request);
        async move {
            let result = response.await;
            if let Err(err) = &result {
                tracing::debug!(id, %method, %err, "request failed");
            }
            result
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::prelude::*;

    #[test]
    fn provider_is_send_and_sync() {
        fn assert_send_and_sync<T: Send + Sync>() {}
        assert_send_and_sync::<Provider>();
    }

    #[test]
    fn provider_forwards_requests() {
        let mut transport = TestTransport::new();
        let provider = Provider::new(transport.clone());

        transport.add_response(json!("3"));
        let version = provider
            .execute("net_version", vec![])
            .immediate()
            .expect("request failed");

        assert_eq!(version, json!("3"));
        transport.assert_request("net_version", &[]);
        transport.assert_no_more_requests();
    }

    #[test]
    fn provider_reports_failures() {
        let transport = TestTransport::new();
        let provider = Provider::new(transport);

        let result = provider.execute("eth_blockNumber", vec![]).immediate();
        assert!(result.is_err());
    }

    #[test]
    fn provider_is_downcastable() {
        let transport = TestTransport::new();

        let provider = Provider::new(transport);
        let concrete: &TestTransport = provider.downcast().unwrap();
        concrete.prepare("test", vec![json!(28)]);

        // no double wrapping
        let provider = Provider::new(provider);
        let concrete: &TestTransport = provider.downcast().unwrap();
        concrete.prepare("test", vec![json!(28)]);
    }
}
