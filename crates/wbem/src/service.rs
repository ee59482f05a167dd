//! Host-facing service session
//!
//! A [`WbemService`] wraps one provider connection (a namespace). Each
//! asynchronous request gets its own [`AsyncResultSink`], registered until
//! its terminal status or its cancellation.

use std::sync::Arc;
use parking_lot::RwLock;
use crate::bridge::RuntimeBridge;
use crate::host::{result_channel, HandlerRef, ResultStream};
use crate::sink::{AsyncResultSink, SinkRegistry, WbemObjectSink};
use crate::types::{flags, HResult, Result, WbemError, QUERY_LANGUAGE_WQL};

/// Native service interface (the `IWbemServices` subset the bridge drives)
///
/// Async calls return as soon as the request is accepted; results arrive on
/// the sink from provider threads.
pub trait Provider: Send + Sync {
    fn exec_query_async(
        &self,
        language: &str,
        query: &str,
        flags: i32,
        sink: Arc<dyn WbemObjectSink>,
    ) -> std::result::Result<(), HResult>;

    fn create_class_enum_async(
        &self,
        superclass: Option<&str>,
        flags: i32,
        sink: Arc<dyn WbemObjectSink>,
    ) -> std::result::Result<(), HResult>;

    fn create_instance_enum_async(
        &self,
        class: &str,
        flags: i32,
        sink: Arc<dyn WbemObjectSink>,
    ) -> std::result::Result<(), HResult>;

    /// Cancel the request that was issued with this sink
    fn cancel_async_call(&self, sink: &Arc<dyn WbemObjectSink>) -> std::result::Result<(), HResult>;

    /// Connection to a child namespace
    fn open_namespace(&self, namespace: &str, flags: i32) -> std::result::Result<Arc<dyn Provider>, HResult>;
}

/// Session over one provider connection
pub struct WbemService {
    /// Namespace path
    namespace: String,
    /// Cleared by `close`
    provider: RwLock<Option<Arc<dyn Provider>>>,
    /// Shared bridge context
    bridge: Arc<RuntimeBridge>,
    /// In-flight requests of this session
    sinks: Arc<SinkRegistry>,
}

impl WbemService {
    pub fn new(namespace: impl Into<String>, provider: Arc<dyn Provider>, bridge: Arc<RuntimeBridge>) -> Self {
        Self {
            namespace: namespace.into(),
            provider: RwLock::new(Some(provider)),
            bridge,
            sinks: Arc::new(SinkRegistry::new()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn bridge(&self) -> &Arc<RuntimeBridge> {
        &self.bridge
    }

    pub fn is_connected(&self) -> bool {
        self.provider.read().is_some()
    }

    /// Requests still waiting for their terminal status
    pub fn pending_operations(&self) -> usize {
        self.sinks.len()
    }

    fn provider(&self) -> Result<Arc<dyn Provider>> {
        self.provider.read().clone().ok_or(WbemError::NotConnected)
    }

    /// Run a WQL query; results go to `handler`
    pub fn exec_query_async(&self, query: &str, handler: HandlerRef, request_flags: i32) -> Result<()> {
        if query.is_empty() {
            return Err(WbemError::InvalidArgument("empty query specified".to_string()));
        }
        let provider = self.provider()?;

        let request_flags = if self.bridge.config().direct_read {
            request_flags | flags::WBEM_FLAG_DIRECT_READ
        } else {
            request_flags
        };

        tracing::debug!("Async WQL: {}", query);
        self.issue(handler, "could not execute query", |sink| {
            provider.exec_query_async(QUERY_LANGUAGE_WQL, query, request_flags, sink)
        })
    }

    /// Run a WQL query, consuming the results as a stream
    pub fn exec_query_stream(&self, query: &str, request_flags: i32) -> Result<ResultStream> {
        let (handler, stream) = result_channel();
        self.exec_query_async(query, handler, request_flags)?;
        Ok(stream)
    }

    /// Enumerate classes, optionally below `superclass`
    pub fn enum_classes_async(&self, superclass: Option<&str>, handler: HandlerRef, request_flags: i32) -> Result<()> {
        let provider = self.provider()?;
        tracing::debug!("Async class enumeration: {}", superclass.unwrap_or("<root>"));
        self.issue(handler, "could not create class enumerator", |sink| {
            provider.create_class_enum_async(superclass, request_flags, sink)
        })
    }

    /// Enumerate the instances of `class`
    pub fn enum_instances_async(&self, class: &str, handler: HandlerRef, request_flags: i32) -> Result<()> {
        if class.is_empty() {
            return Err(WbemError::InvalidArgument("empty class name specified".to_string()));
        }
        let provider = self.provider()?;
        tracing::debug!("Async instance enumeration: {}", class);
        self.issue(handler, "could not create instance enumerator", |sink| {
            provider.create_instance_enum_async(class, request_flags, sink)
        })
    }

    fn issue<F>(&self, handler: HandlerRef, context: &str, call: F) -> Result<()>
    where
        F: FnOnce(Arc<dyn WbemObjectSink>) -> std::result::Result<(), HResult>,
    {
        let sink = AsyncResultSink::new(self.bridge.clone(), &self.sinks, handler);
        self.sinks.register(sink.clone());
        sink.activate();

        if let Err(hr) = call(sink.clone()) {
            self.sinks.remove(&sink);
            tracing::warn!(sink = %sink.id(), "{}: {}", context, hr.diagnostic());
            return Err(WbemError::native(context, hr));
        }
        Ok(())
    }

    /// Cancel the request that reports to `handler`
    ///
    /// The request stays registered when the provider refuses, so the
    /// caller can retry.
    pub fn cancel_async_call(&self, handler: &HandlerRef) -> Result<()> {
        let sink = self.sinks.find_by_handler(handler).ok_or(WbemError::SinkNotFound)?;
        let provider = self.provider()?;

        sink.mark_cancel_requested();
        tracing::debug!(sink = %sink.id(), "cancel async call");

        let native: Arc<dyn WbemObjectSink> = sink.clone();
        if let Err(hr) = provider.cancel_async_call(&native) {
            sink.clear_cancel_requested();
            tracing::warn!(sink = %sink.id(), "could not cancel call: {}", hr.diagnostic());
            return Err(WbemError::native("could not cancel call", hr));
        }
        // a synchronous terminal status may already have removed it
        self.sinks.remove(&sink);
        Ok(())
    }

    /// Open a child namespace sharing this session's bridge
    pub fn open_namespace(&self, name: &str, request_flags: i32) -> Result<WbemService> {
        if name.is_empty() {
            return Err(WbemError::InvalidArgument("empty namespace specified".to_string()));
        }
        let provider = self.provider()?;
        let child = provider
            .open_namespace(name, request_flags)
            .map_err(|hr| WbemError::native("could not open namespace", hr))?;

        let namespace = format!("{}\\{}", self.namespace, name);
        tracing::debug!("opened namespace {}", namespace);
        Ok(WbemService::new(namespace, child, self.bridge.clone()))
    }

    /// Drop the provider connection and forget in-flight requests
    pub fn close(&self) {
        let provider = self.provider.write().take();
        let abandoned = self.sinks.drain();
        if provider.is_some() {
            tracing::info!(namespace = %self.namespace, abandoned = abandoned.len(), "service closed");
        }
    }
}
