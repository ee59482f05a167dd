//! Cancellation Tests - cancel lookup, idempotent removal, late statuses
//!
//! A cancelled request is forgotten by the session once the provider accepts
//! the cancel, but the provider still owns the sink and keeps calling it.
//! These tests check that the host sees exactly one terminal status whatever
//! the provider does.

mod common;

use std::sync::mpsc;
use std::sync::{Arc, Weak};
use std::time::Duration;

use common::*;
use parking_lot::Mutex;
use wbem::{
    flags, hresult, BridgeConfig, HResult, HandlerRef, HostError, HostResultObject, ResultHandler,
    SinkStatus, WbemError, WbemObjectSink, WbemService,
};

#[test]
fn test_cancel_pending_request() {
    init_logging();

    let provider = ScriptedProvider::new(silent());
    let (service, runtime) = scripted_service(provider.clone(), BridgeConfig::default());
    let recorder = RecordingHandler::new();
    let handler: HandlerRef = recorder.clone();

    service.enum_instances_async("Win32_Process", handler.clone(), 0).unwrap();
    assert_eq!(service.pending_operations(), 1);

    service.cancel_async_call(&handler).unwrap();
    assert_eq!(service.pending_operations(), 0);
    provider.join();

    assert_eq!(provider.cancels(), 1);
    let statuses = recorder.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].0, SinkStatus::Error);
    assert_eq!(statuses[0].1, hresult::WBEM_E_CALL_CANCELLED);
    assert_eq!(statuses[0].2.as_deref(), Some("Call cancelled (0x80041032)"));
    assert_eq!(runtime.attach_calls(), runtime.detach_calls());
}

#[test]
fn test_second_cancel_is_not_found() {
    init_logging();

    let provider = ScriptedProvider::new(silent());
    let (service, _runtime) = scripted_service(provider.clone(), BridgeConfig::default());
    let handler: HandlerRef = RecordingHandler::new();

    service.enum_instances_async("Win32_Service", handler.clone(), 0).unwrap();
    service.cancel_async_call(&handler).unwrap();
    assert!(matches!(service.cancel_async_call(&handler), Err(WbemError::SinkNotFound)));
    provider.join();

    assert_eq!(provider.cancels(), 1);
}

#[test]
fn test_repeated_status_after_cancel_reported_once() {
    init_logging();

    let provider = ScriptedProvider::with_cancel_statuses(silent(), 3);
    let (service, _runtime) = scripted_service(provider.clone(), BridgeConfig::default());
    let recorder = RecordingHandler::new();
    let handler: HandlerRef = recorder.clone();

    service.enum_instances_async("Win32_Thread", handler.clone(), 0).unwrap();
    service.cancel_async_call(&handler).unwrap();
    provider.join();

    assert_eq!(recorder.statuses().len(), 1);
    assert_eq!(recorder.terminal_statuses(), 1);
}

#[test]
fn test_cancel_after_completion_is_not_found() {
    init_logging();

    let provider = ScriptedProvider::new(batches_then_complete(&[5]));
    let (service, _runtime) = scripted_service(provider.clone(), BridgeConfig::default());
    let recorder = RecordingHandler::new();
    let handler: HandlerRef = recorder.clone();

    service
        .exec_query_async("SELECT * FROM Win32_Process", handler.clone(), 0)
        .unwrap();
    provider.join();

    assert!(matches!(service.cancel_async_call(&handler), Err(WbemError::SinkNotFound)));
    assert_eq!(provider.cancels(), 0);
    assert_eq!(recorder.total_objects(), 5);
}

#[test]
fn test_unknown_handler_is_not_found() {
    init_logging();

    let provider = ScriptedProvider::new(silent());
    let (service, _runtime) = scripted_service(provider, BridgeConfig::default());
    let stranger: HandlerRef = RecordingHandler::new();

    assert!(matches!(service.cancel_async_call(&stranger), Err(WbemError::SinkNotFound)));
}

#[test]
fn test_results_racing_cancel_are_not_lost_or_duplicated() {
    init_logging();

    // The script streams until told to stop, then completes as cancelled
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let stop_rx = Arc::new(parking_lot::Mutex::new(stop_rx));
    let script: Script = Arc::new(move |sink: Arc<dyn WbemObjectSink>| {
        let mut next = 0i64;
        loop {
            sink.indicate(process_records(next, 10));
            next += 10;
            if stop_rx.lock().recv_timeout(Duration::from_millis(1)).is_ok() {
                break;
            }
        }
        sink.indicate(process_records(next, 10));
        sink.set_status(flags::WBEM_STATUS_COMPLETE, hresult::WBEM_E_CALL_CANCELLED, None, None);
    });

    let provider = ScriptedProvider::with_cancel_statuses(script, 0);
    let config = BridgeConfig::default().with_batch_threshold(25);
    let (service, runtime) = scripted_service(provider.clone(), config);
    let recorder = RecordingHandler::new();
    let handler: HandlerRef = recorder.clone();

    service.enum_instances_async("Win32_Process", handler.clone(), 0).unwrap();
    std::thread::sleep(Duration::from_millis(20));
    service.cancel_async_call(&handler).unwrap();
    stop_tx.send(()).unwrap();
    provider.join();

    // Everything indicated before the terminal status was flushed by it
    assert_eq!(recorder.duplicates(), 0);
    assert_eq!(recorder.total_objects() % 10, 0);
    assert!(recorder.total_objects() >= 10);
    assert_eq!(recorder.terminal_statuses(), 1);
    assert_eq!(runtime.attach_calls(), runtime.detach_calls());
    assert!(service.bridge().arena().is_empty());
}

/// Handler that cancels its own request once the first batch arrives
#[derive(Default)]
struct CancelOnFirstBatch {
    service: Mutex<Weak<WbemService>>,
    me: Mutex<Weak<CancelOnFirstBatch>>,
    batches: Mutex<Vec<usize>>,
    statuses: Mutex<Vec<(SinkStatus, HResult)>>,
    cancel_result: Mutex<Option<Result<(), String>>>,
}

impl ResultHandler for CancelOnFirstBatch {
    fn deliver(&self, objects: Vec<HostResultObject>) -> Result<(), HostError> {
        self.batches.lock().push(objects.len());
        for object in objects {
            object.dispose();
        }

        let first = self.cancel_result.lock().is_none();
        let service = self.service.lock().upgrade();
        let me = self.me.lock().upgrade();
        if let (true, Some(service), Some(me)) = (first, service, me) {
            let handler: HandlerRef = me;
            let result = service.cancel_async_call(&handler).map_err(|err| err.to_string());
            *self.cancel_result.lock() = Some(result);
        }
        Ok(())
    }

    fn status(
        &self,
        status: SinkStatus,
        hr: HResult,
        _message: Option<String>,
        _object: Option<HostResultObject>,
    ) -> Result<(), HostError> {
        self.statuses.lock().push((status, hr));
        Ok(())
    }
}

#[test]
fn test_cancel_from_inside_delivery_answered_inline() {
    init_logging();

    let provider = ScriptedProvider::with_inline_cancel(batches_then_complete(&[5, 2]));
    let config = BridgeConfig::default().with_batch_threshold(2);
    let (service, runtime) = scripted_service(provider.clone(), config);
    let service = Arc::new(service);

    let recorder = Arc::new(CancelOnFirstBatch::default());
    *recorder.service.lock() = Arc::downgrade(&service);
    *recorder.me.lock() = Arc::downgrade(&recorder);
    let handler: HandlerRef = recorder.clone();

    service.enum_instances_async("Win32_Process", handler, 0).unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    let waiter = provider.clone();
    std::thread::spawn(move || {
        waiter.join();
        let _ = done_tx.send(());
    });
    done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("provider thread blocked while the handler cancelled");

    assert_eq!(*recorder.cancel_result.lock(), Some(Ok(())));
    assert_eq!(provider.cancels(), 1);
    assert_eq!(*recorder.batches.lock(), vec![5]);
    assert_eq!(
        *recorder.statuses.lock(),
        vec![(SinkStatus::Error, hresult::WBEM_E_CALL_CANCELLED)]
    );
    assert_eq!(service.pending_operations(), 0);
    assert_eq!(runtime.attach_calls(), runtime.detach_calls());
    assert!(service.bridge().arena().is_empty());
}
