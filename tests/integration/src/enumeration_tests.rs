//! Enumeration Tests - result batching and status delivery
//!
//! A scripted provider answers each request on its own thread. These tests
//! check what the host handler sees:
//! - batch sizes against the flush threshold
//! - the terminal status and its message
//! - runtime attachment balance once the request is over

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use futures::StreamExt;

use common::*;
use wbem::{flags, hresult, BridgeConfig, HandlerRef, HostValue, SinkEvent, SinkStatus, WbemError, WbemObjectSink};

#[test]
fn test_flushes_at_threshold_then_completes() {
    init_logging();

    let provider = ScriptedProvider::new(batches_then_complete(&[1000, 1000, 500]));
    let (service, runtime) = scripted_service(provider.clone(), BridgeConfig::default());
    let handler = RecordingHandler::new();

    service
        .exec_query_async("SELECT * FROM Win32_Process", handler.clone(), 0)
        .unwrap();
    provider.join();

    assert_eq!(handler.batch_sizes(), vec![1000, 1000, 500]);
    assert_eq!(handler.total_objects(), 2500);
    assert_eq!(handler.duplicates(), 0);

    let statuses = handler.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].0, SinkStatus::Complete);
    assert_eq!(statuses[0].1, hresult::WBEM_S_NO_ERROR);

    assert_eq!(service.pending_operations(), 0);
    assert_eq!(runtime.attach_calls(), runtime.detach_calls());
    assert_eq!(runtime.attached_threads(), 0);
    assert!(service.bridge().arena().is_empty());
}

#[test]
fn test_small_batches_coalesce() {
    init_logging();

    let provider = ScriptedProvider::new(batches_then_complete(&[3, 3, 3, 3]));
    let config = BridgeConfig::default().with_batch_threshold(5);
    let (service, _runtime) = scripted_service(provider.clone(), config);
    let handler = RecordingHandler::new();

    service.enum_instances_async("Win32_Process", handler.clone(), 0).unwrap();
    provider.join();

    // 3 buffered, 6 flushed, 3 buffered, 6 flushed
    assert_eq!(handler.batch_sizes(), vec![6, 6]);
    assert_eq!(handler.total_objects(), 12);
    assert_eq!(handler.terminal_statuses(), 1);
}

#[test]
fn test_provider_error_reaches_handler() {
    init_logging();

    let provider = ScriptedProvider::new(fail_with(hresult::WBEM_E_ACCESS_DENIED));
    let (service, runtime) = scripted_service(provider.clone(), BridgeConfig::default());
    let handler = RecordingHandler::new();

    service
        .exec_query_async("SELECT * FROM Win32_ShadowCopy", handler.clone(), 0)
        .unwrap();
    provider.join();

    let statuses = handler.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].0, SinkStatus::Error);
    assert_eq!(statuses[0].2.as_deref(), Some("Access denied (0x80041003)"));
    assert!(handler.batch_sizes().is_empty());
    assert_eq!(service.pending_operations(), 0);
    assert_eq!(runtime.attach_calls(), runtime.detach_calls());
}

#[test]
fn test_progress_and_status_object() {
    init_logging();

    let script: Script = Arc::new(|sink: Arc<dyn WbemObjectSink>| {
        sink.set_status(flags::WBEM_STATUS_PROGRESS, hresult::S_OK, Some("halfway".into()), None);
        sink.indicate(process_records(0, 2));
        sink.set_status(
            flags::WBEM_STATUS_COMPLETE,
            hresult::WBEM_E_PROVIDER_FAILURE,
            Some("provider gave up".into()),
            Some(process_record(99)),
        );
    });
    let provider = ScriptedProvider::new(script);
    let (service, _runtime) = scripted_service(provider.clone(), BridgeConfig::default());
    let handler = RecordingHandler::new();

    service.enum_classes_async(None, handler.clone(), flags::WBEM_FLAG_SHALLOW).unwrap();
    provider.join();

    let statuses = handler.statuses();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].0, SinkStatus::Progress);
    assert_eq!(statuses[0].2.as_deref(), Some("halfway"));
    assert_eq!(statuses[1].0, SinkStatus::Error);
    assert_eq!(statuses[1].2.as_deref(), Some("provider gave up"));

    assert_eq!(handler.batch_sizes(), vec![2]);
    assert_eq!(handler.status_objects.load(Ordering::SeqCst), 1);
    assert!(service.bridge().arena().is_empty());
}

#[test]
fn test_rejected_request_is_not_tracked() {
    init_logging();

    let provider = ScriptedProvider::rejecting(hresult::WBEM_E_INVALID_QUERY);
    let (service, _runtime) = scripted_service(provider.clone(), BridgeConfig::default());
    let handler: HandlerRef = RecordingHandler::new();

    let err = service
        .exec_query_async("SELEKT * FROM nowhere", handler.clone(), 0)
        .unwrap_err();
    assert_eq!(err.to_string(), "could not execute query: Invalid query (0x80041017)");
    assert_eq!(service.pending_operations(), 0);
    assert!(matches!(service.cancel_async_call(&handler), Err(WbemError::SinkNotFound)));
}

#[test]
fn test_query_flags_and_language() {
    init_logging();

    let provider = ScriptedProvider::new(batches_then_complete(&[]));
    let (service, _runtime) = scripted_service(provider.clone(), BridgeConfig::default());

    service
        .exec_query_async("SELECT * FROM Win32_Service", RecordingHandler::new(), flags::WBEM_FLAG_SEND_STATUS)
        .unwrap();
    provider.join();

    let requests = provider.requests();
    assert_eq!(requests[0].0, "WQL");
    assert_eq!(requests[0].1, "SELECT * FROM Win32_Service");
    assert_eq!(requests[0].2, flags::WBEM_FLAG_SEND_STATUS | flags::WBEM_FLAG_DIRECT_READ);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stream_consumer() {
    init_logging();

    let provider = ScriptedProvider::new(batches_then_complete(&[40, 2]));
    let config = BridgeConfig::default().with_batch_threshold(16);
    let (service, _runtime) = scripted_service(provider.clone(), config);

    let mut stream = service.exec_query_stream("SELECT * FROM Win32_Process", 0).unwrap();

    let mut names = Vec::new();
    let mut terminal = None;
    while let Some(event) = stream.next().await {
        match event {
            SinkEvent::Objects(objects) => {
                for object in objects {
                    let name = object.get_value("Name").unwrap();
                    names.push(name.as_str().unwrap().to_string());
                    assert!(matches!(object.get_value("CreationDate").unwrap(), HostValue::Date(ms) if ms != 0));
                    object.dispose();
                }
            }
            SinkEvent::Status { status, .. } => terminal = Some(status),
        }
    }
    provider.join();

    assert_eq!(names.len(), 42);
    assert_eq!(names[0], "proc0.exe");
    assert_eq!(names[41], "proc41.exe");
    assert_eq!(terminal, Some(SinkStatus::Complete));
    assert!(service.bridge().arena().is_empty());
}
