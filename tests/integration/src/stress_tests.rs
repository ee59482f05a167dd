//! Stress Tests - concurrent provider threads at scale
//!
//! These tests exercise the sink from many provider threads at once:
//! - Concurrent `indicate` calls on one sink
//! - Many requests in flight on one session
//! - Faulty host handlers under load

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use common::*;
use wbem::{flags, hresult, BridgeConfig, HandlerRef, SinkStatus, WbemObjectSink};

/// Test: many provider threads indicating into the same sink
/// No record may be lost or delivered twice
#[test]
fn test_concurrent_indicate_single_sink() {
    init_logging();

    const THREADS: usize = 8;
    const CALLS_PER_THREAD: usize = 50;
    const RECORDS_PER_CALL: usize = 37;

    let script: Script = Arc::new(|sink: Arc<dyn WbemObjectSink>| {
        let workers: Vec<_> = (0..THREADS)
            .map(|t| {
                let sink = sink.clone();
                thread::spawn(move || {
                    for call in 0..CALLS_PER_THREAD {
                        let start = ((t * CALLS_PER_THREAD + call) * RECORDS_PER_CALL) as i64;
                        sink.indicate(process_records(start, RECORDS_PER_CALL));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("indicate worker panicked");
        }
        sink.set_status(flags::WBEM_STATUS_COMPLETE, hresult::S_OK, None, None);
    });

    let provider = ScriptedProvider::new(script);
    let config = BridgeConfig::default().with_batch_threshold(100);
    let (service, runtime) = scripted_service(provider.clone(), config);
    let recorder = RecordingHandler::new();

    let start = Instant::now();
    service.enum_instances_async("Win32_Process", recorder.clone(), 0).unwrap();
    provider.join();
    println!("{} records in {:?}", THREADS * CALLS_PER_THREAD * RECORDS_PER_CALL, start.elapsed());

    assert_eq!(recorder.total_objects(), THREADS * CALLS_PER_THREAD * RECORDS_PER_CALL);
    assert_eq!(recorder.duplicates(), 0);
    assert_eq!(recorder.terminal_statuses(), 1);
    assert!(recorder.batch_sizes().iter().all(|&n| n > 0));
    assert_eq!(runtime.attach_calls(), runtime.detach_calls());
    assert_eq!(runtime.attached_threads(), 0);
    assert!(service.bridge().arena().is_empty());
}

/// Test: many requests in flight on one session
#[test]
fn test_many_concurrent_requests() {
    init_logging();

    const REQUESTS: usize = 32;

    let provider = ScriptedProvider::new(batches_then_complete(&[120, 80, 7]));
    let config = BridgeConfig::default().with_batch_threshold(100);
    let (service, runtime) = scripted_service(provider.clone(), config);

    let recorders: Vec<_> = (0..REQUESTS).map(|_| RecordingHandler::new()).collect();
    for (i, recorder) in recorders.iter().enumerate() {
        service
            .exec_query_async(&format!("SELECT * FROM Win32_Process WHERE Batch = {}", i), recorder.clone(), 0)
            .unwrap();
    }
    provider.join();

    for recorder in &recorders {
        assert_eq!(recorder.total_objects(), 207);
        assert_eq!(recorder.duplicates(), 0);
        assert_eq!(recorder.batch_sizes(), vec![120, 87]);
        assert_eq!(recorder.statuses().last().map(|s| s.0), Some(SinkStatus::Complete));
    }
    assert_eq!(service.pending_operations(), 0);
    assert_eq!(runtime.attach_calls(), runtime.detach_calls());
}

/// Test: a handler that fails every delivery still gets everything
#[test]
fn test_failing_handler_keeps_receiving() {
    init_logging();

    let provider = ScriptedProvider::new(batches_then_complete(&[10, 10, 10, 3]));
    let config = BridgeConfig::default().with_batch_threshold(10);
    let (service, runtime) = scripted_service(provider.clone(), config);
    let recorder = RecordingHandler::with_fault(Fault::ErrorOnDeliver);

    service.enum_instances_async("Win32_Process", recorder.clone(), 0).unwrap();
    provider.join();

    assert_eq!(recorder.batch_sizes(), vec![10, 10, 10, 3]);
    assert_eq!(recorder.terminal_statuses(), 1);
    assert_eq!(service.pending_operations(), 0);
    assert_eq!(runtime.attach_calls(), runtime.detach_calls());
}

/// Test: a handler panic is contained and later calls still arrive
#[test]
fn test_panicking_handler_is_contained() {
    init_logging();

    let provider = ScriptedProvider::new(batches_then_complete(&[10, 10, 4]));
    let config = BridgeConfig::default().with_batch_threshold(10);
    let (service, runtime) = scripted_service(provider.clone(), config);
    let recorder = RecordingHandler::with_fault(Fault::PanicOnFirstDeliver);

    service.enum_instances_async("Win32_Process", recorder.clone(), 0).unwrap();
    provider.join();

    assert_eq!(recorder.batch_sizes(), vec![10, 10, 4]);
    assert_eq!(recorder.terminal_statuses(), 1);
    assert_eq!(runtime.attach_calls(), runtime.detach_calls());
    assert_eq!(runtime.attached_threads(), 0);
}

/// Test: a handler failing its status call still releases the request
#[test]
fn test_failing_status_still_finishes() {
    init_logging();

    let provider = ScriptedProvider::new(batches_then_complete(&[2]));
    let (service, runtime) = scripted_service(provider.clone(), BridgeConfig::default());
    let recorder = RecordingHandler::with_fault(Fault::ErrorOnStatus);
    let handler: HandlerRef = recorder.clone();

    service.enum_instances_async("Win32_Process", handler.clone(), 0).unwrap();
    provider.join();

    assert_eq!(recorder.terminal_statuses(), 1);
    assert_eq!(service.pending_operations(), 0);
    assert_eq!(runtime.attach_calls(), runtime.detach_calls());
}
