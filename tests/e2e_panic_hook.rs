//! E2E test for panicking callbacks under a host-installed quiet panic hook
//!
//! Lives in its own test binary because the panic hook is process-wide.

use audiobridge::audio::stream::TimingInfo;
use audiobridge::{
    AudioBridge, BridgeEvent, CallbackResult, EventKind, ExtraParams, MockBackend, StreamConfig,
    StreamState,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_quiet_hook_still_reports_callback_panic() {
    let hook_calls = Arc::new(AtomicUsize::new(0));
    let hook_counter = hook_calls.clone();
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |_| {
        hook_counter.fetch_add(1, Ordering::SeqCst);
    }));

    let backend = MockBackend::new();
    let events = Arc::new(Mutex::new(Vec::<BridgeEvent>::new()));
    let sink_events = events.clone();
    let exploding =
        |_: &[f32], _: u32, _: &ExtraParams| -> CallbackResult { panic!("coefficient overflow") };

    let config = StreamConfig {
        frame_size: 8,
        output_enabled: true,
        ..Default::default()
    };
    let bridge = AudioBridge::builder(config)
        .event_sink(move |event: &BridgeEvent| sink_events.lock().unwrap().push(event.clone()))
        .open(&backend, exploding)
        .unwrap();
    bridge.start().unwrap();

    let input: Vec<u8> = (0..16).collect();
    let output = backend.deliver(&input, TimingInfo::default()).unwrap();
    let state = bridge.state();
    let failed = bridge.stats().frames_failed;
    bridge.close();

    std::panic::set_hook(previous);

    assert_eq!(output, input);
    assert_eq!(state, StreamState::Started);
    assert_eq!(failed, 1);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 1);

    let events = events.lock().unwrap();
    let failure = events
        .iter()
        .find(|e| e.kind == EventKind::CallbackFailed)
        .expect("callback failure event");
    assert!(failure.message.contains("coefficient overflow"));
}
