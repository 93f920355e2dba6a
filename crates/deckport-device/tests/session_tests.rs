//! Session behavior over a scripted transport.
//!
//! These tests exercise the full read cycle (baseline seeding, diffing,
//! previous-frame advancement, repeat limiting, checksum reporting, and the
//! cooperative shutdown loop) without any hardware behind the transport.

use deckport_device::{
    ChannelError, ChannelResult, CycleOutcome, FrameTransport, Session, ShutdownFlag,
};
use deckport_protocol::{
    ButtonDef, ControlMap, Frame, InputEvent, KeyAction, MapLayout, frame_for_payload,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BTN_BYTE: usize = 0x05;
const BTN_MASK: u8 = 0x10;
const BTN_CODE: u16 = 52;

#[derive(Debug, Clone, Copy)]
enum Step {
    Frame(Frame),
    Timeout,
}

/// Transport that replays a fixed script, then either loops its fallback
/// frame or reports the channel as closed.
struct ScriptedTransport {
    steps: VecDeque<Step>,
    fallback: Option<Frame>,
    reads: usize,
    writes: Vec<Vec<u8>>,
    timer_running: bool,
    timer_interval: u32,
}

impl ScriptedTransport {
    fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            fallback: None,
            reads: 0,
            writes: Vec::new(),
            timer_running: false,
            timer_interval: 0,
        }
    }

    fn looping(frame: Frame) -> Self {
        let mut transport = Self::new([]);
        transport.fallback = Some(frame);
        transport
    }
}

impl FrameTransport for ScriptedTransport {
    fn read_frame(&mut self) -> ChannelResult<Option<Frame>> {
        self.reads += 1;
        match self.steps.pop_front() {
            Some(Step::Frame(frame)) => Ok(Some(frame)),
            Some(Step::Timeout) => Ok(None),
            None => self.fallback.map(Some).ok_or(ChannelError::Closed),
        }
    }

    fn write_payload(&mut self, payload: &[u8]) -> ChannelResult<()> {
        self.writes.push(payload.to_vec());
        Ok(())
    }

    fn start_timer(&mut self, tick_ms: u32) -> ChannelResult<()> {
        self.timer_interval = tick_ms;
        self.timer_running = true;
        Ok(())
    }

    fn stop_timer(&mut self) -> ChannelResult<()> {
        self.timer_running = false;
        Ok(())
    }

    fn timer_running(&mut self) -> ChannelResult<bool> {
        Ok(self.timer_running)
    }

    fn timer_interval(&mut self) -> ChannelResult<u32> {
        Ok(self.timer_interval)
    }
}

fn button_map() -> ControlMap {
    ControlMap::new(MapLayout {
        buttons: vec![ButtonDef::new(BTN_BYTE as u8, BTN_MASK, BTN_CODE)],
        ..MapLayout::default()
    })
    .expect("valid map")
}

fn raw_frame(button_held: bool) -> Frame {
    let mut frame = Frame::zeroed();
    if button_held {
        frame.as_mut_bytes()[BTN_BYTE] = BTN_MASK;
    }
    frame
}

/// Frame with a valid checksum trailer.
fn sealed_frame(button_held: bool) -> Frame {
    let mut payload = [0u8; 8];
    if button_held {
        payload[BTN_BYTE] = BTN_MASK;
    }
    frame_for_payload(&payload).expect("sealed frame")
}

type SharedEvents = Arc<Mutex<Vec<InputEvent>>>;

fn recording_session(transport: ScriptedTransport) -> (Session<ScriptedTransport>, SharedEvents) {
    let events: SharedEvents = Arc::new(Mutex::new(Vec::new()));
    let sink_events = Arc::clone(&events);
    let mut session = Session::new(transport);
    session.register_map(button_map(), move |event: InputEvent| {
        sink_events.lock().expect("events lock").push(event);
    });
    (session, events)
}

// ── Baseline rule ─────────────────────────────────────────────────────────────

#[test]
fn first_read_seeds_baseline_without_emitting() {
    let transport = ScriptedTransport::new([Step::Frame(raw_frame(true))]);
    let (mut session, events) = recording_session(transport);

    let outcome = session.read_cycle().expect("cycle");
    assert_eq!(outcome, CycleOutcome::Baseline);
    assert!(
        events.lock().expect("events lock").is_empty(),
        "the baseline frame must never emit, whatever its content"
    );
}

#[test]
fn second_read_diffs_against_baseline() {
    let transport = ScriptedTransport::new([
        Step::Frame(raw_frame(false)),
        Step::Frame(raw_frame(true)),
    ]);
    let (mut session, events) = recording_session(transport);

    assert_eq!(session.read_cycle().expect("cycle"), CycleOutcome::Baseline);
    let outcome = session.read_cycle().expect("cycle");
    assert!(matches!(outcome, CycleOutcome::Decoded { events: 1, .. }));
    assert_eq!(
        *events.lock().expect("events lock"),
        vec![InputEvent::new(BTN_CODE, KeyAction::Press)]
    );
}

#[test]
fn timeout_does_not_establish_baseline() {
    let transport = ScriptedTransport::new([
        Step::Timeout,
        Step::Frame(raw_frame(true)),
        Step::Frame(raw_frame(true)),
    ]);
    let (mut session, events) = recording_session(transport);

    assert_eq!(session.read_cycle().expect("cycle"), CycleOutcome::TimedOut);
    // The frame after the timeout is still the first real frame.
    assert_eq!(session.read_cycle().expect("cycle"), CycleOutcome::Baseline);

    let outcome = session.read_cycle().expect("cycle");
    assert!(matches!(outcome, CycleOutcome::Decoded { events: 1, .. }));
    assert_eq!(
        *events.lock().expect("events lock"),
        vec![InputEvent::new(BTN_CODE, KeyAction::Repeat)]
    );
}

// ── Checksum reporting ────────────────────────────────────────────────────────

#[test]
fn corrupt_frame_still_emits_and_advances() {
    let transport = ScriptedTransport::new([
        Step::Frame(sealed_frame(false)),
        // Held-button frame with no trailer: checksum must fail.
        Step::Frame(raw_frame(true)),
        // Valid frame with the button released again.
        Step::Frame(sealed_frame(false)),
    ]);
    let (mut session, events) = recording_session(transport);

    assert_eq!(session.read_cycle().expect("cycle"), CycleOutcome::Baseline);

    let corrupt = session.read_cycle().expect("cycle");
    assert_eq!(
        corrupt,
        CycleOutcome::Decoded {
            events: 1,
            checksum_ok: false,
        },
        "events from a corrupt frame are emitted before validation and stand"
    );

    // The corrupt frame became the new previous snapshot regardless, so the
    // release edge is detected against it.
    let clean = session.read_cycle().expect("cycle");
    assert_eq!(
        clean,
        CycleOutcome::Decoded {
            events: 1,
            checksum_ok: true,
        }
    );
    assert_eq!(
        *events.lock().expect("events lock"),
        vec![
            InputEvent::new(BTN_CODE, KeyAction::Press),
            InputEvent::new(BTN_CODE, KeyAction::Release),
        ]
    );
}

#[test]
fn sealed_frames_report_checksum_ok() {
    let transport = ScriptedTransport::new([
        Step::Frame(sealed_frame(false)),
        Step::Frame(sealed_frame(true)),
    ]);
    let (mut session, _events) = recording_session(transport);

    assert_eq!(session.read_cycle().expect("cycle"), CycleOutcome::Baseline);
    assert_eq!(
        session.read_cycle().expect("cycle"),
        CycleOutcome::Decoded {
            events: 1,
            checksum_ok: true,
        }
    );
}

// ── Repeat limiting ───────────────────────────────────────────────────────────

#[test]
fn repeats_are_limited_by_the_shared_window() {
    let held = raw_frame(true);
    let transport = ScriptedTransport::new([
        Step::Frame(held),
        Step::Frame(held),
        Step::Frame(held),
        Step::Frame(held),
    ]);
    let (mut session, events) = recording_session(transport);
    session.set_repeat_interval(Duration::from_secs(3600));

    assert_eq!(session.read_cycle().expect("cycle"), CycleOutcome::Baseline);

    // First repeat passes, the rest fall inside the window.
    assert!(matches!(
        session.read_cycle().expect("cycle"),
        CycleOutcome::Decoded { events: 1, .. }
    ));
    assert!(matches!(
        session.read_cycle().expect("cycle"),
        CycleOutcome::Decoded { events: 0, .. }
    ));
    assert!(matches!(
        session.read_cycle().expect("cycle"),
        CycleOutcome::Decoded { events: 0, .. }
    ));
    assert_eq!(events.lock().expect("events lock").len(), 1);
}

#[test]
fn presses_bypass_the_repeat_window() {
    let transport = ScriptedTransport::new([
        Step::Frame(raw_frame(false)),
        Step::Frame(raw_frame(true)),
        Step::Frame(raw_frame(false)),
        Step::Frame(raw_frame(true)),
    ]);
    let (mut session, events) = recording_session(transport);
    session.set_repeat_interval(Duration::from_secs(3600));

    for _ in 0..4 {
        session.read_cycle().expect("cycle");
    }
    let seen = events.lock().expect("events lock").clone();
    assert_eq!(
        seen,
        vec![
            InputEvent::new(BTN_CODE, KeyAction::Press),
            InputEvent::new(BTN_CODE, KeyAction::Release),
            InputEvent::new(BTN_CODE, KeyAction::Press),
        ]
    );
}

// ── Without a registered map ──────────────────────────────────────────────────

#[test]
fn unmapped_session_still_tracks_frames_and_checksums() {
    let transport = ScriptedTransport::new([
        Step::Frame(sealed_frame(false)),
        Step::Frame(raw_frame(true)),
    ]);
    let mut session = Session::new(transport);

    assert_eq!(session.read_cycle().expect("cycle"), CycleOutcome::Baseline);
    assert_eq!(
        session.read_cycle().expect("cycle"),
        CycleOutcome::Decoded {
            events: 0,
            checksum_ok: false,
        }
    );
}

// ── Shutdown loop ─────────────────────────────────────────────────────────────

#[test]
fn run_stops_when_the_flag_is_set() {
    let transport = ScriptedTransport::looping(raw_frame(true));
    let events: SharedEvents = Arc::new(Mutex::new(Vec::new()));
    let sink_events = Arc::clone(&events);

    let mut session = Session::new(transport);
    let shutdown = ShutdownFlag::new();
    let from_sink = shutdown.clone();
    session.register_map(button_map(), move |event: InputEvent| {
        sink_events.lock().expect("events lock").push(event);
        from_sink.set();
    });

    session.run(&shutdown).expect("run");

    // Baseline pass, then one diff pass whose repeat sets the flag.
    assert_eq!(session.transport_mut().reads, 2);
    assert_eq!(events.lock().expect("events lock").len(), 1);
}

#[test]
fn run_returns_immediately_when_already_shut_down() {
    let transport = ScriptedTransport::looping(raw_frame(false));
    let mut session = Session::new(transport);

    let shutdown = ShutdownFlag::new();
    shutdown.set();
    session.run(&shutdown).expect("run");
    assert_eq!(session.transport_mut().reads, 0);
}

#[test]
fn run_propagates_transport_failure() {
    let transport = ScriptedTransport::new([Step::Frame(raw_frame(false))]);
    let mut session = Session::new(transport);

    let shutdown = ShutdownFlag::new();
    let result = session.run(&shutdown);
    assert!(matches!(result, Err(ChannelError::Closed)));
}

// ── Write passthrough ─────────────────────────────────────────────────────────

#[test]
fn session_write_reaches_the_transport() {
    let transport = ScriptedTransport::new([]);
    let mut session = Session::new(transport);

    session.write(&[0x01, 0x02, 0x03]).expect("write");
    assert_eq!(session.transport_mut().writes, vec![vec![0x01, 0x02, 0x03]]);
}
