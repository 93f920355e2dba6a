//! State-diff engine
//!
//! One diff pass compares the current frame against the previous one and
//! emits press / release / repeat events for every control that changed (or
//! is still held). Components run in a fixed order (buttons, jog wheels,
//! encoders, selectors), which fixes the relative ordering of simultaneous
//! emissions within a pass. Controls mapped to [`OUTPUT_NONE`] are diffed
//! but never emit.

use crate::map::{ButtonDef, EncoderDef, EncoderWidth, JogDef, SelectorDef};
use crate::{ControlMap, EventSink, Frame, InputEvent, KeyAction, OUTPUT_NONE};

/// Jog status bit: the wheel is turning.
pub const JOG_MOVING: u8 = 1 << 3;
/// Jog status bit: turning direction (0 left, 1 right).
pub const JOG_DIRECTION: u8 = 1 << 2;
/// Jog status bit: the wheel surface is pressed.
pub const JOG_PRESSED: u8 = 1 << 1;

/// Run one diff pass over `current` and `previous`.
pub fn diff_frames(
    map: &ControlMap,
    current: &Frame,
    previous: &Frame,
    sink: &mut dyn EventSink,
) {
    for button in map.buttons() {
        diff_button(button, current, previous, sink);
    }
    for jog in map.jogs() {
        diff_jog(jog, current, previous, sink);
    }
    for encoder in map.encoders() {
        diff_encoder(encoder, current, previous, sink);
    }
    for selector in map.selectors() {
        diff_selector(selector, current, previous, sink);
    }
}

fn emit(sink: &mut dyn EventSink, code: u16, action: KeyAction) {
    if code != OUTPUT_NONE {
        sink.emit(InputEvent::new(code, action));
    }
}

fn diff_button(button: &ButtonDef, current: &Frame, previous: &Frame, sink: &mut dyn EventSink) {
    let at = usize::from(button.byte);
    let cur = current.as_bytes()[at] & button.mask;
    let prev = previous.as_bytes()[at] & button.mask;

    if cur != prev {
        let action = if cur == button.mask {
            KeyAction::Press
        } else {
            KeyAction::Release
        };
        emit(sink, button.code, action);
    } else if cur == button.mask {
        emit(sink, button.code, KeyAction::Repeat);
    }
}

fn diff_jog(jog: &JogDef, current: &Frame, previous: &Frame, sink: &mut dyn EventSink) {
    let at = usize::from(jog.byte);
    let status = current.as_bytes()[at];
    let status_prev = previous.as_bytes()[at];

    let moving = status & JOG_MOVING;
    let direction = status & JOG_DIRECTION;
    let pressed = status & JOG_PRESSED;

    let moving_prev = status_prev & JOG_MOVING;
    let direction_prev = status_prev & JOG_DIRECTION;
    let pressed_prev = status_prev & JOG_PRESSED;

    if jog.pulse_on_turn {
        if moving != moving_prev {
            if moving == JOG_MOVING {
                let code = if direction == 0 {
                    jog.left_code
                } else {
                    jog.right_code
                };
                emit(sink, code, KeyAction::Press);
            } else {
                // The held direction at stop time is not re-derived; release
                // both sides.
                emit(sink, jog.left_code, KeyAction::Release);
                emit(sink, jog.right_code, KeyAction::Release);
            }
        } else if moving == JOG_MOVING {
            if direction == direction_prev {
                let code = if direction == 0 {
                    jog.left_code
                } else {
                    jog.right_code
                };
                emit(sink, code, KeyAction::Repeat);
            } else if direction == 0 {
                emit(sink, jog.right_code, KeyAction::Release);
                emit(sink, jog.left_code, KeyAction::Press);
            } else {
                emit(sink, jog.left_code, KeyAction::Release);
                emit(sink, jog.right_code, KeyAction::Press);
            }
        }
    }

    if pressed != pressed_prev {
        let action = if pressed == JOG_PRESSED {
            KeyAction::Press
        } else {
            KeyAction::Release
        };
        emit(sink, jog.button_code, action);
    } else if pressed == JOG_PRESSED {
        emit(sink, jog.button_code, KeyAction::Repeat);
    }
}

fn diff_encoder(encoder: &EncoderDef, current: &Frame, previous: &Frame, sink: &mut dyn EventSink) {
    if !encoder.pulse_on_turn {
        // Reserved for continuous-motion consumers; no edge events.
        return;
    }

    let cur = counter_value(encoder, current);
    let prev = counter_value(encoder, previous);

    // Deltas are judged in signed space so a wrap at the counter boundary
    // still reads as a single tick. At most one pulse pair per pass.
    if cur > prev {
        emit(sink, encoder.right_code, KeyAction::Press);
        emit(sink, encoder.right_code, KeyAction::Release);
    } else if cur < prev {
        emit(sink, encoder.left_code, KeyAction::Press);
        emit(sink, encoder.left_code, KeyAction::Release);
    }
}

fn counter_value(encoder: &EncoderDef, frame: &Frame) -> i16 {
    let at = usize::from(encoder.byte);
    let bytes = frame.as_bytes();
    match encoder.width {
        EncoderWidth::One => i16::from(bytes[at] as i8),
        EncoderWidth::Two => u16::from_be_bytes([bytes[at], bytes[at + 1]]) as i16,
    }
}

fn diff_selector(
    selector: &SelectorDef,
    current: &Frame,
    previous: &Frame,
    sink: &mut dyn EventSink,
) {
    let at = usize::from(selector.byte);
    let cur = current.as_bytes()[at];
    let prev = previous.as_bytes()[at];

    for state in &selector.states {
        if !state.as_button {
            continue;
        }
        if cur != prev {
            let action = if cur == state.value {
                KeyAction::Press
            } else {
                KeyAction::Release
            };
            emit(sink, state.code, action);
        } else if cur == state.value {
            emit(sink, state.code, KeyAction::Repeat);
        }
    }
}
