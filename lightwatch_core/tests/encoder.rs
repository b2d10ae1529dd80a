//! Quadrature decoding over scripted line sequences.
//!
//! `ScriptedPins` holds each state for two reads so the decoder's consensus
//! double read sees a stable level, exactly as a real (settled) encoder
//! would.

use lightwatch_core::encoder::{Direction, EncoderEvents, QuadratureDecoder};
use lightwatch_core::mocks::{FailingPins, ScriptedPins};
use lightwatch_traits::{EncoderPins, MonotonicClock};
use std::time::Duration;

const LO: (bool, bool) = (false, false);
const AB: [(bool, bool); 4] = [(false, true), (true, true), (true, false), (false, false)];
const BA: [(bool, bool); 4] = [(true, false), (true, true), (false, true), (false, false)];

fn decoder(
    states: Vec<(bool, bool)>,
) -> QuadratureDecoder<ScriptedPins, MonotonicClock> {
    QuadratureDecoder::new(ScriptedPins::new(states), 4, MonotonicClock::new())
        .expect("prime decoder")
}

#[test]
fn full_clockwise_cycle_emits_one_event() {
    // 00 -> 01 -> 11 -> 10 -> 00: four valid edges ending detent-aligned.
    let mut states = vec![LO];
    states.extend(AB);
    let mut dec = decoder(states);

    let got = dec.poll(Duration::from_millis(50)).expect("poll");
    assert_eq!(got, Some(Direction::Clockwise));
    // The mechanism is at rest now; nothing further is emitted.
    assert_eq!(dec.poll(Duration::ZERO).expect("poll"), None);
}

#[test]
fn full_counter_clockwise_cycle_emits_one_event() {
    let mut states = vec![LO];
    states.extend(BA);
    let mut dec = decoder(states);

    let got = dec.poll(Duration::from_millis(50)).expect("poll");
    assert_eq!(got, Some(Direction::CounterClockwise));
}

#[test]
fn zero_net_transition_emits_nothing() {
    // 00 -> 01 -> 00 -> 01 -> 00: the state is revisited, net zero.
    let states = vec![LO, (false, true), LO, (false, true), LO];
    let mut dec = decoder(states);

    assert_eq!(dec.poll(Duration::from_millis(5)).expect("poll"), None);
}

#[test]
fn zero_timeout_is_exactly_one_check() {
    let mut states = vec![LO];
    states.extend(AB);
    let mut dec = decoder(states);

    // Three single checks walk three edges; the fourth completes the
    // detent.
    for _ in 0..3 {
        assert_eq!(dec.poll(Duration::ZERO).expect("poll"), None);
    }
    assert_eq!(
        dec.poll(Duration::ZERO).expect("poll"),
        Some(Direction::Clockwise)
    );
}

#[test]
fn threshold_at_misaligned_state_defers_emission() {
    // Priming at 01, four edges land back on 01: both lines differ, so the
    // accumulator clamps and the event waits for the next aligned state.
    let states = vec![
        (false, true), // prime
        (true, true),
        (true, false),
        (false, false),
        (false, true), // threshold reached here, mid-detent
        (true, true),  // aligned: emit
    ];
    let mut dec = decoder(states);

    let got = dec.poll(Duration::from_millis(50)).expect("poll");
    assert_eq!(got, Some(Direction::Clockwise));
    assert_eq!(dec.poll(Duration::ZERO).expect("poll"), None);
}

#[test]
fn bouncing_lines_fall_back_to_last_raw_reading() {
    // hold = 1: every read differs from its double-read partner, so all
    // three consensus attempts fail and the seventh (raw) read is used.
    let mut states = vec![LO, LO]; // prime (one consensus pair)
    states.extend([
        (false, true),
        (true, false),
        (false, false),
        (false, true),
        (true, false),
        (false, false), // three disagreeing pairs
        (false, true),  // fallback raw read: a real first edge
    ]);
    // From here the remaining cycle, two agreeing reads per state.
    for s in [(true, true), (true, true), (true, false), (true, false), LO, LO] {
        states.push(s);
    }
    let pins = ScriptedPins::with_hold(states, 1);
    let mut dec =
        QuadratureDecoder::new(pins, 4, MonotonicClock::new()).expect("prime decoder");

    let got = dec.poll(Duration::from_millis(50)).expect("poll");
    assert_eq!(got, Some(Direction::Clockwise));
}

#[test]
fn unreadable_lines_are_an_error_not_no_movement() {
    assert!(QuadratureDecoder::new(FailingPins, 4, MonotonicClock::new()).is_err());

    // Lines that die after priming: the poll itself must fail.
    struct DyingPins {
        reads_left: u32,
    }
    impl EncoderPins for DyingPins {
        fn read_levels(
            &mut self,
        ) -> Result<(bool, bool), Box<dyn std::error::Error + Send + Sync>> {
            if self.reads_left == 0 {
                return Err(Box::new(std::io::Error::other("line gone")));
            }
            self.reads_left -= 1;
            Ok((false, false))
        }
    }

    let mut dec = QuadratureDecoder::new(DyingPins { reads_left: 2 }, 4, MonotonicClock::new())
        .expect("prime decoder");
    assert!(dec.poll(Duration::ZERO).is_err());
}

#[test]
fn event_pump_delivers_detents_to_the_consumer() {
    let mut states = vec![LO];
    states.extend(AB);
    let dec = decoder(states);

    let events = EncoderEvents::spawn(dec, Duration::from_millis(1)).expect("spawn pump");
    let deadline = std::time::Instant::now() + Duration::from_secs(1);
    let mut net = 0;
    while net == 0 && std::time::Instant::now() < deadline {
        net += events.drain_steps();
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(net, 1);
    drop(events); // joins the poll thread
}
