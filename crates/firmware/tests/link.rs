//! Host link end to end: bytes in, valve duties and telemetry out.
// Integration test file: unwrap/indexing are intentional test mechanisms.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
//!
//! Run with: cargo test -p firmware --test link

use embedded_hal_mock::eh1::delay::NoopDelay;
use firmware::link::{self, Dispatch, LinkFlags};
use firmware::valves::HIT_DUTY;
use firmware::{AcquisitionError, ChannelAction, Gain, Hx711Array, ValveBank, ValveCommands};
use platform::config::READY_TIMEOUT_US;
use platform::mocks::{MockPwmBank, SimulatedSensorBus};
use platform::CHANNEL_COUNT;
use protocol::{Command, CommandAssembler, ProtocolError, TelemetryFrame, CALIBRATE_MAGIC};

/// Feed `bytes` through an assembler and dispatch every completed frame.
fn receive(
    assembler: &mut CommandAssembler,
    bytes: &[u8],
    valves: &ValveCommands,
    flags: &LinkFlags,
) -> Vec<Dispatch> {
    bytes
        .iter()
        .filter_map(|&b| assembler.push(b))
        .map(|frame| link::dispatch(frame, valves, flags))
        .collect()
}

#[test]
fn valve_command_reaches_pwm() {
    let valves = ValveCommands::new();
    let flags = LinkFlags::new();
    let mut assembler = CommandAssembler::new();
    let mut bank = ValveBank::new(MockPwmBank::new());
    bank.init().unwrap();

    let mut actions = [ChannelAction::Nop; CHANNEL_COUNT];
    actions[1] = ChannelAction::Set;
    actions[7] = ChannelAction::Set;
    let frame = Command::SetValves(actions).encode();

    let outcomes = receive(&mut assembler, &frame, &valves, &flags);
    assert_eq!(outcomes, vec![Dispatch::Applied]);
    assert!(flags.take_ack());

    bank.tick(&valves).unwrap();
    let duties = bank.pwm().duties();
    assert_eq!(duties[1], HIT_DUTY);
    assert_eq!(duties[7], HIT_DUTY);
    assert_eq!(duties[0], 0);
}

#[test]
fn garbage_and_corruption_are_not_acknowledged() {
    let valves = ValveCommands::new();
    let flags = LinkFlags::new();
    let mut assembler = CommandAssembler::new();

    let mut corrupt = Command::SetValves([ChannelAction::Set; CHANNEL_COUNT]).encode();
    corrupt[5] ^= 0x01;

    let mut bytes = b"xyz".to_vec();
    bytes.extend_from_slice(&corrupt);
    let outcomes = receive(&mut assembler, &bytes, &valves, &flags);

    assert_eq!(outcomes, vec![Dispatch::Rejected(ProtocolError::BadCrc)]);
    assert_eq!(valves.state_bits(), 0);
    assert!(!flags.take_ack());
    assert_eq!(assembler.discarded(), 3);
}

#[test]
fn calibrate_tares_then_acknowledges() {
    let valves = ValveCommands::new();
    let flags = LinkFlags::new();
    let mut assembler = CommandAssembler::new();
    let bus = SimulatedSensorBus::with_constant([2_500; CHANNEL_COUNT]);
    let mut array = Hx711Array::new(bus.clock(), bus.port(), Gain::A128).unwrap();

    let outcomes = receive(&mut assembler, &CALIBRATE_MAGIC, &valves, &flags);
    assert_eq!(outcomes, vec![Dispatch::TareRequested]);
    assert!(!flags.take_ack(), "ACK waits for the tare to finish");

    assert!(link::service_tare(&mut array, &flags, &mut NoopDelay, READY_TIMEOUT_US).unwrap());
    assert!(flags.take_ack());
    assert_eq!(array.offsets(), [-2_500; CHANNEL_COUNT]);

    // Nothing pending: the next pass is a no-op.
    assert!(!link::service_tare(&mut array, &flags, &mut NoopDelay, READY_TIMEOUT_US).unwrap());
    assert!(!flags.take_ack());
}

#[test]
fn stalled_bus_ends_tare_without_ack() {
    let valves = ValveCommands::new();
    let flags = LinkFlags::new();
    let mut assembler = CommandAssembler::new();
    let bus = SimulatedSensorBus::with_constant([2_500; CHANNEL_COUNT]);
    let mut array = Hx711Array::new(bus.clock(), bus.port(), Gain::A128).unwrap();

    // A valve ACK is already waiting when the tare is requested.
    let mut actions = [ChannelAction::Nop; CHANNEL_COUNT];
    actions[0] = ChannelAction::Set;
    receive(&mut assembler, &Command::SetValves(actions).encode(), &valves, &flags);
    receive(&mut assembler, &CALIBRATE_MAGIC, &valves, &flags);

    bus.stall(true);
    let result = link::service_tare(&mut array, &flags, &mut NoopDelay, 200);

    assert_eq!(result, Err(AcquisitionError::Timeout));
    assert_eq!(array.offsets(), [0; CHANNEL_COUNT]);
    // Only the valve ACK is pending; the failed tare adds none.
    assert!(flags.take_ack());
    assert!(!flags.take_ack());
    // The request was consumed, so the next pass does not retry.
    assert!(!flags.take_tare_request());
}

#[test]
fn telemetry_reflects_pressures_and_valves() {
    let valves = ValveCommands::new();
    let flags = LinkFlags::new();
    let mut assembler = CommandAssembler::new();
    let bus = SimulatedSensorBus::with_constant([0, 0, 0, 1_000_000, 0, 0, 0, 0]);
    let array = Hx711Array::new(bus.clock(), bus.port(), Gain::A128).unwrap();

    let mut actions = [ChannelAction::Nop; CHANNEL_COUNT];
    actions[3] = ChannelAction::Set;
    receive(
        &mut assembler,
        &Command::SetValves(actions).encode(),
        &valves,
        &flags,
    );

    let bytes = link::telemetry(array.kpa_all(), &valves).encode();
    let frame = TelemetryFrame::decode(&bytes).unwrap();
    assert_eq!(frame.valve_bits, 0b0000_1000);
    assert_eq!(frame.pressures_kpa, array.kpa_all());
    assert!(frame.pressures_kpa[3] > 0.0);
}
