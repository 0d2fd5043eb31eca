//! End-to-end spills: FPGA model, transfer core and host model together.
#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use emulator::{BoardSettings, Emulator, Scenario, SpillPlan};
use platform::memory_map::HANDOFF_COUNT_INDEX;
use transfer::{Action, Command, ErrorCode, RunState};

fn run(scenario: &Scenario) -> (Emulator, emulator::RunReport) {
    let mut emu = Emulator::new(&scenario.board).unwrap();
    let report = emu.run(scenario).unwrap();
    (emu, report)
}

fn load(json: &str) -> Scenario {
    Scenario::from_json(json).unwrap()
}

#[test]
fn test_nominal_scenario_file_delivers_every_word() {
    let scenario = load(include_str!("../scenarios/nominal.json"));
    let (emu, report) = run(&scenario);

    assert!(report.all_matched(), "{report}");
    for spill in &report.spills {
        assert!(spill.errors.is_empty(), "{report}");
        assert!(spill.closed_by_last_flush);
        assert_eq!(spill.final_state, "READY");
    }
    // 6 events of 250 words plus eventId: five full blocks and a short one
    assert_eq!(report.spills[0].received_words, 1506);
    assert_eq!(report.spills[0].blocks, 6);
    assert_eq!(emu.state(), RunState::Ready);
}

#[test]
fn test_zero_suppressed_words_never_reach_the_host() {
    let scenario =
        Scenario::new("zeros").with_spill(SpillPlan::new(20, 50).with_zero_fraction(0.5));
    let (_, report) = run(&scenario);

    let spill = &report.spills[0];
    assert!(spill.matched);
    assert_eq!(spill.words_suppressed, 20 * 25);
    assert_eq!(spill.received_words, 20 * 26);
    assert!(spill.received.chunks(26).all(|event| event[..25]
        .iter()
        .all(|&w| w != 0)));
}

#[test]
fn test_suppression_off_keeps_zero_words() {
    let scenario = Scenario::new("raw")
        .with_board(BoardSettings {
            zero_suppression: false,
            ..BoardSettings::default()
        })
        .with_spill(SpillPlan::new(4, 10).with_zero_fraction(0.5));
    let (_, report) = run(&scenario);

    let spill = &report.spills[0];
    assert!(spill.matched);
    assert_eq!(spill.received_words, 4 * 11);
    assert_eq!(spill.words_suppressed, 0);
}

#[test]
fn test_suppression_is_idempotent_on_dense_payloads() {
    let plan = SpillPlan::new(12, 33);
    let on = Scenario::new("on").with_spill(plan.clone());
    let off = Scenario::new("off")
        .with_board(BoardSettings {
            zero_suppression: false,
            ..BoardSettings::default()
        })
        .with_spill(plan);

    let (_, on) = run(&on);
    let (_, off) = run(&off);
    assert_eq!(on.spills[0].received, off.spills[0].received);
}

#[test]
fn test_overflow_scenario_keeps_what_fit_and_recovers() {
    let scenario = load(include_str!("../scenarios/overflow.json"));
    let (emu, report) = run(&scenario);

    let first = &report.spills[0];
    assert!(first.matched, "{report}");
    assert_eq!(first.events_stored, 10);
    assert_eq!(first.events_dropped, 1);
    assert_eq!(first.received_words, 1000);
    assert!(first.reported(ErrorCode::Overflow));
    // Notifications after the drop are refused while the spill is in overflow
    assert!(first.reported(ErrorCode::UnexpectedCommand));
    // Banks the controller never served stay full for the FPGA
    assert!(first.events_blocked > 0);
    assert_eq!(first.final_state, "READY");

    let second = &report.spills[1];
    assert!(second.matched);
    assert!(second.errors.is_empty());
    assert_eq!(second.events_stored, 5);
    assert_eq!(emu.state(), RunState::Ready);
}

#[test]
fn test_host_abandoning_a_spill_reports_incomplete_drain() {
    let scenario = load(include_str!("../scenarios/host_abandons.json"));
    let (_, report) = run(&scenario);

    let abandoned = &report.spills[0];
    assert!(abandoned.matched, "received data must be an in-order prefix");
    assert_eq!(abandoned.received_words, 50);
    assert_eq!(abandoned.expected_words, 4 * 41);
    assert!(abandoned.reported(ErrorCode::IncompleteDrain));
    assert_eq!(abandoned.final_state, "READY");

    // Implicit start: the first bank-ready opens the spill
    let implicit = &report.spills[1];
    assert!(implicit.matched);
    assert!(implicit.errors.is_empty());
    assert_eq!(implicit.received_words, 3 * 11);
}

#[test]
fn test_exact_multiple_ends_in_drain_wait() {
    // 1800 words in blocks of 300: six full blocks, then a zero count
    let scenario = Scenario::new("exact")
        .with_board(BoardSettings {
            block_size: Some(300),
            ..BoardSettings::default()
        })
        .with_spill(SpillPlan::new(6, 299));
    let (mut emu, report) = run(&scenario);

    let spill = &report.spills[0];
    assert!(spill.matched);
    assert_eq!(spill.blocks, 6);
    assert!(!spill.closed_by_last_flush);
    assert_eq!(emu.state(), RunState::DrainWait);
    assert_eq!(emu.board().dual_port().words()[HANDOFF_COUNT_INDEX], 0);

    // DRAIN_WAIT accepts neither LAST_FLUSH nor another FLUSH_BLOCK
    let last = emu.post(Command::LastFlush).unwrap();
    assert!(last.reported(ErrorCode::UnexpectedCommand));
    assert_eq!(emu.state(), RunState::DrainWait);

    // The next BEGIN_SPILL leaves it for READY, flagged as an incomplete drain
    let begin = emu.post(Command::BeginSpill).unwrap();
    assert!(matches!(begin.action, Action::SpillAbandoned { abandoned: 0 }));
    assert!(begin.reported(ErrorCode::IncompleteDrain));
    assert_eq!(emu.state(), RunState::Ready);

    // and the following spill still runs cleanly from the first bank
    let next = emu.run_spill(1, &SpillPlan::new(3, 5).implicit_start()).unwrap();
    assert!(next.matched);
    assert!(next.errors.is_empty());
    assert_eq!(next.received_words, 18);
}

#[test]
fn test_many_events_cycle_through_all_banks() {
    let scenario = Scenario::new("wrap").with_spill(SpillPlan::new(100, 7));
    let (emu, report) = run(&scenario);

    assert!(report.all_matched());
    assert_eq!(report.spills[0].events_stored, 100);
    assert_eq!(report.spills[0].events_blocked, 0);
    assert_eq!(emu.fpga().written(), 100);
}

#[test]
fn test_report_serialises_without_raw_data() {
    let scenario = Scenario::new("json").with_spill(SpillPlan::new(2, 3));
    let (_, report) = run(&scenario);
    let json = report.to_json().unwrap();
    assert!(json.contains("\"scenario\": \"json\""));
    assert!(json.contains("\"matched\": true"));
    assert!(!json.contains("\"received\":"));
}
