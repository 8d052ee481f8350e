#[cfg(test)]
mod tests {
    use crate::bus::{AccessKind, BusAccess};
    use crate::{Bench, BenchError, Milestone};
    use serdiv_sequence::regs;
    use serdiv_sequence::{
        MmioBus, StallPoint, Stalled, QUOTIENT_PROBE, REMAINDER_PROBE, ROUTING_PROBE,
        SMOKE_DIVIDEND, SMOKE_DIVISOR,
    };

    const BUDGET: u32 = 4096;

    fn write_idx(journal: &[BusAccess], addr: u32, value: u32) -> usize {
        journal
            .iter()
            .position(|a| a.kind == AccessKind::Write && a.addr == addr && a.value == value)
            .unwrap_or_else(|| panic!("no write of {value:#x} to {addr:#010x}"))
    }

    fn read_idx(journal: &[BusAccess], addr: u32, value: u32) -> usize {
        journal
            .iter()
            .position(|a| a.kind == AccessKind::Read && a.addr == addr && a.value == value)
            .unwrap_or_else(|| panic!("no read of {value:#x} from {addr:#010x}"))
    }

    // Drive a divide through the CSRs directly, bounded so a model bug
    // cannot hang the test.
    fn divide(bench: &mut Bench, dividend: u32, divisor: u32) {
        bench.bus.write(regs::DIVIDEND, dividend);
        bench.bus.write(regs::DIVISOR, divisor);
        bench.bus.write(regs::START, 1);
        for _ in 0..200 {
            if bench.bus.read(regs::FINI) == 1 {
                return;
            }
        }
        panic!("divide did not complete");
    }

    #[test]
    fn full_run_confirms_routing_and_emits_both_markers() {
        let mut bench = Bench::new();
        let report = bench.run_smoke(BUDGET).unwrap();

        assert!(report.routing_confirmed);
        assert_eq!(
            report.milestones,
            vec![Milestone::TestStart, Milestone::TestPass]
        );
        // The capture side really saw the routing probe.
        assert_eq!(bench.bus.try_read(regs::la_data(0)).unwrap(), ROUTING_PROBE);
    }

    #[test]
    fn broken_routing_withholds_pass_marker() {
        let mut bench = Bench::new();
        bench.break_default_routing();
        let report = bench.run_smoke(BUDGET).unwrap();

        assert!(!report.routing_confirmed);
        assert_eq!(report.milestones, vec![Milestone::TestStart]);
    }

    #[test]
    fn divide_issues_exact_operands_and_fetches_both_results() {
        let mut bench = Bench::new();
        bench.run_smoke(BUDGET).unwrap();
        let journal = bench.bus.journal();

        let dividend = write_idx(journal, regs::DIVIDEND, SMOKE_DIVIDEND);
        let divisor = write_idx(journal, regs::DIVISOR, SMOKE_DIVISOR);
        let start = write_idx(journal, regs::START, 1);
        let fini = read_idx(journal, regs::FINI, 1);
        // 0x40 / 0x8 = 8 rem 0, fetched in that order after completion.
        let quotient = read_idx(journal, regs::QUOTIENT, 8);
        let remainder = read_idx(journal, regs::REMAINDER, 0);

        assert!(dividend < divisor);
        assert!(divisor < start);
        assert!(start < fini);
        assert!(fini < quotient);
        assert!(quotient < remainder);
    }

    #[test]
    fn result_writes_ignored_while_debug_clear() {
        let mut bench = Bench::new();
        divide(&mut bench, 9, 2);

        assert_eq!(bench.bus.read(regs::QUOTIENT), 4);
        assert_eq!(bench.bus.read(regs::REMAINDER), 1);

        bench.bus.write(regs::QUOTIENT, QUOTIENT_PROBE);
        bench.bus.write(regs::REMAINDER, REMAINDER_PROBE);

        assert_eq!(bench.bus.read(regs::QUOTIENT), 4);
        assert_eq!(bench.bus.read(regs::REMAINDER), 1);
    }

    #[test]
    fn result_writes_land_while_debug_set() {
        let mut bench = Bench::new();
        divide(&mut bench, 9, 2);

        bench.bus.write(regs::DEBUG, 1);
        bench.bus.write(regs::QUOTIENT, QUOTIENT_PROBE);
        bench.bus.write(regs::REMAINDER, REMAINDER_PROBE);

        assert_eq!(bench.bus.read(regs::QUOTIENT), QUOTIENT_PROBE);
        assert_eq!(bench.bus.read(regs::REMAINDER), REMAINDER_PROBE);
    }

    #[test]
    fn debug_flag_clears_on_read() {
        let mut bench = Bench::new();
        bench.bus.write(regs::DEBUG, 1);

        assert_eq!(bench.bus.read(regs::DEBUG), 1);
        // Second immediate read must see the cleared flag.
        assert_eq!(bench.bus.read(regs::DEBUG), 0);

        // And the write gate is shut again.
        bench.bus.write(regs::QUOTIENT, 0x55);
        assert_ne!(bench.bus.read(regs::QUOTIENT), 0x55);
    }

    #[test]
    fn commit_poll_spins_until_transfer_completes() {
        let mut bench = Bench::with_timing(5, 32);
        bench.run_smoke(BUDGET).unwrap();

        // The transfer takes 5 cycles; the poll saw it pending for 4 reads
        // and moved on with the clearing read.
        assert_eq!(bench.pin_config().pending_commit_reads(), 4);

        let journal = bench.bus.journal();
        let commit = write_idx(journal, regs::XFER, 1);
        let polls = &journal[commit + 1..commit + 6];
        for access in &polls[..4] {
            assert_eq!((access.kind, access.addr, access.value), (AccessKind::Read, regs::XFER, 1));
        }
        assert_eq!(polls[4].value, 0);

        // Staged modes latched at the transition.
        let applied = bench.pin_config().applied_modes();
        assert!(applied[16..].iter().all(|&m| m == regs::MGMT_STD_OUTPUT));
        assert!(applied[..16].iter().all(|&m| m == regs::USER_STD_OUTPUT));
    }

    #[test]
    fn pin_modes_all_written_before_commit() {
        let mut bench = Bench::new();
        bench.run_smoke(BUDGET).unwrap();
        let journal = bench.bus.journal();

        let commit = write_idx(journal, regs::XFER, 1);
        let mut previous = None;
        // Highest pad first, every mode write ahead of the commit pulse.
        for pin in (0..regs::PIN_COUNT).rev() {
            let mode = if pin >= 16 {
                regs::MGMT_STD_OUTPUT
            } else {
                regs::USER_STD_OUTPUT
            };
            let idx = write_idx(journal, regs::pin_mode(pin), mode);
            assert!(idx < commit, "pin {pin} configured after the commit pulse");
            if let Some(previous) = previous {
                assert!(previous < idx, "pin {pin} configured out of order");
            }
            previous = Some(idx);
        }
    }

    #[test]
    fn stuck_commit_exhausts_poll_budget() {
        let mut bench = Bench::new();
        bench.stick_commit();
        let err = bench.run_smoke(32).unwrap_err();

        assert!(matches!(
            err,
            BenchError::SequenceStalled(Stalled(StallPoint::ConfigCommit))
        ));
        assert!(bench.milestones().is_empty());
        // Nothing past the commit may have run.
        let journal = bench.bus.journal();
        assert!(journal
            .iter()
            .all(|a| !(regs::LA_BASE..regs::LA_BASE + regs::LA_SIZE).contains(&a.addr)));
    }

    #[test]
    fn stuck_divider_exhausts_poll_budget() {
        let mut bench = Bench::new();
        bench.stick_divider();
        let err = bench.run_smoke(64).unwrap_err();

        assert!(matches!(
            err,
            BenchError::SequenceStalled(Stalled(StallPoint::DivideCompletion))
        ));
        // The start marker is out, the pass marker is not.
        assert_eq!(bench.milestones(), vec![Milestone::TestStart]);
        assert!(!bench
            .bus
            .journal()
            .iter()
            .any(|a| a.kind == AccessKind::Read && a.addr == regs::QUOTIENT));
    }

    #[test]
    fn divider_holds_fini_low_for_bit_serial_latency() {
        let mut bench = Bench::with_timing(1, 8);
        bench.bus.write(regs::DIVIDEND, 100);
        bench.bus.write(regs::DIVISOR, 7);
        bench.bus.write(regs::START, 1);

        let mut pending_reads = 0;
        loop {
            if bench.bus.read(regs::FINI) == 1 {
                break;
            }
            pending_reads += 1;
            assert!(pending_reads < 100, "divide never completed");
        }
        // One quotient bit per cycle: busy for latency - 1 polls (the start
        // write itself costs the first cycle).
        assert_eq!(pending_reads, 7);
        assert_eq!(bench.bus.read(regs::QUOTIENT), 14);
        assert_eq!(bench.bus.read(regs::REMAINDER), 2);
    }

    #[test]
    fn divide_by_zero_follows_core_convention() {
        let mut bench = Bench::with_timing(1, 4);
        divide(&mut bench, 5, 0);

        assert_eq!(bench.bus.read(regs::QUOTIENT), u32::MAX);
        assert_eq!(bench.bus.read(regs::REMAINDER), 5);
    }

    #[test]
    fn divisor_publishes_to_la_channel_zero() {
        let mut bench = Bench::new();
        bench.bus.write(regs::la_ena(0), regs::LA_ALL_INPUTS);
        bench.bus.write(regs::DIVISOR, 0x1234_5678);
        assert_eq!(bench.bus.read(regs::la_data(0)), 0x1234_5678);

        // Severed routing keeps the old capture.
        bench.break_default_routing();
        bench.bus.write(regs::DIVISOR, 0x9);
        assert_eq!(bench.bus.read(regs::la_data(0)), 0x1234_5678);
    }

    #[test]
    fn la_mixes_driven_and_captured_lanes() {
        let mut bench = Bench::new();
        bench.bus.write(regs::la_ena(2), 0xFFFF_FFFC);
        bench.bus.write(regs::la_data(2), 0x3);
        assert_eq!(bench.bus.read(regs::la_data(2)), 0x3);

        // All lanes captured again: nothing external drives channel 2.
        bench.bus.write(regs::la_ena(2), regs::LA_ALL_INPUTS);
        assert_eq!(bench.bus.read(regs::la_data(2)), 0);
    }

    #[test]
    fn harness_lane_signaling_recorded() {
        let mut bench = Bench::new();
        bench.run_smoke(BUDGET).unwrap();

        let la = bench.logic_analyzer();
        assert_eq!(la.channel_enable(2), 0xFFFF_FFFC);
        assert_eq!(la.channel_enable(1), regs::LA_ALL_INPUTS);
        assert_eq!(la.driven(2), 0x3);
        assert_eq!(la.driven(1), regs::ACTIVE_LANE);
        assert_eq!(bench.divider().start_pulses(), 1);
    }

    #[test]
    fn sw_blinky_lights_on_write_and_clears_on_read() {
        let mut bench = Bench::new();
        bench.bus.write(regs::SW_BLINKY, 1);
        assert!(bench.divider().led_on());

        assert_eq!(bench.bus.read(regs::SW_BLINKY), 1);
        assert!(!bench.divider().led_on());
        assert_eq!(bench.bus.read(regs::SW_BLINKY), 0);
    }

    #[test]
    fn unmapped_access_reads_zero_and_latches_fault() {
        let mut bench = Bench::new();
        assert!(matches!(
            bench.bus.try_read(0x4000_0000),
            Err(BenchError::UnmappedAccess(0x4000_0000))
        ));

        assert_eq!(bench.bus.read(0x4000_0000), 0);
        assert!(matches!(
            bench.bus.take_fault(),
            Some(BenchError::UnmappedAccess(0x4000_0000))
        ));
    }
}
