//! Stress Tests - Push the lot to its limits.
//!
//! These tests verify correctness under extreme conditions:
//! - Full-capacity operation
//! - Heavy churn on a nearly full lot
//! - Many check-ins of the same plate
//! - Degenerate configurations (all VIP, no VIP, single slot)

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use smart_park::{AllocationManager, Command, Engine, OutputEvent, Rejected};
use std::collections::HashSet;
use std::time::{Duration, Instant};

// ============================================================================
// Capacity Stress Tests
// ============================================================================

#[test]
fn test_thousand_slot_lot_fills_exactly() {
    let mut lot = AllocationManager::in_memory(1000, 100).unwrap();

    // 900 regular then 100 VIP
    for i in 0..900 {
        assert!(lot.check_in(&format!("R{i}"), false).is_ok(), "regular {i} should park");
    }
    for i in 0..100 {
        assert!(lot.check_in(&format!("V{i}"), true).is_ok(), "VIP {i} should park");
    }

    assert_eq!(lot.occupied(), 1000);
    assert_eq!(lot.check_in("LATE", false), Err(Rejected::NoAvailableSlot));
    assert_eq!(lot.check_in("LATE-VIP", true), Err(Rejected::NoAvailableSlot));
    assert_eq!(lot.ledger().len(), 1000);
}

#[test]
fn test_full_lot_assigns_every_id_once() {
    let mut lot = AllocationManager::in_memory(1000, 100).unwrap();
    let mut seen = HashSet::new();

    for i in 0..1000 {
        let slot = lot.check_in(&format!("P{i}"), i >= 900).unwrap();
        assert!(seen.insert(slot), "slot {slot} assigned twice");
    }
    assert_eq!(seen, (1..=1000).collect::<HashSet<_>>());
}

#[test]
fn test_reuse_after_check_out() {
    let mut lot = AllocationManager::in_memory(100, 10).unwrap();
    for i in 0..90 {
        lot.check_in(&format!("R{i}"), false).unwrap();
    }
    assert_eq!(lot.check_in("EXTRA", false), Err(Rejected::NoAvailableSlot));

    let freed = lot.check_out("R50").unwrap();
    assert_eq!(freed, 51);
    assert_eq!(lot.check_in("EXTRA", false), Ok(51));
}

// ============================================================================
// Churn Tests
// ============================================================================

#[test]
fn test_random_churn_never_double_assigns() {
    let mut lot = AllocationManager::in_memory(300, 30).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut parked: Vec<(String, u32)> = Vec::new();
    let mut next = 0u64;

    for _ in 0..20_000 {
        if parked.is_empty() || rng.gen_bool(0.55) {
            next += 1;
            let plate = format!("C{next}");
            let vip = rng.gen_bool(0.15);
            match lot.check_in(&plate, vip) {
                Ok(slot) => {
                    assert!(
                        parked.iter().all(|(_, s)| *s != slot),
                        "slot {slot} handed out while occupied"
                    );
                    parked.push((plate, slot));
                }
                Err(reason) => assert_eq!(reason, Rejected::NoAvailableSlot),
            }
        } else {
            let idx = rng.gen_range(0..parked.len());
            let (plate, slot) = parked.swap_remove(idx);
            assert_eq!(lot.check_out(&plate), Ok(slot));
        }

        assert_eq!(lot.occupied(), parked.len());
        assert_eq!(lot.free_regular() + lot.free_vip() + lot.occupied(), 300);
    }

    assert_eq!(lot.ledger().open_entries().count(), parked.len());
}

/// Time `cycles` check-in/check-out pairs on a small lot
fn timed_cycles(lot: &mut AllocationManager, from: usize, cycles: usize) -> Duration {
    let start = Instant::now();
    for i in from..from + cycles {
        let plate = format!("H{i}");
        let slot = lot.check_in(&plate, i % 5 == 0).unwrap();
        assert_eq!(lot.check_out(&plate), Ok(slot));
    }
    start.elapsed()
}

#[test]
fn test_check_out_cost_flat_as_history_grows() {
    let mut lot = AllocationManager::in_memory(64, 8).unwrap();
    // A few long stays so every check-out has open neighbours in the ledger
    for i in 0..20 {
        lot.check_in(&format!("LONG{i}"), false).unwrap();
    }

    const CHUNK: usize = 10_000;
    let early = timed_cycles(&mut lot, 0, CHUNK);
    timed_cycles(&mut lot, CHUNK, 15 * CHUNK);
    let late = timed_cycles(&mut lot, 16 * CHUNK, CHUNK);

    assert_eq!(lot.ledger().len(), 20 + 17 * CHUNK);
    assert_eq!(lot.ledger().open_count(), 20);
    // History is 16x longer for the late chunk; a scan per operation
    // would show up as a comparable slowdown
    assert!(
        late < early * 6 + Duration::from_millis(50),
        "late chunk {late:?} vs early chunk {early:?}"
    );
}

#[test]
fn test_vip_always_lowest_free_id() {
    let mut lot = AllocationManager::in_memory(64, 64).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut parked: Vec<String> = Vec::new();

    for i in 0..5_000 {
        if parked.is_empty() || rng.gen_bool(0.5) {
            let expected = lot.free_vip_ids().first().copied();
            let plate = format!("V{i}");
            match lot.check_in(&plate, true) {
                Ok(slot) => {
                    assert_eq!(Some(slot), expected);
                    parked.push(plate);
                }
                Err(_) => assert!(expected.is_none()),
            }
        } else {
            let idx = rng.gen_range(0..parked.len());
            let plate = parked.swap_remove(idx);
            lot.check_out(&plate).unwrap();
        }
    }
}

#[test]
fn test_same_plate_many_times() {
    let mut lot = AllocationManager::in_memory(50, 0).unwrap();
    let slots: Vec<_> = (0..50).map(|_| lot.check_in("FLEET", false).unwrap()).collect();
    assert_eq!(lot.check_in("FLEET", false), Err(Rejected::NoAvailableSlot));

    // Check-outs release in check-in order
    let released: Vec<_> = (0..50).map(|_| lot.check_out("FLEET").unwrap()).collect();
    assert_eq!(released, slots);
    assert_eq!(lot.check_out("FLEET"), Err(Rejected::NotParked));
}

// ============================================================================
// Degenerate Configurations
// ============================================================================

#[test]
fn test_all_vip_lot() {
    let mut lot = AllocationManager::in_memory(5, 5).unwrap();
    assert_eq!(lot.check_in("R", false), Err(Rejected::NoAvailableSlot));
    assert_eq!(lot.check_in("V", true), Ok(1));
}

#[test]
fn test_no_vip_lot() {
    let mut lot = AllocationManager::in_memory(5, 0).unwrap();
    assert_eq!(lot.check_in("V", true), Err(Rejected::NoAvailableSlot));
    assert_eq!(lot.check_in("R", false), Ok(1));
}

#[test]
fn test_single_slot_ping_pong() {
    let mut engine = Engine::new(AllocationManager::in_memory(1, 0).unwrap());
    for i in 0..1_000 {
        let plate = format!("S{i}");
        let parked = engine.process_command(Command::check_in(plate.clone(), false));
        assert!(matches!(parked, OutputEvent::Parked { slot_id: 1, .. }));
        let released = engine.process_command(Command::check_out(plate));
        assert!(matches!(released, OutputEvent::Released { slot_id: 1, .. }));
    }
    assert_eq!(engine.stats().rejected, 0);
    assert_eq!(engine.lot.ledger().len(), 1_000);
}

#[test]
fn test_empty_plate_rejected_in_any_state() {
    let mut lot = AllocationManager::in_memory(2, 1).unwrap();
    for state in 0..3 {
        assert_eq!(lot.check_in("", state % 2 == 0), Err(Rejected::InvalidInput));
        assert_eq!(lot.check_in(" ", true), Err(Rejected::InvalidInput));
        let _ = lot.check_in(&format!("FILL{state}"), state == 0);
    }
    // Lot is full now and blank plates still report InvalidInput
    assert_eq!(lot.check_in("", false), Err(Rejected::InvalidInput));
    assert_eq!(lot.check_in("", true), Err(Rejected::InvalidInput));
}
