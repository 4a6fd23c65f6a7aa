//! Block, Burst, and Read-Conditional-Write Tests.
//!
//! Multi-beat transactions run the same lookup/allocate flow per
//! sub-transfer; responses come back in request order with the final beat
//! flagged, and a faulting beat terminates the sequence. RCW is a single
//! indivisible compare-and-swap returning the old value.

use crate::common::mocks::downstream::Op;
use crate::common::{direct_mapped_config, engine_with, read_req};
use cachesim_core::config::CacheConfig;
use cachesim_core::protocol::{ALL_BYTES, Request, Status};
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════
// 1. Block transfers
// ══════════════════════════════════════════════════════════

/// A cached block read fills once and answers in access-width beats.
#[test]
fn block_read_beats_in_order() {
    let (mut engine, fake) = engine_with(direct_mapped_config());

    let resp = engine.access(&Request::BlockRead {
        addr: 0x100,
        size: 16,
        attrs: None,
    });

    assert_eq!(resp.beats.len(), 4);
    for (i, beat) in resp.beats.iter().enumerate() {
        assert_eq!(beat.status, Status::Ok);
        assert_eq!(beat.data, fake.peek(0x100 + (i as u64) * 4, 4));
        assert_eq!(beat.last, i == 3, "only the final beat is flagged");
    }
    assert_eq!(
        fake.log(),
        vec![Op::BlockRead {
            addr: 0x100,
            size: 16
        }],
        "one fill serves every beat"
    );
}

/// A block write is processed per beat but acknowledged once.
#[test]
fn block_write_single_acknowledgement() {
    let (mut engine, fake) = engine_with(direct_mapped_config());

    let payload: Vec<u8> = (0x40u8..0x50).collect();
    let resp = engine.access(&Request::BlockWrite {
        addr: 0x100,
        data: payload.clone(),
        attrs: None,
    });

    assert_eq!(resp.beats.len(), 1);
    assert!(resp.beats[0].last);
    assert_eq!(resp.status(), Status::Ok);
    assert!(engine.is_line_dirty(0x100), "write-back block write dirties");
    assert_eq!(fake.op_count(), 1, "one fill, data deferred to eviction");
    assert_eq!(engine.access(&read_req(0x100, 16)).data(), payload);
}

// ══════════════════════════════════════════════════════════
// 2. Bursts
// ══════════════════════════════════════════════════════════

/// A burst read crossing a line boundary fills both lines and keeps beat
/// order.
#[test]
fn burst_read_crosses_lines() {
    let (mut engine, fake) = engine_with(direct_mapped_config());

    let resp = engine.access(&Request::BurstRead {
        addr: 0x100,
        size: 4,
        transfers: 8,
        attrs: None,
    });

    assert_eq!(resp.beats.len(), 8);
    assert_eq!(resp.data(), fake.peek(0x100, 32));
    assert!(resp.beats[7].last);
    assert_eq!(
        fake.log(),
        vec![
            Op::BlockRead {
                addr: 0x100,
                size: 16
            },
            Op::BlockRead {
                addr: 0x110,
                size: 16
            },
        ]
    );
}

/// A burst write applies each beat at its own address.
#[test]
fn burst_write_applies_each_beat() {
    let (mut engine, _fake) = engine_with(direct_mapped_config());

    let data: Vec<u8> = (0u8..8).collect();
    let resp = engine.access(&Request::BurstWrite {
        addr: 0x100,
        data: data.clone(),
        size: 4,
        transfers: 2,
        attrs: None,
    });

    assert_eq!(resp.beats.len(), 1);
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(engine.access(&read_req(0x100, 8)).data(), data);
}

/// A faulting beat terminates the sequence with its status on a flagged
/// final beat; earlier beats are preserved.
#[test]
fn burst_fault_terminates_sequence() {
    let (mut engine, fake) = engine_with(direct_mapped_config());
    fake.inject_fault(0x110);

    let resp = engine.access(&Request::BurstRead {
        addr: 0x100,
        size: 4,
        transfers: 8,
        attrs: None,
    });

    assert_eq!(resp.beats.len(), 5, "four good beats, then the fault");
    assert!(resp.beats[..4]
        .iter()
        .all(|beat| beat.status == Status::Ok));
    assert!(!resp.beats[3].last);
    assert_eq!(resp.beats[4].status, Status::AddressError);
    assert!(resp.beats[4].last, "the error beat closes the transfer");
}

// ══════════════════════════════════════════════════════════
// 3. Read-conditional-write
// ══════════════════════════════════════════════════════════

/// A matching RCW stores the new value and returns the old one.
#[test]
fn rcw_match_swaps_and_returns_old() {
    let (mut engine, fake) = engine_with(direct_mapped_config());
    let old = fake.peek(0x100, 4);

    let resp = engine.access(&Request::Rcw {
        addr: 0x100,
        compare: old.clone(),
        data: vec![0xAA; 4],
        byte_enables: ALL_BYTES,
        attrs: None,
    });

    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(resp.data(), old, "RCW returns the pre-swap value");
    assert!(engine.is_line_dirty(0x100), "conditional store dirties");
    assert_eq!(engine.access(&read_req(0x100, 4)).data(), vec![0xAA; 4]);
}

/// A mismatching RCW leaves the line untouched.
#[test]
fn rcw_mismatch_stores_nothing() {
    let (mut engine, fake) = engine_with(direct_mapped_config());
    let old = fake.peek(0x100, 4);

    let resp = engine.access(&Request::Rcw {
        addr: 0x100,
        compare: vec![0xFF; 4],
        data: vec![0xAA; 4],
        byte_enables: ALL_BYTES,
        attrs: None,
    });

    assert_eq!(resp.data(), old);
    assert!(!engine.is_line_dirty(0x100));
    assert_eq!(engine.access(&read_req(0x100, 4)).data(), old);
}

/// An RCW miss allocates like a read when read-allocate is on.
#[test]
fn rcw_miss_allocates() {
    let (mut engine, fake) = engine_with(direct_mapped_config());

    let _ = engine.access(&Request::Rcw {
        addr: 0x100,
        compare: fake.peek(0x100, 4),
        data: vec![0xBB; 4],
        byte_enables: ALL_BYTES,
        attrs: None,
    });

    assert_eq!(
        fake.log(),
        vec![Op::BlockRead {
            addr: 0x100,
            size: 16
        }]
    );
    assert!(engine.contains(0x100));
}

/// Without allocation, RCW performs the read-modify-write downstream.
#[test]
fn rcw_no_allocate_runs_downstream() {
    let config = CacheConfig {
        read_allocate: false,
        write_allocate: false,
        ..direct_mapped_config()
    };
    let (mut engine, fake) = engine_with(config);
    let old = fake.peek(0x100, 4);

    let resp = engine.access(&Request::Rcw {
        addr: 0x100,
        compare: old.clone(),
        data: vec![0xCC; 4],
        byte_enables: ALL_BYTES,
        attrs: None,
    });

    assert_eq!(resp.data(), old);
    assert_eq!(
        fake.log(),
        vec![
            Op::Read {
                addr: 0x100,
                size: 4
            },
            Op::Write { addr: 0x100, len: 4 },
        ]
    );
    assert_eq!(fake.peek(0x100, 4), vec![0xCC; 4]);
    assert!(!engine.contains(0x100));
}
