//! Jitter Buffer Integration Tests

use bytes::Bytes;
use packet_resilience::{
    ChannelLayout, DelayedReader, JitterBufferConfig, Packet, PacketQueue, PacketReader,
    PacketWriter, SampleSpec,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const RATE: u32 = 48000;
// 10ms at 48kHz
const PACKET_DURATION: u32 = 480;

fn spec() -> SampleSpec {
    SampleSpec::new(RATE, ChannelLayout::Stereo)
}

fn packet(seqnum: u16) -> Packet {
    Packet::new(
        seqnum,
        (seqnum as u32).wrapping_mul(PACKET_DURATION),
        PACKET_DURATION,
        Bytes::from(vec![0u8; 16]),
    )
}

#[test]
fn test_config_default_target() {
    let reader = DelayedReader::with_config(PacketQueue::new(), &JitterBufferConfig::default(), spec());
    assert_eq!(reader.target_delay(), 4 * PACKET_DURATION);
}

#[test]
fn test_forty_ms_scenario() {
    let mut reader = DelayedReader::new(PacketQueue::new(), Duration::from_millis(40), spec());

    let mut results = Vec::new();
    for seq in 0..4 {
        reader.get_mut().write(packet(seq)).unwrap();
        results.push(reader.read().unwrap().map(|p| p.seqnum));
    }

    assert_eq!(results, vec![None, None, None, Some(0)]);
    assert_eq!(reader.queued_duration(), 3 * PACKET_DURATION);
}

#[test]
fn test_never_releases_before_target() {
    let mut rng = StdRng::seed_from_u64(7);
    let target = Duration::from_millis(60);
    let mut reader = DelayedReader::new(PacketQueue::new(), target, spec());
    let delay = reader.target_delay();

    // heterogeneous packet durations
    let mut ts = 0u32;
    let mut seq = 0u16;
    loop {
        let duration = rng.gen_range(120..=960);
        reader
            .get_mut()
            .write(Packet::new(seq, ts, duration, Bytes::new()))
            .unwrap();
        ts = ts.wrapping_add(duration);
        seq += 1;

        let buffered = ts;
        match reader.read().unwrap() {
            None => {
                assert!(buffered < delay, "drained with {} buffered", buffered);
                assert!(!reader.is_started());
            }
            Some(_) => {
                assert!(buffered >= delay);
                assert!(reader.is_started());
                assert!(reader.queued_duration() < delay);
                break;
            }
        }
    }
}

#[test]
fn test_trim_bound_with_bursty_arrivals() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut reader = DelayedReader::new(PacketQueue::new(), Duration::from_millis(50), spec());
    let bound = reader.target_delay() + PACKET_DURATION;

    let mut next_seq = 0u16;
    for _ in 0..500 {
        for _ in 0..rng.gen_range(0..4) {
            reader.get_mut().write(packet(next_seq)).unwrap();
            next_seq = next_seq.wrapping_add(1);
        }

        let _ = reader.read().unwrap();
        if reader.is_started() {
            assert!(
                reader.queued_duration() <= bound,
                "queued {} over bound {}",
                reader.queued_duration(),
                bound
            );
        }
    }
}

#[test]
fn test_order_preserved() {
    let mut rng = StdRng::seed_from_u64(13);
    let mut reader = DelayedReader::new(PacketQueue::new(), Duration::from_millis(30), spec());

    let mut next_seq = 0u16;
    let mut released = Vec::new();
    for _ in 0..300 {
        for _ in 0..rng.gen_range(0..3) {
            reader.get_mut().write(packet(next_seq)).unwrap();
            next_seq += 1;
        }
        if let Some(p) = reader.read().unwrap() {
            released.push(p.seqnum);
        }
    }
    while let Some(p) = reader.read().unwrap() {
        released.push(p.seqnum);
    }

    assert!(!released.is_empty());
    assert!(released.windows(2).all(|w| w[0] < w[1]), "reordered: {:?}", released);
    assert_eq!(released.last().copied(), Some(next_seq - 1));
}

#[test]
fn test_steady_stream_loses_nothing() {
    let mut reader = DelayedReader::new(PacketQueue::new(), Duration::from_millis(30), spec());

    let mut released = Vec::new();
    for seq in 0..100 {
        reader.get_mut().write(packet(seq)).unwrap();
        if let Some(p) = reader.read().unwrap() {
            released.push(p.seqnum);
        }
    }

    let expected: Vec<u16> = (0..98).collect();
    assert_eq!(released, expected);
    // once the internal queue empties, the backlog stays upstream
    assert_eq!(reader.queued_packets(), 0);
    assert_eq!(reader.get_ref().len(), 2);
}

#[test]
fn test_drain_idempotence() {
    let mut reader = DelayedReader::new(PacketQueue::new(), Duration::from_millis(20), spec());
    reader.get_mut().write(packet(0)).unwrap();
    reader.get_mut().write(packet(1)).unwrap();
    assert!(reader.read().unwrap().is_some());
    assert!(reader.read().unwrap().is_some());

    for _ in 0..10 {
        assert_eq!(reader.read().unwrap(), None);
        assert_eq!(reader.queued_packets(), 0);
        assert_eq!(reader.queued_duration(), 0);
        assert!(reader.is_started());
    }
}

#[test]
fn test_chained_as_upstream() {
    let inner = DelayedReader::new(PacketQueue::new(), Duration::from_millis(20), spec());
    let boxed: Box<dyn PacketReader> = Box::new(inner);
    let mut outer = DelayedReader::new(boxed, Duration::from_millis(0), spec());

    // outer stage sees nothing until the inner stage has started
    assert_eq!(outer.read().unwrap(), None);
    assert!(outer.is_started());
    assert_eq!(outer.read().unwrap(), None);
}

#[test]
fn test_bounded_upstream_queue() {
    let queue = PacketQueue::bounded(8).unwrap();
    let mut reader = DelayedReader::new(queue, Duration::from_millis(40), spec());

    for seq in 0..8 {
        reader.get_mut().write(packet(seq)).unwrap();
    }
    assert!(reader.get_mut().write(packet(8)).is_err());

    // first read pulls everything and trims down to the target
    assert_eq!(reader.read().unwrap().map(|p| p.seqnum), Some(4));
    assert_eq!(reader.trimmed_packets(), 4);
    assert!(reader.get_mut().is_empty());
    reader.get_mut().write(packet(8)).unwrap();
}
