//! FEC Block Repair Integration Tests

use bytes::Bytes;
use packet_resilience::{
    decode_block, encode_block, new_block_decoder, new_block_encoder, BlockDecoder,
    ChannelLayout, DelayedReader, FecCodecConfig, FecScheme, Packet, PacketQueue, PacketReader,
    PacketWriter, ResilienceError, SampleSpec, FLAG_RESTORED,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn random_sources(rng: &mut StdRng, sblen: usize, payload_size: usize) -> Vec<Bytes> {
    (0..sblen)
        .map(|_| {
            let mut buf = vec![0u8; payload_size];
            rng.fill(&mut buf[..]);
            Bytes::from(buf)
        })
        .collect()
}

fn encoded_block(
    scheme: FecScheme,
    sources: &[Bytes],
    rblen: usize,
    payload_size: usize,
) -> Vec<Bytes> {
    let mut encoder = new_block_encoder(scheme, &FecCodecConfig::default()).unwrap();
    let repairs = encode_block(encoder.as_mut(), sources, rblen, payload_size).unwrap();
    sources.iter().cloned().chain(repairs).collect()
}

#[test]
fn test_four_plus_two_one_source_lost() {
    let mut rng = StdRng::seed_from_u64(21);
    let sources = random_sources(&mut rng, 4, 160);
    let block = encoded_block(FecScheme::ReedSolomon8m, &sources, 2, 160);

    let mut decoder = new_block_decoder(FecScheme::ReedSolomon8m, &FecCodecConfig::default()).unwrap();
    assert!(decoder.init_status().is_ok());
    assert!(decoder.max_block_length() >= 6);

    decoder.begin_block(4, 2, 160).unwrap();
    for (i, symbol) in block.iter().enumerate() {
        decoder.set_buffer(i, (i != 1).then(|| symbol.clone()));
    }

    assert_eq!(decoder.repair_buffer(1).as_ref(), Some(&sources[1]));
    decoder.end_block();
}

#[test]
fn test_reconstruction_with_enough_symbols() {
    let mut rng = StdRng::seed_from_u64(22);
    let mut decoder = new_block_decoder(FecScheme::ReedSolomon8m, &FecCodecConfig::default()).unwrap();

    for _ in 0..50 {
        let sblen = rng.gen_range(1..=30);
        let rblen = rng.gen_range(0..=15);
        let payload_size = rng.gen_range(1..=200);
        let sources = random_sources(&mut rng, sblen, payload_size);
        let block = encoded_block(FecScheme::ReedSolomon8m, &sources, rblen, payload_size);

        // drop up to rblen symbols anywhere in the block
        let mut order: Vec<usize> = (0..sblen + rblen).collect();
        order.shuffle(&mut rng);
        let lost = rng.gen_range(0..=rblen);
        let mut symbols: Vec<Option<Bytes>> = block.into_iter().map(Some).collect();
        for &i in &order[..lost] {
            symbols[i] = None;
        }

        let repaired = decode_block(decoder.as_mut(), &symbols, sblen, payload_size).unwrap();
        for (i, source) in sources.iter().enumerate() {
            assert_eq!(repaired[i].as_ref(), Some(source), "sblen={} rblen={} index={}", sblen, rblen, i);
        }
    }
}

#[test]
fn test_too_few_symbols_gives_none() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut decoder = new_block_decoder(FecScheme::ReedSolomon8m, &FecCodecConfig::default()).unwrap();

    for _ in 0..30 {
        let sblen = rng.gen_range(2..=20);
        let rblen = rng.gen_range(0..=10);
        let sources = random_sources(&mut rng, sblen, 32);
        let block = encoded_block(FecScheme::ReedSolomon8m, &sources, rblen, 32);

        // lose one more than the code can absorb, at least one of them a source
        let mut symbols: Vec<Option<Bytes>> = block.into_iter().map(Some).collect();
        let mut order: Vec<usize> = (1..sblen + rblen).collect();
        order.shuffle(&mut rng);
        symbols[0] = None;
        for &i in &order[..rblen] {
            symbols[i] = None;
        }

        let repaired = decode_block(decoder.as_mut(), &symbols, sblen, 32).unwrap();
        for i in 0..sblen {
            match &symbols[i] {
                Some(original) => assert_eq!(repaired[i].as_ref(), Some(original)),
                None => assert_eq!(repaired[i], None, "index {} should be unrecoverable", i),
            }
        }
    }
}

#[test]
fn test_schemes_are_interchangeable() {
    let mut rng = StdRng::seed_from_u64(24);
    let sources = random_sources(&mut rng, 8, 64);

    for scheme in [FecScheme::ReedSolomon8m, FecScheme::XorParity] {
        let block = encoded_block(scheme, &sources, 1, 64);
        let mut decoder: Box<dyn BlockDecoder> =
            new_block_decoder(scheme, &FecCodecConfig::default()).unwrap();

        let mut symbols: Vec<Option<Bytes>> = block.into_iter().map(Some).collect();
        symbols[5] = None;

        let repaired = decode_block(decoder.as_mut(), &symbols, 8, 64).unwrap();
        let expected: Vec<Option<Bytes>> = sources.iter().cloned().map(Some).collect();
        assert_eq!(repaired, expected, "scheme={}", scheme);
    }
}

#[test]
fn test_absurd_block_shape_is_bad_arg() {
    for scheme in [FecScheme::ReedSolomon8m, FecScheme::XorParity] {
        let config = FecCodecConfig::default();
        let mut decoder = new_block_decoder(scheme, &config).unwrap();
        let mut encoder = new_block_encoder(scheme, &config).unwrap();

        for (sblen, rblen) in [(usize::MAX, 2), (2, usize::MAX), (usize::MAX, usize::MAX)] {
            assert!(
                matches!(decoder.begin_block(sblen, rblen, 16), Err(ResilienceError::BadArg(_))),
                "scheme={} sblen={} rblen={}",
                scheme,
                sblen,
                rblen
            );
            assert!(matches!(encoder.begin_block(sblen, rblen, 16), Err(ResilienceError::BadArg(_))));
        }

        // still usable afterwards
        decoder.begin_block(4, 1, 16).unwrap();
        decoder.end_block();
    }
}

#[test]
fn test_decoder_reusable_across_blocks() {
    let mut rng = StdRng::seed_from_u64(25);
    let mut decoder = new_block_decoder(FecScheme::XorParity, &FecCodecConfig::default()).unwrap();

    for block_index in 0..20 {
        let sources = random_sources(&mut rng, 10, 20);
        let block = encoded_block(FecScheme::XorParity, &sources, 1, 20);

        let lost = block_index % 10;
        decoder.begin_block(10, 1, 20).unwrap();
        for (i, symbol) in block.iter().enumerate() {
            decoder.set_buffer(i, (i != lost).then(|| symbol.clone()));
        }
        assert_eq!(decoder.repair_buffer(lost).as_ref(), Some(&sources[lost]));
        decoder.end_block();
    }
}

#[test]
fn test_repaired_stream_through_jitter_buffer() {
    const SBLEN: usize = 10;
    const RBLEN: usize = 4;
    const PAYLOAD: usize = 48;
    const DURATION: u32 = 480;

    let mut rng = StdRng::seed_from_u64(26);
    let mut decoder = new_block_decoder(FecScheme::ReedSolomon8m, &FecCodecConfig::default()).unwrap();
    let spec = SampleSpec::new(48000, ChannelLayout::Mono);
    let mut reader = DelayedReader::new(PacketQueue::new(), Duration::from_millis(40), spec);

    let mut originals = Vec::new();
    let mut released = Vec::new();

    for block_index in 0..5 {
        let sources = random_sources(&mut rng, SBLEN, PAYLOAD);
        let block = encoded_block(FecScheme::ReedSolomon8m, &sources, RBLEN, PAYLOAD);

        let mut symbols: Vec<Option<Bytes>> = block.into_iter().map(Some).collect();
        for i in [1, 4, 7] {
            symbols[i] = None;
        }

        let repaired = decode_block(decoder.as_mut(), &symbols, SBLEN, PAYLOAD).unwrap();
        for (i, payload) in repaired.into_iter().enumerate() {
            let seqnum = (block_index * SBLEN + i) as u16;
            let payload = payload.expect("block should be repairable");
            let mut packet = Packet::new(seqnum, seqnum as u32 * DURATION, DURATION, payload);
            if symbols[i].is_none() {
                packet = packet.with_flags(FLAG_RESTORED);
            }
            originals.push(sources[i].clone());
            reader.get_mut().write(packet).unwrap();

            if let Some(p) = reader.read().unwrap() {
                released.push(p);
            }
        }
    }
    while let Some(p) = reader.read().unwrap() {
        released.push(p);
    }

    assert_eq!(released.len(), originals.len());
    for (packet, original) in released.iter().zip(&originals) {
        assert_eq!(&packet.payload, original, "seqnum={}", packet.seqnum);
    }
    assert_eq!(released.iter().filter(|p| p.has_flags(FLAG_RESTORED)).count(), 15);
}
