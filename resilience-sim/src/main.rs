// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Packet Resilience Simulator
//!
//! Streams FEC-protected audio packets over a lossy, jittery channel and
//! plays them out through the jitter buffer, one packet per tick. Prints a
//! JSON summary when the stream has drained.

mod channel;
mod session;

use anyhow::Result;
use channel::LossyChannel;
use packet_resilience::{
    new_block_decoder, new_block_encoder, ChannelLayout, DelayedReader, FecCodecConfig,
    FecScheme, Format, FormatMap, Identity, JitterBufferConfig, PacketQueue, PcmEncoding,
    PcmEndian, PcmFormat, SampleSpec, FLAG_AUDIO,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use resilience_config::AppConfig;
use resilience_logging::LogFormat;
use serde::Serialize;
use session::{BlockReceiver, BlockSender};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// First dynamic RTP payload type
const DYNAMIC_PAYLOAD_TYPE: u8 = 96;
/// Chance that two neighbouring symbols arrive swapped
const REORDER_RATE: f64 = 0.1;

/// Independent generators for payloads and for the channel, both derived
/// from one seed so a run can be replayed
fn seeded_rngs(seed: u64) -> (StdRng, StdRng) {
    (
        StdRng::seed_from_u64(seed),
        StdRng::seed_from_u64(seed.wrapping_add(1)),
    )
}

#[derive(Debug, Serialize)]
struct Summary {
    cname: String,
    ssrc: u32,
    payload_type: u8,
    scheme: String,
    source_block_length: usize,
    repair_block_length: usize,
    packets_sent: usize,
    symbols_dropped: usize,
    delivered: usize,
    repaired: usize,
    lost: usize,
    overflowed: usize,
    trimmed: usize,
    stranded: usize,
}

/// Find the format for the stream, registering a dynamic one if needed
fn resolve_format(formats: &FormatMap, spec: SampleSpec) -> Result<Format> {
    if let Some(format) = formats.find_by_spec(&spec) {
        return Ok(format);
    }

    let format = Format {
        payload_type: DYNAMIC_PAYLOAD_TYPE,
        pcm_format: PcmFormat {
            encoding: PcmEncoding::SInt16,
            endian: PcmEndian::Big,
        },
        sample_spec: spec,
        packet_flags: FLAG_AUDIO,
    };
    formats
        .add_format(format.clone())
        .map_err(|e| anyhow::anyhow!("Failed to register stream format: {}", e))?;

    info!(payload_type = format.payload_type, "Registered dynamic format");
    Ok(format)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    let log_format: LogFormat = config
        .log_format()
        .parse()
        .map_err(|e| anyhow::anyhow!("Failed to select log format: {}", e))?;
    resilience_logging::init("resilience-sim", config.log_level(), log_format);

    info!("Starting packet resilience simulation");

    let scheme: FecScheme = config
        .fec
        .scheme
        .parse()
        .map_err(|e| anyhow::anyhow!("Failed to select FEC scheme: {}", e))?;

    let sblen = config.fec.source_block_length;
    let mut rblen = config.fec.repair_block_length;
    if scheme == FecScheme::XorParity && rblen > 1 {
        warn!(requested = rblen, "XOR parity carries one repair symbol per block");
        rblen = 1;
    }
    if sblen
        .checked_add(rblen)
        .map_or(true, |n| n > scheme.max_block_length())
    {
        anyhow::bail!(
            "Block too long for {}: {} + {} > {}",
            scheme,
            sblen,
            rblen,
            scheme.max_block_length()
        );
    }

    let identity = Identity::new();
    let formats = FormatMap::new();
    let format = resolve_format(
        &formats,
        SampleSpec::new(config.stream.sample_rate, ChannelLayout::Stereo),
    )?;
    let spec = format.sample_spec;

    let packet_period = Duration::from_millis(config.stream.packet_duration_ms as u64);
    let packet_duration = spec.ns_to_stream_timestamp(packet_period).max(1);
    // L16: two bytes per sample
    let payload_size = packet_duration as usize * spec.num_channels() as usize * 2;

    info!(
        cname = identity.cname(),
        ssrc = identity.ssrc(),
        payload_type = format.payload_type,
        scheme = %scheme,
        sblen = sblen,
        rblen = rblen,
        packet_duration = packet_duration,
        payload_size = payload_size,
        loss_rate = config.sim.loss_rate,
        "Configuration loaded"
    );

    let seed = config.sim.seed.unwrap_or(identity.ssrc() as u64);
    info!(seed = seed, "Seeding payloads and channel");
    let (payload_rng, channel_rng) = seeded_rngs(seed);

    let codec_config = FecCodecConfig::default();
    let mut sender = BlockSender::new(
        new_block_encoder(scheme, &codec_config)?,
        payload_rng,
        rblen,
        payload_size,
        packet_duration,
    );

    let jitter_config = JitterBufferConfig {
        target_latency: Duration::from_millis(config.jitter.target_latency_ms),
    };
    let queue = PacketQueue::bounded(config.jitter.queue_capacity)?;
    let mut receiver = BlockReceiver::new(
        new_block_decoder(scheme, &codec_config)?,
        DelayedReader::with_config(queue, &jitter_config, spec),
        identity.ssrc(),
        packet_duration,
        format.packet_flags,
    );

    let mut channel = LossyChannel::new(channel_rng, config.sim.loss_rate, REORDER_RATE);

    let mut ticker = tokio::time::interval(packet_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    let total = config.sim.packets;
    let mut sent = 0usize;
    let mut captured = 0usize;

    loop {
        ticker.tick().await;

        // one packet of audio is captured per tick; a block leaves once full
        if sent < total {
            captured += 1;
            if captured == sblen || sent + captured == total {
                let block = sender.send_block(captured)?;
                let arrivals = channel.transmit(&block.symbols);
                receiver.receive_block(&block.header, arrivals)?;
                sent += captured;
                captured = 0;
            }
        }

        let released = receiver.poll()?;
        if released.is_none() && sent == total {
            break;
        }
    }

    let stats = receiver.stats().clone();
    let stranded = receiver.pending();
    let trimmed = receiver.trimmed();
    let summary = Summary {
        cname: identity.cname().to_string(),
        ssrc: identity.ssrc(),
        payload_type: format.payload_type,
        scheme: scheme.to_string(),
        source_block_length: sblen,
        repair_block_length: rblen,
        packets_sent: sent,
        symbols_dropped: channel.dropped(),
        delivered: stats.delivered,
        repaired: stats.repaired,
        lost: stats.lost,
        overflowed: stats.overflowed,
        trimmed,
        stranded,
    };

    info!(
        delivered = summary.delivered,
        repaired = summary.repaired,
        lost = summary.lost,
        trimmed = summary.trimmed,
        "Simulation finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
