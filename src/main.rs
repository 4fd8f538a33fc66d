//! # Efergy Codec
//!
//! Loopback link and frame decoder for Efergy E2 sensor frames.
//!
//! `efergy-codec [CONFIG]` transmits the configured sensor frame through a
//! simulated PWM timer into a receiver and prints every frame the consumer
//! picks up. `efergy-codec decode BITS...` decodes 64-bit strings directly.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinError;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use efergy_codec::config::{Config, SensorConfig};
use efergy_codec::protocol::layout::{DEFAULT_REFERENCE_VOLTAGE, SYNC_PATTERN};
use efergy_codec::protocol::{Frame, FrameRecord, WaveformTiming};
use efergy_codec::rx::{FrameMailbox, Receiver};
use efergy_codec::telemetry::Reading;
use efergy_codec::tx::sim::run_transmission;
use efergy_codec::tx::{SimulatedTimer, Transmitter};

/// Number of received frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 100;

/// How readings are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Jsonl,
    Text,
}

impl OutputFormat {
    fn from_config(format: &str) -> Self {
        match format {
            "text" => OutputFormat::Text,
            _ => OutputFormat::Jsonl,
        }
    }
}

/// What the command line asked for
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Loopback(Option<String>),
    Decode(Vec<String>),
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command> {
    let mut args = args.into_iter();
    match args.next() {
        Some(arg) if arg == "decode" => {
            let bits: Vec<String> = args.collect();
            if bits.is_empty() {
                bail!("usage: efergy-codec decode BITS...");
            }
            Ok(Command::Decode(bits))
        }
        Some(path) => {
            if args.next().is_some() {
                bail!("usage: efergy-codec [CONFIG] | efergy-codec decode BITS...");
            }
            Ok(Command::Loopback(Some(path)))
        }
        None => Ok(Command::Loopback(None)),
    }
}

/// Build the sealed frame the simulated sensor transmits
fn sensor_frame(sensor: &SensorConfig) -> Frame {
    FrameRecord {
        sync: SYNC_PATTERN,
        id: sensor.id,
        pairing: sensor.pairing,
        interval_code: sensor.interval_code,
        battery_ok: sensor.battery_ok,
        unused: 0,
        current_raw: sensor.current_raw,
        exponent: sensor.exponent,
        checksum: 0,
    }
    .sealed()
    .encode()
}

/// Write one reading to `out` in the requested format
async fn emit_reading<W>(out: &mut W, reading: &Reading, format: OutputFormat) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if !reading.checksum_ok {
        warn!("Checksum mismatch on frame from sensor {}", reading.sensor_id);
    }
    if reading.current_ma.is_none() {
        warn!("Exponent {} out of range, current not available", reading.exponent);
    }

    let text = match format {
        OutputFormat::Jsonl => reading.to_json_line()?,
        OutputFormat::Text => reading.to_string(),
    };

    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

/// Take a completed frame from the mailbox, if any, and emit it
///
/// Returns whether a frame was consumed.
async fn poll_mailbox<W>(
    mailbox: &FrameMailbox,
    reference_voltage: u32,
    format: OutputFormat,
    out: &mut W,
) -> Result<bool>
where
    W: AsyncWrite + Unpin,
{
    let Some(frame) = mailbox.take() else {
        return Ok(false);
    };

    let reading = Reading::from_frame(frame, reference_voltage, Utc::now());
    emit_reading(out, &reading, format).await?;
    Ok(true)
}

/// Decode each bit string and write one reading per line
async fn decode_bits<W>(bits: &[String], format: OutputFormat, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    for text in bits {
        let frame = text
            .parse::<Frame>()
            .with_context(|| format!("cannot decode '{}'", text))?;
        let reading = Reading::from_frame(frame, DEFAULT_REFERENCE_VOLTAGE, Utc::now());
        emit_reading(out, &reading, format).await?;
    }
    Ok(())
}

/// Transmit `frame` every `period` and feed the line into `receiver`
async fn run_producer(
    mut transmitter: Transmitter<SimulatedTimer>,
    mut receiver: Receiver,
    frame: Frame,
    period: Duration,
) {
    let gap_ticks = period.as_micros() as u64 * u64::from(transmitter.timing().clock_hz) / 1_000_000;
    let mut ticker = interval(period);

    loop {
        ticker.tick().await;

        transmitter.send(frame);
        let periods = run_transmission(&mut transmitter);
        let edges = transmitter.channel_mut().drain_edges();
        debug!("Transmitted frame in {} periods ({} edges)", periods, edges.len());

        for (edge, timestamp_us) in edges {
            receiver.on_edge(edge, timestamp_us);
        }

        transmitter.channel_mut().idle(gap_ticks);
    }
}

/// Error for a transmit task that ended on its own
fn producer_stopped(result: std::result::Result<(), JoinError>) -> anyhow::Error {
    match result {
        Ok(()) => anyhow!("transmit task exited"),
        Err(e) => anyhow!("transmit task failed: {}", e),
    }
}

async fn run_loopback(config: Config) -> Result<()> {
    let timing = WaveformTiming::from_clock(config.transmitter.timer_clock_hz)?;
    let timer = SimulatedTimer::new(timing.clock_hz).with_latency(
        config.simulation.rise_latency_us,
        config.simulation.fall_latency_us,
    );
    let transmitter = Transmitter::new(timer, timing);
    info!("Transmitting on output channel {}", config.transmitter.output_channel);

    let mailbox = Arc::new(FrameMailbox::new());
    let receiver = Receiver::new(config.receiver.input_pin, Arc::clone(&mailbox));

    let frame = sensor_frame(&config.sensor);
    info!("Simulated sensor {} frame: {}", config.sensor.id, frame);

    let mut producer = tokio::spawn(run_producer(
        transmitter,
        receiver,
        frame,
        Duration::from_millis(config.sensor.transmit_interval_ms),
    ));

    let format = OutputFormat::from_config(&config.output.format);
    let mut poll = interval(Duration::from_millis(config.receiver.poll_interval_ms));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stdout = tokio::io::stdout();

    info!(
        "Polling for frames every {}ms, transmitting every {}ms",
        config.receiver.poll_interval_ms, config.sensor.transmit_interval_ms
    );
    info!("Press Ctrl+C to exit");

    let mut frame_count: u64 = 0;

    loop {
        tokio::select! {
            _ = poll.tick() => {
                if poll_mailbox(&mailbox, config.sensor.reference_voltage, format, &mut stdout).await? {
                    frame_count += 1;

                    if frame_count % LOG_INTERVAL_FRAMES == 0 {
                        info!("Received {} frames ({} completed by receiver)",
                            frame_count, mailbox.completed());
                    }
                }
            }

            // The producer only ends by failing
            result = &mut producer => {
                let err = producer_stopped(result);
                error!("{}", err);
                return Err(err);
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total frames received: {}", frame_count);
                break;
            }
        }
    }

    producer.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging on a background writer
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .with_writer(writer)
        .init();

    info!("Efergy Codec v{} starting...", env!("CARGO_PKG_VERSION"));

    match parse_args(std::env::args().skip(1))? {
        Command::Decode(bits) => {
            let mut stdout = tokio::io::stdout();
            decode_bits(&bits, OutputFormat::Jsonl, &mut stdout).await
        }
        Command::Loopback(path) => {
            let config = match path {
                Some(path) => {
                    info!("Loading configuration from {}", path);
                    Config::load(&path).with_context(|| format!("failed to load {}", path))?
                }
                None => {
                    info!("No configuration file given, using defaults");
                    Config::default()
                }
            };
            run_loopback(config).await
        }
    }
}
