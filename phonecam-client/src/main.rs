//! PhoneCam client entry point.
//!
//! ```text
//! phonecam-client                    Connect with defaults
//! phonecam-client --config <path>    Use custom config TOML
//! phonecam-client --usb              Connect through a forwarded USB port
//! phonecam-client --gen-config       Dump default config and exit
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use phonecam_core::{
    FramePipeline, FrameSink, LatestFrameCache, NullSink, RawVideoSink, Resolution, StreamHandle,
};

use phonecam_client::config::{ClientConfig, Mode, OutputConfig};
use phonecam_client::preview::PreviewMonitor;
use phonecam_client::target;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "phonecam-client", about = "Phone camera stream receiver")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "phonecam-client.toml")]
    config: PathBuf,

    /// Phone address (overrides config). Implies network mode.
    #[arg(long)]
    host: Option<String>,

    /// Phone port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Connect to the USB-forwarded port on the loopback interface.
    #[arg(long, conflicts_with = "host")]
    usb: bool,

    /// Do not open the output device even if one is configured.
    #[arg(long)]
    no_sink: bool,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.host {
            config.network.mode = Mode::Network;
            config.network.host = host.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if self.usb {
            config.network.mode = Mode::Usb;
        }
        if self.no_sink {
            config.output.device.clear();
        }
    }
}

/// Open the configured output device, or fall back to no output.
fn open_sink(output: &OutputConfig) -> Box<dyn FrameSink> {
    if output.device.is_empty() {
        info!("no output device configured; preview only");
        return Box::new(NullSink);
    }

    let resolution = Resolution::new(output.width, output.height);
    match RawVideoSink::open(&output.device, resolution) {
        Ok(sink) => Box::new(sink.with_max_fps(output.fps)),
        Err(e) => {
            warn!("{e}; continuing without output device");
            Box::new(NullSink)
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ClientConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = ClientConfig::load(&cli.config);
    cli.apply(&mut config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("phonecam-client v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Resolve the target ───────────────────────────────────

    let stream_config = target::stream_config(&config)?;
    info!(
        "streaming from {} ({:?} mode)",
        stream_config.endpoint, config.network.mode
    );

    // ── 2. Start the worker ─────────────────────────────────────

    let cache = LatestFrameCache::new();
    let pipeline = FramePipeline::new(cache.clone()).with_sink(open_sink(&config.output));
    let handle = StreamHandle::start(stream_config, pipeline)?;

    // ── 3. Preview consumer ─────────────────────────────────────

    let cancel = CancellationToken::new();
    let preview = tokio::spawn(PreviewMonitor::new(cache, &config.preview).run(cancel.clone()));

    // ── 4. Wait for Ctrl-C ──────────────────────────────────────

    let mut state_rx = handle.state_receiver();
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("failed to listen for Ctrl-C: {e}");
                }
                break;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                info!("connection: {}", *state_rx.borrow_and_update());
            }
        }
    }

    // ── 5. Shutdown ─────────────────────────────────────────────

    info!("shutting down");
    let stats_rx = handle.stats_receiver();
    cancel.cancel();
    let stopped = handle.stop().await;
    if tokio::time::timeout(Duration::from_secs(1), preview).await.is_err() {
        warn!("preview monitor did not stop in time");
    }

    // Read after the worker has exited so the summary includes its last updates.
    let stats = stats_rx.borrow().clone();
    info!(
        "received {} frames ({} dropped, {} bytes) over {} connections",
        stats.total_frames, stats.dropped_frames, stats.total_bytes, stats.connects
    );
    stopped?;
    Ok(())
}
