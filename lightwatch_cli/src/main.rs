//! lightwatch: samples a light level at a fixed rate, detects transient
//! dips each second, serves the collected data over UDP, and watches a
//! rotary encoder for detent events.

mod cli;
mod report;
mod rt;

use clap::Parser;
use eyre::{Result, WrapErr};
use lightwatch_config::Config;
use lightwatch_core::buffer::SampleBuffer;
use lightwatch_core::dips::{DipConfig, count_dips};
use lightwatch_core::encoder::{EncoderEvents, QuadratureDecoder};
use lightwatch_core::sampler::Sampler;
use lightwatch_core::server::CommandServer;
use lightwatch_core::shutdown::ShutdownFlag;
use lightwatch_traits::{EncoderPins, LightSensor, MonotonicClock};
use std::time::{Duration, Instant};

/// Encoder poll window per check; the original orchestrator polled at 10 ms.
const ENCODER_POLL: Duration = Duration::from_millis(10);
/// Orchestrator wakeup while waiting out the one-second window.
const LOOP_SLICE: Duration = Duration::from_millis(50);
/// Samples settle before the first swap so `history` is never empty at
/// startup.
const STARTUP_SETTLE: Duration = Duration::from_millis(600);

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = cli::Cli::parse();
    let _log_guard = init_tracing(&args)?;

    let config = load_config(&args)?;
    rt::setup_rt_once(args.rt, args.rt_prio);

    let shutdown = ShutdownFlag::new();
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.request()).wrap_err("installing signal handler")?;
    }

    let dip_config = DipConfig {
        trigger_delta: config.dips.trigger_delta,
        release_delta: config.dips.release_delta,
        min_width: config.dips.min_width,
        min_gap: config.dips.min_gap,
    };

    let buffer = SampleBuffer::default();
    let sensor = build_sensor(&args, &config)?;
    let mut sampler =
        Sampler::start_with_buffer(sensor, config.sampler.rate_hz, MonotonicClock::new(), buffer.clone())
            .wrap_err("starting sampler")?;

    let mut server = CommandServer::start(config.server.port, buffer.clone(), shutdown.clone())
        .wrap_err("starting command server")?;

    let pins = build_encoder_pins(&args, &config)?;
    let decoder = QuadratureDecoder::new(pins, config.encoder.edges_per_detent, MonotonicClock::new())
        .wrap_err("priming quadrature decoder")?;
    let events = EncoderEvents::spawn(decoder, ENCODER_POLL).wrap_err("starting encoder poll")?;

    tracing::info!(
        port = config.server.port,
        rate_hz = config.sampler.rate_hz,
        sim = is_simulated(&args),
        "lightwatch running; Ctrl+C or 'stop' to end"
    );

    // Let the first window partially fill so early queries see data.
    std::thread::sleep(STARTUP_SETTLE);
    buffer.swap_to_history();

    run_orchestrator(&buffer, &events, &dip_config, &shutdown);

    server.stop();
    sampler.stop();
    drop(events);
    println!("Done.");
    Ok(())
}

/// Once per second: swap the window, analyse it with the configured
/// thresholds, report, and drain encoder events.
fn run_orchestrator(
    buffer: &SampleBuffer,
    events: &EncoderEvents,
    dip_config: &DipConfig,
    shutdown: &ShutdownFlag,
) {
    while !shutdown.is_requested() {
        let window_start = Instant::now();
        let mut net_steps = 0i32;
        while window_start.elapsed() < Duration::from_secs(1) {
            if shutdown.is_requested() {
                return;
            }
            net_steps += events.drain_steps();
            std::thread::sleep(LOOP_SLICE);
        }
        net_steps += events.drain_steps();

        buffer.swap_to_history();
        let history = buffer.history();
        let average = buffer.average();
        let dips = count_dips(&history, average, dip_config);

        if net_steps != 0 {
            tracing::info!(net_steps, "encoder detents this window");
        }
        println!("{}", report::summary_line(history.len(), average, dips, net_steps));
        println!("{}", report::preview_line(&history));
    }
}

fn load_config(args: &cli::Cli) -> Result<Config> {
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        tracing::debug!(path = %args.config.display(), "config file absent, using defaults");
        Config::default()
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(rate_hz) = args.rate_hz {
        config.sampler.rate_hz = rate_hz;
    }
    if let Some(v) = args.dip_trigger {
        config.dips.trigger_delta = v;
    }
    if let Some(v) = args.dip_release {
        config.dips.release_delta = v;
    }
    if let Some(v) = args.dip_width {
        config.dips.min_width = v;
    }
    if let Some(v) = args.dip_gap {
        config.dips.min_gap = v;
    }
    if let Some(pin) = args.line_a {
        config.encoder.line_a = pin;
    }
    if let Some(pin) = args.line_b {
        config.encoder.line_b = pin;
    }
    if let Some(edges) = args.edges {
        config.encoder.edges_per_detent = edges;
    }
    config.validate()?;
    Ok(config)
}

fn is_simulated(args: &cli::Cli) -> bool {
    args.sim || cfg!(not(feature = "hardware"))
}

#[cfg(feature = "hardware")]
fn build_sensor(args: &cli::Cli, config: &Config) -> Result<Box<dyn LightSensor + Send>> {
    if args.sim {
        return Ok(Box::new(lightwatch_hardware::SimulatedLightSensor::new()));
    }
    let sensor = lightwatch_hardware::mcp3208::Mcp3208LightSensor::open(
        config.sensor.channel,
        config.sensor.vref_volts,
    )
    .wrap_err("opening MCP3208 light sensor")?;
    Ok(Box::new(sensor))
}

#[cfg(not(feature = "hardware"))]
fn build_sensor(_args: &cli::Cli, _config: &Config) -> Result<Box<dyn LightSensor + Send>> {
    Ok(Box::new(lightwatch_hardware::SimulatedLightSensor::new()))
}

#[cfg(feature = "hardware")]
fn build_encoder_pins(args: &cli::Cli, config: &Config) -> Result<Box<dyn EncoderPins + Send>> {
    if args.sim {
        return Ok(Box::new(lightwatch_hardware::SimulatedEncoder::new(400)));
    }
    let pins =
        lightwatch_hardware::mcp3208::GpioEncoderPins::new(config.encoder.line_a, config.encoder.line_b)
            .wrap_err("requesting encoder GPIO lines")?;
    Ok(Box::new(pins))
}

#[cfg(not(feature = "hardware"))]
fn build_encoder_pins(_args: &cli::Cli, _config: &Config) -> Result<Box<dyn EncoderPins + Send>> {
    Ok(Box::new(lightwatch_hardware::SimulatedEncoder::new(400)))
}

fn init_tracing(args: &cli::Cli) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    // The logging section has to be known before the config is properly
    // loaded and reported on; peek at the file, ignoring errors here (they
    // resurface with context from load_config).
    let logging = if args.config.exists() {
        Config::load(&args.config).map(|c| c.logging).unwrap_or_default()
    } else {
        lightwatch_config::Logging::default()
    };

    // Precedence: RUST_LOG, then an explicit --log-level, then the config
    // file, then the built-in default.
    let level = if args.log_level != "info" {
        args.log_level.clone()
    } else {
        logging.level.unwrap_or_else(|| args.log_level.clone())
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let log_file = logging.file;

    match log_file {
        Some(path) => {
            let (dir, name) = match path.rsplit_once('/') {
                Some((dir, name)) => (dir.to_string(), name.to_string()),
                None => (".".to_string(), path),
            };
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}
