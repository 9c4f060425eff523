//! Multiplexed sensor matrix scanner

use std::io;
use std::iter;
use std::process;

use rppal::gpio::Gpio;
use rppal::spi::SlaveSelect;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use muxscan::config::ScanConfig;
use muxscan::hw::{ADCChannel, ThreadDelay, MCP3208};
use muxscan::io::PinPlan;
use muxscan::matrix::{COLS, ROWS};
use muxscan::mux::Multiplexer;
use muxscan::output::{Delivery, FrameEmitter, SerialSink, StdoutSink};
use muxscan::scanner::MatrixScanner;
use muxscan::sim::{SimAnalog, SimLine};
use muxscan::Error;

mod opts;

fn main() {
    let configuration = match opts::parse() {
        Ok(configuration) => configuration,
        Err(opts::Error::Help(msg)) => {
            println!("{}", msg);
            process::exit(1);
        },
        Err(e) => {
            eprintln!("Initialization failed.\n{}", e);
            process::exit(1);
        },
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(configuration.log_level())
        .with_writer(io::stderr)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }

    info!("muxscan v{}", env!("CARGO_PKG_VERSION"));

    match run(&configuration) {
        Ok(frames) => info!(frames, "done"),
        Err(e) => {
            error!("Failed to start scanner: {}", e);
            process::exit(1);
        },
    }
}

fn run(configuration: &opts::Configuration) -> Result<u64, Error> {
    let scan_config = configuration.scan_config()?;
    info!(cycle_time = ?scan_config.cycle_time(), "blocking time per cycle");

    let mut emitter = build_emitter(configuration, &scan_config)?;

    if configuration.simulate() {
        info!("using simulated hardware");
        let mut scanner = MatrixScanner::with_config(
            Multiplexer::new("outer", SimLine::bank::<4>()),
            Multiplexer::new("inner", SimLine::bank::<4>()),
            simulated_input(&scan_config),
            ThreadDelay,
            &scan_config);
        return Ok(scanner.run(&mut emitter, configuration.cycles()));
    }

    let plan = PinPlan {
        outer: scan_config.outer_mux_pins,
        inner: scan_config.inner_mux_pins,
    };
    plan.check(configuration.get_wired())?;
    info!("\n{}", plan);

    let gpio = Gpio::new().map_err(muxscan::io::Error::from)?;
    let (outer_lines, inner_lines) = plan.claim(&gpio)?;
    let adc = MCP3208::open(SlaveSelect::Ss0, scan_config.spi_clock_hz)?;
    let input = ADCChannel::new(adc, scan_config.analog_channel)?;
    info!(channel = input.channel(), "converter ready");

    let mut scanner = MatrixScanner::with_config(
        Multiplexer::new("outer", outer_lines),
        Multiplexer::new("inner", inner_lines),
        input,
        ThreadDelay,
        &scan_config);
    Ok(scanner.run(&mut emitter, configuration.cycles()))
}

/// Compose the sinks: wired (or stdout when simulating), then the optional mirrors.
fn build_emitter(configuration: &opts::Configuration,
                 scan_config: &ScanConfig) -> Result<FrameEmitter, Error>
{
    let mut emitter = FrameEmitter::new();

    if configuration.simulate() {
        emitter.attach(Box::new(StdoutSink::new()), Delivery::Required);
    } else {
        let wired = SerialSink::open("wired", configuration.get_wired(), scan_config.line_speed)?;
        emitter.attach(Box::new(wired), Delivery::Required);
        if configuration.mirror_to_stdout() {
            emitter.attach(Box::new(StdoutSink::new()), Delivery::BestEffort);
        }
    }

    if let Some(uart) = configuration.get_wireless() {
        info!(name = %scan_config.wireless_name, path = uart.path(), "wireless sink enabled");
        let wireless = SerialSink::connect_later(&scan_config.wireless_name, uart, scan_config.line_speed);
        emitter.attach(Box::new(wireless), Delivery::BestEffort);
    }

    Ok(emitter)
}

/// Codes ramping across the grid, each repeated for every sample of its point.
fn simulated_input(scan_config: &ScanConfig) -> SimAnalog {
    let points = ROWS * COLS;
    let step = scan_config.max_raw_code as usize / (points - 1);
    let script = (0..points)
        .flat_map(|point| iter::repeat((point * step) as u16)
                  .take(scan_config.samples_per_point as usize))
        .collect();

    SimAnalog::scripted(script)
}
