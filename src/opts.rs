//! Runtime configuration options.

use std::env;
use std::fmt;
use std::fmt::Display;
use std::path::PathBuf;

use getopts::Options;
use tracing::Level;

use muxscan::config::{self, ScanConfig, WIRED_UART_PATH};
use muxscan::output::serial::UART;

type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug)]
pub enum Error {
    /// Parsing command line failed.
    CLI(getopts::Fail),
    /// User requested to see help, not run the program.
    Help(String),
    /// User passed an invalid option.
    Invalid(String),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::CLI(ref e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            CLI(ref e) => write!(f, "{}", e),
            Help(ref help_msg) => write!(f, "Program help:\n{}", help_msg),
            Invalid(ref opt) => write!(f, "Invalid option: {}", opt),
        }
    }
}

impl From<getopts::Fail> for Error {
    fn from(e: getopts::Fail) -> Error {
        Error::CLI(e)
    }
}

#[derive(Debug)]
pub struct Configuration {
    config_path: Option<PathBuf>,
    wired: UART,
    wireless: Option<UART>,
    stdout: bool,
    simulate: bool,
    cycles: Option<u64>,
    log_level: Level,
}

impl Configuration {
    /// Load the scan configuration, applying the JSON overrides if a file was given.
    pub fn scan_config(&self) -> std::result::Result<ScanConfig, config::Error> {
        match self.config_path {
            Some(ref path) => ScanConfig::from_file(path),
            None => Ok(ScanConfig::default()),
        }
    }

    pub fn get_wired(&self) -> &UART {
        &self.wired
    }

    pub fn get_wireless(&self) -> Option<&UART> {
        self.wireless.as_ref()
    }

    pub fn mirror_to_stdout(&self) -> bool {
        self.stdout
    }

    pub fn simulate(&self) -> bool {
        self.simulate
    }

    pub fn cycles(&self) -> Option<u64> {
        self.cycles
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }
}

fn create_options() -> Options {
    let mut opts = Options::new();
    opts.optopt("c", "config", "override scan settings from a JSON file", "FILE");
    opts.optopt("w", "wired", &format!("wired serial device (default: {})", WIRED_UART_PATH), "PATH");
    opts.optopt("b", "wireless", "mirror frames to a wireless serial device", "PATH");
    opts.optflag("", "stdout", "mirror frames to standard output");
    opts.optflag("", "simulate", "use simulated multiplexers and converter");
    opts.optopt("n", "cycles", "stop after N scan cycles", "N");
    opts.optopt("l", "log-level", "diagnostic verbosity (default: info)", "LEVEL");
    opts.optflag("h", "help", "show help");

    opts
}

pub fn parse() -> Result<Configuration> {
    let cli_args: Vec<String> = env::args().collect();
    parse_args(&cli_args)
}

fn parse_args(cli_args: &[String]) -> Result<Configuration> {
    let opts = create_options();
    let program = cli_args.get(0).map_or("muxscan", |p| p.as_str());
    let matches = opts.parse(cli_args.iter().skip(1))?;

    if matches.opt_present("h") {
        let brief = format!("Usage: {} [ options ]", program);
        return Err(Error::Help(opts.usage(&brief)));
    }
    if let Some(extra) = matches.free.get(0) {
        return Err(Error::Invalid(format!("unexpected argument '{}'", extra)));
    }

    let config_path = matches.opt_str("config")
        .map(PathBuf::from);

    let wired = matches.opt_str("wired")
        .map_or(UART::from(WIRED_UART_PATH), |p| UART::from(p.as_str()));

    let wireless = matches.opt_str("wireless")
        .map(|p| UART::from(p.as_str()));
    if wireless.as_ref() == Some(&wired) {
        return Err(Error::Invalid("wired and wireless sinks use the same device".to_string()));
    }

    let cycles = match matches.opt_str("cycles") {
        Some(n) => {
            let n = n.parse::<u64>()
                .map_err(|_e| Error::Invalid(format!("{} is not a cycle count", n)))?;
            Some(n)
        },
        None => None,
    };

    let log_level = match matches.opt_str("log-level") {
        Some(level) => level.parse::<Level>()
            .map_err(|_e| Error::Invalid(format!("{} is not a log level", level)))?,
        None => Level::INFO,
    };

    Ok(Configuration {
        config_path,
        wired,
        wireless,
        stdout: matches.opt_present("stdout"),
        simulate: matches.opt_present("simulate"),
        cycles,
        log_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("muxscan")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults() {
        let config = parse_args(&args(&[])).unwrap();
        assert_eq!(config.get_wired(), &UART::PL011);
        assert!(config.get_wireless().is_none());
        assert!(!config.mirror_to_stdout());
        assert!(!config.simulate());
        assert_eq!(config.cycles(), None);
        assert_eq!(config.log_level(), Level::INFO);
        assert_eq!(config.scan_config().unwrap(), ScanConfig::default());
    }

    #[test]
    fn wireless_and_cycles() {
        let config = parse_args(&args(&["-b", "/dev/rfcomm0", "-n", "10", "--simulate"])).unwrap();
        assert_eq!(config.get_wireless(), Some(&UART::Custom("/dev/rfcomm0".to_string())));
        assert_eq!(config.cycles(), Some(10));
        assert!(config.simulate());
    }

    #[test]
    fn help_requested() {
        assert!(matches!(parse_args(&args(&["-h"])), Err(Error::Help(_))));
    }

    #[test]
    fn bad_cycle_count() {
        assert!(matches!(parse_args(&args(&["-n", "many"])), Err(Error::Invalid(_))));
    }

    #[test]
    fn bad_log_level() {
        assert!(matches!(parse_args(&args(&["-l", "loud"])), Err(Error::Invalid(_))));
    }

    #[test]
    fn same_device_twice() {
        let r = parse_args(&args(&["-w", "/dev/ttyUSB0", "-b", "/dev/ttyUSB0"]));
        assert!(matches!(r, Err(Error::Invalid(_))));
    }

    #[test]
    fn missing_option_argument() {
        assert!(matches!(parse_args(&args(&["--cycles"])), Err(Error::CLI(_))));
    }

    #[test]
    fn missing_config_file() {
        let configuration = parse_args(&args(&["-c", "/nonexistent/muxscan.json"])).unwrap();
        assert!(matches!(configuration.scan_config(), Err(config::Error::IO(_))));
    }
}
