//! Serial port sinks.

use std::path::{Path, PathBuf};

use rppal::uart::{Parity, Uart};
use tracing::{debug, info, trace};

use super::{Error, LineSink, Result};

/// Defined UART interfaces.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UART {
    /// Full UART built into the Raspberry Pi.
    PL011,
    /// Other serial device, such as a USB adapter or an RFCOMM port.
    Custom(String),
}

impl UART {
    /// Path to the UART the variant refers to.
    pub fn path(&self) -> &str {
        use UART::*;
        match self {
            PL011 => "/dev/ttyAMA0",
            Custom(ref path) => path.as_ref(),
        }
    }
}

impl From<&str> for UART {
    fn from(path: &str) -> Self {
        if path == UART::PL011.path() {
            UART::PL011
        } else {
            UART::Custom(path.to_string())
        }
    }
}

/// Line sink writing to a serial device, 8N1.
///
/// A sink opened with [`SerialSink::open`] blocks until each line is queued.
/// A sink opened with [`SerialSink::connect_later`] never blocks: a line the device cannot take
/// in full fails with [`Error::Stalled`]. It also reopens its device before each line while
/// disconnected. Any other write error drops the device.
#[derive(Debug)]
pub struct SerialSink {
    name: String,
    path: PathBuf,
    line_speed: u32,
    blocking: bool,
    uart: Option<Uart>,
}

impl SerialSink {
    /// Open the device now, failing if it is unavailable.
    pub fn open(name: &str, uart: &UART, line_speed: u32) -> Result<SerialSink> {
        let path = PathBuf::from(uart.path());
        let port = Self::open_port(&path, line_speed, true)?;
        info!(sink = name, path = %path.display(), line_speed, "opened serial sink");

        Ok(SerialSink {
            name: name.to_string(),
            path,
            line_speed,
            blocking: true,
            uart: Some(port),
        })
    }

    /// Try to open the device, tolerating its absence.
    pub fn connect_later(name: &str, uart: &UART, line_speed: u32) -> SerialSink {
        let path = PathBuf::from(uart.path());
        let port = match Self::open_port(&path, line_speed, false) {
            Ok(port) => {
                info!(sink = name, path = %path.display(), "connected");
                Some(port)
            },
            Err(e) => {
                info!(sink = name, path = %path.display(), "not connected yet: {}", e);
                None
            },
        };

        SerialSink {
            name: name.to_string(),
            path,
            line_speed,
            blocking: false,
            uart: port,
        }
    }

    /// Returns true while a device is open.
    pub fn is_connected(&self) -> bool {
        self.uart.is_some()
    }

    fn open_port(path: &Path, line_speed: u32, blocking: bool) -> Result<Uart> {
        let mut uart = Uart::with_path(path, line_speed, Parity::None, 8, 1)?;
        uart.set_hardware_flow_control(false)?;
        uart.set_write_mode(blocking)?;
        Ok(uart)
    }

    fn port(&mut self) -> Result<&mut Uart> {
        if self.uart.is_none() {
            let port = Self::open_port(&self.path, self.line_speed, self.blocking)
                .map_err(|e| {
                    debug!(sink = %self.name, "reconnect failed: {}", e);
                    Error::Disconnected(self.name.clone())
                })?;
            info!(sink = %self.name, "reconnected");
            self.uart = Some(port);
        }

        match self.uart {
            Some(ref mut port) => Ok(port),
            None => Err(Error::Disconnected(self.name.clone())),
        }
    }
}

impl LineSink for SerialSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\r\n");

        let name = self.name.clone();
        let port = self.port()?;
        let mut written = 0;
        let result = loop {
            if written == data.len() {
                break Ok(());
            }
            // Only a non-blocking port reports 0; the rest of the line is dropped.
            match port.write(&data[written..]) {
                Ok(0) => break Err(Error::Stalled(name)),
                Ok(n) => written += n,
                Err(e) => break Err(Error::UART(e)),
            }
        };

        match result {
            Err(Error::Stalled(_)) => trace!(sink = %self.name, written, "output queue full"),
            Err(_) => self.uart = None,
            Ok(()) => (),
        }
        result
    }
}

/// Pseudo-terminal pairs standing in for serial devices.
#[cfg(test)]
pub(crate) mod pty {
    use std::ffi::CStr;
    use std::fs::File;
    use std::io;
    use std::io::Read;
    use std::os::unix::io::FromRawFd;

    /// Controlling side of a pseudo-terminal; `slave_path` is the device a sink opens.
    #[derive(Debug)]
    pub struct Pty {
        master: File,
        slave_path: String,
    }

    impl Pty {
        pub fn open() -> io::Result<Pty> {
            let fd = unsafe { libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY) };
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            let master = unsafe { File::from_raw_fd(fd) };

            if unsafe { libc::grantpt(fd) } != 0 || unsafe { libc::unlockpt(fd) } != 0 {
                return Err(io::Error::last_os_error());
            }

            let mut name = [0 as libc::c_char; 128];
            let rc = unsafe { libc::ptsname_r(fd, name.as_mut_ptr(), name.len()) };
            if rc != 0 {
                return Err(io::Error::from_raw_os_error(rc));
            }
            let slave_path = unsafe { CStr::from_ptr(name.as_ptr()) }
                .to_string_lossy()
                .into_owned();

            Ok(Pty { master, slave_path })
        }

        pub fn slave_path(&self) -> &str {
            &self.slave_path
        }

        /// Block until `len` bytes written to the slave side arrive.
        pub fn read_bytes(&mut self, len: usize) -> Vec<u8> {
            let mut buf = vec![0; len];
            self.master.read_exact(&mut buf).unwrap();
            buf
        }
    }
}
