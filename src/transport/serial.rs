// Serial port transport via the serialport crate.

use std::io::{BufRead, BufReader, ErrorKind};
use std::time::Duration;

use serialport::SerialPort;
use tracing::info;

use super::{Connector, Transport, TransportError};
use crate::config::SerialConfig;

pub struct SerialConnector {
    config: SerialConfig,
}

impl SerialConnector {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }
}

impl Connector for SerialConnector {
    /// Opens the port, then waits `reset_delay_ms`: the board reboots when the port opens.
    fn open(&self) -> Result<Box<dyn Transport>, TransportError> {
        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .timeout(Duration::from_millis(self.config.read_timeout_ms))
            .open()
            .map_err(|source| TransportError::Open {
                port: self.config.port.clone(),
                source,
            })?;
        info!(
            port = %self.config.port,
            baud_rate = self.config.baud_rate,
            "serial port opened"
        );
        if self.config.reset_delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.reset_delay_ms));
        }
        Ok(Box::new(SerialTransport::new(port)))
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.config.port, self.config.baud_rate)
    }
}

pub struct SerialTransport {
    reader: Option<BufReader<Box<dyn SerialPort>>>,
}

impl SerialTransport {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            reader: Some(BufReader::new(port)),
        }
    }
}

impl Transport for SerialTransport {
    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        let reader = self.reader.as_ref().ok_or(TransportError::Closed)?;
        let pending = reader.get_ref().bytes_to_read()? as usize;
        Ok(reader.buffer().len() + pending)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        let reader = self.reader.as_mut().ok_or(TransportError::Closed)?;
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line) {
            Ok(_) => Ok(line),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(line),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) {
        // Dropping the port closes the file descriptor / handle.
        self.reader = None;
    }
}
