// Byte transport to the gate controller. The serial implementation lives in `serial`;
// tests drive the ingestion loop with in-memory transports.

mod serial;

pub use serial::{SerialConnector, SerialTransport};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport is closed")]
    Closed,
}

/// One open connection. Reads block for at most the transport's read timeout.
pub trait Transport: Send {
    fn is_open(&self) -> bool;

    /// Bytes that can be read without waiting.
    fn bytes_available(&mut self) -> Result<usize, TransportError>;

    /// Bytes up to and including the next `\n`. On a read timeout returns whatever arrived,
    /// possibly nothing.
    fn read_line(&mut self) -> Result<Vec<u8>, TransportError>;

    fn close(&mut self);
}

/// Opens transports on demand; one per connect.
pub trait Connector: Send + Sync {
    fn open(&self) -> Result<Box<dyn Transport>, TransportError>;

    /// Human-readable target, for logs and activity notes.
    fn describe(&self) -> String;
}
