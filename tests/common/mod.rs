//! Shared test utilities for serial-stream tests.
//!
//! This module provides common test infrastructure including:
//! - Mock-backed streams with a handle kept for inspection
//! - Pseudo-terminal loopback pairs (unix)

#![allow(dead_code)]

use serial_stream::port::MockDevice;
use serial_stream::{OpenMode, SerialStreamBuf};

/// Open a stream over a fresh mock device and return both.
///
/// The returned device shares state with the one inside the stream.
pub fn open_mock(name: &str) -> (SerialStreamBuf<MockDevice>, MockDevice) {
    open_mock_device(MockDevice::new(name))
}

/// Open a stream over a mock whose writes loop back into its reads.
pub fn open_loopback(name: &str) -> (SerialStreamBuf<MockDevice>, MockDevice) {
    open_mock_device(MockDevice::loopback(name))
}

fn open_mock_device(device: MockDevice) -> (SerialStreamBuf<MockDevice>, MockDevice) {
    let mut stream = SerialStreamBuf::new();
    stream
        .attach(device.clone(), OpenMode::default())
        .expect("Failed to attach mock device");
    (stream, device)
}

/// Stream over the slave side of a pty, with the master acting as the
/// loopback peer.
#[cfg(unix)]
pub fn open_pty(
    params: &serial_stream::PortParameters,
) -> (
    SerialStreamBuf<serial_stream::TtyDevice>,
    serialport::TTYPort,
) {
    use serialport::SerialPort;
    use std::time::Duration;

    let (mut master, slave) = serialport::TTYPort::pair().expect("Failed to create pty pair");
    master
        .set_timeout(Duration::from_secs(2))
        .expect("Failed to set master timeout");

    let device =
        serial_stream::TtyDevice::from_port(slave, params).expect("Failed to configure pty slave");
    let mut stream = SerialStreamBuf::new();
    stream
        .attach(device, OpenMode::default())
        .expect("Failed to attach pty device");
    (stream, master)
}
