//! Utility functions for hardware testing.

#![allow(dead_code)]

use serial_stream::config::{ConfigLoader, TestingConfig};
use serial_stream::{
    CharacterSize, FlowControl, Parity, PortParameters, SerialStreamBuf, StopBits, TtyDevice,
};
use std::time::{Duration, Instant};

/// Testing section of the resolved configuration.
pub fn testing_config() -> TestingConfig {
    ConfigLoader::with_defaults().into_config().testing
}

/// Port path to test against, or `None` with a skip notice.
pub fn skip_without_hardware() -> Option<String> {
    let port = testing_config().port;
    if port.is_none() {
        println!("Skipping hardware test: TEST_PORT not set");
    }
    port
}

/// 8N1 at the configured test baud, with a VTIME read timeout derived from
/// the configured test timeout.
pub fn test_parameters(config: &TestingConfig) -> PortParameters {
    let deciseconds = (config.timeout_ms / 100).clamp(1, 255) as u8;
    PortParameters::new(
        config.baud_rate,
        CharacterSize::Eight,
        FlowControl::None,
        Parity::None,
        StopBits::One,
    )
    .with_vmin(0)
    .with_vtime(deciseconds)
}

/// Test fixture owning an open stream on the configured port.
pub struct PortTestFixture {
    pub stream: SerialStreamBuf<TtyDevice>,
    pub config: TestingConfig,
}

impl PortTestFixture {
    /// Open the configured port, or `None` when no port is configured.
    pub fn setup() -> Option<Self> {
        let config = testing_config();
        let port = config.port.clone()?;

        println!("Setting up test fixture for {} at {}", port, config.baud_rate);

        let stream = match SerialStreamBuf::with_parameters(&port, &test_parameters(&config)) {
            Ok(stream) => stream,
            Err(e) => {
                println!("Failed to open port: {}", e);
                return None;
            }
        };

        Some(Self { stream, config })
    }

    pub fn loopback_enabled(&self) -> bool {
        self.config.loopback_enabled
    }
}

/// Timing helper for measuring operation duration.
pub struct TimingHelper {
    start: Instant,
    name: String,
}

impl TimingHelper {
    pub fn new(name: &str) -> Self {
        println!("Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        println!("Completed: {} in {:?}", self.name, elapsed);
        elapsed
    }
}
