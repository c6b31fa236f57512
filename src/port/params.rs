//! Symbolic serial port parameters.
//!
//! Every parameter is a closed enumeration; callers never hand raw integers
//! to the driver. Each enum's `Default` impl stands in for the "use the
//! default" sentinel and is resolved into a concrete [`PortParameters`]
//! before any device is touched.

use super::error::{PortError, PortResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

macro_rules! baud_rates {
    ($($variant:ident => $bps:literal),+ $(,)?) => {
        /// Supported line speeds.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u32", into = "u32")]
        pub enum BaudRate {
            $($variant,)+
        }

        impl BaudRate {
            /// Every supported rate, slowest first.
            pub const ALL: &'static [BaudRate] = &[$(BaudRate::$variant,)+];

            /// Bits per second.
            pub const fn bps(self) -> u32 {
                match self {
                    $(BaudRate::$variant => $bps,)+
                }
            }

            /// Look up the symbolic rate for a numeric speed.
            pub fn from_bps(bps: u32) -> Option<Self> {
                match bps {
                    $($bps => Some(BaudRate::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

baud_rates! {
    Baud50 => 50,
    Baud75 => 75,
    Baud110 => 110,
    Baud134 => 134,
    Baud150 => 150,
    Baud200 => 200,
    Baud300 => 300,
    Baud600 => 600,
    Baud1200 => 1200,
    Baud1800 => 1800,
    Baud2400 => 2400,
    Baud4800 => 4800,
    Baud9600 => 9600,
    Baud19200 => 19200,
    Baud38400 => 38400,
    Baud57600 => 57600,
    Baud115200 => 115200,
    Baud230400 => 230400,
    Baud460800 => 460800,
    Baud500000 => 500000,
    Baud576000 => 576000,
    Baud921600 => 921600,
    Baud1000000 => 1000000,
    Baud1152000 => 1152000,
    Baud1500000 => 1500000,
    Baud2000000 => 2000000,
    Baud2500000 => 2500000,
    Baud3000000 => 3000000,
    Baud3500000 => 3500000,
    Baud4000000 => 4000000,
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::Baud115200
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = PortError;

    fn try_from(bps: u32) -> PortResult<Self> {
        Self::from_bps(bps).ok_or_else(|| PortError::invalid(format!("unsupported baud rate {bps}")))
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.bps()
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bps())
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CharacterSize {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

impl CharacterSize {
    pub const ALL: &'static [CharacterSize] = &[Self::Five, Self::Six, Self::Seven, Self::Eight];

    pub const fn bits(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }
}

impl TryFrom<u8> for CharacterSize {
    type Error = PortError;

    fn try_from(bits: u8) -> PortResult<Self> {
        match bits {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            _ => Err(PortError::invalid(format!("unsupported character size {bits}"))),
        }
    }
}

impl From<CharacterSize> for u8 {
    fn from(size: CharacterSize) -> Self {
        size.bits()
    }
}

impl From<CharacterSize> for serialport::DataBits {
    fn from(size: CharacterSize) -> Self {
        match size {
            CharacterSize::Five => serialport::DataBits::Five,
            CharacterSize::Six => serialport::DataBits::Six,
            CharacterSize::Seven => serialport::DataBits::Seven,
            CharacterSize::Eight => serialport::DataBits::Eight,
        }
    }
}

impl From<serialport::DataBits> for CharacterSize {
    fn from(bits: serialport::DataBits) -> Self {
        match bits {
            serialport::DataBits::Five => CharacterSize::Five,
            serialport::DataBits::Six => CharacterSize::Six,
            serialport::DataBits::Seven => CharacterSize::Seven,
            serialport::DataBits::Eight => CharacterSize::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    #[default]
    None,
    Hardware,
    Software,
}

impl FlowControl {
    pub const ALL: &'static [FlowControl] = &[Self::None, Self::Hardware, Self::Software];
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

impl From<serialport::FlowControl> for FlowControl {
    fn from(flow: serialport::FlowControl) -> Self {
        match flow {
            serialport::FlowControl::None => FlowControl::None,
            serialport::FlowControl::Software => FlowControl::Software,
            serialport::FlowControl::Hardware => FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl Parity {
    pub const ALL: &'static [Parity] = &[Self::None, Self::Odd, Self::Even];
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

impl From<serialport::Parity> for Parity {
    fn from(parity: serialport::Parity) -> Self {
        match parity {
            serialport::Parity::None => Parity::None,
            serialport::Parity::Odd => Parity::Odd,
            serialport::Parity::Even => Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl StopBits {
    pub const ALL: &'static [StopBits] = &[Self::One, Self::Two];
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

impl From<serialport::StopBits> for StopBits {
    fn from(bits: serialport::StopBits) -> Self {
        match bits {
            serialport::StopBits::One => StopBits::One,
            serialport::StopBits::Two => StopBits::Two,
        }
    }
}

/// Directions a port is opened for.
///
/// ```
/// use serial_stream::OpenMode;
///
/// let mode = OpenMode::READ | OpenMode::WRITE;
/// assert_eq!(mode, OpenMode::default());
/// assert!(mode.is_readable() && mode.is_writable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpenMode {
    read: bool,
    write: bool,
}

impl OpenMode {
    pub const READ: OpenMode = OpenMode {
        read: true,
        write: false,
    };
    pub const WRITE: OpenMode = OpenMode {
        read: false,
        write: true,
    };
    pub const READ_WRITE: OpenMode = OpenMode {
        read: true,
        write: true,
    };

    /// A mode with neither direction set. Opening with it fails.
    pub const fn empty() -> Self {
        OpenMode {
            read: false,
            write: false,
        }
    }

    pub const fn is_readable(self) -> bool {
        self.read
    }

    pub const fn is_writable(self) -> bool {
        self.write
    }

    pub const fn is_empty(self) -> bool {
        !self.read && !self.write
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::READ_WRITE
    }
}

impl BitOr for OpenMode {
    type Output = OpenMode;

    fn bitor(self, rhs: OpenMode) -> OpenMode {
        OpenMode {
            read: self.read || rhs.read,
            write: self.write || rhs.write,
        }
    }
}

/// Default minimum byte count for non-canonical reads.
pub const DEFAULT_VMIN: u8 = 1;

/// Default inter-byte timeout for non-canonical reads, in deciseconds.
pub const DEFAULT_VTIME: u8 = 0;

/// Complete, concrete parameter set for a serial port.
///
/// `vmin` and `vtime` map directly onto the termios `VMIN`/`VTIME` control
/// characters:
///
/// | vmin | vtime | read(2) behaviour |
/// |------|-------|-------------------|
/// | 0    | 0     | return immediately with whatever is queued |
/// | >0   | 0     | block until `vmin` bytes are queued |
/// | 0    | >0    | wait up to `vtime` deciseconds for any byte |
/// | >0   | >0    | inter-byte timer armed after the first byte |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortParameters {
    pub baud_rate: BaudRate,
    pub character_size: CharacterSize,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    pub vmin: u8,
    pub vtime: u8,
}

impl Default for PortParameters {
    fn default() -> Self {
        Self {
            baud_rate: BaudRate::default(),
            character_size: CharacterSize::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            flow_control: FlowControl::default(),
            vmin: DEFAULT_VMIN,
            vtime: DEFAULT_VTIME,
        }
    }
}

impl PortParameters {
    /// Build a parameter set in the same order the stream constructor takes them.
    pub fn new(
        baud_rate: BaudRate,
        character_size: CharacterSize,
        flow_control: FlowControl,
        parity: Parity,
        stop_bits: StopBits,
    ) -> Self {
        Self {
            baud_rate,
            character_size,
            flow_control,
            parity,
            stop_bits,
            ..Self::default()
        }
    }

    pub fn with_vmin(mut self, vmin: u8) -> Self {
        self.vmin = vmin;
        self
    }

    pub fn with_vtime(mut self, vtime: u8) -> Self {
        self.vtime = vtime;
        self
    }
}

/// Narrow a caller-supplied control character value to the `cc_t` range.
pub(crate) fn control_char(name: &str, value: u16) -> PortResult<u8> {
    u8::try_from(value)
        .map_err(|_| PortError::invalid(format!("{name} {value} exceeds the device limit of 255")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters() {
        let params = PortParameters::default();
        assert_eq!(params.baud_rate, BaudRate::Baud115200);
        assert_eq!(params.character_size, CharacterSize::Eight);
        assert_eq!(params.flow_control, FlowControl::None);
        assert_eq!(params.parity, Parity::None);
        assert_eq!(params.stop_bits, StopBits::One);
        assert_eq!(params.vmin, 1);
        assert_eq!(params.vtime, 0);
    }

    #[test]
    fn test_baud_lookup() {
        for &rate in BaudRate::ALL {
            assert_eq!(BaudRate::from_bps(rate.bps()), Some(rate));
        }
        assert_eq!(BaudRate::from_bps(9601), None);
        assert!(matches!(
            BaudRate::try_from(12345),
            Err(PortError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_baud_rates_sorted() {
        assert!(BaudRate::ALL.windows(2).all(|w| w[0].bps() < w[1].bps()));
        assert!(BaudRate::Baud9600 < BaudRate::Baud19200);
    }

    #[test]
    fn test_character_size_range() {
        assert!(CharacterSize::try_from(4).is_err());
        assert!(CharacterSize::try_from(9).is_err());
        assert_eq!(CharacterSize::try_from(7).unwrap(), CharacterSize::Seven);
    }

    #[test]
    fn test_data_bits_conversion() {
        let bits: serialport::DataBits = CharacterSize::Six.into();
        assert_eq!(bits, serialport::DataBits::Six);
        assert_eq!(CharacterSize::from(bits), CharacterSize::Six);
    }

    #[test]
    fn test_flow_control_conversion() {
        let flow: serialport::FlowControl = FlowControl::Hardware.into();
        assert_eq!(flow, serialport::FlowControl::Hardware);
        assert_eq!(FlowControl::from(flow), FlowControl::Hardware);
    }

    #[test]
    fn test_parity_conversion() {
        let parity: serialport::Parity = Parity::Even.into();
        assert_eq!(parity, serialport::Parity::Even);
    }

    #[test]
    fn test_stop_bits_conversion() {
        let bits: serialport::StopBits = StopBits::Two.into();
        assert_eq!(bits, serialport::StopBits::Two);
        assert_eq!(StopBits::from(bits), StopBits::Two);
    }

    #[test]
    fn test_open_mode() {
        assert!(OpenMode::READ.is_readable());
        assert!(!OpenMode::READ.is_writable());
        assert_eq!(OpenMode::READ | OpenMode::WRITE, OpenMode::READ_WRITE);
        assert!(!OpenMode::READ_WRITE.is_empty());
    }

    #[test]
    fn test_control_char_limit() {
        assert_eq!(control_char("vmin", 255).unwrap(), 255);
        assert!(matches!(
            control_char("vtime", 256),
            Err(PortError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_parameters_serde() {
        let toml_str = r#"
            baud_rate = 9600
            character_size = 7
            parity = "even"
            flow_control = "hardware"
        "#;
        let params: PortParameters = toml::from_str(toml_str).unwrap();
        assert_eq!(params.baud_rate, BaudRate::Baud9600);
        assert_eq!(params.character_size, CharacterSize::Seven);
        assert_eq!(params.parity, Parity::Even);
        assert_eq!(params.flow_control, FlowControl::Hardware);
        assert_eq!(params.stop_bits, StopBits::One);
        assert_eq!(params.vmin, 1);

        let bad: Result<PortParameters, _> = toml::from_str("baud_rate = 9601");
        assert!(bad.is_err());
    }
}
