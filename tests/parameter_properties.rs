//! Set-then-get property for every parameter combination.

mod common;

use common::open_mock;
use proptest::prelude::*;
use proptest::sample::select;
use serial_stream::{
    BaudRate, CharacterSize, ErrorKind, FlowControl, Parity, PortParameters, StopBits,
};

fn parameters() -> impl Strategy<Value = PortParameters> {
    (
        select(BaudRate::ALL),
        select(CharacterSize::ALL),
        select(Parity::ALL),
        select(StopBits::ALL),
        select(FlowControl::ALL),
        any::<u8>(),
        any::<u8>(),
    )
        .prop_map(
            |(baud_rate, character_size, parity, stop_bits, flow_control, vmin, vtime)| {
                PortParameters {
                    baud_rate,
                    character_size,
                    parity,
                    stop_bits,
                    flow_control,
                    vmin,
                    vtime,
                }
            },
        )
}

proptest! {
    #[test]
    fn set_then_get_returns_value(params in parameters()) {
        let (mut stream, _device) = open_mock("MOCK0");

        stream.set_baud_rate(params.baud_rate).unwrap();
        stream.set_character_size(params.character_size).unwrap();
        stream.set_parity(params.parity).unwrap();
        stream.set_stop_bits(params.stop_bits).unwrap();
        stream.set_flow_control(params.flow_control).unwrap();
        stream.set_vmin(params.vmin.into()).unwrap();
        stream.set_vtime(params.vtime.into()).unwrap();

        prop_assert_eq!(stream.baud_rate().unwrap(), params.baud_rate);
        prop_assert_eq!(stream.character_size().unwrap(), params.character_size);
        prop_assert_eq!(stream.parity().unwrap(), params.parity);
        prop_assert_eq!(stream.stop_bits().unwrap(), params.stop_bits);
        prop_assert_eq!(stream.flow_control().unwrap(), params.flow_control);
        prop_assert_eq!(stream.vmin().unwrap(), params.vmin);
        prop_assert_eq!(stream.vtime().unwrap(), params.vtime);
        prop_assert_eq!(stream.parameters().unwrap(), params);
    }

    #[test]
    fn unsupported_baud_is_rejected_and_state_kept(baud in select(BaudRate::ALL)) {
        let (mut stream, device) = open_mock("MOCK0");
        device.set_baud_ceiling(BaudRate::Baud115200);

        match stream.set_baud_rate(baud) {
            Ok(()) => {
                prop_assert!(baud <= BaudRate::Baud115200);
                prop_assert_eq!(stream.baud_rate().unwrap(), baud);
            }
            Err(e) => {
                prop_assert!(baud > BaudRate::Baud115200);
                prop_assert_eq!(e.kind(), ErrorKind::InvalidParameter);
                prop_assert_eq!(stream.baud_rate().unwrap(), BaudRate::Baud115200);
            }
        }
    }

    #[test]
    fn out_of_range_control_chars_rejected(value in 256u16..) {
        let (mut stream, _device) = open_mock("MOCK0");
        prop_assert_eq!(stream.set_vmin(value).unwrap_err().kind(), ErrorKind::InvalidParameter);
        prop_assert_eq!(stream.set_vtime(value).unwrap_err().kind(), ErrorKind::InvalidParameter);
        prop_assert_eq!(stream.vmin().unwrap(), 1);
    }
}
