//! Current-data frame decoder

use crate::layout::{layout_for, FrameLayout, HeatMeterLayout, PowerEncoding, FRAME_IDENTIFIER};
use blnet_core::bits::{combine16, combine32, decode_signed12, SIGN_BIT};
use blnet_core::units::{binary_unit, InputType};
use blnet_core::{BlnetError, BlnetResult, DeviceType, Measurement, SensorRecord};

/// Speed level value bits
const SPEED_LEVEL_MASK: u8 = 0x1F;
/// Analog output value bits, in 0.1 V
const ANALOG_OUTPUT_MASK: u8 = 0x7F;

/// Decode one current-data frame
///
/// # Arguments
/// * `frame` - Reply to a current-data read, identifier byte first
/// * `device` - Controller type from the header
///
/// # Returns
/// The record, or an error if the frame is empty, carries the wrong
/// identifier, or is shorter than the controller's layout
pub fn decode_frame(frame: &[u8], device: DeviceType) -> BlnetResult<SensorRecord> {
    decode_with_layout(frame, layout_for(device))
}

/// Decode a frame against an explicit layout
pub fn decode_with_layout(frame: &[u8], layout: &FrameLayout) -> BlnetResult<SensorRecord> {
    let Some(&identifier) = frame.first() else {
        return Err(BlnetError::TruncatedFrame {
            expected: layout.frame_length,
            actual: 0,
        });
    };
    if identifier != FRAME_IDENTIFIER {
        return Err(BlnetError::UnexpectedFrameFormat {
            expected: FRAME_IDENTIFIER,
            found: identifier,
        });
    }
    if frame.len() < layout.frame_length {
        return Err(BlnetError::TruncatedFrame {
            expected: layout.frame_length,
            actual: frame.len(),
        });
    }

    let mut builder = SensorRecord::builder();

    for i in 0..layout.input_count {
        let offset = layout.input_offset + 2 * i;
        let word = combine16(frame[offset], frame[offset + 1]);
        builder.analog_input(format!("S{:02}", i + 1), decode_input(word));
    }

    let outputs = if layout.output_width() == 2 {
        combine16(frame[layout.output_offset], frame[layout.output_offset + 1])
    } else {
        u16::from(frame[layout.output_offset])
    };
    for bit in 0..layout.output_count {
        builder.output(format!("A{:02}", bit + 1), outputs & (1 << bit) != 0);
    }

    for &(name, offset) in layout.speed_levels {
        builder.speed_level(name, decode_speed_level(frame[offset]));
    }

    for &(name, offset) in layout.analog_outputs {
        builder.analog_output(name, decode_analog_output(frame[offset]));
    }

    let activity = frame[layout.heat_meter_offset];
    for meter in layout.heat_meters {
        let active = activity & meter.active_mask != 0;
        decode_heat_meter(&mut builder, frame, meter, active);
    }

    Ok(builder.build())
}

/// Decode an analog input word into a value and unit
pub fn decode_input(word: u16) -> Measurement {
    let decoded = decode_signed12(word);
    let input = decoded.value;
    let flag = if decoded.sign_flag() { 1.0 } else { 0.0 };
    let value = match InputType::from_unit_bits(decoded.unit_bits) {
        InputType::Digital | InputType::Radiation => flag,
        InputType::Temperature => f64::from(input) / 10.0,
        InputType::VolumeFlow => f64::from(input) * 4.0,
        InputType::RoomSensor => f64::from(input & 0x1FF) / 10.0,
        InputType::Unused | InputType::Other(_) => f64::from(input),
    };
    Measurement::new(value, binary_unit(decoded.unit_bits))
}

/// Speed level byte: bit 7 marks the level as active
pub fn decode_speed_level(byte: u8) -> Option<u8> {
    (byte & SIGN_BIT != 0).then_some(byte & SPEED_LEVEL_MASK)
}

/// Analog output byte in 0.1 V; bit 7 marks the output as inactive
pub fn decode_analog_output(byte: u8) -> Option<Measurement> {
    (byte & SIGN_BIT == 0)
        .then(|| Measurement::new(f64::from(byte & ANALOG_OUTPUT_MASK) / 10.0, "V"))
}

fn word_at(frame: &[u8], offset: usize) -> u16 {
    combine16(frame[offset], frame[offset + 1])
}

fn decode_heat_meter(
    builder: &mut blnet_core::SensorRecordBuilder,
    frame: &[u8],
    meter: &HeatMeterLayout,
    active: bool,
) {
    let channel = meter.channel;
    builder.thermal_counter_active(format!("wmz{}", channel), active);

    let (flow, power, energy) = if active {
        let flow = meter.flow_offset.map(|offset| f64::from(word_at(frame, offset)));
        let power = decode_power(frame, meter);
        let energy = f64::from(word_at(frame, meter.kwh_offset)) / 10.0
            + f64::from(word_at(frame, meter.mwh_offset)) * 1000.0;
        (flow, power, energy)
    } else {
        (meter.flow_offset.map(|_| 0.0), 0.0, 0.0)
    };

    if let Some(flow) = flow {
        builder.thermal_counter(format!("volume_flow{}", channel), Measurement::new(flow, "l/h"));
    }
    builder.thermal_counter(
        format!("current_heat_power{}", channel),
        Measurement::new(power, "kW"),
    );
    builder.thermal_counter(
        format!("total_heat_energy{}", channel),
        Measurement::new(energy, "kWh"),
    );
}

fn decode_power(frame: &[u8], meter: &HeatMeterLayout) -> f64 {
    let offset = meter.power_offset;
    match meter.power {
        PowerEncoding::Fixed32 => {
            let raw = combine32(
                frame[offset],
                frame[offset + 1],
                frame[offset + 2],
                frame[offset + 3],
            ) as i32;
            f64::from(raw) * 10.0 / 256.0 / 100.0
        }
        PowerEncoding::Tenths16 => f64::from(word_at(frame, offset) as i16) / 10.0,
    }
}
