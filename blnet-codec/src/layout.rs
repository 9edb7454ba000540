//! Byte layouts of the current-data frames
//!
//! Offsets count from the frame identifier at index 0. Layouts are static
//! data so the decoder stays a single table-driven routine.

use blnet_core::DeviceType;

/// Identifier byte that opens every current-data frame
pub const FRAME_IDENTIFIER: u8 = 0x80;

/// Encoding of the instantaneous heat power field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEncoding {
    /// Signed 32-bit, `raw * 10 / 256 / 100` kW
    Fixed32,
    /// Signed 16-bit, `raw / 10` kW
    Tenths16,
}

/// One heat meter channel
#[derive(Debug, Clone, Copy)]
pub struct HeatMeterLayout {
    /// Channel number used in the record keys
    pub channel: u8,
    /// Bit of the activity byte that enables this channel
    pub active_mask: u8,
    /// Volume flow in l/h, if the controller reports it
    pub flow_offset: Option<usize>,
    pub power_offset: usize,
    pub power: PowerEncoding,
    /// Energy in 0.1 kWh
    pub kwh_offset: usize,
    /// Energy in MWh
    pub mwh_offset: usize,
}

/// Layout of one controller's data frame
#[derive(Debug, Clone, Copy)]
pub struct FrameLayout {
    pub device: &'static str,
    /// Bytes required, identifier included
    pub frame_length: usize,
    pub input_offset: usize,
    pub input_count: usize,
    /// Output bitmap; 16 bits wide when more than 8 outputs exist
    pub output_offset: usize,
    pub output_count: usize,
    pub speed_levels: &'static [(&'static str, usize)],
    pub analog_outputs: &'static [(&'static str, usize)],
    pub heat_meter_offset: usize,
    pub heat_meters: &'static [HeatMeterLayout],
}

impl FrameLayout {
    /// Number of bytes the output bitmap occupies
    pub fn output_width(&self) -> usize {
        if self.output_count > 8 { 2 } else { 1 }
    }
}

pub static UVR1611: FrameLayout = FrameLayout {
    device: "UVR1611",
    frame_length: 56,
    input_offset: 1,
    input_count: 16,
    output_offset: 33,
    output_count: 13,
    speed_levels: &[("DzA1", 35), ("DzA2", 36), ("DzA6", 37), ("DzA7", 38)],
    analog_outputs: &[],
    heat_meter_offset: 39,
    heat_meters: &[
        HeatMeterLayout {
            channel: 1,
            active_mask: 0x01,
            flow_offset: None,
            power_offset: 40,
            power: PowerEncoding::Fixed32,
            kwh_offset: 44,
            mwh_offset: 46,
        },
        HeatMeterLayout {
            channel: 2,
            active_mask: 0x02,
            flow_offset: None,
            power_offset: 48,
            power: PowerEncoding::Fixed32,
            kwh_offset: 52,
            mwh_offset: 54,
        },
    ],
};

pub static UVR61_3: FrameLayout = FrameLayout {
    device: "UVR61-3",
    frame_length: 25,
    input_offset: 1,
    input_count: 6,
    output_offset: 13,
    output_count: 3,
    speed_levels: &[("DzA1", 14)],
    analog_outputs: &[("AA1", 15)],
    heat_meter_offset: 16,
    heat_meters: &[HeatMeterLayout {
        channel: 1,
        active_mask: 0x01,
        flow_offset: Some(17),
        power_offset: 19,
        power: PowerEncoding::Tenths16,
        kwh_offset: 21,
        mwh_offset: 23,
    }],
};

/// Layout for a controller type
///
/// Unknown controllers are decoded with the UVR1611 layout.
pub fn layout_for(device: DeviceType) -> &'static FrameLayout {
    match device {
        DeviceType::Uvr61_3 => &UVR61_3,
        DeviceType::Uvr1611 | DeviceType::Unknown(_) => &UVR1611,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_offset(layout: &FrameLayout) -> usize {
        let inputs = layout.input_offset + 2 * layout.input_count;
        let outputs = layout.output_offset + layout.output_width();
        let meters = layout
            .heat_meters
            .iter()
            .map(|m| m.mwh_offset + 2)
            .max()
            .unwrap_or(0);
        inputs.max(outputs).max(meters)
    }

    #[test]
    fn test_layouts_fit_frame_length() {
        assert_eq!(last_offset(&UVR1611), UVR1611.frame_length);
        assert_eq!(last_offset(&UVR61_3), UVR61_3.frame_length);
    }

    #[test]
    fn test_inputs_precede_outputs() {
        for layout in [&UVR1611, &UVR61_3] {
            assert_eq!(
                layout.input_offset + 2 * layout.input_count,
                layout.output_offset
            );
        }
    }

    #[test]
    fn test_layout_for() {
        assert_eq!(layout_for(DeviceType::Uvr61_3).device, "UVR61-3");
        assert_eq!(layout_for(DeviceType::Uvr1611).device, "UVR1611");
        assert_eq!(layout_for(DeviceType::Unknown(0x11)).device, "UVR1611");
    }
}
