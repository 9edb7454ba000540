//! Decoded sensor snapshot

use serde::Serialize;
use std::collections::BTreeMap;

/// A value with its physical unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub value: f64,
    pub unit: String,
}

impl Measurement {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

/// Decoded snapshot of one data frame
///
/// A record is produced in one piece by [`SensorRecordBuilder::build`] and is
/// read-only afterwards; every poll cycle yields a new record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorRecord {
    outputs: BTreeMap<String, bool>,
    speed_levels: BTreeMap<String, Option<u8>>,
    analog_inputs: BTreeMap<String, Measurement>,
    analog_outputs: BTreeMap<String, Option<Measurement>>,
    thermal_counters: BTreeMap<String, Measurement>,
    thermal_counter_active: BTreeMap<String, bool>,
    sections: BTreeMap<String, BTreeMap<String, Measurement>>,
}

impl SensorRecord {
    pub fn builder() -> SensorRecordBuilder {
        SensorRecordBuilder::default()
    }

    /// Digital outputs (A01..A13)
    pub fn outputs(&self) -> &BTreeMap<String, bool> {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<bool> {
        self.outputs.get(name).copied()
    }

    /// Speed levels; `None` when the speed control is inactive
    pub fn speed_levels(&self) -> &BTreeMap<String, Option<u8>> {
        &self.speed_levels
    }

    pub fn speed_level(&self, name: &str) -> Option<Option<u8>> {
        self.speed_levels.get(name).copied()
    }

    /// Analog inputs (S01..S16 for the binary protocol)
    pub fn analog_inputs(&self) -> &BTreeMap<String, Measurement> {
        &self.analog_inputs
    }

    pub fn analog_input(&self, name: &str) -> Option<&Measurement> {
        self.analog_inputs.get(name)
    }

    /// Analog outputs; `None` when the output is inactive
    pub fn analog_outputs(&self) -> &BTreeMap<String, Option<Measurement>> {
        &self.analog_outputs
    }

    /// Heat power, energy and flow of the thermal energy counters
    pub fn thermal_counters(&self) -> &BTreeMap<String, Measurement> {
        &self.thermal_counters
    }

    pub fn thermal_counter(&self, name: &str) -> Option<&Measurement> {
        self.thermal_counters.get(name)
    }

    /// Activity flag per thermal energy counter (wmz1, wmz2)
    pub fn thermal_counter_active(&self) -> &BTreeMap<String, bool> {
        &self.thermal_counter_active
    }

    /// All CMI sections by name, in the uniform key/value/unit shape
    pub fn sections(&self) -> &BTreeMap<String, BTreeMap<String, Measurement>> {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&BTreeMap<String, Measurement>> {
        self.sections.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
            && self.speed_levels.is_empty()
            && self.analog_inputs.is_empty()
            && self.analog_outputs.is_empty()
            && self.thermal_counters.is_empty()
            && self.thermal_counter_active.is_empty()
            && self.sections.is_empty()
    }
}

/// Collects the fields of a [`SensorRecord`] while a frame is decoded
#[derive(Debug, Default)]
pub struct SensorRecordBuilder {
    record: SensorRecord,
}

impl SensorRecordBuilder {
    pub fn output(&mut self, name: impl Into<String>, on: bool) -> &mut Self {
        self.record.outputs.insert(name.into(), on);
        self
    }

    pub fn speed_level(&mut self, name: impl Into<String>, level: Option<u8>) -> &mut Self {
        self.record.speed_levels.insert(name.into(), level);
        self
    }

    pub fn analog_input(&mut self, name: impl Into<String>, value: Measurement) -> &mut Self {
        self.record.analog_inputs.insert(name.into(), value);
        self
    }

    pub fn analog_output(
        &mut self,
        name: impl Into<String>,
        value: Option<Measurement>,
    ) -> &mut Self {
        self.record.analog_outputs.insert(name.into(), value);
        self
    }

    pub fn thermal_counter(&mut self, name: impl Into<String>, value: Measurement) -> &mut Self {
        self.record.thermal_counters.insert(name.into(), value);
        self
    }

    pub fn thermal_counter_active(&mut self, name: impl Into<String>, active: bool) -> &mut Self {
        self.record.thermal_counter_active.insert(name.into(), active);
        self
    }

    pub fn section_entry(
        &mut self,
        section: &str,
        key: impl Into<String>,
        value: Measurement,
    ) -> &mut Self {
        self.record
            .sections
            .entry(section.to_string())
            .or_default()
            .insert(key.into(), value);
        self
    }

    pub fn build(self) -> SensorRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let mut builder = SensorRecord::builder();
        builder
            .output("A01", true)
            .speed_level("DzA1", Some(30))
            .speed_level("DzA2", None)
            .analog_input("S01", Measurement::new(6.2, "°C"))
            .thermal_counter_active("wmz1", false)
            .section_entry("Inputs", "A01", Measurement::new(6.2, "°C"));
        let record = builder.build();

        assert_eq!(record.output("A01"), Some(true));
        assert_eq!(record.output("A02"), None);
        assert_eq!(record.speed_level("DzA1"), Some(Some(30)));
        assert_eq!(record.speed_level("DzA2"), Some(None));
        assert_eq!(record.analog_input("S01").unwrap().unit, "°C");
        assert_eq!(record.section("Inputs").unwrap().len(), 1);
        assert!(!record.is_empty());
    }

    #[test]
    fn test_empty_record() {
        assert!(SensorRecord::builder().build().is_empty());
    }
}
