use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Board families the generator can target.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Default)]
pub enum EmbeddedPlatform {
    #[default]
    #[serde(rename = "ARDUINO")]
    ArduinoAvr,
    #[serde(rename = "ARDUINO32")]
    ArduinoSamd,
    #[serde(rename = "ARDUINO_ESP8266")]
    ArduinoEsp8266,
    #[serde(rename = "ARDUINO_ESP32")]
    ArduinoEsp32,
    #[serde(rename = "MBED_RTOS")]
    MbedRtos,
}

impl EmbeddedPlatform {
    pub const ALL: [EmbeddedPlatform; 5] = [
        EmbeddedPlatform::ArduinoAvr,
        EmbeddedPlatform::ArduinoSamd,
        EmbeddedPlatform::ArduinoEsp8266,
        EmbeddedPlatform::ArduinoEsp32,
        EmbeddedPlatform::MbedRtos,
    ];

    pub fn board_id(&self) -> &'static str {
        match self {
            EmbeddedPlatform::ArduinoAvr => "ARDUINO",
            EmbeddedPlatform::ArduinoSamd => "ARDUINO32",
            EmbeddedPlatform::ArduinoEsp8266 => "ARDUINO_ESP8266",
            EmbeddedPlatform::ArduinoEsp32 => "ARDUINO_ESP32",
            EmbeddedPlatform::MbedRtos => "MBED_RTOS",
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            EmbeddedPlatform::ArduinoAvr => "Arduino AVR",
            EmbeddedPlatform::ArduinoSamd => "Arduino 32 bit ARM (SAMD/STM32)",
            EmbeddedPlatform::ArduinoEsp8266 => "Arduino ESP8266",
            EmbeddedPlatform::ArduinoEsp32 => "Arduino ESP32",
            EmbeddedPlatform::MbedRtos => "mbed RTOS 5/6",
        }
    }

    /// Whether constant data must be placed in program memory.
    pub fn uses_progmem(&self) -> bool {
        matches!(
            self,
            EmbeddedPlatform::ArduinoAvr | EmbeddedPlatform::ArduinoEsp8266
        )
    }

    pub fn is_arduino(&self) -> bool {
        !matches!(self, EmbeddedPlatform::MbedRtos)
    }

    pub fn iter() -> impl Iterator<Item = EmbeddedPlatform> {
        Self::ALL.into_iter()
    }
}

impl fmt::Display for EmbeddedPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.friendly_name())
    }
}

impl FromStr for EmbeddedPlatform {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::iter()
            .find(|p| p.board_id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let ids: Vec<_> = Self::iter().map(|p| p.board_id()).collect();
                format!("unknown platform '{wanted}', expected one of: {}", ids.join(", "))
            })
    }
}
