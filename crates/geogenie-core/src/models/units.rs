use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance units understood in requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl DistanceUnit {
    /// Convert a distance value to meters
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            DistanceUnit::Meters => value,
            DistanceUnit::Kilometers => value * 1000.0,
            DistanceUnit::Miles => value * 1609.344,
            DistanceUnit::Feet => value * 0.3048,
        }
    }

    /// Convert a distance value from meters to this unit
    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Meters => meters,
            DistanceUnit::Kilometers => meters / 1000.0,
            DistanceUnit::Miles => meters / 1609.344,
            DistanceUnit::Feet => meters / 0.3048,
        }
    }

    /// Convert `value` expressed in this unit into `target`
    pub fn convert(&self, value: f64, target: DistanceUnit) -> f64 {
        target.from_meters(self.to_meters(value))
    }

    /// Recognize a unit token as written in free text ("m", "metres", "KM", "ft", ...)
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().trim_end_matches('.').to_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Some(DistanceUnit::Meters),
            "km" | "kms" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
                Some(DistanceUnit::Kilometers)
            }
            "mi" | "mile" | "miles" => Some(DistanceUnit::Miles),
            "ft" | "foot" | "feet" => Some(DistanceUnit::Feet),
            _ => None,
        }
    }

    /// Short symbol used in listings
    pub fn symbol(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Miles => "mi",
            DistanceUnit::Feet => "ft",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistanceUnit::Meters => "meters",
            DistanceUnit::Kilometers => "kilometers",
            DistanceUnit::Miles => "miles",
            DistanceUnit::Feet => "feet",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_conversion() {
        assert!((DistanceUnit::Kilometers.to_meters(5.0) - 5000.0).abs() < 1e-9);
        assert!((DistanceUnit::Miles.from_meters(1609.344) - 1.0).abs() < 1e-9);
        assert!((DistanceUnit::Feet.convert(1000.0, DistanceUnit::Meters) - 304.8).abs() < 1e-9);
    }

    #[test]
    fn test_from_token() {
        assert_eq!(DistanceUnit::from_token("m"), Some(DistanceUnit::Meters));
        assert_eq!(DistanceUnit::from_token("Metres"), Some(DistanceUnit::Meters));
        assert_eq!(DistanceUnit::from_token("KM"), Some(DistanceUnit::Kilometers));
        assert_eq!(DistanceUnit::from_token("ft."), Some(DistanceUnit::Feet));
        assert_eq!(DistanceUnit::from_token("miles"), Some(DistanceUnit::Miles));
        assert_eq!(DistanceUnit::from_token("degrees"), None);
    }
}
