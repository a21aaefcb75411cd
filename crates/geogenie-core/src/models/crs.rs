use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authority-qualified CRS identifier such as `EPSG:4326`
///
/// Parsing accepts `EPSG:4326`, `epsg:4326`, a bare EPSG number (`4326`) and the
/// OGC URN form (`urn:ogc:def:crs:EPSG::4326`). The authority is stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CrsCode {
    authority: String,
    code: String,
}

impl CrsCode {
    /// Create an EPSG code
    pub fn epsg(code: u32) -> Self {
        Self { authority: "EPSG".to_string(), code: code.to_string() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::epsg(3857)
    }

    /// Parse a CRS identifier, returning `None` for anything unrecognizable
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return trimmed.parse().ok().map(Self::epsg);
        }

        let body = match trimmed.get(..16) {
            Some(prefix) if prefix.eq_ignore_ascii_case("urn:ogc:def:crs:") => &trimmed[16..],
            _ => trimmed,
        };

        // "EPSG:4326" or, from the URN form, "EPSG::4326" / "EPSG:9.9:4326"
        let mut parts = body.split(':').filter(|p| !p.is_empty());
        let authority = parts.next()?;
        let code = parts.next_back()?;

        let valid_authority = authority.chars().all(|c| c.is_ascii_alphanumeric());
        let valid_code = code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_authority || !valid_code || authority == code {
            return None;
        }

        Some(Self { authority: authority.to_ascii_uppercase(), code: code.to_string() })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Numeric EPSG code, if this is an EPSG identifier
    pub fn epsg_code(&self) -> Option<u32> {
        if self.authority == "EPSG" {
            self.code.parse().ok()
        } else {
            None
        }
    }

    /// Whether coordinates are in degrees rather than projected units
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg_code(), Some(4326 | 4258 | 4269 | 4283 | 4674))
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

impl FromStr for CrsCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("'{}' is not a CRS identifier (expected e.g. EPSG:4326)", s))
    }
}

impl TryFrom<String> for CrsCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CrsCode> for String {
    fn from(crs: CrsCode) -> Self {
        crs.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(CrsCode::parse("EPSG:4326"), Some(CrsCode::wgs84()));
        assert_eq!(CrsCode::parse("epsg:3857"), Some(CrsCode::web_mercator()));
        assert_eq!(CrsCode::parse(" 32748 "), Some(CrsCode::epsg(32748)));
        assert_eq!(CrsCode::parse("urn:ogc:def:crs:EPSG::4326"), Some(CrsCode::wgs84()));
        assert_eq!(CrsCode::parse("ESRI:102003").unwrap().to_string(), "ESRI:102003");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CrsCode::parse("").is_none());
        assert!(CrsCode::parse("meters").is_none());
        assert!(CrsCode::parse("EPSG:").is_none());
        assert!(CrsCode::parse("EPSG:43 26").is_none());
    }

    #[test]
    fn test_epsg_code_and_geographic() {
        assert_eq!(CrsCode::wgs84().epsg_code(), Some(4326));
        assert!(CrsCode::wgs84().is_geographic());
        assert!(!CrsCode::web_mercator().is_geographic());
        assert_eq!(CrsCode::parse("ESRI:102003").unwrap().epsg_code(), None);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&CrsCode::web_mercator()).unwrap();
        assert_eq!(json, "\"EPSG:3857\"");

        let parsed: CrsCode = serde_json::from_str("\"epsg:4326\"").unwrap();
        assert_eq!(parsed, CrsCode::wgs84());

        assert!(serde_json::from_str::<CrsCode>("\"nonsense crs\"").is_err());
    }
}
