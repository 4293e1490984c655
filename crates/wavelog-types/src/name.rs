use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identifier of a wave: a domain plus a wave-local id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveId {
    domain: String,
    id: String,
}

impl WaveId {
    /// Construct a wave id from its domain and local id.
    pub fn new(domain: impl Into<String>, id: impl Into<String>) -> Result<Self, TypeError> {
        let domain = domain.into();
        let id = id.into();
        if domain.is_empty() {
            return Err(TypeError::EmptyComponent { field: "wave domain" });
        }
        if id.is_empty() {
            return Err(TypeError::EmptyComponent { field: "wave id" });
        }
        Ok(Self { domain, id })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for WaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WaveId({self})")
    }
}

impl fmt::Display for WaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.id)
    }
}

/// Identifier of a wavelet within a wave: a domain plus a wavelet-local id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveletId {
    domain: String,
    id: String,
}

impl WaveletId {
    /// Construct a wavelet id from its domain and local id.
    pub fn new(domain: impl Into<String>, id: impl Into<String>) -> Result<Self, TypeError> {
        let domain = domain.into();
        let id = id.into();
        if domain.is_empty() {
            return Err(TypeError::EmptyComponent { field: "wavelet domain" });
        }
        if id.is_empty() {
            return Err(TypeError::EmptyComponent { field: "wavelet id" });
        }
        Ok(Self { domain, id })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for WaveletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WaveletId({self})")
    }
}

impl fmt::Display for WaveletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.id)
    }
}

/// Fully-qualified name of a wavelet: the wave it belongs to plus the
/// wavelet id. Ordering decomposes wave-first, then wavelet.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveletName {
    wave_id: WaveId,
    wavelet_id: WaveletId,
}

impl WaveletName {
    pub fn new(wave_id: WaveId, wavelet_id: WaveletId) -> Self {
        Self { wave_id, wavelet_id }
    }

    pub fn wave_id(&self) -> &WaveId {
        &self.wave_id
    }

    pub fn wavelet_id(&self) -> &WaveletId {
        &self.wavelet_id
    }
}

impl fmt::Debug for WaveletName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WaveletName({self})")
    }
}

impl fmt::Display for WaveletName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.wave_id, self.wavelet_id)
    }
}

/// Address of a wave participant, in `local@domain` form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Validate and construct a participant address.
    pub fn of(address: impl Into<String>) -> Result<Self, TypeError> {
        let address = address.into();
        match address.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(address))
            }
            _ => Err(TypeError::InvalidAddress(address)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the `@`.
    pub fn local(&self) -> &str {
        self.0.split_once('@').map(|(l, _)| l).unwrap_or(&self.0)
    }

    /// The part after the `@`.
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map(|(_, d)| d).unwrap_or("")
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({})", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavelet_name(wave: &str, wavelet: &str) -> WaveletName {
        WaveletName::new(
            WaveId::new("example.com", wave).unwrap(),
            WaveletId::new("example.com", wavelet).unwrap(),
        )
    }

    #[test]
    fn wave_id_rejects_empty_parts() {
        assert!(WaveId::new("", "w+1").is_err());
        assert!(WaveId::new("example.com", "").is_err());
    }

    #[test]
    fn wavelet_id_rejects_empty_parts() {
        assert!(WaveletId::new("", "conv+root").is_err());
        assert!(WaveletId::new("example.com", "").is_err());
    }

    #[test]
    fn wavelet_name_orders_wave_first() {
        let a = wavelet_name("w+a", "conv+z");
        let b = wavelet_name("w+b", "conv+a");
        assert!(a < b);
    }

    #[test]
    fn wavelet_name_orders_wavelet_second() {
        let a = wavelet_name("w+a", "conv+a");
        let b = wavelet_name("w+a", "conv+b");
        assert!(a < b);
    }

    #[test]
    fn wavelet_name_display() {
        let name = wavelet_name("w+1", "conv+root");
        assert_eq!(format!("{name}"), "example.com/w+1/example.com/conv+root");
    }

    #[test]
    fn participant_parses_address() {
        let p = ParticipantId::of("alice@example.com").unwrap();
        assert_eq!(p.local(), "alice");
        assert_eq!(p.domain(), "example.com");
    }

    #[test]
    fn participant_rejects_malformed() {
        assert!(ParticipantId::of("no-at-sign").is_err());
        assert!(ParticipantId::of("@example.com").is_err());
        assert!(ParticipantId::of("alice@").is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let name = wavelet_name("w+1", "conv+root");
        let json = serde_json::to_string(&name).unwrap();
        let parsed: WaveletName = serde_json::from_str(&json).unwrap();
        assert_eq!(name, parsed);
    }
}
