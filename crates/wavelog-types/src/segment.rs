use std::fmt;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::name::WaveletName;

/// Prefix carried by every blip segment id.
const BLIP_PREFIX: &str = "b+";

const INDEX_ID: &str = "index";
const PARTICIPANTS_ID: &str = "participants";
const MANIFEST_ID: &str = "manifest";
const TAGS_ID: &str = "tags";

/// Identifier of a logical sub-document within a wavelet.
///
/// Exactly one classification holds for any id: the reserved `index`,
/// `participants`, `manifest`, and `tags` segments, or a blip segment
/// (`b+<blip id>`). Ids are immutable and interned; cloning shares the
/// underlying string. Total order is lexicographic on the serialized id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(Arc<str>);

impl SegmentId {
    /// Construct a canonical segment id from its serialized form.
    ///
    /// Accepts the reserved ids and blip-prefixed ids; anything else is
    /// rejected.
    pub fn of(raw: impl AsRef<str>) -> Result<Self, TypeError> {
        let raw = raw.as_ref();
        match raw {
            INDEX_ID | PARTICIPANTS_ID | MANIFEST_ID | TAGS_ID => Ok(Self(Arc::from(raw))),
            _ => {
                let blip = raw
                    .strip_prefix(BLIP_PREFIX)
                    .ok_or_else(|| TypeError::InvalidSegmentId(raw.to_string()))?;
                if blip.is_empty() {
                    return Err(TypeError::InvalidSegmentId(raw.to_string()));
                }
                Ok(Self(Arc::from(raw)))
            }
        }
    }

    /// Construct the segment id for a blip.
    pub fn of_blip_id(blip_id: impl AsRef<str>) -> Result<Self, TypeError> {
        let blip_id = blip_id.as_ref();
        if blip_id.is_empty() {
            return Err(TypeError::EmptyComponent { field: "blip id" });
        }
        Ok(Self(Arc::from(format!("{BLIP_PREFIX}{blip_id}").as_str())))
    }

    /// The wavelet index segment.
    pub fn index() -> Self {
        Self(Arc::from(INDEX_ID))
    }

    /// The participants segment.
    pub fn participants() -> Self {
        Self(Arc::from(PARTICIPANTS_ID))
    }

    /// The conversation manifest segment.
    pub fn manifest() -> Self {
        Self(Arc::from(MANIFEST_ID))
    }

    /// The tags segment.
    pub fn tags() -> Self {
        Self(Arc::from(TAGS_ID))
    }

    pub fn is_index(&self) -> bool {
        &*self.0 == INDEX_ID
    }

    pub fn is_participants(&self) -> bool {
        &*self.0 == PARTICIPANTS_ID
    }

    pub fn is_manifest(&self) -> bool {
        &*self.0 == MANIFEST_ID
    }

    pub fn is_tags(&self) -> bool {
        &*self.0 == TAGS_ID
    }

    pub fn is_blip(&self) -> bool {
        self.0.starts_with(BLIP_PREFIX)
    }

    /// The embedded blip id, recovered by stripping the blip prefix.
    ///
    /// Fails with [`TypeError::NotABlipSegment`] on non-blip ids.
    pub fn blip_id(&self) -> Result<&str, TypeError> {
        self.0
            .strip_prefix(BLIP_PREFIX)
            .ok_or_else(|| TypeError::NotABlipSegment(self.0.to_string()))
    }

    /// The serialized id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SegmentId({})", self.0)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SegmentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SegmentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SegmentId::of(&raw).map_err(D::Error::custom)
    }
}

/// External key into the block index: a segment qualified by its wavelet.
///
/// Equality and ordering decompose into the pair's components, wavelet
/// first, then segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentName {
    wavelet: WaveletName,
    segment: SegmentId,
}

impl SegmentName {
    pub fn new(wavelet: WaveletName, segment: SegmentId) -> Self {
        Self { wavelet, segment }
    }

    pub fn wavelet(&self) -> &WaveletName {
        &self.wavelet
    }

    pub fn segment(&self) -> &SegmentId {
        &self.segment
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.wavelet, self.segment)
    }
}
