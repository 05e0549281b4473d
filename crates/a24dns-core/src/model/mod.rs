//! Record model: desired state, observed state and the API wire shapes
//!
//! - [`DesiredRecord`]: what the orchestrator asks for
//! - [`ObservedRecord`]: what the API last reported, keyed by remote ID
//! - [`ApiRecord`] / [`RecordPayload`]: JSON bodies exchanged with the API

pub mod field;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use field::Field;

use crate::error::Error;

/// Remote record identifier
pub type RecordId = u64;

/// Default time-to-live for new records (seconds)
pub const DEFAULT_TTL: u32 = 3600;

/// Token used in desired state for the zone apex
pub const APEX: &str = "@";

/// DNS record types the API manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Aname,
    Caa,
    Cname,
    Ds,
    Https,
    Mx,
    Naptr,
    Ns,
    Ptr,
    Soa,
    Srv,
    Sshfp,
    Svcb,
    Tlsa,
    Txt,
}

impl RecordType {
    /// Every supported type, in display order
    pub const ALL: [RecordType; 17] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Aname,
        RecordType::Caa,
        RecordType::Cname,
        RecordType::Ds,
        RecordType::Https,
        RecordType::Mx,
        RecordType::Naptr,
        RecordType::Ns,
        RecordType::Ptr,
        RecordType::Soa,
        RecordType::Srv,
        RecordType::Sshfp,
        RecordType::Svcb,
        RecordType::Tlsa,
        RecordType::Txt,
    ];

    /// Upper-case type token as the API spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Aname => "ANAME",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Ds => "DS",
            RecordType::Https => "HTTPS",
            RecordType::Mx => "MX",
            RecordType::Naptr => "NAPTR",
            RecordType::Ns => "NS",
            RecordType::Ptr => "PTR",
            RecordType::Soa => "SOA",
            RecordType::Srv => "SRV",
            RecordType::Sshfp => "SSHFP",
            RecordType::Svcb => "SVCB",
            RecordType::Tlsa => "TLSA",
            RecordType::Txt => "TXT",
        }
    }

    /// True if `token` names a supported type (case-insensitive)
    pub fn is_type_token(token: &str) -> bool {
        token.parse::<RecordType>().is_ok()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("unsupported record type: {s:?}")))
    }
}

impl Serialize for RecordType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Effective routing key for API calls: the service key when set, else the domain
pub fn zone_target<'a>(domain: &'a str, service: Option<&'a str>) -> &'a str {
    match service {
        Some(s) if !s.is_empty() => s,
        _ => domain,
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

/// A DNS record as the orchestrator wants it to exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRecord {
    /// Zone the record belongs to
    pub domain: String,

    /// Service key routing the API calls, if different from the domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Zone-relative name, `@` for the apex
    pub name: String,

    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,

    /// Record content; required for everything except CAA
    #[serde(default)]
    pub content: Option<String>,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Priority for MX/SRV
    #[serde(default)]
    pub priority: Option<u32>,

    /// CAA value, e.g. `letsencrypt.org`
    #[serde(default)]
    pub caa_value: Option<String>,

    /// CAA flags
    #[serde(default)]
    pub caa_flags: Option<u8>,

    /// CAA tag, e.g. `issue`
    #[serde(default)]
    pub caa_tag: Option<String>,
}

impl DesiredRecord {
    /// Create a desired record with the default TTL and no optional fields
    pub fn new(domain: impl Into<String>, name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            domain: domain.into(),
            service: None,
            name: name.into(),
            record_type,
            content: None,
            ttl: DEFAULT_TTL,
            priority: None,
            caa_value: None,
            caa_flags: None,
            caa_tag: None,
        }
    }

    /// Set the service key
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Set the content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the time-to-live
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the CAA flags, tag and value
    pub fn with_caa(mut self, flags: u8, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.caa_flags = Some(flags);
        self.caa_tag = Some(tag.into());
        self.caa_value = Some(value.into());
        self
    }

    /// Effective routing key for this record
    pub fn target(&self) -> &str {
        zone_target(&self.domain, self.service.as_deref())
    }
}

/// A DNS record as last reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedRecord {
    /// Remote identifier, non-zero
    pub id: RecordId,

    /// Zone the record belongs to
    pub domain: String,

    /// Service key routing the API calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// Zone-relative name, `@` for the apex
    pub name: String,

    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,

    /// Content; null for CAA records
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub content: Field<String>,

    /// Time-to-live in seconds
    pub ttl: u32,

    /// Priority for MX/SRV
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub priority: Field<u32>,

    /// CAA value
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub caa_value: Field<String>,

    /// CAA flags
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub caa_flags: Field<u8>,

    /// CAA tag
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub caa_tag: Field<String>,
}

impl ObservedRecord {
    /// Effective routing key for this record
    pub fn target(&self) -> &str {
        zone_target(&self.domain, self.service.as_deref())
    }

    /// Reference used to read this record back
    pub fn to_ref(&self) -> RecordRef {
        RecordRef {
            domain: self.domain.clone(),
            service: self.service.clone(),
            id: self.id,
            name: Some(self.name.clone()),
            record_type: Some(self.record_type),
        }
    }
}

/// Enough to locate a remote record: its ID plus optional name/type for the
/// list fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRef {
    /// Zone the record belongs to
    pub domain: String,
    /// Service key routing the API calls
    pub service: Option<String>,
    /// Remote identifier
    pub id: RecordId,
    /// Zone-relative name, if known
    pub name: Option<String>,
    /// Record type, if known
    pub record_type: Option<RecordType>,
}

impl RecordRef {
    /// Effective routing key for this record
    pub fn target(&self) -> &str {
        zone_target(&self.domain, self.service.as_deref())
    }
}

/// Record as returned by the API
///
/// Every field is optional on the wire; see [`Field`] for how missing and
/// null values are told apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub record_type: String,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub content: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub ttl: Field<u32>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub priority: Field<u32>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub caa_value: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub flags: Field<u8>,
    #[serde(default, skip_serializing_if = "Field::is_unknown")]
    pub tag: Field<String>,
}

/// Reads an explicit `null` the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl ApiRecord {
    /// Identifier, if the API returned a usable (non-zero) one
    pub fn usable_id(&self) -> Option<RecordId> {
        self.id.filter(|id| *id != 0)
    }

    /// TTL, if the API returned a positive one
    pub fn positive_ttl(&self) -> Option<u32> {
        self.ttl.as_ref().value().copied().filter(|ttl| *ttl > 0)
    }

    /// Content or CAA value, whichever identifies the record to a person
    pub fn display_content(&self) -> String {
        self.caa_value
            .clone()
            .non_empty()
            .value()
            .or_else(|| self.content.clone().value())
            .unwrap_or_default()
    }
}

/// Full-replacement body for create and update calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub content: String,
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caa_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Query filters for listing records
///
/// Empty strings are treated as "no filter"; the API cannot filter on an
/// empty name, so apex lookups list all names and filter locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub name: Option<String>,
    pub record_type: Option<String>,
    pub content: Option<String>,
    pub ttl: Option<u32>,
}

impl ListFilter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by API-side name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Filter by type token
    pub fn record_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = Some(record_type.into());
        self
    }

    /// Filter by content
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Filter by TTL
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Query parameters in `filters[...]` form, skipping empty values
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let strings = [
            ("filters[name]", &self.name),
            ("filters[type]", &self.record_type),
            ("filters[content]", &self.content),
        ];
        for (key, value) in strings {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        }
        if let Some(ttl) = self.ttl {
            pairs.push(("filters[ttl]", ttl.to_string()));
        }
        pairs
    }
}
