//! Import identifiers
//!
//! An import names an existing remote record with one colon-delimited
//! string. Supported shapes:
//!
//! | shape | variant |
//! |---|---|
//! | `zone:id` | [`ImportId::ById`] |
//! | `zone:service:id` | [`ImportId::ByServiceId`] |
//! | `zone:name:type` | [`ImportId::ByNameType`] |
//! | `zone:service:name:type` | [`ImportId::ByServiceNameType`] |
//! | `zone:service:name:type:content` | [`ImportId::ByServiceNameTypeContent`] |
//!
//! A three-part string is `zone:name:type` when its last segment is a record
//! type, otherwise `zone:service:id`. The content segment takes the rest of
//! the string, colons included, so IPv6 addresses work as disambiguators.
//!
//! Name-based shapes are resolved with a list call. Unlike the lookup after
//! create, resolution never guesses: several matches without a content
//! segment (or with one that matches several) fail with the full list.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Candidate, Error, Result};
use crate::model::{ApiRecord, ListFilter, RecordId, RecordRef, RecordType, zone_target};
use crate::naming;
use crate::traits::RecordApi;

/// A parsed import identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportId {
    /// `zone:id`
    ById { zone: String, id: RecordId },
    /// `zone:service:id`
    ByServiceId {
        zone: String,
        service: String,
        id: RecordId,
    },
    /// `zone:name:type`
    ByNameType {
        zone: String,
        name: String,
        record_type: RecordType,
    },
    /// `zone:service:name:type`
    ByServiceNameType {
        zone: String,
        service: String,
        name: String,
        record_type: RecordType,
    },
    /// `zone:service:name:type:content`
    ByServiceNameTypeContent {
        zone: String,
        service: String,
        name: String,
        record_type: RecordType,
        content: String,
    },
}

impl ImportId {
    /// Zone named by the identifier
    pub fn zone(&self) -> &str {
        match self {
            ImportId::ById { zone, .. }
            | ImportId::ByServiceId { zone, .. }
            | ImportId::ByNameType { zone, .. }
            | ImportId::ByServiceNameType { zone, .. }
            | ImportId::ByServiceNameTypeContent { zone, .. } => zone,
        }
    }

    /// Service key, if the identifier names one
    pub fn service(&self) -> Option<&str> {
        match self {
            ImportId::ById { .. } | ImportId::ByNameType { .. } => None,
            ImportId::ByServiceId { service, .. }
            | ImportId::ByServiceNameType { service, .. }
            | ImportId::ByServiceNameTypeContent { service, .. } => Some(service),
        }
    }

    /// Effective routing key
    pub fn target(&self) -> &str {
        zone_target(self.zone(), self.service())
    }
}

fn parse_id(raw: &str, input: &str) -> Result<RecordId> {
    match raw.parse::<RecordId>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(Error::invalid_import_id(format!(
            "{input:?}: expected a positive numeric record ID, got {raw:?}"
        ))),
    }
}

fn parse_type(raw: &str, input: &str) -> Result<RecordType> {
    raw.parse().map_err(|_| {
        Error::invalid_import_id(format!("{input:?}: unsupported record type {raw:?}"))
    })
}

fn non_empty<'a>(raw: &'a str, what: &str, input: &str) -> Result<&'a str> {
    if raw.is_empty() {
        return Err(Error::invalid_import_id(format!("{input:?}: {what} is empty")));
    }
    Ok(raw)
}

impl FromStr for ImportId {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.trim().splitn(5, ':').collect();

        match parts.as_slice() {
            [zone, id] => Ok(ImportId::ById {
                zone: non_empty(zone, "zone", input)?.to_string(),
                id: parse_id(id, input)?,
            }),
            [zone, middle, last] => {
                let zone = non_empty(zone, "zone", input)?.to_string();
                if RecordType::is_type_token(last) {
                    Ok(ImportId::ByNameType {
                        zone,
                        name: middle.to_string(),
                        record_type: parse_type(last, input)?,
                    })
                } else {
                    Ok(ImportId::ByServiceId {
                        zone,
                        service: non_empty(middle, "service", input)?.to_string(),
                        id: parse_id(last, input)?,
                    })
                }
            }
            [zone, service, name, record_type] => Ok(ImportId::ByServiceNameType {
                zone: non_empty(zone, "zone", input)?.to_string(),
                service: non_empty(service, "service", input)?.to_string(),
                name: name.to_string(),
                record_type: parse_type(record_type, input)?,
            }),
            [zone, service, name, record_type, content] => Ok(ImportId::ByServiceNameTypeContent {
                zone: non_empty(zone, "zone", input)?.to_string(),
                service: non_empty(service, "service", input)?.to_string(),
                name: name.to_string(),
                record_type: parse_type(record_type, input)?,
                content: non_empty(content, "content", input)?.to_string(),
            }),
            _ => Err(Error::invalid_import_id(format!(
                "{input:?}: expected zone:id, zone:service:id, zone:name:type, \
                 zone:service:name:type or zone:service:name:type:content"
            ))),
        }
    }
}

impl fmt::Display for ImportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportId::ById { zone, id } => write!(f, "{zone}:{id}"),
            ImportId::ByServiceId { zone, service, id } => write!(f, "{zone}:{service}:{id}"),
            ImportId::ByNameType { zone, name, record_type } => {
                write!(f, "{zone}:{name}:{record_type}")
            }
            ImportId::ByServiceNameType {
                zone,
                service,
                name,
                record_type,
            } => write!(f, "{zone}:{service}:{name}:{record_type}"),
            ImportId::ByServiceNameTypeContent {
                zone,
                service,
                name,
                record_type,
                content,
            } => write!(f, "{zone}:{service}:{name}:{record_type}:{content}"),
        }
    }
}

/// Resolves import identifiers to concrete records
pub struct ImportResolver {
    api: Arc<dyn RecordApi>,
}

impl ImportResolver {
    /// Create a resolver over a record API client
    pub fn new(api: Arc<dyn RecordApi>) -> Self {
        Self { api }
    }

    /// Resolve an identifier to a record reference that can seed a read
    pub async fn resolve(&self, id: &ImportId) -> Result<RecordRef> {
        match id {
            ImportId::ById { zone, id } => Ok(RecordRef {
                domain: zone.clone(),
                service: None,
                id: *id,
                name: None,
                record_type: None,
            }),
            ImportId::ByServiceId { zone, service, id } => Ok(RecordRef {
                domain: zone.clone(),
                service: Some(service.clone()),
                id: *id,
                name: None,
                record_type: None,
            }),
            ImportId::ByNameType { zone, name, record_type } => {
                self.lookup(zone, None, name, *record_type, None).await
            }
            ImportId::ByServiceNameType {
                zone,
                service,
                name,
                record_type,
            } => self.lookup(zone, Some(service), name, *record_type, None).await,
            ImportId::ByServiceNameTypeContent {
                zone,
                service,
                name,
                record_type,
                content,
            } => {
                self.lookup(zone, Some(service), name, *record_type, Some(content))
                    .await
            }
        }
    }

    async fn lookup(
        &self,
        zone: &str,
        service: Option<&String>,
        name: &str,
        record_type: RecordType,
        content: Option<&String>,
    ) -> Result<RecordRef> {
        let target = zone_target(zone, service.map(String::as_str));
        let wanted = naming::zone_relative(name, zone);
        let query = format!("{} record {} in {}", record_type, wanted, zone);

        let filter = ListFilter::new()
            .name(naming::to_api_name(&wanted))
            .record_type(record_type.as_str());
        let matches: Vec<ApiRecord> = self
            .api
            .list_records(target, &filter)
            .await?
            .into_iter()
            .filter(|rec| rec.usable_id().is_some())
            .filter(|rec| rec.record_type.eq_ignore_ascii_case(record_type.as_str()))
            .filter(|rec| naming::zone_relative(&rec.name, zone).eq_ignore_ascii_case(&wanted))
            .collect();

        debug!("Import lookup for {} found {} candidate(s)", query, matches.len());

        let chosen = match (matches.len(), content) {
            (0, _) => return Err(Error::not_found(query)),
            (1, _) => first(matches),
            (_, Some(content)) => {
                let narrowed: Vec<ApiRecord> = matches
                    .into_iter()
                    .filter(|rec| content_matches(rec, content))
                    .collect();
                match narrowed.len() {
                    0 => {
                        return Err(Error::not_found(format!(
                            "{query} with content {content:?}"
                        )));
                    }
                    1 => first(narrowed),
                    _ => return Err(ambiguous(query, &narrowed)),
                }
            }
            (_, None) => return Err(ambiguous(query, &matches)),
        };

        let id = chosen
            .and_then(|rec| rec.usable_id())
            .ok_or_else(|| Error::not_found(format!("{query} has no ID")))?;

        Ok(RecordRef {
            domain: zone.to_string(),
            service: service.cloned(),
            id,
            name: Some(wanted),
            record_type: Some(record_type),
        })
    }
}

fn first(records: Vec<ApiRecord>) -> Option<ApiRecord> {
    records.into_iter().next()
}

/// Case-insensitive match against content or CAA value
fn content_matches(rec: &ApiRecord, content: &str) -> bool {
    let hit = |field: Option<&String>| field.is_some_and(|v| v.eq_ignore_ascii_case(content));
    hit(rec.content.as_ref().value()) || hit(rec.caa_value.as_ref().value())
}

fn ambiguous(query: String, records: &[ApiRecord]) -> Error {
    Error::Ambiguous {
        query,
        candidates: records
            .iter()
            .filter_map(|rec| {
                rec.usable_id().map(|id| Candidate {
                    id,
                    content: rec.display_content(),
                })
            })
            .collect(),
    }
}
