//! Test doubles and common utilities for reconciler contract tests
//!
//! `MockRecordApi` keeps remote records in memory, answers like the real
//! API, and records every call so tests can assert on what was sent.

#![allow(dead_code)]

use a24dns_core::error::{Error, Result};
use a24dns_core::naming;
use a24dns_core::{ApiRecord, DesiredRecord, Field, ListFilter, RecordApi, RecordId, RecordPayload, RecordType};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// One call made against the mock
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { target: String, payload: RecordPayload },
    Get { target: String, id: RecordId },
    Update { target: String, id: RecordId, payload: RecordPayload },
    Delete { target: String, id: RecordId },
    List { target: String, filter: ListFilter },
}

/// How the mock spells record names in its answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// `www`, empty for the apex
    Relative,
    /// `www.example.com`, `example.com` for the apex
    Qualified,
    /// `www.example.com.`, `example.com.` for the apex
    QualifiedDot,
}

/// Knobs for API quirks
#[derive(Debug, Clone)]
pub struct Quirks {
    /// Create answers with an empty body
    pub empty_create_body: bool,
    /// Create answers with `id: 0`
    pub zero_create_id: bool,
    /// Update answers with an empty body
    pub empty_update_body: bool,
    /// Single-record GET answers 500
    pub get_fails: bool,
    /// List answers 503
    pub list_fails: bool,
    /// TTL reported in answers regardless of what was stored
    pub reported_ttl: Option<u32>,
    /// Omit `priority` from answers
    pub omit_priority: bool,
    /// Name spelling in answers
    pub names: NameStyle,
}

impl Default for Quirks {
    fn default() -> Self {
        Self {
            empty_create_body: false,
            zero_create_id: false,
            empty_update_body: false,
            get_fails: false,
            list_fails: false,
            reported_ttl: None,
            omit_priority: false,
            names: NameStyle::Relative,
        }
    }
}

/// In-memory record API
pub struct MockRecordApi {
    /// (target, record) pairs; names stored in API (relative) form
    records: Mutex<Vec<(String, ApiRecord)>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicU64,
    quirks: Mutex<Quirks>,
}

impl MockRecordApi {
    pub fn new() -> Self {
        Self::with_quirks(Quirks::default())
    }

    pub fn with_quirks(quirks: Quirks) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1000),
            quirks: Mutex::new(quirks),
        }
    }

    /// Change quirks mid-test
    pub fn set_quirks(&self, quirks: Quirks) {
        *self.quirks.lock().unwrap() = quirks;
    }

    /// Seed a remote record; returns its ID
    pub fn seed(&self, target: &str, name: &str, record_type: &str, content: &str) -> RecordId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let rec = ApiRecord {
            id: Some(id),
            name: name.to_string(),
            record_type: record_type.to_string(),
            content: Field::Value(content.to_string()),
            ttl: Field::Value(3600),
            ..ApiRecord::default()
        };
        self.records.lock().unwrap().push((target.to_string(), rec));
        id
    }

    /// Seed a CAA record whose value lives only in `caaValue`
    pub fn seed_caa(&self, target: &str, name: &str, flags: u8, tag: &str, value: &str) -> RecordId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let rec = ApiRecord {
            id: Some(id),
            name: name.to_string(),
            record_type: "CAA".to_string(),
            content: Field::Value(format!("{flags} {tag} \"{value}\"")),
            ttl: Field::Value(3600),
            caa_value: Field::Value(value.to_string()),
            flags: Field::Value(flags),
            tag: Field::Value(tag.to_string()),
            ..ApiRecord::default()
        };
        self.records.lock().unwrap().push((target.to_string(), rec));
        id
    }

    /// Remove a record behind the reconciler's back
    pub fn remove_remote(&self, id: RecordId) {
        self.records.lock().unwrap().retain(|(_, rec)| rec.id != Some(id));
    }

    /// Mutate a stored record
    pub fn edit_remote(&self, id: RecordId, f: impl FnOnce(&mut ApiRecord)) {
        let mut records = self.records.lock().unwrap();
        if let Some((_, rec)) = records.iter_mut().find(|(_, rec)| rec.id == Some(id)) {
            f(rec);
        }
    }

    pub fn stored(&self, id: RecordId) -> Option<ApiRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|(_, rec)| rec.id == Some(id))
            .map(|(_, rec)| rec.clone())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn list_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List { .. }))
            .count()
    }

    /// Every create/update body, serialized as the client would send it
    pub fn sent_bodies(&self) -> Vec<serde_json::Value> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                Call::Create { payload, .. } | Call::Update { payload, .. } => {
                    Some(serde_json::to_value(payload).unwrap())
                }
                _ => None,
            })
            .collect()
    }

    fn record_call(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn quirks(&self) -> Quirks {
        self.quirks.lock().unwrap().clone()
    }

    /// Render a stored record the way the API would answer
    fn answer(&self, target: &str, rec: &ApiRecord) -> ApiRecord {
        let quirks = self.quirks();
        let mut out = rec.clone();
        out.name = match quirks.names {
            NameStyle::Relative => rec.name.clone(),
            NameStyle::Qualified | NameStyle::QualifiedDot => {
                let fqdn = if rec.name.is_empty() {
                    target.to_string()
                } else {
                    format!("{}.{}", rec.name, target)
                };
                if quirks.names == NameStyle::QualifiedDot {
                    format!("{fqdn}.")
                } else {
                    fqdn
                }
            }
        };
        if let Some(ttl) = quirks.reported_ttl {
            out.ttl = Field::Value(ttl);
        }
        if quirks.omit_priority {
            out.priority = Field::Unknown;
        }
        out
    }

    fn not_found() -> Error {
        Error::api("404 Not Found", 404, r#"{"title":"Record not found"}"#)
    }
}

fn from_payload(id: RecordId, payload: &RecordPayload) -> ApiRecord {
    ApiRecord {
        id: Some(id),
        name: payload.name.clone(),
        record_type: payload.record_type.to_string(),
        content: Field::Value(payload.content.clone()),
        ttl: Field::Value(payload.ttl),
        priority: Field::from(payload.priority),
        caa_value: payload.caa_value.clone().map_or(Field::Unknown, Field::Value),
        flags: payload.flags.map_or(Field::Unknown, Field::Value),
        tag: payload.tag.clone().map_or(Field::Unknown, Field::Value),
    }
}

#[async_trait::async_trait]
impl RecordApi for MockRecordApi {
    async fn create_record(&self, target: &str, payload: &RecordPayload) -> Result<Option<ApiRecord>> {
        self.record_call(Call::Create {
            target: target.to_string(),
            payload: payload.clone(),
        });

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let rec = from_payload(id, payload);
        self.records
            .lock()
            .unwrap()
            .push((target.to_string(), rec.clone()));

        let quirks = self.quirks();
        if quirks.empty_create_body {
            return Ok(None);
        }
        let mut answer = self.answer(target, &rec);
        if quirks.zero_create_id {
            answer.id = Some(0);
        }
        Ok(Some(answer))
    }

    async fn get_record(&self, target: &str, id: RecordId) -> Result<ApiRecord> {
        self.record_call(Call::Get {
            target: target.to_string(),
            id,
        });

        if self.quirks().get_fails {
            return Err(Error::api("500 Internal Server Error", 500, "upstream timeout"));
        }
        let found = self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|(t, rec)| t == target && rec.id == Some(id))
            .map(|(_, rec)| rec.clone());
        match found {
            Some(rec) => Ok(self.answer(target, &rec)),
            None => Err(Self::not_found()),
        }
    }

    async fn update_record(&self, target: &str, id: RecordId, payload: &RecordPayload) -> Result<Option<ApiRecord>> {
        self.record_call(Call::Update {
            target: target.to_string(),
            id,
            payload: payload.clone(),
        });

        let updated = {
            let mut records = self.records.lock().unwrap();
            match records.iter_mut().find(|(t, rec)| t == target && rec.id == Some(id)) {
                Some((_, rec)) => {
                    *rec = from_payload(id, payload);
                    rec.clone()
                }
                None => return Err(Self::not_found()),
            }
        };

        if self.quirks().empty_update_body {
            return Ok(None);
        }
        Ok(Some(self.answer(target, &updated)))
    }

    async fn delete_record(&self, target: &str, id: RecordId) -> Result<()> {
        self.record_call(Call::Delete {
            target: target.to_string(),
            id,
        });

        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|(t, rec)| !(t == target && rec.id == Some(id)));
        if records.len() == before {
            return Err(Self::not_found());
        }
        Ok(())
    }

    async fn list_records(&self, target: &str, filter: &ListFilter) -> Result<Vec<ApiRecord>> {
        self.record_call(Call::List {
            target: target.to_string(),
            filter: filter.clone(),
        });

        if self.quirks().list_fails {
            return Err(Error::api("503 Service Unavailable", 503, "maintenance"));
        }

        let wanted_name = filter
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(|n| naming::zone_relative(n, target));

        let matching: Vec<ApiRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, rec)| rec.clone())
            .filter(|rec| {
                wanted_name
                    .as_ref()
                    .is_none_or(|n| naming::zone_relative(&rec.name, target) == *n)
            })
            .filter(|rec| {
                filter
                    .record_type
                    .as_deref()
                    .is_none_or(|t| rec.record_type.eq_ignore_ascii_case(t))
            })
            .filter(|rec| {
                filter
                    .content
                    .as_deref()
                    .is_none_or(|c| rec.content.as_ref().value().is_some_and(|v| v == c))
            })
            .collect();

        Ok(matching.iter().map(|rec| self.answer(target, rec)).collect())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Desired A record at the apex of example.com
pub fn apex_a(content: &str) -> DesiredRecord {
    DesiredRecord::new("example.com", "@", RecordType::A)
        .with_content(content)
        .with_ttl(300)
}

/// Desired CAA record at the apex of example.com
pub fn apex_caa(tag: &str, value: &str) -> DesiredRecord {
    DesiredRecord::new("example.com", "@", RecordType::Caa).with_caa(0, tag, value)
}
