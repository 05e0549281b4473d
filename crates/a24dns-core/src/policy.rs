//! Per-type field policies
//!
//! Which fields are sent, and how API answers are merged back, depends on the
//! record type. The set of behaviours is closed: CAA records carry their data
//! in dedicated `caaValue`/`flags`/`tag` fields, everything else uses
//! `content`. [`policy_for`] is the lookup table.

use crate::error::{Error, Result};
use crate::model::{ApiRecord, DesiredRecord, Field, ObservedRecord, RecordPayload, RecordType};
use crate::naming;

/// Field handling for one family of record types
pub trait RecordPolicy: Send + Sync {
    /// Reject desired state that cannot be sent
    fn validate(&self, desired: &DesiredRecord) -> Result<()>;

    /// Build the full-replacement body for create/update
    fn payload(&self, desired: &DesiredRecord) -> RecordPayload;

    /// Set type-specific fields after a create or update.
    ///
    /// `observed` starts from the desired values; `api` is the record the
    /// API answered with, if any.
    fn apply_written(&self, observed: &mut ObservedRecord, desired: &DesiredRecord, api: Option<&ApiRecord>);

    /// Set type-specific fields after a read; `observed` holds prior state.
    fn apply_read(&self, observed: &mut ObservedRecord, api: &ApiRecord);
}

/// Records whose data lives in `content`
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPolicy;

/// CAA records: `caaValue`, `flags` and `tag`; `content` is transport only
#[derive(Debug, Clone, Copy, Default)]
pub struct CaaPolicy;

static PLAIN: PlainPolicy = PlainPolicy;
static CAA: CaaPolicy = CaaPolicy;

/// Policy for a record type
pub fn policy_for(record_type: RecordType) -> &'static dyn RecordPolicy {
    match record_type {
        RecordType::Caa => &CAA,
        _ => &PLAIN,
    }
}

fn base_payload(desired: &DesiredRecord, content: String) -> RecordPayload {
    RecordPayload {
        name: naming::to_api_name(&desired.name),
        record_type: desired.record_type,
        content,
        ttl: desired.ttl,
        priority: desired.priority,
        caa_value: None,
        flags: None,
        tag: None,
    }
}

impl RecordPolicy for PlainPolicy {
    fn validate(&self, desired: &DesiredRecord) -> Result<()> {
        match desired.content.as_deref() {
            Some(content) if !content.trim().is_empty() => Ok(()),
            _ => Err(Error::validation(format!(
                "content is required for {} records ({} in {})",
                desired.record_type, desired.name, desired.domain
            ))),
        }
    }

    fn payload(&self, desired: &DesiredRecord) -> RecordPayload {
        base_payload(desired, desired.content.clone().unwrap_or_default())
    }

    fn apply_written(&self, observed: &mut ObservedRecord, desired: &DesiredRecord, _api: Option<&ApiRecord>) {
        observed.content = Field::from(desired.content.clone());
        clear_caa(observed);
    }

    fn apply_read(&self, observed: &mut ObservedRecord, api: &ApiRecord) {
        observed.content = std::mem::take(&mut observed.content).resync(api.content.clone());
        clear_caa(observed);
    }
}

fn clear_caa(observed: &mut ObservedRecord) {
    observed.caa_value = Field::Null;
    observed.caa_flags = Field::Null;
    observed.caa_tag = Field::Null;
}

impl CaaPolicy {
    /// The value that identifies the record: `caa_value`, else `content`
    fn value_of(desired: &DesiredRecord) -> Option<String> {
        desired
            .caa_value
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| desired.content.clone().filter(|c| !c.is_empty()))
    }
}

impl RecordPolicy for CaaPolicy {
    fn validate(&self, desired: &DesiredRecord) -> Result<()> {
        if Self::value_of(desired).is_none() {
            return Err(Error::validation(format!(
                "caa_value is required for CAA records ({} in {})",
                desired.name, desired.domain
            )));
        }
        Ok(())
    }

    fn payload(&self, desired: &DesiredRecord) -> RecordPayload {
        // content mirrors the CAA value, never anything else
        let value = Self::value_of(desired).unwrap_or_default();
        let mut payload = base_payload(desired, value.clone());
        payload.caa_value = Some(value);
        payload.flags = desired.caa_flags;
        payload.tag = desired.caa_tag.clone();
        payload
    }

    fn apply_written(&self, observed: &mut ObservedRecord, desired: &DesiredRecord, api: Option<&ApiRecord>) {
        observed.content = Field::Null;
        observed.caa_value = Field::from(Self::value_of(desired));
        observed.caa_flags = Field::from(desired.caa_flags);
        observed.caa_tag = Field::from(desired.caa_tag.clone());

        if let Some(api) = api {
            merge_caa(observed, api);
        }
    }

    fn apply_read(&self, observed: &mut ObservedRecord, api: &ApiRecord) {
        observed.content = Field::Null;
        merge_caa(observed, api);
    }
}

/// Overwrite CAA fields only with populated API values
fn merge_caa(observed: &mut ObservedRecord, api: &ApiRecord) {
    let value = match api.caa_value.clone().non_empty() {
        Field::Value(v) => Field::Value(v),
        _ => api.content.clone().non_empty(),
    };
    observed.caa_value = std::mem::take(&mut observed.caa_value).or_keep(value);
    observed.caa_flags = std::mem::take(&mut observed.caa_flags).or_keep(api.flags.clone());
    observed.caa_tag = std::mem::take(&mut observed.caa_tag).or_keep(api.tag.clone().non_empty());
}
