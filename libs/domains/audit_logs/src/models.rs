use chrono::{DateTime, NaiveDate, Utc};
use database::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// Kind of change an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum AuditAction {
    Creation,
    Update,
    Deletion,
    Restock,
}

/// One recorded change to a row of another table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub audit_log_id: Uuid,
    pub table_name: String,
    pub record_id: Uuid,
    pub action: AuditAction,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub changed_by: Option<Uuid>,
    pub changed_date: DateTime<Utc>,
    pub description: Option<String>,
}

impl AuditLog {
    pub fn new(table_name: impl Into<String>, record_id: Uuid, action: AuditAction) -> Self {
        Self {
            audit_log_id: Uuid::new_v4(),
            table_name: table_name.into(),
            record_id,
            action,
            old_values: None,
            new_values: None,
            changed_by: None,
            changed_date: Utc::now(),
            description: None,
        }
    }

    pub fn with_values(mut self, old_values: impl Into<String>, new_values: impl Into<String>) -> Self {
        self.old_values = Some(old_values.into());
        self.new_values = Some(new_values.into());
        self
    }

    pub fn changed_by(mut self, user_id: Option<Uuid>) -> Self {
        self.changed_by = user_id;
        self
    }

    pub fn changed_at(mut self, changed_date: DateTime<Utc>) -> Self {
        self.changed_date = changed_date;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Entity for AuditLog {
    type Key = Uuid;
    const NAME: &'static str = "AuditLog";

    fn key(&self) -> Uuid {
        self.audit_log_id
    }
}

/// A single field that differs between the old and new snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogDto {
    pub audit_log_id: Uuid,
    pub table_name: String,
    pub record_id: Uuid,
    pub action: AuditAction,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub changed_by: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub description: Option<String>,
    pub changes: Vec<FieldChange>,
}

impl From<AuditLog> for AuditLogDto {
    fn from(log: AuditLog) -> Self {
        let changes = field_changes(log.old_values.as_deref(), log.new_values.as_deref());
        Self {
            audit_log_id: log.audit_log_id,
            table_name: log.table_name,
            record_id: log.record_id,
            action: log.action,
            old_values: log.old_values,
            new_values: log.new_values,
            changed_by: log.changed_by,
            timestamp: log.changed_date,
            description: log.description,
            changes,
        }
    }
}

/// Filters for the audit log listing. Every filter is optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct GetAuditLogsQuery {
    #[validate(length(max = 100))]
    pub table_name: Option<String>,
    pub record_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    #[validate(length(max = 200))]
    pub search: Option<String>,
    pub changed_by: Option<Uuid>,
    /// First day included
    pub from_date: Option<NaiveDate>,
    /// Last day included
    pub to_date: Option<NaiveDate>,
    pub page: u32,
    pub page_size: u32,
}

impl mediator::Request for GetAuditLogsQuery {
    type Response = mediator::PaginatedResponse<AuditLogDto>;
}

const SKIPPED_FIELDS: [&str; 8] = [
    "Id",
    "CreatedDate",
    "ModifiedDate",
    "CreatedBy",
    "ModifiedBy",
    "AuditId",
    "ChangedBy",
    "ChangedDate",
];

/// Diff two JSON object snapshots.
///
/// Snapshots that are absent or not JSON objects contribute no fields.
/// Bookkeeping fields (ids, timestamps, authorship) are left out. Results are
/// ordered by field name.
pub fn field_changes(old_values: Option<&str>, new_values: Option<&str>) -> Vec<FieldChange> {
    let old = parse_snapshot(old_values);
    let new = parse_snapshot(new_values);
    if old.is_none() && new.is_none() {
        return Vec::new();
    }

    let mut fields: Vec<&String> = old
        .iter()
        .chain(new.iter())
        .flat_map(|snapshot| snapshot.keys())
        .collect();
    fields.sort();
    fields.dedup();

    fields
        .into_iter()
        .filter(|field| {
            let lowered = field.to_lowercase();
            !SKIPPED_FIELDS
                .iter()
                .any(|skipped| lowered.contains(&skipped.to_lowercase()))
        })
        .filter_map(|field| {
            let old_value = old.as_ref().and_then(|s| s.get(field)).and_then(format_value);
            let new_value = new.as_ref().and_then(|s| s.get(field)).and_then(format_value);
            (old_value != new_value).then(|| FieldChange {
                field: readable_field_name(field),
                old_value,
                new_value,
            })
        })
        .collect()
}

fn parse_snapshot(raw: Option<&str>) -> Option<serde_json::Map<String, Value>> {
    match serde_json::from_str(raw?.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn format_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(true) => Some("Yes".to_string()),
        Value::Bool(false) => Some("No".to_string()),
        Value::Number(number) => Some(match number.as_f64() {
            Some(n) if number.is_f64() => format!("{:.2}", n),
            _ => number.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

/// `"MaterialCode"` -> `"Material Code"`, `"WIRNumber"` -> `"WIR Number"`
fn readable_field_name(field: &str) -> String {
    let chars: Vec<char> = field.chars().collect();
    let mut readable = String::with_capacity(field.len() + 4);
    for (index, &current) in chars.iter().enumerate() {
        if index > 0 && current.is_uppercase() {
            let previous = chars[index - 1];
            let next_is_lower = chars.get(index + 1).is_some_and(|c| c.is_lowercase());
            if previous.is_lowercase() || previous.is_ascii_digit() || (previous.is_uppercase() && next_is_lower) {
                readable.push(' ');
            }
        }
        readable.push(current);
    }
    readable
}
