use serde::{Deserialize, Serialize};

pub type EntityId = String;

/// Settings schema that holds the key requests of a service. Every written
/// object targets it.
pub const KEY_REQUEST_SCHEMA_ID: &str = "builtin:settings.subscriptions.service";

/// A single row of the input file, before any validation.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the input file.
    pub line: u64,
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new<I, F>(line: u64, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        RawRow {
            line,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RowError {
    #[error("line {line}: expected 2 fields, found {found}")]
    MissingFields { line: u64, found: usize },
    #[error("line {line}: entity selector is empty")]
    EmptySelector { line: u64 },
    #[error("line {line}: request name is empty")]
    EmptyRequestName { line: u64 },
}

/// A data row mapping one entity selector to one request name.
#[derive(Clone, Debug, PartialEq)]
pub struct InputRow {
    pub entity_selector: String,
    pub request_name: String,
}

impl TryFrom<RawRow> for InputRow {
    type Error = RowError;

    fn try_from(row: RawRow) -> Result<Self, Self::Error> {
        let line = row.line;
        let found = row.fields.len();

        // Fields past the second are ignored
        let mut fields = row.fields.into_iter();
        let (Some(entity_selector), Some(request_name)) = (fields.next(), fields.next()) else {
            return Err(RowError::MissingFields { line, found });
        };

        if entity_selector.is_empty() {
            return Err(RowError::EmptySelector { line });
        }
        if request_name.is_empty() {
            return Err(RowError::EmptyRequestName { line });
        }

        Ok(InputRow {
            entity_selector,
            request_name,
        })
    }
}

/// All request names collected for one distinct entity selector.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationRecord {
    pub entity_selector: String,
    pub request_names: Vec<String>,
}

/// Outcome of looking up the entities behind one selector. Serialized in the
/// same camelCase as the record it is flattened next to.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "outcome")]
pub enum Resolution {
    Matched { entity_ids: Vec<EntityId> },
    NoMatch,
    Failed { reason: String },
}

impl Resolution {
    pub fn entity_ids(&self) -> &[EntityId] {
        match self {
            Resolution::Matched { entity_ids } => entity_ids,
            Resolution::NoMatch | Resolution::Failed { .. } => &[],
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::Matched { .. } => "matched",
            Resolution::NoMatch => "no_match",
            Resolution::Failed { .. } => "failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedRecord {
    #[serde(flatten)]
    pub record: AggregationRecord,
    pub resolution: Resolution,
}

/// A single settings object as accepted by the settings write endpoint. It
/// borrows the request names of the record it was built from.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteObject<'a> {
    pub schema_id: &'a str,
    pub scope: &'a str,
    pub value: KeyRequestValue<'a>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRequestValue<'a> {
    pub key_request_names: &'a [String],
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub entity_id: EntityId,
}

/// First page of an entity query response.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityPage {
    pub total_count: u64,
    #[serde(default)]
    pub entities: Vec<Entity>,
    pub next_page_key: Option<String>,
}
