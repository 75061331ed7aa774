//! Typed records built from the API's raw JSON.
//!
//! The API wraps nearly every field in a one-element array
//! (`"title": ["Dentary Teeth"]`). Records are normalized here, at the
//! ingestion boundary: each typed field holds the first element, and a
//! missing, null or empty field is `None`. The untouched map stays in `data`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::ApiError;

/// A record exactly as the API returned it
pub type RawRecord = Map<String, Value>;

/// Envelope key of a biological specimen in a single-object response
pub const BIOLOGICAL_SPECIMEN_KEY: &str = "biological_specimen";

/// Envelope key of a cultural heritage object in a single-object response
pub const CULTURAL_HERITAGE_OBJECT_KEY: &str = "cultural_heritage_object";

/// `object_type` value of biological specimens
pub const BIOLOGICAL_SPECIMEN_TYPE: &str = "Biological Specimen";

/// `object_type` value of cultural heritage objects
pub const CULTURAL_HERITAGE_OBJECT_TYPE: &str = "Cultural Heritage Object";

/// Read `key` as a single scalar, unwrapping a one-element array.
pub fn scalar_field(data: &RawRecord, key: &str) -> Option<String> {
    let value = match data.get(key)? {
        Value::Array(values) => values.first()?,
        other => other,
    };

    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn into_object(value: Value, what: &str) -> Result<RawRecord, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Parse(format!(
            "Expected {} to be a JSON object, got {}",
            what, other
        ))),
    }
}

/// Publication status of a media record.
///
/// The MorphoSource UI calls this "Publication".
pub struct DownloadVisibility;

impl DownloadVisibility {
    pub const OPEN: &'static str = "Open Download";
    pub const RESTRICTED: &'static str = "Restricted Download";
}

/// A digitized dataset item: a scan, mesh or CT volume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: Option<String>,
    pub title: Option<String>,
    pub media_type: Option<String>,
    pub visibility: Option<String>,
    pub physical_object_id: Option<String>,
    pub data: RawRecord,
}

impl Media {
    pub fn from_raw(data: RawRecord) -> Self {
        Self {
            id: scalar_field(&data, "id"),
            title: scalar_field(&data, "title"),
            media_type: scalar_field(&data, "media_type"),
            visibility: scalar_field(&data, "visibility"),
            physical_object_id: scalar_field(&data, "physical_object_id"),
            data,
        }
    }

    /// Whether anyone with an API key may download the bundle
    pub fn is_open_download(&self) -> bool {
        self.visibility.as_deref().is_some_and(|v| {
            v == DownloadVisibility::OPEN || v.eq_ignore_ascii_case("open")
        })
    }

    /// Whether this media depicts the physical object `object_id`
    pub fn belongs_to(&self, object_id: &str) -> bool {
        self.physical_object_id.as_deref() == Some(object_id)
    }
}

impl TryFrom<Value> for Media {
    type Error = ApiError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(Self::from_raw(into_object(value, "media record")?))
    }
}

/// Fields every physical object has
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub object_type: Option<String>,
    pub data: RawRecord,
}

impl ObjectRecord {
    fn from_raw(data: RawRecord) -> Self {
        let object_type = ["object_type", "physical_object_type", "human_readable_type", "type"]
            .iter()
            .find_map(|key| scalar_field(&data, key));

        Self {
            id: scalar_field(&data, "id"),
            title: scalar_field(&data, "title"),
            object_type,
            data,
        }
    }
}

/// A real-world specimen or artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhysicalObject {
    BiologicalSpecimen {
        #[serde(flatten)]
        record: ObjectRecord,
        taxonomy: Option<String>,
    },
    CulturalHeritageObject {
        #[serde(flatten)]
        record: ObjectRecord,
    },
}

impl PhysicalObject {
    pub fn biological_specimen(data: RawRecord) -> Self {
        let taxonomy = scalar_field(&data, "taxonomy");
        PhysicalObject::BiologicalSpecimen {
            record: ObjectRecord::from_raw(data),
            taxonomy,
        }
    }

    pub fn cultural_heritage_object(data: RawRecord) -> Self {
        PhysicalObject::CulturalHeritageObject {
            record: ObjectRecord::from_raw(data),
        }
    }

    /// Build from the `response` body of a single-object fetch.
    ///
    /// The envelope key present decides the variant.
    pub fn from_envelope(mut response: Value) -> Result<Self, ApiError> {
        if let Some(data) = response.get_mut(BIOLOGICAL_SPECIMEN_KEY).map(Value::take) {
            return Ok(Self::biological_specimen(into_object(
                data,
                BIOLOGICAL_SPECIMEN_KEY,
            )?));
        }
        if let Some(data) = response
            .get_mut(CULTURAL_HERITAGE_OBJECT_KEY)
            .map(Value::take)
        {
            return Ok(Self::cultural_heritage_object(into_object(
                data,
                CULTURAL_HERITAGE_OBJECT_KEY,
            )?));
        }
        Err(ApiError::Parse(format!(
            "Response has neither '{}' nor '{}'",
            BIOLOGICAL_SPECIMEN_KEY, CULTURAL_HERITAGE_OBJECT_KEY
        )))
    }

    /// Build from one item of a search page.
    ///
    /// Search items carry no envelope key, so the variant comes from the
    /// object type field, falling back to the presence of a taxonomy.
    pub fn from_search_item(data: RawRecord) -> Self {
        let record = ObjectRecord::from_raw(data);
        let normalized: Option<String> = record.object_type.as_ref().map(|t| {
            t.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        });

        let is_specimen = match normalized.as_deref() {
            Some("biologicalspecimen") => true,
            Some("culturalheritageobject") => false,
            _ => scalar_field(&record.data, "taxonomy").is_some(),
        };

        if is_specimen {
            let taxonomy = scalar_field(&record.data, "taxonomy");
            PhysicalObject::BiologicalSpecimen { record, taxonomy }
        } else {
            PhysicalObject::CulturalHeritageObject { record }
        }
    }

    pub fn record(&self) -> &ObjectRecord {
        match self {
            PhysicalObject::BiologicalSpecimen { record, .. }
            | PhysicalObject::CulturalHeritageObject { record } => record,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.record().id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.record().title.as_deref()
    }

    pub fn object_type(&self) -> Option<&str> {
        self.record().object_type.as_deref()
    }

    /// Taxonomy; only biological specimens have one
    pub fn taxonomy(&self) -> Option<&str> {
        match self {
            PhysicalObject::BiologicalSpecimen { taxonomy, .. } => taxonomy.as_deref(),
            PhysicalObject::CulturalHeritageObject { .. } => None,
        }
    }

    pub fn data(&self) -> &RawRecord {
        &self.record().data
    }
}

impl TryFrom<Value> for PhysicalObject {
    type Error = ApiError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(Self::from_search_item(into_object(value, "physical object")?))
    }
}
