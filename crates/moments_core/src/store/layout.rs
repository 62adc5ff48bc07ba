//! On-disk record layout.
//!
//! # Responsibility
//! - Map moments to directory/file paths and to the `moment.json` schema.
//! - Classify collection entry names (record, staging, trash, other).
//!
//! # Invariants
//! - Pure: nothing here touches the filesystem.
//! - Staging and trash names start with `.` and can never parse as an id.
//! - `decode` never panics on missing keys; it returns `DecodeError`.
//!
//! Layout:
//! ```text
//! <app_dir>/moments/<id>/photo.jpg
//! <app_dir>/moments/<id>/moment.json
//! ```

use crate::model::moment::{GeoError, GeoPoint, Moment, PHOTO_FILE_NAME};
use crate::model::moment_id::{IdError, MomentId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const COLLECTION_DIR_NAME: &str = "moments";
pub const METADATA_FILE_NAME: &str = "moment.json";

const STAGING_PREFIX: &str = ".staging-";
const TRASH_PREFIX: &str = ".trash-";

/// Metadata decoding failures.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Not JSON, or a field has the wrong JSON type.
    Malformed(String),
    /// A required key is absent or `null`.
    MissingField(&'static str),
    InvalidId(IdError),
    /// Only one of `latitude` / `longitude` is present.
    UnpairedCoordinates,
    InvalidCoordinates(GeoError),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "malformed metadata: {message}"),
            Self::MissingField(name) => write!(f, "metadata is missing `{name}`"),
            Self::InvalidId(err) => write!(f, "{err}"),
            Self::UnpairedCoordinates => {
                write!(f, "metadata has only one of latitude/longitude")
            }
            Self::InvalidCoordinates(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidId(err) => Some(err),
            Self::InvalidCoordinates(err) => Some(err),
            _ => None,
        }
    }
}

/// Wire shape of `moment.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentRecord {
    pub id: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub created_at: i64,
    pub photo: String,
}

impl From<&Moment> for MomentRecord {
    fn from(moment: &Moment) -> Self {
        Self {
            id: moment.id.to_string(),
            description: moment.description.clone(),
            latitude: moment.latitude(),
            longitude: moment.longitude(),
            created_at: moment.created_at,
            photo: moment.photo.clone(),
        }
    }
}

/// Lenient read shape: every key optional so absence maps to typed errors.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    photo: Option<String>,
}

/// What a child name of the collection root denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryName {
    Record(MomentId),
    Staging,
    Trash,
    Other,
}

pub fn collection_root(app_dir: &Path) -> PathBuf {
    app_dir.join(COLLECTION_DIR_NAME)
}

pub fn directory_for(root: &Path, id: &MomentId) -> PathBuf {
    root.join(id.as_str())
}

pub fn image_path_for(moment_dir: &Path) -> PathBuf {
    moment_dir.join(PHOTO_FILE_NAME)
}

pub fn metadata_path_for(moment_dir: &Path) -> PathBuf {
    moment_dir.join(METADATA_FILE_NAME)
}

/// Fresh hidden name for a record being assembled.
pub fn staging_name() -> String {
    format!("{STAGING_PREFIX}{}", Uuid::new_v4().simple())
}

/// Fresh hidden name for a record being removed.
pub fn trash_name(id: &MomentId) -> String {
    format!("{TRASH_PREFIX}{id}-{}", Uuid::new_v4().simple())
}

pub fn classify_entry(name: &str) -> EntryName {
    if name.starts_with(STAGING_PREFIX) {
        return EntryName::Staging;
    }
    if name.starts_with(TRASH_PREFIX) {
        return EntryName::Trash;
    }
    match MomentId::parse(name) {
        Ok(id) => EntryName::Record(id),
        Err(_) => EntryName::Other,
    }
}

/// Serializes a moment into `moment.json` bytes.
pub fn encode(moment: &Moment) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec_pretty(&MomentRecord::from(moment))
}

/// Parses `moment.json` bytes.
///
/// Missing `description` decodes as empty and missing `photo` as the fixed
/// image name; `id` and `createdAt` are required.
pub fn decode(bytes: &[u8]) -> Result<Moment, DecodeError> {
    let raw: RawRecord =
        serde_json::from_slice(bytes).map_err(|err| DecodeError::Malformed(err.to_string()))?;

    let id_text = raw.id.ok_or(DecodeError::MissingField("id"))?;
    let id = MomentId::parse(&id_text).map_err(DecodeError::InvalidId)?;
    let created_at = raw.created_at.ok_or(DecodeError::MissingField("createdAt"))?;

    let location = match (raw.latitude, raw.longitude) {
        (Some(latitude), Some(longitude)) => Some(
            GeoPoint::new(latitude, longitude).map_err(DecodeError::InvalidCoordinates)?,
        ),
        (None, None) => None,
        _ => return Err(DecodeError::UnpairedCoordinates),
    };

    Ok(Moment {
        id,
        description: raw.description.unwrap_or_default(),
        created_at,
        location,
        photo: raw.photo.unwrap_or_else(|| PHOTO_FILE_NAME.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::{classify_entry, decode, encode, staging_name, trash_name, DecodeError, EntryName};
    use crate::model::moment::{GeoPoint, Moment};
    use crate::model::moment_id::MomentId;

    #[test]
    fn encode_omits_absent_coordinates() {
        let moment = Moment::new(MomentId::parse("1700000000000").unwrap(), "hi", None);
        let json: serde_json::Value = serde_json::from_slice(&encode(&moment).unwrap()).unwrap();
        assert_eq!(json["id"], "1700000000000");
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(json["photo"], "photo.jpg");
        assert!(json.get("latitude").is_none());
        assert!(json.get("longitude").is_none());
    }

    #[test]
    fn encode_then_decode_preserves_location() {
        let point = GeoPoint::new(37.8, -122.4).unwrap();
        let moment = Moment::new(MomentId::parse("1700000000000-0003").unwrap(), "pier", Some(point));
        assert_eq!(decode(&encode(&moment).unwrap()).unwrap(), moment);
    }

    #[test]
    fn decode_accepts_null_coordinates_and_missing_description() {
        let moment = decode(br#"{"id":"1700000000000","createdAt":5,"latitude":null}"#).unwrap();
        assert_eq!(moment.description, "");
        assert_eq!(moment.photo, "photo.jpg");
        assert!(moment.location.is_none());
    }

    #[test]
    fn decode_reports_missing_required_fields() {
        assert_eq!(
            decode(br#"{"createdAt":5}"#).unwrap_err(),
            DecodeError::MissingField("id")
        );
        assert_eq!(
            decode(br#"{"id":"1700000000000"}"#).unwrap_err(),
            DecodeError::MissingField("createdAt")
        );
    }

    #[test]
    fn decode_rejects_unpaired_and_garbage() {
        assert_eq!(
            decode(br#"{"id":"1700000000000","createdAt":5,"latitude":1.0}"#).unwrap_err(),
            DecodeError::UnpairedCoordinates
        );
        assert!(matches!(
            decode(b"{not json").unwrap_err(),
            DecodeError::Malformed(_)
        ));
        assert!(matches!(
            decode(br#"{"id":"nope","createdAt":5}"#).unwrap_err(),
            DecodeError::InvalidId(_)
        ));
    }

    #[test]
    fn hidden_names_never_classify_as_records() {
        let id = MomentId::parse("1700000000000").unwrap();
        assert_eq!(classify_entry(&staging_name()), EntryName::Staging);
        assert_eq!(classify_entry(&trash_name(&id)), EntryName::Trash);
        assert_eq!(classify_entry("1700000000000"), EntryName::Record(id));
        assert_eq!(classify_entry("notes.txt"), EntryName::Other);
    }
}
