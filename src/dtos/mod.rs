use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod propertydtos;

/// Tri-state wrapper for nullable fields in partial-update payloads.
///
/// JSON updates need three cases per nullable field: the key is missing
/// (leave the current value alone), the key is `null` (clear the value),
/// or the key carries a value (replace). A plain `Option` collapses the
/// first two, so update DTOs use `Patch` for every clearable field:
///
/// ```
/// use bien_core::dtos::Patch;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Dto {
///     #[serde(default)]
///     note: Patch<String>,
/// }
///
/// let d: Dto = serde_json::from_str(r#"{}"#).unwrap();
/// assert!(d.note.is_absent());
/// let d: Dto = serde_json::from_str(r#"{"note":null}"#).unwrap();
/// assert_eq!(d.note, Patch::Null);
/// let d: Dto = serde_json::from_str(r#"{"note":"hi"}"#).unwrap();
/// assert_eq!(d.note, Patch::Value("hi".into()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    /// Field not present in the payload; keep the current value.
    Absent,
    /// Field explicitly set to `null`; clear the current value.
    Null,
    /// Field carries a replacement value.
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(v),
        }
    }

    /// Overlay this patch onto the current value: `Absent` keeps it,
    /// `Null` clears it, `Value` replaces it.
    pub fn overlay(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Absent => current,
            Patch::Null => None,
            Patch::Value(v) => Some(v),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // A present key deserializes through Option; `Absent` only ever
        // comes from the field-level #[serde(default)].
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Absent | Patch::Null => serializer.serialize_none(),
            Patch::Value(v) => serializer.serialize_some(v),
        }
    }
}
