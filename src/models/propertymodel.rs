use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dtos::propertydtos::{
    BienDto, CharacteristicsDto, CreateBienDto, EnergyDiagnosticDto, RulesDto, UpdateBienDto,
};
use crate::dtos::Patch;
use crate::utils::normalize;
use crate::Result;

pub const DEFAULT_CURRENCY: &str = "MAD";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Villa,
    Land,
}

impl PropertyType {
    pub fn to_str(&self) -> &str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Villa => "villa",
            PropertyType::Land => "land",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Draft, // Owner is still composing the listing
    Published,
    Archived,
}

impl PropertyStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PropertyStatus::Draft => "draft",
            PropertyStatus::Published => "published",
            PropertyStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Heating {
    Gas,
    Electric,
    HeatPump,
    District,
    Wood,
    None,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Cooling {
    AirConditioning,
    Fan,
    None,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

/// Energy performance letter, A (best) through G.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnergyRating {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AreaUnit {
    Sqm,
    Sqft,
}

/// Validated coordinate pair. Both components are always present together
/// and rounded to 6 decimals by the normalizer.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub coordinates: Option<GeoCoordinates>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AreaDetails {
    pub total: Option<f64>,
    pub habitable: Option<f64>,
    pub land: Option<f64>,
    pub unit: Option<AreaUnit>,
}

impl AreaDetails {
    pub fn is_empty(&self) -> bool {
        self.total.is_none() && self.habitable.is_none() && self.land.is_none() && self.unit.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Characteristics {
    pub rooms: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub toilets: Option<u32>,
    pub floors: Option<u32>,
    pub parking_spaces: Option<u32>,
    pub has_elevator: Option<bool>,
    pub has_garden: Option<bool>,
    pub has_pool: Option<bool>,
    pub has_terrace: Option<bool>,
    pub heating: Option<Heating>,
    pub cooling: Option<Cooling>,
    pub orientation: Option<Orientation>,
    pub year_built: Option<u32>,
    pub year_renovated: Option<u32>,
    pub area: Option<AreaDetails>,
}

impl Characteristics {
    pub fn is_empty(&self) -> bool {
        self.rooms.is_none()
            && self.bedrooms.is_none()
            && self.bathrooms.is_none()
            && self.toilets.is_none()
            && self.floors.is_none()
            && self.parking_spaces.is_none()
            && self.has_elevator.is_none()
            && self.has_garden.is_none()
            && self.has_pool.is_none()
            && self.has_terrace.is_none()
            && self.heating.is_none()
            && self.cooling.is_none()
            && self.orientation.is_none()
            && self.year_built.is_none()
            && self.year_renovated.is_none()
            && self.area.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnergyDiagnostic {
    pub consumption_rating: Option<EnergyRating>,
    pub emissions_rating: Option<EnergyRating>,
    pub consumption_value: Option<f64>,
    pub emissions_value: Option<f64>,
    pub inspected_at: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub reference: Option<String>,
}

impl EnergyDiagnostic {
    pub fn is_empty(&self) -> bool {
        self.consumption_rating.is_none()
            && self.emissions_rating.is_none()
            && self.consumption_value.is_none()
            && self.emissions_value.is_none()
            && self.inspected_at.is_none()
            && self.valid_until.is_none()
            && self.reference.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    pub furnished: Option<bool>,
    pub pets_allowed: Option<bool>,
    pub smoking_allowed: Option<bool>,
    pub children_allowed: Option<bool>,
    pub events_allowed: Option<bool>,
    pub minimum_lease_months: Option<u32>,
    pub max_occupants: Option<u32>,
    pub custom_rules: Vec<String>,
}

impl Rules {
    pub fn is_empty(&self) -> bool {
        self.furnished.is_none()
            && self.pets_allowed.is_none()
            && self.smoking_allowed.is_none()
            && self.children_allowed.is_none()
            && self.events_allowed.is_none()
            && self.minimum_lease_months.is_none()
            && self.max_occupants.is_none()
            && self.custom_rules.is_empty()
    }
}

/// Persistence-ready shape of a listing: the full canonical state plus
/// identity and timestamps. The store assigns `id` on first insert.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BienSnapshot {
    pub id: Option<Uuid>,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    pub location: Location,
    pub characteristics: Option<Characteristics>,
    pub energy_diagnostic: Option<EnergyDiagnostic>,
    pub rules: Option<Rules>,
    pub amenities: Vec<String>,
    pub media: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The property listing aggregate.
///
/// State is always canonical: every value passed through the normalizer on
/// its way in, so projections never re-validate. All mutation goes through
/// [`Bien::apply_update`] or one of the narrow mutators, each of which
/// commits only on an actual change and advances `updated_at` at most once
/// per call.
#[derive(Debug, Clone)]
pub struct Bien {
    id: Option<Uuid>,
    owner_id: Uuid,
    title: String,
    description: Option<String>,
    price: f64,
    currency: String,
    property_type: PropertyType,
    status: PropertyStatus,
    location: Location,
    characteristics: Option<Characteristics>,
    energy_diagnostic: Option<EnergyDiagnostic>,
    rules: Option<Rules>,
    amenities: Vec<String>,
    media: Vec<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Candidate values staged during one `apply_update` call. Nothing touches
/// the record until every provided field has normalized cleanly, which is
/// what makes an update all-or-nothing.
#[derive(Debug, Default)]
struct StagedUpdate {
    title: Option<String>,
    description: Option<Option<String>>,
    price: Option<f64>,
    currency: Option<String>,
    property_type: Option<PropertyType>,
    status: Option<PropertyStatus>,
    location: Option<Location>,
    characteristics: Option<Option<Characteristics>>,
    energy_diagnostic: Option<Option<EnergyDiagnostic>>,
    rules: Option<Option<Rules>>,
    amenities: Option<Vec<String>>,
    media: Option<Vec<String>>,
    tags: Option<Vec<String>>,
}

impl StagedUpdate {
    fn committed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.price.is_some() {
            fields.push("price");
        }
        if self.currency.is_some() {
            fields.push("currency");
        }
        if self.property_type.is_some() {
            fields.push("type");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.location.is_some() {
            fields.push("location");
        }
        if self.characteristics.is_some() {
            fields.push("characteristics");
        }
        if self.energy_diagnostic.is_some() {
            fields.push("energyDiagnostic");
        }
        if self.rules.is_some() {
            fields.push("rules");
        }
        if self.amenities.is_some() {
            fields.push("amenities");
        }
        if self.media.is_some() {
            fields.push("media");
        }
        if self.tags.is_some() {
            fields.push("tags");
        }
        fields
    }
}

impl Bien {
    /// Build a new listing from an inbound creation payload.
    ///
    /// Every field is normalized up front; the first failure aborts before
    /// any record exists. Defaults: currency `MAD`, status `draft`,
    /// `created_at = updated_at = now`, no identifier until the store
    /// assigns one.
    pub fn create(payload: CreateBienDto) -> Result<Bien> {
        let title = normalize::required_string("title", &payload.title)?;
        let description = payload
            .description
            .as_deref()
            .and_then(normalize::optional_string);
        let price = normalize::non_negative_number("price", payload.price)?;
        let currency = match payload.currency.as_deref() {
            Some(raw) => normalize::currency_code("currency", raw)?,
            None => DEFAULT_CURRENCY.to_string(),
        };
        let location = normalize::location(&payload.location)?;
        let characteristics = match payload.characteristics.as_ref() {
            Some(dto) => normalize::characteristics(dto)?,
            None => None,
        };
        let energy_diagnostic = match payload.energy_diagnostic.as_ref() {
            Some(dto) => normalize::energy_diagnostic(dto)?,
            None => None,
        };
        let rules = match payload.rules.as_ref() {
            Some(dto) => normalize::rules(dto)?,
            None => None,
        };

        let now = Utc::now();
        let bien = Bien {
            id: None,
            owner_id: payload.owner_id,
            title,
            description,
            price,
            currency,
            property_type: payload.property_type,
            status: payload.status.unwrap_or(PropertyStatus::Draft),
            location,
            characteristics,
            energy_diagnostic,
            rules,
            amenities: normalize::string_list(payload.amenities.as_deref().unwrap_or_default()),
            media: normalize::string_list(payload.media.as_deref().unwrap_or_default()),
            tags: normalize::string_list(payload.tags.as_deref().unwrap_or_default()),
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(
            owner = %bien.owner_id,
            status = bien.status.to_str(),
            "listing created"
        );
        Ok(bien)
    }

    /// Rehydrate a listing the persistence collaborator handed back.
    /// The snapshot is canonical by invariant, so nothing is re-normalized.
    pub fn from_snapshot(snapshot: BienSnapshot) -> Bien {
        Bien {
            id: snapshot.id,
            owner_id: snapshot.owner_id,
            title: snapshot.title,
            description: snapshot.description,
            price: snapshot.price,
            currency: snapshot.currency,
            property_type: snapshot.property_type,
            status: snapshot.status,
            location: snapshot.location,
            characteristics: snapshot.characteristics,
            energy_diagnostic: snapshot.energy_diagnostic,
            rules: snapshot.rules,
            amenities: snapshot.amenities,
            media: snapshot.media,
            tags: snapshot.tags,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    pub fn status(&self) -> PropertyStatus {
        self.status
    }

    // Substructure and list accessors hand out owned copies. Callers can do
    // what they like with the result without reaching into the record.

    pub fn location(&self) -> Location {
        self.location.clone()
    }

    pub fn characteristics(&self) -> Option<Characteristics> {
        self.characteristics.clone()
    }

    pub fn energy_diagnostic(&self) -> Option<EnergyDiagnostic> {
        self.energy_diagnostic.clone()
    }

    pub fn rules(&self) -> Option<Rules> {
        self.rules.clone()
    }

    pub fn amenities(&self) -> Vec<String> {
        self.amenities.clone()
    }

    pub fn media(&self) -> Vec<String> {
        self.media.clone()
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Merge a partial update into the record.
    ///
    /// Two phases: every provided field is normalized and compared against
    /// current state first; only when all of them are clean are the changed
    /// ones written back, with `updated_at` advancing once. A field absent
    /// from the payload never changes anything; explicit `null` is the only
    /// way to clear a nullable field. Returns whether any field committed.
    pub fn apply_update(&mut self, payload: &UpdateBienDto) -> Result<bool> {
        let mut staged = StagedUpdate::default();

        if let Some(raw) = payload.title.as_deref() {
            let title = normalize::required_string("title", raw)?;
            if title != self.title {
                staged.title = Some(title);
            }
        }

        match payload.description.as_ref() {
            Patch::Absent => {}
            Patch::Null => {
                if self.description.is_some() {
                    staged.description = Some(None);
                }
            }
            Patch::Value(raw) => {
                let candidate = normalize::optional_string(raw);
                if candidate != self.description {
                    staged.description = Some(candidate);
                }
            }
        }

        if let Some(raw) = payload.price {
            let price = normalize::non_negative_number("price", raw)?;
            if price != self.price {
                staged.price = Some(price);
            }
        }

        if let Some(raw) = payload.currency.as_deref() {
            let currency = normalize::currency_code("currency", raw)?;
            if currency != self.currency {
                staged.currency = Some(currency);
            }
        }

        if let Some(property_type) = payload.property_type {
            if property_type != self.property_type {
                staged.property_type = Some(property_type);
            }
        }

        if let Some(status) = payload.status {
            if status != self.status {
                staged.status = Some(status);
            }
        }

        if let Some(update) = payload.location.as_ref() {
            let merged = update.overlay(&self.location);
            let candidate = normalize::location(&merged)?;
            if candidate != self.location {
                staged.location = Some(candidate);
            }
        }

        if let Some(patch) = payload.characteristics.as_ref() {
            let base = self
                .characteristics
                .as_ref()
                .map(CharacteristicsDto::from)
                .unwrap_or_default();
            let merged = CharacteristicsDto::overlay(base, patch);
            let candidate = normalize::characteristics(&merged)?;
            if candidate != self.characteristics {
                staged.characteristics = Some(candidate);
            }
        }

        match payload.energy_diagnostic.as_ref() {
            Patch::Absent => {}
            Patch::Null => {
                if self.energy_diagnostic.is_some() {
                    staged.energy_diagnostic = Some(None);
                }
            }
            Patch::Value(patch) => {
                let base = self
                    .energy_diagnostic
                    .as_ref()
                    .map(EnergyDiagnosticDto::from)
                    .unwrap_or_default();
                let merged = EnergyDiagnosticDto::overlay(base, patch);
                let candidate = normalize::energy_diagnostic(&merged)?;
                if candidate != self.energy_diagnostic {
                    staged.energy_diagnostic = Some(candidate);
                }
            }
        }

        match payload.rules.as_ref() {
            Patch::Absent => {}
            Patch::Null => {
                if self.rules.is_some() {
                    staged.rules = Some(None);
                }
            }
            Patch::Value(patch) => {
                let base = self.rules.as_ref().map(RulesDto::from).unwrap_or_default();
                let merged = RulesDto::overlay(base, patch);
                let candidate = normalize::rules(&merged)?;
                if candidate != self.rules {
                    staged.rules = Some(candidate);
                }
            }
        }

        // An explicit empty array is a real value here: it empties the list.
        if let Some(raw) = payload.amenities.as_deref() {
            let candidate = normalize::string_list(raw);
            if candidate != self.amenities {
                staged.amenities = Some(candidate);
            }
        }

        if let Some(raw) = payload.media.as_deref() {
            let candidate = normalize::string_list(raw);
            if candidate != self.media {
                staged.media = Some(candidate);
            }
        }

        if let Some(raw) = payload.tags.as_deref() {
            let candidate = normalize::string_list(raw);
            if candidate != self.tags {
                staged.tags = Some(candidate);
            }
        }

        let committed = staged.committed_fields();
        if committed.is_empty() {
            return Ok(false);
        }
        tracing::debug!(fields = ?committed, "listing update committed");

        if let Some(title) = staged.title {
            self.title = title;
        }
        if let Some(description) = staged.description {
            self.description = description;
        }
        if let Some(price) = staged.price {
            self.price = price;
        }
        if let Some(currency) = staged.currency {
            self.currency = currency;
        }
        if let Some(property_type) = staged.property_type {
            self.property_type = property_type;
        }
        if let Some(status) = staged.status {
            self.status = status;
        }
        if let Some(location) = staged.location {
            self.location = location;
        }
        if let Some(characteristics) = staged.characteristics {
            self.characteristics = characteristics;
        }
        if let Some(energy_diagnostic) = staged.energy_diagnostic {
            self.energy_diagnostic = energy_diagnostic;
        }
        if let Some(rules) = staged.rules {
            self.rules = rules;
        }
        if let Some(amenities) = staged.amenities {
            self.amenities = amenities;
        }
        if let Some(media) = staged.media {
            self.media = media;
        }
        if let Some(tags) = staged.tags {
            self.tags = tags;
        }
        self.touch();
        Ok(true)
    }

    /// Status is a free enumeration at this layer; any move to a different
    /// value is accepted. Workflow legality belongs to the service layer.
    pub fn set_status(&mut self, status: PropertyStatus) -> bool {
        if status == self.status {
            return false;
        }
        tracing::debug!(from = self.status.to_str(), to = status.to_str(), "status change");
        self.status = status;
        self.touch();
        true
    }

    pub fn set_type(&mut self, property_type: PropertyType) -> bool {
        if property_type == self.property_type {
            return false;
        }
        self.property_type = property_type;
        self.touch();
        true
    }

    /// Append media entries that are not already present. Existing order is
    /// preserved; new entries land in payload order.
    pub fn add_media(&mut self, items: &[String]) -> bool {
        let incoming = normalize::string_list(items);
        let mut appended = false;
        for item in incoming {
            if !self.media.contains(&item) {
                self.media.push(item);
                appended = true;
            }
        }
        if appended {
            self.touch();
        }
        appended
    }

    /// Drop every media entry matching the given set.
    pub fn remove_media(&mut self, items: &[String]) -> bool {
        let blacklist: std::collections::HashSet<&str> =
            items.iter().map(|s| s.trim()).collect();
        let before = self.media.len();
        self.media.retain(|m| !blacklist.contains(m.as_str()));
        if self.media.len() != before {
            self.touch();
            true
        } else {
            false
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Full deep copy for the persistence collaborator. `id` stays absent
    /// until the store has assigned one.
    pub fn to_snapshot(&self) -> BienSnapshot {
        BienSnapshot {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            currency: self.currency.clone(),
            property_type: self.property_type,
            status: self.status,
            location: self.location.clone(),
            characteristics: self.characteristics.clone(),
            energy_diagnostic: self.energy_diagnostic.clone(),
            rules: self.rules.clone(),
            amenities: self.amenities.clone(),
            media: self.media.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Read-only view for API consumers. Same shape as the snapshot;
    /// no normalization happens here since state is already canonical.
    pub fn to_dto(&self) -> BienDto {
        BienDto {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            currency: self.currency.clone(),
            property_type: self.property_type,
            status: self.status,
            location: self.location.clone(),
            characteristics: self.characteristics.clone(),
            energy_diagnostic: self.energy_diagnostic.clone(),
            rules: self.rules.clone(),
            amenities: self.amenities.clone(),
            media: self.media.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_payload() -> CreateBienDto {
        serde_json::from_value(json!({
            "ownerId": "7f6b1c2e-58a4-4f7a-9d31-2a5d8c7e9f10",
            "title": "  Bright apartment near the medina  ",
            "price": 950000.456,
            "type": "apartment",
            "location": {
                "address": "12 Rue des Fleurs",
                "city": "Casablanca",
                "postalCode": "20000",
                "country": "Morocco"
            }
        }))
        .unwrap()
    }

    fn update(value: serde_json::Value) -> UpdateBienDto {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn create_applies_defaults_and_normalizes() {
        let bien = Bien::create(create_payload()).unwrap();
        assert_eq!(bien.id(), None);
        assert_eq!(bien.title(), "Bright apartment near the medina");
        assert_eq!(bien.price(), 950000.46);
        assert_eq!(bien.currency(), DEFAULT_CURRENCY);
        assert_eq!(bien.status(), PropertyStatus::Draft);
        assert_eq!(bien.updated_at(), bien.created_at());
        assert_eq!(bien.characteristics(), None);
        assert!(bien.media().is_empty());
    }

    #[test]
    fn create_uppercases_currency() {
        let mut payload = create_payload();
        payload.currency = Some(" mad ".to_string());
        let bien = Bien::create(payload).unwrap();
        assert_eq!(bien.currency(), "MAD");
    }

    #[test]
    fn create_rejects_negative_price_before_constructing() {
        let mut payload = create_payload();
        payload.price = -5.0;
        let err = Bien::create(payload).unwrap_err();
        assert_eq!(err.field(), "price");
    }

    #[test]
    fn create_rejects_blank_title() {
        let mut payload = create_payload();
        payload.title = "   ".to_string();
        assert_eq!(Bien::create(payload).unwrap_err().field(), "title");
    }

    #[test]
    fn empty_update_is_a_noop() {
        let mut bien = Bien::create(create_payload()).unwrap();
        let before = bien.updated_at();
        assert!(!bien.apply_update(&UpdateBienDto::default()).unwrap());
        assert_eq!(bien.updated_at(), before);
    }

    #[test]
    fn same_value_update_does_not_touch() {
        let mut bien = Bien::create(create_payload()).unwrap();
        let before = bien.updated_at();
        let changed = bien
            .apply_update(&update(json!({
                "title": "Bright apartment near the medina",
                "price": 950000.46
            })))
            .unwrap();
        assert!(!changed);
        assert_eq!(bien.updated_at(), before);
    }

    #[test]
    fn update_is_idempotent() {
        let mut bien = Bien::create(create_payload()).unwrap();
        let payload = update(json!({
            "title": "Renovated apartment",
            "price": 900000,
            "tags": ["  centre ", "centre", "", "balcony"]
        }));

        assert!(bien.apply_update(&payload).unwrap());
        let after_first = bien.to_snapshot();

        assert!(!bien.apply_update(&payload).unwrap());
        let after_second = bien.to_snapshot();
        assert_eq!(after_first, after_second);
        assert_eq!(bien.tags(), vec!["centre".to_string(), "balcony".to_string()]);
    }

    #[test]
    fn failed_update_commits_nothing() {
        let mut bien = Bien::create(create_payload()).unwrap();
        let before = bien.to_snapshot();

        // Valid title plus an out-of-range latitude: the whole call aborts.
        let err = bien
            .apply_update(&update(json!({
                "title": "Should not stick",
                "location": { "coordinates": { "latitude": 91.0, "longitude": 0.0 } }
            })))
            .unwrap_err();
        assert_eq!(err.field(), "location.coordinates.latitude");
        assert_eq!(bien.to_snapshot(), before);
    }

    #[test]
    fn location_update_overlays_and_rounds_coordinates() {
        let mut bien = Bien::create(create_payload()).unwrap();
        let changed = bien
            .apply_update(&update(json!({
                "location": {
                    "city": "Rabat",
                    "coordinates": { "latitude": 45.1234567, "longitude": -7.5898432 }
                }
            })))
            .unwrap();
        assert!(changed);

        let location = bien.location();
        assert_eq!(location.city, "Rabat");
        assert_eq!(location.address, "12 Rue des Fleurs");
        assert_eq!(location.postal_code, "20000");
        let coords = location.coordinates.unwrap();
        assert_eq!(coords.latitude, 45.123457);
        assert_eq!(coords.longitude, -7.589843);

        // Explicit null clears the nullable pair again.
        assert!(bien
            .apply_update(&update(json!({ "location": { "coordinates": null } })))
            .unwrap());
        assert_eq!(bien.location().coordinates, None);
    }

    #[test]
    fn characteristics_merge_keeps_nested_area() {
        let mut bien = Bien::create(create_payload()).unwrap();
        assert!(bien
            .apply_update(&update(json!({
                "characteristics": { "rooms": 3, "area": { "total": 80, "unit": "sqm" } }
            })))
            .unwrap());
        assert!(bien
            .apply_update(&update(json!({
                "characteristics": { "bedrooms": 2, "area": { "habitable": 60 } }
            })))
            .unwrap());

        let c = bien.characteristics().unwrap();
        assert_eq!(c.rooms, Some(3));
        assert_eq!(c.bedrooms, Some(2));
        let area = c.area.unwrap();
        assert_eq!(area.total, Some(80.0));
        assert_eq!(area.habitable, Some(60.0));
        assert_eq!(area.unit, Some(AreaUnit::Sqm));
    }

    #[test]
    fn empty_characteristics_update_is_a_noop() {
        let mut bien = Bien::create(create_payload()).unwrap();
        let before = bien.updated_at();
        assert!(!bien
            .apply_update(&update(json!({ "characteristics": {} })))
            .unwrap());
        assert_eq!(bien.updated_at(), before);
    }

    #[test]
    fn rules_null_clears_and_omission_keeps() {
        let mut bien = Bien::create(create_payload()).unwrap();
        assert!(bien
            .apply_update(&update(json!({
                "rules": { "furnished": true, "customRules": ["no parties"] }
            })))
            .unwrap());
        assert!(bien.rules().is_some());

        // Omitting the field leaves it alone.
        assert!(!bien.apply_update(&update(json!({ "title": "Bright apartment near the medina" }))).unwrap());
        assert!(bien.rules().is_some());

        // Explicit null removes the substructure and counts as a change.
        assert!(bien.apply_update(&update(json!({ "rules": null }))).unwrap());
        assert_eq!(bien.rules(), None);

        // Clearing again is a no-op.
        assert!(!bien.apply_update(&update(json!({ "rules": null }))).unwrap());
    }

    #[test]
    fn energy_diagnostic_deep_merges() {
        let mut bien = Bien::create(create_payload()).unwrap();
        assert!(bien
            .apply_update(&update(json!({
                "energyDiagnostic": { "consumptionRating": "B", "consumptionValue": 120.456 }
            })))
            .unwrap());
        assert!(bien
            .apply_update(&update(json!({
                "energyDiagnostic": { "consumptionValue": 110 }
            })))
            .unwrap());

        let energy = bien.energy_diagnostic().unwrap();
        assert_eq!(energy.consumption_rating, Some(EnergyRating::B));
        assert_eq!(energy.consumption_value, Some(110.0));
    }

    #[test]
    fn explicit_empty_list_clears() {
        let mut bien = Bien::create(create_payload()).unwrap();
        assert!(bien
            .apply_update(&update(json!({ "media": ["a.jpg", "b.jpg"] })))
            .unwrap());
        assert_eq!(bien.media().len(), 2);

        assert!(bien.apply_update(&update(json!({ "media": [] }))).unwrap());
        assert!(bien.media().is_empty());
    }

    #[test]
    fn description_empty_string_clears_like_null() {
        let mut bien = Bien::create(create_payload()).unwrap();
        assert!(bien
            .apply_update(&update(json!({ "description": "Sea view." })))
            .unwrap());
        assert_eq!(bien.description(), Some("Sea view."));

        assert!(bien
            .apply_update(&update(json!({ "description": "   " })))
            .unwrap());
        assert_eq!(bien.description(), None);

        assert!(!bien
            .apply_update(&update(json!({ "description": null })))
            .unwrap());
    }

    #[test]
    fn status_transitions_are_free_both_ways() {
        let mut bien = Bien::create(create_payload()).unwrap();
        assert!(bien.set_status(PropertyStatus::Published));
        assert!(bien.set_status(PropertyStatus::Draft));
        assert!(bien.set_status(PropertyStatus::Archived));

        let before = bien.updated_at();
        assert!(!bien.set_status(PropertyStatus::Archived));
        assert_eq!(bien.updated_at(), before);
    }

    #[test]
    fn set_type_commits_only_on_change() {
        let mut bien = Bien::create(create_payload()).unwrap();
        assert!(!bien.set_type(PropertyType::Apartment));
        assert!(bien.set_type(PropertyType::Villa));
        assert_eq!(bien.property_type(), PropertyType::Villa);
    }

    #[test]
    fn add_media_appends_only_new_entries() {
        let mut bien = Bien::create(create_payload()).unwrap();
        assert!(bien.add_media(&["a.jpg".to_string(), "b.jpg".to_string()]));
        assert!(bien.add_media(&[" b.jpg ".to_string(), "c.jpg".to_string()]));
        assert_eq!(
            bien.media(),
            vec!["a.jpg".to_string(), "b.jpg".to_string(), "c.jpg".to_string()]
        );

        let before = bien.updated_at();
        assert!(!bien.add_media(&["a.jpg".to_string()]));
        assert_eq!(bien.updated_at(), before);
    }

    #[test]
    fn remove_media_filters_matching_entries() {
        let mut bien = Bien::create(create_payload()).unwrap();
        bien.add_media(&["a.jpg".to_string(), "b.jpg".to_string(), "c.jpg".to_string()]);

        assert!(bien.remove_media(&["b.jpg".to_string(), "missing.jpg".to_string()]));
        assert_eq!(bien.media(), vec!["a.jpg".to_string(), "c.jpg".to_string()]);
        assert!(!bien.remove_media(&["missing.jpg".to_string()]));
    }

    #[test]
    fn snapshot_round_trips_through_rehydration() {
        let mut bien = Bien::create(create_payload()).unwrap();
        bien.apply_update(&update(json!({
            "characteristics": { "rooms": 3, "hasPool": true },
            "rules": { "petsAllowed": false },
            "amenities": ["parking", "elevator"]
        })))
        .unwrap();

        let mut snapshot = bien.to_snapshot();
        assert_eq!(snapshot.id, None);
        snapshot.id = Some(Uuid::new_v4());

        let restored = Bien::from_snapshot(snapshot.clone());
        assert_eq!(restored.to_snapshot(), snapshot);
        assert_eq!(restored.id(), snapshot.id);
    }

    #[test]
    fn dto_matches_snapshot_shape() {
        let bien = Bien::create(create_payload()).unwrap();
        let dto = bien.to_dto();
        let snapshot = bien.to_snapshot();
        assert_eq!(
            serde_json::to_value(&dto).unwrap(),
            serde_json::to_value(&snapshot).unwrap()
        );
    }
}
