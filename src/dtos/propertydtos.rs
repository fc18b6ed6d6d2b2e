use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dtos::Patch;
use crate::models::propertymodel::{
    AreaDetails, AreaUnit, Characteristics, Cooling, EnergyDiagnostic, EnergyRating,
    GeoCoordinates, Heating, Location, Orientation, PropertyStatus, PropertyType, Rules,
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct CoordinatesDto {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&GeoCoordinates> for CoordinatesDto {
    fn from(coords: &GeoCoordinates) -> Self {
        CoordinatesDto {
            latitude: Some(coords.latitude),
            longitude: Some(coords.longitude),
        }
    }
}

/// Location as supplied on creation. Required sub-fields are still optional
/// here so that a missing one surfaces as an `InvalidField` from the
/// normalizer rather than a deserialization error.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationDto {
    pub address: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<CoordinatesDto>,
}

impl From<&Location> for LocationDto {
    fn from(location: &Location) -> Self {
        LocationDto {
            address: Some(location.address.clone()),
            address2: location.address2.clone(),
            city: Some(location.city.clone()),
            state: location.state.clone(),
            postal_code: Some(location.postal_code.clone()),
            country: Some(location.country.clone()),
            coordinates: location.coordinates.as_ref().map(CoordinatesDto::from),
        }
    }
}

/// Partial location update: every sub-field independently optional, the
/// nullable ones (`address2`, `state`, `coordinates`) clearable with an
/// explicit `null`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationUpdateDto {
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub address2: Patch<String>,
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub state: Patch<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub coordinates: Patch<CoordinatesDto>,
}

impl LocationUpdateDto {
    /// Overlay this update onto the current location, producing the whole
    /// candidate shape for re-normalization. Unspecified sub-fields keep
    /// their current values.
    pub fn overlay(&self, current: &Location) -> LocationDto {
        LocationDto {
            address: self.address.clone().or_else(|| Some(current.address.clone())),
            address2: self.address2.clone().overlay(current.address2.clone()),
            city: self.city.clone().or_else(|| Some(current.city.clone())),
            state: self.state.clone().overlay(current.state.clone()),
            postal_code: self
                .postal_code
                .clone()
                .or_else(|| Some(current.postal_code.clone())),
            country: self.country.clone().or_else(|| Some(current.country.clone())),
            coordinates: self
                .coordinates
                .clone()
                .overlay(current.coordinates.as_ref().map(CoordinatesDto::from)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AreaDto {
    pub total: Option<f64>,
    pub habitable: Option<f64>,
    pub land: Option<f64>,
    pub unit: Option<AreaUnit>,
}

impl From<&AreaDetails> for AreaDto {
    fn from(area: &AreaDetails) -> Self {
        AreaDto {
            total: area.total,
            habitable: area.habitable,
            land: area.land,
            unit: area.unit,
        }
    }
}

impl AreaDto {
    fn overlay(base: AreaDto, patch: &AreaDto) -> AreaDto {
        AreaDto {
            total: patch.total.or(base.total),
            habitable: patch.habitable.or(base.habitable),
            land: patch.land.or(base.land),
            unit: patch.unit.or(base.unit),
        }
    }
}

/// Characteristics as supplied by callers. Counts arrive as raw numbers and
/// are floored to integers by the normalizer, matching the rest of the
/// inbound contract where everything numeric is a JSON number.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacteristicsDto {
    pub rooms: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub toilets: Option<f64>,
    pub floors: Option<f64>,
    pub parking_spaces: Option<f64>,
    pub has_elevator: Option<bool>,
    pub has_garden: Option<bool>,
    pub has_pool: Option<bool>,
    pub has_terrace: Option<bool>,
    pub heating: Option<Heating>,
    pub cooling: Option<Cooling>,
    pub orientation: Option<Orientation>,
    pub year_built: Option<f64>,
    pub year_renovated: Option<f64>,
    pub area: Option<AreaDto>,
}

impl From<&Characteristics> for CharacteristicsDto {
    fn from(c: &Characteristics) -> Self {
        CharacteristicsDto {
            rooms: c.rooms.map(f64::from),
            bedrooms: c.bedrooms.map(f64::from),
            bathrooms: c.bathrooms.map(f64::from),
            toilets: c.toilets.map(f64::from),
            floors: c.floors.map(f64::from),
            parking_spaces: c.parking_spaces.map(f64::from),
            has_elevator: c.has_elevator,
            has_garden: c.has_garden,
            has_pool: c.has_pool,
            has_terrace: c.has_terrace,
            heating: c.heating,
            cooling: c.cooling,
            orientation: c.orientation,
            year_built: c.year_built.map(f64::from),
            year_renovated: c.year_renovated.map(f64::from),
            area: c.area.as_ref().map(AreaDto::from),
        }
    }
}

impl CharacteristicsDto {
    /// Shallow merge: patch keys win over base keys, except `area`, which
    /// is itself merged key by key rather than replaced.
    pub fn overlay(base: CharacteristicsDto, patch: &CharacteristicsDto) -> CharacteristicsDto {
        CharacteristicsDto {
            rooms: patch.rooms.or(base.rooms),
            bedrooms: patch.bedrooms.or(base.bedrooms),
            bathrooms: patch.bathrooms.or(base.bathrooms),
            toilets: patch.toilets.or(base.toilets),
            floors: patch.floors.or(base.floors),
            parking_spaces: patch.parking_spaces.or(base.parking_spaces),
            has_elevator: patch.has_elevator.or(base.has_elevator),
            has_garden: patch.has_garden.or(base.has_garden),
            has_pool: patch.has_pool.or(base.has_pool),
            has_terrace: patch.has_terrace.or(base.has_terrace),
            heating: patch.heating.or(base.heating),
            cooling: patch.cooling.or(base.cooling),
            orientation: patch.orientation.or(base.orientation),
            year_built: patch.year_built.or(base.year_built),
            year_renovated: patch.year_renovated.or(base.year_renovated),
            area: match (&patch.area, base.area) {
                (Some(p), Some(b)) => Some(AreaDto::overlay(b, p)),
                (Some(p), None) => Some(p.clone()),
                (None, b) => b,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EnergyDiagnosticDto {
    pub consumption_rating: Option<EnergyRating>,
    pub emissions_rating: Option<EnergyRating>,
    pub consumption_value: Option<f64>,
    pub emissions_value: Option<f64>,
    pub inspected_at: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub reference: Option<String>,
}

impl From<&EnergyDiagnostic> for EnergyDiagnosticDto {
    fn from(e: &EnergyDiagnostic) -> Self {
        EnergyDiagnosticDto {
            consumption_rating: e.consumption_rating,
            emissions_rating: e.emissions_rating,
            consumption_value: e.consumption_value,
            emissions_value: e.emissions_value,
            inspected_at: e.inspected_at,
            valid_until: e.valid_until,
            reference: e.reference.clone(),
        }
    }
}

impl EnergyDiagnosticDto {
    /// Deep merge onto the current diagnostic: provided fields override,
    /// absent fields keep their current values.
    pub fn overlay(base: EnergyDiagnosticDto, patch: &EnergyDiagnosticDto) -> EnergyDiagnosticDto {
        EnergyDiagnosticDto {
            consumption_rating: patch.consumption_rating.or(base.consumption_rating),
            emissions_rating: patch.emissions_rating.or(base.emissions_rating),
            consumption_value: patch.consumption_value.or(base.consumption_value),
            emissions_value: patch.emissions_value.or(base.emissions_value),
            inspected_at: patch.inspected_at.or(base.inspected_at),
            valid_until: patch.valid_until.or(base.valid_until),
            reference: patch.reference.clone().or(base.reference),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesDto {
    pub furnished: Option<bool>,
    pub pets_allowed: Option<bool>,
    pub smoking_allowed: Option<bool>,
    pub children_allowed: Option<bool>,
    pub events_allowed: Option<bool>,
    pub minimum_lease_months: Option<f64>,
    pub max_occupants: Option<f64>,
    pub custom_rules: Option<Vec<String>>,
}

impl From<&Rules> for RulesDto {
    fn from(r: &Rules) -> Self {
        RulesDto {
            furnished: r.furnished,
            pets_allowed: r.pets_allowed,
            smoking_allowed: r.smoking_allowed,
            children_allowed: r.children_allowed,
            events_allowed: r.events_allowed,
            minimum_lease_months: r.minimum_lease_months.map(f64::from),
            max_occupants: r.max_occupants.map(f64::from),
            custom_rules: Some(r.custom_rules.clone()),
        }
    }
}

impl RulesDto {
    /// Deep merge; `custom_rules`, being a list, is replaced wholesale when
    /// the patch provides it.
    pub fn overlay(base: RulesDto, patch: &RulesDto) -> RulesDto {
        RulesDto {
            furnished: patch.furnished.or(base.furnished),
            pets_allowed: patch.pets_allowed.or(base.pets_allowed),
            smoking_allowed: patch.smoking_allowed.or(base.smoking_allowed),
            children_allowed: patch.children_allowed.or(base.children_allowed),
            events_allowed: patch.events_allowed.or(base.events_allowed),
            minimum_lease_months: patch.minimum_lease_months.or(base.minimum_lease_months),
            max_occupants: patch.max_occupants.or(base.max_occupants),
            custom_rules: patch.custom_rules.clone().or(base.custom_rules),
        }
    }
}

/// Inbound creation contract.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBienDto {
    pub owner_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,

    pub currency: Option<String>,

    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub status: Option<PropertyStatus>,

    pub location: LocationDto,
    pub characteristics: Option<CharacteristicsDto>,
    pub energy_diagnostic: Option<EnergyDiagnosticDto>,
    pub rules: Option<RulesDto>,

    pub amenities: Option<Vec<String>>,
    pub media: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Inbound update contract: every creation field made optional, with
/// explicit-null support on the clearable ones.
#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBienDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<String>,

    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: Option<f64>,

    pub currency: Option<String>,

    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub status: Option<PropertyStatus>,

    pub location: Option<LocationUpdateDto>,
    pub characteristics: Option<CharacteristicsDto>,
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub energy_diagnostic: Patch<EnergyDiagnosticDto>,
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub rules: Patch<RulesDto>,

    pub amenities: Option<Vec<String>>,
    pub media: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Read-only external view of a listing. Identical in shape to the
/// persistence snapshot; always carries whatever identity is known.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BienDto {
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
