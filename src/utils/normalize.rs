//! Pure normalization of inbound listing data.
//!
//! Every function here is side-effect free: raw input in, canonical value
//! or `InvalidField` out. The record and the merge engine both route all
//! external data through this module, so no two semantically-equal inputs
//! ever end up as different canonical forms.

use std::collections::HashSet;

use crate::dtos::propertydtos::{
    AreaDto, CharacteristicsDto, CoordinatesDto, EnergyDiagnosticDto, LocationDto, RulesDto,
};
use crate::error::BienError;
use crate::models::propertymodel::{
    AreaDetails, Characteristics, EnergyDiagnostic, GeoCoordinates, Location, Rules,
};
use crate::Result;

/// Coordinates keep 6 decimals (about 11cm of precision); money and areas
/// keep 2.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Trim; fail if nothing is left.
pub fn required_string(field: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BienError::invalid_field(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Trim; an empty result means "no value".
pub fn optional_string(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trim every entry, drop empties, dedupe keeping first-seen order.
pub fn string_list(raw: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for item in raw {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Non-negative finite number, rounded to 2 decimals.
pub fn non_negative_number(field: &str, raw: f64) -> Result<f64> {
    if !raw.is_finite() {
        return Err(BienError::invalid_field(field, "must be a finite number"));
    }
    if raw < 0.0 {
        return Err(BienError::invalid_field(field, "must not be negative"));
    }
    Ok(round2(raw))
}

/// Non-negative finite number, floored to an integer. Values too large for
/// the canonical integer type are rejected rather than clamped.
pub fn non_negative_int(field: &str, raw: f64) -> Result<u32> {
    if !raw.is_finite() {
        return Err(BienError::invalid_field(field, "must be a finite number"));
    }
    if raw < 0.0 {
        return Err(BienError::invalid_field(field, "must not be negative"));
    }
    let floored = raw.floor();
    if floored > u32::MAX as f64 {
        return Err(BienError::invalid_field(field, "is out of range"));
    }
    Ok(floored as u32)
}

/// 3+ ASCII letters, canonicalized to uppercase.
pub fn currency_code(field: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.len() < 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(BienError::invalid_field(
            field,
            "must be a currency code of at least 3 letters",
        ));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Latitude and longitude are required together, range-checked, and
/// rounded to 6 decimals.
pub fn coordinates(field: &str, dto: &CoordinatesDto) -> Result<GeoCoordinates> {
    let (latitude, longitude) = match (dto.latitude, dto.longitude) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            return Err(BienError::invalid_field(
                field,
                "latitude and longitude are required together",
            ))
        }
    };
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(BienError::invalid_field(
            format!("{field}.latitude"),
            "must be a number between -90 and 90",
        ));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(BienError::invalid_field(
            format!("{field}.longitude"),
            "must be a number between -180 and 180",
        ));
    }
    Ok(GeoCoordinates {
        latitude: round6(latitude),
        longitude: round6(longitude),
    })
}

fn required_field(field: &str, raw: Option<&str>) -> Result<String> {
    match raw {
        Some(value) => required_string(field, value),
        None => Err(BienError::invalid_field(field, "is required")),
    }
}

pub fn location(dto: &LocationDto) -> Result<Location> {
    Ok(Location {
        address: required_field("location.address", dto.address.as_deref())?,
        address2: dto.address2.as_deref().and_then(optional_string),
        city: required_field("location.city", dto.city.as_deref())?,
        state: dto.state.as_deref().and_then(optional_string),
        postal_code: required_field("location.postalCode", dto.postal_code.as_deref())?,
        country: required_field("location.country", dto.country.as_deref())?,
        coordinates: dto
            .coordinates
            .as_ref()
            .map(|c| coordinates("location.coordinates", c))
            .transpose()?,
    })
}

fn area_details(dto: &AreaDto) -> Result<Option<AreaDetails>> {
    let area = AreaDetails {
        total: dto
            .total
            .map(|v| non_negative_number("characteristics.area.total", v))
            .transpose()?,
        habitable: dto
            .habitable
            .map(|v| non_negative_number("characteristics.area.habitable", v))
            .transpose()?,
        land: dto
            .land
            .map(|v| non_negative_number("characteristics.area.land", v))
            .transpose()?,
        unit: dto.unit,
    };
    Ok(if area.is_empty() { None } else { Some(area) })
}

/// Returns `None` when no recognized field carried a value: an empty
/// characteristics object and an absent one are the same canonical state.
pub fn characteristics(dto: &CharacteristicsDto) -> Result<Option<Characteristics>> {
    let characteristics = Characteristics {
        rooms: dto
            .rooms
            .map(|v| non_negative_int("characteristics.rooms", v))
            .transpose()?,
        bedrooms: dto
            .bedrooms
            .map(|v| non_negative_int("characteristics.bedrooms", v))
            .transpose()?,
        bathrooms: dto
            .bathrooms
            .map(|v| non_negative_int("characteristics.bathrooms", v))
            .transpose()?,
        toilets: dto
            .toilets
            .map(|v| non_negative_int("characteristics.toilets", v))
            .transpose()?,
        floors: dto
            .floors
            .map(|v| non_negative_int("characteristics.floors", v))
            .transpose()?,
        parking_spaces: dto
            .parking_spaces
            .map(|v| non_negative_int("characteristics.parkingSpaces", v))
            .transpose()?,
        has_elevator: dto.has_elevator,
        has_garden: dto.has_garden,
        has_pool: dto.has_pool,
        has_terrace: dto.has_terrace,
        heating: dto.heating,
        cooling: dto.cooling,
        orientation: dto.orientation,
        year_built: dto
            .year_built
            .map(|v| non_negative_int("characteristics.yearBuilt", v))
            .transpose()?,
        year_renovated: dto
            .year_renovated
            .map(|v| non_negative_int("characteristics.yearRenovated", v))
            .transpose()?,
        area: dto.area.as_ref().map(area_details).transpose()?.flatten(),
    };
    Ok(if characteristics.is_empty() {
        None
    } else {
        Some(characteristics)
    })
}

pub fn energy_diagnostic(dto: &EnergyDiagnosticDto) -> Result<Option<EnergyDiagnostic>> {
    let diagnostic = EnergyDiagnostic {
        consumption_rating: dto.consumption_rating,
        emissions_rating: dto.emissions_rating,
        consumption_value: dto
            .consumption_value
            .map(|v| non_negative_number("energyDiagnostic.consumptionValue", v))
            .transpose()?,
        emissions_value: dto
            .emissions_value
            .map(|v| non_negative_number("energyDiagnostic.emissionsValue", v))
            .transpose()?,
        inspected_at: dto.inspected_at,
        valid_until: dto.valid_until,
        reference: dto.reference.as_deref().and_then(optional_string),
    };
    Ok(if diagnostic.is_empty() {
        None
    } else {
        Some(diagnostic)
    })
}

pub fn rules(dto: &RulesDto) -> Result<Option<Rules>> {
    let rules = Rules {
        furnished: dto.furnished,
        pets_allowed: dto.pets_allowed,
        smoking_allowed: dto.smoking_allowed,
        children_allowed: dto.children_allowed,
        events_allowed: dto.events_allowed,
        minimum_lease_months: dto
            .minimum_lease_months
            .map(|v| non_negative_int("rules.minimumLeaseMonths", v))
            .transpose()?,
        max_occupants: dto
            .max_occupants
            .map(|v| non_negative_int("rules.maxOccupants", v))
            .transpose()?,
        custom_rules: string_list(dto.custom_rules.as_deref().unwrap_or_default()),
    };
    Ok(if rules.is_empty() { None } else { Some(rules) })
}
