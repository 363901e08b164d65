//! Scheduling constraint variants.
//!
//! Every variant is an immutable value: fields are private, construction
//! validates them, and "changing" a constraint produces a new instance.
//! Fields a producer adds beyond the typed ones are kept in an `extra`
//! bag and written back out on serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Tag written to the `kind` field of every serialized constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Airmass,
    MoonBrightness,
    MoonDistance,
    SkyBrightness,
    CloudExtinction,
    Seeing,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 6] = [
        ConstraintKind::Airmass,
        ConstraintKind::MoonBrightness,
        ConstraintKind::MoonDistance,
        ConstraintKind::SkyBrightness,
        ConstraintKind::CloudExtinction,
        ConstraintKind::Seeing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Airmass => "airmass",
            ConstraintKind::MoonBrightness => "moon_brightness",
            ConstraintKind::MoonDistance => "moon_distance",
            ConstraintKind::SkyBrightness => "sky_brightness",
            ConstraintKind::CloudExtinction => "cloud_extinction",
            ConstraintKind::Seeing => "seeing",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstraintKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "airmass" => Ok(ConstraintKind::Airmass),
            "moon_brightness" => Ok(ConstraintKind::MoonBrightness),
            "moon_distance" => Ok(ConstraintKind::MoonDistance),
            "sky_brightness" => Ok(ConstraintKind::SkyBrightness),
            "cloud_extinction" => Ok(ConstraintKind::CloudExtinction),
            "seeing" => Ok(ConstraintKind::Seeing),
            other => Err(ValidationError::UnknownKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// Closed numeric domain of a constraint field. NaN is never inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// `value >= min`
    AtLeast(f64),
    /// `min <= value <= max`
    Between(f64, f64),
}

impl Bound {
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Bound::AtLeast(min) => value >= min,
            Bound::Between(min, max) => value >= min && value <= max,
        }
    }

    pub(crate) fn check(
        &self,
        kind: ConstraintKind,
        field: &'static str,
        value: f64,
    ) -> Result<(), ValidationError> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                kind,
                field,
                bound: *self,
                value,
            })
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::AtLeast(min) => write!(f, ">= {}", min),
            Bound::Between(min, max) => write!(f, "between {} and {}", min, max),
        }
    }
}

/// Photometric band (ugrizy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    U,
    G,
    R,
    I,
    Z,
    Y,
}

impl Band {
    pub const ALL: [Band; 6] = [Band::U, Band::G, Band::R, Band::I, Band::Z, Band::Y];

    /// Allowed band letters, in wavelength order.
    pub const LETTERS: &'static str = "ugrizy";

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::U => "u",
            Band::G => "g",
            Band::R => "r",
            Band::I => "i",
            Band::Z => "z",
            Band::Y => "y",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Band {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u" => Ok(Band::U),
            "g" => Ok(Band::G),
            "r" => Ok(Band::R),
            "i" => Ok(Band::I),
            "z" => Ok(Band::Z),
            "y" => Ok(Band::Y),
            other => Err(ValidationError::NotInSet {
                kind: ConstraintKind::SkyBrightness,
                field: "band",
                allowed: Band::LETTERS,
                value: other.to_string(),
            }),
        }
    }
}

/// Reject extra keys that would collide with the tag or a typed field.
pub(crate) fn check_extra_key(
    kind: ConstraintKind,
    typed_fields: &[&str],
    key: &str,
) -> Result<(), ValidationError> {
    if key == "kind" || typed_fields.contains(&key) {
        return Err(ValidationError::ReservedField {
            kind,
            field: key.to_string(),
        });
    }
    Ok(())
}

/// Strip a matching `kind` tag from decoded extras; a mismatching one is an error.
pub(crate) fn take_extra(
    kind: ConstraintKind,
    mut extra: Map<String, Value>,
) -> Result<Map<String, Value>, ValidationError> {
    if let Some(tag) = extra.remove("kind") {
        if tag.as_str() != Some(kind.as_str()) {
            return Err(ValidationError::ReservedField {
                kind,
                field: "kind".to_string(),
            });
        }
    }
    if !extra.is_empty() {
        log::debug!(
            "{} constraint retained extra fields: {:?}",
            kind,
            extra.keys().collect::<Vec<_>>()
        );
    }
    Ok(extra)
}

crate::define_max_constraint!(
    /// A constraint on the airmass of the target.
    ///
    /// `max` is the largest airmass acceptable for the observation; airmass
    /// is 1.0 at zenith, so anything below that is rejected.
    AirmassConstraint,
    AirmassFields,
    Airmass,
    Bound::AtLeast(1.0)
);

crate::define_max_constraint!(
    /// A constraint on the relative Moon brightness (0.0 to 1.0).
    MoonBrightnessConstraint,
    MoonBrightnessFields,
    MoonBrightness,
    Bound::Between(0.0, 1.0)
);

crate::define_max_constraint!(
    /// A constraint on the distance of the target from the Moon.
    ///
    /// `max` is expressed in degrees (0.0 to 180.0).
    MoonDistanceConstraint,
    MoonDistanceFields,
    MoonDistance,
    Bound::Between(0.0, 180.0)
);

crate::define_max_constraint!(
    /// Maximum cloud extinction allowed for this observation.
    CloudExtinctionConstraint,
    CloudExtinctionFields,
    CloudExtinction,
    Bound::AtLeast(0.0)
);

crate::define_max_constraint!(
    /// A constraint on the DIMM seeing value, in arcseconds.
    SeeingConstraint,
    SeeingFields,
    Seeing,
    Bound::AtLeast(0.0)
);

/// Maximum sky brightness (mag) allowed in one observing band.
///
/// The band is part of the constraint rather than the type, so a block may
/// carry one sky-brightness limit per band.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyBrightnessConstraint {
    max: f64,
    band: Band,
    extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct SkyBrightnessFields {
    max: f64,
    band: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl SkyBrightnessConstraint {
    pub const KIND: ConstraintKind = ConstraintKind::SkyBrightness;

    pub const MAX_BOUND: Bound = Bound::AtLeast(0.0);

    pub fn new(max: f64, band: Band) -> Result<Self, ValidationError> {
        Self::MAX_BOUND.check(Self::KIND, "max", max)?;
        Ok(Self {
            max,
            band,
            extra: Map::new(),
        })
    }

    /// Like [`SkyBrightnessConstraint::new`] but parses the band letter.
    pub fn from_letter(max: f64, band: &str) -> Result<Self, ValidationError> {
        Self::new(max, band.parse::<Band>()?)
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn band(&self) -> Band {
        self.band
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn with_max(&self, max: f64) -> Result<Self, ValidationError> {
        Self::MAX_BOUND.check(Self::KIND, "max", max)?;
        Ok(Self {
            max,
            ..self.clone()
        })
    }

    pub fn with_band(&self, band: Band) -> Self {
        Self {
            band,
            ..self.clone()
        }
    }

    pub fn with_extra(&self, key: impl Into<String>, value: Value) -> Result<Self, ValidationError> {
        let key = key.into();
        check_extra_key(Self::KIND, &["max", "band"], &key)?;
        let mut next = self.clone();
        next.extra.insert(key, value);
        Ok(next)
    }
}

impl SkyBrightnessConstraint {
    fn from_fields(fields: SkyBrightnessFields) -> Result<Self, ValidationError> {
        let band: Band = fields.band.parse()?;
        Self::MAX_BOUND.check(Self::KIND, "max", fields.max)?;
        let extra = take_extra(Self::KIND, fields.extra)?;
        Ok(Self {
            max: fields.max,
            band,
            extra,
        })
    }

    fn to_fields(&self) -> SkyBrightnessFields {
        SkyBrightnessFields {
            max: self.max,
            band: self.band.as_str().to_string(),
            extra: self.extra.clone(),
        }
    }
}

impl Serialize for SkyBrightnessConstraint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_fields().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SkyBrightnessConstraint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = SkyBrightnessFields::deserialize(deserializer)?;
        Self::from_fields(fields).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_airmass_valid() {
        let c = AirmassConstraint::new(1.4).unwrap();
        assert_eq!(c.max(), 1.4);
        assert!(c.extra().is_empty());
    }

    #[test]
    fn test_airmass_below_zenith_rejected() {
        let err = AirmassConstraint::new(0.5).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                kind: ConstraintKind::Airmass,
                field: "max",
                bound: Bound::AtLeast(1.0),
                value: 0.5,
            }
        );
    }

    #[test]
    fn test_airmass_boundary_accepted() {
        assert!(AirmassConstraint::new(1.0).is_ok());
    }

    #[test]
    fn test_moon_brightness_range() {
        assert_eq!(MoonBrightnessConstraint::new(0.8).unwrap().max(), 0.8);
        assert!(MoonBrightnessConstraint::new(0.0).is_ok());
        assert!(MoonBrightnessConstraint::new(1.0).is_ok());
        assert!(MoonBrightnessConstraint::new(1.5).is_err());
        assert!(MoonBrightnessConstraint::new(-2.0).is_err());
    }

    #[test]
    fn test_moon_distance_range() {
        assert_eq!(MoonDistanceConstraint::new(90.0).unwrap().max(), 90.0);
        assert!(MoonDistanceConstraint::new(180.0).is_ok());
        assert!(MoonDistanceConstraint::new(190.0).is_err());
        assert!(MoonDistanceConstraint::new(-2.0).is_err());
    }

    #[test]
    fn test_sky_brightness() {
        let c = SkyBrightnessConstraint::from_letter(2.0, "u").unwrap();
        assert_eq!(c.band(), Band::U);
        assert_eq!(c.max(), 2.0);

        let err = SkyBrightnessConstraint::from_letter(1.0, "x").unwrap_err();
        assert!(matches!(err, ValidationError::NotInSet { field: "band", .. }));

        assert!(SkyBrightnessConstraint::new(-1.0, Band::U).is_err());
    }

    #[test]
    fn test_cloud_extinction_and_seeing() {
        assert_eq!(CloudExtinctionConstraint::new(8.0).unwrap().max(), 8.0);
        assert!(CloudExtinctionConstraint::new(-10.0).is_err());
        assert_eq!(SeeingConstraint::new(0.4).unwrap().max(), 0.4);
        assert!(SeeingConstraint::new(-0.1).is_err());
    }

    #[test]
    fn test_nan_is_out_of_range() {
        assert!(SeeingConstraint::new(f64::NAN).is_err());
        assert!(MoonBrightnessConstraint::new(f64::NAN).is_err());
    }

    #[test]
    fn test_with_max_returns_new_validated_instance() {
        let original = AirmassConstraint::new(1.5).unwrap();
        let tighter = original.with_max(1.2).unwrap();
        assert_eq!(original.max(), 1.5);
        assert_eq!(tighter.max(), 1.2);
        assert!(original.with_max(0.9).is_err());
    }

    #[test]
    fn test_with_band_leaves_original_untouched() {
        let original = SkyBrightnessConstraint::new(20.5, Band::R)
            .unwrap()
            .with_extra("source", json!("ops"))
            .unwrap();
        let redder = original.with_band(Band::Z);
        assert_eq!(original.band(), Band::R);
        assert_eq!(redder.band(), Band::Z);
        assert_eq!(redder.max(), 20.5);
        assert_eq!(redder.extra(), original.extra());
        assert_eq!(
            serde_json::to_value(&redder).unwrap(),
            json!({"max": 20.5, "band": "z", "source": "ops"})
        );
    }

    #[test]
    fn test_with_extra_rejects_reserved_keys() {
        let c = SeeingConstraint::new(0.7).unwrap();
        assert!(c.with_extra("kind", json!("airmass")).is_err());
        assert!(c.with_extra("max", json!(1.0)).is_err());

        let sky = SkyBrightnessConstraint::new(20.0, Band::R).unwrap();
        assert!(sky.with_extra("band", json!("g")).is_err());
        let sky = sky.with_extra("source", json!("ops")).unwrap();
        assert_eq!(sky.extra()["source"], json!("ops"));
    }

    #[test]
    fn test_deserialize_keeps_unknown_fields() {
        let c: AirmassConstraint =
            serde_json::from_value(json!({"max": 1.3, "comment": "survey default"})).unwrap();
        assert_eq!(c.max(), 1.3);
        assert_eq!(c.extra()["comment"], json!("survey default"));

        let back = serde_json::to_value(&c).unwrap();
        assert_eq!(back, json!({"max": 1.3, "comment": "survey default"}));
    }

    #[test]
    fn test_deserialize_validates() {
        let result: Result<AirmassConstraint, _> = serde_json::from_value(json!({"max": 0.2}));
        assert!(result.is_err());

        let result: Result<CloudExtinctionConstraint, _> =
            serde_json::from_value(json!({"max": "cirrus"}));
        assert!(result.is_err());

        let result: Result<MoonBrightnessConstraint, _> =
            serde_json::from_value(json!({"max": "half"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_accepts_integer_numbers() {
        let c: MoonDistanceConstraint = serde_json::from_value(json!({"max": 45})).unwrap();
        assert_eq!(c.max(), 45.0);
    }

    #[test]
    fn test_deserialize_strips_matching_kind_tag() {
        let c: SeeingConstraint =
            serde_json::from_value(json!({"kind": "seeing", "max": 0.9})).unwrap();
        assert!(c.extra().is_empty());

        let mismatched: Result<SeeingConstraint, _> =
            serde_json::from_value(json!({"kind": "airmass", "max": 1.9}));
        assert!(mismatched.is_err());
    }

    #[test]
    fn test_kind_strings_round_trip() {
        for kind in ConstraintKind::ALL {
            assert_eq!(kind.as_str().parse::<ConstraintKind>().unwrap(), kind);
        }
        assert!(matches!(
            "humidity".parse::<ConstraintKind>(),
            Err(ValidationError::UnknownKind { .. })
        ));
    }

    #[test]
    fn test_band_letters() {
        let letters: String = Band::ALL.iter().map(|b| b.as_str()).collect();
        assert_eq!(letters, Band::LETTERS);
        assert_eq!(serde_json::to_value(Band::Z).unwrap(), json!("z"));
    }

    #[test]
    fn test_bound_display() {
        assert_eq!(Bound::AtLeast(0.0).to_string(), ">= 0");
        assert_eq!(Bound::Between(0.0, 180.0).to_string(), "between 0 and 180");
    }
}
