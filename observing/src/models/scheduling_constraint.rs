//! The closed set of scheduling constraints.
//!
//! `SchedulingConstraint` is the only type a block's constraint list holds.
//! On the wire each constraint is a flat JSON object whose `kind` field
//! selects the variant; decoding looks the tag up once and then hands the
//! object to that variant's validating deserializer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::constraints::{
    AirmassConstraint, Band, CloudExtinctionConstraint, ConstraintKind, MoonBrightnessConstraint,
    MoonDistanceConstraint, SeeingConstraint, SkyBrightnessConstraint,
};
use crate::config::ExtraFieldPolicy;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchedulingConstraint {
    Airmass(AirmassConstraint),
    MoonBrightness(MoonBrightnessConstraint),
    MoonDistance(MoonDistanceConstraint),
    SkyBrightness(SkyBrightnessConstraint),
    CloudExtinction(CloudExtinctionConstraint),
    Seeing(SeeingConstraint),
}

impl SchedulingConstraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            SchedulingConstraint::Airmass(_) => ConstraintKind::Airmass,
            SchedulingConstraint::MoonBrightness(_) => ConstraintKind::MoonBrightness,
            SchedulingConstraint::MoonDistance(_) => ConstraintKind::MoonDistance,
            SchedulingConstraint::SkyBrightness(_) => ConstraintKind::SkyBrightness,
            SchedulingConstraint::CloudExtinction(_) => ConstraintKind::CloudExtinction,
            SchedulingConstraint::Seeing(_) => ConstraintKind::Seeing,
        }
    }

    /// The bounded `max` value every variant carries.
    pub fn max(&self) -> f64 {
        match self {
            SchedulingConstraint::Airmass(c) => c.max(),
            SchedulingConstraint::MoonBrightness(c) => c.max(),
            SchedulingConstraint::MoonDistance(c) => c.max(),
            SchedulingConstraint::SkyBrightness(c) => c.max(),
            SchedulingConstraint::CloudExtinction(c) => c.max(),
            SchedulingConstraint::Seeing(c) => c.max(),
        }
    }

    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            SchedulingConstraint::Airmass(c) => c.extra(),
            SchedulingConstraint::MoonBrightness(c) => c.extra(),
            SchedulingConstraint::MoonDistance(c) => c.extra(),
            SchedulingConstraint::SkyBrightness(c) => c.extra(),
            SchedulingConstraint::CloudExtinction(c) => c.extra(),
            SchedulingConstraint::Seeing(c) => c.extra(),
        }
    }

    /// Decode one constraint object, keeping any extra fields.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        Self::from_value_with(value, ExtraFieldPolicy::Preserve)
    }

    /// Decode one constraint object, applying `policy` to extra fields.
    pub fn from_value_with(value: Value, policy: ExtraFieldPolicy) -> Result<Self, ValidationError> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(ValidationError::malformed(
                    "constraint",
                    format!("expected an object, found {}", json_type_name(&other)),
                ))
            }
        };
        let kind: ConstraintKind = match object.get("kind") {
            Some(Value::String(tag)) => tag.parse()?,
            _ => return Err(ValidationError::MissingKind),
        };

        let body = Value::Object(object);
        let constraint = match kind {
            ConstraintKind::Airmass => Self::Airmass(decode_variant(kind, body)?),
            ConstraintKind::MoonBrightness => Self::MoonBrightness(decode_variant(kind, body)?),
            ConstraintKind::MoonDistance => Self::MoonDistance(decode_variant(kind, body)?),
            ConstraintKind::SkyBrightness => Self::SkyBrightness(decode_variant(kind, body)?),
            ConstraintKind::CloudExtinction => Self::CloudExtinction(decode_variant(kind, body)?),
            ConstraintKind::Seeing => Self::Seeing(decode_variant(kind, body)?),
        };

        policy.apply(kind, constraint.extra())?;
        Ok(constraint)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Run a variant's own deserializer, recovering its typed validation error
/// when the failure came from a domain check rather than the JSON shape.
fn decode_variant<T>(kind: ConstraintKind, body: Value) -> Result<T, ValidationError>
where
    T: serde::de::DeserializeOwned,
{
    let original = body.clone();
    serde_json::from_value(body).map_err(|e| {
        recheck(kind, &original).unwrap_or_else(|| ValidationError::malformed(kind.as_str(), e))
    })
}

/// Re-run the typed field checks on a body that failed to decode so the
/// caller gets `OutOfRange` / `NotInSet` instead of a flattened message.
fn recheck(kind: ConstraintKind, body: &Value) -> Option<ValidationError> {
    let max = body.get("max").and_then(Value::as_f64);
    let result = match kind {
        ConstraintKind::SkyBrightness => {
            let band = body.get("band").and_then(Value::as_str)?;
            let band = match band.parse::<Band>() {
                Ok(band) => band,
                Err(e) => return Some(e),
            };
            SkyBrightnessConstraint::new(max?, band).map(|_| ())
        }
        ConstraintKind::Airmass => AirmassConstraint::new(max?).map(|_| ()),
        ConstraintKind::MoonBrightness => MoonBrightnessConstraint::new(max?).map(|_| ()),
        ConstraintKind::MoonDistance => MoonDistanceConstraint::new(max?).map(|_| ()),
        ConstraintKind::CloudExtinction => CloudExtinctionConstraint::new(max?).map(|_| ()),
        ConstraintKind::Seeing => SeeingConstraint::new(max?).map(|_| ()),
    };
    result.err()
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl<'de> Deserialize<'de> for SchedulingConstraint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

macro_rules! impl_variant_conversions {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for SchedulingConstraint {
                fn from(c: $ty) -> Self {
                    SchedulingConstraint::$variant(c)
                }
            }

            impl TryFrom<SchedulingConstraint> for $ty {
                type Error = SchedulingConstraint;

                fn try_from(c: SchedulingConstraint) -> Result<Self, Self::Error> {
                    match c {
                        SchedulingConstraint::$variant(inner) => Ok(inner),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_variant_conversions!(
    Airmass => AirmassConstraint,
    MoonBrightness => MoonBrightnessConstraint,
    MoonDistance => MoonDistanceConstraint,
    SkyBrightness => SkyBrightnessConstraint,
    CloudExtinction => CloudExtinctionConstraint,
    Seeing => SeeingConstraint,
);
