/// Defines an immutable scheduling constraint with a single bounded `max`
/// field and generates:
/// - the value type with private fields (`Debug, Clone, PartialEq`)
/// - a validating `new(max)` constructor and `with_max` / `with_extra` copies
/// - accessors for `max` and the retained extra fields
/// - serde impls routed through a private flat field record, so decoding runs the
///   same validation as `new`
///
/// Usage:
///   define_max_constraint!(
///       /// Doc comment.
///       AirmassConstraint, AirmassFields, Airmass, Bound::AtLeast(1.0)
///   );
#[macro_export]
macro_rules! define_max_constraint {
    (
        $(#[$meta:meta])*
        $name:ident, $fields:ident, $kind:ident, $bound:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            max: f64,
            extra: serde_json::Map<String, serde_json::Value>,
        }

        /// Wire shape of the constraint, before validation.
        #[derive(serde::Serialize, serde::Deserialize)]
        struct $fields {
            max: f64,
            #[serde(flatten)]
            extra: serde_json::Map<String, serde_json::Value>,
        }

        impl $name {
            /// Discriminator written to the `kind` field.
            pub const KIND: $crate::models::ConstraintKind = $crate::models::ConstraintKind::$kind;

            /// Domain accepted for `max`.
            pub const MAX_BOUND: $crate::models::Bound = $bound;

            /// Build a validated constraint.
            pub fn new(max: f64) -> ::std::result::Result<Self, $crate::error::ValidationError> {
                Self::MAX_BOUND.check(Self::KIND, "max", max)?;
                Ok(Self {
                    max,
                    extra: serde_json::Map::new(),
                })
            }

            pub fn max(&self) -> f64 {
                self.max
            }

            /// Unrecognized fields retained from the producer.
            pub fn extra(&self) -> &serde_json::Map<String, serde_json::Value> {
                &self.extra
            }

            /// Copy of this constraint with a different `max`, validated again.
            pub fn with_max(&self, max: f64) -> ::std::result::Result<Self, $crate::error::ValidationError> {
                Self::MAX_BOUND.check(Self::KIND, "max", max)?;
                Ok(Self {
                    max,
                    extra: self.extra.clone(),
                })
            }

            /// Copy of this constraint carrying one more extra field.
            pub fn with_extra(
                &self,
                key: impl Into<String>,
                value: serde_json::Value,
            ) -> ::std::result::Result<Self, $crate::error::ValidationError> {
                let key = key.into();
                $crate::models::constraints::check_extra_key(Self::KIND, &["max"], &key)?;
                let mut extra = self.extra.clone();
                extra.insert(key, value);
                Ok(Self {
                    max: self.max,
                    extra,
                })
            }
        }

        impl $name {
            fn from_fields(fields: $fields) -> ::std::result::Result<Self, $crate::error::ValidationError> {
                Self::MAX_BOUND.check(Self::KIND, "max", fields.max)?;
                let extra = $crate::models::constraints::take_extra(Self::KIND, fields.extra)?;
                Ok(Self {
                    max: fields.max,
                    extra,
                })
            }

            fn to_fields(&self) -> $fields {
                $fields {
                    max: self.max,
                    extra: self.extra.clone(),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                ::serde::Serialize::serialize(&self.to_fields(), serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let fields = <$fields as ::serde::Deserialize<'de>>::deserialize(deserializer)?;
                Self::from_fields(fields).map_err(<D::Error as ::serde::de::Error>::custom)
            }
        }
    };
}
