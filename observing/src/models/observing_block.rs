//! Observing blocks: an ordered script list plus scheduling constraints.

use std::any::Any;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::constraints::{
    AirmassConstraint, CloudExtinctionConstraint, ConstraintKind, MoonBrightnessConstraint,
    MoonDistanceConstraint, SeeingConstraint, SkyBrightnessConstraint,
};
use super::scheduling_constraint::{json_type_name, SchedulingConstraint};
use super::script::ObservingScript;
use crate::config::ExtraFieldPolicy;
use crate::error::{ObservingError, Result, ValidationError};

/// A collection of observing scripts and the constraints under which they
/// may be scheduled.
///
/// The block owns its scripts and constraints. After construction the only
/// mutation is appending a constraint; duplicate constraint kinds are kept
/// as-is and left for the scheduler to interpret.
///
/// Equality is structural: two blocks are equal when every field, including
/// `id` and the order of both lists, is equal.
///
/// # Examples
///
/// ```
/// use ts_observing::{AirmassConstraint, ObservingBlock, ObservingScript, SeeingConstraint};
///
/// let slew = ObservingScript::new("slew", true, Default::default());
/// let mut block = ObservingBlock::builder("OBS-1", "SITCOM-1")
///     .script(slew)
///     .constraint(AirmassConstraint::new(1.5).unwrap())
///     .build();
/// block.add_constraint(SeeingConstraint::new(0.8).unwrap());
///
/// let json = block.to_json().unwrap();
/// assert_eq!(ObservingBlock::from_json(&json).unwrap(), block);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservingBlock {
    name: String,
    id: Uuid,
    program: String,
    constraints: Vec<SchedulingConstraint>,
    scripts: Vec<ObservingScript>,
}

impl ObservingBlock {
    /// Create a block with a freshly generated id and no constraints.
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        scripts: Vec<ObservingScript>,
    ) -> Self {
        Self::builder(name, program).scripts(scripts).build()
    }

    pub fn builder(name: impl Into<String>, program: impl Into<String>) -> ObservingBlockBuilder {
        ObservingBlockBuilder {
            name: name.into(),
            program: program.into(),
            id: None,
            constraints: Vec::new(),
            scripts: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Constraints in insertion order.
    pub fn constraints(&self) -> &[SchedulingConstraint] {
        &self.constraints
    }

    /// Scripts in execution order.
    pub fn scripts(&self) -> &[ObservingScript] {
        &self.scripts
    }

    /// Constraints of one kind, in insertion order.
    pub fn constraints_of_kind(
        &self,
        kind: ConstraintKind,
    ) -> impl Iterator<Item = &SchedulingConstraint> {
        self.constraints.iter().filter(move |c| c.kind() == kind)
    }

    /// Append a constraint.
    ///
    /// No check is made against constraints already present, so a block can
    /// hold several constraints of the same kind.
    pub fn add_constraint(&mut self, constraint: impl Into<SchedulingConstraint>) {
        let constraint = constraint.into();
        let kind = constraint.kind();
        if self.constraints.iter().any(|c| c.kind() == kind) {
            log::debug!("Block {} now holds more than one {} constraint", self.id, kind);
        }
        self.constraints.push(constraint);
        log::debug!(
            "Added {} constraint to block {} ({} total)",
            kind,
            self.id,
            self.constraints.len()
        );
    }

    /// Append a dynamically typed value if it is a scheduling constraint.
    ///
    /// Accepts a [`SchedulingConstraint`] or any concrete constraint type.
    /// Anything else, including JSON that looks like a constraint, fails with
    /// [`ObservingError::TypeMismatch`] and leaves the block unchanged.
    pub fn try_add_constraint(&mut self, value: &dyn Any) -> Result<()> {
        match constraint_from_any(value) {
            Some(constraint) => {
                self.add_constraint(constraint);
                Ok(())
            }
            None => Err(ObservingError::TypeMismatch {
                expected: "a scheduling constraint",
                found: describe_any(value),
            }),
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a block from JSON, keeping unrecognized constraint fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with(json, ExtraFieldPolicy::Preserve)
    }

    /// Parse a block from JSON, applying `policy` to unrecognized constraint fields.
    pub fn from_json_with(json: &str, policy: ExtraFieldPolicy) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value_with(value, policy)?)
    }

    pub fn from_value(value: Value) -> std::result::Result<Self, ValidationError> {
        Self::from_value_with(value, ExtraFieldPolicy::Preserve)
    }

    /// Decode and validate a block. The first invalid constraint or script
    /// fails the whole block; the error names its position.
    pub fn from_value_with(
        value: Value,
        policy: ExtraFieldPolicy,
    ) -> std::result::Result<Self, ValidationError> {
        let wire: BlockWire =
            serde_json::from_value(value).map_err(|e| ValidationError::malformed("block", e))?;

        let constraints = wire
            .constraints
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                SchedulingConstraint::from_value_with(c, policy)
                    .map_err(|e| e.at(format!("constraints[{}]", i)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let scripts = wire
            .scripts
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                serde_json::from_value::<ObservingScript>(s)
                    .map_err(|e| ValidationError::malformed(format!("scripts[{}]", i), e))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut builder = Self::builder(wire.name, wire.program)
            .constraints(constraints)
            .scripts(scripts);
        if let Some(id) = wire.id {
            builder = builder.id(id);
        }
        Ok(builder.build())
    }
}

impl<'de> Deserialize<'de> for ObservingBlock {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Block shape on the wire, before constraint dispatch and validation.
#[derive(Deserialize)]
struct BlockWire {
    name: String,
    #[serde(default)]
    id: Option<Uuid>,
    program: String,
    #[serde(default)]
    constraints: Vec<Value>,
    scripts: Vec<Value>,
}

/// Builder for [`ObservingBlock`]. The id is generated in [`build`](Self::build)
/// unless one was supplied.
#[derive(Debug, Clone)]
pub struct ObservingBlockBuilder {
    name: String,
    program: String,
    id: Option<Uuid>,
    constraints: Vec<SchedulingConstraint>,
    scripts: Vec<ObservingScript>,
}

impl ObservingBlockBuilder {
    /// Adopt an existing identity, e.g. when resubmitting a revised block.
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn constraint(mut self, constraint: impl Into<SchedulingConstraint>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn constraints(mut self, constraints: impl IntoIterator<Item = SchedulingConstraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    pub fn script(mut self, script: ObservingScript) -> Self {
        self.scripts.push(script);
        self
    }

    pub fn scripts(mut self, scripts: impl IntoIterator<Item = ObservingScript>) -> Self {
        self.scripts.extend(scripts);
        self
    }

    pub fn build(self) -> ObservingBlock {
        let id = self.id.unwrap_or_else(Uuid::new_v4);
        log::debug!(
            "Built observing block {} ({}) with {} scripts and {} constraints",
            self.name,
            id,
            self.scripts.len(),
            self.constraints.len()
        );
        ObservingBlock {
            name: self.name,
            id,
            program: self.program,
            constraints: self.constraints,
            scripts: self.scripts,
        }
    }
}

fn constraint_from_any(value: &dyn Any) -> Option<SchedulingConstraint> {
    if let Some(c) = value.downcast_ref::<SchedulingConstraint>() {
        return Some(c.clone());
    }
    if let Some(c) = value.downcast_ref::<AirmassConstraint>() {
        return Some(c.clone().into());
    }
    if let Some(c) = value.downcast_ref::<MoonBrightnessConstraint>() {
        return Some(c.clone().into());
    }
    if let Some(c) = value.downcast_ref::<MoonDistanceConstraint>() {
        return Some(c.clone().into());
    }
    if let Some(c) = value.downcast_ref::<SkyBrightnessConstraint>() {
        return Some(c.clone().into());
    }
    if let Some(c) = value.downcast_ref::<CloudExtinctionConstraint>() {
        return Some(c.clone().into());
    }
    value
        .downcast_ref::<SeeingConstraint>()
        .map(|c| c.clone().into())
}

fn describe_any(value: &dyn Any) -> String {
    if let Some(v) = value.downcast_ref::<Value>() {
        format!("JSON value ({})", json_type_name(v))
    } else if value.is::<serde_json::Map<String, Value>>() {
        "JSON object".to_string()
    } else if value.is::<String>() || value.is::<&str>() {
        "string".to_string()
    } else {
        "unsupported type".to_string()
    }
}
