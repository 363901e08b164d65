use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A single observing script and the parameters to run it with.
///
/// Neither the script name nor its parameters are validated here; the
/// script runtime owns their schema. Parameters keep insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservingScript {
    /// Name of the observing script to run.
    pub name: String,
    /// Whether this refers to a standard (vetted) script rather than a custom one.
    pub standard: bool,
    /// Parameters passed to the script.
    pub parameters: Map<String, Value>,
}

impl ObservingScript {
    pub fn new(name: impl Into<String>, standard: bool, parameters: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            standard,
            parameters,
        }
    }

    /// Append (or replace) one parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Script configuration as a block-style YAML document.
    ///
    /// Keys appear in insertion order. An empty parameter set renders as an
    /// empty string. Multi-line strings are double-quoted; any other string
    /// containing `:` is single-quoted so a line-oriented reader cannot
    /// mistake it for a key separator.
    pub fn get_script_configuration(&self) -> Result<String> {
        let mut out = String::new();
        if !self.parameters.is_empty() {
            write_mapping(&mut out, &self.parameters, 0)?;
        }
        Ok(out)
    }
}

fn write_mapping(out: &mut String, map: &Map<String, Value>, indent: usize) -> Result<()> {
    let pad = " ".repeat(indent);
    for (key, value) in map {
        let key = scalar_string(key)?;
        match value {
            Value::Object(inner) if !inner.is_empty() => {
                out.push_str(&format!("{}{}:\n", pad, key));
                write_mapping(out, inner, indent + 2)?;
            }
            // Block sequences under a key sit at the key's own indentation.
            Value::Array(items) if !items.is_empty() => {
                out.push_str(&format!("{}{}:\n", pad, key));
                write_sequence(out, items, indent)?;
            }
            scalar => out.push_str(&format!("{}{}: {}\n", pad, key, scalar_text(scalar)?)),
        }
    }
    Ok(())
}

fn write_sequence(out: &mut String, items: &[Value], indent: usize) -> Result<()> {
    let pad = " ".repeat(indent);
    for item in items {
        match item {
            Value::Object(inner) if !inner.is_empty() => {
                let mut nested = String::new();
                write_mapping(&mut nested, inner, indent + 2)?;
                out.push_str(&format!("{}- {}", pad, &nested[indent + 2..]));
            }
            Value::Array(inner) if !inner.is_empty() => {
                let mut nested = String::new();
                write_sequence(&mut nested, inner, indent + 2)?;
                out.push_str(&format!("{}- {}", pad, &nested[indent + 2..]));
            }
            scalar => out.push_str(&format!("{}- {}\n", pad, scalar_text(scalar)?)),
        }
    }
    Ok(())
}

/// Inline text for a scalar or an empty container.
fn scalar_text(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::String(s) => scalar_string(s)?,
        Value::Array(_) => "[]".to_string(),
        Value::Object(_) => "{}".to_string(),
    })
}

/// YAML 1.1 readers only take `1.0e+20` as a float: the mantissa needs a
/// `.` and the exponent a sign.
fn number_text(n: &serde_json::Number) -> String {
    let text = n.to_string();
    if !n.is_f64() {
        return text;
    }
    match text.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => {
            let dot = if mantissa.contains('.') { "" } else { ".0" };
            let sign = if exponent.starts_with(['+', '-']) { "" } else { "+" };
            format!("{}{}e{}{}", mantissa, dot, sign, exponent)
        }
        None => text,
    }
}

fn scalar_string(s: &str) -> Result<String> {
    // Line breaks inside single quotes fold to spaces, so multi-line
    // strings are always double-quoted.
    if s.contains('\n') {
        // A JSON string literal is a valid YAML double-quoted scalar.
        return Ok(serde_json::to_string(s)?);
    }
    if s.contains(':') {
        return Ok(format!("'{}'", s.replace('\'', "''")));
    }
    let rendered = serde_yaml::to_string(s)?;
    Ok(rendered.trim_end_matches('\n').to_string())
}
