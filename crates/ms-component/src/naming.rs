//! Component names and representations.
//!
//! A component's name is its type name in snake case followed by its
//! constructor arguments, joined with dots.  A nested component argument
//! contributes its own name in single quotes:
//!
//! ```text
//! BloodPressureModule                      → blood_pressure_module
//! DiseaseModel("flu")                      → disease_model.flu
//! RiskEffect(risk = Exposure("bmi"), …)    → risk_effect.'exposure.bmi'.…
//! ```
//!
//! The representation mirrors a constructor call:
//! `RiskEffect(risk=Exposure(name=bmi), target=flu)`.

use std::fmt;

use crate::Component;

/// The value of one constructor argument.
pub enum ArgValue<'a> {
    Value(String),
    Component(&'a dyn Component),
}

/// A named constructor argument, as reported by [`Component::arguments`].
pub struct ComponentArg<'a> {
    pub name:  &'static str,
    pub value: ArgValue<'a>,
}

impl<'a> ComponentArg<'a> {
    pub fn value(name: &'static str, value: impl fmt::Display) -> Self {
        Self { name, value: ArgValue::Value(value.to_string()) }
    }

    pub fn component(name: &'static str, component: &'a dyn Component) -> Self {
        Self { name, value: ArgValue::Component(component) }
    }
}

/// Convert a CamelCase type name to snake_case.
///
/// Two passes: first split before every capitalised word, then split between
/// a lowercase letter or digit and a following capital.  Runs of capitals
/// such as acronyms stay together (`SISModel` → `sis_model`).
pub fn snake_case(type_name: &str) -> String {
    let chars: Vec<char> = type_name.chars().collect();
    let n = chars.len();

    let mut first = Vec::with_capacity(n + 4);
    let mut i = 0;
    while i < n {
        if i + 2 < n && chars[i + 1].is_ascii_uppercase() && chars[i + 2].is_ascii_lowercase() {
            let mut j = i + 3;
            while j < n && chars[j].is_ascii_lowercase() {
                j += 1;
            }
            first.push(chars[i]);
            first.push('_');
            first.extend_from_slice(&chars[i + 1..j]);
            i = j;
        } else {
            first.push(chars[i]);
            i += 1;
        }
    }

    let m = first.len();
    let mut out = String::with_capacity(m + 4);
    let mut i = 0;
    while i < m {
        let c = first[i];
        if i + 1 < m
            && (c.is_ascii_lowercase() || c.is_ascii_digit())
            && first[i + 1].is_ascii_uppercase()
        {
            out.push(c);
            out.push('_');
            out.push(first[i + 1]);
            i += 2;
        } else {
            out.push(c);
            i += 1;
        }
    }
    out.to_lowercase()
}

/// A component's fixed name and representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentIdentity {
    pub name: String,
    pub repr: String,
}

impl ComponentIdentity {
    /// Derive the identity of `component` from its type name and arguments.
    pub fn of(component: &dyn Component) -> Self {
        let args = component.arguments();

        let mut name_parts = vec![snake_case(component.type_name())];
        let mut repr_args = Vec::with_capacity(args.len());
        for arg in &args {
            match &arg.value {
                ArgValue::Value(v) => {
                    name_parts.push(v.clone());
                    repr_args.push(format!("{}={v}", arg.name));
                }
                ArgValue::Component(c) => {
                    let nested = ComponentIdentity::of(*c);
                    name_parts.push(format!("'{}'", nested.name));
                    repr_args.push(format!("{}={}", arg.name, nested.repr));
                }
            }
        }

        Self {
            name: name_parts.join("."),
            repr: format!("{}({})", component.type_name(), repr_args.join(", ")),
        }
    }
}

impl fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}
