//! Parameter sets for parameterized groups.
//!
//! A group opened with [`ParamSets`] is cloned once per set when its scope
//! closes. Each clone is bound to exactly one [`Params`] value, which is
//! handed to every setup defined directly on that clone.
//!
//! Whether a set is passed positionally or by name is explicit: a set is
//! either [`Params::Positional`] or [`Params::Named`], it is never inferred
//! from the container it came in.

use std::{borrow::Cow, collections::BTreeSet, fmt::Display};

use crate::error::BuildError;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Cow<'static, str>),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            Self::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::List(values) => {
                f.write_str("[")?;
                write_joined(f, values.iter())?;
                f.write_str("]")
            }
        }
    }
}

fn write_joined<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> std::fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

macro_rules! impl_param_from {
    [$($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?] => {$(
        impl From<$ty> for ParamValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value $(as $cast)?)
            }
        }
    )*};
}

impl_param_from![
    bool => Bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float,
];

impl From<&'static str> for ParamValue {
    fn from(value: &'static str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// One parameter set, bound to one clone of a parameterized group.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Params {
    /// The group is not parameterized.
    #[default]
    None,
    Positional(Vec<ParamValue>),
    Named(Vec<(Cow<'static, str>, ParamValue)>),
}

impl Params {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Cow<'static, str>>,
        V: Into<ParamValue>,
    {
        Self::Named(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// The value at `index` of a positional set.
    pub fn at(&self, index: usize) -> Option<&ParamValue> {
        match self {
            Self::Positional(values) => values.get(index),
            _ => None,
        }
    }

    /// The value called `name` of a named set.
    pub fn named_value(&self, name: &str) -> Option<&ParamValue> {
        match self {
            Self::Named(values) => values.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Positional(values) => values.len(),
            Self::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shape(&self) -> Shape<'_> {
        match self {
            Self::None => Shape::None,
            Self::Positional(values) => Shape::Positional(values.len()),
            Self::Named(values) => Shape::Named(values.iter().map(|(k, _)| k.as_ref()).collect()),
        }
    }
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Positional(values) => {
                f.write_str("(")?;
                write_joined(f, values.iter())?;
                f.write_str(")")
            }
            Self::Named(values) => {
                f.write_str("{")?;
                write_joined(f, values.iter().map(|(k, v)| format!("{k}: {v}")))?;
                f.write_str("}")
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Shape<'p> {
    None,
    Positional(usize),
    Named(BTreeSet<&'p str>),
}

/// The parameter sets a group is opened with.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSets {
    /// Clones are described by appending the rendered set.
    Sets(Vec<Params>),

    /// Clones are described by appending the label.
    Labeled(Vec<(Cow<'static, str>, Params)>),
}

impl ParamSets {
    pub fn sets(sets: impl IntoIterator<Item = Params>) -> Self {
        Self::Sets(sets.into_iter().collect())
    }

    pub fn labeled<I, L>(sets: I) -> Self
    where
        I: IntoIterator<Item = (L, Params)>,
        L: Into<Cow<'static, str>>,
    {
        Self::Labeled(sets.into_iter().map(|(l, p)| (l.into(), p)).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Sets(sets) => sets.len(),
            Self::Labeled(sets) => sets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Each set together with the suffix appended to the clone's description.
    pub fn expand(&self) -> Vec<(String, &Params)> {
        match self {
            Self::Sets(sets) => sets.iter().map(|p| (p.to_string(), p)).collect(),
            Self::Labeled(sets) => sets.iter().map(|(l, p)| (l.to_string(), p)).collect(),
        }
    }

    /// Reject collections the executor could not hand to setups consistently.
    pub fn validate(&self) -> Result<(), BuildError> {
        let sets: Vec<&Params> = match self {
            Self::Sets(sets) => sets.iter().collect(),
            Self::Labeled(sets) => {
                let mut seen = BTreeSet::new();
                for (label, _) in sets {
                    if !seen.insert(label.as_ref()) {
                        return Err(BuildError::configuration(format!(
                            "duplicate parameter label {label:?}"
                        )));
                    }
                }
                sets.iter().map(|(_, p)| p).collect()
            }
        };

        let Some(first) = sets.first() else {
            return Err(BuildError::configuration(
                "a parameterized group needs at least one parameter set",
            ));
        };

        let expected = first.shape();
        for (i, set) in sets.iter().enumerate() {
            let shape = set.shape();
            match (&expected, &shape) {
                (_, Shape::None) => {
                    return Err(BuildError::configuration(format!(
                        "parameter set #{} is neither positional nor named",
                        i + 1
                    )));
                }
                (Shape::Positional(_), Shape::Named(_)) | (Shape::Named(_), Shape::Positional(_)) => {
                    return Err(BuildError::configuration(
                        "positional and named parameter sets cannot be mixed",
                    ));
                }
                _ if shape != expected => {
                    return Err(BuildError::configuration(format!(
                        "parameter set #{} does not match the shape of the first set",
                        i + 1
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}
