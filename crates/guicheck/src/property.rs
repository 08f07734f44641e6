//! Bean-style property access.
//!
//! Properties of toolkit objects are reached through accessor names derived
//! from the property name: `text` is read with `getText` and written with
//! `setText`, a boolean `disable` is read with `isDisable`. Only the first
//! character of the property name is upper-cased; the rest is kept verbatim.
//!
//! Toolkit adapters implement [`Reflect`] once per object family and resolve
//! accessor names however they like (a match table, generated code, real
//! introspection). The naming convention itself lives only here.

use crate::result::{GuiCheckError, GuiCheckResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Primitive types a setter may be declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    /// boolean
    Boolean,
    /// byte
    Byte,
    /// short
    Short,
    /// char
    Char,
    /// int
    Int,
    /// long
    Long,
    /// float
    Float,
    /// double
    Double,
}

/// Declared type of an accessor parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Unboxed primitive
    Primitive(Primitive),
    /// Boxed (nullable) primitive
    Boxed(Primitive),
    /// Text
    String,
    /// Any other object type, by name
    Object(String),
}

impl ValueType {
    /// Whether this is the boolean type, boxed or not
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(
            self,
            Self::Primitive(Primitive::Boolean) | Self::Boxed(Primitive::Boolean)
        )
    }

    /// Primitive counterpart of a boxed type
    #[must_use]
    pub const fn primitive_counterpart(&self) -> Option<Self> {
        match self {
            Self::Boxed(p) => Some(Self::Primitive(*p)),
            _ => None,
        }
    }
}

/// A property value crossing the adapter boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// 8-bit integer
    Byte(i8),
    /// 16-bit integer
    Short(i16),
    /// Character
    Char(char),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Text
    Str(String),
    /// Any other object, compared by its string form
    Opaque {
        /// Toolkit type name
        type_name: String,
        /// String form of the object
        repr: String,
    },
}

impl PropertyValue {
    /// Declared type of the value; `None` for [`PropertyValue::Null`].
    ///
    /// Values supplied by test code are boxed, so numeric and boolean values
    /// report [`ValueType::Boxed`].
    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        let boxed = |p| Some(ValueType::Boxed(p));
        match self {
            Self::Null => None,
            Self::Bool(_) => boxed(Primitive::Boolean),
            Self::Byte(_) => boxed(Primitive::Byte),
            Self::Short(_) => boxed(Primitive::Short),
            Self::Char(_) => boxed(Primitive::Char),
            Self::Int(_) => boxed(Primitive::Int),
            Self::Long(_) => boxed(Primitive::Long),
            Self::Float(_) => boxed(Primitive::Float),
            Self::Double(_) => boxed(Primitive::Double),
            Self::Str(_) => Some(ValueType::String),
            Self::Opaque { type_name, .. } => Some(ValueType::Object(type_name.clone())),
        }
    }

    /// Whether this is [`PropertyValue::Null`]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the text of a [`PropertyValue::Str`]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean of a [`PropertyValue::Bool`]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

// Values of different variants are never equal, so Int(8) != Long(8).
// Floats compare by bit pattern: NaN equals NaN, 0.0 differs from -0.0.
impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (
                Self::Opaque {
                    type_name: ta,
                    repr: ra,
                },
                Self::Opaque {
                    type_name: tb,
                    repr: rb,
                },
            ) => ta == tb && ra == rb,
            _ => false,
        }
    }
}

impl Eq for PropertyValue {}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::Opaque { repr, .. } => f.write_str(repr),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    char => Char,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => Str,
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for PropertyValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Failure reported by a [`Reflect`] implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No accessor with this name (and parameter type)
    #[error("no such method: {name}")]
    NoSuchMethod {
        /// Accessor name that was looked up
        name: String,
    },
    /// The accessor exists but raised an error
    #[error("invocation failed: {message}")]
    Invocation {
        /// Cause reported by the toolkit
        message: String,
    },
}

impl AccessError {
    /// Accessor not found
    #[must_use]
    pub fn no_such_method(name: impl Into<String>) -> Self {
        Self::NoSuchMethod { name: name.into() }
    }

    /// Accessor raised an error
    #[must_use]
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation {
            message: message.into(),
        }
    }
}

/// Accessor-level property access, implemented by toolkit adapters
pub trait Reflect {
    /// Type name used in diagnostics
    fn type_name(&self) -> String;

    /// Invoke the zero-argument accessor called `accessor`
    ///
    /// # Errors
    /// [`AccessError::NoSuchMethod`] if there is no such accessor,
    /// [`AccessError::Invocation`] if calling it failed
    fn call_getter(&self, accessor: &str) -> Result<PropertyValue, AccessError>;

    /// Invoke the one-argument accessor `accessor` declared with `parameter`
    ///
    /// `parameter` is `None` when the value is null; any setter taking a
    /// nullable type may accept it.
    ///
    /// # Errors
    /// [`AccessError::NoSuchMethod`] if no accessor with this name and
    /// parameter type exists, [`AccessError::Invocation`] if calling it failed
    fn call_setter(
        &self,
        accessor: &str,
        parameter: Option<&ValueType>,
        value: PropertyValue,
    ) -> Result<(), AccessError>;
}

fn accessor_name(prefix: &str, property: &str) -> String {
    let mut name = String::with_capacity(prefix.len() + property.len());
    name.push_str(prefix);
    let mut chars = property.chars();
    if let Some(first) = chars.next() {
        name.extend(first.to_uppercase());
        name.push_str(chars.as_str());
    }
    name
}

/// Getter name for `property` read as `value_type`
#[must_use]
pub fn getter_name(property: &str, value_type: Option<&ValueType>) -> String {
    let prefix = if value_type.is_some_and(ValueType::is_boolean) {
        "is"
    } else {
        "get"
    };
    accessor_name(prefix, property)
}

/// Setter name for `property`
#[must_use]
pub fn setter_name(property: &str) -> String {
    accessor_name("set", property)
}

fn access_error(
    obj: &dyn Reflect,
    property: &str,
    accessor: String,
    err: AccessError,
) -> GuiCheckError {
    match err {
        AccessError::NoSuchMethod { .. } => GuiCheckError::NoSuchAccessor {
            property: property.to_string(),
            accessor,
            type_name: obj.type_name(),
        },
        source @ AccessError::Invocation { .. } => GuiCheckError::PropertyAccess {
            property: property.to_string(),
            source,
        },
    }
}

/// Read `property`, choosing the getter for `value_type`
///
/// # Errors
/// Hard failure if no getter exists or invoking it failed
pub fn get_property(
    obj: &dyn Reflect,
    property: &str,
    value_type: Option<&ValueType>,
) -> GuiCheckResult<PropertyValue> {
    let accessor = getter_name(property, value_type);
    obj.call_getter(&accessor)
        .map_err(|err| access_error(obj, property, accessor, err))
}

/// Write `property`.
///
/// The setter declared with the value's own type is tried first; if there is
/// none, the setter declared with the primitive counterpart is tried.
///
/// # Errors
/// Hard failure if neither setter exists or invoking it failed
pub fn set_property(obj: &dyn Reflect, property: &str, value: PropertyValue) -> GuiCheckResult<()> {
    let accessor = setter_name(property);
    let declared = value.value_type();
    let result = match obj.call_setter(&accessor, declared.as_ref(), value.clone()) {
        Err(AccessError::NoSuchMethod { .. }) => {
            match declared.as_ref().and_then(ValueType::primitive_counterpart) {
                Some(primitive) => obj.call_setter(&accessor, Some(&primitive), value),
                None => Err(AccessError::no_such_method(accessor.clone())),
            }
        }
        other => other,
    };
    result.map_err(|err| access_error(obj, property, accessor, err))
}

/// Check `property` against `expected`.
///
/// With `expected_result == true` the values must be equal, with `false`
/// they must differ. A mismatch is an assertion failure naming the property
/// and both values.
///
/// # Errors
/// Assertion failure on mismatch; hard failure if the getter is missing or
/// failed
pub fn check_property(
    obj: &dyn Reflect,
    property: &str,
    expected: &PropertyValue,
    expected_result: bool,
) -> GuiCheckResult<()> {
    let actual = get_property(obj, property, expected.value_type().as_ref())?;
    if (*expected == actual) == expected_result {
        return Ok(());
    }
    let qualifier = if expected_result {
        "Expected"
    } else {
        "Not expected"
    };
    Err(GuiCheckError::assertion(format!(
        "Unexpected value of {property}: {qualifier}: {expected}, Actual: {actual}"
    )))
}
