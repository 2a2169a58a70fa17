use serde::{Deserialize, Serialize};
use std::{
    any::{self, Any, TypeId},
    borrow::Cow,
    error::Error,
    fmt,
};

/// The type-erased value carried across the untyped boundary.
///
/// A carrier is either absent ([`Value::Nil`]) or holds exactly one boxed value
/// together with the name of its concrete type. Getting a typed value back out
/// is always an explicit, checked downcast (see [`Value::into_typed`]).
#[derive(Default)]
pub enum Value {
    #[default]
    Nil,
    Boxed(Boxed),
}

pub struct Boxed {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Value {
    pub fn nil() -> Self {
        Value::Nil
    }

    /// Boxes `value`. Boxing a `Value` returns it unchanged.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send,
    {
        let value: Box<dyn Any + Send> = Box::new(value);
        match value.downcast::<Value>() {
            Ok(value) => *value,
            Err(value) => Value::Boxed(Boxed {
                value,
                type_name: any::type_name::<T>(),
            }),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Whether the carrier holds a `T`. Always false for `Nil`.
    pub fn is<T: Any>(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Boxed(boxed) => boxed.value.is::<T>(),
        }
    }

    /// Name of the dynamic type held, or `"nil"`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boxed(boxed) => boxed.type_name,
        }
    }

    /// Strict downcast: `Nil` is a mismatch like any other foreign type.
    pub fn downcast<T: Any>(self) -> Result<T, TypeMismatch> {
        if TypeId::of::<T>() == TypeId::of::<Value>() {
            let this: Box<dyn Any> = Box::new(self);
            return this
                .downcast::<T>()
                .map(|typed| *typed)
                .map_err(|_| TypeMismatch::new::<T>("typedkit::Value"));
        }
        match self {
            Value::Nil => Err(TypeMismatch::new::<T>("nil")),
            Value::Boxed(Boxed { value, type_name }) => value
                .downcast::<T>()
                .map(|typed| *typed)
                .map_err(|_| TypeMismatch::new::<T>(type_name)),
        }
    }

    /// The tri-state check every adapter goes through: `Nil` yields the zero
    /// value of `T`, a `T` is returned as is, anything else is a mismatch.
    pub fn into_typed<T>(self) -> Result<T, TypeMismatch>
    where
        T: Any + Default,
    {
        match self {
            Value::Nil => Ok(T::default()),
            this => this.downcast(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Nil"),
            Value::Boxed(boxed) => write!(f, "Value({})", boxed.type_name),
        }
    }
}

/// The dynamic type of a carrier did not match the statically expected type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TypeMismatch {
    expected: Cow<'static, str>,
    found: Cow<'static, str>,
}

impl TypeMismatch {
    pub(crate) fn new<Expected: Any>(found: &'static str) -> Self {
        Self {
            expected: Cow::Borrowed(any::type_name::<Expected>()),
            found: Cow::Borrowed(found),
        }
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn found(&self) -> &str {
        &self.found
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "type mismatch: expected {}, found {}",
            self.expected, self.found
        )
    }
}

impl Error for TypeMismatch {}
