use std::any::Any;

use crate::format::BoundField;
use crate::format::InheritedBound;
use crate::format::TypedBound;
use crate::ConfigEntity;
use crate::ConfigType;
use crate::FormatSet;
use crate::Result;
use crate::ValueType;

pub(crate) type AnyValue = Box<dyn Any + Send>;

/// Type-erased accessor of one field of entity `E`.
pub(crate) trait FieldAccess<E>: Send + Sync {
    fn value_type(&self) -> ValueType;

    /// Binds the field to its format for values stored under `child_name`.
    fn bind(
        &self,
        child_name: &str,
        formats: &FormatSet,
    ) -> Result<Box<dyn BoundField<E>>>;

    fn copy(
        &self,
        from: &E,
        to: &mut E,
    );

    fn get_any(
        &self,
        entity: &E,
    ) -> AnyValue;

    /// Hands the value back when it is not of the field's type.
    fn set_any(
        &self,
        entity: &mut E,
        value: AnyValue,
    ) -> std::result::Result<(), AnyValue>;
}

/// A field declared directly on `E`.
pub(crate) struct TypedAccess<E, F> {
    pub(crate) get: fn(&E) -> &F,
    pub(crate) set: fn(&mut E, F),
}

impl<E, F> FieldAccess<E> for TypedAccess<E, F>
where
    E: Default + 'static,
    F: ConfigType,
{
    fn value_type(&self) -> ValueType {
        F::value_type()
    }

    fn bind(
        &self,
        child_name: &str,
        formats: &FormatSet,
    ) -> Result<Box<dyn BoundField<E>>> {
        Ok(Box::new(TypedBound {
            child_name: child_name.to_string(),
            get: self.get,
            set: self.set,
            format: formats.format_for::<F>(child_name)?,
        }))
    }

    fn copy(
        &self,
        from: &E,
        to: &mut E,
    ) {
        (self.set)(to, (self.get)(from).clone());
    }

    fn get_any(
        &self,
        entity: &E,
    ) -> AnyValue {
        Box::new((self.get)(entity).clone())
    }

    fn set_any(
        &self,
        entity: &mut E,
        value: AnyValue,
    ) -> std::result::Result<(), AnyValue> {
        let value = value.downcast::<F>()?;
        (self.set)(entity, *value);
        Ok(())
    }
}

/// A field of supertype `S`, reached through the `S` value embedded in `E`.
pub(crate) struct InheritedAccess<E, S> {
    pub(crate) inner: std::sync::Arc<dyn FieldAccess<S>>,
    pub(crate) get: fn(&E) -> &S,
    pub(crate) get_mut: fn(&mut E) -> &mut S,
}

impl<E, S> FieldAccess<E> for InheritedAccess<E, S>
where
    E: 'static,
    S: ConfigEntity,
{
    fn value_type(&self) -> ValueType {
        self.inner.value_type()
    }

    fn bind(
        &self,
        child_name: &str,
        formats: &FormatSet,
    ) -> Result<Box<dyn BoundField<E>>> {
        Ok(Box::new(InheritedBound {
            inner: self.inner.bind(child_name, formats)?,
            get: self.get,
            get_mut: self.get_mut,
        }))
    }

    fn copy(
        &self,
        from: &E,
        to: &mut E,
    ) {
        self.inner.copy((self.get)(from), (self.get_mut)(to));
    }

    fn get_any(
        &self,
        entity: &E,
    ) -> AnyValue {
        self.inner.get_any((self.get)(entity))
    }

    fn set_any(
        &self,
        entity: &mut E,
        value: AnyValue,
    ) -> std::result::Result<(), AnyValue> {
        self.inner.set_any((self.get_mut)(entity), value)
    }
}
