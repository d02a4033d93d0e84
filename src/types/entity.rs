use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::access::FieldAccess;
use super::access::InheritedAccess;
use super::access::TypedAccess;
use crate::utils::naming::to_child_name;
use crate::ConfigType;
use crate::Error;
use crate::Result;
use crate::ValueKind;
use crate::ValueType;

/// A structured value whose fields map onto conventionally named children.
///
/// Fields are declared once per type in [`describe`](Self::describe):
///
/// ```ignore
/// impl ConfigEntity for Person {
///     fn describe(entity: &mut EntityTypeBuilder<Self>) {
///         entity.field("name", |p| &p.name, |p, v| p.name = v);
///         entity.field("age", |p| &p.age, |p, v| p.age = v);
///     }
/// }
/// config_entity!(Person);
/// ```
pub trait ConfigEntity: ConfigType + Default {
    fn describe(entity: &mut EntityTypeBuilder<Self>);
}

/// Names a field in the type that declared it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub owner: &'static str,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityField {
    name: String,
    child_name: String,
    index: usize,
    value_type: ValueType,
    owner: &'static str,
    overrides: Vec<FieldRef>,
    copyable: bool,
}

impl EntityField {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the child node the field is stored in.
    pub fn child_name(&self) -> &str {
        &self.child_name
    }

    /// Stable position of the field within its entity type.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Type that declared the field.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Supertype fields this declaration replaces.
    pub fn overrides(&self) -> &[FieldRef] {
        &self.overrides
    }

    /// Whether [`ValueCreator::copy`](crate::ValueCreator::copy) carries this field over.
    pub fn is_copyable(&self) -> bool {
        self.copyable
    }
}

/// Field table of one entity type, built once from [`ConfigEntity::describe`].
pub struct EntityType<E> {
    value_type: ValueType,
    fields: Vec<EntityField>,
    access: Vec<Arc<dyn FieldAccess<E>>>,
}

impl<E: ConfigEntity> EntityType<E> {
    pub fn build() -> Result<Self> {
        let mut builder = EntityTypeBuilder::new();
        E::describe(&mut builder);
        let entity_type = builder.finish()?;
        debug!(entity = entity_type.name(), fields = entity_type.fields.len(), "Entity type described");
        Ok(entity_type)
    }
}

impl<E> EntityType<E> {
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn name(&self) -> &'static str {
        self.value_type.name()
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let name = self.name();
        name.rsplit("::").next().unwrap_or(name)
    }

    pub fn fields(&self) -> &[EntityField] {
        &self.fields
    }

    pub fn field(
        &self,
        name: &str,
    ) -> Option<&EntityField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub(crate) fn access(
        &self,
        index: usize,
    ) -> &Arc<dyn FieldAccess<E>> {
        &self.access[index]
    }

    pub(crate) fn fields_with_access(&self) -> impl Iterator<Item = (&EntityField, &Arc<dyn FieldAccess<E>>)> {
        self.fields.iter().zip(self.access.iter())
    }
}

impl<E> fmt::Debug for EntityType<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.name())
            .field("fields", &self.fields)
            .finish()
    }
}

pub struct EntityTypeBuilder<E> {
    fields: Vec<EntityField>,
    access: Vec<Arc<dyn FieldAccess<E>>>,
    errors: Vec<String>,
}

impl<E: ConfigEntity> EntityTypeBuilder<E> {
    fn new() -> Self {
        EntityTypeBuilder {
            fields: Vec::new(),
            access: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn owner() -> &'static str {
        std::any::type_name::<E>()
    }

    /// Declares a field. Declaring a field already inherited from a
    /// supertype overrides it in place.
    pub fn field<F: ConfigType>(
        &mut self,
        name: &str,
        get: fn(&E) -> &F,
        set: fn(&mut E, F),
    ) -> FieldBuilder<'_, E> {
        if name.is_empty() {
            self.errors.push("field name must not be empty".to_string());
            return FieldBuilder { builder: self, index: None };
        }
        let access: Arc<dyn FieldAccess<E>> = Arc::new(TypedAccess { get, set });
        let declared = EntityField {
            name: name.to_string(),
            child_name: to_child_name(name),
            index: self.fields.len(),
            value_type: F::value_type(),
            owner: Self::owner(),
            overrides: Vec::new(),
            copyable: true,
        };

        let index = match self.fields.iter().position(|field| field.name == name) {
            Some(index) if self.fields[index].owner == Self::owner() => {
                self.errors.push(format!("field {} is declared twice", name));
                return FieldBuilder { builder: self, index: None };
            }
            Some(index) => {
                let replaced = &self.fields[index];
                let mut overrides = replaced.overrides.clone();
                overrides.push(FieldRef {
                    owner: replaced.owner,
                    name: replaced.name.clone(),
                });
                self.fields[index] = EntityField {
                    index,
                    overrides,
                    ..declared
                };
                self.access[index] = access;
                index
            }
            None => {
                self.fields.push(declared);
                self.access.push(access);
                self.fields.len() - 1
            }
        };
        FieldBuilder {
            builder: self,
            index: Some(index),
        }
    }

    /// Imports the fields of supertype `S`, stored in an embedded `S` value.
    pub fn inherit<S: ConfigEntity>(
        &mut self,
        get: fn(&E) -> &S,
        get_mut: fn(&mut E) -> &mut S,
    ) -> &mut Self {
        let parent = match EntityType::<S>::build() {
            Ok(parent) => parent,
            Err(err) => {
                self.errors.push(err.to_string());
                return self;
            }
        };
        for (field, inner) in parent.fields.into_iter().zip(parent.access) {
            let access: Arc<dyn FieldAccess<E>> = Arc::new(InheritedAccess { inner, get, get_mut });
            match self.fields.iter_mut().find(|own| own.name == field.name) {
                // Declared before the supertype was imported
                Some(own) => own.overrides.push(FieldRef {
                    owner: field.owner,
                    name: field.name,
                }),
                None => {
                    self.fields.push(EntityField {
                        index: self.fields.len(),
                        ..field
                    });
                    self.access.push(access);
                }
            }
        }
        self
    }

    fn finish(self) -> Result<EntityType<E>> {
        if !self.errors.is_empty() {
            return Err(Error::IllegalArgument(format!(
                "invalid entity type {}: {}",
                Self::owner(),
                self.errors.join("; ")
            )));
        }
        let mut child_names: Vec<&str> = self.fields.iter().map(|field| field.child_name.as_str()).collect();
        child_names.sort_unstable();
        if let Some(pair) = child_names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(Error::IllegalArgument(format!(
                "entity type {} maps two fields to child {}",
                Self::owner(),
                pair[0]
            )));
        }
        Ok(EntityType {
            value_type: ValueType::of::<E>(ValueKind::Entity),
            fields: self.fields,
            access: self.access,
        })
    }
}

/// Refines the field just declared.
pub struct FieldBuilder<'a, E> {
    builder: &'a mut EntityTypeBuilder<E>,
    index: Option<usize>,
}

impl<'a, E> FieldBuilder<'a, E> {
    /// Stores the field under `name` instead of its conventional child name.
    pub fn child_name(
        self,
        name: &str,
    ) -> Self {
        if let Some(index) = self.index {
            if name.is_empty() {
                self.builder.errors.push("child name must not be empty".to_string());
            } else {
                self.builder.fields[index].child_name = name.to_string();
            }
        }
        self
    }

    /// Excludes the field from template copies.
    pub fn no_copy(self) -> Self {
        if let Some(index) = self.index {
            self.builder.fields[index].copyable = false;
        }
        self
    }
}
