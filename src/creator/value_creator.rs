use std::sync::Arc;

use tracing::debug;

use crate::tree::validate_name;
use crate::types::AnyValue;
use crate::ConfigEntity;
use crate::ConfigFormat;
use crate::ConfigNode;
use crate::ConfigType;
use crate::ElementId;
use crate::EntityType;
use crate::Error;
use crate::FormatSet;
use crate::PathElement;
use crate::Placement;
use crate::Result;

/// A new element and the value it was written from.
#[derive(Debug, Clone)]
pub struct CreatedElement<E> {
    config: ConfigNode,
    value: E,
}

impl<E> CreatedElement<E> {
    pub fn config(&self) -> &ConfigNode {
        &self.config
    }

    pub fn value(&self) -> &E {
        &self.value
    }

    pub fn into_value(self) -> E {
        self.value
    }
}

/// Stages the fields of a new entity, then adds it as one child of `parent`.
///
/// Observers see a single `add` event carrying the complete element. A
/// creator is single-use and meant for one writer; creators sharing a parent
/// serialize on the tree's write lock.
///
/// ```ignore
/// let created = formats
///     .creator::<Person>(&people, "person")?
///     .with("name", "Al".to_string())?
///     .create(|_| {})?;
/// ```
pub struct ValueCreator<E> {
    entity_type: Arc<EntityType<E>>,
    format: Arc<dyn ConfigFormat<E>>,
    formats: FormatSet,
    parent: ConfigNode,
    name: String,
    element: Option<PathElement>,
    placement: Placement,
    staged: Vec<Option<AnyValue>>,
    used: bool,
}

impl<E: ConfigEntity> ValueCreator<E> {
    pub(crate) fn new(
        formats: &FormatSet,
        parent: &ConfigNode,
        name: &str,
    ) -> Result<Self> {
        let name = validate_name(name)?;
        let entity_type = formats.entity_type::<E>()?;
        let format = formats.format_for::<E>(&name)?;
        let staged = (0..entity_type.fields().len()).map(|_| None).collect();
        Ok(ValueCreator {
            entity_type,
            format,
            formats: formats.clone(),
            parent: parent.clone(),
            name,
            element: None,
            placement: Placement::last(),
            staged,
            used: false,
        })
    }

    /// Also gives the new element the attribute children `element` requires.
    pub(crate) fn with_element(
        mut self,
        element: PathElement,
    ) -> Self {
        self.element = Some(element);
        self
    }

    /// Places the new element after `element`.
    pub fn after(
        &mut self,
        element: ElementId,
    ) -> &mut Self {
        self.placement.after = Some(element);
        self.placement.prefer_first = true;
        self
    }

    /// Places the new element before `element`.
    pub fn before(
        &mut self,
        element: ElementId,
    ) -> &mut Self {
        self.placement.before = Some(element);
        self
    }

    /// Stages `value` for the field named `field`.
    pub fn with<F: ConfigType>(
        &mut self,
        field: &str,
        value: F,
    ) -> Result<&mut Self> {
        let Some(declared) = self.entity_type.field(field) else {
            return Err(Error::IllegalArgument(format!(
                "{} has no field {}",
                self.entity_type.short_name(),
                field
            )));
        };
        if !declared.value_type().is::<F>() {
            return Err(Error::IllegalArgument(format!(
                "field {} of {} holds {:?}, not {}",
                field,
                self.entity_type.short_name(),
                declared.value_type(),
                std::any::type_name::<F>()
            )));
        }
        self.staged[declared.index()] = Some(Box::new(value));
        Ok(self)
    }

    /// Stages every copyable field of `template` that `E` declares with the
    /// same name and type. Other fields are skipped.
    pub fn copy<T: ConfigEntity>(
        &mut self,
        template: &T,
    ) -> &mut Self {
        let Ok(source) = self.formats.entity_type::<T>() else {
            return self;
        };
        for (field, access) in source.fields_with_access() {
            if !field.is_copyable() {
                continue;
            }
            let Some(target) = self.entity_type.field(field.name()) else {
                continue;
            };
            if target.is_copyable() && target.value_type() == field.value_type() {
                self.staged[target.index()] = Some(access.get_any(template));
            }
        }
        self
    }

    /// Builds the value from the staged fields, lets `pre_add` adjust it, and
    /// adds it to the tree in one mutation.
    pub fn create<P>(
        &mut self,
        pre_add: P,
    ) -> Result<CreatedElement<E>>
    where
        P: FnOnce(&mut E),
    {
        if self.used {
            return Err(Error::IllegalState("this creator has already been used".to_string()));
        }
        self.used = true;

        let mut value = E::default();
        for (index, staged) in self.staged.iter_mut().enumerate() {
            if let Some(staged) = staged.take() {
                if self.entity_type.access(index).set_any(&mut value, staged).is_err() {
                    return Err(Error::IllegalArgument(format!(
                        "staged value does not fit field {} of {}",
                        self.entity_type.fields()[index].name(),
                        self.entity_type.short_name()
                    )));
                }
            }
        }
        pre_add(&mut value);

        let config = self.parent.add_child(self.placement, &self.name, |child| {
            if let Some(element) = &self.element {
                element.populate(child)?;
            }
            self.format.format(Some(&value), None, child)
        })?;
        debug!(
            entity = self.entity_type.short_name(),
            config = %config.path_string(),
            "Element created"
        );
        Ok(CreatedElement { config, value })
    }
}
