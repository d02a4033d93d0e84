use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::ConfigFormat;
use super::ParseContext;
use crate::constants::NULL_MARKER;
use crate::constants::NULL_MARKER_VALUE;
use crate::metrics::INCREMENTAL_PARSE_FAILURES;
use crate::ChangeKind;
use crate::ConfigEntity;
use crate::ConfigEvent;
use crate::ConfigNode;
use crate::ConfigType;
use crate::EntityType;
use crate::FormatSet;
use crate::Placement;
use crate::Result;

/// One entity field bound to the format of its child node.
pub(crate) trait BoundField<E>: Send + Sync {
    fn format(
        &self,
        entity: &E,
        previous: Option<&E>,
        config: &ConfigNode,
    ) -> Result<()>;

    /// Re-reads the field from the child of `config`. `change` is observed by
    /// that child; without one the field is parsed in full.
    fn parse(
        &self,
        entity: &mut E,
        config: &ConfigNode,
        change: Option<&ConfigEvent>,
    ) -> Result<()>;
}

pub(crate) struct TypedBound<E, F> {
    pub(crate) child_name: String,
    pub(crate) get: fn(&E) -> &F,
    pub(crate) set: fn(&mut E, F),
    pub(crate) format: Arc<dyn ConfigFormat<F>>,
}

impl<E, F> BoundField<E> for TypedBound<E, F>
where
    E: Default + 'static,
    F: ConfigType,
{
    fn format(
        &self,
        entity: &E,
        previous: Option<&E>,
        config: &ConfigNode,
    ) -> Result<()> {
        let value = (self.get)(entity);
        let previous = previous.map(self.get);
        let child = config.child_named(&self.child_name);
        if value.is_null() {
            if let Some(child) = child {
                child.remove();
            }
            return Ok(());
        }
        match child {
            Some(child) => self.format.format(Some(value), previous, &child),
            None => config
                .add_child(Placement::last(), &self.child_name, |child| {
                    self.format.format(Some(value), None, child)
                })
                .map(|_| ()),
        }
    }

    fn parse(
        &self,
        entity: &mut E,
        config: &ConfigNode,
        change: Option<&ConfigEvent>,
    ) -> Result<()> {
        let child = config.child_named(&self.child_name);
        let context = ParseContext {
            config: child.as_ref(),
            change,
        };
        let previous = change.map(|_| (self.get)(entity).clone());
        match self.format.parse(context, previous)? {
            Some(value) => (self.set)(entity, value),
            // Null resets the field to the value of a default entity
            None => (self.set)(entity, (self.get)(&E::default()).clone()),
        }
        Ok(())
    }
}

/// A supertype field, reached through the supertype value embedded in `E`.
pub(crate) struct InheritedBound<E, S> {
    pub(crate) inner: Box<dyn BoundField<S>>,
    pub(crate) get: fn(&E) -> &S,
    pub(crate) get_mut: fn(&mut E) -> &mut S,
}

impl<E, S> BoundField<E> for InheritedBound<E, S>
where
    E: 'static,
    S: 'static,
{
    fn format(
        &self,
        entity: &E,
        previous: Option<&E>,
        config: &ConfigNode,
    ) -> Result<()> {
        self.inner.format((self.get)(entity), previous.map(self.get), config)
    }

    fn parse(
        &self,
        entity: &mut E,
        config: &ConfigNode,
        change: Option<&ConfigEvent>,
    ) -> Result<()> {
        self.inner.parse((self.get_mut)(entity), config, change)
    }
}

/// Stores an entity as one child per field, named by the field's child name.
///
/// A null entity is a node holding only the `null` marker child. Live
/// re-parses only re-read the fields whose children a change touched; a field
/// that fails to parse then keeps its previous value.
pub struct EntityFormat<E> {
    entity_type: Arc<EntityType<E>>,
    fields: Vec<(String, Box<dyn BoundField<E>>)>,
}

impl<E: ConfigEntity> EntityFormat<E> {
    pub fn new(
        entity_type: Arc<EntityType<E>>,
        formats: &FormatSet,
    ) -> Result<Self> {
        let fields = entity_type
            .fields_with_access()
            .map(|(field, access)| {
                let bound = access.bind(field.child_name(), formats)?;
                Ok((field.child_name().to_string(), bound))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(entity = entity_type.short_name(), "Entity format bound");
        Ok(EntityFormat { entity_type, fields })
    }

    pub fn entity_type(&self) -> &Arc<EntityType<E>> {
        &self.entity_type
    }

    fn is_null(config: &ConfigNode) -> bool {
        config
            .child_named(NULL_MARKER)
            .is_some_and(|marker| marker.value_is(NULL_MARKER_VALUE))
    }

    fn parse_full(
        &self,
        config: &ConfigNode,
    ) -> Result<E> {
        let mut entity = E::default();
        for (_, field) in &self.fields {
            field.parse(&mut entity, config, None)?;
        }
        Ok(entity)
    }

    /// `None` asks for a full parse.
    fn parse_incremental(
        &self,
        config: &ConfigNode,
        mut entity: E,
        change: &ConfigEvent,
    ) -> Option<E> {
        let path = change.relative_path();
        let Some(child) = path.first() else {
            return Some(entity);
        };
        let mut names = vec![child.name()];
        if path.len() == 1 && change.kind() == ChangeKind::Set && change.old_name() != names[0] {
            names.push(change.old_name().to_string());
        }
        if names.iter().any(|name| name == NULL_MARKER) {
            return None;
        }

        let field_change = if child.is_removed() { None } else { change.as_from_child() };
        for (child_name, field) in &self.fields {
            if !names.iter().any(|name| name == child_name) {
                continue;
            }
            let change = field_change.as_ref().filter(|_| child.name_is(child_name));
            if let Err(err) = field.parse(&mut entity, config, change) {
                warn!(
                    entity = self.entity_type.short_name(),
                    field = %child_name,
                    error = %err,
                    "Keeping previous field value after a failed re-parse"
                );
                if config.settings().monitoring.metrics_enabled {
                    INCREMENTAL_PARSE_FAILURES
                        .with_label_values(&[self.entity_type.short_name()])
                        .inc();
                }
            }
        }
        Some(entity)
    }
}

impl<E: ConfigEntity> ConfigFormat<E> for EntityFormat<E> {
    fn format(
        &self,
        value: Option<&E>,
        previous: Option<&E>,
        config: &ConfigNode,
    ) -> Result<()> {
        let _tx = config.lock(true, None);
        let marker = config.child_named(NULL_MARKER);
        let Some(value) = value else {
            match marker {
                Some(marker) if marker.value_is(NULL_MARKER_VALUE) => {}
                Some(marker) => marker.set_value(Some(NULL_MARKER_VALUE))?,
                None => {
                    config.add_child(Placement::first(), NULL_MARKER, |marker| {
                        marker.set_value(Some(NULL_MARKER_VALUE))
                    })?;
                }
            }
            return Ok(());
        };
        if let Some(marker) = marker {
            marker.remove();
        }
        for (_, field) in &self.fields {
            field.format(value, previous, config)?;
        }
        Ok(())
    }

    fn parse(
        &self,
        context: ParseContext<'_>,
        previous: Option<E>,
    ) -> Result<Option<E>> {
        let Some(config) = context.config else {
            return Ok(None);
        };
        let _tx = config.lock(false, None);
        if Self::is_null(config) {
            return Ok(None);
        }
        if let (Some(previous), Some(change)) = (previous, context.change) {
            if let Some(entity) = self.parse_incremental(config, previous, change) {
                return Ok(Some(entity));
            }
        }
        self.parse_full(config).map(Some)
    }
}
