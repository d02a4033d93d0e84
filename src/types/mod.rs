//! Descriptors of the value types a config subtree can hold.

mod access;
mod entity;
mod value_type;

pub(crate) use access::AnyValue;
pub(crate) use access::FieldAccess;
pub use entity::*;
pub use value_type::*;

/// Implements [`ConfigType`] for types that implement [`ConfigEntity`].
///
/// Entity values are formatted with the reflected entity format and are
/// matched by position inside collections.
#[macro_export]
macro_rules! config_entity {
    ($($entity:ty),+ $(,)?) => {
        $(
            impl $crate::ConfigType for $entity {
                fn value_type() -> $crate::ValueType {
                    $crate::ValueType::of::<$entity>($crate::ValueKind::Entity)
                }

                fn identity() -> $crate::Identity {
                    $crate::Identity::Positional
                }

                fn default_format(
                    formats: &$crate::FormatSet,
                    _config_name: &str,
                ) -> $crate::Result<::std::sync::Arc<dyn $crate::ConfigFormat<Self>>> {
                    formats.entity_format::<$entity>()
                }
            }
        )+
    };
}
