use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;

use super::CollectionFormat;
use super::ConfigFormat;
use super::DurationFormat;
use super::InstantFormat;
use super::OptionalFormat;
use super::ScalarFormat;
use crate::ConfigType;
use crate::FormatSet;
use crate::Identity;
use crate::Result;
use crate::ValueKind;
use crate::ValueType;

macro_rules! text_config_type {
    ($($ty:ty => $kind:expr),+ $(,)?) => {
        $(
            impl ConfigType for $ty {
                fn value_type() -> ValueType {
                    ValueType::of::<$ty>($kind)
                }

                fn default_format(
                    _formats: &FormatSet,
                    _config_name: &str,
                ) -> Result<Arc<dyn ConfigFormat<Self>>> {
                    Ok(Arc::new(ScalarFormat::<$ty>::via_from_str()))
                }
            }
        )+
    };
}

text_config_type!(
    String => ValueKind::Text,
    bool => ValueKind::Bool,
    i32 => ValueKind::Integer,
    i64 => ValueKind::Integer,
    u32 => ValueKind::Integer,
    u64 => ValueKind::Integer,
    f32 => ValueKind::Float,
    f64 => ValueKind::Float,
);

impl ConfigType for Duration {
    fn value_type() -> ValueType {
        ValueType::of::<Duration>(ValueKind::Duration)
    }

    fn default_format(
        _formats: &FormatSet,
        _config_name: &str,
    ) -> Result<Arc<dyn ConfigFormat<Self>>> {
        Ok(Arc::new(ScalarFormat::new(Arc::new(DurationFormat))))
    }
}

impl ConfigType for DateTime<Utc> {
    fn value_type() -> ValueType {
        ValueType::of::<DateTime<Utc>>(ValueKind::Instant)
    }

    fn default_format(
        formats: &FormatSet,
        _config_name: &str,
    ) -> Result<Arc<dyn ConfigFormat<Self>>> {
        let pattern = &formats.settings().formats.instant_pattern;
        Ok(Arc::new(ScalarFormat::new(Arc::new(InstantFormat::new(pattern)))))
    }
}

impl<T: ConfigType> ConfigType for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::of::<Vec<T>>(ValueKind::Collection)
    }

    fn default_format(
        formats: &FormatSet,
        config_name: &str,
    ) -> Result<Arc<dyn ConfigFormat<Self>>> {
        Ok(Arc::new(CollectionFormat::<T>::for_collection(formats, config_name)?))
    }
}

impl<T: ConfigType> ConfigType for Option<T> {
    fn value_type() -> ValueType {
        ValueType::of::<Option<T>>(ValueKind::Optional)
    }

    fn is_null(&self) -> bool {
        self.is_none()
    }

    fn identity() -> Identity {
        T::identity()
    }

    fn default_format(
        formats: &FormatSet,
        config_name: &str,
    ) -> Result<Arc<dyn ConfigFormat<Self>>> {
        Ok(Arc::new(OptionalFormat::new(formats.format_for::<T>(config_name)?)))
    }
}
