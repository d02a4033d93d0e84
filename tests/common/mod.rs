use std::sync::Arc;

use observe_config::config_entity;
use observe_config::ConfigEntity;
use observe_config::ConfigEvent;
use observe_config::ConfigNode;
use observe_config::ConfigPath;
use observe_config::EntityTypeBuilder;
use observe_config::Subscription;
use parking_lot::Mutex;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

#[allow(dead_code)]
pub fn enable_logger() {
    *LOGGER_INIT;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Person {
    pub name: String,
    pub age: i32,
}

impl ConfigEntity for Person {
    fn describe(entity: &mut EntityTypeBuilder<Self>) {
        entity.field("name", |p| &p.name, |p, v| p.name = v);
        entity.field("age", |p| &p.age, |p, v| p.age = v);
    }
}

config_entity!(Person);

/// Events observed at one node, held until dropped.
pub struct Captured {
    pub events: Arc<Mutex<Vec<ConfigEvent>>>,
    _subscription: Subscription,
}

#[allow(dead_code)]
impl Captured {
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn last(&self) -> ConfigEvent {
        self.events.lock().last().cloned().unwrap()
    }
}

pub fn capture(
    config: &ConfigNode,
    path: Option<&str>,
) -> Captured {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let path = path.map(|path| ConfigPath::parse(path).unwrap());
    let subscription = config.subscribe_fn(path, move |event| sink.lock().push(event.clone()));
    Captured {
        events,
        _subscription: subscription,
    }
}

#[allow(dead_code)]
pub fn names(path: &[ConfigNode]) -> Vec<String> {
    path.iter().map(ConfigNode::name).collect()
}
