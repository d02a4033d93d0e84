use std::sync::Arc;

use parking_lot::Mutex;

use crate::ConfigNode;
use crate::ConfigPath;
use crate::Subscription;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// `config` with `server` (no value) holding `port=8080`.
pub fn server_tree() -> ConfigNode {
    let root = ConfigNode::new_root("config").expect("root");
    let server = root.add("server").expect("server");
    server
        .add_child(crate::Placement::last(), "port", |port| port.set_value(Some("8080")))
        .expect("port");
    root
}

/// Appends `name=value` children to `parent`.
pub fn add_values(
    parent: &ConfigNode,
    values: &[(&str, &str)],
) {
    for (name, value) in values {
        parent
            .add_child(crate::Placement::last(), name, |child| child.set_value(Some(value)))
            .expect("child");
    }
}

/// Records the rendering of every event a node observes.
pub struct EventRecorder {
    events: Arc<Mutex<Vec<String>>>,
    _subscription: Subscription,
}

impl EventRecorder {
    pub fn new(config: &ConfigNode) -> Self {
        Self::with_path(config, None)
    }

    pub fn with_path(
        config: &ConfigNode,
        path: Option<&str>,
    ) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let path = path.map(|path| ConfigPath::parse(path).expect("path"));
        let subscription = config.subscribe_fn(path, move |event| sink.lock().push(event.to_string()));
        EventRecorder {
            events,
            _subscription: subscription,
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
