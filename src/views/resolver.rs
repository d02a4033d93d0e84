use parking_lot::Mutex;

use crate::ConfigNode;
use crate::ConfigPath;

/// Resolves a literal path below a root, caching one node per level.
///
/// A cached level stays valid while its parent's child stamp is unchanged,
/// so a change only re-scans the levels below the node where it happened.
pub(crate) struct PathResolver {
    root: ConfigNode,
    path: ConfigPath,
    levels: Mutex<Vec<(ConfigNode, u64)>>,
}

impl PathResolver {
    pub(crate) fn new(
        root: ConfigNode,
        path: ConfigPath,
    ) -> Self {
        PathResolver {
            root,
            path,
            levels: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn root(&self) -> &ConfigNode {
        &self.root
    }

    pub(crate) fn path(&self) -> &ConfigPath {
        &self.path
    }

    pub(crate) fn depth(&self) -> usize {
        self.path.elements().len()
    }

    pub(crate) fn resolve(&self) -> Option<ConfigNode> {
        let _tx = self.root.lock(false, None);
        let mut levels = self.levels.lock();
        let mut parent = self.root.clone();
        for (level, element) in self.path.elements().iter().enumerate() {
            let stamp = parent.child_stamp();
            let cached = levels
                .get(level)
                .filter(|(node, seen)| *seen == stamp && node.parent().as_ref() == Some(&parent))
                .map(|(node, _)| node.clone());
            let node = match cached {
                Some(node) => node,
                None => {
                    levels.truncate(level);
                    let node = parent.find_child(element)?;
                    levels.push((node.clone(), stamp));
                    node
                }
            };
            parent = node;
        }
        Some(parent)
    }
}
