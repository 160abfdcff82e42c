//! This module handles the indexing state and lookups without dealing with the specifics of how
//! resources are laid out in the Kubernetes API (that is handled by the resource-specific modules,
//! which update the index via `kubert::index`).

use crate::ClusterInfo;
use ahash::AHashMap as HashMap;
use dependency_controller_core::{resolve_visibility, Artifact, Declaration, Visibility};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::{hash_map::Entry, BTreeSet},
    sync::Arc,
};
use tokio::sync::watch;

pub type SharedIndex = Arc<RwLock<Index>>;

/// Holds all indexing state. Owned and updated by the tasks that process watch events; read by
/// visibility discovery.
#[derive(Debug)]
pub struct Index {
    pub(crate) cluster_info: Arc<ClusterInfo>,

    /// All namespaces known to exist.
    pub(crate) namespaces: BTreeSet<String>,

    /// Dependency declarations by-namespace.
    pub(crate) declarations: HashMap<String, Declaration>,

    /// Exportable artifacts by-namespace, then by-name.
    pub(crate) artifacts: HashMap<String, HashMap<String, Artifact>>,

    /// Advanced whenever a change may alter the visibility of any namespace.
    pub(crate) epoch: u64,

    /// Resolved visibility by consuming namespace. Guarded separately so that lookups only need
    /// the index's read lock.
    cache: Mutex<HashMap<String, Cached>>,

    /// Publishes visibility updates by consuming namespace.
    pub(crate) watches: HashMap<String, watch::Sender<Visibility>>,
}

#[derive(Debug)]
struct Cached {
    epoch: u64,
    visibility: Visibility,
}

// === impl Index ===

impl Index {
    pub fn shared(cluster_info: impl Into<Arc<ClusterInfo>>) -> SharedIndex {
        Arc::new(RwLock::new(Self {
            cluster_info: cluster_info.into(),
            namespaces: BTreeSet::new(),
            declarations: HashMap::default(),
            artifacts: HashMap::default(),
            epoch: 0,
            cache: Mutex::new(HashMap::default()),
            watches: HashMap::default(),
        }))
    }

    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(String::as_str)
    }

    /// Returns the visibility of `namespace`.
    ///
    /// The result is cached until the index's epoch advances.
    pub fn visibility(&self, namespace: &str) -> Visibility {
        let cached = self
            .cache
            .lock()
            .get(namespace)
            .filter(|cached| cached.epoch == self.epoch)
            .map(|cached| cached.visibility.clone());
        if let Some(visibility) = cached {
            return visibility;
        }

        let visibility = resolve_visibility(
            namespace,
            self.declarations.get(namespace),
            self.cluster_info.default_import_mode,
            &self.namespaces,
        );
        tracing::trace!(%namespace, epoch = self.epoch, ?visibility, "resolved");
        self.cache.lock().insert(
            namespace.to_string(),
            Cached {
                epoch: self.epoch,
                visibility: visibility.clone(),
            },
        );
        visibility
    }

    /// Obtains a receiver that is updated as the visibility of `namespace` changes.
    pub fn visibility_rx(&mut self, namespace: &str) -> watch::Receiver<Visibility> {
        if let Some(tx) = self.watches.get(namespace) {
            return tx.subscribe();
        }

        tracing::debug!(%namespace, "watching visibility");
        let (tx, rx) = watch::channel(self.visibility(namespace));
        self.watches.insert(namespace.to_string(), tx);
        rx
    }

    /// Lists all known artifacts that are visible to `namespace`, ordered by namespace and name.
    pub fn visible_artifacts(&self, namespace: &str) -> Vec<Artifact> {
        let visibility = self.visibility(namespace);
        let mut artifacts = self
            .artifacts
            .values()
            .flat_map(|by_name| by_name.values())
            .filter(|artifact| visibility.is_visible(artifact))
            .cloned()
            .collect::<Vec<_>>();
        artifacts.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
        artifacts
    }

    /// Sets a namespace's declaration, returning true if it changed.
    pub(crate) fn update_declaration(&mut self, namespace: String, declaration: Declaration) -> bool {
        match self.declarations.entry(namespace) {
            Entry::Occupied(mut entry) => {
                if *entry.get() == declaration {
                    return false;
                }
                entry.insert(declaration);
            }
            Entry::Vacant(entry) => {
                entry.insert(declaration);
            }
        }
        true
    }

    /// Advances the epoch and publishes freshly-resolved visibility to all watches.
    pub(crate) fn reindex(&mut self) {
        self.epoch += 1;
        tracing::debug!(epoch = self.epoch, "reindexing");

        self.watches.retain(|_, tx| !tx.is_closed());
        let Self {
            namespaces,
            cache,
            watches,
            ..
        } = self;
        cache
            .get_mut()
            .retain(|ns, _| namespaces.contains(ns) || watches.contains_key(ns));

        let watched = self.watches.keys().cloned().collect::<Vec<_>>();
        for namespace in watched {
            let visibility = self.visibility(&namespace);
            if let Some(tx) = self.watches.get(&namespace) {
                tx.send_if_modified(|current| {
                    if *current == visibility {
                        return false;
                    }
                    tracing::debug!(%namespace, "visibility changed");
                    *current = visibility;
                    true
                });
            }
        }
    }
}
