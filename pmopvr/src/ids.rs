//! Client id assignment.
//!
//! Ids are handed out in increasing order starting at 1 and remembered per
//! add-on id, so two add-ons never share an id. With a backing file the
//! table, together with each client's priority, survives restarts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ClientId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct ClientEntry {
    id: ClientId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<i32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TableData {
    #[serde(default)]
    clients: BTreeMap<String, ClientEntry>,
}

impl TableData {
    fn next_id(&self) -> ClientId {
        let max = self.clients.values().map(|e| e.id.0).max().unwrap_or(0);
        ClientId(max + 1)
    }
}

#[derive(Debug)]
pub struct ClientIdTable {
    path: Option<PathBuf>,
    data: Mutex<TableData>,
}

impl ClientIdTable {
    /// Table kept in memory only.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(TableData::default()),
        }
    }

    /// Opens the table stored at `path`. A missing file yields an empty
    /// table that is created on the first assignment.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let text = fs::read_to_string(&path)?;
            let data: TableData = serde_yaml::from_str(&text)?;
            info!(file = %path.display(), clients = data.clients.len(), "Loaded client id table");
            data
        } else {
            TableData::default()
        };
        Ok(Self {
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    /// Id of `addon_id`, assigning a fresh one the first time.
    pub fn id_for(&self, addon_id: &str) -> ClientId {
        let mut data = self.data.lock().unwrap();
        if let Some(entry) = data.clients.get(addon_id) {
            return entry.id;
        }

        let id = data.next_id();
        data.clients.insert(
            addon_id.to_string(),
            ClientEntry { id, priority: None },
        );
        self.persist(&data);
        id
    }

    pub fn lookup(&self, addon_id: &str) -> Option<ClientId> {
        let data = self.data.lock().unwrap();
        data.clients.get(addon_id).map(|entry| entry.id)
    }

    pub fn addon_id(&self, id: ClientId) -> Option<String> {
        let data = self.data.lock().unwrap();
        data.clients
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(addon_id, _)| addon_id.clone())
    }

    pub fn priority(&self, addon_id: &str) -> Option<i32> {
        let data = self.data.lock().unwrap();
        data.clients.get(addon_id).and_then(|entry| entry.priority)
    }

    pub fn set_priority(&self, addon_id: &str, priority: i32) {
        let mut data = self.data.lock().unwrap();
        match data.clients.get_mut(addon_id) {
            Some(entry) if entry.priority == Some(priority) => return,
            Some(entry) => entry.priority = Some(priority),
            None => {
                warn!(addon = addon_id, "Priority set for an add-on without client id");
                return;
            }
        }
        self.persist(&data);
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, data: &TableData) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(err) = Self::write(path, data) {
            warn!(file = %path.display(), error = %err, "Cannot save client id table");
        }
    }

    fn write(path: &Path, data: &TableData) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let yaml = serde_yaml::to_string(data)?;
        fs::write(path, yaml)?;
        Ok(())
    }
}
