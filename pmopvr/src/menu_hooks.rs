//! Context menu entries declared by a backend, grouped by the kind of
//! item they apply to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Channel, Recording, Timer};

/// Context in which a backend menu entry is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MenuHookCategory {
    Unknown,
    /// Offered in every context.
    All,
    Channel,
    Timer,
    Epg,
    Recording,
    DeletedRecording,
    Setting,
}

/// A menu entry registered by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuHook {
    pub hook_id: u32,
    pub label_id: u32,
    pub category: MenuHookCategory,
}

impl MenuHook {
    pub fn new(hook_id: u32, label_id: u32, category: MenuHookCategory) -> Self {
        Self {
            hook_id,
            label_id,
            category,
        }
    }
}

/// Item a menu hook is invoked on.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuHookData {
    Setting,
    Channel(Channel),
    Recording(Recording),
    DeletedRecording(Recording),
    Timer(Timer),
    /// Unique broadcast id of an EPG entry.
    EpgTag(u32),
}

impl MenuHookData {
    pub fn category(&self) -> MenuHookCategory {
        match self {
            MenuHookData::Setting => MenuHookCategory::Setting,
            MenuHookData::Channel(_) => MenuHookCategory::Channel,
            MenuHookData::Recording(_) => MenuHookCategory::Recording,
            MenuHookData::DeletedRecording(_) => MenuHookCategory::DeletedRecording,
            MenuHookData::Timer(_) => MenuHookCategory::Timer,
            MenuHookData::EpgTag(_) => MenuHookCategory::Epg,
        }
    }

    /// A recording flagged deleted is routed to the deleted-recording
    /// category.
    pub fn for_recording(recording: Recording) -> Self {
        if recording.is_deleted {
            MenuHookData::DeletedRecording(recording)
        } else {
            MenuHookData::Recording(recording)
        }
    }
}

/// Menu hooks of one client, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuHooks {
    by_category: BTreeMap<MenuHookCategory, Vec<MenuHook>>,
}

impl MenuHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hooks(hooks: impl IntoIterator<Item = MenuHook>) -> Self {
        let mut menu_hooks = Self::new();
        for hook in hooks {
            menu_hooks.add(hook);
        }
        menu_hooks
    }

    pub fn add(&mut self, hook: MenuHook) {
        self.by_category.entry(hook.category).or_default().push(hook);
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.values().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    /// True if at least one hook applies to `category`, counting the hooks
    /// registered for every context.
    pub fn has_hooks(&self, category: MenuHookCategory) -> bool {
        self.hooks_of(category).next().is_some()
    }

    /// Hooks that apply to `category`: the category's own hooks followed by
    /// the hooks registered for every context.
    pub fn hooks(&self, category: MenuHookCategory) -> Vec<MenuHook> {
        self.hooks_of(category).cloned().collect()
    }

    fn hooks_of(&self, category: MenuHookCategory) -> impl Iterator<Item = &MenuHook> {
        let own = self.by_category.get(&category).into_iter().flatten();
        let all = if category == MenuHookCategory::All {
            None
        } else {
            self.by_category.get(&MenuHookCategory::All)
        };
        own.chain(all.into_iter().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientId;

    fn sample_hooks() -> MenuHooks {
        MenuHooks::from_hooks([
            MenuHook::new(1, 30001, MenuHookCategory::Channel),
            MenuHook::new(2, 30002, MenuHookCategory::All),
            MenuHook::new(3, 30003, MenuHookCategory::Timer),
        ])
    }

    #[test]
    fn test_hooks_include_all_category() {
        let hooks = sample_hooks();
        let channel: Vec<u32> = hooks
            .hooks(MenuHookCategory::Channel)
            .iter()
            .map(|h| h.hook_id)
            .collect();
        assert_eq!(channel, vec![1, 2]);

        // Aucune entrée propre aux enregistrements, mais les hooks "All" s'appliquent
        assert!(hooks.has_hooks(MenuHookCategory::Recording));
        assert_eq!(hooks.hooks(MenuHookCategory::Recording).len(), 1);
        assert_eq!(hooks.hooks(MenuHookCategory::All).len(), 1);
        assert_eq!(hooks.len(), 3);
    }

    #[test]
    fn test_empty_hooks() {
        let hooks = MenuHooks::new();
        assert!(hooks.is_empty());
        assert!(!hooks.has_hooks(MenuHookCategory::Setting));
    }

    #[test]
    fn test_hook_data_category() {
        let mut recording = Recording::new(ClientId(1), "rec-1", "News");
        assert_eq!(
            MenuHookData::for_recording(recording.clone()).category(),
            MenuHookCategory::Recording
        );
        recording.is_deleted = true;
        assert_eq!(
            MenuHookData::for_recording(recording).category(),
            MenuHookCategory::DeletedRecording
        );
        assert_eq!(MenuHookData::EpgTag(12).category(), MenuHookCategory::Epg);
    }
}
