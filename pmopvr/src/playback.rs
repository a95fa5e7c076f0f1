//! Tracks the single item currently being played across all clients.
//!
//! At most one item is marked playing at any time. Marking a different item
//! first clears the previous one on its owning client, then asks the new
//! owner to take it, and records it only once the owner accepted.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::ClientId;
use crate::model::{Channel, EpgTag, Recording};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackKind {
    None,
    LiveTv,
    Recording,
    EpgTag,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayingItem {
    Channel(Channel),
    Recording(Recording),
    EpgTag(EpgTag),
}

impl PlayingItem {
    pub fn kind(&self) -> PlaybackKind {
        match self {
            PlayingItem::Channel(_) => PlaybackKind::LiveTv,
            PlayingItem::Recording(_) => PlaybackKind::Recording,
            PlayingItem::EpgTag(_) => PlaybackKind::EpgTag,
        }
    }

    pub fn client_id(&self) -> ClientId {
        match self {
            PlayingItem::Channel(channel) => channel.client_id,
            PlayingItem::Recording(recording) => recording.client_id,
            PlayingItem::EpgTag(tag) => tag.client_id,
        }
    }

    /// Two items are the same when they designate the same content of the
    /// same client, whatever their other attributes.
    pub fn same_identity(&self, other: &PlayingItem) -> bool {
        match (self, other) {
            (PlayingItem::Channel(a), PlayingItem::Channel(b)) => {
                a.client_id == b.client_id && a.unique_id == b.unique_id
            }
            (PlayingItem::Recording(a), PlayingItem::Recording(b)) => {
                a.client_id == b.client_id && a.recording_id == b.recording_id
            }
            (PlayingItem::EpgTag(a), PlayingItem::EpgTag(b)) => {
                a.client_id == b.client_id && a.unique_broadcast_id == b.unique_broadcast_id
            }
            _ => false,
        }
    }
}

/// Client side of playback tracking.
pub trait PlaybackTarget: Send + Sync {
    fn client_id(&self) -> ClientId;

    fn friendly_name(&self) -> String;

    /// Marks `item` as playing on the client. Returns false when the client
    /// refuses it.
    fn set_playing(&self, item: &PlayingItem) -> bool;

    fn clear_playing(&self, kind: PlaybackKind);
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub client_id: ClientId,
    pub item: PlayingItem,
    pub friendly_name: String,
}

#[derive(Debug, Default)]
pub struct PlaybackStateTracker {
    state: Mutex<Option<PlaybackState>>,
}

impl PlaybackStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `item` as the playing item. `resolve` maps a client id to its
    /// handle; it is called without the tracker lock held.
    pub fn set_playing<R>(&self, item: PlayingItem, resolve: R) -> bool
    where
        R: Fn(ClientId) -> Option<Arc<dyn PlaybackTarget>>,
    {
        if let Some(current) = self.state() {
            if current.item.same_identity(&item) {
                return true;
            }
            self.clear(current.item.kind(), &resolve);
        }

        let Some(target) = resolve(item.client_id()) else {
            warn!(client_id = %item.client_id(), "No client to play item");
            return false;
        };

        if !target.set_playing(&item) {
            debug!(client_id = %item.client_id(), kind = ?item.kind(), "Client refused playing item");
            return false;
        }

        let state = PlaybackState {
            client_id: target.client_id(),
            friendly_name: target.friendly_name(),
            item,
        };
        *self.state.lock().unwrap() = Some(state);
        true
    }

    /// Clears the playing item if it is of `kind`. The owning client is told
    /// when it can be resolved; the tracked state is reset either way.
    pub fn clear<R>(&self, kind: PlaybackKind, resolve: R)
    where
        R: Fn(ClientId) -> Option<Arc<dyn PlaybackTarget>>,
    {
        let client_id = match self.state() {
            Some(current) if current.item.kind() == kind => current.client_id,
            _ => return,
        };

        if let Some(target) = resolve(client_id) {
            target.clear_playing(kind);
        }

        let mut state = self.state.lock().unwrap();
        if state.as_ref().is_some_and(|s| s.item.kind() == kind) {
            *state = None;
        }
    }

    /// Clears whatever is playing.
    pub fn clear_all<R>(&self, resolve: R)
    where
        R: Fn(ClientId) -> Option<Arc<dyn PlaybackTarget>>,
    {
        let kind = self.kind();
        if kind != PlaybackKind::None {
            self.clear(kind, resolve);
        }
    }

    pub fn state(&self) -> Option<PlaybackState> {
        self.state.lock().unwrap().clone()
    }

    pub fn kind(&self) -> PlaybackKind {
        self.state
            .lock()
            .unwrap()
            .as_ref()
            .map_or(PlaybackKind::None, |s| s.item.kind())
    }

    pub fn is_playing(&self) -> bool {
        self.kind() != PlaybackKind::None
    }

    pub fn is_playing_live_tv(&self) -> bool {
        self.kind() == PlaybackKind::LiveTv
    }

    pub fn is_playing_recording(&self) -> bool {
        self.kind() == PlaybackKind::Recording
    }

    pub fn is_playing_epg_tag(&self) -> bool {
        self.kind() == PlaybackKind::EpgTag
    }

    /// Id of the client owning the playing item, `None` when nothing plays.
    pub fn playing_client_id(&self) -> Option<ClientId> {
        self.state.lock().unwrap().as_ref().map(|s| s.client_id)
    }

    pub fn playing_client_name(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.friendly_name.clone())
    }

    pub fn playing_item(&self) -> Option<PlayingItem> {
        self.state.lock().unwrap().as_ref().map(|s| s.item.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    type CallLog = Arc<Mutex<Vec<String>>>;

    struct MockTarget {
        id: ClientId,
        accept: bool,
        log: CallLog,
    }

    impl PlaybackTarget for MockTarget {
        fn client_id(&self) -> ClientId {
            self.id
        }

        fn friendly_name(&self) -> String {
            format!("backend:{}", self.id)
        }

        fn set_playing(&self, item: &PlayingItem) -> bool {
            self.log
                .lock()
                .unwrap()
                .push(format!("set {} {:?}", self.id, item.kind()));
            self.accept
        }

        fn clear_playing(&self, kind: PlaybackKind) {
            self.log
                .lock()
                .unwrap()
                .push(format!("clear {} {:?}", self.id, kind));
        }
    }

    fn targets(log: &CallLog, ids: &[(i32, bool)]) -> HashMap<ClientId, Arc<dyn PlaybackTarget>> {
        ids.iter()
            .map(|&(id, accept)| {
                let target: Arc<dyn PlaybackTarget> = Arc::new(MockTarget {
                    id: ClientId(id),
                    accept,
                    log: log.clone(),
                });
                (ClientId(id), target)
            })
            .collect()
    }

    fn channel(client: i32, uid: u32) -> PlayingItem {
        PlayingItem::Channel(Channel::new(ClientId(client), uid, "channel"))
    }

    #[test]
    fn test_switch_clears_previous_client_first() {
        let log = CallLog::default();
        let map = targets(&log, &[(1, true), (2, true)]);
        let resolve = |id: ClientId| map.get(&id).cloned();
        let tracker = PlaybackStateTracker::new();

        assert!(tracker.set_playing(channel(1, 10), resolve));
        assert!(tracker.set_playing(channel(2, 20), resolve));

        assert!(tracker.is_playing_live_tv());
        assert_eq!(tracker.playing_client_id(), Some(ClientId(2)));
        assert_eq!(tracker.playing_client_name().as_deref(), Some("backend:2"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["set 1 LiveTv", "clear 1 LiveTv", "set 2 LiveTv"]
        );
    }

    #[test]
    fn test_same_item_is_a_noop() {
        let log = CallLog::default();
        let map = targets(&log, &[(1, true)]);
        let resolve = |id: ClientId| map.get(&id).cloned();
        let tracker = PlaybackStateTracker::new();

        assert!(tracker.set_playing(channel(1, 10), resolve));
        assert!(tracker.set_playing(channel(1, 10), resolve));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_refused_item_is_not_recorded() {
        let log = CallLog::default();
        let map = targets(&log, &[(1, true), (2, false)]);
        let resolve = |id: ClientId| map.get(&id).cloned();
        let tracker = PlaybackStateTracker::new();

        assert!(tracker.set_playing(channel(1, 10), resolve));
        assert!(!tracker.set_playing(channel(2, 20), resolve));
        // Le précédent a été libéré, le nouveau refusé: plus rien ne joue
        assert!(!tracker.is_playing());
        assert_eq!(tracker.playing_client_id(), None);
    }

    #[test]
    fn test_clear_only_matching_kind() {
        let log = CallLog::default();
        let map = targets(&log, &[(1, true)]);
        let resolve = |id: ClientId| map.get(&id).cloned();
        let tracker = PlaybackStateTracker::new();

        let recording = PlayingItem::Recording(Recording::new(ClientId(1), "r1", "Film"));
        assert!(tracker.set_playing(recording, resolve));

        tracker.clear(PlaybackKind::LiveTv, resolve);
        assert!(tracker.is_playing_recording());

        tracker.clear(PlaybackKind::Recording, resolve);
        assert!(!tracker.is_playing());
        assert_eq!(tracker.kind(), PlaybackKind::None);
    }

    #[test]
    fn test_clear_without_resolvable_client() {
        let log = CallLog::default();
        let map = targets(&log, &[(1, true)]);
        let tracker = PlaybackStateTracker::new();
        assert!(tracker.set_playing(channel(1, 10), |id| map.get(&id).cloned()));

        // Le client a disparu: l'état est tout de même remis à zéro
        tracker.clear_all(|_| None);
        assert!(!tracker.is_playing());
    }
}
