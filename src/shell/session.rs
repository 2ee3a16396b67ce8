use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::keymap::{self, EditorCommand, KeyChord};
use crate::graph_utils::graph::{LayoutKind, NodeKind};
use crate::graph_utils::store::GraphStore;
use crate::persistence::persist::{self, PersistedState};
use crate::persistence::settings::AppSettings;

/// The editor shell around one store: turns user intents into store calls and
/// flushes changes to disk once edits settle.
#[derive(Debug)]
pub struct Session {
    store: GraphStore,
    settings: AppSettings,
    state_dir: PathBuf,
    // store revision at the last successful save
    saved_revision: u64,
    seen_revision: u64,
    last_change: Instant,
    pub last_save_info: Option<String>,
    pub save_error: Option<String>,
}

impl Session {
    pub fn new(settings: AppSettings, state_dir: PathBuf) -> Self {
        let mut store = GraphStore::new();
        configure(&mut store, &settings);
        Self::with_store(store, settings, state_dir)
    }

    pub fn with_store(store: GraphStore, settings: AppSettings, state_dir: PathBuf) -> Self {
        let rev = store.revision();
        Session {
            store,
            settings,
            state_dir,
            saved_revision: rev,
            seen_revision: rev,
            last_change: Instant::now(),
            last_save_info: None,
            save_error: None,
        }
    }

    /// Open the persisted state in `state_dir`, or start a blank map. An
    /// unreadable state file is logged and left on disk until the next save.
    pub fn open(settings: AppSettings, state_dir: PathBuf) -> Self {
        let mut session = Session::new(settings, state_dir);
        match persist::load_active(&session.state_dir) {
            Ok(Some(state)) => {
                state.restore_into(&mut session.store);
                session.saved_revision = session.store.revision();
                session.seen_revision = session.saved_revision;
                session.last_save_info = Some("Loaded latest state".into());
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("could not load saved state, starting a blank map: {:#}", e);
                session.save_error = Some(format!("Load failed: {}", e));
            }
        }
        session
    }

    pub fn store(&self) -> &GraphStore { &self.store }
    pub fn store_mut(&mut self) -> &mut GraphStore { &mut self.store }
    pub fn settings(&self) -> &AppSettings { &self.settings }
    pub fn state_dir(&self) -> &Path { &self.state_dir }

    pub fn is_dirty(&self) -> bool { self.store.revision() != self.saved_revision }

    pub fn handle_key(&mut self, chord: &KeyChord, text_input_focused: bool) -> Option<EditorCommand> {
        let cmd = keymap::command_for(chord, text_input_focused)?;
        self.execute(cmd);
        Some(cmd)
    }

    pub fn execute(&mut self, cmd: EditorCommand) {
        let selected = self.store.selected_node_id().map(str::to_string);
        match cmd {
            EditorCommand::AddNode => {
                self.store.add_node(None, NodeKind::Text, LayoutKind::Default);
            }
            EditorCommand::AddImageNode => {
                self.store.add_node(None, NodeKind::Image, LayoutKind::Default);
            }
            EditorCommand::AddChild => {
                if let Some(id) = selected {
                    self.store.add_node(Some(id.as_str()), NodeKind::Text, LayoutKind::Default);
                }
            }
            EditorCommand::DeleteSelection => {
                if let Some(id) = selected {
                    self.store.delete_node(&id);
                }
            }
            EditorCommand::ClearSelection => self.store.select_node(None),
            EditorCommand::Undo => {
                self.store.undo();
            }
            EditorCommand::Redo => {
                self.store.redo();
            }
            EditorCommand::Save => {
                self.store.save_current_map();
                if let Err(e) = self.save_now() {
                    log::error!("save failed: {:#}", e);
                }
            }
        }
    }

    /// Called once per frame/event turn. Saves when the store has been idle
    /// for the configured debounce; returns the written path if it did.
    pub fn autosave_tick(&mut self, now: Instant) -> Option<PathBuf> {
        let rev = self.store.revision();
        if rev != self.seen_revision {
            self.seen_revision = rev;
            self.last_change = now;
        }
        if !self.is_dirty() {
            return None;
        }
        let debounce = Duration::from_millis(self.settings.autosave_debounce_ms);
        if now.saturating_duration_since(self.last_change) < debounce {
            return None;
        }
        match self.save_now() {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("autosave failed: {:#}", e);
                None
            }
        }
    }

    pub fn save_now(&mut self) -> anyhow::Result<PathBuf> {
        let state = PersistedState::from_store(&self.store);
        match persist::save_active(&self.state_dir, &state) {
            Ok(path) => {
                self.saved_revision = self.store.revision();
                self.save_error = None;
                self.last_save_info = Some(format!("Saved to {}", path.display()));
                Ok(path)
            }
            Err(e) => {
                self.save_error = Some(format!("Save failed: {}", e));
                Err(e)
            }
        }
    }

    pub fn save_version(&mut self) -> anyhow::Result<PathBuf> {
        let state = PersistedState::from_store(&self.store);
        let path = persist::save_versioned(&self.state_dir, &state)?;
        self.last_save_info = Some(format!("Saved version {}", path.display()));
        Ok(path)
    }

    /// Start a blank map, backing up the current one first if it has content.
    pub fn new_map(&mut self) {
        let had_content = self.store.nodes().len() > 1 || !self.store.edges().is_empty();
        if had_content && let Err(e) = self.save_version() {
            log::warn!("backup before new map failed: {:#}", e);
        }
        self.store.create_new_map();
    }
}

fn configure(store: &mut GraphStore, settings: &AppSettings) {
    store.set_viewport(settings.viewport());
    store.set_history_limit(settings.history_limit);
    store.set_default_map_name(settings.default_map_name.clone());
    store.rename_map(settings.default_map_name.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_utils::graph::ROOT_ID;
    use crate::shell::keymap::Key;

    fn session(dir: &Path) -> Session {
        let settings = AppSettings { autosave_debounce_ms: 100, ..Default::default() };
        Session::new(settings, dir.to_path_buf())
    }

    #[test]
    fn keyboard_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.store_mut().select_node(Some(ROOT_ID));
        assert_eq!(s.handle_key(&KeyChord::plain(Key::Tab), false), Some(EditorCommand::AddChild));
        assert_eq!(s.store().nodes().len(), 2);
        assert_eq!(s.store().edges().len(), 1);

        // typing in a field does nothing
        assert_eq!(s.handle_key(&KeyChord::plain(Key::Delete), true), None);
        assert_eq!(s.store().nodes().len(), 2);

        s.handle_key(&KeyChord::plain(Key::Delete), false);
        assert_eq!(s.store().nodes().len(), 1);
        s.handle_key(&KeyChord::command(Key::Char('z')), false);
        assert_eq!(s.store().nodes().len(), 2);
        s.handle_key(&KeyChord::command(Key::Char('z')).with_shift(), false);
        assert_eq!(s.store().nodes().len(), 1);
    }

    #[test]
    fn root_cannot_be_deleted_from_keyboard() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.store_mut().select_node(Some(ROOT_ID));
        s.execute(EditorCommand::DeleteSelection);
        assert!(s.store().node(ROOT_ID).is_some());
    }

    #[test]
    fn autosave_waits_for_debounce() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let t0 = Instant::now();
        s.execute(EditorCommand::AddNode);
        assert!(s.is_dirty());
        assert!(s.autosave_tick(t0).is_none());
        let path = s.autosave_tick(t0 + Duration::from_millis(150)).unwrap();
        assert!(path.exists());
        assert!(!s.is_dirty());
        assert!(s.autosave_tick(t0 + Duration::from_millis(400)).is_none());
    }

    #[test]
    fn save_command_upserts_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.execute(EditorCommand::AddImageNode);
        s.handle_key(&KeyChord::command(Key::Char('s')), false);
        assert_eq!(s.store().saved_maps().len(), 1);
        assert!(!s.is_dirty());

        let reopened = Session::open(s.settings().clone(), dir.path().to_path_buf());
        assert_eq!(reopened.store().nodes(), s.store().nodes());
        assert_eq!(reopened.store().saved_maps().len(), 1);
        assert!(!reopened.is_dirty());
    }

    #[test]
    fn corrupt_state_opens_blank_map() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(persist::active_state_path(dir.path()), "{ truncated").unwrap();
        let mut s = Session::open(AppSettings::default(), dir.path().to_path_buf());
        assert_eq!(s.store().nodes().len(), 1);
        assert!(s.save_error.is_some());

        s.execute(EditorCommand::AddNode);
        s.save_now().unwrap();
        let reopened = Session::open(AppSettings::default(), dir.path().to_path_buf());
        assert_eq!(reopened.store().nodes().len(), 2);
        assert!(reopened.save_error.is_none());
    }

    #[test]
    fn state_without_style_keys_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let json = r##"{
            "nodes": [
                {"id": "root", "position": {"x": 0, "y": 0}, "data": {"label": "R"}},
                {"id": "a", "position": {"x": 250, "y": 0}, "data": {"label": "A"}}
            ],
            "edges": [{"id": "edge-root-a", "source": "root", "target": "a", "color": "#000"}],
            "selectedNodeId": "a",
            "mapName": "Old"
        }"##;
        std::fs::write(persist::active_state_path(dir.path()), json).unwrap();
        let s = Session::open(AppSettings::default(), dir.path().to_path_buf());
        assert!(s.save_error.is_none());
        assert_eq!(s.store().nodes().len(), 2);
        assert_eq!(s.store().map_name(), "Old");
        assert_eq!(s.store().selected_node_id(), Some("a"));
        assert_eq!(s.store().edge_defaults(), &crate::graph_utils::graph::EdgeDefaults::default());
    }

    #[test]
    fn new_map_backs_up_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.new_map();
        assert!(persist::list_versions(dir.path()).unwrap().is_empty());
        s.execute(EditorCommand::AddNode);
        s.new_map();
        assert_eq!(persist::list_versions(dir.path()).unwrap().len(), 1);
        assert_eq!(s.store().nodes().len(), 1);
    }
}
