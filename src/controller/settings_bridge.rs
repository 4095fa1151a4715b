use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::Result;
use crate::model::query;
use crate::model::{SettingDescriptors, SettingValue, SettingsState};

/// Quiet period before a settings change is reported
pub const DEBOUNCE_MS: f64 = 300.0;

/// Access to the page URL's query string
pub trait QueryStore {
    /// Current `location.search`
    fn search(&self) -> String;
    /// Swap the query string in place, without growing history
    fn replace(&mut self, query: &str);
    fn reload(&mut self);
}

/// Trailing debounce, tracked separately for every key
#[derive(Debug)]
pub struct Debounce {
    wait_ms: f64,
    deadlines: IndexMap<String, f64>,
}

impl Debounce {
    pub fn new(wait_ms: f64) -> Self {
        Self {
            wait_ms,
            deadlines: IndexMap::new(),
        }
    }

    /// (Re)arms the timer for `key`
    pub fn touch(&mut self, key: &str, now_ms: f64) {
        self.deadlines.insert(key.to_string(), now_ms + self.wait_ms);
    }

    /// Keys whose quiet period has passed, in the order they were first touched
    pub fn due(&mut self, now_ms: f64) -> Vec<String> {
        let due: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now_ms)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &due {
            self.deadlines.shift_remove(key);
        }
        due
    }

    pub fn is_pending(&self) -> bool {
        !self.deadlines.is_empty()
    }
}

/// Owns the declared settings and their live values, and keeps the URL in sync
pub struct SettingsBridge {
    descriptors: SettingDescriptors,
    state: Rc<RefCell<SettingsState>>,
    queryable: bool,
    store: Box<dyn QueryStore>,
    debounce: Debounce,
}

impl SettingsBridge {
    /// Validates `descriptors` and resolves their values, taking overrides from the
    /// query string when `queryable`. A queryable bridge writes the resolved state
    /// back to the URL straight away.
    pub fn initialize(
        descriptors: SettingDescriptors,
        queryable: bool,
        store: Box<dyn QueryStore>,
    ) -> Result<Self> {
        let overrides = queryable.then(|| query::parse(&store.search()));
        let state = descriptors.resolve(overrides.as_ref())?;

        let mut bridge = Self {
            descriptors,
            state: Rc::new(RefCell::new(state)),
            queryable,
            store,
            debounce: Debounce::new(DEBOUNCE_MS),
        };
        if queryable {
            bridge.write_query();
        }
        Ok(bridge)
    }

    pub fn descriptors(&self) -> &SettingDescriptors {
        &self.descriptors
    }

    /// Shared handle to the live values
    pub fn state(&self) -> Rc<RefCell<SettingsState>> {
        self.state.clone()
    }

    pub fn is_queryable(&self) -> bool {
        self.queryable
    }

    /// Records that the panel edited `name` in place
    pub fn changed(&mut self, name: &str, now_ms: f64) {
        if self.descriptors.contains(name) {
            self.debounce.touch(name, now_ms);
        }
    }

    /// Changes whose debounce has elapsed, with their current values.
    /// The URL is rewritten once when anything is due.
    pub fn flush(&mut self, now_ms: f64) -> Vec<(String, SettingValue)> {
        let due = self.debounce.due(now_ms);
        if due.is_empty() {
            return Vec::new();
        }
        if self.queryable {
            self.write_query();
        }
        let state = self.state.borrow();
        let fired = due
            .into_iter()
            .filter_map(|name| state.get(&name).cloned().map(|value| (name, value)))
            .collect();
        fired
    }

    pub fn has_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Query string that survives a reset: only the sticky settings
    pub fn sticky_query(&self) -> String {
        let state = self.state.borrow();
        let sticky = self
            .descriptors
            .iter()
            .filter(|(_, d)| d.sticky)
            .filter_map(|(name, _)| state.get(name).map(|v| (name.as_str(), v.to_string())));
        let query = query::serialize_pairs(sticky);
        query
    }

    /// Drops every non-sticky setting from the URL and reloads the page
    pub fn reset(&mut self) {
        let query = self.sticky_query();
        self.store.replace(&query);
        self.store.reload();
    }

    fn write_query(&mut self) {
        let query = query::serialize(&self.state.borrow());
        self.store.replace(&query);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SettingDescriptor;
    use std::cell::Cell;

    #[derive(Clone, Default)]
    struct MemoryStore {
        search: Rc<RefCell<String>>,
        history: Rc<RefCell<Vec<String>>>,
        reloads: Rc<Cell<u32>>,
    }

    impl QueryStore for MemoryStore {
        fn search(&self) -> String {
            self.search.borrow().clone()
        }

        fn replace(&mut self, query: &str) {
            *self.search.borrow_mut() = query.to_string();
            self.history.borrow_mut().push(query.to_string());
        }

        fn reload(&mut self) {
            self.reloads.set(self.reloads.get() + 1);
        }
    }

    fn descriptors() -> SettingDescriptors {
        SettingDescriptors::new()
            .add("demo", SettingDescriptor::text("multitouch").editable(false).sticky(true))
            .add("force", SettingDescriptor::number(5.0).min(2.0).max(30.0))
            .add("blend", SettingDescriptor::list(["multiply", "lighter", "overlay"]))
    }

    /// Edits a value the way the panel does: in place, then `changed`
    fn edit(bridge: &mut SettingsBridge, name: &str, value: SettingValue, now_ms: f64) -> bool {
        let known = bridge.state().borrow_mut().set(name, value);
        bridge.changed(name, now_ms);
        known
    }

    fn store(search: &str) -> MemoryStore {
        let store = MemoryStore::default();
        *store.search.borrow_mut() = search.to_string();
        store
    }

    #[test]
    fn test_not_queryable_ignores_url() {
        let store = store("?force=12");
        let bridge = SettingsBridge::initialize(descriptors(), false, Box::new(store.clone())).unwrap();

        assert_eq!(bridge.state().borrow().number("force"), Some(5.0));
        assert!(store.history.borrow().is_empty());
    }

    #[test]
    fn test_queryable_reads_then_writes_url() {
        let store = store("?force=12&blend=lighter");
        let bridge = SettingsBridge::initialize(descriptors(), true, Box::new(store.clone())).unwrap();

        let state = bridge.state();
        assert_eq!(state.borrow().get("force"), Some(&SettingValue::Number(12.0)));
        assert_eq!(state.borrow().text("blend"), Some("lighter"));
        assert_eq!(
            *store.history.borrow(),
            vec!["demo=multitouch&force=12&blend=lighter".to_string()]
        );
    }

    #[test]
    fn test_invalid_descriptor_fails_initialization() {
        let bad = descriptors().add("size", SettingDescriptor::number(1.0).step(-1.0));
        assert!(SettingsBridge::initialize(bad, false, Box::new(MemoryStore::default())).is_err());
    }

    #[test]
    fn test_changes_are_debounced() {
        let store = store("");
        let mut bridge = SettingsBridge::initialize(descriptors(), true, Box::new(store.clone())).unwrap();
        let writes = store.history.borrow().len();

        edit(&mut bridge, "force", SettingValue::Number(8.0), 0.0);
        edit(&mut bridge, "force", SettingValue::Number(9.0), 200.0);
        assert!(bridge.flush(400.0).is_empty());
        assert!(bridge.has_pending());

        let fired = bridge.flush(500.0);
        assert_eq!(fired, vec![("force".to_string(), SettingValue::Number(9.0))]);
        assert!(!bridge.has_pending());
        assert_eq!(store.history.borrow().len(), writes + 1);
        assert_eq!(store.search(), "demo=multitouch&force=9&blend=multiply");

        assert!(bridge.flush(10_000.0).is_empty());
    }

    #[test]
    fn test_debounce_is_per_setting() {
        let mut bridge = SettingsBridge::initialize(descriptors(), false, Box::new(MemoryStore::default())).unwrap();
        edit(&mut bridge, "force", SettingValue::Number(3.0), 0.0);
        bridge.state().borrow_mut().set("blend", "overlay".into());
        bridge.changed("blend", 100.0);
        bridge.changed("nope", 100.0);

        let names: Vec<_> = bridge.flush(300.0).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["force"]);
        let names: Vec<_> = bridge.flush(400.0).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["blend"]);
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let mut bridge = SettingsBridge::initialize(descriptors(), false, Box::new(MemoryStore::default())).unwrap();
        assert!(!edit(&mut bridge, "gravity", SettingValue::Number(1.0), 0.0));
        assert!(!bridge.has_pending());
        assert_eq!(bridge.state().borrow().len(), 3);
    }

    #[test]
    fn test_reset_keeps_sticky_settings() {
        let store = store("?demo=paint&force=20");
        let mut bridge = SettingsBridge::initialize(descriptors(), true, Box::new(store.clone())).unwrap();
        bridge.reset();

        assert_eq!(store.search(), "demo=paint");
        assert_eq!(store.reloads.get(), 1);
    }
}
