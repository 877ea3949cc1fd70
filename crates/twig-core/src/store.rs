//! Todo store
//!
//! Owns the record collection and the manual order, persists both through
//! a `StorageAdapter` after every mutation, then notifies observers.

use crate::events::{Notifier, Observer, ObserverId, TodoEvent};
use crate::{Error, Result, Statistics, StorageAdapter, TodoRecord, generate_id};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};

/// Completion predicate for `TodoStore::filter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn matches(&self, todo: &TodoRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => !todo.completed,
            StatusFilter::Completed => todo.completed,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "completed" => Ok(StatusFilter::Completed),
            _ => Err(Error::InvalidFilter(s.to_string())),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Pending => write!(f, "pending"),
            StatusFilter::Completed => write!(f, "completed"),
        }
    }
}

/// Store settings, usually taken from `Config::store_options`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub id_prefix: String,
    pub todos_key: String,
    pub order_key: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            id_prefix: "td".to_string(),
            todos_key: "todos".to_string(),
            order_key: "todoOrder".to_string(),
        }
    }
}

/// Todo collection with parent/subtask bookkeeping
pub struct TodoStore<S: StorageAdapter> {
    storage: S,
    options: StoreOptions,
    todos: Vec<TodoRecord>,
    order: Vec<String>,
    notifier: Notifier,
}

impl<S: StorageAdapter> TodoStore<S> {
    /// Load the store from `storage`
    ///
    /// Missing, unreadable or malformed entries load as empty.
    pub fn open(storage: S, options: StoreOptions) -> Self {
        let todos: Vec<TodoRecord> = load_entry(&storage, &options.todos_key);
        let order: Vec<String> = load_entry(&storage, &options.order_key);
        tracing::debug!(todos = todos.len(), order = order.len(), "loaded todo store");

        let mut store = Self {
            storage,
            options,
            todos,
            order,
            notifier: Notifier::new(),
        };
        store.reconcile_links();
        store.flatten_nesting();
        store
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Register an observer for all subsequent mutations
    pub fn subscribe(&mut self, observer: impl Observer + 'static) -> ObserverId {
        self.notifier.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// All records, in insertion order
    pub fn todos(&self) -> &[TodoRecord] {
        &self.todos
    }

    /// The saved manual order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TodoRecord> {
        self.todos.iter().find(|t| t.id == id)
    }

    /// Direct children of `id`, in subtask order
    pub fn subtasks_of(&self, id: &str) -> Vec<&TodoRecord> {
        self.get(id)
            .map(|t| t.subtasks.iter().filter_map(|s| self.get(s)).collect())
            .unwrap_or_default()
    }

    /// Create a record
    ///
    /// Subtasks always hang off a top-level record: a `parent_id` that is
    /// itself a subtask resolves to its top-level ancestor. An unknown
    /// `parent_id` is ignored.
    pub fn add(
        &mut self,
        task: &str,
        due_date: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<TodoRecord> {
        let mut todo = TodoRecord::new(self.fresh_id(), task, due_date);

        if let Some(root) = parent_id.and_then(|p| self.root_of(p))
            && let Some(idx) = self.position(&root)
        {
            let parent = &mut self.todos[idx];
            parent.subtasks.push(todo.id.clone());
            parent.touch();
            todo.parent_id = Some(root);
        }

        self.todos.push(todo.clone());
        if let Some(ref parent) = todo.parent_id {
            self.recompute_parent(parent);
        }
        self.save_todos()?;
        tracing::debug!(id = %todo.id, parent = ?todo.parent_id, "added todo");
        self.notifier.notify(&TodoEvent::Added(todo.clone()));
        Ok(todo)
    }

    /// Replace a record's task text
    pub fn edit(&mut self, id: &str, new_task: &str) -> Result<Option<TodoRecord>> {
        let Some(idx) = self.position(id) else {
            return Ok(None);
        };
        self.todos[idx].set_task(new_task);
        let todo = self.todos[idx].clone();

        self.save_todos()?;
        tracing::debug!(id, "edited todo");
        self.notifier.notify(&TodoEvent::Updated(todo.clone()));
        Ok(Some(todo))
    }

    /// Remove a record and all of its descendants
    pub fn delete(&mut self, id: &str) -> Result<Option<TodoRecord>> {
        let Some(removed) = self.get(id).cloned() else {
            return Ok(None);
        };

        let doomed: HashSet<String> = self.subtree_post_order(id).into_iter().collect();
        self.todos.retain(|t| !doomed.contains(&t.id));
        for todo in self.todos.iter_mut() {
            let before = todo.subtasks.len();
            todo.subtasks.retain(|s| !doomed.contains(s));
            if todo.subtasks.len() != before {
                todo.touch();
            }
        }
        self.order.retain(|o| !doomed.contains(o));
        if let Some(ref parent) = removed.parent_id {
            self.recompute_parent(parent);
        }

        self.save_todos()?;
        self.save_order()?;
        tracing::debug!(id, removed = doomed.len(), "deleted todo");
        self.notifier.notify(&TodoEvent::Deleted(removed.clone()));
        Ok(Some(removed))
    }

    /// Flip completion on a record
    ///
    /// Direct children follow the new value; the parent, if any, becomes
    /// completed exactly when all of its children are.
    pub fn toggle_status(&mut self, id: &str) -> Result<Option<TodoRecord>> {
        let Some(idx) = self.position(id) else {
            return Ok(None);
        };
        let completed = !self.todos[idx].completed;
        self.todos[idx].set_completed(completed);

        let subtasks = self.todos[idx].subtasks.clone();
        for child in &subtasks {
            if let Some(child_idx) = self.position(child) {
                self.todos[child_idx].set_completed(completed);
            }
        }

        if let Some(parent_id) = self.todos[idx].parent_id.clone() {
            self.recompute_parent(&parent_id);
        }

        let todo = self.todos[idx].clone();
        self.save_todos()?;
        tracing::debug!(id, completed, "toggled todo status");
        self.notifier.notify(&TodoEvent::StatusChanged(todo.clone()));
        Ok(Some(todo))
    }

    /// Flip the expansion hint; records without subtasks are left alone
    pub fn toggle_expanded(&mut self, id: &str) -> Result<Option<TodoRecord>> {
        let Some(idx) = self.position(id) else {
            return Ok(None);
        };
        if !self.todos[idx].has_subtasks() {
            return Ok(None);
        }
        let todo = &mut self.todos[idx];
        todo.expanded = !todo.expanded;
        todo.touch();
        let todo = todo.clone();

        self.save_todos()?;
        self.notifier
            .notify(&TodoEvent::ExpansionChanged(todo.clone()));
        Ok(Some(todo))
    }

    /// Remove every record and the manual order, returning the old records
    pub fn clear_all(&mut self) -> Result<Vec<TodoRecord>> {
        let snapshot = std::mem::take(&mut self.todos);
        self.order.clear();

        self.save_todos()?;
        self.save_order()?;
        tracing::debug!(removed = snapshot.len(), "cleared todo store");
        self.notifier.notify(&TodoEvent::Cleared(snapshot.clone()));
        Ok(snapshot)
    }

    /// Replace the manual order as given
    pub fn reorder(&mut self, ids: Vec<String>) -> Result<()> {
        self.order = ids;
        self.save_order()?;
        self.notifier
            .notify(&TodoEvent::Reordered(self.order.clone()));
        Ok(())
    }

    /// Records matching `status` and `query`, in display order
    pub fn filter(&self, status: StatusFilter, query: Option<&str>) -> Vec<&TodoRecord> {
        let needle = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let selected: Vec<&TodoRecord> = self
            .todos
            .iter()
            .filter(|t| status.matches(t))
            .filter(|t| needle.as_deref().is_none_or(|n| t.matches_query(n)))
            .collect();

        apply_manual_order(selected, &self.order)
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::compute(&self.todos)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.todos.iter().position(|t| t.id == id)
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = generate_id(&self.options.id_prefix);
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Top-level ancestor of `id` (itself when it has no parent)
    fn root_of(&self, id: &str) -> Option<String> {
        let mut current = self.get(id)?;
        let mut hops = 0;
        while let Some(parent) = current.parent_id.as_deref().and_then(|p| self.get(p)) {
            hops += 1;
            if hops > self.todos.len() {
                break;
            }
            current = parent;
        }
        Some(current.id.clone())
    }

    /// `id` and its descendants, children before parents
    fn subtree_post_order(&self, id: &str) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        self.visit_subtree(id, &mut visited, &mut out);
        out
    }

    fn visit_subtree(&self, id: &str, visited: &mut HashSet<String>, out: &mut Vec<String>) {
        if !visited.insert(id.to_string()) {
            return;
        }
        if let Some(todo) = self.get(id) {
            for child in &todo.subtasks {
                self.visit_subtree(child, visited, out);
            }
        }
        out.push(id.to_string());
    }

    fn recompute_parent(&mut self, parent_id: &str) {
        let Some(idx) = self.position(parent_id) else {
            return;
        };
        let children: Vec<&TodoRecord> = self.todos[idx]
            .subtasks
            .iter()
            .filter_map(|s| self.get(s))
            .collect();
        if children.is_empty() {
            return;
        }
        let all_done = children.iter().all(|c| c.completed);
        if self.todos[idx].completed != all_done {
            self.todos[idx].set_completed(all_done);
        }
    }

    /// Make parent ids and subtask lists agree after loading
    fn reconcile_links(&mut self) {
        let mut seen = HashSet::new();
        let before = self.todos.len();
        self.todos.retain(|t| seen.insert(t.id.clone()));
        if self.todos.len() != before {
            tracing::warn!(
                dropped = before - self.todos.len(),
                "dropped todos with duplicate ids"
            );
        }

        let parents: HashMap<String, Option<String>> = self
            .todos
            .iter()
            .map(|t| (t.id.clone(), t.parent_id.clone()))
            .collect();

        // child -> the parent whose subtask list keeps it
        let mut claimed: HashMap<String, String> = HashMap::new();
        for todo in self.todos.iter_mut() {
            let owner = todo.id.clone();
            todo.subtasks.retain(|child| {
                let keep = *child != owner
                    && !claimed.contains_key(child)
                    && parents
                        .get(child)
                        .is_some_and(|p| p.as_deref().is_none_or(|p| p == owner));
                if keep {
                    claimed.insert(child.clone(), owner.clone());
                } else {
                    tracing::debug!(parent = %owner, child = %child, "dropped stale subtask link");
                }
                keep
            });
        }

        let mut unlisted = Vec::new();
        for todo in self.todos.iter_mut() {
            if let Some(owner) = claimed.get(&todo.id) {
                todo.parent_id = Some(owner.clone());
                continue;
            }
            if let Some(parent) = todo.parent_id.clone() {
                if parent == todo.id || !parents.contains_key(&parent) {
                    tracing::debug!(id = %todo.id, parent = %parent, "cleared missing parent");
                    todo.parent_id = None;
                } else {
                    unlisted.push((parent, todo.id.clone()));
                }
            }
        }
        for (parent, child) in unlisted {
            if let Some(idx) = self.position(&parent) {
                tracing::debug!(parent = %parent, child = %child, "relinked subtask");
                self.todos[idx].subtasks.push(child);
            }
        }
    }

    /// Break parent cycles and hoist deeper descendants onto their
    /// top-level ancestor, so loaded data keeps to one level of nesting
    fn flatten_nesting(&mut self) {
        for idx in 0..self.todos.len() {
            let id = self.todos[idx].id.clone();
            if !self.on_parent_cycle(&id) {
                continue;
            }
            if let Some(parent) = self.todos[idx].parent_id.take() {
                tracing::warn!(id = %id, parent = %parent, "broke subtask cycle");
                self.detach(&parent, &id);
            }
        }

        let nested: Vec<(String, String, String)> = self
            .todos
            .iter()
            .filter_map(|t| {
                let parent = t.parent_id.as_deref()?;
                let root = self.root_of(parent)?;
                (root != parent).then(|| (t.id.clone(), parent.to_string(), root))
            })
            .collect();
        for (child, parent, root) in nested {
            tracing::debug!(id = %child, from = %parent, to = %root, "hoisted nested subtask");
            self.detach(&parent, &child);
            if let Some(idx) = self.position(&root) {
                self.todos[idx].subtasks.push(child.clone());
            }
            if let Some(idx) = self.position(&child) {
                self.todos[idx].parent_id = Some(root);
            }
        }
    }

    /// Whether following parent ids from `id` leads back to `id`
    fn on_parent_cycle(&self, id: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.get(id).and_then(|t| t.parent_id.as_deref());
        while let Some(parent) = current {
            if parent == id {
                return true;
            }
            if !visited.insert(parent) {
                return false;
            }
            current = self.get(parent).and_then(|t| t.parent_id.as_deref());
        }
        false
    }

    fn detach(&mut self, parent_id: &str, child_id: &str) {
        if let Some(idx) = self.position(parent_id) {
            self.todos[idx].subtasks.retain(|s| s != child_id);
        }
    }

    fn save_todos(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.todos)?;
        self.storage.set(&self.options.todos_key, &json)
    }

    fn save_order(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.order)?;
        self.storage.set(&self.options.order_key, &json)
    }
}

impl<S: StorageAdapter> std::fmt::Debug for TodoStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoStore")
            .field("options", &self.options)
            .field("todos", &self.todos.len())
            .field("order", &self.order.len())
            .field("notifier", &self.notifier)
            .finish()
    }
}

/// Put records named in `order` first, in that sequence, then the rest in
/// their existing relative order.
pub fn apply_manual_order<'a>(records: Vec<&'a TodoRecord>, order: &[String]) -> Vec<&'a TodoRecord> {
    if order.is_empty() {
        return records;
    }

    let positions: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.as_str(), i))
        .collect();
    let mut placed = vec![false; records.len()];
    let mut out = Vec::with_capacity(records.len());

    for id in order {
        if let Some(&i) = positions.get(id.as_str())
            && !placed[i]
        {
            placed[i] = true;
            out.push(records[i]);
        }
    }
    out.extend(
        records
            .iter()
            .zip(&placed)
            .filter(|(_, done)| !**done)
            .map(|(r, _)| *r),
    );
    out
}

fn load_entry<T: DeserializeOwned + Default>(storage: &impl StorageAdapter, key: &str) -> T {
    match storage.get(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "malformed stored data, starting empty");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read stored data, starting empty");
            T::default()
        }
    }
}
