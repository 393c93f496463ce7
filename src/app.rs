use crate::api::{TodoApi, Transport};
use crate::error::AppError;
use crate::models::{Filter, NewTask, Stats, Task, TaskId, TaskUpdate};
use crate::view::{self, Node};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::ListState;
use tracing::{error, info, warn};

pub struct App<T> {
    api: TodoApi<T>,
    pub tasks: Vec<Task>,
    pub filter: Filter,
    pub view: Node,
    pub stats: Option<Stats>,
    pub state: ListState,
    pub task_detail: Option<Task>,
    pub input_mode: InputMode,
    pub active_input: ActiveInput,
    pub form: TaskForm,
    pub pending_delete: Option<TaskId>,
    pub alert: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    Insert,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ActiveInput {
    Title,
    Description,
}

/// Contents of the add/edit popup. `editing` is set when the form edits an existing task.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub editing: Option<TaskId>,
}

impl TaskForm {
    pub fn clear(&mut self) {
        *self = TaskForm::default();
    }
}

impl<T: Transport> App<T> {
    pub fn new(api: TodoApi<T>) -> App<T> {
        let filter = Filter::default();
        App {
            api,
            tasks: Vec::new(),
            filter,
            view: view::render(&[], filter),
            stats: None,
            state: ListState::default(),
            task_detail: None,
            input_mode: InputMode::Normal,
            active_input: ActiveInput::Title,
            form: TaskForm::default(),
            pending_delete: None,
            alert: None,
        }
    }

    /// Replaces the list with the server's copy. On failure the old list stays on screen.
    pub async fn load_tasks(&mut self) -> Result<(), AppError> {
        match self.api.list_tasks().await {
            Ok(tasks) => {
                info!(count = tasks.len(), "loaded tasks");
                self.tasks = tasks;
                self.rerender();
                Ok(())
            }
            Err(err) => {
                let err = AppError::from(err);
                self.notify("Failed to load tasks", &err);
                Err(err)
            }
        }
    }

    /// Counters are non-critical, failures only go to the log.
    pub async fn load_stats(&mut self) {
        match self.api.fetch_stats().await {
            Ok(stats) => self.stats = Some(stats),
            Err(err) => warn!(%err, "failed to load stats"),
        }
    }

    pub async fn add_task(&mut self, title: &str, description: &str) -> Result<(), AppError> {
        let new_task = match NewTask::from_input(title, description) {
            Ok(task) => task,
            Err(err) => {
                self.alert = Some(err.to_string());
                return Err(err);
            }
        };

        match self.api.create_task(&new_task).await {
            Ok(task) => {
                info!(id = %task.id, "created task");
                self.form.clear();
                self.reload().await;
                Ok(())
            }
            Err(err) => {
                let err = AppError::from(err);
                self.notify("Failed to add task", &err);
                Err(err)
            }
        }
    }

    pub async fn edit_task(
        &mut self,
        id: &TaskId,
        title: &str,
        description: &str,
    ) -> Result<(), AppError> {
        let previous = self
            .tasks
            .iter()
            .find(|task| &task.id == id)
            .and_then(|task| task.description.clone());
        let update = match TaskUpdate::content(title, description, previous.as_deref()) {
            Ok(update) => update,
            Err(err) => {
                self.alert = Some(err.to_string());
                return Err(err);
            }
        };

        match self.api.update_task(id, &update).await {
            Ok(_) => {
                info!(%id, "edited task");
                self.form.clear();
                self.reload().await;
                Ok(())
            }
            Err(err) => {
                let err = AppError::from(err);
                self.notify("Failed to update task", &err);
                Err(err)
            }
        }
    }

    /// Never optimistic: the list is reloaded even when the update fails,
    /// so the checkbox always shows what the server holds.
    pub async fn toggle_task(&mut self, id: &TaskId, completed: bool) -> Result<(), AppError> {
        match self
            .api
            .update_task(id, &TaskUpdate::completion(completed))
            .await
        {
            Ok(_) => {
                info!(%id, completed, "toggled task");
                self.reload().await;
                Ok(())
            }
            Err(err) => {
                let err = AppError::from(err);
                self.notify("Failed to update task", &err);
                let _ = self.load_tasks().await;
                Err(err)
            }
        }
    }

    /// Arms the delete confirmation. Nothing is sent until [`App::confirm_delete`].
    pub fn request_delete(&mut self, id: TaskId) {
        self.pending_delete = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub async fn confirm_delete(&mut self) -> Result<(), AppError> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(());
        };

        match self.api.delete_task(&id).await {
            Ok(()) => {
                info!(%id, "deleted task");
                if self.task_detail.as_ref().map_or(false, |t| t.id == id) {
                    self.task_detail = None;
                }
                self.reload().await;
                Ok(())
            }
            Err(err) => {
                let err = AppError::from(err);
                self.notify("Failed to delete task", &err);
                Err(err)
            }
        }
    }

    /// Client-side only; re-renders from the tasks already loaded.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.rerender();
    }

    pub async fn select_task(&mut self) -> Result<(), AppError> {
        let Some(id) = self.selected_task().map(|task| task.id.clone()) else {
            return Ok(());
        };
        match self.api.get_task(&id).await {
            Ok(task) => {
                self.task_detail = Some(task);
                Ok(())
            }
            Err(err) => {
                let err = AppError::from(err);
                self.notify("Failed to load task details", &err);
                Err(err)
            }
        }
    }

    /// Loads the list once and serialises it; a failed load is returned instead of stale markup.
    pub async fn snapshot_html(&mut self) -> Result<String, AppError> {
        self.load_tasks().await?;
        Ok(self.view.to_html())
    }

    pub async fn reload(&mut self) {
        // load_tasks surfaces its own failure.
        let _ = self.load_tasks().await;
        self.load_stats().await;
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| self.filter.matches(task))
            .collect()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let selected = self.state.selected()?;
        self.visible_tasks().get(selected).copied()
    }

    fn rerender(&mut self) {
        self.view = view::render(&self.tasks, self.filter);

        let len = self.visible_tasks().len();
        if len == 0 {
            self.state.select(None);
        } else {
            let index = self.state.selected().unwrap_or(0).min(len - 1);
            self.state.select(Some(index));
        }
    }

    fn notify(&mut self, context: &str, err: &AppError) {
        error!(%err, "{}", context);
        self.alert = Some(format!("{}: {}", context, err));
    }

    pub fn next(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn open_form(&mut self, task: Option<&Task>) {
        self.form = match task {
            Some(task) => TaskForm {
                title: task.title.clone(),
                description: task.description.clone().unwrap_or_default(),
                editing: Some(task.id.clone()),
            },
            None => TaskForm::default(),
        };
        self.active_input = ActiveInput::Title;
        self.input_mode = InputMode::Editing;
    }

    async fn submit_form(&mut self) {
        let title = self.form.title.clone();
        let description = self.form.description.clone();
        let result = match self.form.editing.clone() {
            Some(id) => self.edit_task(&id, &title, &description).await,
            None => self.add_task(&title, &description).await,
        };
        // A failed submit keeps the popup and its contents for another try.
        if result.is_ok() {
            self.input_mode = InputMode::Normal;
        }
    }

    /// Returns `true` when the user asked to quit.
    pub async fn handle_input(&mut self, key: KeyEvent) -> bool {
        if self.alert.is_some() {
            self.alert = None;
            return false;
        }

        if self.pending_delete.is_some() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    let _ = self.confirm_delete().await;
                }
                KeyCode::Char('n') | KeyCode::Esc => self.cancel_delete(),
                _ => {}
            }
            return false;
        }

        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => self.next(),
                KeyCode::Char('k') | KeyCode::Up => self.previous(),
                KeyCode::Char(' ') => {
                    if let Some((id, completed)) =
                        self.selected_task().map(|t| (t.id.clone(), t.completed))
                    {
                        let _ = self.toggle_task(&id, !completed).await;
                    }
                }
                KeyCode::Char('a') => self.open_form(None),
                KeyCode::Char('e') => {
                    if let Some(task) = self.selected_task().cloned() {
                        self.open_form(Some(&task));
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
                        self.request_delete(id);
                    }
                }
                KeyCode::Char('1') => self.set_filter(Filter::All),
                KeyCode::Char('2') => self.set_filter(Filter::Completed),
                KeyCode::Char('3') => self.set_filter(Filter::Pending),
                KeyCode::Char('r') => self.reload().await,
                KeyCode::Enter => {
                    let _ = self.select_task().await;
                }
                _ => {}
            },

            InputMode::Editing => match key.code {
                KeyCode::Char('i') => {
                    self.input_mode = InputMode::Insert;
                }
                KeyCode::Tab => {
                    self.active_input = match self.active_input {
                        ActiveInput::Title => ActiveInput::Description,
                        ActiveInput::Description => ActiveInput::Title,
                    };
                }
                KeyCode::Enter => self.submit_form().await,
                KeyCode::Esc => {
                    self.form.clear();
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },
            InputMode::Insert => match key.code {
                KeyCode::Char(c) => match self.active_input {
                    ActiveInput::Title => self.form.title.push(c),
                    ActiveInput::Description => self.form.description.push(c),
                },
                KeyCode::Backspace => match self.active_input {
                    ActiveInput::Title => {
                        self.form.title.pop();
                    }
                    ActiveInput::Description => {
                        self.form.description.pop();
                    }
                },
                KeyCode::Esc => {
                    self.input_mode = InputMode::Editing;
                }
                _ => {}
            },
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crossterm::event::KeyModifiers;
    use reqwest::Method;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Call = (Method, String, Option<Value>);

    #[derive(Default)]
    struct Remote {
        tasks: Vec<Value>,
        next_id: u64,
        calls: Vec<Call>,
        failing: Vec<(Method, String)>,
        offline: bool,
    }

    /// In-memory backend with the FastAPI route shapes. Clones share state.
    #[derive(Clone, Default)]
    struct FakeRemote(Rc<RefCell<Remote>>);

    impl FakeRemote {
        fn with_tasks(tasks: &[(u64, &str, bool)]) -> FakeRemote {
            let remote = FakeRemote::default();
            {
                let mut inner = remote.0.borrow_mut();
                for (id, title, completed) in tasks {
                    inner.tasks.push(json!({
                        "id": id,
                        "title": title,
                        "description": null,
                        "completed": completed,
                        "created_at": "2025-12-22 14:30:00"
                    }));
                }
                inner.next_id = tasks.iter().map(|t| t.0).max().unwrap_or(0) + 1;
            }
            remote
        }

        fn fail(&self, method: Method, path: &str) {
            self.0.borrow_mut().failing.push((method, path.to_string()));
        }

        fn set_offline(&self, offline: bool) {
            self.0.borrow_mut().offline = offline;
        }

        fn calls(&self) -> Vec<Call> {
            self.0.borrow().calls.clone()
        }

        fn clear_calls(&self) {
            self.0.borrow_mut().calls.clear();
        }

        fn count(&self, method: Method, path: &str) -> usize {
            self.calls()
                .iter()
                .filter(|(m, p, _)| *m == method && p == path)
                .count()
        }

        fn titles(&self) -> Vec<String> {
            self.0
                .borrow()
                .tasks
                .iter()
                .map(|t| t["title"].as_str().unwrap().to_string())
                .collect()
        }
    }

    fn not_found(id: &str) -> ApiError {
        ApiError::Server {
            status: 404,
            message: format!("ID {} not found", id),
        }
    }

    impl Transport for FakeRemote {
        async fn request(
            &self,
            method: Method,
            path: &str,
            body: Option<Value>,
        ) -> Result<Value, ApiError> {
            let mut inner = self.0.borrow_mut();
            inner
                .calls
                .push((method.clone(), path.to_string(), body.clone()));

            if inner.offline {
                return Err(ApiError::Network("connection refused".to_string()));
            }
            if inner
                .failing
                .iter()
                .any(|(m, p)| *m == method && p == path)
            {
                return Err(ApiError::Server {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                });
            }

            if method == Method::GET && path == "/todos" {
                return Ok(Value::Array(inner.tasks.clone()));
            }
            if method == Method::GET && path == "/health" {
                let total = inner.tasks.len();
                let completed = inner
                    .tasks
                    .iter()
                    .filter(|t| t["completed"] == json!(true))
                    .count();
                return Ok(json!({
                    "status": "healthy",
                    "total": total,
                    "completed": completed,
                    "pending": total - completed
                }));
            }
            if method == Method::POST && path == "/todos" {
                let body = body.unwrap_or_default();
                let task = json!({
                    "id": inner.next_id,
                    "title": body["title"],
                    "description": body["description"],
                    "completed": false,
                    "created_at": "2025-12-23 09:00:00"
                });
                inner.next_id += 1;
                inner.tasks.push(task.clone());
                return Ok(task);
            }

            let id = path.strip_prefix("/todos/").ok_or_else(|| not_found(path))?;
            let pos = inner
                .tasks
                .iter()
                .position(|t| t["id"].to_string() == id)
                .ok_or_else(|| not_found(id))?;
            if method == Method::GET {
                Ok(inner.tasks[pos].clone())
            } else if method == Method::PUT {
                if let Some(Value::Object(fields)) = body {
                    // FastAPI's update skips fields sent as null.
                    for (key, value) in fields.into_iter().filter(|(_, v)| !v.is_null()) {
                        inner.tasks[pos][key.as_str()] = value;
                    }
                }
                Ok(inner.tasks[pos].clone())
            } else if method == Method::DELETE {
                inner.tasks.remove(pos);
                Ok(Value::Null)
            } else {
                Err(not_found(id))
            }
        }
    }

    async fn loaded_app(remote: &FakeRemote) -> App<FakeRemote> {
        let mut app = App::new(TodoApi::new(remote.clone()));
        app.reload().await;
        remote.clear_calls();
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_load_tasks_replaces_list_and_renders() {
        let remote = FakeRemote::with_tasks(&[(1, "Write report", false), (2, "Pay rent", true)]);
        let mut app = App::new(TodoApi::new(remote.clone()));

        app.load_tasks().await.unwrap();
        assert_eq!(app.tasks.len(), 2);
        assert_eq!(app.view.find_by_class("todo-item").len(), 2);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_view_and_alerts() {
        let remote = FakeRemote::with_tasks(&[(1, "Write report", false)]);
        let mut app = loaded_app(&remote).await;
        let before = app.view.clone();

        remote.set_offline(true);
        assert!(app.load_tasks().await.is_err());
        assert_eq!(app.view, before);
        assert_eq!(app.tasks.len(), 1);
        assert!(app.alert.as_deref().unwrap().starts_with("Failed to load tasks"));
    }

    #[tokio::test]
    async fn test_stats_failure_is_not_surfaced() {
        let remote = FakeRemote::with_tasks(&[(1, "a", true), (2, "b", false)]);
        let mut app = loaded_app(&remote).await;
        let stats = app.stats.clone().unwrap();
        assert_eq!((stats.total, stats.completed, stats.pending), (2, 1, 1));
        assert_eq!(stats.status.as_deref(), Some("healthy"));

        remote.fail(Method::GET, "/health");
        app.load_stats().await;
        assert!(app.alert.is_none());
        assert_eq!(app.stats, Some(stats));
    }

    #[tokio::test]
    async fn test_add_with_empty_title_sends_nothing() {
        let remote = FakeRemote::with_tasks(&[(1, "a", false)]);
        let mut app = loaded_app(&remote).await;

        let result = app.add_task("", "").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(remote.calls().is_empty());
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.alert.as_deref(), Some("Task title cannot be empty."));
    }

    #[tokio::test]
    async fn test_add_sends_null_description_then_reloads_once() {
        let remote = FakeRemote::default();
        let mut app = loaded_app(&remote).await;
        app.form.title = "Buy milk".to_string();

        app.add_task("Buy milk", "").await.unwrap();

        let calls = remote.calls();
        assert_eq!(calls[0].0, Method::POST);
        assert_eq!(calls[0].1, "/todos");
        assert_eq!(
            calls[0].2,
            Some(json!({"title": "Buy milk", "description": null}))
        );
        assert_eq!(remote.count(Method::GET, "/todos"), 1);
        assert_eq!(remote.count(Method::GET, "/health"), 1);
        assert_eq!(app.form, TaskForm::default());
        assert_eq!(app.tasks[0].title, "Buy milk");
        assert_eq!(app.tasks[0].description, None);
    }

    #[tokio::test]
    async fn test_add_failure_keeps_form_populated() {
        let remote = FakeRemote::default();
        let mut app = loaded_app(&remote).await;
        remote.fail(Method::POST, "/todos");

        app.form.title = "Buy milk".to_string();
        app.form.description = "oat".to_string();
        assert!(app.add_task("Buy milk", "oat").await.is_err());

        assert_eq!(app.form.title, "Buy milk");
        assert_eq!(app.form.description, "oat");
        assert_eq!(remote.count(Method::GET, "/todos"), 0);
        assert!(app.alert.is_some());
    }

    #[tokio::test]
    async fn test_toggle_sends_only_completed() {
        let remote = FakeRemote::with_tasks(&[(5, "a", false)]);
        let mut app = loaded_app(&remote).await;

        app.toggle_task(&TaskId::Number(5), true).await.unwrap();

        let calls = remote.calls();
        assert_eq!(calls[0].0, Method::PUT);
        assert_eq!(calls[0].1, "/todos/5");
        assert_eq!(calls[0].2, Some(json!({"completed": true})));
        assert_eq!(remote.count(Method::GET, "/todos"), 1);
        assert_eq!(remote.count(Method::GET, "/health"), 1);
        assert!(app.tasks[0].completed);
    }

    #[tokio::test]
    async fn test_toggle_failure_still_reloads_list_once() {
        let remote = FakeRemote::with_tasks(&[(5, "a", false)]);
        let mut app = loaded_app(&remote).await;
        remote.fail(Method::PUT, "/todos/5");

        assert!(app.toggle_task(&TaskId::Number(5), true).await.is_err());

        assert_eq!(remote.count(Method::GET, "/todos"), 1);
        assert_eq!(remote.count(Method::GET, "/health"), 0);
        assert!(!app.tasks[0].completed);
        assert!(app.alert.as_deref().unwrap().starts_with("Failed to update task"));
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let remote = FakeRemote::with_tasks(&[(3, "a", false)]);
        let mut app = loaded_app(&remote).await;

        app.request_delete(TaskId::Number(3));
        app.cancel_delete();
        app.confirm_delete().await.unwrap();
        assert!(remote.calls().is_empty());

        app.request_delete(TaskId::Number(3));
        app.confirm_delete().await.unwrap();
        assert_eq!(remote.count(Method::DELETE, "/todos/3"), 1);
        assert_eq!(remote.count(Method::GET, "/todos"), 1);
        assert!(app.tasks.is_empty());
        assert_eq!(app.view.find_by_class("empty-state").len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_state() {
        let remote = FakeRemote::with_tasks(&[(3, "a", false)]);
        let mut app = loaded_app(&remote).await;
        remote.fail(Method::DELETE, "/todos/3");

        app.request_delete(TaskId::Number(3));
        assert!(app.confirm_delete().await.is_err());
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(remote.count(Method::GET, "/todos"), 0);
        assert!(app.pending_delete.is_none());
        assert!(app.alert.is_some());
    }

    #[tokio::test]
    async fn test_set_filter_rerenders_without_request() {
        let remote = FakeRemote::with_tasks(&[(1, "a", false), (2, "b", true)]);
        let mut app = loaded_app(&remote).await;

        app.set_filter(Filter::Completed);
        assert_eq!(app.view.find_by_class("todo-item").len(), 1);
        assert_eq!(app.selected_task().unwrap().title, "b");

        app.set_filter(Filter::Pending);
        assert_eq!(app.selected_task().unwrap().title, "a");
        assert_eq!(app.tasks.len(), 2);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reloading_unchanged_collection_renders_identically() {
        let remote = FakeRemote::with_tasks(&[(1, "a", false), (2, "<b>", true)]);
        let mut app = App::new(TodoApi::new(remote.clone()));

        app.load_tasks().await.unwrap();
        let first = app.view.clone();
        app.load_tasks().await.unwrap();
        assert_eq!(app.view, first);
        assert_eq!(app.view.to_html(), first.to_html());
    }

    #[tokio::test]
    async fn test_edit_task_updates_title_and_description() {
        let remote = FakeRemote::with_tasks(&[(1, "Draft", false)]);
        let mut app = loaded_app(&remote).await;

        app.edit_task(&TaskId::Number(1), " Final ", "with notes")
            .await
            .unwrap();
        assert_eq!(
            remote.calls()[0].2,
            Some(json!({"title": "Final", "description": "with notes"}))
        );
        assert_eq!(remote.titles(), ["Final"]);
        assert_eq!(app.tasks[0].description.as_deref(), Some("with notes"));

        remote.clear_calls();
        assert!(app.edit_task(&TaskId::Number(1), "", "x").await.is_err());
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_select_task_fetches_detail() {
        let remote = FakeRemote::with_tasks(&[(1, "a", false), (2, "b", false)]);
        let mut app = loaded_app(&remote).await;

        app.next();
        app.select_task().await.unwrap();
        assert_eq!(remote.count(Method::GET, "/todos/2"), 1);
        assert_eq!(app.task_detail.as_ref().unwrap().title, "b");
    }

    #[tokio::test]
    async fn test_select_task_failure_keeps_previous_detail() {
        let remote = FakeRemote::with_tasks(&[(1, "a", false), (2, "b", false)]);
        let mut app = loaded_app(&remote).await;

        app.next();
        app.select_task().await.unwrap();
        let before = app.task_detail.clone();

        remote.fail(Method::GET, "/todos/2");
        assert!(app.select_task().await.is_err());
        assert_eq!(app.task_detail, before);
        assert!(app
            .alert
            .as_deref()
            .unwrap()
            .starts_with("Failed to load task details"));
    }

    #[tokio::test]
    async fn test_edit_task_clears_existing_description() {
        let remote = FakeRemote::with_tasks(&[(1, "Draft", false)]);
        let mut app = loaded_app(&remote).await;
        app.edit_task(&TaskId::Number(1), "Draft", "old notes")
            .await
            .unwrap();
        assert_eq!(app.tasks[0].description.as_deref(), Some("old notes"));

        remote.clear_calls();
        app.edit_task(&TaskId::Number(1), "Draft", "  ").await.unwrap();

        assert_eq!(
            remote.calls()[0].2,
            Some(json!({"title": "Draft", "description": ""}))
        );
        assert_eq!(app.tasks[0].description.as_deref(), Some(""));
        assert!(app.view.find_by_class("todo-description").is_empty());
        assert!(app.alert.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_html_renders_loaded_list() {
        let remote = FakeRemote::with_tasks(&[(1, "<b>bold</b>", false)]);
        let mut app = App::new(TodoApi::new(remote.clone()));

        let html = app.snapshot_html().await.unwrap();
        assert!(html.contains("data-id=\"1\""));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
    }

    #[tokio::test]
    async fn test_snapshot_html_fails_instead_of_printing_stale_markup() {
        let remote = FakeRemote::with_tasks(&[(1, "a", false)]);
        let mut app = App::new(TodoApi::new(remote.clone()));
        remote.fail(Method::GET, "/todos");

        let err = app.snapshot_html().await.unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::Server { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_navigation_on_empty_list_is_noop() {
        let remote = FakeRemote::default();
        let mut app = loaded_app(&remote).await;
        app.next();
        app.previous();
        assert_eq!(app.state.selected(), None);
        assert!(app.selected_task().is_none());
    }

    #[tokio::test]
    async fn test_keys_drive_delete_confirmation() {
        let remote = FakeRemote::with_tasks(&[(3, "a", false)]);
        let mut app = loaded_app(&remote).await;

        app.handle_input(key(KeyCode::Char('d'))).await;
        assert_eq!(app.pending_delete, Some(TaskId::Number(3)));
        app.handle_input(key(KeyCode::Char('n'))).await;
        assert!(remote.calls().is_empty());

        app.handle_input(key(KeyCode::Char('d'))).await;
        app.handle_input(key(KeyCode::Char('y'))).await;
        assert_eq!(remote.count(Method::DELETE, "/todos/3"), 1);
    }

    #[tokio::test]
    async fn test_keys_add_task_through_form() {
        let remote = FakeRemote::default();
        let mut app = loaded_app(&remote).await;

        app.handle_input(key(KeyCode::Char('a'))).await;
        app.handle_input(key(KeyCode::Char('i'))).await;
        for c in "Buy milk".chars() {
            app.handle_input(key(KeyCode::Char(c))).await;
        }
        app.handle_input(key(KeyCode::Esc)).await;
        app.handle_input(key(KeyCode::Enter)).await;

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(remote.titles(), ["Buy milk"]);
        assert_eq!(app.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_submit_keeps_form_open_and_alert_dismisses() {
        let remote = FakeRemote::default();
        let mut app = loaded_app(&remote).await;

        app.handle_input(key(KeyCode::Char('a'))).await;
        app.handle_input(key(KeyCode::Enter)).await;
        assert_eq!(app.input_mode, InputMode::Editing);
        assert!(app.alert.is_some());
        assert!(remote.calls().is_empty());

        app.handle_input(key(KeyCode::Char('x'))).await;
        assert!(app.alert.is_none());
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[tokio::test]
    async fn test_space_toggles_selected_task() {
        let remote = FakeRemote::with_tasks(&[(1, "a", false)]);
        let mut app = loaded_app(&remote).await;

        app.handle_input(key(KeyCode::Char(' '))).await;
        assert_eq!(remote.calls()[0].2, Some(json!({"completed": true})));
        assert!(app.tasks[0].completed);
    }
}
