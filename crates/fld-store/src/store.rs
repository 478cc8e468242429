use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use fld_codec::{CodecResult, FieldCodec};
use fld_log::{FileLog, LineLog, LogResult, StorageState};
use fld_types::Field;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::gate::{Readiness, ReadinessGate};
use crate::logger::{NoopLogger, StoreLogger};

/// Outcome of the last successful load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// The log did not exist and was created empty.
    pub created: bool,
    /// Lines in the file, blank ones included.
    pub total_lines: usize,
    /// Blank lines skipped.
    pub blank: usize,
    /// Records now in memory.
    pub loaded: usize,
    /// Lines dropped because they did not decode.
    pub failed: usize,
    /// Records dropped because an earlier line already used the name.
    pub duplicates: usize,
}

/// State guarded by the store lock.
#[derive(Default)]
struct State {
    fields: Vec<Field>,
    report: Option<LoadReport>,
}

struct Inner {
    log: Arc<dyn LineLog>,
    config: StoreConfig,
    logger: Arc<dyn StoreLogger>,
    gate: ReadinessGate,
    /// Single serialization point for the in-memory fields and the log.
    state: Arc<Mutex<State>>,
}

/// Durable, insertion-ordered collection of [`Field`]s.
///
/// Cheap to clone; clones share the same store. All operations take one
/// internal lock, so reads never observe a half-applied mutation and log
/// writes never interleave.
///
/// Mutations and reloads run on their own spawned task. Dropping the future
/// returned by [`add`](Self::add), [`remove`](Self::remove) or
/// [`reload`](Self::reload) stops the wait, not the work.
#[derive(Clone)]
pub struct FieldStore {
    inner: Arc<Inner>,
}

impl FieldStore {
    /// Open the store backed by the file at `path` with default settings.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Open the store backed by the file at `path`.
    pub fn open_with_config(path: impl Into<PathBuf>, config: StoreConfig) -> Self {
        let log = FileLog::new(path, config.log_config());
        Self::with_log(Arc::new(log), config, Arc::new(NoopLogger))
    }

    /// Open a store over any log backend, reporting to `logger`.
    ///
    /// Returns at once; initialization continues in the background. Use
    /// [`await_ready`](Self::await_ready) to wait for it.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_log(
        log: Arc<dyn LineLog>,
        config: StoreConfig,
        logger: Arc<dyn StoreLogger>,
    ) -> Self {
        logger.info(
            &format!("opening field store at {}", log.location()),
            None,
        );

        let state = Arc::new(Mutex::new(State::default()));
        // Taken before the store is shared, so initialization runs before any
        // other lock holder.
        let guard = Arc::clone(&state)
            .try_lock_owned()
            .expect("new store lock is free");

        let inner = Arc::new(Inner {
            log,
            config,
            logger,
            gate: ReadinessGate::new(),
            state,
        });

        let task_inner = Arc::clone(&inner);
        tokio::spawn(async move {
            let mut state = guard;
            // The outcome is published through the gate.
            let _ = task_inner.initialize(&mut state).await;
        });

        Self { inner }
    }

    /// Wait for initialization to finish.
    ///
    /// No timeout is applied; wrap the call in `tokio::time::timeout` if
    /// needed. Returns [`StoreError::InitFailed`] if loading failed.
    pub async fn await_ready(&self) -> StoreResult<()> {
        match self.inner.gate.wait().await {
            Readiness::Ready => Ok(()),
            Readiness::Failed(reason) => Err(StoreError::InitFailed(reason)),
            state @ Readiness::Uninitialized => Err(StoreError::NotReady(state)),
        }
    }

    /// Current lifecycle state.
    pub fn readiness(&self) -> Readiness {
        self.inner.gate.current()
    }

    pub fn is_ready(&self) -> bool {
        self.readiness() == Readiness::Ready
    }

    /// Human-readable location of the backing log.
    pub fn location(&self) -> String {
        self.inner.log.location()
    }

    /// Copy of every field, in insertion order.
    pub async fn list(&self) -> StoreResult<Vec<Field>> {
        self.inner.check_ready("list")?;
        let state = self.inner.state.lock().await;
        self.inner.check_ready("list")?;

        self.inner
            .logger
            .debug(&format!("listing {} fields", state.fields.len()), None);
        Ok(state.fields.clone())
    }

    /// Look up a field by name, ignoring case.
    pub async fn get(&self, name: &str) -> StoreResult<Option<Field>> {
        self.inner.check_ready("get")?;
        let state = self.inner.state.lock().await;
        self.inner.check_ready("get")?;
        Ok(state.fields.iter().find(|f| f.is_named(name)).cloned())
    }

    /// Summary of the last successful load, if the store is ready.
    pub async fn load_report(&self) -> Option<LoadReport> {
        if !self.is_ready() {
            return None;
        }
        self.inner.state.lock().await.report
    }

    /// Add a field.
    ///
    /// Fails with [`StoreError::Validation`] for a blank name or value,
    /// [`StoreError::DuplicateName`] if the name is taken (ignoring case) and
    /// [`StoreError::Io`] if the log append fails. On any failure the store is
    /// unchanged.
    pub async fn add(&self, field: Field) -> StoreResult<()> {
        self.inner.check_ready("add")?;
        let inner = Arc::clone(&self.inner);
        detached(async move { inner.add(field).await }).await
    }

    /// Remove the field whose name matches `name` exactly, returning it.
    ///
    /// The log is rewritten without the field before memory changes, so a
    /// failed rewrite leaves both untouched.
    pub async fn remove(&self, name: &str) -> StoreResult<Field> {
        self.inner.check_ready("remove")?;
        let inner = Arc::clone(&self.inner);
        let name = name.to_string();
        detached(async move { inner.remove(name).await }).await
    }

    /// Discard the in-memory view and load the log again.
    ///
    /// Picks up edits made to the file outside this store. Also the only way
    /// out of the `Failed` state.
    pub async fn reload(&self) -> StoreResult<()> {
        let inner = Arc::clone(&self.inner);
        detached(async move {
            let mut state = inner.state.lock().await;
            inner.logger.info("reloading field store", None);
            inner.initialize(&mut state).await
        })
        .await
    }
}

impl fmt::Debug for FieldStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldStore")
            .field("location", &self.location())
            .field("readiness", &self.readiness())
            .finish()
    }
}

/// Run `fut` on its own task so that dropping the caller does not cancel it.
async fn detached<T, F>(fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

impl Inner {
    fn check_ready(&self, operation: &str) -> StoreResult<()> {
        match self.gate.current() {
            Readiness::Ready => Ok(()),
            state => {
                self.logger.warning(
                    &format!("{operation} attempted while store is {state}"),
                    None,
                );
                Err(StoreError::NotReady(state))
            }
        }
    }

    /// Run a log operation on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&dyn LineLog) -> LogResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let log = Arc::clone(&self.log);
        tokio::task::spawn_blocking(move || op(log.as_ref()))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
            .map_err(StoreError::from)
    }

    /// Reset to `Uninitialized` and load the log into `state`.
    ///
    /// Caller holds the store lock.
    async fn initialize(&self, state: &mut State) -> StoreResult<()> {
        let started = Instant::now();
        self.gate.set(Readiness::Uninitialized);
        state.fields.clear();
        state.report = None;

        self.logger.debug(
            &format!("loading fields from {}", self.log.location()),
            None,
        );

        match self.load().await {
            Ok((fields, report)) => {
                state.fields = fields;
                state.report = Some(report);
                self.gate.set(Readiness::Ready);
                self.logger.info(
                    &format!(
                        "field store ready in {}ms: {} loaded, {} failed, {} duplicate, {} lines{}",
                        started.elapsed().as_millis(),
                        report.loaded,
                        report.failed,
                        report.duplicates,
                        report.total_lines,
                        if report.created { " (new file)" } else { "" },
                    ),
                    None,
                );
                Ok(())
            }
            Err(e) => {
                self.logger.critical(
                    &format!(
                        "field store initialization failed after {}ms",
                        started.elapsed().as_millis()
                    ),
                    Some(&e),
                );
                self.gate.set(Readiness::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn load(&self) -> StoreResult<(Vec<Field>, LoadReport)> {
        let (storage, lines) = self
            .blocking(|log| {
                let storage = log.ensure_ready()?;
                if storage == StorageState::Created {
                    return Ok((storage, Vec::new()));
                }
                Ok((storage, log.read_all_lines()?))
            })
            .await?;

        let mut report = LoadReport {
            created: storage == StorageState::Created,
            total_lines: lines.len(),
            ..LoadReport::default()
        };
        if report.created {
            self.logger.warning(
                &format!("no field log found, created {}", self.log.location()),
                None,
            );
        }

        let mut fields: Vec<Field> = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            let line_no = index + 1;
            if line.trim().is_empty() {
                report.blank += 1;
                continue;
            }
            match FieldCodec::decode(line) {
                Ok(field) if fields.iter().any(|f| f.is_named(&field.name)) => {
                    report.duplicates += 1;
                    self.logger.warning(
                        &format!("line {line_no}: duplicate field {:?} ignored", field.name),
                        None,
                    );
                }
                Ok(field) => fields.push(field),
                Err(e) => {
                    report.failed += 1;
                    self.logger
                        .error(&format!("line {line_no}: unreadable record skipped"), Some(&e));
                    self.logger
                        .debug(&format!("line {line_no} content: {line:?}"), None);
                }
            }
        }

        report.loaded = fields.len();
        Ok((fields, report))
    }

    async fn add(&self, field: Field) -> StoreResult<()> {
        // Memory must hold what a restart would decode.
        let field = field.normalized();
        self.logger.info(&format!("adding field {:?}", field.name), None);

        if let Err(e) = field.validate(self.config.max_name_len) {
            self.logger.warning("field rejected", Some(&e));
            return Err(e.into());
        }

        let mut state = self.state.lock().await;
        self.check_ready("add")?;

        if let Some(existing) = state.fields.iter().find(|f| f.is_named(&field.name)) {
            self.logger.warning(
                &format!(
                    "field {:?} rejected: {:?} already exists",
                    field.name, existing.name
                ),
                None,
            );
            return Err(StoreError::DuplicateName { name: field.name });
        }

        let line = FieldCodec::encode(&field)?;
        let started = Instant::now();
        if let Err(e) = self.blocking(move |log| log.append_line(&line)).await {
            self.logger
                .error(&format!("failed to append field {:?}", field.name), Some(&e));
            return Err(e);
        }

        self.logger.info(
            &format!(
                "field {:?} added in {}ms",
                field.name,
                started.elapsed().as_millis()
            ),
            None,
        );
        state.fields.push(field);
        Ok(())
    }

    async fn remove(&self, name: String) -> StoreResult<Field> {
        self.logger.info(&format!("removing field {name:?}"), None);

        let mut state = self.state.lock().await;
        self.check_ready("remove")?;

        let Some(index) = state.fields.iter().position(|f| f.name == name) else {
            self.logger
                .warning(&format!("field {name:?} not found"), None);
            return Err(StoreError::NotFound { name });
        };

        // Build the new state, make it durable, then swap it in.
        let mut remaining = state.fields.clone();
        let removed = remaining.remove(index);
        let lines = remaining
            .iter()
            .map(FieldCodec::encode)
            .collect::<CodecResult<Vec<String>>>()?;

        let started = Instant::now();
        if let Err(e) = self.blocking(move |log| log.rewrite_all(&lines)).await {
            self.logger.error(
                &format!("failed to rewrite log without field {name:?}; nothing changed"),
                Some(&e),
            );
            return Err(e);
        }

        state.fields = remaining;
        self.logger.info(
            &format!(
                "field {name:?} removed in {}ms, {} left",
                started.elapsed().as_millis(),
                state.fields.len()
            ),
            None,
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use fld_log::{InMemoryLog, LogError};
    use fld_types::FieldError;

    use super::*;
    use crate::logger::LogLevel;

    #[derive(Default)]
    struct CapturingLogger {
        entries: StdMutex<Vec<(LogLevel, String)>>,
    }

    impl CapturingLogger {
        fn count(&self, level: LogLevel, needle: &str) -> usize {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, m)| *l == level && m.contains(needle))
                .count()
        }
    }

    impl StoreLogger for CapturingLogger {
        fn log(&self, level: LogLevel, message: &str, _error: Option<&dyn Error>) {
            self.entries
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        }
    }

    fn field(name: &str, value: &str) -> Field {
        Field::new(name, value)
    }

    fn names(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    fn data_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_owned)
            .collect()
    }

    async fn open_ready(path: &Path) -> FieldStore {
        let store = FieldStore::open(path);
        store.await_ready().await.unwrap();
        store
    }

    fn memory_store(log: Arc<InMemoryLog>) -> FieldStore {
        FieldStore::with_log(log, StoreConfig::default(), Arc::new(NoopLogger))
    }

    #[tokio::test]
    async fn new_file_is_created_and_ready_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fields.jsonl");

        let store = open_ready(&path).await;
        assert!(path.is_file());
        assert!(store.list().await.unwrap().is_empty());

        let report = store.load_report().await.unwrap();
        assert!(report.created);
        assert_eq!(report.loaded, 0);
    }

    #[tokio::test]
    async fn operations_fail_fast_before_ready() {
        let store = memory_store(Arc::new(InMemoryLog::new()));

        // The initialization task has not run yet on this single-threaded runtime.
        assert_eq!(store.readiness(), Readiness::Uninitialized);
        assert!(matches!(
            store.list().await,
            Err(StoreError::NotReady(Readiness::Uninitialized))
        ));
        assert!(matches!(
            store.add(field("a", "1")).await,
            Err(StoreError::NotReady(_))
        ));
        assert!(matches!(
            store.remove("a").await,
            Err(StoreError::NotReady(_))
        ));

        store.await_ready().await.unwrap();
        assert!(store.is_ready());
        store.add(field("a", "1")).await.unwrap();
    }

    #[tokio::test]
    async fn adds_are_listed_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        let store = open_ready(&path).await;

        for name in ["zeta", "alpha", "Mid", "beta"] {
            store.add(field(name, "v")).await.unwrap();
        }

        let listed = store.list().await.unwrap();
        assert_eq!(names(&listed), vec!["zeta", "alpha", "Mid", "beta"]);
        assert_eq!(data_lines(&path).len(), 4);
    }

    #[tokio::test]
    async fn list_returns_a_copy() {
        let store = memory_store(Arc::new(InMemoryLog::new()));
        store.await_ready().await.unwrap();
        store.add(field("a", "1")).await.unwrap();

        let mut copy = store.list().await.unwrap();
        copy.clear();
        copy.push(field("intruder", "x"));

        assert_eq!(names(&store.list().await.unwrap()), vec!["a"]);
    }

    #[tokio::test]
    async fn duplicate_name_differing_in_case_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        let store = open_ready(&path).await;

        store.add(field("Host", "a")).await.unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let err = store.add(field("hOST", "b")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName { ref name } if name == "hOST"));

        assert_eq!(store.list().await.unwrap(), vec![field("Host", "a")]);
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn invalid_fields_are_rejected() {
        let log = Arc::new(InMemoryLog::new());
        let store = memory_store(Arc::clone(&log));
        store.await_ready().await.unwrap();

        assert!(matches!(
            store.add(field("  ", "v")).await,
            Err(StoreError::Validation(FieldError::EmptyName))
        ));
        assert!(matches!(
            store.add(field("k", "")).await,
            Err(StoreError::Validation(FieldError::EmptyValue { .. }))
        ));
        assert!(matches!(
            store.add(field(&"n".repeat(101), "v")).await,
            Err(StoreError::Validation(FieldError::NameTooLong { .. }))
        ));
        assert!(log.lines().is_empty());
    }

    #[tokio::test]
    async fn max_name_len_is_configurable() {
        let config = StoreConfig {
            max_name_len: 4,
            ..StoreConfig::default()
        };
        let store = FieldStore::with_log(
            Arc::new(InMemoryLog::new()),
            config,
            Arc::new(NoopLogger),
        );
        store.await_ready().await.unwrap();

        store.add(field("four", "v")).await.unwrap();
        assert!(matches!(
            store.add(field("fives", "v")).await,
            Err(StoreError::Validation(FieldError::NameTooLong { len: 5, max: 4 }))
        ));
    }

    #[tokio::test]
    async fn added_field_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");

        let store = open_ready(&path).await;
        let motd = field("motd", "line one\nline two").with_comment("multi-line");
        store.add(field("host", "db.local")).await.unwrap();
        store.add(motd.clone()).await.unwrap();
        drop(store);

        let restarted = open_ready(&path).await;
        let listed = restarted.list().await.unwrap();
        assert_eq!(listed, vec![field("host", "db.local"), motd]);
        assert!(!restarted.load_report().await.unwrap().created);
    }

    #[tokio::test]
    async fn empty_comment_matches_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");

        let store = open_ready(&path).await;
        let bare = Field {
            comment: Some(String::new()),
            ..field("host", "db.local")
        };
        store.add(bare).await.unwrap();
        let before = store.list().await.unwrap();
        assert_eq!(before, vec![field("host", "db.local")]);
        drop(store);

        let restarted = open_ready(&path).await;
        assert_eq!(restarted.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn add_after_unterminated_last_line_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        fs::write(&path, r#"{"Name":"a","Value":"1","Comment":""}"#).unwrap();

        let store = open_ready(&path).await;
        store.add(field("b", "2")).await.unwrap();
        assert_eq!(names(&store.list().await.unwrap()), vec!["a", "b"]);
        drop(store);

        let restarted = open_ready(&path).await;
        assert_eq!(names(&restarted.list().await.unwrap()), vec!["a", "b"]);
        let report = restarted.load_report().await.unwrap();
        assert_eq!(report.loaded, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(data_lines(&path).len(), 2);
    }

    #[tokio::test]
    async fn failed_append_leaves_memory_untouched() {
        let log = Arc::new(InMemoryLog::new());
        let store = memory_store(Arc::clone(&log));
        store.await_ready().await.unwrap();
        store.add(field("a", "1")).await.unwrap();

        log.set_read_only(true);
        let err = store.add(field("b", "2")).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(LogError::ReadOnly)));
        assert_eq!(names(&store.list().await.unwrap()), vec!["a"]);

        // The store stays usable once writes work again.
        log.set_read_only(false);
        store.add(field("b", "2")).await.unwrap();
        assert_eq!(names(&store.list().await.unwrap()), vec!["a", "b"]);
        assert_eq!(log.lines().len(), 2);
    }

    #[tokio::test]
    async fn unwritable_file_fails_add_with_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        let store = open_ready(&path).await;
        store.add(field("a", "1")).await.unwrap();

        // Swap the log for a directory: opening it for append now fails.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let err = store.add(field("b", "2")).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(ref e) if e.is_io()));
        assert_eq!(names(&store.list().await.unwrap()), vec!["a"]);
    }

    #[tokio::test]
    async fn remove_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        let store = open_ready(&path).await;
        for name in ["A", "B", "C"] {
            store.add(field(name, "v")).await.unwrap();
        }

        let removed = store.remove("B").await.unwrap();
        assert_eq!(removed.name, "B");
        assert_eq!(names(&store.list().await.unwrap()), vec!["A", "C"]);

        let fresh = open_ready(&path).await;
        assert_eq!(names(&fresh.list().await.unwrap()), vec!["A", "C"]);
        assert_eq!(data_lines(&path).len(), 2);
    }

    #[tokio::test]
    async fn remove_requires_exact_name() {
        let store = memory_store(Arc::new(InMemoryLog::new()));
        store.await_ready().await.unwrap();
        store.add(field("Host", "v")).await.unwrap();

        let err = store.remove("host").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref name } if name == "host"));
        assert_eq!(names(&store.list().await.unwrap()), vec!["Host"]);
    }

    #[tokio::test]
    async fn failed_rewrite_keeps_order_and_content() {
        let log = Arc::new(InMemoryLog::new());
        let store = memory_store(Arc::clone(&log));
        store.await_ready().await.unwrap();
        for name in ["A", "B", "C"] {
            store.add(field(name, "v")).await.unwrap();
        }

        log.set_read_only(true);
        assert!(matches!(
            store.remove("B").await,
            Err(StoreError::Io(LogError::ReadOnly))
        ));
        assert_eq!(names(&store.list().await.unwrap()), vec!["A", "B", "C"]);
        assert_eq!(log.lines().len(), 3);
    }

    #[tokio::test]
    async fn failed_file_rewrite_keeps_disk_and_memory_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        let store = open_ready(&path).await;
        for name in ["A", "B", "C"] {
            store.add(field(name, "v")).await.unwrap();
        }

        // A non-empty directory at the log path blocks the final rename.
        let saved = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), b"x").unwrap();

        assert!(matches!(store.remove("B").await, Err(StoreError::Io(_))));
        assert_eq!(names(&store.list().await.unwrap()), vec!["A", "B", "C"]);

        fs::remove_dir_all(&path).unwrap();
        fs::write(&path, saved).unwrap();
        store.remove("B").await.unwrap();
        assert_eq!(data_lines(&path).len(), 2);
    }

    #[tokio::test]
    async fn malformed_line_is_skipped_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        let content = [
            r#"{"Name":"a","Value":"1","Comment":""}"#,
            "",
            r#"{"Name":"b","Value":"#,
            r#"{"Name":"c","Value":"3","Comment":"third"}"#,
            "   ",
            r#"{"Name":"d","Value":"4","Comment":""}"#,
        ]
        .join("\n");
        fs::write(&path, content).unwrap();

        let logger = Arc::new(CapturingLogger::default());
        let store = FieldStore::with_log(
            Arc::new(FileLog::new(&path, Default::default())),
            StoreConfig::default(),
            logger.clone(),
        );
        store.await_ready().await.unwrap();

        assert_eq!(names(&store.list().await.unwrap()), vec!["a", "c", "d"]);
        let report = store.load_report().await.unwrap();
        assert_eq!(report.loaded, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.blank, 2);
        assert_eq!(report.total_lines, 6);

        assert_eq!(logger.count(LogLevel::Error, "unreadable record"), 1);
        assert_eq!(logger.count(LogLevel::Info, "3 loaded, 1 failed"), 1);
    }

    #[tokio::test]
    async fn duplicate_lines_in_file_keep_first() {
        let log = Arc::new(InMemoryLog::with_lines([
            r#"{"Name":"Host","Value":"first"}"#,
            r#"{"Name":"HOST","Value":"second"}"#,
        ]));
        let store = memory_store(log);
        store.await_ready().await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec![field("Host", "first")]);
        assert_eq!(store.load_report().await.unwrap().duplicates, 1);
    }

    #[tokio::test]
    async fn init_failure_is_surfaced_and_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        let path = blocker.join("fields.jsonl");

        let logger = Arc::new(CapturingLogger::default());
        let store = FieldStore::with_log(
            Arc::new(FileLog::new(&path, Default::default())),
            StoreConfig::default(),
            logger.clone(),
        );

        assert!(matches!(store.await_ready().await, Err(StoreError::InitFailed(_))));
        assert!(matches!(store.readiness(), Readiness::Failed(_)));
        assert!(matches!(
            store.list().await,
            Err(StoreError::NotReady(Readiness::Failed(_)))
        ));
        assert!(store.load_report().await.is_none());
        assert_eq!(logger.count(LogLevel::Critical, "initialization failed"), 1);

        fs::remove_file(&blocker).unwrap();
        store.reload().await.unwrap();
        assert!(store.is_ready());
        store.add(field("a", "1")).await.unwrap();
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn reload_picks_up_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        let store = open_ready(&path).await;
        store.add(field("a", "1")).await.unwrap();

        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("{\"Name\":\"b\",\"Value\":\"2\"}\n");
        fs::write(&path, content).unwrap();
        assert_eq!(names(&store.list().await.unwrap()), vec!["a"]);

        store.reload().await.unwrap();
        assert_eq!(names(&store.list().await.unwrap()), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn reload_of_deleted_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        let store = open_ready(&path).await;
        store.add(field("a", "1")).await.unwrap();

        fs::remove_file(&path).unwrap();
        store.reload().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.load_report().await.unwrap().created);
    }

    #[tokio::test]
    async fn get_ignores_case() {
        let store = memory_store(Arc::new(InMemoryLog::new()));
        store.await_ready().await.unwrap();
        store.add(field("Port", "8080")).await.unwrap();

        assert_eq!(store.get("PORT").await.unwrap(), Some(field("Port", "8080")));
        assert_eq!(store.get("host").await.unwrap(), None);
    }

    #[tokio::test]
    async fn abandoned_add_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        let store = open_ready(&path).await;

        // Stop waiting right after the add has been handed off.
        let _ = tokio::time::timeout(Duration::ZERO, store.add(field("a", "1"))).await;

        let mut listed = Vec::new();
        for _ in 0..100 {
            listed = store.list().await.unwrap();
            if !listed.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(names(&listed), vec!["a"]);
        assert_eq!(data_lines(&path).len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_never_lose_or_duplicate_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.jsonl");
        let store = open_ready(&path).await;

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .add(field(&format!("key{}", i % 25), &format!("value{i}")))
                        .await
                })
            })
            .collect();

        let mut added = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => added += 1,
                Err(StoreError::DuplicateName { .. }) => duplicates += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(added, 25);
        assert_eq!(duplicates, 15);
        assert_eq!(data_lines(&path).len(), added);
        assert_eq!(store.list().await.unwrap().len(), added);

        let fresh = open_ready(&path).await;
        assert_eq!(fresh.list().await.unwrap().len(), added);
        assert_eq!(fresh.load_report().await.unwrap().failed, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_see_whole_mutations_only() {
        let store = memory_store(Arc::new(InMemoryLog::new()));
        store.await_ready().await.unwrap();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    store.add(field(&format!("k{i}"), "v")).await.unwrap();
                }
            })
        };

        let mut last = 0;
        while !writer.is_finished() {
            let listed = store.list().await.unwrap();
            assert!(listed.len() >= last);
            for (i, f) in listed.iter().enumerate() {
                assert_eq!(f.name, format!("k{i}"));
            }
            last = listed.len();
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 50);
    }
}
