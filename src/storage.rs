use crate::{
    directory::{
        models::{Role, StudentDocument, StudentRecord, UNKNOWN_GRADE},
        StudentDirectory,
    },
    error::{BoardError, BoardResult},
};
use chrono::{DateTime, Duration, Utc};
use futures::{stream, StreamExt};
use itertools::Itertools;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

pub const DEFAULT_TTL_SEC: i64 = 300;

/// Source of the current time, so staleness can be driven by tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock(Mutex::new(start))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub ttl: Duration,
    // Applied to every single call into the directory.
    pub fetch_timeout: std::time::Duration,
    pub grade_lookup_concurrency: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        CacheOptions {
            ttl: Duration::seconds(DEFAULT_TTL_SEC),
            fetch_timeout: std::time::Duration::from_secs(5),
            grade_lookup_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub students: Arc<Vec<StudentRecord>>,
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Snapshot>,
    // Number of fetches started so far, bumped under the refresh lock.
    started: u64,
    // Which fetch produced `snapshot`.
    stored: u64,
    // Bumped by `invalidate`; a fetch begun in an older epoch is not stored.
    epoch: u64,
}

type SharedState = Arc<Mutex<CacheState>>;

/// Process-wide cache of the full student snapshot.
///
/// Snapshots are always replaced wholesale. A refresh that fails leaves the
/// previous state untouched and the caller gets an empty list.
#[derive(Clone)]
pub struct DirectoryCache {
    directory: Arc<dyn StudentDirectory>,
    clock: Arc<dyn Clock>,
    options: CacheOptions,
    data: SharedState,
    refreshing: Arc<tokio::sync::Mutex<()>>,
}

impl DirectoryCache {
    pub fn new(
        directory: Arc<dyn StudentDirectory>,
        options: CacheOptions,
        clock: Arc<dyn Clock>,
    ) -> DirectoryCache {
        DirectoryCache {
            directory,
            clock,
            options,
            data: Arc::new(Mutex::new(CacheState::default())),
            refreshing: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn directory(&self) -> Arc<dyn StudentDirectory> {
        self.directory.clone()
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub async fn get(&self, force_refresh: bool) -> Arc<Vec<StudentRecord>> {
        let asked_after = {
            let state = self.state();
            if !force_refresh {
                if let Some(students) = self.fresh_students(&state) {
                    return students;
                }
            }
            state.started
        };

        // Only one refresh in flight; callers queued behind it may reuse its result.
        let _refreshing = self.refreshing.lock().await;
        let (fetch_id, epoch) = {
            let mut state = self.state();
            let reusable = match force_refresh {
                // A forced caller only takes a fetch that began after it asked.
                true => match state.stored > asked_after {
                    true => state.snapshot.as_ref().map(|s| s.students.clone()),
                    false => None,
                },
                false => self.fresh_students(&state),
            };
            if let Some(students) = reusable {
                debug!("Reusing snapshot refreshed by a concurrent query.");
                return students;
            }
            state.started += 1;
            (state.started, state.epoch)
        };

        match self.fetch().await {
            Ok(students) => {
                let students = Arc::new(students);
                let mut state = self.state();
                if state.epoch != epoch {
                    debug!("Cache was cleared during the refresh, {} students not cached.", students.len());
                    return students;
                }
                info!("Student directory refreshed: {} students cached.", students.len());
                state.snapshot = Some(Snapshot {
                    fetched_at: self.clock.now(),
                    students: students.clone(),
                });
                state.stored = fetch_id;
                students
            }
            Err(e) => {
                error!("Could not refresh student directory, ranking without data. {e}");
                Arc::new(vec![])
            }
        }
    }

    pub fn invalidate(&self) {
        let mut state = self.state();
        state.snapshot = None;
        state.epoch += 1;
        info!("Student directory cache cleared.");
    }

    pub fn snapshot_age(&self) -> Option<Duration> {
        let state = self.state();
        state
            .snapshot
            .as_ref()
            .map(|s| self.clock.now() - s.fetched_at)
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fresh_students(&self, state: &CacheState) -> Option<Arc<Vec<StudentRecord>>> {
        state
            .snapshot
            .as_ref()
            .filter(|s| self.clock.now() - s.fetched_at < self.options.ttl)
            .map(|s| s.students.clone())
    }

    async fn fetch(&self) -> BoardResult<Vec<StudentRecord>> {
        let documents = timeout(
            self.options.fetch_timeout,
            self.directory.list_students(Role::Student),
        )
        .await
        .map_err(|_| BoardError::Timeout)??;

        let class_grades = self.resolve_class_grades(&documents).await;

        let students = documents
            .into_iter()
            .map(|document| {
                let grade = document
                    .stored_grade()
                    .unwrap_or_else(|| highest_class_grade(&document.classes, &class_grades));
                document.into_record(grade)
            })
            .collect();
        Ok(students)
    }

    // Grades of every class referenced by a student without a stored grade.
    // Each class is looked up once, with bounded concurrency.
    async fn resolve_class_grades(&self, documents: &[StudentDocument]) -> HashMap<String, Option<u8>> {
        let class_ids = documents
            .iter()
            .filter(|d| d.stored_grade().is_none())
            .flat_map(|d| d.classes.iter())
            .unique()
            .cloned()
            .collect::<Vec<String>>();

        if class_ids.is_empty() {
            return HashMap::new();
        }
        debug!("Resolving grade of {} classes.", class_ids.len());

        stream::iter(class_ids)
            .map(|class_id| async move {
                let grade = self.lookup_class_grade(&class_id).await.unwrap_or_else(|e| {
                    warn!("Could not resolve grade of class {class_id}, grade unknown. {e}");
                    None
                });
                (class_id, grade)
            })
            .buffer_unordered(self.options.grade_lookup_concurrency.max(1))
            .collect::<HashMap<String, Option<u8>>>()
            .await
    }

    async fn lookup_class_grade(&self, class_id: &str) -> BoardResult<Option<u8>> {
        let class = timeout(self.options.fetch_timeout, self.directory.get_class(class_id))
            .await
            .map_err(|_| BoardError::Timeout)??;

        match class {
            Some(class) => Ok(Some(class.grade).filter(|grade| *grade != UNKNOWN_GRADE)),
            None => {
                warn!("Class {class_id} referenced by a student does not exist.");
                Ok(None)
            }
        }
    }
}

fn highest_class_grade(classes: &[String], class_grades: &HashMap<String, Option<u8>>) -> u8 {
    classes
        .iter()
        .filter_map(|id| class_grades.get(id).copied().flatten())
        .max()
        .unwrap_or(UNKNOWN_GRADE)
}
