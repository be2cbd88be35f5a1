use crate::errors::{Error, Result};
use crate::models::{
    OwnerId, SortField, SortOrder, StoreData, User, WorkoutQuery, WorkoutRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error};
use uuid::Uuid;

/// Owner-scoped access to workout records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_workout(&self, record: WorkoutRecord) -> Result<WorkoutRecord>;

    /// Stores every record or none of them.
    async fn insert_workouts(&self, records: Vec<WorkoutRecord>) -> Result<Vec<WorkoutRecord>>;

    async fn find_workout(&self, owner: OwnerId, id: Uuid) -> Result<Option<WorkoutRecord>>;

    /// Swaps in the stored document with the same id and owner. Returns false
    /// when no such document exists.
    async fn replace_workout(&self, record: WorkoutRecord) -> Result<bool>;

    async fn delete_workout(&self, owner: OwnerId, id: Uuid) -> Result<bool>;

    /// Records with `start <= occurred_at` (and `< end` when given), ascending
    /// by `occurred_at`; records sharing a timestamp keep insertion order.
    async fn workouts_between(
        &self,
        owner: OwnerId,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<WorkoutRecord>>;

    /// One page of records plus the total number that matched the filters.
    async fn list_workouts(
        &self,
        owner: OwnerId,
        query: &WorkoutQuery,
    ) -> Result<(Vec<WorkoutRecord>, usize)>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn insert_user(&self, user: User) -> Result<User>;

    async fn find_user(&self, id: OwnerId) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn replace_user(&self, user: User) -> Result<bool>;
}

pub const DEFAULT_DATA_PATH: &str = "data/store.json";

/// Document store that keeps every collection in memory and rewrites one JSON
/// file after each change. A change becomes visible only once its file write
/// succeeded.
pub struct JsonFileStore {
    data_path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonFileStore {
    pub fn new(data_path: PathBuf, data: StoreData) -> Self {
        Self {
            data_path,
            data: Mutex::new(data),
        }
    }

    pub async fn open(data_path: PathBuf) -> Result<Self> {
        let data = load_data(&data_path).await?;
        debug!(
            users = data.users.len(),
            workouts = data.workouts.len(),
            "loaded store from {}",
            data_path.display()
        );
        Ok(Self::new(data_path, data))
    }

    /// Applies `change` to a copy of the data, persists the copy and only then
    /// swaps it in. `change` returning `None` leaves everything untouched.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut StoreData) -> Option<T>,
    ) -> Result<Option<T>> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let Some(outcome) = change(&mut next) else {
            return Ok(None);
        };
        persist_data(&self.data_path, &next).await?;
        *data = next;
        Ok(Some(outcome))
    }
}

pub async fn load_data(path: &Path) -> Result<StoreData> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
            error!("failed to parse data file: {err}");
            Error::from(err)
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoreData::default()),
        Err(err) => {
            error!("failed to read data file: {err}");
            Err(err.into())
        }
    }
}

pub async fn persist_data(path: &Path, data: &StoreData) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn insert_workout(&self, record: WorkoutRecord) -> Result<WorkoutRecord> {
        self.commit(|data| {
            data.workouts.push(record.clone());
            Some(())
        })
        .await?;
        Ok(record)
    }

    async fn insert_workouts(&self, records: Vec<WorkoutRecord>) -> Result<Vec<WorkoutRecord>> {
        self.commit(|data| {
            data.workouts.extend(records.iter().cloned());
            Some(())
        })
        .await?;
        Ok(records)
    }

    async fn find_workout(&self, owner: OwnerId, id: Uuid) -> Result<Option<WorkoutRecord>> {
        let data = self.data.lock().await;
        Ok(data
            .workouts
            .iter()
            .find(|w| w.id == id && w.owner == owner)
            .cloned())
    }

    async fn replace_workout(&self, record: WorkoutRecord) -> Result<bool> {
        let replaced = self
            .commit(|data| {
                let slot = data
                    .workouts
                    .iter_mut()
                    .find(|w| w.id == record.id && w.owner == record.owner)?;
                *slot = record;
                Some(())
            })
            .await?;
        Ok(replaced.is_some())
    }

    async fn delete_workout(&self, owner: OwnerId, id: Uuid) -> Result<bool> {
        let deleted = self
            .commit(|data| {
                let index = data
                    .workouts
                    .iter()
                    .position(|w| w.id == id && w.owner == owner)?;
                Some(data.workouts.remove(index))
            })
            .await?;
        Ok(deleted.is_some())
    }

    async fn workouts_between(
        &self,
        owner: OwnerId,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<WorkoutRecord>> {
        let data = self.data.lock().await;
        let mut matched: Vec<WorkoutRecord> = data
            .workouts
            .iter()
            .filter(|w| w.owner == owner && w.occurred_at >= start)
            .filter(|w| end.is_none_or(|end| w.occurred_at < end))
            .cloned()
            .collect();
        matched.sort_by_key(|w| w.occurred_at);
        Ok(matched)
    }

    async fn list_workouts(
        &self,
        owner: OwnerId,
        query: &WorkoutQuery,
    ) -> Result<(Vec<WorkoutRecord>, usize)> {
        let data = self.data.lock().await;
        let mut matched: Vec<WorkoutRecord> = data
            .workouts
            .iter()
            .filter(|w| w.owner == owner)
            .filter(|w| query.start_date.is_none_or(|start| w.occurred_at >= start))
            .filter(|w| query.end_date.is_none_or(|end| w.occurred_at <= end))
            .filter(|w| query.category.is_none_or(|category| w.category == category))
            .cloned()
            .collect();
        drop(data);

        matched.sort_by(|a, b| {
            let ordering = compare_by(query.sort_by, a, b);
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matched.len();
        let limit = query.limit.max(1);
        let skip = (query.page.max(1) - 1).saturating_mul(limit);
        let page = matched.into_iter().skip(skip).take(limit).collect();
        Ok((page, total))
    }
}

fn compare_by(field: SortField, a: &WorkoutRecord, b: &WorkoutRecord) -> Ordering {
    match field {
        SortField::Date => a.occurred_at.cmp(&b.occurred_at),
        SortField::Duration => a.duration_minutes.total_cmp(&b.duration_minutes),
        SortField::Distance => a.distance_km.total_cmp(&b.distance_km),
        SortField::Calories => a.calories_burned.total_cmp(&b.calories_burned),
    }
}

#[async_trait]
impl UserStore for JsonFileStore {
    async fn insert_user(&self, user: User) -> Result<User> {
        let inserted = self
            .commit(|data| {
                if data.users.iter().any(|u| u.email == user.email) {
                    return None;
                }
                data.users.push(user.clone());
                Some(())
            })
            .await?;
        match inserted {
            Some(()) => Ok(user),
            None => Err(Error::Conflict("User already exists with this email".into())),
        }
    }

    async fn find_user(&self, id: OwnerId) -> Result<Option<User>> {
        let data = self.data.lock().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        let data = self.data.lock().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn replace_user(&self, user: User) -> Result<bool> {
        let replaced = self
            .commit(|data| {
                let slot = data.users.iter_mut().find(|u| u.id == user.id)?;
                *slot = user;
                Some(())
            })
            .await?;
        Ok(replaced.is_some())
    }
}
