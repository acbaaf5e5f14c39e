use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::models::{
    DEFAULT_CALORIE_GOAL, DEFAULT_WEEKLY_WORKOUT_GOAL, Meal, NewMeal, NewWorkout, Profile,
    ProfileUpdate, Workout,
};

/// A registered local account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
}

/// An issued token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

pub struct Database {
    conn: Connection,
}

/// Timestamps sort lexically; microsecond precision keeps rapid inserts apart.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS sessions (
                    access_token TEXT PRIMARY KEY,
                    refresh_token TEXT NOT NULL UNIQUE,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    expires_at INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS profiles (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL UNIQUE,
                    display_name TEXT,
                    height INTEGER,
                    weight REAL,
                    target_weight REAL,
                    daily_calorie_goal INTEGER NOT NULL DEFAULT 2000,
                    weekly_workout_goal INTEGER NOT NULL DEFAULT 5,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS workouts (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    duration INTEGER NOT NULL,
                    calories INTEGER NOT NULL,
                    type TEXT NOT NULL,
                    completed INTEGER NOT NULL DEFAULT 0,
                    workout_date TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meals (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    calories INTEGER NOT NULL,
                    protein INTEGER NOT NULL DEFAULT 0,
                    carbs INTEGER NOT NULL DEFAULT 0,
                    fat INTEGER NOT NULL DEFAULT 0,
                    meal_type TEXT NOT NULL,
                    meal_date TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_workouts_user_date ON workouts(user_id, workout_date);
                CREATE INDEX IF NOT EXISTS idx_meals_user_date ON meals(user_id, meal_date);
                CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mappers ---

    fn workout_from_row(row: &rusqlite::Row) -> rusqlite::Result<Workout> {
        Ok(Workout {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            duration: row.get(3)?,
            calories: row.get(4)?,
            workout_type: row.get(5)?,
            completed: row.get(6)?,
            workout_date: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Meal> {
        Ok(Meal {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            calories: row.get(3)?,
            protein: row.get(4)?,
            carbs: row.get(5)?,
            fat: row.get(6)?,
            meal_type: row.get(7)?,
            meal_date: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: row.get(0)?,
            user_id: row.get(1)?,
            display_name: row.get(2)?,
            height: row.get(3)?,
            weight: row.get(4)?,
            target_weight: row.get(5)?,
            daily_calorie_goal: row.get(6)?,
            weekly_workout_goal: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    // --- Workouts ---

    pub fn insert_workout(&self, user_id: &str, workout: &NewWorkout) -> Result<Workout> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO workouts (id, user_id, name, duration, calories, type, completed, workout_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                user_id,
                workout.name,
                workout.duration,
                workout.calories,
                workout.workout_type,
                workout.completed,
                workout.workout_date,
                timestamp(),
            ],
        )?;
        self.get_workout(&id)
    }

    pub fn get_workout(&self, id: &str) -> Result<Workout> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, duration, calories, type, completed, workout_date, created_at
                 FROM workouts WHERE id = ?1",
                params![id],
                Self::workout_from_row,
            )
            .context("Workout not found")
    }

    /// Newest created first.
    pub fn workouts_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Workout>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, duration, calories, type, completed, workout_date, created_at
             FROM workouts
             WHERE user_id = ?1 AND workout_date = ?2
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let workouts = stmt
            .query_map(params![user_id, date], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    pub fn set_workout_completed(&self, id: &str, completed: bool) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE workouts SET completed = ?1 WHERE id = ?2",
            params![completed, id],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_workout(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Meals ---

    pub fn insert_meal(&self, user_id: &str, meal: &NewMeal) -> Result<Meal> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO meals (id, user_id, name, calories, protein, carbs, fat, meal_type, meal_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                user_id,
                meal.name,
                meal.calories,
                meal.protein,
                meal.carbs,
                meal.fat,
                meal.meal_type,
                meal.meal_date,
                timestamp(),
            ],
        )?;
        self.get_meal(&id)
    }

    pub fn get_meal(&self, id: &str) -> Result<Meal> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, calories, protein, carbs, fat, meal_type, meal_date, created_at
                 FROM meals WHERE id = ?1",
                params![id],
                Self::meal_from_row,
            )
            .context("Meal not found")
    }

    /// Newest created first.
    pub fn meals_for_day(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Meal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, calories, protein, carbs, fat, meal_type, meal_date, created_at
             FROM meals
             WHERE user_id = ?1 AND meal_date = ?2
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let meals = stmt
            .query_map(params![user_id, date], Self::meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    pub fn delete_meal(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM meals WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Profiles ---

    pub fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT id, user_id, display_name, height, weight, target_weight,
                        daily_calorie_goal, weekly_workout_goal, created_at, updated_at
                 FROM profiles WHERE user_id = ?1",
                params![user_id],
                Self::profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    /// Creates the profile row with default goals. Existing rows are kept.
    pub fn ensure_profile(&self, user_id: &str) -> Result<Profile> {
        let now = timestamp();
        self.conn.execute(
            "INSERT OR IGNORE INTO profiles (id, user_id, daily_calorie_goal, weekly_workout_goal, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Uuid::new_v4().to_string(),
                user_id,
                DEFAULT_CALORIE_GOAL,
                DEFAULT_WEEKLY_WORKOUT_GOAL,
                now,
                now,
            ],
        )?;
        self.get_profile(user_id)?
            .context("Profile not found after insert")
    }

    /// Writes only the fields present in `update`, all or none. Returns false
    /// when the user has no profile row.
    pub fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        if self.get_profile(user_id)?.is_none() {
            return Ok(false);
        }

        let now = timestamp();
        if let Some(ref display_name) = update.display_name {
            tx.execute(
                "UPDATE profiles SET display_name = ?1, updated_at = ?2 WHERE user_id = ?3",
                params![display_name, now, user_id],
            )?;
        }
        if let Some(height) = update.height {
            tx.execute(
                "UPDATE profiles SET height = ?1, updated_at = ?2 WHERE user_id = ?3",
                params![height, now, user_id],
            )?;
        }
        if let Some(weight) = update.weight {
            tx.execute(
                "UPDATE profiles SET weight = ?1, updated_at = ?2 WHERE user_id = ?3",
                params![weight, now, user_id],
            )?;
        }
        if let Some(target_weight) = update.target_weight {
            tx.execute(
                "UPDATE profiles SET target_weight = ?1, updated_at = ?2 WHERE user_id = ?3",
                params![target_weight, now, user_id],
            )?;
        }
        if let Some(goal) = update.daily_calorie_goal {
            tx.execute(
                "UPDATE profiles SET daily_calorie_goal = ?1, updated_at = ?2 WHERE user_id = ?3",
                params![goal, now, user_id],
            )?;
        }
        if let Some(goal) = update.weekly_workout_goal {
            tx.execute(
                "UPDATE profiles SET weekly_workout_goal = ?1, updated_at = ?2 WHERE user_id = ?3",
                params![goal, now, user_id],
            )?;
        }
        tx.commit()?;
        Ok(true)
    }

    // --- Users & sessions ---

    /// Emails are stored lowercased.
    pub fn insert_user(&self, email: &str, password_hash: &str) -> Result<UserRecord> {
        let email = email.to_lowercase();
        if self.find_user_by_email(&email)?.is_some() {
            bail!("User already exists: {email}");
        }
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, email, password_hash, timestamp()],
        )?;
        Ok(UserRecord {
            id,
            email,
            password_hash: password_hash.to_string(),
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, email, password_hash FROM users WHERE email = ?1",
                params![email.to_lowercase()],
                |row| {
                    Ok(UserRecord {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        password_hash: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Issues a fresh token pair valid for `ttl_secs`.
    pub fn create_session(&self, user: &UserRecord, ttl_secs: i64) -> Result<SessionRecord> {
        let session = SessionRecord {
            user_id: user.id.clone(),
            email: user.email.clone(),
            access_token: Uuid::new_v4().simple().to_string(),
            refresh_token: Uuid::new_v4().simple().to_string(),
            expires_at: Utc::now().timestamp() + ttl_secs,
        };
        self.conn.execute(
            "INSERT INTO sessions (access_token, refresh_token, user_id, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.access_token,
                session.refresh_token,
                session.user_id,
                session.expires_at,
                timestamp(),
            ],
        )?;
        Ok(session)
    }

    pub fn find_session_by_refresh_token(&self, refresh_token: &str) -> Result<Option<SessionRecord>> {
        let session = self
            .conn
            .query_row(
                "SELECT s.user_id, u.email, s.access_token, s.refresh_token, s.expires_at
                 FROM sessions s
                 JOIN users u ON s.user_id = u.id
                 WHERE s.refresh_token = ?1",
                params![refresh_token],
                |row| {
                    Ok(SessionRecord {
                        user_id: row.get(0)?,
                        email: row.get(1)?,
                        access_token: row.get(2)?,
                        refresh_token: row.get(3)?,
                        expires_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    pub fn delete_session(&self, access_token: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM sessions WHERE access_token = ?1",
            params![access_token],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn sample_meal(name: &str, date: NaiveDate) -> NewMeal {
        NewMeal {
            name: name.to_string(),
            calories: 520,
            protein: 35,
            carbs: 60,
            fat: 14,
            meal_type: "dinner".to_string(),
            meal_date: date,
        }
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        let version: i64 = db
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_insert_and_get_workout() {
        let db = Database::open_in_memory().unwrap();
        let new = NewWorkout::planned("Leg day", 55, 380, "strength", day(15));
        let w = db.insert_workout("u1", &new).unwrap();

        assert_eq!(w.user_id, "u1");
        assert_eq!(w.name, "Leg day");
        assert_eq!(w.duration, 55);
        assert_eq!(w.workout_type, "strength");
        assert!(!w.completed);
        assert_eq!(w.workout_date, day(15));
        assert!(!w.created_at.is_empty());

        let fetched = db.get_workout(&w.id).unwrap();
        assert_eq!(fetched, w);
    }

    #[test]
    fn test_workouts_for_day_filters_and_orders() {
        let db = Database::open_in_memory().unwrap();
        db.insert_workout("u1", &NewWorkout::planned("First", 20, 100, "yoga", day(15)))
            .unwrap();
        db.insert_workout("u1", &NewWorkout::planned("Second", 20, 100, "yoga", day(15)))
            .unwrap();
        db.insert_workout("u1", &NewWorkout::planned("Other day", 20, 100, "yoga", day(14)))
            .unwrap();
        db.insert_workout("u2", &NewWorkout::planned("Other user", 20, 100, "yoga", day(15)))
            .unwrap();

        let rows = db.workouts_for_day("u1", day(15)).unwrap();
        let names: Vec<&str> = rows.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["Second", "First"]);
    }

    #[test]
    fn test_set_workout_completed() {
        let db = Database::open_in_memory().unwrap();
        let w = db
            .insert_workout("u1", &NewWorkout::planned("Run", 30, 300, "running", day(15)))
            .unwrap();
        assert!(db.set_workout_completed(&w.id, true).unwrap());
        assert!(db.get_workout(&w.id).unwrap().completed);
        assert!(!db.set_workout_completed("missing", true).unwrap());
    }

    #[test]
    fn test_delete_workout_and_meal() {
        let db = Database::open_in_memory().unwrap();
        let w = db
            .insert_workout("u1", &NewWorkout::planned("Run", 30, 300, "running", day(15)))
            .unwrap();
        let m = db.insert_meal("u1", &sample_meal("Curry", day(15))).unwrap();

        assert!(db.delete_workout(&w.id).unwrap());
        assert!(!db.delete_workout(&w.id).unwrap());
        assert!(db.get_workout(&w.id).is_err());

        assert!(db.delete_meal(&m.id).unwrap());
        assert!(db.meals_for_day("u1", day(15)).unwrap().is_empty());
    }

    #[test]
    fn test_meals_for_day() {
        let db = Database::open_in_memory().unwrap();
        let m = db.insert_meal("u1", &sample_meal("Curry", day(15))).unwrap();
        db.insert_meal("u1", &sample_meal("Leftovers", day(16))).unwrap();

        let rows = db.meals_for_day("u1", day(15)).unwrap();
        assert_eq!(rows, vec![m]);
        assert_eq!(rows[0].protein, 35);
        assert_eq!(rows[0].meal_type, "dinner");
    }

    #[test]
    fn test_profile_defaults_and_partial_update() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_profile("u1").unwrap().is_none());

        let p = db.ensure_profile("u1").unwrap();
        assert_eq!(p.daily_calorie_goal, 2000);
        assert_eq!(p.weekly_workout_goal, 5);
        assert!(p.display_name.is_none());

        // A second call keeps the existing row.
        assert_eq!(db.ensure_profile("u1").unwrap().id, p.id);

        let update = ProfileUpdate {
            display_name: Some(Some("Deniz".to_string())),
            weight: Some(Some(72.4)),
            ..Default::default()
        };
        assert!(db.update_profile("u1", &update).unwrap());
        let p = db.get_profile("u1").unwrap().unwrap();
        assert_eq!(p.display_name.as_deref(), Some("Deniz"));
        assert_eq!(p.weight, Some(72.4));
        assert_eq!(p.height, None);
        assert_eq!(p.daily_calorie_goal, 2000);

        let clear = ProfileUpdate {
            display_name: Some(None),
            ..Default::default()
        };
        db.update_profile("u1", &clear).unwrap();
        let p = db.get_profile("u1").unwrap().unwrap();
        assert!(p.display_name.is_none());
        assert_eq!(p.weight, Some(72.4));
    }

    #[test]
    fn test_update_profile_without_row() {
        let db = Database::open_in_memory().unwrap();
        let update = ProfileUpdate {
            daily_calorie_goal: Some(1800),
            ..Default::default()
        };
        assert!(!db.update_profile("nobody", &update).unwrap());
    }

    #[test]
    fn test_update_profile_is_all_or_nothing() {
        let db = Database::open_in_memory().unwrap();
        db.ensure_profile("u1").unwrap();
        db.conn
            .execute_batch(
                "CREATE TRIGGER no_workout_goal BEFORE UPDATE OF weekly_workout_goal ON profiles
                 BEGIN SELECT RAISE(ABORT, 'workout goal locked'); END;",
            )
            .unwrap();

        let update = ProfileUpdate {
            weight: Some(Some(80.0)),
            daily_calorie_goal: Some(2400),
            weekly_workout_goal: Some(3),
            ..Default::default()
        };
        assert!(db.update_profile("u1", &update).is_err());

        let p = db.get_profile("u1").unwrap().unwrap();
        assert_eq!(p.weight, None);
        assert_eq!(p.daily_calorie_goal, 2000);
        assert_eq!(p.weekly_workout_goal, 5);
    }

    #[test]
    fn test_users_and_sessions() {
        let db = Database::open_in_memory().unwrap();
        let user = db.insert_user("Deniz@Example.com", "hash").unwrap();
        assert_eq!(user.email, "deniz@example.com");
        assert!(db.insert_user("deniz@example.com", "other").is_err());

        let found = db.find_user_by_email("DENIZ@example.com").unwrap().unwrap();
        assert_eq!(found.id, user.id);

        let session = db.create_session(&user, 3600).unwrap();
        let by_refresh = db
            .find_session_by_refresh_token(&session.refresh_token)
            .unwrap()
            .unwrap();
        assert_eq!(by_refresh, session);

        assert!(db.delete_session(&session.access_token).unwrap());
        assert!(
            db.find_session_by_refresh_token(&session.refresh_token)
                .unwrap()
                .is_none()
        );
    }
}
