//! Repository for the `bookings` table.

use chrono::{NaiveDate, NaiveTime};
use educonnect_core::booking::BookingStatus;
use educonnect_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::booking::Booking;

/// Column list for `bookings` queries.
const COLUMNS: &str = "id, student_id, mentor_id, date, time, status, created_at, updated_at";

/// Provides CRUD operations for bookings.
pub struct BookingRepo;

impl BookingRepo {
    /// Create a PENDING booking, returning the generated ID.
    pub async fn create(
        pool: &PgPool,
        student_id: DbId,
        mentor_id: DbId,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO bookings (student_id, mentor_id, date, time) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(student_id)
        .bind(mentor_id)
        .bind(date)
        .bind(time)
        .fetch_one(pool)
        .await
    }

    /// Fetch a booking by ID.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set a booking's status.
    ///
    /// Single atomic UPDATE so a concurrently firing task observes either
    /// the old or the new status, never an intermediate state. Returns
    /// `true` if the booking existed.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: BookingStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All CONFIRMED bookings between two users, either role direction.
    pub async fn confirmed_between(
        pool: &PgPool,
        user_a: DbId,
        user_b: DbId,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings \
             WHERE status = 'CONFIRMED' \
               AND ((student_id = $1 AND mentor_id = $2) \
                 OR (student_id = $2 AND mentor_id = $1))"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(user_a)
            .bind(user_b)
            .fetch_all(pool)
            .await
    }

    /// The most recent CONFIRMED booking between two users whose start
    /// instant is at or before `now`, if any.
    pub async fn last_started_between(
        pool: &PgPool,
        user_a: DbId,
        user_b: DbId,
        now: Timestamp,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings \
             WHERE status = 'CONFIRMED' \
               AND ((student_id = $1 AND mentor_id = $2) \
                 OR (student_id = $2 AND mentor_id = $1)) \
               AND (date + time) AT TIME ZONE 'UTC' <= $3 \
             ORDER BY date DESC, time DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(user_a)
            .bind(user_b)
            .bind(now)
            .fetch_optional(pool)
            .await
    }
}
