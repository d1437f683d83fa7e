use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::booking::format_instant;
use crate::models::{
    Booking, BookingFilter, BookingStatus, BookingSummary, StudioClass, Trainer, User,
    WeeklySchedule,
};

fn parse_instant(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// True when `err` is SQLite refusing a row because of a UNIQUE constraint.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<rusqlite::Error>() {
        Some(rusqlite::Error::SqliteFailure(e, _)) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

// ── Trainers & Classes ──

const TRAINER_COLUMNS: &str =
    "SELECT t.id, t.name, t.class_id, c.name, t.schedule FROM trainers t JOIN classes c ON c.id = t.class_id";

fn parse_trainer_row(row: &rusqlite::Row) -> anyhow::Result<Trainer> {
    let schedule_json: String = row.get(4)?;
    Ok(Trainer {
        id: row.get(0)?,
        name: row.get(1)?,
        class_id: row.get(2)?,
        class_name: row.get(3)?,
        schedule: WeeklySchedule::from_json(&schedule_json)?,
    })
}

pub fn get_trainer(conn: &Connection, id: i64) -> anyhow::Result<Option<Trainer>> {
    let result = conn
        .query_row(
            &format!("{TRAINER_COLUMNS} WHERE t.id = ?1"),
            params![id],
            |row| Ok(parse_trainer_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn list_trainers(conn: &Connection) -> anyhow::Result<Vec<Trainer>> {
    let mut stmt = conn.prepare(&format!("{TRAINER_COLUMNS} ORDER BY t.name"))?;
    let rows = stmt.query_map([], |row| Ok(parse_trainer_row(row)))?;

    let mut trainers = vec![];
    for row in rows {
        trainers.push(row??);
    }
    Ok(trainers)
}

/// Stored schedules as raw text, for startup validation that can name the
/// offending trainer.
pub fn list_raw_schedules(conn: &Connection) -> anyhow::Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT name, schedule FROM trainers ORDER BY id")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut schedules = vec![];
    for row in rows {
        schedules.push(row?);
    }
    Ok(schedules)
}

pub fn get_class(conn: &Connection, id: i64) -> anyhow::Result<Option<StudioClass>> {
    let result = conn
        .query_row(
            "SELECT id, name, price, about, syllabus, level, length, group_size FROM classes WHERE id = ?1",
            params![id],
            |row| {
                let syllabus_json: String = row.get(4)?;
                Ok((
                    StudioClass {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        price: row.get(2)?,
                        about: row.get(3)?,
                        syllabus: vec![],
                        level: row.get(5)?,
                        length: row.get(6)?,
                        group_size: row.get(7)?,
                    },
                    syllabus_json,
                ))
            },
        )
        .optional()?;

    match result {
        Some((mut class, syllabus_json)) => {
            class.syllabus = serde_json::from_str(&syllabus_json)?;
            Ok(Some(class))
        }
        None => Ok(None),
    }
}

// ── Users ──

const USER_COLUMNS: &str = "SELECT id, name, password_hash, email, phone, created_at FROM users";

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let created_at: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        password_hash: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        created_at: parse_instant(&created_at)?,
    })
}

pub fn create_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, password_hash, email, phone, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id,
            user.name,
            user.password_hash,
            user.email,
            user.phone,
            format_instant(&user.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    conn.query_row(&format!("{USER_COLUMNS} WHERE id = ?1"), params![id], |row| {
        Ok(parse_user_row(row))
    })
    .optional()?
    .transpose()
}

pub fn get_user_by_name(conn: &Connection, name: &str) -> anyhow::Result<Option<User>> {
    conn.query_row(&format!("{USER_COLUMNS} WHERE name = ?1"), params![name], |row| {
        Ok(parse_user_row(row))
    })
    .optional()?
    .transpose()
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "SELECT b.id, b.user_id, b.trainer_id, b.class_id, b.name, b.email, b.price, b.created_at, b.booked_time, b.status FROM bookings b";

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let created_at: String = row.get(7)?;
    let booked_time: String = row.get(8)?;
    let status: String = row.get(9)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        trainer_id: row.get(2)?,
        class_id: row.get(3)?,
        name: row.get(4)?,
        email: row.get(5)?,
        price: row.get(6)?,
        created_at: parse_instant(&created_at)?,
        booked_time: parse_instant(&booked_time)?,
        status: BookingStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown booking status in storage: {status}"))?,
    })
}

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, trainer_id, class_id, name, email, price, created_at, booked_time, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.user_id,
            booking.trainer_id,
            booking.class_id,
            booking.name,
            booking.email,
            booking.price,
            format_instant(&booking.created_at),
            format_instant(&booking.booked_time),
            booking.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    conn.query_row(&format!("{BOOKING_COLUMNS} WHERE b.id = ?1"), params![id], |row| {
        Ok(parse_booking_row(row))
    })
    .optional()?
    .transpose()
}

pub fn find_active_booking(
    conn: &Connection,
    user_id: &str,
    trainer_id: i64,
    booked_time: &DateTime<Utc>,
) -> anyhow::Result<Option<Booking>> {
    conn.query_row(
        &format!(
            "{BOOKING_COLUMNS} WHERE b.user_id = ?1 AND b.trainer_id = ?2 AND b.booked_time = ?3 AND b.status = 'booked'"
        ),
        params![user_id, trainer_id, format_instant(booked_time)],
        |row| Ok(parse_booking_row(row)),
    )
    .optional()?
    .transpose()
}

/// Compare-and-set on the status column: only a row still in `from` moves.
pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    user_id: &str,
    from: BookingStatus,
    to: BookingStatus,
) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2 AND user_id = ?3 AND status = ?4",
        params![to.as_str(), id, user_id, from.as_str()],
    )?;
    Ok(count)
}

pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<BookingSummary>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.user_id, b.trainer_id, b.class_id, b.name, b.email, b.price, b.created_at, b.booked_time, b.status,
                t.name, c.name
         FROM bookings b
         JOIN trainers t ON t.id = b.trainer_id
         JOIN classes c ON c.id = b.class_id
         WHERE (?1 IS NULL OR b.user_id = ?1)
           AND (?2 = 'all'
                OR (?2 = 'upcoming' AND b.status = 'booked' AND b.booked_time >= ?3)
                OR (?2 = 'history' AND (b.status IN ('finished', 'cancelled') OR b.booked_time < ?3)))
         ORDER BY b.booked_time DESC, b.created_at DESC",
    )?;

    let now = filter.now;
    let rows = stmt.query_map(
        params![filter.user_id, filter.scope.as_str(), format_instant(&now)],
        |row| {
            let trainer_name: String = row.get(10)?;
            let class_name: String = row.get(11)?;
            Ok(parse_booking_row(row).map(|booking| BookingSummary {
                effective_status: booking.effective_status(now),
                booking,
                trainer_name,
                class_name,
            }))
        },
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}
