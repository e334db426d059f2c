//! Attendance ledger - Sessions, presence records and monthly grid aggregation.
//!
//! A member's presence at a session is one record keyed on (member, session). Marking a
//! member absent always persists a record with `present = false`; a member with no record
//! reads as absent too, so both paths look the same in the grid.

use crate::{
    core::member::list_active_members,
    entities::{
        AttendanceRecord, AttendanceSession, SessionType, attendance_record, attendance_session,
        member, session_type,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashSet;
use tracing::debug;

/// Session type used when none is given, e.g. by the attendance import.
pub const DEFAULT_SESSION_TYPE: &str = "Training";

/// Finds a session type by name, creating it if missing.
pub async fn ensure_session_type<C>(db: &C, name: &str) -> Result<session_type::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Session type name cannot be empty"));
    }

    if let Some(existing) = find_session_type(db, name).await? {
        return Ok(existing);
    }

    let model = session_type::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Finds a session type by name.
pub async fn find_session_type<C>(db: &C, name: &str) -> Result<Option<session_type::Model>>
where
    C: ConnectionTrait,
{
    SessionType::find()
        .filter(session_type::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the session of a type on a date.
pub async fn find_session<C>(
    db: &C,
    date: NaiveDate,
    session_type_id: i64,
) -> Result<Option<attendance_session::Model>>
where
    C: ConnectionTrait,
{
    AttendanceSession::find()
        .filter(attendance_session::Column::Date.eq(date))
        .filter(attendance_session::Column::SessionTypeId.eq(session_type_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a session. Fails with `Conflict` if one of the same type already exists that day.
pub async fn create_session<C>(
    db: &C,
    date: NaiveDate,
    session_type_id: i64,
    notes: Option<String>,
) -> Result<attendance_session::Model>
where
    C: ConnectionTrait,
{
    let session_type = SessionType::find_by_id(session_type_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Session type", session_type_id))?;

    if find_session(db, date, session_type_id).await?.is_some() {
        return Err(Error::Conflict {
            message: format!("A {} session already exists on {date}", session_type.name),
        });
    }

    let model = attendance_session::ActiveModel {
        date: Set(date),
        session_type_id: Set(session_type_id),
        notes: Set(notes),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Returns the existing session for (date, type) or creates it. The flag is `true` when
/// a session was created.
pub async fn find_or_create_session<C>(
    db: &C,
    date: NaiveDate,
    session_type_id: i64,
) -> Result<(attendance_session::Model, bool)>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_session(db, date, session_type_id).await? {
        return Ok((existing, false));
    }
    Ok((create_session(db, date, session_type_id, None).await?, true))
}

/// Deletes a session together with its attendance records.
pub async fn delete_session<C>(db: &C, session_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let session = AttendanceSession::find_by_id(session_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Session", session_id))?;

    AttendanceRecord::delete_many()
        .filter(attendance_record::Column::SessionId.eq(session_id))
        .exec(db)
        .await?;
    session.delete(db).await?;
    Ok(())
}

/// Records whether a member attended a session, replacing any previous mark.
pub async fn mark_attendance<C>(
    db: &C,
    member_id: i64,
    session_id: i64,
    present: bool,
) -> Result<attendance_record::Model>
where
    C: ConnectionTrait,
{
    crate::core::member::find_member(db, member_id)
        .await?
        .ok_or_else(|| Error::not_found("Member", member_id))?;
    AttendanceSession::find_by_id(session_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Session", session_id))?;

    let existing = AttendanceRecord::find()
        .filter(attendance_record::Column::MemberId.eq(member_id))
        .filter(attendance_record::Column::SessionId.eq(session_id))
        .one(db)
        .await?;

    if let Some(record) = existing {
        if record.present == present {
            return Ok(record);
        }
        let mut active_model: attendance_record::ActiveModel = record.into();
        active_model.present = Set(present);
        return Ok(active_model.update(db).await?);
    }

    debug!(member_id, session_id, present, "creating attendance record");
    let model = attendance_record::ActiveModel {
        member_id: Set(member_id),
        session_id: Set(session_id),
        present: Set(present),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Sessions in a calendar month, ordered by date, optionally of one type only.
pub async fn sessions_in_month<C>(
    db: &C,
    year: i32,
    month: u32,
    session_type_id: Option<i64>,
) -> Result<Vec<attendance_session::Model>>
where
    C: ConnectionTrait,
{
    let (start, end) = month_bounds(year, month)?;

    let mut query = AttendanceSession::find()
        .filter(attendance_session::Column::Date.gte(start))
        .filter(attendance_session::Column::Date.lt(end));
    if let Some(type_id) = session_type_id {
        query = query.filter(attendance_session::Column::SessionTypeId.eq(type_id));
    }

    query
        .order_by_asc(attendance_session::Column::Date)
        .order_by_asc(attendance_session::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = || Error::validation(format!("Invalid month {year}-{month}"));
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((start, end))
}

/// One member's row in the attendance grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    /// The member
    pub member: member::Model,
    /// Presence per session, aligned with [`AttendanceGrid::sessions`]
    pub cells: Vec<bool>,
    /// Number of sessions attended
    pub total: usize,
}

impl GridRow {
    /// Share of the month's sessions attended, 0-100.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.total as f64 / self.cells.len() as f64 * 100.0
    }
}

/// Attendance of active members across one month's sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceGrid {
    /// Year shown
    pub year: i32,
    /// Month shown
    pub month: u32,
    /// Sessions in date order
    pub sessions: Vec<attendance_session::Model>,
    /// One row per active member, by membership number
    pub rows: Vec<GridRow>,
    /// Members present per session, aligned with `sessions`
    pub session_totals: Vec<usize>,
}

/// Builds the attendance grid for a month. Pure read.
pub async fn grid<C>(
    db: &C,
    year: i32,
    month: u32,
    session_type_id: Option<i64>,
) -> Result<AttendanceGrid>
where
    C: ConnectionTrait,
{
    let sessions = sessions_in_month(db, year, month, session_type_id).await?;
    let members = list_active_members(db).await?;

    let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
    let present: HashSet<(i64, i64)> = if session_ids.is_empty() {
        HashSet::new()
    } else {
        AttendanceRecord::find()
            .filter(attendance_record::Column::SessionId.is_in(session_ids))
            .filter(attendance_record::Column::Present.eq(true))
            .all(db)
            .await?
            .into_iter()
            .map(|r| (r.member_id, r.session_id))
            .collect()
    };

    let mut session_totals = vec![0; sessions.len()];
    let rows = members
        .into_iter()
        .map(|member| {
            let cells: Vec<bool> = sessions
                .iter()
                .map(|s| present.contains(&(member.id, s.id)))
                .collect();
            for (total, _) in session_totals.iter_mut().zip(&cells).filter(|(_, p)| **p) {
                *total += 1;
            }
            let total = cells.iter().filter(|p| **p).count();
            GridRow {
                member,
                cells,
                total,
            }
        })
        .collect();

    Ok(AttendanceGrid {
        year,
        month,
        sessions,
        rows,
        session_totals,
    })
}

/// Per-member attendance figures derived from a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAttendance {
    /// Member id
    pub member_id: i64,
    /// Member name
    pub name: String,
    /// Sessions attended
    pub attended: usize,
    /// Sessions held
    pub sessions: usize,
    /// Attended share, 0-100
    pub percentage: f64,
}

/// Summarizes a grid per member, best attendance first.
#[must_use]
pub fn attendance_statistics(grid: &AttendanceGrid) -> Vec<MemberAttendance> {
    let mut stats: Vec<MemberAttendance> = grid
        .rows
        .iter()
        .map(|row| MemberAttendance {
            member_id: row.member.id,
            name: row.member.name.clone(),
            attended: row.total,
            sessions: row.cells.len(),
            percentage: row.percentage(),
        })
        .collect();
    stats.sort_by(|a, b| b.attended.cmp(&a.attended).then(a.name.cmp(&b.name)));
    stats
}

/// Renders a grid as fixed-width text, one line per member plus a totals line.
#[must_use]
pub fn format_grid(grid: &AttendanceGrid) -> String {
    use std::fmt::Write;

    let mut out = format!("Attendance {}-{:02}\n{:<24}", grid.year, grid.month, "Member");
    for session in &grid.sessions {
        let _ = write!(out, " {}", session.date.format("%d"));
    }
    out.push_str("  Total\n");

    for row in &grid.rows {
        let _ = write!(out, "{:<24}", row.member.name);
        for cell in &row.cells {
            out.push_str(if *cell { "  x" } else { "  ." });
        }
        let _ = writeln!(out, "  {:>5}", row.total);
    }

    let _ = write!(out, "{:<24}", "Present");
    for total in &grid.session_totals {
        let _ = write!(out, " {total:>2}");
    }
    out.push('\n');
    out
}
