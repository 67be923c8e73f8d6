//! SQLite-backed store via libsql. Implements every repository port.
//!
//! One database file (`timeet.db`) in the configured data directory. Durations
//! are stored as whole seconds, timestamps as text. A meeting save writes the
//! meeting row and replaces its participant rows inside one transaction.

use crate::domain::{
    Agenda, AgendaId, AgendaStatus, AgendaType, DomainError, Meeting, MeetingCreateRequest,
    MeetingId, Member, MemberId, Participant, ParticipantId, Timer, TimerId, TimerState,
};
use crate::ports::{
    AgendaRepository, MeetingRepository, MemberRepository, ParticipantRepository, TimerRepository,
};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use libsql::{Connection, Database, Row, params};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

const SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS timers (
    id INTEGER PRIMARY KEY,
    duration_secs INTEGER NOT NULL,
    state TEXT NOT NULL,
    deleted_at TEXT
)"#,
    r#"
CREATE TABLE IF NOT EXISTS meetings (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    start_time TEXT,
    location TEXT,
    total_estimated_secs INTEGER,
    total_actual_secs INTEGER,
    host_member_id INTEGER
)"#,
    r#"
CREATE TABLE IF NOT EXISTS participants (
    id INTEGER PRIMARY KEY,
    meeting_id INTEGER NOT NULL,
    member_id INTEGER NOT NULL,
    UNIQUE (meeting_id, member_id)
)"#,
    "CREATE INDEX IF NOT EXISTS idx_participants_member ON participants (member_id)",
    r#"
CREATE TABLE IF NOT EXISTS agendas (
    id INTEGER PRIMARY KEY,
    meeting_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    type TEXT NOT NULL,
    status TEXT NOT NULL,
    estimated_secs INTEGER NOT NULL,
    actual_secs INTEGER
)"#,
    "CREATE INDEX IF NOT EXISTS idx_agendas_meeting ON agendas (meeting_id)",
    r#"
CREATE TABLE IF NOT EXISTS members (
    id INTEGER PRIMARY KEY,
    nickname TEXT NOT NULL,
    oauth_id INTEGER UNIQUE
)"#,
    // One row per id sequence (timers, meetings, participants, agendas).
    r#"
CREATE TABLE IF NOT EXISTS id_sequences (
    name TEXT PRIMARY KEY,
    value INTEGER NOT NULL
)"#,
];

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const MEETING_SELECT: &str = "SELECT id, title, start_time, location, total_estimated_secs, \
    total_actual_secs, host_member_id FROM meetings";

const PARTICIPANT_SELECT: &str = "SELECT id, meeting_id, member_id FROM participants";

fn repo_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

fn invalid(what: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(format!("invalid persisted data: {what}"))
}

/// SQLite store. Writes go through one connection so transactions never contend.
pub struct SqliteStore {
    // Kept alive for the lifetime of the connection.
    _db: Database,
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Connect to (or create) the database and ensure the schema exists.
    /// Call once at startup; share the returned store via `Arc`.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(repo_err)?;
        let db_path = base.join("timeet.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let conn = db.connect().map_err(repo_err)?;

        // PRAGMA returns a row; drain it (execute fails when rows are returned).
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::Repo(format!("{pragma} failed: {e}")))?;
            while rows.next().await.map_err(repo_err)?.is_some() {}
        }

        for ddl in SCHEMA {
            conn.execute(ddl, ()).await.map_err(repo_err)?;
        }

        info!(path = %db_path.display(), "SQLite store ready");

        Ok(Self {
            _db: db,
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    async fn next_value(&self, sequence: &str) -> Result<i64, DomainError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                r#"
                INSERT INTO id_sequences (name, value) VALUES (?1, 1)
                ON CONFLICT (name) DO UPDATE SET value = value + 1
                RETURNING value
                "#,
                params![sequence],
            )
            .await
            .map_err(repo_err)?;
        let row = rows
            .next()
            .await
            .map_err(repo_err)?
            .ok_or_else(|| invalid(format!("sequence {sequence} returned no row")))?;
        row.get::<i64>(0).map_err(repo_err)
    }

    async fn query_timers(
        &self,
        sql: &str,
        args: impl libsql::params::IntoParams,
    ) -> Result<Vec<Timer>, DomainError> {
        let conn = self.conn.lock().await;
        let mut rows = conn.query(sql, args).await.map_err(repo_err)?;
        let mut timers = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            timers.push(parse_timer_row(&row)?);
        }
        Ok(timers)
    }

    async fn query_agendas(
        &self,
        sql: &str,
        args: impl libsql::params::IntoParams,
    ) -> Result<Vec<Agenda>, DomainError> {
        let conn = self.conn.lock().await;
        let mut rows = conn.query(sql, args).await.map_err(repo_err)?;
        let mut agendas = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            agendas.push(parse_agenda_row(&row)?);
        }
        Ok(agendas)
    }

    async fn query_participants(
        &self,
        sql: &str,
        args: impl libsql::params::IntoParams,
    ) -> Result<Vec<Participant>, DomainError> {
        let conn = self.conn.lock().await;
        read_participants(&conn, sql, args).await
    }

    /// Meeting rows and their participants are read under one connection
    /// guard, so a concurrent save is seen whole or not at all.
    async fn load_meetings(&self, id: Option<MeetingId>) -> Result<Vec<Meeting>, DomainError> {
        let conn = self.conn.lock().await;
        let (rows, participants) = match id {
            Some(id) => {
                let rows = read_meeting_rows(
                    &conn,
                    &format!("{MEETING_SELECT} WHERE id = ?1"),
                    params![id.0],
                )
                .await?;
                if rows.is_empty() {
                    return Ok(Vec::new());
                }
                let participants = read_participants(
                    &conn,
                    &format!("{PARTICIPANT_SELECT} WHERE meeting_id = ?1 ORDER BY id"),
                    params![id.0],
                )
                .await?;
                (rows, participants)
            }
            None => {
                let rows =
                    read_meeting_rows(&conn, &format!("{MEETING_SELECT} ORDER BY id"), ())
                        .await?;
                let participants =
                    read_participants(&conn, &format!("{PARTICIPANT_SELECT} ORDER BY id"), ())
                        .await?;
                (rows, participants)
            }
        };
        drop(conn);

        let mut by_meeting: HashMap<MeetingId, Vec<Participant>> = HashMap::new();
        for p in participants {
            by_meeting.entry(p.meeting_id).or_default().push(p);
        }

        rows.into_iter()
            .map(|row| {
                let participants = by_meeting.remove(&row.id).unwrap_or_default();
                Meeting::restore(
                    row.id,
                    row.details,
                    row.total_actual,
                    row.host,
                    participants,
                )
            })
            .collect()
    }
}

async fn read_meeting_rows(
    conn: &Connection,
    sql: &str,
    args: impl libsql::params::IntoParams,
) -> Result<Vec<MeetingRow>, DomainError> {
    let mut rows = conn.query(sql, args).await.map_err(repo_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await.map_err(repo_err)? {
        out.push(parse_meeting_row(&row)?);
    }
    Ok(out)
}

async fn read_participants(
    conn: &Connection,
    sql: &str,
    args: impl libsql::params::IntoParams,
) -> Result<Vec<Participant>, DomainError> {
    let mut rows = conn.query(sql, args).await.map_err(repo_err)?;
    let mut participants = Vec::new();
    while let Some(row) = rows.next().await.map_err(repo_err)? {
        participants.push(Participant::new(
            ParticipantId(row.get::<i64>(0).map_err(repo_err)?),
            MeetingId(row.get::<i64>(1).map_err(repo_err)?),
            MemberId(row.get::<i64>(2).map_err(repo_err)?),
        ));
    }
    Ok(participants)
}

struct MeetingRow {
    id: MeetingId,
    details: MeetingCreateRequest,
    total_actual: Option<TimeDelta>,
    host: Option<MemberId>,
}

fn secs(d: TimeDelta) -> i64 {
    d.num_seconds()
}

fn from_secs(s: i64) -> Result<TimeDelta, DomainError> {
    TimeDelta::try_seconds(s).ok_or_else(|| invalid(format!("duration {s}s out of range")))
}

fn opt_from_secs(s: Option<i64>) -> Result<Option<TimeDelta>, DomainError> {
    s.map(from_secs).transpose()
}

fn parse_timer_row(row: &Row) -> Result<Timer, DomainError> {
    let id = TimerId(row.get::<i64>(0).map_err(repo_err)?);
    let duration = from_secs(row.get::<i64>(1).map_err(repo_err)?)?;
    let state_text: String = row.get::<String>(2).map_err(repo_err)?;
    let deleted_at: Option<String> = row.get::<String>(3).ok();
    let state = match (state_text.as_str(), deleted_at) {
        ("created", None) => TimerState::Created,
        ("running", None) => TimerState::Running,
        ("stopped", None) => TimerState::Stopped,
        ("deleted", Some(at)) => TimerState::Deleted {
            at: DateTime::parse_from_rfc3339(&at)
                .map_err(|_| invalid(format!("timers.deleted_at `{at}`")))?
                .with_timezone(&Utc),
        },
        (other, _) => return Err(invalid(format!("timer {id} state `{other}`"))),
    };
    Ok(Timer::restore(id, duration, state))
}

fn parse_meeting_row(row: &Row) -> Result<MeetingRow, DomainError> {
    let id = MeetingId(row.get::<i64>(0).map_err(repo_err)?);
    let start_time = match row.get::<String>(2).ok() {
        Some(s) => Some(
            NaiveDateTime::parse_from_str(&s, NAIVE_FORMAT)
                .map_err(|_| invalid(format!("meetings.start_time `{s}`")))?,
        ),
        None => None,
    };
    Ok(MeetingRow {
        id,
        details: MeetingCreateRequest {
            title: row.get::<String>(1).map_err(repo_err)?,
            start_time,
            location: row.get::<String>(3).ok(),
            total_estimated_duration: opt_from_secs(row.get::<i64>(4).ok())?,
        },
        total_actual: opt_from_secs(row.get::<i64>(5).ok())?,
        host: row.get::<i64>(6).ok().map(MemberId),
    })
}

fn parse_agenda_row(row: &Row) -> Result<Agenda, DomainError> {
    let id = AgendaId(row.get::<i64>(0).map_err(repo_err)?);
    let type_text: String = row.get::<String>(3).map_err(repo_err)?;
    let status_text: String = row.get::<String>(4).map_err(repo_err)?;
    Ok(Agenda {
        id,
        meeting_id: MeetingId(row.get::<i64>(1).map_err(repo_err)?),
        title: row.get::<String>(2).map_err(repo_err)?,
        kind: AgendaType::parse(&type_text)
            .ok_or_else(|| invalid(format!("agendas.type `{type_text}`")))?,
        status: AgendaStatus::parse(&status_text)
            .ok_or_else(|| invalid(format!("agendas.status `{status_text}`")))?,
        estimated_duration: from_secs(row.get::<i64>(5).map_err(repo_err)?)?,
        actual_duration: opt_from_secs(row.get::<i64>(6).ok())?,
    })
}

fn parse_member_row(row: &Row) -> Result<Member, DomainError> {
    Ok(Member {
        id: MemberId(row.get::<i64>(0).map_err(repo_err)?),
        nickname: row.get::<String>(1).map_err(repo_err)?,
        oauth_id: row.get::<i64>(2).ok(),
    })
}

/// Keep a sequence at or above an id that was assigned elsewhere.
const RAISE_SEQUENCE: &str = r#"
INSERT INTO id_sequences (name, value) VALUES (?1, ?2)
ON CONFLICT (name) DO UPDATE SET value = MAX(value, excluded.value)
"#;

#[async_trait::async_trait]
impl TimerRepository for SqliteStore {
    async fn next_id(&self) -> Result<TimerId, DomainError> {
        self.next_value("timers").await.map(TimerId)
    }

    async fn find_by_id(&self, id: TimerId) -> Result<Option<Timer>, DomainError> {
        let mut timers = self
            .query_timers(
                "SELECT id, duration_secs, state, deleted_at FROM timers WHERE id = ?1",
                params![id.0],
            )
            .await?;
        Ok(timers.pop())
    }

    async fn find_all(&self) -> Result<Vec<Timer>, DomainError> {
        self.query_timers(
            "SELECT id, duration_secs, state, deleted_at FROM timers \
             WHERE state != 'deleted' ORDER BY id",
            (),
        )
        .await
    }

    async fn save(&self, timer: &Timer) -> Result<Timer, DomainError> {
        let conn = self.conn.lock().await;
        let tx = conn.transaction().await.map_err(repo_err)?;
        tx.execute(
            r#"
            INSERT INTO timers (id, duration_secs, state, deleted_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (id) DO UPDATE SET
                duration_secs = excluded.duration_secs,
                state = excluded.state,
                deleted_at = excluded.deleted_at
            "#,
            params![
                timer.id.0,
                secs(timer.duration()),
                timer.state().as_str(),
                timer.deleted_at().map(|at| at.to_rfc3339())
            ],
        )
        .await
        .map_err(repo_err)?;
        tx.execute(RAISE_SEQUENCE, params!["timers", timer.id.0])
            .await
            .map_err(repo_err)?;
        tx.commit().await.map_err(repo_err)?;
        Ok(timer.clone())
    }
}


#[async_trait::async_trait]
impl MeetingRepository for SqliteStore {
    async fn next_id(&self) -> Result<MeetingId, DomainError> {
        self.next_value("meetings").await.map(MeetingId)
    }

    async fn next_participant_id(&self) -> Result<ParticipantId, DomainError> {
        self.next_value("participants").await.map(ParticipantId)
    }

    async fn find_by_id(&self, id: MeetingId) -> Result<Option<Meeting>, DomainError> {
        Ok(self.load_meetings(Some(id)).await?.pop())
    }

    async fn find_all(&self) -> Result<Vec<Meeting>, DomainError> {
        self.load_meetings(None).await
    }

    async fn save(&self, meeting: &Meeting) -> Result<Meeting, DomainError> {
        let conn = self.conn.lock().await;
        let tx = conn.transaction().await.map_err(repo_err)?;
        tx.execute(
            r#"
            INSERT INTO meetings (
                id, title, start_time, location,
                total_estimated_secs, total_actual_secs, host_member_id
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO UPDATE SET
                title = excluded.title,
                start_time = excluded.start_time,
                location = excluded.location,
                total_estimated_secs = excluded.total_estimated_secs,
                total_actual_secs = excluded.total_actual_secs,
                host_member_id = excluded.host_member_id
            "#,
            params![
                meeting.id.0,
                meeting.title.as_str(),
                meeting.start_time.map(|t| t.format(NAIVE_FORMAT).to_string()),
                meeting.location.clone(),
                meeting.total_estimated_duration.map(secs),
                meeting.total_actual_duration().map(secs),
                meeting.host_member_id().map(|m| m.0)
            ],
        )
        .await
        .map_err(repo_err)?;
        tx.execute(
            "DELETE FROM participants WHERE meeting_id = ?1",
            params![meeting.id.0],
        )
        .await
        .map_err(repo_err)?;
        let mut max_participant = 0i64;
        for p in meeting.participants() {
            tx.execute(
                "INSERT INTO participants (id, meeting_id, member_id) VALUES (?1, ?2, ?3)",
                params![p.id.0, p.meeting_id.0, p.member_id.0],
            )
            .await
            .map_err(repo_err)?;
            max_participant = max_participant.max(p.id.0);
        }
        tx.execute(RAISE_SEQUENCE, params!["meetings", meeting.id.0])
            .await
            .map_err(repo_err)?;
        tx.execute(RAISE_SEQUENCE, params!["participants", max_participant])
            .await
            .map_err(repo_err)?;
        tx.commit().await.map_err(repo_err)?;
        Ok(meeting.clone())
    }
}

#[async_trait::async_trait]
impl ParticipantRepository for SqliteStore {
    async fn find_by_meeting_id(&self, id: MeetingId) -> Result<Vec<Participant>, DomainError> {
        self.query_participants(
            &format!("{PARTICIPANT_SELECT} WHERE meeting_id = ?1 ORDER BY id"),
            params![id.0],
        )
        .await
    }

    async fn find_by_member_id(&self, id: MemberId) -> Result<Vec<Participant>, DomainError> {
        self.query_participants(
            &format!("{PARTICIPANT_SELECT} WHERE member_id = ?1 ORDER BY id"),
            params![id.0],
        )
        .await
    }
}

const AGENDA_SELECT: &str =
    "SELECT id, meeting_id, title, type, status, estimated_secs, actual_secs FROM agendas";

#[async_trait::async_trait]
impl AgendaRepository for SqliteStore {
    async fn next_id(&self) -> Result<AgendaId, DomainError> {
        self.next_value("agendas").await.map(AgendaId)
    }

    async fn find_by_id(&self, id: AgendaId) -> Result<Option<Agenda>, DomainError> {
        let mut agendas = self
            .query_agendas(&format!("{AGENDA_SELECT} WHERE id = ?1"), params![id.0])
            .await?;
        Ok(agendas.pop())
    }

    async fn find_all(&self) -> Result<Vec<Agenda>, DomainError> {
        self.query_agendas(&format!("{AGENDA_SELECT} ORDER BY id"), ())
            .await
    }

    async fn save(&self, agenda: &Agenda) -> Result<Agenda, DomainError> {
        let conn = self.conn.lock().await;
        let tx = conn.transaction().await.map_err(repo_err)?;
        tx.execute(
            r#"
            INSERT INTO agendas (id, meeting_id, title, type, status, estimated_secs, actual_secs)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO UPDATE SET
                meeting_id = excluded.meeting_id,
                title = excluded.title,
                type = excluded.type,
                status = excluded.status,
                estimated_secs = excluded.estimated_secs,
                actual_secs = excluded.actual_secs
            "#,
            params![
                agenda.id.0,
                agenda.meeting_id.0,
                agenda.title.as_str(),
                agenda.kind.as_str(),
                agenda.status.as_str(),
                secs(agenda.estimated_duration),
                agenda.actual_duration.map(secs)
            ],
        )
        .await
        .map_err(repo_err)?;
        tx.execute(RAISE_SEQUENCE, params!["agendas", agenda.id.0])
            .await
            .map_err(repo_err)?;
        tx.commit().await.map_err(repo_err)?;
        Ok(agenda.clone())
    }

    async fn find_by_meeting_id(&self, id: MeetingId) -> Result<Vec<Agenda>, DomainError> {
        self.query_agendas(
            &format!("{AGENDA_SELECT} WHERE meeting_id = ?1 ORDER BY id"),
            params![id.0],
        )
        .await
    }
}

#[async_trait::async_trait]
impl MemberRepository for SqliteStore {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, DomainError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT id, nickname, oauth_id FROM members WHERE id = ?1",
                params![id.0],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(parse_member_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_oauth_id(&self, oauth_id: i64) -> Result<Option<Member>, DomainError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(
                "SELECT id, nickname, oauth_id FROM members WHERE oauth_id = ?1",
                params![oauth_id],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(parse_member_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, member: &Member) -> Result<Member, DomainError> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"
            INSERT INTO members (id, nickname, oauth_id)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (id) DO UPDATE SET
                nickname = excluded.nickname,
                oauth_id = excluded.oauth_id
            "#,
            params![member.id.0, member.nickname.as_str(), member.oauth_id],
        )
        .await
        .map_err(repo_err)?;
        Ok(member.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgendaCreateRequest, HostSelector, TimerCreateRequest};
    use std::sync::Arc;

    struct FirstSelector;

    impl HostSelector for FirstSelector {
        fn select(&self, candidates: &[MemberId]) -> Option<MemberId> {
            candidates.first().copied()
        }
    }

    async fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn timer_round_trip_including_tombstone() {
        let (_dir, store) = store().await;
        let id = TimerRepository::next_id(&store).await.unwrap();
        let mut timer = TimerCreateRequest::new(TimeDelta::minutes(30))
            .into_timer(id)
            .unwrap();
        TimerRepository::save(&store, &timer).await.unwrap();
        assert_eq!(
            TimerRepository::find_by_id(&store, id).await.unwrap(),
            Some(timer.clone())
        );

        timer.delete(Utc::now()).unwrap();
        TimerRepository::save(&store, &timer).await.unwrap();
        let loaded = TimerRepository::find_by_id(&store, id)
            .await
            .unwrap()
            .unwrap();
        assert!(loaded.is_deleted());
        assert!(TimerRepository::find_all(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn meeting_and_participants_persist_together() {
        let (_dir, store) = store().await;
        let id = MeetingRepository::next_id(&store).await.unwrap();
        let host_pid = store.next_participant_id().await.unwrap();
        let mut meeting = MeetingCreateRequest {
            title: "Retro".into(),
            start_time: NaiveDateTime::parse_from_str("2026-10-18T09:30:00", NAIVE_FORMAT).ok(),
            location: Some("Online".into()),
            total_estimated_duration: Some(TimeDelta::hours(2)),
        }
        .into_meeting(id, host_pid, MemberId(1))
        .unwrap();
        let pid = store.next_participant_id().await.unwrap();
        meeting.add_participant(pid, MemberId(2)).unwrap();
        meeting.finish(TimeDelta::minutes(90)).unwrap();
        MeetingRepository::save(&store, &meeting).await.unwrap();

        let loaded = MeetingRepository::find_by_id(&store, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, meeting);
        assert_eq!(store.find_by_member_id(MemberId(2)).await.unwrap().len(), 1);

        meeting.remove_participant(MemberId(1), &FirstSelector).unwrap();
        MeetingRepository::save(&store, &meeting).await.unwrap();
        let loaded = MeetingRepository::find_by_id(&store, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.host_member_id(), Some(MemberId(2)));
        assert!(store.find_by_member_id(MemberId(1)).await.unwrap().is_empty());
        assert_eq!(MeetingRepository::find_all(&store).await.unwrap().len(), 1);
    }

    fn untitled(title: &str) -> MeetingCreateRequest {
        MeetingCreateRequest {
            title: title.into(),
            start_time: None,
            location: None,
            total_estimated_duration: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn meeting_reads_never_see_half_a_save() {
        let (_dir, store) = store().await;
        let store = Arc::new(store);
        let id = MeetingRepository::next_id(store.as_ref()).await.unwrap();
        let host_pid = store.next_participant_id().await.unwrap();
        let meeting = untitled("Churn")
            .into_meeting(id, host_pid, MemberId(1))
            .unwrap();
        MeetingRepository::save(store.as_ref(), &meeting).await.unwrap();

        // Each save swaps both the host and the whole participant set.
        let writer = tokio::spawn({
            let store = Arc::clone(&store);
            async move {
                let mut meeting = meeting;
                for n in 2..=201 {
                    let pid = store.next_participant_id().await.unwrap();
                    meeting.add_participant(pid, MemberId(n)).unwrap();
                    let host = meeting.host_member_id().unwrap();
                    meeting.remove_participant(host, &FirstSelector).unwrap();
                    MeetingRepository::save(store.as_ref(), &meeting).await.unwrap();
                }
            }
        });

        for _ in 0..400 {
            let loaded = MeetingRepository::find_by_id(store.as_ref(), id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(loaded.participants().len(), 1);
            assert_eq!(
                loaded.host_member_id(),
                Some(loaded.participants()[0].member_id)
            );
        }
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn failed_meeting_save_keeps_previous_rows() {
        let (_dir, store) = store().await;
        let id = MeetingRepository::next_id(&store).await.unwrap();
        let host_pid = store.next_participant_id().await.unwrap();
        let meeting = untitled("a").into_meeting(id, host_pid, MemberId(1)).unwrap();
        MeetingRepository::save(&store, &meeting).await.unwrap();

        // Reusing the host's participant id fails on the second insert.
        let mut broken = meeting.clone();
        broken.title = "b".into();
        broken.add_participant(host_pid, MemberId(2)).unwrap();
        assert!(matches!(
            MeetingRepository::save(&store, &broken).await,
            Err(DomainError::Repo(_))
        ));

        let loaded = MeetingRepository::find_by_id(&store, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, meeting);
        assert_eq!(
            ParticipantRepository::find_by_meeting_id(&store, id)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(store.find_by_member_id(MemberId(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_by_id_only_attaches_own_participants() {
        let (_dir, store) = store().await;
        for (member, title) in [(MemberId(1), "first"), (MemberId(2), "second")] {
            let id = MeetingRepository::next_id(&store).await.unwrap();
            let pid = store.next_participant_id().await.unwrap();
            let meeting = untitled(title).into_meeting(id, pid, member).unwrap();
            MeetingRepository::save(&store, &meeting).await.unwrap();
        }
        let second = MeetingRepository::find_by_id(&store, MeetingId(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.participants().len(), 1);
        assert_eq!(second.host_member_id(), Some(MemberId(2)));
        assert_eq!(MeetingRepository::find_by_id(&store, MeetingId(9)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn agendas_are_listed_per_meeting() {
        let (_dir, store) = store().await;
        for meeting in [MeetingId(1), MeetingId(1), MeetingId(2)] {
            let id = AgendaRepository::next_id(&store).await.unwrap();
            let agenda = AgendaCreateRequest {
                title: format!("agenda {id}"),
                kind: AgendaType::Agenda,
                estimated_duration: TimeDelta::minutes(10),
            }
            .into_agenda(id, meeting)
            .unwrap();
            AgendaRepository::save(&store, &agenda).await.unwrap();
        }
        let first = AgendaRepository::find_by_meeting_id(&store, MeetingId(1))
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].status, AgendaStatus::Pending);
        assert_eq!(first[0].actual_duration, None);
        assert_eq!(AgendaRepository::find_all(&store).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn sequences_never_reuse_ids() {
        let (_dir, store) = store().await;
        let timer = TimerCreateRequest::new(TimeDelta::minutes(1))
            .into_timer(TimerId(10))
            .unwrap();
        TimerRepository::save(&store, &timer).await.unwrap();
        assert_eq!(TimerRepository::next_id(&store).await.unwrap(), TimerId(11));
    }

    #[tokio::test]
    async fn member_lookup_by_oauth_id() {
        let (_dir, store) = store().await;
        let member = Member::new(MemberId(3), "lee").with_oauth_id(77);
        MemberRepository::save(&store, &member).await.unwrap();
        assert_eq!(store.find_by_oauth_id(77).await.unwrap(), Some(member.clone()));
        assert_eq!(
            MemberRepository::find_by_id(&store, MemberId(3)).await.unwrap(),
            Some(member)
        );
    }
}
