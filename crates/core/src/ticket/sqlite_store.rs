//! SQLite-backed ticket store implementation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};

use crate::clock::Clock;

use super::{
    Actor, CloseReason, CreateTicketRequest, StoreStats, ThreadMessage, Ticket, TicketError,
    TicketFilter, TicketMutation, TicketPolicy, TicketStatus, TicketStore,
};

const TICKET_COLUMNS: &str =
    "id, user_id, status, last_actor, created_at, updated_at, closed_at, closed_reason, messages, version";

/// SQLite-backed ticket store.
///
/// Mutations are serialized per ticket id through a lock map, so two tickets
/// update independently while a single ticket never sees interleaved
/// read-modify-write cycles. The row write itself is a compare-and-swap on
/// the `version` column, which catches writers that bypass the gate.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    policy: TicketPolicy,
    clock: Arc<dyn Clock>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and
    /// tables if needed.
    pub fn new(
        path: &Path,
        policy: TicketPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            gates: Mutex::new(HashMap::new()),
            policy,
            clock,
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory(policy: TicketPolicy, clock: Arc<dyn Clock>) -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            gates: Mutex::new(HashMap::new()),
            policy,
            clock,
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                last_actor TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                closed_at TEXT,
                closed_reason TEXT,
                messages TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_user_id ON tickets(user_id);
            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            CREATE INDEX IF NOT EXISTS idx_tickets_updated_at ON tickets(updated_at);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    /// Per-ticket mutation gate.
    fn gate(&self, id: &str) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().unwrap();
        Arc::clone(gates.entry(id.to_string()).or_default())
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(user_id) = filter.user_id {
            conditions.push("user_id = ?");
            params.push(Box::new(user_id));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let id: String = row.get(0)?;
        let user_id: i64 = row.get(1)?;
        let status_str: String = row.get(2)?;
        let last_actor_str: String = row.get(3)?;
        let created_at_str: String = row.get(4)?;
        let updated_at_str: String = row.get(5)?;
        let closed_at_str: Option<String> = row.get(6)?;
        let closed_reason_str: Option<String> = row.get(7)?;
        let messages_json: String = row.get(8)?;
        let version: i64 = row.get(9)?;

        // Parse timestamps - use current time if parsing fails (shouldn't
        // happen with valid data)
        let created_at = parse_timestamp(&created_at_str);
        let updated_at = parse_timestamp(&updated_at_str);
        let closed_at = closed_at_str.as_deref().map(parse_timestamp);

        // Parse enums and JSON - these should never fail with valid data
        let status = TicketStatus::parse(&status_str).unwrap_or(TicketStatus::New);
        let last_actor = Actor::parse(&last_actor_str).unwrap_or(Actor::User);
        let closed_reason = closed_reason_str.as_deref().and_then(CloseReason::parse);
        let messages: Vec<ThreadMessage> =
            serde_json::from_str(&messages_json).unwrap_or_default();

        Ok(Ticket {
            id,
            user_id,
            status,
            last_actor,
            created_at,
            updated_at,
            closed_at,
            closed_reason,
            messages,
            version,
        })
    }

    fn fetch(&self, id: &str) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {} FROM tickets WHERE id = ?", TICKET_COLUMNS),
            params![id],
            Self::row_to_ticket,
        );

        match result {
            Ok(ticket) => Ok(ticket),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(TicketError::NotFound(id.to_string())),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        // Open-ticket cap, checked under the connection lock so concurrent
        // creates for the same user cannot both pass.
        if self.policy.max_open_per_user > 0 {
            let open: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM tickets WHERE user_id = ? AND status != 'closed'",
                    params![request.user_id],
                    |row| row.get(0),
                )
                .map_err(|e| TicketError::Database(e.to_string()))?;

            if open >= self.policy.max_open_per_user as i64 {
                return Err(TicketError::DuplicateOpenTicket {
                    user_id: request.user_id,
                    open,
                    limit: self.policy.max_open_per_user,
                });
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = self.clock.now();

        let messages = vec![ThreadMessage {
            sender: Actor::User,
            sent_at: now,
            body: request.initial_message,
        }];
        let messages_json =
            serde_json::to_string(&messages).map_err(|e| TicketError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO tickets (id, user_id, status, last_actor, created_at, updated_at, closed_at, closed_reason, messages, version) \
             VALUES (?, ?, ?, ?, ?, ?, NULL, NULL, ?, 0)",
            params![
                id,
                request.user_id,
                TicketStatus::New.as_str(),
                Actor::User.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
                messages_json,
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            id,
            user_id: request.user_id,
            status: TicketStatus::New,
            last_actor: Actor::User,
            created_at: now,
            updated_at: now,
            closed_at: None,
            closed_reason: None,
            messages,
            version: 0,
        })
    }

    fn get(&self, id: &str) -> Result<Ticket, TicketError> {
        self.fetch(id)
    }

    fn update(&self, id: &str, mutation: TicketMutation<'_>) -> Result<Ticket, TicketError> {
        let gate = self.gate(id);
        let _guard = gate.lock().unwrap();

        let mut ticket = self.fetch(id)?;
        let expected_version = ticket.version;

        mutation(&mut ticket)?;

        ticket.updated_at = self.clock.now();
        ticket.version = expected_version + 1;

        let messages_json = serde_json::to_string(&ticket.messages)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "UPDATE tickets SET status = ?, last_actor = ?, updated_at = ?, closed_at = ?, closed_reason = ?, messages = ?, version = ? \
                 WHERE id = ? AND version = ?",
                params![
                    ticket.status.as_str(),
                    ticket.last_actor.as_str(),
                    ticket.updated_at.to_rfc3339(),
                    ticket.closed_at.map(|t| t.to_rfc3339()),
                    ticket.closed_reason.map(|r| r.as_str()),
                    messages_json,
                    ticket.version,
                    id,
                    expected_version,
                ],
            )
            .map_err(|e| TicketError::Database(e.to_string()))?
        };

        if rows == 0 {
            // The row vanished or an out-of-gate writer bumped the version.
            return match self.fetch(id) {
                Ok(_) => Err(TicketError::Conflict(id.to_string())),
                Err(e) => Err(e),
            };
        }

        Ok(ticket)
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM tickets {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            TICKET_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(count)
    }

    fn list_idle_support_last(&self, older_than: Duration) -> Result<Vec<Ticket>, TicketError> {
        let cutoff = self.clock.now() - older_than;
        let conn = self.conn.lock().unwrap();

        let sql = format!(
            "SELECT {} FROM tickets \
             WHERE status != 'closed' AND last_actor = 'support' AND updated_at <= ? \
             ORDER BY updated_at ASC",
            TICKET_COLUMNS
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![cutoff.to_rfc3339()], Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    fn stats(&self) -> Result<StoreStats, TicketError> {
        let conn = self.conn.lock().unwrap();

        let count_status = |status: &str| -> Result<i64, TicketError> {
            conn.query_row(
                "SELECT COUNT(*) FROM tickets WHERE status = ?",
                params![status],
                |row| row.get(0),
            )
            .map_err(|e| TicketError::Database(e.to_string()))
        };

        let new = count_status("new")?;
        let in_progress = count_status("in_progress")?;
        let closed = count_status("closed")?;

        let messages: i64 = conn
            .query_row(
                "SELECT COALESCE(SUM(json_array_length(messages)), 0) FROM tickets",
                [],
                |row| row.get(0),
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(StoreStats {
            total: new + in_progress + closed,
            new,
            in_progress,
            closed,
            messages,
        })
    }
}
