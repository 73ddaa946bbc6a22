use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Either, Executor, Statement, TypeInfo};

use crate::db::{params, parse_connection_string, DatabaseDriver};
use crate::error::DbError;
use crate::models::ParamValue;

pub const DEFAULT_PORT: u16 = 5432;

pub struct PostgresDriver {
    pool: Option<sqlx::PgPool>,
}

impl PostgresDriver {
    pub fn new() -> Self {
        Self { pool: None }
    }
}

impl Default for PostgresDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn required<'a>(pairs: &'a HashMap<String, String>, key: &str) -> Result<&'a str, DbError> {
    pairs
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DbError::InvalidConnectionString(format!("'{key}' is not set")))
}

fn parse_port(text: &str) -> Result<u16, DbError> {
    text.trim()
        .parse()
        .map_err(|_| DbError::InvalidConnectionString(format!("invalid port '{text}'")))
}

fn connect_options(connection_string: &str) -> Result<PgConnectOptions, DbError> {
    let pairs = parse_connection_string(connection_string)?;

    // `server=host,port` is accepted as well as a separate `port` key.
    let server = required(&pairs, "server")?;
    let (host, mut port) = match server.split_once(',') {
        Some((host, port)) => (host, parse_port(port)?),
        None => (server, DEFAULT_PORT),
    };
    if let Some(text) = pairs.get("port").filter(|p| !p.is_empty()) {
        port = parse_port(text)?;
    }

    let mut options = PgConnectOptions::new()
        .host(host)
        .port(port)
        .username(required(&pairs, "user id")?)
        .database(required(&pairs, "database")?);
    if let Some(password) = pairs.get("password").filter(|p| !p.is_empty()) {
        options = options.password(password);
    }
    Ok(options)
}

/// Type names that can be spliced into `CAST(.. AS <name>)` as they are.
fn is_plain_type_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '[' | ']'))
}

/// One entry per bound value: the server-inferred type to cast to, or `None` when the
/// value is already sent as that type.
fn placeholder_casts(declared: &[String], values: &[ParamValue]) -> Vec<Option<String>> {
    values
        .iter()
        .zip(declared)
        .map(|(value, ty)| {
            let sent = match value {
                ParamValue::Int(_) => "INT8",
                ParamValue::Text(_) => "TEXT",
            };
            let skip = ty.eq_ignore_ascii_case(sent)
                || ty.eq_ignore_ascii_case("UNKNOWN")
                || !is_plain_type_name(ty);
            (!skip).then(|| ty.clone())
        })
        .collect()
}

#[async_trait]
impl DatabaseDriver for PostgresDriver {
    async fn connect(&mut self, connection_string: &str) -> Result<(), DbError> {
        let options = connect_options(connection_string)?;

        // One connection per action; nothing is shared between actions.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection(Box::new(e)))?;

        self.pool = Some(pool);
        Ok(())
    }

    async fn ping(&self) -> Result<(), DbError> {
        let pool = self.pool.as_ref().ok_or(DbError::NotConnected)?;
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| DbError::Connection(Box::new(e)))?;
        Ok(())
    }

    async fn execute(&self, statement: &str, values: &[ParamValue]) -> Result<u64, DbError> {
        let pool = self.pool.as_ref().ok_or(DbError::NotConnected)?;

        let mut conn = pool
            .acquire()
            .await
            .map_err(|e| DbError::Connection(Box::new(e)))?;

        // Preparing without types lets the server infer one per placeholder; values are
        // then sent as text or int8 and cast to that type in the statement itself.
        let untyped = params::to_positional(statement);
        let prepared = (&mut *conn)
            .prepare(&untyped)
            .await
            .map_err(|e| DbError::Prepare(Box::new(e)))?;
        let declared: Vec<String> = match prepared.parameters() {
            Some(Either::Left(types)) => types.iter().map(|t| t.name().to_string()).collect(),
            _ => Vec::new(),
        };
        let sql = params::to_positional_cast(statement, &placeholder_casts(&declared, values));

        let mut query = sqlx::query(&sql);
        for value in values {
            query = match value {
                ParamValue::Int(v) => query.bind(*v),
                ParamValue::Text(v) => query.bind(v.as_str()),
            };
        }

        let result = query
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::Exec(Box::new(e)))?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_when_absent() {
        let options = connect_options("server=h;user id=u;password=;database=d;").unwrap();
        assert_eq!(options.get_port(), DEFAULT_PORT);
        assert_eq!(options.get_host(), "h");
        assert_eq!(options.get_database(), Some("d"));
    }

    #[test]
    fn port_can_ride_on_server() {
        let options = connect_options("server=h,6543;user id=u;database=d;").unwrap();
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_host(), "h");
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(matches!(
            connect_options("server=h;port=abc;user id=u;database=d;"),
            Err(DbError::InvalidConnectionString(_))
        ));
    }

    fn names(types: &[&str]) -> Vec<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn values_are_cast_to_inferred_types() {
        let casts = placeholder_casts(
            &names(&["TEXT", "INT4"]),
            &[ParamValue::from("Logged"), ParamValue::from("42")],
        );
        assert_eq!(casts, vec![None, Some("INT4".to_string())]);
        assert_eq!(
            params::to_positional_cast("UPDATE t SET status=@Status WHERE id=@IssueID", &casts),
            "UPDATE t SET status=$1 WHERE id=CAST($2 AS INT4)"
        );
    }

    #[test]
    fn mapped_integers_are_cast_into_text_columns() {
        let casts = placeholder_casts(
            &names(&["TEXT", "INT8"]),
            &[ParamValue::Int(2), ParamValue::Int(7)],
        );
        assert_eq!(casts, vec![Some("TEXT".to_string()), None]);
    }

    #[test]
    fn odd_type_names_are_left_uncast() {
        let casts = placeholder_casts(
            &names(&["UNKNOWN", "\"Mood\"; DROP", "INT4[]"]),
            &[ParamValue::from("a"), ParamValue::from("b"), ParamValue::from("{1,2}")],
        );
        assert_eq!(casts, vec![None, None, Some("INT4[]".to_string())]);
    }

    #[test]
    fn missing_user_is_rejected() {
        assert!(matches!(
            connect_options("server=h;database=d;"),
            Err(DbError::InvalidConnectionString(_))
        ));
    }
}
