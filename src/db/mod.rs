use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use async_trait::async_trait;

use crate::error::DbError;
use crate::models::{ParamValue, ServerConfig};
use crate::storage::ConfigStore;

pub mod params;
pub mod postgres;

#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    async fn connect(&mut self, connection_string: &str) -> Result<(), DbError>;
    async fn ping(&self) -> Result<(), DbError>;
    /// Prepares `statement`, binds `values` positionally and returns rows affected.
    async fn execute(&self, statement: &str, values: &[ParamValue]) -> Result<u64, DbError>;
    async fn close(&self);
}

/// `server=..;port=..;user id=..;password=..;database=..;` with `port` left out when unset.
/// Values holding delimiters, quotes or edge whitespace are double-quoted.
pub fn connection_string(config: &ServerConfig) -> String {
    let mut out = format!("server={};", quote_value(&config.host));
    if !config.port.is_empty() {
        out.push_str(&format!("port={};", quote_value(&config.port)));
    }
    out.push_str(&format!(
        "user id={};password={};database={};",
        quote_value(&config.username),
        quote_value(&config.password),
        quote_value(&config.database)
    ));
    out
}

fn quote_value(value: &str) -> String {
    if value.contains([';', '=', '"', '\'', '{', '}']) || value.trim() != value {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Splits a connection string into lower-cased keys and values. Values may be quoted
/// with `"` or `'`; a doubled quote inside stands for one.
pub fn parse_connection_string(text: &str) -> Result<HashMap<String, String>, DbError> {
    let mut pairs = HashMap::new();
    let mut chars = text.chars().peekable();
    loop {
        while chars.next_if(|c| *c == ';' || c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        loop {
            match chars.next() {
                Some('=') => break,
                Some(';') | None => {
                    return Err(DbError::InvalidConnectionString(format!(
                        "'{}' has no '='",
                        key.trim()
                    )))
                }
                Some(c) => key.push(c),
            }
        }
        let value = read_value(&mut chars)?;
        pairs.insert(key.trim().to_ascii_lowercase(), value);
    }
    Ok(pairs)
}

fn read_value(chars: &mut Peekable<Chars<'_>>) -> Result<String, DbError> {
    while chars.next_if_eq(&' ').is_some() {}

    let Some(quote) = chars.next_if(|c| *c == '"' || *c == '\'') else {
        let mut value = String::new();
        while let Some(c) = chars.next_if(|c| *c != ';') {
            value.push(c);
        }
        return Ok(value.trim_end().to_string());
    };

    let mut value = String::new();
    loop {
        match chars.next() {
            Some(c) if c == quote => {
                if chars.next_if_eq(&quote).is_none() {
                    break;
                }
                value.push(quote);
            }
            Some(c) => value.push(c),
            None => {
                return Err(DbError::InvalidConnectionString(
                    "unterminated quoted value".to_string(),
                ))
            }
        }
    }

    while chars.next_if_eq(&' ').is_some() {}
    match chars.next() {
        None | Some(';') => Ok(value),
        Some(c) => Err(DbError::InvalidConnectionString(format!(
            "unexpected '{c}' after quoted value"
        ))),
    }
}

/// Opens `driver` against the saved settings of `server_name` and pings it.
pub async fn connect_server(
    store: &ConfigStore,
    mut driver: Box<dyn DatabaseDriver>,
    server_name: &str,
) -> Result<Box<dyn DatabaseDriver>, DbError> {
    let config = store.load(server_name)?;
    tracing::info!(server = server_name, host = %config.host, "connecting");

    driver.connect(&connection_string(&config)).await?;
    if let Err(e) = driver.ping().await {
        driver.close().await;
        return Err(e);
    }
    Ok(driver)
}
