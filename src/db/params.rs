//! `@name` placeholder handling: discovery, binding by name, and execution.

use std::collections::HashMap;

use crate::db::DatabaseDriver;
use crate::error::DbError;
use crate::models::ParamValue;

pub type NamedParams = HashMap<String, ParamValue>;

/// Outcome of a successful statement run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub rows_affected: u64,
    /// `[name: value]` pairs in placeholder order. Not redacted.
    pub trace: String,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte ranges of every `@name` placeholder, `@` included. A bare `@` is not a placeholder.
fn placeholder_spans(statement: &str) -> Vec<(usize, usize)> {
    let bytes = statement.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'@' {
            let start = i;
            let mut end = i + 1;
            while end < bytes.len() && is_name_byte(bytes[end]) {
                end += 1;
            }
            if end > start + 1 {
                spans.push((start, end));
            }
            i = end;
        } else {
            i += 1;
        }
    }
    spans
}

/// Placeholder names in order of appearance, duplicates included.
pub fn extract_parameter_names(statement: &str) -> Vec<String> {
    placeholder_spans(statement)
        .into_iter()
        .map(|(start, end)| statement[start + 1..end].to_string())
        .collect()
}

/// One value per placeholder occurrence. Fails on the first name without a value.
pub fn bind(statement: &str, params: &NamedParams) -> Result<Vec<ParamValue>, DbError> {
    extract_parameter_names(statement)
        .into_iter()
        .map(|name| match params.get(&name) {
            Some(value) => Ok(value.clone()),
            None => Err(DbError::MissingParameter(name)),
        })
        .collect()
}

/// Rewrites each placeholder occurrence to `$1`, `$2`, ... matching the order of [`bind`].
pub fn to_positional(statement: &str) -> String {
    to_positional_cast(statement, &[])
}

/// Like [`to_positional`], but occurrence `n` becomes `CAST($n AS <type>)` when
/// `casts[n - 1]` names a type.
pub fn to_positional_cast(statement: &str, casts: &[Option<String>]) -> String {
    let mut out = String::with_capacity(statement.len());
    let mut last = 0;
    for (n, (start, end)) in placeholder_spans(statement).into_iter().enumerate() {
        out.push_str(&statement[last..start]);
        match casts.get(n).and_then(Option::as_deref) {
            Some(ty) => out.push_str(&format!("CAST(${} AS {ty})", n + 1)),
            None => out.push_str(&format!("${}", n + 1)),
        }
        last = end;
    }
    out.push_str(&statement[last..]);
    out
}

/// Human-readable listing of whatever is bound, in placeholder order.
pub fn trace(statement: &str, params: &NamedParams) -> String {
    extract_parameter_names(statement)
        .iter()
        .map(|name| match params.get(name) {
            Some(value) => format!("[{name}: {value}]"),
            None => format!("[{name}: <unset>]"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Binds and runs `statement` on an open driver. The driver is left open either way.
pub async fn execute(
    driver: &dyn DatabaseDriver,
    statement: &str,
    params: &NamedParams,
) -> Result<Execution, DbError> {
    let values = bind(statement, params)?;
    let rows_affected = driver.execute(statement, &values).await?;
    Ok(Execution {
        rows_affected,
        trace: trace(statement, params),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pairs: &[(&str, &str)]) -> NamedParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), ParamValue::from(*v)))
            .collect()
    }

    #[test]
    fn names_keep_order_and_duplicates() {
        assert_eq!(extract_parameter_names("@a @b @a"), vec!["a", "b", "a"]);
    }

    #[test]
    fn names_stop_at_non_word_characters() {
        assert_eq!(
            extract_parameter_names("WHERE X=@Issue_ID1, Y=(@b)+@c;"),
            vec!["Issue_ID1", "b", "c"]
        );
    }

    #[test]
    fn bare_at_signs_are_ignored() {
        assert_eq!(extract_parameter_names("a @ b @@x"), vec!["x"]);
        assert_eq!(to_positional("a @ b @@x"), "a @ b @$1");
    }

    #[test]
    fn bind_follows_placeholder_order() {
        let values = bind(
            "UPDATE T SET Status=@Status WHERE ID=@IssueID",
            &named(&[("IssueID", "42"), ("Status", "Logged")]),
        )
        .unwrap();
        assert_eq!(values, vec![ParamValue::from("Logged"), ParamValue::from("42")]);
    }

    #[test]
    fn bind_names_the_first_missing_key() {
        let err = bind("@a @b @c", &named(&[("a", "1")])).unwrap_err();
        assert!(matches!(err, DbError::MissingParameter(ref name) if name == "b"));
    }

    #[test]
    fn positional_rewrite_numbers_each_occurrence() {
        assert_eq!(
            to_positional("SELECT @a, @b, @a FROM t"),
            "SELECT $1, $2, $3 FROM t"
        );
    }

    #[test]
    fn casts_wrap_only_the_named_occurrences() {
        let casts = vec![None, Some("INT4".to_string())];
        assert_eq!(
            to_positional_cast("UPDATE t SET s=@Status WHERE id=@IssueID", &casts),
            "UPDATE t SET s=$1 WHERE id=CAST($2 AS INT4)"
        );
        assert_eq!(to_positional_cast("@a @b", &[]), "$1 $2");
    }

    #[test]
    fn trace_lists_pairs() {
        let text = trace("@x @y", &named(&[("x", "1")]));
        assert_eq!(text, "[x: 1] [y: <unset>]");
    }
}
