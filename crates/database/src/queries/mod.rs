use std::fmt::Write as _;

use pipeline::store::StoreError;
use sqlx::postgres::{PgArguments, PgQueryResult};
use sqlx::query::Query;
use sqlx::{Executor, Postgres};

pub mod station;
pub mod trip;

pub(crate) fn convert_error(why: sqlx::Error) -> StoreError {
    StoreError::other(why)
}

// bulk insert

pub(crate) fn build_insert_sql(
    table: &str,
    columns: &[&str],
    row_count: usize,
) -> String {
    let mut query_str =
        format!("INSERT INTO {} ({}) VALUES ", table, columns.join(", "));
    let mut placeholder_index = 1;
    for i in 0..row_count {
        if i > 0 {
            query_str.push_str(", ");
        }
        query_str.push('(');
        for j in 0..columns.len() {
            if j > 0 {
                query_str.push_str(", ");
            }
            let _ = write!(&mut query_str, "${}", placeholder_index);
            placeholder_index += 1;
        }
        query_str.push(')');
    }
    query_str.push(';');
    query_str
}

/// Inserts all values with one multi-row statement. Callers keep value
/// slices below Postgres' bind parameter limit by chunking beforehand.
pub async fn insert_all<'c, E, T, B>(
    executor: E,
    table: &str,
    columns: &[&str],
    values: &[T],
    bind: B,
) -> Result<PgQueryResult, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
    for<'a> B:
        Fn(Query<'a, Postgres, PgArguments>, &T) -> Query<'a, Postgres, PgArguments>,
{
    let query_str = build_insert_sql(table, columns, values.len());
    let mut query = sqlx::query::<Postgres>(&query_str);
    for value in values {
        query = bind(query, value);
    }
    query.execute(executor).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sql_numbers_placeholders_row_by_row() {
        let sql = build_insert_sql("stations", &["id", "name"], 3);
        assert_eq!(
            sql,
            "INSERT INTO stations (id, name) VALUES \
             ($1, $2), ($3, $4), ($5, $6);"
        );
    }

    #[test]
    fn insert_sql_single_row() {
        let sql = build_insert_sql("trips", &["id"], 1);
        assert_eq!(sql, "INSERT INTO trips (id) VALUES ($1);");
    }
}
