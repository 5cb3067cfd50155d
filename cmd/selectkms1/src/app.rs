use std::io::Write;

use sfkms_snowflake::db::{Db, OpenOptions};

use crate::config::assemble;
use crate::env::Environment;
use crate::error::Error;

pub const QUERY: &str = "SELECT 1";

/// How a run that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `SELECT 1` returned 1.
    Success,
    /// The row stream failed after the query succeeded. Reported on `out`, not fatal.
    RowError,
}

/// Assembles the config from `env`, runs [`QUERY`] and writes the report to `out`.
pub async fn run(env: &dyn Environment, options: OpenOptions, out: &mut impl Write) -> Result<Outcome, Error> {
    let assembled = assemble(env)?;
    tracing::debug!("config = {:?}", assembled.config);

    let db = Db::open_with_options(&assembled.dsn, options).map_err(|source| Error::Open {
        dsn: assembled.dsn.clone(),
        source,
    })?;
    let result = query(&db, out).await;
    db.close();
    result
}

async fn query(db: &Db, out: &mut impl Write) -> Result<Outcome, Error> {
    let mut rows = db.query(QUERY).await.map_err(|source| Error::Query {
        query: QUERY.to_string(),
        source,
    })?;
    loop {
        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => {
                writeln!(out, "ERROR: {e}")?;
                return Ok(Outcome::RowError);
            }
        };
        let v: i64 = row.column(0).map_err(Error::Scan)?;
        if v != 1 {
            return Err(Error::Mismatch(v));
        }
    }
    writeln!(out, "Congrats! You have successfully run {QUERY} with Snowflake DB!")?;
    Ok(Outcome::Success)
}
