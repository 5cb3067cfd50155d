use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cancel::CancellationToken;
use crate::error::Error;
use crate::http::snowflake_client::SnowflakeClient;
use crate::http::statement::{ResultSet, RowType, Value};

/// Rows of a completed statement. The first partition arrives with the result set, the
/// others are fetched as the iterator reaches them.
pub struct Rows {
    client: SnowflakeClient,
    statement_handle: String,
    columns: Vec<RowType>,
    chunk: VecDeque<Vec<Value>>,
    next_partition: usize,
    partition_count: usize,
    pub total_size: i64,
    cancel: Option<CancellationToken>,
    closed: Arc<AtomicBool>,
}

impl Rows {
    pub(crate) fn new(
        client: SnowflakeClient,
        result: ResultSet,
        cancel: Option<CancellationToken>,
        closed: Arc<AtomicBool>,
    ) -> Self {
        let metadata = result.result_set_meta_data.unwrap_or_default();
        Self {
            client,
            statement_handle: result.statement_handle,
            columns: metadata.row_type,
            chunk: VecDeque::from(result.data),
            next_partition: 1,
            partition_count: metadata.partition_info.len(),
            total_size: metadata.num_rows,
            cancel,
            closed,
        }
    }

    pub fn columns(&self) -> &[RowType] {
        &self.columns
    }

    pub fn statement_handle(&self) -> &str {
        &self.statement_handle
    }

    /// Next row, `None` once every partition is consumed. An error here means the stream
    /// broke after the statement itself succeeded, or that the [`crate::db::Db`] was closed.
    pub async fn next(&mut self) -> Result<Option<row::Row>, Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        loop {
            if let Some(v) = self.chunk.pop_front() {
                return Ok(Some(row::Row::from(v)));
            }
            if self.next_partition >= self.partition_count {
                return Ok(None);
            }
            let fetch = async {
                Ok::<_, Error>(
                    self.client
                        .partition(&self.statement_handle, self.next_partition)
                        .await?,
                )
            };
            let partition = with_cancel(self.cancel.as_ref(), fetch).await?;
            tracing::debug!(
                "fetched partition {} of {} rows={}",
                self.next_partition,
                self.statement_handle,
                partition.data.len()
            );
            self.chunk = VecDeque::from(partition.data);
            self.next_partition += 1;
        }
    }
}

pub(crate) async fn with_cancel<T, F>(cancel: Option<&CancellationToken>, f: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match cancel {
        Some(cancel) => {
            tokio::select! {
                _ = cancel.cancelled() => Err(Error::Cancelled),
                v = f => v
            }
        }
        None => f.await,
    }
}

pub mod row {
    use crate::http::statement::Value;

    #[derive(thiserror::Error, Debug, PartialEq, Eq)]
    pub enum Error {
        #[error("no data found")]
        NoDataFound,
        #[error("invalid type")]
        InvalidType,
        #[error("unexpected null value")]
        UnexpectedNullValue,
        #[error("invalid number {0}")]
        InvalidNumber(String),
    }

    #[derive(Debug, Clone)]
    pub struct Row {
        inner: Vec<Value>,
    }

    impl Row {
        pub fn column<'a, T: TryFrom<&'a Value, Error = Error>>(&'a self, index: usize) -> Result<T, Error> {
            let cell = self.inner.get(index).ok_or(Error::NoDataFound)?;
            T::try_from(cell)
        }

        pub fn len(&self) -> usize {
            self.inner.len()
        }

        pub fn is_empty(&self) -> bool {
            self.inner.is_empty()
        }
    }

    impl From<Vec<Value>> for Row {
        fn from(inner: Vec<Value>) -> Self {
            Self { inner }
        }
    }

    fn non_null(value: &Value) -> Result<&str, Error> {
        value.0.as_deref().ok_or(Error::UnexpectedNullValue)
    }

    impl<'a> TryFrom<&'a Value> for &'a str {
        type Error = Error;

        fn try_from(value: &'a Value) -> Result<Self, Self::Error> {
            non_null(value)
        }
    }

    impl<'a> TryFrom<&'a Value> for String {
        type Error = Error;

        fn try_from(value: &'a Value) -> Result<Self, Self::Error> {
            non_null(value).map(str::to_string)
        }
    }

    impl<'a> TryFrom<&'a Value> for i64 {
        type Error = Error;

        fn try_from(value: &'a Value) -> Result<Self, Self::Error> {
            let v = non_null(value)?;
            v.parse::<i64>().map_err(|_| Error::InvalidNumber(v.to_string()))
        }
    }

    impl<'a> TryFrom<&'a Value> for f64 {
        type Error = Error;

        fn try_from(value: &'a Value) -> Result<Self, Self::Error> {
            let v = non_null(value)?;
            v.parse::<f64>().map_err(|_| Error::InvalidNumber(v.to_string()))
        }
    }

    impl<'a> TryFrom<&'a Value> for bool {
        type Error = Error;

        fn try_from(value: &'a Value) -> Result<Self, Self::Error> {
            match non_null(value)?.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(Error::InvalidType),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::http::statement::Value;
    use crate::rows::row::{Error, Row};

    fn row(values: &[Option<&str>]) -> Row {
        Row::from(values.iter().map(|v| Value(v.map(str::to_string))).collect::<Vec<_>>())
    }

    #[test]
    fn test_column() {
        let row = row(&[Some("1"), Some("1.5"), Some("TRUE"), Some("abc"), None]);
        assert_eq!(5, row.len());
        assert_eq!(1, row.column::<i64>(0).unwrap());
        assert_eq!(1.5, row.column::<f64>(1).unwrap());
        assert!(row.column::<bool>(2).unwrap());
        assert_eq!("abc", row.column::<&str>(3).unwrap());
        assert_eq!("abc".to_string(), row.column::<String>(3).unwrap());
    }

    #[test]
    fn test_column_errors() {
        let row = row(&[Some("abc"), None]);
        assert_eq!(Err(Error::InvalidNumber("abc".to_string())), row.column::<i64>(0));
        assert_eq!(Err(Error::InvalidType), row.column::<bool>(0));
        assert_eq!(Err(Error::UnexpectedNullValue), row.column::<i64>(1));
        assert_eq!(Err(Error::UnexpectedNullValue), row.column::<String>(1));
        assert_eq!(Err(Error::NoDataFound), row.column::<i64>(2));
    }
}
