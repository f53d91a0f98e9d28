use serde::{Deserialize, Deserializer, Serialize, Serializer};

// 查询结果行: 列名 -> 标量值
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Outcome code carried by every [`ResultEnvelope`].
///
/// `NoData` is a non-fatal condition distinct from `Failure`: the query
/// itself succeeded but produced zero rows across all recordsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NoData = 2,
}

// On the wire the code is the bare integer (0/1/2), same as the
// consuming request layer has always seen.
impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Failure),
            2 => Ok(ErrorCode::NoData),
            other => Err(serde::de::Error::custom(format!(
                "invalid error code: {}",
                other
            ))),
        }
    }
}

/// One result set of a query: row count plus the rows themselves.
///
/// A single logical query may produce several of these when the statement
/// is compound (multiple SELECTs separated by `;`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    pub rows_total: u64,
    pub rows: Vec<Row>,
}

impl RecordSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows_total: rows.len() as u64,
            rows,
        }
    }
}

/// The uniform envelope every query call resolves to, regardless of which
/// driver produced the result.
///
/// Invariant: `error_code != Success` implies `data == None`. The
/// constructors below are the only way envelopes are built, which keeps
/// the invariant out of callers' hands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(rename = "ERROR_CODE")]
    pub error_code: ErrorCode,
    #[serde(rename = "ERROR_DESC")]
    pub error_desc: Option<String>,
    #[serde(rename = "DATA")]
    pub data: Option<Vec<RecordSet>>,
}

impl ResultEnvelope {
    pub fn success(data: Vec<RecordSet>) -> Self {
        Self {
            error_code: ErrorCode::Success,
            error_desc: None,
            data: Some(data),
        }
    }

    pub fn failure(desc: impl Into<String>) -> Self {
        Self {
            error_code: ErrorCode::Failure,
            error_desc: Some(desc.into()),
            data: None,
        }
    }

    pub fn no_data() -> Self {
        Self {
            error_code: ErrorCode::NoData,
            error_desc: Some("No records found".to_string()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code == ErrorCode::Success
    }
}

/// Selector for one backend connection pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverId {
    Sqlite,
    Http,
}

impl std::fmt::Display for DriverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverId::Sqlite => write!(f, "sqlite"),
            DriverId::Http => write!(f, "http"),
        }
    }
}

/// Driver-native result shape, before normalization.
///
/// Each driver maps its own output onto exactly one of these variants
/// instead of callers sniffing the shape at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverResponse {
    /// A flat list of rows (single recordset).
    SingleSet(Vec<Row>),
    /// Grouped recordsets from a compound statement, order preserved.
    MultiSet(Vec<Vec<Row>>),
    /// The driver reported completion without any result shape.
    Empty,
}

impl DriverResponse {
    /// Normalize a native response into the shared envelope.
    ///
    /// Zero total rows across all sets is `NoData`, never `Success` —
    /// an empty result must not look like valid cacheable data.
    pub fn into_envelope(self) -> ResultEnvelope {
        let sets: Vec<RecordSet> = match self {
            DriverResponse::Empty => Vec::new(),
            DriverResponse::SingleSet(rows) => vec![RecordSet::new(rows)],
            DriverResponse::MultiSet(groups) => {
                groups.into_iter().map(RecordSet::new).collect()
            }
        };

        let rows_total: u64 = sets.iter().map(|set| set.rows_total).sum();
        if rows_total == 0 {
            ResultEnvelope::no_data()
        } else {
            ResultEnvelope::success(sets)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, value: i64) -> Row {
        let mut row = Row::new();
        row.insert(key.to_string(), serde_json::json!(value));
        row
    }

    #[test]
    fn single_set_normalizes_to_one_recordset() {
        let env = DriverResponse::SingleSet(vec![row("id", 1), row("id", 2)]).into_envelope();
        assert_eq!(env.error_code, ErrorCode::Success);
        let data = env.data.unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].rows_total, 2);
    }

    #[test]
    fn multi_set_preserves_group_order() {
        let env = DriverResponse::MultiSet(vec![vec![row("id", 1)], vec![row("id", 2)]])
            .into_envelope();
        let data = env.data.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].rows[0]["id"], serde_json::json!(1));
        assert_eq!(data[1].rows[0]["id"], serde_json::json!(2));
    }

    #[test]
    fn zero_rows_is_no_data_for_every_shape() {
        for resp in [
            DriverResponse::Empty,
            DriverResponse::SingleSet(Vec::new()),
            DriverResponse::MultiSet(vec![Vec::new(), Vec::new()]),
        ] {
            let env = resp.into_envelope();
            assert_eq!(env.error_code, ErrorCode::NoData);
            assert!(env.data.is_none());
        }
    }

    #[test]
    fn envelope_serializes_with_original_field_names() {
        let json = serde_json::to_value(ResultEnvelope::failure("No connection")).unwrap();
        assert_eq!(json["ERROR_CODE"], serde_json::json!(1));
        assert_eq!(json["ERROR_DESC"], serde_json::json!("No connection"));
        assert_eq!(json["DATA"], serde_json::Value::Null);
    }
}
