//! Rendered query texts.
//!
//! No driver does parameter binding in this design; fragments are spliced
//! into the text before it reaches the adapter.

/// Fragments spliced into a query template.
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    /// Trailing clause appended before the ORDER BY (for example a WHERE
    /// built upstream). Empty by default.
    pub finally: String,
}

pub mod v0 {
    use super::QueryFilters;

    pub fn dict_sample(filters: &QueryFilters) -> String {
        format!(
            "-- Dict sample\n\
             SELECT\n  dict_sample.*\nFROM dict_sample\n{}\nORDER BY dict_sample.id\n",
            filters.finally
        )
    }

    /// Compound variant: two SELECTs in one statement, producing two
    /// recordsets.
    pub fn dict_sample_recordset(filters: &QueryFilters) -> String {
        format!(
            "-- Dict sample\n\
             SELECT\n  dict_sample.*\nFROM dict_sample\n{}\nORDER BY dict_sample.id\n;\n\
             SELECT\n  dict_sample.*\nFROM dict_sample\n{}\nORDER BY dict_sample.id DESC\n",
            filters.finally, filters.finally
        )
    }
}
