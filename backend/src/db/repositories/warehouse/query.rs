//! SQL text and row mapping for the metric tables.

use crate::models::MetricDomain;
#[cfg(feature = "warehouse")]
use crate::models::MetricRow;

/// Schema holding the six metric tables.
pub const NAMESPACE: &str = "apps_workshop";

pub fn qualified_table(domain: MetricDomain) -> String {
    format!("{}.{}", NAMESPACE, domain.table_name())
}

/// Range read. Binds `$1 = start`, `$2 = end`, both inclusive.
pub fn select_sql(domain: MetricDomain) -> String {
    format!(
        "SELECT day, category, value FROM {} WHERE day BETWEEN $1 AND $2 ORDER BY day, category",
        qualified_table(domain)
    )
}

pub fn delete_sql(domain: MetricDomain) -> String {
    format!("DELETE FROM {}", qualified_table(domain))
}

/// Single-row insert. Binds `$1 = day`, `$2 = category`, `$3 = value`.
pub fn insert_sql(domain: MetricDomain) -> String {
    format!(
        "INSERT INTO {} (day, category, value) VALUES ($1, $2, $3)",
        qualified_table(domain)
    )
}

#[cfg(feature = "warehouse")]
#[derive(Debug, Clone, diesel::QueryableByName)]
pub struct MetricRowRecord {
    #[diesel(sql_type = diesel::sql_types::Date)]
    pub day: chrono::NaiveDate,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub category: String,
    #[diesel(sql_type = diesel::sql_types::Double)]
    pub value: f64,
}

#[cfg(feature = "warehouse")]
impl From<MetricRowRecord> for MetricRow {
    fn from(record: MetricRowRecord) -> Self {
        MetricRow::new(record.category, record.day, record.value)
    }
}
