//! Metric domains and the tabular shapes shared by every data source.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of chart a domain is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// One line per category over time
    Line,
    /// Categories side by side for each date
    GroupedBar,
}

/// The six metric domains shown on the dashboard, in panel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricDomain {
    Gallons,
    NetMargin,
    MarketPricing,
    Transactions,
    MarginComponents,
    MarketPriceDelta,
}

impl MetricDomain {
    pub const ALL: [MetricDomain; 6] = [
        MetricDomain::Gallons,
        MetricDomain::NetMargin,
        MetricDomain::MarketPricing,
        MetricDomain::Transactions,
        MetricDomain::MarginComponents,
        MetricDomain::MarketPriceDelta,
    ];

    /// Warehouse table backing this domain.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Gallons => "gallons",
            Self::NetMargin => "net_margin",
            Self::MarketPricing => "market_pricing",
            Self::Transactions => "transactions",
            Self::MarginComponents => "margin_components",
            Self::MarketPriceDelta => "market_price_delta",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Gallons => "Gallons",
            Self::NetMargin => "Net Margin",
            Self::MarketPricing => "Market Pricing",
            Self::Transactions => "Transactions",
            Self::MarginComponents => "Margin Impacting Components",
            Self::MarketPriceDelta => "Market Price Delta",
        }
    }

    pub fn chart_kind(self) -> ChartKind {
        match self {
            Self::MarginComponents => ChartKind::GroupedBar,
            _ => ChartKind::Line,
        }
    }

    /// Categories in legend order.
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Gallons => &[
                "All Hives",
                "Detlor Off",
                "CCC",
                "Retail Minus",
                "Over/Short",
                "Funded",
            ],
            Self::NetMargin => &["All Hives", "Detlor Off", "Retail Minus", "CCC", "Funded"],
            Self::MarketPricing => &[
                "Independent Gallon-Weighted",
                "Detlor Off Gallon-Weighted",
                "CCC Gallon-Weighted",
                "Retail Minus Gallon-Weighted",
                "TIA Gallon-Weighted",
            ],
            Self::Transactions => &[
                "All Hives",
                "Detlor Off",
                "Retail Minus",
                "CCC",
                "Over/Short",
                "Funded",
            ],
            Self::MarginComponents => &["Component A", "Component B"],
            Self::MarketPriceDelta => &[
                "Independent Delta",
                "Detlor Off Delta",
                "CCC Delta",
                "Retail Minus Delta",
                "TIA Delta",
            ],
        }
    }

    /// Position of `category` in the legend order, if it belongs to this domain.
    pub fn category_index(self, category: &str) -> Option<usize> {
        self.categories().iter().position(|c| *c == category)
    }
}

impl std::fmt::Display for MetricDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for MetricDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.table_name() == needle)
            .ok_or_else(|| format!("Unknown metric domain: {}", s))
    }
}

/// One dated observation for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub category: String,
    pub date: NaiveDate,
    pub value: f64,
}

impl MetricRow {
    pub fn new(category: impl Into<String>, date: NaiveDate, value: f64) -> Self {
        Self {
            category: category.into(),
            date,
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One category's observations in date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub category: String,
    pub points: Vec<SeriesPoint>,
}

impl MetricSeries {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            points: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }
}

/// Rows backing one chart, ordered by date and then by legend order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    pub domain: MetricDomain,
    rows: Vec<MetricRow>,
}

impl MetricTable {
    pub fn empty(domain: MetricDomain) -> Self {
        Self {
            domain,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows in any order.
    ///
    /// Categories the domain does not list sort after the known ones, by name.
    pub fn from_rows(domain: MetricDomain, mut rows: Vec<MetricRow>) -> Self {
        rows.sort_by(|a, b| {
            a.date.cmp(&b.date).then_with(|| {
                let ka = (domain.category_index(&a.category).unwrap_or(usize::MAX), &a.category);
                let kb = (domain.category_index(&b.category).unwrap_or(usize::MAX), &b.category);
                ka.cmp(&kb)
            })
        });
        Self { domain, rows }
    }

    pub fn from_series(domain: MetricDomain, series: Vec<MetricSeries>) -> Self {
        let rows = series
            .into_iter()
            .flat_map(|s| {
                let category = s.category;
                s.points
                    .into_iter()
                    .map(move |p| MetricRow::new(category.clone(), p.date, p.value))
            })
            .collect();
        Self::from_rows(domain, rows)
    }

    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<MetricRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct dates present in the table, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.date).collect();
        dates.dedup();
        dates
    }

    /// Split the table back into per-category series, in legend order.
    pub fn series(&self) -> Vec<MetricSeries> {
        let mut series: Vec<MetricSeries> = Vec::new();
        for row in &self.rows {
            let slot = match series.iter().position(|s| s.category == row.category) {
                Some(idx) => idx,
                None => {
                    series.push(MetricSeries::new(row.category.clone()));
                    series.len() - 1
                }
            };
            series[slot].points.push(SeriesPoint {
                date: row.date,
                value: row.value,
            });
        }
        let domain = self.domain;
        series.sort_by(|a, b| {
            let ka = (domain.category_index(&a.category).unwrap_or(usize::MAX), &a.category);
            let kb = (domain.category_index(&b.category).unwrap_or(usize::MAX), &b.category);
            ka.cmp(&kb)
        });
        series
    }
}

/// The six tables for one date range, one per domain in panel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardTables {
    tables: Vec<MetricTable>,
}

impl DashboardTables {
    /// Assemble from per-domain tables; missing domains become empty tables.
    pub fn from_tables(tables: impl IntoIterator<Item = MetricTable>) -> Self {
        let mut by_domain: Vec<Option<MetricTable>> = vec![None; MetricDomain::ALL.len()];
        for table in tables {
            if let Some(idx) = MetricDomain::ALL.iter().position(|d| *d == table.domain) {
                by_domain[idx] = Some(table);
            }
        }
        let tables = MetricDomain::ALL
            .iter()
            .zip(by_domain)
            .map(|(domain, table)| table.unwrap_or_else(|| MetricTable::empty(*domain)))
            .collect();
        Self { tables }
    }

    pub fn get(&self, domain: MetricDomain) -> Option<&MetricTable> {
        self.tables.iter().find(|t| t.domain == domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricTable> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(MetricTable::is_empty)
    }
}

impl IntoIterator for DashboardTables {
    type Item = MetricTable;
    type IntoIter = std::vec::IntoIter<MetricTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

#[cfg(test)]
#[path = "metric_tests.rs"]
mod metric_tests;
