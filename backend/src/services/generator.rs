//! Synthetic series generation.
//!
//! Every series is a sinusoid with per-category offset, amplitude and phase,
//! plus independent Gaussian noise drawn per day. The sine argument runs
//! linearly from `0` to the domain's angular span across the requested range,
//! so a one-day range samples the curve at its origin.
//!
//! `MarketPriceDelta` is derived: for each pricing category it is a hidden
//! street-price series minus the market-pricing series. Within one
//! [`SyntheticGenerator::generate_all`] pass the delta reuses the pricing draw
//! that feeds the Market Pricing table, so the two charts agree with each
//! other. Generating the delta table on its own draws a fresh pricing series.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::models::{DashboardTables, DateRange, MetricDomain, MetricSeries, MetricTable, SeriesPoint};

/// Shape of one synthetic category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesParams {
    pub offset: f64,
    pub amplitude: f64,
    pub phase: f64,
    pub noise_sd: f64,
}

impl SeriesParams {
    const fn new(offset: f64, amplitude: f64, phase: f64, noise_sd: f64) -> Self {
        Self {
            offset,
            amplitude,
            phase,
            noise_sd,
        }
    }

    const fn constant(value: f64) -> Self {
        Self::new(value, 0.0, 0.0, 0.0)
    }
}

/// Error for category lookups that do not belong to a domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("category '{category}' is not part of the {domain} domain")]
pub struct UnknownCategory {
    pub domain: MetricDomain,
    pub category: String,
}

const WIDE_SPAN: f64 = 10.0;
const NARROW_SPAN: f64 = 6.0;

/// Angular span of the sine argument across a range.
fn span(domain: MetricDomain) -> f64 {
    match domain {
        MetricDomain::Gallons | MetricDomain::NetMargin | MetricDomain::Transactions => WIDE_SPAN,
        MetricDomain::MarketPricing
        | MetricDomain::MarginComponents
        | MetricDomain::MarketPriceDelta => NARROW_SPAN,
    }
}

/// Parameters for base (non-derived) domains, aligned with `MetricDomain::categories`.
fn base_params(domain: MetricDomain) -> &'static [SeriesParams] {
    const GALLONS: [SeriesParams; 6] = [
        SeriesParams::new(14_000_000.0, 4_000_000.0, 0.0, 150_000.0),
        SeriesParams::new(11_000_000.0, 3_000_000.0, 0.5, 120_000.0),
        SeriesParams::new(9_000_000.0, 2_000_000.0, 1.0, 90_000.0),
        SeriesParams::new(6_000_000.0, 1_500_000.0, 1.5, 60_000.0),
        SeriesParams::constant(500_000.0),
        SeriesParams::constant(0.0),
    ];
    const NET_MARGIN: [SeriesParams; 5] = [
        SeriesParams::new(8_000.0, 250.0, 0.0, 300.0),
        SeriesParams::new(7_000.0, 200.0, 0.5, 400.0),
        SeriesParams::new(6_000.0, 150.0, 1.0, 500.0),
        SeriesParams::new(5_000.0, 120.0, 1.5, 300.0),
        SeriesParams::new(4_000.0, 100.0, 2.0, 200.0),
    ];
    const MARKET_PRICING: [SeriesParams; 5] = [
        SeriesParams::new(3_400.0, 150.0, 0.0, 12.0),
        SeriesParams::new(3_350.0, 130.0, 0.3, 12.0),
        SeriesParams::new(3_300.0, 110.0, 0.6, 10.0),
        SeriesParams::new(3_250.0, 90.0, 0.9, 10.0),
        SeriesParams::new(3_200.0, 70.0, 1.2, 8.0),
    ];
    const TRANSACTIONS: [SeriesParams; 6] = [
        SeriesParams::new(200_000.0, 60_000.0, 0.0, 4_000.0),
        SeriesParams::new(150_000.0, 50_000.0, 0.5, 3_500.0),
        SeriesParams::new(100_000.0, 30_000.0, 1.0, 2_500.0),
        SeriesParams::constant(40_000.0),
        SeriesParams::constant(0.0),
        SeriesParams::constant(0.0),
    ];
    const MARGIN_COMPONENTS: [SeriesParams; 2] = [
        SeriesParams::new(2_500.0, 30.0, 0.0, 50.0),
        SeriesParams::new(2_450.0, 25.0, 0.4, 40.0),
    ];

    match domain {
        MetricDomain::Gallons => &GALLONS,
        MetricDomain::NetMargin => &NET_MARGIN,
        MetricDomain::MarketPricing => &MARKET_PRICING,
        MetricDomain::Transactions => &TRANSACTIONS,
        MetricDomain::MarginComponents => &MARGIN_COMPONENTS,
        MetricDomain::MarketPriceDelta => &[],
    }
}

/// Hidden street-price series, one per pricing category.
const STREET_PRICE: [SeriesParams; 5] = [
    SeriesParams::new(12_500.0, 200.0, 0.0, 10.0),
    SeriesParams::new(12_400.0, 180.0, 0.3, 10.0),
    SeriesParams::new(12_300.0, 160.0, 0.6, 10.0),
    SeriesParams::new(12_200.0, 140.0, 0.9, 8.0),
    SeriesParams::new(12_100.0, 120.0, 1.2, 8.0),
];

/// Generator for the six synthetic domains.
///
/// Without a seed every call draws from fresh entropy, so repeated calls are
/// statistically similar but not identical. With a seed every call starts
/// from the same RNG state and is bit-reproducible.
#[derive(Debug, Clone, Default)]
pub struct SyntheticGenerator {
    seed: Option<u64>,
}

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self { seed: None }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// One category's series over `range`, one point per day.
    pub fn generate_series(
        &self,
        range: &DateRange,
        domain: MetricDomain,
        category: &str,
    ) -> Result<MetricSeries, UnknownCategory> {
        let idx = domain
            .category_index(category)
            .ok_or_else(|| UnknownCategory {
                domain,
                category: category.to_string(),
            })?;
        let mut rng = self.rng();

        if domain == MetricDomain::MarketPriceDelta {
            let pricing = draw_series(
                &mut rng,
                range,
                span(MetricDomain::MarketPricing),
                MetricDomain::MarketPricing.categories()[idx],
                &base_params(MetricDomain::MarketPricing)[idx],
            );
            return Ok(derive_delta(&mut rng, range, category, &pricing, &STREET_PRICE[idx]));
        }

        Ok(draw_series(
            &mut rng,
            range,
            span(domain),
            category,
            &base_params(domain)[idx],
        ))
    }

    /// Every category of one domain.
    pub fn generate_table(&self, range: &DateRange, domain: MetricDomain) -> MetricTable {
        let mut rng = self.rng();
        if domain == MetricDomain::MarketPriceDelta {
            let pricing = draw_domain(&mut rng, range, MetricDomain::MarketPricing);
            return delta_table(&mut rng, range, &pricing);
        }
        MetricTable::from_series(domain, draw_domain(&mut rng, range, domain))
    }

    /// All six tables from a single RNG stream.
    pub fn generate_all(&self, range: &DateRange) -> DashboardTables {
        let mut rng = self.rng();
        let mut tables = Vec::with_capacity(MetricDomain::ALL.len());
        let mut pricing: Option<Vec<MetricSeries>> = None;

        for domain in MetricDomain::ALL {
            let table = match domain {
                MetricDomain::MarketPriceDelta => {
                    let pricing = match pricing.take() {
                        Some(series) => series,
                        None => draw_domain(&mut rng, range, MetricDomain::MarketPricing),
                    };
                    delta_table(&mut rng, range, &pricing)
                }
                MetricDomain::MarketPricing => {
                    let series = draw_domain(&mut rng, range, domain);
                    let table = MetricTable::from_series(domain, series.clone());
                    pricing = Some(series);
                    table
                }
                _ => MetricTable::from_series(domain, draw_domain(&mut rng, range, domain)),
            };
            tables.push(table);
        }

        DashboardTables::from_tables(tables)
    }
}

fn draw_domain(rng: &mut StdRng, range: &DateRange, domain: MetricDomain) -> Vec<MetricSeries> {
    domain
        .categories()
        .iter()
        .zip(base_params(domain))
        .map(|(category, params)| draw_series(rng, range, span(domain), category, params))
        .collect()
}

fn delta_table(rng: &mut StdRng, range: &DateRange, pricing: &[MetricSeries]) -> MetricTable {
    let series = MetricDomain::MarketPriceDelta
        .categories()
        .iter()
        .zip(pricing)
        .zip(STREET_PRICE.iter())
        .map(|((category, base), street)| derive_delta(rng, range, category, base, street))
        .collect();
    MetricTable::from_series(MetricDomain::MarketPriceDelta, series)
}

fn derive_delta(
    rng: &mut StdRng,
    range: &DateRange,
    category: &str,
    pricing: &MetricSeries,
    street: &SeriesParams,
) -> MetricSeries {
    let street = draw_series(rng, range, span(MetricDomain::MarketPriceDelta), category, street);
    MetricSeries {
        category: category.to_string(),
        points: street
            .points
            .iter()
            .zip(&pricing.points)
            .map(|(s, p)| SeriesPoint {
                date: s.date,
                value: s.value - p.value,
            })
            .collect(),
    }
}

fn draw_series(
    rng: &mut StdRng,
    range: &DateRange,
    span: f64,
    category: &str,
    params: &SeriesParams,
) -> MetricSeries {
    let n = range.num_days();
    let step = if n > 1 { span / (n - 1) as f64 } else { 0.0 };
    let noise = Normal::new(0.0, params.noise_sd).ok().filter(|_| params.noise_sd > 0.0);

    let points = range
        .days()
        .enumerate()
        .map(|(i, date)| {
            let t = step * i as f64;
            let jitter = noise.as_ref().map_or(0.0, |dist| dist.sample(&mut *rng));
            SeriesPoint {
                date,
                value: params.offset + params.amplitude * (params.phase + t).sin() + jitter,
            }
        })
        .collect();

    MetricSeries {
        category: category.to_string(),
        points,
    }
}

#[cfg(test)]
#[path = "generator_tests.rs"]
mod generator_tests;
