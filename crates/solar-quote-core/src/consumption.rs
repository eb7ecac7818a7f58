use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::checked;
use crate::error::QuoteError;
use crate::types::{with_metadata, ComputationOutput, Kwh, Month, Property, PROPERTY_COUNT};
use crate::QuoteCalcResult;

/// Combined mean of the secondary properties below which the installation is
/// billed as a single property. Strict: exactly 1 kWh counts as multi-property.
pub const SINGLE_PROPERTY_THRESHOLD_KWH: Decimal = dec!(1);

const MONTHS: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One month of meter readings, one entry per property (`P1` first).
///
/// `None` marks a reading the user left blank; it is rejected, never read as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionRow {
    pub month: Month,
    pub readings: Vec<Option<u32>>,
}

/// Consumption history plus the minimum ("availability") charge of each property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionInput {
    pub rows: Vec<ConsumptionRow>,
    /// Minimum billable kWh per property, `P1` first
    #[serde(default)]
    pub availability: [Kwh; PROPERTY_COUNT],
}

/// A validated twelve-month by four-property table of readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionTable {
    readings: [[u32; PROPERTY_COUNT]; 12],
}

/// Which netting rule produced the average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationRule {
    /// Secondary properties are negligible; only the primary's availability is netted
    SingleProperty,
    /// Every property contributes its mean net of its own availability
    MultiProperty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyConsumption {
    pub property: Property,
    pub mean: Kwh,
    pub availability: Kwh,
    pub net: Kwh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionOutput {
    /// Billing-relevant average monthly consumption
    pub average_monthly_consumption: Kwh,
    pub rule: AggregationRule,
    /// Sum of the non-primary properties' means
    pub secondary_mean_total: Kwh,
    pub properties: Vec<PropertyConsumption>,
    /// Total consumption across properties, January first
    pub monthly_totals: Vec<Kwh>,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

impl ConsumptionTable {
    /// Build the table from rows in any order. Every month must appear exactly
    /// once and every row must carry a reading for each property.
    pub fn from_rows(rows: &[ConsumptionRow]) -> QuoteCalcResult<Self> {
        let mut readings = [[0u32; PROPERTY_COUNT]; 12];
        let mut seen = [false; 12];

        for row in rows {
            let m = row.month.index();
            if seen[m] {
                return Err(QuoteError::invalid(
                    "rows",
                    format!("Month '{}' appears more than once", row.month.label()),
                ));
            }
            seen[m] = true;

            if row.readings.len() != PROPERTY_COUNT {
                return Err(QuoteError::invalid(
                    "rows",
                    format!(
                        "Month '{}' has {} readings, expected {PROPERTY_COUNT}",
                        row.month.label(),
                        row.readings.len()
                    ),
                ));
            }
            for (p, reading) in row.readings.iter().enumerate() {
                readings[m][p] = reading.ok_or_else(|| {
                    QuoteError::invalid(
                        "rows",
                        format!(
                            "Month '{}' is missing the reading for property {}",
                            row.month.label(),
                            p + 1
                        ),
                    )
                })?;
            }
        }

        if let Some(missing) = Month::ALL.iter().find(|m| !seen[m.index()]) {
            return Err(QuoteError::invalid(
                "rows",
                format!("Month '{}' is missing", missing.label()),
            ));
        }

        Ok(ConsumptionTable { readings })
    }

    pub fn reading(&self, month: Month, property: Property) -> u32 {
        self.readings[month.index()][property.index()]
    }

    /// Sum of a property's twelve readings.
    pub fn total(&self, property: Property) -> u64 {
        self.readings
            .iter()
            .map(|row| u64::from(row[property.index()]))
            .sum()
    }

    /// Arithmetic mean of a property's twelve readings.
    pub fn mean(&self, property: Property) -> Kwh {
        Decimal::from(self.total(property)) / MONTHS
    }

    /// Sum of all properties' readings for one month.
    pub fn month_total(&self, month: Month) -> Kwh {
        let total: u64 = self.readings[month.index()]
            .iter()
            .map(|&r| u64::from(r))
            .sum();
        Decimal::from(total)
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Reduce a consumption history to one representative monthly figure.
///
/// If the secondary properties' means add up to less than 1 kWh the quote is
/// treated as a single property: `mean(P1) - availability(P1)`. Otherwise each
/// property contributes `mean - availability` and the contributions are summed.
pub fn aggregate_consumption(
    input: &ConsumptionInput,
) -> QuoteCalcResult<ComputationOutput<ConsumptionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for (p, availability) in input.availability.iter().enumerate() {
        if *availability < Decimal::ZERO {
            return Err(QuoteError::invalid(
                "availability",
                format!("Availability charge of property {} cannot be negative", p + 1),
            ));
        }
    }
    let table = ConsumptionTable::from_rows(&input.rows)?;

    let properties: Vec<PropertyConsumption> = Property::ALL
        .iter()
        .map(|&property| {
            let mean = table.mean(property);
            let availability = input.availability[property.index()];
            PropertyConsumption {
                property,
                mean,
                availability,
                net: mean - availability,
            }
        })
        .collect();

    // Sums of means are taken over yearly totals and divided once, so means
    // that do not divide evenly cannot round across the threshold.
    let secondary_total = Decimal::from(
        Property::ALL
            .iter()
            .filter(|p| !p.is_primary())
            .map(|&p| table.total(p))
            .sum::<u64>(),
    );
    let secondary_mean_total = secondary_total / MONTHS;

    let (rule, average) = if secondary_total < SINGLE_PROPERTY_THRESHOLD_KWH * MONTHS {
        let primary = &properties[Property::PRIMARY.index()];
        (AggregationRule::SingleProperty, primary.net)
    } else {
        let all_total: u64 = Property::ALL.iter().map(|&p| table.total(p)).sum();
        let availability = checked::sum(input.availability.iter().copied(), "availability")?;
        (
            AggregationRule::MultiProperty,
            Decimal::from(all_total) / MONTHS - availability,
        )
    };

    if average < Decimal::ZERO {
        warnings.push(format!(
            "Average consumption is negative ({}); availability charges exceed measured use",
            average.round_dp(2)
        ));
    }

    for w in &warnings {
        log::warn!("{w}");
    }
    log::debug!(
        "consumption aggregated with {rule:?}: {average} kWh/month (secondary total {secondary_mean_total})"
    );

    let output = ConsumptionOutput {
        average_monthly_consumption: average,
        rule,
        secondary_mean_total,
        properties,
        monthly_totals: Month::ALL.iter().map(|&m| table.month_total(m)).collect(),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Mean monthly consumption net of availability charges",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
