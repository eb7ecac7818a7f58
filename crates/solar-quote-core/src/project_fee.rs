use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::checked;
use crate::error::QuoteError;
use crate::types::{with_metadata, ComputationOutput, Kwp, Money, Percent};
use crate::QuoteCalcResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A capacity band of the engineering/design fee schedule: `lower < capacity <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBand {
    /// Exclusive lower bound (kWp)
    pub lower_kwp: Kwp,
    /// Inclusive upper bound (kWp)
    pub upper_kwp: Kwp,
    pub base_fee: Money,
}

impl FeeBand {
    pub const fn new(lower_kwp: Kwp, upper_kwp: Kwp, base_fee: Money) -> Self {
        FeeBand {
            lower_kwp,
            upper_kwp,
            base_fee,
        }
    }

    /// A boundary capacity belongs to the band it closes, never the one it opens.
    pub fn contains(&self, capacity: Kwp) -> bool {
        self.lower_kwp < capacity && capacity <= self.upper_kwp
    }
}

/// Standard fee schedule from 0 to 100 kWp.
pub fn default_fee_bands() -> Vec<FeeBand> {
    vec![
        FeeBand::new(dec!(0), dec!(5), dec!(1080.00)),
        FeeBand::new(dec!(5), dec!(10), dec!(1180.00)),
        FeeBand::new(dec!(10), dec!(20), dec!(1650.00)),
        FeeBand::new(dec!(20), dec!(30), dec!(2650.00)),
        FeeBand::new(dec!(30), dec!(40), dec!(3650.00)),
        FeeBand::new(dec!(40), dec!(50), dec!(4650.00)),
        FeeBand::new(dec!(50), dec!(60), dec!(5650.00)),
        FeeBand::new(dec!(60), dec!(70), dec!(6650.00)),
        FeeBand::new(dec!(70), dec!(80), dec!(7650.00)),
        FeeBand::new(dec!(80), dec!(90), dec!(8650.00)),
        FeeBand::new(dec!(90), dec!(100), dec!(9650.00)),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFeeInput {
    pub installed_capacity_kwp: Kwp,
    /// Markup over the band's base fee
    #[serde(default)]
    pub surcharge_pct: Percent,
    #[serde(default = "default_fee_bands")]
    pub bands: Vec<FeeBand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFeeOutput {
    pub project_fee: Money,
    pub band: FeeBand,
    /// Position of the matched band in the schedule
    pub band_index: usize,
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Check that the schedule is non-empty, sorted and free of gaps or overlaps.
pub fn validate_fee_bands(bands: &[FeeBand]) -> QuoteCalcResult<()> {
    if bands.is_empty() {
        return Err(QuoteError::config("bands", "Fee schedule has no bands"));
    }
    for (i, band) in bands.iter().enumerate() {
        if band.lower_kwp >= band.upper_kwp {
            return Err(QuoteError::config(
                "bands",
                format!(
                    "Band {i} is empty: lower {} is not below upper {}",
                    band.lower_kwp, band.upper_kwp
                ),
            ));
        }
        if band.base_fee < Decimal::ZERO {
            return Err(QuoteError::config(
                "bands",
                format!("Band {i} has a negative base fee"),
            ));
        }
    }
    for (i, pair) in bands.windows(2).enumerate() {
        if pair[0].upper_kwp != pair[1].lower_kwp {
            return Err(QuoteError::config(
                "bands",
                format!(
                    "Bands {} and {} are not contiguous: {} then {}",
                    i,
                    i + 1,
                    pair[0].upper_kwp,
                    pair[1].lower_kwp
                ),
            ));
        }
    }
    Ok(())
}

/// Find the band covering `capacity` and apply the surcharge.
///
/// Returns `(band_index, fee)`. The schedule is assumed validated.
pub fn project_fee_for(
    capacity: Kwp,
    bands: &[FeeBand],
    surcharge_pct: Percent,
) -> QuoteCalcResult<(usize, Money)> {
    let (index, band) = bands
        .iter()
        .enumerate()
        .find(|(_, b)| b.contains(capacity))
        .ok_or(QuoteError::NoMatchingBand { capacity })?;
    let fee = checked::mul(
        band.base_fee,
        Decimal::ONE + surcharge_pct / dec!(100),
        "project fee surcharge",
    )?;
    Ok((index, fee))
}

/// Engineering/design fee for an installation, from the tiered schedule.
pub fn lookup_project_fee(
    input: &ProjectFeeInput,
) -> QuoteCalcResult<ComputationOutput<ProjectFeeOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.surcharge_pct < Decimal::ZERO {
        return Err(QuoteError::invalid(
            "surcharge_pct",
            "Project fee surcharge cannot be negative",
        ));
    }
    validate_fee_bands(&input.bands)?;

    let (band_index, project_fee) =
        project_fee_for(input.installed_capacity_kwp, &input.bands, input.surcharge_pct)?;
    let band = input.bands[band_index];

    if input.installed_capacity_kwp == band.upper_kwp && band_index + 1 < input.bands.len() {
        warnings.push(format!(
            "Capacity {} kWp sits on a band boundary; billed in the {}-{} kWp band",
            input.installed_capacity_kwp, band.lower_kwp, band.upper_kwp
        ));
    }

    for w in &warnings {
        log::warn!("{w}");
    }
    log::debug!(
        "project fee: {} kWp in band {band_index} -> {project_fee}",
        input.installed_capacity_kwp
    );

    let output = ProjectFeeOutput {
        project_fee,
        band,
        band_index,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Tiered fee schedule (lower, upper] with percentage surcharge",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
