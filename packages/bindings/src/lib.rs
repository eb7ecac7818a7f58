use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[napi]
pub fn normalize_tariff(input_json: String) -> NapiResult<String> {
    let input: solar_quote_core::tariff::TariffInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = solar_quote_core::tariff::normalize_tariff(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn aggregate_consumption(input_json: String) -> NapiResult<String> {
    let input: solar_quote_core::consumption::ConsumptionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = solar_quote_core::consumption::aggregate_consumption(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn estimate_generation(input_json: String) -> NapiResult<String> {
    let input: solar_quote_core::generation::GenerationParams =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        solar_quote_core::generation::estimate_generation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn lookup_project_fee(input_json: String) -> NapiResult<String> {
    let input: solar_quote_core::project_fee::ProjectFeeInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        solar_quote_core::project_fee::lookup_project_fee(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn aggregate_costs(input_json: String) -> NapiResult<String> {
    let input: solar_quote_core::costs::CostInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = solar_quote_core::costs::aggregate_costs(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn estimate_return(input_json: String) -> NapiResult<String> {
    let input: solar_quote_core::returns::ReturnInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = solar_quote_core::returns::estimate_return(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Quote and proposal
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_quote(input_json: String) -> NapiResult<String> {
    let output = solar_quote_core::quote::compute_quote_json(&input_json).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_proposal(input_json: String) -> NapiResult<String> {
    let input: solar_quote_core::proposal::ProposalInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = solar_quote_core::proposal::build_proposal(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Default settings document, so the form can pre-fill its fee schedule and tax tables.
#[napi]
pub fn default_settings() -> NapiResult<String> {
    serde_json::to_string(&solar_quote_core::settings::QuoteSettings::default())
        .map_err(to_napi_error)
}

/// Default service line items for a new quote.
#[napi]
pub fn default_line_items() -> NapiResult<String> {
    serde_json::to_string(&solar_quote_core::costs::default_line_items()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scalar helpers for live form captions
// ---------------------------------------------------------------------------

/// Tax-inclusive tariff for one component; arguments are decimal strings.
#[napi]
pub fn effective_tariff(
    nominal: String,
    pis_pct: String,
    cofins_pct: String,
    icms_pct: String,
) -> NapiResult<String> {
    let parse = |s: &str| s.parse::<Decimal>().map_err(to_napi_error);
    let value = solar_quote_core::tariff::effective_tariff(
        parse(&nominal)?,
        parse(&pis_pct)?,
        parse(&cofins_pct)?,
        parse(&icms_pct)?,
    )
    .map_err(to_napi_error)?;
    Ok(value.to_string())
}
