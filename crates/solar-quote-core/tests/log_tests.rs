use log::{Level, LevelFilter, Log, Metadata, Record};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Mutex;

use solar_quote_core::consumption::{ConsumptionInput, ConsumptionRow};
use solar_quote_core::costs::default_line_items;
use solar_quote_core::quote::{self, QuoteInput};
use solar_quote_core::settings::QuoteSettings;
use solar_quote_core::tariff::TariffInputs;
use solar_quote_core::Month;

// ===========================================================================
// Capturing logger
// ===========================================================================

struct CaptureLogger {
    records: Mutex<Vec<(Level, String, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records.lock().unwrap().push((
            record.level(),
            record.target().to_string(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

fn heavily_taxed_undersized_quote() -> QuoteInput {
    QuoteInput {
        tariff: TariffInputs {
            icms_pct: dec!(60),
            pis_pct: dec!(0.8),
            cofins_pct: dec!(3.7),
            nominal_tusd: dec!(0.4354),
            nominal_te: dec!(0.3136),
            fio_b_cost: None,
            simultaneity_factor: None,
        },
        consumption: ConsumptionInput {
            rows: Month::ALL
                .iter()
                .map(|&month| ConsumptionRow {
                    month,
                    readings: vec![Some(2000), Some(0), Some(0), Some(0)],
                })
                .collect(),
            availability: [dec!(50), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO],
        },
        installed_capacity_kwp: dec!(4.5),
        gain_loss_pct: Decimal::ZERO,
        equipment_kit_cost: dec!(12000),
        line_items: default_line_items(),
        project_fee_surcharge_pct: Decimal::ZERO,
        margin_pct: dec!(30),
        commission_pct: dec!(5),
        settings: QuoteSettings::default(),
    }
}

// ===========================================================================
// Warning targets
// ===========================================================================

// Single test: the logger is process-wide.
#[test]
fn test_warnings_are_logged_once_under_the_raising_stage() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let result = quote::compute_quote(&heavily_taxed_undersized_quote()).unwrap();
    assert!(result.warnings.iter().any(|w| w.contains("twice the nominal")));
    assert!(result.warnings.iter().any(|w| w.contains("covers only")));

    let records = LOGGER.records.lock().unwrap();
    let warnings: Vec<&(Level, String, String)> =
        records.iter().filter(|(level, _, _)| *level == Level::Warn).collect();

    let tariff: Vec<_> = warnings
        .iter()
        .filter(|(_, _, msg)| msg.contains("twice the nominal"))
        .collect();
    assert_eq!(tariff.len(), 1);
    assert_eq!(tariff[0].1, "solar_quote_core::tariff");

    let coverage: Vec<_> = warnings
        .iter()
        .filter(|(_, _, msg)| msg.contains("covers only"))
        .collect();
    assert_eq!(coverage.len(), 1);
    assert_eq!(coverage[0].1, "solar_quote_core::quote");

    assert!(warnings
        .iter()
        .all(|(_, target, _)| target != "solar_quote_core::types"));
}
