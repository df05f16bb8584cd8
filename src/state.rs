use std::sync::Arc;

use crate::business_logic::config::FlipConfig;
use crate::services::scan_state::SharedScanState;
use crate::services::scanner::FlipScanner;
use crate::services::universe::TickerUniverse;

#[derive(Clone)]
pub struct AppState {
    pub scan_state: SharedScanState,
    pub scanner: FlipScanner,
    pub universe: Arc<dyn TickerUniverse>,
    pub defaults: FlipConfig,
    pub lookback_years: u32,
}
