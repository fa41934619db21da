use std::sync::Arc;

use formfill_core::ExtractionMode;
use formfill_extract::ExtractionEngine;
use formfill_match::FieldMatcher;

/// Shared application state. Stateless across requests: nothing here holds
/// per-request data, so handlers never persist caller documents or keys.
pub struct AppState {
    pub engine: Arc<ExtractionEngine>,
    pub matcher: FieldMatcher,
    pub default_mode: ExtractionMode,
}
