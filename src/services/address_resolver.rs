// src/services/address_resolver.rs
// DOCUMENTATION: Address resolution and distance calculation flow
// PURPOSE: Region-biased suggestions, debounced search-as-you-type,
// selection precedence and the explicit "calculate distance" action

use crate::errors::TowError;
use crate::models::{AddressSuggestion, Coordinate, Endpoint, LocationInfo};
use crate::services::geocoding_client::Geocoder;
use crate::services::geodesy::{format_miles, haversine_miles};
use crate::services::geolocation::{AcquisitionError, IpLocator, LocationAcquirer, Position, PositionSource};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Queries shorter than this never reach the geocoder
pub const MIN_QUERY_LENGTH: usize = 3;

/// Maximum number of suggestions shown under a field
pub const MAX_SUGGESTIONS: usize = 5;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

const US_STATE_CODES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

/// Regional qualifier appended to free-text queries
#[derive(Debug, Clone)]
pub struct RegionBias {
    /// Abbreviation appended to queries, e.g. "AZ"
    pub qualifier: String,
    /// Full name, e.g. "Arizona"
    pub name: String,
}

impl RegionBias {
    pub fn new(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            name: name.into(),
        }
    }

    /// True when the query already names a state
    pub fn has_state_token(&self, query: &str) -> bool {
        let qualifier = self.qualifier.to_lowercase();
        let name = self.name.to_lowercase();

        query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .any(|token| {
                let lower = token.to_lowercase();
                (!qualifier.is_empty() && lower == qualifier)
                    || (!name.is_empty() && lower == name)
                    || (token.len() == 2
                        && token.chars().all(|c| c.is_ascii_uppercase())
                        && US_STATE_CODES.contains(&token))
            })
    }

    /// Append `, <qualifier>` unless a state-like token is present
    pub fn bias_query(&self, query: &str) -> String {
        let trimmed = query.trim();
        if self.qualifier.is_empty() || self.has_state_token(trimmed) {
            trimmed.to_string()
        } else {
            format!("{}, {}", trimmed, self.qualifier)
        }
    }
}

/// Fetch suggestions for a query typed into an address field
/// Results keep the geocoder's ranking; no local re-sorting
pub async fn suggest_addresses(
    geocoder: &dyn Geocoder,
    query: &str,
    region: &RegionBias,
) -> Result<Vec<AddressSuggestion>, TowError> {
    if query.trim().chars().count() < MIN_QUERY_LENGTH {
        return Ok(Vec::new());
    }

    let biased = region.bias_query(query);
    let mut results = geocoder.suggest(&biased, MAX_SUGGESTIONS).await?;
    results.truncate(MAX_SUGGESTIONS);
    Ok(results)
}

/// Outcome of a debounced suggestion request
#[derive(Debug, Clone, PartialEq)]
pub enum DebouncedSuggestions {
    Ready(Vec<AddressSuggestion>),
    /// A newer keystroke replaced this request; nothing should be applied
    Superseded,
}

/// Search-as-you-type with a trailing debounce
/// DOCUMENTATION: Every call takes a generation ticket. After the idle
/// window only the latest ticket queries the geocoder, and a response whose
/// ticket has since been replaced is discarded, so out-of-order network
/// replies can never overwrite newer results.
pub struct SuggestionDebouncer {
    geocoder: Arc<dyn Geocoder>,
    region: RegionBias,
    window: Duration,
    generation: AtomicU64,
}

impl SuggestionDebouncer {
    pub fn new(geocoder: Arc<dyn Geocoder>, region: RegionBias, window: Duration) -> Self {
        Self {
            geocoder,
            region,
            window,
            generation: AtomicU64::new(0),
        }
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Called on every change of the text field
    pub async fn query(&self, text: &str) -> DebouncedSuggestions {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if text.trim().chars().count() < MIN_QUERY_LENGTH {
            return DebouncedSuggestions::Ready(Vec::new());
        }

        tokio::time::sleep(self.window).await;
        if !self.is_current(ticket) {
            return DebouncedSuggestions::Superseded;
        }

        let results = match suggest_addresses(self.geocoder.as_ref(), text, &self.region).await {
            Ok(results) => results,
            Err(e) => {
                log::warn!("Address suggestions unavailable: {}", e);
                Vec::new()
            }
        };

        if !self.is_current(ticket) {
            log::debug!("Discarding stale suggestions for {:?}", text);
            return DebouncedSuggestions::Superseded;
        }

        DebouncedSuggestions::Ready(results)
    }

    /// Invalidate any pending request (e.g. after a suggestion is selected)
    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Resolve the text of an address field to a coordinate
/// Precedence: selected suggestion whose label still matches, then an exact
/// label match among the current suggestions, then a fresh forward geocode
pub async fn resolve_endpoint(
    geocoder: &dyn Geocoder,
    text: &str,
    selected: Option<&AddressSuggestion>,
    suggestions: &[AddressSuggestion],
) -> Result<Option<Coordinate>, TowError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Some(selection) = selected.filter(|s| s.label == text) {
        return Ok(Some(selection.coordinate));
    }

    if let Some(matched) = suggestions.iter().find(|s| s.label == text) {
        return Ok(Some(matched.coordinate));
    }

    Ok(geocoder.forward(text).await?.map(|s| s.coordinate))
}

/// "Use my location" for the pickup field
/// DOCUMENTATION: Runs the fallback chain, records the fix as
/// `current_coords`, then fills the pickup with the reverse geocoded
/// address. A missing or failed reverse lookup falls back to a
/// "lat, lon" label. On failure the form is untouched and
/// `AcquisitionError::user_message` explains what to do.
pub async fn locate_pickup<P: PositionSource, I: IpLocator>(
    acquirer: &LocationAcquirer<P, I>,
    geocoder: &dyn Geocoder,
    location: &mut LocationInfo,
) -> Result<Position, AcquisitionError> {
    let position = acquirer.acquire().await?;
    location.current_coords = Some(position.coordinate);

    let label = match geocoder.reverse(position.coordinate).await {
        Ok(label) => label,
        Err(e) => {
            log::warn!("Reverse geocoding the device position failed: {}", e);
            None
        }
    };

    location.use_current_location(position.coordinate, label);
    Ok(position)
}

/// "Suggest a repair shop" for the destination field
/// DOCUMENTATION: The shop address replaces the destination text at once;
/// its coordinate is pre-resolved so the distance calculation does not
/// depend on a later lookup. Lookup failures only leave it unresolved.
pub async fn suggest_repair_shop(
    geocoder: &dyn Geocoder,
    shop_address: &str,
    location: &mut LocationInfo,
) -> Option<Coordinate> {
    location.to_address = shop_address.to_string();
    location.to_selected = None;

    let coordinate = match geocoder.forward(shop_address).await {
        Ok(found) => found.map(|s| s.coordinate),
        Err(e) => {
            log::warn!("Could not pre-resolve repair shop address: {}", e);
            None
        }
    };

    if let Some(coordinate) = coordinate {
        location.to_selected = Some(AddressSuggestion {
            label: shop_address.to_string(),
            coordinate,
        });
    }
    coordinate
}

/// Explicit "calculate distance" action
/// DOCUMENTATION: Resolves both endpoints, stores the haversine distance in
/// `location.miles` and returns it. This is the only writer of `miles`.
pub async fn calculate_distance(
    geocoder: &dyn Geocoder,
    location: &mut LocationInfo,
    from_suggestions: &[AddressSuggestion],
    to_suggestions: &[AddressSuggestion],
) -> Result<String, TowError> {
    let from = resolve_required(geocoder, location, Endpoint::Pickup, from_suggestions).await?;
    let to = resolve_required(geocoder, location, Endpoint::Dropoff, to_suggestions).await?;

    let miles = format_miles(haversine_miles(from, to));
    log::info!("Calculated distance: {} miles", miles);
    location.miles = miles.clone();
    Ok(miles)
}

async fn resolve_required(
    geocoder: &dyn Geocoder,
    location: &LocationInfo,
    endpoint: Endpoint,
    suggestions: &[AddressSuggestion],
) -> Result<Coordinate, TowError> {
    let text = location.text(endpoint);
    let place = match endpoint {
        Endpoint::Pickup => "pickup",
        Endpoint::Dropoff => "destination",
    };

    if text.trim().is_empty() {
        return Err(TowError::field(
            endpoint.field_name(),
            &format!("Please enter a {} address", place),
        ));
    }

    resolve_endpoint(geocoder, text, location.selected(endpoint), suggestions)
        .await?
        .ok_or_else(|| {
            TowError::ResolutionFailed(format!(
                "We couldn't find the {} address. Try picking one of the suggestions.",
                place
            ))
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    /// In-memory geocoder that records every network-equivalent call
    #[derive(Default)]
    pub(crate) struct RecordingGeocoder {
        pub(crate) known: Vec<AddressSuggestion>,
        pub(crate) forward_calls: Mutex<Vec<String>>,
        pub(crate) suggest_calls: Mutex<Vec<String>>,
        pub(crate) delay: Option<Duration>,
    }

    impl RecordingGeocoder {
        pub(crate) fn with_known(known: Vec<AddressSuggestion>) -> Self {
            Self {
                known,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Geocoder for RecordingGeocoder {
        async fn forward(&self, address: &str) -> Result<Option<AddressSuggestion>, TowError> {
            self.forward_calls.lock().unwrap().push(address.to_string());
            Ok(self
                .known
                .iter()
                .find(|s| s.label.to_lowercase().contains(&address.to_lowercase()))
                .cloned())
        }

        async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<AddressSuggestion>, TowError> {
            self.suggest_calls.lock().unwrap().push(query.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.known.iter().take(limit).cloned().collect())
        }

        async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, TowError> {
            Ok(self
                .known
                .iter()
                .find(|s| s.coordinate == coordinate)
                .map(|s| s.label.clone()))
        }
    }

    pub(crate) fn phoenix() -> AddressSuggestion {
        AddressSuggestion {
            label: "100 W Washington St, Phoenix, Arizona 85003, United States".to_string(),
            coordinate: Coordinate::new(-112.074, 33.4484),
        }
    }

    pub(crate) fn mesa() -> AddressSuggestion {
        AddressSuggestion {
            label: "20 E Main St, Mesa, Arizona 85201, United States".to_string(),
            coordinate: Coordinate::new(-111.8315, 33.4152),
        }
    }

    fn region() -> RegionBias {
        RegionBias::new("AZ", "Arizona")
    }

    #[test]
    fn test_bias_appends_qualifier() {
        assert_eq!(region().bias_query("20 E Main St, Mesa"), "20 E Main St, Mesa, AZ");
    }

    #[test]
    fn test_bias_skips_when_state_present() {
        let r = region();
        assert_eq!(r.bias_query("Main St Mesa az"), "Main St Mesa az");
        assert_eq!(r.bias_query("Main St, Flagstaff, Arizona"), "Main St, Flagstaff, Arizona");
        assert_eq!(r.bias_query("Las Vegas Blvd, NV"), "Las Vegas Blvd, NV");
        // Lower-case words that happen to look like codes are not states
        assert_eq!(r.bias_query("me and my car in tempe"), "me and my car in tempe, AZ");
    }

    #[tokio::test]
    async fn test_short_queries_never_hit_geocoder() {
        let geocoder = RecordingGeocoder::with_known(vec![mesa()]);
        let results = assert_ok!(suggest_addresses(&geocoder, "Me", &region()).await);
        assert!(results.is_empty());
        assert!(geocoder.suggest_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_suggestions_capped_at_five() {
        let many = (0..8)
            .map(|i| AddressSuggestion {
                label: format!("{} Main St", i),
                coordinate: Coordinate::new(-111.8 - i as f64 * 0.01, 33.4),
            })
            .collect();
        let geocoder = RecordingGeocoder::with_known(many);
        let results = assert_ok!(suggest_addresses(&geocoder, "Main St", &region()).await);
        assert_eq!(results.len(), MAX_SUGGESTIONS);
        assert_eq!(results[0].label, "0 Main St");
        assert_eq!(geocoder.suggest_calls.lock().unwrap()[0], "Main St, AZ");
    }

    #[tokio::test]
    async fn test_debounce_collapses_rapid_updates() {
        let geocoder = Arc::new(RecordingGeocoder::with_known(vec![mesa()]));
        let debouncer = Arc::new(SuggestionDebouncer::new(
            geocoder.clone(),
            region(),
            Duration::from_millis(150),
        ));

        let mut handles = Vec::new();
        for text in ["20 E", "20 E M", "20 E Ma", "20 E Mai", "20 E Main"] {
            let d = debouncer.clone();
            handles.push(tokio::spawn(async move { d.query(text).await }));
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        let calls = geocoder.suggest_calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["20 E Main, AZ".to_string()]);
        assert_eq!(
            outcomes.iter().filter(|o| **o == DebouncedSuggestions::Superseded).count(),
            4
        );
        assert_eq!(outcomes[4], DebouncedSuggestions::Ready(vec![mesa()]));
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let geocoder = Arc::new(RecordingGeocoder {
            known: vec![mesa()],
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let debouncer = Arc::new(SuggestionDebouncer::new(
            geocoder.clone(),
            region(),
            Duration::from_millis(20),
        ));

        let d = debouncer.clone();
        let slow = tokio::spawn(async move { d.query("Main St").await });

        // Let the first request reach the geocoder, then type again
        tokio::time::sleep(Duration::from_millis(60)).await;
        let fresh = debouncer.query("Main St Mesa").await;

        assert_eq!(slow.await.unwrap(), DebouncedSuggestions::Superseded);
        assert!(matches!(fresh, DebouncedSuggestions::Ready(_)));
        assert_eq!(geocoder.suggest_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_selected_suggestion_wins_without_network() {
        let geocoder = RecordingGeocoder::default();
        let selected = mesa();
        let coord = assert_ok!(
            resolve_endpoint(&geocoder, &selected.label, Some(&selected), &[]).await
        );
        assert_eq!(coord, Some(selected.coordinate));
        assert!(geocoder.forward_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edited_text_ignores_stale_selection() {
        let geocoder = RecordingGeocoder::with_known(vec![phoenix()]);
        let selected = mesa();
        let coord = assert_ok!(
            resolve_endpoint(&geocoder, "Washington St, Phoenix", Some(&selected), &[]).await
        );
        assert_eq!(coord, Some(phoenix().coordinate));
        assert_eq!(geocoder.forward_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exact_match_in_suggestion_list() {
        let geocoder = RecordingGeocoder::default();
        let list = vec![phoenix(), mesa()];
        let coord = assert_ok!(resolve_endpoint(&geocoder, &mesa().label, None, &list).await);
        assert_eq!(coord, Some(mesa().coordinate));
        assert!(geocoder.forward_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_calculate_distance_sets_miles() {
        let geocoder = RecordingGeocoder::with_known(vec![phoenix(), mesa()]);
        let mut location = LocationInfo::default();
        location.select(Endpoint::Pickup, phoenix());
        location.set_text(Endpoint::Dropoff, "Main St, Mesa");

        let miles = assert_ok!(calculate_distance(&geocoder, &mut location, &[], &[]).await);
        let value: f64 = miles.parse().unwrap();
        assert!(value > 14.0 && value < 15.0);
        assert_eq!(location.miles, miles);
    }

    #[tokio::test]
    async fn test_calculate_distance_unresolved_leaves_miles_untouched() {
        let geocoder = RecordingGeocoder::default();
        let mut location = LocationInfo::default();
        location.miles = "3".to_string();
        location.set_text(Endpoint::Pickup, "Nowhere Lane");
        location.set_text(Endpoint::Dropoff, "Elsewhere Road");

        let err = assert_err!(calculate_distance(&geocoder, &mut location, &[], &[]).await);
        assert!(matches!(err, TowError::ResolutionFailed(_)));
        assert_eq!(location.miles, "3");
    }

    #[tokio::test]
    async fn test_calculate_distance_requires_text() {
        let geocoder = RecordingGeocoder::default();
        let mut location = LocationInfo::default();
        let err = assert_err!(calculate_distance(&geocoder, &mut location, &[], &[]).await);
        match err {
            TowError::Validation { errors, .. } => assert!(errors.contains_key("fromAddress")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    mod use_my_location {
        use super::*;
        use crate::services::geolocation::tests::{device_fix, fast_strategies, CountingIp, ScriptedDevice};
        use crate::services::geolocation::{GeolocationError, PositionSourceKind};

        fn acquirer(device: &Arc<ScriptedDevice>) -> LocationAcquirer<Arc<ScriptedDevice>, Arc<CountingIp>> {
            LocationAcquirer::with_strategies(device.clone(), Arc::new(CountingIp::default()), fast_strategies())
        }

        #[tokio::test]
        async fn test_locate_pickup_fills_reverse_geocoded_address() {
            let device = Arc::new(ScriptedDevice::default());
            device.current.lock().unwrap().push_back(Ok(device_fix()));
            let geocoder = RecordingGeocoder::with_known(vec![phoenix()]);
            let mut location = LocationInfo::default();

            let position = assert_ok!(locate_pickup(&acquirer(&device), &geocoder, &mut location).await);

            assert_eq!(position.source, PositionSourceKind::Device);
            assert_eq!(location.current_coords, Some(phoenix().coordinate));
            assert_eq!(location.from_address, phoenix().label);
            assert_eq!(location.from_selected, Some(phoenix()));
            assert!(location.miles.is_empty());
        }

        #[tokio::test]
        async fn test_locate_pickup_falls_back_to_coordinate_label() {
            let device = Arc::new(ScriptedDevice::default());
            device.current.lock().unwrap().push_back(Ok(device_fix()));
            let geocoder = RecordingGeocoder::default();
            let mut location = LocationInfo::default();

            assert_ok!(locate_pickup(&acquirer(&device), &geocoder, &mut location).await);

            assert_eq!(location.from_address, "33.4484, -112.074");
            let selected = location.from_selected.clone().unwrap();
            assert_eq!(selected.label, location.from_address);
            assert_eq!(selected.coordinate, device_fix().coordinate);
        }

        #[tokio::test]
        async fn test_locate_pickup_permission_denied_leaves_form() {
            let device = Arc::new(ScriptedDevice::default());
            device
                .current
                .lock()
                .unwrap()
                .push_back(Err(GeolocationError::PermissionDenied));
            let geocoder = RecordingGeocoder::with_known(vec![phoenix()]);
            let mut location = LocationInfo::default();
            location.set_text(Endpoint::Pickup, "typed by hand");

            let err = assert_err!(locate_pickup(&acquirer(&device), &geocoder, &mut location).await);

            assert_eq!(err, AcquisitionError::PermissionDenied);
            assert!(err.user_message().contains("denied"));
            assert_eq!(location.from_address, "typed by hand");
            assert_eq!(location.current_coords, None);
        }
    }

    #[tokio::test]
    async fn test_repair_shop_is_pre_resolved() {
        let shop = AddressSuggestion {
            label: "8625 E McDowell Rd, Scottsdale, Arizona 85257, United States".to_string(),
            coordinate: Coordinate::new(-111.8939, 33.4659),
        };
        let geocoder = RecordingGeocoder::with_known(vec![shop.clone()]);
        let mut location = LocationInfo::default();
        location.select(Endpoint::Dropoff, mesa());

        let coordinate = suggest_repair_shop(&geocoder, "8625 E McDowell Rd", &mut location).await;

        assert_eq!(coordinate, Some(shop.coordinate));
        assert_eq!(location.to_address, "8625 E McDowell Rd");
        let selected = location.to_selected.clone().unwrap();
        assert_eq!(selected.label, "8625 E McDowell Rd");

        // The typed label matches the selection, so no further lookup
        location.select(Endpoint::Pickup, phoenix());
        assert_ok!(calculate_distance(&geocoder, &mut location, &[], &[]).await);
        assert_eq!(geocoder.forward_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repair_shop_unresolved_clears_stale_selection() {
        let geocoder = RecordingGeocoder::default();
        let mut location = LocationInfo::default();
        location.select(Endpoint::Dropoff, mesa());

        let coordinate = suggest_repair_shop(&geocoder, "8625 E McDowell Rd", &mut location).await;

        assert_eq!(coordinate, None);
        assert_eq!(location.to_address, "8625 E McDowell Rd");
        assert_eq!(location.to_selected, None);
    }
}
