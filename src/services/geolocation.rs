// src/services/geolocation.rs
// DOCUMENTATION: Device location acquisition with layered fallbacks
// PURPOSE: Obtain the visitor's coordinates for "use my location":
// high accuracy, then low accuracy, then a one-shot watch, then IP lookup

use crate::models::Coordinate;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Why a single acquisition attempt failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Location request timed out")]
    Timeout,

    #[error("Geolocation is not supported on this device")]
    Unsupported,
}

/// Options passed to the device for one attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the device may return
    pub maximum_age: Duration,
}

/// Where a position came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSourceKind {
    Device,
    IpLookup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub coordinate: Coordinate,
    /// Accuracy radius in meters, when known
    pub accuracy: Option<f64>,
    pub source: PositionSourceKind,
}

pub type WatchId = u64;

/// Live position subscription; must be released with `clear_watch`
#[derive(Debug)]
pub struct PositionWatch {
    pub id: WatchId,
    pub updates: mpsc::UnboundedReceiver<Result<Position, GeolocationError>>,
}

/// Device positioning API
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<Position, GeolocationError>;

    fn watch_position(&self, options: &PositionOptions) -> Result<PositionWatch, GeolocationError>;

    fn clear_watch(&self, id: WatchId);
}

/// Coarse location from the visitor's IP address
#[async_trait]
pub trait IpLocator: Send + Sync {
    async fn locate(&self) -> Result<Position, GeolocationError>;
}

/// One step of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeolocationStrategy {
    CurrentPosition(PositionOptions),
    /// Resolve on first watch update; gives up after `timeout + grace`
    Watch { options: PositionOptions, grace: Duration },
    IpLookup,
}

impl GeolocationStrategy {
    fn name(&self) -> &'static str {
        match self {
            GeolocationStrategy::CurrentPosition(o) if o.enable_high_accuracy => "high-accuracy",
            GeolocationStrategy::CurrentPosition(_) => "low-accuracy",
            GeolocationStrategy::Watch { .. } => "watch",
            GeolocationStrategy::IpLookup => "ip-lookup",
        }
    }
}

/// Default chain
pub fn default_strategies() -> Vec<GeolocationStrategy> {
    let tolerant = PositionOptions {
        enable_high_accuracy: false,
        timeout: Duration::from_secs(20),
        maximum_age: Duration::from_secs(15 * 60),
    };

    vec![
        GeolocationStrategy::CurrentPosition(PositionOptions {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(60),
        }),
        GeolocationStrategy::CurrentPosition(tolerant),
        GeolocationStrategy::Watch {
            options: PositionOptions {
                maximum_age: Duration::ZERO,
                ..tolerant
            },
            grace: Duration::from_secs(2),
        },
        GeolocationStrategy::IpLookup,
    ]
}

/// Terminal failure once every strategy is exhausted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {last}")]
    LocationUnavailable { last: GeolocationError },
}

impl AcquisitionError {
    /// Explanation shown next to the "use my location" button
    pub fn user_message(&self) -> &'static str {
        match self {
            AcquisitionError::PermissionDenied => {
                "Location access was denied. Please allow location access in your browser settings or type your address."
            }
            AcquisitionError::LocationUnavailable {
                last: GeolocationError::Timeout,
            } => "Finding your location took too long. Please try again or type your address.",
            AcquisitionError::LocationUnavailable { .. } => {
                "We couldn't determine your location. Please type your address instead."
            }
        }
    }
}

/// Clears a device watch when dropped, including when the acquisition
/// future itself is dropped mid-wait
struct WatchGuard<'a, P: PositionSource> {
    source: &'a P,
    id: WatchId,
}

impl<P: PositionSource> Drop for WatchGuard<'_, P> {
    fn drop(&mut self) {
        self.source.clear_watch(self.id);
    }
}

/// Runs the fallback chain against a device and an IP locator
pub struct LocationAcquirer<P, I> {
    source: P,
    ip_locator: I,
    strategies: Vec<GeolocationStrategy>,
}

impl<P: PositionSource, I: IpLocator> LocationAcquirer<P, I> {
    pub fn new(source: P, ip_locator: I) -> Self {
        Self::with_strategies(source, ip_locator, default_strategies())
    }

    pub fn with_strategies(source: P, ip_locator: I, strategies: Vec<GeolocationStrategy>) -> Self {
        Self {
            source,
            ip_locator,
            strategies,
        }
    }

    /// Try each strategy in order until one yields a position
    pub async fn acquire(&self) -> Result<Position, AcquisitionError> {
        let mut last = GeolocationError::Unsupported;

        for strategy in &self.strategies {
            match self.attempt(strategy).await {
                Ok(position) => {
                    log::info!("Location acquired via {} strategy", strategy.name());
                    return Ok(position);
                }
                Err(GeolocationError::PermissionDenied) => {
                    log::info!("Location permission denied; skipping remaining strategies");
                    return Err(AcquisitionError::PermissionDenied);
                }
                Err(e) => {
                    log::warn!("Location strategy {} failed: {}", strategy.name(), e);
                    last = e;
                }
            }
        }

        Err(AcquisitionError::LocationUnavailable { last })
    }

    async fn attempt(&self, strategy: &GeolocationStrategy) -> Result<Position, GeolocationError> {
        match strategy {
            GeolocationStrategy::CurrentPosition(options) => {
                tokio::time::timeout(options.timeout, self.source.current_position(options))
                    .await
                    .unwrap_or(Err(GeolocationError::Timeout))
            }
            GeolocationStrategy::Watch { options, grace } => self.watch_once(options, *grace).await,
            GeolocationStrategy::IpLookup => self.ip_locator.locate().await,
        }
    }

    /// First update of a continuous watch; the watch is cleared on every path
    async fn watch_once(&self, options: &PositionOptions, grace: Duration) -> Result<Position, GeolocationError> {
        let mut watch = self.source.watch_position(options)?;
        let _guard = WatchGuard {
            source: &self.source,
            id: watch.id,
        };

        match tokio::time::timeout(options.timeout + grace, watch.updates.recv()).await {
            Ok(Some(update)) => update,
            Ok(None) => Err(GeolocationError::PositionUnavailable(
                "watch closed without an update".to_string(),
            )),
            Err(_) => Err(GeolocationError::Timeout),
        }
    }
}
