// src/services/pricing.rs
// DOCUMENTATION: Cost estimation engine
// PURPOSE: Map service type, distance, vehicle size and discounts to an
// itemized estimate

use crate::models::{CostBreakdown, DiscountInfo, DiscountRates, RateTable, ServiceType};

pub const LARGE_VEHICLE_NOTE: &str = "Additional surcharge may apply for large vehicles";

/// Parse a distance typed by the user
/// Non-numeric, non-finite or negative input clamps to zero
pub fn parse_miles(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v.max(0.0),
        _ => 0.0,
    }
}

pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Pricing engine
/// DOCUMENTATION: Pure, total function over its inputs; rates are injected
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    rates: RateTable,
    discounts: DiscountRates,
}

impl PricingEngine {
    pub fn new(rates: RateTable, discounts: DiscountRates) -> Self {
        Self { rates, discounts }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Estimate the cost of a service
    pub fn estimate(
        &self,
        service: ServiceType,
        miles: f64,
        is_large: bool,
        discounts: &DiscountInfo,
    ) -> CostBreakdown {
        let miles = if miles.is_finite() { miles.max(0.0) } else { 0.0 };
        let card = self.rates.card(service);

        let per_mile_rate = card.per_mile_rate(is_large);
        let per_mile_cost = per_mile_rate * miles;
        let subtotal = card.base_fee + per_mile_cost;
        let discount_fraction = self.discounts.fraction(discounts);
        let total = subtotal * (1.0 - discount_fraction);

        let large_vehicle_note = if is_large && card.large_vehicle_per_mile.is_none() {
            Some(LARGE_VEHICLE_NOTE.to_string())
        } else {
            None
        };

        log::debug!(
            "Estimate {}: base={} rate={} miles={} discount={} total={}",
            service.as_str(),
            card.base_fee,
            per_mile_rate,
            miles,
            discount_fraction,
            total
        );

        CostBreakdown {
            service_type: service,
            base_fee: card.base_fee,
            per_mile_rate,
            miles,
            per_mile_cost,
            subtotal,
            discount_fraction,
            discount_amount: subtotal * discount_fraction,
            total,
            large_vehicle_note,
        }
    }

    /// Same as `estimate` but takes the distance as typed
    pub fn estimate_from_input(
        &self,
        service: ServiceType,
        miles: &str,
        is_large: bool,
        discounts: &DiscountInfo,
    ) -> CostBreakdown {
        self.estimate(service, parse_miles(miles), is_large, discounts)
    }
}
