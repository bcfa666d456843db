// src/models/pricing.rs
// DOCUMENTATION: Pricing data structures
// PURPOSE: Service types, rate table, discounts and the itemized estimate

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roadside service offered by the company
/// DOCUMENTATION: Determines which base fee and per-mile rate apply.
/// Wire values are the site's `towing|fuel|lockout|jumpstart`; the
/// hyphenated spellings are accepted on input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Towing,
    #[serde(rename = "fuel", alias = "fuel-delivery")]
    FuelDelivery,
    Lockout,
    #[serde(alias = "jump-start")]
    JumpStart,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Towing,
        ServiceType::FuelDelivery,
        ServiceType::Lockout,
        ServiceType::JumpStart,
    ];

    /// Human readable name used in emails and the CLI
    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Towing => "Towing",
            ServiceType::FuelDelivery => "Fuel Delivery",
            ServiceType::Lockout => "Lockout Service",
            ServiceType::JumpStart => "Jump Start",
        }
    }

    /// Wire value (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Towing => "towing",
            ServiceType::FuelDelivery => "fuel",
            ServiceType::Lockout => "lockout",
            ServiceType::JumpStart => "jumpstart",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "towing" | "tow" => Ok(ServiceType::Towing),
            "fuel-delivery" | "fuel" => Ok(ServiceType::FuelDelivery),
            "lockout" => Ok(ServiceType::Lockout),
            "jump-start" | "jumpstart" | "jump" => Ok(ServiceType::JumpStart),
            other => Err(format!("Unknown service type: {}", other)),
        }
    }
}

/// Fees for a single service type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    /// Flat dispatch fee
    pub base_fee: f64,
    /// Rate charged per mile travelled
    pub per_mile: f64,
    /// Alternate per-mile rate for large vehicles (None = no override)
    pub large_vehicle_per_mile: Option<f64>,
}

impl RateCard {
    pub fn per_mile_rate(&self, is_large: bool) -> f64 {
        match (is_large, self.large_vehicle_per_mile) {
            (true, Some(rate)) => rate,
            _ => self.per_mile,
        }
    }
}

/// Immutable rate table injected into the pricing engine
/// DOCUMENTATION: Default values are the published company rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub towing: RateCard,
    pub fuel_delivery: RateCard,
    pub lockout: RateCard,
    pub jump_start: RateCard,
}

impl Default for RateTable {
    fn default() -> Self {
        let roadside = RateCard {
            base_fee: 85.0,
            per_mile: 2.0,
            large_vehicle_per_mile: None,
        };

        RateTable {
            towing: RateCard {
                base_fee: 110.0,
                per_mile: 6.0,
                large_vehicle_per_mile: Some(7.0),
            },
            fuel_delivery: roadside,
            lockout: roadside,
            jump_start: roadside,
        }
    }
}

impl RateTable {
    pub fn card(&self, service: ServiceType) -> &RateCard {
        match service {
            ServiceType::Towing => &self.towing,
            ServiceType::FuelDelivery => &self.fuel_delivery,
            ServiceType::Lockout => &self.lockout,
            ServiceType::JumpStart => &self.jump_start,
        }
    }
}

/// Discount fractions; both apply additively
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountRates {
    pub veteran: f64,
    pub student: f64,
}

impl Default for DiscountRates {
    fn default() -> Self {
        DiscountRates {
            veteran: 0.10,
            student: 0.08,
        }
    }
}

/// Discounts claimed by the customer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountInfo {
    #[serde(default)]
    pub is_veteran: bool,
    #[serde(default)]
    pub is_student: bool,
}

impl DiscountRates {
    /// Combined fraction, never compounded
    pub fn fraction(&self, discounts: &DiscountInfo) -> f64 {
        let mut fraction = 0.0;
        if discounts.is_veteran {
            fraction += self.veteran;
        }
        if discounts.is_student {
            fraction += self.student;
        }
        fraction
    }
}

/// Itemized estimate returned by the pricing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub service_type: ServiceType,
    pub base_fee: f64,
    pub per_mile_rate: f64,
    /// Distance after clamping
    pub miles: f64,
    pub per_mile_cost: f64,
    pub subtotal: f64,
    pub discount_fraction: f64,
    pub discount_amount: f64,
    pub total: f64,
    /// Informational only, never priced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_vehicle_note: Option<String>,
}

/// Request body for POST /api/estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    #[serde(alias = "service")]
    pub service_type: ServiceType,
    /// Distance as typed or computed; clamped before pricing
    #[serde(default)]
    pub miles: String,
    #[serde(default)]
    pub is_large_vehicle: bool,
    #[serde(default)]
    pub is_veteran: bool,
    #[serde(default)]
    pub is_student: bool,
}

impl EstimateRequest {
    pub fn discounts(&self) -> DiscountInfo {
        DiscountInfo {
            is_veteran: self.is_veteran,
            is_student: self.is_student,
        }
    }
}
