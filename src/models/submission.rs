// src/models/submission.rs
// DOCUMENTATION: Contact and quote submission models
// PURPOSE: Wire contracts for POST /api/contact and POST /api/quote plus
// the client-side form state they are assembled from

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use super::{Coordinate, DiscountInfo, LocationInfo, ServiceType};

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::from(message));
    error
}

/// Phone numbers: at least 7 characters from `[0-9+()\-\s]`, checked as sent
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.chars().count() < 7 {
        return Err(invalid("phone", "Please enter a valid phone number"));
    }
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-') || c.is_whitespace();
    if !phone.chars().all(allowed) {
        return Err(invalid("phone", "Phone number contains invalid characters"));
    }
    Ok(())
}

/// Optional email: empty string is accepted, anything else must be an address
pub fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || validator::validate_email(email.trim()) {
        Ok(())
    } else {
        Err(invalid("email", "Please enter a valid email address"))
    }
}

/// Distance must be present and numeric on submission
pub fn validate_miles(miles: &str) -> Result<(), ValidationError> {
    let trimmed = miles.trim();
    if trimmed.is_empty() {
        return Err(invalid("miles", "Please calculate the distance first"));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(()),
        _ => Err(invalid("miles", "Distance must be a number")),
    }
}

fn validate_latitude(latitude: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&latitude) {
        Ok(())
    } else {
        Err(invalid("latitude", "Latitude out of range"))
    }
}

fn validate_longitude(longitude: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&longitude) {
        Ok(())
    } else {
        Err(invalid("longitude", "Longitude out of range"))
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", "This field is required"));
    }
    Ok(())
}

/// Request body for POST /api/contact
/// DOCUMENTATION: Missing fields deserialize to empty strings so that they
/// surface as field errors instead of a body parse failure
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(custom = "validate_phone")]
    pub phone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_optional_email")]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(length(min = 10, message = "Message must be at least 10 characters"))]
    pub message: String,
}

/// Device location shared with a quote request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SharedLocation {
    #[validate(custom = "validate_latitude")]
    pub latitude: f64,

    #[validate(custom = "validate_longitude")]
    pub longitude: f64,

    #[serde(default)]
    pub google_maps_link: String,

    /// Free-form description, e.g. "±12 m"
    #[serde(default)]
    pub accuracy: Option<String>,
}

impl SharedLocation {
    /// `accuracy_meters` comes from the position fix when the device reports it
    pub fn from_coordinate(coordinate: Coordinate, accuracy_meters: Option<f64>) -> Self {
        let accuracy = match accuracy_meters {
            Some(meters) => format!("±{:.0} m", meters),
            None => "GPS coordinates shared by customer".to_string(),
        };
        SharedLocation {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            google_maps_link: coordinate.google_maps_link(),
            accuracy: Some(accuracy),
        }
    }
}

/// Request body for POST /api/quote
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    #[validate(required(message = "Please select a service"))]
    pub service: Option<ServiceType>,

    #[serde(default)]
    #[validate(length(min = 5, message = "Please enter a pickup address"))]
    pub from_address: String,

    #[serde(default)]
    #[validate(length(min = 5, message = "Please enter a destination address"))]
    pub to_address: String,

    #[serde(default)]
    #[validate(custom = "validate_miles")]
    pub miles: String,

    #[serde(default)]
    #[validate(length(min = 4, message = "Please enter the vehicle year"))]
    pub vehicle_year: String,

    #[serde(default)]
    #[validate(custom = "validate_not_blank")]
    pub vehicle_make: String,

    #[serde(default)]
    #[validate(custom = "validate_not_blank")]
    pub vehicle_model: String,

    #[serde(default)]
    #[validate(custom = "validate_not_blank")]
    pub vehicle_plate: String,

    #[serde(default)]
    #[validate(length(min = 2, message = "Please provide registration state"))]
    pub vehicle_registration_state: String,

    #[serde(default)]
    pub is_large_vehicle: bool,

    #[serde(default)]
    pub is_veteran: bool,

    #[serde(default)]
    pub is_student: bool,

    #[serde(default)]
    #[validate(range(min = 0.0, message = "Estimated total cannot be negative"))]
    pub estimated_total: f64,

    #[serde(default)]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub customer_name: String,

    #[serde(default)]
    #[validate(custom = "validate_phone")]
    pub customer_phone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_optional_email")]
    pub customer_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate]
    pub location: Option<SharedLocation>,
}

/// 200 body for POST /api/contact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
}

/// 200 body for POST /api/quote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_email_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email_id: Option<String>,
}

/// Vehicle details entered on the quote form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub year: String,
    pub make: String,
    pub model: String,
    pub plate: String,
    pub registration_state: String,
    pub is_large: bool,
}

/// Contact fields shared by both forms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub message: String,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// State behind the contact form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactForm {
    pub customer: CustomerInfo,
}

impl ContactForm {
    pub fn to_request(&self) -> ContactRequest {
        ContactRequest {
            name: self.customer.name.trim().to_string(),
            phone: self.customer.phone.trim().to_string(),
            email: non_empty(&self.customer.email),
            message: self.customer.message.trim().to_string(),
        }
    }

    pub fn reset(&mut self) {
        *self = ContactForm::default();
    }
}

/// State behind the quote / estimate widget
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteForm {
    pub service_type: Option<ServiceType>,
    pub vehicle: VehicleInfo,
    pub location: LocationInfo,
    pub discounts: DiscountInfo,
    pub customer: CustomerInfo,
    pub shared_location: Option<SharedLocation>,
}

impl QuoteForm {
    /// Assemble the wire payload with the estimate computed by the caller
    pub fn to_request(&self, estimated_total: f64) -> QuoteRequest {
        QuoteRequest {
            service: self.service_type,
            from_address: self.location.from_address.trim().to_string(),
            to_address: self.location.to_address.trim().to_string(),
            miles: self.location.miles.clone(),
            vehicle_year: self.vehicle.year.trim().to_string(),
            vehicle_make: self.vehicle.make.trim().to_string(),
            vehicle_model: self.vehicle.model.trim().to_string(),
            vehicle_plate: self.vehicle.plate.trim().to_string(),
            vehicle_registration_state: self.vehicle.registration_state.trim().to_string(),
            is_large_vehicle: self.vehicle.is_large,
            is_veteran: self.discounts.is_veteran,
            is_student: self.discounts.is_student,
            estimated_total,
            customer_name: self.customer.name.trim().to_string(),
            customer_phone: self.customer.phone.trim().to_string(),
            customer_email: non_empty(&self.customer.email),
            message: non_empty(&self.customer.message),
            location: self.shared_location.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = QuoteForm::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TowError;

    fn valid_quote() -> QuoteRequest {
        QuoteRequest {
            service: Some(ServiceType::Towing),
            from_address: "100 W Washington St, Phoenix, AZ".to_string(),
            to_address: "20 E Main St, Mesa, AZ".to_string(),
            miles: "14.6".to_string(),
            vehicle_year: "2018".to_string(),
            vehicle_make: "Ford".to_string(),
            vehicle_model: "F-150".to_string(),
            vehicle_plate: "ABC1234".to_string(),
            vehicle_registration_state: "AZ".to_string(),
            estimated_total: 197.6,
            customer_name: "Jordan Smith".to_string(),
            customer_phone: "(602) 555-0199".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_phone_validation() {
        assert!(validate_phone("(602) 555-0199").is_ok());
        assert!(validate_phone("+1 602 555 0199").is_ok());
        assert!(validate_phone("555").is_err());
        assert!(validate_phone("call me maybe").is_err());
        // Length counts the raw value; padding is not stripped here
        assert!(validate_phone("  555  ").is_ok());
        assert!(validate_phone("555 12").is_err());
    }

    #[test]
    fn test_optional_email_accepts_empty() {
        assert!(validate_optional_email("").is_ok());
        assert!(validate_optional_email("driver@example.com").is_ok());
        assert!(validate_optional_email("not-an-email").is_err());
    }

    #[test]
    fn test_contact_missing_name_reports_name() {
        let req: ContactRequest = serde_json::from_str(
            r#"{"phone":"602-555-0199","message":"My car will not start this morning"}"#,
        )
        .unwrap();
        let err: TowError = req.validate().unwrap_err().into();
        match err {
            TowError::Validation { errors, .. } => {
                assert!(errors.contains_key("name"));
                assert!(!errors.contains_key("phone"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_valid_quote_passes() {
        assert!(valid_quote().validate().is_ok());
    }

    #[test]
    fn test_quote_errors_use_wire_names() {
        let mut req = valid_quote();
        req.customer_name = "J".to_string();
        req.miles = "far".to_string();
        req.service = None;
        req.vehicle_registration_state = "A".to_string();

        let err: TowError = req.validate().unwrap_err().into();
        match err {
            TowError::Validation { errors, .. } => {
                assert!(errors.contains_key("customerName"));
                assert!(errors.contains_key("miles"));
                assert!(errors.contains_key("service"));
                assert!(errors.contains_key("vehicleRegistrationState"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_quote_nested_location_is_validated() {
        let mut req = valid_quote();
        req.location = Some(SharedLocation {
            latitude: 123.0,
            longitude: -112.0,
            google_maps_link: String::new(),
            accuracy: None,
        });
        let err: TowError = req.validate().unwrap_err().into();
        match err {
            TowError::Validation { errors, .. } => {
                assert!(errors.contains_key("location.latitude"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_shared_location_accuracy_is_text() {
        let coordinate = Coordinate::new(-112.074, 33.4484);
        let shared = SharedLocation::from_coordinate(coordinate, Some(12.4));
        assert_eq!(shared.accuracy.as_deref(), Some("±12 m"));
        assert!(shared.validate().is_ok());

        let json = serde_json::to_value(&shared).unwrap();
        assert_eq!(json["googleMapsLink"], coordinate.google_maps_link());

        let parsed: SharedLocation = serde_json::from_value(serde_json::json!({
            "latitude": 33.4484,
            "longitude": -112.074,
            "googleMapsLink": "",
            "accuracy": "GPS coordinates shared by customer"
        }))
        .unwrap();
        assert_eq!(parsed.accuracy.as_deref(), Some("GPS coordinates shared by customer"));
    }

    #[test]
    fn test_quote_form_to_request_trims_and_drops_empty_optionals() {
        let mut form = QuoteForm::default();
        form.service_type = Some(ServiceType::Lockout);
        form.customer.name = "  Sam  ".to_string();
        form.customer.email = "   ".to_string();
        form.location.miles = "3.2".to_string();

        let req = form.to_request(91.4);
        assert_eq!(req.customer_name, "Sam");
        assert_eq!(req.customer_email, None);
        assert_eq!(req.message, None);
        assert_eq!(req.miles, "3.2");
        assert_eq!(req.estimated_total, 91.4);

        form.reset();
        assert_eq!(form, QuoteForm::default());
    }

    #[test]
    fn test_quote_wire_is_camel_case() {
        let json = serde_json::to_value(valid_quote()).unwrap();
        assert_eq!(json["service"], "towing");
        assert_eq!(json["vehiclePlate"], "ABC1234");
        assert_eq!(json["vehicleRegistrationState"], "AZ");
        assert_eq!(json["isLargeVehicle"], false);
        assert!(json.get("customerEmail").is_none());
    }
}
