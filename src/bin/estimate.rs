// src/bin/estimate.rs
// Usage: estimate <miles> [--service <type>] [--large] [--veteran] [--student]
use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use reqwest::Client;
use std::env;
use std::time::Duration;
use towquote::models::{CostBreakdown, EstimateRequest, ServiceType};
use towquote::services::format_currency;

// --- ANSI colors ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

#[derive(Debug, Default)]
struct Args {
    miles: String,
    service: Option<ServiceType>,
    is_large_vehicle: bool,
    is_veteran: bool,
    is_student: bool,
}

fn parse_args(raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut raw = raw.peekable();

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--large" => args.is_large_vehicle = true,
            "--veteran" => args.is_veteran = true,
            "--student" => args.is_student = true,
            "--service" => {
                let value = raw.next().context("--service needs a value")?;
                let service = value.parse::<ServiceType>().map_err(anyhow::Error::msg)?;
                args.service = Some(service);
            }
            other if other.starts_with("--") => bail!("Unknown flag: {}", other),
            other => args.miles = other.to_string(),
        }
    }

    if args.miles.is_empty() {
        bail!("Usage: estimate <miles> [--service <type>] [--large] [--veteran] [--student]");
    }
    Ok(args)
}

struct EstimateClient {
    base_url: String,
    client: Client,
}

impl EstimateClient {
    fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { base_url, client })
    }

    async fn check_service_health(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn estimate(&self, request: &EstimateRequest) -> Result<CostBreakdown> {
        let response = self
            .client
            .post(format!("{}/api/estimate", self.base_url))
            .json(request)
            .send()
            .await
            .context("Estimate request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {} - {}", status, body);
        }

        response
            .json::<CostBreakdown>()
            .await
            .context("Failed to parse estimate JSON")
    }
}

fn print_breakdown(b: &CostBreakdown) {
    println!("\n{}{}{}", BOLD, b.service_type.label(), RESET);
    println!("  Base fee:      {}", format_currency(b.base_fee));
    println!(
        "  Mileage:       {} x {} = {}",
        b.miles,
        format_currency(b.per_mile_rate),
        format_currency(b.per_mile_cost)
    );
    println!("  Subtotal:      {}", format_currency(b.subtotal));
    if b.discount_amount > 0.0 {
        println!(
            "  Discount:      {}-{} ({:.0}%){}",
            GREEN,
            format_currency(b.discount_amount),
            b.discount_fraction * 100.0,
            RESET
        );
    }
    println!("  {}Total:         {}{}", BOLD, format_currency(b.total), RESET);
    if let Some(note) = &b.large_vehicle_note {
        println!("  {}{}{}", YELLOW, note, RESET);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let args = parse_args(env::args().skip(1))?;
    let base_url = env::var("TOWQUOTE_API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let client = EstimateClient::new(base_url)?;

    println!("{}Checking service status...{}", CYAN, RESET);
    if !client.check_service_health().await {
        println!("{}Service unavailable at {}{}", RED, client.base_url, RESET);
        std::process::exit(1);
    }

    let services = match args.service {
        Some(service) => vec![service],
        None => ServiceType::ALL.to_vec(),
    };

    for service_type in services {
        let request = EstimateRequest {
            service_type,
            miles: args.miles.clone(),
            is_large_vehicle: args.is_large_vehicle,
            is_veteran: args.is_veteran,
            is_student: args.is_student,
        };
        match client.estimate(&request).await {
            Ok(breakdown) => print_breakdown(&breakdown),
            Err(e) => println!("{}Error estimating {}: {}{}", RED, service_type.label(), e, RESET),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_flags() {
        let parsed = args(&["12.5", "--service", "towing", "--large", "--student"]).unwrap();
        assert_eq!(parsed.miles, "12.5");
        assert_eq!(parsed.service, Some(ServiceType::Towing));
        assert!(parsed.is_large_vehicle);
        assert!(parsed.is_student);
        assert!(!parsed.is_veteran);
    }

    #[test]
    fn test_parse_rejects_missing_miles_and_unknown_flags() {
        assert!(args(&["--veteran"]).is_err());
        assert!(args(&["10", "--fast"]).is_err());
        assert!(args(&["10", "--service", "helicopter"]).is_err());
    }
}
