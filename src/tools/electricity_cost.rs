// ABOUTME: Electricity cost calculation from energy usage and tariff
// ABOUTME: Pure arithmetic helper exposed to the LLM as a function-calling tool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wattson Project

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Default electricity tariff in INR per kWh
pub const DEFAULT_TARIFF_INR: f64 = 8.0;

/// Cost breakdown returned to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectricityCost {
    /// Energy consumed in kWh
    pub energy_kwh: f64,
    /// Tariff applied, in INR per kWh
    pub tariff_inr_per_kwh: f64,
    /// Total cost in INR
    pub total_cost_inr: f64,
}

/// Calculate electricity cost based on energy usage.
///
/// Negative consumption is rejected with an error payload rather than a
/// nonsensical negative cost.
#[must_use]
pub fn calculate_electricity_cost(energy_kwh: f64, tariff_inr: Option<f64>) -> Value {
    if energy_kwh < 0.0 {
        return json!({"error": "Energy consumption cannot be negative."});
    }

    let tariff = tariff_inr.unwrap_or(DEFAULT_TARIFF_INR);
    let cost = ElectricityCost {
        energy_kwh,
        tariff_inr_per_kwh: tariff,
        total_cost_inr: energy_kwh * tariff,
    };

    serde_json::to_value(cost).unwrap_or_else(|_| json!({"error": "Failed to serialize cost."}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_with_default_tariff() {
        let result = calculate_electricity_cost(10.0, None);
        assert_eq!(result["total_cost_inr"], 80.0);
        assert_eq!(result["tariff_inr_per_kwh"], 8.0);
    }

    #[test]
    fn test_cost_with_custom_tariff() {
        let result = calculate_electricity_cost(5.0, Some(6.5));
        assert_eq!(result["total_cost_inr"], 32.5);
    }

    #[test]
    fn test_negative_energy_rejected() {
        let result = calculate_electricity_cost(-1.0, None);
        assert!(result["error"].is_string());
    }
}
