/// ============================================================
///  Panel Sizing Calculator
///
///  Pipeline:
///   1. Per-panel output  – P = GHI × A × (η / 100) × derate
///   2. Panel count       – ceil(P_required / P), never rounded down
///   3. Array totals      – area, instantaneous power, nameplate capacity
///   4. Annual energy     – (P / 1000) × peak sun hours × 365
///   5. Financials        – savings = E × rate, payback = cost / savings
/// ============================================================

use crate::error::SizingError;
use crate::models::panel::{PanelCatalog, PanelSpec};
use crate::models::session::IrradianceOrigin;
use crate::models::sizing::{
    EnergyProjection, FinancialProjection, Payback, SizingReport, SizingRequest, SizingResult,
};

const DAYS_PER_YEAR: f64 = 365.0;

/// Sizes an array for `required_power_w` at irradiance `ghi_w_m2`.
///
/// * `ghi_w_m2` – global horizontal irradiance (W/m²), must be > 0
/// * `panel`    – datasheet values of the chosen module
/// * `derate`   – system losses factor in [0, 1]
/// * `required_power_w` – instantaneous power to cover (W), ≥ 0
pub fn size_system(
    ghi_w_m2: f64,
    panel: &PanelSpec,
    derate: f64,
    required_power_w: f64,
) -> Result<SizingResult, SizingError> {
    if !ghi_w_m2.is_finite() {
        return Err(SizingError::RejectedInput("GHI must be a finite number"));
    }
    if ghi_w_m2 <= 0.0 {
        return Err(SizingError::RejectedInput("non-positive GHI"));
    }
    if !derate.is_finite() || !(0.0..=1.0).contains(&derate) {
        return Err(SizingError::RejectedInput("derate must be in [0, 1]"));
    }
    if !required_power_w.is_finite() || required_power_w < 0.0 {
        return Err(SizingError::RejectedInput("required power must be zero or positive"));
    }

    // ── 1. Per-panel output ────────────────────────────────────
    let power_per_panel_w =
        ghi_w_m2 * panel.area_m2 * (panel.efficiency_percent / 100.0) * derate;
    if !power_per_panel_w.is_finite() || power_per_panel_w <= 0.0 {
        return Err(SizingError::RejectedInput("non-positive panel power"));
    }

    // ── 2. Panel count ─────────────────────────────────────────
    let ratio = (required_power_w / power_per_panel_w).ceil();
    // the cast saturates, so counts past u64 would silently under-provision
    if !ratio.is_finite() || ratio >= u64::MAX as f64 {
        return Err(SizingError::RejectedInput("required power needs more panels than can be counted"));
    }
    let panels_needed = ratio as u64;

    // ── 3. Array totals ────────────────────────────────────────
    let count = panels_needed as f64;
    Ok(SizingResult {
        power_per_panel_w,
        panels_needed,
        total_area_m2: count * panel.area_m2,
        system_power_w: count * power_per_panel_w,
        rated_capacity_w: count * panel.rated_power_w,
    })
}

/// Yearly energy yield of a sized array.
pub fn annual_energy(sizing: &SizingResult, peak_sun_hours: f64) -> Result<EnergyProjection, SizingError> {
    if !peak_sun_hours.is_finite() || peak_sun_hours < 0.0 {
        return Err(SizingError::RejectedInput("peak sun hours must be zero or positive"));
    }
    let energy_per_panel_kwh_year = (sizing.power_per_panel_w / 1000.0) * peak_sun_hours * DAYS_PER_YEAR;
    Ok(EnergyProjection {
        peak_sun_hours,
        energy_per_panel_kwh_year,
        total_energy_kwh_year: energy_per_panel_kwh_year * sizing.panels_needed as f64,
    })
}

/// Savings and simple payback of the yearly yield.
pub fn financial_projection(
    total_energy_kwh_year: f64,
    electricity_rate: f64,
    system_cost: f64,
) -> Result<FinancialProjection, SizingError> {
    if !electricity_rate.is_finite() || electricity_rate < 0.0 {
        return Err(SizingError::RejectedInput("electricity rate must be zero or positive"));
    }
    if !system_cost.is_finite() || system_cost < 0.0 {
        return Err(SizingError::RejectedInput("system cost must be zero or positive"));
    }
    let annual_savings = total_energy_kwh_year * electricity_rate;
    let payback = if annual_savings > 0.0 {
        Payback::Years { years: system_cost / annual_savings }
    } else {
        Payback::NotComputable
    };
    Ok(FinancialProjection { electricity_rate, system_cost, annual_savings, payback })
}

/// Runs the whole form calculation: panel selection, sizing and the optional
/// energy and financial steps.
pub fn evaluate(
    catalog: &PanelCatalog,
    ghi_w_m2: f64,
    ghi_origin: Option<IrradianceOrigin>,
    req: &SizingRequest,
) -> Result<SizingReport, SizingError> {
    let panel = catalog.select(&req.panel, req.custom_panel.as_ref())?;
    let sizing = size_system(ghi_w_m2, &panel, req.derate, req.required_power_w)?;

    let energy = req
        .peak_sun_hours
        .map(|hours| annual_energy(&sizing, hours))
        .transpose()?;

    let financial = match (req.electricity_rate, req.system_cost) {
        (None, None) => None,
        (Some(rate), Some(cost)) => {
            let energy = energy.ok_or(SizingError::RejectedInput(
                "financial projection needs peak sun hours",
            ))?;
            Some(financial_projection(energy.total_energy_kwh_year, rate, cost)?)
        }
        _ => {
            return Err(SizingError::RejectedInput(
                "electricity rate and system cost must be given together",
            ));
        }
    };

    Ok(SizingReport {
        ghi_w_m2,
        ghi_origin,
        panel,
        derate: req.derate,
        required_power_w: req.required_power_w,
        sizing,
        energy,
        financial,
    })
}
