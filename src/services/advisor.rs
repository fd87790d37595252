//! Deterministic threshold advisors. No state, no learning; the numeric
//! cutoffs are the behavioral contract and must not drift.

use serde::Serialize;

/// NPK-band fertilizer advice plus weather-conditioned application notes.
#[derive(Debug, Clone, Serialize)]
pub struct FertilizerAdvice {
    pub fertilizers: Vec<String>,
    pub recommendations: Vec<String>,
}

pub fn fertilizer_advice(
    n: f64,
    p: f64,
    k: f64,
    temp: f64,
    rainfall: f64,
    soil_moisture: f64,
) -> FertilizerAdvice {
    let mut fertilizers = Vec::new();
    let mut recommendations = Vec::new();

    if n < 50.0 {
        fertilizers.push("Urea (Nitrogen)".to_string());
        recommendations.push(format!(
            "Apply 50-100 kg/ha Urea to increase Nitrogen (Current: {n})"
        ));
    } else if n > 100.0 {
        recommendations.push(format!(
            "Nitrogen levels are high ({n}). Reduce nitrogen fertilizer use."
        ));
    }

    if p < 30.0 {
        fertilizers.push("DAP (Phosphorus)".to_string());
        recommendations.push(format!(
            "Apply 40-60 kg/ha DAP to increase Phosphorus (Current: {p})"
        ));
    } else if p > 80.0 {
        recommendations.push(format!(
            "Phosphorus levels are sufficient ({p}). Maintain current practices."
        ));
    }

    if k < 40.0 {
        fertilizers.push("MOP (Potassium)".to_string());
        recommendations.push(format!(
            "Apply 30-50 kg/ha MOP to increase Potassium (Current: {k})"
        ));
    } else if k > 100.0 {
        recommendations.push(format!(
            "Potassium levels are high ({k}). No additional potash needed."
        ));
    }

    if rainfall > 100.0 {
        recommendations
            .push("⚠️ High rainfall: Apply fertilizer in split doses to prevent leaching".to_string());
    }
    if temp > 35.0 {
        recommendations
            .push("⚠️ High temperature: Consider foliar application for better absorption".to_string());
    }
    if soil_moisture < 0.3 {
        recommendations.push("⚠️ Low soil moisture: Irrigate before fertilizer application".to_string());
    }

    if fertilizers.is_empty() {
        fertilizers.push("Balanced NPK (19-19-19)".to_string());
        recommendations
            .push("Soil nutrient levels are balanced. Use maintenance dose of NPK.".to_string());
    }

    FertilizerAdvice {
        fertilizers,
        recommendations,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

/// The stress score is the sum of independently-triggered condition flags;
/// the level is a fixed banding of that sum.
#[derive(Debug, Clone, Serialize)]
pub struct StressAssessment {
    pub level: StressLevel,
    pub factors: Vec<String>,
    pub score: u32,
}

pub fn stress_assessment(
    temp: f64,
    humidity: f64,
    soil_moisture: f64,
    rainfall: f64,
    wind_speed: f64,
    ozone: f64,
) -> StressAssessment {
    let mut score = 0u32;
    let mut factors = Vec::new();

    if temp > 35.0 || temp < 10.0 {
        score += 2;
        factors.push("Extreme temperature".to_string());
    }
    if humidity < 30.0 || humidity > 90.0 {
        score += 1;
        factors.push("Humidity stress".to_string());
    }
    if soil_moisture < 0.2 {
        score += 2;
        factors.push("Low soil moisture".to_string());
    }
    if rainfall > 100.0 {
        score += 1;
        factors.push("Excessive rainfall".to_string());
    }
    if wind_speed > 40.0 {
        score += 1;
        factors.push("High wind speed".to_string());
    }
    if ozone > 80.0 {
        score += 1;
        factors.push("High ozone levels".to_string());
    }

    let level = if score >= 4 {
        StressLevel::High
    } else if score >= 2 {
        StressLevel::Moderate
    } else {
        StressLevel::Low
    };

    if factors.is_empty() {
        factors.push("Optimal conditions".to_string());
    }

    StressAssessment {
        level,
        factors,
        score,
    }
}

/// Per-factor verdicts surfaced alongside the spray recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct SprayFactors {
    pub wind: &'static str,
    pub temperature: &'static str,
    pub rainfall: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SprayAdvice {
    pub is_safe: bool,
    pub recommendation: &'static str,
    pub best_time: String,
    pub factors: SprayFactors,
}

pub fn spray_advice(
    temperature: f64,
    humidity: f64,
    wind_speed: f64,
    rainfall: f64,
    time_of_day: &str,
) -> SprayAdvice {
    let mut issues = 0u32;

    if temperature > 30.0 {
        issues += 1;
    }
    if temperature < 10.0 {
        issues += 1;
    }
    if humidity < 50.0 {
        issues += 1;
    }
    if wind_speed > 15.0 {
        issues += 1;
    }
    if rainfall > 0.0 {
        issues += 1;
    }

    let is_safe = issues == 0;

    let best_time = if is_safe && !time_of_day.is_empty() {
        time_of_day.to_string()
    } else {
        "Early morning (6-8 AM) or late evening (5-7 PM)".to_string()
    };

    let factors = SprayFactors {
        wind: if wind_speed > 15.0 { "Too high" } else { "Favorable" },
        temperature: if temperature > 30.0 {
            "Too high"
        } else if temperature < 10.0 {
            "Too low"
        } else {
            "Optimal"
        },
        rainfall: if rainfall > 0.0 { "Rain expected" } else { "No rain" },
    };

    SprayAdvice {
        is_safe,
        recommendation: if is_safe {
            "Safe to spray - conditions are favorable"
        } else {
            "Not recommended - wait for better conditions"
        },
        best_time,
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_nitrogen_recommends_urea() {
        let advice = fertilizer_advice(30.0, 50.0, 60.0, 25.0, 50.0, 0.5);
        assert!(advice.fertilizers.contains(&"Urea (Nitrogen)".to_string()));
    }

    #[test]
    fn high_nitrogen_recommends_reduction() {
        let advice = fertilizer_advice(150.0, 50.0, 60.0, 25.0, 50.0, 0.5);
        assert!(!advice.fertilizers.contains(&"Urea (Nitrogen)".to_string()));
        assert!(
            advice
                .recommendations
                .iter()
                .any(|r| r.contains("Reduce nitrogen"))
        );
    }

    #[test]
    fn mid_band_nitrogen_triggers_neither_branch() {
        let advice = fertilizer_advice(70.0, 50.0, 60.0, 25.0, 50.0, 0.5);
        assert!(!advice.fertilizers.contains(&"Urea (Nitrogen)".to_string()));
        assert!(!advice.recommendations.iter().any(|r| r.contains("Nitrogen")));
    }

    #[test]
    fn balanced_soil_falls_back_to_maintenance_npk() {
        let advice = fertilizer_advice(70.0, 50.0, 60.0, 25.0, 50.0, 0.5);
        assert_eq!(advice.fertilizers, vec!["Balanced NPK (19-19-19)".to_string()]);
    }

    #[test]
    fn phosphorus_and_potassium_bands() {
        let advice = fertilizer_advice(70.0, 20.0, 30.0, 25.0, 50.0, 0.5);
        assert_eq!(
            advice.fertilizers,
            vec!["DAP (Phosphorus)".to_string(), "MOP (Potassium)".to_string()]
        );
    }

    #[test]
    fn weather_warnings_stack_on_recommendations() {
        let advice = fertilizer_advice(70.0, 50.0, 60.0, 40.0, 150.0, 0.1);
        let warnings: Vec<_> = advice
            .recommendations
            .iter()
            .filter(|r| r.starts_with('⚠'))
            .collect();
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn stress_score_sums_independent_flags() {
        // extreme temp (+2), low humidity (+1), dry soil (+2), ozone (+1)
        let assessment = stress_assessment(40.0, 20.0, 0.1, 50.0, 10.0, 90.0);
        assert_eq!(assessment.score, 6);
        assert_eq!(assessment.level, StressLevel::High);
        assert_eq!(assessment.factors.len(), 4);
    }

    #[test]
    fn stress_bands_map_to_levels() {
        // score 0
        let calm = stress_assessment(25.0, 60.0, 0.5, 50.0, 10.0, 40.0);
        assert_eq!(calm.score, 0);
        assert_eq!(calm.level, StressLevel::Low);
        assert_eq!(calm.factors, vec!["Optimal conditions".to_string()]);

        // score 1: humidity only
        let mild = stress_assessment(25.0, 95.0, 0.5, 50.0, 10.0, 40.0);
        assert_eq!(mild.score, 1);
        assert_eq!(mild.level, StressLevel::Low);

        // score 2: extreme temperature alone reaches Moderate
        let moderate = stress_assessment(5.0, 60.0, 0.5, 50.0, 10.0, 40.0);
        assert_eq!(moderate.score, 2);
        assert_eq!(moderate.level, StressLevel::Moderate);

        // score 3 stays Moderate
        let still_moderate = stress_assessment(5.0, 95.0, 0.5, 50.0, 10.0, 40.0);
        assert_eq!(still_moderate.score, 3);
        assert_eq!(still_moderate.level, StressLevel::Moderate);

        // score 4 is High
        let high = stress_assessment(5.0, 95.0, 0.1, 50.0, 10.0, 40.0);
        assert_eq!(high.score, 4);
        assert_eq!(high.level, StressLevel::High);
    }

    #[test]
    fn favorable_conditions_are_safe_to_spray() {
        let advice = spray_advice(22.0, 65.0, 8.0, 0.0, "Morning");
        assert!(advice.is_safe);
        assert_eq!(advice.best_time, "Morning");
        assert_eq!(advice.factors.wind, "Favorable");
        assert_eq!(advice.factors.temperature, "Optimal");
        assert_eq!(advice.factors.rainfall, "No rain");
    }

    #[test]
    fn high_wind_blocks_spraying() {
        let advice = spray_advice(22.0, 65.0, 20.0, 0.0, "Morning");
        assert!(!advice.is_safe);
        assert_eq!(advice.factors.wind, "Too high");
        // an unsafe window never honors the requested time of day
        assert_eq!(
            advice.best_time,
            "Early morning (6-8 AM) or late evening (5-7 PM)"
        );
    }

    #[test]
    fn any_rain_blocks_spraying() {
        let advice = spray_advice(22.0, 65.0, 8.0, 0.2, "");
        assert!(!advice.is_safe);
        assert_eq!(advice.factors.rainfall, "Rain expected");
    }
}
