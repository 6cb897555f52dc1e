//! Fixed recommendation text per risk level.

use crate::catalog::Disease;
use crate::scorer::RiskLevel;

pub fn recommendation(disease: Disease, risk_level: RiskLevel) -> String {
    let name = disease.name();
    match risk_level {
        RiskLevel::High => format!("Immediate {name} testing and treatment recommended"),
        RiskLevel::Moderate => format!("Consider {name} testing"),
        RiskLevel::Low => format!("Low {name} risk"),
    }
}
