/// CO2 emission estimation for cargo transport.
///
/// Factors are kg CO2 per tonne-kilometre, so an estimate is
/// `distance_km * (cargo_kg / 1000) * factor`.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Land,
    Sea,
    Air,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Land => "land",
            TransportMode::Sea => "sea",
            TransportMode::Air => "air",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "land" => Ok(TransportMode::Land),
            "sea" => Ok(TransportMode::Sea),
            "air" => Ok(TransportMode::Air),
            other => Err(format!("unknown transport mode: {}", other)),
        }
    }
}

/// Emission factors in kg CO2 per tonne-km.
#[derive(Debug, Clone, Copy)]
pub struct EmissionModel {
    land_factor: f64,
    sea_factor: f64,
    air_factor: f64,
}

impl Default for EmissionModel {
    fn default() -> Self {
        Self {
            land_factor: 0.062,
            sea_factor: 0.016,
            air_factor: 0.602,
        }
    }
}

impl EmissionModel {
    pub fn estimate(&self, mode: TransportMode, distance_km: f64, cargo_kg: f64) -> f64 {
        let factor = match mode {
            TransportMode::Land => self.land_factor,
            TransportMode::Sea => self.sea_factor,
            TransportMode::Air => self.air_factor,
        };
        distance_km * (cargo_kg / 1000.0) * factor
    }
}
