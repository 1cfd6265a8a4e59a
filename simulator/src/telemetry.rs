use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Wire format consumed by the ingestor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub area: String,
    pub temperature: f64,
    pub pulse: i32,
    pub risk_flag: bool,
}

/// What a simulated device is doing this cycle.
#[derive(Debug, Clone, Copy)]
pub enum Scenario {
    Nominal,
    Fever,
    Strayed,
    LowPulse,
}

impl Scenario {
    /// Devices cycle through roles so every run exercises each alert.
    pub fn for_device(index: usize) -> Self {
        match index % 4 {
            1 => Scenario::Fever,
            2 => Scenario::Strayed,
            3 => Scenario::LowPulse,
            _ => Scenario::Nominal,
        }
    }
}

const GRAZE_OFFSET: f64 = 0.001; // ~100 m of wander
const STRAY_OFFSET: f64 = 0.5; // far outside any sane fence

pub fn generate_reading(
    rng: &mut impl Rng,
    device_id: String,
    scenario: Scenario,
    center_lat: f64,
    center_lng: f64,
) -> Reading {
    let mut lat = center_lat + rng.gen_range(-GRAZE_OFFSET..GRAZE_OFFSET);
    let mut lng = center_lng + rng.gen_range(-GRAZE_OFFSET..GRAZE_OFFSET);
    let mut temperature: f64 = 38.5 + rng.gen_range(-0.3..0.3);
    let mut pulse = rng.gen_range(65..76);
    let mut risk_flag = false;
    let mut area = "north paddock".to_string();

    match scenario {
        Scenario::Nominal => {}
        Scenario::Fever => {
            temperature = 39.8 + rng.gen_range(0.1..0.2);
            pulse = 88;
            risk_flag = true;
        }
        Scenario::Strayed => {
            lat = center_lat + STRAY_OFFSET;
            lng = center_lng - STRAY_OFFSET;
            area = "outside".to_string();
        }
        Scenario::LowPulse => {
            pulse = 45;
            risk_flag = true;
        }
    }

    Reading {
        device_id,
        timestamp: Utc::now(),
        lat,
        lng,
        area,
        temperature: (temperature * 100.0).round() / 100.0,
        pulse,
        risk_flag,
    }
}
