//! End-of-game scoring

use serde::Serialize;

use crate::consts::CELEBRATION_THRESHOLD;

/// Result message band for a final purity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultBand {
    Excellent,
    Good,
    NotBad,
    KeepTrying,
}

impl ResultBand {
    pub fn for_purity(purity: f32) -> Self {
        if purity >= 90.0 {
            ResultBand::Excellent
        } else if purity >= 70.0 {
            ResultBand::Good
        } else if purity >= 50.0 {
            ResultBand::NotBad
        } else {
            ResultBand::KeepTrying
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ResultBand::Excellent => "Excellent! You've created very clean water that's safe to drink!",
            ResultBand::Good => "Good job! The water is much cleaner now.",
            ResultBand::NotBad => "Not bad! With more practice, you can make even cleaner water.",
            ResultBand::KeepTrying => "Keep trying! Clean water takes patience and skill.",
        }
    }
}

/// Summary reported when the filter phase ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameReport {
    /// Final purity rounded to the nearest integer
    pub final_purity: u32,
    pub band: ResultBand,
    pub message: &'static str,
    pub show_celebration: bool,
}

impl GameReport {
    pub fn from_purity(purity: f32) -> Self {
        let band = ResultBand::for_purity(purity);
        Self {
            final_purity: purity.round().max(0.0) as u32,
            band,
            message: band.message(),
            show_celebration: purity >= CELEBRATION_THRESHOLD,
        }
    }
}

/// Text offered by the share button
pub fn share_text(purity: f32) -> String {
    format!(
        "I just filtered water and achieved {}% purity in Tube Clean: Water Rescue! 💧 #CleanWater #CharityWater",
        purity.round().max(0.0) as u32
    )
}
