use crate::property::Property;
use serde::{Deserialize, Serialize};

/// Per-person disease and care state. Progression only moves forward:
/// `Susceptible -> InfectedUndiagnosed -> Diagnosed{NoArt|Art} -> Dead`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseState {
    #[default]
    Susceptible,
    InfectedUndiagnosed,
    DiagnosedNoArt,
    DiagnosedArt,
    Dead,
}

impl DiseaseState {
    pub const COUNT: usize = 5;

    #[must_use]
    #[inline]
    pub fn is_infectious(self) -> bool {
        matches!(
            self,
            DiseaseState::InfectedUndiagnosed
                | DiseaseState::DiagnosedNoArt
                | DiseaseState::DiagnosedArt
        )
    }

    #[must_use]
    #[inline]
    pub fn is_diagnosed(self) -> bool {
        matches!(self, DiseaseState::DiagnosedNoArt | DiseaseState::DiagnosedArt)
    }

    #[must_use]
    #[inline]
    pub fn is_alive(self) -> bool {
        self != DiseaseState::Dead
    }

    /// Whether a single step may move a person from `self` to `next`. Staying put is always
    /// allowed.
    #[must_use]
    pub fn can_transition_to(self, next: DiseaseState) -> bool {
        use DiseaseState::*;
        self == next
            || matches!(
                (self, next),
                (Susceptible, InfectedUndiagnosed)
                    | (InfectedUndiagnosed, DiagnosedNoArt)
                    | (InfectedUndiagnosed, DiagnosedArt)
                    | (DiagnosedNoArt, Dead)
                    | (DiagnosedArt, Dead)
            )
    }
}

impl Property for DiseaseState {
    const VALUES: &'static [Self] = &[
        DiseaseState::Susceptible,
        DiseaseState::InfectedUndiagnosed,
        DiseaseState::DiagnosedNoArt,
        DiseaseState::DiagnosedArt,
        DiseaseState::Dead,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            DiseaseState::Susceptible => "susceptible",
            DiseaseState::InfectedUndiagnosed => "infected_undiagnosed",
            DiseaseState::DiagnosedNoArt => "diagnosed_no_art",
            DiseaseState::DiagnosedArt => "diagnosed_art",
            DiseaseState::Dead => "dead",
        }
    }
}
