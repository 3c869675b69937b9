use crate::{error::SimError, property::Property};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Heterosexual,
    Homosexual,
    Bisexual,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    fn short(self) -> &'static str {
        match self {
            Gender::Male => "m",
            Gender::Female => "f",
        }
    }
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [
        Orientation::Heterosexual,
        Orientation::Homosexual,
        Orientation::Bisexual,
    ];

    fn short(self) -> &'static str {
        match self {
            Orientation::Heterosexual => "hetero",
            Orientation::Homosexual => "homo",
            Orientation::Bisexual => "bi",
        }
    }

    /// Whether someone of gender `own` with this orientation seeks partners of gender `other`.
    #[must_use]
    pub fn seeks(self, own: Gender, other: Gender) -> bool {
        match self {
            Orientation::Heterosexual => own != other,
            Orientation::Homosexual => own == other,
            Orientation::Bisexual => true,
        }
    }
}

impl FromStr for Gender {
    type Err = SimError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Gender::Male),
            "f" | "female" => Ok(Gender::Female),
            other => Err(SimError::config(format!("unknown gender `{other}`"))),
        }
    }
}

impl FromStr for Orientation {
    type Err = SimError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hetero" | "heterosexual" => Ok(Orientation::Heterosexual),
            "homo" | "homosexual" => Ok(Orientation::Homosexual),
            "bi" | "bisexual" => Ok(Orientation::Bisexual),
            other => Err(SimError::config(format!("unknown orientation `{other}`"))),
        }
    }
}

/// The gender/orientation stratum of an individual. Transmission parameters are looked up by
/// ordered pairs of categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category {
    pub gender: Gender,
    pub orientation: Orientation,
}

impl Category {
    pub const COUNT: usize = 6;

    pub const M_HETERO: Category = Category::new(Gender::Male, Orientation::Heterosexual);
    pub const M_HOMO: Category = Category::new(Gender::Male, Orientation::Homosexual);
    pub const M_BI: Category = Category::new(Gender::Male, Orientation::Bisexual);
    pub const F_HETERO: Category = Category::new(Gender::Female, Orientation::Heterosexual);
    pub const F_HOMO: Category = Category::new(Gender::Female, Orientation::Homosexual);
    pub const F_BI: Category = Category::new(Gender::Female, Orientation::Bisexual);

    #[must_use]
    pub const fn new(gender: Gender, orientation: Orientation) -> Self {
        Category { gender, orientation }
    }

    /// Both sides seek each other's gender.
    #[must_use]
    pub fn is_compatible_with(self, other: Category) -> bool {
        self.orientation.seeks(self.gender, other.gender)
            && other.orientation.seeks(other.gender, self.gender)
    }
}

impl Property for Category {
    const VALUES: &'static [Self] = &[
        Category::M_HETERO,
        Category::M_HOMO,
        Category::M_BI,
        Category::F_HETERO,
        Category::F_HOMO,
        Category::F_BI,
    ];

    #[inline]
    fn index(self) -> usize {
        (self.gender as usize) * Orientation::ALL.len() + self.orientation as usize
    }

    fn label(self) -> &'static str {
        match (self.gender, self.orientation) {
            (Gender::Male, Orientation::Heterosexual) => "m_hetero",
            (Gender::Male, Orientation::Homosexual) => "m_homo",
            (Gender::Male, Orientation::Bisexual) => "m_bi",
            (Gender::Female, Orientation::Heterosexual) => "f_hetero",
            (Gender::Female, Orientation::Homosexual) => "f_homo",
            (Gender::Female, Orientation::Bisexual) => "f_bi",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.gender.short(), self.orientation.short())
    }
}

impl FromStr for Category {
    type Err = SimError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (gender, orientation) = value
            .split_once('_')
            .ok_or_else(|| SimError::config(format!("malformed category `{value}`")))?;
        Ok(Category::new(gender.parse()?, orientation.parse()?))
    }
}

impl TryFrom<String> for Category {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.label().to_string()
    }
}
