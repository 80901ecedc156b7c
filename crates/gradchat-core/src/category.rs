//! Closed vocabulary of question categories

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Topical label used to scope retrieval and reference lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    ApplicationProcess,
    AdmissionRequirements,
    FinancialAid,
    InternationalStudents,
    EnrollmentProcess,
    ProgramStructure,
    ProgramOverview,
    TuitionAndCosts,
    ProgramPreparation,
    FacultyAndResearch,
    StudentEmployment,
    StudentServices,
    Curriculum,
    PracticumExperience,
    CareerOutcomes,
    AdmissionStatistics,
    Other,
}

impl Category {
    /// Every label, in the order they are presented to the model
    pub const ALL: [Category; 17] = [
        Category::ApplicationProcess,
        Category::AdmissionRequirements,
        Category::FinancialAid,
        Category::InternationalStudents,
        Category::EnrollmentProcess,
        Category::ProgramStructure,
        Category::ProgramOverview,
        Category::TuitionAndCosts,
        Category::ProgramPreparation,
        Category::FacultyAndResearch,
        Category::StudentEmployment,
        Category::StudentServices,
        Category::Curriculum,
        Category::PracticumExperience,
        Category::CareerOutcomes,
        Category::AdmissionStatistics,
        Category::Other,
    ];

    /// Label as it appears in the QA source and reference JSON
    pub fn label(&self) -> &'static str {
        match self {
            Category::ApplicationProcess => "Application Process",
            Category::AdmissionRequirements => "Admission Requirements",
            Category::FinancialAid => "Financial Aid & Scholarships",
            Category::InternationalStudents => "International Students",
            Category::EnrollmentProcess => "Enrollment Process",
            Category::ProgramStructure => "Program Structure",
            Category::ProgramOverview => "Program Overview",
            Category::TuitionAndCosts => "Tuition & Costs",
            Category::ProgramPreparation => "Program Preparation",
            Category::FacultyAndResearch => "Faculty & Research",
            Category::StudentEmployment => "Student Employment",
            Category::StudentServices => "Student Services",
            Category::Curriculum => "Curriculum",
            Category::PracticumExperience => "Practicum Experience",
            Category::CareerOutcomes => "Career Outcomes",
            Category::AdmissionStatistics => "Admission Statistics",
            Category::Other => "Other",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::ApplicationProcess => {
                "Questions about how to apply, deadlines, interviews, and application components"
            }
            Category::AdmissionRequirements => {
                "Questions about prerequisites, qualifications, and requirements"
            }
            Category::FinancialAid => {
                "Questions about funding, scholarships, and financial assistance"
            }
            Category::InternationalStudents => "Questions specific to international student needs",
            Category::EnrollmentProcess => "Questions about post-acceptance procedures",
            Category::ProgramStructure => {
                "Questions about program duration, format, and class sizes"
            }
            Category::ProgramOverview => {
                "Questions about general program information and features"
            }
            Category::TuitionAndCosts => "Questions about program costs, fees, and expenses",
            Category::ProgramPreparation => "Questions about preparing for the program",
            Category::FacultyAndResearch => {
                "Questions about professors and research opportunities"
            }
            Category::StudentEmployment => {
                "Questions about work opportunities during the program"
            }
            Category::StudentServices => "Questions about health insurance and student support",
            Category::Curriculum => "Questions about courses and academic content",
            Category::PracticumExperience => "Questions about industry projects and partnerships",
            Category::CareerOutcomes => {
                "Questions about job placement, salaries, and career paths"
            }
            Category::AdmissionStatistics => {
                "Questions about typical GPAs, backgrounds, and work experience"
            }
            Category::Other => "Questions that don't clearly fit into any of the above categories",
        }
    }

    /// Case-insensitive lookup by label
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| Error::InvalidInput(format!("unknown category: {}", s)))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Category::from_label(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown category: {}", label)))
    }
}

/// Join labels with ", " the way they are shown to users and the model
pub fn join_labels(categories: &[Category]) -> String {
    categories
        .iter()
        .map(Category::label)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup_is_case_insensitive() {
        assert_eq!(
            Category::from_label("  tuition & costs "),
            Some(Category::TuitionAndCosts)
        );
        assert_eq!(Category::from_label("Coffee Shops"), None);
    }

    #[test]
    fn test_every_label_round_trips() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&vec![Category::FinancialAid, Category::Other]).unwrap();
        assert_eq!(json, r#"["Financial Aid & Scholarships","Other"]"#);

        let parsed: Vec<Category> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![Category::FinancialAid, Category::Other]);
    }
}
