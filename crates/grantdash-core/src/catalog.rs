//! Static catalog of the 25 tracked grant types.
//!
//! Pure reference data: defined once, never mutated. Records refer to catalog
//! entries by name; free-text names from external sheets may have no entry.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::parse_date;

/// Grouping used by catalog browsing and the category filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GrantCategory {
    BusinessInnovation,
    EducationResearch,
    CommunitySocial,
    EnvironmentEnergy,
    EmergencyRelief,
}

impl GrantCategory {
    pub const ALL: [GrantCategory; 5] = [
        GrantCategory::BusinessInnovation,
        GrantCategory::EducationResearch,
        GrantCategory::CommunitySocial,
        GrantCategory::EnvironmentEnergy,
        GrantCategory::EmergencyRelief,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GrantCategory::BusinessInnovation => "Business & Innovation",
            GrantCategory::EducationResearch => "Education & Research",
            GrantCategory::CommunitySocial => "Community & Social",
            GrantCategory::EnvironmentEnergy => "Environment & Energy",
            GrantCategory::EmergencyRelief => "Emergency & Relief",
        }
    }

    /// Case-insensitive match on the display name, ignoring punctuation.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = fold(raw);
        Self::ALL.into_iter().find(|c| fold(c.as_str()) == key)
    }
}

impl fmt::Display for GrantCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When applications for a grant type are due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlinePolicy {
    Date(NaiveDate),
    Rolling,
}

#[derive(Debug, Clone, Serialize)]
pub struct GrantCatalogEntry {
    pub name: &'static str,
    pub short_name: &'static str,
    pub description: &'static str,
    pub category: GrantCategory,
    pub max_amount: i64,
    pub avg_amount: i64,
    /// Historical success rate, percent.
    pub success_rate: f64,
    /// `YYYY-MM-DD` or `Rolling basis`.
    pub deadline: &'static str,
    pub agency: &'static str,
    pub eligibility: &'static str,
    pub duration: &'static str,
}

impl GrantCatalogEntry {
    pub fn deadline_policy(&self) -> DeadlinePolicy {
        match parse_date(self.deadline) {
            Some(d) => DeadlinePolicy::Date(d),
            None => DeadlinePolicy::Rolling,
        }
    }
}

use GrantCategory::*;

macro_rules! entry {
    ($name:literal, $short:literal, $desc:literal, $cat:expr, $max:literal, $avg:literal,
     $rate:literal, $deadline:literal, $agency:literal, $elig:literal, $dur:literal) => {
        GrantCatalogEntry {
            name: $name,
            short_name: $short,
            description: $desc,
            category: $cat,
            max_amount: $max,
            avg_amount: $avg,
            success_rate: $rate,
            deadline: $deadline,
            agency: $agency,
            eligibility: $elig,
            duration: $dur,
        }
    };
}

pub static CATALOG: [GrantCatalogEntry; 25] = [
    entry!("Small Business Innovation Research", "SBIR Grants",
        "Federal funding for small business R&D projects",
        BusinessInnovation, 1_750_000, 500_000, 15.2, "2024-12-15", "SBA",
        "Small businesses with <500 employees", "24 months"),
    entry!("Small Business Technology Transfer", "STTR Grants",
        "Collaborative R&D between small business and research institutions",
        BusinessInnovation, 1_750_000, 750_000, 12.8, "2024-11-30", "SBA",
        "Small business + research institution partnership", "24 months"),
    entry!("Minority-Owned Business Grants", "Minority Business Grants",
        "Support for minority-owned business development",
        BusinessInnovation, 250_000, 75_000, 22.5, "2024-10-31", "MBDA",
        "51% minority-owned businesses", "12 months"),
    entry!("Women-Owned Business Grants", "Women Business Grants",
        "Funding for women entrepreneurs and business owners",
        BusinessInnovation, 200_000, 65_000, 25.3, "2024-12-01", "SBA",
        "51% women-owned businesses", "18 months"),
    entry!("Rural Business Development Grants", "Rural Development Grants",
        "Economic development in rural communities",
        BusinessInnovation, 500_000, 150_000, 18.7, "2024-11-15", "USDA",
        "Rural areas <50,000 population", "36 months"),
    entry!("Pell Grants", "Pell Grants",
        "Federal financial aid for undergraduate students",
        EducationResearch, 7_395, 4_500, 85.2, "2024-06-30", "Department of Education",
        "Undergraduate students with financial need", "Academic year"),
    entry!("Fulbright Program Grants", "Fulbright Grants",
        "International educational exchange programs",
        EducationResearch, 50_000, 25_000, 20.1, "2024-10-15", "State Department",
        "US citizens with bachelor's degree", "10 months"),
    entry!("National Science Foundation (NSF)", "NSF Grants",
        "Scientific research and education funding",
        EducationResearch, 2_000_000, 400_000, 24.8, "2024-12-31", "NSF",
        "Universities and research institutions", "36 months"),
    entry!("Teacher Quality Partnership Grants", "Teacher Quality Grants",
        "Improving teacher preparation and development",
        EducationResearch, 300_000, 125_000, 28.5, "2024-09-30", "Department of Education",
        "Higher education institutions", "60 months"),
    entry!("Head Start Program Grants", "Head Start Grants",
        "Early childhood education and family services",
        CommunitySocial, 1_500_000, 800_000, 35.2, "2024-08-15", "HHS",
        "Non-profit organizations", "60 months"),
    entry!("Community Development Block Grants", "CDBG Grants",
        "Community development and housing assistance",
        CommunitySocial, 5_000_000, 1_200_000, 42.1, "2024-07-31", "HUD",
        "Local governments", "12 months"),
    entry!("Arts & Culture Grants", "Arts Grants",
        "Supporting arts and cultural programs",
        CommunitySocial, 100_000, 25_000, 31.8, "2024-11-01", "NEA",
        "Arts organizations and artists", "24 months"),
    entry!("Health & Wellness Grants", "Health Grants",
        "Public health and wellness initiatives",
        CommunitySocial, 750_000, 200_000, 26.4, "2024-10-15", "CDC",
        "Health organizations", "36 months"),
    entry!("Youth Development Grants", "Youth Development Grants",
        "Programs for youth development and education",
        CommunitySocial, 400_000, 100_000, 33.7, "2024-09-15", "Department of Labor",
        "Youth-serving organizations", "36 months"),
    entry!("Environmental Education Grants", "Environmental Grants",
        "Environmental education and awareness programs",
        EnvironmentEnergy, 300_000, 85_000, 29.2, "2024-12-01", "EPA",
        "Educational institutions", "24 months"),
    entry!("Energy Efficiency and Renewable", "Energy Grants",
        "Clean energy and efficiency projects",
        EnvironmentEnergy, 2_500_000, 600_000, 19.8, "2024-11-30", "DOE",
        "Businesses and organizations", "48 months"),
    entry!("Agricultural Research Grants", "Agriculture Grants",
        "Agricultural research and development",
        EducationResearch, 1_000_000, 250_000, 23.5, "2024-10-31", "USDA",
        "Research institutions", "36 months"),
    entry!("STEM Education Grants", "STEM Education Grants",
        "Science, technology, engineering, and math education",
        EducationResearch, 500_000, 150_000, 27.3, "2024-12-15", "NSF",
        "Educational institutions", "60 months"),
    entry!("Biomedical Research Grants", "Biomedical Grants",
        "Medical and biological research funding",
        EducationResearch, 3_000_000, 750_000, 21.7, "2024-11-01", "NIH",
        "Research institutions", "60 months"),
    entry!("Technology Commercialization Grants", "Tech Commercialization Grants",
        "Bringing technology innovations to market",
        BusinessInnovation, 1_250_000, 400_000, 16.9, "2024-12-31", "NIST",
        "Small businesses and startups", "24 months"),
    entry!("Veterans Assistance Grants", "Veterans Grants",
        "Support services for military veterans",
        CommunitySocial, 600_000, 175_000, 38.4, "2024-09-30", "VA",
        "Veteran service organizations", "36 months"),
    entry!("Disaster Relief and Recovery Grants", "Disaster Relief Grants",
        "Emergency response and recovery assistance",
        EmergencyRelief, 10_000_000, 2_500_000, 45.2, "Rolling basis", "FEMA",
        "State and local governments", "24 months"),
    entry!("Housing Assistance Grants", "Housing Grants",
        "Affordable housing development and assistance",
        CommunitySocial, 3_000_000, 850_000, 32.6, "2024-08-31", "HUD",
        "Housing authorities", "60 months"),
    entry!("Accessibility Grants", "Accessibility Grants",
        "Improving accessibility for people with disabilities",
        CommunitySocial, 400_000, 120_000, 34.8, "2024-10-01", "DOL",
        "Non-profit organizations", "36 months"),
    entry!("Cultural Preservation Grants", "Cultural Preservation Grants",
        "Preserving cultural heritage and historic sites",
        CommunitySocial, 750_000, 200_000, 28.9, "2024-11-15", "NEH",
        "Cultural institutions", "48 months"),
];

/// All catalog entries in display order.
pub fn entries() -> &'static [GrantCatalogEntry] {
    &CATALOG
}

/// Look up an entry by grant-type name.
///
/// Exact match first; then a case-insensitive match that ignores punctuation
/// and leading decoration, so `"🔬 national science foundation (nsf)"` resolves.
pub fn lookup(name: &str) -> Option<&'static GrantCatalogEntry> {
    if let Some(e) = CATALOG.iter().find(|e| e.name == name) {
        return Some(e);
    }
    let key = fold(name);
    if key.is_empty() {
        return None;
    }
    CATALOG
        .iter()
        .find(|e| fold(e.name) == key || fold(e.short_name) == key)
}

/// Entries in one category, in catalog order.
pub fn by_category(category: GrantCategory) -> impl Iterator<Item = &'static GrantCatalogEntry> {
    CATALOG.iter().filter(move |e| e.category == category)
}

/// Category of a grant-type name, if it is in the catalog.
pub fn category_of(grant_type: &str) -> Option<GrantCategory> {
    lookup(grant_type).map(|e| e.category)
}

/// Case-insensitive substring search over name, short name, description,
/// agency and category.
pub fn search(query: &str) -> Vec<&'static GrantCatalogEntry> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }
    CATALOG
        .iter()
        .filter(|e| {
            [e.name, e.short_name, e.description, e.agency, e.category.as_str()]
                .iter()
                .any(|field| field.to_lowercase().contains(&q))
        })
        .collect()
}

/// Lower-case alphanumerics only.
fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
