use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::parsing::models::Candidate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub resume_url: Option<String>,
    pub skills: Vec<String>,
    pub rating: Option<i16>,
    pub status: String,
    pub notes: Option<String>,
    pub current_role: Option<String>,
    pub education: Option<String>,
    pub location: Option<String>,
    pub experience_years: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pipeline stage of a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    #[default]
    Sourced,
    Contacted,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl CandidateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStatus::Sourced => "sourced",
            CandidateStatus::Contacted => "contacted",
            CandidateStatus::Interview => "interview",
            CandidateStatus::Offer => "offer",
            CandidateStatus::Hired => "hired",
            CandidateStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sourced" => Ok(CandidateStatus::Sourced),
            "contacted" => Ok(CandidateStatus::Contacted),
            "interview" => Ok(CandidateStatus::Interview),
            "offer" => Ok(CandidateStatus::Offer),
            "hired" => Ok(CandidateStatus::Hired),
            "rejected" => Ok(CandidateStatus::Rejected),
            other => Err(format!("unknown candidate status '{other}'")),
        }
    }
}

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

fn check_rating(rating: Option<i16>) -> Result<(), String> {
    match rating {
        Some(r) if !(MIN_RATING..=MAX_RATING).contains(&r) => Err(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )),
        _ => Ok(()),
    }
}

/// Body of `POST /api/v1/candidates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCandidate {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub resume_url: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub rating: Option<i16>,
    #[serde(default)]
    pub status: CandidateStatus,
    pub notes: Option<String>,
    pub current_role: Option<String>,
    pub education: Option<String>,
    pub location: Option<String>,
    pub experience_years: Option<f64>,
}

impl NewCandidate {
    /// A parsed résumé becomes a freshly sourced candidate.
    pub fn from_parsed(candidate: &Candidate) -> Self {
        NewCandidate {
            first_name: candidate.first_name.clone().unwrap_or_default(),
            last_name: candidate.last_name.clone().unwrap_or_default(),
            email: candidate.email.clone(),
            phone: candidate.phone.clone(),
            linkedin_url: candidate.linkedin_url.clone(),
            resume_url: None,
            skills: candidate.skills.clone().unwrap_or_default(),
            rating: None,
            status: CandidateStatus::Sourced,
            notes: candidate.notes.clone(),
            current_role: candidate.current_role.clone(),
            education: candidate.education.clone(),
            location: candidate.location.clone(),
            experience_years: candidate.experience_years,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() && self.last_name.trim().is_empty() {
            return Err("first_name or last_name is required".to_string());
        }
        check_rating(self.rating)
    }
}

/// Body of `PATCH /api/v1/candidates/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidatePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub resume_url: Option<String>,
    pub skills: Option<Vec<String>>,
    pub rating: Option<i16>,
    pub status: Option<CandidateStatus>,
    pub notes: Option<String>,
    pub current_role: Option<String>,
    pub education: Option<String>,
    pub location: Option<String>,
    pub experience_years: Option<f64>,
}

impl CandidatePatch {
    pub fn validate(&self) -> Result<(), String> {
        check_rating(self.rating)
    }

    /// Applies the patch in memory, mirroring the SQL `COALESCE` update.
    pub fn apply(&self, row: &mut CandidateRow) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        set(&mut row.first_name, &self.first_name);
        set(&mut row.last_name, &self.last_name);
        set_opt(&mut row.email, &self.email);
        set_opt(&mut row.phone, &self.phone);
        set_opt(&mut row.linkedin_url, &self.linkedin_url);
        set_opt(&mut row.resume_url, &self.resume_url);
        set(&mut row.skills, &self.skills);
        set_opt(&mut row.rating, &self.rating);
        if let Some(status) = self.status {
            row.status = status.as_str().to_string();
        }
        set_opt(&mut row.notes, &self.notes);
        set_opt(&mut row.current_role, &self.current_role);
        set_opt(&mut row.education, &self.education);
        set_opt(&mut row.location, &self.location);
        set_opt(&mut row.experience_years, &self.experience_years);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parsed_maps_summary_to_notes() {
        let parsed = Candidate {
            first_name: Some("Jane".into()),
            email: Some("jane@x.com".into()),
            skills: Some(vec!["Go".into()]),
            notes: Some("Backend engineer".into()),
            experience_years: Some(6.0),
            ..Default::default()
        };
        let new = NewCandidate::from_parsed(&parsed);
        assert_eq!(new.first_name, "Jane");
        assert_eq!(new.last_name, "");
        assert_eq!(new.notes.as_deref(), Some("Backend engineer"));
        assert_eq!(new.status, CandidateStatus::Sourced);
        assert_eq!(new.experience_years, Some(6.0));
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_a_name_and_rating_range() {
        assert!(NewCandidate::default().validate().is_err());

        let mut c = NewCandidate {
            last_name: "Doe".into(),
            rating: Some(6),
            ..Default::default()
        };
        assert!(c.validate().unwrap_err().contains("rating"));
        c.rating = Some(5);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_status_serde_and_parse() {
        let new: NewCandidate =
            serde_json::from_value(json!({"first_name": "Jane", "status": "interview"})).unwrap();
        assert_eq!(new.status, CandidateStatus::Interview);
        assert_eq!("hired".parse::<CandidateStatus>().unwrap().as_str(), "hired");
        assert!("ghosted".parse::<CandidateStatus>().is_err());
    }

    #[test]
    fn test_patch_apply_leaves_absent_fields() {
        let now = Utc::now();
        let mut row = CandidateRow {
            id: Uuid::new_v4(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: Some("jane@x.com".into()),
            phone: None,
            linkedin_url: None,
            resume_url: None,
            skills: vec!["Go".into()],
            rating: None,
            status: "sourced".into(),
            notes: None,
            current_role: None,
            education: None,
            location: None,
            experience_years: None,
            created_at: now,
            updated_at: now,
        };
        let patch: CandidatePatch =
            serde_json::from_value(json!({"status": "contacted", "rating": 4})).unwrap();
        patch.apply(&mut row);
        assert_eq!(row.status, "contacted");
        assert_eq!(row.rating, Some(4));
        assert_eq!(row.email.as_deref(), Some("jane@x.com"));
        assert_eq!(row.skills, vec!["Go".to_string()]);
    }
}
