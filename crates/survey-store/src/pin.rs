//! Respondent directory: PIN records per survey type behind an injected repository.

use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::crypto;
use crate::error::StoreError;

/// Which questionnaire a respondent is entitled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurveyType {
    TracerStudy,
    UserSurvey,
}

impl SurveyType {
    pub const ALL: [SurveyType; 2] = [SurveyType::TracerStudy, SurveyType::UserSurvey];

    pub fn as_str(self) -> &'static str {
        match self {
            SurveyType::TracerStudy => "tracer-study",
            SurveyType::UserSurvey => "user-survey",
        }
    }

    fn user_id_prefix(self) -> &'static str {
        match self {
            SurveyType::TracerStudy => "TS",
            SurveyType::UserSurvey => "US",
        }
    }

    fn respondent_label(self) -> &'static str {
        match self {
            SurveyType::TracerStudy => "Alumni",
            SurveyType::UserSurvey => "Pengguna Lulusan",
        }
    }
}

impl fmt::Display for SurveyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurveyType {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        SurveyType::ALL
            .into_iter()
            .find(|survey_type| survey_type.as_str() == raw.trim())
            .ok_or_else(|| StoreError::UnknownSurveyType(raw.to_string()))
    }
}

/// One respondent entry. Only the salted hash of the PIN is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRecord {
    #[serde(rename = "hashedPIN")]
    pub hashed_pin: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub survey_type: SurveyType,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login: Option<OffsetDateTime>,
}

/// PIN lists the directory is generated from, one list per survey type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinSeed {
    pub tracer_study: Vec<String>,
    pub user_survey: Vec<String>,
}

impl Default for PinSeed {
    fn default() -> Self {
        let owned = |pins: &[&str]| pins.iter().map(|pin| pin.to_string()).collect();
        Self {
            tracer_study: owned(&["482913", "573028", "619384", "730495", "841506"]),
            user_survey: owned(&["294817", "305928", "416039", "527140", "638251"]),
        }
    }
}

impl PinSeed {
    pub fn pins(&self, survey_type: SurveyType) -> &[String] {
        match survey_type {
            SurveyType::TracerStudy => &self.tracer_study,
            SurveyType::UserSurvey => &self.user_survey,
        }
    }
}

/// Login request as posted by the respondent entry form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinLogin {
    pub pin: String,
    pub survey_type: String,
}

/// Identity handed to the survey runtime after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondentIdentity {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub survey_type: SurveyType,
}

impl From<&PinRecord> for RespondentIdentity {
    fn from(record: &PinRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            survey_type: record.survey_type,
        }
    }
}

/// Backing store for PIN records.
pub trait PinRepository: Send + Sync {
    /// Active record of `survey_type` whose stored hash equals `hashed_pin`.
    fn find_active(&self, hashed_pin: &str, survey_type: SurveyType) -> Option<PinRecord>;
    fn lookup(&self, user_id: &str) -> Option<PinRecord>;
    fn list_active(&self, survey_type: Option<SurveyType>) -> Vec<PinRecord>;
    /// Stamps `last_login` and returns the updated record.
    fn mark_used(&self, user_id: &str, at: OffsetDateTime) -> Option<PinRecord>;
    /// Deactivates the record; `false` when no record has that id.
    fn revoke(&self, user_id: &str) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryPinRepository {
    records: RwLock<Vec<PinRecord>>,
}

impl InMemoryPinRepository {
    pub fn with_records(records: Vec<PinRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Builds one active record per seeded PIN, hashing each with `salt`.
    pub fn seeded(seed: &PinSeed, salt: &str) -> Self {
        let created_at = OffsetDateTime::now_utc();
        let records = SurveyType::ALL
            .into_iter()
            .flat_map(|survey_type| {
                seed.pins(survey_type)
                    .iter()
                    .enumerate()
                    .map(move |(idx, pin)| {
                        let number = idx + 1;
                        let user_id = format!("{}_{number:03}", survey_type.user_id_prefix());
                        PinRecord {
                            hashed_pin: crypto::hash(pin.trim(), salt),
                            name: format!("{} {number:03}", survey_type.respondent_label()),
                            email: format!("{}@{survey_type}.local", user_id.to_lowercase()),
                            user_id,
                            survey_type,
                            is_active: true,
                            created_at,
                            last_login: None,
                        }
                    })
            })
            .collect();
        Self::with_records(records)
    }

    pub fn snapshot(&self) -> Vec<PinRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PinRepository for InMemoryPinRepository {
    fn find_active(&self, hashed_pin: &str, survey_type: SurveyType) -> Option<PinRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .find(|record| {
                record.is_active
                    && record.survey_type == survey_type
                    && record.hashed_pin == hashed_pin
            })
            .cloned()
    }

    fn lookup(&self, user_id: &str) -> Option<PinRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.iter().find(|record| record.user_id == user_id).cloned()
    }

    fn list_active(&self, survey_type: Option<SurveyType>) -> Vec<PinRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .filter(|record| record.is_active)
            .filter(|record| survey_type.is_none_or(|wanted| record.survey_type == wanted))
            .cloned()
            .collect()
    }

    fn mark_used(&self, user_id: &str, at: OffsetDateTime) -> Option<PinRecord> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let record = records.iter_mut().find(|record| record.user_id == user_id)?;
        record.last_login = Some(at);
        Some(record.clone())
    }

    fn revoke(&self, user_id: &str) -> bool {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match records.iter_mut().find(|record| record.user_id == user_id) {
            Some(record) => {
                record.is_active = false;
                true
            }
            None => false,
        }
    }
}

/// PIN validation over a repository. Unknown and inactive PINs are reported
/// the same way.
#[derive(Debug)]
pub struct PinDirectory<R> {
    repository: R,
    salt: String,
}

impl<R: PinRepository> PinDirectory<R> {
    pub fn new(repository: R, salt: impl Into<String>) -> Self {
        Self {
            repository,
            salt: salt.into(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn validate(&self, pin: &str, survey_type: SurveyType) -> Option<PinRecord> {
        let pin = pin.trim();
        if pin.is_empty() {
            debug!(%survey_type, "pin validation skipped for empty input");
            return None;
        }
        let hashed = crypto::hash(pin, &self.salt);
        let Some(found) = self.repository.find_active(&hashed, survey_type) else {
            debug!(%survey_type, "pin validation failed");
            return None;
        };
        debug!(%survey_type, user_id = %found.user_id, "pin validated");
        self.repository
            .mark_used(&found.user_id, OffsetDateTime::now_utc())
    }

    pub fn validate_login(&self, login: &PinLogin) -> Option<RespondentIdentity> {
        let survey_type = login.survey_type.parse::<SurveyType>().ok()?;
        self.validate(&login.pin, survey_type)
            .as_ref()
            .map(RespondentIdentity::from)
    }

    pub fn lookup_by_user_id(&self, user_id: &str) -> Option<PinRecord> {
        self.repository.lookup(user_id)
    }

    pub fn list_active(&self, survey_type: Option<SurveyType>) -> Vec<PinRecord> {
        self.repository.list_active(survey_type)
    }

    pub fn deactivate(&self, user_id: &str) -> bool {
        let existed = self.repository.revoke(user_id);
        debug!(user_id, existed, "respondent deactivated");
        existed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survey_type_parses_wire_names() {
        assert_eq!("tracer-study".parse::<SurveyType>().ok(), Some(SurveyType::TracerStudy));
        assert_eq!(" user-survey ".parse::<SurveyType>().ok(), Some(SurveyType::UserSurvey));
        assert!("alumni".parse::<SurveyType>().is_err());
    }

    #[test]
    fn seeded_ids_are_prefixed_per_type() {
        let repo = InMemoryPinRepository::seeded(&PinSeed::default(), "salt");
        let ids: Vec<_> = repo
            .list_active(Some(SurveyType::UserSurvey))
            .into_iter()
            .map(|record| record.user_id)
            .collect();
        assert_eq!(ids, ["US_001", "US_002", "US_003", "US_004", "US_005"]);
        assert!(repo.snapshot().iter().all(|record| record.hashed_pin.len() == 64));
    }

    #[test]
    fn record_serializes_with_wire_names() {
        let repo = InMemoryPinRepository::seeded(&PinSeed::default(), "salt");
        let record = repo.lookup("TS_001").expect("seeded");
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["userID"], "TS_001");
        assert_eq!(json["surveyType"], "tracer-study");
        assert!(json.get("hashedPIN").is_some());
        assert!(json.get("lastLogin").is_none());
    }
}
