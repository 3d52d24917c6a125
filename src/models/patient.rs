use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};
use validator::Validate;

use super::{from_millis, UnknownVariant};

/// Workflow status. A record leaves `New` once clinical data is attached and
/// moves freely among the other four afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PatientStatus {
    #[default]
    #[serde(rename = "New")]
    #[sqlx(rename = "New")]
    New,
    Critical,
    Improving,
    Stable,
    Normal,
}

impl FromStr for PatientStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(PatientStatus::New),
            "critical" => Ok(PatientStatus::Critical),
            "improving" => Ok(PatientStatus::Improving),
            "stable" => Ok(PatientStatus::Stable),
            "normal" => Ok(PatientStatus::Normal),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Sex {
    #[serde(rename = "M")]
    #[sqlx(rename = "M")]
    Male,
    #[serde(rename = "F")]
    #[sqlx(rename = "F")]
    Female,
}

/// Chest pain type: typical angina, atypical angina, non-anginal, asymptomatic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum ChestPain {
    Ta,
    Ata,
    Nap,
    Asy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum RestingEcg {
    Normal,
    #[serde(rename = "ST")]
    #[sqlx(rename = "ST")]
    St,
    #[serde(rename = "LVH")]
    #[sqlx(rename = "LVH")]
    Lvh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ExerciseAngina {
    #[serde(rename = "Y")]
    #[sqlx(rename = "Y")]
    Yes,
    #[serde(rename = "N")]
    #[sqlx(rename = "N")]
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum StSlope {
    Up,
    Flat,
    Down,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum RiskLevel {
    #[serde(rename = "High Risk")]
    #[sqlx(rename = "High Risk")]
    High,
    #[serde(rename = "Moderate Risk")]
    #[sqlx(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "Medium Risk")]
    #[sqlx(rename = "Medium Risk")]
    Medium,
    #[default]
    #[serde(rename = "Low Risk")]
    #[sqlx(rename = "Low Risk")]
    Low,
}

/// The eleven inputs the risk-prediction service scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClinicalInputs {
    #[validate(range(min = 1))]
    pub age: i64,
    pub sex: Sex,
    pub chest_pain: ChestPain,
    pub resting_bp: i64,
    pub cholesterol: i64,
    #[validate(range(min = 0, max = 1))]
    pub fasting_bs: i64,
    pub resting_ecg: RestingEcg,
    pub max_hr: i64,
    pub exercise_angina: ExerciseAngina,
    pub oldpeak: f64,
    pub st_slope: StSlope,
}

/// Free-text recommendation lists, kept in the order they were produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub lifestyle: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub monitoring: Vec<String>,
    #[serde(default)]
    pub referrals: Vec<String>,
    #[serde(default)]
    pub urgent_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    pub id: String,
    pub email: String,
    pub phone_number: String,
    #[serde(rename = "Username")]
    pub username: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub doctor_email: String,
    #[serde(rename = "assignedNurseEmail")]
    pub assigned_nurse_email: String,
    pub status: PatientStatus,
    #[serde(flatten)]
    pub clinical: ClinicalInputs,
    /// 0 = normal, 1 = heart failure
    pub prediction: i64,
    pub probability: f64,
    pub risk_level: RiskLevel,
    #[serde(flatten)]
    pub recommendations: Recommendations,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for PatientRecord {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let list = |column: &str| -> Result<Vec<String>, sqlx::Error> {
            Ok(row.try_get::<Json<Vec<String>>, _>(column)?.0)
        };

        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            username: row.try_get("username")?,
            doctor_id: row.try_get("doctor_id")?,
            doctor_name: row.try_get("doctor_name")?,
            doctor_email: row.try_get("doctor_email")?,
            assigned_nurse_email: row.try_get("assigned_nurse_email")?,
            status: row.try_get("status")?,
            clinical: ClinicalInputs {
                age: row.try_get("age")?,
                sex: row.try_get("sex")?,
                chest_pain: row.try_get("chest_pain")?,
                resting_bp: row.try_get("resting_bp")?,
                cholesterol: row.try_get("cholesterol")?,
                fasting_bs: row.try_get("fasting_bs")?,
                resting_ecg: row.try_get("resting_ecg")?,
                max_hr: row.try_get("max_hr")?,
                exercise_angina: row.try_get("exercise_angina")?,
                oldpeak: row.try_get("oldpeak")?,
                st_slope: row.try_get("st_slope")?,
            },
            prediction: row.try_get("prediction")?,
            probability: row.try_get("probability")?,
            risk_level: row.try_get("risk_level")?,
            recommendations: Recommendations {
                lifestyle: list("lifestyle")?,
                medications: list("medications")?,
                monitoring: list("monitoring")?,
                referrals: list("referrals")?,
                urgent_actions: list("urgent_actions")?,
            },
            created_at: from_millis(row.try_get("created_at")?)?,
            updated_at: from_millis(row.try_get("updated_at")?)?,
        })
    }
}

/// Body of the create and update patient requests.
///
/// Every field is optional at the wire level so the workflow can report
/// missing fields itself; serde rejects values outside the clinical enums.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PatientPayload {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    #[serde(rename = "Username")]
    pub username: Option<String>,
    /// Id of the doctor account that owns the record
    pub doctor: Option<String>,
    #[serde(rename = "assignedNurseEmail")]
    pub assigned_nurse_email: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "oldEmail")]
    pub old_email: Option<String>,

    #[validate(range(min = 1))]
    pub age: Option<i64>,
    pub sex: Option<Sex>,
    pub chest_pain: Option<ChestPain>,
    pub resting_bp: Option<i64>,
    pub cholesterol: Option<i64>,
    #[validate(range(min = 0, max = 1))]
    pub fasting_bs: Option<i64>,
    pub resting_ecg: Option<RestingEcg>,
    pub max_hr: Option<i64>,
    pub exercise_angina: Option<ExerciseAngina>,
    pub oldpeak: Option<f64>,
    pub st_slope: Option<StSlope>,

    #[validate(range(min = 0, max = 1))]
    pub prediction: Option<i64>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub probability: Option<f64>,
    pub risk_level: Option<RiskLevel>,

    pub lifestyle: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
    pub monitoring: Option<Vec<String>>,
    pub referrals: Option<Vec<String>>,
    pub urgent_actions: Option<Vec<String>>,
}

impl PatientPayload {
    /// The clinical inputs, or the names of the ones that are missing.
    pub fn clinical_inputs(&self) -> Result<ClinicalInputs, Vec<&'static str>> {
        let mut missing = Vec::new();
        fn take<T: Copy>(value: Option<T>, name: &'static str, missing: &mut Vec<&'static str>) -> Option<T> {
            if value.is_none() {
                missing.push(name);
            }
            value
        }

        let age = take(self.age, "age", &mut missing);
        let sex = take(self.sex, "sex", &mut missing);
        let chest_pain = take(self.chest_pain, "chest_pain", &mut missing);
        let resting_bp = take(self.resting_bp, "resting_bp", &mut missing);
        let cholesterol = take(self.cholesterol, "cholesterol", &mut missing);
        let fasting_bs = take(self.fasting_bs, "fasting_bs", &mut missing);
        let resting_ecg = take(self.resting_ecg, "resting_ecg", &mut missing);
        let max_hr = take(self.max_hr, "max_hr", &mut missing);
        let exercise_angina = take(self.exercise_angina, "exercise_angina", &mut missing);
        let oldpeak = take(self.oldpeak, "oldpeak", &mut missing);
        let st_slope = take(self.st_slope, "st_slope", &mut missing);

        match (
            age, sex, chest_pain, resting_bp, cholesterol, fasting_bs, resting_ecg, max_hr,
            exercise_angina, oldpeak, st_slope,
        ) {
            (
                Some(age),
                Some(sex),
                Some(chest_pain),
                Some(resting_bp),
                Some(cholesterol),
                Some(fasting_bs),
                Some(resting_ecg),
                Some(max_hr),
                Some(exercise_angina),
                Some(oldpeak),
                Some(st_slope),
            ) => Ok(ClinicalInputs {
                age,
                sex,
                chest_pain,
                resting_bp,
                cholesterol,
                fasting_bs,
                resting_ecg,
                max_hr,
                exercise_angina,
                oldpeak,
                st_slope,
            }),
            _ => Err(missing),
        }
    }

    pub fn recommendations(&self) -> Recommendations {
        Recommendations {
            lifestyle: self.lifestyle.clone().unwrap_or_default(),
            medications: self.medications.clone().unwrap_or_default(),
            monitoring: self.monitoring.clone().unwrap_or_default(),
            referrals: self.referrals.clone().unwrap_or_default(),
            urgent_actions: self.urgent_actions.clone().unwrap_or_default(),
        }
    }

    /// Overwrite the clinical, prediction and recommendation fields of
    /// `record` that this payload supplies. Everything else is left alone.
    pub fn merge_into(&self, record: &mut PatientRecord) {
        let clinical = &mut record.clinical;
        if let Some(age) = self.age {
            clinical.age = age;
        }
        if let Some(sex) = self.sex {
            clinical.sex = sex;
        }
        if let Some(chest_pain) = self.chest_pain {
            clinical.chest_pain = chest_pain;
        }
        if let Some(resting_bp) = self.resting_bp {
            clinical.resting_bp = resting_bp;
        }
        if let Some(cholesterol) = self.cholesterol {
            clinical.cholesterol = cholesterol;
        }
        if let Some(fasting_bs) = self.fasting_bs {
            clinical.fasting_bs = fasting_bs;
        }
        if let Some(resting_ecg) = self.resting_ecg {
            clinical.resting_ecg = resting_ecg;
        }
        if let Some(max_hr) = self.max_hr {
            clinical.max_hr = max_hr;
        }
        if let Some(exercise_angina) = self.exercise_angina {
            clinical.exercise_angina = exercise_angina;
        }
        if let Some(oldpeak) = self.oldpeak {
            clinical.oldpeak = oldpeak;
        }
        if let Some(st_slope) = self.st_slope {
            clinical.st_slope = st_slope;
        }

        if let Some(prediction) = self.prediction {
            record.prediction = prediction;
        }
        if let Some(probability) = self.probability {
            record.probability = probability;
        }
        if let Some(risk_level) = self.risk_level {
            record.risk_level = risk_level;
        }

        let recommendations = &mut record.recommendations;
        if let Some(lifestyle) = &self.lifestyle {
            recommendations.lifestyle = lifestyle.clone();
        }
        if let Some(medications) = &self.medications {
            recommendations.medications = medications.clone();
        }
        if let Some(monitoring) = &self.monitoring {
            recommendations.monitoring = monitoring.clone();
        }
        if let Some(referrals) = &self.referrals {
            recommendations.referrals = referrals.clone();
        }
        if let Some(urgent_actions) = &self.urgent_actions {
            recommendations.urgent_actions = urgent_actions.clone();
        }
    }
}
