// 注册命令
// 注册表单写入本地状态；进入医生端/患者端前做必填检查

use crate::app::AppState;
use crate::models::{DoctorRegistration, PatientRegistration};
use serde::{Deserialize, Serialize};

/// 导航结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDto {
    pub screen: String,
}

pub async fn submit_doctor_registration(
    state: &AppState,
    form: DoctorRegistration,
) -> Result<(), String> {
    state
        .registration
        .submit_doctor(&form)
        .map_err(|e| e.to_string())
}

pub async fn submit_patient_registration(
    state: &AppState,
    form: PatientRegistration,
) -> Result<(), String> {
    state
        .registration
        .submit_patient(&form)
        .map_err(|e| e.to_string())
}

pub async fn join_as_doctor(state: &AppState) -> Result<NavigationDto, String> {
    let screen = state.registration.join_as_doctor().map_err(|e| e.to_string())?;
    Ok(NavigationDto {
        screen: screen.to_string(),
    })
}

pub async fn join_as_patient(state: &AppState) -> Result<NavigationDto, String> {
    let screen = state.registration.join_as_patient().map_err(|e| e.to_string())?;
    Ok(NavigationDto {
        screen: screen.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_doctor_gate() {
        let state = AppState::in_memory(&AppConfig::default());

        let err = join_as_doctor(&state).await.unwrap_err();
        assert_eq!(err, "Not Allowed: name is required");

        submit_doctor_registration(
            &state,
            DoctorRegistration {
                name: "Dr. Quinn Lee".to_string(),
                email: "quinn@example.com".to_string(),
                phone: "555-0199".to_string(),
                license: "MD-2231".to_string(),
                ..DoctorRegistration::default()
            },
        )
        .await
        .unwrap();

        let nav = join_as_doctor(&state).await.unwrap();
        assert_eq!(nav.screen, "join-doctor");
    }

    #[tokio::test]
    async fn test_patient_gate_requires_email() {
        let state = AppState::in_memory(&AppConfig::default());

        submit_patient_registration(
            &state,
            PatientRegistration {
                name: "Jamie Young".to_string(),
                phone: "555-0142".to_string(),
                ..PatientRegistration::default()
            },
        )
        .await
        .unwrap();

        let err = join_as_patient(&state).await.unwrap_err();
        assert_eq!(err, "Not Allowed: email is required");
    }
}
