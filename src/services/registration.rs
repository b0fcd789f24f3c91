// 注册服务
// 注册表单只做保存；进入医生端/患者端前检查姓名、邮箱、电话

use crate::error::{TrialError, TrialResult};
use crate::models::{DoctorRegistration, PatientRegistration};
use crate::services::state::StateStore;
use log::{info, warn};
use regex::Regex;
use std::sync::OnceLock;

pub const DOCTOR_SCREEN: &str = "join-doctor";
pub const PATIENT_SCREEN: &str = "join-patient";

fn wallet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("wallet address pattern"))
}

pub fn is_wallet_address(value: &str) -> bool {
    wallet_pattern().is_match(value)
}

/// 依次检查 name、email、phone
fn check_contact(name: &str, email: &str, phone: &str) -> TrialResult<()> {
    for (field, value) in [("name", name), ("email", email), ("phone", phone)] {
        if value.trim().is_empty() {
            return Err(TrialError::MissingRequiredField(field));
        }
    }
    Ok(())
}

pub struct RegistrationService {
    state: StateStore,
}

impl RegistrationService {
    pub fn new(state: StateStore) -> Self {
        Self { state }
    }

    pub fn submit_doctor(&self, form: &DoctorRegistration) -> TrialResult<()> {
        self.state.save_doctor_registration(form)?;
        info!("doctor registration saved");
        Ok(())
    }

    pub fn submit_patient(&self, form: &PatientRegistration) -> TrialResult<()> {
        let wallet = form.wallet_address.trim();
        if !wallet.is_empty() && !is_wallet_address(wallet) {
            return Err(TrialError::InvalidField {
                field: "walletAddress",
                reason: "expected 0x followed by 40 hex digits".to_string(),
            });
        }

        self.state.save_patient_registration(form)?;
        info!("patient registration saved");
        Ok(())
    }

    /// 通过时返回目标页面
    pub fn join_as_doctor(&self) -> TrialResult<&'static str> {
        let form = self.state.doctor_registration()?.unwrap_or_default();
        check_contact(&form.name, &form.email, &form.phone).map_err(|e| {
            warn!("doctor screen blocked: {}", e);
            e
        })?;
        Ok(DOCTOR_SCREEN)
    }

    pub fn join_as_patient(&self) -> TrialResult<&'static str> {
        let form = self.state.patient_registration()?.unwrap_or_default();
        check_contact(&form.name, &form.email, &form.phone).map_err(|e| {
            warn!("patient screen blocked: {}", e);
            e
        })?;
        Ok(PATIENT_SCREEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient_form() -> PatientRegistration {
        PatientRegistration {
            name: "Riley Moore".to_string(),
            email: "riley@example.com".to_string(),
            phone: "555-0100".to_string(),
            age: "34".to_string(),
            health_status: "healthy".to_string(),
            ..PatientRegistration::default()
        }
    }

    #[test]
    fn test_gate_without_registration() {
        let registration = RegistrationService::new(StateStore::in_memory());

        assert!(matches!(
            registration.join_as_doctor(),
            Err(TrialError::MissingRequiredField("name"))
        ));
        assert!(matches!(
            registration.join_as_patient(),
            Err(TrialError::MissingRequiredField("name"))
        ));
    }

    #[test]
    fn test_gate_names_first_missing_field() {
        let registration = RegistrationService::new(StateStore::in_memory());
        let form = DoctorRegistration {
            name: "Dr. Avery Clark".to_string(),
            email: "avery@example.com".to_string(),
            phone: "   ".to_string(),
            ..DoctorRegistration::default()
        };
        registration.submit_doctor(&form).unwrap();

        assert!(matches!(
            registration.join_as_doctor(),
            Err(TrialError::MissingRequiredField("phone"))
        ));
    }

    #[test]
    fn test_gate_opens_after_registration() {
        let registration = RegistrationService::new(StateStore::in_memory());
        registration.submit_patient(&patient_form()).unwrap();

        assert_eq!(registration.join_as_patient().unwrap(), PATIENT_SCREEN);
    }

    #[test]
    fn test_wallet_address_format() {
        let registration = RegistrationService::new(StateStore::in_memory());

        let bad = PatientRegistration {
            wallet_address: "0x1234".to_string(),
            ..patient_form()
        };
        assert!(matches!(
            registration.submit_patient(&bad),
            Err(TrialError::InvalidField { field: "walletAddress", .. })
        ));

        let good = PatientRegistration {
            wallet_address: format!("0x{}", "aB3".repeat(13) + "f"),
            ..patient_form()
        };
        registration.submit_patient(&good).unwrap();
    }
}
