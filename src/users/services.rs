use lazy_static::lazy_static;
use regex::Regex;

use super::dto::{RegisterRequest, UpdateUserRequest};
use crate::error::{ApiError, ApiResult};

pub const MIN_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;
const MIN_DNI_LEN: usize = 7;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_names(name: &str, surname: &str) -> ApiResult<()> {
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ApiError::BadRequest("name must have at least 2 characters".into()));
    }
    if surname.chars().count() < MIN_NAME_LEN {
        return Err(ApiError::BadRequest("surname must have at least 2 characters".into()));
    }
    Ok(())
}

/// Trims every field, lowercases the email and drops an empty tax id.
pub fn normalize_registration(mut req: RegisterRequest) -> RegisterRequest {
    req.name = req.name.trim().to_string();
    req.surname = req.surname.trim().to_string();
    req.dni = req.dni.trim().to_string();
    req.cuil_cuit = req
        .cuil_cuit
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    req.email = req.email.trim().to_lowercase();
    req.phone = req.phone.trim().to_string();
    req
}

pub fn validate_registration(req: &RegisterRequest) -> ApiResult<()> {
    check_names(&req.name, &req.surname)?;
    if req.dni.chars().count() < MIN_DNI_LEN {
        return Err(ApiError::BadRequest("dni must have at least 7 characters".into()));
    }
    if !is_valid_email(&req.email) {
        return Err(ApiError::BadRequest("invalid email".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest("password too short".into()));
    }
    if req.guests < 1 {
        return Err(ApiError::BadRequest("guests must be at least 1".into()));
    }
    Ok(())
}

pub fn normalize_update(mut req: UpdateUserRequest) -> ApiResult<UpdateUserRequest> {
    req.name = req.name.trim().to_string();
    req.surname = req.surname.trim().to_string();
    req.email = req.email.trim().to_lowercase();
    check_names(&req.name, &req.surname)?;
    if !is_valid_email(&req.email) {
        return Err(ApiError::BadRequest("invalid email".into()));
    }
    Ok(req)
}

/// Message for a unique index violation raised while inserting a user.
pub fn duplicate_field_message(constraint: &str) -> &'static str {
    match constraint {
        "users_email_key" => "email already registered",
        "users_dni_key" => "dni already registered",
        "users_cuil_cuit_key" => "cuil/cuit already registered",
        _ => "user already registered",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            name: "  Ana ".into(),
            surname: "García".into(),
            dni: " 30123456 ".into(),
            cuil_cuit: Some("   ".into()),
            email: " Ana@Example.COM ".into(),
            phone: "1155550000".into(),
            guests: 2,
            password: "posada-secreta".into(),
        }
    }

    #[test]
    fn email_regex() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn normalization_trims_and_lowercases() {
        let req = normalize_registration(request());
        assert_eq!(req.name, "Ana");
        assert_eq!(req.dni, "30123456");
        assert_eq!(req.email, "ana@example.com");
        assert_eq!(req.cuil_cuit, None);
        assert!(validate_registration(&req).is_ok());
    }

    #[test]
    fn rejects_short_fields() {
        let mut req = normalize_registration(request());
        req.password = "short".into();
        assert!(matches!(
            validate_registration(&req),
            Err(ApiError::BadRequest(m)) if m.contains("password")
        ));

        let mut req = normalize_registration(request());
        req.dni = "123".into();
        assert!(matches!(
            validate_registration(&req),
            Err(ApiError::BadRequest(m)) if m.contains("dni")
        ));

        let mut req = normalize_registration(request());
        req.surname = "G".into();
        assert!(validate_registration(&req).is_err());

        let mut req = normalize_registration(request());
        req.guests = 0;
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn registration_accepts_spanish_field_names() {
        let json = r#"{
            "nombre": "Juan", "apellido": "Pérez", "dni": "28999111",
            "email": "juan@example.com", "telefono": "221-555", "password": "12345678"
        }"#;
        let req: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.name, "Juan");
        assert_eq!(req.phone, "221-555");
        assert_eq!(req.guests, 1);
    }

    #[test]
    fn update_is_validated() {
        let ok = normalize_update(UpdateUserRequest {
            name: "Ana".into(),
            surname: "Gómez".into(),
            email: "ANA@posada.com".into(),
        })
        .unwrap();
        assert_eq!(ok.email, "ana@posada.com");

        assert!(normalize_update(UpdateUserRequest {
            name: "Ana".into(),
            surname: "Gómez".into(),
            email: "not-an-email".into(),
        })
        .is_err());
    }

    #[test]
    fn duplicate_messages_name_the_field() {
        assert_eq!(duplicate_field_message("users_dni_key"), "dni already registered");
        assert_eq!(duplicate_field_message("users_email_key"), "email already registered");
        assert_eq!(duplicate_field_message("other"), "user already registered");
    }
}
