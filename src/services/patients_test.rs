use super::*;

fn valid_input() -> PatientInput {
    PatientInput {
        first_name: "Maria".into(),
        last_name: "Santos".into(),
        email: Some("maria@example.com".into()),
        phone: "09171234567".into(),
        ..PatientInput::default()
    }
}

// =============================================================================
// normalize_email
// =============================================================================

#[test]
fn normalize_email_lowercases_and_trims() {
    assert_eq!(normalize_email("  Maria@Example.COM "), Some("maria@example.com".into()));
}

#[test]
fn normalize_email_rejects_missing_at() {
    assert_eq!(normalize_email("maria.example.com"), None);
}

#[test]
fn normalize_email_rejects_empty_parts() {
    assert_eq!(normalize_email("@example.com"), None);
    assert_eq!(normalize_email("maria@"), None);
}

#[test]
fn normalize_email_rejects_double_at() {
    assert_eq!(normalize_email("a@b@c.com"), None);
}

// =============================================================================
// validate
// =============================================================================

#[test]
fn valid_intake_passes() {
    assert!(validate(&valid_input()).is_ok());
}

#[test]
fn first_name_required() {
    let mut input = valid_input();
    input.first_name = "   ".into();
    assert!(matches!(validate(&input), Err(PatientError::Validation(_))));
}

#[test]
fn last_name_required() {
    let mut input = valid_input();
    input.last_name = String::new();
    assert!(matches!(validate(&input), Err(PatientError::Validation(_))));
}

#[test]
fn names_capped_at_50() {
    let mut input = valid_input();
    input.first_name = "x".repeat(51);
    assert!(validate(&input).is_err());
    input.first_name = "x".repeat(50);
    assert!(validate(&input).is_ok());
}

#[test]
fn phone_must_be_at_least_10_digits() {
    let mut input = valid_input();
    input.phone = "12345".into();
    let err = validate(&input).unwrap_err();
    assert!(err.to_string().contains("at least 10"));
}

#[test]
fn phone_capped_at_15() {
    let mut input = valid_input();
    input.phone = "1".repeat(16);
    assert!(validate(&input).is_err());
}

#[test]
fn blank_email_is_allowed() {
    let mut input = valid_input();
    input.email = Some("  ".into());
    assert!(validate(&input).is_ok());
    input.email = None;
    assert!(validate(&input).is_ok());
}

#[test]
fn malformed_email_is_rejected() {
    let mut input = valid_input();
    input.email = Some("not-an-email".into());
    assert!(matches!(validate(&input), Err(PatientError::Validation(_))));
}

#[test]
fn age_must_be_in_range() {
    let mut input = valid_input();
    input.age = Some(151);
    assert!(validate(&input).is_err());
    input.age = Some(-1);
    assert!(validate(&input).is_err());
    input.age = Some(0);
    assert!(validate(&input).is_ok());
    input.age = Some(150);
    assert!(validate(&input).is_ok());
}

#[test]
fn address_capped_at_500() {
    let mut input = valid_input();
    input.address = Some("x".repeat(501));
    assert!(validate(&input).is_err());
}

#[test]
fn policy_number_capped_at_50() {
    let mut input = valid_input();
    input.insurance_policy_number = Some("x".repeat(51));
    assert!(validate(&input).is_err());
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

#[test]
fn patient_dates_serialize_as_strings() {
    let patient = Patient {
        id: Uuid::new_v4(),
        first_name: "Maria".into(),
        last_name: "Santos".into(),
        email: None,
        phone: "09171234567".into(),
        address: None,
        date_of_birth: Some(time::macros::date!(1990-05-20)),
        age: Some(36),
        gender: None,
        marital_status: None,
        occupation: None,
        emergency_contact_name: None,
        emergency_contact_phone: None,
        insurance_provider: None,
        insurance_policy_number: None,
        xray_images: Vec::new(),
        created_at: time::macros::datetime!(2026-08-28 17:33:20 UTC),
    };
    let value = serde_json::to_value(&patient).unwrap();
    assert_eq!(value["date_of_birth"], "1990-05-20");
    assert_eq!(value["created_at"], "2026-08-28T17:33:20Z");
}

#[test]
fn intake_accepts_iso_birth_date_or_omits_it() {
    let parsed: PatientInput = serde_json::from_value(serde_json::json!({
        "first_name": "Maria",
        "last_name": "Santos",
        "phone": "09171234567",
        "date_of_birth": "1990-05-20",
    }))
    .unwrap();
    assert_eq!(parsed.date_of_birth, Some(time::macros::date!(1990-05-20)));

    let parsed: PatientInput = serde_json::from_value(serde_json::json!({
        "first_name": "Maria",
        "last_name": "Santos",
        "phone": "09171234567",
    }))
    .unwrap();
    assert_eq!(parsed.date_of_birth, None);
}

// =============================================================================
// LIVE DB
// =============================================================================

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required for live-db-tests");
        crate::db::init_pool(&url).await.expect("database init failed")
    }

    #[tokio::test]
    async fn create_get_update_delete_round_trip() {
        let pool = test_pool().await;
        let created = create(&pool, &valid_input()).await.unwrap();
        assert_eq!(created.first_name, "Maria");
        assert!(created.xray_images.is_empty());

        let fetched = get(&pool, created.id).await.unwrap();
        assert_eq!(fetched.email.as_deref(), Some("maria@example.com"));

        let mut input = valid_input();
        input.occupation = Some("Nurse".into());
        let updated = update(&pool, created.id, &input).await.unwrap();
        assert_eq!(updated.occupation.as_deref(), Some("Nurse"));

        delete(&pool, created.id).await.unwrap();
        assert!(matches!(get(&pool, created.id).await, Err(PatientError::NotFound(_))));
    }
}
