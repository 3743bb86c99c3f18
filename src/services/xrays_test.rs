use super::*;

// =============================================================================
// validate_upload
// =============================================================================

#[test]
fn accepted_extensions_pass() {
    for name in ["scan.jpg", "scan.jpeg", "scan.png", "scan.webp"] {
        assert!(validate_upload(name, 1024).is_ok(), "{name} should pass");
    }
}

#[test]
fn extension_check_is_case_insensitive() {
    assert!(validate_upload("SCAN.JPG", 1024).is_ok());
    assert!(validate_upload("scan.PnG", 1024).is_ok());
}

#[test]
fn unknown_extension_rejected() {
    let err = validate_upload("scan.gif", 1024).unwrap_err();
    assert!(err.to_string().contains(".gif"));
    assert!(validate_upload("scan.pdf", 1024).is_err());
}

#[test]
fn missing_extension_rejected() {
    assert!(validate_upload("scan", 1024).is_err());
    assert!(validate_upload("scan.", 1024).is_err());
}

#[test]
fn size_cap_enforced() {
    assert!(validate_upload("scan.png", MAX_UPLOAD_BYTES).is_ok());
    assert!(validate_upload("scan.png", MAX_UPLOAD_BYTES + 1).is_err());
}

// =============================================================================
// object_key
// =============================================================================

#[test]
fn object_key_is_scoped_to_patient() {
    let patient_id = Uuid::new_v4();
    let key = object_key(patient_id, "bitewing.jpg").unwrap();
    assert!(key.starts_with(&format!("{patient_id}/")));
    assert!(key.ends_with(".jpg"));
}

#[test]
fn object_key_lowercases_extension() {
    let key = object_key(Uuid::new_v4(), "bitewing.JPEG").unwrap();
    assert!(key.ends_with(".jpeg"));
}

#[test]
fn object_keys_are_unique_per_upload() {
    let patient_id = Uuid::new_v4();
    let a = object_key(patient_id, "scan.png").unwrap();
    let b = object_key(patient_id, "scan.png").unwrap();
    assert_ne!(a, b);
}

#[test]
fn object_key_rejects_invalid_name() {
    assert!(object_key(Uuid::new_v4(), "scan.bmp").is_err());
}
