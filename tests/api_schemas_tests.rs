use comites::api::{AttendanceIn, CommitteeCreate};

#[test]
fn test_parse_alta_de_comite_completa() {
    let json_data = r#"
    {
        "name": "Comité Centro",
        "section_number": "101",
        "type": "seccional",
        "presidente": "Ana Torres",
        "email": "comite@example.com",
        "clave_afiliacion": "AF-001",
        "telefono": "4430000000",
        "administrative_unit_id": 42,
        "members": [
            {
                "full_name": "Luis Pérez",
                "ine_key": "PRLS900101HMNRRS09",
                "phone": "4435556666",
                "email": "luis@example.com",
                "section_number": "101",
                "invited_by": "Ana Torres"
            }
        ]
    }
    "#;

    let data: CommitteeCreate = serde_json::from_str(json_data).expect("Debe parsear alta completa");
    assert_eq!(data.name, "Comité Centro");
    assert_eq!(data.tipo, "seccional");
    assert_eq!(data.administrative_unit_id, Some(42));
    assert_eq!(data.members.len(), 1);
    assert_eq!(data.members[0].full_name, "Luis Pérez");
}

#[test]
fn test_parse_alta_minima() {
    // Solo los campos obligatorios; el resto entra con sus valores por
    // omisión (compatibilidad con clientes viejos)
    let json_data = r#"
    {
        "name": "Comité Express",
        "section_number": "7",
        "type": "especial"
    }
    "#;

    let data: CommitteeCreate = serde_json::from_str(json_data).expect("Debe parsear alta mínima");
    assert_eq!(data.presidente, "");
    assert_eq!(data.email, "");
    assert!(data.members.is_empty());
    assert!(data.administrative_unit_id.is_none());
}

#[test]
fn test_parse_asistencia() {
    let json_data = r#"
    {
        "provider": "google",
        "credential": "token-de-google",
        "device_id": "abc123",
        "location": {"lat": 19.7, "lng": -101.19, "accuracy": 12},
        "timezone": "America/Mexico_City"
    }
    "#;

    let data: AttendanceIn = serde_json::from_str(json_data).expect("Debe parsear asistencia");
    assert_eq!(data.provider, "google");
    let loc = data.location.expect("Debe traer ubicación");
    assert_eq!(loc.lat, Some(19.7));
    assert_eq!(loc.accuracy, Some(12));
    assert_eq!(data.timezone, "America/Mexico_City");
}

#[test]
fn test_parse_asistencia_sin_ubicacion() {
    let json_data = r#"{"provider": "google", "credential": "t", "device_id": "d"}"#;
    let data: AttendanceIn = serde_json::from_str(json_data).expect("Debe parsear sin ubicación");
    assert!(data.location.is_none());
    assert_eq!(data.timezone, "");
}
