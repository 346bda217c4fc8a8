use chrono::{Duration, Utc};
use ulid::Ulid;

use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::config::JwtConfig;
use crate::database::Session;

fn config() -> JwtConfig {
	JwtConfig {
		secret: "test-secret".to_string(),
		issuer: "gallery-test".to_string(),
		..Default::default()
	}
}

#[test]
fn test_jwt_roundtrip() {
	let session = Session::new(Ulid::new(), Duration::hours(1));
	let token = AuthJwtPayload::from(&session)
		.serialize(&config())
		.expect("failed to serialize token");

	let payload = AuthJwtPayload::verify(&config(), &token).expect("token should verify");
	assert_eq!(payload.user_id, session.user_id);
	assert_eq!(payload.session_id, session.id);
	assert_eq!(payload.issued_at.timestamp(), session.created_at.timestamp());
	assert_eq!(
		payload.expiration.map(|exp| exp.timestamp()),
		Some(session.expires_at.timestamp())
	);
}

#[test]
fn test_jwt_rejected() {
	let session = Session::new(Ulid::new(), Duration::hours(1));
	let token = AuthJwtPayload::from(&session)
		.serialize(&config())
		.expect("failed to serialize token");

	let wrong_issuer = JwtConfig {
		issuer: "someone-else".to_string(),
		..config()
	};
	assert!(AuthJwtPayload::verify(&wrong_issuer, &token).is_none());

	let wrong_secret = JwtConfig {
		secret: "another-secret".to_string(),
		..config()
	};
	assert!(AuthJwtPayload::verify(&wrong_secret, &token).is_none());

	assert!(AuthJwtPayload::verify(&config(), "not.a.token").is_none());
}

#[test]
fn test_jwt_time_claims() {
	let now = Utc::now();

	let expired = AuthJwtPayload {
		user_id: Ulid::new(),
		session_id: Ulid::new(),
		expiration: Some(now - Duration::minutes(5)),
		issued_at: now - Duration::hours(1),
		not_before: None,
	};
	let token = expired.serialize(&config()).expect("failed to serialize token");
	assert!(AuthJwtPayload::verify(&config(), &token).is_none());

	let not_yet = AuthJwtPayload {
		user_id: Ulid::new(),
		session_id: Ulid::new(),
		expiration: None,
		issued_at: now - Duration::minutes(1),
		not_before: Some(now + Duration::hours(1)),
	};
	let token = not_yet.serialize(&config()).expect("failed to serialize token");
	assert!(AuthJwtPayload::verify(&config(), &token).is_none());

	let issued_later = AuthJwtPayload {
		user_id: Ulid::new(),
		session_id: Ulid::new(),
		expiration: None,
		issued_at: now + Duration::hours(1),
		not_before: None,
	};
	let token = issued_later.serialize(&config()).expect("failed to serialize token");
	assert!(AuthJwtPayload::verify(&config(), &token).is_none());
}
