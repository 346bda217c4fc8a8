use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use jwt::{Claims, Header, RegisteredClaims, SignWithKey, Token, VerifyWithKey};
use sha2::Sha256;
use ulid::Ulid;

use crate::config::JwtConfig;
use crate::database::Session;

pub struct AuthJwtPayload {
	pub user_id: Ulid,
	pub session_id: Ulid,
	pub expiration: Option<DateTime<Utc>>,
	pub issued_at: DateTime<Utc>,
	pub not_before: Option<DateTime<Utc>>,
}

pub trait JwtState: Sized {
	fn to_claims(&self) -> Claims;

	fn from_claims(claims: &Claims) -> Option<Self>;

	fn serialize(&self, config: &JwtConfig) -> Option<String> {
		let key = Hmac::<Sha256>::new_from_slice(config.secret.as_bytes()).ok()?;
		let mut claims = self.to_claims();

		claims.registered.issuer = Some(config.issuer.clone());

		if claims.registered.issued_at.is_none() {
			claims.registered.issued_at = Some(Utc::now().timestamp() as u64);
		}

		claims.sign_with_key(&key).ok()
	}

	fn verify(config: &JwtConfig, token: &str) -> Option<Self> {
		let key = Hmac::<Sha256>::new_from_slice(config.secret.as_bytes()).ok()?;
		let token: Token<Header, Claims, _> = token.verify_with_key(&key).ok()?;

		let claims = token.claims();

		if claims.registered.issuer.as_ref() != Some(&config.issuer) {
			return None;
		}

		let iat = timestamp(claims.registered.issued_at?)?;
		if iat > Utc::now() {
			return None;
		}

		if let Some(nbf) = claims.registered.not_before.and_then(timestamp) {
			if nbf > Utc::now() {
				return None;
			}
		}

		if let Some(exp) = claims.registered.expiration.and_then(timestamp) {
			if exp < Utc::now() {
				return None;
			}
		}

		Self::from_claims(claims)
	}
}

fn timestamp(secs: u64) -> Option<DateTime<Utc>> {
	Utc.timestamp_opt(secs as i64, 0).single()
}

impl JwtState for AuthJwtPayload {
	fn to_claims(&self) -> Claims {
		Claims {
			registered: RegisteredClaims {
				issuer: None,
				subject: Some(self.user_id.to_string()),
				audience: None,
				expiration: self.expiration.map(|x| x.timestamp() as u64),
				not_before: self.not_before.map(|x| x.timestamp() as u64),
				issued_at: Some(self.issued_at.timestamp() as u64),
				json_web_token_id: Some(self.session_id.to_string()),
			},
			private: Default::default(),
		}
	}

	fn from_claims(claims: &Claims) -> Option<Self> {
		Some(Self {
			expiration: claims.registered.expiration.and_then(timestamp),
			issued_at: timestamp(claims.registered.issued_at?)?,
			not_before: claims.registered.not_before.and_then(timestamp),
			session_id: claims
				.registered
				.json_web_token_id
				.as_ref()
				.and_then(|x| Ulid::from_string(x).ok())?,
			user_id: claims.registered.subject.as_ref().and_then(|x| Ulid::from_string(x).ok())?,
		})
	}
}

impl From<&Session> for AuthJwtPayload {
	fn from(session: &Session) -> Self {
		AuthJwtPayload {
			user_id: session.user_id,
			session_id: session.id,
			expiration: Some(session.expires_at),
			issued_at: session.created_at,
			not_before: None,
		}
	}
}
