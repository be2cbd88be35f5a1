use crate::errors::{AppError, Error, Result};
use crate::models::{OwnerId, RegisterRequest, User};
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const MIN_PASSWORD_LEN: usize = 6;

/// Bearer token payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Owner id, hyphenated.
    pub id: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks credentials, resolving bearer tokens to an owner.
pub struct AuthGate {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl_hours: i64,
    bcrypt_cost: u32,
}

impl AuthGate {
    pub fn new(secret: &str, token_ttl_hours: i64, bcrypt_cost: u32) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_hours,
            bcrypt_cost,
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let expires = Duration::try_hours(self.token_ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                Error::Config(format!(
                    "token lifetime of {} hours is out of range",
                    self.token_ttl_hours
                ))
            })?;
        let claims = Claims {
            id: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| Error::Config(format!("failed to sign token: {err}")))
    }

    pub fn verify_token(&self, token: &str) -> Result<OwnerId> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            debug!("rejected bearer token: {err}");
            Error::Unauthorized("Token is not valid".into())
        })?;
        OwnerId::parse(&data.claims.id)
    }

    /// Resolves an `Authorization` header value to its owner.
    pub fn owner_from_header(&self, header: Option<&str>) -> Result<OwnerId> {
        let token = header
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Unauthorized("No token, authorization denied".into()))?;
        self.verify_token(token)
    }

    /// Hashes on the blocking pool; bcrypt is CPU-bound.
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|err| Error::Internal(format!("password hashing task failed: {err}")))?
            .map_err(|err| Error::Config(format!("failed to hash password: {err}")))
    }

    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|err| Error::Internal(format!("password verification task failed: {err}")))?;
        match verified {
            Ok(matches) => Ok(matches),
            Err(err) => {
                warn!("stored password hash is unreadable: {err}");
                Ok(false)
            }
        }
    }
}

pub fn validate_registration(request: &RegisterRequest) -> Result<()> {
    if request.name.trim().is_empty() {
        return Err(Error::Validation("Name is required".into()));
    }
    let email = request.email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(Error::Validation("Please provide a valid email".into()));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Owner resolved from the request's bearer token.
pub struct AuthenticatedOwner(pub OwnerId);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthenticatedOwner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let owner = state.auth.owner_from_header(header)?;
        Ok(Self(owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AthleteType, FitnessLevel};

    fn gate() -> AuthGate {
        AuthGate::new("test-secret", 1, 4)
    }

    fn user() -> User {
        User {
            id: OwnerId::new(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            athlete_type: AthleteType::Runner,
            fitness_level: FitnessLevel::Intermediate,
            age: None,
            weight: None,
            height: None,
            created_at: Utc::now(),
        }
    }

    fn registration(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            athlete_type: None,
            fitness_level: None,
            age: None,
            weight: None,
            height: None,
        }
    }

    #[test]
    fn issued_token_resolves_to_the_same_owner() {
        let gate = gate();
        let user = user();
        let token = gate.issue_token(&user).unwrap();
        assert_eq!(gate.verify_token(&token).unwrap(), user.id);

        let header = format!("Bearer {token}");
        assert_eq!(gate.owner_from_header(Some(&header)).unwrap(), user.id);
    }

    #[test]
    fn foreign_expired_and_missing_tokens_are_rejected() {
        let user = user();
        let foreign = AuthGate::new("other-secret", 1, 4).issue_token(&user).unwrap();
        assert!(matches!(gate().verify_token(&foreign), Err(Error::Unauthorized(_))));

        let expired = AuthGate::new("test-secret", -2, 4).issue_token(&user).unwrap();
        assert!(matches!(gate().verify_token(&expired), Err(Error::Unauthorized(_))));

        assert!(matches!(gate().owner_from_header(None), Err(Error::Unauthorized(_))));
        assert!(matches!(
            gate().owner_from_header(Some("Basic abc")),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn token_with_malformed_owner_is_an_invalid_identity() {
        let gate = gate();
        let claims = Claims {
            id: "not-a-uuid".into(),
            email: "ada@example.com".into(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(gate.verify_token(&token), Err(Error::InvalidIdentity)));
    }

    #[tokio::test]
    async fn password_hash_round_trips() {
        let gate = gate();
        let hash = gate.hash_password("hunter22").await.unwrap();
        assert!(gate.verify_password("hunter22", &hash).await.unwrap());
        assert!(!gate.verify_password("hunter23", &hash).await.unwrap());
        assert!(!gate.verify_password("hunter22", "not-a-hash").await.unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_yields_to_other_tasks_on_the_runtime() {
        let gate = AuthGate::new("test-secret", 1, 6);
        let order = std::sync::Mutex::new(Vec::new());

        let (hash, ()) = tokio::join!(
            async {
                let hash = gate.hash_password("hunter22").await;
                order.lock().unwrap().push("hashed");
                hash
            },
            async {
                order.lock().unwrap().push("ping");
            }
        );

        assert!(hash.is_ok());
        assert_eq!(*order.lock().unwrap(), ["ping", "hashed"]);
    }

    #[test]
    fn unrepresentable_token_lifetime_is_an_error_not_a_panic() {
        let gate = AuthGate::new("test-secret", i64::MAX, 4);
        assert!(matches!(gate.issue_token(&user()), Err(Error::Config(_))));
    }

    #[test]
    fn registration_requires_name_email_and_password_length() {
        assert!(validate_registration(&registration("Ada", "ada@example.com", "secret")).is_ok());
        assert!(validate_registration(&registration(" ", "ada@example.com", "secret")).is_err());
        assert!(validate_registration(&registration("Ada", "ada.example.com", "secret")).is_err());
        assert!(validate_registration(&registration("Ada", "ada@example.com", "12345")).is_err());
    }
}
