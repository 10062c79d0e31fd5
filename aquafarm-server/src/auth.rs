use aquafarm_core::User;
use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// HS256 signing material and token lifetime, shared through [`AppState`].
#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub token_ttl_minutes: i64,
}

/// Claims carried by an access token. `sub` is the user's ULID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

pub fn issue_token(config: &AuthConfig, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = jiff::Timestamp::now().as_second() + config.token_ttl_minutes * 60;
    let claims = Claims {
        sub: user.id.0.to_string(),
        email: user.email.to_string(),
        exp: exp as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Bearer-token gate for the protected routes. Valid claims are attached to
/// the request extensions for handlers that need the caller's identity.
pub async fn require_auth<C, S, M, U>(
    State(state): State<AppState<C, S, M, U>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode>
where
    C: Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(token_data.claims);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use aquafarm_core::{User, UserId};
    use jiff::Timestamp;
    use jsonwebtoken::{DecodingKey, Validation, decode};
    use ulid::Ulid;

    use super::{AuthConfig, Claims, issue_token};

    #[test]
    fn issued_token_carries_user_identity() {
        let config = AuthConfig {
            secret: "test-secret".to_string(),
            token_ttl_minutes: 60,
        };
        let user = User {
            id: UserId(Ulid::new()),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "hash".into(),
            created_at: Timestamp::now(),
        };

        let token = issue_token(&config, &user).unwrap();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, user.id.0.to_string());
        assert_eq!(decoded.claims.email, "ana@example.com");
    }

    #[test]
    fn wrong_secret_fails_validation() {
        let config = AuthConfig {
            secret: "test-secret".to_string(),
            token_ttl_minutes: 60,
        };
        let user = User {
            id: UserId(Ulid::new()),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "hash".into(),
            created_at: Timestamp::now(),
        };

        let token = issue_token(&config, &user).unwrap();
        assert!(
            decode::<Claims>(
                &token,
                &DecodingKey::from_secret(b"other-secret"),
                &Validation::default(),
            )
            .is_err()
        );
    }
}
