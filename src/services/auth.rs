use actix_web::{Error as ActixError, FromRequest, HttpRequest, dev::Payload, web::Data};
use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::Role;
use crate::error::AppError;

/// Bearer token claims. Tokens are minted by the identity service; this
/// subsystem only verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // employee id
    pub role: Role,
    pub exp: usize,
}

/// The authenticated employee acting on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub employee_id: Uuid,
    pub role: Role,
}

impl Claims {
    pub fn employee_id(&self) -> Uuid {
        self.sub
    }

    pub fn is_final_authority(&self) -> bool {
        self.role.is_final_authority()
    }

    pub fn actor(&self) -> Actor {
        Actor {
            employee_id: self.sub,
            role: self.role,
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl FromRequest for Claims {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = match (bearer_token(req), req.app_data::<Data<Config>>()) {
            (Some(token), Some(config)) => verify_token(config, token).ok(),
            (Some(_), None) => {
                log::error!("Config missing from app data, cannot verify tokens");
                None
            }
            _ => None,
        };

        ready(claims.ok_or_else(|| AppError::Unauthorized.into()))
    }
}

pub fn verify_token(config: &Config, token: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}

/// Mints a token in the identity service's format. Used by tooling and tests.
pub fn issue_token(config: &Config, employee_id: Uuid, role: Role, ttl: Duration) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow!("token expiry out of range"))?
        .timestamp() as usize;

    let claims = Claims {
        sub: employee_id,
        role,
        exp: expiration,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )?;

    Ok(token)
}
