/// HTTP middleware utilities for interaction-service
///
/// Resolves `Authorization: Bearer <token>` into a `UserId` request extension
/// through an `IdentityVerifier`. Handlers only ever see the resolved id.
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;

// =====================================================================
// Identity verification
// =====================================================================

/// Extracted user identifier stored in request extensions after auth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub user_id: Uuid,
    pub claims: Claims,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("token verification is not configured")]
    NotConfigured,

    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("token subject is not a user id")]
    InvalidSubject,
}

/// Given a bearer credential, returns a stable user id and claims
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError>;
}

/// RS256 access token verifier
pub struct JwtIdentityVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(public_key_pem: Option<&str>, issuer: Option<&str>) -> Result<Self, AuthError> {
        let key = public_key_pem
            .map(|pem| {
                DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AuthError::InvalidKey(e.to_string()))
            })
            .transpose()?;

        let mut validation = Validation::new(Algorithm::RS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self { key, validation })
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let key = self.key.as_ref().ok_or(AuthError::NotConfigured)?;

        let data = decode::<Claims>(token, key, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSubject)?;

        Ok(VerifiedIdentity {
            user_id,
            claims: data.claims,
        })
    }
}

// =====================================================================
// Bearer authentication middleware
// =====================================================================

/// Actix middleware that validates a Bearer token with an `IdentityVerifier`.
#[derive(Clone)]
pub struct BearerAuthMiddleware {
    verifier: Arc<dyn IdentityVerifier>,
}

impl BearerAuthMiddleware {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct BearerAuthMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();

        Box::pin(async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?
                .strip_prefix("Bearer ")
                .ok_or_else(|| AppError::Unauthorized("invalid Authorization scheme".into()))?
                .trim()
                .to_string();

            let identity = verifier.verify(&token).map_err(|e| {
                tracing::debug!(error = %e, "Bearer token rejected");
                AppError::Unauthorized(e.to_string())
            })?;

            req.extensions_mut().insert(UserId(identity.user_id));

            service.call(req).await
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .copied()
                .ok_or_else(|| AppError::Unauthorized("user id missing".into()).into()),
        )
    }
}
