use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::{types::AuthFlowType::UserPasswordAuth, Client};
use base64::{engine::general_purpose, Engine};
use jsonwebtokens_cognito::KeySet;
use ring::hmac;
use serde_json::Value;

use super::IdentityProvider;
use crate::{config::CognitoConfig, error::AppError, model::Session};

/// Email/password sign-in against a Cognito user pool.
pub struct CognitoIdentityProvider {
    client: Client,
    config: CognitoConfig,
}

impl CognitoIdentityProvider {
    pub async fn new(config: CognitoConfig) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        CognitoIdentityProvider {
            client: Client::new(&sdk_config),
            config,
        }
    }

    // Check the id token against the pool's signing keys and pull the identity out of it
    async fn session_from_tokens(
        &self,
        id_token: &str,
        access_token: &str,
    ) -> Result<Session, AppError> {
        let keyset = KeySet::new(self.config.region.clone(), self.config.user_pool_id.clone())
            .map_err(|err| AppError::AuthFailure(format!("{:?}", err)))?;
        let verifier = keyset
            .new_id_token_verifier(&[&self.config.client_id])
            .build()
            .map_err(|err| AppError::AuthFailure(format!("{:?}", err)))?;
        let claims = keyset
            .verify(id_token, &verifier)
            .await
            .map_err(|err| AppError::AuthFailure(format!("{:?}", err)))?;

        session_from_claims(&claims, access_token)
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    // Cognito keeps no session on this host between restarts
    async fn current_session(&self) -> Result<Option<Session>, AppError> {
        Ok(None)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let secret_hash =
            generate_secret_hash(&self.config.client_secret, email, &self.config.client_id);

        let response = self
            .client
            .initiate_auth()
            .client_id(&self.config.client_id)
            .auth_flow(UserPasswordAuth)
            .auth_parameters("USERNAME", email)
            .auth_parameters("PASSWORD", password)
            .auth_parameters("SECRET_HASH", secret_hash)
            .send()
            .await
            .map_err(|err| AppError::AuthFailure(format!("{:?}", err)))?;

        let result = response
            .authentication_result()
            .ok_or_else(|| AppError::AuthFailure("sign-in requires a further challenge".to_string()))?;
        let id_token = result
            .id_token()
            .ok_or_else(|| AppError::AuthFailure("no id token returned".to_string()))?;
        let access_token = result
            .access_token()
            .ok_or_else(|| AppError::AuthFailure("no access token returned".to_string()))?;

        self.session_from_tokens(id_token, access_token).await
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AppError> {
        self.client
            .global_sign_out()
            .access_token(&session.access_token)
            .send()
            .await
            .map_err(|err| AppError::AuthFailure(format!("{:?}", err)))?;
        Ok(())
    }
}

fn session_from_claims(claims: &Value, access_token: &str) -> Result<Session, AppError> {
    let user_id = claims
        .get("sub")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::AuthFailure("id token has no subject".to_string()))?;
    let email = claims
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(Session {
        user_id: user_id.to_string(),
        email: email.to_string(),
        access_token: access_token.to_string(),
    })
}

fn generate_secret_hash(client_secret: &str, user_name: &str, client_id: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, client_secret.as_bytes());
    let msg = [user_name.as_bytes(), client_id.as_bytes()].concat();

    let signature = hmac::sign(&key, &msg);

    general_purpose::STANDARD.encode(signature.as_ref())
}
