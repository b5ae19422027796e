use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::auth::token_validator::{bearer_token, TokenValidator};
use crate::error::AppError;
use crate::pipeline::context::AccessContext;
use crate::pipeline::stage::AccessStage;

/// Authenticates when it can and lets the request through anonymously when
/// it cannot. Never rejects.
pub struct OptionalAuthentication {
    validator: Arc<TokenValidator>,
}

impl OptionalAuthentication {
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl AccessStage for OptionalAuthentication {
    fn name(&self) -> &'static str {
        "authenticate_optional"
    }

    async fn admit(&self, ctx: &mut AccessContext) -> Result<(), AppError> {
        let token = match bearer_token(ctx.headers()) {
            Ok(Some(token)) => token,
            Ok(None) | Err(_) => return Ok(()),
        };

        match self.validator.validate(&token).await {
            Ok(claims) => {
                ctx.attach_claims(claims);
            }
            Err(err) => {
                debug!(reason = err.reason(), "optional authentication failed, continuing anonymously");
            }
        }
        Ok(())
    }
}
