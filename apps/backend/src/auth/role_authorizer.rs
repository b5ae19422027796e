use async_trait::async_trait;

use crate::error::AppError;
use crate::pipeline::context::AccessContext;
use crate::pipeline::stage::AccessStage;

/// Admits callers holding any one of the required roles.
///
/// The first required role the caller holds is recorded as the granted role.
pub struct RoleAuthorizer {
    required: Vec<String>,
}

impl RoleAuthorizer {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl AccessStage for RoleAuthorizer {
    fn name(&self) -> &'static str {
        "authorize"
    }

    async fn admit(&self, ctx: &mut AccessContext) -> Result<(), AppError> {
        // Only reachable without claims if the stage order is broken.
        let claims = ctx.claims().ok_or_else(AppError::missing_credentials)?;

        let granted = claims
            .roles
            .first_match(self.required.iter().map(String::as_str))
            .ok_or(AppError::Forbidden)?;

        ctx.grant_role(granted);
        Ok(())
    }
}
