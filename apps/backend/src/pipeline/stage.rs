use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AppError;
use crate::logging::security;
use crate::pipeline::context::AccessContext;

/// One admit-or-reject step of the access pipeline.
#[async_trait]
pub trait AccessStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn admit(&self, ctx: &mut AccessContext) -> Result<(), AppError>;
}

/// Run `stages` in order, stopping at the first rejection.
pub async fn run_stages(
    stages: &[Arc<dyn AccessStage>],
    ctx: &mut AccessContext,
) -> Result<(), AppError> {
    for stage in stages {
        if let Err(err) = stage.admit(ctx).await {
            security::access_denied(
                stage.name(),
                err.reason(),
                ctx.method().as_str(),
                ctx.path(),
                ctx.organization_id(),
            );
            debug!(stage = stage.name(), error = %err, "stage rejected request");
            return Err(err);
        }
    }
    Ok(())
}
