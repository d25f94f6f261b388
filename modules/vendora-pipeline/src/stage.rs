//! The stage contract and driver loop.
//!
//! Each stage either passes the (possibly annotated) request along or ends
//! the pipeline with a terminal decision. Stages are composed as an explicit
//! ordered list evaluated by one driver — no dynamic registration.

use async_trait::async_trait;

use vendora_common::{NotificationRequest, NotifyError};

use crate::preferences::ChannelDecision;

/// Mutable state threaded through the stages of one request.
#[derive(Debug, Default)]
pub struct PipelineContext {
    /// Set by the preference-resolution stage.
    pub decision: Option<ChannelDecision>,
}

pub enum StageOutcome {
    Continue(NotificationRequest),
    Terminal(NotifyError),
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(&self, request: NotificationRequest, ctx: &mut PipelineContext)
        -> StageOutcome;
}

/// Run `request` through `stages` in order. The first terminal outcome wins.
pub async fn run_stages(
    stages: &[Box<dyn Stage>],
    mut request: NotificationRequest,
    ctx: &mut PipelineContext,
) -> Result<NotificationRequest, NotifyError> {
    for stage in stages {
        match stage.apply(request, ctx).await {
            StageOutcome::Continue(next) => request = next,
            StageOutcome::Terminal(reason) => return Err(reason),
        }
    }
    Ok(request)
}
