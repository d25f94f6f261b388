//! The dispatcher: drives a request through the stage chain, persists the
//! survivor, fans out to the delivery channels, and audits the terminal
//! state.
//!
//! Channel attempts are isolated: a slow or failing email send never delays
//! the realtime push or invalidates the store write. The persisted record is
//! the system of record regardless of channel outcomes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use vendora_common::{
    ContentFilter, DeliveryOutcome, Notification, NotificationRequest, NotifyError,
};
use vendora_email::EmailBackend;

use crate::audit::{record_or_warn, AuditEntry, AuditLog, AuditOperation};
use crate::preferences::{resolve_channels, ChannelDecision, ProfileSource};
use crate::ratelimit::RateLimiter;
use crate::spam::SpamGuard;
use crate::stage::{run_stages, PipelineContext, Stage, StageOutcome};
use crate::traits::{NotificationPersister, PushOutcome, RealtimePush};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

struct FilterStage {
    filter: ContentFilter,
}

#[async_trait]
impl Stage for FilterStage {
    fn name(&self) -> &'static str {
        "content_filter"
    }

    async fn apply(&self, request: NotificationRequest, _ctx: &mut PipelineContext) -> StageOutcome {
        match self.filter.filter(request) {
            Ok(request) => StageOutcome::Continue(request),
            Err(reason) => StageOutcome::Terminal(reason),
        }
    }
}

struct RateLimitStage {
    limiter: Arc<RateLimiter>,
}

#[async_trait]
impl Stage for RateLimitStage {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn apply(&self, request: NotificationRequest, _ctx: &mut PipelineContext) -> StageOutcome {
        match self.limiter.allow(&request.recipient).await {
            Ok(()) => StageOutcome::Continue(request),
            Err(reason) => StageOutcome::Terminal(reason),
        }
    }
}

struct DedupStage {
    guard: Arc<SpamGuard>,
}

#[async_trait]
impl Stage for DedupStage {
    fn name(&self) -> &'static str {
        "dedup_guard"
    }

    async fn apply(&self, request: NotificationRequest, _ctx: &mut PipelineContext) -> StageOutcome {
        let hash = request.content_hash();
        match self.guard.admit(&request.recipient, &hash).await {
            Ok(()) => StageOutcome::Continue(request),
            Err(reason) => StageOutcome::Terminal(reason),
        }
    }
}

struct ResolveStage {
    profiles: Arc<dyn ProfileSource>,
}

#[async_trait]
impl Stage for ResolveStage {
    fn name(&self) -> &'static str {
        "preference_resolver"
    }

    async fn apply(&self, request: NotificationRequest, ctx: &mut PipelineContext) -> StageOutcome {
        let profile = match self.profiles.profile(request.recipient.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                // Fail open to the platform default: a preference-service
                // hiccup must not drop vendor-critical notifications.
                warn!(
                    error = %e,
                    user_id = %request.recipient.user_id,
                    "profile lookup failed, using default profile"
                );
                Default::default()
            }
        };
        ctx.decision = Some(resolve_channels(&request, &profile, Utc::now()));
        StageOutcome::Continue(request)
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    stages: Vec<Box<dyn Stage>>,
    profiles: Arc<dyn ProfileSource>,
    store: Arc<dyn NotificationPersister>,
    email: Arc<dyn EmailBackend>,
    realtime: Arc<dyn RealtimePush>,
    audit: Arc<dyn AuditLog>,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        filter: ContentFilter,
        rate_limiter: Arc<RateLimiter>,
        spam_guard: Arc<SpamGuard>,
        profiles: Arc<dyn ProfileSource>,
        store: Arc<dyn NotificationPersister>,
        email: Arc<dyn EmailBackend>,
        realtime: Arc<dyn RealtimePush>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(FilterStage { filter }),
            Box::new(RateLimitStage {
                limiter: rate_limiter,
            }),
            Box::new(DedupStage { guard: spam_guard }),
            Box::new(ResolveStage {
                profiles: profiles.clone(),
            }),
        ];
        Self {
            stages,
            profiles,
            store,
            email,
            realtime,
            audit,
        }
    }

    /// Run one request through the pipeline.
    ///
    /// `Ok(Some(notification))` — persisted, with per-channel outcomes
    /// recorded. `Ok(None)` — the recipient has notifications globally
    /// disabled; nothing was persisted. `Err` — a stage rejected the
    /// request (content, rate, or dedup), reported synchronously.
    pub async fn dispatch(
        &self,
        request: NotificationRequest,
    ) -> Result<Option<Notification>, NotifyError> {
        let identity = request.recipient;
        let notification_type = request.notification_type;
        let category = request.category();

        let mut ctx = PipelineContext::default();
        let request = match run_stages(&self.stages, request, &mut ctx).await {
            Ok(request) => request,
            Err(reason) => {
                let operation = match &reason {
                    NotifyError::Throttled { .. } => AuditOperation::Throttled,
                    NotifyError::Suppressed { .. } => AuditOperation::Suppressed,
                    _ => AuditOperation::Rejected,
                };
                record_or_warn(
                    self.audit.as_ref(),
                    &AuditEntry::new(
                        identity,
                        operation,
                        notification_type,
                        category,
                        reason.to_string(),
                    ),
                )
                .await;
                return Err(reason);
            }
        };

        let decision = ctx.decision.unwrap_or_else(ChannelDecision::nothing);
        if !decision.store {
            record_or_warn(
                self.audit.as_ref(),
                &AuditEntry::new(
                    identity,
                    AuditOperation::Suppressed,
                    notification_type,
                    category,
                    "notifications disabled by user preferences",
                ),
            )
            .await;
            return Ok(None);
        }

        let mut notification = Notification::from_request(request, Utc::now());
        notification.outcomes.store = DeliveryOutcome::Delivered;

        let id = self
            .store
            .persist(&notification)
            .await
            .map_err(|e| NotifyError::Database(e.to_string()))?;

        // Fan out to the immediate channels. join! rather than sequential
        // awaits: each attempt is independent and must not delay the other.
        let (email_outcome, realtime_outcome) = tokio::join!(
            self.attempt_email(&notification, &decision),
            self.attempt_realtime(&notification, &decision),
        );
        notification.outcomes.email = email_outcome;
        notification.outcomes.realtime = realtime_outcome;

        if let Err(e) = self.store.record_outcomes(id, &notification.outcomes).await {
            warn!(error = %e, notification_id = %id, "failed to record delivery outcomes");
        }

        record_or_warn(
            self.audit.as_ref(),
            &AuditEntry::new(
                identity,
                AuditOperation::Delivered,
                notification_type,
                category,
                format!(
                    "store=delivered email={} realtime={}",
                    outcome_label(&notification.outcomes.email),
                    outcome_label(&notification.outcomes.realtime),
                ),
            ),
        )
        .await;

        Ok(Some(notification))
    }

    async fn attempt_email(
        &self,
        notification: &Notification,
        decision: &ChannelDecision,
    ) -> DeliveryOutcome {
        if !decision.email {
            return DeliveryOutcome::Skipped;
        }
        if decision.deferred {
            return DeliveryOutcome::Deferred;
        }

        let user_id = notification.recipient.user_id;
        let address = match self.profiles.email_address(user_id).await {
            Ok(Some(address)) => address,
            Ok(None) => {
                warn!(%user_id, "no email address on file, skipping email channel");
                return DeliveryOutcome::Skipped;
            }
            Err(e) => {
                warn!(error = %e, %user_id, "email address lookup failed");
                return DeliveryOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        let (subject, body) = vendora_email::render(notification);
        let result = self.email.send(&address, &subject, &body).await;
        if result.success {
            DeliveryOutcome::Delivered
        } else {
            let error = result
                .error
                .unwrap_or_else(|| "unknown delivery error".to_string());
            warn!(%user_id, error = %error, "email delivery failed");
            DeliveryOutcome::Failed { error }
        }
    }

    async fn attempt_realtime(
        &self,
        notification: &Notification,
        decision: &ChannelDecision,
    ) -> DeliveryOutcome {
        if !decision.realtime {
            return DeliveryOutcome::Skipped;
        }
        if decision.deferred {
            return DeliveryOutcome::Deferred;
        }

        let user_id = notification.recipient.user_id;
        match self.realtime.publish(user_id, notification).await {
            Ok(PushOutcome::Delivered) => DeliveryOutcome::Delivered,
            Ok(PushOutcome::NoActiveConnection) => DeliveryOutcome::NoActiveConnection,
            Err(e) => {
                warn!(error = %e, %user_id, "realtime publish failed");
                DeliveryOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

fn outcome_label(outcome: &DeliveryOutcome) -> String {
    match outcome {
        DeliveryOutcome::Skipped => "skipped".to_string(),
        DeliveryOutcome::Delivered => "delivered".to_string(),
        DeliveryOutcome::Deferred => "deferred".to_string(),
        DeliveryOutcome::NoActiveConnection => "no_active_connection".to_string(),
        DeliveryOutcome::Failed { error } => format!("failed({error})"),
    }
}
