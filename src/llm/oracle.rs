//! Language-model judge behind the [`ResolutionOracle`] seam

use crate::battle::collaborators::{LessonRequest, ResolutionOracle, ResolutionRequest};
use crate::battle::outcome::Outcome;
use crate::core::error::Result;
use crate::core::types::BoxFuture;
use crate::llm::client::LlmClient;
use crate::llm::context::{lesson_prompts, BattleContext};
use crate::llm::parser::parse_outcome;

/// Lessons are a few sentences
const LESSON_MAX_TOKENS: u32 = 200;

pub struct LlmOracle {
    judge: LlmClient,
    tutor: LlmClient,
    max_damage: u32,
}

impl LlmOracle {
    pub fn new(client: LlmClient, max_damage: u32) -> Self {
        Self {
            tutor: client.clone().with_max_tokens(LESSON_MAX_TOKENS),
            judge: client,
            max_damage,
        }
    }

    pub fn from_env(max_damage: u32) -> Result<Self> {
        let client = LlmClient::from_env()?;
        tracing::info!(model = client.model(), format = ?client.api_format(), "judge configured");
        Ok(Self::new(client, max_damage))
    }
}

impl ResolutionOracle for LlmOracle {
    fn resolve(&self, request: ResolutionRequest) -> BoxFuture<'static, Result<Outcome>> {
        let client = self.judge.clone();
        let max_damage = self.max_damage;
        let context = BattleContext::from(&request);
        Box::pin(async move {
            let reply = client
                .complete(&context.system_prompt(), &context.user_prompt())
                .await?;
            tracing::debug!(chars = reply.len(), "judge replied");
            parse_outcome(&reply, max_damage)
        })
    }

    fn compose_lesson(&self, request: LessonRequest) -> BoxFuture<'static, Result<String>> {
        let client = self.tutor.clone();
        let (system, user) = lesson_prompts(&request);
        Box::pin(async move {
            let lesson = client.complete(&system, &user).await?;
            Ok(lesson.trim().to_string())
        })
    }
}
