//! The Swarm Engine: staggered parallel fan-out, posterior weighting, a
//! guarded multi-round critique loop, and synthesis with fallback.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{AgentResponse, AgentState, Iteration, PosteriorWeights, SwarmState, SwarmStatus, TokenUsage, Trace};
use crate::error::{CoreError, CoreResult};
use crate::events::{EventBus, SwarmEvent, ThoughtEvent};
use crate::metrics::MetricsRegistry;
use crate::safety;
use crate::trace_store::TraceStore;
use crate::upstream::{ChatMessage, ChatRequest, UpstreamClient};

use super::guardian::{Guardian, CONSENSUS_THRESHOLD, MAX_CRITIQUE_ITERATIONS};
use super::parsing::{extract_confidence, parse_critique};
use super::posterior;
use super::status::SwarmStatusRegistry;

const AGENT_MAX_TOKENS: u32 = 600;

pub struct SwarmEngine {
    config: Config,
    metrics: Arc<MetricsRegistry>,
    trace_store: Arc<TraceStore>,
    event_bus: Arc<EventBus>,
    upstream: Arc<UpstreamClient>,
    pub status_registry: Arc<SwarmStatusRegistry>,
}

impl SwarmEngine {
    pub fn new(
        config: Config,
        metrics: Arc<MetricsRegistry>,
        trace_store: Arc<TraceStore>,
        event_bus: Arc<EventBus>,
        upstream: Arc<UpstreamClient>,
    ) -> Self {
        Self {
            config,
            metrics,
            trace_store,
            event_bus,
            upstream,
            status_registry: Arc::new(SwarmStatusRegistry::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn agent_ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("agent-{i}")).collect()
    }

    /// Run a mission to completion through the swarm. Blocks until terminal.
    #[instrument(skip(self, cancel), fields(swarm_size))]
    pub async fn execute_mission(
        &self,
        mission: String,
        swarm_size: Option<usize>,
        max_budget: Option<f64>,
        cancel: CancellationToken,
    ) -> CoreResult<Trace> {
        self.metrics.inc_missions_total();
        let start = Instant::now();

        let input_flags = safety::scan(&mission, crate::domain::FlagSource::Input);
        if crate::domain::should_block(&input_flags) {
            let estimate = crate::cost::estimate(&mission, self.config.default_swarm_size, &self.config);
            let mut trace = Trace::new(Uuid::new_v4(), safety::sanitize(&mission), estimate);
            trace.red_team_flags = input_flags;
            trace.fail("Mission blocked by safety system");
            self.metrics.inc_missions_failed();
            self.metrics.inc_red_team_flags(trace.red_team_flags.len() as u64);
            self.trace_store.save(trace).await;
            return Err(CoreError::SafetyBlocked);
        }

        let swarm_size = swarm_size.unwrap_or(self.config.default_swarm_size).clamp(1, self.config.max_agents);
        let max_budget = max_budget.unwrap_or(self.config.default_max_budget);
        let estimate = crate::cost::estimate_within_budget(&mission, swarm_size, max_budget, &self.config);
        if !estimate.within_budget {
            return Err(CoreError::BudgetExceeded);
        }

        let trace_id = Uuid::new_v4();
        let agent_ids = Self::agent_ids(swarm_size);
        let mut trace = Trace::new(trace_id, safety::sanitize(&mission), estimate);
        self.status_registry.insert(SwarmStatus::pending(trace_id, &agent_ids));
        self.status_registry.update(trace_id, |s| s.set_state(SwarmState::Running, 0, "fanning out"));
        self.trace_store.save(trace.clone()).await;

        let fanout_result = self.fan_out(trace_id, &mission, &agent_ids, &cancel).await;
        if cancel.is_cancelled() {
            trace.fail("cancelled");
            self.metrics.inc_missions_failed();
            self.trace_store.save(trace).await;
            self.status_registry.update(trace_id, |s| s.set_state(SwarmState::Failed, s.progress, "cancelled"));
            return Err(CoreError::Cancelled);
        }

        for response in &fanout_result {
            let flags = safety::scan(&response.response, crate::domain::FlagSource::Output);
            trace.red_team_flags.extend(flags);
        }

        let critique_result = self.critique_loop(trace_id, &mission, fanout_result, &cancel).await;
        if cancel.is_cancelled() {
            trace.fail("cancelled");
            self.metrics.inc_missions_failed();
            self.trace_store.save(trace).await;
            self.status_registry.update(trace_id, |s| s.set_state(SwarmState::Failed, s.progress, "cancelled"));
            return Err(CoreError::Cancelled);
        }

        trace.iterations = critique_result.iterations;
        trace.final_posterior_weights = critique_result.weights.clone();

        self.status_registry.update(trace_id, |s| s.set_state(SwarmState::Synthesizing, 85, "synthesizing"));

        match self.synthesize(trace_id, &mission, &critique_result.responses, &critique_result.weights, &cancel).await {
            Ok(synthesis) => {
                let synthesis_flags = safety::scan(&synthesis.content, crate::domain::FlagSource::Synthesis);
                trace.red_team_flags.extend(synthesis_flags);
                trace.synthesis_result = Some(safety::sanitize(&synthesis.content));
                trace.actual_cost = self.actual_cost(&critique_result.responses, &critique_result.reviewer_tokens, &synthesis);
                trace.duration_ms = start.elapsed().as_millis() as u64;
                trace.set_status(crate::domain::TraceStatus::Completed);
                self.metrics.inc_missions_success();
                self.metrics.add_cost(trace.actual_cost);
                self.metrics.record_duration(trace.duration_ms);
                self.metrics.inc_red_team_flags(trace.red_team_flags.len() as u64);
                self.trace_store.save(trace.clone()).await;
                self.status_registry.update(trace_id, |s| s.set_state(SwarmState::Completed, 100, "completed"));
                SwarmStatusRegistry::schedule_eviction(self.status_registry.clone(), trace_id);
                Ok(trace)
            }
            Err(e) => {
                trace.fail(e.to_string());
                trace.duration_ms = start.elapsed().as_millis() as u64;
                self.metrics.inc_missions_failed();
                self.trace_store.save(trace).await;
                self.status_registry.update(trace_id, |s| s.set_state(SwarmState::Failed, s.progress, "synthesis failed"));
                SwarmStatusRegistry::schedule_eviction(self.status_registry.clone(), trace_id);
                Err(e)
            }
        }
    }

    async fn fan_out(
        &self,
        trace_id: Uuid,
        mission: &str,
        agent_ids: &[String],
        cancel: &CancellationToken,
    ) -> Vec<AgentResponse> {
        let n = agent_ids.len();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<(usize, AgentResponse)>();

        let mut handles = Vec::with_capacity(n);
        for (index, agent_id) in agent_ids.iter().enumerate() {
            let agent_id = agent_id.clone();
            let model = self.config.swarm_model.clone();
            let mission = mission.to_string();
            let throttle_ms = self.config.throttle_ms;
            let upstream = self.upstream.clone();
            let cancel = cancel.clone();
            let event_bus = self.event_bus.clone();
            let metrics = self.metrics.clone();
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                let delay = Duration::from_millis(throttle_ms * index as u64);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => {
                        let _ = tx.send((index, AgentResponse::failed(agent_id, model, "cancelled")));
                        return;
                    }
                }

                metrics.agent_started();
                event_bus.publish_event(SwarmEvent::AgentStart {
                    trace_id,
                    agent_id: agent_id.clone(),
                    model: model.clone(),
                    timestamp: chrono::Utc::now(),
                });

                let temperature = rand::thread_rng().gen_range(0.8..1.2);
                let request = ChatRequest {
                    model: model.clone(),
                    messages: vec![
                        ChatMessage {
                            role: "system".to_string(),
                            content: format!(
                                "You are {agent_id}, one voice in a swarm of independent analysts. \
                                 Answer the mission directly and append a confidence tag in the exact \
                                 form [CONFIDENCE: X.XX] at the end of your response."
                            ),
                        },
                        ChatMessage {
                            role: "user".to_string(),
                            content: mission.clone(),
                        },
                    ],
                    temperature,
                    max_tokens: AGENT_MAX_TOKENS,
                };

                let call_start = Instant::now();
                let response = match upstream.call(&request, &cancel).await {
                    Ok(chat_response) => {
                        let (cleaned, confidence) = extract_confidence(&chat_response.content);
                        event_bus.publish_thought(ThoughtEvent::Response {
                            trace_id,
                            agent_id: agent_id.clone(),
                            text: cleaned.clone(),
                            timestamp: chrono::Utc::now(),
                        });
                        AgentResponse {
                            agent_id: agent_id.clone(),
                            model: model.clone(),
                            response: cleaned,
                            confidence,
                            latency_ms: call_start.elapsed().as_millis() as u64,
                            tokens: TokenUsage {
                                input: chat_response.prompt_tokens as u64,
                                output: chat_response.completion_tokens as u64,
                            },
                            error: None,
                        }
                    }
                    Err(e) => AgentResponse::failed(agent_id.clone(), model.clone(), e.to_string()),
                };

                event_bus.publish_event(SwarmEvent::AgentComplete {
                    trace_id,
                    agent_id: agent_id.clone(),
                    confidence: response.confidence,
                    latency_ms: response.latency_ms,
                    errored: response.is_errored(),
                    timestamp: chrono::Utc::now(),
                });
                metrics.agent_finished();

                let _ = tx.send((index, response));
            }));
        }
        drop(tx);

        let mut completed = 0usize;
        let mut ordered: Vec<Option<AgentResponse>> = (0..n).map(|_| None).collect();
        while let Some((index, response)) = rx.recv().await {
            completed += 1;
            let progress = ((completed as f64 / n as f64) * 80.0).floor() as u8;
            let state = if response.is_errored() { AgentState::Failed } else { AgentState::Completed };
            self.status_registry.update(trace_id, |s| {
                s.mark_agent(&agent_ids[index], state, Some(response.confidence), Some(response.latency_ms));
                s.progress = progress;
            });
            ordered[index] = Some(response);
        }

        let _ = futures::future::join_all(handles).await;

        ordered.into_iter().flatten().collect()
    }

    async fn critique_loop(
        &self,
        trace_id: Uuid,
        mission: &str,
        initial_responses: Vec<AgentResponse>,
        cancel: &CancellationToken,
    ) -> CritiqueResult {
        let mut responses = initial_responses;
        let mut iterations = Vec::new();
        let mut guardian = Guardian::new();
        let mut weights = posterior::compute(&responses);
        let mut reviewer_tokens = TokenUsage::default();

        for round in 1..=MAX_CRITIQUE_ITERATIONS {
            if cancel.is_cancelled() {
                break;
            }

            self.event_bus.publish_event(SwarmEvent::CritiqueStart {
                trace_id,
                iteration: round,
                agent_count: responses.len(),
                timestamp: chrono::Utc::now(),
            });

            let critique_prompt = self.build_critique_prompt(mission, &responses);
            let request = ChatRequest {
                model: self.config.reviewer_model.clone(),
                messages: vec![
                    ChatMessage {
                        role: "system".to_string(),
                        content: "You are the reviewer. Re-score each agent and report an overall consensus.".to_string(),
                    },
                    ChatMessage {
                        role: "user".to_string(),
                        content: critique_prompt,
                    },
                ],
                temperature: 0.3,
                max_tokens: 800,
            };

            let (consensus, fallback_to_mean) = match self.upstream.call(&request, cancel).await {
                Ok(chat_response) => {
                    self.event_bus.publish_thought(ThoughtEvent::Critique {
                        trace_id,
                        agent_id: "reviewer".to_string(),
                        text: chat_response.content.clone(),
                        timestamp: chrono::Utc::now(),
                    });
                    reviewer_tokens.input += chat_response.prompt_tokens as u64;
                    reviewer_tokens.output += chat_response.completion_tokens as u64;
                    let (scores, consensus) = parse_critique(&chat_response.content);
                    for response in responses.iter_mut() {
                        if let Some(score) = scores.get(&response.agent_id) {
                            response.confidence = *score;
                        }
                    }
                    (consensus, false)
                }
                Err(e) => {
                    warn!(error = %e, round, "reviewer call failed, falling back to mean confidence");
                    let mean = if responses.is_empty() {
                        0.0
                    } else {
                        responses.iter().map(|r| r.confidence).sum::<f64>() / responses.len() as f64
                    };
                    (mean, true)
                }
            };

            weights = posterior::compute(&responses);
            iterations.push(Iteration {
                iteration_id: round,
                agent_responses: responses.clone(),
                consensus_score: consensus,
                timestamp: chrono::Utc::now(),
            });
            self.status_registry.update(trace_id, |s| s.current_iteration = round);

            self.event_bus.publish_event(SwarmEvent::CritiqueComplete {
                trace_id,
                iteration: round,
                timestamp: chrono::Utc::now(),
            });

            let guardian_halt = if fallback_to_mean {
                guardian.observe_forced_stagnant(round, consensus)
            } else {
                guardian.observe(round, consensus)
            };

            self.event_bus.publish_event(SwarmEvent::ConsensusUpdate {
                trace_id,
                iteration: round,
                consensus_score: consensus,
                threshold: CONSENSUS_THRESHOLD,
                guardian_fail: guardian_halt,
                timestamp: chrono::Utc::now(),
            });

            if guardian_halt {
                info!(round, consensus, "guardian halted critique loop");
                break;
            }
            if consensus >= CONSENSUS_THRESHOLD {
                break;
            }
        }

        CritiqueResult { responses, iterations, weights, reviewer_tokens }
    }

    fn build_critique_prompt(&self, mission: &str, responses: &[AgentResponse]) -> String {
        let mut prompt = format!("Mission: {mission}\n\nAgent responses:\n");
        for response in responses {
            let truncated: String = response.response.chars().take(500).collect();
            prompt.push_str(&format!("{}: {}\n", response.agent_id, truncated));
        }
        prompt.push_str(
            "\nFor each agent, respond with one line `agent-id: NEW_SCORE | justification`. \
             Finish with `[CONSENSUS]: SCORE | note`.",
        );
        prompt
    }

    async fn synthesize(
        &self,
        trace_id: Uuid,
        mission: &str,
        responses: &[AgentResponse],
        weights: &PosteriorWeights,
        cancel: &CancellationToken,
    ) -> CoreResult<SynthesisOutcome> {
        self.event_bus.publish_event(SwarmEvent::SynthesisStart { trace_id, timestamp: chrono::Utc::now() });

        let prompt = self.build_synthesis_prompt(mission, responses, weights);
        let request = |model: &str| ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "Synthesize the swarm's responses into one final answer, weighing higher-weighted agents more and reconciling conflicts.".to_string(),
                },
                ChatMessage { role: "user".to_string(), content: prompt.clone() },
            ],
            temperature: 0.4,
            max_tokens: 1000,
        };

        let primary = request(&self.config.synthesis_model);
        let result = match self.upstream.call(&primary, cancel).await {
            Ok(response) => Ok((response, self.config.synthesis_model.clone())),
            Err(primary_err) => {
                warn!(error = %primary_err, "primary synthesis model failed, retrying with fallback");
                let fallback = request(&self.config.fallback_model);
                match self.upstream.call(&fallback, cancel).await {
                    Ok(response) => Ok((response, self.config.fallback_model.clone())),
                    Err(fallback_err) => Err(CoreError::UpstreamFailed(format!(
                        "primary: {primary_err}; fallback: {fallback_err}"
                    ))),
                }
            }
        };

        self.event_bus.publish_event(SwarmEvent::SynthesisComplete { trace_id, timestamp: chrono::Utc::now() });

        result.map(|(response, model_used)| SynthesisOutcome {
            content: response.content,
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
            model_used,
        })
    }

    fn build_synthesis_prompt(&self, mission: &str, responses: &[AgentResponse], weights: &PosteriorWeights) -> String {
        let mut prompt = format!("Mission: {mission}\n\nWeighted agent responses:\n");
        for response in responses {
            let weight = weights.get(&response.agent_id).copied().unwrap_or(0.0);
            prompt.push_str(&format!(
                "{} (Weight: {:.3}, Confidence: {:.2}): {}\n",
                response.agent_id, weight, response.confidence, response.response
            ));
        }
        prompt
    }

    fn actual_cost(&self, responses: &[AgentResponse], reviewer_tokens: &TokenUsage, synthesis: &SynthesisOutcome) -> f64 {
        let swarm_rate = self.config.rate_for(&self.config.swarm_model);
        let swarm_cost: f64 = responses
            .iter()
            .map(|r| {
                (r.tokens.input as f64 / 1000.0) * swarm_rate.input_per_1k
                    + (r.tokens.output as f64 / 1000.0) * swarm_rate.output_per_1k
            })
            .sum();

        let reviewer_rate = self.config.rate_for(&self.config.reviewer_model);
        let reviewer_cost = (reviewer_tokens.input as f64 / 1000.0) * reviewer_rate.input_per_1k
            + (reviewer_tokens.output as f64 / 1000.0) * reviewer_rate.output_per_1k;

        let synthesis_rate = self.config.rate_for(&synthesis.model_used);
        let synthesis_cost = (synthesis.prompt_tokens as f64 / 1000.0) * synthesis_rate.input_per_1k
            + (synthesis.completion_tokens as f64 / 1000.0) * synthesis_rate.output_per_1k;

        swarm_cost + reviewer_cost + synthesis_cost
    }
}

struct CritiqueResult {
    responses: Vec<AgentResponse>,
    iterations: Vec<Iteration>,
    weights: PosteriorWeights,
    reviewer_tokens: TokenUsage,
}

struct SynthesisOutcome {
    content: String,
    prompt_tokens: u32,
    completion_tokens: u32,
    model_used: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::events::EventBus;
    use crate::metrics::MetricsRegistry;
    use crate::trace_store::TraceStore;
    use crate::upstream::UpstreamClient;

    fn chat_completion_body(content: &str) -> String {
        json!({
            "choices": [{"message": {"content": content}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 20},
        })
        .to_string()
    }

    fn test_engine(dir: &std::path::Path, base_url: String) -> SwarmEngine {
        let mut config = Config::default();
        config.trace_dir = dir.to_path_buf();
        config.upstream_base_url = base_url;
        config.upstream_api_key = Some("test-key".to_string());
        config.throttle_ms = 0;
        config.base_backoff_ms = 1;
        config.max_backoff_ms = 2;
        config.max_retries = 0;

        let metrics = Arc::new(MetricsRegistry::new());
        let trace_store = Arc::new(TraceStore::new(dir));
        let event_bus = Arc::new(EventBus::new());
        let upstream = Arc::new(UpstreamClient::new(&config));
        SwarmEngine::new(config, metrics, trace_store, event_bus, upstream)
    }

    fn agent_response(agent_id: &str, input: u64, output: u64) -> AgentResponse {
        AgentResponse {
            agent_id: agent_id.to_string(),
            model: "swarm-free".to_string(),
            response: "looks good".to_string(),
            confidence: 0.8,
            latency_ms: 5,
            tokens: TokenUsage { input, output },
            error: None,
        }
    }

    #[tokio::test]
    async fn fan_out_preserves_agent_order_and_parses_confidence_tags() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_completion_body("solid take [CONFIDENCE: 0.75]"))
            .create_async()
            .await;

        let engine = test_engine(dir.path(), format!("{}/", server.url()));
        let agent_ids = SwarmEngine::agent_ids(3);
        let cancel = CancellationToken::new();
        let responses = engine.fan_out(Uuid::new_v4(), "do a thing", &agent_ids, &cancel).await;

        assert_eq!(responses.len(), 3);
        for (i, response) in responses.iter().enumerate() {
            assert_eq!(response.agent_id, agent_ids[i]);
            assert_eq!(response.confidence, 0.75);
            assert_eq!(response.response, "solid take");
            assert_eq!(response.tokens.input, 10);
            assert_eq!(response.tokens.output, 20);
        }
    }

    #[tokio::test]
    async fn critique_loop_converges_immediately_when_consensus_clears_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_completion_body(
                "agent-1: 0.95 | aligned\nagent-2: 0.93 | aligned\n[CONSENSUS]: 0.95 | high agreement",
            ))
            .create_async()
            .await;

        let engine = test_engine(dir.path(), format!("{}/", server.url()));
        let trace_id = Uuid::new_v4();
        let responses = vec![agent_response("agent-1", 10, 20), agent_response("agent-2", 10, 20)];
        let cancel = CancellationToken::new();
        let result = engine.critique_loop(trace_id, "analyze the funnel", responses, &cancel).await;

        assert_eq!(result.iterations.len(), 1);
        assert_eq!(result.iterations[0].consensus_score, 0.95);
        assert_eq!(result.reviewer_tokens.input, 10);
        assert_eq!(result.reviewer_tokens.output, 20);
    }

    #[tokio::test]
    async fn critique_loop_guardian_halts_after_repeated_reviewer_failures() {
        // No mock is registered, so every reviewer call fails and the loop
        // falls back to the forced-stagnant path each round.
        let dir = tempfile::tempdir().unwrap();
        let server = mockito::Server::new_async().await;

        let engine = test_engine(dir.path(), format!("{}/", server.url()));
        let trace_id = Uuid::new_v4();
        let responses = vec![agent_response("agent-1", 10, 20), agent_response("agent-2", 10, 20)];
        let cancel = CancellationToken::new();
        let result = engine.critique_loop(trace_id, "analyze the funnel", responses, &cancel).await;

        // Round 1 never halts; forced-stagnant rounds 2 and 3 trip the guardian's patience of two.
        assert_eq!(result.iterations.len(), 3);
        assert_eq!(result.reviewer_tokens.input, 0);
        assert_eq!(result.reviewer_tokens.output, 0);
    }

    #[tokio::test]
    async fn synthesize_falls_back_to_secondary_model_when_primary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({"model": "synthesis-pro"})))
            .with_status(500)
            .with_body("primary model unavailable")
            .create_async()
            .await;
        server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({"model": "synthesis-fallback"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_completion_body("final synthesized answer"))
            .create_async()
            .await;

        let mut config = Config::default();
        config.trace_dir = dir.path().to_path_buf();
        config.upstream_base_url = format!("{}/", server.url());
        config.upstream_api_key = Some("test-key".to_string());
        config.throttle_ms = 0;
        config.base_backoff_ms = 1;
        config.max_backoff_ms = 2;
        config.max_retries = 0;
        let metrics = Arc::new(MetricsRegistry::new());
        let trace_store = Arc::new(TraceStore::new(dir.path()));
        let event_bus = Arc::new(EventBus::new());
        let upstream = Arc::new(UpstreamClient::new(&config));
        let engine = SwarmEngine::new(config, metrics, trace_store, event_bus, upstream);

        let responses = vec![agent_response("agent-1", 10, 20)];
        let weights = posterior::compute(&responses);
        let cancel = CancellationToken::new();
        let outcome = engine
            .synthesize(Uuid::new_v4(), "analyze the funnel", &responses, &weights, &cancel)
            .await
            .expect("fallback synthesis should succeed");

        assert_eq!(outcome.model_used, "synthesis-fallback");
        assert_eq!(outcome.content, "final synthesized answer");
    }

    #[test]
    fn actual_cost_includes_reviewer_tokens_alongside_swarm_and_synthesis() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let metrics = Arc::new(MetricsRegistry::new());
        let trace_store = Arc::new(TraceStore::new(dir.path()));
        let event_bus = Arc::new(EventBus::new());
        let upstream = Arc::new(UpstreamClient::new(&config));
        let engine = SwarmEngine::new(config, metrics, trace_store, event_bus, upstream);

        let responses = vec![agent_response("agent-1", 100, 200)];
        let reviewer_tokens = TokenUsage { input: 50, output: 60 };
        let synthesis = SynthesisOutcome {
            content: "final".to_string(),
            prompt_tokens: 30,
            completion_tokens: 40,
            model_used: engine.config.synthesis_model.clone(),
        };

        let cost = engine.actual_cost(&responses, &reviewer_tokens, &synthesis);

        let swarm_rate = engine.config.rate_for(&engine.config.swarm_model);
        let reviewer_rate = engine.config.rate_for(&engine.config.reviewer_model);
        let synthesis_rate = engine.config.rate_for(&synthesis.model_used);
        let expected = (100.0 / 1000.0) * swarm_rate.input_per_1k
            + (200.0 / 1000.0) * swarm_rate.output_per_1k
            + (50.0 / 1000.0) * reviewer_rate.input_per_1k
            + (60.0 / 1000.0) * reviewer_rate.output_per_1k
            + (30.0 / 1000.0) * synthesis_rate.input_per_1k
            + (40.0 / 1000.0) * synthesis_rate.output_per_1k;

        assert!((cost - expected).abs() < 1e-12);
        // Reviewer rate is billed, not the free swarm rate - guards against silently
        // dropping the reviewer's tokens from actualCost again.
        assert!(reviewer_rate.input_per_1k > 0.0);
    }
}
