//! Agent orchestration: a persona, a tool set and a hosted model.
//!
//! ## Run loop
//! 1. Send `[system(instructions), user(input)]` plus tool definitions
//! 2. If the model asks for tools, execute each and append the results
//! 3. Ask again until the model answers with text (bounded by `max_turns`)
//!
//! Whether the model calls a tool at all is up to the model.

use std::sync::Arc;

use crate::config::Config;
use crate::llm::{ChatMessage, LlmClient, Role, TokenUsage};
use crate::tools::{CoinloreClient, GetCryptoPrice, ToolRegistry};

/// Default cap on model round trips per run.
pub const DEFAULT_MAX_TURNS: usize = 10;

pub const CRYPTO_AGENT_NAME: &str = "CryptoDataAgent";

pub const CRYPTO_AGENT_INSTRUCTIONS: &str = "You are a Crypto Agent. You provide real-time rates using get_crypto_price tool. EXPECT the user always asks about coins. NEVER respond to any other TOPIC.";

/// Build the per-request prompt for a coin name or symbol.
pub fn price_prompt(coin: &str) -> String {
    format!("What is the price of {}?", coin)
}

/// Output of a completed run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Final text answer from the model.
    pub final_output: String,
    /// Number of model round trips.
    pub turns: usize,
    /// Tool names invoked, in call order.
    pub tool_calls: Vec<String>,
    pub usage: TokenUsage,
}

/// A persona paired with tools and a model.
pub struct Agent {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: ToolRegistry,
    pub max_turns: usize,
    llm: Arc<dyn LlmClient>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
        tools: ToolRegistry,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            tools,
            max_turns: DEFAULT_MAX_TURNS,
            llm,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Run the agent on a single user input until the model gives a text answer.
    ///
    /// Tool failures (network, HTTP status, decode) abort the run and are returned.
    pub async fn run(&self, input: &str) -> anyhow::Result<RunResult> {
        let mut messages = vec![
            ChatMessage::new(Role::System, self.instructions.clone()),
            ChatMessage::new(Role::User, input),
        ];
        let definitions = self.tools.definitions();
        let tools = (!definitions.is_empty()).then_some(definitions.as_slice());

        let mut usage = TokenUsage::default();
        let mut tool_calls = Vec::new();

        for turn in 1..=self.max_turns {
            let response = self
                .llm
                .chat_completion(&self.model, &messages, tools)
                .await?;
            if let Some(u) = &response.usage {
                usage = usage.add(u);
            }

            let calls = response.requested_tool_calls().to_vec();
            if calls.is_empty() {
                let final_output = response
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| anyhow::anyhow!("{} returned an empty response", self.name))?;

                tracing::info!(
                    "{} finished in {} turn(s), {} tool call(s)",
                    self.name,
                    turn,
                    tool_calls.len()
                );
                return Ok(RunResult {
                    final_output,
                    turns: turn,
                    tool_calls,
                    usage,
                });
            }

            messages.push(ChatMessage::assistant_tool_calls(
                response.content.clone(),
                calls.clone(),
            ));

            for call in &calls {
                tracing::debug!(
                    "{} calling tool {} with {}",
                    self.name,
                    call.function.name,
                    call.function.arguments
                );
                let output = self
                    .tools
                    .execute(&call.function.name, &call.function.arguments)
                    .await
                    .map_err(|e| {
                        tracing::warn!("Tool {} failed: {}", call.function.name, e);
                        e
                    })?;
                tool_calls.push(call.function.name.clone());
                messages.push(ChatMessage::tool_result(call.id.clone(), output));
            }
        }

        Err(anyhow::anyhow!(
            "{} exceeded {} turns without a final answer",
            self.name,
            self.max_turns
        ))
    }
}

/// The crypto price agent with its single `get_crypto_price` tool.
pub fn crypto_data_agent(config: &Config, llm: Arc<dyn LlmClient>) -> anyhow::Result<Agent> {
    let coinlore = CoinloreClient::from_config(config)?;
    Ok(crypto_data_agent_with(config.model.clone(), coinlore, llm))
}

/// Same as [`crypto_data_agent`] with an explicit price client.
pub fn crypto_data_agent_with(
    model: String,
    coinlore: CoinloreClient,
    llm: Arc<dyn LlmClient>,
) -> Agent {
    let tools = ToolRegistry::new().with(Arc::new(GetCryptoPrice::new(coinlore)));
    Agent::new(
        CRYPTO_AGENT_NAME,
        CRYPTO_AGENT_INSTRUCTIONS,
        model,
        tools,
        llm,
    )
}
