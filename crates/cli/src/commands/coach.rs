//! `habitcoach recommend|converse|analyze`: Talk to a running gateway.
//!
//! Requests go through the same [`Dispatcher`] the app uses, so the
//! per-mode timeouts and output caps from `[client]` apply here too.

use habitcoach_agent::FallbackStrategy;
use habitcoach_client::{CoachReply, CoachRequest, DispatchError, Dispatcher};
use habitcoach_config::AppConfig;
use habitcoach_core::api::{AnalyzeRequest, ConverseRequest, RecommendRequest, TokenReport};
use habitcoach_core::catalog::ExerciseCatalog;
use habitcoach_core::outcome::{CoachMode, FallbackReason};
use std::sync::Arc;

fn dispatcher(url: Option<String>) -> Result<Dispatcher, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(url) = url {
        config.client.base_url = url;
    }
    Ok(Dispatcher::http(config.client))
}

pub async fn recommend(user: String, count: usize, url: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let request = CoachRequest::Recommend(RecommendRequest {
        user_id: user,
        requested_count: count,
    });
    send(dispatcher(url)?, request).await
}

pub async fn converse(
    user: String,
    message: String,
    context: Option<String>,
    goals: Vec<String>,
    url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = CoachRequest::Converse(ConverseRequest {
        message,
        user_id: user,
        context,
        user_goals: goals,
        past_messages: Vec::new(),
    });
    send(dispatcher(url)?, request).await
}

pub async fn analyze(
    user: String,
    text: String,
    context: Option<String>,
    max_tokens: Option<u32>,
    url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = CoachRequest::Analyze(AnalyzeRequest {
        text,
        context,
        max_tokens,
        user_id: user,
    });
    send(dispatcher(url)?, request).await
}

async fn send(dispatcher: Dispatcher, request: CoachRequest) -> Result<(), Box<dyn std::error::Error>> {
    let mode = request.mode();
    match dispatcher.dispatch(request).await {
        Ok(reply) => {
            print_reply(&reply);
            Ok(())
        }
        Err(DispatchError::BudgetExhausted { balance, required }) => {
            let fallback = FallbackStrategy::new(Arc::new(ExerciseCatalog::builtin()));
            let text = match mode {
                CoachMode::Analyze => fallback.analyze(FallbackReason::BudgetExhausted),
                CoachMode::Converse => fallback.converse(FallbackReason::BudgetExhausted),
                CoachMode::Recommend => "You're out of coaching tokens, so personalized picks are paused.".into(),
            };
            println!("🪫 {text}");
            println!("   Balance: {balance} tokens, {required} needed for {mode}");
            Ok(())
        }
        Err(e) => Err(e.to_string().into()),
    }
}

fn print_reply(reply: &CoachReply) {
    match reply {
        CoachReply::Recommend(r) => {
            if let Some(theme) = &r.metadata.overall_focus_theme {
                println!("🎯 Focus: {theme}\n");
            }
            for (i, item) in r.recommendations.iter().enumerate() {
                println!("{}. {} [{}] ({})", i + 1, item.title, item.exercise_id, item.priority_score);
                println!("   {}", item.reasoning);
                println!("   → {}", item.expected_benefit);
            }
            if let Some(note) = &r.metadata.coach_note {
                println!("\n💬 {note}");
            }
        }
        CoachReply::Converse(r) => println!("💬 {}", r.data.response),
        CoachReply::Analyze(r) => {
            if let Some(variant) = &r.data.metadata.variant {
                println!("🔍 {variant}\n");
            }
            println!("{}", r.data.analysis);
        }
    }

    if let Some(reason) = fallback_reason(reply) {
        println!("\n⚠️  Served by fallback ({reason})");
    }
    match tokens(reply) {
        Some(report) => println!("   Tokens: {} used, {} remaining", report.used, report.remaining),
        None => println!("   Tokens: balance unavailable"),
    }
}

fn fallback_reason(reply: &CoachReply) -> Option<FallbackReason> {
    match reply {
        CoachReply::Recommend(r) => r.metadata.fallback_reason,
        CoachReply::Converse(r) => r.data.metadata.fallback_reason,
        CoachReply::Analyze(r) => r.data.metadata.fallback_reason,
    }
}

fn tokens(reply: &CoachReply) -> Option<TokenReport> {
    match reply {
        CoachReply::Recommend(r) => r.tokens,
        CoachReply::Converse(r) => r.tokens,
        CoachReply::Analyze(r) => r.tokens,
    }
}
