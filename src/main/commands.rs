// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use sitepilot::agent::{ChatRequest, ChatResponse, EngineObserver, JsonLinesObserver, NoopObserver};
use sitepilot::cli::{ChatArgs, DocArgs, DocCommands, HistoryArgs, OutputFormat, SiteArgs};
use sitepilot::content::ContentStore;
use sitepilot::conversation::{ConversationStore, MessageRole};
use sitepilot::error::{PilotError, Result};
use sitepilot::tools::ToolContext;

use super::runtime::Runtime;

const CLI_ACTOR: &str = "cli@sitepilot.local";

pub(super) async fn run_chat(args: ChatArgs, mut runtime: Runtime, format: OutputFormat) -> Result<()> {
    if let Some(provider) = args.provider {
        runtime.settings.agent.provider = provider;
    }
    if let Some(model) = args.model {
        runtime.settings.agent.model = Some(model);
    }
    runtime.settings.validate()?;

    let engine = runtime.engine()?;

    let mut request = ChatRequest::new(&args.site.site, &args.site.locale, args.message)
        .with_dry_run(args.dry_run)
        .with_stream(args.stream);
    if let Some(id) = args.conversation {
        request = request.with_conversation(id);
    }
    if let Some(actor) = args.actor {
        request = request.with_actor(actor);
    }

    let mut observer: Box<dyn EngineObserver> = if args.stream {
        Box::new(JsonLinesObserver::new(std::io::stdout()))
    } else {
        Box::new(NoopObserver)
    };
    let response = engine
        .handle_with_observer(request, observer.as_mut())
        .await?;

    // The done event already carries the answer
    if args.stream {
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Text => print_response(&response),
    }
    Ok(())
}

fn print_response(response: &ChatResponse) {
    for run in &response.tool_runs {
        let mark = if run.ok { "ok" } else { "failed" };
        match run.failure {
            Some(tag) => println!("  [{}] {}: {} ({})", mark, run.tool, run.summary, tag),
            None => println!("  [{}] {}: {}", mark, run.tool, run.summary),
        }
    }
    if !response.tool_runs.is_empty() {
        println!();
    }
    println!("{}", response.answer);
    if response.dry_run {
        println!("\n(dry run: nothing was saved)");
    }
    println!("\nconversation: {}", response.conversation_id);
}

pub(super) async fn run_history(args: HistoryArgs, runtime: Runtime, format: OutputFormat) -> Result<()> {
    let SiteArgs { site, locale } = args.site;

    let Some(conversation_id) = args.conversation else {
        let ids = runtime.conversations.list_conversations(&site, &locale)?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ids)?),
            OutputFormat::Text if ids.is_empty() => {
                println!("\nNo conversations for {} ({}).\n", site, locale)
            }
            OutputFormat::Text => {
                println!("\nConversations for {} ({}):\n", site, locale);
                for id in ids {
                    println!("  {}", id);
                }
                println!();
            }
        }
        return Ok(());
    };

    let records = runtime
        .conversations
        .load_conversation(&site, &locale, &conversation_id, args.limit)
        .await?;
    if records.is_empty() {
        return Err(PilotError::NotFound(format!(
            "conversation {} has no messages",
            conversation_id
        )));
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            for record in records {
                let date = record.created_at.format("%Y-%m-%d %H:%M");
                let who = match (&record.role, &record.tool_name) {
                    (MessageRole::Tool, Some(name)) => format!("tool:{}", name),
                    (role, _) => role.as_str().to_string(),
                };
                println!("{} {:>14} | {}", date, who, record.content);
            }
        }
    }
    Ok(())
}

pub(super) async fn run_doc(args: DocArgs, runtime: Runtime, format: OutputFormat) -> Result<()> {
    match args.command {
        DocCommands::Get { site, path } => {
            let ctx = ToolContext::new(&site.site, &site.locale, CLI_ACTOR);
            let doc = runtime
                .content
                .read(&ctx, &path)
                .await?
                .ok_or_else(|| PilotError::NotFound(format!("document not found ({})", path)))?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        DocCommands::List { site, prefix } => {
            let ctx = ToolContext::new(&site.site, &site.locale, CLI_ACTOR);
            let docs = runtime.content.list_by_prefix(&ctx, &prefix).await?;
            match format {
                OutputFormat::Json => {
                    let paths: Vec<&str> = docs.iter().map(|d| d.path.as_str()).collect();
                    println!("{}", serde_json::to_string_pretty(&paths)?);
                }
                OutputFormat::Text => {
                    for doc in &docs {
                        println!("{}", doc.path);
                    }
                }
            }
        }
    }
    Ok(())
}
