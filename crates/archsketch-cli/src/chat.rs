use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use archsketch_assist::{DesignSynthesizer, Provider, Session};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::output;

const HELP: &str = "Describe the system you want to build. Commands: /generate, /reset, /quit";

/// Run `work` unless `cancel` resolves first. Dropping `work` abandons it.
async fn cancellable<T>(work: impl Future<Output = T>, cancel: impl Future) -> Option<T> {
    tokio::select! {
        out = work => Some(out),
        _ = cancel => None,
    }
}

/// Interactive design interview on stdin/stdout.
pub async fn run(provider: Arc<dyn Provider>, out: Option<&Path>) -> anyhow::Result<()> {
    let mut session = Session::new(provider.clone());
    let synthesizer = DesignSynthesizer::new(provider);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    loop {
        output::prompt("> ")?;
        // Ctrl-C at the prompt ends the chat.
        let line = cancellable(lines.next_line(), tokio::signal::ctrl_c())
            .await
            .transpose()?
            .flatten();
        let Some(line) = line else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/reset" => {
                session.reset();
                println!("Conversation cleared.");
            }
            "/generate" => {
                if session.is_empty() {
                    println!("Nothing to design yet. Describe your system first.");
                    continue;
                }
                println!("Generating architecture... (Ctrl-C to cancel)");
                let result = cancellable(
                    synthesizer.generate(session.messages()),
                    tokio::signal::ctrl_c(),
                )
                .await;
                match result {
                    None => println!("\n(cancelled, conversation kept)"),
                    Some(Ok(artifact)) => {
                        output::print_artifact(&artifact, out)?;
                        session.reset();
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "design generation failed");
                        println!("Generation failed: {e}\nType /generate to try again.");
                    }
                }
            }
            text => {
                let outcome =
                    cancellable(session.append_user_turn(text), tokio::signal::ctrl_c()).await;
                let Some(outcome) = outcome else {
                    println!("\n(cancelled)");
                    continue;
                };

                println!("\n{}\n", outcome.reply.content);
                if outcome.ready_to_generate {
                    println!("(Ready: type /generate to build the architecture, or keep chatting.)");
                }
            }
        }
    }

    Ok(())
}
