//! Chat command - the interactive tutoring loop.

use std::path::Path;
use std::time::Duration;

use miette::miette;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use lingo_backend::{Backend, BackendConfig, LlamaServer};
use lingo_session::SessionController;
use lingo_store::SessionStore;

use crate::config;

/// How long to wait for the local server's model load before giving up.
const READY_DEADLINE: Duration = Duration::from_secs(300);

pub(crate) async fn run(
    config_path: &Path,
    db_path: &Path,
    window: Option<usize>,
) -> miette::Result<()> {
    let config = config::load(config_path).map_err(|e| miette!("{e}"))?;
    let store = SessionStore::open(db_path).map_err(|e| miette!("{e}"))?;

    // In local mode the server child is owned here for the whole session.
    // Its Drop reaps the process on every exit path below, including the
    // early `?` returns.
    let mut server = match &config {
        BackendConfig::Local(local) => {
            let mut server = LlamaServer::new(local.clone());
            server.start().map_err(|e| miette!("{e}"))?;
            println!("Local server starting (this can take a while on first load)...");
            server
                .wait_ready(READY_DEADLINE)
                .await
                .map_err(|e| miette!("{e}"))?;
            Some(server)
        }
        BackendConfig::Remote(_) => None,
    };

    let mut backend = Backend::from_config(&config).map_err(|e| miette!("{e}"))?;
    if let Some(window) = window {
        backend = backend.with_history_window(window);
    }
    let mut controller = SessionController::new(store, backend);

    let mut rl = DefaultEditor::new().map_err(|e| miette!("{e}"))?;

    println!("Welcome to Lingo!");
    let language = ask(&mut rl, "Language to learn (e.g. English, Spanish, French): ")?;
    let level = ask(&mut rl, "Your level (beginner, intermediate, advanced): ")?;
    let topic = ask(&mut rl, "Topic to practice: ")?;

    let welcome = controller
        .start_session(&language, &level, &topic)
        .map_err(|e| miette!("{e}"))?;

    println!();
    println!("=== Session started ===");
    println!("Language: {language}");
    println!("Level: {level}");
    println!("Topic: {topic}");
    println!("Type 'quit' to exit.");
    println!();
    println!("Teacher: {welcome}");
    println!();

    loop {
        match rl.readline("You: ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "quit" || trimmed == "exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match controller.send_message(trimmed).await {
                    Ok(reply) => {
                        println!("Teacher: {reply}");
                        println!();
                    }
                    // Recoverable: the user turn is kept, the caller may
                    // simply try again.
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(miette!("{e}")),
        }
    }

    if let Some(server) = server.as_mut() {
        server.stop();
    }
    println!("Thank you for learning!");
    Ok(())
}

/// Prompt until the user enters a non-empty line.
fn ask(rl: &mut DefaultEditor, prompt: &str) -> miette::Result<String> {
    loop {
        let line = rl.readline(prompt).map_err(|e| miette!("{e}"))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
}
