use anyhow::Context;
use clap::Parser;
use docchat::client::Client;
use docchat::config::{Cli, Command};
use docchat::protocol::StreamEvent;
use docchat::theme::{self, Palette};
use docchat::{logging, preview, ui};
use std::io::{self, Write};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _guard = logging::setup(&cli.log_dir())?;
    let client = Client::new(cli.client_config());
    let palette = Palette::for_mode(cli.dark);

    tracing::info!(base_url = client.base_url(), session = client.session_id(), "starting");

    match cli.resolved_command() {
        Command::Chat => ui::run_tui(client, cli.dark)?,
        Command::Upload { path } => {
            let document = client.upload(&path).await?;
            println!("{}", document.backend_id);
        }
        Command::Delete { document_id } => {
            client.delete(&document_id).await?;
            println!("deleted {}", document_id);
        }
        Command::Ask { document, question } => {
            let question = question.join(" ");
            print_answer(&client, &document, &question, &mut io::stdout()).await?;
        }
        Command::Render { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            for line in theme::plain_lines(&theme::render_text(&text, &palette).lines) {
                println!("{}", line);
            }
        }
        Command::Preview { path } => {
            let text = preview::load(&path).to_text(&palette);
            for line in theme::plain_lines(&text.lines) {
                println!("{}", line);
            }
        }
        Command::Documents => {
            let list = client.list_documents().await?;
            for document in &list.documents {
                println!(
                    "{}\t{}\t{} chunks",
                    document.document_id,
                    document.filename.as_deref().unwrap_or("Unknown"),
                    document.total_chunks
                );
            }
            println!("{} document(s)", list.total);
        }
        Command::Clear => {
            client.clear_history().await?;
            println!("chat memory cleared for session {}", client.session_id());
        }
    }

    Ok(())
}

/// Streams one answer to `out` as it arrives, then the sources line.
async fn print_answer<W: Write>(
    client: &Client,
    document_id: &str,
    question: &str,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut sources = Vec::new();
    let mut write_error: Option<io::Error> = None;

    client
        .ask(document_id, question, |event| {
            match event {
                StreamEvent::Token { content } if write_error.is_none() => {
                    if let Err(err) = write!(out, "{}", content).and_then(|()| out.flush()) {
                        write_error = Some(err);
                    }
                }
                StreamEvent::Sources { sources: found } => {
                    sources = found.iter().map(|s| s.label().to_string()).collect();
                }
                _ => {}
            }
            async {}
        })
        .await?;

    if let Some(err) = write_error {
        return Err(err).context("writing answer");
    }
    writeln!(out)?;
    if !sources.is_empty() {
        writeln!(out, "Sources: {}", sources.join(", "))?;
    }
    out.flush()?;
    Ok(())
}
