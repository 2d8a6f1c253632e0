//! Run the full documentation analysis for a project.
//!
//! ```text
//! cargo run --example analyze -- "An online bookstore with vendor accounts ..."
//! cargo run --example analyze -- --dir ./path/to/extracted/project
//! ```
//!
//! Uses Azure OpenAI when `AZURE_OPENAI_*` is configured and DeepSeek when
//! `DEEPSEEK_API_KEY` is set instead.

use anyhow::{bail, Context};
use draftwise::analysis::{
    AnalysisInput, AnalysisKind, AnalysisSession, Analyzer, CodebaseSnapshot, InputMode,
};
use draftwise::prelude::*;
use std::time::Duration;

fn executor() -> anyhow::Result<RuntimeExecutor> {
    if let Ok(settings) = AzureSettings::from_env() {
        let deployment = settings.deployment.clone();
        let provider = azure(settings)?;
        return Ok(RuntimeExecutor::builder(provider)
            .layer(LoggingLayer::new())
            .model(deployment)
            .finish());
    }

    if let Ok(api_key) = std::env::var("DEEPSEEK_API_KEY") {
        let provider = deepseek(api_key)?;
        return Ok(RuntimeExecutor::builder(provider)
            .layer(LoggingLayer::new())
            .model("deepseek-chat")
            .finish());
    }

    bail!("set AZURE_OPENAI_ENDPOINT/API_KEY/DEPLOYMENT or DEEPSEEK_API_KEY")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let input = match args.as_slice() {
        [flag, dir] if flag == "--dir" => AnalysisInput::Codebase(
            CodebaseSnapshot::from_dir(dir).with_context(|| format!("reading {dir}"))?,
        ),
        [] => bail!("usage: analyze <description> | analyze --dir <path>"),
        words => AnalysisInput::Description(words.join(" ")),
    };

    let coercer = ResponseCoercer::new(executor()?)
        .with_config(CoercerConfig::new().with_attempt_timeout(Duration::from_secs(120)));
    let analyzer = Analyzer::new(coercer);

    let mut session = AnalysisSession::new(InputMode::Text).with_project_name("Demo Project");
    let report = analyzer
        .run(&mut session, &input, |p| {
            println!("[{:>3}%] {}", p.percent(), p.message)
        })
        .await?;

    println!("\n=== {} ===", session.project_name);
    if let Some(business) = session.record(AnalysisKind::Business) {
        println!(
            "Executive summary: {}",
            business.str_or("executive_summary", "n/a")
        );
    }
    if let Some(frd) = session.record(AnalysisKind::Frd) {
        println!(
            "Functional requirements: {}",
            frd.list("functional_requirements").len()
        );
    }

    println!("Model calls: {}", report.invocations);
    for kind in report.fallbacks() {
        println!("Fallback template used for {kind}");
    }

    println!("\n{}", serde_json::to_string_pretty(&session.to_json())?);
    Ok(())
}
