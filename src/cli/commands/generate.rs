//! Generate command implementation.

use crate::audio::{save_episode, write_episode, ElevenLabsSynthesizer};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ResearchMode, Settings};
use crate::script::ScriptGenerator;
use anyhow::Result;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Options for one `podcraft generate` run.
#[derive(Debug)]
pub struct GenerateOptions {
    pub topic: String,
    pub duration: Option<u32>,
    pub script_only: bool,
    pub output: Option<PathBuf>,
    pub save_script: Option<PathBuf>,
    pub mode: Option<ResearchMode>,
}

/// Run the generate command.
pub async fn run_generate(
    options: GenerateOptions,
    mut settings: Settings,
    cancel: CancellationToken,
) -> Result<()> {
    if let Some(mode) = options.mode {
        settings.research.mode = mode;
    }

    // Pre-flight checks
    let operation = Operation::Generate {
        audio: !options.script_only,
    };
    if let Err(e) = preflight::check(operation, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'podcraft doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let generator = ScriptGenerator::from_settings(&settings)?;

    Output::kv("Engine", &format!("{} ({})", settings.engine.provider, settings.engine.model));
    Output::kv("Research", &settings.research.mode.to_string());

    let spinner = Output::spinner(&format!("Researching \"{}\"...", options.topic.trim()));
    let generated = match generator
        .generate(&options.topic, options.duration, &cancel)
        .await
    {
        Ok(generated) => {
            spinner.finish_and_clear();
            generated
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Script generation failed: {}", e.message));
            return Err(e.into());
        }
    };

    println!("\n{}\n", generated.script);

    if !generated.tool_calls.is_empty() {
        Output::header(&format!("Tool calls ({})", generated.tool_calls.len()));
        for call in &generated.tool_calls {
            Output::tool_call(call);
        }
    }
    Output::info(&format!(
        "{} words in {} iteration(s)",
        generated.word_count, generated.iterations
    ));

    if let Some(path) = &options.save_script {
        tokio::fs::write(path, &generated.script).await?;
        Output::success(&format!("Script saved to {}", path.display()));
    }

    if options.script_only {
        return Ok(());
    }

    let synthesizer = ElevenLabsSynthesizer::from_settings(&settings.audio)?;
    let spinner = Output::spinner("Synthesizing audio...");
    let saved = match &options.output {
        Some(path) => write_episode(&synthesizer, &generated.script, path).await,
        None => {
            save_episode(
                &synthesizer,
                &generated.script,
                &generated.topic,
                &settings.audio_dir(),
            )
            .await
        }
    };
    spinner.finish_and_clear();

    match saved {
        Ok(path) => {
            Output::success(&format!("Episode saved to {}", path.display()));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Speech synthesis failed: {}", e));
            Err(e.into())
        }
    }
}
