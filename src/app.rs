//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// Narrate Open Bible Stories section by section and plan crossfaded video exports
#[derive(Parser)]
#[command(name = "obs2vid")]
#[command(version)]
#[command(about = "Narrate Open Bible Stories section by section and plan crossfaded video exports")]
#[command(long_about = "Narrate Open Bible Stories section by section and plan crossfaded video exports.\n\nEXAMPLES:\n    # Download stories and build the catalog\n    $ obs2vid fetch all --images\n    $ obs2vid catalog\n    \n    # Narrate story 32, section 3, then listen back\n    $ obs2vid record 32 3\n    $ obs2vid play 32 3\n    \n    # See which sections still need narration\n    $ obs2vid list 32\n    \n    # Write captions and the render plan\n    $ obs2vid export 32 --crossfade-ms 500")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/obs2vid/obs2vid.toml\n    Data:               ~/.local/share/obs2vid\n    Logs:               ~/.local/state/obs2vid/obs2vid.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Narrate one story section
    ///
    /// Shows the section text with a live input meter. Press Enter to save
    /// the take or Escape/q to discard it. SIGUSR1 also saves.
    #[command(visible_alias = "r")]
    Record {
        /// Story number (1-50)
        story: u32,
        /// Section number within the story
        section: u32,
    },

    /// Listen back to a section's take
    ///
    /// Press Enter or Escape to stop, or 'r' to discard the take.
    #[command(visible_alias = "p")]
    Play { story: u32, section: u32 },

    /// Discard a section's take so it can be recorded again
    Retake { story: u32, section: u32 },

    /// Show which sections of a story are narrated
    #[command(visible_alias = "ls")]
    List { story: u32 },

    /// Write captions and a render plan for a narrated story
    ///
    /// The plan lists every section's audio, image, timeline position and
    /// pan/zoom path, followed by a 2 second attribution end card.
    Export {
        story: u32,

        /// Output video path; defaults to the configured export directory
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Overlap between neighbouring sections in milliseconds
        #[arg(long, value_name = "MS")]
        crossfade_ms: Option<f64>,

        /// Skip the .srt caption file
        #[arg(long)]
        no_srt: bool,
    },

    /// Download story content into the local cache
    ///
    /// Examples:
    ///   obs2vid fetch all
    ///   obs2vid fetch 1-5,32 --images
    Fetch {
        /// Stories to download: "all", an id, ranges or a comma list
        #[arg(default_value = "all")]
        stories: String,

        /// Also cache section images in both sizes
        #[arg(long)]
        images: bool,

        /// Download again even if already cached
        #[arg(short, long)]
        force: bool,
    },

    /// Build the story catalog from cached content
    Catalog,

    /// List catalogued stories
    Stories,

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   obs2vid completions bash > obs2vid.bash
    ///   obs2vid completions zsh > _obs2vid
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that don't need logging
    match &cli.command {
        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "obs2vid", &mut io::stdout());
            return Ok(());
        }
        Commands::ListDevices => return exit_on_error(commands::handle_list_devices()),
        Commands::Logs => return exit_on_error(commands::handle_logs()),
        _ => {}
    }

    logging::init_logging()?;

    match cli.command {
        Commands::Record { story, section } => commands::handle_record(story, section).await?,
        Commands::Play { story, section } => commands::handle_play(story, section)?,
        Commands::Retake { story, section } => commands::handle_retake(story, section)?,
        Commands::List { story } => commands::handle_list(story)?,
        Commands::Export {
            story,
            output,
            width,
            height,
            crossfade_ms,
            no_srt,
        } => commands::handle_export(
            story,
            commands::ExportOverrides {
                output,
                width,
                height,
                crossfade_ms,
                no_srt,
            },
        )?,
        Commands::Fetch {
            stories,
            images,
            force,
        } => commands::handle_fetch(&stories, images, force).await?,
        Commands::Catalog => commands::handle_catalog()?,
        Commands::Stories => commands::handle_stories()?,
        Commands::Config => commands::handle_config()?,
        Commands::Completions { .. } | Commands::ListDevices | Commands::Logs => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

fn exit_on_error(result: Result<(), anyhow::Error>) -> Result<(), anyhow::Error> {
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_export_overrides() {
        let cli = Cli::try_parse_from([
            "obs2vid",
            "export",
            "32",
            "--crossfade-ms",
            "500",
            "--no-srt",
        ])
        .unwrap();
        match cli.command {
            Commands::Export {
                story,
                crossfade_ms,
                no_srt,
                output,
                ..
            } => {
                assert_eq!(story, 32);
                assert_eq!(crossfade_ms, Some(500.0));
                assert!(no_srt);
                assert!(output.is_none());
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn fetch_defaults_to_all_stories() {
        let cli = Cli::try_parse_from(["obs2vid", "fetch"]).unwrap();
        assert!(matches!(cli.command, Commands::Fetch { ref stories, .. } if stories == "all"));
    }
}
