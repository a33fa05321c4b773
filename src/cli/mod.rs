//! CLI Module
//!
//! Command-line interface for the Sonaris forensic audio pipeline.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sonaris - forensic audio reconstruction and semantic search
#[derive(Parser, Debug)]
#[command(name = "sonaris")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a media file and print its canonical properties
    #[command(name = "info")]
    Info {
        /// Input media file (audio or video)
        input: PathBuf,
    },

    /// Run the reconstruction engine and write the processed WAV
    #[command(name = "reconstruct")]
    Reconstruct {
        /// Input media file
        input: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        /// Phase gain parameter in [0, 2]
        #[arg(long, default_value_t = 0.8)]
        phase_gain: f32,

        /// Dry/wet blend in [0, 1]
        #[arg(long, default_value_t = 0.5)]
        blend: f32,
    },

    /// Search the audio for time windows matching a text query
    #[command(name = "search")]
    Search {
        /// Input media file
        input: PathBuf,

        /// Text query, e.g. "faint whistle"
        query: String,

        /// Emit the match list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transcribe the audio (best-effort)
    #[command(name = "transcribe")]
    Transcribe {
        /// Input media file
        input: PathBuf,
    },

    /// Decode a media file and write its canonical PCM as WAV
    #[command(name = "export")]
    Export {
        /// Input media file
        input: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,
    },
}
