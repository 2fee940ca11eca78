//! CLI tool for document-to-text transcription

use doc_transcriber::{process_document, ExtractionMode, ProcessOptions, RunStatus};
use std::env;
use std::path::PathBuf;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <document> [options]", args[0]);
        eprintln!();
        eprintln!("Converts a PDF or word-processor document to plain text,");
        eprintln!("choosing per page between text-layer extraction and OCR.");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --tables       table-aware extraction for the whole document");
        eprintln!("  --no-save      print the transcript instead of writing a file");
        eprintln!("  -o <path>      explicit output path for the transcript");
        process::exit(1);
    }

    let input = &args[1];
    let mut mode = ExtractionMode::PerPage;
    let mut persist = true;
    let mut output_path: Option<PathBuf> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--tables" => mode = ExtractionMode::TableAware,
            "--no-save" => persist = false,
            "-o" => {
                i += 1;
                match args.get(i) {
                    Some(path) => output_path = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("Error: -o requires a path");
                        process::exit(1);
                    }
                }
            }
            other => {
                eprintln!("Error: unknown option {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let options = ProcessOptions {
        mode,
        persist,
        output_path,
    };

    let outcome = process_document(input, &options);

    match outcome.status {
        RunStatus::Completed => {
            println!("Document Transcription");
            println!("======================");
            println!("File: {}", input);
            println!("Pages: {}", outcome.page_count);
            println!("Processing time: {}ms", outcome.processing_time_ms);

            if let Some(path) = &outcome.output_path {
                println!();
                println!("Transcript written to: {}", path.display());
                println!("Length: {} characters", outcome.transcript.len());
            } else {
                println!();
                println!("--- Transcript ---");
                println!();
                println!("{}", outcome.transcript);
            }
        }
        RunStatus::Failed(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
