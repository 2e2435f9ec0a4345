use clap::Parser;
use colorize_batch::args::Args;
use colorize_batch::engine::CommandEngine;
use colorize_batch::Processor;

fn main() {
    if let Err(e) = run() {
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    colorize_batch::init_logging(args.verbose);

    let config = args.into_config()?;

    // Create processor
    let engine = Box::new(CommandEngine::from_config(&config.engine));
    let mut processor = Processor::new(config, engine);

    // Process the input directory
    if let Err(e) = processor.run() {
        if e.is_setup() {
            eprintln!("Setup failed; no clips were processed.");
        }
        return Err(e.into());
    }

    Ok(())
}
