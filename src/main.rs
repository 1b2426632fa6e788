// This is my entry point for the fork-choice simulator CLI
// Everything interesting lives in the library; here I only parse, dispatch and report
use clap::Parser;
use forkchain_sim::report::{export_csv, rows_from_log, write_csv};
use forkchain_sim::{Command, Opt, RunArgs, Simulation, SimulationConfig, TestLog};
use log::{error, info};
use std::fs::File;
use std::process;

fn main() {
    // I parse the arguments first because -v decides how chatty the logger is
    let opt = Opt::parse();

    // Info shows mined blocks and chain switches; -v adds linking and duplicates
    env_logger::builder().filter_level(opt.log_level()).init();

    // If anything fails I log it and exit with code 1, same as every other command
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

// This is where I handle the different CLI commands
fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        // When I want to play a full experiment
        Command::Run(args) => run_simulation(&args)?,
        // When I already have a statistics log and just want the spreadsheet
        Command::Summarize { input, output } => {
            let rows = export_csv(&input, &output)?;
            println!("Wrote {rows} run(s) to {}", output.display());
        }
        // When I need a starting point for a config file
        Command::DefaultConfig => {
            print!("{}", SimulationConfig::default().to_toml_string()?);
        }
    }
    Ok(())
}

fn run_simulation(args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    // I layer the config: file (or defaults), then FORKCHAIN_* variables, then flags
    let config = args.resolve_config()?;
    let mut simulation = Simulation::new(config)?;

    // One simulation is one test in the log, so the CSV gets one row per run
    let mut log = TestLog::new();
    log.new_test();
    let summary = simulation.run(&mut log)?;

    // I print the final round's numbers so a run is useful even without --output
    println!("Rounds played:        {}", simulation.round());
    println!("Block chain length:   {}", summary.chain_length);
    println!("Forks:                {}", summary.forks);
    println!("Total switches:       {}", summary.total_switches);
    println!("Total flipped blocks: {}", summary.total_flipped_blocks);
    println!("Frequency:            {}", summary.frequency_summary());
    println!("Messages sent:        {}", summary.messages_sent);

    if let Some(path) = &args.output {
        log.write_to(path)?;
        info!("Statistics log written to {}", path.display());
    }
    // The CSV comes straight from the in-memory log, no need to read the JSON back
    if let Some(path) = &args.csv {
        write_csv(&rows_from_log(&log)?, File::create(path)?)?;
        info!("CSV report written to {}", path.display());
    }
    Ok(())
}
