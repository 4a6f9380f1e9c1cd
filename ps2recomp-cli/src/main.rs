use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use ps2recomp::{RecompileError, RecompileSummary, Recompiler, RecompilerConfig};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config_path = match args.next() {
        Some(arg) if arg == "--help" || arg == "-h" => {
            print_usage();
            return;
        }
        Some(arg) => arg,
        None => {
            print_usage();
            std::process::exit(1);
        }
    };

    match run(&config_path) {
        Ok(summary) => print_summary(&summary),
        Err(error) => {
            log::error!("{error}");
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

fn run(config_path: &str) -> Result<RecompileSummary, RecompileError> {
    let config = RecompilerConfig::load(config_path)?;
    let mut recompiler = Recompiler::new(config)?;
    let summary = recompiler.recompile()?;
    recompiler.generate_output()?;
    Ok(summary)
}

fn print_usage() {
    println!("Usage: ps2recomp <config.toml>");
    println!();
    println!("Statically recompiles the PS2 executable named by the config");
    println!("file into C++ translation units for the PS2 runtime.");
}

fn print_summary(summary: &RecompileSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Result", "Count"]);

    table.add_row(["Recompiled functions".to_string(), summary.recompiled.to_string()]);
    table.add_row(["Stub functions".to_string(), summary.stubs.to_string()]);
    table.add_row(["Skipped functions".to_string(), summary.skipped.to_string()]);
    table.add_row(["Decode failures".to_string(), summary.decode_failures.to_string()]);
    table.add_row([
        "Entry points discovered".to_string(),
        summary.entries_discovered.to_string(),
    ]);
    table.add_row([
        "Entry functions resliced".to_string(),
        summary.entries_resliced.to_string(),
    ]);

    println!("{table}");
}
