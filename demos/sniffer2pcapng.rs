use sniffer_pcapng::*;
use std::env;
use std::error::Error;
use std::fs;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    for arg in env::args().skip(1) {
        if let Err(e) = convert_file(&arg) {
            eprintln!("{}: {}", arg, e);
        }
    }
}

fn convert_file(arg: &str) -> Result<(), Box<dyn Error>> {
    println!("Name: {}", arg);

    let raw = fs::read(arg)?;
    println!("\tfile size: {}", raw.len());

    let options = ConvertOptions::default().with_user_application("sniffer2pcapng");
    let conversion = convert_with(&raw, &options)?;
    println!("\tpackets: {}", conversion.packet_count);
    println!("\tskipped records: {}", conversion.skipped_count);
    if conversion.unframed_count > 0 {
        println!("\tpackets without link header: {}", conversion.unframed_count);
    }
    for (id, name) in conversion.interfaces.iter().enumerate() {
        println!("\tinterface {}: {}", id, name);
    }
    if let Some(received) = conversion.summary.received_by_filter {
        println!("\treceived by filter: {}", received);
    }
    for diag in &conversion.diagnostics {
        println!("\t  {}", diag);
    }

    let out = format!("{}.pcapng", arg);
    fs::write(&out, &conversion.pcapng)?;
    println!("\twritten: {}", out);
    Ok(())
}
