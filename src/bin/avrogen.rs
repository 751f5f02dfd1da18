//! CLI driver of `avrogen`.

use std::{fs, path::PathBuf, process::exit};

use avrogen::{generator::Builder, schema::Schema, Error};
use clap::Parser;
use rand::{RngCore as _, SeedableRng};

/// Generates synthetic records for a schema, driven by per-node generator directives.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the schema file (see the crate docs for the JSON shape this binary accepts).
    schema: PathBuf,

    /// Number of records to generate.
    #[arg(short = 'n', long = "count", default_value_t = 1)]
    count: u64,

    /// How many generations to fast-forward every iteration-backed node by
    /// before the first record.
    #[arg(long = "offset", default_value_t = 0)]
    generation_offset: u64,

    /// Random number generator seed (64 hex digits). Random if omitted.
    #[arg(long = "seed", value_parser = seed_from_str)]
    seed: Option<<rand_hc::Hc128Rng as SeedableRng>::Seed>,
}

fn seed_from_str(s: &str) -> Result<<rand_hc::Hc128Rng as SeedableRng>::Seed, String> {
    let mut seed = <rand_hc::Hc128Rng as SeedableRng>::Seed::default();
    hex_decode(s, &mut seed).map_err(|e| e.to_string())?;
    Ok(seed)
}

fn hex_decode(s: &str, out: &mut [u8]) -> Result<(), String> {
    if s.len() != out.len() * 2 {
        return Err(format!("seed must have exactly {} hex digits", out.len() * 2));
    }
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        exit(1);
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let raw = fs::read_to_string(&args.schema).unwrap_or_else(|e| {
        eprintln!("error: could not read {}: {e}", args.schema.display());
        exit(1);
    });

    let schema = load_schema(&raw);

    let seed = args.seed.unwrap_or_else(|| {
        let mut seed = <rand_hc::Hc128Rng as SeedableRng>::Seed::default();
        rand::thread_rng().fill_bytes(&mut seed);
        seed
    });
    let rng = rand_hc::Hc128Rng::from_seed(seed);

    let mut generator = Builder::new(schema)
        .rng(Box::new(rng))
        .generation_offset(args.generation_offset)
        .build();

    for _ in 0..args.count {
        let value = generator.generate()?;
        println!("{}", serde_json::to_string(&value).expect("Value always serializes"));
    }
    Ok(())
}

/// Loads a schema document (standard Avro schema JSON) and converts it to
/// this crate's own arena representation.
fn load_schema(raw: &str) -> Schema {
    let apache_schema = apache_avro::Schema::parse_str(raw).unwrap_or_else(|e| {
        eprintln!("error: invalid Avro schema: {e}");
        exit(1);
    });
    avrogen::apache_avro_interop::from_apache_avro(&apache_schema)
}
