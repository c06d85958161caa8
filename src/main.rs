use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ft2smb3")]
#[command(version = "0.1.0")]
#[command(about = "FamiTracker text export to SMB3 music data converter", long_about = None)]
struct Args {
    /// FamiTracker exported text file
    input: PathBuf,

    /// Output file (writes to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output JSON instead of the assembly listing
    #[arg(long)]
    json: bool,

    /// Output compact JSON (default is pretty-printed)
    #[arg(short, long, requires = "json")]
    compact: bool,
}

fn main() -> Result<(), ft2smb3::Error> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    tracing::info!("Reading {}...", args.input.display());
    let export = ft2smb3::TextExport::from_path(&args.input)?;
    let song = ft2smb3::Song::from_export(&export)?;

    let text = if args.json {
        let json = ft2smb3::smb3::SongJson::new(&song)?;
        if args.compact {
            serde_json::to_string(&json)?
        } else {
            serde_json::to_string_pretty(&json)?
        }
    } else {
        ft2smb3::smb3::format_song(&song)
    };

    match args.output {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(text.as_bytes())?;
            if args.json {
                file.write_all(b"\n")?;
            }
        }
        None => {
            println!("{}", text);
        }
    }

    Ok(())
}
