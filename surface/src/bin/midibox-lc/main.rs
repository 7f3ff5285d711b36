//! MIDIbox LC surface emulator

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Result};
use bytes::Bytes;
use clap::{ArgAction, Parser, Subcommand};
use futures::{stream, StreamExt};
use midibox_lc::{
    config::Config,
    lc_protocol::{CoreConfig, DeviceIdMode, ProtocolCore, SurfaceState},
    logging::transport_logging,
    transport::{net, IntoTransport},
    utils::recorder::{self, Message},
    Emulator, InputEvent, Snapshot, Transport,
};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

#[derive(Clone, Debug, Parser)]
#[command(version, author, about)]
struct Opts {
    /// Verbosity level. -v display decoded messages -vv include meter levels and realtime messages
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Output format for the surface (text (default), json, jsonline)
    #[arg(long = "output", short = 'o', default_value = "text")]
    output_format: OutputFormat,

    /// Log sent and received messages to a file
    #[arg(long, env = "MIDIBOX_LC_LOG")]
    log: Option<PathBuf>,

    /// Configuration file
    #[arg(long, short = 'c', env = "MIDIBOX_LC_CONFIG")]
    config: Option<PathBuf>,

    /// Device id (lc | lcxt | <id>), overrides the configuration file
    #[arg(long)]
    device_id: Option<DeviceIdMode>,

    /// Print the surface whenever it changes
    #[arg(long)]
    show: bool,

    /// Read local input events from the given filename (use - for stdin)
    #[arg(short = 'f')]
    file: Option<PathBuf>,

    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Clone, Debug, Subcommand)]
enum SubCommand {
    /// Connect to a network MIDI bridge and act as the surface
    Connect {
        /// Bridge address, defaults to `transport.connect_address`
        addr: Option<String>,
    },

    /// Wait for a network MIDI bridge to connect and act as the surface
    Listen {
        /// Defaults to `transport.bind_address`, then 0.0.0.0:5004
        bind_address: Option<String>,
    },

    /// Run the host side of a traffic log through the emulator
    Replay { filename: PathBuf },

    /// Print the messages produced by a local input event
    Encode {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
}

#[derive(Debug, strum::EnumString, strum::Display, Clone, Copy, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
enum OutputFormat {
    Text,
    Json,
    JsonLine,
}

impl OutputFormat {
    fn format<T>(self, obj: &T) -> Result<String>
    where
        T: serde::Serialize + fmt::Display,
    {
        Ok(match self {
            OutputFormat::Text => obj.to_string(),
            OutputFormat::Json => serde_json::to_string_pretty(obj)?,
            OutputFormat::JsonLine => serde_json::to_string(obj)?,
        })
    }
}

async fn read_input(emulator: Emulator, filename: PathBuf) -> Result<()> {
    let file: Box<dyn AsyncRead + Unpin + Send> = if filename.to_string_lossy() == "-" {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(tokio::fs::File::open(&filename).await?)
    };

    let mut lines = BufReader::new(file).lines();
    while let Some(line) = lines.next_line().await? {
        let event = match InputEvent::parse_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("While executing: {}\n{}", line, e);
                continue;
            }
        };

        if let Err(e) = emulator.apply_input(&event).await {
            eprintln!("While executing: {}\n{}", line, e);
        }
    }

    Ok(())
}

async fn show_surface(emulator: Emulator, format: OutputFormat) {
    let mut interval = tokio::time::interval(Duration::from_millis(100));
    loop {
        interval.tick().await;
        if let Some(snapshot) = emulator.take_snapshot().await {
            print_snapshot(&snapshot, format);
        }
    }
}

fn print_snapshot(snapshot: &Snapshot, format: OutputFormat) {
    match format.format(snapshot) {
        Ok(s) => println!("{}", s),
        Err(e) => log::error!("couldn't format the surface: {}", e),
    }
}

async fn run_emulator(config: CoreConfig, transport: Transport, opts: &Opts) -> Result<()> {
    let transport = transport_logging(transport, opts.verbose, opts.log.clone());
    let (emulator, outgoing) = Emulator::new(config);

    if let Some(filename) = opts.file.clone() {
        let emulator = emulator.clone();
        tokio::spawn(async move {
            if let Err(e) = read_input(emulator, filename).await {
                log::error!("local input exiting: {}", e);
            }
        });
    }

    if opts.show {
        tokio::spawn(show_surface(emulator.clone(), opts.output_format));
    }

    emulator.run(transport, outgoing).await?;
    Ok(())
}

async fn run_replay(config: CoreConfig, filename: &Path, opts: &Opts) -> Result<()> {
    let file = tokio::fs::File::open(filename).await?;
    let session: Vec<Message> = recorder::from_reader(file).collect().await;

    let (emulator, mut outgoing) = Emulator::new(config);
    let produced = emulator
        .replay(stream::iter(session.iter().cloned()), &mut outgoing)
        .await?;

    for msg in &produced {
        println!("{}", Message::Sent(msg.clone()));
    }

    let recorded: Vec<&Bytes> = session
        .iter()
        .filter_map(|msg| match msg {
            Message::Sent(data) => Some(data),
            Message::Received(_) => None,
        })
        .collect();
    if !recorded.is_empty() && !recorded.iter().copied().eq(produced.iter()) {
        log::warn!(
            "the log recorded {} sent messages which differ from the {} produced",
            recorded.len(),
            produced.len()
        );
    }

    print_snapshot(&emulator.snapshot().await, opts.output_format);
    Ok(())
}

fn run_encode(config: CoreConfig, words: &[String]) -> Result<()> {
    let event = InputEvent::parse_words(words)?;
    let mut core = ProtocolCore::new(config);
    let mut surface = SurfaceState::new();
    let mut tx: Vec<Bytes> = Vec::new();

    event.apply(&mut core, &mut surface, &mut tx)?;
    for msg in tx {
        println!("{}", Message::Sent(msg));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let opts: Opts = Opts::parse();

    let config = match &opts.config {
        Some(path) => Config::load(path).await?,
        None => Config::default(),
    };
    let mut core_config = config.core_config()?;
    if let Some(device_id) = opts.device_id {
        core_config.device_id = device_id;
    }

    match &opts.subcmd {
        SubCommand::Connect { addr } => {
            let addr = addr
                .as_ref()
                .or(config.transport.connect_address.as_ref())
                .ok_or_else(|| anyhow!("no bridge address given"))?;
            let transport = net::connect(addr).await?.into_transport();
            run_emulator(core_config, transport, &opts).await
        }
        SubCommand::Listen { bind_address } => {
            let bind_address = bind_address
                .clone()
                .or_else(|| config.transport.bind_address.clone())
                .unwrap_or_else(|| format!("0.0.0.0:{}", net::DEFAULT_PORT));
            let transport = net::accept(&bind_address).await?.into_transport();
            run_emulator(core_config, transport, &opts).await
        }
        SubCommand::Replay { filename } => run_replay(core_config, filename, &opts).await,
        SubCommand::Encode { words } => run_encode(core_config, words),
    }
}
